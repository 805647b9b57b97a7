//! Normalisation des noms affichés avant comparaison.
//!
//! Les noms de playlists ou d'enceintes renvoyés par l'application contiennent
//! souvent des marques invisibles (sélecteurs de variante d'emoji, ZWJ, ...)
//! et des espaces exotiques (insécables, tabulations). [`canonicalize`] les
//! ramène à une forme stable, utilisable pour la comparaison uniquement.

/// Invisible format characters removed by [`canonicalize`].
///
/// - U+FE0E variation selector-15 (text presentation)
/// - U+FE0F variation selector-16 (emoji presentation)
/// - U+200D zero-width joiner
/// - U+2060 word joiner
pub const INVISIBLE_MARKS: [char; 4] = ['\u{FE0E}', '\u{FE0F}', '\u{200D}', '\u{2060}'];

/// Returns true if `c` belongs to [`INVISIBLE_MARKS`].
#[inline]
pub fn is_invisible_mark(c: char) -> bool {
    INVISIBLE_MARKS.contains(&c)
}

/// Normalises a display name into its comparison-safe form.
///
/// The invisible marks are dropped, every Unicode whitespace becomes an ASCII
/// space, runs of spaces collapse into one and both ends are trimmed. Case is
/// left untouched: lower-casing is the matcher's business and must happen
/// after this pass.
///
/// The function is idempotent and never fails; an empty input yields an
/// empty output.
///
/// # Examples
/// ```
/// # use amrutils::canonicalize;
/// assert_eq!(canonicalize("  Chill\u{00A0}\u{00A0}Vibes \u{FE0F}"), "Chill Vibes");
/// assert_eq!(canonicalize(""), "");
/// ```
pub fn canonicalize(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if is_invisible_mark(c) {
            continue;
        }
        if c.is_whitespace() {
            cleaned.push(' ');
        } else {
            cleaned.push(c);
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
