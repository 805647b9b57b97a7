//! Petits utilitaires partagés par les crates AMRemote.
//!
//! - [`canonicalize`] : normalise un nom affiché pour la comparaison
//! - [`is_process_running`] : vérifie la présence d'un processus par son nom
//! - [`get_os_string`] : décrit le système courant

pub mod process;
pub mod text;

pub use process::{ProcessInfo, find_process_by_name, is_process_running};
pub use text::{INVISIBLE_MARKS, canonicalize, is_invisible_mark};

/// Retourne une chaîne décrivant le système d'exploitation et sa version.
///
/// # Format
/// - macOS: "Macos/15.1"
/// - Linux: "Ubuntu/22.04"
/// - Autre: "{OS}/Unknown"
pub fn get_os_string() -> String {
    let info = os_info::get();
    let os_type = format!("{:?}", info.os_type());

    let version = info.version();
    if version != &os_info::Version::Unknown {
        format!("{}/{}", os_type, version)
    } else {
        format!("{}/Unknown", os_type)
    }
}

/// Returns true when running on macOS, the only platform shipping `osascript`.
pub fn is_macos() -> bool {
    matches!(os_info::get().os_type(), os_info::Type::Macos)
}
