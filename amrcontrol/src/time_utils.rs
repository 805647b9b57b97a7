//! Time formatting and parsing utilities for the player position.
//!
//! The player reports positions and durations as (possibly fractional)
//! seconds; the CLI shows them as `M:SS` or `H:MM:SS` and accepts seek
//! targets in `HH:MM:SS`, `MM:SS` or `SS` form.

use crate::errors::ControlError;

/// Formats a position as `M:SS` below one hour, `H:MM:SS` above.
///
/// Fractional seconds are rounded down; negative or non-finite values
/// render as `0:00`.
///
/// # Examples
/// ```
/// # use amrcontrol::time_utils::format_position;
/// assert_eq!(format_position(65.9), "1:05");
/// assert_eq!(format_position(3725.0), "1:02:05");
/// ```
pub fn format_position(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Parses a time string in HH:MM:SS, MM:SS, or SS format to seconds.
///
/// # Examples
/// ```
/// # use amrcontrol::time_utils::parse_time_flexible;
/// assert_eq!(parse_time_flexible("01:02:03").unwrap(), 3723);
/// assert_eq!(parse_time_flexible("02:03").unwrap(), 123);
/// assert_eq!(parse_time_flexible("42").unwrap(), 42);
/// ```
///
/// # Errors
/// Returns an error if:
/// - The input has more than 3 parts
/// - Any part is not a valid u32
pub fn parse_time_flexible(input: &str) -> Result<u32, ControlError> {
    let input = input.trim();
    let parts: Vec<&str> = input.split(':').collect();

    if parts.len() > 3 {
        return Err(ControlError::InvalidArgument(format!(
            "Invalid time format '{}': expected HH:MM:SS, MM:SS, or SS",
            input
        )));
    }

    let mut total = 0u32;
    for part in parts {
        let value = part.parse::<u32>().map_err(|_| {
            ControlError::InvalidArgument(format!(
                "Invalid numeric value '{}' in time string '{}'",
                part, input
            ))
        })?;
        total = total.saturating_mul(60).saturating_add(value);
    }

    Ok(total)
}
