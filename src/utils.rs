//! # Utility Functions Module
//!
//! Small helpers for building external command lines and reporting elapsed time.

/// Builds a `Vec<String>` from heterogeneous `Display` values.
///
/// # Example
/// ```rust
/// use media_optimizados::args;
///
/// let crf = 28;
/// let args = args!["-crf", crf, "-y"];
/// assert_eq!(args, vec!["-crf", "28", "-y"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($item.to_string()),*]
    };
}

/// Splits a duration into whole hours, whole minutes and seconds rounded to
/// hundredths, so the seconds part never prints as `60.00`.
pub fn split_elapsed(elapsed: std::time::Duration) -> (u64, u64, f64) {
    let centis = (elapsed.as_secs_f64() * 100.0).round() as u64;
    let hours = centis / 360_000;
    let minutes = (centis % 360_000) / 6_000;
    (hours, minutes, (centis % 6_000) as f64 / 100.0)
}

/// Formats an elapsed duration the way the final report prints it: `1h 2m 3.45s`.
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let (hours, minutes, seconds) = split_elapsed(elapsed);
    format!("{}h {}m {:.2}s", hours, minutes, seconds)
}
