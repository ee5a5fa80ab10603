//! Unit Constants
//!
//! Byte multipliers and time units used throughout the model. Memory sizes
//! use binary multipliers, transfer rates and backing-store capacities use
//! decimal ones. All times are expressed in hours, which is the unit FIT
//! rates are defined against.

// =============================================================================
// Decimal Sizes (rates, backing-store capacity)
// =============================================================================

pub const KB: f64 = 1_000.0;
pub const MB: f64 = KB * 1_000.0;
pub const GB: f64 = MB * 1_000.0;
pub const TB: f64 = GB * 1_000.0;
pub const PB: f64 = TB * 1_000.0;

// =============================================================================
// Binary Sizes (memory)
// =============================================================================

pub const KIB: f64 = 1_024.0;
pub const MIB: f64 = KIB * 1_024.0;
pub const GIB: f64 = MIB * 1_024.0;

// =============================================================================
// Time (hours)
// =============================================================================

pub const HOUR: f64 = 1.0;
pub const MINUTE: f64 = HOUR / 60.0;
pub const SECOND: f64 = HOUR / 3_600.0;
pub const DAY: f64 = HOUR * 24.0;
pub const YEAR: f64 = DAY * 365.25;

/// FIT rates count failures per billion component-hours
pub const BILLION: f64 = 1_000_000_000.0;

/// Convert a duration in seconds to hours
pub fn seconds_to_hours(seconds: f64) -> f64 {
    seconds * SECOND
}

/// Convert a duration in hours to seconds
pub fn hours_to_seconds(hours: f64) -> f64 {
    hours / SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_is_8766_hours() {
        assert_eq!(YEAR, 8766.0);
    }

    #[test]
    fn test_second_conversion() {
        assert!((seconds_to_hours(3600.0) - 1.0).abs() < 1e-12);
        assert!((hours_to_seconds(0.5) - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn test_binary_vs_decimal() {
        assert_eq!(MIB, 1_048_576.0);
        assert_eq!(MB, 1_000_000.0);
        assert_eq!(PB, 1.0e15);
    }
}
