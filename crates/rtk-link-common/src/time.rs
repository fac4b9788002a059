//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Shared primitives and utilities for the driver runtime."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

/// Capture an instant suitable for scheduler comparisons.
pub fn monotonic_now() -> Instant {
    Instant::now()
}

/// Convert to human-friendly jitter units.
pub fn jitter_us(actual: Duration, expected: Duration) -> i64 {
    let actual_us = actual.as_secs_f64() * 1_000_000.0;
    let expected_us = expected.as_secs_f64() * 1_000_000.0;
    (actual_us - expected_us).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_signed() {
        let expected = Duration::from_micros(500);
        assert_eq!(jitter_us(Duration::from_micros(700), expected), 200);
        assert_eq!(jitter_us(Duration::from_micros(300), expected), -200);
    }
}
