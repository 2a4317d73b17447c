//! Numeric sanitization for provider readings
//!
//! Every number crossing the provider boundary goes through
//! [`sanitize_reading`] so `NaN`/infinity never reach calculation logic.

/// Interpret a raw value as a finite number, treating anything else as
/// absent
pub fn parse_optional_finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Round to four decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Sanitize one raw provider reading: non-finite becomes `None`, finite
/// values are rounded to four decimals
pub fn sanitize_reading(value: Option<f64>) -> Option<f64> {
    parse_optional_finite(value).map(round4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_become_absent() {
        assert_eq!(parse_optional_finite(Some(f64::NAN)), None);
        assert_eq!(parse_optional_finite(Some(f64::INFINITY)), None);
        assert_eq!(parse_optional_finite(Some(f64::NEG_INFINITY)), None);
        assert_eq!(parse_optional_finite(None), None);
        assert_eq!(parse_optional_finite(Some(21.4)), Some(21.4));
    }

    #[test]
    fn rounds_to_four_decimals() {
        assert_eq!(round4(1.23456789), 1.2346);
        assert_eq!(round4(-0.000049), -0.0);
        assert_eq!(round4(100.0), 100.0);
    }

    #[test]
    fn sanitize_combines_both() {
        assert_eq!(sanitize_reading(Some(19.123456)), Some(19.1235));
        assert_eq!(sanitize_reading(Some(f64::NAN)), None);
        assert_eq!(sanitize_reading(None), None);
    }
}
