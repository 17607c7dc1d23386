// Library module for testable functions

pub mod analytics;
pub mod api;
pub mod config;

/// Calculate price per square foot
/// Formula: total_price / area_sqft
pub fn calculate_ppsf(total_price: f64, area_sqft: f64) -> Option<f64> {
    if !(area_sqft > 0.0) || !(total_price > 0.0) {
        return None;
    }
    let ppsf = total_price / area_sqft;
    ppsf.is_finite().then_some(ppsf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppsf_calculation() {
        // Test normal case
        let ppsf = calculate_ppsf(10_000_000.0, 1000.0);
        assert_eq!(ppsf, Some(10_000.0));
    }

    #[test]
    fn test_ppsf_fractional_area() {
        let ppsf = calculate_ppsf(4_500_000.0, 612.5);
        assert!(ppsf.is_some());
        let ppsf = ppsf.unwrap();
        assert!((ppsf - 7346.94).abs() < 0.01);
    }

    #[test]
    fn test_ppsf_zero_area() {
        // Test with zero area (should return None)
        assert!(calculate_ppsf(5_000_000.0, 0.0).is_none());
    }

    #[test]
    fn test_ppsf_negative_price() {
        assert!(calculate_ppsf(-100_000.0, 800.0).is_none());
    }

    #[test]
    fn test_ppsf_nan_input() {
        assert!(calculate_ppsf(f64::NAN, 800.0).is_none());
        assert!(calculate_ppsf(5_000_000.0, f64::NAN).is_none());
    }

    #[test]
    fn test_ppsf_tiny_area_overflow() {
        // f64::MAX / tiny area overflows to infinity
        assert!(calculate_ppsf(f64::MAX, 1e-300).is_none());
    }
}
