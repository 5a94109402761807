//! Fixed-point rounding and unit comparison policy.
//!
//! Every tolerance and rounding decision in the ledger goes through this
//! module so the FIFO consumer, dividend reconciliation and split math all
//! agree on what "equal units" means.

/// Absolute tolerance when comparing unit quantities.
pub const UNIT_TOLERANCE: f64 = 0.001;

/// Round to `decimals` fractional digits, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

pub fn round5(value: f64) -> f64 {
    round_to(value, 5)
}

/// Unit quantities are considered equal within [`UNIT_TOLERANCE`].
pub fn units_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= UNIT_TOLERANCE
}

/// `a <= b` allowing the tolerance on the boundary.
pub fn units_le(a: f64, b: f64) -> bool {
    a <= b + UNIT_TOLERANCE
}

/// A lot with this many units left counts as fully drained.
pub fn is_drained(units: f64) -> bool {
    units <= UNIT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(2.5555, 2), 2.56);
        assert_eq!(round_to(2.5554, 3), 2.555);
        assert_eq!(round_to(-1.005, 2), -1.01);
        assert_eq!(round5(0.123456), 0.12346);
    }

    #[test]
    fn units_eq_within_tolerance() {
        assert!(units_eq(10.0, 10.0009));
        assert!(units_eq(10.0009, 10.0));
        assert!(!units_eq(10.0, 10.002));
    }

    #[test]
    fn units_le_allows_boundary_slack() {
        assert!(units_le(10.0005, 10.0));
        assert!(!units_le(10.1, 10.0));
    }

    #[test]
    fn drained_lot_detection() {
        assert!(is_drained(0.0));
        assert!(is_drained(0.0009));
        assert!(!is_drained(0.01));
    }
}
