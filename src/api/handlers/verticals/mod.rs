//! Mock "super app" verticals. Each endpoint requires a valid session.

pub mod activity;
pub mod cab;
pub mod grocery;
pub mod pay;
pub mod travel;

/// Round to two decimal places, the precision every quoted amount uses.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_to_cents() {
        assert!((round2(2.5 + 1.2 * 14.0 / 10.0) - 4.18).abs() < f64::EPSILON);
        assert!((round2(3.99 + 3.0 * 2.5) - 11.49).abs() < f64::EPSILON);
        assert!((round2(1.005_1) - 1.01).abs() < f64::EPSILON);
    }
}
