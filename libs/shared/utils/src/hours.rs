/// Rounds to the nearest quarter hour. Non-finite input yields 0.
pub fn round_to_quarter(hours: f64) -> f64 {
    if !hours.is_finite() {
        return 0.0;
    }
    (hours * 4.0).round() / 4.0
}

/// Hour label for a slot count: at most two decimals, no trailing zeros.
pub fn format_hours(slot_count: usize) -> String {
    let formatted = format!("{:.2}", slot_count as f64 / 4.0);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_quarter() {
        assert_eq!(round_to_quarter(10.0 / 5.0), 2.0);
        assert_eq!(round_to_quarter(6.25 / 5.0), 1.25);
        assert_eq!(round_to_quarter(1.1), 1.0);
        assert_eq!(round_to_quarter(1.13), 1.25);
        assert_eq!(round_to_quarter(f64::NAN), 0.0);
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(12), "3");
        assert_eq!(format_hours(10), "2.5");
        assert_eq!(format_hours(3), "0.75");
        assert_eq!(format_hours(0), "0");
    }
}
