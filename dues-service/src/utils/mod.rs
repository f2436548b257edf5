//! Amount normalization and display formatting helpers.

use chrono::{DateTime, Utc};

/// Parse a possibly-formatted amount string (`"₹ 1,234.50"`) into rupees.
///
/// Strips everything except ASCII digits and the decimal point before
/// parsing. Inputs that yield nothing parseable normalize to `0.0` so that
/// summation paths never see NaN.
pub fn normalize_amount(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Guard for aggregation: non-finite values contribute zero.
pub fn coerce_amount(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Format rupees with Indian digit grouping: `₹12,34,567.89`.
pub fn format_inr(amount: f64) -> String {
    let amount = coerce_amount(amount);
    let negative = amount < 0.0;
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = paise / 100;
    let fraction = paise % 100;

    let sign = if negative { "-" } else { "" };
    format!(
        "{}₹{}.{:02}",
        sign,
        group_indian(&rupees.to_string()),
        fraction
    )
}

// Last three digits, then groups of two.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut parts: Vec<&str> = Vec::new();
    let mut i = head.len();
    while i > 2 {
        parts.push(&head[i - 2..i]);
        i -= 2;
    }
    parts.push(&head[..i]);
    parts.reverse();
    format!("{},{}", parts.join(","), tail)
}

/// Display form used for recent-transaction rows: `02 Mar 2024, 04:30 PM`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%d %b %Y, %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn normalizes_formatted_currency_strings() {
        assert_eq!(normalize_amount("₹ 1,234.56"), 1234.56);
        assert_eq!(normalize_amount("1234.56"), 1234.56);
        assert_eq!(normalize_amount("  500 "), 500.0);
        assert_eq!(normalize_amount("Rs. 2,00,000"), 200000.0);
    }

    #[test]
    fn unparseable_amounts_normalize_to_zero() {
        assert_eq!(normalize_amount(""), 0.0);
        assert_eq!(normalize_amount("abc"), 0.0);
        assert_eq!(normalize_amount("₹"), 0.0);
        // Two decimal points is not a number.
        assert_eq!(normalize_amount("12.34.56"), 0.0);
    }

    #[test]
    fn coerce_drops_non_finite() {
        assert_eq!(coerce_amount(f64::NAN), 0.0);
        assert_eq!(coerce_amount(f64::INFINITY), 0.0);
        assert_eq!(coerce_amount(42.5), 42.5);
    }

    #[test]
    fn inr_formatting_uses_indian_grouping() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(999.0), "₹999.00");
        assert_eq!(format_inr(1234.5), "₹1,234.50");
        assert_eq!(format_inr(1234567.89), "₹12,34,567.89");
        assert_eq!(format_inr(100000.0), "₹1,00,000.00");
        assert_eq!(format_inr(-250.75), "-₹250.75");
    }

    #[test]
    fn timestamp_display_form() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 2, 16, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "02 Mar 2024, 04:30 PM");
    }
}
