//! Display formatting for amounts and percentages

/// Format a dollar amount with thousands separators, e.g. `$1,234.56`
pub fn currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative && cents > 0 {
        format!("-${}.{:02}", grouped, frac)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}

/// Percentage with an explicit sign, e.g. `+4.0%`; zero shows as `+0.0%`
pub fn signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.1}%", value.abs())
    } else {
        format!("{:.1}%", value)
    }
}

/// Percentage with one decimal, e.g. `12.5%`
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency() {
        assert_eq!(currency(0.0), "$0.00");
        assert_eq!(currency(12.5), "$12.50");
        assert_eq!(currency(1234.567), "$1,234.57");
        assert_eq!(currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(currency(-12.0), "-$12.00");
    }

    #[test]
    fn test_signed_percent() {
        assert_eq!(signed_percent(4.0), "+4.0%");
        assert_eq!(signed_percent(-2.26), "-2.3%");
        assert_eq!(signed_percent(0.0), "+0.0%");
        assert_eq!(signed_percent(-0.0), "+0.0%");
    }
}
