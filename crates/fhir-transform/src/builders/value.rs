//! Raw cell value parsing shared by the builders.

const TRUTHY: [&str; 5] = ["1", "1.0", "yes", "y", "true"];
const FALSY: [&str; 5] = ["0", "0.0", "no", "n", "false"];

/// Parses a decimal number, accepting a decimal comma (`12,5`).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains('.') {
        trimmed.to_string()
    } else {
        trimmed.replacen(',', ".", 1)
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses a yes/no flag. `None` when the value is neither.
pub fn parse_flag(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if TRUTHY.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSY.iter().any(|f| trimmed.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma_is_accepted() {
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal(" 13.2 "), Some(13.2));
        assert_eq!(parse_decimal("-3"), Some(-3.0));
        assert_eq!(parse_decimal("1,234.5"), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn flags_are_case_insensitive() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("1.0"), Some(true));
        assert_eq!(parse_flag("FALSE"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("2"), None);
        assert_eq!(parse_flag("maybe"), None);
    }
}
