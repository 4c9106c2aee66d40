//! Number format rendering
//!
//! Supported patterns are a zero integer part with optional thousands
//! grouping, decimals and a percent sign: `0`, `0.00`, `#,##0.00`, `0%`,
//! `0.00%`. Anything else is shown with the general format.

use lazy_regex::regex_captures;

/// Largest number of decimals shown by the general format
const GENERAL_MAX_DECIMALS: usize = 10;

/// Render a number with an optional format pattern
pub fn format_number(value: f64, format: Option<&str>) -> String {
    if !value.is_finite() {
        return "#ERROR".to_string();
    }
    let Some((_, grouping, decimals, percent)) =
        format.and_then(|f| regex_captures!(r"^(#,##)?0(?:\.(0+))?(%)?$", f))
    else {
        return general(value);
    };

    let value = if percent.is_empty() { value } else { value * 100.0 };
    let mut text = format!("{:.*}", decimals.len(), value);
    if text.starts_with('-') && text.trim_start_matches(['-', '0', '.']).is_empty() {
        text.remove(0);
    }
    if !grouping.is_empty() {
        text = group_thousands(&text);
    }
    text.push_str(percent);
    text
}

fn general(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.*}", GENERAL_MAX_DECIMALS, value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn group_thousands(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match digits.find('.') {
        Some(dot) => digits.split_at(dot),
        None => (digits, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_general() {
        assert_eq!(format_number(42.0, None), "42");
        assert_eq!(format_number(-3.5, None), "-3.5");
        assert_eq!(format_number(1.0 / 3.0, None), "0.3333333333");
        assert_eq!(format_number(0.1 + 0.2, None), "0.3");
    }

    #[test]
    fn test_patterns() {
        assert_eq!(format_number(3.14159, Some("0")), "3");
        assert_eq!(format_number(3.14159, Some("0.00")), "3.14");
        assert_eq!(format_number(1234567.891, Some("#,##0.00")), "1,234,567.89");
        assert_eq!(format_number(-1234.5, Some("#,##0.00")), "-1,234.50");
        assert_eq!(format_number(0.12, Some("0%")), "12%");
        assert_eq!(format_number(0.1234, Some("0.00%")), "12.34%");
    }

    #[test]
    fn test_unknown_pattern_falls_back() {
        assert_eq!(format_number(2.5, Some("yyyy-mm-dd")), "2.5");
    }
}
