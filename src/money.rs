//! Currency formatting
//!
//! Brazilian real formatting for display (`R$ 1.234,56`). Display only:
//! amounts are stored and computed as plain numbers, never as strings.

/// Format a value as Brazilian reais, pt-BR style: `.` groups thousands,
/// `,` separates the two cent digits, sign goes before the symbol.
pub fn format_brl(value: f64) -> String {
    if !value.is_finite() {
        // extreme but accepted terms can overflow the schedule math;
        // render the result literally instead of casting it into a
        // bogus amount
        return format!("R$ {}", value);
    }

    let negative = value < 0.0;
    let cents_total = (value.abs() * 100.0).round() as u64;
    let reais = cents_total / 100;
    let cents = cents_total % 100;

    let sign = if negative { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, group_thousands(reais), cents)
}

/// Insert a `.` between every group of three digits, counting from the right.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amounts() {
        assert_eq!(format_brl(100.0), "R$ 100,00");
        assert_eq!(format_brl(0.0), "R$ 0,00");
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(format_brl(1234.56), "R$ 1.234,56");
        assert_eq!(format_brl(1234567.89), "R$ 1.234.567,89");
        assert_eq!(format_brl(999.99), "R$ 999,99");
    }

    #[test]
    fn test_rounds_to_cents() {
        assert_eq!(format_brl(88.84878867834167), "R$ 88,85");
        assert_eq!(format_brl(0.005), "R$ 0,01");
        assert_eq!(format_brl(999.999), "R$ 1.000,00");
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(format_brl(-1.5), "-R$ 1,50");
        assert_eq!(format_brl(-1234.0), "-R$ 1.234,00");
    }

    #[test]
    fn test_non_finite_values_render_literally() {
        assert_eq!(format_brl(f64::NAN), "R$ NaN");
        assert_eq!(format_brl(f64::INFINITY), "R$ inf");
    }
}
