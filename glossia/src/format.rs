//! Locale-aware number formatting
//!
//! Fills the role of a host `NumberFormat` implementation for numeric
//! placeable values. The environment caches one formatter per locale.

/// Number formatter for one locale.
#[derive(Debug, Clone)]
pub struct NumberFormatter {
    decimal_sep: &'static str,
    group_sep: &'static str,
    max_fraction_digits: usize,
}

impl NumberFormatter {
    /// Create a formatter for a locale code.
    pub fn for_locale(code: &str) -> Self {
        let lang = match code.find('-') {
            Some(pos) => &code[..pos],
            None => code,
        };
        let (decimal_sep, group_sep) = number_separators(lang);
        Self {
            decimal_sep,
            group_sep,
            max_fraction_digits: 3,
        }
    }

    /// Format a number with locale separators and grouping.
    pub fn format(&self, n: f64) -> String {
        if !n.is_finite() {
            return n.to_string();
        }

        let negative = n < 0.0;
        let mut rendered = format!("{:.*}", self.max_fraction_digits, n.abs());

        // Drop trailing fraction zeros, then a dangling separator.
        if rendered.contains('.') {
            while rendered.ends_with('0') {
                rendered.pop();
            }
            if rendered.ends_with('.') {
                rendered.pop();
            }
        }

        let (integer, fraction) = match rendered.split_once('.') {
            Some((i, f)) => (i.to_string(), Some(f.to_string())),
            None => (rendered, None),
        };

        let mut out = String::new();
        if negative && (fraction.is_some() || integer != "0") {
            out.push('-');
        }
        out.push_str(&add_grouping(&integer, self.group_sep));
        if let Some(fraction) = fraction {
            out.push_str(self.decimal_sep);
            out.push_str(&fraction);
        }
        out
    }
}

/// Decimal and grouping separators for a language.
fn number_separators(lang: &str) -> (&'static str, &'static str) {
    match lang {
        // Comma decimal, period grouping
        "de" | "es" | "it" | "pt" | "nl" | "da" | "sv" | "no" | "fi" | "pl" | "cs" | "sk"
        | "hu" | "ro" | "bg" | "el" | "ru" | "uk" | "tr" | "id" | "vi" => (",", "."),

        // Comma decimal, space grouping (French-speaking)
        "fr" => (",", " "),

        // Period decimal, comma grouping (default English-like)
        _ => (".", ","),
    }
}

/// Add grouping separators to an integer string.
fn add_grouping(s: &str, sep: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    if len <= 3 {
        return s.to_string();
    }

    let mut result = String::with_capacity(len + (len - 1) / 3);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push_str(sep);
        }
        result.push(*c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_us() {
        let formatter = NumberFormatter::for_locale("en-US");
        assert_eq!(formatter.format(1234567.89), "1,234,567.89");
        assert_eq!(formatter.format(1000.0), "1,000");
        assert_eq!(formatter.format(5.0), "5");
    }

    #[test]
    fn test_format_number_german() {
        let formatter = NumberFormatter::for_locale("de");
        assert_eq!(formatter.format(1234567.89), "1.234.567,89");
    }

    #[test]
    fn test_format_number_french() {
        let formatter = NumberFormatter::for_locale("fr");
        assert_eq!(formatter.format(1234567.89), "1 234 567,89");
    }

    #[test]
    fn test_format_negative_and_fraction() {
        let formatter = NumberFormatter::for_locale("en");
        assert_eq!(formatter.format(-42.5), "-42.5");
        assert_eq!(formatter.format(0.125), "0.125");
        assert_eq!(formatter.format(-0.0), "0");
    }

    #[test]
    fn test_fraction_is_capped_at_three_digits() {
        let formatter = NumberFormatter::for_locale("en");
        assert_eq!(formatter.format(1.23456), "1.235");
    }

    #[test]
    fn test_add_grouping() {
        assert_eq!(add_grouping("1234567", ","), "1,234,567");
        assert_eq!(add_grouping("123", ","), "123");
        assert_eq!(add_grouping("1234", " "), "1 234");
    }
}
