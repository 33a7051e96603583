//! Locale-tolerant extraction of star ratings and review counts.
//!
//! Listing markup mixes localised numbers ("4,6 von 5", "1.589") with English
//! boilerplate ("customer ratings"). Rather than carrying a locale database, the
//! patterns here accept either `.` or `,` as a separator and leave the meaning of
//! the separator to a [`SeparatorPolicy`].
//!
//! The default policy reproduces what the page script has always done: a
//! separator inside a rating is a decimal point, and every separator inside a
//! count is a thousands grouping. That means `"1.589"` is read as 1589 even on a
//! page where `.` is the decimal point. Counts are whole numbers on every locale
//! seen so far, so the default keeps that reading.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

/// A number, a run of (possibly accented) words, then the literal divisor `5`.
/// Only one separator is allowed in the rating.
static RATING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([0-9]+(?:[.,][0-9]+)?)\s[a-z\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{024F}\s.]+\s+5",
    )
    .expect("rating pattern is valid")
});

/// Digits with any number of `.`/`,` groupings.
static COUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:[.,][0-9]+)*").expect("count pattern is valid"));

/// The hover card markup: `>4.6 out of 5<` ... `>89 customer ratings<`.
/// `.` does not cross newlines, so both numbers must sit on the same line.
static POPOVER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)>([0-9]+(?:[.,][0-9]+)?)\s[a-z\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{024F}\s.]+\s+5<.+?>([0-9]+(?:[.,][0-9]+)*)\s+customer\s+ratings<",
    )
    .expect("popover pattern is valid")
});

/// How `.` and `,` inside a number are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorPolicy {
    /// Ratings take either separator as the decimal point; counts drop both.
    #[default]
    StripBoth,
    /// `,` is the decimal point and `.` groups thousands.
    CommaDecimal,
    /// `.` is the decimal point and `,` groups thousands.
    PeriodDecimal,
}

impl SeparatorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeparatorPolicy::StripBoth => "strip_both",
            SeparatorPolicy::CommaDecimal => "comma_decimal",
            SeparatorPolicy::PeriodDecimal => "period_decimal",
        }
    }

    /// Rewrites a rating token into the form `f64::from_str` accepts.
    fn canonical_decimal(&self, token: &str) -> Option<String> {
        let has_comma = token.contains(',');
        let has_period = token.contains('.');
        match self {
            SeparatorPolicy::StripBoth => Some(token.replace(',', ".")),
            SeparatorPolicy::CommaDecimal if has_period => None,
            SeparatorPolicy::CommaDecimal => Some(token.replace(',', ".")),
            SeparatorPolicy::PeriodDecimal if has_comma => None,
            SeparatorPolicy::PeriodDecimal => Some(token.to_string()),
        }
    }

    /// Reduces a count token to its integer digits.
    fn integer_digits(&self, token: &str) -> String {
        let whole = match self {
            SeparatorPolicy::StripBoth => token,
            SeparatorPolicy::CommaDecimal => token.split(',').next().unwrap_or(token),
            SeparatorPolicy::PeriodDecimal => token.split('.').next().unwrap_or(token),
        };
        whole.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}

impl std::str::FromStr for SeparatorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strip_both" => Ok(SeparatorPolicy::StripBoth),
            "comma_decimal" => Ok(SeparatorPolicy::CommaDecimal),
            "period_decimal" => Ok(SeparatorPolicy::PeriodDecimal),
            other => Err(format!("unknown separator policy '{}'", other)),
        }
    }
}

/// A rating and count read from a single hover card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopoverNumbers {
    pub rating: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    policy: SeparatorPolicy,
}

impl Normalizer {
    pub fn new(policy: SeparatorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SeparatorPolicy {
        self.policy
    }

    /// Reads the star rating from text such as `"4.6 out of 5"`.
    /// Only the first match counts.
    pub fn parse_rating(&self, text: &str) -> Result<f64, NormalizeError> {
        let token = RATING_PATTERN
            .captures(text)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| NormalizeError::no_match(text))?;
        self.rating_from_token(token.as_str())
            .ok_or_else(|| NormalizeError::no_match(text))
    }

    /// Reads the review count from text such as `"1,589 customer ratings"`.
    pub fn parse_count(&self, text: &str) -> Result<u64, NormalizeError> {
        let token = COUNT_PATTERN
            .find(text)
            .ok_or_else(|| NormalizeError::no_match(text))?;
        self.count_from_token(token.as_str())
            .ok_or_else(|| NormalizeError::no_match(text))
    }

    /// Pulls both numbers out of a hover card's inner HTML in one pass.
    pub fn parse_popover(&self, html: &str) -> Result<PopoverNumbers, NormalizeError> {
        let caps = POPOVER_PATTERN
            .captures(html)
            .ok_or_else(|| NormalizeError::no_match(html))?;
        let rating = caps
            .get(1)
            .and_then(|m| self.rating_from_token(m.as_str()))
            .ok_or_else(|| NormalizeError::no_match(html))?;
        let count = caps
            .get(2)
            .and_then(|m| self.count_from_token(m.as_str()))
            .ok_or_else(|| NormalizeError::no_match(html))?;
        Ok(PopoverNumbers { rating, count })
    }

    fn rating_from_token(&self, token: &str) -> Option<f64> {
        let canonical = self.policy.canonical_decimal(token)?;
        let rating: f64 = canonical.parse().ok()?;
        (0.0..=5.0).contains(&rating).then_some(rating)
    }

    fn count_from_token(&self, token: &str) -> Option<u64> {
        let digits = self.policy.integer_digits(token);
        digits.parse().ok()
    }
}

/// [`Normalizer::parse_rating`] with the default policy.
pub fn parse_rating_text(text: &str) -> Result<f64, NormalizeError> {
    Normalizer::default().parse_rating(text)
}

/// [`Normalizer::parse_count`] with the default policy.
pub fn parse_count_text(text: &str) -> Result<u64, NormalizeError> {
    Normalizer::default().parse_count(text)
}

/// [`Normalizer::parse_popover`] with the default policy.
pub fn parse_popover_text(html: &str) -> Result<PopoverNumbers, NormalizeError> {
    Normalizer::default().parse_popover(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating_english() {
        assert_eq!(parse_rating_text("4.6 out of 5").unwrap(), 4.6);
        assert_eq!(parse_rating_text("4.6 out of 5 stars").unwrap(), 4.6);
    }

    #[test]
    fn test_parse_rating_localised() {
        assert_eq!(parse_rating_text("4,6 von 5").unwrap(), 4.6);
        assert_eq!(parse_rating_text("4,5 sur 5 étoiles").unwrap(), 4.5);
        assert_eq!(parse_rating_text("3,9 de un máximo de 5").unwrap(), 3.9);
        assert_eq!(parse_rating_text("4 su 5").unwrap(), 4.0);
    }

    #[test]
    fn test_parse_rating_is_case_insensitive() {
        assert_eq!(parse_rating_text("4.1 OUT OF 5").unwrap(), 4.1);
    }

    #[test]
    fn test_parse_rating_uses_first_match() {
        assert_eq!(
            parse_rating_text("4.2 out of 5, previously 3.8 out of 5").unwrap(),
            4.2
        );
    }

    #[test]
    fn test_parse_rating_no_match() {
        assert_eq!(
            parse_rating_text("no rating here"),
            Err(NormalizeError::NoMatch {
                input: "no rating here".to_string()
            })
        );
        assert!(parse_rating_text("4.6 out of 10").is_err());
        assert!(parse_rating_text("").is_err());
    }

    #[test]
    fn test_parse_rating_out_of_range_is_no_match() {
        assert!(parse_rating_text("7.5 out of 5").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count_text("1,589 customer ratings").unwrap(), 1589);
        assert_eq!(parse_count_text("89").unwrap(), 89);
        assert_eq!(parse_count_text("0 ratings").unwrap(), 0);
        assert_eq!(parse_count_text("(12.345.678)").unwrap(), 12_345_678);
    }

    #[test]
    fn test_parse_count_strips_period_as_grouping() {
        // Documented limitation of the default policy.
        assert_eq!(parse_count_text("1.589").unwrap(), 1589);
        assert_eq!(parse_count_text("1.5").unwrap(), 15);
    }

    #[test]
    fn test_parse_count_no_match() {
        assert!(parse_count_text("customer ratings").is_err());
        assert!(parse_count_text("99999999999999999999999").is_err());
    }

    #[test]
    fn test_comma_decimal_policy() {
        let normalizer = Normalizer::new(SeparatorPolicy::CommaDecimal);
        assert_eq!(normalizer.parse_rating("4,6 von 5").unwrap(), 4.6);
        assert!(normalizer.parse_rating("4.6 out of 5").is_err());
        assert_eq!(normalizer.parse_count("1.589").unwrap(), 1589);
        assert_eq!(normalizer.parse_count("1.589,0").unwrap(), 1589);
    }

    #[test]
    fn test_period_decimal_policy() {
        let normalizer = Normalizer::new(SeparatorPolicy::PeriodDecimal);
        assert_eq!(normalizer.parse_rating("4.6 out of 5").unwrap(), 4.6);
        assert!(normalizer.parse_rating("4,6 von 5").is_err());
        assert_eq!(normalizer.parse_count("1,589").unwrap(), 1589);
        assert_eq!(normalizer.parse_count("1.5").unwrap(), 1);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "comma-decimal".parse::<SeparatorPolicy>().unwrap(),
            SeparatorPolicy::CommaDecimal
        );
        assert_eq!(
            "STRIP_BOTH".parse::<SeparatorPolicy>().unwrap(),
            SeparatorPolicy::StripBoth
        );
        assert!("both".parse::<SeparatorPolicy>().is_err());
    }

    #[test]
    fn test_policy_names_round_trip() {
        for policy in [
            SeparatorPolicy::StripBoth,
            SeparatorPolicy::CommaDecimal,
            SeparatorPolicy::PeriodDecimal,
        ] {
            assert_eq!(policy.as_str().parse::<SeparatorPolicy>().unwrap(), policy);
            assert_eq!(Normalizer::new(policy).policy(), policy);
        }
        assert_eq!(Normalizer::default().policy().as_str(), "strip_both");
    }

    #[test]
    fn test_parse_popover() {
        let html = r#"<span class="a-size-base">4.6 out of 5</span></div><div><span data-hook="total-rating-count">1,589 customer ratings</span>"#;
        let numbers = parse_popover_text(html).unwrap();
        assert_eq!(numbers.rating, 4.6);
        assert_eq!(numbers.count, 1589);
    }

    #[test]
    fn test_parse_popover_does_not_cross_lines() {
        let html = "<span>4.6 out of 5</span>\n<span>89 customer ratings</span>";
        assert!(parse_popover_text(html).is_err());
    }
}
