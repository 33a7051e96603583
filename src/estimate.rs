//! Confidence rating for a star average and its review count.
//!
//! The displayed average is treated as the fraction of "good" reviews, and the
//! success probability is estimated with add-one smoothing (a uniform Beta(1,1)
//! prior). With few reviews the estimate sits near 50%; it converges on the
//! displayed average as the count grows.

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticSink, NullSink};

/// Result of [`estimate_confidence`], in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceResult {
    /// Smoothed estimate, 3 significant figures.
    pub confidence_percent: f64,
    /// Plain `rating / 5`, 3 significant figures.
    pub original_percent: f64,
    /// `original - confidence`, 2 significant figures.
    pub correction: f64,
}

/// Unrounded intermediate values of the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingEvidence {
    pub rating_absolute: f64,
    pub good_ratings: f64,
    pub bad_ratings: f64,
    pub expected_success: f64,
}

impl RatingEvidence {
    pub fn from_rating(rating: f64, count: u64) -> Self {
        let count = count as f64;
        let rating_absolute = rating / 5.0;
        let good_ratings = count * rating_absolute;
        let bad_ratings = count * (1.0 - rating_absolute);
        let expected_success = (good_ratings + 1.0) / (count + 2.0);
        Self {
            rating_absolute,
            good_ratings,
            bad_ratings,
            expected_success,
        }
    }
}

/// Rounds `value` to `digits` significant digits, the way the page displays
/// percentages.
///
/// Rounding works on the exact decimal expansion of the double, so `4.55`
/// (stored as `4.5499…`) rounds down to `4.5`. Exact ties round away from zero.
/// `round_to_precision(91.0769, 3) == 91.1`, `round_to_precision(100.0, 3) == 100.0`.
pub fn round_to_precision(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    let digits = digits as usize;
    // Extra digits are far beyond what separates a double from a decimal tie.
    let expansion = format!("{:.*e}", digits + 24, value.abs());
    let Some((mantissa, exponent)) = expansion.split_once('e') else {
        return value;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value;
    };
    let significand: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let (kept, rest) = significand.split_at(digits);
    let Ok(mut rounded) = kept.parse::<u64>() else {
        return value;
    };
    if rest.as_bytes().first().is_some_and(|d| *d >= b'5') {
        rounded += 1;
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}e{}", sign, rounded, exponent - (digits as i32 - 1))
        .parse()
        .unwrap_or(value)
}

pub fn estimate_confidence(rating: f64, count: u64) -> ConfidenceResult {
    estimate_confidence_with(rating, count, &NullSink)
}

/// [`estimate_confidence`], reporting the intermediate values to `sink`.
pub fn estimate_confidence_with(
    rating: f64,
    count: u64,
    sink: &dyn DiagnosticSink,
) -> ConfidenceResult {
    let evidence = RatingEvidence::from_rating(rating, count);
    let original_percent = round_to_precision(evidence.rating_absolute * 100.0, 3);
    let confidence_percent = round_to_precision(evidence.expected_success * 100.0, 3);
    let correction = round_to_precision(original_percent - confidence_percent, 2);

    sink.record(&Diagnostic::ConfidenceComputed {
        rating,
        count,
        good_ratings: evidence.good_ratings,
        bad_ratings: evidence.bad_ratings,
        original_percent,
        confidence_percent,
    });

    ConfidenceResult {
        confidence_percent,
        original_percent,
        correction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_round_to_precision() {
        assert!(approx(round_to_precision(100.0, 3), 100.0));
        assert!(approx(round_to_precision(4.5, 3), 4.5));
        assert!(approx(round_to_precision(0.0456, 3), 0.0456));
        assert!(approx(round_to_precision(91.076923, 3), 91.1));
        assert!(approx(round_to_precision(99.96, 3), 100.0));
        assert!(approx(round_to_precision(12345.0, 3), 12300.0));
        assert!(approx(round_to_precision(-0.9000000000000057, 2), -0.9));
        assert_eq!(round_to_precision(0.0, 3), 0.0);
    }

    #[test]
    fn test_round_to_precision_uses_stored_decimal_value() {
        // 4.55 is stored just below 4.55; scaling by 10 would land on 45.5 exactly.
        assert_eq!(round_to_precision(4.55, 2), 4.5);
        assert_eq!(round_to_precision(-4.55, 2), -4.5);
        assert_eq!(round_to_precision(1.005, 3), 1.0);
        assert_eq!(round_to_precision(4.545454545454546, 3), 4.55);
    }

    #[test]
    fn test_round_to_precision_exact_ties_round_up() {
        assert_eq!(round_to_precision(0.125, 2), 0.13);
        assert_eq!(round_to_precision(2.5, 1), 3.0);
        assert_eq!(round_to_precision(-2.5, 1), -3.0);
        assert_eq!(round_to_precision(28.5, 2), 29.0);
        assert_eq!(round_to_precision(0.5, 1), 0.5);
    }

    #[test]
    fn test_near_boundary_results() {
        let result = estimate_confidence(0.0, 20);
        assert_eq!(result.confidence_percent, 4.55);
        assert_eq!(result.correction, -4.5);

        let result = estimate_confidence(1.4, 78);
        assert_eq!(result.confidence_percent, 28.5);
        assert_eq!(result.original_percent, 28.0);
        assert_eq!(result.correction, -0.5);

        let result = estimate_confidence(0.7, 1438);
        assert_eq!(result.confidence_percent, 14.0);
        assert_eq!(result.original_percent, 14.0);
        assert_eq!(result.correction, 0.0);

        let result = estimate_confidence(0.1, 17);
        assert_eq!(result.confidence_percent, 7.05);
        assert_eq!(result.original_percent, 2.0);
        assert_eq!(result.correction, -5.0);
    }

    #[test]
    fn test_worked_example() {
        let evidence = RatingEvidence::from_rating(4.6, 89);
        assert!((evidence.good_ratings - 81.88).abs() < 1e-9);
        assert!((evidence.bad_ratings - 7.12).abs() < 1e-9);
        assert!((evidence.expected_success - 82.88 / 91.0).abs() < 1e-12);

        let result = estimate_confidence(4.6, 89);
        assert!(approx(result.original_percent, 92.0));
        assert!(approx(result.confidence_percent, 91.1));
        assert!(approx(result.correction, 0.9));
    }

    #[test]
    fn test_zero_reviews_is_neutral() {
        for rating in [0.0, 1.0, 2.5, 4.6, 5.0] {
            let result = estimate_confidence(rating, 0);
            assert_eq!(result.confidence_percent, 50.0);
        }
    }

    #[test]
    fn test_zero_rating() {
        let result = estimate_confidence(0.0, 10);
        assert_eq!(result.original_percent, 0.0);
        assert!(approx(result.confidence_percent, 8.33));
        assert!(approx(result.correction, -8.3));
    }

    #[test]
    fn test_reports_computation() {
        let sink = RecordingSink::new();
        estimate_confidence_with(4.6, 89, &sink);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Diagnostic::ConfidenceComputed {
                count,
                original_percent,
                confidence_percent,
                ..
            } => {
                assert_eq!(*count, 89);
                assert!(approx(*original_percent, 92.0));
                assert!(approx(*confidence_percent, 91.1));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
