//! Widget counters.
//!
//! Recorded through the `metrics` facade; they are no-ops unless the embedding
//! application installs a recorder.

pub struct AnnotatorMetrics;

impl AnnotatorMetrics {
    pub fn record_annotated(kind: &'static str) {
        ::metrics::counter!("review_confidence_widgets_annotated_total", "kind" => kind)
            .increment(1);
    }

    pub fn record_skipped(kind: &'static str, reason: &'static str) {
        ::metrics::counter!(
            "review_confidence_widgets_skipped_total",
            "kind" => kind,
            "reason" => reason
        )
        .increment(1);
    }

    pub fn record_page(widgets: usize) {
        ::metrics::counter!("review_confidence_pages_total").increment(1);
        ::metrics::histogram!("review_confidence_widgets_per_page").record(widgets as f64);
    }
}
