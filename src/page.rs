//! Replays a saved listing page through the normalizer and estimator.
//!
//! Two kinds of rating widget are recognised:
//! - listing rows (`div [data-asin]`), where the star text and the review count
//!   sit in separate nodes and are parsed separately;
//! - hover cards (`div` with a `popover` class), where both numbers are pulled
//!   from the card's markup in a single pass.
//!
//! A row whose count container already carries the `processed-3b1b` marker, or
//! a widget already handled earlier in the same scan, is skipped. Widgets that
//! don't parse are skipped silently and only show up as diagnostics.

use std::collections::HashSet;
use std::sync::Arc;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info};

use crate::constants::{
    ASIN_ATTRIBUTE, LISTING_COUNT_TEXT_SELECTOR, LISTING_RATING_TEXT_SELECTOR,
    POPOVER_CONTAINER_SELECTOR, POPOVER_COUNT_TEXT_SELECTOR, POPOVER_RATING_TEXT_SELECTOR,
    PROCESSED_MARKER_ATTRIBUTE, PRODUCT_NODE_SELECTOR,
};
use crate::diagnostics::{Diagnostic, DiagnosticSink, NullSink};
use crate::estimate::{estimate_confidence_with, ConfidenceResult};
use crate::metrics::AnnotatorMetrics;
use crate::normalize::Normalizer;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector '{}': {:?}", css, e))
}

static PRODUCT_NODES: Lazy<Selector> = Lazy::new(|| selector(PRODUCT_NODE_SELECTOR));
static LISTING_RATING_TEXT: Lazy<Selector> = Lazy::new(|| selector(LISTING_RATING_TEXT_SELECTOR));
static LISTING_COUNT_TEXT: Lazy<Selector> = Lazy::new(|| selector(LISTING_COUNT_TEXT_SELECTOR));
static POPOVER_CONTAINERS: Lazy<Selector> = Lazy::new(|| selector(POPOVER_CONTAINER_SELECTOR));
static POPOVER_RATING_TEXT: Lazy<Selector> = Lazy::new(|| selector(POPOVER_RATING_TEXT_SELECTOR));
static POPOVER_COUNT_TEXT: Lazy<Selector> = Lazy::new(|| selector(POPOVER_COUNT_TEXT_SELECTOR));

const LISTING: &str = "listing";
const POPOVER: &str = "popover";

/// What the page script would write back for one widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// Bold badge appended to the review count container.
    Listing {
        asin: String,
        rating: f64,
        count: u64,
        result: ConfidenceResult,
        badge: String,
    },
    /// Replacement texts for the hover card's rating and count nodes.
    Popover {
        rating: f64,
        count: u64,
        result: ConfidenceResult,
        rating_text: String,
        count_text: String,
    },
}

impl Annotation {
    pub fn result(&self) -> &ConfidenceResult {
        match self {
            Annotation::Listing { result, .. } | Annotation::Popover { result, .. } => result,
        }
    }
}

/// Receives annotations as soon as they are produced.
pub trait AnnotationObserver {
    fn on_annotation(&mut self, annotation: &Annotation);
}

impl<F: FnMut(&Annotation)> AnnotationObserver for F {
    fn on_annotation(&mut self, annotation: &Annotation) {
        self(annotation)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageReport {
    pub annotations: Vec<Annotation>,
    pub skipped: usize,
}

/// Formats a percentage or rating the way the page shows it: shortest decimal
/// form, no trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

pub fn listing_badge(result: &ConfidenceResult) -> String {
    format!("({}%)", format_number(result.confidence_percent))
}

pub fn popover_rating_text(rating: f64, result: &ConfidenceResult) -> String {
    format!(
        "{} out of 5 ({}%)",
        format_number(rating),
        format_number(result.confidence_percent)
    )
}

pub fn popover_count_text(count: u64, result: &ConfidenceResult) -> String {
    format!(
        "{} reviews. OR {}% -> CR {}% (diff {}%)",
        count,
        format_number(result.original_percent),
        format_number(result.confidence_percent),
        format_number(result.correction)
    )
}

enum Outcome {
    Annotated(Annotation),
    Skipped(&'static str),
}

pub struct PageAnnotator {
    normalizer: Normalizer,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for PageAnnotator {
    fn default() -> Self {
        Self::new(Normalizer::default(), Arc::new(NullSink))
    }
}

impl PageAnnotator {
    pub fn new(normalizer: Normalizer, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { normalizer, sink }
    }

    pub fn annotate_html(&self, html: &str) -> PageReport {
        let document = Html::parse_document(html);
        self.annotate(&document)
    }

    pub fn annotate(&self, document: &Html) -> PageReport {
        let mut annotations = Vec::new();
        let skipped = self.annotate_with_observer(document, &mut |a: &Annotation| {
            annotations.push(a.clone())
        });
        PageReport {
            annotations,
            skipped,
        }
    }

    /// Walks every widget on the page, handing each annotation to `observer`.
    /// Returns the number of widgets that were skipped.
    pub fn annotate_with_observer(
        &self,
        document: &Html,
        observer: &mut dyn AnnotationObserver,
    ) -> usize {
        let mut processed = HashSet::new();
        let mut annotated = 0usize;
        let mut skipped = 0usize;

        let mut handle = |outcome: Outcome, kind: &'static str| match outcome {
            Outcome::Annotated(annotation) => {
                AnnotatorMetrics::record_annotated(kind);
                annotated += 1;
                observer.on_annotation(&annotation);
            }
            Outcome::Skipped(reason) => {
                AnnotatorMetrics::record_skipped(kind, reason);
                skipped += 1;
            }
        };

        for popover in document.select(&POPOVER_CONTAINERS) {
            let outcome = self.handle_popover(popover, &mut processed);
            handle(outcome, POPOVER);
        }

        for product in document.select(&PRODUCT_NODES) {
            let outcome = self.handle_product(product, &mut processed);
            handle(outcome, LISTING);
        }

        AnnotatorMetrics::record_page(annotated + skipped);
        info!(annotated, skipped, "Page scan finished");
        skipped
    }

    fn handle_product(
        &self,
        product: ElementRef<'_>,
        processed: &mut HashSet<NodeId>,
    ) -> Outcome {
        let asin = product.value().attr(ASIN_ATTRIBUTE).unwrap_or_default().to_string();
        let widget = format!("listing {}", asin);
        self.sink.record(&Diagnostic::WidgetFound {
            widget: widget.clone(),
        });

        let Some(rating_node) = product.select(&LISTING_RATING_TEXT).next() else {
            return self.missing(&widget, LISTING_RATING_TEXT_SELECTOR);
        };
        let Some(count_node) = product.select(&LISTING_COUNT_TEXT).next() else {
            return self.missing(&widget, LISTING_COUNT_TEXT_SELECTOR);
        };
        let Some(container) = count_node
            .parent()
            .and_then(|parent| parent.parent())
            .and_then(ElementRef::wrap)
        else {
            return self.missing(&widget, "count container");
        };

        if container.value().attr(PROCESSED_MARKER_ATTRIBUTE).is_some()
            || !processed.insert(container.id())
        {
            self.sink.record(&Diagnostic::AlreadyProcessed { widget });
            return Outcome::Skipped("already_processed");
        }

        let rating_text = rating_node.text().collect::<String>();
        let rating = match self.normalizer.parse_rating(&rating_text) {
            Ok(rating) => rating,
            Err(_) => return self.no_match(widget, rating_text),
        };
        let count_text = count_node.text().collect::<String>();
        let count = match self.normalizer.parse_count(&count_text) {
            Ok(count) => count,
            Err(_) => return self.no_match(widget, count_text),
        };
        self.sink.record(&Diagnostic::RatingParsed { rating, count });

        let result = estimate_confidence_with(rating, count, self.sink.as_ref());
        debug!(asin = %asin, confidence = result.confidence_percent, "Annotated listing");
        Outcome::Annotated(Annotation::Listing {
            badge: listing_badge(&result),
            asin,
            rating,
            count,
            result,
        })
    }

    fn handle_popover(
        &self,
        popover: ElementRef<'_>,
        processed: &mut HashSet<NodeId>,
    ) -> Outcome {
        let widget = POPOVER.to_string();
        self.sink.record(&Diagnostic::WidgetFound {
            widget: widget.clone(),
        });

        let markup = popover.inner_html();
        let numbers = match self.normalizer.parse_popover(&markup) {
            Ok(numbers) => numbers,
            Err(_) => return self.no_match(widget, markup),
        };
        self.sink.record(&Diagnostic::RatingParsed {
            rating: numbers.rating,
            count: numbers.count,
        });

        let Some(rating_node) = popover.select(&POPOVER_RATING_TEXT).next() else {
            return self.missing(&widget, POPOVER_RATING_TEXT_SELECTOR);
        };
        if popover.select(&POPOVER_COUNT_TEXT).next().is_none() {
            return self.missing(&widget, POPOVER_COUNT_TEXT_SELECTOR);
        }
        // Nested popover divs share the same rating node.
        if !processed.insert(rating_node.id()) {
            self.sink.record(&Diagnostic::AlreadyProcessed { widget });
            return Outcome::Skipped("already_processed");
        }

        let result = estimate_confidence_with(numbers.rating, numbers.count, self.sink.as_ref());
        Outcome::Annotated(Annotation::Popover {
            rating_text: popover_rating_text(numbers.rating, &result),
            count_text: popover_count_text(numbers.count, &result),
            rating: numbers.rating,
            count: numbers.count,
            result,
        })
    }

    fn missing(&self, widget: &str, selector: &str) -> Outcome {
        self.sink.record(&Diagnostic::SelectorMissing {
            widget: widget.to_string(),
            selector: selector.to_string(),
        });
        Outcome::Skipped("selector_missing")
    }

    fn no_match(&self, widget: String, text: String) -> Outcome {
        self.sink.record(&Diagnostic::NoMatch { widget, text });
        Outcome::Skipped("no_match")
    }
}
