//! Diagnostic side channel.
//!
//! The normalizer, estimator and page driver never log directly; they report
//! [`Diagnostic`] events to whatever [`DiagnosticSink`] they were handed. The
//! binary wires in [`TracingSink`] when the debug flag is on and [`NullSink`]
//! otherwise, while tests use [`RecordingSink`] to assert on what was emitted.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use crate::constants::LOG_PREFIX;

/// Something worth telling a developer about while a page is processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Diagnostic {
    WidgetFound { widget: String },
    AlreadyProcessed { widget: String },
    SelectorMissing { widget: String, selector: String },
    NoMatch { widget: String, text: String },
    RatingParsed { rating: f64, count: u64 },
    ConfidenceComputed {
        rating: f64,
        count: u64,
        good_ratings: f64,
        bad_ratings: f64,
        original_percent: f64,
        confidence_percent: f64,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::WidgetFound { widget } => write!(f, "Found {} widget.", widget),
            Diagnostic::AlreadyProcessed { widget } => {
                write!(f, "Already processed {}. Moving on.", widget)
            }
            Diagnostic::SelectorMissing { widget, selector } => {
                write!(f, "Failed to find '{}' in {}.", selector, widget)
            }
            Diagnostic::NoMatch { widget, text } => {
                write!(f, "No rating pattern in {} text {:?}.", widget, text)
            }
            Diagnostic::RatingParsed { rating, count } => {
                write!(f, "Rating is {} out of 5 with {} ratings.", rating, count)
            }
            Diagnostic::ConfidenceComputed {
                rating,
                count,
                good_ratings,
                bad_ratings,
                original_percent,
                confidence_percent,
            } => write!(
                f,
                "Original rating is {}% based on {}/5. Estimating {} good and {} bad ratings out of a total {}, with a corrected confidence of {}%.",
                original_percent, rating, good_ratings, bad_ratings, count, confidence_percent
            ),
        }
    }
}

/// Capability to record a diagnostic event.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &Diagnostic);
}

/// Drops every event. Used when debugging is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: &Diagnostic) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &Diagnostic) {
        debug!("{} {}", LOG_PREFIX, event);
    }
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: &Diagnostic) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}

/// Picks the sink matching the debug flag.
pub fn sink_for(debug: bool) -> Arc<dyn DiagnosticSink> {
    if debug {
        Arc::new(TracingSink)
    } else {
        Arc::new(NullSink)
    }
}
