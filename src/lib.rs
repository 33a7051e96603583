pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod estimate;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod page;

pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use error::{ConfidenceError, NormalizeError, Result};
pub use estimate::{estimate_confidence, ConfidenceResult};
pub use normalize::{parse_count_text, parse_rating_text, SeparatorPolicy};
