use thiserror::Error;

/// Failure to pull a number out of a piece of widget text.
///
/// A malformed literal (matched but unparseable, or outside the accepted range)
/// is reported the same way: the widget is simply left alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no recognisable number in {input:?}")]
    NoMatch { input: String },
}

impl NormalizeError {
    pub fn no_match(input: &str) -> Self {
        NormalizeError::NoMatch {
            input: input.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfidenceError {
    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConfidenceError>;
