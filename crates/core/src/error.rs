//! Error types for nullcheck

use thiserror::Error;

/// A single key that differs between a reference and an actual
/// univariate summary.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMismatch {
    pub key: String,
    pub reference: String,
    /// `None` when the key is missing from the actual summary
    pub actual: Option<String>,
}

impl std::fmt::Display for KeyMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.actual {
            Some(actual) => write!(f, "{}: reference={} actual={}", self.key, self.reference, actual),
            None => write!(f, "{}: reference={} actual=<missing>", self.key, self.reference),
        }
    }
}

/// Main error type for nullcheck operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("module {module} failed (status {status}): {stderr}")]
    ModuleFailed {
        module: String,
        status: String,
        stderr: String,
    },

    #[error("cannot parse {what} from {input:?}")]
    Parse { what: &'static str, input: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error(
        "univariate statistics of <{raster}> do not fit the reference ({}):\nreference:\n{reference}\nactual:\n{actual}",
        join_mismatches(.mismatches)
    )]
    StatisticsMismatch {
        raster: String,
        reference: String,
        actual: String,
        mismatches: Vec<KeyMismatch>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_mismatches(mismatches: &[KeyMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for nullcheck operations
pub type Result<T> = std::result::Result<T, Error>;
