use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A problem with the job-pattern configuration. Any of these makes the
/// ruleset unusable; the classifier refuses to build.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("failed to read pattern config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pattern config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pattern config section `{section}` must be an object of bucket -> [patterns]")]
    SectionShape { section: String },

    #[error("{section}.{bucket}: patterns must be a list")]
    BucketShape { section: String, bucket: String },

    #[error("{section}.{bucket}[{index}]: missing 'pattern' in entry")]
    MissingPattern {
        section: String,
        bucket: String,
        index: usize,
    },

    #[error("{section}.{bucket}: invalid regex '{pattern}': {source}")]
    InvalidRegex {
        section: String,
        bucket: String,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Every problem found while validating a pattern config.
#[derive(Debug, Default)]
pub struct PatternErrors(pub Vec<PatternError>);

impl PatternErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for PatternErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid job pattern config:")?;
        for err in &self.0 {
            write!(f, "\n- {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for PatternErrors {}
