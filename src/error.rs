use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelcraftError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid `{parameter}`: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Missing column '{column}' (available: {available:?})")]
    MissingColumn { column: String, available: Vec<String> },

    #[error("Timestamp error: {0}")]
    Timestamp(String),

    #[error("Labeling function '{function}' signature mismatch: {reason}")]
    SignatureMismatch { function: String, reason: String },

    #[error("Labeling failed for entity '{entity}' at cutoff {cutoff}: {message}")]
    Labeling {
        entity: String,
        cutoff: String,
        message: String,
    },

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Search interrupted after {completed_entities} entities")]
    Interrupted { completed_entities: usize },

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl LabelcraftError {
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelcraftError>;
