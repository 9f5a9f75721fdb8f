use thiserror::Error;

#[derive(Error, Debug)]
pub enum TiaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid omit pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown coverage dump format")]
    UnknownFormat,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TiaError>;
