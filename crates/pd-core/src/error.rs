//! Error types for model parsing and the persisted document format.

use thiserror::Error;

/// Errors raised while reading values or documents into the model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A length such as `"794px"` could not be parsed.
    #[error("invalid length `{0}`")]
    InvalidLength(String),

    /// An image dimension (`px`, `%`, `auto`, `none`) could not be parsed.
    #[error("invalid size `{0}`")]
    InvalidSize(String),

    /// A transform string that is neither `none` nor `rotate(..deg)`.
    #[error("invalid transform `{0}`")]
    InvalidTransform(String),

    /// A scale factor that is zero or not a number.
    #[error("invalid scale factor `{0}`")]
    InvalidScale(String),

    /// A stacking index that is not an integer in `i32` range.
    #[error("invalid z-index `{0}`")]
    InvalidZIndex(String),

    /// An element or page size that is zero or negative.
    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },

    /// The document JSON is malformed.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but holds no pages.
    #[error("document has no pages")]
    EmptyDocument,

    /// A page inside the document failed validation.
    #[error("page {index}: {source}")]
    Page {
        index: usize,
        #[source]
        source: Box<CoreError>,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;
