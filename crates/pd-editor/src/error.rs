//! Editor errors. Display strings are the messages shown to the user.

use pd_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Please select an image to crop first.")]
    NothingToCrop,

    #[error("Only images can be cropped.")]
    NotCroppable,

    #[error("Please select an image first.")]
    NotAnImage,

    #[error("Please select an object to rotate.")]
    NothingToRotate,

    #[error("Please select an element first.")]
    NothingSelected,

    #[error("Unknown border style `{0}`.")]
    UnknownBorder(String),

    #[error("Page {0} does not exist.")]
    NoSuchPage(usize),

    #[error("Enter a size as width,height (e.g. 800px,600px), got `{0}`.")]
    InvalidPageSize(String),

    #[error("Tables need at least one row and one column.")]
    InvalidTableSize,

    #[error("Elements need a positive width and height, got {width} by {height}.")]
    InvalidElementSize { width: f64, height: f64 },

    #[error("Please choose an image to insert.")]
    EmptyImageSource,

    #[error("Shapes need a clip path.")]
    EmptyClipPath,

    #[error("Error opening file: {0}")]
    Document(#[from] CoreError),

    #[error("invalid editor config: {0}")]
    Config(#[source] serde_json::Error),

    #[error("invalid editor config: {0}")]
    InvalidConfig(String),

    #[error("history snapshot could not be encoded: {0}")]
    Snapshot(#[from] rmp_serde::encode::Error),

    #[error("Export failed: {0}")]
    Export(String),
}

pub type EditorResult<T> = Result<T, EditorError>;
