/// Error types shared across the storefront
///
/// Each concern gets its own enum so callers can match on what
/// actually went wrong instead of parsing strings.

use thiserror::Error;

/// Failures talking to the catalog database
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed JSON column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to prepare data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Failures while decoding, resizing or re-encoding an image
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("failed to load image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to read image header: {0}")]
    Header(#[source] std::io::Error),

    #[error("target canvas has no area ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("encoder produced no data")]
    EmptyOutput,

    #[error("resize task failed: {0}")]
    Task(String),
}

/// Failures in the file-backed object storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    Upload(#[source] std::io::Error),

    #[error("delete failed: {0}")]
    Delete(#[source] std::io::Error),

    #[error("object name is not a plain file name: {0}")]
    InvalidName(String),
}

/// Failures while turning a cart into an order
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("missing or invalid {0}")]
    InvalidField(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("could not determine a data directory")]
    NoDataDir,
}
