use thiserror::Error;

use crate::ffi::webp::Vp8Status;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Boundary access error: {0}")]
    BoundaryAccessError(String),

    #[error("Allocation error: {0}")]
    AllocationError(String),

    #[error("Invalid input: {0}")]
    InvalidInputError(String),

    #[error("Codec rejected input: {0}")]
    CodecRejectedError(String),

    #[error("Codec status: {0}")]
    CodecStatusError(Vp8Status),

    #[error("Insufficient destination capacity: {0}")]
    InsufficientCapacityError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Job error: {0}")]
    JobError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`BridgeError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl BridgeError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a boundary access error (a caller array could not be pinned).
    boundary_access => BoundaryAccessError,
    /// Create an allocation error.
    allocation => AllocationError,
    /// Create an invalid input error.
    invalid_input => InvalidInputError,
    /// Create a codec rejection error.
    codec_rejected => CodecRejectedError,
    /// Create an insufficient destination capacity error.
    insufficient_capacity => InsufficientCapacityError,
    /// Create a configuration error.
    config => ConfigError,
    /// Create an image error.
    image => ImageError,
    /// Create a cache error.
    cache => CacheError,
    /// Create a job error.
    job => JobError,
}

impl BridgeError {
    /// The VP8 status code that best describes this error, for callers that
    /// only understand codec status codes.
    pub fn status(&self) -> Vp8Status {
        match self {
            Self::CodecStatusError(status) => *status,
            Self::AllocationError(_) => Vp8Status::OutOfMemory,
            Self::CodecRejectedError(_) => Vp8Status::BitstreamError,
            _ => Vp8Status::InvalidParam,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        Self::CacheError(e.to_string())
    }
}

impl From<serde_yml::Error> for BridgeError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for BridgeError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
