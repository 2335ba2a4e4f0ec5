//! Error types for the transparency-sieve crate.

/// Errors raised while decoding an image buffer for classification.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The buffer holds no bytes at all.
    #[error("empty image buffer")]
    Empty,

    /// The generic decoder rejected the buffer (unknown format, truncated data, ...).
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// The PNG decoder rejected the buffer.
    #[error("PNG decode failed: {0}")]
    Png(#[from] png::DecodingError),

    /// The GIF decoder rejected the buffer.
    #[error("GIF decode failed: {0}")]
    Gif(#[from] gif::DecodingError),

    /// The GIF stream contains no image frame.
    #[error("GIF has no frames")]
    NoFrames,
}

/// Errors that can occur while classifying, transferring, or annotating images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image bytes could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred while loading or saving an image file.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// An object-store operation failed.
    #[error("{op} failed for {bucket}/{key}: {message}")]
    Store {
        /// Operation name (`list`, `get`, `copy`).
        op: &'static str,
        /// Bucket the operation targeted.
        bucket: String,
        /// Object key, empty for bucket-level operations.
        key: String,
        /// Backend error text.
        message: String,
    },

    /// The face detection model could not be loaded.
    #[cfg(feature = "faces")]
    #[error("failed to load face model: {0}")]
    Model(String),
}

impl Error {
    /// Build a [`Error::Store`] from any displayable backend error.
    pub fn store(
        op: &'static str,
        bucket: impl Into<String>,
        key: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Store {
            op,
            bucket: bucket.into(),
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let store = Error::store("copy", "src", "a/b.png", "access denied");
        let msg = store.to_string();
        assert!(msg.contains("copy"));
        assert!(msg.contains("src/a/b.png"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn decode_error_is_transparent_through_crate_error() {
        let err: Error = DecodeError::Empty.into();
        assert_eq!(err.to_string(), "empty image buffer");
        assert!(matches!(err, Error::Decode(DecodeError::Empty)));
    }
}
