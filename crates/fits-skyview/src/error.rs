use thiserror::Error;

/// All errors that can occur while ingesting images or answering point queries.
#[derive(Debug, Error)]
pub enum Error {
    /// Header could not be used: missing terminator, bad axes, bad layout.
    #[error("malformed FITS header: {0}")]
    MalformedHeader(String),
    /// A required keyword was not found in the header.
    #[error("missing required keyword: {0}")]
    MissingKeyword(String),
    /// A keyword exists but its value cannot be coerced to the requested type.
    #[error("keyword {keyword} is not {expected}")]
    TypeMismatch {
        keyword: String,
        expected: &'static str,
    },
    /// CTYPE names a projection other than TAN.
    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),
    /// The pixel-to-world matrix cannot be inverted.
    #[error("degenerate WCS matrix: determinant={determinant:.6e}")]
    DegenerateMatrix { determinant: f64 },
    /// Every sample has the same value, so there is no range to display.
    #[error("image has no dynamic range (all samples equal {value})")]
    FlatImage { value: f64 },
    /// Point query on an identifier that was never registered.
    #[error("no coordinate mapping registered for image {0:?}")]
    UnknownImage(String),
    /// Unrecognized BITPIX value.
    #[error("invalid BITPIX value: {0}")]
    InvalidBitpix(i64),
    /// Data unit is shorter than the header declares.
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Render settings outside their valid range.
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),
    /// PNG encoding failed.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    /// An I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
