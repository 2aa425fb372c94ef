//! Library error type.
//!
//! Every failure in the analysis core is a precondition violation detected
//! before any computation starts; there is no retry or partial-result path.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A precondition on the inputs was violated (shape, label set, window
    /// size, unknown name, NaN under [`NanPolicy::Raise`](crate::NanPolicy)).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested mode exists by name but has no implementation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A numerical routine (SVD, FFT) failed to produce a result.
    #[error("numerical failure: {0}")]
    Numerical(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for returning [`Error::InvalidArgument`].
macro_rules! invalid {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::InvalidArgument(format!($($arg)*)))
    };
}
pub(crate) use invalid;
