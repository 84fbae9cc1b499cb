use std::fmt::Display;
use std::io;

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a golden file comparison can report.
///
/// `NotEqual` is the only variant that means "the assertion failed"; every other
/// variant is an operational failure (bad configuration, unsupported value, I/O).
#[derive(Debug, Error)]
pub enum Error {
    #[error("no golden file path")]
    NoPath,

    #[error("chunk size must be at least one byte")]
    InvalidChunkSize,

    #[error("only strings and byte buffers are supported by the raw marshaller, got {kind}; use a structured marshaller such as Json")]
    UnsupportedType { kind: &'static str },

    #[error("unknown extension {extension:?}, please provide a marshaller")]
    UnknownExtension { extension: String },

    #[error("value is absent and cannot be marshalled")]
    InvalidType,

    #[error("golden file does not match")]
    NotEqual { diff: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::DeError),

    /// Failure raised by a user supplied marshaller.
    #[error(transparent)]
    Custom(#[from] anyhow::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn is_not_equal(&self) -> bool {
        matches!(self, Error::NotEqual { .. })
    }

    /// Rendered diff of a mismatch, `None` for any other error.
    pub fn diff(&self) -> Option<&str> {
        match self {
            Error::NotEqual { diff } => Some(diff),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_is_only_exposed_for_mismatches() {
        let err = Error::NotEqual {
            diff: "-a\n+b\n".into(),
        };
        assert!(err.is_not_equal());
        assert_eq!(err.diff(), Some("-a\n+b\n"));

        let err = Error::NoPath;
        assert!(!err.is_not_equal());
        assert_eq!(err.diff(), None);
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        match err {
            Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
