//! Unified error type for the ledserver-lib crate.
//!
//! [`LedserverError`] wraps module-specific errors (`TransportError`,
//! `StripError`, `DecodeError`) and domain-specific error kinds (`Config`,
//! `Color`). `From` impls allow `?` to propagate across module boundaries
//! seamlessly.
//!
//! Only transport bind/resolve and strip init errors are fatal to the
//! process; everything else is contained inside the serve loop.

use std::fmt;

use crate::strip::StripError;
use crate::transport::TransportError;
use crate::wire::DecodeError;

/// Unified error type for ledserver-lib operations.
#[derive(Debug)]
pub enum LedserverError {
    /// Transport error (address resolution, bind, receive).
    Transport(TransportError),
    /// Strip driver error (init, render).
    Strip(StripError),
    /// Wire decode error (empty, oversized, malformed payload).
    Decode(DecodeError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for LedserverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedserverError::Transport(e) => write!(f, "{e}"),
            LedserverError::Strip(e) => write!(f, "{e}"),
            LedserverError::Decode(e) => write!(f, "{e}"),
            LedserverError::Io(e) => write!(f, "I/O error: {e}"),
            LedserverError::Config(e) => write!(f, "Config error: {e}"),
            LedserverError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for LedserverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedserverError::Transport(e) => Some(e),
            LedserverError::Strip(e) => Some(e),
            LedserverError::Decode(e) => Some(e),
            LedserverError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for LedserverError {
    fn from(e: TransportError) -> Self {
        LedserverError::Transport(e)
    }
}

impl From<StripError> for LedserverError {
    fn from(e: StripError) -> Self {
        LedserverError::Strip(e)
    }
}

impl From<DecodeError> for LedserverError {
    fn from(e: DecodeError) -> Self {
        LedserverError::Decode(e)
    }
}

impl From<std::io::Error> for LedserverError {
    fn from(e: std::io::Error) -> Self {
        LedserverError::Io(e)
    }
}

/// Crate-level Result alias using [`LedserverError`].
pub type Result<T> = std::result::Result<T, LedserverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_transport_error() {
        let e: LedserverError = TransportError::Bind("0.0.0.0:1230: in use".into()).into();
        assert!(matches!(e, LedserverError::Transport(TransportError::Bind(_))));
    }

    #[test]
    fn from_strip_error() {
        let e: LedserverError = StripError::InitFailed("dma".into()).into();
        assert!(matches!(e, LedserverError::Strip(StripError::InitFailed(_))));
    }

    #[test]
    fn from_decode_error() {
        let e: LedserverError = DecodeError::Empty.into();
        assert!(matches!(e, LedserverError::Decode(DecodeError::Empty)));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: LedserverError = io_err.into();
        assert!(matches!(e, LedserverError::Io(_)));
    }

    #[test]
    fn display_config_error() {
        let e = LedserverError::Config("strip_length must be nonzero".into());
        assert_eq!(e.to_string(), "Config error: strip_length must be nonzero");
    }

    #[test]
    fn display_color_error() {
        let e = LedserverError::Color("bad hex".into());
        assert_eq!(e.to_string(), "Color error: bad hex");
    }

    #[test]
    fn source_chains_transport_error() {
        let e = LedserverError::Transport(TransportError::Recv("connection reset".into()));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("connection reset"));
    }

    #[test]
    fn source_none_for_string_variants() {
        let e = LedserverError::Config("test".into());
        assert!(std::error::Error::source(&e).is_none());
    }

    #[test]
    fn question_mark_propagation_transport_to_ledserver() {
        fn inner() -> crate::transport::Result<()> {
            Err(TransportError::Resolve("nohost:1230".into()))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(
            err,
            LedserverError::Transport(TransportError::Resolve(_))
        ));
    }
}
