//! Protocol and configuration error types.

use crate::header::Command;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while encoding, decoding or buffering messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("bad buffer size: {len} bytes (need at least {min})")]
    SizeError { len: usize, min: usize },

    #[error("wrong magic number: {0}")]
    MagicMismatch(u8),

    #[error("unknown command type: {0:#04x}")]
    UnknownCommand(u8),

    #[error("bad header size for {command:?} (got={got}, expected={expected})")]
    HeaderSizeError {
        command: Command,
        got: u16,
        expected: u16,
    },

    #[error("buffer space not ready (need={need}, have={have})")]
    OutOfData { need: usize, have: usize },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("string field contains an interior NUL byte")]
    InteriorNul,

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("allocator returned {got} bytes of capacity, {requested} requested")]
    AllocationFailed { requested: usize, got: usize },

    #[error("encoded {got} bytes, header declares {expected}")]
    EncodedSizeMismatch { expected: usize, got: usize },
}

impl ProtocolError {
    /// Returns whether the operation may succeed once more bytes arrive.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProtocolError::OutOfData { .. })
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_data_retryable() {
        assert!(ProtocolError::OutOfData { need: 4, have: 1 }.is_retryable());

        assert!(!ProtocolError::MagicMismatch(0).is_retryable());
        assert!(!ProtocolError::UnknownCommand(b'x').is_retryable());
        assert!(!ProtocolError::SizeError { len: 3, min: 12 }.is_retryable());
        assert!(!ProtocolError::InvalidUtf8.is_retryable());
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::SizeError { len: 3, min: 12 };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains("12"));

        let err = ProtocolError::MagicMismatch(7);
        assert!(err.to_string().contains("magic"));

        // Command bytes are shown in hex
        let err = ProtocolError::UnknownCommand(b'x');
        assert!(err.to_string().contains("0x78"));

        let err = ProtocolError::HeaderSizeError {
            command: Command::Append,
            got: 20,
            expected: 28,
        };
        let msg = err.to_string();
        assert!(msg.contains("Append"));
        assert!(msg.contains("got=20"));
        assert!(msg.contains("expected=28"));

        let err = ProtocolError::OutOfData { need: 10, have: 2 };
        assert!(err.to_string().contains("need=10"));

        let err = ProtocolError::MessageTooLarge {
            size: 70000,
            max: 65535,
        };
        assert!(err.to_string().contains("70000"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ValidationError("max_message_size too small".into());
        assert!(err.to_string().contains("too small"));

        let err = ConfigError::ParseError(PathBuf::from("/etc/replog.yaml"), "bad".into());
        assert!(err.to_string().contains("/etc/replog.yaml"));
    }
}
