//! Error classification for status-ping attempts.

use std::fmt;
use std::io;

use thiserror::Error;

/// Framing or payload errors in the modern status protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// A VarInt continued past its fifth byte.
    #[error("VarInt is longer than 5 bytes")]
    VarIntTooLong,

    /// The stream or buffer ended before the declared length was read.
    #[error("packet truncated")]
    Truncated,

    /// A declared packet or string length is negative or above the limit.
    #[error("invalid length {0}")]
    InvalidLength(i32),

    /// The status payload is not valid UTF-8.
    #[error("status payload is not valid UTF-8")]
    InvalidUtf8,

    /// The status JSON is malformed or misses a required field.
    #[error("invalid status JSON: {0}")]
    InvalidJson(String),

    /// The description resolved to an empty string.
    #[error("status response has an empty description")]
    EmptyDescription,
}

/// Why a single probe attempt failed.
///
/// Every failure is captured here and stored in a failed
/// [`super::Snapshot`]; nothing unwinds past a codec.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The connection could not be established or broke mid-exchange.
    #[error("connection failed: {source}")]
    Connect {
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// The deadline passed before the exchange completed.
    #[error("timed out")]
    Timeout,

    /// The modern status response violated the protocol.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// The legacy kick packet could not be parsed.
    #[error("malformed legacy response: {reason}")]
    MalformedLegacy {
        /// What was wrong with the response
        reason: String,
    },
}

impl ProbeError {
    /// Creates a `MalformedLegacy` error.
    #[must_use]
    pub fn malformed_legacy(reason: impl Into<String>) -> Self {
        Self::MalformedLegacy {
            reason: reason.into(),
        }
    }

    /// Returns the flat classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ProbeErrorKind {
        match self {
            Self::Connect { .. } => ProbeErrorKind::ConnectFailure,
            Self::Timeout => ProbeErrorKind::Timeout,
            Self::Protocol(_) => ProbeErrorKind::ProtocolViolation,
            Self::MalformedLegacy { .. } => ProbeErrorKind::MalformedLegacyResponse,
        }
    }
}

/// Maps a socket error raised during the modern exchange.
///
/// An early EOF means the server closed before sending the declared bytes.
pub(crate) fn modern_io_error(source: io::Error) -> ProbeError {
    if source.kind() == io::ErrorKind::UnexpectedEof {
        ProbeError::Protocol(ProtocolViolation::Truncated)
    } else {
        ProbeError::Connect { source }
    }
}

/// Maps a socket error raised during the legacy exchange.
pub(crate) fn legacy_io_error(source: io::Error) -> ProbeError {
    if source.kind() == io::ErrorKind::UnexpectedEof {
        ProbeError::malformed_legacy("response truncated")
    } else {
        ProbeError::Connect { source }
    }
}

/// Flat error classification, cheap to copy into mirrored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeErrorKind {
    /// Connection refused, unreachable, or reset.
    ConnectFailure,
    /// Deadline exceeded at connect or read.
    Timeout,
    /// Malformed modern response.
    ProtocolViolation,
    /// Malformed legacy response.
    MalformedLegacyResponse,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectFailure => "ConnectFailure",
            Self::Timeout => "Timeout",
            Self::ProtocolViolation => "ProtocolViolation",
            Self::MalformedLegacyResponse => "MalformedLegacyResponse",
        };
        f.write_str(name)
    }
}
