// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for wellgate-witsml.

use thiserror::Error;

/// Result type using WitsmlError.
pub type Result<T> = std::result::Result<T, WitsmlError>;

/// Errors raised by the store protocol client and its transport binding.
#[derive(Debug, Error)]
pub enum WitsmlError {
    /// The endpoint rejected the credentials (HTTP 401/403).
    #[error("access to '{server}' was denied, verify credentials")]
    AuthenticationFailed {
        /// Hostname of the rejecting server.
        server: String,
    },

    /// The remote request crashed server-side (HTTP 5xx).
    #[error("remote request to '{server}' crashed")]
    RemoteCrashed {
        /// Hostname of the crashing server.
        server: String,
    },

    /// Connectivity, TLS, or timeout failure below the protocol layer.
    #[error("transport error for '{server}': {details}")]
    Transport {
        /// Hostname of the unreachable server.
        server: String,
        /// Underlying failure description.
        details: String,
    },

    /// The store answered with a non-success result code.
    #[error("store rejected the request ({code}): {reason}")]
    Protocol {
        /// The signed result code (always <= 0 here).
        code: i16,
        /// Resolved human-readable reason.
        reason: String,
    },

    /// The SOAP response envelope could not be interpreted.
    #[error("malformed response envelope: {0}")]
    Envelope(String),

    /// The endpoint configuration is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl WitsmlError {
    /// Stable code string for this error kind, for structured job results.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::RemoteCrashed { .. } => "REMOTE_CRASHED",
            Self::Transport { .. } => "TRANSPORT",
            Self::Protocol { .. } => "PROTOCOL",
            Self::Envelope(_) => "ENVELOPE",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// True when the fault originated below the protocol layer.
    pub fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::RemoteCrashed { .. } | Self::Transport { .. }
        )
    }
}
