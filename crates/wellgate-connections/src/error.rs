// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for connection resolution.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wellgate_witsml::WitsmlError;

/// Result type using ProviderError.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Which side of a job a server plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerRole {
    /// Server an object is read from.
    Source,
    /// Server an object is written to.
    Target,
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Errors raised while resolving a store client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No usable credentials or server selection for the requested role.
    /// Terminal for the request; not retryable.
    #[error("no WITSML access for the {role} server (status {status})")]
    NoAccess {
        /// The role that could not be resolved.
        role: ServerRole,
        /// HTTP-equivalent status for the REST layer.
        status: u16,
    },

    /// Endpoint or client construction failed.
    #[error(transparent)]
    Witsml(#[from] WitsmlError),

    /// The registry document could not be read.
    #[error("invalid server registry: {0}")]
    InvalidRegistry(String),
}

impl ProviderError {
    /// The no-access fault for `role`, carrying HTTP-equivalent status 401.
    pub fn no_access(role: ServerRole) -> Self {
        Self::NoAccess { role, status: 401 }
    }

    /// Stable code string for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoAccess { .. } => "NO_ACCESS",
            Self::Witsml(e) => e.code(),
            Self::InvalidRegistry(_) => "INVALID_REGISTRY",
        }
    }
}
