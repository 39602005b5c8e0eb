// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Connection management for wellgate.
//!
//! Maps a request's authentication and target context to a ready
//! [`StoreClient`](wellgate_witsml::StoreClient):
//!
//! - [`ServerRegistry`](registry::ServerRegistry) holds the configured server
//!   records (persistence of those records is an external concern; the
//!   registry only keeps what a caller hands it).
//! - [`CredentialsCache`](credentials::CredentialsCache) keeps short-lived
//!   credentials keyed by client identity and server, bounded by a TTL.
//!   Expired entries are never reused.
//! - [`ClientProvider`](provider::ClientProvider) resolves
//!   {role, server, identity} to a cached client, one per distinct
//!   (server identity, credential identity) pair, guarding concurrent
//!   creation of the same entry.
//!
//! A request with no usable credentials or server selection gets a typed
//! no-access fault carrying the failed role and an HTTP-equivalent 401;
//! callers must treat it as terminal, not retryable.

/// Short-lived credentials cache.
pub mod credentials;

/// Error types for connection resolution.
pub mod error;

/// Client provider resolving roles to ready store clients.
pub mod provider;

/// Configured server records.
pub mod registry;

pub use credentials::CredentialsCache;
pub use error::{ProviderError, Result, ServerRole};
pub use provider::ClientProvider;
pub use registry::{ServerRecord, ServerRegistry};
