// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Short-lived credentials cache.
//!
//! Credentials are supplied by an external collaborator (session layer,
//! secret store) and cached per (client identity, server) with a TTL.
//! Staleness never silently reuses revoked credentials: an expired entry is
//! removed on lookup and never returned.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;
use wellgate_witsml::Credentials;

/// Default credentials lifetime.
pub const DEFAULT_CREDENTIALS_TTL: Duration = Duration::from_secs(3600);

/// Credentials plus the instant they stop being usable.
#[derive(Debug, Clone)]
pub struct ValidCredentials {
    /// The cached credentials.
    pub credentials: Credentials,
    /// When this entry expires.
    pub expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: String,
    server: String,
}

/// TTL-bounded cache of per-identity, per-server credentials.
pub struct CredentialsCache {
    ttl: Duration,
    entries: DashMap<CacheKey, ValidCredentials>,
}

impl CredentialsCache {
    /// Cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Store credentials for `identity` on `server`, restarting the TTL.
    pub fn put(&self, identity: &str, server: &str, credentials: Credentials) {
        self.entries.insert(
            CacheKey {
                identity: identity.to_string(),
                server: server.to_string(),
            },
            ValidCredentials {
                credentials,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Valid credentials for `identity` on `server`, or `None`. Expired
    /// entries are removed here and never handed out.
    pub fn get(&self, identity: &str, server: &str) -> Option<ValidCredentials> {
        let key = CacheKey {
            identity: identity.to_string(),
            server: server.to_string(),
        };
        let entry = self.entries.get(&key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(&key);
            debug!(identity, server, "expired credentials evicted");
            return None;
        }
        Some(entry.value().clone())
    }

    /// Drop the entry for `identity` on `server`.
    pub fn invalidate(&self, identity: &str, server: &str) {
        self.entries.remove(&CacheKey {
            identity: identity.to_string(),
            server: server.to_string(),
        });
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for CredentialsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS_TTL)
    }
}
