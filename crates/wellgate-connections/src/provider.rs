// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Client provider resolving roles to ready store clients.
//!
//! One client is cached per distinct (server identity, credential identity)
//! pair and reused until its credentials expire or the server registry is
//! replaced. Creation of the same entry is guarded by the map's entry lock
//! (double-checked acquire), so concurrent first requests build one client.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use wellgate_witsml::{QueryLogger, StoreClient};

use crate::credentials::CredentialsCache;
use crate::error::{ProviderError, Result, ServerRole};
use crate::registry::ServerRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    server: String,
    username: String,
}

struct CachedClient {
    client: Arc<StoreClient>,
    generation: u64,
    expires_at: Instant,
}

impl CachedClient {
    fn is_fresh(&self, generation: u64) -> bool {
        self.generation == generation && self.expires_at > Instant::now()
    }
}

/// Resolves a request's {role, server, identity} context to a ready
/// [`StoreClient`], caching one client per (server, credential) pair.
pub struct ClientProvider {
    registry: Arc<ServerRegistry>,
    credentials: Arc<CredentialsCache>,
    logger: QueryLogger,
    clients: DashMap<ClientKey, CachedClient>,
}

impl ClientProvider {
    /// Build a provider over a registry and credentials cache. The query
    /// logger is cloned into every constructed client.
    pub fn new(
        registry: Arc<ServerRegistry>,
        credentials: Arc<CredentialsCache>,
        logger: QueryLogger,
    ) -> Self {
        Self {
            registry,
            credentials,
            logger,
            clients: DashMap::new(),
        }
    }

    /// Resolve the ready client for `role` on `server_name`, on behalf of
    /// `identity`.
    ///
    /// Missing server records or credentials produce the terminal
    /// [`ProviderError::NoAccess`] fault tagged with `role`.
    pub fn resolve(
        &self,
        role: ServerRole,
        server_name: &str,
        identity: &str,
    ) -> Result<Arc<StoreClient>> {
        let record = self
            .registry
            .get(server_name)
            .ok_or_else(|| ProviderError::no_access(role))?;
        let valid = self
            .credentials
            .get(identity, server_name)
            .ok_or_else(|| ProviderError::no_access(role))?;

        let generation = self.registry.generation();
        let key = ClientKey {
            server: record.name.clone(),
            username: valid.credentials.username.clone(),
        };

        // Fast path without the entry lock.
        if let Some(cached) = self.clients.get(&key)
            && cached.is_fresh(generation)
        {
            return Ok(cached.client.clone());
        }

        // Re-check under the entry lock; the loser of a race reuses the
        // winner's client.
        match self.clients.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_fresh(generation) {
                    return Ok(occupied.get().client.clone());
                }
                let rebuilt = self.build(&record, &valid, generation)?;
                let client = rebuilt.client.clone();
                occupied.insert(rebuilt);
                Ok(client)
            }
            Entry::Vacant(vacant) => {
                let built = self.build(&record, &valid, generation)?;
                let client = built.client.clone();
                vacant.insert(built);
                Ok(client)
            }
        }
    }

    /// Resolve the (source, target) pair for a cross-server copy job. Each
    /// side's failure is tagged with its own role.
    pub fn resolve_pair(
        &self,
        source_server: &str,
        target_server: &str,
        identity: &str,
    ) -> Result<(Arc<StoreClient>, Arc<StoreClient>)> {
        let source = self.resolve(ServerRole::Source, source_server, identity)?;
        let target = self.resolve(ServerRole::Target, target_server, identity)?;
        Ok((source, target))
    }

    /// Drop every cached client (credential revocation sweep).
    pub fn invalidate_all(&self) {
        self.clients.clear();
    }

    fn build(
        &self,
        record: &crate::registry::ServerRecord,
        valid: &crate::credentials::ValidCredentials,
        generation: u64,
    ) -> Result<CachedClient> {
        debug!(server = %record.name, user = %valid.credentials.username, "building store client");
        let endpoint = record.endpoint(valid.credentials.clone())?;
        let client = StoreClient::for_endpoint(endpoint, self.logger.clone())?;
        Ok(CachedClient {
            client: Arc::new(client),
            generation,
            expires_at: valid.expires_at,
        })
    }
}
