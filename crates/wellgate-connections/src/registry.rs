// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configured server records.
//!
//! Persistence of server records is an external collaborator's concern; the
//! registry holds whatever the caller loaded and supports whole-set
//! replacement when configuration changes. Each replacement bumps a
//! generation counter that downstream caches use to invalidate.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wellgate_witsml::endpoint::DEFAULT_REQUEST_TIMEOUT;
use wellgate_witsml::{ClientCertificate, Credentials, ServerEndpoint};

use crate::error::{ProviderError, Result};

/// A server record as stored in the registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    /// Unique display name (registry key).
    pub name: String,
    /// Store endpoint URL.
    pub url: String,
    /// Permit plain-HTTP endpoints (lab servers).
    #[serde(default)]
    pub allow_http: bool,
    /// Per-call request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Client certificate for mutual-TLS servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<ClientCertificate>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl ServerRecord {
    /// Materialize an endpoint from this record and a credentials pair.
    pub fn endpoint(&self, credentials: Credentials) -> Result<ServerEndpoint> {
        let mut endpoint =
            ServerEndpoint::new(&self.name, &self.url, credentials, self.allow_http)?
                .with_request_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(certificate) = &self.client_certificate {
            endpoint = endpoint.with_client_certificate(certificate.clone());
        }
        Ok(endpoint)
    }
}

/// Named server records with replace-on-configuration-change semantics.
pub struct ServerRegistry {
    records: RwLock<HashMap<String, ServerRecord>>,
    generation: AtomicU64,
}

impl ServerRegistry {
    /// Build a registry from records. Duplicate names keep the last record.
    pub fn new(records: impl IntoIterator<Item = ServerRecord>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|r| (r.name.clone(), r))
                    .collect(),
            ),
            generation: AtomicU64::new(0),
        }
    }

    /// Build a registry from a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<ServerRecord> = serde_json::from_str(json)
            .map_err(|e| ProviderError::InvalidRegistry(e.to_string()))?;
        Ok(Self::new(records))
    }

    /// Look up a record by name.
    pub fn get(&self, name: &str) -> Option<ServerRecord> {
        self.records.read().expect("registry lock poisoned").get(name).cloned()
    }

    /// Replace the whole record set (configuration change) and bump the
    /// generation so cached clients built against the old set go stale.
    pub fn replace(&self, records: impl IntoIterator<Item = ServerRecord>) {
        let mut guard = self.records.write().expect("registry lock poisoned");
        *guard = records.into_iter().map(|r| (r.name.clone(), r)).collect();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Current configuration generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Names of all configured servers.
    pub fn names(&self) -> Vec<String> {
        self.records
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ServerRecord {
        ServerRecord {
            name: name.to_string(),
            url: format!("https://{name}.example.com/store"),
            allow_http: false,
            request_timeout_secs: default_timeout_secs(),
            client_certificate: None,
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = ServerRegistry::new([record("rig-1"), record("rig-2")]);
        assert!(registry.get("rig-1").is_some());
        assert!(registry.get("rig-3").is_none());
        assert_eq!(registry.names().len(), 2);
    }

    #[test]
    fn test_replace_bumps_generation() {
        let registry = ServerRegistry::new([record("rig-1")]);
        assert_eq!(registry.generation(), 0);

        registry.replace([record("rig-2")]);
        assert_eq!(registry.generation(), 1);
        assert!(registry.get("rig-1").is_none());
        assert!(registry.get("rig-2").is_some());
    }

    #[test]
    fn test_from_json() {
        let registry = ServerRegistry::from_json(
            r#"[{"name": "rig-1", "url": "https://rig-1.example.com/store"}]"#,
        )
        .unwrap();
        let record = registry.get("rig-1").unwrap();
        assert_eq!(record.request_timeout_secs, 90);
        assert!(!record.allow_http);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ServerRegistry::from_json("not json"),
            Err(ProviderError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_record_materializes_endpoint() {
        let endpoint = record("rig-1")
            .endpoint(Credentials::new("operator", "secret"))
            .unwrap();
        assert_eq!(endpoint.hostname(), "rig-1.example.com");
        assert_eq!(endpoint.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
