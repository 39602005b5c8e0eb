// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Store protocol client: the four store verbs plus capability probing and
//! base-message resolution.
//!
//! [`StorePort`] abstracts the raw operations so callers depend on an
//! interface rather than a concrete transport; [`SoapTransport`] is the
//! production adapter. [`StoreClient`] adds result-code interpretation,
//! failure-reason resolution, the Get deserialization leniency, and the
//! transcript side-channel.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::endpoint::ServerEndpoint;
use crate::error::{Result, WitsmlError};
use crate::logger::{QueryLogger, QueryRecord};
use crate::options::OptionsIn;
use crate::query::{QueryResult, RESULT_PARTIAL, StoreDocument, StoreQuery};
use crate::soap::ProtocolOutcome;
use crate::transport::SoapTransport;

/// The raw store operations, one implementor per transport strategy.
#[async_trait]
pub trait StorePort: Send + Sync {
    /// `WMLS_AddToStore`.
    async fn add_to_store(&self, wml_type: &str, xml: &str, options: &str)
    -> Result<ProtocolOutcome>;

    /// `WMLS_GetFromStore`.
    async fn get_from_store(
        &self,
        wml_type: &str,
        query: &str,
        options: &str,
    ) -> Result<ProtocolOutcome>;

    /// `WMLS_UpdateInStore`.
    async fn update_in_store(
        &self,
        wml_type: &str,
        xml: &str,
        options: &str,
    ) -> Result<ProtocolOutcome>;

    /// `WMLS_DeleteFromStore`.
    async fn delete_from_store(
        &self,
        wml_type: &str,
        query: &str,
        options: &str,
    ) -> Result<ProtocolOutcome>;

    /// `WMLS_GetCap`.
    async fn get_cap(&self, options: &str) -> Result<ProtocolOutcome>;

    /// `WMLS_GetBaseMsg`: resolve a result code to its base message.
    async fn get_base_msg(&self, code: i16) -> Result<String>;

    /// Hostname of the bound server, for fault attribution.
    fn server(&self) -> &str;
}

/// Server capability block returned by the GetCap probe.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServerCapabilities {
    /// Server product name.
    pub name: String,
    /// Server vendor.
    pub vendor: String,
    /// Server product version.
    pub version: String,
    /// Schema versions the server accepts.
    pub schema_versions: Vec<String>,
}

enum MutatingVerb {
    Add,
    Update,
    Delete,
}

impl MutatingVerb {
    fn name(&self) -> &'static str {
        match self {
            Self::Add => "WMLS_AddToStore",
            Self::Update => "WMLS_UpdateInStore",
            Self::Delete => "WMLS_DeleteFromStore",
        }
    }
}

/// Typed client over a [`StorePort`].
///
/// Holds no per-call state besides the shared port and transcript logger;
/// one instance is safely invoked concurrently.
pub struct StoreClient {
    port: Arc<dyn StorePort>,
    logger: QueryLogger,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("server", &self.port.server())
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    /// Wrap an existing port.
    pub fn new(port: Arc<dyn StorePort>, logger: QueryLogger) -> Self {
        Self { port, logger }
    }

    /// Build the production SOAP transport for `endpoint` and wrap it.
    pub fn for_endpoint(endpoint: ServerEndpoint, logger: QueryLogger) -> Result<Self> {
        let transport = SoapTransport::new(endpoint)?;
        Ok(Self::new(Arc::new(transport), logger))
    }

    /// Hostname of the bound server.
    pub fn server(&self) -> &str {
        self.port.server()
    }

    /// Execute a Get and decode the response into a typed document.
    ///
    /// A malformed `XMLout` degrades to an empty-but-valid document of the
    /// requested kind instead of failing the call; the degradation is
    /// observable through a warning and the transcript record.
    #[instrument(skip(self, query, options), fields(server = %self.port.server(), object_type = %query.object_type()))]
    pub async fn get(&self, query: &StoreQuery, options: &OptionsIn) -> Result<StoreDocument> {
        let encoded = options.encode();
        let outcome = self
            .port
            .get_from_store(query.object_type().as_str(), query.xml(), &encoded)
            .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record(query, "WMLS_GetFromStore", None, false, false);
                return Err(e);
            }
        };

        if outcome.result_code <= 0 {
            let reason = self
                .resolve_failure(outcome.result_code, &outcome.supp_msg_out)
                .await;
            self.record(
                query,
                "WMLS_GetFromStore",
                Some(outcome.supp_msg_out.as_str()),
                false,
                false,
            );
            return Err(WitsmlError::Protocol {
                code: outcome.result_code,
                reason,
            });
        }

        let partial = outcome.result_code == RESULT_PARTIAL;
        let xml_out = outcome.xml_out.unwrap_or_default();

        let (document, degraded) = if xml_out.trim().is_empty() {
            (StoreDocument::empty(query.object_type()), false)
        } else {
            match roxmltree::Document::parse(&xml_out) {
                Ok(_) => (
                    StoreDocument {
                        object_type: query.object_type(),
                        xml: xml_out.clone(),
                        partial,
                    },
                    false,
                ),
                Err(e) => {
                    // Deliberate leniency for partially-returned large
                    // payloads; must stay observable.
                    warn!(
                        server = %self.port.server(),
                        object_type = %query.object_type(),
                        error = %e,
                        "malformed XMLout, degrading to empty document"
                    );
                    (StoreDocument::empty(query.object_type()), true)
                }
            }
        };

        self.record(
            query,
            "WMLS_GetFromStore",
            Some(xml_out.as_str()),
            true,
            degraded,
        );
        Ok(document)
    }

    /// Execute an Add. Defaults `OptionsIn` to `returnElements=requested`.
    #[instrument(skip(self, query), fields(server = %self.port.server(), object_type = %query.object_type()))]
    pub async fn add(&self, query: &StoreQuery) -> Result<QueryResult> {
        let options = OptionsIn::requested().encode();
        let outcome = self
            .port
            .add_to_store(query.object_type().as_str(), query.xml(), &options)
            .await;
        self.decode_mutation(MutatingVerb::Add, query, outcome).await
    }

    /// Execute an Update. No special options.
    #[instrument(skip(self, query), fields(server = %self.port.server(), object_type = %query.object_type()))]
    pub async fn update(&self, query: &StoreQuery) -> Result<QueryResult> {
        let outcome = self
            .port
            .update_in_store(query.object_type().as_str(), query.xml(), "")
            .await;
        self.decode_mutation(MutatingVerb::Update, query, outcome)
            .await
    }

    /// Execute a Delete. No special options.
    #[instrument(skip(self, query), fields(server = %self.port.server(), object_type = %query.object_type()))]
    pub async fn delete(&self, query: &StoreQuery) -> Result<QueryResult> {
        let outcome = self
            .port
            .delete_from_store(query.object_type().as_str(), query.xml(), "")
            .await;
        self.decode_mutation(MutatingVerb::Delete, query, outcome)
            .await
    }

    /// Probe the server's capabilities with header-only return elements.
    ///
    /// Connection testing is a harder failure than routine querying: a
    /// non-success result code raises instead of returning a failed
    /// [`QueryResult`].
    #[instrument(skip(self), fields(server = %self.port.server()))]
    pub async fn test_connection(&self) -> Result<ServerCapabilities> {
        let options = OptionsIn::header_only().encode();
        let outcome = self.port.get_cap(&options).await?;

        if outcome.result_code <= 0 {
            let reason = self
                .resolve_failure(outcome.result_code, &outcome.supp_msg_out)
                .await;
            return Err(WitsmlError::Protocol {
                code: outcome.result_code,
                reason,
            });
        }

        let capabilities = parse_capabilities(outcome.xml_out.as_deref().unwrap_or(""));
        debug!(server = %self.port.server(), name = %capabilities.name, "capability probe succeeded");
        Ok(capabilities)
    }

    async fn decode_mutation(
        &self,
        verb: MutatingVerb,
        query: &StoreQuery,
        outcome: Result<ProtocolOutcome>,
    ) -> Result<QueryResult> {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record(query, verb.name(), None, false, false);
                return Err(e);
            }
        };

        if outcome.result_code > 0 {
            self.record(
                query,
                verb.name(),
                Some(outcome.supp_msg_out.as_str()),
                true,
                false,
            );
            return Ok(QueryResult::success());
        }

        let reason = self
            .resolve_failure(outcome.result_code, &outcome.supp_msg_out)
            .await;
        self.record(
            query,
            verb.name(),
            Some(outcome.supp_msg_out.as_str()),
            false,
            false,
        );
        Ok(QueryResult::failure(reason))
    }

    /// Resolve a failure code to a human-readable reason via the auxiliary
    /// base-message call, combining code, base message, and the server's
    /// supplementary message.
    async fn resolve_failure(&self, code: i16, supp_msg: &str) -> String {
        let base = match self.port.get_base_msg(code).await {
            Ok(message) if !message.is_empty() => message,
            Ok(_) => "Unknown failure".to_string(),
            Err(e) => {
                warn!(
                    server = %self.port.server(),
                    code,
                    error = %e,
                    "base-message resolution failed"
                );
                "Unknown failure".to_string()
            }
        };
        format!("Error {code} - {base}. {supp_msg}")
            .trim_end()
            .to_string()
    }

    fn record(
        &self,
        query: &StoreQuery,
        operation: &str,
        response: Option<&str>,
        is_successful: bool,
        degraded: bool,
    ) {
        self.logger.record(QueryRecord {
            timestamp: chrono::Utc::now(),
            server: self.port.server().to_string(),
            operation: operation.to_string(),
            object_type: Some(query.object_type().as_str().to_string()),
            query: query.xml().to_string(),
            response: response.map(str::to_string),
            is_successful,
            degraded,
        });
    }
}

/// Parse a `capServers` document into its capability block. Missing fields
/// degrade to empty strings; the probe's success is the result code, not
/// the document shape.
fn parse_capabilities(xml: &str) -> ServerCapabilities {
    let mut capabilities = ServerCapabilities {
        name: String::new(),
        vendor: String::new(),
        version: String::new(),
        schema_versions: Vec::new(),
    };

    let Ok(doc) = roxmltree::Document::parse(xml) else {
        return capabilities;
    };

    for node in doc.descendants().filter(|n| n.is_element()) {
        let text = node.text().map(str::trim).unwrap_or("");
        match node.tag_name().name() {
            "name" if capabilities.name.is_empty() => capabilities.name = text.to_string(),
            "vendor" => capabilities.vendor = text.to_string(),
            "version" if capabilities.version.is_empty() => {
                capabilities.version = text.to_string()
            }
            "schemaVersion" => {
                capabilities
                    .schema_versions
                    .extend(text.split(',').map(|v| v.trim().to_string()));
            }
            _ => {}
        }
    }

    capabilities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capabilities() {
        let xml = concat!(
            r#"<capServers version="1.4.1">"#,
            r#"<capServer apiVers="1.4.1">"#,
            "<name>StoreD</name>",
            "<vendor>Acme</vendor>",
            "<version>7.1</version>",
            "<schemaVersion>1.3.1.1,1.4.1.1</schemaVersion>",
            "</capServer>",
            "</capServers>"
        );
        let caps = parse_capabilities(xml);
        assert_eq!(caps.name, "StoreD");
        assert_eq!(caps.vendor, "Acme");
        assert_eq!(caps.version, "7.1");
        assert_eq!(caps.schema_versions, vec!["1.3.1.1", "1.4.1.1"]);
    }

    #[test]
    fn test_parse_capabilities_tolerates_garbage() {
        let caps = parse_capabilities("not xml at all <");
        assert!(caps.name.is_empty());
        assert!(caps.schema_versions.is_empty());
    }
}
