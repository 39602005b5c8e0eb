// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP transport binding for one store endpoint.
//!
//! Produces a ready-to-use secured channel to a single server URL. Two
//! binding strategies, chosen by whether the endpoint carries a client
//! certificate:
//!
//! - **Basic**: transport-level TLS with HTTP Basic credentials and a
//!   configurable send timeout.
//! - **Certificate + Basic**: mutual TLS with the client certificate attached
//!   in addition to basic credentials. The timeout is not independently
//!   configurable in this mode; the default applies.
//!
//! Transport responses with status 401/403 become
//! [`WitsmlError::AuthenticationFailed`]; 5xx becomes
//! [`WitsmlError::RemoteCrashed`]. Neither is retried here. No state is
//! mutated after construction; one binding is safely shared across
//! concurrent calls.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::client::StorePort;
use crate::endpoint::{DEFAULT_REQUEST_TIMEOUT, ServerEndpoint};
use crate::error::{Result, WitsmlError};
use crate::soap::{self, ProtocolOutcome, StoreOperation};

/// Fixed client-identification header value sent on every request.
fn client_identification() -> String {
    format!("wellgate/{}", env!("CARGO_PKG_VERSION"))
}

/// SOAP-over-HTTP binding to one WITSML store endpoint.
pub struct SoapTransport {
    http: reqwest::Client,
    endpoint: ServerEndpoint,
}

impl SoapTransport {
    /// Build the binding for one endpoint.
    pub fn new(endpoint: ServerEndpoint) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(client_identification());

        builder = match &endpoint.client_certificate {
            Some(certificate) => {
                let identity = reqwest::Identity::from_pkcs12_der(
                    &certificate.pkcs12_der,
                    &certificate.passphrase,
                )
                .map_err(|e| {
                    WitsmlError::InvalidEndpoint(format!("client certificate rejected: {e}"))
                })?;
                // Timeout is fixed in the certificate binding.
                builder.identity(identity).timeout(DEFAULT_REQUEST_TIMEOUT)
            }
            None => builder.timeout(endpoint.request_timeout),
        };

        let http = builder
            .build()
            .map_err(|e| WitsmlError::InvalidEndpoint(format!("client build failed: {e}")))?;

        Ok(Self { http, endpoint })
    }

    /// The endpoint this binding is attached to.
    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    async fn call(&self, operation: StoreOperation, body: String) -> Result<String> {
        let server = self.endpoint.hostname().to_string();

        debug!(
            server = %server,
            operation = operation.name(),
            bytes = body.len(),
            "dispatching store call"
        );

        let response = self
            .http
            .post(self.endpoint.url.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", operation.soap_action()))
            .basic_auth(
                &self.endpoint.credentials.username,
                Some(&self.endpoint.credentials.password),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| WitsmlError::Transport {
                server: server.clone(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(WitsmlError::AuthenticationFailed { server });
        }
        if status.is_server_error() {
            return Err(WitsmlError::RemoteCrashed { server });
        }
        if !status.is_success() {
            return Err(WitsmlError::Transport {
                server,
                details: format!("unexpected status {status}"),
            });
        }

        response.text().await.map_err(|e| WitsmlError::Transport {
            server: self.endpoint.hostname().to_string(),
            details: format!("reading response body: {e}"),
        })
    }

    async fn store_verb(
        &self,
        operation: StoreOperation,
        wml_type: &str,
        payload: &str,
        options: &str,
    ) -> Result<ProtocolOutcome> {
        let body = soap::build_store_request(
            operation,
            wml_type,
            payload,
            options,
            &self.endpoint.client_capabilities,
        );
        let text = self.call(operation, body).await?;
        soap::parse_outcome(operation, &text)
    }
}

#[async_trait]
impl StorePort for SoapTransport {
    async fn add_to_store(
        &self,
        wml_type: &str,
        xml: &str,
        options: &str,
    ) -> Result<ProtocolOutcome> {
        self.store_verb(StoreOperation::AddToStore, wml_type, xml, options)
            .await
    }

    async fn get_from_store(
        &self,
        wml_type: &str,
        query: &str,
        options: &str,
    ) -> Result<ProtocolOutcome> {
        self.store_verb(StoreOperation::GetFromStore, wml_type, query, options)
            .await
    }

    async fn update_in_store(
        &self,
        wml_type: &str,
        xml: &str,
        options: &str,
    ) -> Result<ProtocolOutcome> {
        self.store_verb(StoreOperation::UpdateInStore, wml_type, xml, options)
            .await
    }

    async fn delete_from_store(
        &self,
        wml_type: &str,
        query: &str,
        options: &str,
    ) -> Result<ProtocolOutcome> {
        self.store_verb(StoreOperation::DeleteFromStore, wml_type, query, options)
            .await
    }

    async fn get_cap(&self, options: &str) -> Result<ProtocolOutcome> {
        let body = soap::build_get_cap(options);
        let text = self.call(StoreOperation::GetCap, body).await?;
        soap::parse_outcome(StoreOperation::GetCap, &text)
    }

    async fn get_base_msg(&self, code: i16) -> Result<String> {
        let body = soap::build_get_base_msg(code);
        let text = self.call(StoreOperation::GetBaseMsg, body).await?;
        soap::parse_base_msg(&text)
    }

    fn server(&self) -> &str {
        self.endpoint.hostname()
    }
}
