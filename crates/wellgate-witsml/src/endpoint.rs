// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Server endpoint records for WITSML store connections.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, WitsmlError};

/// Default per-call request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Credentials presented to a WITSML server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

impl Credentials {
    /// Create a credentials pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A TLS client certificate for mutual-TLS endpoints (PKCS#12 archive).
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientCertificate {
    /// DER-encoded PKCS#12 archive holding key and certificate.
    #[serde(with = "pkcs12_base64")]
    pub pkcs12_der: Vec<u8>,
    /// Passphrase protecting the archive.
    pub passphrase: String,
}

impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("pkcs12_der", &format_args!("{} bytes", self.pkcs12_der.len()))
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

mod pkcs12_base64 {
    use base64::{Engine as _, engine::general_purpose};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// One configured WITSML server endpoint.
///
/// Immutable for the lifetime of any client bound to it; safe to share across
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct ServerEndpoint {
    /// Display name of the server (registry key).
    pub name: String,
    /// Store endpoint URL.
    pub url: Url,
    /// Credentials for basic authentication.
    pub credentials: Credentials,
    /// Client certificate; its presence selects the mutual-TLS binding.
    pub client_certificate: Option<ClientCertificate>,
    /// Per-call request timeout. Not independently configurable when a client
    /// certificate is attached (documented limitation of that binding).
    pub request_timeout: Duration,
    /// Client capabilities description sent in `CapabilitiesIn`
    /// (name/vendor/version string declared to the server).
    pub client_capabilities: String,
}

impl ServerEndpoint {
    /// Build an endpoint, validating the URL eagerly.
    ///
    /// Plain-HTTP URLs are rejected unless `allow_http` is set (lab servers).
    pub fn new(
        name: impl Into<String>,
        url: &str,
        credentials: Credentials,
        allow_http: bool,
    ) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| WitsmlError::InvalidEndpoint(format!("'{url}': {e}")))?;

        match url.scheme() {
            "https" => {}
            "http" if allow_http => {}
            "http" => {
                return Err(WitsmlError::InvalidEndpoint(format!(
                    "'{url}' uses plain HTTP; enable allow_http for this server"
                )));
            }
            other => {
                return Err(WitsmlError::InvalidEndpoint(format!(
                    "unsupported scheme '{other}'"
                )));
            }
        }

        Ok(Self {
            name: name.into(),
            url,
            credentials,
            client_certificate: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            client_capabilities: default_client_capabilities(),
        })
    }

    /// Attach a client certificate, switching the binding to mutual TLS.
    pub fn with_client_certificate(mut self, certificate: ClientCertificate) -> Self {
        self.client_certificate = Some(certificate);
        self
    }

    /// Override the per-call request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the declared client capabilities string.
    pub fn with_client_capabilities(mut self, capabilities: impl Into<String>) -> Self {
        self.client_capabilities = capabilities.into();
        self
    }

    /// Hostname of the endpoint, for fault attribution.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or(self.name.as_str())
    }
}

/// Capabilities document describing this client to the server.
fn default_client_capabilities() -> String {
    format!(
        concat!(
            r#"<capClients version="1.4.1">"#,
            r#"<capClient apiVers="1.4.1">"#,
            "<name>wellgate</name>",
            "<vendor>wellgate</vendor>",
            "<version>{}</version>",
            "</capClient>",
            "</capClients>"
        ),
        env!("CARGO_PKG_VERSION")
    )
}
