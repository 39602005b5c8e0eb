// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! WITSML store protocol client.
//!
//! A WITSML store exposes wells, wellbores, logs and related objects through a
//! fixed four-verb SOAP protocol plus two auxiliary calls. This crate speaks
//! that protocol and nothing more: callers hand it an already-constructed
//! query document and an object-type tag, and get back a typed document or a
//! pass/fail result. The WITSML schema itself is never modeled here.
//!
//! # Operations
//!
//! | Operation | Verb | Returns |
//! |-----------|------|---------|
//! | `WMLS_AddToStore` | [`StoreClient::add`] | [`QueryResult`] |
//! | `WMLS_GetFromStore` | [`StoreClient::get`] | [`StoreDocument`] |
//! | `WMLS_UpdateInStore` | [`StoreClient::update`] | [`QueryResult`] |
//! | `WMLS_DeleteFromStore` | [`StoreClient::delete`] | [`QueryResult`] |
//! | `WMLS_GetCap` | [`StoreClient::test_connection`] | [`ServerCapabilities`] |
//! | `WMLS_GetBaseMsg` | internal | resolved failure reason |
//!
//! Every store verb answers with a signed result code. Positive codes are
//! success (for Get, code 2 means more data remains server-side); codes at or
//! below zero are failures whose numeric value resolves to a human-readable
//! message via `WMLS_GetBaseMsg`.
//!
//! # Transport
//!
//! [`SoapTransport`](transport::SoapTransport) binds one
//! [`ServerEndpoint`](endpoint::ServerEndpoint) with either basic
//! authentication over TLS or mutual TLS with a client certificate, chosen by
//! whether the endpoint carries a certificate. Transport-level rejections are
//! classified into typed faults carrying the server hostname; they are never
//! retried here.
//!
//! # Transcript
//!
//! Every call records its outbound query and inbound response through the
//! injected [`QueryLogger`](logger::QueryLogger) side-channel. Logging never
//! participates in the call outcome.

/// Store protocol client and the port trait it is built on.
pub mod client;

/// Server endpoint records and credentials.
pub mod endpoint;

/// Error types for transport and protocol failures.
pub mod error;

/// Log index representations (measured depth or date-time).
pub mod index;

/// Rolling query transcript side-channel.
pub mod logger;

/// Request modifiers encoded into the protocol's OptionsIn string.
pub mod options;

/// Query, result, and document types.
pub mod query;

/// SOAP envelope construction and response parsing.
pub mod soap;

/// HTTP transport binding for one store endpoint.
pub mod transport;

pub use client::{ServerCapabilities, StoreClient, StorePort};
pub use endpoint::{ClientCertificate, Credentials, ServerEndpoint};
pub use error::{Result, WitsmlError};
pub use index::Index;
pub use logger::{QueryLogger, QueryLoggerConfig, QueryRecord};
pub use options::{OptionsIn, ReturnElements};
pub use query::{QueryResult, StoreDocument, StoreQuery, WitsmlType};
pub use soap::ProtocolOutcome;
