// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Request modifiers encoded into the protocol's OptionsIn string.
//!
//! The store reads a comma-joined `key=value` keyword string on every call.
//! The keywords form a small closed set modeled here; an explicit raw
//! override bypasses keyword construction entirely for servers with
//! non-standard extensions.

use std::num::NonZeroU32;

/// How much of each matching object the store should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnElements {
    /// Everything the store holds for the object.
    #[default]
    All,
    /// Only the elements present in the query document.
    Requested,
    /// Header elements only (no growing data).
    HeaderOnly,
    /// Identity elements only (uids and names).
    IdOnly,
    /// Growing data only (no header).
    DataOnly,
}

impl ReturnElements {
    /// Keyword value understood by the server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Requested => "requested",
            Self::HeaderOnly => "header-only",
            Self::IdOnly => "id-only",
            Self::DataOnly => "data-only",
        }
    }
}

/// Per-call request modifiers, serialized with [`OptionsIn::encode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsIn {
    return_elements: Option<ReturnElements>,
    max_return_nodes: Option<NonZeroU32>,
    request_latest_values: Option<NonZeroU32>,
    raw: Option<String>,
}

impl OptionsIn {
    /// No modifiers; the server applies its defaults.
    pub fn none() -> Self {
        Self::default()
    }

    /// `returnElements=requested` — the default for add calls.
    pub fn requested() -> Self {
        Self::default().with_return_elements(ReturnElements::Requested)
    }

    /// `returnElements=id-only` — used by visibility polling.
    pub fn id_only() -> Self {
        Self::default().with_return_elements(ReturnElements::IdOnly)
    }

    /// `returnElements=header-only` — used by capability probing.
    pub fn header_only() -> Self {
        Self::default().with_return_elements(ReturnElements::HeaderOnly)
    }

    /// Raw override: the string is sent verbatim, bypassing keyword
    /// construction. Cannot be combined with keyword setters.
    pub fn raw(options: impl Into<String>) -> Self {
        Self {
            raw: Some(options.into()),
            ..Self::default()
        }
    }

    /// Set the return-elements mode.
    pub fn with_return_elements(mut self, mode: ReturnElements) -> Self {
        self.return_elements = Some(mode);
        self
    }

    /// Cap the number of data nodes returned per call (growing objects).
    pub fn with_max_return_nodes(mut self, nodes: NonZeroU32) -> Self {
        self.max_return_nodes = Some(nodes);
        self
    }

    /// Request only the latest `count` values per curve (growing objects).
    pub fn with_request_latest_values(mut self, count: NonZeroU32) -> Self {
        self.request_latest_values = Some(count);
        self
    }

    /// Serialize to the comma-joined keyword string.
    pub fn encode(&self) -> String {
        if let Some(ref raw) = self.raw {
            return raw.clone();
        }

        let mut keywords = Vec::new();
        if let Some(mode) = self.return_elements {
            keywords.push(format!("returnElements={}", mode.as_str()));
        }
        if let Some(nodes) = self.max_return_nodes {
            keywords.push(format!("maxReturnNodes={nodes}"));
        }
        if let Some(count) = self.request_latest_values {
            keywords.push(format!("requestLatestValues={count}"));
        }
        keywords.join(",")
    }
}
