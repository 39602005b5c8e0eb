// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Query, result, and document types.
//!
//! A [`StoreQuery`] is an opaque, caller-constructed document plus the object
//! kind it represents. The client never inspects its structure beyond the
//! type tag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result code for plain success.
pub const RESULT_SUCCESS: i16 = 1;

/// Result code for success with more data remaining server-side
/// (growing objects).
pub const RESULT_PARTIAL: i16 = 2;

/// WITSML object kinds the store recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WitsmlType {
    /// A well.
    Well,
    /// A wellbore under a well.
    Wellbore,
    /// A log (growing object).
    Log,
    /// A drilling rig.
    Rig,
    /// A wellbore trajectory.
    Trajectory,
    /// A tubular assembly.
    Tubular,
    /// A mud log.
    MudLog,
    /// An operator message.
    Message,
    /// A risk record.
    Risk,
    /// A bottom-hole-assembly run.
    BhaRun,
    /// A fluids report.
    FluidsReport,
    /// Wellbore geometry.
    WbGeometry,
}

impl WitsmlType {
    /// The singular type tag sent in `WMLtypeIn`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Well => "well",
            Self::Wellbore => "wellbore",
            Self::Log => "log",
            Self::Rig => "rig",
            Self::Trajectory => "trajectory",
            Self::Tubular => "tubular",
            Self::MudLog => "mudLog",
            Self::Message => "message",
            Self::Risk => "risk",
            Self::BhaRun => "bhaRun",
            Self::FluidsReport => "fluidsReport",
            Self::WbGeometry => "wbGeometry",
        }
    }

    /// The plural container element wrapping objects of this kind.
    ///
    /// The schema's plurals are what they are (`trajectorys`, `wbGeometrys`);
    /// do not anglicize them.
    pub fn container_name(&self) -> &'static str {
        match self {
            Self::Well => "wells",
            Self::Wellbore => "wellbores",
            Self::Log => "logs",
            Self::Rig => "rigs",
            Self::Trajectory => "trajectorys",
            Self::Tubular => "tubulars",
            Self::MudLog => "mudLogs",
            Self::Message => "messages",
            Self::Risk => "risks",
            Self::BhaRun => "bhaRuns",
            Self::FluidsReport => "fluidsReports",
            Self::WbGeometry => "wbGeometrys",
        }
    }
}

impl fmt::Display for WitsmlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque, caller-constructed query document plus its object kind.
#[derive(Debug, Clone)]
pub struct StoreQuery {
    object_type: WitsmlType,
    xml: String,
}

impl StoreQuery {
    /// Wrap a constructed document with its type tag.
    pub fn new(object_type: WitsmlType, xml: impl Into<String>) -> Self {
        Self {
            object_type,
            xml: xml.into(),
        }
    }

    /// The object kind this query targets.
    pub fn object_type(&self) -> WitsmlType {
        self.object_type
    }

    /// The query document.
    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// Pass/fail outcome of a mutating verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Whether the store accepted the request.
    pub is_successful: bool,
    /// Resolved failure reason; `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QueryResult {
    /// A successful outcome.
    pub fn success() -> Self {
        Self {
            is_successful: true,
            reason: None,
        }
    }

    /// A failed outcome with its resolved reason.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            is_successful: false,
            reason: Some(reason.into()),
        }
    }
}

/// A typed document returned by a Get.
#[derive(Debug, Clone)]
pub struct StoreDocument {
    /// The object kind the document holds.
    pub object_type: WitsmlType,
    /// The response document, in the same shape as the query's type tag.
    pub xml: String,
    /// More data remained server-side (result code 2, growing objects).
    pub partial: bool,
}

impl StoreDocument {
    /// An empty-but-valid document of the given kind.
    pub fn empty(object_type: WitsmlType) -> Self {
        Self {
            object_type,
            xml: format!(
                r#"<{name} xmlns="http://www.witsml.org/schemas/1series" version="1.4.1.1" />"#,
                name = object_type.container_name()
            ),
            partial: false,
        }
    }

    /// True when the document contains no objects.
    pub fn is_empty(&self) -> bool {
        match roxmltree::Document::parse(&self.xml) {
            Ok(doc) => !doc
                .root_element()
                .children()
                .any(|n| n.is_element()),
            Err(_) => true,
        }
    }
}
