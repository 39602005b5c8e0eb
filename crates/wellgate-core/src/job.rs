// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed jobs, job status, worker results, refresh actions.
//!
//! A [`Job`] describes one logical operation. The submitting layer only
//! enqueues jobs and reads [`JobInfo`]; the execution framework owns the
//! life-cycle. Query documents inside jobs are caller-constructed and opaque
//! to the framework beyond their type tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wellgate_witsml::{Index, WitsmlType};

use crate::components::ComponentType;
use crate::error::{JobError, Result};

/// Kinds of jobs the framework executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobType {
    /// Create a well (create-then-confirm).
    CreateWell,
    /// Create a wellbore under a well (create-then-confirm).
    CreateWellbore,
    /// Create a sub-object under a wellbore (create-then-confirm).
    CreateObject,
    /// Delete a well (immediate verb).
    DeleteWell,
    /// Delete a wellbore (immediate verb).
    DeleteWellbore,
    /// Delete sub-objects under a wellbore by uid (immediate verb).
    DeleteObjects,
    /// Copy an object to another wellbore, possibly across servers.
    CopyObject,
    /// Copy selected components of an object into an existing target object.
    CopyComponents,
    /// Copy a range of log data into an existing target log.
    CopyLogData,
    /// Delete log data outside a kept index range.
    TrimLogData,
}

/// Life-cycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    /// Accepted, waiting for the dispatcher.
    Queued,
    /// Bound to a client and executing.
    Running,
    /// Finished; the result is successful.
    Succeeded,
    /// Finished; the result carries a reason.
    Failed,
    /// A cancellation signal was observed at a step boundary.
    Cancelled,
}

impl JobStatus {
    /// True for Succeeded, Failed, and Cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Full address of one object on one server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectLocation {
    /// Registry name of the server.
    pub server: String,
    /// Uid of the containing well.
    pub well_uid: String,
    /// Uid of the containing wellbore.
    pub wellbore_uid: String,
    /// Uid of the object itself.
    pub uid: String,
}

/// Address of a wellbore on one server (copy destination).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellboreLocation {
    /// Registry name of the server.
    pub server: String,
    /// Uid of the containing well.
    pub well_uid: String,
    /// Uid of the wellbore.
    pub wellbore_uid: String,
}

/// A typed description of one logical store operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Job {
    /// Create a well from a caller-constructed document.
    CreateWell {
        /// Target server.
        server: String,
        /// Uid of the well being created.
        uid: String,
        /// Name of the well being created.
        name: String,
        /// The add document (opaque).
        query: String,
    },
    /// Create a wellbore from a caller-constructed document.
    CreateWellbore {
        /// Target server.
        server: String,
        /// Uid of the containing well.
        well_uid: String,
        /// Uid of the wellbore being created.
        uid: String,
        /// Name of the wellbore being created.
        name: String,
        /// The add document (opaque).
        query: String,
    },
    /// Create a sub-object from a caller-constructed document.
    CreateObject {
        /// Target server.
        server: String,
        /// Kind of the object being created.
        object_type: WitsmlType,
        /// Uid of the containing well.
        well_uid: String,
        /// Uid of the containing wellbore.
        wellbore_uid: String,
        /// Uid of the object being created.
        uid: String,
        /// Name of the object being created.
        name: String,
        /// The add document (opaque).
        query: String,
    },
    /// Delete a well.
    DeleteWell {
        /// Target server.
        server: String,
        /// Uid of the well to delete.
        uid: String,
    },
    /// Delete a wellbore.
    DeleteWellbore {
        /// Target server.
        server: String,
        /// Uid of the containing well.
        well_uid: String,
        /// Uid of the wellbore to delete.
        uid: String,
    },
    /// Delete sub-objects under one wellbore by uid.
    DeleteObjects {
        /// Target server.
        server: String,
        /// Kind of the objects to delete.
        object_type: WitsmlType,
        /// Uid of the containing well.
        well_uid: String,
        /// Uid of the containing wellbore.
        wellbore_uid: String,
        /// Uids of the objects to delete.
        uids: Vec<String>,
    },
    /// Copy an object into a target wellbore.
    CopyObject {
        /// Kind of the object to copy.
        object_type: WitsmlType,
        /// Where the object lives.
        source: ObjectLocation,
        /// Destination wellbore.
        target: WellboreLocation,
    },
    /// Copy selected components into an existing target object.
    CopyComponents {
        /// Component kind being copied.
        component_type: ComponentType,
        /// Object the components come from.
        source: ObjectLocation,
        /// Existing object the components go into.
        target: ObjectLocation,
        /// Identifiers of the components to copy.
        component_ids: Vec<String>,
    },
    /// Copy a range of log data into an existing target log.
    CopyLogData {
        /// Log the data comes from.
        source: ObjectLocation,
        /// Existing log the data goes into.
        target: ObjectLocation,
        /// Range start, in the source log's declared index kind.
        start_index: Index,
        /// Range end, same kind as `start_index`.
        end_index: Index,
    },
    /// Delete log data outside a kept range.
    TrimLogData {
        /// Log to trim.
        log: ObjectLocation,
        /// Start of the range to keep.
        keep_start: Index,
        /// End of the range to keep.
        keep_end: Index,
    },
}

fn required(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(JobError::Validation(format!("missing required {field}")));
    }
    Ok(())
}

fn required_location(prefix: &str, location: &ObjectLocation) -> Result<()> {
    for (field, value) in [
        ("server", &location.server),
        ("well uid", &location.well_uid),
        ("wellbore uid", &location.wellbore_uid),
        ("uid", &location.uid),
    ] {
        if value.trim().is_empty() {
            return Err(JobError::Validation(format!(
                "missing required {prefix} {field}"
            )));
        }
    }
    Ok(())
}

fn same_index_kind(start: &Index, end: &Index) -> Result<()> {
    if start.is_depth() != end.is_depth() {
        return Err(JobError::Validation(
            "index range bounds must share one kind".to_string(),
        ));
    }
    Ok(())
}

impl Job {
    /// The job kind, selecting its worker.
    pub fn job_type(&self) -> JobType {
        match self {
            Self::CreateWell { .. } => JobType::CreateWell,
            Self::CreateWellbore { .. } => JobType::CreateWellbore,
            Self::CreateObject { .. } => JobType::CreateObject,
            Self::DeleteWell { .. } => JobType::DeleteWell,
            Self::DeleteWellbore { .. } => JobType::DeleteWellbore,
            Self::DeleteObjects { .. } => JobType::DeleteObjects,
            Self::CopyObject { .. } => JobType::CopyObject,
            Self::CopyComponents { .. } => JobType::CopyComponents,
            Self::CopyLogData { .. } => JobType::CopyLogData,
            Self::TrimLogData { .. } => JobType::TrimLogData,
        }
    }

    /// Registry name of the server this job writes to.
    pub fn target_server(&self) -> &str {
        match self {
            Self::CreateWell { server, .. }
            | Self::CreateWellbore { server, .. }
            | Self::CreateObject { server, .. }
            | Self::DeleteWell { server, .. }
            | Self::DeleteWellbore { server, .. }
            | Self::DeleteObjects { server, .. } => server,
            Self::CopyObject { target, .. } => &target.server,
            Self::CopyComponents { target, .. } | Self::CopyLogData { target, .. } => {
                &target.server
            }
            Self::TrimLogData { log, .. } => &log.server,
        }
    }

    /// Registry name of the server this job reads from, for the copy family.
    pub fn source_server(&self) -> Option<&str> {
        match self {
            Self::CopyObject { source, .. }
            | Self::CopyComponents { source, .. }
            | Self::CopyLogData { source, .. } => Some(&source.server),
            _ => None,
        }
    }

    /// Human description of the affected entity.
    pub fn entity_description(&self) -> String {
        match self {
            Self::CreateWell { name, uid, .. } => format!("well '{name}' ({uid})"),
            Self::CreateWellbore { name, uid, .. } => format!("wellbore '{name}' ({uid})"),
            Self::CreateObject {
                object_type,
                name,
                uid,
                ..
            } => format!("{object_type} '{name}' ({uid})"),
            Self::DeleteWell { uid, .. } => format!("well {uid}"),
            Self::DeleteWellbore { uid, .. } => format!("wellbore {uid}"),
            Self::DeleteObjects {
                object_type, uids, ..
            } => format!("{} {object_type} object(s)", uids.len()),
            Self::CopyObject {
                object_type,
                source,
                ..
            } => format!("{object_type} {}", source.uid),
            Self::CopyComponents {
                component_type,
                component_ids,
                ..
            } => format!("{} {component_type} component(s)", component_ids.len()),
            Self::CopyLogData { source, .. } => format!("log data of {}", source.uid),
            Self::TrimLogData { log, .. } => format!("log data of {}", log.uid),
        }
    }

    /// Check required fields. A failure here short-circuits the job before
    /// any protocol call is made.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::CreateWell {
                server,
                uid,
                name,
                query,
            } => {
                required("server", server)?;
                required("well uid", uid)?;
                required("well name", name)?;
                required("query document", query)
            }
            Self::CreateWellbore {
                server,
                well_uid,
                uid,
                name,
                query,
            } => {
                required("server", server)?;
                required("well uid", well_uid)?;
                required("wellbore uid", uid)?;
                required("wellbore name", name)?;
                required("query document", query)
            }
            Self::CreateObject {
                server,
                well_uid,
                wellbore_uid,
                uid,
                name,
                query,
                ..
            } => {
                required("server", server)?;
                required("well uid", well_uid)?;
                required("wellbore uid", wellbore_uid)?;
                required("object uid", uid)?;
                required("object name", name)?;
                required("query document", query)
            }
            Self::DeleteWell { server, uid } => {
                required("server", server)?;
                required("well uid", uid)
            }
            Self::DeleteWellbore {
                server,
                well_uid,
                uid,
            } => {
                required("server", server)?;
                required("well uid", well_uid)?;
                required("wellbore uid", uid)
            }
            Self::DeleteObjects {
                server,
                well_uid,
                wellbore_uid,
                uids,
                ..
            } => {
                required("server", server)?;
                required("well uid", well_uid)?;
                required("wellbore uid", wellbore_uid)?;
                if uids.is_empty() {
                    return Err(JobError::Validation(
                        "missing required object uids".to_string(),
                    ));
                }
                for uid in uids {
                    required("object uid", uid)?;
                }
                Ok(())
            }
            Self::CopyObject { source, target, .. } => {
                required_location("source", source)?;
                required("target server", &target.server)?;
                required("target well uid", &target.well_uid)?;
                required("target wellbore uid", &target.wellbore_uid)
            }
            Self::CopyComponents {
                source,
                target,
                component_ids,
                ..
            } => {
                required_location("source", source)?;
                required_location("target", target)?;
                if component_ids.is_empty() {
                    return Err(JobError::Validation(
                        "missing required component ids".to_string(),
                    ));
                }
                Ok(())
            }
            Self::CopyLogData {
                source,
                target,
                start_index,
                end_index,
            } => {
                required_location("source", source)?;
                required_location("target", target)?;
                same_index_kind(start_index, end_index)
            }
            Self::TrimLogData {
                log,
                keep_start,
                keep_end,
            } => {
                required_location("log", log)?;
                same_index_kind(keep_start, keep_end)
            }
        }
    }
}

/// The user-facing summary of a finished job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResult {
    /// Registry name of the server the job ran against.
    pub server: String,
    /// Whether the job succeeded.
    pub is_success: bool,
    /// One-line outcome message.
    pub message: String,
    /// Failure reason, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Description of the affected entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_description: Option<String>,
}

impl WorkerResult {
    /// A successful outcome.
    pub fn success(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            is_success: true,
            message: message.into(),
            reason: None,
            entity_description: None,
        }
    }

    /// A failed outcome with a reason.
    pub fn failure(
        server: impl Into<String>,
        message: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        Self {
            server: server.into(),
            is_success: false,
            message: message.into(),
            reason,
            entity_description: None,
        }
    }

    /// Attach the affected-entity description.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity_description = Some(entity.into());
        self
    }
}

/// Which cached subtree downstream consumers must reload. Produced once per
/// job, regardless of how many store calls the job issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshAction {
    /// Registry name of the affected server.
    pub server: String,
    /// Uid of the affected well.
    pub well_uid: String,
    /// Uid of the affected wellbore, when the subtree is below a wellbore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wellbore_uid: Option<String>,
    /// Kind of the affected entity.
    pub entity_type: WitsmlType,
    /// The job kind that caused the refresh.
    pub job_type: JobType,
}

/// Status record for one job, readable by the submitting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// Job identifier.
    pub id: Uuid,
    /// The job kind.
    pub job_type: JobType,
    /// Current life-cycle state.
    pub status: JobStatus,
    /// Client identity that submitted the job.
    pub submitted_by: String,
    /// When the job was accepted.
    pub created_at: DateTime<Utc>,
    /// When the dispatcher started it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When it reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// The structured outcome, set at the terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WorkerResult>,
    /// Stable error code when the job failed from a typed fault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}
