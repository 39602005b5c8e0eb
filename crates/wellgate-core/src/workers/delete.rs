// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Delete-family workers: a single immediate verb, no polling.

use async_trait::async_trait;
use tracing::info;
use wellgate_witsml::WitsmlType;

use crate::error::Result;
use crate::job::{Job, JobType, RefreshAction, WorkerResult};
use crate::workers::queries::{id_query, ids_query};
use crate::workers::{JobContext, Worker, WorkerOutcome};

/// Deletes wells, wellbores, and batches of sub-objects.
pub struct DeleteWorker;

#[async_trait]
impl Worker for DeleteWorker {
    fn job_types(&self) -> &'static [JobType] {
        &[
            JobType::DeleteWell,
            JobType::DeleteWellbore,
            JobType::DeleteObjects,
        ]
    }

    async fn execute(&self, ctx: &JobContext, job: &Job) -> Result<WorkerOutcome> {
        let (query, refresh) = match job {
            Job::DeleteWell { server, uid } => (
                id_query(WitsmlType::Well, None, None, uid),
                RefreshAction {
                    server: server.clone(),
                    well_uid: uid.clone(),
                    wellbore_uid: None,
                    entity_type: WitsmlType::Well,
                    job_type: JobType::DeleteWell,
                },
            ),
            Job::DeleteWellbore {
                server,
                well_uid,
                uid,
            } => (
                id_query(WitsmlType::Wellbore, Some(well_uid), None, uid),
                RefreshAction {
                    server: server.clone(),
                    well_uid: well_uid.clone(),
                    wellbore_uid: Some(uid.clone()),
                    entity_type: WitsmlType::Wellbore,
                    job_type: JobType::DeleteWellbore,
                },
            ),
            Job::DeleteObjects {
                server,
                object_type,
                well_uid,
                wellbore_uid,
                uids,
            } => (
                ids_query(*object_type, Some(well_uid), Some(wellbore_uid), uids),
                RefreshAction {
                    server: server.clone(),
                    well_uid: well_uid.clone(),
                    wellbore_uid: Some(wellbore_uid.clone()),
                    entity_type: *object_type,
                    job_type: JobType::DeleteObjects,
                },
            ),
            _ => unreachable!("registered for delete jobs only"),
        };
        let server = job.target_server();
        let entity = job.entity_description();

        ctx.cancel.check()?;
        let deleted = ctx.client.delete(&query).await?;
        if !deleted.is_successful {
            return Ok(WorkerOutcome::failed(
                WorkerResult::failure(
                    server,
                    format!("Failed to delete {entity}"),
                    deleted.reason,
                )
                .with_entity(entity),
            ));
        }

        info!(server, %entity, "deleted");
        Ok(WorkerOutcome::succeeded(
            WorkerResult::success(server, format!("Deleted {entity}")).with_entity(entity),
            refresh,
        ))
    }
}
