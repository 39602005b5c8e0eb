// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Create-family workers: add, then confirm visibility.

use async_trait::async_trait;
use tracing::info;
use wellgate_witsml::{StoreQuery, WitsmlType};

use crate::error::Result;
use crate::job::{Job, JobType, RefreshAction, WorkerResult};
use crate::workers::{JobContext, Worker, WorkerOutcome, confirm_visible};

/// Creates wells, wellbores, and sub-objects from caller-constructed
/// documents, polling until the created object becomes visible.
pub struct CreateWorker;

#[async_trait]
impl Worker for CreateWorker {
    fn job_types(&self) -> &'static [JobType] {
        &[
            JobType::CreateWell,
            JobType::CreateWellbore,
            JobType::CreateObject,
        ]
    }

    async fn execute(&self, ctx: &JobContext, job: &Job) -> Result<WorkerOutcome> {
        let (object_type, well_uid, wellbore_uid, uid, query) = match job {
            Job::CreateWell { uid, query, .. } => (WitsmlType::Well, None, None, uid, query),
            Job::CreateWellbore {
                well_uid,
                uid,
                query,
                ..
            } => (WitsmlType::Wellbore, Some(well_uid.as_str()), None, uid, query),
            Job::CreateObject {
                object_type,
                well_uid,
                wellbore_uid,
                uid,
                query,
                ..
            } => (
                *object_type,
                Some(well_uid.as_str()),
                Some(wellbore_uid.as_str()),
                uid,
                query,
            ),
            _ => unreachable!("registered for create jobs only"),
        };
        let server = job.target_server();
        let entity = job.entity_description();

        ctx.cancel.check()?;
        let store_query = StoreQuery::new(object_type, query.clone());
        let added = ctx.client.add(&store_query).await?;
        if !added.is_successful {
            return Ok(WorkerOutcome::failed(
                WorkerResult::failure(server, format!("Failed to create {entity}"), added.reason)
                    .with_entity(entity.clone()),
            ));
        }

        confirm_visible(ctx, object_type, well_uid, wellbore_uid, uid, &entity).await?;
        info!(server, %entity, "created and confirmed visible");

        let refresh = RefreshAction {
            server: server.to_string(),
            well_uid: match job {
                Job::CreateWell { uid, .. } => uid.clone(),
                _ => well_uid.unwrap_or_default().to_string(),
            },
            wellbore_uid: match job {
                Job::CreateWellbore { uid, .. } => Some(uid.clone()),
                Job::CreateObject { wellbore_uid, .. } => Some(wellbore_uid.clone()),
                _ => None,
            },
            entity_type: object_type,
            job_type: job.job_type(),
        };

        Ok(WorkerOutcome::succeeded(
            WorkerResult::success(server, format!("Created {entity}")).with_entity(entity),
            refresh,
        ))
    }
}
