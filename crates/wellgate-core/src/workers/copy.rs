// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Copy-family workers.
//!
//! Copy jobs read from a source client and write through the target client,
//! resolving the destination parent with a preliminary get and substituting
//! the source well/wellbore identifiers with the target's before writing.

use async_trait::async_trait;
use tracing::info;
use wellgate_witsml::{OptionsIn, StoreQuery, WitsmlType};

use crate::components::ComponentRegistry;
use crate::error::{JobError, Result};
use crate::job::{Job, JobType, RefreshAction, WorkerResult};
use crate::workers::queries::{document_contains_object, id_query, substitute_parent_uids};
use crate::workers::{JobContext, Worker, WorkerOutcome, confirm_visible};

/// Copies one object into a target wellbore, possibly across servers.
pub struct CopyObjectWorker;

#[async_trait]
impl Worker for CopyObjectWorker {
    fn job_types(&self) -> &'static [JobType] {
        &[JobType::CopyObject]
    }

    async fn execute(&self, ctx: &JobContext, job: &Job) -> Result<WorkerOutcome> {
        let Job::CopyObject {
            object_type,
            source,
            target,
        } = job
        else {
            unreachable!("registered for copy-object jobs only");
        };
        let entity = job.entity_description();

        // Read the full source object.
        ctx.cancel.check()?;
        let source_query = id_query(
            *object_type,
            Some(&source.well_uid),
            Some(&source.wellbore_uid),
            &source.uid,
        );
        let source_doc = ctx
            .source()?
            .get(&source_query, &OptionsIn::none())
            .await?;
        if !document_contains_object(&source_doc, &source.uid) {
            return Err(JobError::NotFound(format!(
                "source {object_type} '{}'",
                source.uid
            )));
        }

        // Resolve the destination wellbore before constructing the write.
        ctx.cancel.check()?;
        let parent_query = id_query(
            WitsmlType::Wellbore,
            Some(&target.well_uid),
            None,
            &target.wellbore_uid,
        );
        let parent_doc = ctx.client.get(&parent_query, &OptionsIn::id_only()).await?;
        if !document_contains_object(&parent_doc, &target.wellbore_uid) {
            return Err(JobError::NotFound(format!(
                "target wellbore '{}'",
                target.wellbore_uid
            )));
        }

        // Re-parent and write.
        ctx.cancel.check()?;
        let rewritten = substitute_parent_uids(
            &source_doc.xml,
            &target.well_uid,
            Some(&target.wellbore_uid),
        );
        let added = ctx
            .client
            .add(&StoreQuery::new(*object_type, rewritten))
            .await?;
        if !added.is_successful {
            return Ok(WorkerOutcome::failed(
                WorkerResult::failure(
                    &target.server,
                    format!("Failed to copy {entity}"),
                    added.reason,
                )
                .with_entity(entity),
            ));
        }

        confirm_visible(
            ctx,
            *object_type,
            Some(&target.well_uid),
            Some(&target.wellbore_uid),
            &source.uid,
            &entity,
        )
        .await?;
        info!(
            source_server = %source.server,
            target_server = %target.server,
            %entity,
            "copied and confirmed visible"
        );

        Ok(WorkerOutcome::succeeded(
            WorkerResult::success(&target.server, format!("Copied {entity}")).with_entity(entity),
            RefreshAction {
                server: target.server.clone(),
                well_uid: target.well_uid.clone(),
                wellbore_uid: Some(target.wellbore_uid.clone()),
                entity_type: *object_type,
                job_type: JobType::CopyObject,
            },
        ))
    }
}

/// Copies selected components of an object into an existing target object,
/// dispatching per component kind through the handler registry.
pub struct CopyComponentsWorker {
    registry: ComponentRegistry,
}

impl CopyComponentsWorker {
    /// Worker with the built-in component handlers.
    pub fn with_default_handlers() -> Self {
        Self {
            registry: ComponentRegistry::with_defaults(),
        }
    }

    /// Worker with a caller-assembled registry.
    pub fn new(registry: ComponentRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Worker for CopyComponentsWorker {
    fn job_types(&self) -> &'static [JobType] {
        &[JobType::CopyComponents]
    }

    async fn execute(&self, ctx: &JobContext, job: &Job) -> Result<WorkerOutcome> {
        let Job::CopyComponents {
            component_type,
            source,
            target,
            component_ids,
        } = job
        else {
            unreachable!("registered for copy-components jobs only");
        };
        let entity = job.entity_description();

        let handler = self.registry.get(*component_type).ok_or_else(|| {
            JobError::Validation(format!("no handler for {component_type} components"))
        })?;
        let host = handler.host_type();

        // Read the full source object.
        ctx.cancel.check()?;
        let source_query = id_query(
            host,
            Some(&source.well_uid),
            Some(&source.wellbore_uid),
            &source.uid,
        );
        let source_doc = ctx
            .source()?
            .get(&source_query, &OptionsIn::none())
            .await?;
        if !document_contains_object(&source_doc, &source.uid) {
            return Err(JobError::NotFound(format!("source {host} '{}'", source.uid)));
        }

        // The destination object must already exist.
        ctx.cancel.check()?;
        let target_query = id_query(
            host,
            Some(&target.well_uid),
            Some(&target.wellbore_uid),
            &target.uid,
        );
        let target_doc = ctx.client.get(&target_query, &OptionsIn::id_only()).await?;
        if !document_contains_object(&target_doc, &target.uid) {
            return Err(JobError::NotFound(format!("target {host} '{}'", target.uid)));
        }

        // Build the component-only update and write it.
        ctx.cancel.check()?;
        let update_xml = handler.set_components(&source_doc, component_ids, target)?;
        let updated = ctx.client.update(&StoreQuery::new(host, update_xml)).await?;
        if !updated.is_successful {
            return Ok(WorkerOutcome::failed(
                WorkerResult::failure(
                    &target.server,
                    format!("Failed to copy {entity}"),
                    updated.reason,
                )
                .with_entity(entity),
            ));
        }

        info!(target_server = %target.server, %entity, "components copied");
        Ok(WorkerOutcome::succeeded(
            WorkerResult::success(&target.server, format!("Copied {entity}")).with_entity(entity),
            RefreshAction {
                server: target.server.clone(),
                well_uid: target.well_uid.clone(),
                wellbore_uid: Some(target.wellbore_uid.clone()),
                entity_type: host,
                job_type: JobType::CopyComponents,
            },
        ))
    }
}
