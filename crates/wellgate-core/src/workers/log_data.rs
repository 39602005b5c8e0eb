// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Index-range workers over growing log data.
//!
//! The index representation (depth vs date-time) follows the source log's
//! declared index kind, carried by the job's [`Index`] bounds; depth bounds
//! format as numeric strings, date-time bounds with the fixed millisecond
//! pattern.

use async_trait::async_trait;
use tracing::info;
use wellgate_witsml::soap::escape_xml;
use wellgate_witsml::{OptionsIn, StoreQuery, WitsmlType};

use crate::error::{JobError, Result};
use crate::job::{Job, JobType, ObjectLocation, RefreshAction, WorkerResult};
use crate::workers::queries::{
    SCHEMA_VERSION, WITSML_NS, document_contains_object, id_query, log_data_range_query,
    log_trim_queries,
};
use crate::workers::{JobContext, Worker, WorkerOutcome};

/// Build the update document writing `log_data_xml` into the target log.
fn log_data_update(target: &ObjectLocation, log_data_xml: &str) -> String {
    format!(
        concat!(
            r#"<logs xmlns="{ns}" version="{version}">"#,
            r#"<log uidWell="{well}" uidWellbore="{wellbore}" uid="{uid}">"#,
            "{data}",
            "</log></logs>"
        ),
        ns = WITSML_NS,
        version = SCHEMA_VERSION,
        well = escape_xml(&target.well_uid),
        wellbore = escape_xml(&target.wellbore_uid),
        uid = escape_xml(&target.uid),
        data = log_data_xml,
    )
}

/// Slice the `<logData>` sections out of a log document.
fn extract_log_data(xml: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(xml).ok()?;
    let mut sections = String::new();
    for node in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "logData")
    {
        sections.push_str(&xml[node.range()]);
    }
    (!sections.is_empty()).then_some(sections)
}

/// Copies a range of log data into an existing target log.
pub struct CopyLogDataWorker;

#[async_trait]
impl Worker for CopyLogDataWorker {
    fn job_types(&self) -> &'static [JobType] {
        &[JobType::CopyLogData]
    }

    async fn execute(&self, ctx: &JobContext, job: &Job) -> Result<WorkerOutcome> {
        let Job::CopyLogData {
            source,
            target,
            start_index,
            end_index,
        } = job
        else {
            unreachable!("registered for copy-log-data jobs only");
        };
        let entity = job.entity_description();

        // The destination log must already exist.
        ctx.cancel.check()?;
        let target_query = id_query(
            WitsmlType::Log,
            Some(&target.well_uid),
            Some(&target.wellbore_uid),
            &target.uid,
        );
        let target_doc = ctx
            .client
            .get(&target_query, &OptionsIn::header_only())
            .await?;
        if !document_contains_object(&target_doc, &target.uid) {
            return Err(JobError::NotFound(format!("target log '{}'", target.uid)));
        }

        // Read the requested range from the source log.
        ctx.cancel.check()?;
        let range_query = log_data_range_query(source, start_index, end_index);
        let source_doc = ctx
            .source()?
            .get(
                &range_query,
                &OptionsIn::none().with_return_elements(wellgate_witsml::ReturnElements::DataOnly),
            )
            .await?;
        let Some(log_data) = extract_log_data(&source_doc.xml) else {
            return Err(JobError::NotFound(format!(
                "log data in [{start_index}, {end_index}] of '{}'",
                source.uid
            )));
        };

        // Write the data under the target log's identity.
        ctx.cancel.check()?;
        let update = StoreQuery::new(WitsmlType::Log, log_data_update(target, &log_data));
        let updated = ctx.client.update(&update).await?;
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

        info!(
            source_server = %source.server,
            target_server = %target.server,
            %entity,
            "log data range copied"
        );
        Ok(WorkerOutcome::succeeded(
            WorkerResult::success(&target.server, format!("Copied {entity}")).with_entity(entity),
            RefreshAction {
                server: target.server.clone(),
                well_uid: target.well_uid.clone(),
                wellbore_uid: Some(target.wellbore_uid.clone()),
                entity_type: WitsmlType::Log,
                job_type: JobType::CopyLogData,
            },
        ))
    }
}

/// Deletes log data outside a kept index range, one delete per side.
pub struct TrimLogDataWorker;

#[async_trait]
impl Worker for TrimLogDataWorker {
    fn job_types(&self) -> &'static [JobType] {
        &[JobType::TrimLogData]
    }

    async fn execute(&self, ctx: &JobContext, job: &Job) -> Result<WorkerOutcome> {
        let Job::TrimLogData {
            log,
            keep_start,
            keep_end,
        } = job
        else {
            unreachable!("registered for trim-log-data jobs only");
        };
        let entity = job.entity_description();
        let (before, after) = log_trim_queries(log, keep_start, keep_end);

        for query in [before, after] {
            ctx.cancel.check()?;
            let deleted = ctx.client.delete(&query).await?;
            if !deleted.is_successful {
                return Ok(WorkerOutcome::failed(
                    WorkerResult::failure(
                        &log.server,
                        format!("Failed to trim {entity}"),
                        deleted.reason,
                    )
                    .with_entity(entity),
                ));
            }
        }

        info!(server = %log.server, %entity, keep_start = %keep_start, keep_end = %keep_end, "log trimmed");
        Ok(WorkerOutcome::succeeded(
            WorkerResult::success(&log.server, format!("Trimmed {entity}")).with_entity(entity),
            RefreshAction {
                server: log.server.clone(),
                well_uid: log.well_uid.clone(),
                wellbore_uid: Some(log.wellbore_uid.clone()),
                entity_type: WitsmlType::Log,
                job_type: JobType::TrimLogData,
            },
        ))
    }
}
