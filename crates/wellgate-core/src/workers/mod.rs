// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workers executing each job family.
//!
//! One worker serves one or more job kinds, selected through the
//! [`WorkerRegistry`]. Workers receive a [`JobContext`] holding the resolved
//! store client(s), poll settings, and the cooperative cancellation token;
//! they return a [`WorkerOutcome`] or a typed [`JobError`] that the
//! dispatcher converts into a structured result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use wellgate_witsml::{OptionsIn, StoreClient, WitsmlType};

use crate::error::{JobError, Result};
use crate::job::{Job, JobType, RefreshAction, WorkerResult};
use crate::queue::CancelToken;

/// Orchestration query shells (identity, index ranges).
pub mod queries;

mod copy;
mod create;
mod delete;
mod log_data;

pub use copy::{CopyComponentsWorker, CopyObjectWorker};
pub use create::CreateWorker;
pub use delete::DeleteWorker;
pub use log_data::{CopyLogDataWorker, TrimLogDataWorker};

/// Bounds of the create-then-confirm visibility poll.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Delay awaited between attempts.
    pub interval: Duration,
    /// Attempt limit; exhausting it is a fatal consistency timeout.
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_attempts: 30,
        }
    }
}

/// Everything one job execution runs with.
pub struct JobContext {
    /// Client bound to the job's target server.
    pub client: Arc<StoreClient>,
    /// Client bound to the source server, for the copy family.
    pub source_client: Option<Arc<StoreClient>>,
    /// Visibility poll bounds.
    pub poll: PollSettings,
    /// Cooperative cancellation token, checked at step boundaries.
    pub cancel: CancelToken,
}

impl JobContext {
    /// The source-side client; copy jobs without one are invalid.
    pub fn source(&self) -> Result<&Arc<StoreClient>> {
        self.source_client
            .as_ref()
            .ok_or_else(|| JobError::Validation("copy jobs need a source server".to_string()))
    }
}

/// What a worker hands back to the dispatcher.
#[derive(Debug)]
pub struct WorkerOutcome {
    /// The user-facing summary.
    pub result: WorkerResult,
    /// Refresh descriptor; present only on success.
    pub refresh: Option<RefreshAction>,
}

impl WorkerOutcome {
    /// Success with its refresh descriptor.
    pub fn succeeded(result: WorkerResult, refresh: RefreshAction) -> Self {
        Self {
            result,
            refresh: Some(refresh),
        }
    }

    /// Failure; no refresh is emitted.
    pub fn failed(result: WorkerResult) -> Self {
        Self {
            result,
            refresh: None,
        }
    }
}

/// Executes one or more job kinds against resolved store clients.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Job kinds this worker executes.
    fn job_types(&self) -> &'static [JobType];

    /// Run the job to an outcome. Input validation has already happened;
    /// cancellation must still be checked at every step boundary.
    async fn execute(&self, ctx: &JobContext, job: &Job) -> Result<WorkerOutcome>;
}

/// Workers keyed by job type.
pub struct WorkerRegistry {
    workers: HashMap<JobType, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    /// Registry with the built-in workers.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            workers: HashMap::new(),
        };
        registry.register(Arc::new(CreateWorker));
        registry.register(Arc::new(DeleteWorker));
        registry.register(Arc::new(CopyObjectWorker));
        registry.register(Arc::new(CopyComponentsWorker::with_default_handlers()));
        registry.register(Arc::new(CopyLogDataWorker));
        registry.register(Arc::new(TrimLogDataWorker));
        registry
    }

    /// Register a worker for every job type it declares.
    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        for job_type in worker.job_types() {
            self.workers.insert(*job_type, worker.clone());
        }
    }

    /// Worker for a job type.
    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn Worker>> {
        self.workers.get(&job_type).cloned()
    }
}

/// Poll the store with id-only gets until the created object is visible.
///
/// Store acceptance does not guarantee read-back consistency; this is the
/// bounded compensation. The wait between attempts is an awaited delay, not
/// a thread sleep. Exhausting the attempts is a fatal
/// [`JobError::ConsistencyTimeout`], distinct from the creation call failing.
pub(crate) async fn confirm_visible(
    ctx: &JobContext,
    object_type: WitsmlType,
    well_uid: Option<&str>,
    wellbore_uid: Option<&str>,
    uid: &str,
    entity: &str,
) -> Result<()> {
    let query = queries::id_query(object_type, well_uid, wellbore_uid, uid);
    let options = OptionsIn::id_only();

    for attempt in 1..=ctx.poll.max_attempts {
        ctx.cancel.check()?;

        let doc = ctx.client.get(&query, &options).await?;
        if queries::document_contains_object(&doc, uid) {
            debug!(attempt, uid, "created object is visible");
            return Ok(());
        }

        if attempt < ctx.poll.max_attempts {
            tokio::time::sleep(ctx.poll.interval).await;
        }
    }

    Err(JobError::ConsistencyTimeout {
        entity: entity.to_string(),
        attempts: ctx.poll.max_attempts,
    })
}
