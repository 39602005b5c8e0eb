// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job queue, status store, and background dispatcher.
//!
//! The dispatcher pulls queued jobs and runs each to completion in its own
//! task; jobs for different targets run concurrently. Serializing jobs that
//! touch the same object is the caller's responsibility; there is no
//! internal locking on object identity.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Notify, mpsc};
use tracing::{error, info, warn};
use uuid::Uuid;
use wellgate_connections::{ClientProvider, ProviderError, ServerRole};
use wellgate_witsml::StoreClient;

use crate::config::Config;
use crate::error::JobError;
use crate::job::{Job, JobInfo, JobStatus, WorkerResult};
use crate::notify::RefreshSink;
use crate::workers::{JobContext, PollSettings, WorkerRegistry};

/// Resolves ready store clients for a job's server roles.
///
/// [`ClientProvider`] is the production implementation; tests substitute
/// their own.
pub trait ClientResolver: Send + Sync {
    /// Resolve the client for `role` on `server`, on behalf of `identity`.
    fn resolve(
        &self,
        role: ServerRole,
        server: &str,
        identity: &str,
    ) -> Result<Arc<StoreClient>, ProviderError>;
}

impl ClientResolver for ClientProvider {
    fn resolve(
        &self,
        role: ServerRole,
        server: &str,
        identity: &str,
    ) -> Result<Arc<StoreClient>, ProviderError> {
        ClientProvider::resolve(self, role, server, identity)
    }
}

/// Cooperative cancellation token, observed at step boundaries only.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Signal cancellation. The in-flight protocol call, if any, still
    /// completes; the job stops at its next step boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was signalled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Step-boundary check: errors with [`JobError::Cancelled`] once
    /// cancellation was signalled.
    pub fn check(&self) -> Result<(), JobError> {
        if self.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }
}

struct QueuedJob {
    id: Uuid,
    job: Job,
    identity: String,
}

/// In-memory job records, readable by the submitting layer.
///
/// Jobs are not persisted by the framework; persistence, if any, is an
/// external collaborator's responsibility.
#[derive(Default)]
pub struct JobStore {
    jobs: DashMap<Uuid, JobInfo>,
    tokens: DashMap<Uuid, CancelToken>,
}

impl JobStore {
    /// Status record for one job.
    pub fn get(&self, id: Uuid) -> Option<JobInfo> {
        self.jobs.get(&id).map(|entry| entry.value().clone())
    }

    /// Snapshot of every job record.
    pub fn snapshot(&self) -> Vec<JobInfo> {
        self.jobs.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Signal cancellation for a job. Returns false for unknown or already
    /// terminal jobs.
    pub fn cancel(&self, id: Uuid) -> bool {
        let known_active = self
            .jobs
            .get(&id)
            .map(|entry| !entry.status.is_terminal())
            .unwrap_or(false);
        if !known_active {
            return false;
        }
        if let Some(token) = self.tokens.get(&id) {
            token.cancel();
        }
        true
    }

    fn insert_queued(&self, info: JobInfo) -> CancelToken {
        let token = CancelToken::default();
        self.tokens.insert(info.id, token.clone());
        self.jobs.insert(info.id, info);
        token
    }

    fn token(&self, id: Uuid) -> CancelToken {
        self.tokens
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn mark_running(&self, id: Uuid) {
        if let Some(mut entry) = self.jobs.get_mut(&id) {
            entry.status = JobStatus::Running;
            entry.started_at = Some(Utc::now());
        }
    }

    fn finish(
        &self,
        id: Uuid,
        status: JobStatus,
        result: WorkerResult,
        error_code: Option<&'static str>,
    ) {
        if let Some(mut entry) = self.jobs.get_mut(&id) {
            entry.status = status;
            entry.finished_at = Some(Utc::now());
            entry.result = Some(result);
            entry.error_code = error_code.map(str::to_string);
        }
        self.tokens.remove(&id);
    }

    fn remove(&self, id: Uuid) {
        self.jobs.remove(&id);
        self.tokens.remove(&id);
    }
}

/// Submission handle for the dispatcher.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    store: Arc<JobStore>,
}

impl JobQueue {
    /// Accept a job on behalf of `identity`. Returns immediately with the
    /// job identifier; status is queryable through the [`JobStore`].
    pub async fn submit(&self, job: Job, identity: &str) -> Result<Uuid, JobError> {
        let id = Uuid::new_v4();
        let info = JobInfo {
            id,
            job_type: job.job_type(),
            status: JobStatus::Queued,
            submitted_by: identity.to_string(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            error_code: None,
        };
        self.store.insert_queued(info);

        let queued = QueuedJob {
            id,
            job,
            identity: identity.to_string(),
        };
        if self.tx.send(queued).await.is_err() {
            self.store.remove(id);
            return Err(JobError::QueueClosed);
        }
        Ok(id)
    }
}

/// Background dispatcher pulling queued jobs and running each to a terminal
/// state.
pub struct JobDispatcher {
    rx: mpsc::Receiver<QueuedJob>,
    resolver: Arc<dyn ClientResolver>,
    workers: Arc<WorkerRegistry>,
    store: Arc<JobStore>,
    refresh: Arc<dyn RefreshSink>,
    poll: PollSettings,
    shutdown: Arc<Notify>,
}

impl JobDispatcher {
    /// Build a dispatcher with the default worker registry, returning the
    /// submission queue and the shared status store alongside it.
    pub fn new(
        resolver: Arc<dyn ClientResolver>,
        refresh: Arc<dyn RefreshSink>,
        config: &Config,
    ) -> (Self, JobQueue, Arc<JobStore>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let store = Arc::new(JobStore::default());
        let dispatcher = Self {
            rx,
            resolver,
            workers: Arc::new(WorkerRegistry::with_defaults()),
            store: store.clone(),
            refresh,
            poll: PollSettings {
                interval: config.poll_interval,
                max_attempts: config.poll_max_attempts,
            },
            shutdown: Arc::new(Notify::new()),
        };
        let queue = JobQueue {
            tx,
            store: store.clone(),
        };
        (dispatcher, queue, store)
    }

    /// Get a handle to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the dispatch loop until shutdown or until every queue handle is
    /// dropped.
    pub async fn run(mut self) {
        info!(
            poll_interval_ms = self.poll.interval.as_millis() as u64,
            poll_max_attempts = self.poll.max_attempts,
            "job dispatcher started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("job dispatcher shutting down");
                    break;
                }
                queued = self.rx.recv() => {
                    let Some(queued) = queued else {
                        info!("job queue closed, dispatcher stopping");
                        break;
                    };
                    let resolver = self.resolver.clone();
                    let workers = self.workers.clone();
                    let store = self.store.clone();
                    let refresh = self.refresh.clone();
                    let poll = self.poll;
                    tokio::spawn(async move {
                        run_job(resolver, workers, store, refresh, poll, queued).await;
                    });
                }
            }
        }
    }
}

async fn run_job(
    resolver: Arc<dyn ClientResolver>,
    workers: Arc<WorkerRegistry>,
    store: Arc<JobStore>,
    refresh: Arc<dyn RefreshSink>,
    poll: PollSettings,
    queued: QueuedJob,
) {
    let QueuedJob { id, job, identity } = queued;
    let token = store.token(id);
    let server = job.target_server().to_string();
    let entity = job.entity_description();

    // Cancelled while still queued: terminal without any call.
    if token.is_cancelled() {
        store.finish(
            id,
            JobStatus::Cancelled,
            WorkerResult::failure(&server, format!("Cancelled {entity}"), None),
            Some("CANCELLED"),
        );
        return;
    }

    store.mark_running(id);

    // Validation short-circuits with zero protocol calls.
    if let Err(e) = job.validate() {
        warn!(job_id = %id, error = %e, "job input invalid");
        store.finish(
            id,
            JobStatus::Failed,
            WorkerResult::failure(&server, format!("Invalid {entity} job"), Some(e.to_string())),
            Some(e.code()),
        );
        return;
    }

    // Bind the job to provider-resolved clients.
    let client = match resolver.resolve(ServerRole::Target, &server, &identity) {
        Ok(client) => client,
        Err(e) => {
            warn!(job_id = %id, error = %e, "target client resolution failed");
            let code = e.code();
            store.finish(
                id,
                JobStatus::Failed,
                WorkerResult::failure(&server, format!("Failed {entity} job"), Some(e.to_string())),
                Some(code),
            );
            return;
        }
    };
    let source_client = match job.source_server() {
        Some(source_server) => {
            match resolver.resolve(ServerRole::Source, source_server, &identity) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(job_id = %id, error = %e, "source client resolution failed");
                    let code = e.code();
                    store.finish(
                        id,
                        JobStatus::Failed,
                        WorkerResult::failure(
                            &server,
                            format!("Failed {entity} job"),
                            Some(e.to_string()),
                        ),
                        Some(code),
                    );
                    return;
                }
            }
        }
        None => None,
    };

    let Some(worker) = workers.get(job.job_type()) else {
        error!(job_id = %id, job_type = ?job.job_type(), "no worker registered");
        store.finish(
            id,
            JobStatus::Failed,
            WorkerResult::failure(&server, format!("Failed {entity} job"), None),
            Some("NO_WORKER"),
        );
        return;
    };

    let ctx = JobContext {
        client,
        source_client,
        poll,
        cancel: token,
    };

    match worker.execute(&ctx, &job).await {
        Ok(outcome) => {
            let status = if outcome.result.is_success {
                JobStatus::Succeeded
            } else {
                JobStatus::Failed
            };
            store.finish(id, status, outcome.result, None);
            if let Some(action) = outcome.refresh {
                refresh.publish(action);
            }
        }
        Err(JobError::Cancelled) => {
            info!(job_id = %id, "job cancelled at step boundary");
            store.finish(
                id,
                JobStatus::Cancelled,
                WorkerResult::failure(&server, format!("Cancelled {entity}"), None),
                Some("CANCELLED"),
            );
        }
        Err(e) => {
            warn!(job_id = %id, error = %e, "job failed");
            let code = e.code();
            store.finish(
                id,
                JobStatus::Failed,
                WorkerResult::failure(
                    &server,
                    format!("Failed {entity} job"),
                    Some(e.to_string()),
                )
                .with_entity(entity),
                Some(code),
            );
        }
    }
}
