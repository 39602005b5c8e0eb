// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wellgate Core - Job Execution Framework
//!
//! This crate drives every mutating store operation in the system: a caller
//! submits a typed job, the dispatcher binds it to a provider-resolved store
//! client (or a source/target pair for copy jobs), the matching worker runs
//! its protocol calls, and the outcome comes back as one structured
//! [`WorkerResult`](job::WorkerResult) plus, on success, one
//! [`RefreshAction`](job::RefreshAction) telling downstream caches what to
//! reload.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Submitting layer (REST, CLI)              │
//! └──────────────────────────────────────────────────────────────┘
//!          │ submit(Job)                        ▲ status / results
//!          ▼                                    │
//! ┌──────────────┐   dequeue   ┌──────────────────────────────────┐
//! │   JobQueue   │────────────►│          JobDispatcher           │
//! └──────────────┘             │  validate → resolve → execute    │
//!                              └──────────────────────────────────┘
//!                                   │                    │
//!                     ClientProvider│                    │ RefreshAction
//!                                   ▼                    ▼
//!                        ┌──────────────────┐   ┌────────────────┐
//!                        │   StoreClient    │   │  RefreshSink   │
//!                        │ (wellgate-witsml)│   │  (broadcast)   │
//!                        └──────────────────┘   └────────────────┘
//! ```
//!
//! # Job state machine
//!
//! ```text
//!      ┌────────┐
//!      │ QUEUED │
//!      └───┬────┘
//!          │ dequeue
//!          ▼
//!      ┌─────────┐ cancel (step boundary)  ┌───────────┐
//!      │ RUNNING │────────────────────────►│ CANCELLED │
//!      └───┬─────┘                         └───────────┘
//!          │
//!    ┌─────┴──────┐
//!    ▼            ▼
//! ┌───────────┐ ┌────────┐
//! │ SUCCEEDED │ │ FAILED │
//! └───────────┘ └────────┘
//! ```
//!
//! Cancellation is cooperative: it is observed between protocol calls and
//! between poll iterations, never inside an in-flight call. A cancelled job
//! emits no refresh action.
//!
//! # Create-then-confirm
//!
//! Store acceptance does not guarantee immediate read-back consistency.
//! After every creation the worker polls the store with id-only gets until
//! the object is visible, awaiting a non-blocking delay between attempts
//! (interval default 1 s, attempt limit default 30, both configurable).
//! Exhausting the attempts is a fatal, distinct failure
//! ([`JobError::ConsistencyTimeout`](error::JobError::ConsistencyTimeout)),
//! not a generic one.
//!
//! # Configuration
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `WELLGATE_POLL_INTERVAL_MS` | No | `1000` | Delay between visibility poll attempts |
//! | `WELLGATE_POLL_MAX_ATTEMPTS` | No | `30` | Visibility poll attempt limit |
//! | `WELLGATE_JOB_QUEUE_CAPACITY` | No | `64` | Queued-job channel capacity |
//! | `WELLGATE_CREDENTIALS_TTL_SECS` | No | `3600` | Credentials cache lifetime |

/// Component copy capability interface and per-kind handlers.
pub mod components;

/// Configuration loaded from environment variables.
pub mod config;

/// Error types for job execution.
pub mod error;

/// Typed jobs, job status, worker results, refresh actions.
pub mod job;

/// Refresh notification emission.
pub mod notify;

/// Job queue, status store, and background dispatcher.
pub mod queue;

/// Workers executing each job family.
pub mod workers;

pub use config::Config;
pub use error::{JobError, Result};
pub use job::{Job, JobInfo, JobStatus, JobType, RefreshAction, WorkerResult};
pub use notify::{RefreshBroadcaster, RefreshSink};
pub use queue::{CancelToken, ClientResolver, JobDispatcher, JobQueue, JobStore};
pub use workers::{JobContext, PollSettings, Worker, WorkerOutcome, WorkerRegistry};
