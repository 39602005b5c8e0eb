// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end tests for the job framework against a simulated store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use wellgate_connections::{ProviderError, ServerRole};
use wellgate_core::{
    Config, Job, JobDispatcher, JobInfo, JobStatus, JobType, RefreshBroadcaster,
};
use wellgate_core::job::{ObjectLocation, WellboreLocation};
use wellgate_core::queue::{ClientResolver, JobStore};
use wellgate_witsml::soap::ProtocolOutcome;
use wellgate_witsml::{QueryLogger, StoreClient, StorePort, WitsmlError, WitsmlType};

/// Scripted in-memory store: objects become visible a configurable number of
/// gets after their add.
#[derive(Default)]
struct SimStore {
    server: String,
    /// Empty gets served for a freshly added uid before it turns visible.
    visible_after: u32,
    /// Result code scripted for add calls (default success).
    add_result: i16,
    /// Every call fails at the transport level with a 5xx-equivalent fault.
    remote_crash: bool,
    /// Fixed document served for every get, when set.
    get_override: Mutex<Option<String>>,
    base_msg: String,
    visible: Mutex<HashSet<String>>,
    pending: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
    written: Mutex<Vec<String>>,
}

impl SimStore {
    fn new(server: &str) -> Self {
        Self {
            server: server.to_string(),
            add_result: 1,
            base_msg: "Simulated failure".to_string(),
            ..Self::default()
        }
    }

    fn with_visible(self, uids: &[&str]) -> Self {
        {
            let mut visible = self.visible.lock().unwrap();
            for uid in uids {
                visible.insert(uid.to_string());
            }
        }
        self
    }

    fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn written_documents(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

fn extract_uid(xml: &str) -> Option<String> {
    let start = xml.find(" uid=\"")? + 6;
    let end = xml[start..].find('"')?;
    Some(xml[start..start + end].to_string())
}

fn outcome(result_code: i16, xml_out: Option<String>) -> ProtocolOutcome {
    ProtocolOutcome {
        result_code,
        xml_out,
        supp_msg_out: String::new(),
    }
}

#[async_trait]
impl StorePort for SimStore {
    async fn add_to_store(
        &self,
        wml_type: &str,
        xml: &str,
        _options: &str,
    ) -> Result<ProtocolOutcome, WitsmlError> {
        self.calls.lock().unwrap().push(format!("add:{wml_type}"));
        if self.remote_crash {
            return Err(WitsmlError::RemoteCrashed {
                server: self.server.clone(),
            });
        }
        self.written.lock().unwrap().push(xml.to_string());
        if self.add_result <= 0 {
            return Ok(ProtocolOutcome {
                result_code: self.add_result,
                xml_out: None,
                supp_msg_out: "supplementary detail".to_string(),
            });
        }
        if let Some(uid) = extract_uid(xml) {
            if self.visible_after == 0 {
                self.visible.lock().unwrap().insert(uid);
            } else {
                self.pending.lock().unwrap().insert(uid, self.visible_after);
            }
        }
        Ok(outcome(1, None))
    }

    async fn get_from_store(
        &self,
        wml_type: &str,
        query: &str,
        _options: &str,
    ) -> Result<ProtocolOutcome, WitsmlError> {
        self.calls.lock().unwrap().push(format!("get:{wml_type}"));
        if self.remote_crash {
            return Err(WitsmlError::RemoteCrashed {
                server: self.server.clone(),
            });
        }
        if let Some(xml) = self.get_override.lock().unwrap().clone() {
            return Ok(outcome(1, Some(xml)));
        }

        let uid = extract_uid(query).unwrap_or_default();
        {
            let mut pending = self.pending.lock().unwrap();
            if let Some(remaining) = pending.get_mut(&uid) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(outcome(1, Some(format!("<{wml_type}s />"))));
                }
                pending.remove(&uid);
                self.visible.lock().unwrap().insert(uid.clone());
            }
        }

        if self.visible.lock().unwrap().contains(&uid) {
            Ok(outcome(
                1,
                Some(format!("<{wml_type}s><{wml_type} uid=\"{uid}\"/></{wml_type}s>")),
            ))
        } else {
            Ok(outcome(1, Some(format!("<{wml_type}s />"))))
        }
    }

    async fn update_in_store(
        &self,
        wml_type: &str,
        xml: &str,
        _options: &str,
    ) -> Result<ProtocolOutcome, WitsmlError> {
        self.calls.lock().unwrap().push(format!("update:{wml_type}"));
        if self.remote_crash {
            return Err(WitsmlError::RemoteCrashed {
                server: self.server.clone(),
            });
        }
        self.written.lock().unwrap().push(xml.to_string());
        Ok(outcome(1, None))
    }

    async fn delete_from_store(
        &self,
        wml_type: &str,
        _query: &str,
        _options: &str,
    ) -> Result<ProtocolOutcome, WitsmlError> {
        self.calls.lock().unwrap().push(format!("delete:{wml_type}"));
        if self.remote_crash {
            return Err(WitsmlError::RemoteCrashed {
                server: self.server.clone(),
            });
        }
        Ok(outcome(1, None))
    }

    async fn get_cap(&self, _options: &str) -> Result<ProtocolOutcome, WitsmlError> {
        Ok(outcome(1, Some("<capServers/>".to_string())))
    }

    async fn get_base_msg(&self, _code: i16) -> Result<String, WitsmlError> {
        Ok(self.base_msg.clone())
    }

    fn server(&self) -> &str {
        &self.server
    }
}

/// Resolver serving pre-built clients per server name.
struct SimResolver {
    clients: HashMap<String, Arc<StoreClient>>,
}

impl SimResolver {
    fn new(stores: Vec<Arc<SimStore>>) -> Self {
        let clients = stores
            .into_iter()
            .map(|store| {
                let name = store.server.clone();
                let client = Arc::new(StoreClient::new(store, QueryLogger::disabled()));
                (name, client)
            })
            .collect();
        Self { clients }
    }
}

impl ClientResolver for SimResolver {
    fn resolve(
        &self,
        role: ServerRole,
        server: &str,
        _identity: &str,
    ) -> Result<Arc<StoreClient>, ProviderError> {
        self.clients
            .get(server)
            .cloned()
            .ok_or_else(|| ProviderError::no_access(role))
    }
}

struct Harness {
    queue: wellgate_core::JobQueue,
    store: Arc<JobStore>,
    refresh: Arc<RefreshBroadcaster>,
}

fn harness(stores: Vec<Arc<SimStore>>, poll_interval: Duration, max_attempts: u32) -> Harness {
    let refresh = Arc::new(RefreshBroadcaster::new(16));
    let config = Config {
        poll_interval,
        poll_max_attempts: max_attempts,
        queue_capacity: 8,
        credentials_ttl: Duration::from_secs(3600),
    };
    let (dispatcher, queue, store) = JobDispatcher::new(
        Arc::new(SimResolver::new(stores)),
        refresh.clone(),
        &config,
    );
    tokio::spawn(dispatcher.run());
    Harness {
        queue,
        store,
        refresh,
    }
}

async fn wait_terminal(store: &JobStore, id: Uuid) -> JobInfo {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(info) = store.get(id)
                && info.status.is_terminal()
            {
                return info;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("job did not reach a terminal state")
}

fn create_well_job(uid: &str, name: &str) -> Job {
    Job::CreateWell {
        server: "rig-1".to_string(),
        uid: uid.to_string(),
        name: name.to_string(),
        query: format!(r#"<wells><well uid="{uid}"><name>{name}</name></well></wells>"#),
    }
}

#[tokio::test]
async fn test_create_then_confirm_succeeds_after_k_attempts() {
    let k_minus_one = 2u32; // empty polls before the object shows up
    let store = Arc::new({
        let mut sim = SimStore::new("rig-1");
        sim.visible_after = k_minus_one;
        sim
    });
    let h = harness(vec![store.clone()], Duration::from_millis(1), 30);
    let mut refresh_rx = h.refresh.subscribe();

    let id = h.queue.submit(create_well_job("W-1", "Alpha"), "alice").await.unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Succeeded);
    let result = info.result.unwrap();
    assert!(result.is_success);
    assert!(result.message.contains("well 'Alpha'"));

    // k = k_minus_one + 1 attempts; never more than k+1 gets.
    let gets = store.call_count("get:well");
    assert_eq!(gets, (k_minus_one + 1) as usize);
    assert_eq!(store.call_count("add:well"), 1);

    // Exactly one refresh action for the new well's subtree.
    let action = refresh_rx.recv().await.unwrap();
    assert_eq!(action.server, "rig-1");
    assert_eq!(action.well_uid, "W-1");
    assert_eq!(action.entity_type, WitsmlType::Well);
    assert_eq!(action.job_type, JobType::CreateWell);
    assert!(refresh_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_poll_exhaustion_is_consistency_timeout() {
    let store = Arc::new({
        let mut sim = SimStore::new("rig-1");
        sim.visible_after = u32::MAX; // never becomes visible
        sim
    });
    let h = harness(vec![store.clone()], Duration::from_millis(1), 30);
    let mut refresh_rx = h.refresh.subscribe();

    let id = h.queue.submit(create_well_job("W-2", "Beta"), "alice").await.unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Failed);
    assert_eq!(info.error_code.as_deref(), Some("CONSISTENCY_TIMEOUT"));
    assert_eq!(store.call_count("get:well"), 30);

    let result = info.result.unwrap();
    assert!(!result.is_success);
    assert!(result.reason.unwrap().contains("not visible after 30 attempts"));
    assert!(refresh_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_validation_failure_makes_zero_protocol_calls() {
    let store = Arc::new(SimStore::new("rig-1"));
    let h = harness(vec![store.clone()], Duration::from_millis(1), 30);

    let id = h.queue.submit(create_well_job("", "Alpha"), "alice").await.unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Failed);
    assert_eq!(info.error_code.as_deref(), Some("VALIDATION"));
    assert!(store.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unresolvable_target_is_no_access() {
    let h = harness(vec![], Duration::from_millis(1), 30);

    let id = h.queue.submit(create_well_job("W-1", "Alpha"), "alice").await.unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Failed);
    assert_eq!(info.error_code.as_deref(), Some("NO_ACCESS"));
    let reason = info.result.unwrap().reason.unwrap();
    assert!(reason.contains("target server"));
    assert!(reason.contains("401"));
}

#[tokio::test]
async fn test_remote_crash_fails_without_any_polling() {
    let store = Arc::new({
        let mut sim = SimStore::new("rig-1");
        sim.remote_crash = true;
        sim
    });
    let h = harness(vec![store.clone()], Duration::from_millis(1), 30);

    let id = h.queue.submit(create_well_job("W-1", "Alpha"), "alice").await.unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Failed);
    assert_eq!(info.error_code.as_deref(), Some("REMOTE_CRASHED"));
    // The add crashed; the poll loop never started.
    assert_eq!(store.call_count("get:well"), 0);
}

#[tokio::test]
async fn test_add_rejection_becomes_structured_failure() {
    let store = Arc::new({
        let mut sim = SimStore::new("rig-1");
        sim.add_result = -415;
        sim.base_msg = "Input XML document is not valid".to_string();
        sim
    });
    let h = harness(vec![store.clone()], Duration::from_millis(1), 30);
    let mut refresh_rx = h.refresh.subscribe();

    let id = h.queue.submit(create_well_job("W-1", "Alpha"), "alice").await.unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Failed);
    let result = info.result.unwrap();
    assert_eq!(
        result.reason.as_deref(),
        Some("Error -415 - Input XML document is not valid. supplementary detail")
    );
    assert!(refresh_rx.try_recv().is_err());
    // No poll after a rejected add.
    assert_eq!(store.call_count("get:well"), 0);
}

#[tokio::test]
async fn test_delete_is_a_single_immediate_verb() {
    let store = Arc::new(SimStore::new("rig-1").with_visible(&["W-1"]));
    let h = harness(vec![store.clone()], Duration::from_millis(1), 30);
    let mut refresh_rx = h.refresh.subscribe();

    let id = h
        .queue
        .submit(
            Job::DeleteWell {
                server: "rig-1".to_string(),
                uid: "W-1".to_string(),
            },
            "alice",
        )
        .await
        .unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Succeeded);
    assert_eq!(store.call_count("delete:well"), 1);
    assert_eq!(store.call_count("get:well"), 0);

    let action = refresh_rx.recv().await.unwrap();
    assert_eq!(action.entity_type, WitsmlType::Well);
    assert_eq!(action.job_type, JobType::DeleteWell);
}

#[tokio::test]
async fn test_cancellation_at_step_boundary_emits_no_refresh() {
    let store = Arc::new({
        let mut sim = SimStore::new("rig-1");
        sim.visible_after = u32::MAX; // keep the poll loop spinning
        sim
    });
    let h = harness(vec![store.clone()], Duration::from_millis(100), 1000);
    let mut refresh_rx = h.refresh.subscribe();

    let id = h.queue.submit(create_well_job("W-1", "Alpha"), "alice").await.unwrap();

    // Let the job reach the poll loop, then cancel between iterations.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(h.store.cancel(id));

    let info = wait_terminal(&h.store, id).await;
    assert_eq!(info.status, JobStatus::Cancelled);
    assert_eq!(info.error_code.as_deref(), Some("CANCELLED"));
    assert!(refresh_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_copy_object_substitutes_target_parent_uids() {
    let source = Arc::new(SimStore::new("rig-1"));
    *source.get_override.lock().unwrap() = Some(
        r#"<logs><log uidWell="W-1" uidWellbore="WB-1" uid="L-1"><name>Run 4</name></log></logs>"#
            .to_string(),
    );
    let target = Arc::new(SimStore::new("rig-2").with_visible(&["WB-9", "L-1"]));

    let h = harness(vec![source.clone(), target.clone()], Duration::from_millis(1), 30);
    let mut refresh_rx = h.refresh.subscribe();

    let id = h
        .queue
        .submit(
            Job::CopyObject {
                object_type: WitsmlType::Log,
                source: ObjectLocation {
                    server: "rig-1".to_string(),
                    well_uid: "W-1".to_string(),
                    wellbore_uid: "WB-1".to_string(),
                    uid: "L-1".to_string(),
                },
                target: WellboreLocation {
                    server: "rig-2".to_string(),
                    well_uid: "W-9".to_string(),
                    wellbore_uid: "WB-9".to_string(),
                },
            },
            "alice",
        )
        .await
        .unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Succeeded);

    // The written document was re-parented; the object uid survived.
    let written = target.written_documents();
    assert_eq!(written.len(), 1);
    assert!(written[0].contains(r#"uidWell="W-9""#));
    assert!(written[0].contains(r#"uidWellbore="WB-9""#));
    assert!(written[0].contains(r#"uid="L-1""#));

    // Nothing was written to the source server.
    assert!(source.written_documents().is_empty());

    let action = refresh_rx.recv().await.unwrap();
    assert_eq!(action.server, "rig-2");
    assert_eq!(action.well_uid, "W-9");
    assert_eq!(action.wellbore_uid.as_deref(), Some("WB-9"));
}

#[tokio::test]
async fn test_copy_without_source_credentials_fails_source_role() {
    let target = Arc::new(SimStore::new("rig-2"));
    let h = harness(vec![target], Duration::from_millis(1), 30);

    let id = h
        .queue
        .submit(
            Job::CopyObject {
                object_type: WitsmlType::Log,
                source: ObjectLocation {
                    server: "rig-1".to_string(),
                    well_uid: "W-1".to_string(),
                    wellbore_uid: "WB-1".to_string(),
                    uid: "L-1".to_string(),
                },
                target: WellboreLocation {
                    server: "rig-2".to_string(),
                    well_uid: "W-9".to_string(),
                    wellbore_uid: "WB-9".to_string(),
                },
            },
            "alice",
        )
        .await
        .unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Failed);
    assert_eq!(info.error_code.as_deref(), Some("NO_ACCESS"));
    assert!(info.result.unwrap().reason.unwrap().contains("source server"));
}

#[tokio::test]
async fn test_copy_log_data_writes_range_under_target_identity() {
    let source = Arc::new(SimStore::new("rig-1"));
    *source.get_override.lock().unwrap() = Some(
        concat!(
            r#"<logs><log uidWell="W-1" uidWellbore="WB-1" uid="L-1">"#,
            "<logData><mnemonicList>DEPTH,ROP</mnemonicList>",
            "<data>1500,12.5</data><data>1501,13.0</data></logData>",
            "</log></logs>"
        )
        .to_string(),
    );
    let target = Arc::new(SimStore::new("rig-2").with_visible(&["L-9"]));

    let h = harness(vec![source, target.clone()], Duration::from_millis(1), 30);

    let location = |server: &str, uid: &str| ObjectLocation {
        server: server.to_string(),
        well_uid: if server == "rig-1" { "W-1" } else { "W-9" }.to_string(),
        wellbore_uid: if server == "rig-1" { "WB-1" } else { "WB-9" }.to_string(),
        uid: uid.to_string(),
    };

    let id = h
        .queue
        .submit(
            Job::CopyLogData {
                source: location("rig-1", "L-1"),
                target: location("rig-2", "L-9"),
                start_index: wellgate_witsml::Index::depth(1500.0, "m"),
                end_index: wellgate_witsml::Index::depth(1501.0, "m"),
            },
            "alice",
        )
        .await
        .unwrap();
    let info = wait_terminal(&h.store, id).await;

    assert_eq!(info.status, JobStatus::Succeeded);
    let written = target.written_documents();
    assert_eq!(written.len(), 1);
    assert!(written[0].contains(r#"uid="L-9""#));
    assert!(written[0].contains("<data>1501,13.0</data>"));
    assert_eq!(target.call_count("update:log"), 1);
}

#[tokio::test]
async fn test_jobs_for_different_targets_run_concurrently() {
    // Two slow jobs against two servers; with 100 ms poll intervals each,
    // serial execution would take well over the observed window.
    let rig_1 = Arc::new({
        let mut sim = SimStore::new("rig-1");
        sim.visible_after = 2;
        sim
    });
    let rig_2 = Arc::new({
        let mut sim = SimStore::new("rig-2");
        sim.visible_after = 2;
        sim
    });
    let h = harness(vec![rig_1, rig_2], Duration::from_millis(50), 30);

    let job_1 = h.queue.submit(create_well_job("W-1", "Alpha"), "alice").await.unwrap();
    let job_2 = h
        .queue
        .submit(
            Job::CreateWell {
                server: "rig-2".to_string(),
                uid: "W-2".to_string(),
                name: "Beta".to_string(),
                query: r#"<wells><well uid="W-2"/></wells>"#.to_string(),
            },
            "alice",
        )
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let first = wait_terminal(&h.store, job_1).await;
    let second = wait_terminal(&h.store, job_2).await;
    let elapsed = started.elapsed();

    assert_eq!(first.status, JobStatus::Succeeded);
    assert_eq!(second.status, JobStatus::Succeeded);
    // Two sequential runs would need ~200 ms of poll delays; concurrent
    // execution overlaps them.
    assert!(elapsed < Duration::from_millis(350), "took {elapsed:?}");
}
