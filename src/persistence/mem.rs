use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tracing::trace;

use crate::{
    EditorError, Result,
    persistence::{AuthSession, ExecutionRecord, ExecutionStatus, WorkflowBackend, WorkflowPayload, WorkflowRecord},
    utils::{read_lock, write_lock},
};

/// In-memory backend. Ids are uuids, as the task service assigns them.
#[derive(Default)]
pub struct MemBackend {
    workflows: RwLock<HashMap<String, WorkflowRecord>>,
    executions: RwLock<HashMap<String, Vec<ExecutionRecord>>>,
    latency: RwLock<Option<Duration>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call, to observe requests that are in flight.
    pub fn with_latency(
        self,
        latency: Duration,
    ) -> Self {
        *write_lock(&self.latency) = Some(latency);
        self
    }

    /// While set, every call fails with a backend error.
    pub fn set_failing(
        &self,
        failing: bool,
    ) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful create and update calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored workflows.
    pub fn len(&self) -> usize {
        read_lock(&self.workflows).len()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.workflows).is_empty()
    }

    pub fn get(
        &self,
        id: &str,
    ) -> Option<WorkflowRecord> {
        read_lock(&self.workflows).get(id).cloned()
    }

    pub fn insert(
        &self,
        record: WorkflowRecord,
    ) {
        write_lock(&self.workflows).insert(record.id.clone(), record);
    }

    async fn round_trip(
        &self,
        auth: &AuthSession,
    ) -> Result<()> {
        let latency = *read_lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(EditorError::Backend("503 Service Unavailable".to_string()));
        }
        if auth.token.is_empty() {
            return Err(EditorError::Backend("401 Unauthorized".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowBackend for MemBackend {
    async fn load(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<WorkflowRecord> {
        self.round_trip(auth).await?;
        self.get(id).ok_or(EditorError::Backend(format!("404 Not Found: workflow {}", id)))
    }

    async fn create(
        &self,
        auth: &AuthSession,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord> {
        self.round_trip(auth).await?;
        let now = Utc::now().naive_utc();
        let record = WorkflowRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: payload.name.clone(),
            description: Some(payload.description.clone()),
            nodes_json: Some(payload.nodes_json.clone()),
            edges_json: Some(payload.edges_json.clone()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        trace!("MemBackend::create: {} for {}", record.id, auth.user_id);
        self.insert(record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn update(
        &self,
        auth: &AuthSession,
        id: &str,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord> {
        self.round_trip(auth).await?;
        let mut workflows = write_lock(&self.workflows);
        let record = workflows.get_mut(id).ok_or(EditorError::Backend(format!("404 Not Found: workflow {}", id)))?;
        record.name = payload.name.clone();
        record.description = Some(payload.description.clone());
        record.nodes_json = Some(payload.nodes_json.clone());
        record.edges_json = Some(payload.edges_json.clone());
        record.updated_at = Some(Utc::now().naive_utc());
        trace!("MemBackend::update: {}", id);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn execute(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<ExecutionRecord> {
        self.round_trip(auth).await?;
        let workflow = self.get(id).ok_or(EditorError::Backend(format!("404 Not Found: workflow {}", id)))?;
        let now = Utc::now().naive_utc();
        let execution = ExecutionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            workflow_id: id.to_string(),
            workflow_name: Some(workflow.name),
            status: ExecutionStatus::Completed,
            execution_log: Some("Workflow executed".to_string()),
            error_details: None,
            executed_at: Some(now),
            completed_at: Some(now),
        };
        write_lock(&self.executions).entry(id.to_string()).or_default().push(execution.clone());
        Ok(execution)
    }

    async fn executions(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<Vec<ExecutionRecord>> {
        self.round_trip(auth).await?;
        Ok(read_lock(&self.executions).get(id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str) -> WorkflowPayload {
        WorkflowPayload {
            name: name.to_string(),
            description: String::new(),
            nodes_json: "[]".to_string(),
            edges_json: "[]".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_update() {
        let backend = MemBackend::new();
        let auth = AuthSession::new("u1", "token");

        let created = backend.create(&auth, &payload("a")).await.unwrap();
        assert!(uuid::Uuid::parse_str(&created.id).is_ok());

        backend.update(&auth, &created.id, &payload("b")).await.unwrap();
        assert_eq!(backend.load(&auth, &created.id).await.unwrap().name, "b");
        assert_eq!(backend.writes(), 2);
        assert!(backend.update(&auth, "missing", &payload("c")).await.is_err());
    }

    #[tokio::test]
    async fn executions_accumulate() {
        let backend = MemBackend::new();
        let auth = AuthSession::new("u1", "token");
        let created = backend.create(&auth, &payload("a")).await.unwrap();

        backend.execute(&auth, &created.id).await.unwrap();
        backend.execute(&auth, &created.id).await.unwrap();
        let runs = backend.executions(&auth, &created.id).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn failing_and_unauthorized_calls() {
        let backend = MemBackend::new();
        assert!(backend.create(&AuthSession::new("u1", ""), &payload("a")).await.is_err());
        backend.set_failing(true);
        assert!(matches!(
            backend.create(&AuthSession::new("u1", "t"), &payload("a")).await,
            Err(EditorError::Backend(_))
        ));
        assert_eq!(backend.writes(), 0);
    }
}
