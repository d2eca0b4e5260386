//! Loading, saving and running documents against the workflow backend.
//!
//! The backend is only reached through [`WorkflowBackend`]:
//! - [`HttpBackend`]: REST client for the task service
//! - [`MemBackend`]: in-memory store for tests and demos

mod auth;
mod controller;
mod data;
mod dirty;
mod http;
mod mem;

use async_trait::async_trait;

use crate::Result;

pub use auth::AuthSession;
pub use controller::{PersistenceController, SaveOutcome};
pub use data::{ExecutionRecord, ExecutionStatus, WorkflowPayload, WorkflowRecord};
pub use dirty::DirtyTracker;
pub use http::HttpBackend;
pub use mem::MemBackend;

/// Remote store of workflow documents.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// `GET /workflows/{id}`
    async fn load(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<WorkflowRecord>;

    /// `POST /workflows?ownerId={id}`, returns the record with its new id.
    async fn create(
        &self,
        auth: &AuthSession,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord>;

    /// `PUT /workflows/{id}`
    async fn update(
        &self,
        auth: &AuthSession,
        id: &str,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord>;

    /// `POST /workflows/{id}/execute`
    async fn execute(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<ExecutionRecord>;

    /// `GET /workflows/{id}/executions`
    async fn executions(
        &self,
        auth: &AuthSession,
        id: &str,
    ) -> Result<Vec<ExecutionRecord>>;
}
