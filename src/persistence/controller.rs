use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    EditorError, Result,
    model::{DocumentId, Node, WorkflowDocument},
    persistence::{AuthSession, ExecutionRecord, WorkflowBackend, WorkflowPayload},
    utils::{read_lock, time, write_lock},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// stored under `id`
    Saved { id: String, at: DateTime<Utc> },
    /// another save was in flight, nothing was sent
    Skipped,
    /// the document was replaced before the request finished; the stored
    /// record keeps the old content and the new document stays detached
    Superseded,
}

/// Releases the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The backend record the edited document is bound to. `generation` moves
/// on every attach and detach, so a response can tell whether it still
/// belongs to the current document.
#[derive(Debug, Clone, Default)]
struct Attachment {
    generation: u64,
    id: DocumentId,
    last_saved_at: Option<DateTime<Utc>>,
}

/// Document identity, credentials and the single-save guard.
///
/// Network calls never hold a lock, so editing continues while a request is
/// in flight.
pub struct PersistenceController {
    backend: Arc<dyn WorkflowBackend>,
    auth: RwLock<Option<AuthSession>>,
    attachment: RwLock<Attachment>,
    saving: AtomicBool,
}

impl PersistenceController {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self {
            backend,
            auth: RwLock::new(None),
            attachment: RwLock::new(Attachment::default()),
            saving: AtomicBool::new(false),
        }
    }

    pub fn login(
        &self,
        auth: AuthSession,
    ) {
        info!("PersistenceController::login: {}", auth.user_id);
        *write_lock(&self.auth) = Some(auth);
    }

    pub fn logout(&self) {
        info!("PersistenceController::logout");
        *write_lock(&self.auth) = None;
    }

    pub fn auth(&self) -> Option<AuthSession> {
        read_lock(&self.auth).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        read_lock(&self.auth).is_some()
    }

    pub fn document_id(&self) -> DocumentId {
        read_lock(&self.attachment).id.clone()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        read_lock(&self.attachment).last_saved_at
    }

    /// Current attachment generation, to be passed to [`Self::save`].
    pub fn generation(&self) -> u64 {
        read_lock(&self.attachment).generation
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// Binds the edited document to backend record `id`, e.g. after a load.
    /// Returns the new generation.
    pub fn attach(
        &self,
        id: DocumentId,
        saved_at: Option<DateTime<Utc>>,
    ) -> u64 {
        let mut attachment = write_lock(&self.attachment);
        attachment.generation += 1;
        attachment.id = id;
        attachment.last_saved_at = saved_at;
        debug!("PersistenceController::attach: {} (generation {})", attachment.id, attachment.generation);
        attachment.generation
    }

    /// Forgets the document identity, e.g. when a new document is started.
    /// Returns the new generation.
    pub fn detach(&self) -> u64 {
        self.attach(DocumentId::Unsaved, None)
    }

    fn require_auth(&self) -> Result<AuthSession> {
        self.auth().ok_or(EditorError::AuthRequired)
    }

    fn require_saved(&self) -> Result<String> {
        match self.document_id() {
            DocumentId::Saved(id) => Ok(id),
            DocumentId::Unsaved => Err(EditorError::Session("save the workflow first".to_string())),
        }
    }

    /// Fetches and decodes document `id`. The caller attaches it once the
    /// graph has been swapped in.
    pub async fn load(
        &self,
        id: &str,
    ) -> Result<WorkflowDocument> {
        let auth = self.require_auth()?;
        let record = self.backend.load(&auth, id).await?;
        let document = record.into_document()?;

        info!("PersistenceController::load: {} ({} nodes, {} edges)", id, document.nodes.len(), document.edges.len());
        Ok(document)
    }

    /// Creates the document if it has no id yet, updates it otherwise.
    /// `generation` is the attachment the payload was read under; the
    /// assigned id is only adopted while it is still current.
    pub async fn save(
        &self,
        payload: WorkflowPayload,
        generation: u64,
    ) -> Result<SaveOutcome> {
        let auth = self.require_auth()?;

        let target = {
            let attachment = read_lock(&self.attachment);
            if attachment.generation != generation {
                debug!("PersistenceController::save: generation {} is stale", generation);
                return Ok(SaveOutcome::Superseded);
            }
            attachment.id.clone()
        };

        if self.saving.swap(true, Ordering::SeqCst) {
            debug!("PersistenceController::save: already in flight");
            return Ok(SaveOutcome::Skipped);
        }
        let _guard = InFlight(&self.saving);

        let record = match target {
            DocumentId::Unsaved => self.backend.create(&auth, &payload).await?,
            DocumentId::Saved(id) => self.backend.update(&auth, &id, &payload).await?,
        };

        let at = time::now();
        let mut attachment = write_lock(&self.attachment);
        if attachment.generation != generation {
            info!("PersistenceController::save: {} saved, document replaced meanwhile", record.id);
            return Ok(SaveOutcome::Superseded);
        }
        attachment.id = DocumentId::from(record.id.as_str());
        attachment.last_saved_at = Some(at);
        info!("PersistenceController::save: {} saved", record.id);

        Ok(SaveOutcome::Saved {
            id: record.id,
            at,
        })
    }

    /// Starts a run of the saved document. Enabled nodes missing required
    /// config are reported as a validation error and nothing is sent.
    pub async fn execute(
        &self,
        nodes: &[Node],
    ) -> Result<ExecutionRecord> {
        let id = self.require_saved()?;
        let auth = self.require_auth()?;

        let problems: Vec<String> = nodes
            .iter()
            .filter(|n| !n.is_disabled())
            .filter_map(|n| {
                let missing = n.data.config.missing_fields();
                (!missing.is_empty()).then(|| format!("{} ({})", n.data.label, missing.join(", ")))
            })
            .collect();
        if !problems.is_empty() {
            warn!("PersistenceController::execute: incomplete nodes {:?}", problems);
            return Err(EditorError::Validation(format!("missing required fields: {}", problems.join("; "))));
        }

        let execution = self.backend.execute(&auth, &id).await?;
        info!("PersistenceController::execute: {} -> {}", id, execution.status.as_ref());
        Ok(execution)
    }

    pub async fn executions(&self) -> Result<Vec<ExecutionRecord>> {
        let id = self.require_saved()?;
        let auth = self.require_auth()?;
        self.backend.executions(&auth, &id).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        model::Position,
        nodes::NodeType,
        persistence::MemBackend,
    };

    fn payload() -> WorkflowPayload {
        WorkflowPayload::encode("Flow", "", &[], &[]).unwrap()
    }

    fn controller(backend: Arc<MemBackend>) -> PersistenceController {
        let controller = PersistenceController::new(backend);
        controller.login(AuthSession::new("u1", "token"));
        controller
    }

    #[tokio::test]
    async fn save_without_auth_is_rejected() {
        let backend = Arc::new(MemBackend::new());
        let controller = PersistenceController::new(backend.clone());
        assert_eq!(controller.save(payload(), controller.generation()).await, Err(EditorError::AuthRequired));
        assert_eq!(backend.writes(), 0);
        assert!(!controller.is_saving());
    }

    #[tokio::test]
    async fn first_save_creates_then_updates() {
        let backend = Arc::new(MemBackend::new());
        let controller = controller(backend.clone());

        let SaveOutcome::Saved { id, .. } = controller.save(payload(), controller.generation()).await.unwrap() else {
            panic!("expected a save");
        };
        assert_eq!(controller.document_id(), DocumentId::Saved(id.clone()));
        assert!(controller.last_saved_at().is_some());

        controller.save(payload(), controller.generation()).await.unwrap();
        assert_eq!(controller.document_id(), DocumentId::Saved(id));
        assert_eq!(backend.writes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_save_is_skipped() {
        let backend = Arc::new(MemBackend::new().with_latency(Duration::from_secs(1)));
        let controller = controller(backend.clone());

        let generation = controller.generation();
        let (first, second) = tokio::join!(controller.save(payload(), generation), controller.save(payload(), generation));
        assert!(matches!(first.unwrap(), SaveOutcome::Saved { .. }));
        assert_eq!(second.unwrap(), SaveOutcome::Skipped);
        assert_eq!(backend.writes(), 1);
        assert!(!controller.is_saving());
    }

    #[tokio::test]
    async fn failed_save_releases_the_guard() {
        let backend = Arc::new(MemBackend::new());
        let controller = controller(backend.clone());
        backend.set_failing(true);
        assert!(matches!(controller.save(payload(), controller.generation()).await, Err(EditorError::Backend(_))));
        assert!(!controller.is_saving());
        assert_eq!(controller.document_id(), DocumentId::Unsaved);
    }

    #[tokio::test(start_paused = true)]
    async fn save_finishing_after_detach_is_not_adopted() {
        let backend = Arc::new(MemBackend::new().with_latency(Duration::from_secs(1)));
        let controller = controller(backend.clone());
        let generation = controller.generation();

        let (saved, _) = tokio::join!(controller.save(payload(), generation), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.detach();
        });
        assert_eq!(saved.unwrap(), SaveOutcome::Superseded);
        assert_eq!(controller.document_id(), DocumentId::Unsaved);
        assert!(controller.last_saved_at().is_none());
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn stale_generation_sends_nothing() {
        let backend = Arc::new(MemBackend::new());
        let controller = controller(backend.clone());
        let generation = controller.generation();
        controller.attach(DocumentId::from("wf-9"), None);

        assert_eq!(controller.save(payload(), generation).await.unwrap(), SaveOutcome::Superseded);
        assert_eq!(backend.writes(), 0);
        assert_eq!(controller.document_id(), DocumentId::Saved("wf-9".to_string()));
    }

    #[tokio::test]
    async fn execute_validates_required_fields() {
        let backend = Arc::new(MemBackend::new());
        let controller = controller(backend.clone());
        let mut email = Node::new("email-1".into(), NodeType::Email, Position::default());

        assert!(matches!(controller.execute(&[]).await, Err(EditorError::Session(_))));
        controller.save(payload(), controller.generation()).await.unwrap();

        let err = controller.execute(std::slice::from_ref(&email)).await.unwrap_err();
        assert_eq!(err, EditorError::Validation("missing required fields: Send Email (to, subject)".to_string()));

        email.data.disabled = true;
        let run = controller.execute(&[email]).await.unwrap();
        assert_eq!(controller.executions().await.unwrap(), vec![run]);
    }
}
