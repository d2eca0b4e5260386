//! The editing session: single owner of the graph, its history and the
//! persistence state.
//!
//! Graph operations are synchronous and return once the graph changed.
//! Load, save and execute are async and never hold the state lock across a
//! network call, so editing continues while they are in flight. Two
//! background tasks run per session:
//! - history: records a snapshot after a quiet period following changes
//! - autosave: saves silently on a fixed interval when the document is dirty
//!
//! Both stop on [`Session::teardown`], which also runs on drop.

mod worker;

use std::{
    collections::HashSet,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::{DateTime, Utc};
use tokio::{
    runtime::{Handle, Runtime},
    sync::broadcast,
};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, trace, warn};

use crate::{
    Config, EditorError, Result,
    clipboard::ClipboardController,
    codec::{self, ExportFile},
    command::{Command, CommandId, CommandOutcome, CommandRegistry, Dispatch, InputContext, InputDispatcher, Key, KeyEvent, Palette},
    common::{BroadcastQueue, Queue, Shutdown},
    events::Notification,
    graph::GraphModel,
    history::{HistoryManager, HistorySnapshot},
    layout::{self, LayoutOptions},
    model::{Connection, DocumentId, Edge, EdgeId, Node, NodeDataPatch, NodeId, Position},
    nodes::NodeType,
    persistence::{AuthSession, DirtyTracker, ExecutionRecord, PersistenceController, SaveOutcome, WorkflowBackend, WorkflowPayload},
    utils::{read_lock, time, write_lock},
};

/// Name of a document that was never named.
pub const UNTITLED: &str = "Untitled Workflow";
/// Id of the trigger seeded into new documents.
pub const SEED_TRIGGER_ID: &str = "trigger-1";

/// Capacity of the change-signal queue; one pending signal is enough to
/// restart the quiet period.
const CHANGE_QUEUE_SIZE: usize = 16;
const NOTIFICATION_QUEUE_SIZE: usize = 64;

/// Where palette-created nodes go: a short diagonal cascade so consecutive
/// additions do not stack exactly.
const CASCADE_ORIGIN: f64 = 100.0;
const CASCADE_STEP: f64 = 40.0;
const CASCADE_SLOTS: usize = 10;

/// Everything behind the session lock.
pub(crate) struct EditorState {
    graph: GraphModel,
    history: HistoryManager,
    clipboard: ClipboardController,
    selection: HashSet<NodeId>,
    name: String,
    description: String,
    dirty: DirtyTracker,
    palette: Palette,
}

impl EditorState {
    fn new(history_limit: usize) -> Self {
        let mut state = Self {
            graph: GraphModel::new(),
            history: HistoryManager::new(history_limit),
            clipboard: ClipboardController::new(),
            selection: HashSet::new(),
            name: UNTITLED.to_string(),
            description: String::new(),
            dirty: DirtyTracker::new(),
            palette: Palette::new(),
        };
        state.dirty.reset(&[], &[], &state.name);
        state
    }

    fn observe(&mut self) -> bool {
        self.dirty.observe(self.graph.nodes(), self.graph.edges(), &self.name)
    }

    fn selected_nodes(&self) -> Vec<Node> {
        self.graph.nodes().iter().filter(|n| self.selection.contains(&n.id)).cloned().collect()
    }

    fn prune_selection(&mut self) {
        let graph = &self.graph;
        self.selection.retain(|nid| graph.contains_node(nid));
    }

    /// Swaps in a whole document: history restarts from it, the selection
    /// is dropped and the dirty baseline is reset.
    fn replace_document(
        &mut self,
        name: String,
        description: String,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) {
        self.graph.replace(nodes, edges);
        self.name = name;
        self.description = description;
        self.selection.clear();
        self.palette.close();
        self.history.clear();
        self.history.record(self.graph.snapshot());
        self.dirty.reset(self.graph.nodes(), self.graph.edges(), &self.name);
    }

    fn cascade_position(&self) -> Position {
        let slot = (self.graph.nodes().len() % CASCADE_SLOTS) as f64;
        Position::new(CASCADE_ORIGIN + slot * CASCADE_STEP, CASCADE_ORIGIN + slot * CASCADE_STEP)
    }
}

/// State shared with the background tasks.
pub(crate) struct Inner {
    config: Config,
    state: RwLock<EditorState>,
    persistence: PersistenceController,
    registry: CommandRegistry,
    input: InputDispatcher,
    changes: Arc<Queue<()>>,
    notifications: Arc<BroadcastQueue<Notification>>,
}

impl Inner {
    /// Runs `f` on the state, then feeds both change observers: the dirty
    /// tracker right away and the history worker through the queue.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut EditorState) -> R,
    ) -> R {
        let result = {
            let mut state = write_lock(&self.state);
            let result = f(&mut state);
            state.observe();
            result
        };
        if let Err(err) = self.changes.signal(()) {
            warn!("Session: history signal lost: {}", err);
        }
        result
    }

    fn notify(
        &self,
        notification: Notification,
    ) {
        trace!("Session::notify: {:?}", notification);
        self.notifications.send(notification);
    }

    fn notify_failure(
        &self,
        context: &str,
        err: &EditorError,
    ) {
        match err {
            EditorError::AuthRequired => self.notify(Notification::AuthRequired),
            err => self.notify(Notification::error(format!("{}: {}", context, err))),
        }
    }

    /// Records the current graph; called by the history worker once changes
    /// have been quiet for the debounce period.
    fn record_history(&self) -> bool {
        let mut state = write_lock(&self.state);
        let snapshot = state.graph.snapshot();
        state.history.record(snapshot)
    }

    fn is_dirty(&self) -> bool {
        read_lock(&self.state).dirty.is_dirty()
    }

    async fn save(
        &self,
        silent: bool,
    ) -> Result<SaveOutcome> {
        // documents are swapped under the state lock, so the payload and
        // the generation always belong to the same document
        let (payload, revision, generation) = {
            let mut state = write_lock(&self.state);
            state.observe();
            let payload = WorkflowPayload::encode(&state.name, &state.description, state.graph.nodes(), state.graph.edges())?;
            (payload, state.dirty.revision(), self.persistence.generation())
        };

        match self.persistence.save(payload, generation).await {
            Ok(SaveOutcome::Saved {
                id,
                at,
            }) => {
                let clean = write_lock(&self.state).dirty.mark_saved(revision);
                if !clean {
                    debug!("Session::save: changed while saving, still dirty");
                }
                if !silent {
                    self.notify(Notification::success("Workflow saved"));
                }
                Ok(SaveOutcome::Saved {
                    id,
                    at,
                })
            }
            Ok(SaveOutcome::Skipped) => Ok(SaveOutcome::Skipped),
            Ok(SaveOutcome::Superseded) => {
                debug!("Session::save: document replaced while saving");
                Ok(SaveOutcome::Superseded)
            }
            Err(err) => {
                warn!("Session::save: {} (silent: {})", err, silent);
                // missing credentials are reported even by autosave
                if !silent || err == EditorError::AuthRequired {
                    self.notify_failure("Failed to save workflow", &err);
                }
                Err(err)
            }
        }
    }

    /// One autosave attempt. Skipped unless the document is dirty, already
    /// has an id and no save is running.
    async fn autosave(&self) {
        if !self.is_dirty() || !self.persistence.document_id().is_saved() || self.persistence.is_saving() {
            trace!("Session::autosave: nothing to do");
            return;
        }
        debug!("Session::autosave: saving");
        match self.save(true).await {
            Ok(SaveOutcome::Saved {
                id,
                ..
            }) => debug!("Session::autosave: {} saved", id),
            Ok(outcome) => trace!("Session::autosave: {:?}", outcome),
            Err(err) => trace!("Session::autosave: left dirty: {}", err),
        }
    }
}

/// An editing session over one document at a time.
///
/// Built by [`crate::SessionBuilder`].
pub struct Session {
    inner: Arc<Inner>,
    runtime: Handle,
    /// runtime created by the builder when none was running
    _owned_runtime: Option<Arc<Runtime>>,
    shutdown: Shutdown,
    running: AtomicBool,
}

impl Session {
    pub(crate) fn new(
        config: Config,
        backend: Arc<dyn WorkflowBackend>,
        runtime: Handle,
        owned_runtime: Option<Arc<Runtime>>,
    ) -> Self {
        let inner = Inner {
            state: RwLock::new(EditorState::new(config.history.limit)),
            persistence: PersistenceController::new(backend),
            registry: CommandRegistry::new(config.platform),
            input: InputDispatcher::new(config.platform),
            changes: Queue::new(CHANGE_QUEUE_SIZE),
            notifications: BroadcastQueue::new(NOTIFICATION_QUEUE_SIZE),
            config,
        };

        Self {
            inner: Arc::new(inner),
            runtime,
            _owned_runtime: owned_runtime,
            shutdown: Shutdown::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Starts the background tasks. Called by the builder.
    pub(crate) fn launch(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        self.runtime.spawn(worker::history(self.inner.clone(), self.shutdown.clone()));
        if self.inner.config.autosave.enabled {
            self.runtime.spawn(worker::autosave(self.inner.clone(), self.shutdown.clone()));
        }
        info!("Session::launch: history and autosave started");
    }

    /// Stops both background tasks. No timer fires afterwards; the graph
    /// stays readable.
    pub fn teardown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shutdown.shutdown();
        self.inner.changes.drain();
        info!("Session::teardown");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Stream of notifications for the surface.
    pub fn notifications(&self) -> BroadcastStream<Notification> {
        BroadcastStream::new(self.inner.notifications.subscribe())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    // ---- identity ----

    pub fn login(
        &self,
        auth: AuthSession,
    ) {
        self.inner.persistence.login(auth);
    }

    pub fn logout(&self) {
        self.inner.persistence.logout();
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.persistence.is_authenticated()
    }

    // ---- queries ----

    pub fn snapshot(&self) -> HistorySnapshot {
        read_lock(&self.inner.state).graph.snapshot()
    }

    pub fn nodes(&self) -> Vec<Node> {
        read_lock(&self.inner.state).graph.nodes().to_vec()
    }

    pub fn edges(&self) -> Vec<Edge> {
        read_lock(&self.inner.state).graph.edges().to_vec()
    }

    pub fn node(
        &self,
        nid: &str,
    ) -> Option<Node> {
        read_lock(&self.inner.state).graph.node(nid).cloned()
    }

    pub fn name(&self) -> String {
        read_lock(&self.inner.state).name.clone()
    }

    pub fn description(&self) -> String {
        read_lock(&self.inner.state).description.clone()
    }

    pub fn document_id(&self) -> DocumentId {
        self.inner.persistence.document_id()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.inner.persistence.is_saving()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.inner.persistence.last_saved_at()
    }

    pub fn can_undo(&self) -> bool {
        read_lock(&self.inner.state).history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        read_lock(&self.inner.state).history.can_redo()
    }

    /// `(entries, index)` of the undo history.
    pub fn history_position(&self) -> (usize, Option<usize>) {
        let state = read_lock(&self.inner.state);
        (state.history.len(), state.history.index())
    }

    pub fn clipboard_len(&self) -> usize {
        read_lock(&self.inner.state).clipboard.len()
    }

    /// Re-runs change detection, e.g. once per rendered frame.
    pub fn tick(&self) -> bool {
        write_lock(&self.inner.state).observe()
    }

    // ---- document fields ----

    pub fn set_name(
        &self,
        name: impl Into<String>,
    ) {
        let name = name.into();
        self.inner.mutate(|state| state.name = name);
    }

    pub fn set_description(
        &self,
        description: impl Into<String>,
    ) {
        let description = description.into();
        self.inner.mutate(|state| state.description = description);
    }

    // ---- graph ----

    pub fn add_node(
        &self,
        node_type: NodeType,
        position: Position,
    ) -> Node {
        self.inner.mutate(|state| state.graph.add_node(node_type, position))
    }

    /// Removes the node, its edges and its selection entry.
    pub fn remove_node(
        &self,
        nid: &str,
    ) -> bool {
        self.inner.mutate(|state| {
            state.selection.remove(nid);
            state.graph.remove_node(nid).is_some()
        })
    }

    pub fn toggle_disabled(
        &self,
        nid: &str,
    ) -> Option<bool> {
        self.inner.mutate(|state| state.graph.toggle_disabled(nid))
    }

    /// Single entry point of the per-type config editors.
    pub fn update_node(
        &self,
        nid: &str,
        patch: NodeDataPatch,
    ) -> bool {
        if patch.is_empty() {
            return self.node(nid).is_some();
        }
        self.inner.mutate(|state| state.graph.update_node_data(nid, patch))
    }

    /// Applies the JSON object a config editor produced.
    pub fn update_node_json(
        &self,
        nid: &str,
        value: serde_json::Value,
    ) -> Result<bool> {
        let node_type = self.node(nid).map(|n| n.node_type).ok_or_else(|| EditorError::Validation(format!("no node {}", nid)))?;
        let patch = NodeDataPatch::from_json(node_type, value)?;
        Ok(self.update_node(nid, patch))
    }

    pub fn move_node(
        &self,
        nid: &str,
        position: Position,
    ) -> bool {
        self.inner.mutate(|state| state.graph.set_position(nid, position))
    }

    pub fn connect(
        &self,
        connection: Connection,
    ) -> Option<Edge> {
        self.inner.mutate(|state| state.graph.add_edge(connection))
    }

    pub fn remove_edge(
        &self,
        eid: &EdgeId,
    ) -> bool {
        self.inner.mutate(|state| state.graph.remove_edge(eid).is_some())
    }

    /// Rearranges every node left to right. Only positions change.
    pub fn arrange(&self) {
        let options = LayoutOptions::from(&self.inner.config.layout);
        self.inner.mutate(|state| {
            let arranged = layout::arrange(state.graph.nodes(), state.graph.edges(), &options);
            for node in arranged {
                state.graph.set_position(&node.id, node.position);
            }
        });
    }

    // ---- selection ----

    /// Replaces the selection. Unknown ids are ignored.
    pub fn select<I, S>(
        &self,
        ids: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let mut state = write_lock(&self.inner.state);
        let graph = &state.graph;
        let selection: HashSet<NodeId> = ids.into_iter().map(Into::into).filter(|nid| graph.contains_node(nid)).collect();
        state.selection = selection;
    }

    pub fn clear_selection(&self) {
        write_lock(&self.inner.state).selection.clear();
    }

    /// Selected ids in document order.
    pub fn selection(&self) -> Vec<NodeId> {
        read_lock(&self.inner.state).selected_nodes().into_iter().map(|n| n.id).collect()
    }

    // ---- clipboard ----

    pub fn copy_selection(&self) -> usize {
        let mut state = write_lock(&self.inner.state);
        let selected = state.selected_nodes();
        state.clipboard.copy(&selected)
    }

    /// Pastes the clipboard at +50,+50; the clones become the selection.
    pub fn paste(&self) -> Vec<Node> {
        self.inner.mutate(|state| {
            let pasted = state.clipboard.paste(&mut state.graph);
            if !pasted.is_empty() {
                state.selection = pasted.iter().map(|n| n.id.clone()).collect();
            }
            pasted
        })
    }

    pub fn duplicate_selection(&self) -> Vec<Node> {
        self.inner.mutate(|state| {
            let selected = state.selected_nodes();
            let copies = state.clipboard.duplicate(&mut state.graph, &selected);
            if !copies.is_empty() {
                state.selection = copies.iter().map(|n| n.id.clone()).collect();
            }
            copies
        })
    }

    pub fn delete_selection(&self) -> usize {
        self.inner.mutate(|state| {
            let ids: Vec<NodeId> = state.selection.drain().collect();
            ids.iter().filter(|nid| state.graph.remove_node(nid).is_some()).count()
        })
    }

    pub fn toggle_selection_disabled(&self) -> usize {
        self.inner.mutate(|state| {
            let ids: Vec<NodeId> = state.selected_nodes().into_iter().map(|n| n.id).collect();
            ids.iter().filter(|nid| state.graph.toggle_disabled(nid).is_some()).count()
        })
    }

    // ---- history ----

    /// Steps back one snapshot. Returns false at the oldest entry.
    pub fn undo(&self) -> bool {
        let mut state = write_lock(&self.inner.state);
        let Some(snapshot) = state.history.undo() else {
            return false;
        };
        state.graph.restore(snapshot);
        state.prune_selection();
        state.observe();
        true
    }

    pub fn redo(&self) -> bool {
        let mut state = write_lock(&self.inner.state);
        let Some(snapshot) = state.history.redo() else {
            return false;
        };
        state.graph.restore(snapshot);
        state.prune_selection();
        state.observe();
        true
    }

    // ---- documents ----

    /// Unsaved document seeded with a manual trigger.
    pub fn new_document(&self) {
        let trigger = Node::new(SEED_TRIGGER_ID.to_string(), NodeType::Trigger, Position::new(250.0, 50.0));
        {
            let mut state = write_lock(&self.inner.state);
            self.inner.persistence.detach();
            state.replace_document(UNTITLED.to_string(), String::new(), vec![trigger], Vec::new());
        }
        self.inner.notify(Notification::DocumentReplaced);
    }

    /// Replaces the session document with backend document `id`. On
    /// failure the graph is left as it was.
    pub async fn load(
        &self,
        id: &str,
    ) -> Result<()> {
        match self.inner.persistence.load(id).await {
            Ok(document) => {
                {
                    let mut state = write_lock(&self.inner.state);
                    self.inner.persistence.attach(document.id, document.updated_at);
                    state.replace_document(document.name, document.description, document.nodes, document.edges);
                }
                self.inner.notify(Notification::DocumentReplaced);
                Ok(())
            }
            Err(err) => {
                warn!("Session::load: {}: {}", id, err);
                self.inner.notify_failure("Failed to load workflow", &err);
                Err(err)
            }
        }
    }

    pub async fn save(
        &self,
        silent: bool,
    ) -> Result<SaveOutcome> {
        self.inner.save(silent).await
    }

    pub async fn execute(&self) -> Result<ExecutionRecord> {
        let nodes = self.nodes();
        match self.inner.persistence.execute(&nodes).await {
            Ok(run) => {
                self.inner.notify(Notification::success("Workflow execution started"));
                Ok(run)
            }
            Err(err) => {
                self.inner.notify_failure("Failed to execute workflow", &err);
                Err(err)
            }
        }
    }

    pub async fn executions(&self) -> Result<Vec<ExecutionRecord>> {
        self.inner.persistence.executions().await.inspect_err(|err| {
            self.inner.notify_failure("Failed to load executions", err);
        })
    }

    pub fn export(&self) -> Result<ExportFile> {
        let state = read_lock(&self.inner.state);
        codec::export(&state.name, state.graph.nodes(), state.graph.edges(), time::now())
    }

    /// Loads an export file as a new unsaved document named
    /// `<name> (Imported)`. A rejected file changes nothing.
    pub fn import_text(
        &self,
        text: &str,
    ) -> Result<()> {
        let imported = match codec::import(text) {
            Ok(imported) => imported,
            Err(err) => {
                warn!("Session::import_text: {}", err);
                self.inner.notify(Notification::error(format!("Failed to import workflow: {}", err)));
                return Err(err);
            }
        };

        {
            let mut state = write_lock(&self.inner.state);
            self.inner.persistence.detach();
            let name = imported.document_name();
            state.replace_document(name, String::new(), imported.nodes, imported.edges);
            // nothing of it is stored yet
            state.dirty.touch();
        }
        self.inner.notify(Notification::DocumentReplaced);
        self.inner.notify(Notification::success("Workflow imported"));
        Ok(())
    }

    // ---- commands ----

    pub fn registry(&self) -> &CommandRegistry {
        &self.inner.registry
    }

    pub fn palette(&self) -> Palette {
        read_lock(&self.inner.state).palette.clone()
    }

    pub fn set_palette_query(
        &self,
        query: impl Into<String>,
    ) {
        write_lock(&self.inner.state).palette.set_query(query);
    }

    pub fn close_palette(&self) {
        write_lock(&self.inner.state).palette.close();
    }

    /// Current palette matches, in registry order.
    pub fn palette_matches(&self) -> Vec<Command> {
        let state = read_lock(&self.inner.state);
        state.palette.matches(&self.inner.registry).into_iter().cloned().collect()
    }

    /// Routes a key press and runs the command it resolves to. `None` means
    /// the key is not handled here and should bubble.
    pub async fn handle_key(
        &self,
        event: KeyEvent,
    ) -> Result<Option<CommandOutcome>> {
        let dispatch = {
            let mut state = write_lock(&self.inner.state);
            let palette_key = matches!(event.key, Key::ArrowUp | Key::ArrowDown | Key::Enter | Key::Escape);
            if state.palette.is_open() && palette_key {
                match state.palette.handle_key(event.key, &self.inner.registry) {
                    Some(id) => Dispatch::Command(id),
                    None => return Ok(Some(CommandOutcome::Done)),
                }
            } else {
                let context = InputContext {
                    has_selection: !state.selection.is_empty(),
                    can_paste: !state.clipboard.is_empty(),
                };
                self.inner.input.dispatch(&event, context)
            }
        };

        match dispatch {
            Dispatch::Command(id) => self.run_command(id).await.map(Some),
            Dispatch::Unavailable(_) => Ok(Some(CommandOutcome::Skipped)),
            Dispatch::Bubble => Ok(None),
        }
    }

    /// Performs a command.
    pub async fn run_command(
        &self,
        id: CommandId,
    ) -> Result<CommandOutcome> {
        debug!("Session::run_command: {}", id.as_ref());
        let done = |acted: bool| if acted { CommandOutcome::Done } else { CommandOutcome::Skipped };

        let outcome = match id {
            CommandId::AddNode(node_type) => {
                let position = read_lock(&self.inner.state).cascade_position();
                self.add_node(node_type, position);
                CommandOutcome::Done
            }
            CommandId::Save => {
                self.save(false).await?;
                CommandOutcome::Done
            }
            CommandId::Execute => CommandOutcome::Executed(self.execute().await?),
            CommandId::Export => CommandOutcome::Download(self.export()?),
            CommandId::Import => CommandOutcome::PromptImport,
            CommandId::AutoArrange => {
                self.arrange();
                CommandOutcome::Done
            }
            CommandId::OpenPalette => {
                let mut state = write_lock(&self.inner.state);
                state.palette.toggle();
                if state.palette.is_open() { CommandOutcome::OpenPalette } else { CommandOutcome::Done }
            }
            CommandId::ShowHelp => CommandOutcome::ShowHelp,
            CommandId::NewDocument => {
                self.new_document();
                CommandOutcome::Done
            }
            CommandId::Undo => done(self.undo()),
            CommandId::Redo => done(self.redo()),
            CommandId::Copy => done(self.copy_selection() > 0),
            CommandId::Paste => done(!self.paste().is_empty()),
            CommandId::Duplicate => done(!self.duplicate_selection().is_empty()),
            CommandId::DeleteSelection => done(self.delete_selection() > 0),
            CommandId::ToggleDisabled => done(self.toggle_selection_disabled() > 0),
        };
        Ok(outcome)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
