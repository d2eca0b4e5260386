//! # flowedit
//!
//! flowedit is the editing-session core of a visual automation-graph editor.
//! It owns the graph a user builds (triggers, tasks, conditions, delays,
//! HTTP calls, code, email and notes), and keeps it undoable, persisted and
//! reachable from keyboard shortcuts and a command palette.
//!
//! ## Core Features
//!
//! - **Graph model**: typed nodes with per-type configuration and handle-aware edges
//! - **History**: debounced snapshots with bounded undo/redo
//! - **Persistence**: explicit save, silent autosave and runs against a REST backend
//! - **Commands**: one registry behind the palette and the keyboard
//! - **Import/Export**: a versioned JSON file format
//! - **Layout**: automatic left-to-right arrangement
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowedit::{AuthSession, SessionBuilder, model::Connection};
//!
//! let session = SessionBuilder::new().build()?;
//! session.login(AuthSession::new(user_id, token));
//!
//! session.new_document();
//! let task = session.add_node(NodeType::CreateTask, Position::new(250.0, 200.0));
//! session.connect(Connection::new("trigger-1", task.id.as_str()));
//! session.save(false).await?;
//! ```

mod builder;
pub mod clipboard;
pub mod codec;
pub mod command;
mod common;
mod config;
mod error;
pub mod events;
pub mod graph;
pub mod history;
pub mod layout;
pub mod model;
pub mod nodes;
pub mod persistence;
mod session;
mod utils;

pub use builder::SessionBuilder;
pub use config::{AutosaveConfig, BackendConfig, Config, HistoryConfig, LayoutConfig};
pub use error::EditorError;
pub use events::Notification;
pub use persistence::{AuthSession, SaveOutcome};
pub use session::{SEED_TRIGGER_ID, Session, UNTITLED};

/// Result type alias for flowedit operations.
pub type Result<T> = std::result::Result<T, EditorError>;
