//! Named actions, the palette over them and the keyboard that triggers them.

pub mod input;
pub mod palette;
pub mod registry;

pub use input::{Dispatch, FocusTarget, InputContext, InputDispatcher, Key, KeyEvent, Modifiers, Platform};
pub use palette::Palette;
pub use registry::{Command, CommandCategory, CommandId, CommandRegistry};

use crate::{codec::ExportFile, persistence::ExecutionRecord};

/// What the surface has to do after a command ran.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// handled entirely inside the session
    Done,
    /// show the palette
    OpenPalette,
    /// show the key binding overlay
    ShowHelp,
    /// ask the user for a file and hand its text to `Session::import_text`
    PromptImport,
    /// offer the file for download
    Download(ExportFile),
    /// a run was started
    Executed(ExecutionRecord),
    /// a precondition did not hold, nothing changed
    Skipped,
}
