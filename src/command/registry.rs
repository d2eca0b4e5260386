//! Command catalogue shared by the palette and the keyboard.

use tracing::trace;

use crate::{
    command::input::{Platform, chord_for},
    nodes::{NodeType, NodeTypeRegistry},
};

/// Palette group, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumIter)]
pub enum CommandCategory {
    Nodes,
    Workflow,
    Edit,
}

/// Stable identifier of a command. Behaviour lives in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum CommandId {
    AddNode(NodeType),
    Save,
    Execute,
    Export,
    Import,
    AutoArrange,
    OpenPalette,
    ShowHelp,
    NewDocument,
    Undo,
    Redo,
    Copy,
    Paste,
    Duplicate,
    DeleteSelection,
    ToggleDisabled,
}

const WORKFLOW_COMMANDS: &[(CommandId, &str, &str)] = &[
    (CommandId::Save, "Save Workflow", "Persist the current document to the server"),
    (CommandId::Execute, "Execute Workflow", "Run the saved document now"),
    (CommandId::Export, "Export Workflow", "Download the document as a JSON file"),
    (CommandId::Import, "Import Workflow", "Load a document from a JSON file"),
    (CommandId::AutoArrange, "Auto Arrange", "Lay out the graph from left to right"),
    (CommandId::OpenPalette, "Command Palette", "Search and run any command"),
    (CommandId::ShowHelp, "Keyboard Shortcuts", "Show every key binding"),
    (CommandId::NewDocument, "New Workflow", "Start over with a blank document"),
];

const EDIT_COMMANDS: &[(CommandId, &str, &str)] = &[
    (CommandId::Undo, "Undo", "Revert the last change"),
    (CommandId::Redo, "Redo", "Reapply the last undone change"),
    (CommandId::Copy, "Copy", "Copy the selection to the clipboard"),
    (CommandId::Paste, "Paste", "Paste the clipboard next to the originals"),
    (CommandId::Duplicate, "Duplicate", "Clone the selection in place"),
    (CommandId::DeleteSelection, "Delete Selection", "Remove the selection and its connections"),
    (CommandId::ToggleDisabled, "Toggle Disabled", "Enable or disable the selection"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: CommandId,
    pub label: String,
    pub description: String,
    pub category: CommandCategory,
    pub shortcut: Option<String>,
}

impl Command {
    fn matches(
        &self,
        needle: &str,
    ) -> bool {
        self.label.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.as_ref().to_lowercase().contains(needle)
    }
}

/// Static ordered list of commands.
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new(platform: Platform) -> Self {
        let shortcut = |id: CommandId| chord_for(id).map(|chord| chord.display(platform));

        let mut commands = Vec::new();
        for descriptor in NodeTypeRegistry::descriptors() {
            let id = CommandId::AddNode(descriptor.node_type);
            commands.push(Command {
                id,
                label: format!("Add {}", descriptor.label),
                description: format!("Place a new {} {} on the canvas", descriptor.icon, descriptor.label),
                category: CommandCategory::Nodes,
                shortcut: shortcut(id),
            });
        }

        let rest = WORKFLOW_COMMANDS
            .iter()
            .map(|entry| (CommandCategory::Workflow, entry))
            .chain(EDIT_COMMANDS.iter().map(|entry| (CommandCategory::Edit, entry)));
        for (category, (id, label, description)) in rest {
            commands.push(Command {
                id: *id,
                label: label.to_string(),
                description: description.to_string(),
                category,
                shortcut: shortcut(*id),
            });
        }

        Self {
            commands,
        }
    }

    pub fn all(&self) -> &[Command] {
        &self.commands
    }

    pub fn get(
        &self,
        id: CommandId,
    ) -> Option<&Command> {
        self.commands.iter().find(|c| c.id == id)
    }

    /// Case-insensitive substring match over label, description and
    /// category. An empty or blank query matches everything.
    pub fn search(
        &self,
        query: &str,
    ) -> Vec<&Command> {
        let needle = query.trim().to_lowercase();
        let found: Vec<&Command> = self.commands.iter().filter(|c| needle.is_empty() || c.matches(&needle)).collect();
        trace!("CommandRegistry::search: {:?} -> {} matches", query, found.len());
        found
    }

    /// [`CommandRegistry::search`] split by category, empty groups omitted.
    pub fn grouped(
        &self,
        query: &str,
    ) -> Vec<(CommandCategory, Vec<&Command>)> {
        let found = self.search(query);
        <CommandCategory as strum::IntoEnumIterator>::iter()
            .map(|category| (category, found.iter().copied().filter(|c| c.category == category).collect::<Vec<_>>()))
            .filter(|(_, commands)| !commands.is_empty())
            .collect()
    }

    /// Every command with a key binding, for the help overlay.
    pub fn shortcuts(&self) -> Vec<(&str, &str)> {
        self.commands.iter().filter_map(|c| c.shortcut.as_deref().map(|s| (c.label.as_str(), s))).collect()
    }
}
