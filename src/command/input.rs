//! Keyboard routing.
//!
//! The dispatcher only decides which command a key press means; running it
//! is the session's job. Inside text fields every binding is suppressed
//! except the palette shortcut, and Escape is always left to bubble.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{command::CommandId, nodes::NodeType};

/// Decides the primary modifier: ⌘ on macOS, Ctrl elsewhere.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Delete,
    Backspace,
    ArrowUp,
    ArrowDown,
    Tab,
}

impl Key {
    fn normalized(self) -> Self {
        match self {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

/// Where keyboard focus is when the key goes down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusTarget {
    #[default]
    Canvas,
    /// input, textarea or any other text-entry surface
    TextEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub target: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            target: FocusTarget::Canvas,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn in_text_entry(mut self) -> Self {
        self.target = FocusTarget::TextEntry;
        self
    }
}

/// State the dispatcher needs to check preconditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputContext {
    pub has_selection: bool,
    pub can_paste: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// run this command and swallow the key
    Command(CommandId),
    /// bound, but its precondition does not hold; the key is swallowed
    Unavailable(CommandId),
    /// not ours, let the surface handle it
    Bubble,
}

/// A key plus the modifiers it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pub key: Key,
    pub primary: bool,
    pub shift: bool,
}

impl Chord {
    const fn plain(key: Key) -> Self {
        Self {
            key,
            primary: false,
            shift: false,
        }
    }

    const fn primary(key: Key) -> Self {
        Self {
            key,
            primary: true,
            shift: false,
        }
    }

    const fn primary_shift(key: Key) -> Self {
        Self {
            key,
            primary: true,
            shift: true,
        }
    }

    const fn shift(key: Key) -> Self {
        Self {
            key,
            primary: false,
            shift: true,
        }
    }

    /// Human-readable form, e.g. `⌘⇧Z` or `Ctrl+Shift+Z`.
    pub fn display(
        &self,
        platform: Platform,
    ) -> String {
        let key = match self.key {
            Key::Char(c) => c.to_ascii_uppercase().to_string(),
            Key::Enter if platform == Platform::Mac => "↵".to_string(),
            Key::Enter => "Enter".to_string(),
            Key::Escape => "Esc".to_string(),
            Key::Delete => "Delete".to_string(),
            Key::Backspace => "Backspace".to_string(),
            Key::ArrowUp => "↑".to_string(),
            Key::ArrowDown => "↓".to_string(),
            Key::Tab => "Tab".to_string(),
        };

        match platform {
            Platform::Mac => {
                let mut text = String::new();
                if self.primary {
                    text.push('⌘');
                }
                if self.shift {
                    text.push('⇧');
                }
                text + &key
            }
            Platform::Other => {
                let mut parts = Vec::new();
                if self.primary {
                    parts.push("Ctrl".to_string());
                }
                if self.shift {
                    parts.push("Shift".to_string());
                }
                parts.push(key);
                parts.join("+")
            }
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.display(Platform::Other))
    }
}

/// Every key binding, first match wins. Shortcut text in the command
/// registry is derived from this table.
pub const BINDINGS: &[(Chord, CommandId)] = &[
    (Chord::primary(Key::Char('k')), CommandId::OpenPalette),
    (Chord::primary(Key::Char('s')), CommandId::Save),
    (Chord::primary(Key::Enter), CommandId::Execute),
    (Chord::primary_shift(Key::Char('z')), CommandId::Redo),
    (Chord::primary(Key::Char('z')), CommandId::Undo),
    (Chord::primary(Key::Char('c')), CommandId::Copy),
    (Chord::primary(Key::Char('v')), CommandId::Paste),
    (Chord::primary(Key::Char('d')), CommandId::Duplicate),
    (Chord::plain(Key::Delete), CommandId::DeleteSelection),
    (Chord::plain(Key::Backspace), CommandId::DeleteSelection),
    (Chord::shift(Key::Char('n')), CommandId::AddNode(NodeType::StickyNote)),
    (Chord::plain(Key::Char('?')), CommandId::ShowHelp),
    (Chord::plain(Key::Char('d')), CommandId::ToggleDisabled),
];

/// First chord bound to `id`.
pub fn chord_for(id: CommandId) -> Option<Chord> {
    BINDINGS.iter().find(|(_, bound)| *bound == id).map(|(chord, _)| *chord)
}

pub struct InputDispatcher {
    platform: Platform,
}

impl InputDispatcher {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn dispatch(
        &self,
        event: &KeyEvent,
        context: InputContext,
    ) -> Dispatch {
        if event.key == Key::Escape {
            return Dispatch::Bubble;
        }

        let Some(id) = self.resolve(event) else {
            return Dispatch::Bubble;
        };

        if event.target == FocusTarget::TextEntry && id != CommandId::OpenPalette {
            return Dispatch::Bubble;
        }

        let available = match id {
            CommandId::Copy | CommandId::Duplicate | CommandId::DeleteSelection | CommandId::ToggleDisabled => context.has_selection,
            CommandId::Paste => context.can_paste,
            _ => true,
        };

        trace!("InputDispatcher::dispatch: {:?} -> {} (available: {})", event.key, id.as_ref(), available);
        if available { Dispatch::Command(id) } else { Dispatch::Unavailable(id) }
    }

    fn resolve(
        &self,
        event: &KeyEvent,
    ) -> Option<CommandId> {
        let primary = match self.platform {
            Platform::Mac => event.modifiers.meta,
            Platform::Other => event.modifiers.ctrl,
        };
        let key = event.key.normalized();

        BINDINGS.iter().find_map(|(chord, id)| {
            if chord.key != key || chord.primary != primary {
                return None;
            }
            // `?` is typed with shift on most layouts
            if chord.key != Key::Char('?') && chord.shift != event.modifiers.shift {
                return None;
            }
            if event.modifiers.alt {
                return None;
            }
            Some(*id)
        })
    }
}
