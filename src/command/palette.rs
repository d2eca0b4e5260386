//! Command palette state: query, highlight and open flag.

use crate::command::{
    CommandId, CommandRegistry,
    input::Key,
    registry::Command,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    open: bool,
    query: String,
    highlighted: usize,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Opens with an empty query.
    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
        self.highlighted = 0;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.highlighted = 0;
    }

    pub fn toggle(&mut self) {
        if self.open { self.close() } else { self.open() }
    }

    /// Any edit of the query moves the highlight back to the first match.
    pub fn set_query(
        &mut self,
        query: impl Into<String>,
    ) {
        self.query = query.into();
        self.highlighted = 0;
    }

    pub fn matches<'a>(
        &self,
        registry: &'a CommandRegistry,
    ) -> Vec<&'a Command> {
        registry.search(&self.query)
    }

    pub fn move_down(
        &mut self,
        registry: &CommandRegistry,
    ) {
        let count = self.matches(registry).len();
        self.highlighted = (self.highlighted + 1).min(count.saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    /// Takes the highlighted command and closes the palette. With no match
    /// the palette stays open.
    pub fn enter(
        &mut self,
        registry: &CommandRegistry,
    ) -> Option<CommandId> {
        let id = self.matches(registry).get(self.highlighted).map(|c| c.id)?;
        self.close();
        Some(id)
    }

    /// Routes a key while the palette has focus. Returns the command to run
    /// if the key was Enter on a match.
    pub fn handle_key(
        &mut self,
        key: Key,
        registry: &CommandRegistry,
    ) -> Option<CommandId> {
        match key {
            Key::ArrowDown => self.move_down(registry),
            Key::ArrowUp => self.move_up(),
            Key::Escape => self.close(),
            Key::Enter => return self.enter(registry),
            _ => {}
        }
        None
    }
}
