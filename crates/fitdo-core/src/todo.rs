use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    pub text: String,
    pub completed: bool,
}

impl Todo {
    pub fn new(id: u64, text: String) -> Self {
        Self {
            id,
            text,
            completed: false,
        }
    }
}

/// Ordered task list, stored under the `fitTodos` key as a bare JSON array.
///
/// Every mutation consumes the list and hands back the new one, so callers
/// always hold an explicit snapshot and nothing is shared behind their back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TodoList {
    items: Vec<Todo>,
}

impl TodoList {
    pub fn from_items(items: Vec<Todo>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Todo> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Todo> {
        self.items.iter().find(|todo| todo.id == id)
    }

    /// Ids are creation timestamps in milliseconds, bumped past the current
    /// maximum when two tasks land in the same millisecond.
    pub fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let stamp = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let after_last = self
            .items
            .iter()
            .map(|todo| todo.id)
            .max()
            .map_or(0, |max| max.saturating_add(1));
        stamp.max(after_last)
    }

    /// Appends a task unless `text` is blank. Returns the id that was used.
    pub fn add(mut self, text: &str, id: u64) -> (Self, Option<u64>) {
        let text = text.trim();
        if text.is_empty() {
            return (self, None);
        }
        self.items.push(Todo::new(id, text.to_string()));
        (self, Some(id))
    }

    pub fn toggle(mut self, id: u64) -> (Self, bool) {
        let mut changed = false;
        for todo in &mut self.items {
            if todo.id == id {
                todo.completed = !todo.completed;
                changed = true;
            }
        }
        (self, changed)
    }

    pub fn delete(mut self, id: u64) -> (Self, bool) {
        let before = self.items.len();
        self.items.retain(|todo| todo.id != id);
        let changed = self.items.len() != before;
        (self, changed)
    }

    pub fn all_done(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|todo| todo.completed)
    }

    /// Maps a user-supplied reference to a task id. An exact id wins; failing
    /// that, a value in `1..=len` selects by list position.
    pub fn resolve_ref(&self, reference: u64) -> Option<u64> {
        if self.get(reference).is_some() {
            return Some(reference);
        }
        let position = usize::try_from(reference).ok()?;
        if position == 0 {
            return None;
        }
        self.items.get(position - 1).map(|todo| todo.id)
    }
}
