//! In-memory item store.
//!
//! Holds the ordered item set (newest first) and applies the mutation
//! rules: blank names are rejected on add, an edit that blanks the name
//! removes the item, and purchase status lives only in `purchased_at`.

use chrono::{DateTime, Utc};

use crate::models::{Filter, Item, ItemId};

/// Result of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    /// The new name was blank, so the item was removed.
    Removed,
    NotFound,
}

/// Purchase state before and after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggled {
    pub previous: Option<DateTime<Utc>>,
    pub current: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<Item>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn get_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    /// Adds an item at the front of the list.
    ///
    /// Returns `None` without touching the store when `name` is blank.
    pub fn add(&mut self, name: &str, notes: &str) -> Option<&Item> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        self.items.insert(0, Item::new(name, notes.trim()));
        self.items.first()
    }

    /// Flips an item between active and purchased.
    pub fn toggle(&mut self, id: &ItemId) -> Option<Toggled> {
        let previous = self.get(id)?.purchased_at;
        let current = match previous {
            Some(_) => None,
            None => Some(Utc::now()),
        };
        self.set_purchased(id, current)?;
        Some(Toggled { previous, current })
    }

    /// Sets the purchase timestamp directly, returning the old value.
    pub fn set_purchased(
        &mut self,
        id: &ItemId,
        purchased_at: Option<DateTime<Utc>>,
    ) -> Option<Option<DateTime<Utc>>> {
        let item = self.get_mut(id)?;
        Some(std::mem::replace(&mut item.purchased_at, purchased_at))
    }

    pub fn edit(&mut self, id: &ItemId, name: &str, notes: &str) -> EditOutcome {
        let name = name.trim();
        if name.is_empty() {
            return if self.remove(id) {
                EditOutcome::Removed
            } else {
                EditOutcome::NotFound
            };
        }

        match self.get_mut(id) {
            Some(item) => {
                item.name = name.to_string();
                item.notes = notes.trim().to_string();
                EditOutcome::Updated
            }
            None => EditOutcome::NotFound,
        }
    }

    /// Removes an item. Returns false if it was already gone.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != len_before
    }

    pub fn list(&self, filter: Filter) -> Vec<&Item> {
        self.items.iter().filter(|item| filter.matches(item)).collect()
    }

    pub fn replace_all(&mut self, items: Vec<Item>) {
        self.items = items;
    }

    /// Looks an item up by exact id, then by unique id prefix, then by
    /// case-insensitive name (newest match wins).
    pub fn resolve(&self, reference: &str) -> Option<&Item> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        if let Some(item) = self.items.iter().find(|i| i.id.as_str() == reference) {
            return Some(item);
        }

        let mut by_prefix = self
            .items
            .iter()
            .filter(|i| i.id.as_str().starts_with(reference));
        if let (Some(item), None) = (by_prefix.next(), by_prefix.next()) {
            return Some(item);
        }

        let reference = reference.to_lowercase();
        self.items
            .iter()
            .find(|i| i.name.to_lowercase() == reference)
    }
}
