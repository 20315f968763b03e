//! Text rendering of the item list.
//!
//! Every render rebuilds one [`ItemView`] per visible item from scratch;
//! there is no diffing. Per-item affordances are expressed as
//! [`ItemAction`]s that the app dispatches back into the store.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;

use crate::models::{Filter, Item, ItemId};

/// Something the user asked to do with one item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemAction {
    Toggle(ItemId),
    /// Commit an edit. A blank name removes the item.
    Edit {
        id: ItemId,
        name: String,
        notes: String,
    },
    Remove(ItemId),
}

/// Display node for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub short_id: String,
    pub name: String,
    pub notes: String,
    pub added: String,
    pub purchased: Option<String>,
    pub checked: bool,
}

impl ItemView {
    pub fn from_item(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            short_id: item.id.short().to_string(),
            name: item.name.clone(),
            notes: item.notes.clone(),
            added: format!("Added: {}", format_date(item.added_at)),
            purchased: item
                .purchased_at
                .map(|at| format!("Purchased: {}", format_date(at))),
            checked: item.is_purchased(),
        }
    }

    pub fn toggle_action(&self) -> ItemAction {
        ItemAction::Toggle(self.id.clone())
    }

    pub fn edit_action(&self, name: impl Into<String>, notes: impl Into<String>) -> ItemAction {
        ItemAction::Edit {
            id: self.id.clone(),
            name: name.into(),
            notes: notes.into(),
        }
    }

    pub fn remove_action(&self) -> ItemAction {
        ItemAction::Remove(self.id.clone())
    }
}

impl fmt::Display for ItemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.checked { "[x]" } else { "[ ]" };
        write!(f, "{} {:<8}  {}", check, self.short_id, self.name)?;
        if !self.notes.is_empty() {
            write!(f, "  ({})", self.notes)?;
        }
        write!(f, "\n{:14}{}", "", self.added)?;
        if let Some(purchased) = &self.purchased {
            write!(f, "  {}", purchased)?;
        }
        Ok(())
    }
}

/// Builds the views for `items`, in order.
pub fn render(items: &[&Item]) -> Vec<ItemView> {
    items.iter().map(|item| ItemView::from_item(item)).collect()
}

/// The whole list as shown to the user.
#[derive(Debug, Clone)]
pub struct ListView<'a> {
    pub title: &'a str,
    pub filter: Filter,
    pub items: Vec<ItemView>,
    pub status: Option<&'a str>,
}

impl<'a> ListView<'a> {
    pub fn new(title: &'a str, filter: Filter, items: &[&Item], status: Option<&'a str>) -> Self {
        Self {
            title,
            filter,
            items: render(items),
            status,
        }
    }
}

impl fmt::Display for ListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format!("{} [{}]", self.title, self.filter);
        writeln!(f, "{}", header)?;
        writeln!(f, "{}", "=".repeat(header.chars().count()))?;

        if self.items.is_empty() {
            writeln!(f, "No items.")?;
        } else {
            for view in &self.items {
                writeln!(f, "{}", view)?;
            }
        }

        if let Some(status) = self.status {
            writeln!(f, "\n! {}", status)?;
        }

        write!(f, "\nTotal: {} item(s)", self.items.len())
    }
}

/// Calendar date of a timestamp in the local time zone.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d").to_string()
}
