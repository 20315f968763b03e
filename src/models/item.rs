use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a shopping-list item.
///
/// Freshly created items get a UUID v4 in simple form. Any string is
/// accepted when reading items back, so files written by older clients
/// keep their ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used when listing items.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single line on the shopping list.
///
/// Status is derived from `purchased_at` alone: `None` means the item is
/// still active, `Some` means it has been bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Creates an active item with a fresh id, added now.
    pub fn new(name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            name: name.into(),
            notes: notes.into(),
            added_at: Utc::now(),
            purchased_at: None,
        }
    }

    pub fn is_purchased(&self) -> bool {
        self.purchased_at.is_some()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.is_purchased() { "[x]" } else { "[ ]" };
        write!(f, "{} {}", check, self.name)?;
        if !self.notes.is_empty() {
            write!(f, " ({})", self.notes)?;
        }
        Ok(())
    }
}
