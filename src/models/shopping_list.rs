use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to lists created without one.
pub const DEFAULT_LIST_TITLE: &str = "Shopping list";

const MAX_LIST_ID_LEN: usize = 64;

/// A named collection of items held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl ShoppingList {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }

    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// List ids travel in URL paths and query strings, so they are restricted
/// to ASCII letters, digits, `-` and `_`.
pub fn is_valid_list_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_LIST_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
