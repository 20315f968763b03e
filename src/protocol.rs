//! Records exchanged between the client and the document store server.
//!
//! All bodies are JSON with camelCase keys, matching the item file format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Item;

/// Body of `POST /lists` and `PUT /lists/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body of `POST /lists/{id}/items`. The server assigns id and `addedAt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub notes: String,
}

/// Body of `PATCH /lists/{id}/items/{item_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ItemUpdate {
    #[serde(rename_all = "camelCase")]
    SetPurchased {
        purchased_at: Option<DateTime<Utc>>,
    },
    Rename {
        name: String,
        #[serde(default)]
        notes: String,
    },
}

/// Frames pushed by the server over a subscription socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The complete item set of the list, newest first.
    Snapshot { items: Vec<Item> },
    Error { message: String },
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_update_wire_format() {
        let update = ItemUpdate::SetPurchased { purchased_at: None };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "setPurchased", "purchasedAt": null})
        );

        let rename: ItemUpdate =
            serde_json::from_str(r#"{"op": "rename", "name": "Oat milk"}"#).unwrap();
        assert_eq!(
            rename,
            ItemUpdate::Rename {
                name: "Oat milk".to_string(),
                notes: String::new()
            }
        );
    }

    #[test]
    fn test_server_message_wire_format() {
        let msg = ServerMessage::Error {
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"boom"}"#);

        let parsed: ServerMessage =
            serde_json::from_str(r#"{"type":"snapshot","items":[]}"#).unwrap();
        assert!(matches!(parsed, ServerMessage::Snapshot { items } if items.is_empty()));
    }

    #[test]
    fn test_list_request_title_optional() {
        let req: ListRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
        assert_eq!(serde_json::to_string(&req).unwrap(), "{}");
    }
}
