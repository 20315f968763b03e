//! HTTP client for the document store server.
//!
//! Every store mutation maps to exactly one request here. Reads go through
//! [`Subscription`] instead; nothing in this client polls.

use reqwest::StatusCode;

use super::subscription::Subscription;
use crate::models::{is_valid_list_id, Item, ItemId, ShoppingList};
use crate::protocol::{ErrorBody, ItemUpdate, ListRequest, NewItem};

/// Errors that can occur talking to the document store.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("Invalid response from server: {0}")]
    DecodeError(String),
    #[error("WebSocket error: {0}")]
    WebSocketError(String),
    #[error("Invalid list id: {0}")]
    InvalidListId(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::ServerError { status: 404, .. })
    }
}

/// Client for one document store server.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Creates a client. `server_url` may use http(s), ws(s) or be a bare
    /// `host:port`.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: http_base(&server_url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_url(&self, list_id: &str) -> Result<String, RemoteError> {
        if !is_valid_list_id(list_id) {
            return Err(RemoteError::InvalidListId(list_id.to_string()));
        }
        Ok(format!("{}/lists/{}", self.base_url, list_id))
    }

    fn item_url(&self, list_id: &str, item_id: &ItemId) -> Result<String, RemoteError> {
        Ok(format!(
            "{}/items/{}",
            self.list_url(list_id)?,
            urlencoding::encode(item_id.as_str())
        ))
    }

    /// WebSocket URL streaming snapshots of a list.
    pub fn subscribe_url(&self, list_id: &str) -> Result<String, RemoteError> {
        let url = format!("{}/subscribe", self.list_url(list_id)?);
        Ok(if let Some(rest) = url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            url
        })
    }

    /// Creates a new list with a server-generated id.
    pub async fn create_list(&self, title: Option<&str>) -> Result<ShoppingList, RemoteError> {
        let body = ListRequest {
            title: title.map(str::to_string),
        };
        let response = self
            .http
            .post(format!("{}/lists", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        decode(check(response).await?).await
    }

    /// Returns the list, creating it first if the server doesn't have it.
    pub async fn ensure_list(
        &self,
        list_id: &str,
        title: &str,
    ) -> Result<ShoppingList, RemoteError> {
        let body = ListRequest {
            title: Some(title.to_string()),
        };
        let response = self
            .http
            .put(self.list_url(list_id)?)
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        decode(check(response).await?).await
    }

    pub async fn create_item(
        &self,
        list_id: &str,
        name: &str,
        notes: &str,
    ) -> Result<Item, RemoteError> {
        let body = NewItem {
            name: name.to_string(),
            notes: notes.to_string(),
        };
        let response = self
            .http
            .post(format!("{}/items", self.list_url(list_id)?))
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        decode(check(response).await?).await
    }

    pub async fn update_item(
        &self,
        list_id: &str,
        item_id: &ItemId,
        update: &ItemUpdate,
    ) -> Result<Item, RemoteError> {
        let response = self
            .http
            .patch(self.item_url(list_id, item_id)?)
            .json(update)
            .send()
            .await
            .map_err(connection_error)?;
        decode(check(response).await?).await
    }

    /// Deletes an item. Deleting a missing item succeeds.
    pub async fn delete_item(&self, list_id: &str, item_id: &ItemId) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(self.item_url(list_id, item_id)?)
            .send()
            .await
            .map_err(connection_error)?;
        check(response).await?;
        Ok(())
    }

    /// Replaces every item of the list.
    pub async fn replace_items(&self, list_id: &str, items: &[Item]) -> Result<(), RemoteError> {
        let response = self
            .http
            .put(format!("{}/items", self.list_url(list_id)?))
            .json(items)
            .send()
            .await
            .map_err(connection_error)?;
        check(response).await?;
        Ok(())
    }

    /// Opens a standing subscription to the list.
    pub async fn subscribe(&self, list_id: &str) -> Result<Subscription, RemoteError> {
        Subscription::connect(&self.subscribe_url(list_id)?, list_id).await
    }
}

fn connection_error(e: reqwest::Error) -> RemoteError {
    RemoteError::ConnectionError(e.to_string())
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) if text.is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => text,
    };

    Err(RemoteError::ServerError {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RemoteError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Err(RemoteError::DecodeError("empty response".to_string()));
    }
    response
        .json()
        .await
        .map_err(|e| RemoteError::DecodeError(e.to_string()))
}

/// Normalizes a configured server URL to an http(s) base without a
/// trailing slash.
fn http_base(server_url: &str) -> String {
    let url = server_url.trim().trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
