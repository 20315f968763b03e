//! HTTP and WebSocket endpoints of the document store server.
//!
//! Every successful write broadcasts a change on the hub. Subscription
//! sockets answer each change with a full snapshot of the list.

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;

use super::hub::{ListEvent, SyncHub};
use super::storage::{DocumentStore, DocumentStoreError};
use crate::models::{is_valid_list_id, Item, ItemId, DEFAULT_LIST_TITLE};
use crate::protocol::{ErrorBody, ItemUpdate, ListRequest, NewItem, ServerMessage};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub hub: Arc<SyncHub>,
}

impl AppState {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            hub: Arc::new(SyncHub::new()),
        }
    }

    async fn changed(&self, list_id: &str) {
        tracing::debug!("List {} changed", list_id);
        self.hub.broadcast(list_id, ListEvent::Changed).await;
    }
}

/// Handler failure, rendered as an [`ErrorBody`].
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
            }
        };

        (
            status,
            Json(ErrorBody {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<DocumentStoreError> for ApiError {
    fn from(e: DocumentStoreError) -> Self {
        match e {
            DocumentStoreError::ListNotFound(_) => ApiError::NotFound(e.to_string()),
            other => {
                tracing::error!("Storage error: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn check_list_id(list_id: &str) -> Result<(), ApiError> {
    if is_valid_list_id(list_id) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Invalid list id: {}", list_id)))
    }
}

fn check_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        Err(ApiError::BadRequest("Item name must not be empty".to_string()))
    } else {
        Ok(())
    }
}

/// Builds the router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/lists", post(create_list))
        .route("/lists/{list_id}", get(get_list).put(put_list))
        .route(
            "/lists/{list_id}/items",
            post(create_item).put(replace_items),
        )
        .route(
            "/lists/{list_id}/items/{item_id}",
            patch(update_item).delete(delete_item),
        )
        .route("/lists/{list_id}/subscribe", get(subscribe))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn title_or_default(request: ListRequest) -> String {
    request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_LIST_TITLE.to_string())
}

async fn create_list(
    State(state): State<AppState>,
    payload: Result<Json<ListRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let list = state.store.create_list(&title_or_default(request)).await?;
    tracing::info!("Created list {}", list.id);
    Ok((StatusCode::CREATED, Json(list)))
}

async fn get_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    check_list_id(&list_id)?;
    state
        .store
        .get_list(&list_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("List not found: {}", list_id)))
}

async fn put_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    payload: Result<Json<ListRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    check_list_id(&list_id)?;
    let Json(request) = payload?;
    let list = state
        .store
        .ensure_list(&list_id, &title_or_default(request))
        .await?;
    Ok(Json(list))
}

async fn create_item(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    check_list_id(&list_id)?;
    let Json(new_item) = payload?;
    check_name(&new_item.name)?;

    let item = state
        .store
        .create_item(&list_id, &new_item.name, &new_item.notes)
        .await?;
    state.changed(&list_id).await;

    Ok((StatusCode::CREATED, Json(item)))
}

async fn replace_items(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    payload: Result<Json<Vec<Item>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    check_list_id(&list_id)?;
    let Json(items) = payload?;

    let mut seen = HashSet::new();
    for item in &items {
        check_name(&item.name)?;
        if !seen.insert(item.id.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Duplicate item id: {}",
                item.id
            )));
        }
    }

    state.store.replace_items(&list_id, &items).await?;
    state.changed(&list_id).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn update_item(
    State(state): State<AppState>,
    Path((list_id, item_id)): Path<(String, String)>,
    payload: Result<Json<ItemUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    check_list_id(&list_id)?;
    let Json(update) = payload?;
    if let ItemUpdate::Rename { name, .. } = &update {
        check_name(name)?;
    }

    let item_id = ItemId::from(item_id);
    let item = state
        .store
        .update_item(&list_id, &item_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item not found: {}", item_id)))?;
    state.changed(&list_id).await;

    Ok(Json(item))
}

async fn delete_item(
    State(state): State<AppState>,
    Path((list_id, item_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    check_list_id(&list_id)?;

    let item_id = ItemId::from(item_id);
    if !state.store.delete_item(&list_id, &item_id).await? {
        tracing::debug!("Delete of missing item {} in {}", item_id, list_id);
    }
    state.changed(&list_id).await;

    Ok(StatusCode::NO_CONTENT)
}

async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> Result<Response, ApiError> {
    check_list_id(&list_id)?;
    Ok(ws.on_upgrade(move |socket| stream_snapshots(socket, state, list_id)))
}

/// Sends a snapshot on connect and after every change until the client
/// goes away.
async fn stream_snapshots(mut socket: WebSocket, state: AppState, list_id: String) {
    tracing::info!("Subscriber connected to {}", list_id);

    // Subscribe before the first read so no change slips between them
    let mut changes = state.hub.subscribe(&list_id).await;

    if send_snapshot(&mut socket, &state, &list_id).await.is_ok() {
        loop {
            tokio::select! {
                change = changes.recv() => match change {
                    Ok(ListEvent::Changed) | Err(RecvError::Lagged(_)) => {
                        if send_snapshot(&mut socket, &state, &list_id).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by axum; anything else is ignored
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    drop(changes);
    state.hub.release(&list_id).await;
    tracing::info!("Subscriber disconnected from {}", list_id);
}

async fn send_snapshot(
    socket: &mut WebSocket,
    state: &AppState,
    list_id: &str,
) -> Result<(), axum::Error> {
    let message = match state.store.list_items(list_id).await {
        Ok(items) => ServerMessage::Snapshot { items },
        Err(e) => {
            tracing::error!("Failed to read {} for snapshot: {}", list_id, e);
            ServerMessage::Error {
                message: e.to_string(),
            }
        }
    };

    let text = serde_json::to_string(&message).map_err(axum::Error::new)?;
    socket.send(Message::Text(text.into())).await
}
