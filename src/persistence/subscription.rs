//! Standing subscription to a remote list.
//!
//! The server pushes the complete ordered item set once on connect and again
//! after every change. A background task reads the socket and forwards each
//! push as a [`SubscriptionEvent`]; dropping the subscription stops it.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::remote::RemoteError;
use crate::models::Item;
use crate::protocol::ServerMessage;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something the subscription delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// Complete replacement for the local item set.
    Snapshot(Vec<Item>),
    /// The server or the connection reported a problem.
    Error(String),
}

pub struct Subscription {
    list_id: String,
    events: mpsc::Receiver<SubscriptionEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Connects to a subscription socket and starts forwarding pushes.
    pub async fn connect(url: &str, list_id: impl Into<String>) -> Result<Self, RemoteError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| RemoteError::ConnectionError(e.to_string()))?;

        let list_id = list_id.into();
        tracing::debug!("Subscribed to list {}", list_id);

        let (sender, events) = mpsc::channel(16);
        let task = tokio::spawn(forward_pushes(socket, sender));

        Ok(Self {
            list_id,
            events,
            task,
        })
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    /// Waits for the next push. Returns `None` once the reader has stopped
    /// and every pending event was consumed.
    ///
    /// Cancel-safe.
    pub async fn next_event(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }

    /// Tears the subscription down.
    pub fn close(self) {
        tracing::debug!("Closing subscription to list {}", self.list_id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("list_id", &self.list_id)
            .finish()
    }
}

async fn forward_pushes(mut socket: Socket, sender: mpsc::Sender<SubscriptionEvent>) {
    while let Some(frame) = socket.next().await {
        let event = match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Snapshot { items }) => SubscriptionEvent::Snapshot(items),
                Ok(ServerMessage::Error { message }) => SubscriptionEvent::Error(message),
                Err(e) => SubscriptionEvent::Error(format!("Malformed push from server: {}", e)),
            },
            Ok(Message::Ping(data)) => {
                if let Err(e) = socket.send(Message::Pong(data)).await {
                    let _ = sender
                        .send(SubscriptionEvent::Error(
                            RemoteError::WebSocketError(e.to_string()).to_string(),
                        ))
                        .await;
                    return;
                }
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                let _ = sender
                    .send(SubscriptionEvent::Error(
                        RemoteError::WebSocketError(e.to_string()).to_string(),
                    ))
                    .await;
                return;
            }
        };

        if sender.send(event).await.is_err() {
            // Receiver gone
            return;
        }
    }

    let _ = sender
        .send(SubscriptionEvent::Error(
            "Subscription closed by server".to_string(),
        ))
        .await;
}
