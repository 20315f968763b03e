//! Server-side modules for the shoplist document store.

pub mod hub;
pub mod routes;
pub mod storage;

pub use hub::{ListEvent, SyncHub};
pub use routes::{router, ApiError, AppState};
pub use storage::{DocumentStore, DocumentStoreError};

/// Starts a server on an ephemeral port backed by a fresh database.
///
/// Returns the base URL and the directory holding the database.
#[cfg(test)]
pub(crate) async fn spawn_test_server() -> (String, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open(temp_dir.path().join("test.db"))
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(AppState::new(store)))
            .await
            .unwrap();
    });

    (format!("http://{}", addr), temp_dir)
}
