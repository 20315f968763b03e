//! Shoplist document store server
//!
//! Holds shopping lists in SQLite and pushes every change to subscribed
//! clients over WebSockets.
//!
//! # Configuration
//!
//! Environment variables:
//! - `SHOPLIST_PORT`: Port to listen on (default: 8080)
//! - `SHOPLIST_DATA_DIR`: Directory holding `shoplist.db` (default: ~/.local/share/shoplist-server)
//!
//! # Endpoints
//!
//! - `GET /health`
//! - `POST /lists`, `GET|PUT /lists/{list_id}`
//! - `POST|PUT /lists/{list_id}/items`
//! - `PATCH|DELETE /lists/{list_id}/items/{item_id}`
//! - `GET /lists/{list_id}/subscribe` (WebSocket)

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shoplist::server::{router, AppState, DocumentStore};

const DATABASE_FILE: &str = "shoplist.db";

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory holding the database
    data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("SHOPLIST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("SHOPLIST_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("shoplist-server")
            });

        Self { port, data_dir }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoplist=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    let db_path = config.data_dir.join(DATABASE_FILE);
    tracing::info!("Database: {}", db_path.display());

    let store = DocumentStore::open(&db_path).await?;
    let app = router(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
