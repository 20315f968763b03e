//! Personal shopping list with a local file backend and a shared,
//! live-updating remote backend.

pub mod app;
pub mod config;
pub mod list_ref;
pub mod models;
pub mod optimistic;
pub mod persistence;
pub mod protocol;
pub mod render;
pub mod server;
pub mod store;
pub mod transfer;

pub use app::{AppError, ShoppingApp};
pub use config::Config;
