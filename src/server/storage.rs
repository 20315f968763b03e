//! Server-side document store.
//!
//! Lists and their items live in SQLite:
//! ```text
//! <DATA_DIR>/
//!   shoplist.db     lists, items
//! ```
//!
//! Timestamps are stored as RFC 3339 strings with nanosecond precision so
//! that ordering by the text column orders by time. Items come back newest
//! first.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::models::{Item, ItemId, ShoppingList};
use crate::protocol::ItemUpdate;

/// Errors that can occur in the document store.
#[derive(Debug)]
pub enum DocumentStoreError {
    /// Creating the data directory failed.
    IoError(PathBuf, std::io::Error),
    /// Query or connection failure.
    DatabaseError(sqlx::Error),
    /// Running migrations failed.
    MigrateError(sqlx::migrate::MigrateError),
    /// A stored timestamp couldn't be parsed.
    InvalidTimestamp(String),
    /// The list doesn't exist.
    ListNotFound(String),
}

impl std::fmt::Display for DocumentStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStoreError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            DocumentStoreError::DatabaseError(e) => write!(f, "Database error: {}", e),
            DocumentStoreError::MigrateError(e) => write!(f, "Migration failed: {}", e),
            DocumentStoreError::InvalidTimestamp(value) => {
                write!(f, "Invalid stored timestamp: {}", value)
            }
            DocumentStoreError::ListNotFound(id) => write!(f, "List not found: {}", id),
        }
    }
}

impl std::error::Error for DocumentStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentStoreError::IoError(_, e) => Some(e),
            DocumentStoreError::DatabaseError(e) => Some(e),
            DocumentStoreError::MigrateError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DocumentStoreError {
    fn from(e: sqlx::Error) -> Self {
        DocumentStoreError::DatabaseError(e)
    }
}

#[derive(sqlx::FromRow)]
struct ListRow {
    id: String,
    title: String,
    created_at: String,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    name: String,
    notes: String,
    added_at: String,
    purchased_at: Option<String>,
}

impl ListRow {
    fn into_list(self) -> Result<ShoppingList, DocumentStoreError> {
        Ok(ShoppingList {
            id: self.id,
            title: self.title,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl ItemRow {
    fn into_item(self) -> Result<Item, DocumentStoreError> {
        Ok(Item {
            id: ItemId::from(self.id),
            name: self.name,
            notes: self.notes,
            added_at: parse_timestamp(&self.added_at)?,
            purchased_at: self
                .purchased_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DocumentStoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| DocumentStoreError::InvalidTimestamp(value.to_string()))
}

/// All lists and items the server holds.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    /// Opens (or creates) the database at `path` and runs migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DocumentStoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DocumentStoreError::IoError(parent.to_path_buf(), e))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&db_url)?
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DocumentStoreError::MigrateError)?;

        Ok(Self { pool })
    }

    pub async fn get_list(&self, list_id: &str) -> Result<Option<ShoppingList>, DocumentStoreError> {
        let row: Option<ListRow> =
            sqlx::query_as("SELECT id, title, created_at FROM lists WHERE id = ?")
                .bind(list_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(ListRow::into_list).transpose()
    }

    /// Creates a list with a fresh id.
    pub async fn create_list(&self, title: &str) -> Result<ShoppingList, DocumentStoreError> {
        let list = ShoppingList::new(ShoppingList::generate_id(), title);
        sqlx::query("INSERT INTO lists (id, title, created_at) VALUES (?, ?, ?)")
            .bind(&list.id)
            .bind(&list.title)
            .bind(format_timestamp(list.created_at))
            .execute(&self.pool)
            .await?;
        Ok(list)
    }

    /// Returns the list, creating it with `title` if it doesn't exist.
    /// An existing list keeps its title.
    pub async fn ensure_list(
        &self,
        list_id: &str,
        title: &str,
    ) -> Result<ShoppingList, DocumentStoreError> {
        sqlx::query("INSERT OR IGNORE INTO lists (id, title, created_at) VALUES (?, ?, ?)")
            .bind(list_id)
            .bind(title)
            .bind(format_timestamp(Utc::now()))
            .execute(&self.pool)
            .await?;

        self.get_list(list_id)
            .await?
            .ok_or_else(|| DocumentStoreError::ListNotFound(list_id.to_string()))
    }

    /// Items of a list, newest first. A missing list has no items.
    pub async fn list_items(&self, list_id: &str) -> Result<Vec<Item>, DocumentStoreError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, name, notes, added_at, purchased_at
            FROM items
            WHERE list_id = ?
            ORDER BY added_at DESC, rowid DESC
            "#,
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Adds an item; the store assigns its id and `added_at`.
    pub async fn create_item(
        &self,
        list_id: &str,
        name: &str,
        notes: &str,
    ) -> Result<Item, DocumentStoreError> {
        self.require_list(list_id).await?;

        let item = Item::new(name.trim(), notes.trim());
        sqlx::query(
            r#"
            INSERT INTO items (list_id, id, name, notes, added_at, purchased_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(list_id)
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(&item.notes)
        .bind(format_timestamp(item.added_at))
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Applies an update. Returns `None` if the item doesn't exist.
    pub async fn update_item(
        &self,
        list_id: &str,
        item_id: &ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<Item>, DocumentStoreError> {
        let result = match update {
            ItemUpdate::SetPurchased { purchased_at } => {
                sqlx::query("UPDATE items SET purchased_at = ? WHERE list_id = ? AND id = ?")
                    .bind(purchased_at.map(format_timestamp))
                    .bind(list_id)
                    .bind(item_id.as_str())
                    .execute(&self.pool)
                    .await?
            }
            ItemUpdate::Rename { name, notes } => {
                sqlx::query("UPDATE items SET name = ?, notes = ? WHERE list_id = ? AND id = ?")
                    .bind(name.trim())
                    .bind(notes.trim())
                    .bind(list_id)
                    .bind(item_id.as_str())
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_item(list_id, item_id).await
    }

    /// Deletes an item. Returns whether it existed.
    pub async fn delete_item(
        &self,
        list_id: &str,
        item_id: &ItemId,
    ) -> Result<bool, DocumentStoreError> {
        let result = sqlx::query("DELETE FROM items WHERE list_id = ? AND id = ?")
            .bind(list_id)
            .bind(item_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replaces every item of the list in one transaction.
    pub async fn replace_items(
        &self,
        list_id: &str,
        items: &[Item],
    ) -> Result<(), DocumentStoreError> {
        self.require_list(list_id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM items WHERE list_id = ?")
            .bind(list_id)
            .execute(&mut *tx)
            .await?;

        // Reverse so that ties on added_at come back in the given order
        for item in items.iter().rev() {
            sqlx::query(
                r#"
                INSERT INTO items (list_id, id, name, notes, added_at, purchased_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(list_id)
            .bind(item.id.as_str())
            .bind(&item.name)
            .bind(&item.notes)
            .bind(format_timestamp(item.added_at))
            .bind(item.purchased_at.map(format_timestamp))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_item(
        &self,
        list_id: &str,
        item_id: &ItemId,
    ) -> Result<Option<Item>, DocumentStoreError> {
        let row: Option<ItemRow> = sqlx::query_as(
            "SELECT id, name, notes, added_at, purchased_at FROM items WHERE list_id = ? AND id = ?",
        )
        .bind(list_id)
        .bind(item_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ItemRow::into_item).transpose()
    }

    async fn require_list(&self, list_id: &str) -> Result<(), DocumentStoreError> {
        match self.get_list(list_id).await? {
            Some(_) => Ok(()),
            None => Err(DocumentStoreError::ListNotFound(list_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::{tempdir, TempDir};

    async fn open_store() -> (DocumentStore, TempDir) {
        let temp_dir = tempdir().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("nested").join("test.db"))
            .await
            .unwrap();
        (store, temp_dir)
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_open_creates_tables() {
        let (store, _temp) = open_store().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%' ORDER BY name",
        )
        .fetch_all(&store.pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(table_names, vec!["items", "lists"]);
    }

    #[tokio::test]
    async fn test_ensure_list_keeps_existing_title() {
        let (store, _temp) = open_store().await;

        let created = store.ensure_list("weekly", "Weekly").await.unwrap();
        assert_eq!(created.title, "Weekly");

        let again = store.ensure_list("weekly", "Something else").await.unwrap();
        assert_eq!(again, created);
    }

    #[tokio::test]
    async fn test_create_list_generates_id() {
        let (store, _temp) = open_store().await;

        let list = store.create_list("Groceries").await.unwrap();
        assert!(crate::models::is_valid_list_id(&list.id));
        assert_eq!(store.get_list(&list.id).await.unwrap(), Some(list));
        assert!(store.get_list("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_items_newest_first() {
        let (store, _temp) = open_store().await;
        store.ensure_list("weekly", "Weekly").await.unwrap();

        store.create_item("weekly", "Milk", "2%").await.unwrap();
        store.create_item("weekly", "Bread", "").await.unwrap();
        store.create_item("weekly", "Eggs", "").await.unwrap();

        let items = store.list_items("weekly").await.unwrap();
        assert_eq!(names(&items), vec!["Eggs", "Bread", "Milk"]);
        assert_eq!(items[2].notes, "2%");
    }

    #[tokio::test]
    async fn test_create_item_requires_list() {
        let (store, _temp) = open_store().await;

        let result = store.create_item("missing", "Milk", "").await;
        assert!(matches!(result, Err(DocumentStoreError::ListNotFound(_))));
    }

    #[tokio::test]
    async fn test_lists_are_isolated() {
        let (store, _temp) = open_store().await;
        store.ensure_list("a", "A").await.unwrap();
        store.ensure_list("b", "B").await.unwrap();

        store.create_item("a", "Milk", "").await.unwrap();

        assert_eq!(store.list_items("a").await.unwrap().len(), 1);
        assert!(store.list_items("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_item() {
        let (store, _temp) = open_store().await;
        store.ensure_list("weekly", "Weekly").await.unwrap();
        let milk = store.create_item("weekly", "Milk", "").await.unwrap();

        let now = Utc::now();
        let purchased = store
            .update_item(
                "weekly",
                &milk.id,
                &ItemUpdate::SetPurchased {
                    purchased_at: Some(now),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(purchased.purchased_at, Some(now));

        let renamed = store
            .update_item(
                "weekly",
                &milk.id,
                &ItemUpdate::Rename {
                    name: " Oat milk ".to_string(),
                    notes: "1l".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Oat milk");
        assert_eq!(renamed.notes, "1l");
        assert_eq!(renamed.added_at, milk.added_at);
        assert_eq!(renamed.purchased_at, Some(now));

        let missing = store
            .update_item(
                "weekly",
                &ItemId::from("nope"),
                &ItemUpdate::SetPurchased { purchased_at: None },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_item_is_idempotent() {
        let (store, _temp) = open_store().await;
        store.ensure_list("weekly", "Weekly").await.unwrap();
        let milk = store.create_item("weekly", "Milk", "").await.unwrap();

        assert!(store.delete_item("weekly", &milk.id).await.unwrap());
        assert!(!store.delete_item("weekly", &milk.id).await.unwrap());
        assert!(store.list_items("weekly").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_items_preserves_fields_and_order() {
        let (store, _temp) = open_store().await;
        store.ensure_list("weekly", "Weekly").await.unwrap();
        store.create_item("weekly", "Old", "").await.unwrap();

        let base = Utc::now();
        let mut tea = Item::new("Tea", "green");
        tea.added_at = base;
        tea.purchased_at = Some(base + Duration::minutes(5));
        let mut honey = Item::new("Honey", "");
        honey.added_at = base - Duration::hours(1);
        // Same timestamp as honey; must stay after it
        let mut lemon = Item::new("Lemon", "");
        lemon.added_at = honey.added_at;

        let items = vec![tea, honey, lemon];
        store.replace_items("weekly", &items).await.unwrap();

        assert_eq!(store.list_items("weekly").await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_deleting_list_cascades() {
        let (store, _temp) = open_store().await;
        store.ensure_list("weekly", "Weekly").await.unwrap();
        store.create_item("weekly", "Milk", "").await.unwrap();

        sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind("weekly")
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(store.list_items("weekly").await.unwrap().is_empty());
    }
}
