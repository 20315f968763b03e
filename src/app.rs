//! Application state.
//!
//! [`ShoppingApp`] owns everything a running client has: the item store,
//! the persistence backend, the active filter, the last status message and
//! (for the remote backend) the standing subscription. Commands, the shell
//! and the renderer all go through it.
//!
//! With the local backend every mutation is applied to a copy of the store
//! and the whole set is written to the slot; the copy replaces the store
//! only once the write succeeded. With the remote backend a mutation is a
//! single request; the store only changes when the next snapshot arrives,
//! except for toggles, which are applied optimistically and rolled back if
//! the request fails.

use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

use crate::config::{BackendKind, Config};
use crate::list_ref::{resolve_list_id, ListRefError};
use crate::models::{is_valid_list_id, Filter, Item, ItemId, ShoppingList, DEFAULT_LIST_TITLE};
use crate::optimistic::{Optimistic, Settled};
use crate::persistence::{
    Backend, LocalSlot, LocalSlotError, RemoteClient, RemoteError, Subscription,
    SubscriptionEvent,
};
use crate::protocol::ItemUpdate;
use crate::render::{ItemAction, ListView};
use crate::store::{EditOutcome, ItemStore};
use crate::transfer::{self, TransferError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    LocalSlot(#[from] LocalSlotError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    ListRef(#[from] ListRefError),
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Remote backend not configured. Set remote.server_url or SHOPLIST_SERVER_URL.")]
    RemoteNotConfigured,
    #[error("{0} is only available with the local backend")]
    LocalOnly(&'static str),
    #[error("{0} is only available with the remote backend")]
    RemoteOnly(&'static str),
    #[error("Subscription failed: {0}")]
    Subscription(String),
}

pub struct ShoppingApp {
    store: ItemStore,
    backend: Backend,
    title: String,
    filter: Filter,
    status: Option<String>,
    subscription: Option<Subscription>,
    /// A remote write succeeded and its snapshot hasn't been seen yet.
    awaiting_push: bool,
}

impl ShoppingApp {
    /// Opens the app with the backend chosen by `config`.
    ///
    /// `list` and `link` select the remote list; they are ignored by the
    /// local backend.
    pub async fn open(
        config: &Config,
        list: Option<&str>,
        link: Option<&str>,
    ) -> Result<Self, AppError> {
        match config.backend.value {
            BackendKind::Local => {
                if list.is_some() || link.is_some() {
                    tracing::warn!("Ignoring list selection: backend is local");
                }
                Ok(Self::local(LocalSlot::new(&config.data_dir.value)))
            }
            BackendKind::Remote => {
                let server_url = config
                    .remote
                    .server_url
                    .value
                    .as_deref()
                    .ok_or(AppError::RemoteNotConfigured)?;
                let list_id = resolve_list_id(
                    config.remote.list_mode.value,
                    list,
                    link,
                    &config.data_dir.value,
                )?;
                Self::remote(
                    RemoteClient::new(server_url),
                    &list_id,
                    &config.remote.list_title.value,
                )
                .await
            }
        }
    }

    /// Local backend: loads whatever the slot holds.
    pub fn local(slot: LocalSlot) -> Self {
        let items = slot.load();
        tracing::debug!("Loaded {} item(s) from {}", items.len(), slot.path().display());
        Self {
            store: ItemStore::from_items(items),
            backend: Backend::Local(slot),
            title: DEFAULT_LIST_TITLE.to_string(),
            filter: Filter::default(),
            status: None,
            subscription: None,
            awaiting_push: false,
        }
    }

    /// Remote backend: makes sure the list exists, subscribes to it and
    /// waits for the first snapshot.
    pub async fn remote(
        client: RemoteClient,
        list_id: &str,
        title: &str,
    ) -> Result<Self, AppError> {
        let (list, subscription, items) = connect(&client, list_id, title).await?;
        Ok(Self {
            store: ItemStore::from_items(items),
            backend: Backend::Remote {
                client,
                list_id: list.id,
            },
            title: list.title,
            filter: Filter::default(),
            status: None,
            subscription: Some(subscription),
            awaiting_push: false,
        })
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn items(&self) -> &[Item] {
        self.store.items()
    }

    pub fn list(&self, filter: Filter) -> Vec<&Item> {
        self.store.list(filter)
    }

    /// Items passing the active filter.
    pub fn visible(&self) -> Vec<&Item> {
        self.store.list(self.filter)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Last error shown to the user, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn view(&self) -> ListView<'_> {
        ListView::new(&self.title, self.filter, &self.visible(), self.status())
    }

    /// Finds an item by id, id prefix or name.
    pub fn resolve(&self, reference: &str) -> Result<ItemId, AppError> {
        self.store
            .resolve(reference)
            .map(|item| item.id.clone())
            .ok_or_else(|| AppError::ItemNotFound(reference.to_string()))
    }

    pub fn find(&self, id: &ItemId) -> Option<&Item> {
        self.store.get(id)
    }

    /// Adds an item. A blank name is ignored and returns `Ok(None)`.
    pub async fn add(&mut self, name: &str, notes: &str) -> Result<Option<ItemId>, AppError> {
        if name.trim().is_empty() {
            return Ok(None);
        }

        let result = match &self.backend {
            Backend::Local(slot) => commit_local(&mut self.store, slot, |store| {
                store.add(name, notes).map(|item| item.id.clone())
            }),
            Backend::Remote { client, list_id } => client
                .create_item(list_id, name.trim(), notes.trim())
                .await
                .map(|item| Some(item.id))
                .map_err(AppError::from),
        };

        self.settle_write("add item", result)
    }

    /// Flips an item between active and purchased.
    ///
    /// The change is visible immediately. If it can't be persisted it is
    /// reverted and the status message says why.
    pub async fn toggle(&mut self, id: &ItemId) -> Result<Option<DateTime<Utc>>, AppError> {
        let toggled = self
            .store
            .toggle(id)
            .ok_or_else(|| AppError::ItemNotFound(id.to_string()))?;
        let op = Optimistic::new(toggled.previous, toggled.current);

        let outcome = match &self.backend {
            Backend::Local(slot) => slot.save(self.store.items()).map_err(AppError::from),
            Backend::Remote { client, list_id } => {
                let update = ItemUpdate::SetPurchased {
                    purchased_at: *op.proposed(),
                };
                client
                    .update_item(list_id, id, &update)
                    .await
                    .map(|_| ())
                    .map_err(AppError::from)
            }
        };

        match op.settle(outcome) {
            Settled::Committed(purchased_at) => self.settle_write("update item", Ok(purchased_at)),
            Settled::Reverted { restore, error } => {
                self.store.set_purchased(id, restore);
                Err(self.report("update item", error))
            }
        }
    }

    /// Commits an edit. A blank name removes the item instead.
    pub async fn edit(
        &mut self,
        id: &ItemId,
        name: &str,
        notes: &str,
    ) -> Result<EditOutcome, AppError> {
        if self.store.get(id).is_none() {
            return Ok(EditOutcome::NotFound);
        }
        if name.trim().is_empty() {
            self.remove(id).await?;
            return Ok(EditOutcome::Removed);
        }

        let result = match &self.backend {
            Backend::Local(slot) => {
                commit_local(&mut self.store, slot, |store| store.edit(id, name, notes))
            }
            Backend::Remote { client, list_id } => {
                let update = ItemUpdate::Rename {
                    name: name.trim().to_string(),
                    notes: notes.trim().to_string(),
                };
                client
                    .update_item(list_id, id, &update)
                    .await
                    .map(|_| EditOutcome::Updated)
                    .map_err(AppError::from)
            }
        };

        self.settle_write("edit item", result)
    }

    /// Removes an item. Removing a missing item is not an error.
    pub async fn remove(&mut self, id: &ItemId) -> Result<(), AppError> {
        let result = match &self.backend {
            Backend::Local(slot) => commit_local(&mut self.store, slot, |store| {
                store.remove(id);
            }),
            Backend::Remote { client, list_id } => client
                .delete_item(list_id, id)
                .await
                .map_err(AppError::from),
        };

        self.settle_write("remove item", result)
    }

    /// Replaces every item, as import and share links do.
    pub async fn replace_all(&mut self, items: Vec<Item>) -> Result<(), AppError> {
        let result = match &self.backend {
            Backend::Local(slot) => {
                commit_local(&mut self.store, slot, |store| store.replace_all(items))
            }
            Backend::Remote { client, list_id } => client
                .replace_items(list_id, &items)
                .await
                .map_err(AppError::from),
        };

        self.settle_write("replace items", result)
    }

    /// Routes a per-item affordance from the renderer into the store.
    pub async fn dispatch(&mut self, action: ItemAction) -> Result<(), AppError> {
        match action {
            ItemAction::Toggle(id) => self.toggle(&id).await.map(|_| ()),
            ItemAction::Edit { id, name, notes } => {
                match self.edit(&id, &name, &notes).await? {
                    EditOutcome::NotFound => Err(AppError::ItemNotFound(id.to_string())),
                    EditOutcome::Updated | EditOutcome::Removed => Ok(()),
                }
            }
            ItemAction::Remove(id) => self.remove(&id).await,
        }
    }

    /// Writes the export file for `date` into `dir`.
    pub fn export(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf, AppError> {
        Ok(transfer::write_export(dir, self.store.items(), date)?)
    }

    /// Imports an export file, replacing every item. Returns the item count.
    ///
    /// A file that doesn't hold an item array leaves the list untouched.
    pub async fn import(&mut self, path: &Path) -> Result<usize, AppError> {
        let items = transfer::read_import(path)?;
        let count = items.len();
        self.replace_all(items).await?;
        Ok(count)
    }

    /// Builds a share link carrying the whole list.
    pub fn share_link(&self, base_url: &str) -> Result<String, AppError> {
        if self.backend.is_remote() {
            return Err(AppError::LocalOnly("Sharing by link"));
        }
        Ok(transfer::share_link(base_url, self.store.items())?)
    }

    /// Adopts the items carried by a share link.
    ///
    /// Returns the address without its share token and the item count.
    pub async fn open_share_link(&mut self, address: &str) -> Result<(String, usize), AppError> {
        if self.backend.is_remote() {
            return Err(AppError::LocalOnly("Opening share links"));
        }
        let (stripped, items) = transfer::open_share_link(address)?;
        let count = items.len();
        self.replace_all(items).await?;
        Ok((stripped, count))
    }

    /// Moves to another remote list, closing the current subscription
    /// before the new one starts.
    pub async fn switch_list(&mut self, new_list_id: &str) -> Result<(), AppError> {
        let Backend::Remote { client, list_id } = &mut self.backend else {
            return Err(AppError::RemoteOnly("Switching lists"));
        };
        if !is_valid_list_id(new_list_id) {
            return Err(ListRefError::InvalidListId(new_list_id.to_string()).into());
        }

        if let Some(old) = self.subscription.take() {
            old.close();
        }
        self.awaiting_push = false;
        *list_id = new_list_id.to_string();

        let client = client.clone();
        match connect(&client, new_list_id, DEFAULT_LIST_TITLE).await {
            Ok((list, subscription, items)) => {
                self.store.replace_all(items);
                self.title = list.title;
                self.subscription = Some(subscription);
                self.status = None;
                Ok(())
            }
            Err(e) => {
                self.store.replace_all(Vec::new());
                Err(self.report("open list", e))
            }
        }
    }

    /// Waits for the next subscription event.
    ///
    /// Never resolves when there is no subscription. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<SubscriptionEvent> {
        let Some(subscription) = self.subscription.as_mut() else {
            return std::future::pending().await;
        };
        match subscription.next_event().await {
            Some(event) => Some(event),
            None => {
                self.subscription = None;
                None
            }
        }
    }

    /// Applies a subscription event. Snapshots replace the store wholesale.
    pub fn apply_event(&mut self, event: SubscriptionEvent) {
        match event {
            SubscriptionEvent::Snapshot(items) => {
                tracing::debug!("Received snapshot with {} item(s)", items.len());
                self.store.replace_all(items);
                self.awaiting_push = false;
            }
            SubscriptionEvent::Error(message) => {
                tracing::error!("Subscription error: {}", message);
                self.status = Some(format!("Sync error: {}", message));
            }
        }
    }

    /// After a remote write, waits for the snapshot that reflects it.
    /// Does nothing for the local backend.
    pub async fn await_update(&mut self) {
        if !self.awaiting_push {
            return;
        }
        self.awaiting_push = false;
        if self.subscription.is_none() {
            return;
        }

        match self.next_event().await {
            Some(event) => self.apply_event(event),
            None => {
                tracing::error!("Subscription closed");
                self.status = Some("Sync error: subscription closed".to_string());
            }
        }
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    fn settle_write<T>(&mut self, action: &str, result: Result<T, AppError>) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                self.status = None;
                if self.backend.is_remote() {
                    self.awaiting_push = true;
                }
                Ok(value)
            }
            Err(e) => Err(self.report(action, e)),
        }
    }

    fn report(&mut self, action: &str, error: AppError) -> AppError {
        tracing::error!("Failed to {}: {}", action, error);
        self.status = Some(format!("Could not {}: {}", action, error));
        error
    }
}

/// Applies `change` to a copy of `store` and adopts the copy once `slot`
/// holds it. A failed save leaves `store` as it was.
fn commit_local<T>(
    store: &mut ItemStore,
    slot: &LocalSlot,
    change: impl FnOnce(&mut ItemStore) -> T,
) -> Result<T, AppError> {
    let mut next = store.clone();
    let value = change(&mut next);
    slot.save(next.items())?;
    *store = next;
    Ok(value)
}

async fn connect(
    client: &RemoteClient,
    list_id: &str,
    title: &str,
) -> Result<(ShoppingList, Subscription, Vec<Item>), AppError> {
    let list = client.ensure_list(list_id, title).await?;
    let mut subscription = client.subscribe(&list.id).await?;

    match subscription.next_event().await {
        Some(SubscriptionEvent::Snapshot(items)) => Ok((list, subscription, items)),
        Some(SubscriptionEvent::Error(message)) => Err(AppError::Subscription(message)),
        None => Err(AppError::Subscription(
            "closed before the first snapshot".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::spawn_test_server;
    use tempfile::TempDir;

    fn local_app() -> (ShoppingApp, TempDir) {
        let temp = TempDir::new().unwrap();
        let app = ShoppingApp::local(LocalSlot::new(temp.path()));
        (app, temp)
    }

    fn names(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_local_mutations_persist() {
        let (mut app, temp) = local_app();

        let milk = app.add("Milk", "2%").await.unwrap().unwrap();
        app.add("Bread", "").await.unwrap().unwrap();
        app.toggle(&milk).await.unwrap();

        let reopened = ShoppingApp::local(LocalSlot::new(temp.path()));
        assert_eq!(names(&reopened.list(Filter::Active)), vec!["Bread"]);
        assert_eq!(names(&reopened.list(Filter::Purchased)), vec!["Milk"]);
    }

    #[tokio::test]
    async fn test_local_blank_add_is_noop() {
        let (mut app, temp) = local_app();

        assert!(app.add("   ", "notes").await.unwrap().is_none());
        assert!(app.items().is_empty());
        assert!(!temp.path().join("shoppingList.v1.json").exists());
    }

    #[tokio::test]
    async fn test_local_edit_and_remove() {
        let (mut app, _temp) = local_app();
        let id = app.add("Milk", "").await.unwrap().unwrap();

        assert_eq!(
            app.edit(&id, "Oat milk", "1l").await.unwrap(),
            EditOutcome::Updated
        );
        assert_eq!(app.find(&id).unwrap().name, "Oat milk");

        assert_eq!(app.edit(&id, " ", "").await.unwrap(), EditOutcome::Removed);
        assert!(app.items().is_empty());
        assert_eq!(
            app.edit(&id, "Milk", "").await.unwrap(),
            EditOutcome::NotFound
        );

        // Idempotent
        app.remove(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_dispatch_actions() {
        let (mut app, _temp) = local_app();
        app.add("Milk", "").await.unwrap();

        let view = app.view().items[0].clone();
        app.dispatch(view.toggle_action()).await.unwrap();
        assert!(app.find(&view.id).unwrap().is_purchased());

        app.dispatch(view.edit_action("Cream", "")).await.unwrap();
        assert_eq!(app.find(&view.id).unwrap().name, "Cream");

        app.dispatch(view.remove_action()).await.unwrap();
        assert!(app.find(&view.id).is_none());

        let missing = app.dispatch(view.edit_action("Cream", "")).await;
        assert!(matches!(missing, Err(AppError::ItemNotFound(_))));
    }

    /// Local app whose slot can't be written.
    fn blocked_app() -> (ShoppingApp, TempDir) {
        let temp = TempDir::new().unwrap();
        // A regular file where the data directory should be makes saves fail.
        let blocked = temp.path().join("blocked");
        std::fs::write(&blocked, "").unwrap();
        (ShoppingApp::local(LocalSlot::new(&blocked)), temp)
    }

    #[tokio::test]
    async fn test_local_toggle_rolls_back_when_save_fails() {
        let (mut app, _temp) = blocked_app();
        app.store.add("Milk", "");
        let id = app.items()[0].id.clone();

        assert!(app.toggle(&id).await.is_err());
        assert!(app.find(&id).unwrap().purchased_at.is_none());
        assert!(app.status().unwrap().starts_with("Could not update item"));
    }

    #[tokio::test]
    async fn test_local_add_is_dropped_when_save_fails() {
        let (mut app, _temp) = blocked_app();

        assert!(matches!(
            app.add("Milk", "").await,
            Err(AppError::LocalSlot(_))
        ));
        assert!(app.items().is_empty());
        assert!(app.status().unwrap().starts_with("Could not add item"));
    }

    #[tokio::test]
    async fn test_local_edit_remove_replace_keep_items_when_save_fails() {
        let (mut app, _temp) = blocked_app();
        app.store.add("Bread", "white");
        let before = app.items().to_vec();
        let id = before[0].id.clone();

        assert!(app.edit(&id, "Rye bread", "").await.is_err());
        assert_eq!(app.items(), before.as_slice());
        assert!(app.status().unwrap().starts_with("Could not edit item"));

        assert!(app.remove(&id).await.is_err());
        assert_eq!(app.items(), before.as_slice());
        assert!(app.status().unwrap().starts_with("Could not remove item"));

        assert!(app.replace_all(vec![Item::new("Tea", "")]).await.is_err());
        assert_eq!(app.items(), before.as_slice());
        assert!(app.status().unwrap().starts_with("Could not replace items"));
    }

    #[tokio::test]
    async fn test_local_export_import_roundtrip() {
        let (mut app, temp) = local_app();
        app.add("Milk", "2%").await.unwrap();
        app.add("Bread", "").await.unwrap();
        let before = app.items().to_vec();

        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let path = app.export(temp.path(), date).unwrap();

        app.replace_all(Vec::new()).await.unwrap();
        assert_eq!(app.import(&path).await.unwrap(), 2);
        assert_eq!(app.items(), before.as_slice());
    }

    #[tokio::test]
    async fn test_local_import_rejects_non_array() {
        let (mut app, temp) = local_app();
        app.add("Milk", "").await.unwrap();

        let path = temp.path().join("bad.json");
        std::fs::write(&path, r#"{"items": []}"#).unwrap();

        let result = app.import(&path).await;
        assert!(matches!(
            result,
            Err(AppError::Transfer(TransferError::NotAnArray))
        ));
        assert_eq!(app.items().len(), 1);
    }

    #[tokio::test]
    async fn test_local_share_link_roundtrip() {
        let (mut app, _temp) = local_app();
        app.add("Milk", "").await.unwrap();
        let link = app.share_link("http://localhost/shoplist").unwrap();
        let shared = app.items().to_vec();

        let (mut other, _other_temp) = local_app();
        let (stripped, count) = other.open_share_link(&link).await.unwrap();

        assert_eq!(stripped, "http://localhost/shoplist");
        assert_eq!(count, 1);
        assert_eq!(other.items(), shared.as_slice());
    }

    #[tokio::test]
    async fn test_local_has_no_subscription() {
        let (mut app, _temp) = local_app();
        assert!(!app.has_subscription());
        assert!(matches!(
            app.switch_list("weekly").await,
            Err(AppError::RemoteOnly(_))
        ));
        app.await_update().await;
    }

    #[tokio::test]
    async fn test_remote_add_arrives_by_push() {
        let (url, _server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "weekly", "Weekly")
            .await
            .unwrap();
        assert_eq!(app.title(), "Weekly");
        assert!(app.items().is_empty());

        app.add("Milk", "2%").await.unwrap().unwrap();
        app.await_update().await;
        app.add("Bread", "").await.unwrap().unwrap();
        app.await_update().await;

        assert_eq!(names(&app.list(Filter::All)), vec!["Bread", "Milk"]);
        assert!(app.status().is_none());
    }

    #[tokio::test]
    async fn test_remote_example_flow() {
        let (url, _server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "weekly", "Weekly")
            .await
            .unwrap();

        let milk = app.add("Milk", "2%").await.unwrap().unwrap();
        app.await_update().await;
        app.add("Bread", "").await.unwrap();
        app.await_update().await;
        app.toggle(&milk).await.unwrap();
        app.await_update().await;

        assert_eq!(names(&app.list(Filter::Active)), vec!["Bread"]);
        assert_eq!(names(&app.list(Filter::Purchased)), vec!["Milk"]);

        assert_eq!(
            app.edit(&milk, "", "").await.unwrap(),
            EditOutcome::Removed
        );
        app.await_update().await;
        assert_eq!(names(&app.list(Filter::All)), vec!["Bread"]);
    }

    #[tokio::test]
    async fn test_remote_blank_add_sends_nothing() {
        let (url, _server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "weekly", "Weekly")
            .await
            .unwrap();

        assert!(app.add("  ", "").await.unwrap().is_none());
        // Nothing pending, so this returns immediately.
        app.await_update().await;
        assert!(app.items().is_empty());
    }

    #[tokio::test]
    async fn test_remote_toggle_failure_rolls_back() {
        let (url, _server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "weekly", "Weekly")
            .await
            .unwrap();

        // Known locally but not on the server, so the update fails.
        let ghost = Item::new("Ghost", "");
        let id = ghost.id.clone();
        app.apply_event(SubscriptionEvent::Snapshot(vec![ghost]));

        let result = app.toggle(&id).await;
        assert!(matches!(result, Err(AppError::Remote(ref e)) if e.is_not_found()));
        assert!(app.find(&id).unwrap().purchased_at.is_none());
        assert!(app.status().unwrap().starts_with("Could not update item"));
    }

    #[tokio::test]
    async fn test_remote_sees_other_clients() {
        let (url, _server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "family", "Family")
            .await
            .unwrap();

        let other = RemoteClient::new(&url);
        other.create_item("family", "Eggs", "").await.unwrap();

        let event = app.next_event().await.unwrap();
        app.apply_event(event);
        assert_eq!(names(&app.list(Filter::All)), vec!["Eggs"]);
    }

    #[tokio::test]
    async fn test_remote_import_replaces_list() {
        let (url, server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "weekly", "Weekly")
            .await
            .unwrap();
        app.add("Old", "").await.unwrap();
        app.await_update().await;

        let items = vec![Item::new("Tea", ""), Item::new("Honey", "")];
        let path = server_dir.path().join("import.json");
        std::fs::write(&path, serde_json::to_string(&items).unwrap()).unwrap();

        assert_eq!(app.import(&path).await.unwrap(), 2);
        app.await_update().await;

        let mut got: Vec<String> = app.items().iter().map(|i| i.name.clone()).collect();
        got.sort();
        assert_eq!(got, vec!["Honey", "Tea"]);
    }

    #[tokio::test]
    async fn test_remote_switch_list() {
        let (url, _server_dir) = spawn_test_server().await;
        let client = RemoteClient::new(&url);
        client.ensure_list("second", "Second").await.unwrap();
        client.create_item("second", "Soap", "").await.unwrap();

        let mut app = ShoppingApp::remote(client, "first", "First").await.unwrap();
        app.switch_list("second").await.unwrap();

        assert_eq!(app.title(), "Second");
        assert_eq!(names(&app.list(Filter::All)), vec!["Soap"]);
        assert!(app.has_subscription());
        assert!(matches!(
            app.switch_list("bad id").await,
            Err(AppError::ListRef(_))
        ));
    }

    /// A socket server that accepts one subscription and closes it at once.
    async fn closing_socket_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            let _ = socket.close(None).await;
        });
        format!("ws://{}/", addr)
    }

    /// Remote app pointed at a port nothing listens on.
    async fn unreachable_remote_app(items: Vec<Item>) -> ShoppingApp {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        ShoppingApp {
            store: ItemStore::from_items(items),
            backend: Backend::Remote {
                client: RemoteClient::new(&format!("http://{}", addr)),
                list_id: "weekly".to_string(),
            },
            title: "Weekly".to_string(),
            filter: Filter::default(),
            status: None,
            subscription: None,
            awaiting_push: false,
        }
    }

    #[tokio::test]
    async fn test_subscription_error_sets_status() {
        let (mut app, _temp) = local_app();
        app.add("Milk", "").await.unwrap();

        app.apply_event(SubscriptionEvent::Error("list deleted".to_string()));

        assert_eq!(app.status(), Some("Sync error: list deleted"));
        assert_eq!(app.items().len(), 1);
    }

    #[tokio::test]
    async fn test_await_update_reports_closed_subscription() {
        let (mut app, _temp) = local_app();
        let url = closing_socket_url().await;
        app.subscription = Some(Subscription::connect(&url, "weekly").await.unwrap());

        // The reader reports why it stopped first.
        app.awaiting_push = true;
        app.await_update().await;
        assert!(app.status().unwrap().starts_with("Sync error:"));
        assert!(app.has_subscription());

        app.awaiting_push = true;
        app.await_update().await;
        assert_eq!(app.status(), Some("Sync error: subscription closed"));
        assert!(!app.has_subscription());
    }

    #[tokio::test]
    async fn test_remote_switch_list_stops_old_updates() {
        let (url, _server_dir) = spawn_test_server().await;
        let other = RemoteClient::new(&url);
        other.ensure_list("second", "Second").await.unwrap();

        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "first", "First")
            .await
            .unwrap();
        app.switch_list("second").await.unwrap();

        other.create_item("first", "Stale", "").await.unwrap();
        other.create_item("second", "Soap", "").await.unwrap();

        // The write to "first" must not produce an event here.
        let event = app.next_event().await.unwrap();
        app.apply_event(event);
        assert_eq!(names(&app.list(Filter::All)), vec!["Soap"]);
        assert!(app.status().is_none());
    }

    #[tokio::test]
    async fn test_remote_edit_failure_sets_status() {
        let (url, _server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "weekly", "Weekly")
            .await
            .unwrap();

        let ghost = Item::new("Ghost", "");
        let id = ghost.id.clone();
        app.apply_event(SubscriptionEvent::Snapshot(vec![ghost]));

        let result = app.edit(&id, "Spirit", "").await;
        assert!(matches!(result, Err(AppError::Remote(ref e)) if e.is_not_found()));
        assert_eq!(app.find(&id).unwrap().name, "Ghost");
        assert!(app.status().unwrap().starts_with("Could not edit item"));
        assert!(!app.awaiting_push);
    }

    #[tokio::test]
    async fn test_remote_remove_failure_sets_status() {
        let milk = Item::new("Milk", "");
        let id = milk.id.clone();
        let mut app = unreachable_remote_app(vec![milk]).await;

        let result = app.remove(&id).await;
        assert!(matches!(result, Err(AppError::Remote(_))));
        assert!(app.find(&id).is_some());
        assert!(app.status().unwrap().starts_with("Could not remove item"));
        assert!(!app.awaiting_push);
    }

    #[tokio::test]
    async fn test_remote_share_is_local_only() {
        let (url, _server_dir) = spawn_test_server().await;
        let mut app = ShoppingApp::remote(RemoteClient::new(&url), "weekly", "Weekly")
            .await
            .unwrap();

        assert!(matches!(
            app.share_link("http://localhost"),
            Err(AppError::LocalOnly(_))
        ));
        assert!(matches!(
            app.open_share_link("http://localhost#data=W10").await,
            Err(AppError::LocalOnly(_))
        ));
    }
}
