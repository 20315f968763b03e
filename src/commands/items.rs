use clap::Args;

use super::OutputFormat;
use shoplist::models::Filter;
use shoplist::render::ListView;
use shoplist::store::EditOutcome;
use shoplist::ShoppingApp;

#[derive(Args)]
pub struct AddCommand {
    /// Item name
    name: String,

    /// Free-form notes (quantity, brand, ...)
    #[arg(long, short)]
    notes: Option<String>,
}

impl AddCommand {
    pub async fn run(&self, app: &mut ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let notes = self.notes.as_deref().unwrap_or_default();

        let Some(id) = app.add(&self.name, notes).await? else {
            tracing::debug!("Ignoring item with empty name");
            return Ok(());
        };
        app.await_update().await;

        match app.find(&id) {
            Some(item) => println!("Added: {}", item),
            None => println!("Added: {}", self.name.trim()),
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct ToggleCommand {
    /// Item id, id prefix or name
    item: String,
}

impl ToggleCommand {
    pub async fn run(&self, app: &mut ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let id = app.resolve(&self.item)?;
        let purchased_at = app.toggle(&id).await?;
        app.await_update().await;

        let name = app
            .find(&id)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| self.item.clone());
        if purchased_at.is_some() {
            println!("Purchased: {}", name);
        } else {
            println!("Active again: {}", name);
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct EditCommand {
    /// Item id, id prefix or name
    item: String,

    /// New name (an empty name removes the item)
    #[arg(long)]
    name: Option<String>,

    /// New notes
    #[arg(long)]
    notes: Option<String>,
}

impl EditCommand {
    pub async fn run(&self, app: &mut ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let id = app.resolve(&self.item)?;
        let Some(current) = app.find(&id).cloned() else {
            return Err(format!("Item not found: {}", self.item).into());
        };

        let name = self.name.clone().unwrap_or(current.name);
        let notes = self.notes.clone().unwrap_or(current.notes);

        let outcome = app.edit(&id, &name, &notes).await?;
        app.await_update().await;

        match outcome {
            EditOutcome::Updated => match app.find(&id) {
                Some(item) => println!("Updated: {}", item),
                None => println!("Updated: {}", name.trim()),
            },
            EditOutcome::Removed => println!("Removed: {}", self.item),
            EditOutcome::NotFound => return Err(format!("Item not found: {}", self.item).into()),
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct RemoveCommand {
    /// Item id, id prefix or name
    item: String,
}

impl RemoveCommand {
    pub async fn run(&self, app: &mut ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let id = app.resolve(&self.item)?;
        let name = app
            .find(&id)
            .map(|item| item.name.clone())
            .unwrap_or_else(|| self.item.clone());

        app.remove(&id).await?;
        app.await_update().await;

        println!("Removed: {}", name);
        Ok(())
    }
}

#[derive(Args)]
pub struct ListCommand {
    /// Which items to show (all, active, purchased)
    #[arg(long, short = 'F', default_value = "all")]
    filter: Filter,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ListCommand {
    pub fn run(&self, app: &ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let items = app.list(self.filter);

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
            OutputFormat::Text => {
                println!(
                    "{}",
                    ListView::new(app.title(), self.filter, &items, app.status())
                );
            }
        }
        Ok(())
    }
}
