use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

use shoplist::transfer::export_date;
use shoplist::{Config, ShoppingApp};

#[derive(Args)]
pub struct ExportCommand {
    /// Directory to write the file into (default: current directory)
    #[arg(long, short)]
    dir: Option<PathBuf>,
}

impl ExportCommand {
    pub fn run(&self, app: &ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let dir = self.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let path = app.export(&dir, export_date(Utc::now()))?;
        println!("Exported {} item(s) to {}", app.items().len(), path.display());
        Ok(())
    }
}

#[derive(Args)]
pub struct ImportCommand {
    /// JSON file holding an array of items
    file: PathBuf,
}

impl ImportCommand {
    pub async fn run(&self, app: &mut ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let count = app.import(&self.file).await?;
        app.await_update().await;
        println!("Imported {} item(s) from {}", count, self.file.display());
        Ok(())
    }
}

#[derive(Args)]
pub struct ShareCommand {
    /// Print the link instead of copying it
    #[arg(long)]
    print: bool,
}

impl ShareCommand {
    pub fn run(&self, app: &ShoppingApp, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let link = app.share_link(&config.share_base_url.value)?;

        if self.print {
            println!("{}", link);
            return Ok(());
        }

        match copy_to_clipboard(&link) {
            Ok(()) => {
                tracing::info!("Copied share link to clipboard");
                println!("Share link copied to clipboard.");
            }
            Err(e) => {
                tracing::warn!("Error setting clipboard text: {}", e);
                println!("Could not copy to the clipboard ({}). Copy the link below:", e);
                println!("{}", link);
            }
        }
        Ok(())
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())
}

#[derive(Args)]
pub struct OpenCommand {
    /// Address carrying a #data= share token
    address: String,
}

impl OpenCommand {
    pub async fn run(&self, app: &mut ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        let (address, count) = app.open_share_link(&self.address).await?;
        println!("Loaded {} item(s) from {}", count, address);
        Ok(())
    }
}
