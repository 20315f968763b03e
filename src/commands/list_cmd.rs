use clap::Args;

use shoplist::config::BackendKind;
use shoplist::list_ref::{list_link, remember_list_id, ListMode};
use shoplist::persistence::RemoteClient;
use shoplist::{AppError, Config};

#[derive(Args)]
pub struct NewListCommand {
    /// Title of the new list
    #[arg(long, short)]
    title: Option<String>,
}

impl NewListCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        if config.backend.value != BackendKind::Remote {
            return Err(AppError::RemoteOnly("Creating lists").into());
        }
        let server_url = config
            .remote
            .server_url
            .value
            .as_deref()
            .ok_or(AppError::RemoteNotConfigured)?;

        let client = RemoteClient::new(server_url);
        let list = client.create_list(self.title.as_deref()).await?;

        if config.remote.list_mode.value == ListMode::Auto {
            remember_list_id(&config.data_dir.value, &list.id)?;
        }

        println!("Created list: {} ({})", list.title, list.id);
        println!(
            "Link: {}",
            list_link(&config.share_base_url.value, &list.id)
        );
        Ok(())
    }
}
