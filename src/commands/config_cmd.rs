use clap::{Args, Subcommand};

use super::OutputFormat;
use shoplist::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("backend: {}", config.backend.value);
                        println!("  source: {}", config.backend.source);
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("share_base_url: {}", config.share_base_url.value);
                        println!("  source: {}", config.share_base_url.source);
                        println!();

                        println!("remote:");
                        let remote = &config.remote;
                        println!(
                            "  server_url: {}",
                            remote.server_url.value.as_deref().unwrap_or("(not set)")
                        );
                        println!("    source: {}", remote.server_url.source);
                        println!("  list_mode: {}", remote.list_mode.value);
                        println!("    source: {}", remote.list_mode.source);
                        println!("  list_title: {}", remote.list_title.value);
                        println!("    source: {}", remote.list_title.source);
                    }
                }
                Ok(())
            }
        }
    }
}
