mod config_cmd;
mod items;
mod list_cmd;
mod shell;
mod transfer;

use clap::ValueEnum;

pub use config_cmd::ConfigCommand;
pub use items::{AddCommand, EditCommand, ListCommand, RemoveCommand, ToggleCommand};
pub use list_cmd::NewListCommand;
pub use shell::ShellCommand;
pub use transfer::{ExportCommand, ImportCommand, OpenCommand, ShareCommand};

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
