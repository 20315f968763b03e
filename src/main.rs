use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    AddCommand, ConfigCommand, EditCommand, ExportCommand, ImportCommand, ListCommand,
    NewListCommand, OpenCommand, RemoveCommand, ShareCommand, ShellCommand, ToggleCommand,
};
use shoplist::{Config, ShoppingApp};

#[derive(Parser)]
#[command(name = "shoplist")]
#[command(version)]
#[command(about = "A personal shopping list", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Remote list id to open
    #[arg(long, global = true)]
    list: Option<String>,

    /// Link carrying a remote list id (?list=<id>)
    #[arg(long, global = true)]
    link: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an item
    Add(AddCommand),

    /// Mark an item purchased, or active again
    Toggle(ToggleCommand),

    /// Edit an item's name and notes
    Edit(EditCommand),

    /// Remove an item
    Remove(RemoveCommand),

    /// Show the items
    List(ListCommand),

    /// Write the items to a dated JSON file
    Export(ExportCommand),

    /// Replace the items with the contents of a JSON file
    Import(ImportCommand),

    /// Copy a link carrying the whole list
    Share(ShareCommand),

    /// Load the items carried by a share link
    Open(OpenCommand),

    /// Create a new remote list
    NewList(NewListCommand),

    /// Interactive session with live updates
    Shell(ShellCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoplist=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;
    let list = cli.list.as_deref();
    let link = cli.link.as_deref();

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    // These two don't need a list
    let command = match command {
        Commands::Config(cmd) => return cmd.run(&config),
        Commands::NewList(cmd) => return cmd.run(&config).await,
        other => other,
    };

    let mut app = ShoppingApp::open(&config, list, link).await?;

    match command {
        Commands::Add(cmd) => cmd.run(&mut app).await,
        Commands::Toggle(cmd) => cmd.run(&mut app).await,
        Commands::Edit(cmd) => cmd.run(&mut app).await,
        Commands::Remove(cmd) => cmd.run(&mut app).await,
        Commands::List(cmd) => cmd.run(&app),
        Commands::Export(cmd) => cmd.run(&app),
        Commands::Import(cmd) => cmd.run(&mut app).await,
        Commands::Share(cmd) => cmd.run(&app, &config),
        Commands::Open(cmd) => cmd.run(&mut app).await,
        Commands::Shell(cmd) => cmd.run(&mut app).await,
        Commands::Config(_) | Commands::NewList(_) => Ok(()),
    }
}
