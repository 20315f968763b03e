//! Interactive session.
//!
//! Reads one command per line and re-renders the list after every
//! mutation and every push from the server.

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use shoplist::models::Filter;
use shoplist::{AppError, ShoppingApp};

const HELP: &str = "\
Commands:
  add <name> [| notes]         add an item
  toggle <item>                mark purchased / active
  edit <item> <name> [| notes] rename (an empty name removes)
  rm <item>                    remove an item
  filter <all|active|purchased>
  switch <list-id>             open another remote list
  list                         show the list again
  help                         show this help
  quit                         leave the shell
<item> is an id, an id prefix or a name.";

#[derive(Args)]
pub struct ShellCommand {}

#[derive(Debug, Clone, PartialEq)]
enum ShellInput {
    Add { name: String, notes: String },
    Toggle(String),
    Edit {
        item: String,
        name: String,
        notes: Option<String>,
    },
    Remove(String),
    Filter(Filter),
    Switch(String),
    List,
    Help,
    Quit,
    Empty,
}

/// Splits `text | notes` into its two halves, both trimmed.
fn split_notes(text: &str) -> (String, Option<String>) {
    match text.split_once('|') {
        Some((name, notes)) => (name.trim().to_string(), Some(notes.trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

fn parse_input(line: &str) -> Result<ShellInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellInput::Empty);
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let require = |what: &str| {
        if rest.is_empty() {
            Err(format!("Usage: {} {}", command, what))
        } else {
            Ok(rest.to_string())
        }
    };

    match command.to_lowercase().as_str() {
        "add" => {
            let (name, notes) = split_notes(rest);
            Ok(ShellInput::Add {
                name,
                notes: notes.unwrap_or_default(),
            })
        }
        "toggle" | "t" => require("<item>").map(ShellInput::Toggle),
        "edit" | "e" => {
            let rest = require("<item> <name> [| notes]")?;
            let (item, tail) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest.as_str(), ""));
            let (name, notes) = split_notes(tail);
            Ok(ShellInput::Edit {
                item: item.to_string(),
                name,
                notes,
            })
        }
        "rm" | "remove" => require("<item>").map(ShellInput::Remove),
        "filter" | "f" => {
            let filter = require("<all|active|purchased>")?;
            filter.parse().map(ShellInput::Filter)
        }
        "switch" => require("<list-id>").map(ShellInput::Switch),
        "list" | "ls" => Ok(ShellInput::List),
        "help" | "?" => Ok(ShellInput::Help),
        "quit" | "exit" | "q" => Ok(ShellInput::Quit),
        other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
    }
}

fn render(app: &ShoppingApp) {
    println!("\n{}", app.view());
}

async fn execute(app: &mut ShoppingApp, input: ShellInput) -> Result<(), AppError> {
    match input {
        ShellInput::Add { name, notes } => {
            app.add(&name, &notes).await?;
        }
        ShellInput::Toggle(item) => {
            let id = app.resolve(&item)?;
            app.toggle(&id).await?;
        }
        ShellInput::Edit { item, name, notes } => {
            let id = app.resolve(&item)?;
            let notes = match notes {
                Some(notes) => notes,
                None => app
                    .find(&id)
                    .map(|i| i.notes.clone())
                    .unwrap_or_default(),
            };
            app.edit(&id, &name, &notes).await?;
        }
        ShellInput::Remove(item) => {
            let id = app.resolve(&item)?;
            app.remove(&id).await?;
        }
        ShellInput::Filter(filter) => app.set_filter(filter),
        ShellInput::Switch(list_id) => app.switch_list(&list_id).await?,
        ShellInput::List | ShellInput::Help | ShellInput::Quit | ShellInput::Empty => {}
    }
    Ok(())
}

impl ShellCommand {
    pub async fn run(&self, app: &mut ShoppingApp) -> Result<(), Box<dyn std::error::Error>> {
        println!("{} - type 'help' for commands", app.backend().describe());
        render(app);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    // EOF ends the session
                    let Some(line) = line? else { break };

                    match parse_input(&line) {
                        Ok(ShellInput::Quit) => break,
                        Ok(ShellInput::Empty) => {}
                        Ok(ShellInput::Help) => println!("{}", HELP),
                        Ok(input) => {
                            if let Err(e) = execute(app, input).await {
                                println!("Error: {}", e);
                            }
                            render(app);
                        }
                        Err(message) => println!("{}", message),
                    }
                }
                event = app.next_event() => {
                    match event {
                        Some(event) => {
                            app.apply_event(event);
                            render(app);
                        }
                        None => println!("Live updates stopped: subscription closed."),
                    }
                }
            }
        }

        Ok(())
    }
}
