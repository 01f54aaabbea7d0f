//! rolodex - command-line front end for the contact store
//!
//! Contacts are read and printed as JSON aggregates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rolodex_common::config::{resolve_root_folder, RolodexConfig};
use rolodex_common::db::init_database;
use rolodex_common::Aggregate;
use rolodex_sync::{ContactService, SqliteStore};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for rolodex
#[derive(Parser, Debug)]
#[command(name = "rolodex")]
#[command(about = "Reconciling contact store")]
#[command(version)]
struct Args {
    /// Folder holding the contact database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "ROLODEX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a contact from a JSON file
    Add { file: PathBuf },
    /// Reconcile a stored contact with a JSON file
    Update { file: PathBuf },
    /// Print a stored contact
    Show { identifier: String },
    /// Delete contacts
    Delete {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Print the operations a JSON file would produce, without applying them
    Plan { file: PathBuf },
    /// List stored contact identifiers
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RolodexConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RolodexConfig::load_default().context("Failed to load default config")?,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "rolodex_sync={level},rolodex_common={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = config.database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path, Duration::from_millis(config.busy_timeout_ms))
        .await
        .context("Failed to open contact database")?;
    let service = ContactService::from_config(Arc::new(SqliteStore::new(pool)), &config);

    match args.command {
        Command::Add { file } => {
            let contact = read_contact(&file)?;
            let identifier = service.add_contact(&contact).await?;
            println!("{}", identifier);
        }
        Command::Update { file } => {
            let contact = read_contact(&file)?;
            let applied = service.update_contact(&contact).await?;
            println!("{} operations applied", applied);
        }
        Command::Show { identifier } => match service.get_contact(&identifier).await? {
            Some(contact) => println!("{}", serde_json::to_string_pretty(&contact)?),
            None => anyhow::bail!("No contact {}", identifier),
        },
        Command::Delete { identifiers } => {
            for identifier in service.delete_contacts(&identifiers).await? {
                println!("{}", identifier);
            }
        }
        Command::Plan { file } => {
            let contact = read_contact(&file)?;
            let operations = match contact.key() {
                Some(_) => service.plan_update(&contact).await?,
                None => service.plan_create(&contact).await?,
            };
            println!("{}", serde_json::to_string_pretty(&operations)?);
        }
        Command::List => {
            for identifier in service.list_identifiers().await? {
                println!("{}", identifier);
            }
        }
    }

    Ok(())
}

fn read_contact(path: &Path) -> Result<Aggregate> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid contact JSON in {}", path.display()))
}
