//! Command-line tool for the Canopy record index.

mod bundle;
mod config;

use anyhow::{Context, Result};
use bundle::DiffBundle;
use canopy_core::{Did, RecordAddress};
use canopy_index::{CatalogRepo, CollectionRegistry, IndexStore, RecordRepo, RepoRootRepo};
use canopy_sync::{LogNotifier, MemoryBlockStore, SyncCoordinator};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Inspect and feed the Canopy record index")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "CANOPY_CONFIG",
        default_value = "config/canopy.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Index(IndexCommands),
    /// Print the CID a record would be stored under
    Cid {
        /// JSON file with the record content ("-" for stdin)
        file: PathBuf,
    },
    /// List the collections this build can index
    Collections,
}

/// Commands that open the configured index.
#[derive(Subcommand)]
enum IndexCommands {
    /// Show the current root for an identity
    GetRoot {
        did: String,
    },
    /// Overwrite the current root for an identity
    SetRoot {
        did: String,
        root: String,
    },
    /// Print an indexed record
    GetRecord {
        /// Record address (did/collection/recordKey)
        address: String,
    },
    /// List the collections an identity has records in
    ListCollections {
        did: String,
    },
    /// List records in a collection, newest first
    ListRecords {
        did: String,
        collection: String,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Only return records whose key sorts at or before this one
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Index a record from a JSON file
    IndexRecord {
        /// Record address (did/collection/recordKey)
        address: String,
        /// JSON file with the record content ("-" for stdin)
        file: PathBuf,
    },
    /// Remove a record from the index
    DeleteRecord {
        /// Record address (did/collection/recordKey)
        address: String,
    },
    /// Apply a diff bundle as one synchronization unit
    ApplyDiff {
        /// JSON diff bundle ("-" for stdin)
        file: PathBuf,
    },
    /// Check the index database is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config: config_path,
        command,
    } = Cli::parse();

    let config = config::load_config(&config_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match command {
        Commands::Cid { file } => handle_cid_command(&file).await,
        Commands::Collections => {
            for collection in CollectionRegistry::standard().collections() {
                println!("{collection}");
            }
            Ok(())
        }
        Commands::Index(command) => {
            let store = canopy_index::from_config(&config.index, CollectionRegistry::standard())
                .await
                .context("failed to open index")?;
            handle_index_command(command, store).await
        }
    }
}

async fn handle_index_command(command: IndexCommands, store: Arc<dyn IndexStore>) -> Result<()> {
    match command {
        IndexCommands::GetRoot { did } => {
            let did = parse_did(&did)?;
            match store.get_repo_root_row(&did).await? {
                Some(row) => {
                    println!("{}", row.root);
                    tracing::debug!(updated_at = %row.updated_at, "Root last updated");
                }
                None => anyhow::bail!("no root recorded for {did}"),
            }
        }
        IndexCommands::SetRoot { did, root } => {
            let did = parse_did(&did)?;
            let root = canopy_core::parse_cid(&root).context("invalid root cid")?;
            store.set_repo_root(&did, &root).await?;
            println!("Root for {did} set to {root}");
        }
        IndexCommands::GetRecord { address } => {
            let address = parse_address(&address)?;
            match store.get_record(&address).await? {
                Some(record) => print_json(&record)?,
                None => anyhow::bail!("record not found: {address}"),
            }
        }
        IndexCommands::ListCollections { did } => {
            let did = parse_did(&did)?;
            for collection in store.list_collections(&did).await? {
                println!("{collection}");
            }
        }
        IndexCommands::ListRecords {
            did,
            collection,
            limit,
            cursor,
        } => {
            let did = parse_did(&did)?;
            let records = store
                .list_records(&did, &collection, limit, cursor.as_deref())
                .await?;
            print_json(&Value::Array(records))?;
        }
        IndexCommands::IndexRecord { address, file } => {
            let address = parse_address(&address)?;
            let record: Value =
                serde_json::from_str(&read_input(&file).await?).context("invalid record JSON")?;
            store.index_record(&address, &record).await?;
            println!("Indexed {address}");
        }
        IndexCommands::DeleteRecord { address } => {
            let address = parse_address(&address)?;
            store.delete_record(&address).await?;
            println!("Deleted {address}");
        }
        IndexCommands::ApplyDiff { file } => {
            let loaded = DiffBundle::from_json(&read_input(&file).await?)?
                .load()
                .await?;
            let coordinator = SyncCoordinator::new(store, Arc::new(LogNotifier));
            let outcome = coordinator
                .sync(&loaded.did, loaded.root, &loaded.diff, &loaded.blocks)
                .await
                .context("synchronization failed")?;

            println!("Synchronized {} to {}", outcome.did, outcome.root);
            match outcome.previous_root {
                Some(previous) => println!("Previous root: {previous}"),
                None => println!("Previous root: (new repository)"),
            }
            println!("Indexed: {}", outcome.summary.indexed);
            println!("Deleted: {}", outcome.summary.deleted);
        }
        IndexCommands::Health => {
            store.health_check().await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn handle_cid_command(file: &Path) -> Result<()> {
    let record: Value =
        serde_json::from_str(&read_input(file).await?).context("invalid record JSON")?;
    let cid = MemoryBlockStore::new().put_record(&record).await?;
    println!("{cid}");
    Ok(())
}

fn parse_did(raw: &str) -> Result<Did> {
    Did::parse(raw).with_context(|| format!("invalid did '{raw}'"))
}

fn parse_address(raw: &str) -> Result<RecordAddress> {
    RecordAddress::parse(raw).with_context(|| format!("invalid record address '{raw}'"))
}

async fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        use tokio::io::AsyncReadExt;
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
