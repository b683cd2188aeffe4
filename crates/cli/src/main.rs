//! Resilient Orders CLI - Database migrations and order management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! orders-cli migrate
//!
//! # Save an order (id defaults to a random UUID)
//! orders-cli order save -s S1 -r R1 -d "two boxes of tea"
//!
//! # Look an order up by its natural key
//! orders-cli order find -s S1 -r R1
//!
//! # Report which orders in a JSON file already exist
//! orders-cli order duplicates candidates.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `order save` / `order find` - Single-order persistence
//! - `order duplicates` - Batch duplicate detection

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "orders-cli")]
#[command(author, version, about = "Resilient Orders CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Persist a new order
    Save {
        /// Store the order was placed in
        #[arg(short, long)]
        store: String,

        /// The store's own reference for the order
        #[arg(short, long)]
        reference: String,

        /// Free-text description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Order id (defaults to a random UUID)
        #[arg(long)]
        id: Option<String>,
    },
    /// Find an order by store and reference
    Find {
        /// Store the order was placed in
        #[arg(short, long)]
        store: String,

        /// The store's own reference for the order
        #[arg(short, long)]
        reference: String,
    },
    /// Report which orders in a JSON file already exist
    Duplicates {
        /// JSON array of orders (`order_id`, `store_id`, `order_reference`, `description`)
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Results go to stdout as JSON, so logs must stay on stderr.
    log_subscriber(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        std::io::stderr,
    )
    .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn log_subscriber<W>(
    filter: EnvFilter,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Order { action } => match action {
            OrderAction::Save {
                store,
                reference,
                description,
                id,
            } => commands::order::save(id, store, reference, description).await?,
            OrderAction::Find { store, reference } => {
                commands::order::find(store, reference).await?;
            }
            OrderAction::Duplicates { file } => commands::order::duplicates(&file).await?,
        },
    }
    Ok(())
}
