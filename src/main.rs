use clap::{Parser, Subcommand};
use coleta_api::config::Config;
use coleta_api::db::DatabaseManager;
use coleta_api::logging;
use coleta_api::seed::seed_default_items;
use coleta_api::server::{start_server, AppState};
use coleta_api::storage::Storage;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "coleta_api")]
#[command(about = "Recycling collection points directory API")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides config.toml / PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create or update the database schema
    Migrate,
    /// Seed the item catalog with the default material categories
    SeedItems,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    // Keeps the file writer flushing until the process exits
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve { port } => {
            let db = DatabaseManager::connect(&config.database).await?;
            db.run_migrations().await?;

            let storage: Arc<dyn Storage> = Arc::new(db);
            let state = AppState::new(storage, config.server.public_url.clone());

            let port = port.unwrap_or(config.server.port);
            info!("Starting points directory API");
            start_server(state, port).await?;
        }
        Commands::Migrate => {
            let db = DatabaseManager::connect(&config.database).await?;
            db.run_migrations().await?;
            println!("✅ Database schema is up to date");
        }
        Commands::SeedItems => {
            let db = DatabaseManager::connect(&config.database).await?;
            db.run_migrations().await?;

            let created = seed_default_items(&db).await?;
            if created == 0 {
                println!("Item catalog already seeded");
            } else {
                println!("✅ Seeded {created} catalog items");
            }
        }
    }

    Ok(())
}
