mod variants;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Catalog operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Validate and normalize a JSON array of variants without touching the database
    CheckVariants {
        /// Path to a JSON file holding an array of variant objects
        file: PathBuf,
        /// Print compact JSON instead of pretty-printed output
        #[arg(long)]
        compact: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => run_db(command).await?,
        Some(Commands::CheckVariants { file, compact }) => {
            variants::run_check_variants(&file, compact)?;
        }
        None => println!("catalog-cli ready; see --help for commands"),
    }

    Ok(())
}

async fn run_db(command: DbCommands) -> anyhow::Result<()> {
    let config = catalog_core::load_app_config()?;
    let pool_config = catalog_db::PoolConfig::from_app_config(&config);
    let pool = catalog_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        DbCommands::Ping => {
            catalog_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = catalog_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("{applied} migrations applied");
        }
    }

    pool.close().await;
    Ok(())
}
