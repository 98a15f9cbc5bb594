mod db;
mod prices;
mod transfer;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use catalog_core::AppConfig;
use catalog_prices::PriceStore;
use catalog_service::Catalog;
use catalog_sheets::{SheetFormat, TemplateKind};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::prices::PricesCommands;

#[derive(Debug, Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Product catalog command line interface")]
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
    /// Load products or prices from an XLSX or CSV file
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Write products, prices or an empty template to a file
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Inspect and edit the price store
    Prices {
        #[command(subcommand)]
        command: PricesCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
    /// Upsert categories and variant fields from the categories file
    Seed {
        /// Overrides `CATALOG_CATEGORIES_PATH`
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum ImportCommands {
    Products { path: PathBuf },
    Prices { path: PathBuf },
}

#[derive(Debug, Subcommand)]
enum ExportCommands {
    Products {
        #[arg(long, default_value = "xlsx")]
        format: SheetFormat,
        #[arg(long)]
        out: PathBuf,
    },
    Prices {
        #[arg(long, default_value = "xlsx")]
        format: SheetFormat,
        #[arg(long)]
        out: PathBuf,
    },
    Template {
        kind: TemplateKind,
        #[arg(long, default_value = "xlsx")]
        format: SheetFormat,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("catalog-cli ready; run with --help for commands");
        return Ok(());
    };

    // Templates need neither configuration nor a database.
    if let Commands::Export {
        command: ExportCommands::Template { kind, format, out },
    } = &command
    {
        return transfer::run_export_template(*kind, *format, out);
    }

    let config = catalog_core::load_app_config()?;
    let pool = connect(&config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_db_ping(&pool).await,
            DbCommands::Migrate => db::run_db_migrate(&pool).await,
            DbCommands::Seed { file } => {
                let path = file.unwrap_or_else(|| config.categories_path.clone());
                db::run_db_seed(&pool, &path).await
            }
        },
        Commands::Import { command } => {
            let catalog = catalog(pool, &config)?;
            match command {
                ImportCommands::Products { path } => {
                    transfer::run_import_products(&catalog, &path).await
                }
                ImportCommands::Prices { path } => {
                    transfer::run_import_prices(&catalog, &path).await
                }
            }
        }
        Commands::Export { command } => {
            let catalog = catalog(pool, &config)?;
            match command {
                ExportCommands::Products { format, out } => {
                    transfer::run_export_products(&catalog, format, &out).await
                }
                ExportCommands::Prices { format, out } => {
                    transfer::run_export_prices(&catalog, format, &out).await
                }
                ExportCommands::Template { kind, format, out } => {
                    transfer::run_export_template(kind, format, &out)
                }
            }
        }
        Commands::Prices { command } => {
            let catalog = catalog(pool, &config)?;
            prices::run_prices(&catalog, &config, command).await
        }
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = catalog_db::PoolConfig::from_app_config(config);
    catalog_db::connect_pool(&config.database_url, pool_config)
        .await
        .context("failed to connect to database")
}

fn catalog(pool: sqlx::PgPool, config: &AppConfig) -> anyhow::Result<Catalog> {
    let prices = PriceStore::open(
        config.price_backend,
        &config.prices_path,
        &config.default_currency,
    )
    .with_context(|| format!("failed to open price store at {}", config.prices_path.display()))?;
    Ok(Catalog::new(pool, Arc::new(prices)))
}
