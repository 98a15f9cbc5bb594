//! Price store commands. `sync` talks to the external feed configured by
//! `CATALOG_PRICE_FEED_URL`.

use anyhow::Context;
use catalog_core::AppConfig;
use catalog_feed::PriceFeedClient;
use catalog_service::{Catalog, SetPrice};
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum PricesCommands {
    /// Print the stored price of one SKU
    Get { sku: String },
    /// Replace the stored price of one SKU
    Set {
        sku: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        old_price: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        /// Exclude the SKU from feed syncs
        #[arg(long)]
        untracked: bool,
    },
    /// List SKUs refreshed by `prices sync`
    Tracked,
    /// Copy facts for existing products from a JSON price file into the
    /// configured store
    LoadFile {
        path: std::path::PathBuf,
    },
    /// Pull current prices for tracked SKUs from the feed
    Sync {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run_prices(
    catalog: &Catalog,
    config: &AppConfig,
    command: PricesCommands,
) -> anyhow::Result<()> {
    match command {
        PricesCommands::Get { sku } => {
            let quote = catalog
                .get_price(&sku)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no price stored for '{sku}'"))?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        PricesCommands::Set {
            sku,
            price,
            old_price,
            currency,
            untracked,
        } => {
            let quote = catalog
                .set_price(
                    &sku,
                    SetPrice {
                        price,
                        old_price,
                        currency,
                        is_tracked: !untracked,
                    },
                )
                .await?;
            println!(
                "{sku}: {} {} (discount {:.1}%)",
                quote.price, quote.currency, quote.discount_percentage
            );
        }
        PricesCommands::Tracked => {
            let skus = catalog.list_tracked().await?;
            if skus.is_empty() {
                println!("no tracked SKUs");
            }
            for sku in skus {
                println!("{sku}");
            }
        }
        PricesCommands::LoadFile { path } => {
            let facts = catalog_prices::read_price_file(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let report = catalog.load_price_facts(facts).await?;
            println!("copied {} price(s) from {}", report.copied, path.display());
            for sku in &report.skipped {
                println!("  skipped {sku}: no such product");
            }
        }
        PricesCommands::Sync { dry_run } => {
            let client = PriceFeedClient::from_config(config)?
                .context("CATALOG_PRICE_FEED_URL is not set")?;
            let report = catalog.sync_prices(&client, dry_run).await?;
            println!(
                "requested: {}  updated: {}  unchanged: {}  not found: {}{}",
                report.requested,
                report.updated,
                report.unchanged,
                report.not_found.len(),
                if report.dry_run { "  (dry run)" } else { "" }
            );
            for change in &report.changes {
                println!(
                    "  {:<24}{} -> {}",
                    change.sku, change.old_price, change.new_price
                );
            }
        }
    }
    Ok(())
}
