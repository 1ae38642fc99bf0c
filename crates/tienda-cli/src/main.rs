use std::sync::Arc;

use clap::{Parser, Subcommand};
use tienda_core::pricing::PricingPolicy;
use tienda_core::AppConfig;
use tienda_suppliers::{MemoryTokenCache, SupplierRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tienda")]
#[command(about = "Catalog and fulfillment operations for the tienda storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search a supplier for products matching a phrase, URL, or id.
    Search {
        query: String,
        /// Supplier name or alias; falls back to the configured default.
        #[arg(long)]
        supplier: Option<String>,
    },
    /// Import a product into the catalog from a URL or supplier id.
    Import {
        input: String,
        /// Supplier name or alias; falls back to the configured default.
        #[arg(long)]
        supplier: Option<String>,
    },
    /// Dispatch a paid order to its suppliers.
    Fulfill { order_id: i64 },
    /// Probe connectivity of every configured supplier.
    Status,
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tienda_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let registry = SupplierRegistry::from_config(&config, Arc::new(MemoryTokenCache::new()))?;

    match Cli::parse().command {
        Commands::Search { query, supplier } => {
            let adapter = registry.resolve(supplier.as_deref());
            let results = adapter.search(&query).await;
            if results.is_empty() {
                println!("no results from {}", adapter.name());
            }
            for product in results {
                println!(
                    "{}\t{}\t{}",
                    product.external_id,
                    format_cents(product.price_cents),
                    product.title
                );
            }
        }
        Commands::Import { input, supplier } => {
            let pool = connect(&config).await?;
            let store = tienda_db::PgProductStore::new(pool);
            let adapter = registry.resolve(supplier.as_deref());
            let policy = PricingPolicy {
                margin_multiplier: config.margin_multiplier,
                other_costs_cents: config.other_costs_cents,
            };
            let stored =
                tienda_catalog::import_product(adapter.as_ref(), &store, &policy, &input).await?;
            println!(
                "imported #{} {} (cost {} + shipping {} -> sells at {})",
                stored.id,
                stored.title,
                format_cents(stored.cost_cents),
                format_cents(stored.shipping_cents),
                format_cents(stored.sell_cents),
            );
        }
        Commands::Fulfill { order_id } => {
            let pool = connect(&config).await?;
            let products = tienda_db::PgProductStore::new(pool.clone());
            let orders = tienda_db::PgOrderStore::new(pool);
            let outcome =
                tienda_catalog::fulfill_order(&registry, &products, &orders, order_id).await?;
            if outcome.dispatched {
                println!("order {} dispatched: {}", order_id, outcome.references.join(", "));
            } else {
                println!("order {order_id} not dispatched, left in paid state");
            }
        }
        Commands::Status => {
            for adapter in registry.all() {
                let status = adapter.check_status().await;
                let state = if status.connected { "ok" } else { "DOWN" };
                println!("{:<20} {:<5} {}", adapter.name(), state, status.message);
            }
        }
        Commands::Migrate => {
            let pool = connect(&config).await?;
            tienda_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = tienda_db::PoolConfig::from_app_config(config);
    let pool = tienda_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}
