use std::env;

use anyhow::{bail, Context};
use stock_data::auth::Credentials;
use stock_data::config::Config;
use stock_data::repository::{
    net_change, CategoryRepository, ProductRepository, StockMovementRepository,
};
use stock_data::{ApiError, DataClient, QueryResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: stock-data <products|low-stock|categories|movements>";

fn unwrap_rows<T>(result: QueryResult<Vec<T>>) -> Result<Vec<T>, ApiError> {
    Ok(result.into_result()?.unwrap_or_default())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_data=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = env::args().nth(1).unwrap_or_else(|| "products".to_string());

    // Load configuration
    let config = Config::from_env().context("SUPABASE_URL and SUPABASE_ANON_KEY must be set")?;
    let client = DataClient::connect(&config)?;

    // Sign in when credentials are configured; otherwise run as anon
    if let (Ok(email), Ok(password)) = (env::var("STOCK_EMAIL"), env::var("STOCK_PASSWORD")) {
        let result = client
            .auth()
            .sign_in_with_password(&Credentials::new(email, password))
            .await;
        if let Some(error) = result.error {
            bail!("sign in failed: {}", error);
        }
    }

    match command.as_str() {
        "products" => {
            let products = unwrap_rows(ProductRepository::new(client.clone()).list().await)?;
            for p in &products {
                println!(
                    "{:>5}  {:<10} {:<30} stock={:<5} min={}",
                    p.id, p.code, p.name, p.stock_quantity, p.min_stock_level
                );
            }
            tracing::info!("{} products", products.len());
        }
        "low-stock" => {
            let products =
                unwrap_rows(ProductRepository::new(client.clone()).low_stock().await)?;
            for p in &products {
                println!(
                    "{:<30} stock={} min={}",
                    p.name, p.stock_quantity, p.min_stock_level
                );
            }
            tracing::info!("{} products at or below minimum stock", products.len());
        }
        "categories" => {
            let categories = unwrap_rows(CategoryRepository::new(client.clone()).list().await)?;
            for c in &categories {
                println!("{:>5}  {}", c.id, c.name);
            }
        }
        "movements" => {
            let movements =
                unwrap_rows(StockMovementRepository::new(client.clone()).recent(50).await)?;
            for m in &movements {
                let product = m
                    .product
                    .as_ref()
                    .map(|p| p.name.as_str())
                    .unwrap_or("?");
                println!(
                    "{}  {:<3} {:>5}  {}",
                    m.date.format("%Y-%m-%d %H:%M"),
                    m.movement_type,
                    m.quantity,
                    product
                );
            }
            println!("net change: {}", net_change(&movements));
        }
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    }

    if let Some(error) = client.auth().sign_out().await.error {
        tracing::warn!("Sign out failed: {}", error);
    }
    Ok(())
}
