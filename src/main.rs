use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_client::{
    config::StoreConfig,
    http::ApiClient,
    services::{cart::CartStore, catalog::CatalogBrowser},
    session::SessionService,
    storage::KvStore,
};

// Small demo: resolve the session, load the cart and the first catalog page.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env()?;
    let store = KvStore::open(&config.storage_path)?;
    let session = Arc::new(SessionService::new(store));
    let api = ApiClient::new(&config, session.clone())?;

    tracing::info!(session_id = %session.session_id()?, api = %config.api_base_url, "storefront client ready");

    let cart = CartStore::new(api.clone());
    if let Err(err) = cart.initialize().await {
        tracing::warn!(error = %err, "cart unavailable, continuing without it");
    } else if let Some(cart) = cart.current() {
        tracing::info!(items = cart.items.len(), total = cart.total, "cart loaded");
    }

    let catalog = CatalogBrowser::new(api, config.page_size);
    match catalog.fetch().await {
        Ok(()) => {
            if let Some(page) = catalog.state().page {
                tracing::info!(shown = page.items.len(), total = page.total, "catalog page loaded");
            }
        }
        Err(err) => tracing::warn!(error = %err, "catalog unavailable"),
    }

    Ok(())
}
