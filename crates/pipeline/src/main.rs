use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use stockbook_core::config::{DetailConfig, StockConfig};
use stockbook_core::{AppConfig, CacheStore};
use stockbook_pipeline::export;
use stockbook_pipeline::products::load_products;
use stockbook_pipeline::run::{PipelineDelays, run_pipeline};
use stockbook_scrape::{BrowserHandle, CopyClient, DetailSession, StockSession};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let stock_config = config.stock().context("resolving stock-portal configuration")?;
    let detail_config = config.detail().context("resolving detail-site configuration")?;

    let products = load_products(&config.products_path).context("loading product list")?;
    tracing::info!(count = products.len(), path = %config.products_path.display(), "loaded product list");

    let mut cache = CacheStore::load(&config.cache_path);

    let browser = BrowserHandle::launch().await.context("launching browser")?;

    let (mut stock_session, mut detail_session) =
        match start_sessions(&browser, stock_config, detail_config).await {
            Ok(sessions) => sessions,
            Err(e) => {
                browser.close().await;
                return Err(e);
            }
        };

    let copy_client = CopyClient::new(config.openai_api_key.clone());

    let output = run_pipeline(
        &products,
        &mut cache,
        &mut stock_session,
        &mut detail_session,
        &copy_client,
        &PipelineDelays::default(),
    )
    .await;

    stock_session.close().await;
    detail_session.close().await;
    browser.close().await;

    let paths = export::write_outputs(&config.output_dir, &output.entries)
        .context("writing catalog exports")?;
    tracing::info!(csv = %paths.csv.display(), json = %paths.json.display(), "exports written");
    tracing::info!(summary = ?output.summary, entries = output.entries.len(), "run complete");

    Ok(())
}

/// Start both sessions. A failure in either is fatal; the caller closes
/// the browser.
async fn start_sessions(
    browser: &BrowserHandle,
    stock_config: StockConfig,
    detail_config: DetailConfig,
) -> Result<(StockSession, DetailSession)> {
    let stock = StockSession::start(browser, stock_config).await.context("starting stock session")?;
    let detail =
        DetailSession::start(browser, detail_config).await.context("starting detail session")?;
    Ok((stock, detail))
}
