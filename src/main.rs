use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use transdom::application::cache::ClientQuoteCache;
use transdom::application::quote::QuoteCalculator;
use transdom::config::{Cli, Command, Config, DraftsAction};
use transdom::domain::ports::DraftStoreRef;
use transdom::domain::quote::Weight;
use transdom::domain::zone::ZoneTable;
use transdom::error::ShippingError;
use transdom::infrastructure::http::build_client;
use transdom::infrastructure::http::orders::HttpOrderService;
use transdom::infrastructure::http::paystack::{PaystackConfig, PaystackGateway};
use transdom::infrastructure::http::rates::RateLookupClient;
use transdom::infrastructure::in_memory::InMemoryDraftStore;
use transdom::interfaces::csv::zone_reader::load_table;
use transdom::interfaces::csv::zone_writer::ZoneWriter;
use transdom::interfaces::http::router;
use transdom::interfaces::http::state::AppState;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

#[cfg(feature = "storage-rocksdb")]
fn draft_store(config: &Config) -> Result<DraftStoreRef> {
    use transdom::infrastructure::rocksdb::RocksDBDraftStore;

    match config.db_path.as_deref() {
        Some(path) => Ok(Arc::new(RocksDBDraftStore::open(path).into_diagnostic()?)),
        None => Ok(Arc::new(InMemoryDraftStore::with_ttl(config.draft_ttl()))),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn draft_store(config: &Config) -> Result<DraftStoreRef> {
    if config.db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryDraftStore::with_ttl(config.draft_ttl())))
}

fn zone_table(config: &Config) -> Result<Arc<ZoneTable>> {
    let table = load_table(config.zones_dir.as_deref()).into_diagnostic()?;
    Ok(Arc::new(table))
}

async fn serve(config: Config) -> Result<()> {
    let zones = zone_table(&config)?;
    let client = build_client(config.upstream_timeout()).into_diagnostic()?;

    let secret = config.gateway_secret.clone().filter(|s| !s.trim().is_empty());
    if secret.is_none() {
        warn!("PAYSTACK_SECRET_KEY is not set; payments and webhooks will be rejected");
    }

    let rates = Arc::new(RateLookupClient::new(client.clone(), &config.api_base_url));
    let gateway = Arc::new(PaystackGateway::new(
        client.clone(),
        PaystackConfig {
            base_url: config.gateway_url.clone(),
            secret_key: secret.clone().unwrap_or_default(),
            callback_url: config.callback_url.clone(),
            reference_prefix: config.reference_prefix.clone(),
        },
    ));
    let orders = Arc::new(HttpOrderService::new(client, &config.api_base_url));
    let drafts = draft_store(&config)?;

    let state = AppState::with_limits(
        zones.clone(),
        rates,
        gateway,
        orders,
        drafts,
        secret,
        config.limits(),
    );
    let app = router(state);

    let listener = TcpListener::bind(config.listen).await.into_diagnostic()?;
    info!(
        listen = %config.listen,
        api_base_url = %config.api_base_url,
        zones = zones.zones().len(),
        countries = zones.countries().len(),
        "server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
        })
        .await
        .into_diagnostic()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.config.log_json);
    let config = cli.config;

    match cli.command {
        Command::Serve => serve(config).await?,
        Command::Zone { country } => {
            let zones = zone_table(&config)?;
            let zone = zones
                .resolve_zone(&country)
                .ok_or_else(|| ShippingError::UnsupportedDestination(country.trim().to_string()))
                .into_diagnostic()?;
            let display = zones.display_name(zone).unwrap_or(zone.as_str());
            println!("{zone},{display}");
        }
        Command::Zones => {
            let zones = zone_table(&config)?;
            let stdout = io::stdout();
            let mut writer = ZoneWriter::new(stdout.lock());
            writer.write_table(&zones).into_diagnostic()?;
        }
        Command::Quote { from, to, weight } => {
            let weight = Weight::new(weight).into_diagnostic()?;
            let client = build_client(config.upstream_timeout()).into_diagnostic()?;
            let rates = Arc::new(RateLookupClient::new(client, &config.api_base_url));
            let calculator = QuoteCalculator::new(zone_table(&config)?, rates);
            let quote = calculator.build_quote(&from, &to, weight).await.into_diagnostic()?;
            let json = serde_json::to_string_pretty(&quote).into_diagnostic()?;
            println!("{json}");
        }
        Command::Drafts { action } => {
            let cache = ClientQuoteCache::new(draft_store(&config)?);
            match action {
                DraftsAction::Show { session } => {
                    let draft = cache
                        .load(&session)
                        .await
                        .into_diagnostic()?
                        .ok_or(ShippingError::DraftNotFound(session))
                        .into_diagnostic()?;
                    let json = serde_json::to_string_pretty(&draft).into_diagnostic()?;
                    println!("{json}");
                }
                DraftsAction::Clear { session } => {
                    cache.clear(&session).await.into_diagnostic()?;
                    println!("cleared {session}");
                }
            }
        }
    }

    Ok(())
}
