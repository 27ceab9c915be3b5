use roomscout::config::{LoggingSettings, Settings};
use roomscout::core::SearchEngine;
use roomscout::models::FilterInput;
use roomscout::services::{locate_user, FixedLocation, ListingCache, ListingsClient, SearchService};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize logging; RUST_LOG takes precedence over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    init_tracing(
        settings
            .as_ref()
            .map(|s| &s.logging)
            .unwrap_or(&LoggingSettings::default()),
    );

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);
    let cache = ListingCache::new(l1_cache_size, cache_ttl);

    info!("Listing cache initialized ({} entries, TTL: {}s)", l1_cache_size, cache_ttl);

    let client = ListingsClient::new(
        settings.backend.endpoint.clone(),
        settings.backend.api_key.clone(),
        settings.backend.project_id.clone(),
        settings.backend.database_id.clone(),
        settings.collection.listings.clone(),
        settings.backend.timeout(),
    )?
    .with_cache(cache);

    let engine = match settings.search.result_limit {
        Some(limit) => SearchEngine::with_limit(limit),
        None => SearchEngine::new(),
    };
    let service = SearchService::new(client, engine, settings.search.fetch_limit);

    let mut input: FilterInput = match std::env::args().nth(1) {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            error!("Invalid filter JSON: {}", e);
            e
        })?,
        None => FilterInput::default(),
    };

    if input.wants_current_location() && !input.has_reference_point() {
        let provider = FixedLocation::new(settings.geolocation.fixed_point());
        match locate_user(&provider, settings.geolocation.timeout()).await {
            Ok(point) => input.set_reference_point(point),
            Err(e) => warn!("Searching without distance filter: {}", e),
        }
    }

    let (spec, sort) = input.into_spec(settings.search.radius_limits());

    let response = service.load_and_search(&spec, sort).await.map_err(|e| {
        error!("Search failed: {}", e);
        e
    })?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
