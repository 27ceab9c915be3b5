use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::map::MarkerOptions;
use crate::models::{GeoPoint, RadiusLimits};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub collection: CollectionSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub geolocation: GeolocationSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    pub timeout_secs: Option<u64>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            project_id: String::new(),
            database_id: default_database_id(),
            timeout_secs: None,
        }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(10))
    }
}

fn default_endpoint() -> String { "http://localhost/v1".to_string() }
fn default_database_id() -> String { "main".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_listings_collection")]
    pub listings: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            listings: default_listings_collection(),
        }
    }
}

fn default_listings_collection() -> String { "listings".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Radius used for "near me" searches that do not name one
    #[serde(default = "default_radius_km")]
    pub default_radius_km: Option<f64>,
    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,
    /// Documents requested per backend page
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    /// Cap on returned results; unlimited when unset
    pub result_limit: Option<usize>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            max_radius_km: default_max_radius_km(),
            fetch_limit: default_fetch_limit(),
            result_limit: None,
        }
    }
}

impl SearchSettings {
    pub fn radius_limits(&self) -> RadiusLimits {
        RadiusLimits {
            default_km: self.default_radius_km,
            max_km: self.max_radius_km,
        }
    }
}

fn default_radius_km() -> Option<f64> { Some(10.0) }
fn default_max_radius_km() -> f64 { 100.0 }
fn default_fetch_limit() -> usize { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct MapSettings {
    #[serde(default = "default_map_style")]
    pub style: String,
    #[serde(default = "default_fit_padding")]
    pub fit_padding_px: u32,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            style: default_map_style(),
            fit_padding_px: default_fit_padding(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl MapSettings {
    pub fn marker_options(&self) -> MarkerOptions {
        MarkerOptions {
            fit_padding_px: self.fit_padding_px,
            currency_symbol: self.currency_symbol.clone(),
            style: self.style.clone(),
        }
    }
}

fn default_map_style() -> String { "streets".to_string() }
fn default_fit_padding() -> u32 { 48 }
fn default_currency_symbol() -> String { "₹".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeolocationSettings {
    pub timeout_secs: Option<u64>,
    /// Fixed device location for headless runs
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeolocationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(10))
    }

    pub fn fixed_point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ROOMSCOUT__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ROOMSCOUT__SEARCH__MAX_RADIUS_KM -> search.max_radius_km
            .add_source(environment())
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("ROOMSCOUT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional backend variables (BACKEND_ENDPOINT, BACKEND_API_KEY,
/// BACKEND_PROJECT_ID) on top of the layered sources
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("backend.endpoint", "BACKEND_ENDPOINT"),
        ("backend.api_key", "BACKEND_API_KEY"),
        ("backend.project_id", "BACKEND_PROJECT_ID"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (key, var) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
