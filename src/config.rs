//! Runtime configuration
//!
//! Reads settings for the database, nutrition sources, and grocery pricing
//! from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default Open Food Facts API root
pub const DEFAULT_OFF_BASE_URL: &str = "https://world.openfoodfacts.org";
/// Default USDA FoodData Central API root
pub const DEFAULT_USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
/// Default grocery retailer API root
pub const DEFAULT_KROGER_BASE_URL: &str = "https://api.kroger.com/v1";
/// Store used for price lookups when none is configured
pub const DEFAULT_KROGER_LOCATION_ID: &str = "01500438";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Timeout and retry policy for outbound HTTP calls
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt (transport errors, 429, 5xx)
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on each further retry
    pub initial_backoff: Duration,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

/// Nutrition source settings
#[derive(Debug, Clone)]
pub struct NutritionConfig {
    pub off_base_url: String,
    pub usda_base_url: String,
    /// USDA is skipped entirely when no key is set
    pub usda_api_key: Option<String>,
}

/// Grocery retailer credentials and store
#[derive(Debug, Clone)]
pub struct GroceryConfig {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub location_id: String,
}

impl GroceryConfig {
    /// Both client id and secret are present
    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub http: HttpPolicy,
    pub nutrition: NutritionConfig,
    pub grocery: GroceryConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut http = HttpPolicy::default();
        if let Some(raw) = get("LARDER_HTTP_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("LARDER_HTTP_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "LARDER_HTTP_TIMEOUT_SECS",
                    value: raw,
                    reason: "must be greater than 0".to_string(),
                });
            }
            http.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("LARDER_HTTP_MAX_RETRIES") {
            http.max_retries = parse_number::<u32>("LARDER_HTTP_MAX_RETRIES", &raw)?;
        }

        let database_path = get("LARDER_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let nutrition = NutritionConfig {
            off_base_url: get("OFF_BASE_URL").unwrap_or_else(|| DEFAULT_OFF_BASE_URL.to_string()),
            usda_base_url: get("USDA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_USDA_BASE_URL.to_string()),
            usda_api_key: get("USDA_API_KEY"),
        };

        let grocery = GroceryConfig {
            base_url: get("KROGER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_KROGER_BASE_URL.to_string()),
            client_id: get("KROGER_CLIENT_ID"),
            client_secret: get("KROGER_CLIENT_SECRET"),
            location_id: get("KROGER_LOCATION_ID")
                .unwrap_or_else(|| DEFAULT_KROGER_LOCATION_ID.to_string()),
        };

        Ok(Self {
            database_path,
            http,
            nutrition,
            grocery,
        })
    }
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// `data/larder.db` next to the project root (or the executable's directory)
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path.push("larder.db");
    path
}
