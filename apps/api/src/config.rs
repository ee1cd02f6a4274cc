use anyhow::{bail, Context, Result};

use crate::search::SearchConfig;

/// Where the entity tables live.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Postgres { database_url: String },
    AzureTable { connection_string: String },
    Memory,
}

/// Bot identity and the hosted pages the cards link to.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub app_id: String,
    pub app_password: String,
    pub tenant_id: String,
    pub app_base_uri: String,
    pub manifest_id: String,
    pub instrumentation_key: Option<String>,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub bot: BotConfig,
    pub search: Option<SearchConfig>,
    pub reminder_schedule: String,
    pub cycle_status_schedule: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_connection_string = optional_env("STORAGE_CONNECTION_STRING");
        let storage = match optional_env("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres {
                database_url: require_env("DATABASE_URL")?,
            },
            "azure-table" => StorageBackend::AzureTable {
                connection_string: storage_connection_string
                    .clone()
                    .context("STORAGE_CONNECTION_STRING is required for the azure-table backend")?,
            },
            "memory" => StorageBackend::Memory,
            other => bail!("Unknown STORAGE_BACKEND '{other}'"),
        };

        let search = match optional_env("SEARCH_SERVICE_NAME") {
            Some(service_name) => Some(SearchConfig {
                service_name,
                admin_api_key: require_env("SEARCH_SERVICE_ADMIN_API_KEY")?,
                query_api_key: require_env("SEARCH_SERVICE_QUERY_API_KEY")?,
                indexing_interval_minutes: optional_env("SEARCH_INDEXING_INTERVAL_MINUTES")
                    .unwrap_or_else(|| "10".to_string())
                    .parse::<u32>()
                    .context("SEARCH_INDEXING_INTERVAL_MINUTES must be a whole number")?,
                storage_connection_string: match storage {
                    StorageBackend::AzureTable { .. } => storage_connection_string,
                    _ => None,
                },
            }),
            None => None,
        };

        Ok(Config {
            storage,
            bot: BotConfig {
                app_id: require_env("MICROSOFT_APP_ID")?,
                app_password: require_env("MICROSOFT_APP_PASSWORD")?,
                tenant_id: require_env("TENANT_ID")?,
                app_base_uri: require_env("APP_BASE_URI")?,
                manifest_id: require_env("MANIFEST_ID")?,
                instrumentation_key: optional_env("INSTRUMENTATION_KEY"),
            },
            search,
            reminder_schedule: optional_env("REMINDER_SCHEDULE")
                .unwrap_or_else(|| "0 0 12 * * *".to_string()),
            cycle_status_schedule: optional_env("CYCLE_STATUS_SCHEDULE")
                .unwrap_or_else(|| "0 0 */4 * * *".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
impl BotConfig {
    pub fn for_tests() -> Self {
        Self {
            app_id: "bot-app-id".to_string(),
            app_password: "secret".to_string(),
            tenant_id: "tenant-1".to_string(),
            app_base_uri: "https://rnr.example.com".to_string(),
            manifest_id: "manifest-1".to_string(),
            instrumentation_key: Some("ikey".to_string()),
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            storage: StorageBackend::Memory,
            bot: BotConfig::for_tests(),
            search: None,
            reminder_schedule: "0 0 12 * * *".to_string(),
            cycle_status_schedule: "0 0 */4 * * *".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}
