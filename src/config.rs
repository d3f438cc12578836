//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `DOCUMENT_STORAGE_PATH` (optional): root directory for uploaded license documents
/// - `MAX_DOCUMENT_BYTES` (optional): upload size limit, defaults to 5 MiB
/// - `DEFAULT_PAGE_SIZE` / `MAX_PAGE_SIZE` (optional): merchant list pagination
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_document_storage_path")]
    pub document_storage_path: String,

    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,

    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_document_storage_path() -> String {
    "./storage/documents".to_string()
}

fn default_max_document_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_page_size() -> i64 {
    20
}

fn default_max_page_size() -> i64 {
    100
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build a Config from an explicit set of key/value pairs.
    ///
    /// Field names are converted the same way as for the process environment:
    /// `database_url` <- `DATABASE_URL`.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config =
            Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/merchants")]))
                .expect("config loads");

        assert_eq!(config.database_url, "postgres://localhost/merchants");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.document_storage_path, "./storage/documents");
        assert_eq!(config.max_document_bytes, 5 * 1024 * 1024);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/merchants"),
            ("SERVER_PORT", "8080"),
            ("MAX_PAGE_SIZE", "50"),
        ]))
        .expect("config loads");

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.max_page_size, 50);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_vars(vars(&[("SERVER_PORT", "8080")])).is_err());
    }
}
