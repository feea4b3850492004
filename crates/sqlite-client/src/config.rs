//! Connection configuration.

use std::time::Duration;

use crate::error::Error;

/// Configuration for opening a SQLite connection.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database file path, or `:memory:` for a transient database.
    pub data_source: String,

    /// Whether closed connections return their handle to the pool.
    pub pooling: bool,

    /// Maximum number of idle handles pooled for this database.
    pub max_pool_size: usize,

    /// Open the database read-only.
    pub read_only: bool,

    /// How long the native layer waits on a locked database.
    pub busy_timeout: Duration,

    /// Page cache size override, in pages.
    pub cache_size: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_source: String::new(),
            pooling: true,
            max_pool_size: 100,
            read_only: false,
            busy_timeout: Duration::ZERO,
            cache_size: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a connection string into configuration.
    ///
    /// Supports ADO.NET-style connection strings:
    /// ```text
    /// Data Source=app.db;Pooling=True;Max Pool Size=20;
    /// ```
    pub fn from_connection_string(conn_str: &str) -> Result<Self, Error> {
        let mut config = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "data source" | "datasource" | "filename" => {
                    config.data_source = value.to_string();
                }
                "pooling" => {
                    config.pooling = parse_bool(&key, value)?;
                }
                "max pool size" => {
                    config.max_pool_size = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid max pool size: {value}")))?;
                }
                "read only" => {
                    config.read_only = parse_bool(&key, value)?;
                }
                "busy timeout" => {
                    let millis: u64 = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid busy timeout: {value}")))?;
                    config.busy_timeout = Duration::from_millis(millis);
                }
                "cache size" => {
                    let pages: i64 = value
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid cache size: {value}")))?;
                    config.cache_size = Some(pages);
                }
                other => {
                    return Err(Error::Config(format!("unknown keyword: {other}")));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for contract violations.
    pub fn validate(&self) -> Result<(), Error> {
        if self.data_source.trim().is_empty() {
            return Err(Error::Config("Data Source is required".to_string()));
        }
        Ok(())
    }

    /// Set the database path.
    #[must_use]
    pub fn with_data_source(mut self, data_source: &str) -> Self {
        self.data_source = data_source.to_string();
        self
    }

    /// Enable or disable pooling.
    #[must_use]
    pub fn with_pooling(mut self, pooling: bool) -> Self {
        self.pooling = pooling;
        self
    }

    /// Set the maximum pool size for this database.
    #[must_use]
    pub fn with_max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.max_pool_size = max_pool_size;
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.to_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err(Error::Config(format!("invalid boolean for {key}: {value}"))),
    }
}
