//! Server configuration.

use std::time::Duration;

use minibank_ledger::RecorderConfig;

/// Which store implementation backs the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Postgres through a connection pool.
    Postgres,
    /// Process-local store seeded with the default accounts.
    Memory,
}

impl StoreBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Some(StoreBackend::Postgres),
            "memory" | "mem" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum open connections.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Node ID (generated when absent).
    pub node_id: Option<String>,
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Store backend.
    pub store_backend: StoreBackend,
    /// Database URL.
    pub database_url: String,
    /// Pool configuration.
    pub pool: PoolConfig,
    /// Apply the schema and seed accounts at startup.
    pub seed_accounts: bool,
    /// Transaction recorder configuration.
    pub recorder: RecorderConfig,
    /// Maximum time to wait for in-flight mutations on shutdown.
    pub drain_timeout: Duration,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 3000,
            store_backend: StoreBackend::Postgres,
            database_url: database_url_for_host("localhost"),
            pool: PoolConfig::default(),
            seed_accounts: false,
            recorder: RecorderConfig::default(),
            drain_timeout: Duration::from_secs(30),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(id) = lookup("NODE_ID") {
            config.node_id = Some(id);
        }

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("LISTEN_PORT").and_then(|v| v.parse().ok()) {
            config.listen_port = port;
        }

        if let Some(backend) = lookup("LEDGER_STORE").and_then(|v| StoreBackend::parse(&v)) {
            config.store_backend = backend;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        } else if let Some(host) = lookup("DB_HOSTNAME") {
            config.database_url = database_url_for_host(&host);
        }

        if let Some(max) = lookup("DB_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            config.pool.max_connections = max;
        }

        if let Some(min) = lookup("DB_MIN_CONNECTIONS").and_then(|v| v.parse().ok()) {
            config.pool.min_connections = min;
        }

        if let Some(ms) = lookup("DB_ACQUIRE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.pool.acquire_timeout = Duration::from_millis(ms);
        }

        if let Some(seed) = lookup("SEED_ACCOUNTS") {
            config.seed_accounts = matches!(seed.as_str(), "1" | "true" | "yes");
        }

        if let Some(capacity) = lookup("RECORDER_QUEUE_CAPACITY").and_then(|v| v.parse().ok()) {
            config.recorder.queue_capacity = capacity;
        }

        if let Some(secs) = lookup("SHUTDOWN_DRAIN_SECS").and_then(|v| v.parse().ok()) {
            config.drain_timeout = Duration::from_secs(secs);
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.store_backend == StoreBackend::Postgres && self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.pool.max_connections == 0 {
            return Err("Pool needs at least one connection".to_string());
        }

        if self.pool.min_connections > self.pool.max_connections {
            return Err("Minimum connections cannot exceed maximum".to_string());
        }

        if self.recorder.queue_capacity == 0 {
            return Err("Recorder queue capacity cannot be 0".to_string());
        }

        Ok(())
    }
}

fn database_url_for_host(host: &str) -> String {
    format!("postgres://postgres:postgres@{host}:5432/minibank")
}
