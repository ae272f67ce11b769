//! Driver registry mapping driver identifiers to connection factories

use std::sync::Arc;
use sqlmon_core::{DatabaseDriver, Result, SqlMonError, strip_jdbc_prefix, url_scheme};

/// Registry of available database drivers
///
/// Drivers are kept in registration order so URL resolution is deterministic
/// when two drivers claim the same scheme.
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));
        #[cfg(feature = "postgres")]
        registry.register(Arc::new(crate::postgres::PostgresDriver::new()));
        #[cfg(feature = "mysql")]
        registry.register(Arc::new(crate::mysql::MySqlDriver::new()));

        registry
    }

    /// Register a new driver, replacing any driver with the same id
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let id = driver.id();
        tracing::info!(driver = %id, "registering database driver");
        self.drivers.retain(|existing| existing.id() != id);
        self.drivers.push(driver);
    }

    /// Get a driver by id or alias
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let name = name.trim();
        let driver = self.drivers.iter().find(|d| d.answers_to(name)).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Explicitly load a driver by id or alias.
    ///
    /// Fails with `SqlMonError::Driver` when nothing is registered under `name`.
    pub fn load(&self, name: &str) -> Result<Arc<dyn DatabaseDriver>> {
        tracing::info!(driver = %name, "loading database driver");
        self.get(name).ok_or_else(|| {
            SqlMonError::Driver(format!(
                "no driver registered under '{}' (available: {})",
                name,
                self.list().join(", ")
            ))
        })
    }

    /// Find the first registered driver that accepts `url`.
    ///
    /// Fails with `SqlMonError::Connection`: an unrecognised URL is a
    /// connection failure, not a driver loading failure.
    pub fn for_url(&self, url: &str) -> Result<Arc<dyn DatabaseDriver>> {
        let url = strip_jdbc_prefix(url);
        self.drivers
            .iter()
            .find(|d| d.accepts_url(url))
            .cloned()
            .ok_or_else(|| {
                SqlMonError::Connection(format!(
                    "no suitable driver found for scheme '{}'",
                    url_scheme(url).unwrap_or("<none>")
                ))
            })
    }

    /// List all registered driver ids
    pub fn list(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.id()).collect()
    }

    /// Iterate over the registered drivers
    pub fn drivers(&self) -> impl Iterator<Item = &Arc<dyn DatabaseDriver>> {
        self.drivers.iter()
    }

    // Check if a driver is registered under `name`
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
