//! Task parameters and the validated per-invocation configuration

use sqlmon_core::{ConnectionConfig, redact_url};
use std::collections::HashMap;

use super::MonitorError;
use crate::metrics::metric_prefix;

/// String key/value arguments handed over by the scheduler
pub type TaskParameters = HashMap<String, String>;

pub const PARAM_URL: &str = "url";
pub const PARAM_SQL: &str = "sql";
pub const PARAM_DRIVER_CLASS: &str = "driver-class";
pub const PARAM_USERNAME: &str = "username";
pub const PARAM_PASSWORD: &str = "password";
pub const PARAM_DATABASE: &str = "database";
pub const PARAM_METRIC_PATH: &str = "metric-path";
pub const PARAM_CLEAN_FIELD_NAMES: &str = "clean-field-names";

/// Validated configuration for one invocation
#[derive(Clone)]
pub struct MonitorConfig {
    pub url: String,
    pub sql: String,
    /// Driver to load explicitly before connecting
    pub driver_class: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Catalog to select after connecting
    pub database: Option<String>,
    /// Metric namespace, always ending with `|`
    pub metric_prefix: String,
    pub clean_field_names: bool,
}

impl MonitorConfig {
    /// Validate task parameters and apply defaults.
    ///
    /// `url` and `sql` are required. An empty `driver-class` or `database`
    /// counts as absent. `clean-field-names` is enabled only by a
    /// case-insensitive `true`. Unrecognized keys are ignored.
    pub fn from_params(params: &TaskParameters) -> Result<Self, MonitorError> {
        let url = params
            .get(PARAM_URL)
            .ok_or(MonitorError::MissingParameter(PARAM_URL))?;
        let sql = params
            .get(PARAM_SQL)
            .ok_or(MonitorError::MissingParameter(PARAM_SQL))?;

        let non_empty = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

        let clean_field_names = params
            .get(PARAM_CLEAN_FIELD_NAMES)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        Ok(Self {
            url: url.clone(),
            sql: sql.clone(),
            driver_class: non_empty(PARAM_DRIVER_CLASS),
            username: params.get(PARAM_USERNAME).cloned(),
            password: params.get(PARAM_PASSWORD).cloned(),
            database: non_empty(PARAM_DATABASE),
            metric_prefix: metric_prefix(params.get(PARAM_METRIC_PATH).map(String::as_str)),
            clean_field_names,
        })
    }

    /// Connection settings for the driver layer
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(&self.url)
            .with_username(self.username.clone())
            .with_password(self.password.clone())
    }

    /// The URL with any embedded password masked, safe for logs
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

impl std::fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("url", &self.redacted_url())
            .field("sql", &self.sql)
            .field("driver_class", &self.driver_class)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("metric_prefix", &self.metric_prefix)
            .field("clean_field_names", &self.clean_field_names)
            .finish()
    }
}
