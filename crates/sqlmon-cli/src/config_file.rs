//! TOML task argument files
//!
//! ```toml
//! [task-arguments]
//! url = "jdbc:mysql://localhost:3388"
//! sql = "SELECT name, count(*) FROM app GROUP BY 1"
//! clean-field-names = false
//! ```

use anyhow::{Context, bail};
use serde::Deserialize;
use sqlmon_monitor::TaskParameters;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(rename = "task-arguments", default)]
    task_arguments: BTreeMap<String, toml::Value>,
}

/// Parse task arguments from TOML text.
///
/// Scalar values are converted to their string form; tables and arrays are
/// rejected.
pub fn parse_task_arguments(text: &str) -> anyhow::Result<TaskParameters> {
    let file: ConfigFile = toml::from_str(text).context("invalid configuration file")?;

    let mut params = TaskParameters::new();
    for (key, value) in file.task_arguments {
        let value = match value {
            toml::Value::String(s) => s,
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Datetime(d) => d.to_string(),
            toml::Value::Array(_) | toml::Value::Table(_) => {
                bail!("task argument '{}' must be a scalar value", key)
            }
        };
        params.insert(key, value);
    }
    Ok(params)
}

/// Load task arguments from a TOML file
pub fn load_task_arguments(path: &Path) -> anyhow::Result<TaskParameters> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    let params = parse_task_arguments(&text)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::debug!(path = %path.display(), keys = params.len(), "loaded task arguments");
    Ok(params)
}
