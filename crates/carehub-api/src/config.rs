use std::path::Path;

use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

pub const CONFIG_PATH_VAR: &str = "CAREHUB_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    S3,
    #[default]
    Memory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_bucket() -> String {
    "carehub".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            bind: default_bind(),
            store: StoreKind::default(),
            bucket: default_bucket(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse a config file body, migrating older shapes first.
    pub fn from_json(contents: &str) -> eyre::Result<Self> {
        // Parse as raw JSON so we can run migrations before deserializing.
        let json: serde_json::Value = serde_json::from_str(contents)?;
        let on_disk_version = json
            .get("config_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let migrated = migrate(json, on_disk_version)?;
        Ok(serde_json::from_value(migrated)?)
    }

    /// Apply `CAREHUB_*` overrides from `lookup` on top of file values.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> eyre::Result<Self> {
        if let Some(bind) = lookup("CAREHUB_BIND") {
            self.bind = bind;
        }
        if let Some(store) = lookup("CAREHUB_STORE") {
            self.store = match store.as_str() {
                "s3" => StoreKind::S3,
                "memory" => StoreKind::Memory,
                other => return Err(eyre::eyre!("unknown CAREHUB_STORE value: {other}")),
            };
        }
        if let Some(bucket) = lookup("CAREHUB_BUCKET") {
            self.bucket = bucket;
        }
        if let Some(format) = lookup("CAREHUB_LOG_FORMAT") {
            self.log_format = match format.as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => return Err(eyre::eyre!("unknown CAREHUB_LOG_FORMAT value: {other}")),
            };
        }
        Ok(self)
    }
}

/// Load the service config: the file named by `CAREHUB_CONFIG` if set,
/// defaults otherwise, then environment overrides.
pub fn load_config() -> eyre::Result<ServiceConfig> {
    let config = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => load_file(Path::new(&path))?,
        Err(_) => ServiceConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())
}

fn load_file(path: &Path) -> eyre::Result<ServiceConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;
    ServiceConfig::from_json(&contents)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION})"
        ));
    }

    // v0 → v1: unversioned files only gain the version stamp
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1");
    }

    Ok(json)
}
