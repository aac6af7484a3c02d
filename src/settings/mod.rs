//! Dashboard configuration files.
//!
//! [`SettingsStore`] owns the directory holding `settings.yaml` plus the
//! optional `ladders.yaml` and `secrets.yaml`. Only `settings.yaml` is ever
//! written; the other two are merged in on every load under the `ladders`
//! and `secrets` keys.

pub mod model;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use utoipa::{PartialSchema, ToSchema};

pub use model::AppSettings;

use crate::error::ApiError;

/// Main settings file, the only one updates write to.
pub const SETTINGS_FILE: &str = "settings.yaml";
/// Optional ladder file, loaded under `ladders`.
pub const LADDERS_FILE: &str = "ladders.yaml";
/// Optional credentials file, loaded under `secrets`.
pub const SECRETS_FILE: &str = "secrets.yaml";

/// Top-level keys an update may not touch.
const RESERVED_KEYS: [&str; 2] = ["ladders", "secrets"];

/// Notification fields replaced by [`MASK`] in the safe view.
const MASKED_FIELDS: [&str; 4] = ["webhook", "bot_token", "chat_id", "smtp_password"];

/// Stand-in for a masked value.
const MASK: &str = "***";

/// Failure to read, validate or write configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The merged document does not describe a valid configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A file is not valid YAML.
    #[error("{file}: {source}")]
    Yaml {
        /// File name inside the config directory.
        file: &'static str,
        /// Parse failure.
        source: serde_yaml::Error,
    },

    /// Reading or writing a file failed.
    #[error("config file access failed: {0}")]
    Io(#[from] std::io::Error),

    /// Converting between YAML and JSON values failed.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Invalid(_) => Self::InvalidRequest(err.to_string()),
            SettingsError::Io(io) => Self::Io(io),
            SettingsError::Yaml { .. } | SettingsError::Encode(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

/// Current configuration plus the directory it came from.
#[derive(Debug)]
pub struct SettingsStore {
    dir: PathBuf,
    current: RwLock<AppSettings>,
}

impl SettingsStore {
    /// Loads the configuration in `dir`.
    ///
    /// A missing or broken `settings.yaml` is logged and replaced by the
    /// defaults, so the server can always start.
    pub async fn open(dir: PathBuf) -> Self {
        let current = match load(&dir).await {
            Ok(settings) => {
                tracing::info!(dir = %dir.display(), "configuration loaded");
                settings
            }
            Err(err) => {
                tracing::error!(
                    dir = %dir.display(),
                    error = %err,
                    "configuration load failed; using defaults"
                );
                AppSettings::default()
            }
        };
        Self {
            dir,
            current: RwLock::new(current),
        }
    }

    /// Directory the files live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot of the current configuration.
    pub async fn current(&self) -> AppSettings {
        self.current.read().await.clone()
    }

    /// Re-reads all three files.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if a file cannot be read or parsed. The
    /// previous configuration stays in effect.
    pub async fn reload(&self) -> Result<AppSettings, SettingsError> {
        let mut current = self.current.write().await;
        let fresh = load(&self.dir).await?;
        *current = fresh.clone();
        tracing::info!(dir = %self.dir.display(), "configuration reloaded");
        Ok(fresh)
    }

    /// Deep-merges `patch` into `settings.yaml`, validates, writes and reloads.
    ///
    /// Nested objects merge key by key; any other value replaces what was
    /// there. Updates are serialized against each other and against reloads.
    ///
    /// # Errors
    ///
    /// - [`SettingsError::Invalid`] if `patch` is not an object, names
    ///   `ladders` or `secrets`, or produces an invalid configuration. The
    ///   file is left untouched.
    /// - [`SettingsError::Io`] or [`SettingsError::Yaml`] on file failures.
    pub async fn update(&self, patch: Value) -> Result<AppSettings, SettingsError> {
        let Value::Object(patch) = patch else {
            return Err(SettingsError::Invalid("config must be an object".to_string()));
        };
        if let Some(key) = RESERVED_KEYS.iter().find(|k| patch.contains_key(**k)) {
            return Err(SettingsError::Invalid(format!("{key} is managed in its own file")));
        }

        let mut current = self.current.write().await;
        let mut document = read_document(&self.dir, SETTINGS_FILE)
            .await?
            .unwrap_or_default();
        deep_merge(&mut document, patch);

        let mut candidate = document.clone();
        candidate.insert("ladders".to_string(), serde_json::to_value(&current.ladders)?);
        candidate.insert("secrets".to_string(), serde_json::to_value(&current.secrets)?);
        serde_json::from_value::<AppSettings>(Value::Object(candidate))
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;

        write_document(&self.dir, &document).await?;
        let fresh = load(&self.dir).await?;
        *current = fresh.clone();
        tracing::info!(dir = %self.dir.display(), "configuration updated");
        Ok(fresh)
    }
}

/// Serializes `settings` without secrets and with notification credentials
/// masked.
///
/// # Errors
///
/// Returns [`SettingsError::Encode`] if serialization fails.
pub fn safe_view(settings: &AppSettings) -> Result<Value, SettingsError> {
    let mut value = serde_json::to_value(settings)?;
    if let Some(root) = value.as_object_mut() {
        root.remove("secrets");
        if let Some(Value::Object(channels)) = root.get_mut("notifications") {
            for channel in channels.values_mut().filter_map(Value::as_object_mut) {
                for field in MASKED_FIELDS {
                    if let Some(slot) = channel.get_mut(field)
                        && is_set(slot)
                    {
                        *slot = Value::String(MASK.to_string());
                    }
                }
            }
        }
    }
    Ok(value)
}

/// JSON schema of [`AppSettings`] with every nested section under
/// `definitions`, for form generation.
///
/// # Errors
///
/// Returns [`SettingsError::Encode`] if serialization fails.
pub fn schema() -> Result<Value, SettingsError> {
    let mut nested = Vec::new();
    <AppSettings as ToSchema>::schemas(&mut nested);
    let mut definitions = Map::new();
    for (name, schema) in nested {
        definitions.insert(name, serde_json::to_value(schema)?);
    }
    Ok(serde_json::json!({
        "title": AppSettings::name(),
        "schema": serde_json::to_value(<AppSettings as PartialSchema>::schema())?,
        "definitions": definitions,
    }))
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Merges `patch` into `base`, recursing where both sides are objects.
fn deep_merge(base: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if let Value::Object(update) = value {
            if let Some(Value::Object(existing)) = base.get_mut(&key) {
                deep_merge(existing, update);
                continue;
            }
            base.insert(key, Value::Object(update));
        } else {
            base.insert(key, value);
        }
    }
}

/// Reads `settings.yaml` and overlays the optional ladder and secret files.
async fn load(dir: &Path) -> Result<AppSettings, SettingsError> {
    let mut document = read_document(dir, SETTINGS_FILE).await?.unwrap_or_default();
    for (key, file) in [("ladders", LADDERS_FILE), ("secrets", SECRETS_FILE)] {
        if let Some(section) = read_document(dir, file).await? {
            document.insert(key.to_string(), Value::Object(section));
        }
    }
    serde_json::from_value(Value::Object(document))
        .map_err(|e| SettingsError::Invalid(e.to_string()))
}

/// Parses one YAML file into a JSON object. `None` if the file does not
/// exist; an empty file is an empty object.
async fn read_document(
    dir: &Path,
    file: &'static str,
) -> Result<Option<Map<String, Value>>, SettingsError> {
    let text = match tokio::fs::read_to_string(dir.join(file)).await {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_yaml::from_str::<Value>(&text)
        .map_err(|source| SettingsError::Yaml { file, source })?;
    match value {
        Value::Null => Ok(Some(Map::new())),
        Value::Object(map) => Ok(Some(map)),
        _ => Err(SettingsError::Invalid(format!("{file} must contain a mapping"))),
    }
}

/// Replaces `settings.yaml` through a temporary file and a rename.
async fn write_document(dir: &Path, document: &Map<String, Value>) -> Result<(), SettingsError> {
    let text = serde_yaml::to_string(document).map_err(|source| SettingsError::Yaml {
        file: SETTINGS_FILE,
        source,
    })?;
    tokio::fs::create_dir_all(dir).await?;
    let tmp = dir.join(format!("{SETTINGS_FILE}.tmp"));
    tokio::fs::write(&tmp, text).await?;
    tokio::fs::rename(&tmp, dir.join(SETTINGS_FILE)).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("alpha-score-settings-{}", uuid::Uuid::new_v4()))
    }

    async fn write(dir: &Path, file: &str, text: &str) {
        let Ok(()) = tokio::fs::create_dir_all(dir).await else {
            panic!("mkdir failed");
        };
        let Ok(()) = tokio::fs::write(dir.join(file), text).await else {
            panic!("write failed");
        };
    }

    #[tokio::test]
    async fn missing_directory_uses_defaults() {
        let store = SettingsStore::open(temp_dir()).await;
        assert_eq!(store.current().await, AppSettings::default());
    }

    #[tokio::test]
    async fn broken_yaml_falls_back_to_defaults() {
        let dir = temp_dir();
        write(&dir, SETTINGS_FILE, "system: [unclosed").await;
        let store = SettingsStore::open(dir).await;
        assert_eq!(store.current().await, AppSettings::default());
        assert!(matches!(store.reload().await, Err(SettingsError::Yaml { .. })));
    }

    #[tokio::test]
    async fn ladders_and_secrets_are_overlaid() {
        let dir = temp_dir();
        write(&dir, SETTINGS_FILE, "trading:\n  max_trade_count: 70\n").await;
        write(
            &dir,
            LADDERS_FILE,
            "balance_ladders:\n  - range: [0, 100]\n    points: 1\n  - range: [100, null]\n    points: 2\n",
        )
        .await;
        write(&dir, SECRETS_FILE, "api_keys:\n  binance: k3y\n").await;

        let store = SettingsStore::open(dir).await;
        let settings = store.current().await;
        assert_eq!(settings.trading.max_trade_count, 70);
        assert_eq!(settings.ladders.balance_ladders.len(), 2);
        assert_eq!(settings.ladders.balance_ladders[1].range, vec![Some(100.0), None]);
        assert_eq!(settings.secrets.api_keys.get("binance").map(String::as_str), Some("k3y"));
    }

    #[tokio::test]
    async fn update_merges_and_persists() {
        let dir = temp_dir();
        write(
            &dir,
            SETTINGS_FILE,
            "trading:\n  max_trade_count: 70\n  check_interval: 30\ncustom_note: keep me\n",
        )
        .await;
        let store = SettingsStore::open(dir.clone()).await;

        let patch = json!({
            "trading": { "max_trade_count": 90 },
            "system": { "environment": "production" },
        });
        let Ok(updated) = store.update(patch).await else {
            panic!("valid patch refused");
        };
        assert_eq!(updated.trading.max_trade_count, 90);
        assert_eq!(updated.trading.check_interval, 30);
        assert_eq!(updated.system.environment, "production");
        assert_eq!(store.current().await, updated);

        let Ok(text) = tokio::fs::read_to_string(dir.join(SETTINGS_FILE)).await else {
            panic!("settings file missing");
        };
        let Ok(on_disk) = serde_yaml::from_str::<Value>(&text) else {
            panic!("written file is not YAML");
        };
        assert_eq!(on_disk["trading"]["max_trade_count"], 90);
        assert_eq!(on_disk["trading"]["check_interval"], 30);
        assert_eq!(on_disk["custom_note"], "keep me");
        assert!(!dir.join(format!("{SETTINGS_FILE}.tmp")).exists());
    }

    #[tokio::test]
    async fn invalid_patch_leaves_file_untouched() {
        let dir = temp_dir();
        write(&dir, SETTINGS_FILE, "system:\n  api_port: 8000\n").await;
        let store = SettingsStore::open(dir.clone()).await;

        let bad = json!({ "system": { "api_port": "not a port" } });
        assert!(matches!(store.update(bad).await, Err(SettingsError::Invalid(_))));
        assert!(matches!(store.update(json!([1, 2])).await, Err(SettingsError::Invalid(_))));
        assert!(matches!(
            store.update(json!({ "secrets": {} })).await,
            Err(SettingsError::Invalid(_))
        ));

        let Ok(text) = tokio::fs::read_to_string(dir.join(SETTINGS_FILE)).await else {
            panic!("settings file missing");
        };
        assert_eq!(text, "system:\n  api_port: 8000\n");
    }

    #[tokio::test]
    async fn reload_picks_up_external_edit() {
        let dir = temp_dir();
        write(&dir, SETTINGS_FILE, "logging:\n  retention: 7\n").await;
        let store = SettingsStore::open(dir.clone()).await;
        assert_eq!(store.current().await.logging.retention, 7);

        write(&dir, SETTINGS_FILE, "logging:\n  retention: 14\n").await;
        let Ok(fresh) = store.reload().await else {
            panic!("reload failed");
        };
        assert_eq!(fresh.logging.retention, 14);
        assert_eq!(store.current().await.logging.retention, 14);
    }

    #[test]
    fn safe_view_masks_credentials() {
        let mut settings = AppSettings::default();
        settings.notifications.telegram.bot_token = Some("123:abc".to_string());
        settings.notifications.telegram.chat_id = Some(String::new());
        settings.notifications.discord.webhook = Some("https://discord.test/hook".to_string());
        settings.secrets.api_keys.insert("binance".to_string(), "k3y".to_string());

        let Ok(view) = safe_view(&settings) else {
            panic!("view failed");
        };
        assert!(view.get("secrets").is_none());
        assert_eq!(view["notifications"]["telegram"]["bot_token"], "***");
        assert_eq!(view["notifications"]["telegram"]["chat_id"], "");
        assert_eq!(view["notifications"]["discord"]["webhook"], "***");
        assert!(view["notifications"]["email"]["webhook"].is_null());
        assert_eq!(view["database"]["type"], "sqlite");
    }

    #[test]
    fn deep_merge_replaces_leaves_only() {
        let Value::Object(mut base) = json!({ "a": { "x": 1, "y": 2 }, "b": [1] }) else {
            panic!("object literal");
        };
        let Value::Object(patch) = json!({ "a": { "y": 3 }, "b": [2], "c": null }) else {
            panic!("object literal");
        };
        deep_merge(&mut base, patch);
        assert_eq!(
            Value::Object(base),
            json!({ "a": { "x": 1, "y": 3 }, "b": [2], "c": null })
        );
    }

    #[test]
    fn schema_lists_sections() {
        let Ok(schema) = schema() else {
            panic!("schema failed");
        };
        assert_eq!(schema["title"], "AppSettings");
        assert!(schema["schema"]["properties"]["trading"].is_object());
        assert!(schema["definitions"]["TradingSettings"].is_object());
    }
}
