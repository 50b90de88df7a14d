use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::CoreError;
use crate::models::settings::Settings;

/// File name of the key-value config inside the data directory.
pub const DEFAULT_CONFIG_NAME: &str = "loppiskassan.json";

// Named keys.
pub const KEY_EVENT_ID: &str = "event_id";
pub const KEY_API_KEY: &str = "api_key";
pub const KEY_APPROVED_SELLERS: &str = "approved_sellers";
pub const KEY_OFFLINE_MODE: &str = "offline_mode";
pub const KEY_MARKET_SHARE: &str = "market_share_percent";
pub const KEY_CURRENCY: &str = "currency";
pub const KEY_API_BASE_URL: &str = "api_base_url";

/// Flat string key-value store persisted as a JSON object.
///
/// Values are opaque strings; booleans are stored as `"true"` / `"false"`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl ConfigStore {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text).map_err(|e| {
                CoreError::Config(format!("Failed to parse {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    /// Open the default config file inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        Self::open(dir.as_ref().join(DEFAULT_CONFIG_NAME))
    }

    /// A store that only lives in memory until `save` is called.
    pub fn in_memory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, value.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn save(&self) -> Result<(), CoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize config: {e}")))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl Settings {
    /// Build the typed settings from the named keys. Unparsable values fall
    /// back to their defaults.
    pub fn from_store(store: &ConfigStore) -> Self {
        let defaults = Settings::default();

        let approved_sellers = store
            .get(KEY_APPROVED_SELLERS)
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| match s.parse() {
                        Ok(n) => Some(n),
                        Err(_) => {
                            warn!(value = s, "Ignoring invalid approved seller number");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let market_share_percent = store
            .get(KEY_MARKET_SHARE)
            .and_then(|v| v.trim().parse::<u8>().ok())
            .filter(|p| *p <= 100)
            .unwrap_or(defaults.market_share_percent);

        Self {
            event_id: store.get(KEY_EVENT_ID).map(str::to_string),
            api_key: store.get(KEY_API_KEY).map(str::to_string),
            approved_sellers,
            offline_mode: store.get_bool(KEY_OFFLINE_MODE),
            market_share_percent,
            currency: store
                .get(KEY_CURRENCY)
                .map(str::to_string)
                .unwrap_or(defaults.currency),
            api_base_url: store.get(KEY_API_BASE_URL).map(str::to_string),
        }
    }

    /// Write every setting into `store` under its named key.
    pub fn apply_to(&self, store: &mut ConfigStore) {
        set_or_remove(store, KEY_EVENT_ID, self.event_id.as_deref());
        set_or_remove(store, KEY_API_KEY, self.api_key.as_deref());
        set_or_remove(store, KEY_API_BASE_URL, self.api_base_url.as_deref());

        let sellers = self
            .approved_sellers
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        store.set(KEY_APPROVED_SELLERS, sellers);
        store.set_bool(KEY_OFFLINE_MODE, self.offline_mode);
        store.set(KEY_MARKET_SHARE, self.market_share_percent.to_string());
        store.set(KEY_CURRENCY, self.currency.clone());
    }
}

fn set_or_remove(store: &mut ConfigStore, key: &str, value: Option<&str>) {
    match value {
        Some(v) => store.set(key, v),
        None => {
            store.remove(key);
        }
    }
}
