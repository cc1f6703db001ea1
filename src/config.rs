use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

/// `updateLog` text served when the manifest origin is unreachable.
pub const DEGRADED_UPDATE_LOG: &str = "Update check failed: network unreachable";

/// Default prefix for version-tagged store names.
pub const DEFAULT_CACHE_PREFIX: &str = "app-cache";

/// Worker configuration, typically deserialized from the host's JSON config.
/// Missing optional fields fill with defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    /// Version token baked into the running application build. Names the
    /// current store and is the baseline for update comparisons.
    pub current_version: String,

    /// Absolute URL of the remote version manifest.
    pub manifest_url: Url,

    /// Origin whose requests this worker intercepts.
    pub origin: Url,

    /// Resources cached eagerly at install; absolute or origin-relative.
    #[serde(default)]
    pub resources: Vec<String>,

    /// Prefix for the version-tagged store name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Override for the SQLite store location.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_cache_prefix() -> String {
    DEFAULT_CACHE_PREFIX.to_string()
}

impl WorkerConfig {
    /// Name of the current store, tagged with the running version.
    pub fn store_name(&self) -> String {
        format!("{}-v{}", self.cache_prefix, self.current_version)
    }
}

/// Returns the path to the data directory for shellcache.
/// Uses $XDG_DATA_HOME/shellcache if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/shellcache,
/// or ./shellcache if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the response store database.
pub fn default_db_path() -> PathBuf {
    data_dir().join("responses.db")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("shellcache")
}
