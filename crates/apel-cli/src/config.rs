//! Loader configuration – reads/writes `~/.apel/config.toml`.
//!
//! Holds the resource locations that used to be hard-coded relative paths,
//! plus the default loading behaviour of the `apel` binary.

use apel_loader::LoadMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted configuration stored in `~/.apel/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the simulator resources; meshes are copied into
    /// `<resources_path>/objects`.
    #[serde(default = "default_resources_path")]
    pub resources_path: PathBuf,

    /// Directory holding environment bundles (`<name>/scene.json`).
    #[serde(default = "default_envs_path")]
    pub envs_path: PathBuf,

    /// Loading path used when `--mode` is not given.
    #[serde(default)]
    pub load_mode: LoadMode,

    /// Roll back already created objects when a record fails.
    #[serde(default)]
    pub atomic: bool,
}

fn default_resources_path() -> PathBuf {
    PathBuf::from("../resources")
}
fn default_envs_path() -> PathBuf {
    default_resources_path().join("envs")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources_path: default_resources_path(),
            envs_path: default_envs_path(),
            load_mode: LoadMode::default(),
            atomic: false,
        }
    }
}

impl Config {
    /// Resolve a manifest argument.
    ///
    /// Existing paths are used as given.  Otherwise the argument is looked up
    /// under `envs_path`: a bundle directory resolves to its `scene.json`,
    /// anything else is taken as a file path.
    pub fn resolve_manifest(&self, arg: &str) -> PathBuf {
        let direct = PathBuf::from(arg);
        if direct.exists() {
            return direct;
        }
        let in_envs = self.envs_path.join(arg);
        if in_envs.is_dir() {
            return in_envs.join("scene.json");
        }
        if in_envs.exists() {
            return in_envs;
        }
        direct
    }
}

/// Return the path to `~/.apel/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".apel").join("config.toml")
}

/// Load the config from disk, falling back to defaults when the file does not
/// exist.  Environment overrides are applied in both cases.
pub fn load() -> Result<Config, String> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does not
/// exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `APEL_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `APEL_RESOURCES_PATH` | `resources_path` |
/// | `APEL_ENVS_PATH` | `envs_path` |
/// | `APEL_LOAD_MODE` | `load_mode` (ignored if not a valid mode) |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("APEL_RESOURCES_PATH") {
        cfg.resources_path = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("APEL_ENVS_PATH") {
        cfg.envs_path = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("APEL_LOAD_MODE")
        && let Ok(mode) = v.parse::<LoadMode>()
    {
        cfg.load_mode = mode;
    }
}

/// Save the config to disk, creating `~/.apel/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
