use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::records::LiftMatching;
use crate::rest::RestPolicy;

pub const DEFAULT_DB_PATH: &str = "./muskyfit.db";
pub const DB_ENV: &str = "MUSKYFIT_DB";
pub const CONFIG_ENV: &str = "MUSKYFIT_CONFIG";

pub const KEY_REST_WARMUP: &str = "rest.warmup";
pub const KEY_REST_WORKING: &str = "rest.working";
pub const KEY_PB_MATCHING: &str = "pb.matching";
pub const KEY_ACTIVE_CLIENT: &str = "client.active";
pub const KEY_DB_PATH: &str = "db.path";

/// Keys the application reads, with a short description for `config list`.
pub static KNOWN_KEYS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (KEY_REST_WARMUP, "rest after a warm-up set, in seconds"),
        (KEY_REST_WORKING, "rest after a working set, in seconds"),
        (KEY_PB_MATCHING, "personal-best matching: fuzzy or tagged"),
        (KEY_ACTIVE_CLIENT, "id of the client commands default to"),
        (KEY_DB_PATH, "path of the SQLite database"),
    ])
});

/// Flat key/value settings stored as TOML.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    /// `$MUSKYFIT_CONFIG`, or `<config dir>/muskyfit/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(p) = env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(p));
        }
        dirs::config_dir()
            .map(|d| d.join("muskyfit").join("config.toml"))
            .context("Could not determine config directory")
    }

    /// Missing file means empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let raw = toml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, raw).with_context(|| format!("Failed to write config: {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    fn parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = raw, "ignoring invalid config value");
                default
            }),
        }
    }

    pub fn rest_policy(&self) -> RestPolicy {
        let default = RestPolicy::default();
        RestPolicy {
            warmup_secs: self.parsed_or(KEY_REST_WARMUP, default.warmup_secs),
            working_secs: self.parsed_or(KEY_REST_WORKING, default.working_secs),
        }
    }

    pub fn lift_matching(&self) -> LiftMatching {
        self.parsed_or(KEY_PB_MATCHING, LiftMatching::default())
    }

    pub fn active_client(&self) -> Option<&str> {
        self.get(KEY_ACTIVE_CLIENT).filter(|s| !s.is_empty())
    }

    /// `$MUSKYFIT_DB`, then `db.path`, then `./muskyfit.db`.
    pub fn db_path(&self) -> String {
        env::var(DB_ENV)
            .ok()
            .or_else(|| self.get(KEY_DB_PATH).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFmt {
    Pretty,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Pretty }
    }
}

/// Print `value` as JSON, or run `pretty` for human output.
pub fn emit<T, F>(fmt: OutputFmt, value: &T, pretty: F)
where
    T: Serialize + ?Sized,
    F: FnOnce(),
{
    match fmt {
        OutputFmt::Pretty => pretty(),
        OutputFmt::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => warn!(error = %e, "failed to serialize output"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.rest_policy(), RestPolicy::default());
        assert_eq!(cfg.lift_matching(), LiftMatching::Fuzzy);
        assert_eq!(cfg.active_client(), None);
    }

    #[test]
    fn values_override_defaults() {
        let mut cfg = Config::default();
        cfg.map.insert(KEY_REST_WARMUP.into(), "20".into());
        cfg.map.insert(KEY_REST_WORKING.into(), " 60 ".into());
        cfg.map.insert(KEY_PB_MATCHING.into(), "tagged".into());
        cfg.map.insert(KEY_ACTIVE_CLIENT.into(), "client_1".into());

        assert_eq!(cfg.rest_policy(), RestPolicy { warmup_secs: 20, working_secs: 60 });
        assert_eq!(cfg.lift_matching(), LiftMatching::Tagged);
        assert_eq!(cfg.active_client(), Some("client_1"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let mut cfg = Config::default();
        cfg.map.insert(KEY_REST_WORKING.into(), "ninety".into());
        cfg.map.insert(KEY_PB_MATCHING.into(), "exact".into());
        assert_eq!(cfg.rest_policy().working_secs, 90);
        assert_eq!(cfg.lift_matching(), LiftMatching::Fuzzy);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert_eq!(Config::load(&path).unwrap(), Config::default());

        let mut cfg = Config::default();
        cfg.map.insert(KEY_REST_WARMUP.into(), "30".into());
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.get(KEY_REST_WARMUP), Some("30"));
    }
}
