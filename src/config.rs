use std::{
    fs, io,
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::app::state::TotalOnDelete;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_TABLE: &str = "study_records";
pub const DEFAULT_TARGET_HOURS: f64 = 1000.;

/// Connection parameters for [crate::store::rest::RestStore].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub url: String,
    pub api_key: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store: StoreSettings,
    pub total_on_delete: TotalOnDelete,
    /// Shown next to the total. Never enforced.
    pub target_hours: f64,
}

/// Shape of `config.toml`. Every key is optional, environment variables fill in or override
/// the values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    store_url: Option<String>,
    api_key: Option<String>,
    table: Option<String>,
    total_on_delete: Option<TotalOnDelete>,
    target_hours: Option<f64>,
}

/// Loads settings from `config` (or `config.toml` inside `app_dir`) and environment variables
/// looked up through `env`. Missing file is fine, malformed one is not.
pub fn load_settings(
    config: Option<&Path>,
    app_dir: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let path = config.map_or_else(|| app_dir.join(CONFIG_FILE_NAME), Path::to_path_buf);
    let file = read_settings_file(&path)?;
    resolve(file, env)
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn read_settings_file(path: &Path) -> Result<SettingsFile> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            debug!("Reading settings from {path:?}");
            toml::from_str(&raw).with_context(|| format!("Malformed settings file {path:?}"))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No settings file at {path:?}, relying on environment");
            Ok(SettingsFile::default())
        }
        Err(e) => Err(e).with_context(|| format!("Couldn't read settings file {path:?}")),
    }
}

fn resolve(file: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Result<Settings> {
    let first_env = |keys: &[&str]| keys.iter().find_map(|key| env(*key));

    let url = first_env(&["STUDYLOG_STORE_URL", "SUPABASE_URL"])
        .or(file.store_url)
        .ok_or_else(|| {
            anyhow!("Store url is not configured. Set STUDYLOG_STORE_URL or store_url in {CONFIG_FILE_NAME}")
        })?;
    let api_key = first_env(&["STUDYLOG_API_KEY", "SUPABASE_ANON_KEY"])
        .or(file.api_key)
        .ok_or_else(|| {
            anyhow!("Store api key is not configured. Set STUDYLOG_API_KEY or api_key in {CONFIG_FILE_NAME}")
        })?;
    let table = first_env(&["STUDYLOG_TABLE"])
        .or(file.table)
        .unwrap_or_else(|| DEFAULT_TABLE.into());

    let target_hours = file.target_hours.unwrap_or(DEFAULT_TARGET_HOURS);
    if !target_hours.is_finite() || target_hours <= 0. {
        return Err(anyhow!("target_hours must be a positive number, got {target_hours}"));
    }

    Ok(Settings {
        store: StoreSettings {
            url,
            api_key,
            table,
        },
        total_on_delete: file.total_on_delete.unwrap_or_default(),
        target_hours,
    })
}
