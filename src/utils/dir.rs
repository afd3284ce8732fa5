use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

const APPLICATION_DIR: &str = "studylog";

/// Directory holding `config.toml` and logs. Created when missing.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = {
        cfg_if::cfg_if! {
            if #[cfg(windows)] {
                PathBuf::from(env::var("APPDATA").context("APPDATA should be present on Windows")?)
            } else {
                env::var("XDG_CONFIG_HOME")
                    .map(PathBuf::from)
                    .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                    .context("Couldn't find neither XDG_CONFIG_HOME nor HOME")?
            }
        }
    };
    path.push(APPLICATION_DIR);

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
