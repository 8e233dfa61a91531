use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    pub enable_color: bool,
    pub seed: u64,
    pub tick_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            seed: 0,
            tick_secs: 3,
        }
    }
}

pub struct Paths {
    pub save_path: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

/// Resolves the data directory, preferring `override_dir` when given.
pub fn project_paths(override_dir: Option<&Path>) -> Result<Paths> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "pocketpal", "PocketPal")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths {
        save_path: dir.join("pet.json"),
        settings_path: dir.join("settings.json"),
        log_path: dir.join("pocketpal.log"),
    })
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => log::warn!("ignoring unreadable settings {}: {}", path.display(), e),
        }
    }
    Settings::default()
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename() replaces atomically on the same filesystem, except on Windows.
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
        .with_context(|| format!("renaming {} -> {}", from.display(), to.display()))?;
    Ok(())
}
