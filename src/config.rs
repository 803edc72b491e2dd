use crate::stats::{AnalysisOptions, HISTOGRAM_BINS, TOP_ARTISTS_COUNT, TOP_SONGS_COUNT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "wrapped";
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_DATA_PATH: &str = "data/popular_songs.csv";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_top_songs_count")]
    pub top_songs_count: usize,
    #[serde(default = "default_top_artists_count")]
    pub top_artists_count: usize,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_bind_addr() -> String {
    String::from(DEFAULT_BIND_ADDR)
}

fn default_top_songs_count() -> usize {
    TOP_SONGS_COUNT
}

fn default_top_artists_count() -> usize {
    TOP_ARTISTS_COUNT
}

fn default_histogram_bins() -> usize {
    HISTOGRAM_BINS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            bind_addr: default_bind_addr(),
            top_songs_count: default_top_songs_count(),
            top_artists_count: default_top_artists_count(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

impl Settings {
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            top_songs: self.top_songs_count,
            top_artists: self.top_artists_count,
            histogram_bins: self.histogram_bins,
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_var("WRAPPED_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(addr) = non_empty_var("WRAPPED_BIND_ADDR") {
            self.bind_addr = addr;
        }
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("WRAPPED_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_settings() -> Result<Settings> {
    let path = settings_path()?;
    load_settings_from_path(&path)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    ensure_config_dir()?;
    let path = settings_path()?;
    save_settings_to_path(&path, settings)
}

fn load_settings_from_path(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

fn save_settings_to_path(path: &Path, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
