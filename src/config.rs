//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::api::IPTV_API_BASE;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub external_player: String,
    #[serde(default = "default_true")]
    pub single_window_mode: bool,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    // Launcher integration
    #[serde(default = "default_home_sync_limit")]
    pub home_sync_limit: usize,
    #[serde(default = "default_true")]
    pub home_sync_enabled: bool,
    // Channel store
    #[serde(default = "default_pinned_country")]
    pub pinned_country: String,
    // Player
    #[serde(default = "default_volume_step")]
    pub volume_step: f32,
    #[serde(default = "default_info_overlay")]
    pub info_overlay_secs: u64,
    #[serde(default = "default_grid_columns")]
    pub grid_columns: usize,
}

fn default_api_base() -> String { IPTV_API_BASE.to_string() }
fn default_timeout() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_font_size() -> u32 { 14 }
fn default_home_sync_limit() -> usize { 20 }
fn default_pinned_country() -> String { "TR".to_string() }
fn default_volume_step() -> f32 { 0.1 }
fn default_info_overlay() -> u64 { 3 }
fn default_grid_columns() -> usize { 4 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: 30,
            external_player: String::new(),
            single_window_mode: true,
            dark_mode: true,
            font_size: 14,
            home_sync_limit: 20,
            home_sync_enabled: true,
            pinned_country: default_pinned_country(),
            volume_step: 0.1,
            info_overlay_secs: 3,
            grid_columns: 4,
        }
    }
}

/// Per-user application directory, created on first use
pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("owntv");
    if let Err(e) = fs::create_dir_all(&path) {
        tracing::warn!("Cannot create {}: {}", path.display(), e);
    }
    path
}

impl AppConfig {
    fn config_path() -> PathBuf {
        app_dir().join("config.json")
    }

    pub fn load() -> Self {
        let path = Self::config_path();

        if path.exists() {
            match fs::read_to_string(&path).map(|c| serde_json::from_str::<AppConfig>(&c)) {
                Ok(Ok(config)) => return config,
                Ok(Err(e)) => tracing::warn!("Ignoring malformed {}: {}", path.display(), e),
                Err(e) => tracing::warn!("Cannot read {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    pub fn save(&self) {
        let path = Self::config_path();
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(&path, content) {
                    tracing::warn!("Cannot write {}: {}", path.display(), e);
                }
            }
            Err(e) => tracing::warn!("Cannot serialize config: {}", e),
        }
    }
}
