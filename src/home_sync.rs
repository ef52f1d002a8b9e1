//! Launcher ("home screen") integration for the selected channels

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::deeplink;
use crate::error::{Error, Result};
use crate::models::{HomeScreenProgram, MergedChannel};

/// Display name of the launcher row
pub const ROW_TITLE: &str = "OwnTV Favorites";

/// Receives the channel row shown by the platform launcher
pub trait HomeScreenSync {
    /// Replace every program in the row with `programs`
    fn sync(&self, programs: &[HomeScreenProgram]) -> Result<()>;
}

/// Capped, minimized projection of the selection
pub fn project(channels: &[MergedChannel], limit: usize) -> Vec<HomeScreenProgram> {
    channels.iter().take(limit).map(HomeScreenProgram::from_channel).collect()
}

/// Push the selection to the launcher; failures are only logged
pub fn sync_selection(bridge: &dyn HomeScreenSync, channels: &[MergedChannel], limit: usize) {
    let programs = project(channels, limit);
    match bridge.sync(&programs) {
        Ok(()) => tracing::debug!("Home screen synced with {} channels", programs.len()),
        Err(e) => tracing::error!("TV Sync Error: {}", e),
    }
}

#[derive(Serialize)]
struct LauncherRow<'a> {
    title: &'a str,
    link: String,
    programs: Vec<LauncherProgram<'a>>,
}

#[derive(Serialize)]
struct LauncherProgram<'a> {
    id: &'a str,
    title: &'a str,
    poster: &'a str,
    link: String,
}

/// Desktop launcher row: a JSON file other tools (menus, docks) can read
pub struct LauncherFile {
    path: PathBuf,
}

impl LauncherFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HomeScreenSync for LauncherFile {
    fn sync(&self, programs: &[HomeScreenProgram]) -> Result<()> {
        let row = LauncherRow {
            title: ROW_TITLE,
            link: format!("{}home", deeplink::SCHEME),
            programs: programs
                .iter()
                .map(|p| LauncherProgram {
                    id: &p.id,
                    title: if p.name.is_empty() { "Unknown" } else { &p.name },
                    poster: &p.logo,
                    link: deeplink::player_link(&p.id),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&row)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json).map_err(|e| Error::Bridge(format!("{}: {}", self.path.display(), e)))
    }
}
