//! Data models for OwnTV

use serde::{Deserialize, Serialize};

/// Screen currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Player,
    Settings,
    Reorder,
    Console,
}

/// Channel metadata from `channels.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChannelMeta {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Stream URL from `streams.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamEntry {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Logo asset from `logos.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogoEntry {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// Denormalized channel record, also the persisted selection entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_country")]
    pub country: String,
}

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN_COUNTRY: &str = "Unknown";

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

fn default_country() -> String {
    UNKNOWN_COUNTRY.to_string()
}

/// Item pushed to the launcher integration (minimized fields)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomeScreenProgram {
    pub id: String,
    pub name: String,
    pub logo: String,
}

impl HomeScreenProgram {
    pub fn from_channel(channel: &MergedChannel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            logo: channel.logo.clone().unwrap_or_default(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
