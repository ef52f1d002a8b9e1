//! Channel directory merge, reconciliation and browsing filters

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{ChannelMeta, LogoEntry, MergedChannel, StreamEntry, UNCATEGORIZED, UNKNOWN_COUNTRY};
use crate::selection::Selection;

/// Filter value meaning "no restriction"
pub const ALL: &str = "All";

/// Join channels, streams and logos by channel id.
///
/// Only channels with a stream survive. Output keeps the order of `channels`.
/// Streams are keyed last-write-wins, logos keep the widest entry per channel
/// (first one wins on equal width).
pub fn merge(channels: &[ChannelMeta], streams: &[StreamEntry], logos: &[LogoEntry]) -> Vec<MergedChannel> {
    let mut stream_map: HashMap<&str, &str> = HashMap::with_capacity(streams.len());
    for stream in streams {
        let (Some(channel), Some(url)) = (non_empty(&stream.channel), non_empty(&stream.url)) else {
            continue;
        };
        stream_map.insert(channel, url);
    }

    let mut logo_map: HashMap<&str, &LogoEntry> = HashMap::new();
    for logo in logos {
        let Some(channel) = non_empty(&logo.channel) else {
            continue;
        };
        let wider = logo_map
            .get(channel)
            .is_none_or(|existing| logo.width.unwrap_or(0.0) > existing.width.unwrap_or(0.0));
        if wider {
            logo_map.insert(channel, logo);
        }
    }

    channels
        .iter()
        .filter_map(|meta| {
            let id = non_empty(&meta.id)?;
            let url = stream_map.get(id)?;

            let logo = non_empty(&meta.logo)
                .or_else(|| logo_map.get(id).and_then(|l| non_empty(&l.url)))
                .map(str::to_string);

            Some(MergedChannel {
                id: id.to_string(),
                name: meta.name.clone().unwrap_or_default(),
                logo,
                url: url.to_string(),
                category: meta
                    .categories
                    .first()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                country: non_empty(&meta.country)
                    .map(str::to_string)
                    .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
            })
        })
        .collect()
}

/// Refresh a persisted selection with live directory records.
///
/// Entries still in `fresh` are replaced by the live record; entries that
/// vanished upstream are kept verbatim. Duplicate ids keep the first slot.
pub fn reconcile(saved: &[MergedChannel], fresh: &[MergedChannel]) -> Vec<MergedChannel> {
    let by_id: HashMap<&str, &MergedChannel> = fresh.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut seen = HashSet::with_capacity(saved.len());

    saved
        .iter()
        .filter(|s| seen.insert(s.id.as_str()))
        .map(|s| by_id.get(s.id.as_str()).map_or_else(|| s.clone(), |f| (*f).clone()))
        .collect()
}

/// Country filter values: "All", then the pinned country (if present), then the rest sorted
pub fn countries(channels: &[MergedChannel], pinned: &str) -> Vec<String> {
    let mut unique: BTreeSet<&str> = channels
        .iter()
        .map(|c| c.country.as_str())
        .filter(|c| !c.is_empty())
        .collect();

    let mut out = vec![ALL.to_string()];
    if !pinned.is_empty() && unique.remove(pinned) {
        out.push(pinned.to_string());
    }
    out.extend(unique.into_iter().map(str::to_string));
    out
}

/// Category filter values: "All", then the sorted distinct categories
pub fn categories(channels: &[MergedChannel]) -> Vec<String> {
    let unique: BTreeSet<&str> = channels
        .iter()
        .map(|c| c.category.as_str())
        .filter(|c| !c.is_empty())
        .collect();

    std::iter::once(ALL.to_string())
        .chain(unique.into_iter().map(str::to_string))
        .collect()
}

/// Search and chip filters of the channel store
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFilter {
    pub query: String,
    pub country: String,
    pub category: String,
}

impl Default for ChannelFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            country: ALL.to_string(),
            category: ALL.to_string(),
        }
    }
}

impl ChannelFilter {
    pub fn matches(&self, channel: &MergedChannel) -> bool {
        let query = self.query.trim();
        (query.is_empty() || contains_ignore_case(&channel.name, query))
            && (self.country == ALL || channel.country == self.country)
            && (self.category == ALL || channel.category == self.category)
    }

    /// Channels matching the filter that are not selected yet
    pub fn available<'a>(&self, channels: &'a [MergedChannel], selection: &Selection) -> Vec<&'a MergedChannel> {
        channels
            .iter()
            .filter(|c| !selection.contains(&c.id) && self.matches(c))
            .collect()
    }
}

/// Case-insensitive substring check (Unicode aware, names are not ASCII-only)
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
