//! Ordered, id-deduplicated channel selection

use std::collections::HashSet;

use crate::models::MergedChannel;

/// The user's channel lineup.
///
/// Order is display/playback order; each id appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    entries: Vec<MergedChannel>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted entries, keeping the first occurrence of each id
    pub fn from_entries(entries: impl IntoIterator<Item = MergedChannel>) -> Self {
        let mut seen = HashSet::new();
        Self {
            entries: entries.into_iter().filter(|e| seen.insert(e.id.clone())).collect(),
        }
    }

    /// Append a channel; an already-selected id is overwritten in place
    pub fn add(&mut self, channel: MergedChannel) {
        match self.position(&channel.id) {
            Some(idx) => self.entries[idx] = channel,
            None => self.entries.push(channel),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<MergedChannel> {
        let idx = self.position(id)?;
        Some(self.entries.remove(idx))
    }

    /// Swap with the previous entry. Returns the new index if anything moved.
    pub fn move_up(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.entries.len() {
            return None;
        }
        self.entries.swap(index - 1, index);
        Some(index - 1)
    }

    /// Swap with the next entry. Returns the new index if anything moved.
    pub fn move_down(&mut self, index: usize) -> Option<usize> {
        if index.saturating_add(1) >= self.entries.len() {
            return None;
        }
        self.entries.swap(index, index + 1);
        Some(index + 1)
    }

    /// Take `id` out of its slot and re-insert it at `new_index` (clamped to the end)
    pub fn move_to(&mut self, id: &str, new_index: usize) -> bool {
        let Some(old_index) = self.position(id) else {
            return false;
        };
        let entry = self.entries.remove(old_index);
        let new_index = new_index.min(self.entries.len());
        self.entries.insert(new_index, entry);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedChannel> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[MergedChannel] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<MergedChannel> {
        self.entries.clone()
    }
}
