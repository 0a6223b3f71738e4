//! Ordered collection of plot configurations.
//!
//! Entries are addressed by position from the UI, but each one also carries a
//! local key that survives reordering. Remote operations take a snapshot with
//! `prepare_*`, run without holding any lock, and apply their result by key,
//! so an entry removed while its save was in flight is simply not updated.

use uuid::Uuid;

use crate::error::TrendError;
use crate::models::{PlotConfig, PlotId};

/// Stable local handle for a plot entry.
pub type PlotKey = Uuid;

/// A plot configuration plus its local key.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotEntry {
    key: PlotKey,
    config: PlotConfig,
}

impl PlotEntry {
    /// Local key.
    pub fn key(&self) -> PlotKey {
        self.key
    }

    /// Current configuration.
    pub fn config(&self) -> &PlotConfig {
        &self.config
    }
}

/// What a save has to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    /// Entry being saved.
    pub key: PlotKey,
    /// Remote id if the entry was saved before; `None` means create.
    pub id: Option<PlotId>,
    /// Configuration snapshot to send.
    pub config: PlotConfig,
}

/// What a removal has to do remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRemove {
    /// Entry being removed.
    pub key: PlotKey,
    /// Remote id to delete first, if persisted.
    pub id: Option<PlotId>,
}

/// Ordered plot configurations for the active template.
#[derive(Debug, Clone, Default)]
pub struct PlotConfigStore {
    entries: Vec<PlotEntry>,
}

impl PlotConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of plots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[PlotEntry] {
        &self.entries
    }

    /// Configuration at a position.
    pub fn get(&self, index: usize) -> Option<&PlotConfig> {
        self.entries.get(index).map(|e| &e.config)
    }

    /// Current position of an entry.
    pub fn index_of(&self, key: PlotKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Append an unsaved configuration. Any id on the input is discarded.
    pub fn add(&mut self, mut config: PlotConfig) -> Result<usize, TrendError> {
        config.check()?;
        config.id = None;
        self.entries.push(PlotEntry { key: Uuid::new_v4(), config });
        tracing::debug!(index = self.entries.len() - 1, "Plot added");
        Ok(self.entries.len() - 1)
    }

    /// Replace a configuration in place.
    ///
    /// A persisted entry keeps its id whatever the new content says, so an
    /// edit can never detach a plot from its saved copy.
    pub fn edit(&mut self, index: usize, mut config: PlotConfig) -> Result<(), TrendError> {
        config.check()?;
        let entry = self.entry_mut(index)?;
        if let Some(existing) = &entry.config.id {
            if config.id.as_ref().is_some_and(|id| id != existing) {
                tracing::warn!(plot_id = %existing, "Ignoring id change on edit");
            }
            config.id = Some(existing.clone());
        }
        entry.config = config;
        Ok(())
    }

    /// Remove an entry locally, without any remote call.
    pub fn remove_local(&mut self, index: usize) -> Result<PlotConfig, TrendError> {
        if index >= self.entries.len() {
            return Err(Self::missing(index));
        }
        Ok(self.entries.remove(index).config)
    }

    /// Remove an entry by key. Returns `None` if it is already gone.
    pub fn remove_by_key(&mut self, key: PlotKey) -> Option<PlotConfig> {
        let index = self.index_of(key)?;
        Some(self.entries.remove(index).config)
    }

    /// Snapshot what saving the entry at `index` requires.
    pub fn prepare_save(&self, index: usize) -> Result<PendingSave, TrendError> {
        let entry = self.entries.get(index).ok_or_else(|| Self::missing(index))?;
        Ok(PendingSave { key: entry.key, id: entry.config.id.clone(), config: entry.config.clone() })
    }

    /// Snapshot what removing the entry at `index` requires.
    pub fn prepare_remove(&self, index: usize) -> Result<PendingRemove, TrendError> {
        let entry = self.entries.get(index).ok_or_else(|| Self::missing(index))?;
        Ok(PendingRemove { key: entry.key, id: entry.config.id.clone() })
    }

    /// Record the remote id returned by a save. The last write wins.
    ///
    /// Returns false if the entry was removed while the save was in flight.
    pub fn assign_id(&mut self, key: PlotKey, id: PlotId) -> bool {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.config.id = Some(id);
                true
            }
            None => {
                tracing::debug!(plot_id = %id, "Saved plot no longer in store");
                false
            }
        }
    }

    /// Merge saved configurations, skipping ids already present.
    ///
    /// Returns the number of entries added.
    pub fn load_saved(&mut self, saved: impl IntoIterator<Item = PlotConfig>) -> usize {
        let mut added = 0;
        for config in saved {
            let Some(id) = config.id.clone() else {
                tracing::warn!(title = %config.title, "Skipping saved plot without id");
                continue;
            };
            if self.entries.iter().any(|e| e.config.id.as_ref() == Some(&id)) {
                continue;
            }
            self.entries.push(PlotEntry { key: Uuid::new_v4(), config });
            added += 1;
        }
        added
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut PlotEntry, TrendError> {
        self.entries.get_mut(index).ok_or_else(|| Self::missing(index))
    }

    fn missing(index: usize) -> TrendError {
        TrendError::not_found(format!("No plot at position {}", index + 1))
    }
}
