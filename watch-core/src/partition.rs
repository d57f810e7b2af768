//! Which terrains are in play for the current watch.

use crate::error::{Result, WatchError};

/// Splits the terrain keys into a selected sequence and an available pool.
///
/// Selected keys keep the order they were clicked in. Available keys always
/// follow the canonical order, so a deselected terrain returns to its home
/// position instead of the end of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainPartition {
    canonical: Vec<String>,
    selected: Vec<String>,
}

impl TerrainPartition {
    /// Every key starts out available.
    pub fn new(canonical: &[String]) -> Self {
        Self {
            canonical: canonical.to_vec(),
            selected: Vec::new(),
        }
    }

    fn check_known(&self, key: &str) -> Result<()> {
        if self.canonical.iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(WatchError::UnknownTerrain(key.to_string()))
        }
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.iter().any(|k| k == key)
    }

    /// Append to the selected sequence. Selecting twice changes nothing.
    pub fn select(&mut self, key: &str) -> Result<()> {
        self.check_known(key)?;
        if !self.is_selected(key) {
            self.selected.push(key.to_string());
        }
        Ok(())
    }

    pub fn deselect(&mut self, key: &str) -> Result<()> {
        self.check_known(key)?;
        self.selected.retain(|k| k != key);
        Ok(())
    }

    /// Flip a terrain between the two pools. Returns whether it is now selected.
    pub fn toggle(&mut self, key: &str) -> Result<bool> {
        if self.is_selected(key) {
            self.deselect(key)?;
            Ok(false)
        } else {
            self.select(key)?;
            Ok(true)
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Unselected keys in canonical order.
    pub fn available(&self) -> Vec<&str> {
        self.canonical
            .iter()
            .filter(|k| !self.is_selected(k))
            .map(String::as_str)
            .collect()
    }

    pub fn canonical(&self) -> &[String] {
        &self.canonical
    }
}
