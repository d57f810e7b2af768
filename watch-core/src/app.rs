//! Application state and the handlers behind every user action.

use std::time::Instant;

use crate::config::WatchConfig;
use crate::dice::Dice;
use crate::error::{Result, WatchError};
use crate::grid::{render_grid, DisclosureKind, GridView};
use crate::partition::TerrainPartition;
use crate::rolls::RollState;
use crate::source::{load_config, ConfigSource};
use crate::watch::{roll_climate, ClimatePanel};
use crate::{Skill, Variant};

/// Everything one player session needs.
///
/// Each handler runs to completion, updates the status line and, where the
/// action changes what is shown, rebuilds the grid from scratch.
pub struct WatchApp {
    variant: Variant,
    source: Box<dyn ConfigSource>,
    dice: Box<dyn Dice>,
    config: Option<WatchConfig>,
    rolls: RollState,
    partition: TerrainPartition,
    climate: Option<ClimatePanel>,
    grid: Option<GridView>,
    status: String,
}

impl WatchApp {
    /// Create a session. Nothing is fetched until `load_config` is called.
    pub fn new(variant: Variant, source: Box<dyn ConfigSource>, dice: Box<dyn Dice>) -> Self {
        Self {
            variant,
            source,
            dice,
            config: None,
            rolls: RollState::new(&variant.skills()),
            partition: TerrainPartition::new(&[]),
            climate: None,
            grid: None,
            status: "Loading config...".to_string(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn config(&self) -> Option<&WatchConfig> {
        self.config.as_ref()
    }

    pub fn rolls(&self) -> &RollState {
        &self.rolls
    }

    pub fn partition(&self) -> &TerrainPartition {
        &self.partition
    }

    pub fn climate(&self) -> Option<&ClimatePanel> {
        self.climate.as_ref()
    }

    pub fn grid(&self) -> Option<&GridView> {
        self.grid.as_ref()
    }

    /// Watch generation stays disabled until a config has loaded.
    pub fn can_generate(&self) -> bool {
        self.config.is_some()
    }

    fn fail<T>(&mut self, err: WatchError) -> Result<T> {
        self.status = match &err {
            WatchError::ConfigLoad(_) => {
                format!("{}. Check the config location and reload.", err)
            }
            WatchError::ConfigNotReady => "Config not loaded.".to_string(),
            _ => format!("Error: {}", err),
        };
        Err(err)
    }

    /// Fetch the configuration. A config that is already loaded stays put.
    pub fn load_config(&mut self) -> Result<()> {
        if self.config.is_some() {
            return Ok(());
        }
        let loaded = load_config(self.source.as_ref())
            .and_then(|config| config.require_skills(&self.variant.skills()).map(|_| config));
        match loaded {
            Ok(config) => {
                tracing::info!(
                    "Loaded config from {} ({} terrains)",
                    self.source.describe(),
                    config.terrain_keys().len()
                );
                self.partition = TerrainPartition::new(config.terrain_keys());
                self.status = config.summary();
                self.config = Some(config);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Config fetch from {} failed: {}", self.source.describe(), err);
                let err = if matches!(err, WatchError::ConfigLoad(_)) {
                    err
                } else {
                    WatchError::ConfigLoad(err.to_string())
                };
                self.fail(err)
            }
        }
    }

    /// Load the configuration and, once it is in, show the grid right away.
    pub fn start(&mut self) -> Result<()> {
        self.load_config()?;
        self.update_grid().map(|_| ())
    }

    /// Make one reload attempt if nothing is loaded yet.
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.config.is_some() {
            return Ok(());
        }
        tracing::info!("Config not loaded, attempting reload");
        if self.load_config().is_err() {
            return self.fail(WatchError::ConfigNotReady);
        }
        Ok(())
    }

    pub fn roll_all(&mut self) {
        self.rolls.roll_all(self.dice.as_mut(), Instant::now());
        self.status = "All dice rolled.".to_string();
    }

    pub fn roll_one(&mut self, skill: Skill) -> Result<u32> {
        match self.rolls.roll_one(skill, self.dice.as_mut(), Instant::now()) {
            Ok(value) => {
                self.status = format!("{} die rolled.", skill);
                Ok(value)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Manual entry into a skill's input. Blank text clears it.
    pub fn enter_roll(&mut self, skill: Skill, text: &str) -> Result<Option<u32>> {
        match self.rolls.enter(skill, text) {
            Ok(value) => {
                self.status = match value {
                    Some(v) => format!("{} set to {}.", skill, v),
                    None => format!("{} cleared.", skill),
                };
                Ok(value)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Re-render the grid with the current rolls, without a new climate roll.
    pub fn update_grid(&mut self) -> Result<&GridView> {
        self.ensure_loaded()?;
        self.render()?;
        self.status = if self.rolls.has_any_roll() {
            "Grid updated with current rolls.".to_string()
        } else {
            "Grid displayed (no rolls yet).".to_string()
        };
        self.current_grid()
    }

    /// Start a new watch: roll the oppressive climate, then rebuild the grid.
    pub fn generate_watch(&mut self) -> Result<&GridView> {
        self.ensure_loaded()?;
        let climate = match self.config.as_ref() {
            Some(config) => roll_climate(config, self.dice.as_mut()),
            None => Err(WatchError::ConfigNotReady),
        };
        match climate {
            Ok(panel) => self.climate = Some(panel),
            Err(err) => return self.fail(err),
        }
        self.render()?;
        tracing::info!("Watch generated");
        self.status = "Watch generated with current rolls.".to_string();
        self.current_grid()
    }

    /// A click on a terrain cell: move it to the other grid and re-render.
    pub fn click_terrain(&mut self, key: &str) -> Result<&GridView> {
        if !self.variant.include_selection {
            return self.fail(WatchError::SelectionDisabled);
        }
        self.ensure_loaded()?;
        if let Err(err) = self.partition.toggle(key) {
            return self.fail(err);
        }
        self.update_grid()
    }

    /// Put a terrain in play without re-rendering. Already selected is fine.
    pub fn select_terrain(&mut self, key: &str) -> Result<()> {
        if !self.variant.include_selection {
            return self.fail(WatchError::SelectionDisabled);
        }
        self.ensure_loaded()?;
        match self.partition.select(key) {
            Ok(()) => {
                self.status = format!("{} selected.", key);
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Expand or collapse one disclosure on the current grid.
    ///
    /// Only the disclosure changes: the partition stays as it is and nothing
    /// is re-rendered.
    pub fn toggle_disclosure(&mut self, key: &str, kind: DisclosureKind) -> Result<bool> {
        let expanded = self
            .grid
            .as_mut()
            .and_then(|grid| grid.cell_mut(key))
            .and_then(|cell| cell.disclosure_mut(kind))
            .map(|disclosure| {
                disclosure.expanded = !disclosure.expanded;
                disclosure.expanded
            });
        match expanded {
            Some(expanded) => Ok(expanded),
            None => self.fail(WatchError::UnknownTerrain(format!(
                "{} has no {:?} disclosure on the current grid",
                key, kind
            ))),
        }
    }

    fn render(&mut self) -> Result<()> {
        let Some(config) = self.config.as_ref() else {
            return self.fail(WatchError::ConfigNotReady);
        };
        let rolls = if self.rolls.has_any_roll() {
            Some(self.rolls.current_rolls(self.dice.as_mut(), Instant::now()))
        } else {
            None
        };
        let rendered = render_grid(
            config,
            rolls.as_ref(),
            &self.partition,
            self.variant,
            self.dice.as_mut(),
        );
        match rendered {
            Ok(grid) => {
                self.grid = Some(grid);
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    fn current_grid(&self) -> Result<&GridView> {
        self.grid.as_ref().ok_or(WatchError::ConfigNotReady)
    }
}
