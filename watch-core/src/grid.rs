//! Terrain grid view model.
//!
//! `render_grid` turns the configuration, a roll snapshot and the terrain
//! partition into a description of every cell: its checks, outcomes and
//! disclosures. Presentation layers draw this tree without making decisions
//! of their own. Each call rebuilds the whole grid from the state it is given.

use serde::Serialize;

use crate::config::{OppressiveCondition, WatchConfig};
use crate::dice::Dice;
use crate::error::{Result, WatchError};
use crate::partition::TerrainPartition;
use crate::rolls::Rolls;
use crate::{Skill, Variant};

/// A check passes when the roll meets or beats the DC.
pub fn passes(roll: u32, dc: i32) -> bool {
    i64::from(roll) >= i64::from(dc)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView {
    /// Whether checks carry roll outcomes or only DCs.
    pub comparisons: bool,
    pub selected: Vec<TerrainCell>,
    pub available: Vec<TerrainCell>,
}

impl GridView {
    pub fn cells(&self) -> impl Iterator<Item = &TerrainCell> {
        self.selected.iter().chain(self.available.iter())
    }

    pub fn cell(&self, key: &str) -> Option<&TerrainCell> {
        self.cells().find(|cell| cell.key == key)
    }

    pub fn cell_mut(&mut self, key: &str) -> Option<&mut TerrainCell> {
        self.selected
            .iter_mut()
            .chain(self.available.iter_mut())
            .find(|cell| cell.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerrainCell {
    pub key: String,
    pub title: String,
    pub image: String,
    pub selected: bool,
    /// Clicking the cell moves it between the selected and available grids.
    pub clickable: bool,
    pub checks: Vec<CheckView>,
    pub velocity: Option<Disclosure>,
    pub oppressive: Option<Disclosure>,
}

impl TerrainCell {
    pub fn check(&self, skill: Skill) -> Option<&CheckView> {
        self.checks.iter().find(|check| check.skill == skill)
    }

    pub fn disclosure_mut(&mut self, kind: DisclosureKind) -> Option<&mut Disclosure> {
        match kind {
            DisclosureKind::Velocity => self.velocity.as_mut(),
            DisclosureKind::Oppressive => self.oppressive.as_mut(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckView {
    pub skill: Skill,
    pub label: String,
    pub icon: String,
    pub dc: i32,
    /// Present only when the grid is comparing rolls.
    pub outcome: Option<CheckOutcome>,
}

/// A roll compared against a DC, labelled for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub roll: u32,
    pub pass: bool,
    pub label: &'static str,
    pub icon: &'static str,
}

impl CheckOutcome {
    pub fn new(roll: u32, dc: i32) -> Self {
        let pass = passes(roll, dc);
        let (label, icon) = if pass {
            ("Success", "icons/check.svg")
        } else {
            ("Fail", "icons/cross.svg")
        };
        Self {
            roll,
            pass,
            label,
            icon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisclosureKind {
    Velocity,
    Oppressive,
}

/// A collapsed-by-default toggle revealing rich text.
///
/// Toggling a disclosure never counts as a click on the enclosing cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disclosure {
    pub kind: DisclosureKind,
    pub toggle: String,
    pub body: String,
    pub expanded: bool,
}

impl Disclosure {
    fn velocity(text: &str) -> Self {
        Self {
            kind: DisclosureKind::Velocity,
            toggle: "Velocity".to_string(),
            body: text.to_string(),
            expanded: false,
        }
    }

    fn oppressive(condition: &OppressiveCondition) -> Self {
        Self {
            kind: DisclosureKind::Oppressive,
            toggle: condition.name.clone(),
            body: condition.description.clone(),
            expanded: false,
        }
    }
}

pub fn terrain_title(key: &str) -> String {
    key.replace('_', " ")
}

pub fn terrain_image(key: &str) -> String {
    format!("terrains/{}.png", key)
}

/// Build the full grid.
///
/// `rolls` is `None` when the player has not rolled anything yet, in which
/// case the cells show DCs only. Terrain conditions are drawn from `dice` on
/// every call, so two renders of the same failed watch may disagree.
pub fn render_grid(
    config: &WatchConfig,
    rolls: Option<&Rolls>,
    partition: &TerrainPartition,
    variant: Variant,
    dice: &mut dyn Dice,
) -> Result<GridView> {
    let skills = variant.skills();
    let mut grid = GridView {
        comparisons: rolls.is_some(),
        selected: Vec::new(),
        available: Vec::new(),
    };

    if variant.include_selection {
        for key in partition.selected() {
            grid.selected
                .push(render_cell(config, key, true, rolls, &skills, variant, dice)?);
        }
        for key in partition.available() {
            grid.available
                .push(render_cell(config, key, false, rolls, &skills, variant, dice)?);
        }
    } else {
        for key in config.terrain_keys() {
            grid.available
                .push(render_cell(config, key, false, rolls, &skills, variant, dice)?);
        }
    }

    tracing::debug!(
        "Rendered grid: {} selected, {} available, comparisons={}",
        grid.selected.len(),
        grid.available.len(),
        grid.comparisons
    );
    Ok(grid)
}

fn render_cell(
    config: &WatchConfig,
    key: &str,
    selected: bool,
    rolls: Option<&Rolls>,
    skills: &[Skill],
    variant: Variant,
    dice: &mut dyn Dice,
) -> Result<TerrainCell> {
    let mut checks = Vec::with_capacity(skills.len());
    for skill in skills {
        let dc = config.dc(*skill, key)?;
        let outcome = match rolls {
            Some(rolls) => {
                let roll = roll_for(rolls, *skill)?;
                Some(CheckOutcome::new(roll, dc))
            }
            None => None,
        };
        checks.push(CheckView {
            skill: *skill,
            label: skill.label().to_string(),
            icon: skill.icon(),
            dc,
            outcome,
        });
    }

    let oppressive = match rolls {
        Some(rolls) if variant.include_watching => {
            let watching = roll_for(rolls, Skill::Watching)?;
            let conditions = config.terrain_conditions(key);
            if !passes(watching, config.dc(Skill::Watching, key)?) && !conditions.is_empty() {
                let choice = &conditions[dice.pick(conditions.len())];
                Some(Disclosure::oppressive(choice))
            } else {
                None
            }
        }
        _ => None,
    };

    Ok(TerrainCell {
        key: key.to_string(),
        title: terrain_title(key),
        image: terrain_image(key),
        selected,
        clickable: variant.include_selection,
        checks,
        velocity: config.velocity(key).map(Disclosure::velocity),
        oppressive,
    })
}

fn roll_for(rolls: &Rolls, skill: Skill) -> Result<u32> {
    rolls
        .get(&skill)
        .copied()
        .ok_or_else(|| WatchError::UnknownSkill(skill.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures;
    use crate::dice::testing::ScriptedDice;
    use crate::dice::RngDice;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> WatchConfig {
        WatchConfig::from_json(fixtures::BASIC).unwrap()
    }

    fn rolls(piloting: u32, navigating: u32, foraging: u32, watching: u32) -> Rolls {
        Rolls::from([
            (Skill::Piloting, piloting),
            (Skill::Navigating, navigating),
            (Skill::Foraging, foraging),
            (Skill::Watching, watching),
        ])
    }

    #[test]
    fn ties_favor_the_roller() {
        assert!(passes(12, 12));
        assert!(!passes(11, 12));
        assert!(passes(1, -3));
    }

    #[test]
    fn no_rolls_shows_dcs_only() {
        let config = config();
        let partition = TerrainPartition::new(config.terrain_keys());
        let mut dice = ScriptedDice::new(&[]);
        let grid = render_grid(&config, None, &partition, Variant::FULL, &mut dice).unwrap();

        assert!(!grid.comparisons);
        assert_eq!(grid.available.len(), 2);
        let ashlands = grid.cell("ashlands").unwrap();
        assert_eq!(ashlands.check(Skill::Watching).unwrap().dc, 15);
        assert!(ashlands.checks.iter().all(|c| c.outcome.is_none()));
        assert!(ashlands.oppressive.is_none());
    }

    #[test]
    fn cell_carries_title_image_and_velocity() {
        let plain = WatchConfig::from_json(fixtures::NO_ORDER).unwrap();
        let partition = TerrainPartition::new(plain.terrain_keys());
        let mut dice = ScriptedDice::new(&[]);
        let grid = render_grid(&plain, None, &partition, Variant::REDUCED, &mut dice).unwrap();

        let cell = grid.cell("salt_flats").unwrap();
        assert_eq!(cell.title, "salt flats");
        assert_eq!(cell.image, "terrains/salt_flats.png");
        assert!(cell.velocity.is_none());

        let basic = config();
        let grid =
            render_grid(&basic, None, &partition_for(&basic), Variant::FULL, &mut dice).unwrap();
        let velocity = grid.cell("ashlands").unwrap().velocity.as_ref().unwrap();
        assert!(!velocity.expanded);
        assert_eq!(velocity.body, "<b>Half speed</b> on foot.");
    }

    fn partition_for(config: &WatchConfig) -> TerrainPartition {
        TerrainPartition::new(config.terrain_keys())
    }

    #[test]
    fn outcomes_compare_roll_against_dc() {
        let config = config();
        let mut dice = ScriptedDice::new(&[]);
        let rolls = rolls(10, 12, 20, 20);
        let grid = render_grid(
            &config,
            Some(&rolls),
            &partition_for(&config),
            Variant::FULL,
            &mut dice,
        )
        .unwrap();

        assert!(grid.comparisons);
        let ashlands = grid.cell("ashlands").unwrap();
        let piloting = ashlands.check(Skill::Piloting).unwrap().outcome.unwrap();
        assert_eq!(piloting.roll, 10);
        assert!(piloting.pass);
        assert_eq!(piloting.label, "Success");
        assert_eq!(piloting.icon, "icons/check.svg");

        let marshlands = grid.cell("marshlands").unwrap();
        let piloting = marshlands.check(Skill::Piloting).unwrap().outcome.unwrap();
        assert!(!piloting.pass);
        assert_eq!(piloting.label, "Fail");
        assert_eq!(piloting.icon, "icons/cross.svg");
    }

    #[test]
    fn outcome_serializes_label_and_icon() {
        let value = serde_json::to_value(CheckOutcome::new(12, 12)).unwrap();
        assert_eq!(value["pass"], true);
        assert_eq!(value["label"], "Success");
        assert_eq!(value["icon"], "icons/check.svg");

        let value = serde_json::to_value(CheckOutcome::new(3, 12)).unwrap();
        assert_eq!(value["label"], "Fail");
    }

    #[test]
    fn failed_watch_attaches_one_terrain_condition() {
        let config = config();
        let mut dice = ScriptedDice::new(&[2]);
        let rolls = rolls(10, 10, 10, 5);
        let grid = render_grid(
            &config,
            Some(&rolls),
            &partition_for(&config),
            Variant::FULL,
            &mut dice,
        )
        .unwrap();

        let oppressive = grid.cell("ashlands").unwrap().oppressive.as_ref().unwrap();
        assert_eq!(oppressive.toggle, "Glass Shards");
        assert!(!oppressive.expanded);
        // Watching 5 beats marshlands DC 3, and its catalog is empty anyway.
        assert!(grid.cell("marshlands").unwrap().oppressive.is_none());
        assert_eq!(dice.remaining(), 0);
    }

    #[test]
    fn empty_catalog_means_no_condition() {
        let config = config();
        let mut dice = ScriptedDice::new(&[]);
        let rolls = rolls(1, 1, 1, 1);
        let grid = render_grid(
            &config,
            Some(&rolls),
            &partition_for(&config),
            Variant::FULL,
            &mut dice,
        )
        .unwrap();
        let marshlands = grid.cell("marshlands").unwrap();
        assert!(!marshlands.check(Skill::Watching).unwrap().outcome.unwrap().pass);
        assert!(marshlands.oppressive.is_none());
    }

    #[test]
    fn condition_is_redrawn_on_every_render() {
        let config = config();
        let partition = partition_for(&config);
        let mut dice = RngDice::new(StdRng::seed_from_u64(3));
        let rolls = rolls(10, 10, 10, 5);
        let names: Vec<&str> = config
            .terrain_conditions("ashlands")
            .iter()
            .map(|c| c.name.as_str())
            .collect();

        let mut shown = std::collections::HashSet::new();
        for _ in 0..200 {
            let grid =
                render_grid(&config, Some(&rolls), &partition, Variant::FULL, &mut dice).unwrap();
            let cell = grid.cell("ashlands").unwrap();
            let toggle = cell.oppressive.as_ref().unwrap().toggle.clone();
            assert!(names.contains(&toggle.as_str()));
            shown.insert(toggle);
        }
        assert_eq!(shown.len(), 2);
    }

    #[test]
    fn selected_terrains_render_first_in_click_order() {
        let config = WatchConfig::from_json(fixtures::NO_ORDER).unwrap();
        let mut partition = partition_for(&config);
        partition.select("deep_woods").unwrap();
        partition.select("salt_flats").unwrap();
        let mut dice = ScriptedDice::new(&[]);
        let reduced_skills = Variant {
            include_watching: false,
            include_selection: true,
        };
        let grid = render_grid(&config, None, &partition, reduced_skills, &mut dice).unwrap();

        let selected: Vec<&str> = grid.selected.iter().map(|c| c.key.as_str()).collect();
        let available: Vec<&str> = grid.available.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(selected, ["deep_woods", "salt_flats"]);
        assert_eq!(available, ["ashlands"]);
        assert!(grid.selected.iter().all(|c| c.selected && c.clickable));
    }

    #[test]
    fn reduced_variant_ignores_partition_and_watching() {
        let config = config();
        let mut partition = partition_for(&config);
        partition.select("marshlands").unwrap();
        let mut dice = ScriptedDice::new(&[]);
        let rolls = Rolls::from([
            (Skill::Piloting, 1),
            (Skill::Navigating, 1),
            (Skill::Foraging, 1),
        ]);
        let grid =
            render_grid(&config, Some(&rolls), &partition, Variant::REDUCED, &mut dice).unwrap();

        assert!(grid.selected.is_empty());
        let keys: Vec<&str> = grid.available.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["ashlands", "marshlands"]);
        for cell in grid.cells() {
            assert_eq!(cell.checks.len(), 3);
            assert!(cell.check(Skill::Watching).is_none());
            assert!(cell.oppressive.is_none());
            assert!(!cell.clickable);
        }
    }
}
