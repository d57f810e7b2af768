//! Per-skill roll values entered or rolled by the player.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::dice::{Dice, D20};
use crate::error::{Result, WatchError};
use crate::Skill;

/// How long a freshly rolled input stays highlighted.
pub const FLASH_DURATION: Duration = Duration::from_millis(300);

/// A complete set of rolls, one per active skill.
pub type Rolls = BTreeMap<Skill, u32>;

/// Current value of each active skill; `None` until entered or rolled.
#[derive(Debug, Clone)]
pub struct RollState {
    values: BTreeMap<Skill, Option<u32>>,
    flashes: HashMap<Skill, Instant>,
}

impl RollState {
    /// Create an empty state tracking the given skills.
    pub fn new(skills: &[Skill]) -> Self {
        Self {
            values: skills.iter().map(|skill| (*skill, None)).collect(),
            flashes: HashMap::new(),
        }
    }

    pub fn skills(&self) -> impl Iterator<Item = Skill> + '_ {
        self.values.keys().copied()
    }

    pub fn get(&self, skill: Skill) -> Option<u32> {
        self.values.get(&skill).copied().flatten()
    }

    fn slot(&mut self, skill: Skill) -> Result<&mut Option<u32>> {
        self.values
            .get_mut(&skill)
            .ok_or_else(|| WatchError::UnknownSkill(skill.to_string()))
    }

    /// Roll a d20 for one skill, replacing whatever it held.
    pub fn roll_one(&mut self, skill: Skill, dice: &mut dyn Dice, now: Instant) -> Result<u32> {
        let slot = self.slot(skill)?;
        let value = dice.roll(D20);
        *slot = Some(value);
        self.flashes.insert(skill, now + FLASH_DURATION);
        tracing::debug!("Rolled {} for {}", value, skill);
        Ok(value)
    }

    pub fn roll_all(&mut self, dice: &mut dyn Dice, now: Instant) {
        let skills: Vec<Skill> = self.skills().collect();
        for skill in skills {
            // Every key in `values` is a tracked skill, so this cannot fail.
            let _ = self.roll_one(skill, dice, now);
        }
    }

    /// Manual entry. Blank text clears the skill.
    pub fn enter(&mut self, skill: Skill, text: &str) -> Result<Option<u32>> {
        let trimmed = text.trim();
        let value = if trimmed.is_empty() {
            None
        } else {
            match trimmed.parse::<u32>() {
                Ok(v) if (1..=D20).contains(&v) => Some(v),
                _ => return Err(WatchError::InvalidRoll(trimmed.to_string())),
            }
        };
        *self.slot(skill)? = value;
        Ok(value)
    }

    pub fn has_any_roll(&self) -> bool {
        self.values.values().any(Option::is_some)
    }

    /// Every skill's value, rolling any that are still unset.
    ///
    /// Values already set are returned untouched.
    pub fn current_rolls(&mut self, dice: &mut dyn Dice, now: Instant) -> Rolls {
        let mut rolls = Rolls::new();
        for (skill, slot) in self.values.iter_mut() {
            let value = match *slot {
                Some(value) => value,
                None => {
                    let value = dice.roll(D20);
                    *slot = Some(value);
                    self.flashes.insert(*skill, now + FLASH_DURATION);
                    tracing::debug!("Filled unset {} with {}", skill, value);
                    value
                }
            };
            rolls.insert(*skill, value);
        }
        rolls
    }

    /// Whether a skill's input is still inside its highlight window.
    pub fn is_flashing(&self, skill: Skill, now: Instant) -> bool {
        self.flashes
            .get(&skill)
            .is_some_and(|deadline| now < *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::testing::ScriptedDice;
    use crate::Variant;

    fn full() -> RollState {
        RollState::new(&Variant::FULL.skills())
    }

    #[test]
    fn starts_with_no_rolls() {
        let state = full();
        assert!(!state.has_any_roll());
        assert!(Skill::ALL.iter().all(|s| state.get(*s).is_none()));
    }

    #[test]
    fn single_roll_sets_value_and_flashes() {
        let mut state = full();
        let mut dice = ScriptedDice::new(&[13]);
        let now = Instant::now();

        assert_eq!(state.roll_one(Skill::Navigating, &mut dice, now).unwrap(), 13);
        assert!(state.has_any_roll());
        assert_eq!(state.get(Skill::Navigating), Some(13));
        assert!(state.is_flashing(Skill::Navigating, now));
        assert!(!state.is_flashing(Skill::Navigating, now + FLASH_DURATION));
        assert!(!state.is_flashing(Skill::Piloting, now));
    }

    #[test]
    fn roll_all_fills_every_skill() {
        let mut state = full();
        let mut dice = ScriptedDice::new(&[1, 2, 3, 4]);
        state.roll_all(&mut dice, Instant::now());
        assert_eq!(dice.faces_seen, vec![20; 4]);
        assert!(Skill::ALL.iter().all(|s| state.get(*s).is_some()));
    }

    #[test]
    fn manual_entry_counts_as_a_roll() {
        let mut state = full();
        assert_eq!(state.enter(Skill::Piloting, " 10 ").unwrap(), Some(10));
        assert!(state.has_any_roll());
        assert_eq!(state.enter(Skill::Piloting, "").unwrap(), None);
        assert!(!state.has_any_roll());
    }

    #[test]
    fn manual_entry_rejects_out_of_range_text() {
        let mut state = full();
        state.enter(Skill::Watching, "7").unwrap();
        for bad in ["0", "21", "-3", "abc", "4.5"] {
            assert!(matches!(
                state.enter(Skill::Watching, bad),
                Err(WatchError::InvalidRoll(_))
            ));
        }
        assert_eq!(state.get(Skill::Watching), Some(7));
    }

    #[test]
    fn current_rolls_fills_only_unset_skills() {
        let mut state = full();
        state.enter(Skill::Piloting, "10").unwrap();
        let mut dice = ScriptedDice::new(&[5, 6, 7]);
        let now = Instant::now();

        let rolls = state.current_rolls(&mut dice, now);
        assert_eq!(rolls[&Skill::Piloting], 10);
        assert_eq!(rolls.len(), 4);
        assert_eq!(dice.remaining(), 0);
        assert!(!state.is_flashing(Skill::Piloting, now));
        assert!(state.is_flashing(Skill::Watching, now));
    }

    #[test]
    fn current_rolls_is_idempotent_once_set() {
        let mut state = full();
        let mut dice = ScriptedDice::new(&[3, 9, 14, 20]);
        let now = Instant::now();
        let first = state.current_rolls(&mut dice, now);
        let second = state.current_rolls(&mut dice, now);
        assert_eq!(first, second);
    }

    #[test]
    fn reduced_state_rejects_watching() {
        let mut state = RollState::new(&Variant::REDUCED.skills());
        let mut dice = ScriptedDice::new(&[]);
        assert!(matches!(
            state.roll_one(Skill::Watching, &mut dice, Instant::now()),
            Err(WatchError::UnknownSkill(_))
        ));
        assert!(state.enter(Skill::Watching, "4").is_err());
        assert_eq!(state.skills().count(), 3);
    }
}
