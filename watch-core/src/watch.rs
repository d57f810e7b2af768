//! Oppressive climate roll made at the start of each watch.

use serde::Serialize;

use crate::config::{OppressiveCondition, WatchConfig};
use crate::dice::{Dice, D12, D6};
use crate::error::Result;

pub const NO_CONDITION_MESSAGE: &str = "No oppressive climate conditions in this watch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    Active,
    None,
}

/// Result of the climate roll, kept until the next watch is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClimatePanel {
    pub state: PanelState,
    pub d6: u32,
    pub d12: Option<u32>,
    pub condition: Option<OppressiveCondition>,
}

impl ClimatePanel {
    pub fn is_active(&self) -> bool {
        self.state == PanelState::Active
    }

    /// Roll line shown above the condition, e.g. `d6 roll: 1 | d12 roll: 7`.
    pub fn roll_line(&self) -> String {
        match self.d12 {
            Some(d12) => format!("d6 roll: {} | d12 roll: {}", self.d6, d12),
            None => format!("d6 roll: {}", self.d6),
        }
    }
}

/// Roll a d6; on a 1 the watch suffers the climate condition picked by a d12.
pub fn roll_climate(config: &WatchConfig, dice: &mut dyn Dice) -> Result<ClimatePanel> {
    let d6 = dice.roll(D6);
    if d6 != 1 {
        tracing::debug!("Climate d6={} leaves the watch clear", d6);
        return Ok(ClimatePanel {
            state: PanelState::None,
            d6,
            d12: None,
            condition: None,
        });
    }

    let d12 = dice.roll(D12);
    let condition = config.climate_condition(d12)?.clone();
    tracing::info!("Oppressive climate: {} (d12={})", condition.name, d12);
    Ok(ClimatePanel {
        state: PanelState::Active,
        d6,
        d12: Some(d12),
        condition: Some(condition),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures;
    use crate::dice::testing::ScriptedDice;
    use crate::error::WatchError;

    fn config() -> WatchConfig {
        WatchConfig::from_json(fixtures::BASIC).unwrap()
    }

    #[test]
    fn one_on_d6_rolls_a_climate_condition() {
        let mut dice = ScriptedDice::new(&[1, 7]);
        let panel = roll_climate(&config(), &mut dice).unwrap();

        assert!(panel.is_active());
        assert_eq!(panel.d12, Some(7));
        assert_eq!(panel.condition.as_ref().unwrap().name, "Blood Moon");
        assert_eq!(panel.roll_line(), "d6 roll: 1 | d12 roll: 7");
        assert_eq!(dice.faces_seen, vec![6, 12]);
    }

    #[test]
    fn other_d6_results_leave_the_watch_clear() {
        let mut dice = ScriptedDice::new(&[3]);
        let panel = roll_climate(&config(), &mut dice).unwrap();

        assert_eq!(panel.state, PanelState::None);
        assert!(panel.condition.is_none());
        assert_eq!(panel.roll_line(), "d6 roll: 3");
        assert_eq!(dice.faces_seen, vec![6]);
    }

    #[test]
    fn missing_catalog_entry_fails_loudly() {
        let mut dice = ScriptedDice::new(&[1, 4]);
        assert!(matches!(
            roll_climate(&config(), &mut dice),
            Err(WatchError::MissingClimateCondition(4))
        ));
    }
}
