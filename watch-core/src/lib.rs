use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub mod app;
pub mod config;
pub mod dice;
pub mod error;
pub mod grid;
pub mod partition;
pub mod rolls;
pub mod source;
pub mod watch;

pub use app::WatchApp;
pub use config::{OppressiveCondition, WatchConfig};
pub use dice::{Dice, RngDice};
pub use error::{Result, WatchError};
pub use grid::GridView;
pub use partition::TerrainPartition;
pub use rolls::RollState;
pub use source::ConfigSource;
pub use watch::ClimatePanel;

/// A skill that is checked against a terrain's difficulty class each watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Piloting,
    Navigating,
    Foraging,
    Watching,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Skill::Piloting,
        Skill::Navigating,
        Skill::Foraging,
        Skill::Watching,
    ];

    /// Key used for this skill in the difficulty tables.
    pub fn key(self) -> &'static str {
        match self {
            Skill::Piloting => "piloting",
            Skill::Navigating => "navigating",
            Skill::Foraging => "foraging",
            Skill::Watching => "watching",
        }
    }

    /// Resolve a config key. Older documents spell foraging with a double r.
    pub fn from_key(key: &str) -> Option<Skill> {
        match key {
            "piloting" => Some(Skill::Piloting),
            "navigating" => Some(Skill::Navigating),
            "foraging" | "forraging" => Some(Skill::Foraging),
            "watching" => Some(Skill::Watching),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Skill::Piloting => "Piloting",
            Skill::Navigating => "Navigating",
            Skill::Foraging => "Foraging",
            Skill::Watching => "Watching",
        }
    }

    pub fn icon(self) -> String {
        format!("icons/{}.svg", self.key())
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Skill {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        Skill::from_key(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| WatchError::UnknownSkill(s.to_string()))
    }
}

/// Which of the two tool variants is running.
///
/// The full variant checks all four skills and lets the player pick terrains.
/// The reduced one drops watching and always shows every terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub include_watching: bool,
    pub include_selection: bool,
}

impl Variant {
    pub const FULL: Variant = Variant {
        include_watching: true,
        include_selection: true,
    };

    pub const REDUCED: Variant = Variant {
        include_watching: false,
        include_selection: false,
    };

    /// Skills checked by this variant, in display order.
    pub fn skills(&self) -> Vec<Skill> {
        Skill::ALL
            .into_iter()
            .filter(|skill| self.include_watching || *skill != Skill::Watching)
            .collect()
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_displays_config_key() {
        assert_eq!(Skill::Piloting.to_string(), "piloting");
        assert_eq!(Skill::Foraging.to_string(), "foraging");
        assert_eq!(Skill::Watching.label(), "Watching");
        assert_eq!(Skill::Navigating.icon(), "icons/navigating.svg");
    }

    #[test]
    fn skill_parses_legacy_spelling() {
        assert_eq!(Skill::from_key("forraging"), Some(Skill::Foraging));
        assert_eq!("Watching".parse::<Skill>().unwrap(), Skill::Watching);
        assert!(matches!(
            "sailing".parse::<Skill>(),
            Err(WatchError::UnknownSkill(_))
        ));
    }

    #[test]
    fn reduced_variant_drops_watching() {
        assert_eq!(Variant::FULL.skills().len(), 4);
        assert_eq!(
            Variant::REDUCED.skills(),
            vec![Skill::Piloting, Skill::Navigating, Skill::Foraging]
        );
    }
}
