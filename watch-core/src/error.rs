//! Error types shared by every watch component.

use crate::Skill;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The configuration document could not be fetched.
    #[error("Config fetch failed: {0}")]
    ConfigLoad(String),
    /// An operation needed the configuration before a successful load.
    #[error("Config not loaded")]
    ConfigNotReady,
    /// The document was fetched but its content is unusable.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("No {skill} DC for terrain '{terrain}'")]
    MissingDc { skill: Skill, terrain: String },
    #[error("No oppressive climate condition for d12 roll {0}")]
    MissingClimateCondition(u32),
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),
    #[error("Unknown terrain: {0}")]
    UnknownTerrain(String),
    #[error("Invalid roll '{0}': expected a whole number from 1 to 20")]
    InvalidRoll(String),
    /// Selecting terrains was attempted in a variant without selection.
    #[error("Terrain selection is off in this variant")]
    SelectionDisabled,
}

pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = WatchError::MissingDc {
            skill: Skill::Watching,
            terrain: "ashlands".to_string(),
        };
        assert_eq!(err.to_string(), "No watching DC for terrain 'ashlands'");
        assert!(WatchError::InvalidRoll("25".to_string())
            .to_string()
            .contains("'25'"));
    }
}
