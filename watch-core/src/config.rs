//! The configuration store: DC tables, terrain order, and narrative catalogs.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchError};
use crate::Skill;

/// A narrative penalty, either climate-wide or tied to one terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OppressiveCondition {
    pub name: String,
    pub description: String,
}

/// The document as it appears on disk.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(rename = "difficulty classes")]
    difficulty_classes: DifficultyClasses,
    #[serde(default)]
    terrain_grid_order: Option<Vec<String>>,
    #[serde(default)]
    oppressive_conditions: HashMap<String, OppressiveCondition>,
    #[serde(
        default,
        rename = "terrain_opressive_conditions",
        alias = "terrain_oppressive_conditions"
    )]
    terrain_oppressive_conditions: HashMap<String, Vec<OppressiveCondition>>,
    #[serde(default)]
    terrain_speed: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct DifficultyClasses {
    #[serde(deserialize_with = "ordered::deserialize")]
    watch_actions: Vec<(String, DcTable)>,
}

/// One skill's DCs, in document order.
#[derive(Debug, Deserialize)]
struct DcTable(#[serde(deserialize_with = "ordered::deserialize")] Vec<(String, i32)>);

/// Deserializes a JSON object into key/value pairs without losing key order.
mod ordered {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct PairsVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for PairsVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    pairs.push((key, value));
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor(PhantomData))
    }
}

/// Read-only lookups over a loaded configuration document.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    difficulty: BTreeMap<Skill, HashMap<String, i32>>,
    terrain_keys: Vec<String>,
    climate: HashMap<String, OppressiveCondition>,
    terrain_conditions: HashMap<String, Vec<OppressiveCondition>>,
    velocity: HashMap<String, String>,
}

impl WatchConfig {
    /// Parse and validate a configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: ConfigDocument =
            serde_json::from_str(text).map_err(|e| WatchError::InvalidConfig(e.to_string()))?;
        Self::from_document(document)
    }

    fn from_document(document: ConfigDocument) -> Result<Self> {
        let mut difficulty = BTreeMap::new();
        let mut piloting_order = None;

        for (skill_key, DcTable(pairs)) in document.difficulty_classes.watch_actions {
            let Some(skill) = Skill::from_key(&skill_key) else {
                tracing::debug!("Ignoring unknown skill table '{}'", skill_key);
                continue;
            };
            if skill == Skill::Piloting {
                piloting_order = Some(pairs.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>());
            }
            let table = pairs.into_iter().collect::<HashMap<_, _>>();
            if difficulty.insert(skill, table).is_some() {
                return Err(WatchError::InvalidConfig(format!(
                    "more than one {} table ('{}' repeats it)",
                    skill, skill_key
                )));
            }
        }

        let terrain_keys = match (document.terrain_grid_order, piloting_order) {
            (Some(order), _) => order,
            (None, Some(order)) => order,
            (None, None) => {
                return Err(WatchError::InvalidConfig(
                    "no terrain_grid_order and no piloting table to order terrains by".to_string(),
                ))
            }
        };

        let config = Self {
            difficulty,
            terrain_keys,
            climate: document.oppressive_conditions,
            terrain_conditions: document.terrain_oppressive_conditions,
            velocity: document.terrain_speed,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for key in &self.terrain_keys {
            if !seen.insert(key.as_str()) {
                return Err(WatchError::InvalidConfig(format!(
                    "terrain '{}' appears twice in the grid order",
                    key
                )));
            }
        }

        let mut tables = self.difficulty.iter();
        if let Some((_, first)) = tables.next() {
            let reference: HashSet<&String> = first.keys().collect();
            for (skill, table) in tables {
                let keys: HashSet<&String> = table.keys().collect();
                if keys != reference {
                    return Err(WatchError::InvalidConfig(format!(
                        "{} DCs cover different terrains than the other skills",
                        skill
                    )));
                }
            }
        }

        for key in &self.terrain_keys {
            for (skill, table) in &self.difficulty {
                if !table.contains_key(key) {
                    return Err(WatchError::MissingDc {
                        skill: *skill,
                        terrain: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fail unless every skill in `skills` has a DC table.
    pub fn require_skills(&self, skills: &[Skill]) -> Result<()> {
        match skills.iter().find(|s| !self.difficulty.contains_key(*s)) {
            Some(missing) => Err(WatchError::InvalidConfig(format!(
                "no difficulty table for {}",
                missing
            ))),
            None => Ok(()),
        }
    }

    /// Terrain keys in canonical display order.
    pub fn terrain_keys(&self) -> &[String] {
        &self.terrain_keys
    }

    pub fn dc(&self, skill: Skill, terrain: &str) -> Result<i32> {
        self.difficulty
            .get(&skill)
            .and_then(|table| table.get(terrain))
            .copied()
            .ok_or_else(|| WatchError::MissingDc {
                skill,
                terrain: terrain.to_string(),
            })
    }

    /// Climate condition for a d12 result.
    pub fn climate_condition(&self, d12: u32) -> Result<&OppressiveCondition> {
        self.climate
            .get(&d12.to_string())
            .ok_or(WatchError::MissingClimateCondition(d12))
    }

    /// Conditions a failed watch can trigger in this terrain; empty if none.
    pub fn terrain_conditions(&self, terrain: &str) -> &[OppressiveCondition] {
        self.terrain_conditions
            .get(terrain)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn velocity(&self, terrain: &str) -> Option<&str> {
        self.velocity.get(terrain).map(String::as_str)
    }

    /// One-line confirmation shown after a successful load.
    pub fn summary(&self) -> String {
        match self.terrain_keys.first() {
            Some(first) => match self.dc(Skill::Piloting, first) {
                Ok(dc) => format!(
                    "Config loaded ({} terrains, piloting {} DC {}).",
                    self.terrain_keys.len(),
                    first,
                    dc
                ),
                Err(_) => format!("Config loaded ({} terrains).", self.terrain_keys.len()),
            },
            None => "Config loaded (no terrains).".to_string(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_explicit_grid_order() {
        let config = WatchConfig::from_json(fixtures::BASIC).unwrap();
        assert_eq!(config.terrain_keys(), ["ashlands", "marshlands"]);
        assert_eq!(config.dc(Skill::Piloting, "marshlands").unwrap(), 14);
        assert_eq!(config.dc(Skill::Foraging, "ashlands").unwrap(), 16);
        assert_eq!(
            config.summary(),
            "Config loaded (2 terrains, piloting ashlands DC 10)."
        );
    }

    #[test]
    fn falls_back_to_piloting_key_order() {
        let config = WatchConfig::from_json(fixtures::NO_ORDER).unwrap();
        assert_eq!(
            config.terrain_keys(),
            ["salt_flats", "ashlands", "deep_woods"]
        );
        assert!(config.velocity("ashlands").is_none());
        assert!(config.terrain_conditions("ashlands").is_empty());
    }

    #[test]
    fn catalog_lookups() {
        let config = WatchConfig::from_json(fixtures::BASIC).unwrap();
        assert_eq!(config.climate_condition(7).unwrap().name, "Blood Moon");
        assert!(matches!(
            config.climate_condition(3),
            Err(WatchError::MissingClimateCondition(3))
        ));
        assert_eq!(config.terrain_conditions("ashlands").len(), 2);
        assert!(config.terrain_conditions("marshlands").is_empty());
        assert_eq!(
            config.velocity("ashlands"),
            Some("<b>Half speed</b> on foot.")
        );
    }

    #[test]
    fn missing_skill_table_is_reported() {
        let config = WatchConfig::from_json(fixtures::NO_ORDER).unwrap();
        assert!(config
            .require_skills(&[Skill::Piloting, Skill::Navigating, Skill::Foraging])
            .is_ok());
        assert!(matches!(
            config.require_skills(&Skill::ALL),
            Err(WatchError::InvalidConfig(_))
        ));
        assert!(matches!(
            config.dc(Skill::Watching, "ashlands"),
            Err(WatchError::MissingDc { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_terrain_sets() {
        let text = r#"{
            "difficulty classes": { "watch_actions": {
                "piloting":   { "ashlands": 10, "marshlands": 14 },
                "navigating": { "ashlands": 12 }
            } }
        }"#;
        let err = WatchConfig::from_json(text).unwrap_err();
        assert!(err.to_string().contains("navigating"), "{}", err);
    }

    #[test]
    fn rejects_order_entries_without_dcs() {
        let text = r#"{
            "difficulty classes": { "watch_actions": {
                "piloting": { "ashlands": 10 }
            } },
            "terrain_grid_order": ["ashlands", "tundra"]
        }"#;
        assert!(matches!(
            WatchConfig::from_json(text),
            Err(WatchError::MissingDc { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_order_entries() {
        let text = r#"{
            "difficulty classes": { "watch_actions": {
                "piloting": { "ashlands": 10 }
            } },
            "terrain_grid_order": ["ashlands", "ashlands"]
        }"#;
        assert!(matches!(
            WatchConfig::from_json(text),
            Err(WatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_foraging_under_both_spellings() {
        let text = r#"{
            "difficulty classes": { "watch_actions": {
                "piloting": { "ashlands": 10 },
                "foraging": { "ashlands": 12 },
                "forraging": { "ashlands": 16 }
            } }
        }"#;
        match WatchConfig::from_json(text) {
            Err(WatchError::InvalidConfig(message)) => assert!(message.contains("forraging")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            WatchConfig::from_json("{ not json"),
            Err(WatchError::InvalidConfig(_))
        ));
    }
}
