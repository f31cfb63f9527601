//! Game configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file
//! (or none at all) is valid. Defaults reproduce the standard campaign on
//! the bundled map.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::board::{Faction, ProvinceGraph, ProvinceId, UnitType};
use crate::hooks::Difficulty;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("map config needs both a provinces and an adjacency path")]
    IncompleteMap,

    #[error("invalid rule '{name}': {reason}")]
    InvalidRule { name: &'static str, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub map: MapConfig,
    pub campaign: CampaignConfig,
    pub rules: RuleConfig,
    /// Random seed, 0 for entropy.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            map: MapConfig::default(),
            campaign: CampaignConfig::default(),
            rules: RuleConfig::default(),
            seed: 0,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chance = self.rules.reinforcement_infantry_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::InvalidRule {
                name: "reinforcement_infantry_chance",
                reason: format!("{} is not a probability", chance),
            });
        }
        if self.map.provinces.is_some() != self.map.adjacency.is_some() {
            return Err(ConfigError::IncompleteMap);
        }
        Ok(())
    }
}

/// Where the reference map comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub provinces: Option<PathBuf>,
    pub adjacency: Option<PathBuf>,
}

impl MapConfig {
    /// Loads the configured map, or the bundled one when no paths are set.
    pub fn load(&self) -> crate::Result<ProvinceGraph> {
        match (&self.provinces, &self.adjacency) {
            (Some(p), Some(a)) => Ok(ProvinceGraph::load(p, a)?),
            (None, None) => Ok(ProvinceGraph::bundled()?),
            _ => Err(ConfigError::IncompleteMap.into()),
        }
    }
}

/// A unit placed when a campaign starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub faction: Faction,
    pub position: ProvinceId,
}

impl UnitPlacement {
    pub fn new(unit_type: UnitType, faction: Faction, position: &str) -> Self {
        UnitPlacement {
            unit_type,
            faction,
            position: position.into(),
        }
    }
}

/// Starting position of a new campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub controlled_provinces: Vec<ProvinceId>,
    pub initial_units: Vec<UnitPlacement>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        use Faction::{Allied, Enemy};
        use UnitType::{Armor, Infantry};

        CampaignConfig {
            controlled_provinces: ["harbor", "millbrook", "westmarch", "oakvale", "southwatch", "fernhill"]
                .into_iter()
                .map(ProvinceId::from)
                .collect(),
            initial_units: vec![
                UnitPlacement::new(Infantry, Allied, "millbrook"),
                UnitPlacement::new(Infantry, Allied, "oakvale"),
                UnitPlacement::new(Infantry, Allied, "fernhill"),
                UnitPlacement::new(Infantry, Allied, "westmarch"),
                UnitPlacement::new(Infantry, Enemy, "ashford"),
                UnitPlacement::new(Infantry, Enemy, "crossroads"),
                UnitPlacement::new(Infantry, Enemy, "redwater"),
                UnitPlacement::new(Infantry, Enemy, "blackfen"),
                UnitPlacement::new(Armor, Enemy, "dunmere"),
            ],
        }
    }
}

/// XP paid per solved problem, by difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemXp {
    pub basic: u32,
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl Default for ProblemXp {
    fn default() -> Self {
        ProblemXp {
            basic: 50,
            easy: 100,
            medium: 150,
            hard: 200,
        }
    }
}

/// Tunable game rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Probability that an enemy reinforcement is infantry rather than armor.
    pub reinforcement_infantry_chance: f64,
    /// XP paid when the allied side captures a city.
    pub city_capture_xp: u32,
    pub problem_xp: ProblemXp,
    /// Refund the movement point spent when swapping with a friendly unit.
    pub friendly_swap_refund: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            reinforcement_infantry_chance: 0.7,
            city_capture_xp: 200,
            problem_xp: ProblemXp::default(),
            friendly_swap_refund: false,
        }
    }
}

impl RuleConfig {
    pub fn xp_for(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.problem_xp.easy,
            Difficulty::Medium => self.problem_xp.medium,
            Difficulty::Hard => self.problem_xp.hard,
            Difficulty::Basic | Difficulty::Unrated => self.problem_xp.basic,
        }
    }
}

/// Reads and validates a config file.
pub fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&data)
}

/// Parses and validates config JSON.
pub fn load_config_from_str(json: &str) -> Result<GameConfig, ConfigError> {
    let config: GameConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.rules.reinforcement_infantry_chance, 0.7);
        assert_eq!(config.rules.city_capture_xp, 200);
        assert_eq!(config.campaign.initial_units.len(), 9);
    }

    #[test]
    fn partial_rules_keep_other_defaults() {
        let config =
            load_config_from_str(r#"{"rules":{"friendly_swap_refund":true},"seed":7}"#).unwrap();
        assert!(config.rules.friendly_swap_refund);
        assert_eq!(config.rules.city_capture_xp, 200);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn rejects_bad_probability() {
        let err =
            load_config_from_str(r#"{"rules":{"reinforcement_infantry_chance":1.5}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { .. }));
    }

    #[test]
    fn rejects_half_configured_map() {
        let err = load_config_from_str(r#"{"map":{"provinces":"p.json"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteMap));
    }

    #[test]
    fn placements_parse() {
        let config = load_config_from_str(
            r#"{"campaign":{"controlled_provinces":["a"],"initial_units":[{"type":"armor","faction":"enemy","position":"b"}]}}"#,
        )
        .unwrap();
        assert_eq!(
            config.campaign.initial_units,
            vec![UnitPlacement::new(UnitType::Armor, Faction::Enemy, "b")]
        );
    }

    #[test]
    fn xp_table() {
        let rules = RuleConfig::default();
        assert_eq!(rules.xp_for(Difficulty::Basic), 50);
        assert_eq!(rules.xp_for(Difficulty::Easy), 100);
        assert_eq!(rules.xp_for(Difficulty::Medium), 150);
        assert_eq!(rules.xp_for(Difficulty::Hard), 200);
        assert_eq!(rules.xp_for(Difficulty::Unrated), 50);
    }

    #[test]
    fn default_map_loads_and_covers_campaign() {
        let config = GameConfig::default();
        let graph = config.map.load().unwrap();
        for p in &config.campaign.controlled_provinces {
            assert!(graph.contains(p.as_str()));
        }
        for u in &config.campaign.initial_units {
            assert!(graph.contains(u.position.as_str()));
        }
    }
}
