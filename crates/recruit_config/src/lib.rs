//! Process-wide, immutable knowledge-base configuration (spec.md §4.3, §5).
//!
//! Mirrors `terraphim_settings` + `terraphim_config`: load from a TOML file
//! if one is found (env var first, then a handful of conventional paths),
//! otherwise fall back to built-in defaults so the process never refuses to
//! start for lack of a config file.

use ahash::AHashMap;
use recruit_rules::Rule;
use recruit_types::{SeniorityLevel, SkillId, TeamFocus, YearsRange};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Per-function weight and ceiling used by the utility calculator (C7),
/// spec.md §4.7. `max_match` is the per-function cap (`maxMatch` in the
/// spec's formula table); unused by logarithmic/threshold shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedCeiling {
    pub weight: f64,
    pub max_match: f64,
}

impl Default for WeightedCeiling {
    fn default() -> Self {
        Self {
            weight: 1.0,
            max_match: 1.0,
        }
    }
}

/// One entry per row of the §4.7 function bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityConfig {
    pub skill_match: WeightedCeiling,
    pub confidence: WeightedCeiling,
    pub confidence_min: f64,
    pub confidence_max: f64,
    pub experience: WeightedCeiling,
    pub experience_max_years: f64,
    pub preferred_skills_match: WeightedCeiling,
    pub team_focus_match: WeightedCeiling,
    pub related_skills_match: WeightedCeiling,
    pub preferred_business_domain_match: WeightedCeiling,
    pub preferred_technical_domain_match: WeightedCeiling,
    pub start_timeline_match: WeightedCeiling,
    pub preferred_timezone_match: WeightedCeiling,
    pub preferred_seniority_match: WeightedCeiling,
    pub budget_match: WeightedCeiling,
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            skill_match: WeightedCeiling {
                weight: 3.0,
                max_match: 1.0,
            },
            confidence: WeightedCeiling {
                weight: 1.0,
                max_match: 1.0,
            },
            confidence_min: 0.0,
            confidence_max: 1.0,
            experience: WeightedCeiling {
                weight: 1.5,
                max_match: 1.0,
            },
            experience_max_years: 20.0,
            preferred_skills_match: WeightedCeiling {
                weight: 1.5,
                max_match: 1.0,
            },
            team_focus_match: WeightedCeiling {
                weight: 1.0,
                max_match: 1.0,
            },
            related_skills_match: WeightedCeiling {
                weight: 0.5,
                max_match: 1.0,
            },
            preferred_business_domain_match: WeightedCeiling {
                weight: 1.0,
                max_match: 1.0,
            },
            preferred_technical_domain_match: WeightedCeiling {
                weight: 1.0,
                max_match: 1.0,
            },
            start_timeline_match: WeightedCeiling {
                weight: 1.0,
                max_match: 1.0,
            },
            preferred_timezone_match: WeightedCeiling {
                weight: 0.75,
                max_match: 1.0,
            },
            preferred_seniority_match: WeightedCeiling {
                weight: 0.5,
                max_match: 1.0,
            },
            budget_match: WeightedCeiling {
                weight: 1.0,
                max_match: 1.0,
            },
        }
    }
}

/// The fixed seniority -> years table (spec.md §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeniorityTable(pub AHashMap<SeniorityLevel, YearsRange>);

impl Default for SeniorityTable {
    fn default() -> Self {
        let mut map = AHashMap::new();
        map.insert(
            SeniorityLevel::Junior,
            YearsRange {
                min: 0.0,
                max: Some(3.0),
            },
        );
        map.insert(
            SeniorityLevel::Mid,
            YearsRange {
                min: 3.0,
                max: Some(6.0),
            },
        );
        map.insert(
            SeniorityLevel::Senior,
            YearsRange {
                min: 6.0,
                max: Some(10.0),
            },
        );
        map.insert(
            SeniorityLevel::Staff,
            YearsRange {
                min: 10.0,
                max: None,
            },
        );
        map.insert(
            SeniorityLevel::Principal,
            YearsRange {
                min: 15.0,
                max: None,
            },
        );
        Self(map)
    }
}

/// Advisor tunables (spec.md §4.9, §9 Open Question #2: deployments may
/// want a stricter `insufficient_threshold` than the global default).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub advisor_threshold: usize,
    pub insufficient_threshold: usize,
    pub max_conflict_sets: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            advisor_threshold: 5,
            insufficient_threshold: 3,
            max_conflict_sets: 5,
        }
    }
}

/// Weights for the similarity engine's four subscores (spec.md §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub skills: f64,
    pub experience: f64,
    pub domain: f64,
    pub timezone: f64,
    pub correlation_threshold: f64,
    /// Trade-off between top-score and novelty in the MMR diversity pass
    /// (spec.md §4.10 "Diversity selection"): `1.0` ignores redundancy
    /// entirely, `0.0` picks purely for novelty.
    pub diversity_lambda: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            skills: 0.4,
            experience: 0.2,
            domain: 0.25,
            timezone: 0.15,
            correlation_threshold: 0.7,
            diversity_lambda: 0.5,
        }
    }
}

/// The process-wide, immutable KB configuration (spec.md §5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    pub utility: UtilityConfig,
    pub seniority_table: SeniorityTable,
    pub team_focus_alignments: AHashMap<TeamFocus, Vec<SkillId>>,
    pub advisor: AdvisorConfig,
    pub similarity: SimilarityWeights,
    pub max_inference_iterations: usize,
    pub default_min_proficiency: recruit_types::ProficiencyLevel,
    pub default_pagination_limit: u32,
    pub max_pagination_limit: u32,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            utility: UtilityConfig::default(),
            seniority_table: SeniorityTable::default(),
            team_focus_alignments: AHashMap::new(),
            advisor: AdvisorConfig::default(),
            similarity: SimilarityWeights::default(),
            max_inference_iterations: 10,
            default_min_proficiency: recruit_types::ProficiencyLevel::Learning,
            default_pagination_limit: 20,
            max_pagination_limit: 100,
            rules: Vec::new(),
        }
    }
}

impl KnowledgeBaseConfig {
    /// Loads configuration the way `terraphim_settings::DeviceSettings`
    /// does: an explicit path wins, then `$RECRUIT_CONFIG`, then a handful
    /// of conventional locations, falling back to [`Default::default`] if
    /// none resolve to a readable file.
    pub fn load_from_env_and_file(explicit_path: Option<&Path>) -> Result<Self> {
        let candidate = explicit_path.map(PathBuf::from).or_else(|| {
            std::env::var("RECRUIT_CONFIG")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    dirs::config_dir().map(|dir| dir.join("recruit-graph").join("config.toml"))
                })
        });

        match candidate {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => {
                log::info!("no knowledge-base config file found; using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seniority_table_matches_spec_table() {
        let table = SeniorityTable::default();
        let senior = table.0[&SeniorityLevel::Senior];
        assert_eq!(senior.min, 6.0);
        assert_eq!(senior.max, Some(10.0));
        assert!(table.0[&SeniorityLevel::Staff].max.is_none());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist.toml");
        let config = KnowledgeBaseConfig::load_from_env_and_file(Some(&missing)).unwrap();
        assert_eq!(config, KnowledgeBaseConfig::default());
    }

    #[test]
    fn loads_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = KnowledgeBaseConfig {
            max_inference_iterations: 25,
            ..KnowledgeBaseConfig::default()
        };
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
        let loaded = KnowledgeBaseConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.max_inference_iterations, 25);
    }
}
