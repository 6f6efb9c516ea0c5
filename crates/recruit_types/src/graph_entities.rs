//! Read-only graph entity shapes (spec.md §3 "Graph entities").
//!
//! These mirror what we expect to read back from the labelled-property
//! graph; the core never writes them.

use crate::{DomainId, DomainKind, EngineerId, ProficiencyLevel, SkillId, StartTimeline};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An `Engineer` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Engineer {
    pub id: EngineerId,
    pub name: String,
    pub headline: String,
    pub years_experience: f64,
    pub timezone: String,
    pub salary: f64,
    pub start_timeline: StartTimeline,
    /// 1024-dim content embedding, present only when embeddings are enabled.
    pub embedding: Option<Vec<f32>>,
}

/// A `Skill` node. Only `is_category = false` nodes are "leaves" (glossary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillNode {
    pub id: SkillId,
    pub name: String,
    pub is_category: bool,
}

impl SkillNode {
    pub fn is_leaf(&self) -> bool {
        !self.is_category
    }
}

/// A `(Engineer)-[:HAS]->(UserSkill)-[:FOR]->(Skill)` edge attribute node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineerSkillEdge {
    pub skill_id: SkillId,
    pub proficiency_level: ProficiencyLevel,
    pub confidence_score: f64,
    pub years_used: f64,
}

/// A `BusinessDomain` or `TechnicalDomain` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DomainNode {
    pub id: DomainId,
    pub name: String,
    pub kind: DomainKind,
}

/// Source tag on a technical-domain engineer edge (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DomainEdgeSource {
    Explicit,
    Inferred,
}

/// An engineer-domain edge, carrying years of exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineerDomainEdge {
    pub domain_id: DomainId,
    pub years: f64,
    /// `None` for business domains, which have no explicit/inferred tag.
    pub source: Option<DomainEdgeSource>,
}

/// A skill-skill correlation edge consumed by the similarity engine (C10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillCorrelation {
    pub other_skill_id: SkillId,
    pub strength: f64,
}
