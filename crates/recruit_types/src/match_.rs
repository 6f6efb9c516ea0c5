//! Parsed + scored result rows (C6, C7) — spec.md §3, §4.6, §4.7.

use crate::{DomainId, EngineerId, ProficiencyLevel, ScoreBreakdown, SkillId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Why a collected-but-non-direct skill failed a constraint, driving
/// `unmatchedRelatedSkills[].constraintViolations` (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintViolation {
    ProficiencyBelowMinimum,
    ConfidenceBelowMinimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Direct,
    Descendant,
    None,
}

/// One skill collected for an engineer during hierarchy traversal
/// (spec.md §4.5 step 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectedSkill {
    pub skill_id: SkillId,
    pub skill_name: String,
    pub proficiency_level: ProficiencyLevel,
    pub confidence_score: f64,
    pub years_used: f64,
    pub match_type: MatchType,
    pub meets_confidence: bool,
    pub meets_proficiency: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSkill {
    pub skill_id: SkillId,
    pub skill_name: String,
    pub proficiency_level: ProficiencyLevel,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedRelatedSkill {
    pub skill_id: SkillId,
    pub skill_name: String,
    pub proficiency_level: ProficiencyLevel,
    pub constraint_violations: Vec<ConstraintViolation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchedDomain {
    pub domain_id: DomainId,
    pub domain_name: String,
    pub years: f64,
    pub meets_required: bool,
    pub meets_preferred: bool,
}

/// One scored, ranked result row (spec.md §3 `EngineerMatch`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineerMatch {
    pub engineer_id: EngineerId,
    pub name: String,
    pub headline: String,
    pub years_experience: f64,
    pub timezone: String,
    pub salary: f64,
    pub start_timeline: crate::StartTimeline,

    pub matched_skills: Vec<MatchedSkill>,
    pub unmatched_related_skills: Vec<UnmatchedRelatedSkill>,
    pub matched_skill_count: usize,
    pub avg_confidence: f64,

    pub matched_business_domains: Vec<MatchedDomain>,
    pub matched_technical_domains: Vec<MatchedDomain>,

    pub utility_score: f64,
    pub score_breakdown: ScoreBreakdown,
}
