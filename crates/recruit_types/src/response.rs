//! Orchestrator output (C8), advisor output (C9), and the similarity
//! response shapes (C10) — spec.md §4.8, §4.9, §6.

use crate::{
    DerivedConstraint, DomainId, EngineerId, EngineerMatch, ScalarValue, TestableConstraint,
};
use ahash::AHashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    pub execution_time_ms: u64,
    pub candidates_before_diversity: Option<usize>,
    /// Set when C4's fixpoint loop hit `maxIterations` (InferenceWarning, §7).
    pub inference_warning: bool,
    /// Set when the advisor's MCS search hit `maxSets` (AdvisorDegraded, §7).
    pub advisor_degraded: bool,
}

/// A minimal conflict set: an inconsistent, minimal subset of the active
/// constraint set (spec.md §4.9, glossary "MCS").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinimalConflictSet {
    pub constraint_ids: Vec<String>,
    pub result_count: usize,
}

/// Relaxation kinds emitted for skill constraints (spec.md §4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelaxationKind {
    PropertyLoosen {
        #[serde(rename = "apiField")]
        api_field: String,
        #[serde(rename = "suggestedValue")]
        suggested_value: Option<ScalarValue>,
    },
    TimelineExpand {
        #[serde(rename = "addedValue")]
        added_value: String,
    },
    TimezoneRemove,
    LowerProficiency {
        #[serde(rename = "skillIds")]
        skill_ids: Vec<String>,
        #[serde(rename = "newMinProficiency")]
        new_min_proficiency: String,
    },
    MoveToPreferred {
        #[serde(rename = "skillIds")]
        skill_ids: Vec<String>,
    },
    RemoveConstraint,
    DerivedOverride {
        #[serde(rename = "ruleId")]
        rule_id: String,
        #[serde(rename = "affectedConstraints")]
        affected_constraints: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelaxationSuggestion {
    pub constraint_id: String,
    pub relaxation: RelaxationKind,
    pub resulting_matches: usize,
    pub description: String,
}

/// Aggregate statistics backing the data-aware explanation template
/// (spec.md §4.9). `per_constraint_counts`/`salary_min`/`salary_max` are
/// joined by the four DB distributions the spec names: experience by
/// seniority bucket, timezones by zone, timelines by enum, and skill
/// constraints at/below their requested proficiency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintStatistics {
    pub per_constraint_counts: AHashMap<String, usize>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    /// Seniority level name (`"senior"`, ...) -> count of engineers in the
    /// pool whose years fall in that bucket.
    pub experience_by_seniority_bucket: AHashMap<String, usize>,
    /// Exact timezone string -> count of engineers in that zone.
    pub timezones_by_zone: AHashMap<String, usize>,
    /// `startTimeline` enum value -> count of engineers at that timeline.
    pub timelines_by_enum: AHashMap<String, usize>,
    /// Skill-constraint id -> count of engineers holding one of its skills
    /// at or below the constraint's requested minimum proficiency.
    pub skills_at_or_below_requested_proficiency: AHashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConflictExplanation {
    pub conflict_set: MinimalConflictSet,
    pub data_aware_explanation: String,
    pub llm_explanation: Option<String>,
    pub statistics: ConstraintStatistics,
}

/// Full constraint-advisor output (C9).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
    pub testable_constraints: Vec<TestableConstraint>,
    pub conflict_sets: Vec<MinimalConflictSet>,
    pub relaxation_suggestions: Vec<RelaxationSuggestion>,
    pub explanations: Vec<ConflictExplanation>,
    pub query_count: usize,
}

/// Response of `POST /search/filter` and the filter half of
/// `POST /search/filter-similarity` (spec.md §4.8, §6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub matches: Vec<EngineerMatch>,
    pub total_count: usize,
    pub applied_filters: Vec<crate::AppliedFilter>,
    pub applied_preferences: Vec<crate::AppliedPreference>,
    pub defaults_applied: Vec<String>,
    pub derived_constraints: Vec<DerivedConstraint>,
    pub overridden_rule_ids: Vec<String>,
    pub query_metadata: QueryMetadata,
    pub advice: Option<Advice>,
}

/// Per-attribute similarity subscores (C10).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimilarityBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub domain: f64,
    pub timezone: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarEngineer {
    pub engineer: EngineerId,
    pub similarity_score: f64,
    pub breakdown: SimilarityBreakdown,
    pub shared_skills: Vec<String>,
    pub correlated_skills: Vec<String>,
}

/// Response of `GET /engineers/:id/similar` (spec.md §6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResponse {
    pub target: Option<EngineerId>,
    pub similar: Vec<SimilarEngineer>,
    pub query_metadata: QueryMetadata,
}

/// A domain graph node shape used by the similarity engine's domain loader
/// (spec.md §4.10 `loadDomainGraph`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainGraphNode {
    pub domain_id: DomainId,
    pub parent_id: Option<DomainId>,
    pub encompassed_by: Option<String>,
}
