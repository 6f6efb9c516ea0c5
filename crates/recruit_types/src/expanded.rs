//! Output of the constraint expander (C3) and inference engine (C4):
//! [`ExpandedCriteria`], the resolved requirement types, and
//! [`DerivedConstraint`] (spec.md §3, §4.3, §4.4).

use crate::{AppliedFilter, AppliedPreference, DomainId, ProficiencyLevel, SkillId, TeamFocus};
use ahash::{AHashMap, AHashSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One user-requested skill, fully expanded (spec.md §4.1).
///
/// Invariant: an engineer satisfies this requirement iff they possess any
/// skill in `expanded_skill_ids` at proficiency >= `min_proficiency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSkillRequirement {
    pub original_identifier: String,
    pub original_skill_id: Option<SkillId>,
    pub original_skill_name: Option<String>,
    pub expanded_skill_ids: Vec<SkillId>,
    pub skill_id_to_name: AHashMap<SkillId, String>,
    pub min_proficiency: ProficiencyLevel,
    pub preferred_min_proficiency: Option<ProficiencyLevel>,
}

impl ResolvedSkillRequirement {
    /// `direct` iff `id_or_name` equals the original user identifier, by id
    /// (exact) or by name (case-sensitive, as stored) — spec.md §4.5 "Edge
    /// cases".
    pub fn is_direct_match(&self, skill_id: &SkillId, skill_name: &str) -> bool {
        if self.original_skill_id.as_ref() == Some(skill_id) {
            return true;
        }
        if let Some(name) = &self.original_skill_name {
            if name == skill_name {
                return true;
            }
        }
        self.original_identifier == skill_id.as_str() || self.original_identifier == skill_name
    }
}

/// Identical shape for business and technical domains; `kind` distinguishes
/// which hierarchy a given instance was resolved against at the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDomainRequirement {
    pub original_identifier: String,
    pub domain_id: Option<DomainId>,
    /// Always non-empty: includes self (spec.md §4.2).
    pub expanded_domain_ids: Vec<DomainId>,
    pub min_years: Option<f64>,
    pub preferred_min_years: Option<f64>,
}

pub type ResolvedBusinessDomain = ResolvedDomainRequirement;
pub type ResolvedTechnicalDomain = ResolvedDomainRequirement;

/// Effect of a fired inference rule (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DerivedEffect {
    Filter {
        #[serde(rename = "requiredSkillIds")]
        required_skill_ids: Vec<SkillId>,
    },
    Boost {
        #[serde(rename = "skillId")]
        skill_id: SkillId,
        #[serde(rename = "boostStrength")]
        boost_strength: f64,
    },
}

/// Record of a rule override applied to a [`DerivedConstraint`]
/// (spec.md §3 invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverrideScope {
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRecord {
    pub override_scope: OverrideScope,
}

/// One fired rule's effect, with provenance, honouring
/// `overriddenRuleIds` (spec.md §4.4, invariant 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivedConstraint {
    pub rule_id: String,
    pub rule_name: String,
    pub effect: DerivedEffect,
    /// Ids of conditions that matched, plus ids of any upstream derived
    /// constraint this one's firing depended on.
    pub provenance: Vec<String>,
    pub overridden: Option<OverrideRecord>,
}

impl DerivedConstraint {
    /// Whether this constraint still contributes to filtering/boosting —
    /// `false` once overridden (spec.md §3 invariant 4).
    pub fn is_active(&self) -> bool {
        self.overridden.is_none()
    }
}

/// Output of the constraint expander (C3): everything the query builder and
/// utility calculator need, plus the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedCriteria {
    pub min_years_experience: Option<f64>,
    pub max_years_experience: Option<f64>,

    pub timezone_prefixes: Vec<String>,
    pub preferred_timezone_prefixes: Vec<String>,

    pub start_timelines: Vec<crate::StartTimeline>,
    pub preferred_max_start_time: Option<crate::StartTimeline>,
    pub required_max_start_time: Option<crate::StartTimeline>,

    pub max_budget: Option<f64>,
    pub stretch_budget: Option<f64>,
    pub budget_ceiling: Option<f64>,

    pub team_focus: Option<TeamFocus>,
    pub aligned_skill_ids: Vec<SkillId>,

    pub preferred_seniority_level: Option<crate::SeniorityLevel>,

    pub limit: u32,
    pub offset: u32,

    pub resolved_required_skills: Vec<ResolvedSkillRequirement>,
    pub resolved_preferred_skills: Vec<ResolvedSkillRequirement>,
    pub resolved_required_business_domains: Vec<ResolvedBusinessDomain>,
    pub resolved_preferred_business_domains: Vec<ResolvedBusinessDomain>,
    pub resolved_required_technical_domains: Vec<ResolvedTechnicalDomain>,
    pub resolved_preferred_technical_domains: Vec<ResolvedTechnicalDomain>,

    pub derived_constraints: Vec<DerivedConstraint>,
    pub derived_required_skill_ids: Vec<SkillId>,
    pub derived_skill_boosts: AHashMap<SkillId, f64>,

    pub overridden_rule_ids: AHashSet<String>,

    pub applied_filters: Vec<AppliedFilter>,
    pub applied_preferences: Vec<AppliedPreference>,
    pub defaults_applied: Vec<String>,

    pub inference_warning: bool,
}
