//! `SearchRequest` and its nested requirement structures (spec.md §3).

use crate::{ProficiencyLevel, SeniorityLevel, StartTimeline, TeamFocus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry of `requiredSkills`/`preferredSkills`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequirement {
    /// A skill id or name, as typed by the hiring manager.
    pub skill: String,
    pub min_proficiency: Option<ProficiencyLevel>,
    pub preferred_min_proficiency: Option<ProficiencyLevel>,
    pub min_years: Option<f64>,
}

/// One entry of `requiredBusinessDomains`/`requiredTechnicalDomains`/their
/// preferred counterparts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainRequirement {
    pub domain: String,
    pub min_years: Option<f64>,
    pub preferred_min_years: Option<f64>,
}

/// Input to `POST /search/filter` and the filter half of
/// `POST /search/filter-similarity`. Every field is optional; an empty
/// request is a pure browse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub required_skills: Option<Vec<SkillRequirement>>,
    pub preferred_skills: Option<Vec<SkillRequirement>>,

    pub required_business_domains: Option<Vec<DomainRequirement>>,
    pub preferred_business_domains: Option<Vec<DomainRequirement>>,
    pub required_technical_domains: Option<Vec<DomainRequirement>>,
    pub preferred_technical_domains: Option<Vec<DomainRequirement>>,

    pub required_seniority_level: Option<SeniorityLevel>,
    pub preferred_seniority_level: Option<SeniorityLevel>,

    /// Wildcard (`"America/*"`) or concrete (`"America/New_York"`) zones.
    pub required_timezone: Option<Vec<String>>,
    pub preferred_timezone: Option<Vec<String>>,

    pub max_budget: Option<f64>,
    pub stretch_budget: Option<f64>,

    pub required_max_start_time: Option<StartTimeline>,
    pub preferred_max_start_time: Option<StartTimeline>,

    pub team_focus: Option<TeamFocus>,

    pub limit: Option<u32>,
    pub offset: Option<u32>,

    /// Rule ids to exclude from filtering/boosting (spec.md §3 invariant 4).
    pub overridden_rule_ids: Option<Vec<String>>,
}

/// Validation failure detail, one entry per violated rule (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl SearchRequest {
    /// Applies the validation rules in spec.md §6. Does not mutate the
    /// request; callers run this before `ConstraintExpander::expand`.
    pub fn validate(&self) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if let (Some(stretch), None) = (self.stretch_budget, self.max_budget) {
            issues.push(ValidationIssue {
                field: "stretchBudget".into(),
                message: "stretchBudget requires maxBudget to be set".into(),
            });
            let _ = stretch;
        }
        if let (Some(stretch), Some(max)) = (self.stretch_budget, self.max_budget) {
            if stretch < max {
                issues.push(ValidationIssue {
                    field: "stretchBudget".into(),
                    message: "stretchBudget must be >= maxBudget".into(),
                });
            }
        }

        if let (Some(preferred), Some(required)) =
            (self.preferred_max_start_time, self.required_max_start_time)
        {
            if preferred > required {
                issues.push(ValidationIssue {
                    field: "preferredMaxStartTime".into(),
                    message: "preferredMaxStartTime must not be later than requiredMaxStartTime"
                        .into(),
                });
            }
        }

        if let Some(limit) = self.limit {
            if limit > 100 {
                issues.push(ValidationIssue {
                    field: "limit".into(),
                    message: "limit must be between 0 and 100".into(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretch_budget_requires_max_budget() {
        let req = SearchRequest {
            stretch_budget: Some(100.0),
            ..Default::default()
        };
        let issues = req.validate().unwrap_err();
        assert_eq!(issues[0].field, "stretchBudget");
    }

    #[test]
    fn stretch_budget_must_not_undercut_max() {
        let req = SearchRequest {
            max_budget: Some(100.0),
            stretch_budget: Some(90.0),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn preferred_start_time_cannot_exceed_required() {
        let req = SearchRequest {
            required_max_start_time: Some(StartTimeline::TwoWeeks),
            preferred_max_start_time: Some(StartTimeline::OneMonth),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_request_is_valid() {
        assert!(SearchRequest::default().validate().is_ok());
    }
}
