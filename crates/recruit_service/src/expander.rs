//! Constraint expander (C3, spec.md §4.3) and its call into the inference
//! engine (C4, spec.md §4.4). Together these turn a [`SearchRequest`] into
//! an [`ExpandedCriteria`] — the only input every downstream stage reads.

use ahash::AHashSet;
use recruit_config::KnowledgeBaseConfig;
use recruit_graph::{flatten_skill_ids, DomainGraphSource, SkillGraphSource};
use recruit_rules::{Context, ContextValue, RuleEngine};
use recruit_types::{
    AppliedFilter, AppliedPreference, ComparisonOperator, DomainKind, ExpandedCriteria,
    FilterSource, ScalarValue, SearchRequest, StartTimeline,
};

/// Runs C1/C2 resolution, C3's deterministic normalisation, and C4's
/// fixpoint inference, in the order spec.md §4.8 requires.
pub async fn expand(
    request: &SearchRequest,
    config: &KnowledgeBaseConfig,
    skill_source: &dyn SkillGraphSource,
    domain_source: &dyn DomainGraphSource,
) -> ExpandedCriteria {
    let mut criteria = ExpandedCriteria::default();

    expand_seniority(request, config, &mut criteria);
    expand_start_timeline(request, &mut criteria);
    expand_timezone(request, &mut criteria);
    expand_budget(request, &mut criteria);
    expand_team_focus(request, config, &mut criteria);
    expand_pagination(request, config, &mut criteria);

    expand_skills(request, config, skill_source, &mut criteria).await;
    expand_domains(request, domain_source, &mut criteria).await;

    run_inference(request, config, &mut criteria);

    criteria
}

fn expand_seniority(request: &SearchRequest, config: &KnowledgeBaseConfig, criteria: &mut ExpandedCriteria) {
    criteria.preferred_seniority_level = request.preferred_seniority_level;

    let Some(level) = request.required_seniority_level else {
        return;
    };
    let Some(range) = config.seniority_table.0.get(&level) else {
        return;
    };
    criteria.min_years_experience = Some(range.min);
    criteria.max_years_experience = range.max;

    let operator = if range.max.is_some() {
        ComparisonOperator::Between
    } else {
        ComparisonOperator::Gte
    };
    let value = match range.max {
        Some(max) => ScalarValue::TextList(vec![range.min.to_string(), max.to_string()]),
        None => ScalarValue::Number(range.min),
    };
    criteria.applied_filters.push(AppliedFilter::PropertyFilter {
        field: "yearsExperience".to_string(),
        operator,
        value,
        source: FilterSource::KnowledgeBase,
    });
}

fn expand_start_timeline(request: &SearchRequest, criteria: &mut ExpandedCriteria) {
    let required_max = request.required_max_start_time.unwrap_or_else(|| {
        criteria.defaults_applied.push("requiredMaxStartTime".to_string());
        StartTimeline::OneYear
    });
    criteria.required_max_start_time = Some(required_max);
    criteria.start_timelines = required_max.up_to_inclusive();
    criteria.preferred_max_start_time = request.preferred_max_start_time;

    let source = if request.required_max_start_time.is_some() {
        FilterSource::User
    } else {
        FilterSource::KnowledgeBase
    };
    criteria.applied_filters.push(AppliedFilter::PropertyFilter {
        field: "startTimeline".to_string(),
        operator: ComparisonOperator::In,
        value: ScalarValue::TextList(
            criteria.start_timelines.iter().map(|t| t.to_string()).collect(),
        ),
        source,
    });
}

fn wildcard_to_prefix(zone: &str) -> String {
    zone.strip_suffix('*').map(str::to_string).unwrap_or_else(|| zone.to_string())
}

fn expand_timezone(request: &SearchRequest, criteria: &mut ExpandedCriteria) {
    if let Some(zones) = &request.required_timezone {
        criteria.timezone_prefixes = zones.iter().map(|z| wildcard_to_prefix(z)).collect();
        if !criteria.timezone_prefixes.is_empty() {
            criteria.applied_filters.push(AppliedFilter::PropertyFilter {
                field: "timezone".to_string(),
                operator: ComparisonOperator::StartsWithAny,
                value: ScalarValue::TextList(criteria.timezone_prefixes.clone()),
                source: FilterSource::User,
            });
        }
    }
    if let Some(zones) = &request.preferred_timezone {
        criteria.preferred_timezone_prefixes = zones.iter().map(|z| wildcard_to_prefix(z)).collect();
        if !criteria.preferred_timezone_prefixes.is_empty() {
            criteria.applied_preferences.push(AppliedPreference {
                field: "timezone".to_string(),
                description: format!("prefers {}", criteria.preferred_timezone_prefixes.join(", ")),
                source: FilterSource::User,
            });
        }
    }
}

fn expand_budget(request: &SearchRequest, criteria: &mut ExpandedCriteria) {
    criteria.max_budget = request.max_budget;
    criteria.stretch_budget = request.stretch_budget;
    criteria.budget_ceiling = request.stretch_budget.or(request.max_budget);

    if let Some(ceiling) = criteria.budget_ceiling {
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: "salary".to_string(),
            operator: ComparisonOperator::Lte,
            value: ScalarValue::Number(ceiling),
            source: FilterSource::User,
        });
    }
    if criteria.max_budget.is_some() {
        criteria.applied_preferences.push(AppliedPreference {
            field: "salary".to_string(),
            description: "budget match scored against maxBudget/stretchBudget".to_string(),
            source: FilterSource::User,
        });
    }
}

fn expand_team_focus(request: &SearchRequest, config: &KnowledgeBaseConfig, criteria: &mut ExpandedCriteria) {
    let Some(team_focus) = &request.team_focus else {
        return;
    };
    criteria.team_focus = Some(team_focus.clone());
    criteria.aligned_skill_ids = config
        .team_focus_alignments
        .get(team_focus)
        .cloned()
        .unwrap_or_default();
    if !criteria.aligned_skill_ids.is_empty() {
        criteria.applied_preferences.push(AppliedPreference {
            field: "teamFocus".to_string(),
            description: format!("aligned to {}", team_focus.as_str()),
            source: FilterSource::User,
        });
    }
}

fn expand_pagination(request: &SearchRequest, config: &KnowledgeBaseConfig, criteria: &mut ExpandedCriteria) {
    let limit = request.limit.unwrap_or_else(|| {
        criteria.defaults_applied.push("limit".to_string());
        config.default_pagination_limit
    });
    criteria.limit = limit.min(config.max_pagination_limit);
    criteria.offset = request.offset.unwrap_or(0);
}

async fn expand_skills(
    request: &SearchRequest,
    config: &KnowledgeBaseConfig,
    source: &dyn SkillGraphSource,
    criteria: &mut ExpandedCriteria,
) {
    if let Some(required) = &request.required_skills {
        let expansion =
            recruit_graph::expand_skill_requirements(required, config.default_min_proficiency, source)
                .await;
        for resolved in &expansion.resolved {
            criteria.applied_filters.push(AppliedFilter::SkillFilter {
                skills: resolved.expanded_skill_ids.clone(),
                display_value: resolved.original_identifier.clone(),
                source: FilterSource::User,
                rule_id: None,
            });
        }
        criteria.resolved_required_skills = expansion.resolved;
    }
    if let Some(preferred) = &request.preferred_skills {
        let expansion =
            recruit_graph::expand_skill_requirements(preferred, config.default_min_proficiency, source)
                .await;
        for resolved in &expansion.resolved {
            criteria.applied_preferences.push(AppliedPreference {
                field: "preferredSkills".to_string(),
                description: resolved.original_identifier.clone(),
                source: FilterSource::User,
            });
        }
        criteria.resolved_preferred_skills = expansion.resolved;
    }
}

async fn expand_domains(
    request: &SearchRequest,
    source: &dyn DomainGraphSource,
    criteria: &mut ExpandedCriteria,
) {
    if let Some(reqs) = &request.required_business_domains {
        criteria.resolved_required_business_domains =
            recruit_graph::expand_domain_requirements(reqs, DomainKind::Business, source)
                .await
                .resolved;
        log_required_domain_filters(&criteria.resolved_required_business_domains, "businessDomain", criteria);
    }
    if let Some(reqs) = &request.preferred_business_domains {
        criteria.resolved_preferred_business_domains =
            recruit_graph::expand_domain_requirements(reqs, DomainKind::Business, source)
                .await
                .resolved;
    }
    if let Some(reqs) = &request.required_technical_domains {
        criteria.resolved_required_technical_domains =
            recruit_graph::expand_domain_requirements(reqs, DomainKind::Technical, source)
                .await
                .resolved;
        log_required_domain_filters(&criteria.resolved_required_technical_domains, "technicalDomain", criteria);
    }
    if let Some(reqs) = &request.preferred_technical_domains {
        criteria.resolved_preferred_technical_domains =
            recruit_graph::expand_domain_requirements(reqs, DomainKind::Technical, source)
                .await
                .resolved;
    }
}

/// Logs one `appliedFilters` entry per required domain requirement
/// (invariant 5, spec.md §3) — not independently decomposable by the
/// advisor (C9's dispatch table names no domain relaxation shape), but
/// still a predicate the query enforces and must never be silently
/// omitted from the audit trail.
fn log_required_domain_filters(
    reqs: &[recruit_types::ResolvedDomainRequirement],
    field_prefix: &str,
    criteria: &mut ExpandedCriteria,
) {
    for req in reqs {
        let domain_id = req
            .domain_id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| req.original_identifier.clone());
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: format!("{field_prefix}:{domain_id}"),
            operator: ComparisonOperator::Gte,
            value: ScalarValue::Number(req.min_years.unwrap_or(0.0)),
            source: FilterSource::User,
        });
    }
}

fn run_inference(request: &SearchRequest, config: &KnowledgeBaseConfig, criteria: &mut ExpandedCriteria) {
    let mut context = Context::default();
    if let Some(team_focus) = &criteria.team_focus {
        context.set("teamFocus", ContextValue::Text(team_focus.as_str().to_string()), true);
    }
    if let Some(level) = request.required_seniority_level {
        context.set("requiredSeniorityLevel", ContextValue::Text(level.to_string()), true);
    }
    let required_skill_ids: Vec<String> = flatten_skill_ids(&criteria.resolved_required_skills)
        .into_iter()
        .map(|id| id.0)
        .collect();
    if !required_skill_ids.is_empty() {
        context.set("requiredSkillIds", ContextValue::TextList(required_skill_ids), true);
    }

    let overridden: AHashSet<String> = request
        .overridden_rule_ids
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();
    criteria.overridden_rule_ids = overridden.clone();

    let engine = match RuleEngine::new(&config.rules) {
        Ok(engine) => engine,
        Err(err) => {
            log::warn!("rule set rejected, skipping inference: {err}");
            return;
        }
    };
    let outcome = engine.run(context, &overridden, config.max_inference_iterations);

    criteria.derived_required_skill_ids = recruit_rules::derived_required_skill_ids(&outcome.derived_constraints);
    criteria.derived_skill_boosts = recruit_rules::derived_skill_boosts(&outcome.derived_constraints);
    criteria.inference_warning = outcome.warning;

    for constraint in &outcome.derived_constraints {
        if constraint.is_active() {
            if let recruit_types::DerivedEffect::Filter { required_skill_ids } = &constraint.effect {
                criteria.applied_filters.push(AppliedFilter::SkillFilter {
                    skills: required_skill_ids.clone(),
                    display_value: constraint.rule_name.clone(),
                    source: FilterSource::Inference,
                    rule_id: Some(constraint.rule_id.clone()),
                });
            }
        }
    }
    criteria.derived_constraints = outcome.derived_constraints;
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_graph::MemoryGraphStore;
    use recruit_types::SeniorityLevel;

    #[tokio::test]
    async fn senior_seniority_maps_to_expected_range() {
        let store = MemoryGraphStore::new();
        let config = KnowledgeBaseConfig::default();
        let request = SearchRequest {
            required_seniority_level: Some(SeniorityLevel::Senior),
            ..Default::default()
        };
        let criteria = expand(&request, &config, &store, &store).await;
        assert_eq!(criteria.min_years_experience, Some(6.0));
        assert_eq!(criteria.max_years_experience, Some(10.0));
        assert!(criteria.applied_filters.iter().any(|f| matches!(
            f,
            AppliedFilter::PropertyFilter { field, operator: ComparisonOperator::Between, .. }
                if field == "yearsExperience"
        )));
    }

    #[tokio::test]
    async fn timezone_wildcard_becomes_prefix() {
        let store = MemoryGraphStore::new();
        let config = KnowledgeBaseConfig::default();
        let request = SearchRequest {
            required_timezone: Some(vec!["America/*".to_string(), "Europe/*".to_string()]),
            ..Default::default()
        };
        let criteria = expand(&request, &config, &store, &store).await;
        assert_eq!(criteria.timezone_prefixes, vec!["America/", "Europe/"]);
    }

    #[tokio::test]
    async fn missing_limit_applies_default_and_records_it() {
        let store = MemoryGraphStore::new();
        let config = KnowledgeBaseConfig::default();
        let criteria = expand(&SearchRequest::default(), &config, &store, &store).await;
        assert_eq!(criteria.limit, config.default_pagination_limit);
        assert!(criteria.defaults_applied.contains(&"limit".to_string()));
    }
}
