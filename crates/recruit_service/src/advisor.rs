//! Constraint advisor (C9, spec.md §4.9).
//!
//! Runs only when the main search's `totalCount` falls below
//! `advisorThreshold`. Decomposes the effective constraint set into
//! [`TestableConstraint`]s, searches for minimal conflict sets with a
//! QuickXPlain-style divide and conquer, generates per-constraint
//! relaxation suggestions, and attaches a data-aware (and optionally
//! LLM-assisted) explanation per conflict.

use crate::query_builder::{self, FilterPlan, PropertyPredicate, SkillBucket};
use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use recruit_config::{AdvisorConfig, SeniorityTable};
use recruit_graph::EngineerGraphSource;
use recruit_types::{
    Advice, AppliedFilter, ComparisonOperator, ConflictExplanation, ConstraintOrigin,
    ConstraintStatistics, CypherFragment, ExpandedCriteria, FieldType, MinimalConflictSet,
    ProficiencyLevel, RelaxationKind, RelaxationSuggestion, ScalarValue, SeniorityLevel,
    StartTimeline, TestableConstraint,
};

/// External LLM contract (spec.md §6): a single completion call that
/// degrades to `None` on failure, timeout, or absence.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate_completion(&self, prompt: &str, system_prompt: Option<&str>) -> Option<String>;
}

/// Always unavailable — the default when no LLM is configured.
pub struct NoopLlmClient;

#[async_trait]
impl LlmClient for NoopLlmClient {
    async fn generate_completion(&self, _prompt: &str, _system_prompt: Option<&str>) -> Option<String> {
        None
    }
}

/// Splits every `appliedFilters` entry into one or more [`TestableConstraint`]s
/// (spec.md §4.9 "Decomposition"). Required business/technical domain
/// filters are deliberately NOT decomposed: the dispatch table names no
/// relaxation shape for them (same treatment as `yearsExperience`, which
/// the spec explicitly calls "skipped, no corresponding API field").
pub fn decompose(criteria: &ExpandedCriteria) -> Vec<TestableConstraint> {
    let mut constraints = Vec::new();

    for filter in &criteria.applied_filters {
        match filter {
            AppliedFilter::PropertyFilter { field, operator, value, .. } => {
                if field.starts_with("businessDomain:") || field.starts_with("technicalDomain:") {
                    continue;
                }
                decompose_property(field, *operator, value, &mut constraints);
            }
            AppliedFilter::SkillFilter { skills, source, rule_id, .. } => {
                let origin = match source {
                    recruit_types::FilterSource::Inference => ConstraintOrigin::Derived,
                    _ => ConstraintOrigin::User,
                };
                let id = match (origin, rule_id) {
                    (ConstraintOrigin::Derived, Some(rule)) => format!("derived_{rule}"),
                    _ => format!("user_skill_{}", constraints.len()),
                };
                let min_proficiency = match origin {
                    ConstraintOrigin::Derived => None,
                    ConstraintOrigin::User => criteria
                        .resolved_required_skills
                        .iter()
                        .find(|req| req.expanded_skill_ids == *skills)
                        .map(|req| req.min_proficiency),
                };
                constraints.push(TestableConstraint::SkillTraversalConstraint {
                    id,
                    origin,
                    skill_ids: skills.clone(),
                    rule_id: rule_id.clone(),
                    min_proficiency,
                });
            }
        }
    }

    constraints
}

fn decompose_property(
    field: &str,
    operator: ComparisonOperator,
    value: &ScalarValue,
    out: &mut Vec<TestableConstraint>,
) {
    let field_type = match field {
        "yearsExperience" => FieldType::Numeric,
        "startTimeline" | "timezone" | "salary" => {
            if field == "salary" {
                FieldType::Numeric
            } else {
                FieldType::StringArray
            }
        }
        _ => FieldType::String,
    };

    match (operator, value) {
        (ComparisonOperator::Between, ScalarValue::TextList(bounds)) if bounds.len() == 2 => {
            let min: f64 = bounds[0].parse().unwrap_or(0.0);
            let max: f64 = bounds[1].parse().unwrap_or(0.0);
            out.push(property_constraint(
                format!("{field}_gte"),
                FieldType::Numeric,
                field,
                ComparisonOperator::Gte,
                ScalarValue::Number(min),
            ));
            out.push(property_constraint(
                format!("{field}_lt"),
                FieldType::Numeric,
                field,
                ComparisonOperator::Lt,
                ScalarValue::Number(max),
            ));
        }
        (ComparisonOperator::StartsWithAny, ScalarValue::TextList(prefixes)) => {
            for (i, prefix) in prefixes.iter().enumerate() {
                out.push(property_constraint(
                    format!("{field}_prefix_{i}"),
                    field_type,
                    field,
                    ComparisonOperator::StartsWithAny,
                    ScalarValue::Text(prefix.clone()),
                ));
            }
        }
        _ => {
            out.push(property_constraint(field.to_string(), field_type, field, operator, value.clone()));
        }
    }
}

fn render_operator(operator: ComparisonOperator, field: &str, param: &str) -> String {
    match operator {
        ComparisonOperator::Gte => format!("engineer.{field} >= ${param}"),
        ComparisonOperator::Lte => format!("engineer.{field} <= ${param}"),
        ComparisonOperator::Lt => format!("engineer.{field} < ${param}"),
        ComparisonOperator::In => format!("engineer.{field} IN ${param}"),
        ComparisonOperator::Between => {
            format!("engineer.{field} >= ${param}[0] AND engineer.{field} < ${param}[1]")
        }
        ComparisonOperator::StartsWithAny => format!("engineer.{field} STARTS WITH ${param}"),
    }
}

fn property_constraint(
    id: String,
    field_type: FieldType,
    field: &str,
    operator: ComparisonOperator,
    value: ScalarValue,
) -> TestableConstraint {
    let param_name = format!("{id}_param");
    TestableConstraint::PropertyConstraint {
        id,
        field_type,
        cypher: CypherFragment {
            clause: render_operator(operator, field, &param_name),
            param_name,
            param_value: value.clone(),
        },
        field: field.to_string(),
        operator,
        value,
    }
}

/// Builds the [`FilterPlan`] the reference evaluator runs for a given
/// subset of testable constraints, holding the never-decomposed required
/// domain filters fixed (they are not under the advisor's control).
///
/// Sibling timezone-prefix constraints (spec.md §4.9: "Timezone constraints
/// arising from a single STARTS WITH (any of) are combined with OR when
/// they're both in the active set") are re-joined into one `StartsWithAny`
/// predicate over every prefix still present, rather than left as separate
/// predicates that [`query_builder::matches`] would otherwise AND together.
fn plan_for(constraints: &[TestableConstraint], criteria: &ExpandedCriteria) -> FilterPlan {
    let mut property_predicates = Vec::new();
    let mut skill_buckets = Vec::new();
    let mut derived_required_skill_ids = Vec::new();
    let mut timezone_prefixes = Vec::new();

    for constraint in constraints {
        match constraint {
            TestableConstraint::PropertyConstraint { field, operator, value, .. } => {
                if field == "timezone" && *operator == ComparisonOperator::StartsWithAny {
                    match value {
                        ScalarValue::Text(prefix) => timezone_prefixes.push(prefix.clone()),
                        ScalarValue::TextList(prefixes) => timezone_prefixes.extend(prefixes.iter().cloned()),
                        ScalarValue::Number(_) => {}
                    }
                    continue;
                }
                property_predicates.push(PropertyPredicate {
                    field: field.clone(),
                    operator: *operator,
                    value: value.clone(),
                });
            }
            TestableConstraint::SkillTraversalConstraint { skill_ids, min_proficiency, .. } => {
                match min_proficiency {
                    Some(p) => skill_buckets.push(SkillBucket {
                        expanded_skill_ids: skill_ids.clone(),
                        min_proficiency: *p,
                    }),
                    None => derived_required_skill_ids.extend(skill_ids.iter().cloned()),
                }
            }
        }
    }

    if !timezone_prefixes.is_empty() {
        property_predicates.push(PropertyPredicate {
            field: "timezone".to_string(),
            operator: ComparisonOperator::StartsWithAny,
            value: ScalarValue::TextList(timezone_prefixes),
        });
    }

    FilterPlan {
        property_predicates,
        skill_buckets,
        derived_required_skill_ids,
        required_business_domains: criteria.resolved_required_business_domains.clone(),
        required_technical_domains: criteria.resolved_required_technical_domains.clone(),
        order_by_skill_count: false,
        limit: u32::MAX,
        offset: 0,
    }
}

async fn count_constraints(
    constraints: &[TestableConstraint],
    criteria: &ExpandedCriteria,
    source: &dyn EngineerGraphSource,
) -> usize {
    query_builder::count(&plan_for(constraints, criteria), source).await
}

fn constraint_id_key(constraints: &[TestableConstraint]) -> Vec<&str> {
    let mut ids: Vec<&str> = constraints.iter().map(|c| c.id()).collect();
    ids.sort_unstable();
    ids
}

/// QuickXPlain (Junker 2004): finds one minimal subset of `c` that, joined
/// with the always-present `b`, is inconsistent — assuming `b` alone is
/// consistent and `b ∪ c` is inconsistent. Ties among same-size splits are
/// broken by constraint id lexicographic order (spec.md §5 "Ordering
/// guarantees"), which the caller already guarantees by sorting `c` once
/// up front.
fn quickxplain<'a>(
    background: Vec<TestableConstraint>,
    delta_nonempty: bool,
    candidates: Vec<TestableConstraint>,
    criteria: &'a ExpandedCriteria,
    source: &'a dyn EngineerGraphSource,
    threshold: usize,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Vec<TestableConstraint>> + Send + 'a>> {
    Box::pin(async move {
        if delta_nonempty {
            let count = count_constraints(&background, criteria, source).await;
            if count < threshold {
                return Vec::new();
            }
        }
        if candidates.len() == 1 {
            return candidates;
        }

        let mid = candidates.len() / 2;
        let (c1, c2) = candidates.split_at(mid);
        let (c1, c2) = (c1.to_vec(), c2.to_vec());

        let mut b_plus_c1 = background.clone();
        b_plus_c1.extend(c1.iter().cloned());
        let d2 = quickxplain(b_plus_c1, true, c2, criteria, source, threshold).await;

        let mut b_plus_d2 = background;
        b_plus_d2.extend(d2.iter().cloned());
        let delta_nonempty = !d2.is_empty();
        let d1 = quickxplain(b_plus_d2, delta_nonempty, c1, criteria, source, threshold).await;

        let mut result = d1;
        result.extend(d2);
        result
    })
}

/// Finds up to `max_sets` minimal conflict sets by repeatedly running
/// QuickXPlain and then blocking the found set (spec.md §4.9 "Minimal
/// conflict sets"). Returns the sets plus the total number of count
/// queries issued (for `Advice.query_count`) and whether the search was
/// cut short (`AdvisorDegraded`, spec.md §7).
async fn find_conflict_sets(
    mut constraints: Vec<TestableConstraint>,
    criteria: &ExpandedCriteria,
    source: &dyn EngineerGraphSource,
    config: &AdvisorConfig,
    query_count: &mut usize,
) -> (Vec<MinimalConflictSet>, bool) {
    constraints.sort_by(|a, b| a.id().cmp(b.id()));

    let mut sets = Vec::new();
    let mut seen: AHashSet<Vec<String>> = AHashSet::new();
    let mut degraded = false;

    loop {
        if sets.len() >= config.max_conflict_sets {
            break;
        }
        if constraints.is_empty() {
            break;
        }

        *query_count += 1;
        let full_count = count_constraints(&constraints, criteria, source).await;
        if full_count >= config.insufficient_threshold {
            break;
        }

        let mcs = quickxplain(
            Vec::new(),
            false,
            constraints.clone(),
            criteria,
            source,
            config.insufficient_threshold,
        )
        .await;
        *query_count += mcs.len() * 2;

        if mcs.is_empty() {
            break;
        }

        let key: Vec<String> = constraint_id_key(&mcs).into_iter().map(str::to_string).collect();
        let mcs_ids: Vec<String> = mcs.iter().map(|c| c.id().to_string()).collect();

        *query_count += 1;
        let mcs_count = count_constraints(&mcs, criteria, source).await;

        if seen.insert(key) {
            sets.push(MinimalConflictSet {
                constraint_ids: mcs_ids,
                result_count: mcs_count,
            });
        }

        let mcs_set: AHashSet<&str> = mcs.iter().map(|c| c.id()).collect();
        constraints = constraints.into_iter().filter(|c| !mcs_set.contains(c.id())).collect();
        if constraints.is_empty() {
            break;
        }
    }

    if sets.len() >= config.max_conflict_sets {
        degraded = true;
    }

    (sets, degraded)
}

/// Generates a relaxation suggestion for one property constraint, per the
/// §4.9 dispatch table. `active` is the full constraint set the conflict
/// set was drawn from, used as the background against which the loosened
/// value is re-tested.
async fn relax_property(
    constraint_id: &str,
    field: &str,
    operator: ComparisonOperator,
    value: &ScalarValue,
    active: &[TestableConstraint],
    criteria: &ExpandedCriteria,
    source: &dyn EngineerGraphSource,
    query_count: &mut usize,
) -> Vec<RelaxationSuggestion> {
    let mut suggestions = Vec::new();
    let without_this: Vec<TestableConstraint> =
        active.iter().filter(|c| c.id() != constraint_id).cloned().collect();

    match field {
        "salary" => {
            if let ScalarValue::Number(n) = value {
                let new_value = n * 1.2;
                let mut replacement = without_this.clone();
                replacement.push(property_constraint(
                    constraint_id.to_string(),
                    FieldType::Numeric,
                    field,
                    operator,
                    ScalarValue::Number(new_value),
                ));
                *query_count += 1;
                let resulting = count_constraints(&replacement, criteria, source).await;
                suggestions.push(RelaxationSuggestion {
                    constraint_id: constraint_id.to_string(),
                    relaxation: RelaxationKind::PropertyLoosen {
                        api_field: "maxBudget".to_string(),
                        suggested_value: Some(ScalarValue::Number(new_value)),
                    },
                    resulting_matches: resulting,
                    description: format!("raise maxBudget to {new_value:.0}"),
                });
            }
        }
        "startTimeline" => {
            let current: AHashSet<String> = match value {
                ScalarValue::TextList(values) => values.iter().cloned().collect(),
                ScalarValue::Text(v) => std::iter::once(v.clone()).collect(),
                ScalarValue::Number(_) => AHashSet::new(),
            };
            for candidate in StartTimeline::ALL {
                let candidate_str = candidate.to_string();
                if current.contains(&candidate_str) {
                    continue;
                }
                let mut expanded = current.clone();
                expanded.insert(candidate_str.clone());
                let mut replacement = without_this.clone();
                replacement.push(property_constraint(
                    constraint_id.to_string(),
                    FieldType::StringArray,
                    field,
                    ComparisonOperator::In,
                    ScalarValue::TextList(expanded.into_iter().collect()),
                ));
                *query_count += 1;
                let resulting = count_constraints(&replacement, criteria, source).await;
                suggestions.push(RelaxationSuggestion {
                    constraint_id: constraint_id.to_string(),
                    relaxation: RelaxationKind::TimelineExpand { added_value: candidate_str.clone() },
                    resulting_matches: resulting,
                    description: format!("accept requiredMaxStartTime up to {candidate_str}"),
                });
            }
        }
        "timezone" => {
            // All timezone-prefix siblings came from one requiredTimezone
            // STARTS WITH (any of); "remove the timezone requirement" must
            // drop every prefix, not just the one the caller iterated to.
            let without_timezone: Vec<TestableConstraint> = active
                .iter()
                .filter(|c| !matches!(c, TestableConstraint::PropertyConstraint { field, .. } if field == "timezone"))
                .cloned()
                .collect();
            *query_count += 1;
            let resulting = count_constraints(&without_timezone, criteria, source).await;
            suggestions.push(RelaxationSuggestion {
                constraint_id: constraint_id.to_string(),
                relaxation: RelaxationKind::TimezoneRemove,
                resulting_matches: resulting,
                description: "remove the timezone requirement".to_string(),
            });
        }
        "yearsExperience" => {}
        _ => {}
    }

    suggestions
}

fn one_step_down(level: ProficiencyLevel) -> Option<ProficiencyLevel> {
    match level {
        ProficiencyLevel::Expert => Some(ProficiencyLevel::Proficient),
        ProficiencyLevel::Proficient => Some(ProficiencyLevel::Learning),
        ProficiencyLevel::Learning => None,
    }
}

async fn relax_skill(
    constraint_id: &str,
    skill_ids: &[recruit_types::SkillId],
    min_proficiency: Option<ProficiencyLevel>,
    origin: ConstraintOrigin,
    rule_id: &Option<String>,
    active: &[TestableConstraint],
    criteria: &ExpandedCriteria,
    source: &dyn EngineerGraphSource,
    query_count: &mut usize,
) -> Vec<RelaxationSuggestion> {
    let mut suggestions = Vec::new();
    let without_this: Vec<TestableConstraint> =
        active.iter().filter(|c| c.id() != constraint_id).cloned().collect();

    if origin == ConstraintOrigin::Derived {
        if let Some(rule) = rule_id {
            *query_count += 1;
            let resulting = count_constraints(&without_this, criteria, source).await;
            suggestions.push(RelaxationSuggestion {
                constraint_id: constraint_id.to_string(),
                relaxation: RelaxationKind::DerivedOverride {
                    rule_id: rule.clone(),
                    affected_constraints: vec![constraint_id.to_string()],
                },
                resulting_matches: resulting,
                description: format!("override rule {rule} to drop its derived requirement"),
            });
        }
        return suggestions;
    }

    if let Some(p) = min_proficiency {
        if let Some(lower) = one_step_down(p) {
            let mut replacement = without_this.clone();
            replacement.push(TestableConstraint::SkillTraversalConstraint {
                id: constraint_id.to_string(),
                origin,
                skill_ids: skill_ids.to_vec(),
                rule_id: rule_id.clone(),
                min_proficiency: Some(lower),
            });
            *query_count += 1;
            let resulting = count_constraints(&replacement, criteria, source).await;
            suggestions.push(RelaxationSuggestion {
                constraint_id: constraint_id.to_string(),
                relaxation: RelaxationKind::LowerProficiency {
                    skill_ids: skill_ids.iter().map(|s| s.as_str().to_string()).collect(),
                    new_min_proficiency: lower.to_string(),
                },
                resulting_matches: resulting,
                description: format!("lower required proficiency to {lower}"),
            });
        }
    }

    *query_count += 1;
    let resulting = count_constraints(&without_this, criteria, source).await;
    suggestions.push(RelaxationSuggestion {
        constraint_id: constraint_id.to_string(),
        relaxation: RelaxationKind::MoveToPreferred {
            skill_ids: skill_ids.iter().map(|s| s.as_str().to_string()).collect(),
        },
        resulting_matches: resulting,
        description: "move this skill requirement to preferred instead of required".to_string(),
    });

    suggestions.push(RelaxationSuggestion {
        constraint_id: constraint_id.to_string(),
        relaxation: RelaxationKind::RemoveConstraint,
        resulting_matches: resulting,
        description: "drop this skill requirement entirely".to_string(),
    });

    suggestions
}

async fn generate_relaxations(
    conflict_set: &[TestableConstraint],
    all_constraints: &[TestableConstraint],
    criteria: &ExpandedCriteria,
    source: &dyn EngineerGraphSource,
    baseline: usize,
    query_count: &mut usize,
) -> Vec<RelaxationSuggestion> {
    let mut suggestions = Vec::new();

    for constraint in conflict_set {
        match constraint {
            TestableConstraint::PropertyConstraint { id, field, operator, value, .. } => {
                suggestions.extend(
                    relax_property(id, field, *operator, value, all_constraints, criteria, source, query_count)
                        .await,
                );
            }
            TestableConstraint::SkillTraversalConstraint { id, origin, skill_ids, rule_id, min_proficiency } => {
                suggestions.extend(
                    relax_skill(
                        id,
                        skill_ids,
                        *min_proficiency,
                        *origin,
                        rule_id,
                        all_constraints,
                        criteria,
                        source,
                        query_count,
                    )
                    .await,
                );
            }
        }
    }

    suggestions.retain(|s| s.resulting_matches > baseline);
    suggestions.sort_by(|a, b| b.resulting_matches.cmp(&a.resulting_matches));
    suggestions
}

const SENIORITY_ORDER: [SeniorityLevel; 5] = [
    SeniorityLevel::Junior,
    SeniorityLevel::Mid,
    SeniorityLevel::Senior,
    SeniorityLevel::Staff,
    SeniorityLevel::Principal,
];

fn seniority_bucket(years: f64, table: &SeniorityTable) -> Option<SeniorityLevel> {
    SENIORITY_ORDER
        .iter()
        .copied()
        .find(|level| table.0.get(level).is_some_and(|range| range.contains(years)))
}

async fn build_statistics(
    conflict_set: &[TestableConstraint],
    all_constraints: &[TestableConstraint],
    criteria: &ExpandedCriteria,
    source: &dyn EngineerGraphSource,
    seniority_table: &SeniorityTable,
    query_count: &mut usize,
) -> ConstraintStatistics {
    let mut per_constraint_counts = AHashMap::default();
    for constraint in conflict_set {
        let singleton = std::slice::from_ref(constraint).to_vec();
        *query_count += 1;
        let count = count_constraints(&singleton, criteria, source).await;
        per_constraint_counts.insert(constraint.id().to_string(), count);
    }

    let engineers = source.all_engineers().await;

    let mut salaries: Vec<f64> = Vec::new();
    let mut experience_by_seniority_bucket: AHashMap<String, usize> = AHashMap::default();
    let mut timezones_by_zone: AHashMap<String, usize> = AHashMap::default();
    let mut timelines_by_enum: AHashMap<String, usize> = AHashMap::default();
    for engineer in &engineers {
        salaries.push(engineer.salary);
        if let Some(bucket) = seniority_bucket(engineer.years_experience, seniority_table) {
            *experience_by_seniority_bucket.entry(bucket.to_string()).or_insert(0) += 1;
        }
        *timezones_by_zone.entry(engineer.timezone.clone()).or_insert(0) += 1;
        *timelines_by_enum.entry(engineer.start_timeline.to_string()).or_insert(0) += 1;
    }
    let salary_min = salaries.iter().cloned().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.min(v)))
    });
    let salary_max = salaries.iter().cloned().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |a| a.max(v)))
    });

    let mut skills_at_or_below_requested_proficiency: AHashMap<String, usize> = AHashMap::default();
    for constraint in all_constraints {
        if let TestableConstraint::SkillTraversalConstraint {
            id,
            skill_ids,
            min_proficiency: Some(requested),
            ..
        } = constraint
        {
            let ids: AHashSet<_> = skill_ids.iter().collect();
            let mut count = 0usize;
            for engineer in &engineers {
                let qualifies = source
                    .skills_for(&engineer.id)
                    .await
                    .iter()
                    .any(|edge| ids.contains(&edge.skill_id) && edge.proficiency_level <= *requested);
                if qualifies {
                    count += 1;
                }
            }
            skills_at_or_below_requested_proficiency.insert(id.clone(), count);
        }
    }

    ConstraintStatistics {
        per_constraint_counts,
        salary_min,
        salary_max,
        experience_by_seniority_bucket,
        timezones_by_zone,
        timelines_by_enum,
        skills_at_or_below_requested_proficiency,
    }
}

fn data_aware_explanation(mcs: &MinimalConflictSet, stats: &ConstraintStatistics) -> String {
    let mut lines = vec![format!(
        "{} constraint(s) together leave only {} matching engineer(s):",
        mcs.constraint_ids.len(),
        mcs.result_count
    )];
    for id in &mcs.constraint_ids {
        if let Some(count) = stats.per_constraint_counts.get(id) {
            lines.push(format!("  - {id} alone matches {count} engineer(s)"));
        }
    }
    if let (Some(min), Some(max)) = (stats.salary_min, stats.salary_max) {
        lines.push(format!("available salaries range {min:.0}-{max:.0}"));
    }
    lines.join("\n")
}

/// Result of [`advise`]: the advisor output plus whether the MCS search
/// hit `maxSets` before exhausting the space (`AdvisorDegraded`, spec.md §7).
pub struct AdvisorOutcome {
    pub advice: Advice,
    pub degraded: bool,
}

/// Runs the full constraint-advisor pipeline (spec.md §4.9). Only call
/// when `totalCount < advisorThreshold` — see [`crate::orchestrator`].
pub async fn advise(
    criteria: &ExpandedCriteria,
    total_count: usize,
    config: &AdvisorConfig,
    seniority_table: &SeniorityTable,
    source: &dyn EngineerGraphSource,
    llm: Option<&dyn LlmClient>,
) -> AdvisorOutcome {
    let constraints = decompose(criteria);
    let mut query_count = 0usize;

    let (conflict_sets, degraded) =
        find_conflict_sets(constraints.clone(), criteria, source, config, &mut query_count).await;

    let mut relaxation_suggestions = Vec::new();
    let mut explanations = Vec::new();

    for mcs in &conflict_sets {
        let members: Vec<TestableConstraint> = constraints
            .iter()
            .filter(|c| mcs.constraint_ids.contains(&c.id().to_string()))
            .cloned()
            .collect();

        relaxation_suggestions.extend(
            generate_relaxations(&members, &constraints, criteria, source, total_count, &mut query_count).await,
        );

        let stats =
            build_statistics(&members, &constraints, criteria, source, seniority_table, &mut query_count).await;
        let data_aware = data_aware_explanation(mcs, &stats);
        let llm_explanation = match llm {
            Some(client) => {
                let prompt = format!(
                    "Explain why this search returns few results given: {data_aware}"
                );
                client.generate_completion(&prompt, Some("You are a hiring search assistant.")).await
            }
            None => None,
        };

        explanations.push(ConflictExplanation {
            conflict_set: mcs.clone(),
            data_aware_explanation: data_aware,
            llm_explanation,
            statistics: stats,
        });
    }

    relaxation_suggestions.sort_by(|a, b| b.resulting_matches.cmp(&a.resulting_matches));

    AdvisorOutcome {
        advice: Advice {
            testable_constraints: constraints,
            conflict_sets,
            relaxation_suggestions,
            explanations,
            query_count,
        },
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_graph::MemoryGraphStore;
    use recruit_types::{EngineerSkillEdge, FilterSource, SkillId, StartTimeline};

    fn engineer(id: &str, years: f64, salary: f64) -> recruit_types::Engineer {
        recruit_types::Engineer {
            id: recruit_types::EngineerId::new(id),
            name: id.to_string(),
            headline: String::new(),
            years_experience: years,
            timezone: "America/New_York".to_string(),
            salary,
            start_timeline: StartTimeline::Immediate,
            embedding: None,
        }
    }

    #[test]
    fn decompose_splits_between_into_gte_and_lt() {
        let mut criteria = ExpandedCriteria::default();
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: "yearsExperience".to_string(),
            operator: ComparisonOperator::Between,
            value: ScalarValue::TextList(vec!["6".to_string(), "10".to_string()]),
            source: FilterSource::KnowledgeBase,
        });
        let constraints = decompose(&criteria);
        assert_eq!(constraints.len(), 2);
        assert!(constraints.iter().any(|c| c.id() == "yearsExperience_gte"));
        assert!(constraints.iter().any(|c| c.id() == "yearsExperience_lt"));
    }

    #[test]
    fn decompose_splits_timezone_prefixes_per_value() {
        let mut criteria = ExpandedCriteria::default();
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: "timezone".to_string(),
            operator: ComparisonOperator::StartsWithAny,
            value: ScalarValue::TextList(vec!["America/".to_string(), "Europe/".to_string()]),
            source: FilterSource::User,
        });
        let constraints = decompose(&criteria);
        assert_eq!(constraints.len(), 2);
    }

    #[test]
    fn decompose_skips_domain_filters() {
        let mut criteria = ExpandedCriteria::default();
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: "businessDomain:dom_fintech".to_string(),
            operator: ComparisonOperator::Gte,
            value: ScalarValue::Number(1.0),
            source: FilterSource::User,
        });
        assert!(decompose(&criteria).is_empty());
    }

    #[tokio::test]
    async fn tight_budget_and_timezone_produce_a_conflict_set() {
        let mut store = MemoryGraphStore::new();
        store.add_engineer(engineer("eng_a", 5.0, 150_000.0), vec![], vec![], vec![]);
        store.add_engineer(engineer("eng_b", 5.0, 160_000.0), vec![], vec![], vec![]);

        let mut criteria = ExpandedCriteria::default();
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: "salary".to_string(),
            operator: ComparisonOperator::Lte,
            value: ScalarValue::Number(100_000.0),
            source: FilterSource::User,
        });
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: "timezone".to_string(),
            operator: ComparisonOperator::StartsWithAny,
            value: ScalarValue::TextList(vec!["Asia/".to_string()]),
            source: FilterSource::User,
        });

        let config = AdvisorConfig::default();
        let seniority_table = SeniorityTable::default();
        let outcome = advise(&criteria, 0, &config, &seniority_table, &store, None).await;

        assert!(!outcome.advice.conflict_sets.is_empty());
        assert!(outcome
            .advice
            .relaxation_suggestions
            .iter()
            .any(|s| matches!(s.relaxation, RelaxationKind::TimezoneRemove)));
        assert!(outcome
            .advice
            .relaxation_suggestions
            .iter()
            .any(|s| matches!(s.relaxation, RelaxationKind::PropertyLoosen { .. })));
    }

    #[tokio::test]
    async fn consistent_constraint_set_yields_no_conflicts() {
        let mut store = MemoryGraphStore::new();
        for i in 0..5 {
            store.add_engineer(
                engineer(&format!("eng_{i}"), 5.0, 100_000.0),
                vec![EngineerSkillEdge {
                    skill_id: SkillId::new("skill_python"),
                    proficiency_level: ProficiencyLevel::Expert,
                    confidence_score: 0.9,
                    years_used: 4.0,
                }],
                vec![],
                vec![],
            );
        }

        let criteria = ExpandedCriteria::default();
        let config = AdvisorConfig::default();
        let seniority_table = SeniorityTable::default();
        let outcome = advise(&criteria, 5, &config, &seniority_table, &store, None).await;
        assert!(outcome.advice.conflict_sets.is_empty());
    }

    /// Two timezone-prefix constraints (`America/`, `Europe/`) originate
    /// from one requiredTimezone STARTS WITH (any of) and must be OR'd back
    /// together when re-tested, not ANDed into an unsatisfiable pair.
    #[tokio::test]
    async fn multi_prefix_timezone_constraints_are_recombined_with_or() {
        let mut store = MemoryGraphStore::new();
        let mut america = engineer("eng_ny", 5.0, 100_000.0);
        america.timezone = "America/New_York".to_string();
        let mut europe = engineer("eng_berlin", 5.0, 100_000.0);
        europe.timezone = "Europe/Berlin".to_string();
        store.add_engineer(america, vec![], vec![], vec![]);
        store.add_engineer(europe, vec![], vec![], vec![]);

        let mut criteria = ExpandedCriteria::default();
        criteria.applied_filters.push(AppliedFilter::PropertyFilter {
            field: "timezone".to_string(),
            operator: ComparisonOperator::StartsWithAny,
            value: ScalarValue::TextList(vec!["America/".to_string(), "Europe/".to_string()]),
            source: FilterSource::User,
        });

        let constraints = decompose(&criteria);
        assert_eq!(constraints.len(), 2);
        let count = count_constraints(&constraints, &criteria, &store).await;
        assert_eq!(count, 2, "ANDing the prefixes would wrongly yield 0 matches");
    }
}
