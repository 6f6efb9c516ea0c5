//! Query builder (C5, spec.md §4.5).
//!
//! A live Cypher-speaking backend would take [`FilterPlan`] and render it
//! into the literal parameterised query text described by spec.md §6;
//! [`render_cypher`] does exactly that, for the audit trail and for
//! backends that want it. [`matches`]/[`execute`]/[`count`] are the
//! reference evaluator: they interpret the same plan directly against an
//! [`EngineerGraphSource`], so the in-memory backend and any future real
//! one are driven by identical predicate logic.

use ahash::AHashSet;
use recruit_graph::{EngineerGraphSource, GraphInt, ParamMap, ParamValue};
use recruit_types::{
    ComparisonOperator, Engineer, EngineerDomainEdge, EngineerSkillEdge, ExpandedCriteria,
    ProficiencyLevel, ResolvedDomainRequirement, ScalarValue, SkillId,
};

#[derive(Debug, Clone)]
pub struct PropertyPredicate {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: ScalarValue,
}

#[derive(Debug, Clone)]
pub struct SkillBucket {
    pub expanded_skill_ids: Vec<SkillId>,
    pub min_proficiency: ProficiencyLevel,
}

/// The "single parameterised graph query" of spec.md §4.5: every predicate
/// the main query, count query, and skill-filter count query enforce.
#[derive(Debug, Clone, Default)]
pub struct FilterPlan {
    pub property_predicates: Vec<PropertyPredicate>,
    pub skill_buckets: Vec<SkillBucket>,
    /// Existence-only: every id must be present at any proficiency, never
    /// counted toward the qualifying-skill ordering (spec.md §4.5 step 3).
    pub derived_required_skill_ids: Vec<SkillId>,
    pub required_business_domains: Vec<ResolvedDomainRequirement>,
    pub required_technical_domains: Vec<ResolvedDomainRequirement>,
    pub order_by_skill_count: bool,
    pub limit: u32,
    pub offset: u32,
}

pub fn build_filter_plan(criteria: &ExpandedCriteria) -> FilterPlan {
    let mut property_predicates = Vec::new();

    if let (Some(min), Some(max)) = (criteria.min_years_experience, criteria.max_years_experience) {
        property_predicates.push(PropertyPredicate {
            field: "yearsExperience".to_string(),
            operator: ComparisonOperator::Between,
            value: ScalarValue::TextList(vec![min.to_string(), max.to_string()]),
        });
    } else if let Some(min) = criteria.min_years_experience {
        property_predicates.push(PropertyPredicate {
            field: "yearsExperience".to_string(),
            operator: ComparisonOperator::Gte,
            value: ScalarValue::Number(min),
        });
    }

    if !criteria.start_timelines.is_empty() {
        property_predicates.push(PropertyPredicate {
            field: "startTimeline".to_string(),
            operator: ComparisonOperator::In,
            value: ScalarValue::TextList(
                criteria.start_timelines.iter().map(|t| t.to_string()).collect(),
            ),
        });
    }

    if !criteria.timezone_prefixes.is_empty() {
        property_predicates.push(PropertyPredicate {
            field: "timezone".to_string(),
            operator: ComparisonOperator::StartsWithAny,
            value: ScalarValue::TextList(criteria.timezone_prefixes.clone()),
        });
    }

    if let Some(ceiling) = criteria.budget_ceiling {
        property_predicates.push(PropertyPredicate {
            field: "salary".to_string(),
            operator: ComparisonOperator::Lte,
            value: ScalarValue::Number(ceiling),
        });
    }

    let skill_buckets = criteria
        .resolved_required_skills
        .iter()
        .map(|req| SkillBucket {
            expanded_skill_ids: req.expanded_skill_ids.clone(),
            min_proficiency: req.min_proficiency,
        })
        .collect();

    FilterPlan {
        property_predicates,
        skill_buckets,
        derived_required_skill_ids: criteria.derived_required_skill_ids.clone(),
        required_business_domains: criteria.resolved_required_business_domains.clone(),
        required_technical_domains: criteria.resolved_required_technical_domains.clone(),
        order_by_skill_count: !criteria.resolved_required_skills.is_empty(),
        limit: criteria.limit,
        offset: criteria.offset,
    }
}

/// A rendered query, matching the shape of the §6 graph contract: text plus
/// bound parameters.
#[derive(Debug, Clone)]
pub struct GraphQuery {
    pub cypher: String,
    pub params: ParamMap,
}

/// Renders `plan` into Cypher-shaped text for the audit trail. Never
/// rewrites the plan silently — a malformed predicate is a programming
/// error surfaced to the caller (spec.md §4.5 "Failure modes").
pub fn render_cypher(plan: &FilterPlan) -> crate::Result<GraphQuery> {
    let mut clauses = Vec::new();
    let mut params = ParamMap::default();

    for (i, predicate) in plan.property_predicates.iter().enumerate() {
        let param_name = format!("p{i}_{}", predicate.field);
        let clause = match predicate.operator {
            ComparisonOperator::Gte => format!("engineer.{} >= ${param_name}", predicate.field),
            ComparisonOperator::Lte => format!("engineer.{} <= ${param_name}", predicate.field),
            ComparisonOperator::Lt => format!("engineer.{} < ${param_name}", predicate.field),
            ComparisonOperator::In => format!("engineer.{} IN ${param_name}", predicate.field),
            ComparisonOperator::Between => {
                format!("engineer.{} >= ${param_name}[0] AND engineer.{} < ${param_name}[1]", predicate.field, predicate.field)
            }
            ComparisonOperator::StartsWithAny => {
                format!("any(p IN ${param_name} WHERE engineer.{} STARTS WITH p)", predicate.field)
            }
        };
        clauses.push(clause);
        params.insert(param_name, scalar_to_param(&predicate.value)?);
    }

    for (i, bucket) in plan.skill_buckets.iter().enumerate() {
        let skill_param = format!("skillBucket{i}");
        let expert_param = format!("expertIds{i}");
        let proficient_param = format!("proficientIds{i}");
        let learning_param = format!("learningIds{i}");

        let (expert_ids, proficient_ids, learning_ids) = partition_by_proficiency(bucket);

        clauses.push(format!(
            "exists((engineer)-[:HAS]->(us:UserSkill)-[:FOR]->(skill:Skill) WHERE skill.id IN ${skill_param} AND \
             CASE WHEN skill.id IN ${expert_param} THEN us.proficiencyLevel = 'expert' \
             WHEN skill.id IN ${proficient_param} THEN us.proficiencyLevel IN ['proficient', 'expert'] \
             WHEN skill.id IN ${learning_param} THEN true \
             ELSE false END)"
        ));
        params.insert(
            skill_param,
            ParamValue::TextList(bucket.expanded_skill_ids.iter().map(|s| s.0.clone()).collect()),
        );
        params.insert(expert_param, ParamValue::TextList(expert_ids));
        params.insert(proficient_param, ParamValue::TextList(proficient_ids));
        params.insert(learning_param, ParamValue::TextList(learning_ids));
    }

    if !plan.derived_required_skill_ids.is_empty() {
        params.insert(
            "derivedSkillIds".to_string(),
            ParamValue::TextList(plan.derived_required_skill_ids.iter().map(|s| s.0.clone()).collect()),
        );
        clauses.push("all(id IN $derivedSkillIds WHERE exists((engineer)-[:HAS]->(:UserSkill)-[:FOR]->(:Skill {id: id})))".to_string());
    }

    params.insert("limit".to_string(), ParamValue::Int64(GraphInt::from_i64(plan.limit as i64).to_number()));
    params.insert("offset".to_string(), ParamValue::Int64(GraphInt::from_i64(plan.offset as i64).to_number()));

    let order = if plan.order_by_skill_count {
        "ORDER BY qualifyingSkillCount DESC, engineer.yearsExperience DESC"
    } else {
        "ORDER BY engineer.yearsExperience DESC"
    };

    Ok(GraphQuery {
        cypher: format!(
            "MATCH (engineer:Engineer) WHERE {} {order} SKIP $offset LIMIT $limit",
            if clauses.is_empty() { "true".to_string() } else { clauses.join(" AND ") }
        ),
        params,
    })
}

/// Same predicate set as [`render_cypher`], used for the advisor's
/// `buildSearchCountQuery`/`buildSkillFilterCountQuery` (spec.md §4.5
/// "Auxiliary queries") — text only, `count(DISTINCT engineer)`.
pub fn render_count_cypher(plan: &FilterPlan) -> crate::Result<GraphQuery> {
    let mut query = render_cypher(plan)?;
    query.cypher = format!(
        "MATCH (engineer:Engineer) WHERE {} RETURN count(DISTINCT engineer) AS resultCount",
        query.cypher.splitn(2, "WHERE ").nth(1).unwrap_or("true").split(" ORDER BY").next().unwrap_or("true")
    );
    Ok(query)
}

/// Splits one bucket's expanded ids into the three proficiency buckets the
/// CASE expression above switches on (spec.md §4.5 step 2): every id in a
/// bucket shares that bucket's `min_proficiency`, so it lands wholly in one
/// of the three lists.
fn partition_by_proficiency(bucket: &SkillBucket) -> (Vec<String>, Vec<String>, Vec<String>) {
    let ids: Vec<String> = bucket.expanded_skill_ids.iter().map(|s| s.0.clone()).collect();
    match bucket.min_proficiency {
        ProficiencyLevel::Expert => (ids, Vec::new(), Vec::new()),
        ProficiencyLevel::Proficient => (Vec::new(), ids, Vec::new()),
        ProficiencyLevel::Learning => (Vec::new(), Vec::new(), ids),
    }
}

fn scalar_to_param(value: &ScalarValue) -> crate::Result<ParamValue> {
    match value {
        ScalarValue::Number(n) => Ok(ParamValue::Number(*n)),
        ScalarValue::Text(t) => Ok(ParamValue::Text(t.clone())),
        ScalarValue::TextList(list) => Ok(ParamValue::TextList(list.clone())),
    }
}

fn evaluate_property(engineer: &Engineer, predicate: &PropertyPredicate) -> bool {
    match predicate.field.as_str() {
        "yearsExperience" => match (&predicate.operator, &predicate.value) {
            (ComparisonOperator::Gte, ScalarValue::Number(min)) => engineer.years_experience >= *min,
            (ComparisonOperator::Lt, ScalarValue::Number(max)) => engineer.years_experience < *max,
            (ComparisonOperator::Between, ScalarValue::TextList(bounds)) if bounds.len() == 2 => {
                let min: f64 = bounds[0].parse().unwrap_or(f64::MIN);
                let max: f64 = bounds[1].parse().unwrap_or(f64::MAX);
                engineer.years_experience >= min && engineer.years_experience < max
            }
            _ => true,
        },
        "startTimeline" => match &predicate.value {
            ScalarValue::TextList(values) => values.iter().any(|v| *v == engineer.start_timeline.to_string()),
            ScalarValue::Text(value) => *value == engineer.start_timeline.to_string(),
            _ => true,
        },
        "timezone" => match &predicate.value {
            ScalarValue::TextList(prefixes) => prefixes.iter().any(|p| engineer.timezone.starts_with(p.as_str())),
            ScalarValue::Text(prefix) => engineer.timezone.starts_with(prefix.as_str()),
            _ => true,
        },
        "salary" => match (&predicate.operator, &predicate.value) {
            (ComparisonOperator::Lte, ScalarValue::Number(ceiling)) => engineer.salary <= *ceiling,
            (ComparisonOperator::Gte, ScalarValue::Number(floor)) => engineer.salary >= *floor,
            _ => true,
        },
        _ => true,
    }
}

fn evaluate_skill_bucket(bucket: &SkillBucket, skills: &[EngineerSkillEdge]) -> bool {
    let wanted: AHashSet<&SkillId> = bucket.expanded_skill_ids.iter().collect();
    skills
        .iter()
        .any(|edge| wanted.contains(&edge.skill_id) && edge.proficiency_level >= bucket.min_proficiency)
}

fn evaluate_derived(ids: &[SkillId], skills: &[EngineerSkillEdge]) -> bool {
    ids.iter()
        .all(|id| skills.iter().any(|edge| &edge.skill_id == id))
}

fn evaluate_domain_requirement(req: &ResolvedDomainRequirement, edges: &[EngineerDomainEdge]) -> bool {
    let expanded: AHashSet<_> = req.expanded_domain_ids.iter().collect();
    edges.iter().any(|edge| {
        expanded.contains(&edge.domain_id)
            && req.min_years.map(|min| edge.years >= min).unwrap_or(true)
    })
}

/// The per-engineer base predicate (everything except final ordering and
/// pagination, and excluding preferred-side evidence, which scores rather
/// than filters — spec.md §4.5 steps 1-4).
pub fn matches(
    plan: &FilterPlan,
    engineer: &Engineer,
    skills: &[EngineerSkillEdge],
    business_domains: &[EngineerDomainEdge],
    technical_domains: &[EngineerDomainEdge],
) -> bool {
    plan.property_predicates.iter().all(|p| evaluate_property(engineer, p))
        && plan.skill_buckets.iter().all(|b| evaluate_skill_bucket(b, skills))
        && evaluate_derived(&plan.derived_required_skill_ids, skills)
        && plan.required_business_domains.iter().all(|r| evaluate_domain_requirement(r, business_domains))
        && plan.required_technical_domains.iter().all(|r| evaluate_domain_requirement(r, technical_domains))
}

/// Count of distinct qualifying skills for ordering (spec.md §4.5 step 5) —
/// direct or descendant matches at passing proficiency, counted once per
/// requirement's expanded set. Cheap: does not build full [`CollectedSkill`]
/// evidence, which is reserved for the page (step 6).
///
/// [`CollectedSkill`]: recruit_types::CollectedSkill
fn quick_qualifying_skill_count(plan: &FilterPlan, skills: &[EngineerSkillEdge]) -> usize {
    plan.skill_buckets
        .iter()
        .filter(|b| evaluate_skill_bucket(b, skills))
        .count()
}

/// Runs the filter across every engineer the source knows about, orders
/// and paginates exactly as spec.md §4.5 step 5 requires, and returns the
/// full (unpaginated) match count alongside the one page of engineers.
pub async fn execute(
    plan: &FilterPlan,
    source: &dyn EngineerGraphSource,
) -> (Vec<Engineer>, usize) {
    let mut qualifying = Vec::new();
    for engineer in source.all_engineers().await {
        let skills = source.skills_for(&engineer.id).await;
        let business_domains = source.business_domains_for(&engineer.id).await;
        let technical_domains = source.technical_domains_for(&engineer.id).await;
        if matches(plan, &engineer, &skills, &business_domains, &technical_domains) {
            let quick_count = quick_qualifying_skill_count(plan, &skills);
            qualifying.push((quick_count, engineer));
        }
    }

    let total_count = qualifying.len();
    if plan.order_by_skill_count {
        qualifying.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(b.1.years_experience.partial_cmp(&a.1.years_experience).unwrap_or(std::cmp::Ordering::Equal))
        });
    } else {
        qualifying.sort_by(|a, b| {
            b.1.years_experience.partial_cmp(&a.1.years_experience).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let page = qualifying
        .into_iter()
        .skip(plan.offset as usize)
        .take(plan.limit as usize)
        .map(|(_, engineer)| engineer)
        .collect();

    (page, total_count)
}

/// `buildSearchCountQuery` / `buildSkillFilterCountQuery` (spec.md §4.5
/// "Auxiliary queries"): same predicate set, just the count.
pub async fn count(plan: &FilterPlan, source: &dyn EngineerGraphSource) -> usize {
    let mut total = 0;
    for engineer in source.all_engineers().await {
        let skills = source.skills_for(&engineer.id).await;
        let business_domains = source.business_domains_for(&engineer.id).await;
        let technical_domains = source.technical_domains_for(&engineer.id).await;
        if matches(plan, &engineer, &skills, &business_domains, &technical_domains) {
            total += 1;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_graph::MemoryGraphStore;
    use recruit_types::{ProficiencyLevel, StartTimeline};

    fn engineer(id: &str, years: f64) -> Engineer {
        Engineer {
            id: recruit_types::EngineerId::new(id),
            name: id.to_string(),
            headline: String::new(),
            years_experience: years,
            timezone: "America/New_York".to_string(),
            salary: 100_000.0,
            start_timeline: StartTimeline::Immediate,
            embedding: None,
        }
    }

    #[tokio::test]
    async fn has_any_semantics_any_bucket_member_at_proficiency_satisfies() {
        let mut store = MemoryGraphStore::new();
        store.add_engineer(
            engineer("eng_has_python", 5.0),
            vec![EngineerSkillEdge {
                skill_id: SkillId::new("skill_python"),
                proficiency_level: ProficiencyLevel::Proficient,
                confidence_score: 0.8,
                years_used: 3.0,
            }],
            vec![],
            vec![],
        );
        store.add_engineer(
            engineer("eng_has_node_learning", 5.0),
            vec![EngineerSkillEdge {
                skill_id: SkillId::new("skill_node"),
                proficiency_level: ProficiencyLevel::Learning,
                confidence_score: 0.8,
                years_used: 1.0,
            }],
            vec![],
            vec![],
        );

        let plan = FilterPlan {
            skill_buckets: vec![SkillBucket {
                expanded_skill_ids: vec![
                    SkillId::new("skill_node"),
                    SkillId::new("skill_python"),
                    SkillId::new("skill_java"),
                ],
                min_proficiency: ProficiencyLevel::Proficient,
            }],
            ..Default::default()
        };

        let (page, total) = execute(&plan, &store).await;
        assert_eq!(total, 1);
        assert_eq!(page[0].id, recruit_types::EngineerId::new("eng_has_python"));
    }

    #[tokio::test]
    async fn empty_skill_buckets_do_not_filter() {
        let mut store = MemoryGraphStore::new();
        store.add_engineer(engineer("eng_a", 3.0), vec![], vec![], vec![]);
        let plan = FilterPlan::default();
        let (_, total) = execute(&plan, &store).await;
        assert_eq!(total, 1);
    }
}
