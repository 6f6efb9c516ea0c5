//! Similarity engine (C10, spec.md §4.10).
//!
//! Scores a reference engineer against a candidate pool across four
//! subscores (skills, experience, domain, timezone), combines them with
//! configured weights, and applies an MMR-style diversity pass that
//! preserves the position-0-is-max invariant (spec.md §8 testable
//! property 7).

use ahash::AHashSet;
use recruit_config::SimilarityWeights;
use recruit_graph::SimilarityGraphs;
use recruit_types::{
    Engineer, EngineerDomainEdge, EngineerId, EngineerSkillEdge, SimilarEngineer,
    SimilarityBreakdown,
};

/// Everything the scorer needs for one engineer: identity plus the edges
/// gathered for the candidate pool (spec.md §4.10 "Scoring").
pub struct SimilarityProfile<'a> {
    pub engineer: &'a Engineer,
    pub skills: &'a [EngineerSkillEdge],
    pub business_domains: &'a [EngineerDomainEdge],
    pub technical_domains: &'a [EngineerDomainEdge],
}

fn skills_subscore(
    reference: &SimilarityProfile,
    candidate: &SimilarityProfile,
    graphs: &recruit_graph::SimilaritySnapshot,
) -> (f64, Vec<String>, Vec<String>) {
    let ref_ids: AHashSet<_> = reference.skills.iter().map(|s| &s.skill_id).collect();
    let cand_ids: AHashSet<_> = candidate.skills.iter().map(|s| &s.skill_id).collect();

    let shared: Vec<String> = ref_ids.intersection(&cand_ids).map(|id| id.as_str().to_string()).collect();
    let shared_weight = shared.len() as f64;

    let mut correlated = Vec::new();
    let mut correlated_weight = 0.0;
    for ref_id in ref_ids.iter() {
        if cand_ids.contains(*ref_id) {
            continue;
        }
        let Some(correlations) = graphs.skill_correlations.get(*ref_id) else {
            continue;
        };
        let best = correlations
            .iter()
            .filter(|c| cand_ids.contains(&c.other_skill_id))
            .map(|c| c.strength)
            .fold(0.0_f64, f64::max);
        if best > 0.0 {
            correlated_weight += best;
            if let Some(matched) = correlations.iter().find(|c| cand_ids.contains(&c.other_skill_id)) {
                correlated.push(matched.other_skill_id.as_str().to_string());
            }
        }
    }

    let denom = (ref_ids.len().max(cand_ids.len())) as f64;
    let score = if denom == 0.0 {
        0.0
    } else {
        ((shared_weight + correlated_weight) / denom).min(1.0)
    };

    (score, shared, correlated)
}

fn experience_subscore(reference: &Engineer, candidate: &Engineer) -> f64 {
    let diff = (reference.years_experience - candidate.years_experience).abs();
    let denom = reference.years_experience.max(candidate.years_experience).max(1.0);
    (1.0 - diff / denom).max(0.0)
}

/// Hierarchy-aware similarity for one domain hierarchy (business or
/// technical): exact 1.0, shared parent 0.7, shared ancestor 0.4, shared
/// `encompassedBy` tag 0.3, else 0 — averaged across hierarchies by the
/// caller (spec.md §4.10).
/// Walks `parent_id` links up from `start`, bounded by the graph's own
/// size so a corrupt cycle can't loop forever (spec.md §9 design note on
/// cyclic graphs — same caution applied here as for skill correlations).
fn ancestor_chain<'a>(
    start: &'a recruit_types::DomainId,
    graph: &'a ahash::AHashMap<recruit_types::DomainId, recruit_types::DomainGraphNode>,
) -> Vec<&'a recruit_types::DomainId> {
    let mut chain = Vec::new();
    let mut current = Some(start);
    let mut steps = 0;
    while let Some(id) = current {
        if chain.contains(&id) || steps > graph.len() {
            break;
        }
        chain.push(id);
        current = graph.get(id).and_then(|n| n.parent_id.as_ref());
        steps += 1;
    }
    chain
}

fn domain_hierarchy_score(
    reference: &[EngineerDomainEdge],
    candidate: &[EngineerDomainEdge],
    graph: &ahash::AHashMap<recruit_types::DomainId, recruit_types::DomainGraphNode>,
) -> f64 {
    let cand_ids: AHashSet<_> = candidate.iter().map(|e| &e.domain_id).collect();
    let cand_parents: AHashSet<_> = candidate
        .iter()
        .filter_map(|e| graph.get(&e.domain_id).and_then(|n| n.parent_id.as_ref()))
        .collect();
    let cand_ancestors: AHashSet<_> = candidate
        .iter()
        .flat_map(|e| ancestor_chain(&e.domain_id, graph))
        .collect();
    let cand_encompassed: AHashSet<_> = candidate
        .iter()
        .filter_map(|e| graph.get(&e.domain_id).and_then(|n| n.encompassed_by.as_ref()))
        .collect();

    let mut best = 0.0_f64;
    for edge in reference {
        if cand_ids.contains(&edge.domain_id) {
            best = best.max(1.0);
            continue;
        }
        let node = graph.get(&edge.domain_id);
        if let Some(parent_id) = node.and_then(|n| n.parent_id.as_ref()) {
            if cand_ids.contains(parent_id) || cand_parents.contains(parent_id) {
                best = best.max(0.7);
            }
        }
        if cand_ancestors.contains(&edge.domain_id)
            || ancestor_chain(&edge.domain_id, graph)
                .iter()
                .any(|ancestor| cand_ancestors.contains(*ancestor))
        {
            best = best.max(0.4);
        }
        if let Some(encompassed) = node.and_then(|n| n.encompassed_by.as_ref()) {
            if cand_encompassed.contains(encompassed) {
                best = best.max(0.3);
            }
        }
    }
    best
}

fn domain_subscore(
    reference: &SimilarityProfile,
    candidate: &SimilarityProfile,
    graphs: &recruit_graph::SimilaritySnapshot,
) -> f64 {
    let business = domain_hierarchy_score(
        reference.business_domains,
        candidate.business_domains,
        &graphs.business_domains,
    );
    let technical = domain_hierarchy_score(
        reference.technical_domains,
        candidate.technical_domains,
        &graphs.technical_domains,
    );
    (business + technical) / 2.0
}

/// Exact zone 1.0, same region prefix 0.67, adjacent region 0.33, else 0
/// (spec.md §4.10). "Region" is the `Area/` segment before the `/`;
/// "adjacent" is approximated as sharing no region but both being
/// non-empty zones (a coarse stand-in absent a real geo-adjacency table).
fn timezone_subscore(reference: &str, candidate: &str) -> f64 {
    if reference == candidate {
        return 1.0;
    }
    let ref_region = reference.split('/').next().unwrap_or("");
    let cand_region = candidate.split('/').next().unwrap_or("");
    if !ref_region.is_empty() && ref_region == cand_region {
        return 0.67;
    }
    if !ref_region.is_empty() && !cand_region.is_empty() {
        return 0.33;
    }
    0.0
}

/// Computes the four subscores and their weighted total for one candidate
/// against `reference`.
pub fn score_candidate(
    reference: &SimilarityProfile,
    candidate: &SimilarityProfile,
    graphs: &recruit_graph::SimilaritySnapshot,
    weights: &SimilarityWeights,
) -> (SimilarEngineer, f64) {
    let (skills_score, shared_skills, correlated_skills) = skills_subscore(reference, candidate, graphs);
    let experience_score = experience_subscore(reference.engineer, candidate.engineer);
    let domain_score = domain_subscore(reference, candidate, graphs);
    let timezone_score =
        timezone_subscore(&reference.engineer.timezone, &candidate.engineer.timezone);

    let total = weights.skills * skills_score
        + weights.experience * experience_score
        + weights.domain * domain_score
        + weights.timezone * timezone_score;

    let breakdown = SimilarityBreakdown {
        skills: skills_score,
        experience: experience_score,
        domain: domain_score,
        timezone: timezone_score,
    };

    (
        SimilarEngineer {
            engineer: candidate.engineer.id.clone(),
            similarity_score: total,
            breakdown,
            shared_skills,
            correlated_skills,
        },
        total,
    )
}

/// MMR-style diversity selection (spec.md §4.10 "Diversity selection"):
/// always keeps the global max first, then at each subsequent slot picks
/// the highest-scoring remaining candidate, penalised by its similarity
/// (here, raw skill overlap) to what's already been selected.
pub fn diversify(
    mut scored: Vec<(SimilarEngineer, AHashSet<String>)>,
    limit: usize,
    lambda: f64,
) -> Vec<SimilarEngineer> {
    if scored.is_empty() || limit == 0 {
        return Vec::new();
    }
    scored.sort_by(|a, b| {
        b.0.similarity_score
            .partial_cmp(&a.0.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut selected = Vec::new();
    let mut selected_skills: Vec<AHashSet<String>> = Vec::new();

    let (first, first_skills) = scored.remove(0);
    selected_skills.push(first_skills);
    selected.push(first);

    while selected.len() < limit && !scored.is_empty() {
        let mut best_index = 0;
        let mut best_value = f64::MIN;
        for (i, (candidate, skills)) in scored.iter().enumerate() {
            let redundancy = selected_skills
                .iter()
                .map(|prior| jaccard(skills, prior))
                .fold(0.0_f64, f64::max);
            let value = lambda * candidate.similarity_score - (1.0 - lambda) * redundancy;
            if value > best_value {
                best_value = value;
                best_index = i;
            }
        }
        let (candidate, skills) = scored.remove(best_index);
        selected_skills.push(skills);
        selected.push(candidate);
    }

    selected
}

fn jaccard(a: &AHashSet<String>, b: &AHashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

pub fn profile_skill_set(skills: &[EngineerSkillEdge]) -> AHashSet<String> {
    skills.iter().map(|s| s.skill_id.as_str().to_string()).collect()
}

/// Excludes the reference engineer from a candidate pool (spec.md §6
/// "response excludes" the target).
pub fn exclude_reference<'a>(pool: &'a [Engineer], reference_id: &EngineerId) -> Vec<&'a Engineer> {
    pool.iter().filter(|e| &e.id != reference_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_types::{DomainId, ProficiencyLevel, SkillId, StartTimeline};

    fn engineer(id: &str, years: f64, timezone: &str) -> Engineer {
        Engineer {
            id: EngineerId::new(id),
            name: id.to_string(),
            headline: String::new(),
            years_experience: years,
            timezone: timezone.to_string(),
            salary: 100_000.0,
            start_timeline: StartTimeline::Immediate,
            embedding: None,
        }
    }

    fn skill_edge(id: &str, level: ProficiencyLevel) -> EngineerSkillEdge {
        EngineerSkillEdge {
            skill_id: SkillId::new(id),
            proficiency_level: level,
            confidence_score: 0.8,
            years_used: 2.0,
        }
    }

    #[test]
    fn identical_skill_sets_score_maximally() {
        let snapshot = recruit_graph::SimilaritySnapshot::default();
        let weights = SimilarityWeights::default();
        let reference_engineer = engineer("eng_ref", 5.0, "America/New_York");
        let candidate_engineer = engineer("eng_cand", 5.0, "America/New_York");
        let skills = vec![skill_edge("skill_rust", ProficiencyLevel::Expert)];

        let reference = SimilarityProfile {
            engineer: &reference_engineer,
            skills: &skills,
            business_domains: &[],
            technical_domains: &[],
        };
        let candidate = SimilarityProfile {
            engineer: &candidate_engineer,
            skills: &skills,
            business_domains: &[],
            technical_domains: &[],
        };

        let (similar, total) = score_candidate(&reference, &candidate, &snapshot, &weights);
        assert_eq!(similar.breakdown.skills, 1.0);
        assert_eq!(similar.breakdown.timezone, 1.0);
        assert!(total > 0.0);
    }

    #[test]
    fn timezone_same_region_scores_partial() {
        assert_eq!(timezone_subscore("America/New_York", "America/Los_Angeles"), 0.67);
        assert_eq!(timezone_subscore("America/New_York", "Europe/Berlin"), 0.33);
        assert_eq!(timezone_subscore("America/New_York", "America/New_York"), 1.0);
    }

    #[test]
    fn diversity_preserves_position_zero_as_global_max() {
        let top = SimilarEngineer {
            engineer: EngineerId::new("eng_top"),
            similarity_score: 0.9,
            breakdown: SimilarityBreakdown::default(),
            shared_skills: vec!["skill_rust".to_string()],
            correlated_skills: vec![],
        };
        let second = SimilarEngineer {
            engineer: EngineerId::new("eng_second"),
            similarity_score: 0.85,
            breakdown: SimilarityBreakdown::default(),
            shared_skills: vec!["skill_rust".to_string()],
            correlated_skills: vec![],
        };
        let third = SimilarEngineer {
            engineer: EngineerId::new("eng_third"),
            similarity_score: 0.8,
            breakdown: SimilarityBreakdown::default(),
            shared_skills: vec!["skill_go".to_string()],
            correlated_skills: vec![],
        };

        let scored = vec![
            (top, ["skill_rust".to_string()].into_iter().collect()),
            (second, ["skill_rust".to_string()].into_iter().collect()),
            (third, ["skill_go".to_string()].into_iter().collect()),
        ];

        let diversified = diversify(scored, 3, 0.5);
        assert_eq!(diversified[0].engineer, EngineerId::new("eng_top"));
        assert!(diversified[0].similarity_score >= diversified[1].similarity_score);
    }
}
