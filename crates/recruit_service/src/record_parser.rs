//! Record parser (C6, spec.md §4.6).
//!
//! Turns the raw skill/domain edges the graph source returns for one
//! paginated engineer into the typed [`MatchedSkill`]/[`UnmatchedRelatedSkill`]
//! and [`MatchedDomain`] arrays the utility calculator (C7) and the response
//! DTO consume.

use ahash::AHashMap;
use recruit_graph::DomainGraphSource;
use recruit_types::{
    ConstraintViolation, EngineerDomainEdge, EngineerSkillEdge, ExpandedCriteria, MatchedDomain,
    MatchedSkill, ResolvedDomainRequirement, SkillId, UnmatchedRelatedSkill,
};

pub struct ParsedSkills {
    pub matched: Vec<MatchedSkill>,
    pub unmatched_related: Vec<UnmatchedRelatedSkill>,
    pub matched_skill_count: usize,
    pub avg_confidence: f64,
}

/// Classifies `skills` under the three modes of spec.md §4.6.
pub fn parse_skills(
    criteria: &ExpandedCriteria,
    skills: &[EngineerSkillEdge],
    confidence_min: f64,
) -> ParsedSkills {
    if criteria.resolved_required_skills.is_empty() {
        return if criteria.aligned_skill_ids.is_empty() {
            // Skill-cleared browsing mode.
            ParsedSkills {
                matched: Vec::new(),
                unmatched_related: Vec::new(),
                matched_skill_count: 0,
                avg_confidence: 0.0,
            }
        } else {
            team_focus_only(criteria, skills)
        };
    }

    skill_filtered(criteria, skills, confidence_min)
}

fn team_focus_only(criteria: &ExpandedCriteria, skills: &[EngineerSkillEdge]) -> ParsedSkills {
    let aligned: ahash::AHashSet<&SkillId> = criteria.aligned_skill_ids.iter().collect();
    let matched: Vec<MatchedSkill> = skills
        .iter()
        .filter(|edge| aligned.contains(&edge.skill_id))
        .map(|edge| MatchedSkill {
            skill_id: edge.skill_id.clone(),
            skill_name: edge.skill_id.as_str().to_string(),
            proficiency_level: edge.proficiency_level,
            confidence_score: edge.confidence_score,
        })
        .collect();
    let count = matched.len();
    let avg_confidence = if count == 0 {
        0.0
    } else {
        matched.iter().map(|m| m.confidence_score).sum::<f64>() / count as f64
    };
    ParsedSkills {
        matched,
        unmatched_related: Vec::new(),
        matched_skill_count: count,
        avg_confidence,
    }
}

/// One edge's classification against the single requirement that reached
/// it most favourably; see the reduction in [`skill_filtered`].
struct Candidate {
    edge: EngineerSkillEdge,
    name: String,
    direct: bool,
    meets_proficiency: bool,
    meets_confidence: bool,
}

fn skill_filtered(
    criteria: &ExpandedCriteria,
    skills: &[EngineerSkillEdge],
    confidence_min: f64,
) -> ParsedSkills {
    let mut by_skill: AHashMap<SkillId, Candidate> = AHashMap::default();

    for req in &criteria.resolved_required_skills {
        let wanted: ahash::AHashSet<&SkillId> = req.expanded_skill_ids.iter().collect();
        for edge in skills {
            if !wanted.contains(&edge.skill_id) {
                continue;
            }
            let name = req
                .skill_id_to_name
                .get(&edge.skill_id)
                .cloned()
                .unwrap_or_else(|| edge.skill_id.as_str().to_string());
            let candidate = Candidate {
                edge: edge.clone(),
                name: name.clone(),
                direct: req.is_direct_match(&edge.skill_id, &name),
                meets_proficiency: edge.proficiency_level >= req.min_proficiency,
                meets_confidence: edge.confidence_score >= confidence_min,
            };
            let is_match = candidate.direct && candidate.meets_proficiency;

            // A skill reachable via several requirements keeps whichever
            // candidate classifies it as `matched`; among non-matching
            // candidates the first one found stands in for the row (every
            // requirement ANDs the same HAS_ANY check, so violations don't
            // compound across requirements — spec.md §4.5 step 2).
            by_skill
                .entry(edge.skill_id.clone())
                .and_modify(|existing| {
                    let existing_match =
                        existing.direct && existing.meets_proficiency;
                    if is_match && !existing_match {
                        *existing = Candidate {
                            edge: edge.clone(),
                            name: name.clone(),
                            direct: candidate.direct,
                            meets_proficiency: candidate.meets_proficiency,
                            meets_confidence: candidate.meets_confidence,
                        };
                    }
                })
                .or_insert(candidate);
        }
    }

    let mut matched = Vec::new();
    let mut unmatched_related = Vec::new();
    for (_, candidate) in by_skill {
        if candidate.direct && candidate.meets_proficiency {
            matched.push(MatchedSkill {
                skill_id: candidate.edge.skill_id,
                skill_name: candidate.name,
                proficiency_level: candidate.edge.proficiency_level,
                confidence_score: candidate.edge.confidence_score,
            });
        } else {
            let mut violations = Vec::new();
            if !candidate.meets_proficiency {
                violations.push(ConstraintViolation::ProficiencyBelowMinimum);
            }
            if !candidate.meets_confidence {
                violations.push(ConstraintViolation::ConfidenceBelowMinimum);
            }
            unmatched_related.push(UnmatchedRelatedSkill {
                skill_id: candidate.edge.skill_id,
                skill_name: candidate.name,
                proficiency_level: candidate.edge.proficiency_level,
                constraint_violations: violations,
            });
        }
    }

    let matched_skill_count = matched.len();
    let avg_confidence = if matched.is_empty() {
        0.0
    } else {
        matched.iter().map(|m| m.confidence_score).sum::<f64>() / matched.len() as f64
    };

    ParsedSkills {
        matched,
        unmatched_related,
        matched_skill_count,
        avg_confidence,
    }
}

/// Domains collected for one engineer: any edge landing in the union of the
/// required and preferred expanded sets, tagged with both booleans
/// (spec.md §4.6 "Also compute domain meetsRequired/meetsPreferred").
pub async fn parse_domains(
    required: &[ResolvedDomainRequirement],
    preferred: &[ResolvedDomainRequirement],
    edges: &[EngineerDomainEdge],
    domain_source: &dyn DomainGraphSource,
    kind: recruit_types::DomainKind,
) -> Vec<MatchedDomain> {
    let mut out = Vec::new();
    for edge in edges {
        let meets_required = required.iter().any(|req| {
            req.expanded_domain_ids.contains(&edge.domain_id)
                && req.min_years.map(|min| edge.years >= min).unwrap_or(true)
        });
        let meets_preferred = preferred.iter().any(|req| {
            req.expanded_domain_ids.contains(&edge.domain_id)
                && req
                    .preferred_min_years
                    .map(|min| edge.years >= min)
                    .unwrap_or(true)
        });
        let in_scope = required
            .iter()
            .any(|req| req.expanded_domain_ids.contains(&edge.domain_id))
            || preferred
                .iter()
                .any(|req| req.expanded_domain_ids.contains(&edge.domain_id));
        if !in_scope {
            continue;
        }
        let name = domain_source
            .find_domain(edge.domain_id.as_str(), kind)
            .await
            .map(|node| node.name)
            .unwrap_or_else(|| edge.domain_id.as_str().to_string());
        out.push(MatchedDomain {
            domain_id: edge.domain_id.clone(),
            domain_name: name,
            years: edge.years,
            meets_required,
            meets_preferred,
        });
    }
    out
}
