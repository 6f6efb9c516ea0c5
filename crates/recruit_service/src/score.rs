//! Utility calculator (C7, spec.md §4.7).
//!
//! `U(v) = Σ w_j · f_j(v_j)` — each row of the §4.7 function bank is its own
//! small pure function here, normalised to `[0, 1]` before
//! `ScoreBreakdown::add` applies the configured weight. Components the
//! request never asked about are simply never added, so they drop out of
//! the breakdown rather than scoring zero.

use crate::record_parser::ParsedSkills;
use recruit_config::UtilityConfig;
use recruit_types::{
    Engineer, EngineerSkillEdge, ExpandedCriteria, MatchedDomain, ProficiencyLevel, ScoreBreakdown,
    SkillId, StartTimeline,
};

pub struct ScoreInputs<'a> {
    pub engineer: &'a Engineer,
    pub skills: &'a [EngineerSkillEdge],
    pub parsed_skills: &'a ParsedSkills,
    pub matched_business_domains: &'a [MatchedDomain],
    pub matched_technical_domains: &'a [MatchedDomain],
}

pub fn score_engineer(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    seniority_table: &recruit_config::SeniorityTable,
    inputs: &ScoreInputs,
) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown::default();

    skill_match(criteria, config, inputs, &mut breakdown);
    confidence(criteria, config, inputs, &mut breakdown);
    experience(config, inputs, &mut breakdown);
    preferred_skills_match(criteria, config, inputs, &mut breakdown);
    team_focus_match(criteria, config, inputs, &mut breakdown);
    related_skills_match(config, inputs, &mut breakdown);
    preferred_domain_match(
        "preferredBusinessDomainMatch",
        &criteria.resolved_preferred_business_domains,
        inputs.matched_business_domains,
        config.preferred_business_domain_match,
        &mut breakdown,
    );
    preferred_domain_match(
        "preferredTechnicalDomainMatch",
        &criteria.resolved_preferred_technical_domains,
        inputs.matched_technical_domains,
        config.preferred_technical_domain_match,
        &mut breakdown,
    );
    start_timeline_match(criteria, config, inputs, &mut breakdown);
    preferred_timezone_match(criteria, config, inputs, &mut breakdown);
    preferred_seniority_match(criteria, config, seniority_table, inputs, &mut breakdown);
    budget_match(criteria, config, inputs, &mut breakdown);

    breakdown
}

fn proficiency_bonus(level: ProficiencyLevel) -> f64 {
    match level {
        ProficiencyLevel::Expert => 0.1,
        ProficiencyLevel::Proficient => 0.05,
        ProficiencyLevel::Learning => 0.0,
    }
}

fn skill_match(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    let requested = criteria.resolved_required_skills.len();
    let raw = if requested == 0 {
        0.5
    } else {
        let matched = &inputs.parsed_skills.matched;
        let coverage = (matched.len() as f64 / requested as f64).min(1.0);
        let bonus = if matched.is_empty() {
            0.0
        } else {
            matched
                .iter()
                .map(|m| proficiency_bonus(m.proficiency_level))
                .sum::<f64>()
                / matched.len() as f64
        };
        (coverage + bonus).min(1.0)
    };
    breakdown.add("skillMatch", raw, config.skill_match.weight);
}

fn confidence(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    let raw = if criteria.resolved_required_skills.is_empty() {
        0.5
    } else {
        let span = config.confidence_max - config.confidence_min;
        if span <= f64::EPSILON {
            0.5
        } else {
            ((inputs.parsed_skills.avg_confidence - config.confidence_min) / span).clamp(0.0, 1.0)
        }
    };
    breakdown.add("confidence", raw, config.confidence.weight);
}

fn experience(config: &UtilityConfig, inputs: &ScoreInputs, breakdown: &mut ScoreBreakdown) {
    let years = inputs.engineer.years_experience.max(0.0);
    let raw = (((1.0 + years).ln()) / ((1.0 + config.experience_max_years).ln())).min(1.0);
    breakdown.add("experience", raw, config.experience.weight);
}

fn satisfies_bucket(ids: &[SkillId], min_proficiency: ProficiencyLevel, skills: &[EngineerSkillEdge]) -> bool {
    let wanted: ahash::AHashSet<&SkillId> = ids.iter().collect();
    skills
        .iter()
        .any(|edge| wanted.contains(&edge.skill_id) && edge.proficiency_level >= min_proficiency)
}

fn preferred_skills_match(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    let requested = criteria.resolved_preferred_skills.len();
    if requested == 0 {
        return;
    }
    let matched = criteria
        .resolved_preferred_skills
        .iter()
        .filter(|req| {
            let min = req.preferred_min_proficiency.unwrap_or(req.min_proficiency);
            satisfies_bucket(&req.expanded_skill_ids, min, inputs.skills)
        })
        .count();
    let max_match = config.preferred_skills_match.max_match;
    let raw = (matched as f64 / requested as f64).min(1.0) * max_match;
    breakdown.add("preferredSkillsMatch", raw, config.preferred_skills_match.weight);
}

fn team_focus_match(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    if criteria.aligned_skill_ids.is_empty() {
        return;
    }
    let aligned: ahash::AHashSet<&SkillId> = criteria.aligned_skill_ids.iter().collect();
    let matched = inputs
        .skills
        .iter()
        .filter(|edge| aligned.contains(&edge.skill_id))
        .map(|edge| &edge.skill_id)
        .collect::<ahash::AHashSet<_>>()
        .len();
    let max_match = config.team_focus_match.max_match;
    let raw = (matched as f64 / criteria.aligned_skill_ids.len() as f64).min(1.0) * max_match;
    breakdown.add("teamFocusMatch", raw, config.team_focus_match.weight);
}

fn related_skills_match(config: &UtilityConfig, inputs: &ScoreInputs, breakdown: &mut ScoreBreakdown) {
    let count = inputs.parsed_skills.unmatched_related.len() as f64;
    let max_match = config.related_skills_match.max_match;
    if max_match <= f64::EPSILON {
        return;
    }
    let raw = (1.0 - (-count / max_match).exp()) * max_match;
    breakdown.add("relatedSkillsMatch", raw, config.related_skills_match.weight);
}

fn preferred_domain_match(
    name: &str,
    requested: &[recruit_types::ResolvedDomainRequirement],
    matched: &[MatchedDomain],
    ceiling: recruit_config::WeightedCeiling,
    breakdown: &mut ScoreBreakdown,
) {
    if requested.is_empty() {
        return;
    }
    let meets_preferred = matched.iter().filter(|d| d.meets_preferred).count();
    let raw = (meets_preferred as f64 / requested.len() as f64).min(1.0) * ceiling.max_match;
    breakdown.add(name, raw, ceiling.weight);
}

fn timeline_index(timeline: StartTimeline) -> usize {
    StartTimeline::ALL
        .iter()
        .position(|t| *t == timeline)
        .unwrap_or(0)
}

fn start_timeline_match(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    let Some(preferred) = criteria.preferred_max_start_time else {
        // "0 if only required set" — nothing to add, the component simply
        // doesn't appear.
        return;
    };
    let required = criteria.required_max_start_time.unwrap_or(StartTimeline::OneYear);
    let engineer_idx = timeline_index(inputs.engineer.start_timeline) as f64;
    let preferred_idx = timeline_index(preferred) as f64;
    let required_idx = timeline_index(required) as f64;

    let raw = if engineer_idx <= preferred_idx {
        1.0
    } else if engineer_idx >= required_idx {
        0.0
    } else {
        (required_idx - engineer_idx) / (required_idx - preferred_idx)
    };
    breakdown.add(
        "startTimelineMatch",
        raw,
        config.start_timeline_match.weight,
    );
}

fn preferred_timezone_match(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    if criteria.preferred_timezone_prefixes.is_empty() {
        return;
    }
    let len = criteria.preferred_timezone_prefixes.len();
    let Some(index) = criteria
        .preferred_timezone_prefixes
        .iter()
        .position(|prefix| inputs.engineer.timezone.starts_with(prefix.as_str()))
    else {
        return;
    };
    let max_match = config.preferred_timezone_match.max_match;
    let raw = (1.0 - index as f64 / len as f64) * max_match;
    breakdown.add(
        "preferredTimezoneMatch",
        raw,
        config.preferred_timezone_match.weight,
    );
}

fn preferred_seniority_match(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    seniority_table: &recruit_config::SeniorityTable,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    let Some(level) = criteria.preferred_seniority_level else {
        return;
    };
    let Some(range) = seniority_table.0.get(&level) else {
        return;
    };
    let max_match = config.preferred_seniority_match.max_match;
    let raw = if inputs.engineer.years_experience >= range.min {
        max_match
    } else {
        0.0
    };
    breakdown.add(
        "preferredSeniorityMatch",
        raw,
        config.preferred_seniority_match.weight,
    );
}

fn budget_match(
    criteria: &ExpandedCriteria,
    config: &UtilityConfig,
    inputs: &ScoreInputs,
    breakdown: &mut ScoreBreakdown,
) {
    let Some(max_budget) = criteria.max_budget else {
        return;
    };
    let salary = inputs.engineer.salary;
    if salary <= max_budget {
        // Full match is excluded from the breakdown (spec.md §4.7).
        return;
    }
    let Some(stretch) = criteria.stretch_budget else {
        return;
    };
    if salary > stretch {
        return;
    }
    let span = stretch - max_budget;
    let raw = if span <= f64::EPSILON {
        0.0
    } else {
        (1.0 - (salary - max_budget) / span).clamp(0.0, 1.0)
    };
    breakdown.add("budgetMatch", raw, config.budget_match.weight);
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_types::{EngineerId, MatchedSkill};

    fn base_engineer() -> Engineer {
        Engineer {
            id: EngineerId::new("eng_1"),
            name: "Ada".into(),
            headline: String::new(),
            years_experience: 8.0,
            timezone: "America/New_York".into(),
            salary: 150_000.0,
            start_timeline: StartTimeline::Immediate,
            embedding: None,
        }
    }

    #[test]
    fn no_requested_skills_yields_neutral_skill_and_confidence_scores() {
        let criteria = ExpandedCriteria::default();
        let config = UtilityConfig::default();
        let engineer = base_engineer();
        let parsed = ParsedSkills {
            matched: Vec::new(),
            unmatched_related: Vec::new(),
            matched_skill_count: 0,
            avg_confidence: 0.0,
        };
        let inputs = ScoreInputs {
            engineer: &engineer,
            skills: &[],
            parsed_skills: &parsed,
            matched_business_domains: &[],
            matched_technical_domains: &[],
        };
        let breakdown = score_engineer(&criteria, &config, &recruit_config::SeniorityTable::default(), &inputs);
        assert_eq!(breakdown.raw_scores["skillMatch"], 0.5);
        assert_eq!(breakdown.raw_scores["confidence"], 0.5);
    }

    #[test]
    fn full_budget_match_is_excluded_from_breakdown() {
        let mut criteria = ExpandedCriteria::default();
        criteria.max_budget = Some(200_000.0);
        let config = UtilityConfig::default();
        let engineer = base_engineer();
        let parsed = ParsedSkills {
            matched: Vec::new(),
            unmatched_related: Vec::new(),
            matched_skill_count: 0,
            avg_confidence: 0.0,
        };
        let inputs = ScoreInputs {
            engineer: &engineer,
            skills: &[],
            parsed_skills: &parsed,
            matched_business_domains: &[],
            matched_technical_domains: &[],
        };
        let breakdown = score_engineer(&criteria, &config, &recruit_config::SeniorityTable::default(), &inputs);
        assert!(!breakdown.scores.contains_key("budgetMatch"));
    }

    #[test]
    fn partial_budget_match_scores_between_zero_and_one() {
        let mut criteria = ExpandedCriteria::default();
        criteria.max_budget = Some(100_000.0);
        criteria.stretch_budget = Some(150_000.0);
        let config = UtilityConfig::default();
        let mut engineer = base_engineer();
        engineer.salary = 125_000.0;
        let parsed = ParsedSkills {
            matched: Vec::new(),
            unmatched_related: Vec::new(),
            matched_skill_count: 0,
            avg_confidence: 0.0,
        };
        let inputs = ScoreInputs {
            engineer: &engineer,
            skills: &[],
            parsed_skills: &parsed,
            matched_business_domains: &[],
            matched_technical_domains: &[],
        };
        let breakdown = score_engineer(&criteria, &config, &recruit_config::SeniorityTable::default(), &inputs);
        let raw = breakdown.raw_scores["budgetMatch"];
        assert!(raw > 0.0 && raw < 1.0);
    }

    #[test]
    fn skill_match_caps_at_one_with_expert_bonus() {
        let mut criteria = ExpandedCriteria::default();
        criteria.resolved_required_skills = vec![recruit_types::ResolvedSkillRequirement {
            original_identifier: "rust".into(),
            original_skill_id: Some(SkillId::new("rust")),
            original_skill_name: Some("rust".into()),
            expanded_skill_ids: vec![SkillId::new("rust")],
            skill_id_to_name: Default::default(),
            min_proficiency: ProficiencyLevel::Learning,
            preferred_min_proficiency: None,
        }];
        let config = UtilityConfig::default();
        let engineer = base_engineer();
        let parsed = ParsedSkills {
            matched: vec![MatchedSkill {
                skill_id: SkillId::new("rust"),
                skill_name: "rust".into(),
                proficiency_level: ProficiencyLevel::Expert,
                confidence_score: 0.9,
            }],
            unmatched_related: Vec::new(),
            matched_skill_count: 1,
            avg_confidence: 0.9,
        };
        let inputs = ScoreInputs {
            engineer: &engineer,
            skills: &[],
            parsed_skills: &parsed,
            matched_business_domains: &[],
            matched_technical_domains: &[],
        };
        let breakdown = score_engineer(&criteria, &config, &recruit_config::SeniorityTable::default(), &inputs);
        assert_eq!(breakdown.raw_scores["skillMatch"], 1.0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn experience_is_monotonic_in_years(low in 0.0f64..50.0, delta in 0.0f64..50.0) {
                let config = UtilityConfig::default();
                let mut breakdown_low = ScoreBreakdown::default();
                let mut breakdown_high = ScoreBreakdown::default();
                let mut engineer = base_engineer();
                engineer.years_experience = low;
                let inputs_low = ScoreInputs {
                    engineer: &engineer,
                    skills: &[],
                    parsed_skills: &empty_parsed_skills(),
                    matched_business_domains: &[],
                    matched_technical_domains: &[],
                };
                experience(&config, &inputs_low, &mut breakdown_low);

                let mut engineer_high = base_engineer();
                engineer_high.years_experience = low + delta;
                let inputs_high = ScoreInputs {
                    engineer: &engineer_high,
                    skills: &[],
                    parsed_skills: &empty_parsed_skills(),
                    matched_business_domains: &[],
                    matched_technical_domains: &[],
                };
                experience(&config, &inputs_high, &mut breakdown_high);

                prop_assert!(breakdown_high.raw_scores["experience"] >= breakdown_low.raw_scores["experience"] - f64::EPSILON);
            }

            #[test]
            fn budget_match_is_non_increasing_in_salary(
                max_budget in 50_000.0f64..200_000.0,
                stretch_delta in 1_000.0f64..100_000.0,
                salary_offset_low in 0.0f64..50_000.0,
                salary_offset_delta in 0.0f64..50_000.0,
            ) {
                let stretch = max_budget + stretch_delta;
                let mut criteria = ExpandedCriteria::default();
                criteria.max_budget = Some(max_budget);
                criteria.stretch_budget = Some(stretch);
                let config = UtilityConfig::default();

                let mut engineer_low = base_engineer();
                engineer_low.salary = (max_budget + salary_offset_low).min(stretch);
                let mut breakdown_low = ScoreBreakdown::default();
                budget_match(&criteria, &config, &ScoreInputs {
                    engineer: &engineer_low,
                    skills: &[],
                    parsed_skills: &empty_parsed_skills(),
                    matched_business_domains: &[],
                    matched_technical_domains: &[],
                }, &mut breakdown_low);

                let mut engineer_high = base_engineer();
                engineer_high.salary = (max_budget + salary_offset_low + salary_offset_delta).min(stretch);
                let mut breakdown_high = ScoreBreakdown::default();
                budget_match(&criteria, &config, &ScoreInputs {
                    engineer: &engineer_high,
                    skills: &[],
                    parsed_skills: &empty_parsed_skills(),
                    matched_business_domains: &[],
                    matched_technical_domains: &[],
                }, &mut breakdown_high);

                let low_score = breakdown_low.raw_scores.get("budgetMatch").copied().unwrap_or(1.0);
                let high_score = breakdown_high.raw_scores.get("budgetMatch").copied().unwrap_or(1.0);
                prop_assert!(high_score <= low_score + f64::EPSILON);
            }
        }
    }

    fn empty_parsed_skills() -> ParsedSkills {
        ParsedSkills {
            matched: Vec::new(),
            unmatched_related: Vec::new(),
            matched_skill_count: 0,
            avg_confidence: 0.0,
        }
    }
}
