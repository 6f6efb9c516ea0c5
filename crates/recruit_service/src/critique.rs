//! Critique engine (C11, spec.md §4.11).
//!
//! Two independent halves: [`generate_suggestions`] mines the current
//! result set for 2-property combinations worth narrowing the search to,
//! and [`apply_adjustments`] is the interpreter that replays a suggestion's
//! [`CritiqueAdjustment`]s onto a base request. The two are deliberately
//! decoupled — a client may apply adjustments the generator never produced.

use ahash::AHashSet;
use recruit_config::SeniorityTable;
use recruit_types::{
    AdjustDirection, AppliedAdjustment, CritiqueAdjustment, CritiqueApplyResult, CritiqueProperty,
    CritiqueSuggestion, EngineerMatch, FailedAdjustment, ProficiencyLevel, SearchRequest,
    SeniorityLevel, SkillRequirement,
};

/// The configurable 2-property pair table (spec.md §4.11). Each pair names
/// two [`CritiqueProperty`] keys understood by [`candidate_values`] and
/// [`matches_value`] below.
const PAIR_TABLE: &[(&str, &str)] = &[
    ("seniority", "timezone"),
    ("skills", "timezone"),
    ("skills", "seniority"),
];

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

fn candidate_values(property: &str, results: &[EngineerMatch], table: &SeniorityTable) -> Vec<String> {
    let mut seen = AHashSet::new();
    let mut values = Vec::new();
    let mut push = |v: String| {
        if seen.insert(v.clone()) {
            values.push(v);
        }
    };
    match property {
        "seniority" => {
            for m in results {
                if let Some(level) = seniority_bucket(m.years_experience, table) {
                    push(level.to_string());
                }
            }
        }
        "timezone" => {
            for m in results {
                push(m.timezone.clone());
            }
        }
        "skills" => {
            for m in results {
                for skill in &m.matched_skills {
                    push(skill.skill_id.as_str().to_string());
                }
            }
        }
        _ => {}
    }
    values
}

fn matches_value(property: &str, value: &str, engineer: &EngineerMatch, table: &SeniorityTable) -> bool {
    match property {
        "seniority" => seniority_bucket(engineer.years_experience, table)
            .is_some_and(|level| level.to_string() == value),
        "timezone" => engineer.timezone == value,
        "skills" => engineer
            .matched_skills
            .iter()
            .any(|skill| skill.skill_id.as_str() == value),
        _ => false,
    }
}

fn describe_fragment(property: &str, value: &str) -> String {
    match property {
        "seniority" => format!("{value}-level"),
        "timezone" => format!("in {value}"),
        "skills" => format!("skilled in {value}"),
        _ => format!("{property}={value}"),
    }
}

fn adjustment_for(property: &str, value: &str) -> CritiqueAdjustment {
    let prop = CritiqueProperty(property.to_string());
    match property {
        "skills" => CritiqueAdjustment::Add {
            property: prop,
            value: value.to_string(),
        },
        _ => CritiqueAdjustment::Set {
            property: prop,
            value: value.to_string(),
        },
    }
}

/// Mines `results` for 2-property combinations per the table in
/// [`PAIR_TABLE`], emitting one suggestion per combination with non-zero
/// support.
pub fn generate_suggestions(
    results: &[EngineerMatch],
    seniority_table: &SeniorityTable,
) -> Vec<CritiqueSuggestion> {
    let total = results.len();
    if total == 0 {
        return Vec::new();
    }

    let mut suggestions = Vec::new();
    for &(prop_a, prop_b) in PAIR_TABLE {
        let values_a = candidate_values(prop_a, results, seniority_table);
        let values_b = candidate_values(prop_b, results, seniority_table);
        for value_a in &values_a {
            for value_b in &values_b {
                let count = results
                    .iter()
                    .filter(|m| {
                        matches_value(prop_a, value_a, m, seniority_table)
                            && matches_value(prop_b, value_b, m, seniority_table)
                    })
                    .count();
                if count == 0 {
                    continue;
                }
                let support = count as f64 / total as f64;
                let description = format!(
                    "{:.0}% of matches ({count}/{total}) are {} and {}",
                    support * 100.0,
                    describe_fragment(prop_a, value_a),
                    describe_fragment(prop_b, value_b),
                );
                suggestions.push(CritiqueSuggestion {
                    properties: vec![
                        CritiqueProperty(prop_a.to_string()),
                        CritiqueProperty(prop_b.to_string()),
                    ],
                    description,
                    support,
                    adjustments: vec![
                        adjustment_for(prop_a, value_a),
                        adjustment_for(prop_b, value_b),
                    ],
                });
            }
        }
    }

    suggestions.sort_by(|a, b| b.support.partial_cmp(&a.support).unwrap());
    suggestions
}

fn parse_seniority(value: &str) -> Option<SeniorityLevel> {
    SENIORITY_ORDER
        .iter()
        .copied()
        .find(|level| level.to_string() == value.to_lowercase())
}

fn step_seniority(level: SeniorityLevel, direction: AdjustDirection) -> (SeniorityLevel, bool) {
    let idx = SENIORITY_ORDER.iter().position(|l| *l == level).unwrap_or(0);
    match direction {
        AdjustDirection::Tighten if idx + 1 < SENIORITY_ORDER.len() => {
            (SENIORITY_ORDER[idx + 1], false)
        }
        AdjustDirection::Tighten => (level, true),
        AdjustDirection::Loosen if idx > 0 => (SENIORITY_ORDER[idx - 1], false),
        AdjustDirection::Loosen => (level, true),
    }
}

fn step_proficiency(
    level: Option<ProficiencyLevel>,
    direction: AdjustDirection,
) -> (Option<ProficiencyLevel>, bool) {
    use ProficiencyLevel::*;
    match (direction, level) {
        (AdjustDirection::Tighten, None) => (Some(Learning), false),
        (AdjustDirection::Tighten, Some(Learning)) => (Some(Proficient), false),
        (AdjustDirection::Tighten, Some(Proficient)) => (Some(Expert), false),
        (AdjustDirection::Tighten, Some(Expert)) => (Some(Expert), true),
        (AdjustDirection::Loosen, None) => (None, true),
        (AdjustDirection::Loosen, Some(Learning)) => (None, false),
        (AdjustDirection::Loosen, Some(Proficient)) => (Some(Learning), false),
        (AdjustDirection::Loosen, Some(Expert)) => (Some(Proficient), false),
    }
}

fn apply_one(request: &mut SearchRequest, adjustment: &CritiqueAdjustment) -> Result<Option<String>, String> {
    match adjustment {
        CritiqueAdjustment::Adjust { property, direction } => match property.0.as_str() {
            "seniority" => {
                let Some(current) = request.required_seniority_level else {
                    return Err("no requiredSeniorityLevel set to adjust".into());
                };
                let (next, hit_bound) = step_seniority(current, *direction);
                request.required_seniority_level = Some(next);
                Ok(hit_bound.then(|| format!("{next} is already the most extreme seniority level")))
            }
            "skills" => {
                let Some(skills) = request.required_skills.as_mut().filter(|s| !s.is_empty()) else {
                    return Err("no requiredSkills to adjust".into());
                };
                let mut hit_bound = false;
                for skill in skills.iter_mut() {
                    let (next, bound) = step_proficiency(skill.min_proficiency, *direction);
                    skill.min_proficiency = next;
                    hit_bound |= bound;
                }
                Ok(hit_bound.then(|| "some required skills are already at the proficiency bound".to_string()))
            }
            other => Err(format!("adjust is not supported for property '{other}'")),
        },
        CritiqueAdjustment::Set { property, value } => match property.0.as_str() {
            "seniority" => {
                let Some(level) = parse_seniority(value) else {
                    return Err(format!("unrecognised seniority level '{value}'"));
                };
                request.required_seniority_level = Some(level);
                Ok(None)
            }
            "timezone" => {
                request.required_timezone = Some(vec![value.clone()]);
                Ok(None)
            }
            "skills" => {
                request.required_skills = Some(vec![SkillRequirement {
                    skill: value.clone(),
                    min_proficiency: None,
                    preferred_min_proficiency: None,
                    min_years: None,
                }]);
                Ok(None)
            }
            other => Err(format!("set is not supported for property '{other}'")),
        },
        CritiqueAdjustment::Add { property, value } => match property.0.as_str() {
            "timezone" => add_list_value(&mut request.required_timezone, value),
            "skills" => {
                let skills = request.required_skills.get_or_insert_with(Vec::new);
                if skills.iter().any(|s| &s.skill == value) {
                    return Ok(Some(format!("'{value}' is already a required skill")));
                }
                skills.push(SkillRequirement {
                    skill: value.clone(),
                    min_proficiency: None,
                    preferred_min_proficiency: None,
                    min_years: None,
                });
                Ok(None)
            }
            other => Err(format!("add is not supported for property '{other}'")),
        },
        CritiqueAdjustment::Remove { property, value } => match property.0.as_str() {
            "timezone" => remove_list_value(&mut request.required_timezone, value),
            "skills" => {
                let Some(skills) = request.required_skills.as_mut() else {
                    return Err(format!("no requiredSkills to remove '{value}' from"));
                };
                let before = skills.len();
                skills.retain(|s| &s.skill != value);
                if skills.len() == before {
                    return Err(format!("'{value}' is not a required skill"));
                }
                if skills.is_empty() {
                    request.required_skills = None;
                }
                Ok(None)
            }
            other => Err(format!("remove is not supported for property '{other}'")),
        },
    }
}

fn add_list_value(list: &mut Option<Vec<String>>, value: &str) -> Result<Option<String>, String> {
    let values = list.get_or_insert_with(Vec::new);
    if values.iter().any(|v| v == value) {
        return Ok(Some(format!("'{value}' is already present")));
    }
    values.push(value.to_string());
    Ok(None)
}

fn remove_list_value(list: &mut Option<Vec<String>>, value: &str) -> Result<Option<String>, String> {
    match list {
        Some(values) => {
            let before = values.len();
            values.retain(|v| v != value);
            if values.len() == before {
                return Err(format!("'{value}' is not present"));
            }
            if values.is_empty() {
                *list = None;
            }
            Ok(None)
        }
        None => Err("field is unset, nothing to remove".to_string()),
    }
}

/// The critique interpreter: replays `adjustments` over `base` using the
/// fixed per-property operation table in [`apply_one`].
pub fn apply_adjustments(base: &SearchRequest, adjustments: &[CritiqueAdjustment]) -> CritiqueApplyResult {
    let mut request = base.clone();
    let mut applied = Vec::new();
    let mut failed = Vec::new();
    for adjustment in adjustments {
        match apply_one(&mut request, adjustment) {
            Ok(warning) => applied.push(AppliedAdjustment {
                adjustment: adjustment.clone(),
                warning,
            }),
            Err(reason) => failed.push(FailedAdjustment {
                adjustment: adjustment.clone(),
                reason,
            }),
        }
    }
    CritiqueApplyResult {
        request,
        applied,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_types::{MatchedSkill, ScoreBreakdown, SkillId, StartTimeline};

    fn engineer(timezone: &str, years: f64, skill: &str) -> EngineerMatch {
        EngineerMatch {
            engineer_id: recruit_types::EngineerId::new("e1"),
            name: "Eng".into(),
            headline: String::new(),
            years_experience: years,
            timezone: timezone.into(),
            salary: 100_000.0,
            start_timeline: StartTimeline::Immediate,
            matched_skills: vec![MatchedSkill {
                skill_id: SkillId::new(skill),
                skill_name: skill.into(),
                proficiency_level: ProficiencyLevel::Proficient,
                confidence_score: 0.9,
            }],
            unmatched_related_skills: Vec::new(),
            matched_skill_count: 1,
            avg_confidence: 0.9,
            matched_business_domains: Vec::new(),
            matched_technical_domains: Vec::new(),
            utility_score: 1.0,
            score_breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn suggestion_support_reflects_fraction_of_matches() {
        let table = SeniorityTable::default();
        let results = vec![
            engineer("America/New_York", 7.0, "skill_rust"),
            engineer("America/New_York", 7.0, "skill_go"),
            engineer("Europe/Berlin", 2.0, "skill_rust"),
        ];
        let suggestions = generate_suggestions(&results, &table);
        let senior_ny = suggestions
            .iter()
            .find(|s| {
                s.description.contains("senior-level") && s.description.contains("America/New_York")
            })
            .expect("expected a senior/timezone suggestion");
        assert!((senior_ny.support - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_results_yield_no_suggestions() {
        let table = SeniorityTable::default();
        assert!(generate_suggestions(&[], &table).is_empty());
    }

    #[test]
    fn set_seniority_adjustment_applies_cleanly() {
        let base = SearchRequest::default();
        let adjustments = vec![CritiqueAdjustment::Set {
            property: CritiqueProperty("seniority".into()),
            value: "senior".into(),
        }];
        let result = apply_adjustments(&base, &adjustments);
        assert_eq!(result.applied.len(), 1);
        assert!(result.failed.is_empty());
        assert_eq!(result.request.required_seniority_level, Some(SeniorityLevel::Senior));
    }

    #[test]
    fn tighten_at_principal_warns_but_still_applies() {
        let base = SearchRequest {
            required_seniority_level: Some(SeniorityLevel::Principal),
            ..Default::default()
        };
        let adjustments = vec![CritiqueAdjustment::Adjust {
            property: CritiqueProperty("seniority".into()),
            direction: AdjustDirection::Tighten,
        }];
        let result = apply_adjustments(&base, &adjustments);
        assert_eq!(result.applied.len(), 1);
        assert!(result.applied[0].warning.is_some());
        assert_eq!(
            result.request.required_seniority_level,
            Some(SeniorityLevel::Principal)
        );
    }

    #[test]
    fn removing_an_absent_skill_fails_with_reason() {
        let base = SearchRequest {
            required_skills: Some(vec![SkillRequirement {
                skill: "skill_rust".into(),
                min_proficiency: None,
                preferred_min_proficiency: None,
                min_years: None,
            }]),
            ..Default::default()
        };
        let adjustments = vec![CritiqueAdjustment::Remove {
            property: CritiqueProperty("skills".into()),
            value: "skill_go".into(),
        }];
        let result = apply_adjustments(&base, &adjustments);
        assert!(result.applied.is_empty());
        assert_eq!(result.failed.len(), 1);
    }

    #[test]
    fn round_trip_applied_count_matches_successful_adjustments() {
        let base = SearchRequest::default();
        let adjustments = vec![
            CritiqueAdjustment::Set {
                property: CritiqueProperty("seniority".into()),
                value: "mid".into(),
            },
            CritiqueAdjustment::Add {
                property: CritiqueProperty("timezone".into()),
                value: "America/New_York".into(),
            },
            CritiqueAdjustment::Remove {
                property: CritiqueProperty("skills".into()),
                value: "skill_rust".into(),
            },
        ];
        let result = apply_adjustments(&base, &adjustments);
        assert_eq!(result.applied.len(), 2);
        assert_eq!(result.failed.len(), 1);
    }
}
