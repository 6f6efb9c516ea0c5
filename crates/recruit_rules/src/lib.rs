//! Forward-chaining inference engine (C4) — spec.md §4.4.
//!
//! The engine is a pluggable evaluator: it takes a rule set and a context
//! and returns events, the way `terraphim_automata`'s matcher takes a
//! dictionary and a text and returns matches. The core never depends on a
//! specific rule DSL beyond the small [`Rule`]/[`RuleCondition`] shapes
//! defined here; the rules *themselves* are data, typically loaded from a
//! JSON file alongside the rest of the knowledge-base configuration.

use ahash::{AHashMap, AHashSet};
use recruit_types::{DerivedConstraint, DerivedEffect, SkillId};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(thiserror::Error, Debug)]
pub enum RuleError {
    #[error("rule {0} references unknown context field {1}")]
    UnknownField(String, String),
    #[error("rule set contains a duplicate rule id: {0}")]
    DuplicateRuleId(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;

/// A scalar or list value living in the working context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Number(f64),
    TextList(Vec<String>),
    Bool(bool),
}

impl ContextValue {
    fn contains(&self, needle: &str) -> bool {
        match self {
            ContextValue::TextList(list) => list.iter().any(|v| v == needle),
            ContextValue::Text(t) => t == needle,
            _ => false,
        }
    }
}

/// Deterministic, order-independent context hash used to detect the
/// forward-chaining fixpoint (spec.md §4.4 step 5).
fn hash_context(context: &AHashMap<String, ContextValue>) -> u64 {
    let mut keys: Vec<&String> = context.keys().collect();
    keys.sort();
    let mut hasher = ahash::AHasher::default();
    for key in keys {
        key.hash(&mut hasher);
        format!("{:?}", context.get(key)).hash(&mut hasher);
    }
    hasher.finish()
}

/// Working context threaded through the fixpoint loop. Fields the user set
/// explicitly are tagged so rules can distinguish them from inferred ones.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub fields: AHashMap<String, ContextValue>,
    pub user_set: AHashSet<String>,
}

impl Context {
    pub fn set(&mut self, field: impl Into<String>, value: ContextValue, user_set: bool) {
        let field = field.into();
        if user_set {
            self.user_set.insert(field.clone());
        }
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&ContextValue> {
        self.fields.get(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Contains,
    Exists,
}

/// One clause of a rule's `conditions` list. All clauses AND together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: Option<String>,
}

impl RuleCondition {
    fn matches(&self, context: &Context) -> bool {
        match self.operator {
            ConditionOperator::Exists => context.get(&self.field).is_some(),
            ConditionOperator::Equals => match (context.get(&self.field), &self.value) {
                (Some(ContextValue::Text(t)), Some(v)) => t == v,
                (Some(ContextValue::Number(n)), Some(v)) => {
                    v.parse::<f64>().map(|parsed| parsed == *n).unwrap_or(false)
                }
                (Some(ContextValue::Bool(b)), Some(v)) => {
                    v.parse::<bool>().map(|parsed| parsed == *b).unwrap_or(false)
                }
                _ => false,
            },
            ConditionOperator::Contains => match (context.get(&self.field), &self.value) {
                (Some(value), Some(needle)) => value.contains(needle),
                _ => false,
            },
        }
    }
}

/// `action.effect` of a [`Rule`] (spec.md §4.4 step 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum RuleAction {
    Filter { required_skill_ids: Vec<SkillId> },
    Boost { skill_id: SkillId, boost_strength: f64 },
}

/// A single forward-chaining rule. `depends_on` lists rule ids whose effect
/// this rule's conditions reference; if a dependency is overridden, this
/// rule is prevented from firing too (broken-chain handling, spec.md §4.4
/// step 3 and testable property 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub conditions: Vec<RuleCondition>,
    pub action: RuleAction,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Result of one [`RuleEngine::run`] call.
#[derive(Debug, Clone, Default)]
pub struct InferenceOutcome {
    pub derived_constraints: Vec<DerivedConstraint>,
    /// `true` iff the fixpoint was not reached within `max_iterations`
    /// (InferenceWarning, spec.md §7).
    pub warning: bool,
}

pub struct RuleEngine<'a> {
    rules: &'a [Rule],
}

impl<'a> RuleEngine<'a> {
    pub fn new(rules: &'a [Rule]) -> Result<Self> {
        let mut seen = AHashSet::new();
        for rule in rules {
            if !seen.insert(&rule.id) {
                return Err(RuleError::DuplicateRuleId(rule.id.clone()));
            }
        }
        Ok(Self { rules })
    }

    /// Runs the fixpoint loop described in spec.md §4.4.
    pub fn run(
        &self,
        mut context: Context,
        overridden_rule_ids: &AHashSet<String>,
        max_iterations: usize,
    ) -> InferenceOutcome {
        let mut fired: AHashMap<String, DerivedConstraint> = AHashMap::new();
        let mut broken_chain: AHashSet<String> = AHashSet::new();
        let mut warning = false;

        let mut previous_hash = hash_context(&context.fields);
        for iteration in 0..max_iterations.max(1) {
            for rule in self.rules {
                if fired.contains_key(&rule.id) {
                    continue;
                }
                if rule
                    .depends_on
                    .iter()
                    .any(|dep| broken_chain.contains(dep) || !fired.contains_key(dep))
                {
                    // Either the dependency hasn't fired yet (try again next
                    // iteration) or it's permanently broken — either way this
                    // rule cannot fire this round.
                    if rule
                        .depends_on
                        .iter()
                        .any(|dep| broken_chain.contains(dep))
                    {
                        broken_chain.insert(rule.id.clone());
                    }
                    continue;
                }
                if !rule.conditions.iter().all(|c| c.matches(&context)) {
                    continue;
                }

                let overridden = overridden_rule_ids.contains(&rule.id);
                let mut provenance: Vec<String> = rule
                    .conditions
                    .iter()
                    .map(|c| format!("{}={:?}", c.field, c.value))
                    .collect();
                provenance.extend(rule.depends_on.iter().cloned());

                let effect = match &rule.action {
                    RuleAction::Filter { required_skill_ids } => DerivedEffect::Filter {
                        required_skill_ids: required_skill_ids.clone(),
                    },
                    RuleAction::Boost {
                        skill_id,
                        boost_strength,
                    } => DerivedEffect::Boost {
                        skill_id: skill_id.clone(),
                        boost_strength: *boost_strength,
                    },
                };

                let constraint = DerivedConstraint {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    effect: effect.clone(),
                    provenance,
                    overridden: if overridden {
                        Some(recruit_types::OverrideRecord {
                            override_scope: recruit_types::OverrideScope::Full,
                        })
                    } else {
                        None
                    },
                };

                if overridden {
                    broken_chain.insert(rule.id.clone());
                } else if let DerivedEffect::Filter { required_skill_ids } = &effect {
                    // Merge filter effects into the working context as if
                    // user-requested, tagged source=inference (step 4).
                    let existing = context
                        .fields
                        .get("derivedRequiredSkillIds")
                        .cloned()
                        .map(|v| match v {
                            ContextValue::TextList(list) => list,
                            _ => Vec::new(),
                        })
                        .unwrap_or_default();
                    let mut merged = existing;
                    for id in required_skill_ids {
                        if !merged.contains(&id.0) {
                            merged.push(id.0.clone());
                        }
                    }
                    context.set(
                        "derivedRequiredSkillIds",
                        ContextValue::TextList(merged),
                        false,
                    );
                }

                fired.insert(rule.id.clone(), constraint);
            }

            let current_hash = hash_context(&context.fields);
            if current_hash == previous_hash {
                // Context stopped changing: either every rule has fired or
                // is blocked, or the remaining rules' conditions just don't
                // hold. Either way this is a converged fixpoint, not a
                // warning condition.
                break;
            }
            previous_hash = current_hash;
            if iteration == max_iterations.max(1) - 1 {
                warning = true;
            }
        }

        InferenceOutcome {
            derived_constraints: fired.into_values().collect(),
            warning,
        }
    }
}

/// Flattens active (non-overridden) filter effects into a deduplicated
/// skill id list — `derivedRequiredSkillIds` (spec.md §4.4 post-processing).
pub fn derived_required_skill_ids(constraints: &[DerivedConstraint]) -> Vec<SkillId> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for constraint in constraints {
        if !constraint.is_active() {
            continue;
        }
        if let DerivedEffect::Filter { required_skill_ids } = &constraint.effect {
            for id in required_skill_ids {
                if seen.insert(id.clone()) {
                    out.push(id.clone());
                }
            }
        }
    }
    out
}

/// Max boost strength per skill across all firing, active boost rules
/// (spec.md §4.4 post-processing).
pub fn derived_skill_boosts(constraints: &[DerivedConstraint]) -> AHashMap<SkillId, f64> {
    let mut boosts: AHashMap<SkillId, f64> = AHashMap::new();
    for constraint in constraints {
        if !constraint.is_active() {
            continue;
        }
        if let DerivedEffect::Boost {
            skill_id,
            boost_strength,
        } = &constraint.effect
        {
            let entry = boosts.entry(skill_id.clone()).or_insert(0.0);
            if *boost_strength > *entry {
                *entry = *boost_strength;
            }
        }
    }
    boosts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, field: &str, value: &str, skills: &[&str], depends_on: &[&str]) -> Rule {
        Rule {
            id: id.to_string(),
            name: format!("rule {id}"),
            conditions: vec![RuleCondition {
                field: field.to_string(),
                operator: ConditionOperator::Equals,
                value: Some(value.to_string()),
            }],
            action: RuleAction::Filter {
                required_skill_ids: skills.iter().map(|s| SkillId::new(*s)).collect(),
            },
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn fires_simple_rule_and_flattens_output() {
        let rules = vec![rule("r1", "teamFocus", "scaling", &["skill_distributed"], &[])];
        let engine = RuleEngine::new(&rules).unwrap();
        let mut ctx = Context::default();
        ctx.set(
            "teamFocus",
            ContextValue::Text("scaling".to_string()),
            true,
        );
        let outcome = engine.run(ctx, &AHashSet::new(), 10);
        assert!(!outcome.warning);
        assert_eq!(outcome.derived_constraints.len(), 1);
        let ids = derived_required_skill_ids(&outcome.derived_constraints);
        assert_eq!(ids, vec![SkillId::new("skill_distributed")]);
    }

    #[test]
    fn override_breaks_downstream_chain() {
        let rules = vec![
            rule(
                "scaling-requires-distributed",
                "teamFocus",
                "scaling",
                &["skill_distributed"],
                &[],
            ),
            rule(
                "distributed-requires-monitoring",
                "teamFocus",
                "scaling",
                &["skill_monitoring"],
                &["scaling-requires-distributed"],
            ),
        ];
        let engine = RuleEngine::new(&rules).unwrap();
        let mut ctx = Context::default();
        ctx.set(
            "teamFocus",
            ContextValue::Text("scaling".to_string()),
            true,
        );
        let mut overridden = AHashSet::new();
        overridden.insert("scaling-requires-distributed".to_string());

        let outcome = engine.run(ctx, &overridden, 10);
        let ids = derived_required_skill_ids(&outcome.derived_constraints);
        assert!(!ids.contains(&SkillId::new("skill_distributed")));
        assert!(!ids.contains(&SkillId::new("skill_monitoring")));

        let recorded = outcome
            .derived_constraints
            .iter()
            .find(|c| c.rule_id == "scaling-requires-distributed")
            .unwrap();
        assert_eq!(
            recorded.overridden.as_ref().unwrap().override_scope,
            recruit_types::OverrideScope::Full
        );
        assert!(outcome
            .derived_constraints
            .iter()
            .all(|c| c.rule_id != "distributed-requires-monitoring"));
    }

    #[test]
    fn max_boost_wins_across_rules() {
        let boost_rule = |id: &str, strength: f64| Rule {
            id: id.to_string(),
            name: id.to_string(),
            conditions: vec![],
            action: RuleAction::Boost {
                skill_id: SkillId::new("skill_kubernetes"),
                boost_strength: strength,
            },
            depends_on: vec![],
        };
        let rules = vec![boost_rule("b1", 0.3), boost_rule("b2", 0.8)];
        let engine = RuleEngine::new(&rules).unwrap();
        let outcome = engine.run(Context::default(), &AHashSet::new(), 10);
        let boosts = derived_skill_boosts(&outcome.derived_constraints);
        assert_eq!(boosts[&SkillId::new("skill_kubernetes")], 0.8);
    }
}
