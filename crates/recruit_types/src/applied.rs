//! Audit and advisor-facing constraint representations (spec.md §3, §4.9).

use crate::{FilterSource, ProficiencyLevel, SkillId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Operators a [`PropertyFilter`] can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ComparisonOperator {
    Gte,
    Lte,
    Lt,
    In,
    Between,
    /// "STARTS WITH (any of)" — OR of one-or-more prefix predicates.
    StartsWithAny,
}

/// A single scalar, used as a property filter's bound value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
    TextList(Vec<String>),
}

/// `AppliedFilter` tagged union (spec.md §3). Every enforced predicate, of
/// either shape, is logged here — never silently omitted (invariant 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppliedFilter {
    PropertyFilter {
        field: String,
        operator: ComparisonOperator,
        value: ScalarValue,
        source: FilterSource,
    },
    SkillFilter {
        skills: Vec<SkillId>,
        #[serde(rename = "displayValue")]
        display_value: String,
        source: FilterSource,
        #[serde(rename = "ruleId")]
        rule_id: Option<String>,
    },
}

/// Scored (not filtered) predicate, collected for utility evidence and
/// surfaced for UI transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPreference {
    pub field: String,
    pub description: String,
    pub source: FilterSource,
}

/// Field classification the advisor needs to pick a relaxation shape
/// (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FieldType {
    Numeric,
    String,
    StringArray,
}

/// A ready-to-run Cypher-shaped fragment backing a [`TestableConstraint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CypherFragment {
    pub clause: String,
    pub param_name: String,
    pub param_value: ScalarValue,
}

/// Origin of a skill-traversal constraint considered by the advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConstraintOrigin {
    User,
    Derived,
}

/// `TestableConstraint` tagged union (spec.md §3, §4.9): the decomposed,
/// independently-droppable unit the advisor's MCS search operates over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "constraintType", rename_all = "snake_case")]
pub enum TestableConstraint {
    PropertyConstraint {
        id: String,
        #[serde(rename = "fieldType")]
        field_type: FieldType,
        cypher: CypherFragment,
        /// API-facing field name this constraint re-tests against, kept
        /// alongside `cypher` so the advisor's re-run evaluator doesn't
        /// need to parse Cypher text back out (spec.md §4.9).
        field: String,
        operator: ComparisonOperator,
        value: ScalarValue,
    },
    SkillTraversalConstraint {
        id: String,
        origin: ConstraintOrigin,
        #[serde(rename = "skillIds")]
        skill_ids: Vec<SkillId>,
        #[serde(rename = "ruleId")]
        rule_id: Option<String>,
        /// `None` for derived (existence-only) constraints; `Some(p)` for a
        /// user HAS_ANY requirement re-tested at proficiency `p`.
        #[serde(rename = "minProficiency")]
        min_proficiency: Option<ProficiencyLevel>,
    },
}

impl TestableConstraint {
    pub fn id(&self) -> &str {
        match self {
            TestableConstraint::PropertyConstraint { id, .. } => id,
            TestableConstraint::SkillTraversalConstraint { id, .. } => id,
        }
    }
}
