//! Core type definitions for the constraint-aware engineer recommender.
//!
//! This crate provides the data structures shared by every other crate in
//! the workspace:
//!
//! - **Graph entities**: [`Engineer`], [`SkillNode`], [`DomainNode`] — the
//!   read-only shapes we expect from whatever labelled-property graph backs
//!   the deployment.
//! - **Request/response DTOs**: [`SearchRequest`], [`ExpandedCriteria`],
//!   [`EngineerMatch`], [`SearchResponse`].
//! - **Constraint bookkeeping**: [`AppliedFilter`], [`TestableConstraint`],
//!   [`DerivedConstraint`].
//!
//! None of these types carry behaviour beyond small invariant-preserving
//! constructors; the algorithms that produce and consume them live in
//! `recruit_graph`, `recruit_rules` and `recruit_service`.

mod applied;
mod critique;
mod expanded;
mod graph_entities;
mod match_;
mod request;
mod response;
mod score;

pub use applied::*;
pub use critique::*;
pub use expanded::*;
pub use graph_entities::*;
pub use match_::*;
pub use request::*;
pub use response::*;
pub use score::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a skill graph node, shared by leaves and categories alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct SkillId(pub String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SkillId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SkillId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Identifier for a business- or technical-domain graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct DomainId(pub String);

impl DomainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DomainId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier for an engineer node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct EngineerId(pub String);

impl EngineerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EngineerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EngineerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which domain hierarchy a requirement or resolved set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Business,
    Technical,
}

/// `UserSkill.proficiencyLevel`. Ordered `learning < proficient < expert`
/// per spec.md §4.1 — derive order matches declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    Learning,
    Proficient,
    Expert,
}

impl ProficiencyLevel {
    /// The stricter of two proficiency requirements (invariant 1, spec.md §3).
    pub fn stricter(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProficiencyLevel::Learning => "learning",
            ProficiencyLevel::Proficient => "proficient",
            ProficiencyLevel::Expert => "expert",
        };
        write!(f, "{s}")
    }
}

/// `Engineer.startTimeline`. Ordered from soonest to furthest out so that
/// "up to and including the required max" (spec.md §4.3) is a simple prefix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StartTimeline {
    Immediate,
    TwoWeeks,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl StartTimeline {
    pub const ALL: [StartTimeline; 6] = [
        StartTimeline::Immediate,
        StartTimeline::TwoWeeks,
        StartTimeline::OneMonth,
        StartTimeline::ThreeMonths,
        StartTimeline::SixMonths,
        StartTimeline::OneYear,
    ];

    /// All enum values up to and including `self`, in ascending order.
    pub fn up_to_inclusive(self) -> Vec<StartTimeline> {
        Self::ALL.iter().copied().filter(|t| *t <= self).collect()
    }
}

impl fmt::Display for StartTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StartTimeline::Immediate => "immediate",
            StartTimeline::TwoWeeks => "two_weeks",
            StartTimeline::OneMonth => "one_month",
            StartTimeline::ThreeMonths => "three_months",
            StartTimeline::SixMonths => "six_months",
            StartTimeline::OneYear => "one_year",
        };
        write!(f, "{s}")
    }
}

/// `SearchRequest.requiredSeniorityLevel`. Maps to a year range via the
/// fixed table in spec.md §4.3.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Junior,
    Mid,
    Senior,
    Staff,
    Principal,
}

impl fmt::Display for SeniorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SeniorityLevel::Junior => "junior",
            SeniorityLevel::Mid => "mid",
            SeniorityLevel::Senior => "senior",
            SeniorityLevel::Staff => "staff",
            SeniorityLevel::Principal => "principal",
        };
        write!(f, "{s}")
    }
}

/// `(min, max)` years range, half-open — `max = None` means unbounded
/// (used by `staff`/`principal` in the default seniority table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearsRange {
    pub min: f64,
    pub max: Option<f64>,
}

impl YearsRange {
    pub fn contains(&self, years: f64) -> bool {
        years >= self.min && self.max.map(|max| years < max).unwrap_or(true)
    }
}

/// Identifier for a team-focus alignment bucket (e.g. `"backend"`,
/// `"platform"`). Kept as a validated free-form identifier, resolved
/// against `KnowledgeBaseConfig.team_focus_alignments` rather than a closed
/// Rust enum, so deployments can add focuses without a recompile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TeamFocus(pub String);

impl TeamFocus {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TeamFocus {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Origin tag threaded through every audited predicate (spec.md §3 invariant 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterSource {
    User,
    KnowledgeBase,
    Inference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proficiency_ordering() {
        assert!(ProficiencyLevel::Learning < ProficiencyLevel::Proficient);
        assert!(ProficiencyLevel::Proficient < ProficiencyLevel::Expert);
        assert_eq!(
            ProficiencyLevel::Learning.stricter(ProficiencyLevel::Expert),
            ProficiencyLevel::Expert
        );
    }

    #[test]
    fn start_timeline_prefix() {
        let up_to = StartTimeline::OneMonth.up_to_inclusive();
        assert_eq!(
            up_to,
            vec![
                StartTimeline::Immediate,
                StartTimeline::TwoWeeks,
                StartTimeline::OneMonth
            ]
        );
    }

    #[test]
    fn years_range_half_open() {
        let range = YearsRange {
            min: 6.0,
            max: Some(10.0),
        };
        assert!(range.contains(6.0));
        assert!(range.contains(9.99));
        assert!(!range.contains(10.0));

        let unbounded = YearsRange {
            min: 15.0,
            max: None,
        };
        assert!(unbounded.contains(50.0));
    }
}
