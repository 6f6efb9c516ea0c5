//! Critique engine types (C11) — spec.md §4.11.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A property the critique table can combine, e.g. `"seniority"`,
/// `"timezone"`, `"skills"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CritiqueProperty(pub String);

/// Direction for an `Adjust` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdjustDirection {
    Loosen,
    Tighten,
}

/// One step the critique interpreter can apply to a base request
/// (spec.md §4.11).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CritiqueAdjustment {
    Adjust {
        property: CritiqueProperty,
        direction: AdjustDirection,
    },
    Set {
        property: CritiqueProperty,
        value: String,
    },
    Add {
        property: CritiqueProperty,
        value: String,
    },
    Remove {
        property: CritiqueProperty,
        value: String,
    },
}

/// A dynamically generated 1- or 2-property suggestion (spec.md §4.11).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CritiqueSuggestion {
    pub properties: Vec<CritiqueProperty>,
    pub description: String,
    pub support: f64,
    pub adjustments: Vec<CritiqueAdjustment>,
}

/// Outcome of applying one [`CritiqueAdjustment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AppliedAdjustment {
    pub adjustment: CritiqueAdjustment,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FailedAdjustment {
    pub adjustment: CritiqueAdjustment,
    pub reason: String,
}

/// Result of the critique interpreter applying a suggestion's adjustments
/// to a base request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CritiqueApplyResult {
    pub request: crate::SearchRequest,
    pub applied: Vec<AppliedAdjustment>,
    pub failed: Vec<FailedAdjustment>,
}
