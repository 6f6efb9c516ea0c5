//! Output of the utility calculator (C7) — spec.md §4.7.

use ahash::AHashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `U(v) = sum(w_j * f_j(v_j))`, broken down per attribute.
///
/// `scores` and `preference_matches` only carry non-zero entries — a
/// component that a request never asked about (e.g. `budgetMatch` when no
/// budget was requested) simply never appears, matching spec.md §4.7.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Weighted contributions, keyed by function name (e.g. `"skillMatch"`).
    pub scores: AHashMap<String, f64>,
    /// Normalised (pre-weight) `[0, 1]` value per function, for the
    /// advisor/critique explanations.
    pub raw_scores: AHashMap<String, f64>,
    /// Human-readable preference match descriptions (non-zero only).
    pub preference_matches: AHashMap<String, String>,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn add(&mut self, name: &str, raw: f64, weight: f64) {
        if raw.abs() <= f64::EPSILON {
            return;
        }
        let weighted = raw * weight;
        self.scores.insert(name.to_string(), weighted);
        self.raw_scores.insert(name.to_string(), raw);
        self.total += weighted;
    }
}
