//! Rubric definitions and the weighted rubric scorer.
//!
//! A rubric is an ordered set of weighted criteria for one challenge. Weights
//! need not sum to 1; they are normalized at scoring time. The scorer is a
//! pure function: same sheet and rubric always produce the same total.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw scores are clamped into this range before weighting.
pub const RAW_SCORE_MIN: f64 = 0.0;
/// Upper bound for a raw criterion score.
pub const RAW_SCORE_MAX: f64 = 100.0;

/// One weighted scoring criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub description: String,
    /// Relative weight, must be positive. Not required to sum to 1 across a rubric.
    pub weight: f64,
}

impl Criterion {
    pub fn new(name: impl Into<String>, description: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            weight,
        }
    }
}

/// Per-criterion raw scores produced by one evaluator for one submission.
///
/// Keys are criterion names; values are raw scores in `[0, 100]`. The map
/// preserves insertion order so sheets render in rubric order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSheet(pub IndexMap<String, f64>);

impl ScoreSheet {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Record a raw score for a criterion, clamped into `[0, 100]`.
    pub fn set(&mut self, criterion: impl Into<String>, raw: f64) -> &mut Self {
        self.0
            .insert(criterion.into(), raw.clamp(RAW_SCORE_MIN, RAW_SCORE_MAX));
        self
    }

    /// Raw score for a criterion; missing criteria score 0.
    pub fn get(&self, criterion: &str) -> f64 {
        self.0.get(criterion).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ScoreSheet {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut sheet = ScoreSheet::new();
        for (k, v) in iter {
            sheet.set(k, v);
        }
        sheet
    }
}

/// Ordered set of weighted criteria for one challenge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub criteria: Vec<Criterion>,
}

impl Rubric {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Sum of all criterion weights
    pub fn total_weight(&self) -> f64 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    /// Compute the normalized weighted total for a score sheet.
    ///
    /// Each criterion contributes `raw * (weight / total_weight)`; missing
    /// criteria contribute 0 and raw inputs are re-clamped defensively. The
    /// result is rounded to two decimal places and always lies in `[0, 100]`.
    /// An empty rubric or zero total weight scores 0 (never divides by zero).
    pub fn score(&self, sheet: &ScoreSheet) -> f64 {
        if self.criteria.is_empty() {
            return 0.0;
        }

        let total_weight = self.total_weight();
        if total_weight == 0.0 {
            return 0.0;
        }

        let total: f64 = self
            .criteria
            .iter()
            .map(|c| {
                let raw = sheet.get(&c.name).clamp(RAW_SCORE_MIN, RAW_SCORE_MAX);
                raw * (c.weight / total_weight)
            })
            .sum();

        round2(total)
    }
}

/// Round to two decimal places, the display precision for weighted totals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
