//! Evaluation records and submission-level score aggregation.
//!
//! Each submission accumulates at most one `EvaluationRecord` per evaluator;
//! re-scoring replaces the prior record for that (submission, evaluator)
//! pair. Evaluators are a tagged union of automated models and human judges
//! so the group-equal aggregation rule is enforced by the type rather than by
//! key-presence checks.

use crate::identifiers::{ChallengeId, EvaluatorId, ParticipantId, SubmissionId};
use crate::rubric::{round2, Rubric, ScoreSheet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Evaluator class: automated scoring model or human judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    AutomatedModel,
    HumanJudge,
}

/// One evaluator's recorded scoring of one submission
///
/// `weighted_total` is derived from the score sheet through the rubric
/// scorer; it is never independently authored and is recomputed whenever the
/// rubric changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub evaluator_id: EvaluatorId,
    pub kind: EvaluatorKind,
    pub score_sheet: ScoreSheet,
    pub weighted_total: f64,
    pub recorded_at: DateTime<Utc>,
}

impl EvaluationRecord {
    /// Build a record by scoring `sheet` against `rubric` now.
    pub fn score_now(
        evaluator_id: EvaluatorId,
        kind: EvaluatorKind,
        sheet: ScoreSheet,
        rubric: &Rubric,
    ) -> Self {
        let weighted_total = rubric.score(&sheet);
        Self {
            evaluator_id,
            kind,
            score_sheet: sheet,
            weighted_total,
            recorded_at: Utc::now(),
        }
    }
}

/// A participant's response to one challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub participant_id: ParticipantId,
    pub challenge_id: ChallengeId,
    pub prompt_text: String,
    /// Keyed by evaluator so a re-score replaces, never accumulates.
    pub evaluation_records: BTreeMap<EvaluatorId, EvaluationRecord>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        participant_id: ParticipantId,
        challenge_id: ChallengeId,
        prompt_text: impl Into<String>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            participant_id,
            challenge_id,
            prompt_text: prompt_text.into(),
            evaluation_records: BTreeMap::new(),
            submitted_at: Utc::now(),
        }
    }

    /// Record an evaluation, replacing any prior record by the same evaluator.
    pub fn record_evaluation(&mut self, record: EvaluationRecord) {
        self.evaluation_records.insert(record.evaluator_id, record);
    }

    /// Recompute every record's weighted total against `rubric`.
    ///
    /// Weighted totals are derived data; after a rubric change the stored
    /// totals are stale and must be refreshed from the raw sheets.
    pub fn rescore_all(&mut self, rubric: &Rubric) {
        for record in self.evaluation_records.values_mut() {
            record.weighted_total = rubric.score(&record.score_sheet);
        }
    }

    /// Aggregate score across all evaluators, or None when unscored.
    ///
    /// When only one evaluator class is present the result is the mean of
    /// that class's weighted totals. When both automated models and human
    /// judges have scored, the two class means are averaged so a large model
    /// panel cannot drown out a single judge.
    pub fn final_score(&self) -> Option<f64> {
        if self.evaluation_records.is_empty() {
            return None;
        }

        let totals_of = |kind: EvaluatorKind| -> Vec<f64> {
            self.evaluation_records
                .values()
                .filter(|r| r.kind == kind)
                .map(|r| r.weighted_total)
                .collect()
        };

        let model_scores = totals_of(EvaluatorKind::AutomatedModel);
        let judge_scores = totals_of(EvaluatorKind::HumanJudge);

        let score = match (mean(&model_scores), mean(&judge_scores)) {
            (Some(models), Some(judges)) => (models + judges) / 2.0,
            (Some(models), None) => models,
            (None, Some(judges)) => judges,
            (None, None) => return None,
        };

        Some(round2(score))
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
