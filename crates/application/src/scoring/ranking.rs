//! Competition-wide participant ranking.
//!
//! The ranking is recomputed on demand from the full submission set rather
//! than maintained incrementally; with per-challenge final scores already
//! aggregated on each submission the reduction is a single pass.

use chrono::{DateTime, Utc};
use contest_common::RankingMode;
use contest_domain::evaluation::Submission;
use contest_domain::identifiers::ParticipantId;
use contest_domain::rubric::round2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the participant ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedParticipant {
    /// 1-based position, best first
    pub rank: u32,
    pub participant_id: ParticipantId,
    /// Overall score under the configured ranking mode, rounded to two
    /// decimals for display
    pub overall_score: f64,
    /// Number of challenges with at least one evaluation
    pub challenges_scored: usize,
    /// Timestamp of the participant's earliest submission, used to break
    /// score ties in favour of the earlier submitter
    pub first_submission_at: DateTime<Utc>,
}

/// Inputs to a ranking computation
#[derive(Debug, Clone)]
pub struct RankingInputs<'a> {
    pub mode: RankingMode,
    pub submissions: &'a [Submission],
}

/// Stateless ranking calculator
#[derive(Debug, Clone)]
pub struct ParticipantRanking {
    mode: RankingMode,
}

struct Accumulator {
    total: f64,
    scored: usize,
    first_submission_at: DateTime<Utc>,
}

impl ParticipantRanking {
    pub fn new(mode: RankingMode) -> Self {
        Self { mode }
    }

    /// Rank every participant that has submitted anything.
    ///
    /// Unscored submissions still register the participant (and their
    /// first-submission timestamp) but contribute no points. Ties on the
    /// overall score go to the participant who submitted first.
    pub fn compute(&self, submissions: &[Submission]) -> Vec<RankedParticipant> {
        let mut by_participant: BTreeMap<ParticipantId, Accumulator> = BTreeMap::new();

        for submission in submissions {
            let entry = by_participant
                .entry(submission.participant_id)
                .or_insert(Accumulator {
                    total: 0.0,
                    scored: 0,
                    first_submission_at: submission.submitted_at,
                });

            if submission.submitted_at < entry.first_submission_at {
                entry.first_submission_at = submission.submitted_at;
            }

            if let Some(score) = submission.final_score() {
                entry.total += score;
                entry.scored += 1;
            }
        }

        let mut rows: Vec<RankedParticipant> = by_participant
            .into_iter()
            .map(|(participant_id, acc)| {
                let overall = match self.mode {
                    RankingMode::Sum => acc.total,
                    RankingMode::Percentage => {
                        if acc.scored == 0 {
                            0.0
                        } else {
                            acc.total / acc.scored as f64
                        }
                    }
                };
                RankedParticipant {
                    rank: 0,
                    participant_id,
                    overall_score: round2(overall),
                    challenges_scored: acc.scored,
                    first_submission_at: acc.first_submission_at,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.overall_score
                .total_cmp(&a.overall_score)
                .then_with(|| a.first_submission_at.cmp(&b.first_submission_at))
                .then_with(|| a.participant_id.cmp(&b.participant_id))
        });

        for (index, row) in rows.iter_mut().enumerate() {
            row.rank = (index + 1) as u32;
        }

        rows
    }

    /// Compute from bundled inputs.
    pub fn compute_from(inputs: RankingInputs<'_>) -> Vec<RankedParticipant> {
        Self::new(inputs.mode).compute(inputs.submissions)
    }
}
