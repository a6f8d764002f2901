//! Test fixtures for generating domain entities with realistic data.
//!
//! This module provides functions to create test instances of the engine's
//! domain types with sensible defaults and optional randomization.

use chrono::{Duration, Utc};
use fake::{
    faker::lorem::en::{Sentence, Word, Words},
    Fake,
};
use std::collections::BTreeSet;

use contest_domain::batch::{BatchSpec, CompetitionWindow};
use contest_domain::evaluation::{EvaluationRecord, EvaluatorKind, Submission};
use contest_domain::identifiers::{ChallengeId, EvaluatorId, ParticipantId};
use contest_domain::rubric::{Criterion, Rubric, ScoreSheet};
use contest_domain::vote::{ChallengeVoteBook, DEFAULT_PRIOR_WEIGHT};

/// Create a three-criterion rubric with uneven weights.
pub fn create_test_rubric() -> Rubric {
    Rubric::new(vec![
        Criterion::new("accuracy", Sentence(3..6).fake::<String>(), 3.0),
        Criterion::new("clarity", Sentence(3..6).fake::<String>(), 2.0),
        Criterion::new("style", Sentence(3..6).fake::<String>(), 1.0),
    ])
}

/// Create a score sheet rating every criterion of `rubric` at `raw`.
pub fn create_uniform_sheet(rubric: &Rubric, raw: f64) -> ScoreSheet {
    let mut sheet = ScoreSheet::new();
    for criterion in &rubric.criteria {
        sheet.set(criterion.name.clone(), raw);
    }
    sheet
}

/// Create an unscored submission on a fresh challenge.
pub fn create_test_submission() -> Submission {
    Submission::new(
        ParticipantId::new(),
        ChallengeId::new(),
        Words(5..12).fake::<Vec<String>>().join(" "),
    )
}

/// Create a submission carrying one human-judge evaluation at `raw`.
pub fn create_scored_submission(rubric: &Rubric, raw: f64) -> Submission {
    let mut submission = create_test_submission();
    submission.record_evaluation(EvaluationRecord::score_now(
        EvaluatorId::new(),
        EvaluatorKind::HumanJudge,
        create_uniform_sheet(rubric, raw),
        rubric,
    ));
    submission
}

/// Create a week-long competition window starting now.
pub fn create_test_window() -> CompetitionWindow {
    let start = Utc::now();
    CompetitionWindow {
        start,
        end: start + Duration::days(7),
    }
}

/// Create a batch spec sitting inside [`create_test_window`].
pub fn create_test_batch_spec() -> BatchSpec {
    let window = create_test_window();
    BatchSpec {
        name: Word().fake(),
        start_time: window.start + Duration::hours(1),
        end_time: window.start + Duration::hours(4),
        challenge_ids: [ChallengeId::new()].into_iter().collect::<BTreeSet<_>>(),
        capacity: None,
        emergency: false,
    }
}

/// Create `count` batch specs with distinct names.
pub fn create_test_batch_specs(count: usize) -> Vec<BatchSpec> {
    (0..count)
        .map(|i| {
            let mut spec = create_test_batch_spec();
            spec.name = format!("batch-{i}");
            spec
        })
        .collect()
}

/// Create a vote book holding `votes` accepted votes on one submission.
pub fn create_test_vote_book(votes: u64) -> ChallengeVoteBook {
    let challenge_id = ChallengeId::new();
    let mut book = ChallengeVoteBook::new(challenge_id, DEFAULT_PRIOR_WEIGHT);
    let submission = create_test_submission();
    for i in 0..votes {
        let score = (i % 5) as u8 + 1;
        // Distinct voters; the owner never votes.
        book.record_vote(
            ParticipantId::new(),
            submission.id,
            submission.participant_id,
            score,
            Utc::now(),
        )
        .expect("fixture votes are protocol-clean");
    }
    book
}
