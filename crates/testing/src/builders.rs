//! Fluent builder pattern for constructing test data.
//!
//! This module provides builder structs for creating complex domain entities
//! with a fluent API for customization.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

use contest_domain::batch::{
    plan_equal_distribution, BatchSpec, CompetitionWindow, Distribution,
};
use contest_domain::evaluation::{EvaluationRecord, EvaluatorKind, Submission};
use contest_domain::identifiers::{ChallengeId, CompetitionId, EvaluatorId, ParticipantId};
use contest_domain::rubric::{Criterion, Rubric};

use crate::fixtures::{create_test_window, create_uniform_sheet};

/// Builder for creating Rubric test instances
#[derive(Clone, Default)]
pub struct RubricBuilder {
    criteria: Vec<Criterion>,
}

impl RubricBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criterion(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.criteria.push(Criterion::new(name, "", weight));
        self
    }

    pub fn build(self) -> Rubric {
        Rubric::new(self.criteria)
    }
}

/// Builder for creating Submission test instances
#[derive(Clone)]
pub struct SubmissionBuilder {
    participant_id: ParticipantId,
    challenge_id: ChallengeId,
    prompt: String,
    records: Vec<EvaluationRecord>,
}

impl SubmissionBuilder {
    pub fn new() -> Self {
        Self {
            participant_id: ParticipantId::new(),
            challenge_id: ChallengeId::new(),
            prompt: "test prompt".to_string(),
            records: Vec::new(),
        }
    }

    pub fn with_participant(mut self, id: ParticipantId) -> Self {
        self.participant_id = id;
        self
    }

    pub fn with_challenge(mut self, id: ChallengeId) -> Self {
        self.challenge_id = id;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Attach a human-judge evaluation rating every criterion at `raw`.
    pub fn scored(self, raw: f64, rubric: &Rubric) -> Self {
        self.evaluated_by(EvaluatorKind::HumanJudge, raw, rubric)
    }

    /// Attach an evaluation of `kind` rating every criterion at `raw`.
    pub fn evaluated_by(mut self, kind: EvaluatorKind, raw: f64, rubric: &Rubric) -> Self {
        self.records.push(EvaluationRecord::score_now(
            EvaluatorId::new(),
            kind,
            create_uniform_sheet(rubric, raw),
            rubric,
        ));
        self
    }

    pub fn build(self) -> Submission {
        let mut submission = Submission::new(self.participant_id, self.challenge_id, self.prompt);
        for record in self.records {
            submission.record_evaluation(record);
        }
        submission
    }
}

impl Default for SubmissionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating BatchSpec test instances
#[derive(Clone)]
pub struct BatchSpecBuilder {
    name: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    challenge_ids: BTreeSet<ChallengeId>,
    capacity: Option<usize>,
    emergency: bool,
}

impl BatchSpecBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let window = create_test_window();
        Self {
            name: name.into(),
            start_time: window.start + Duration::hours(1),
            end_time: window.start + Duration::hours(4),
            challenge_ids: [ChallengeId::new()].into_iter().collect(),
            capacity: None,
            emergency: false,
        }
    }

    pub fn with_times(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn with_challenge(mut self, id: ChallengeId) -> Self {
        self.challenge_ids.insert(id);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn emergency(mut self) -> Self {
        self.emergency = true;
        self
    }

    pub fn build(self) -> BatchSpec {
        BatchSpec {
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            challenge_ids: self.challenge_ids,
            capacity: self.capacity,
            emergency: self.emergency,
        }
    }
}

/// Builder for creating finalized Distribution test instances
pub struct DistributionBuilder {
    competition_id: CompetitionId,
    window: CompetitionWindow,
    participant_count: usize,
    batch_count: usize,
    seed: u64,
}

impl DistributionBuilder {
    pub fn new() -> Self {
        Self {
            competition_id: CompetitionId::new(),
            window: create_test_window(),
            participant_count: 12,
            batch_count: 3,
            seed: 42,
        }
    }

    pub fn with_competition(mut self, id: CompetitionId) -> Self {
        self.competition_id = id;
        self
    }

    pub fn with_participants(mut self, count: usize) -> Self {
        self.participant_count = count;
        self
    }

    pub fn with_batches(mut self, count: usize) -> Self {
        self.batch_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build a distribution with every participant assigned.
    pub fn build(self) -> Distribution {
        let mut distribution = Distribution::new(self.competition_id, self.window);
        let participants: Vec<ParticipantId> = (0..self.participant_count)
            .map(|_| ParticipantId::new())
            .collect();
        for participant in &participants {
            distribution.register(*participant);
        }

        let specs: Vec<BatchSpec> = (0..self.batch_count)
            .map(|i| {
                let mut spec = BatchSpecBuilder::new(format!("batch-{i}")).build();
                spec.start_time = self.window.start + Duration::hours(1);
                spec.end_time = self.window.start + Duration::hours(4);
                spec
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let planned = plan_equal_distribution(&participants, specs, &mut rng)
            .expect("builder specs are well-formed");
        distribution
            .finalize(planned)
            .expect("planned batches cover the registered population");
        distribution
    }
}

impl Default for DistributionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
