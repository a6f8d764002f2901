//! Submission repository implementation.
//!
//! In-memory backed store for submissions and the per-challenge rubrics they
//! are scored against. Challenges are registered under a competition so the
//! competition-wide listing can resolve membership.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use contest_application::services::SubmissionRepositoryPort;
use contest_application::ApplicationError;
use contest_domain::evaluation::Submission;
use contest_domain::identifiers::{ChallengeId, CompetitionId, SubmissionId};
use contest_domain::rubric::Rubric;

/// A challenge as the store knows it: which competition it belongs to and
/// the rubric its submissions are scored with.
#[derive(Debug, Clone)]
struct ChallengeRecord {
    competition_id: CompetitionId,
    rubric: Rubric,
}

/// In-memory submission repository.
///
/// Reads take a shared lock, writes an exclusive one. No lock is held across
/// an await point.
#[derive(Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<HashMap<SubmissionId, Submission>>,
    challenges: RwLock<HashMap<ChallengeId, ChallengeRecord>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a challenge under a competition with its scoring rubric.
    ///
    /// Registering the same challenge again replaces the rubric; existing
    /// evaluation records keep their stored totals until a re-score.
    pub fn register_challenge(
        &self,
        competition_id: CompetitionId,
        challenge_id: ChallengeId,
        rubric: Rubric,
    ) {
        debug!(%competition_id, %challenge_id, "Challenge registered");
        self.challenges.write().insert(
            challenge_id,
            ChallengeRecord {
                competition_id,
                rubric,
            },
        );
    }

    /// Competition a challenge belongs to, if registered.
    pub fn competition_for_challenge(&self, challenge_id: ChallengeId) -> Option<CompetitionId> {
        self.challenges
            .read()
            .get(&challenge_id)
            .map(|record| record.competition_id)
    }
}

#[async_trait]
impl SubmissionRepositoryPort for InMemorySubmissionRepository {
    async fn get(&self, id: SubmissionId) -> Result<Option<Submission>, ApplicationError> {
        Ok(self.submissions.read().get(&id).cloned())
    }

    async fn save(&self, submission: &Submission) -> Result<(), ApplicationError> {
        self.submissions
            .write()
            .insert(submission.id, submission.clone());
        Ok(())
    }

    async fn list_by_competition(
        &self,
        competition_id: CompetitionId,
    ) -> Result<Vec<Submission>, ApplicationError> {
        let challenges = self.challenges.read();
        let submissions = self.submissions.read();

        let mut matched: Vec<Submission> = submissions
            .values()
            .filter(|s| {
                challenges
                    .get(&s.challenge_id)
                    .is_some_and(|record| record.competition_id == competition_id)
            })
            .cloned()
            .collect();
        // Stable order for callers that paginate.
        matched.sort_by_key(|s| (s.submitted_at, s.id));
        Ok(matched)
    }

    async fn rubric_for_challenge(
        &self,
        challenge_id: ChallengeId,
    ) -> Result<Option<Rubric>, ApplicationError> {
        Ok(self
            .challenges
            .read()
            .get(&challenge_id)
            .map(|record| record.rubric.clone()))
    }
}
