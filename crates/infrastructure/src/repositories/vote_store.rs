//! Vote store implementation.
//!
//! Each challenge owns one vote book behind its own mutex, so concurrent
//! votes on the same challenge apply one at a time while different
//! challenges never contend. The book itself enforces the vote protocol;
//! this store maps its rejections into outcomes and everything else into
//! hard errors.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use contest_application::services::{VoteOutcome, VoteStorePort};
use contest_application::ApplicationError;
use contest_domain::errors::VoteRejection;
use contest_domain::identifiers::{ChallengeId, ParticipantId, SubmissionId};
use contest_domain::vote::{ChallengeVoteBook, LeaderboardEntry};

/// In-memory vote store keyed by challenge.
pub struct InMemoryVoteStore {
    books: RwLock<HashMap<ChallengeId, Arc<Mutex<ChallengeVoteBook>>>>,
    prior_weight: f64,
}

impl InMemoryVoteStore {
    /// `prior_weight` is the Bayesian prior mass each book is created with.
    pub fn new(prior_weight: f64) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            prior_weight,
        }
    }

    fn book(&self, challenge_id: ChallengeId) -> Arc<Mutex<ChallengeVoteBook>> {
        if let Some(book) = self.books.read().get(&challenge_id) {
            return Arc::clone(book);
        }
        Arc::clone(
            self.books
                .write()
                .entry(challenge_id)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(ChallengeVoteBook::new(
                        challenge_id,
                        self.prior_weight,
                    )))
                }),
        )
    }

    /// Snapshot of one challenge's book, for inspection and rebuilds.
    pub fn snapshot(&self, challenge_id: ChallengeId) -> Option<ChallengeVoteBook> {
        self.books
            .read()
            .get(&challenge_id)
            .map(|book| book.lock().clone())
    }

    /// Replace a challenge's aggregates with ones replayed from its vote log.
    pub fn rebuild(&self, challenge_id: ChallengeId) {
        if let Some(book) = self.books.read().get(&challenge_id) {
            let mut guard = book.lock();
            *guard = guard.rebuild();
            debug!(%challenge_id, "Vote book rebuilt from log");
        }
    }
}

#[async_trait]
impl VoteStorePort for InMemoryVoteStore {
    async fn record_vote(
        &self,
        challenge_id: ChallengeId,
        voter_id: ParticipantId,
        submission_id: SubmissionId,
        submission_owner_id: ParticipantId,
        score: u8,
    ) -> Result<VoteOutcome, ApplicationError> {
        let book = self.book(challenge_id);
        let mut guard = book.lock();
        match guard.record_vote(
            voter_id,
            submission_id,
            submission_owner_id,
            score,
            chrono::Utc::now(),
        ) {
            Ok(aggregate) => Ok(VoteOutcome::Accepted { aggregate }),
            Err(err) => match VoteRejection::from_error(&err) {
                Some(reason) => Ok(VoteOutcome::Rejected { reason }),
                None => Err(err.into()),
            },
        }
    }

    async fn leaderboard(
        &self,
        challenge_id: ChallengeId,
        top_n: usize,
        vote_threshold: u64,
    ) -> Result<Vec<LeaderboardEntry>, ApplicationError> {
        let books = self.books.read();
        Ok(books
            .get(&challenge_id)
            .map(|book| book.lock().leaderboard(top_n, vote_threshold))
            .unwrap_or_default())
    }

    async fn verify_consistency(&self, challenge_id: ChallengeId) -> Result<(), ApplicationError> {
        let book = match self.books.read().get(&challenge_id) {
            Some(book) => Arc::clone(book),
            // No votes recorded yet; trivially consistent.
            None => return Ok(()),
        };
        let guard = book.lock();
        guard.verify_consistency().map_err(|fault| {
            warn!(%challenge_id, %fault, "Vote book failed consistency check");
            ApplicationError::from(fault)
        })
    }
}
