//! Vote records and the Bayesian vote-ranking state for one challenge.
//!
//! `ChallengeVoteBook` owns every record the vote protocol touches: the raw
//! votes, one aggregate per submission, and the challenge-wide global stats.
//! All three move in lock-step inside `record_vote`; a rejected vote mutates
//! nothing. The storage layer wraps each book in its transaction primitive so
//! concurrent votes on one challenge serialize.
//!
//! The Bayesian adjustment shrinks a submission's observed average toward the
//! challenge-wide average in proportion to how few votes it has, so a single
//! 5-star vote cannot outrank fifty 4-star votes.

use crate::errors::{ConflictError, ConsistencyFault, DomainError, ValidationError};
use crate::identifiers::{ChallengeId, ParticipantId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Default prior weight `m`: the strength of the pull toward the global mean.
pub const DEFAULT_PRIOR_WEIGHT: f64 = 2.0;

/// Minimum vote count for a submission to appear on the leaderboard.
pub const DEFAULT_VOTE_THRESHOLD: u64 = 2;

/// Lowest accepted vote score.
pub const VOTE_SCORE_MIN: u8 = 1;
/// Highest accepted vote score.
pub const VOTE_SCORE_MAX: u8 = 5;

/// One peer vote on a submission
///
/// At most one vote per (voter, submission) pair ever exists; a second
/// attempt is rejected, not overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: ParticipantId,
    pub submission_id: SubmissionId,
    pub submission_owner_id: ParticipantId,
    /// Integer score from 1 to 5
    pub score: u8,
    pub voted_at: DateTime<Utc>,
}

/// Derived vote statistics for one submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubmissionVoteAggregate {
    pub submission_id: SubmissionId,
    pub vote_count: u64,
    pub rating_sum: u64,
    pub rating_avg: f64,
    pub bayes_score: f64,
}

impl SubmissionVoteAggregate {
    fn empty(submission_id: SubmissionId) -> Self {
        Self {
            submission_id,
            vote_count: 0,
            rating_sum: 0,
            rating_avg: 0.0,
            bayes_score: 0.0,
        }
    }
}

/// Challenge-wide vote statistics, updated alongside every aggregate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalVoteStats {
    pub vote_count: u64,
    pub rating_sum: u64,
    pub average: f64,
    /// Prior weight `m`: larger values pull low-vote submissions harder
    /// toward the global mean. Stored with the stats so it can be tuned
    /// without invalidating historical data.
    pub prior_weight: f64,
}

impl GlobalVoteStats {
    pub fn new(prior_weight: f64) -> Self {
        Self {
            vote_count: 0,
            rating_sum: 0,
            average: 0.0,
            prior_weight,
        }
    }
}

impl Default for GlobalVoteStats {
    fn default() -> Self {
        Self::new(DEFAULT_PRIOR_WEIGHT)
    }
}

/// One ranked leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub submission_id: SubmissionId,
    pub rating_avg: f64,
    pub vote_count: u64,
    /// Rounded to two decimals for display; stored aggregates keep full precision.
    pub bayes_score: f64,
}

/// All vote state for one challenge
///
/// Every submission in the book is either unvoted (no aggregate entry) or
/// rated; the first accepted vote makes that transition irreversible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeVoteBook {
    pub challenge_id: ChallengeId,
    /// Raw votes in recorded order. Aggregates are fully recomputable from
    /// this list; see [`ChallengeVoteBook::rebuild`].
    votes: Vec<Vote>,
    aggregates: BTreeMap<SubmissionId, SubmissionVoteAggregate>,
    global: GlobalVoteStats,
    #[serde(skip)]
    voted_pairs: HashSet<(ParticipantId, SubmissionId)>,
}

impl ChallengeVoteBook {
    pub fn new(challenge_id: ChallengeId, prior_weight: f64) -> Self {
        Self {
            challenge_id,
            votes: Vec::new(),
            aggregates: BTreeMap::new(),
            global: GlobalVoteStats::new(prior_weight),
            voted_pairs: HashSet::new(),
        }
    }

    /// Restore the duplicate-detection index after deserialization.
    pub fn reindex(&mut self) {
        self.voted_pairs = self
            .votes
            .iter()
            .map(|v| (v.voter_id, v.submission_id))
            .collect();
    }

    pub fn global_stats(&self) -> &GlobalVoteStats {
        &self.global
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn aggregate(&self, submission_id: SubmissionId) -> Option<&SubmissionVoteAggregate> {
        self.aggregates.get(&submission_id)
    }

    pub fn has_voted(&self, voter_id: ParticipantId, submission_id: SubmissionId) -> bool {
        self.voted_pairs.contains(&(voter_id, submission_id))
    }

    /// Apply one vote to the book.
    ///
    /// Preconditions are checked in order (duplicate, self-vote, score
    /// range); if any fails, no record is touched. On success the vote, the
    /// submission aggregate, and the global stats are all updated before
    /// returning, which is the engine's atomicity unit.
    pub fn record_vote(
        &mut self,
        voter_id: ParticipantId,
        submission_id: SubmissionId,
        submission_owner_id: ParticipantId,
        score: u8,
        voted_at: DateTime<Utc>,
    ) -> Result<SubmissionVoteAggregate, DomainError> {
        if self.has_voted(voter_id, submission_id) {
            return Err(ConflictError::AlreadyVoted {
                voter_id,
                submission_id,
            }
            .into());
        }
        if voter_id == submission_owner_id {
            return Err(ConflictError::SelfVote {
                voter_id,
                submission_id,
            }
            .into());
        }
        if !(VOTE_SCORE_MIN..=VOTE_SCORE_MAX).contains(&score) {
            return Err(ValidationError::InvalidVoteScore(score).into());
        }

        let vote = Vote {
            voter_id,
            submission_id,
            submission_owner_id,
            score,
            voted_at,
        };
        let aggregate = self.apply_unchecked(&vote);
        self.votes.push(vote);
        self.voted_pairs.insert((voter_id, submission_id));
        Ok(aggregate)
    }

    /// The aggregate update formula, shared by `record_vote` and `rebuild`.
    fn apply_unchecked(&mut self, vote: &Vote) -> SubmissionVoteAggregate {
        let entry = self
            .aggregates
            .entry(vote.submission_id)
            .or_insert_with(|| SubmissionVoteAggregate::empty(vote.submission_id));

        entry.vote_count += 1;
        entry.rating_sum += u64::from(vote.score);
        entry.rating_avg = entry.rating_sum as f64 / entry.vote_count as f64;

        self.global.vote_count += 1;
        self.global.rating_sum += u64::from(vote.score);
        self.global.average = if self.global.vote_count == 0 {
            0.0
        } else {
            self.global.rating_sum as f64 / self.global.vote_count as f64
        };

        entry.bayes_score = bayes_score(
            entry.vote_count,
            entry.rating_avg,
            self.global.average,
            self.global.prior_weight,
        );

        *entry
    }

    /// Recompute every aggregate by replaying the raw votes in recorded order.
    ///
    /// Used after tuning the prior weight, and by the consistency audit: the
    /// rebuilt book must reproduce the stored aggregates exactly.
    pub fn rebuild(&self) -> Self {
        let mut fresh = Self::new(self.challenge_id, self.global.prior_weight);
        for vote in &self.votes {
            fresh.apply_unchecked(vote);
            fresh.votes.push(vote.clone());
            fresh.voted_pairs.insert((vote.voter_id, vote.submission_id));
        }
        fresh
    }

    /// Verify stored aggregates against a full replay of the raw votes.
    pub fn verify_consistency(&self) -> Result<(), ConsistencyFault> {
        let replayed = self.rebuild();
        for (submission_id, stored) in &self.aggregates {
            let fresh = replayed
                .aggregates
                .get(submission_id)
                .copied()
                .unwrap_or_else(|| SubmissionVoteAggregate::empty(*submission_id));
            if stored != &fresh {
                return Err(ConsistencyFault::AggregateMismatch {
                    submission_id: *submission_id,
                    stored_count: stored.vote_count,
                    replayed_count: fresh.vote_count,
                });
            }
        }
        Ok(())
    }

    /// Ranked leaderboard of submissions with at least `vote_threshold` votes.
    ///
    /// Ordered by Bayesian score descending, ties broken by raw average and
    /// then vote count. Submissions below the threshold keep accumulating
    /// votes but are not listed.
    pub fn leaderboard(&self, top_n: usize, vote_threshold: u64) -> Vec<LeaderboardEntry> {
        let mut eligible: Vec<&SubmissionVoteAggregate> = self
            .aggregates
            .values()
            .filter(|a| a.vote_count >= vote_threshold)
            .collect();

        eligible.sort_by(|a, b| {
            b.bayes_score
                .total_cmp(&a.bayes_score)
                .then(b.rating_avg.total_cmp(&a.rating_avg))
                .then(b.vote_count.cmp(&a.vote_count))
        });

        eligible
            .into_iter()
            .take(top_n)
            .enumerate()
            .map(|(i, a)| LeaderboardEntry {
                rank: i as u32 + 1,
                submission_id: a.submission_id,
                rating_avg: a.rating_avg,
                vote_count: a.vote_count,
                bayes_score: crate::rubric::round2(a.bayes_score),
            })
            .collect()
    }
}

/// Damped score: `(n/(n+m))*R + (m/(n+m))*C`.
///
/// `R` is the submission's raw average, `C` the challenge-wide average, and
/// `m` the prior weight. With no votes and no prior the score is 0.
pub fn bayes_score(vote_count: u64, rating_avg: f64, global_avg: f64, prior_weight: f64) -> f64 {
    let n = vote_count as f64;
    let denom = n + prior_weight;
    if denom <= 0.0 {
        return 0.0;
    }
    (n / denom) * rating_avg + (prior_weight / denom) * global_avg
}
