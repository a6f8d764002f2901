//! Voting Service
//!
//! Business logic for the community vote protocol and the Bayesian
//! leaderboard. The per-challenge atomicity lives in the vote store; this
//! service resolves the submission, applies the protocol, and fans out
//! events.

use super::{EventPublisher, ServiceConfig, ServiceContext};
use crate::services::evaluation::SubmissionRepositoryPort;
use crate::validation::{CastVoteRequest, LeaderboardQuery, Validatable};
use crate::{ApplicationError, ApplicationResult};
use async_trait::async_trait;
use contest_domain::errors::VoteRejection;
use contest_domain::events::{DomainEvent, EngineEvent};
use contest_domain::identifiers::{ChallengeId, ParticipantId, SubmissionId};
use contest_domain::vote::{LeaderboardEntry, SubmissionVoteAggregate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Caller-visible result of a vote attempt
///
/// Rejections are expected outcomes, not errors: the caller is told why and
/// no state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VoteOutcome {
    Accepted {
        aggregate: SubmissionVoteAggregate,
    },
    Rejected {
        reason: VoteRejection,
    },
}

/// Vote store trait
///
/// Implementations must serialize concurrent votes on one challenge and
/// apply each vote all-or-nothing.
#[async_trait]
pub trait VoteStorePort: Send + Sync {
    async fn record_vote(
        &self,
        challenge_id: ChallengeId,
        voter_id: ParticipantId,
        submission_id: SubmissionId,
        submission_owner_id: ParticipantId,
        score: u8,
    ) -> Result<VoteOutcome, ApplicationError>;

    async fn leaderboard(
        &self,
        challenge_id: ChallengeId,
        top_n: usize,
        vote_threshold: u64,
    ) -> Result<Vec<LeaderboardEntry>, ApplicationError>;

    /// Replay the raw votes and compare against stored aggregates.
    async fn verify_consistency(&self, challenge_id: ChallengeId) -> Result<(), ApplicationError>;
}

/// Voting service implementation
pub struct VotingService<S, V, E>
where
    S: SubmissionRepositoryPort,
    V: VoteStorePort,
    E: EventPublisher,
{
    submissions: Arc<S>,
    votes: Arc<V>,
    event_publisher: Arc<E>,
    config: ServiceConfig,
}

impl<S, V, E> VotingService<S, V, E>
where
    S: SubmissionRepositoryPort,
    V: VoteStorePort,
    E: EventPublisher,
{
    pub fn new(
        submissions: Arc<S>,
        votes: Arc<V>,
        event_publisher: Arc<E>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            submissions,
            votes,
            event_publisher,
            config,
        }
    }

    /// Cast one vote on a submission.
    ///
    /// Duplicate votes, self-votes, and out-of-range scores come back as
    /// `VoteOutcome::Rejected`; an accepted vote updates the submission
    /// aggregate and global stats in one unit and publishes the change.
    /// Precondition ordering (duplicate, then self-vote, then score range)
    /// belongs to the vote book, so the score is not pre-screened here.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id))]
    pub async fn cast_vote(
        &self,
        ctx: &ServiceContext,
        request: CastVoteRequest,
    ) -> ApplicationResult<VoteOutcome> {
        let submission = self
            .submissions
            .get(request.submission_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "Submission not found: {}",
                    request.submission_id
                ))
            })?;

        if submission.challenge_id != request.challenge_id {
            return Err(ApplicationError::InvalidInput(format!(
                "Submission {} does not belong to challenge {}",
                request.submission_id, request.challenge_id
            )));
        }

        let outcome = self
            .votes
            .record_vote(
                request.challenge_id,
                request.voter_id,
                request.submission_id,
                submission.participant_id,
                request.score,
            )
            .await?;

        match &outcome {
            VoteOutcome::Accepted { aggregate } => {
                info!(
                    challenge_id = %request.challenge_id,
                    submission_id = %request.submission_id,
                    vote_count = aggregate.vote_count,
                    bayes_score = aggregate.bayes_score,
                    "Vote accepted"
                );
                self.event_publisher
                    .publish(DomainEvent::new(
                        EngineEvent::VoteRecorded {
                            challenge_id: request.challenge_id,
                            submission_id: request.submission_id,
                            voter_id: request.voter_id,
                        },
                        ctx.event_metadata(),
                    ))
                    .await?;
                self.event_publisher
                    .publish(DomainEvent::new(
                        EngineEvent::AggregateChanged {
                            challenge_id: request.challenge_id,
                        },
                        ctx.event_metadata(),
                    ))
                    .await?;
            }
            VoteOutcome::Rejected { reason } => {
                warn!(
                    challenge_id = %request.challenge_id,
                    submission_id = %request.submission_id,
                    reason = %reason,
                    "Vote rejected"
                );
            }
        }

        Ok(outcome)
    }

    /// Ranked leaderboard for a challenge.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id))]
    pub async fn get_leaderboard(
        &self,
        ctx: &ServiceContext,
        query: LeaderboardQuery,
    ) -> ApplicationResult<Vec<LeaderboardEntry>> {
        query.validate_all().ensure_valid()?;

        let top_n = query.top_n.unwrap_or(LeaderboardQuery::DEFAULT_TOP_N) as usize;
        let threshold = query.vote_threshold.unwrap_or(self.config.vote_threshold);

        self.votes
            .leaderboard(query.challenge_id, top_n, threshold)
            .await
    }

    /// Audit a challenge's stored aggregates against a replay of its votes.
    ///
    /// A fault means the atomicity guarantee was violated somewhere; it is
    /// logged loudly and surfaced, never repaired in place.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id))]
    pub async fn audit_challenge(
        &self,
        ctx: &ServiceContext,
        challenge_id: ChallengeId,
    ) -> ApplicationResult<()> {
        ctx.require_admin()?;

        if let Err(err) = self.votes.verify_consistency(challenge_id).await {
            error!(challenge_id = %challenge_id, error = %err, "Vote aggregate audit failed");
            return Err(err);
        }
        Ok(())
    }
}
