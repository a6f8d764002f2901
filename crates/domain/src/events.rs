//! Domain event types for event-driven fan-out.
//!
//! The engine is reactive: it runs once per external trigger and publishes an
//! event when derived state changes, so live views (leaderboards, schedules)
//! can re-derive themselves instead of polling.

use crate::identifiers::{BatchId, ChallengeId, CompetitionId, EvaluatorId, ParticipantId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    pub payload: EngineEvent,
    pub timestamp: DateTime<Utc>,
    pub metadata: EventMetadata,
}

impl DomainEvent {
    pub fn new(payload: EngineEvent, metadata: EventMetadata) -> Self {
        Self {
            id: Uuid::now_v7(),
            payload,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Event metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ParticipantId>,
}

/// Engine events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    ScoreRecorded {
        submission_id: SubmissionId,
        evaluator_id: EvaluatorId,
        weighted_total: f64,
    },
    VoteRecorded {
        challenge_id: ChallengeId,
        submission_id: SubmissionId,
        voter_id: ParticipantId,
    },
    /// Derived vote aggregates changed; leaderboard views for the challenge
    /// should re-derive.
    AggregateChanged {
        challenge_id: ChallengeId,
    },
    DistributionFinalized {
        competition_id: CompetitionId,
        batch_count: usize,
        participant_count: usize,
    },
    ParticipantMoved {
        participant_id: ParticipantId,
        /// None when the participant had no prior assignment.
        from_batch: Option<BatchId>,
        to_batch: BatchId,
    },
    BatchDeleted {
        batch_id: BatchId,
    },
}

impl EngineEvent {
    /// Short event name for logging and routing
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScoreRecorded { .. } => "score_recorded",
            Self::VoteRecorded { .. } => "vote_recorded",
            Self::AggregateChanged { .. } => "aggregate_changed",
            Self::DistributionFinalized { .. } => "distribution_finalized",
            Self::ParticipantMoved { .. } => "participant_moved",
            Self::BatchDeleted { .. } => "batch_deleted",
        }
    }
}
