//! Error types for the contest engine domain.
//!
//! The error taxonomy mirrors how callers are expected to react:
//! `ValidationError` and `ConflictError` are expected, user-facing rejections
//! that leave state untouched, while `ConsistencyFault` signals a bug in the
//! engine's atomicity guarantees and must be surfaced loudly, never healed
//! silently.

use crate::identifiers::*;
use serde::{Deserialize, Serialize};

/// Top-level domain error type
///
/// This enum encompasses all error classes that can occur within the
/// engine, providing a unified error handling mechanism.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// Input rejected before any state change
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation conflicts with existing state
    #[error("Conflict error: {0}")]
    Conflict(#[from] ConflictError),

    /// Cross-record invariant violated; indicates a bug, not bad input
    #[error("Consistency fault: {0}")]
    Consistency(#[from] ConsistencyFault),
}

impl DomainError {
    /// Get the error code for this error
    ///
    /// Error codes are used in caller-facing responses for programmatic
    /// error handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Conflict(e) => e.error_code(),
            Self::Consistency(_) => "CONSISTENCY_FAULT",
        }
    }

    /// Whether this error is an expected, user-actionable rejection
    pub fn is_user_actionable(&self) -> bool {
        !matches!(self, Self::Consistency(_))
    }
}

/// Validation errors: rejected before any state change
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    /// Score outside the accepted range
    #[error("Score out of valid range: {score} not in [{min}, {max}]")]
    ScoreOutOfRange { score: f64, min: f64, max: f64 },

    /// Vote score must be an integer between 1 and 5
    #[error("Invalid vote score: {0} (must be an integer from 1 to 5)")]
    InvalidVoteScore(u8),

    /// Manual batch capacities do not add up to the participant count
    #[error(
        "Total capacity {total_capacity} must equal {participant_count} participants ({})",
        capacity_imbalance(*.total_capacity, *.participant_count)
    )]
    CapacityMismatch {
        total_capacity: usize,
        participant_count: usize,
    },

    /// Batch time window is invalid or outside the competition bounds
    #[error("Invalid time window for batch '{batch_name}': {reason}")]
    InvalidTimeWindow { batch_name: String, reason: String },

    /// Batch is missing a required field for finalization
    #[error("Batch '{batch_name}' incomplete: {reason}")]
    IncompleteBatch { batch_name: String, reason: String },

    /// A challenge was assigned to more than one batch in a distribution
    #[error("Challenge {challenge_id} assigned to more than one batch")]
    DuplicateChallengeAssignment { challenge_id: ChallengeId },

    /// The same batch id appears more than once in a batch set
    #[error("Batch {batch_id} appears more than once in the batch set")]
    DuplicateBatchId { batch_id: BatchId },

    /// No rubric configured for the challenge being scored
    #[error("Missing rubric for challenge {0}")]
    MissingRubric(ChallengeId),

    /// Requested batch count is zero
    #[error("Batch count must be at least 1")]
    ZeroBatchCount,
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ScoreOutOfRange { .. } => "SCORE_OUT_OF_RANGE",
            Self::InvalidVoteScore(_) => "INVALID_SCORE",
            Self::CapacityMismatch { .. } => "CAPACITY_MISMATCH",
            Self::InvalidTimeWindow { .. } => "INVALID_TIME_WINDOW",
            Self::IncompleteBatch { .. } => "INCOMPLETE_BATCH",
            Self::DuplicateChallengeAssignment { .. } => "DUPLICATE_CHALLENGE",
            Self::DuplicateBatchId { .. } => "DUPLICATE_BATCH_ID",
            Self::MissingRubric(_) => "MISSING_RUBRIC",
            Self::ZeroBatchCount => "ZERO_BATCH_COUNT",
        }
    }
}

fn capacity_imbalance(total_capacity: usize, participant_count: usize) -> String {
    if total_capacity < participant_count {
        format!("deficit of {}", participant_count - total_capacity)
    } else {
        format!("surplus of {}", total_capacity - participant_count)
    }
}

/// Conflict errors: the operation contradicts recorded state
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConflictError {
    /// Voter has already voted on this submission
    #[error("Voter {voter_id} already voted on submission {submission_id}")]
    AlreadyVoted {
        voter_id: ParticipantId,
        submission_id: SubmissionId,
    },

    /// Voters cannot vote on their own submissions
    #[error("Voter {voter_id} cannot vote on their own submission {submission_id}")]
    SelfVote {
        voter_id: ParticipantId,
        submission_id: SubmissionId,
    },

    /// Batches holding participants cannot be deleted
    #[error("Batch {batch_id} still holds {participant_count} participants and cannot be deleted")]
    BatchNotEmpty {
        batch_id: BatchId,
        participant_count: usize,
    },

    /// Referenced batch does not exist
    #[error("Batch not found: {0}")]
    BatchNotFound(BatchId),

    /// Referenced participant does not exist in the distribution
    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Referenced submission does not exist
    #[error("Submission not found: {0}")]
    SubmissionNotFound(SubmissionId),
}

impl ConflictError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyVoted { .. } => "ALREADY_VOTED",
            Self::SelfVote { .. } => "SELF_VOTE",
            Self::BatchNotEmpty { .. } => "BATCH_NOT_EMPTY",
            Self::BatchNotFound(_) => "BATCH_NOT_FOUND",
            Self::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            Self::SubmissionNotFound(_) => "SUBMISSION_NOT_FOUND",
        }
    }
}

/// Consistency faults: unreachable given correct atomic updates
///
/// A fault of this kind means two records that must move in lock-step have
/// diverged. Callers should log and alert, not retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsistencyFault {
    /// Stored aggregate disagrees with a replay of the raw votes
    #[error(
        "Aggregate mismatch for submission {submission_id}: stored count {stored_count}, replayed count {replayed_count}"
    )]
    AggregateMismatch {
        submission_id: SubmissionId,
        stored_count: u64,
        replayed_count: u64,
    },

    /// Participant points at a batch that does not list them (or vice versa)
    #[error("Participant {participant_id} assignment out of sync with batch {batch_id}")]
    AssignmentOutOfSync {
        participant_id: ParticipantId,
        batch_id: BatchId,
    },

    /// A participant appears in more than one batch of a distribution
    #[error("Participant {participant_id} appears in {batch_count} batches")]
    DuplicateAssignment {
        participant_id: ParticipantId,
        batch_count: usize,
    },
}

/// Rejection reasons surfaced by the vote-casting protocol
///
/// These are the caller-visible outcomes of `castVote`; each maps onto a
/// `ValidationError` or `ConflictError` internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteRejection {
    AlreadyVoted,
    SelfVote,
    InvalidScore,
}

impl VoteRejection {
    /// Map a vote-protocol error onto its caller-visible rejection reason.
    ///
    /// Returns None for errors that are not vote rejections (consistency
    /// faults, unrelated validation failures).
    pub fn from_error(err: &DomainError) -> Option<Self> {
        match err {
            DomainError::Conflict(ConflictError::AlreadyVoted { .. }) => Some(Self::AlreadyVoted),
            DomainError::Conflict(ConflictError::SelfVote { .. }) => Some(Self::SelfVote),
            DomainError::Validation(ValidationError::InvalidVoteScore(_)) => {
                Some(Self::InvalidScore)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for VoteRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AlreadyVoted => "ALREADY_VOTED",
            Self::SelfVote => "SELF_VOTE",
            Self::InvalidScore => "INVALID_SCORE",
        };
        write!(f, "{}", s)
    }
}

/// Domain-wide result type
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::Conflict(ConflictError::AlreadyVoted {
            voter_id: ParticipantId::new(),
            submission_id: SubmissionId::new(),
        });
        assert_eq!(err.error_code(), "ALREADY_VOTED");
        assert!(err.is_user_actionable());

        let err = DomainError::Consistency(ConsistencyFault::DuplicateAssignment {
            participant_id: ParticipantId::new(),
            batch_count: 2,
        });
        assert_eq!(err.error_code(), "CONSISTENCY_FAULT");
        assert!(!err.is_user_actionable());
    }

    #[test]
    fn test_capacity_mismatch_names_deficit() {
        let err = ValidationError::CapacityMismatch {
            total_capacity: 42,
            participant_count: 50,
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("50"));
        assert!(msg.contains("deficit of 8"));

        let err = ValidationError::CapacityMismatch {
            total_capacity: 55,
            participant_count: 50,
        };
        assert!(err.to_string().contains("surplus of 5"));
    }

    #[test]
    fn test_vote_rejection_display() {
        assert_eq!(VoteRejection::AlreadyVoted.to_string(), "ALREADY_VOTED");
        assert_eq!(VoteRejection::SelfVote.to_string(), "SELF_VOTE");
        assert_eq!(VoteRejection::InvalidScore.to_string(), "INVALID_SCORE");
    }
}
