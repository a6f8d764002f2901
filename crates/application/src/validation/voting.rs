//! Voting input validation rules

use super::{Validatable, ValidationResult, ValidatorExt};
use contest_domain::identifiers::{ChallengeId, ParticipantId, SubmissionId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Cast-vote request validation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CastVoteRequest {
    pub voter_id: ParticipantId,
    pub challenge_id: ChallengeId,
    pub submission_id: SubmissionId,
    /// Star rating, whole numbers one through five
    #[validate(range(min = 1, max = 5, message = "Vote score must be between 1 and 5"))]
    pub score: u8,
}

impl Validatable for CastVoteRequest {
    fn validate_all(&self) -> ValidationResult {
        self.to_validation_result()
    }
}

/// Leaderboard query validation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LeaderboardQuery {
    pub challenge_id: ChallengeId,
    /// Number of entries to return; None means the configured default
    #[validate(range(min = 1, max = 1000, message = "top_n must be between 1 and 1000"))]
    pub top_n: Option<u32>,
    /// Minimum vote count override; None means the configured threshold
    pub vote_threshold: Option<u64>,
}

impl LeaderboardQuery {
    pub const DEFAULT_TOP_N: u32 = 50;
}

impl Validatable for LeaderboardQuery {
    fn validate_all(&self) -> ValidationResult {
        self.to_validation_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contest_domain::vote::{VOTE_SCORE_MAX, VOTE_SCORE_MIN};

    #[test]
    fn test_valid_vote_scores() {
        for score in VOTE_SCORE_MIN..=VOTE_SCORE_MAX {
            let req = CastVoteRequest {
                voter_id: ParticipantId::new(),
                challenge_id: ChallengeId::new(),
                submission_id: SubmissionId::new(),
                score,
            };
            assert!(req.validate_all().valid, "score {} should be valid", score);
        }
    }

    #[test]
    fn test_out_of_range_vote_scores_rejected() {
        for score in [0u8, 6, 10] {
            let req = CastVoteRequest {
                voter_id: ParticipantId::new(),
                challenge_id: ChallengeId::new(),
                submission_id: SubmissionId::new(),
                score,
            };
            assert!(!req.validate_all().valid, "score {} should be rejected", score);
        }
    }

    #[test]
    fn test_leaderboard_query_limits() {
        let query = LeaderboardQuery {
            challenge_id: ChallengeId::new(),
            top_n: Some(10),
            vote_threshold: None,
        };
        assert!(query.validate_all().valid);

        let query = LeaderboardQuery {
            challenge_id: ChallengeId::new(),
            top_n: Some(0),
            vote_threshold: None,
        };
        assert!(!query.validate_all().valid);
    }
}
