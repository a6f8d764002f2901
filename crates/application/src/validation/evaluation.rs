//! Evaluation input validation rules

use super::{Validatable, ValidationResult};
use contest_domain::evaluation::EvaluatorKind;
use contest_domain::identifiers::{EvaluatorId, SubmissionId};
use contest_domain::rubric::{RAW_SCORE_MAX, RAW_SCORE_MIN};
use serde::{Deserialize, Serialize};

/// Submit-score request validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitScoreRequest {
    pub submission_id: SubmissionId,
    pub evaluator_id: EvaluatorId,
    pub kind: EvaluatorKind,
    /// Raw per-criterion scores, in rubric order
    pub scores: Vec<CriterionScoreInput>,
}

/// One raw criterion score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionScoreInput {
    pub criterion: String,
    pub raw_score: f64,
}

impl SubmitScoreRequest {
    pub const MAX_CRITERIA: usize = 100;
}

impl Validatable for SubmitScoreRequest {
    fn validate_all(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        if self.scores.is_empty() {
            result.add_field_error("scores", "At least one criterion score is required");
        }

        if self.scores.len() > Self::MAX_CRITERIA {
            result.add_field_error(
                "scores",
                format!("Maximum {} criterion scores allowed", Self::MAX_CRITERIA),
            );
        }

        for (i, entry) in self.scores.iter().enumerate() {
            if entry.criterion.is_empty() {
                result.add_field_error(format!("scores[{}].criterion", i), "Criterion name cannot be empty");
            }

            if !entry.raw_score.is_finite() {
                result.add_field_error(format!("scores[{}].raw_score", i), "Score must be a finite number");
            } else if entry.raw_score < RAW_SCORE_MIN || entry.raw_score > RAW_SCORE_MAX {
                result.add_field_error(
                    format!("scores[{}].raw_score", i),
                    format!(
                        "Score {} outside valid range [{}, {}]",
                        entry.raw_score, RAW_SCORE_MIN, RAW_SCORE_MAX
                    ),
                );
            }
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.scores.len());
        for entry in &self.scores {
            if seen.contains(&entry.criterion.as_str()) {
                result.add_field_error(
                    "scores",
                    format!("Duplicate criterion score: {}", entry.criterion),
                );
            } else {
                seen.push(&entry.criterion);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(scores: Vec<CriterionScoreInput>) -> SubmitScoreRequest {
        SubmitScoreRequest {
            submission_id: SubmissionId::new(),
            evaluator_id: EvaluatorId::new(),
            kind: EvaluatorKind::HumanJudge,
            scores,
        }
    }

    fn score(criterion: &str, raw: f64) -> CriterionScoreInput {
        CriterionScoreInput {
            criterion: criterion.to_string(),
            raw_score: raw,
        }
    }

    #[test]
    fn test_valid_request() {
        let req = request(vec![score("accuracy", 90.0), score("clarity", 60.0)]);
        assert!(req.validate_all().valid);
    }

    #[test]
    fn test_empty_scores_rejected() {
        let req = request(vec![]);
        assert!(!req.validate_all().valid);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let req = request(vec![score("accuracy", 120.0)]);
        let result = req.validate_all();
        assert!(!result.valid);
        assert!(result.field_errors.contains_key("scores[0].raw_score"));
    }

    #[test]
    fn test_non_finite_score_rejected() {
        let req = request(vec![score("accuracy", f64::NAN)]);
        assert!(!req.validate_all().valid);
    }

    #[test]
    fn test_duplicate_criterion_rejected() {
        let req = request(vec![score("accuracy", 50.0), score("accuracy", 60.0)]);
        assert!(!req.validate_all().valid);
    }
}
