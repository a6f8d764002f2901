//! Allocation input validation rules

use super::{Validatable, ValidationResult};
use contest_domain::batch::BatchSpec;
use contest_domain::identifiers::{BatchId, ParticipantId};
use serde::{Deserialize, Serialize};

/// Distribution planning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// Even random split across the declared batches
    Equal,
    /// Random split into admin-declared capacities
    Manual,
}

/// Plan-distribution request validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDistributionRequest {
    pub mode: DistributionMode,
    pub participants: Vec<ParticipantId>,
    pub specs: Vec<BatchSpec>,
}

impl PlanDistributionRequest {
    pub const MAX_BATCHES: usize = 100;
}

impl Validatable for PlanDistributionRequest {
    fn validate_all(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        if self.specs.is_empty() {
            result.add_field_error("specs", "At least one batch is required");
        }

        if self.specs.len() > Self::MAX_BATCHES {
            result.add_field_error(
                "specs",
                format!("Maximum {} batches allowed", Self::MAX_BATCHES),
            );
        }

        for (i, spec) in self.specs.iter().enumerate() {
            if spec.name.trim().is_empty() {
                result.add_field_error(format!("specs[{}].name", i), "Batch name cannot be empty");
            }
            if spec.start_time >= spec.end_time {
                result.add_field_error(
                    format!("specs[{}].start_time", i),
                    "Start time must be before end time",
                );
            }
            match self.mode {
                DistributionMode::Manual if spec.capacity.is_none() => {
                    result.add_field_error(
                        format!("specs[{}].capacity", i),
                        "Capacity is required for every batch in manual mode",
                    );
                }
                _ => {}
            }
        }

        let mut names: Vec<&str> = self.specs.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| !w[0].is_empty() && w[0] == w[1]) {
            result.add_object_error("Batch names must be unique within a distribution");
        }

        // Capacity totals are checked against the participant count by the
        // planner itself so the error can name the deficit or surplus.

        result
    }
}

/// Move-participant request validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveParticipantRequest {
    pub participant_id: ParticipantId,
    pub target_batch_id: BatchId,
}

impl Validatable for MoveParticipantRequest {
    fn validate_all(&self) -> ValidationResult {
        // Referential checks (participant exists, target batch exists) are
        // conflict checks against live state, not input validation.
        ValidationResult::success()
    }
}
