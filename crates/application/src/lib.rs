//! Application layer for the contest engine.
//!
//! This crate orchestrates domain logic and coordinates between layers.
//!
//! ## Architecture
//!
//! The application layer sits between the domain and infrastructure layers,
//! providing use case orchestration for evaluation scoring, community
//! voting, and batch allocation.
//!
//! ## Modules
//!
//! - `services` - Business logic services (EvaluationService, VotingService,
//!   AllocationService)
//! - `scoring` - Participant ranking and score aggregation
//! - `validation` - Input validation framework

pub mod scoring;
pub mod services;
pub mod validation;

// Re-export commonly used types
pub use scoring::{ParticipantRanking, RankedParticipant, RankingInputs};
pub use services::{
    AllocationService, EvaluationService, EventPublisher, NoOpEventPublisher, ServiceConfig,
    ServiceContext, VotingService,
};
pub use validation::{Validatable, ValidationResult};

use contest_domain::errors::{ConsistencyFault, DomainError};
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug, Clone)]
pub enum ApplicationError {
    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Resource conflict (e.g., duplicate vote)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored aggregates disagree with their source records
    #[error("Consistency fault: {0}")]
    Consistency(#[from] ConsistencyFault),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ApplicationError::NotFound(_) => "NOT_FOUND",
            ApplicationError::InvalidInput(_) => "INVALID_INPUT",
            ApplicationError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApplicationError::Conflict(_) => "CONFLICT",
            ApplicationError::Consistency(_) => "CONSISTENCY_FAULT",
            ApplicationError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can fix this error by changing the request
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ApplicationError::InvalidInput(_)
                | ApplicationError::ValidationFailed(_)
                | ApplicationError::Conflict(_)
        )
    }
}

impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(e) => ApplicationError::ValidationFailed(e.to_string()),
            DomainError::Conflict(e) => ApplicationError::Conflict(e.to_string()),
            DomainError::Consistency(fault) => ApplicationError::Consistency(fault),
        }
    }
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
