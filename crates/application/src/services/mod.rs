//! Application Services
//!
//! Business logic orchestration layer that coordinates domain operations,
//! repository access, and cross-cutting concerns.

mod allocation;
mod evaluation;
mod voting;

pub use allocation::*;
pub use evaluation::*;
pub use voting::*;

use crate::ApplicationError;
use async_trait::async_trait;
use contest_common::EngineConfig;
use contest_domain::events::{DomainEvent, EventMetadata};
use contest_domain::identifiers::ParticipantId;
use contest_domain::vote::{DEFAULT_PRIOR_WEIGHT, DEFAULT_VOTE_THRESHOLD};

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bayesian prior weight `m`
    pub prior_weight: f64,
    /// Minimum votes before a submission is listed on the leaderboard
    pub vote_threshold: u64,
    /// Reduction mode for participant rankings
    pub ranking_mode: contest_common::RankingMode,
    /// Maximum page size for list operations
    pub max_page_size: u32,
    /// Default page size for list operations
    pub default_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            prior_weight: DEFAULT_PRIOR_WEIGHT,
            vote_threshold: DEFAULT_VOTE_THRESHOLD,
            ranking_mode: contest_common::RankingMode::Sum,
            max_page_size: 100,
            default_page_size: 20,
        }
    }
}

impl From<&EngineConfig> for ServiceConfig {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            prior_weight: cfg.voting.prior_weight,
            vote_threshold: cfg.voting.vote_threshold,
            ranking_mode: cfg.ranking.mode,
            max_page_size: cfg.limits.max_page_size,
            default_page_size: cfg.limits.default_page_size,
        }
    }
}

/// Service context for request handling
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// The acting participant (if any)
    pub actor_id: Option<ParticipantId>,
    /// Request correlation ID for tracing
    pub correlation_id: String,
    /// Whether the actor has admin privileges
    pub is_admin: bool,
}

impl ServiceContext {
    pub fn anonymous(correlation_id: String) -> Self {
        Self {
            actor_id: None,
            correlation_id,
            is_admin: false,
        }
    }

    pub fn acting_as(actor_id: ParticipantId, correlation_id: String) -> Self {
        Self {
            actor_id: Some(actor_id),
            correlation_id,
            is_admin: false,
        }
    }

    pub fn with_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn require_actor(&self) -> Result<ParticipantId, ApplicationError> {
        self.actor_id
            .ok_or_else(|| ApplicationError::InvalidInput("An acting participant is required".to_string()))
    }

    pub fn require_admin(&self) -> Result<(), ApplicationError> {
        if !self.is_admin {
            return Err(ApplicationError::InvalidInput(
                "Admin privileges required".to_string(),
            ));
        }
        Ok(())
    }

    /// Event metadata stamped from this context.
    pub fn event_metadata(&self) -> EventMetadata {
        EventMetadata {
            correlation_id: Some(self.correlation_id.clone()),
            actor_id: self.actor_id,
        }
    }
}

/// Event publisher trait for domain events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), ApplicationError>;
}

/// No-op event publisher for testing
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: DomainEvent) -> Result<(), ApplicationError> {
        Ok(())
    }
}
