//! Common utilities and shared functionality for the contest engine.
//!
//! This crate provides foundational utilities used across all layers
//! including:
//! - Configuration management
//! - Telemetry and observability
//! - Pagination helpers

pub mod config;
pub mod pagination;
pub mod telemetry;

// Re-export commonly used types
pub use config::{EngineConfig, LimitsConfig, RankingConfig, RankingMode, VotingConfig};
pub use pagination::{PaginatedResult, PaginationParams};
pub use telemetry::init_tracing;

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
