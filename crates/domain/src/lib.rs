//! Contest Engine Domain Types
//!
//! This crate provides the core domain model for the contest engine: the
//! scoring, aggregation, and allocation logic of a multi-stage competition.
//! It is pure (no I/O, no async) so every invariant can be tested directly.
//!
//! ## Architecture
//!
//! The domain layer is organized into the following modules:
//!
//! - **identifiers**: Strongly-typed UUID-based identifiers for all entities
//! - **rubric**: Weighted scoring criteria and the rubric scorer
//! - **evaluation**: Evaluation records, submissions, and score aggregation
//! - **vote**: Peer votes, Bayesian-adjusted aggregates, and leaderboards
//! - **batch**: Batches, distribution planning, and conservation audits
//! - **events**: Domain events for event-driven fan-out
//! - **errors**: Error taxonomy (validation, conflict, consistency fault)
//!
//! ## Usage
//!
//! ```rust
//! use contest_domain::rubric::{Criterion, Rubric, ScoreSheet};
//!
//! let rubric = Rubric::new(vec![
//!     Criterion::new("accuracy", "Factual accuracy", 2.0),
//!     Criterion::new("clarity", "Clarity of presentation", 1.0),
//! ]);
//! let sheet: ScoreSheet = [("accuracy", 90.0), ("clarity", 60.0)].into_iter().collect();
//! assert_eq!(rubric.score(&sheet), 80.00);
//! ```

#![warn(clippy::all)]

// Core domain modules
pub mod identifiers;
pub mod rubric;
pub mod evaluation;
pub mod vote;
pub mod batch;
pub mod events;
pub mod errors;

// Re-export commonly used types
pub use identifiers::*;
pub use errors::{ConflictError, ConsistencyFault, DomainError, DomainResult, ValidationError, VoteRejection};

// Re-export key domain types
pub use rubric::{Criterion, Rubric, ScoreSheet};
pub use evaluation::{EvaluationRecord, EvaluatorKind, Submission};
pub use vote::{ChallengeVoteBook, GlobalVoteStats, LeaderboardEntry, SubmissionVoteAggregate, Vote};
pub use batch::{Batch, BatchSpec, CompetitionWindow, Distribution, Participant};
