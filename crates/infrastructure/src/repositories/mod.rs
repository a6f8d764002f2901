//! Store implementations for the application-layer ports.
//!
//! Each store serializes writes at the granularity its port demands: the
//! vote store per challenge, the distribution store per competition. Locks
//! are never held across an await point.

mod distribution_store;
mod submission_repository;
mod vote_store;

pub use distribution_store::*;
pub use submission_repository::*;
pub use vote_store::*;
