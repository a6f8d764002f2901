//! Infrastructure layer for the contest engine
//!
//! This crate provides concrete implementations of the storage ports defined
//! in the application layer:
//! - Submission and rubric persistence
//! - Per-challenge vote books with serialized writes
//! - Per-competition distribution state with serialized edits
//! - An in-process event bus for domain events
//!
//! ## Architecture
//!
//! The infrastructure layer follows the repository pattern: each store is a
//! concrete implementation of an application-layer port and can be swapped
//! for testing or different storage backends. The in-memory stores here are
//! the reference backend; they hold the same locking discipline a database
//! transaction would (one writer per challenge, one writer per competition).

pub mod event_bus;
pub mod repositories;

pub use event_bus::{BroadcastEventBus, EventBusConfig};
pub use repositories::{
    InMemoryDistributionStore, InMemorySubmissionRepository, InMemoryVoteStore,
};
