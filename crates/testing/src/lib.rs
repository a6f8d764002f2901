//! Testing utilities for the contest engine
//!
//! This crate provides testing utilities shared across the workspace:
//! - Test fixtures for all domain types
//! - Builder patterns for complex test data construction
//! - Property-based testing re-exports
//!
//! # Examples
//!
//! ```
//! use contest_testing::{fixtures::*, builders::*};
//!
//! // Create a scored submission
//! let rubric = create_test_rubric();
//! let submission = SubmissionBuilder::new()
//!     .with_prompt("translate this sonnet")
//!     .scored(85.0, &rubric)
//!     .build();
//! ```

pub mod builders;
pub mod fixtures;

// Re-export commonly used types
pub use builders::*;
pub use fixtures::*;

// Re-export testing dependencies for convenience
pub use fake;
pub use proptest;
