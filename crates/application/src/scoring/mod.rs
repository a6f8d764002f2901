//! Participant ranking and score aggregation.
//!
//! Submission-level aggregation (the group-equal mean across evaluator
//! classes) lives in the domain; this module reduces those per-challenge
//! final scores into one overall score per participant and orders the
//! population.

mod ranking;

pub use ranking::{ParticipantRanking, RankedParticipant, RankingInputs};
