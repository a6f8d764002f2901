//! Batches, participants, and distribution planning.
//!
//! A distribution partitions the full participant population into named,
//! time-boxed batches for a live stage. Planning shuffles uniformly at
//! random (Fisher–Yates) and slices contiguously, either into equal chunks
//! or into admin-declared capacities. Validation and the conservation audit
//! live here so every caller enforces the same invariants.

use crate::errors::{ConflictError, ConsistencyFault, DomainError, ValidationError};
use crate::identifiers::{BatchId, ChallengeId, CompetitionId, ParticipantId};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named, time-boxed grouping of participants and challenges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub challenge_ids: BTreeSet<ChallengeId>,
    pub participant_ids: BTreeSet<ParticipantId>,
    /// Declared capacity in manual mode; None in equal mode.
    pub capacity: Option<usize>,
    /// Emergency/overflow batches may finalize without participants.
    pub emergency: bool,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.participant_ids.is_empty()
    }
}

/// A participant and their current batch assignment
///
/// `assigned_batch_id` must always agree with exactly one batch's
/// `participant_ids`; the allocator maintains that cross-reference
/// atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: ParticipantId,
    pub assigned_batch_id: Option<BatchId>,
}

/// Overall competition time bounds that every batch window must fit inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetitionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CompetitionWindow {
    pub fn contains(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Admin input describing one batch to plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSpec {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub challenge_ids: BTreeSet<ChallengeId>,
    /// Required in manual mode; ignored in equal mode.
    pub capacity: Option<usize>,
    #[serde(default)]
    pub emergency: bool,
}

impl BatchSpec {
    fn into_batch(self, participant_ids: BTreeSet<ParticipantId>) -> Batch {
        Batch {
            id: BatchId::new(),
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            challenge_ids: self.challenge_ids,
            participant_ids,
            capacity: self.capacity,
            emergency: self.emergency,
        }
    }
}

/// Partition participants into equal random chunks, one per spec.
///
/// Chunk size is `ceil(N / batch_count)`; the last chunks may be smaller, or
/// empty when there are more batches than participants.
pub fn plan_equal_distribution<R: Rng + ?Sized>(
    participants: &[ParticipantId],
    specs: Vec<BatchSpec>,
    rng: &mut R,
) -> Result<Vec<Batch>, ValidationError> {
    let batch_count = specs.len();
    if batch_count == 0 {
        return Err(ValidationError::ZeroBatchCount);
    }

    let mut shuffled = participants.to_vec();
    shuffled.shuffle(rng);

    let per_batch = participants.len().div_ceil(batch_count);
    let batches = specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| {
            let start = (i * per_batch).min(shuffled.len());
            let end = ((i + 1) * per_batch).min(shuffled.len());
            spec.into_batch(shuffled[start..end].iter().copied().collect())
        })
        .collect();

    Ok(batches)
}

/// Partition participants into admin-declared capacities.
///
/// Capacities must sum to the participant count exactly; the error names the
/// deficit or surplus. Slices are assigned contiguously in spec order after
/// a uniform shuffle.
pub fn plan_manual_distribution<R: Rng + ?Sized>(
    participants: &[ParticipantId],
    specs: Vec<BatchSpec>,
    rng: &mut R,
) -> Result<Vec<Batch>, ValidationError> {
    if specs.is_empty() {
        return Err(ValidationError::ZeroBatchCount);
    }

    let total_capacity: usize = specs.iter().map(|s| s.capacity.unwrap_or(0)).sum();
    if total_capacity != participants.len() {
        return Err(ValidationError::CapacityMismatch {
            total_capacity,
            participant_count: participants.len(),
        });
    }

    let mut shuffled = participants.to_vec();
    shuffled.shuffle(rng);

    let mut offset = 0;
    let batches = specs
        .into_iter()
        .map(|spec| {
            let take = spec.capacity.unwrap_or(0);
            let slice = &shuffled[offset..offset + take];
            offset += take;
            spec.into_batch(slice.iter().copied().collect())
        })
        .collect();

    Ok(batches)
}

/// Finalize preconditions for a batch set, checked before any commit.
///
/// Returns the first violation found; a failed validation means nothing is
/// persisted. Emergency batches are exempt only from the non-empty
/// participant rule.
pub fn validate_distribution(
    batches: &[Batch],
    window: &CompetitionWindow,
) -> Result<(), ValidationError> {
    let mut seen_challenges: BTreeMap<ChallengeId, &str> = BTreeMap::new();

    for batch in batches {
        if batch.name.trim().is_empty() {
            return Err(ValidationError::IncompleteBatch {
                batch_name: batch.id.to_string(),
                reason: "name must not be empty".to_string(),
            });
        }
        if batch.start_time >= batch.end_time {
            return Err(ValidationError::InvalidTimeWindow {
                batch_name: batch.name.clone(),
                reason: "start time must be before end time".to_string(),
            });
        }
        if !window.contains(batch.start_time, batch.end_time) {
            return Err(ValidationError::InvalidTimeWindow {
                batch_name: batch.name.clone(),
                reason: "batch window must lie within the competition window".to_string(),
            });
        }
        if batch.challenge_ids.is_empty() {
            return Err(ValidationError::IncompleteBatch {
                batch_name: batch.name.clone(),
                reason: "at least one challenge must be assigned".to_string(),
            });
        }
        if batch.participant_ids.is_empty() && !batch.emergency {
            return Err(ValidationError::IncompleteBatch {
                batch_name: batch.name.clone(),
                reason: "at least one participant is required".to_string(),
            });
        }
        for challenge_id in &batch.challenge_ids {
            if seen_challenges.insert(*challenge_id, &batch.name).is_some() {
                return Err(ValidationError::DuplicateChallengeAssignment {
                    challenge_id: *challenge_id,
                });
            }
        }
    }

    Ok(())
}

/// Conservation audit: batches are pairwise disjoint and their union equals
/// the expected participant set.
pub fn audit_conservation(
    batches: &[Batch],
    expected: &BTreeSet<ParticipantId>,
) -> Result<(), ConsistencyFault> {
    let mut seen: BTreeMap<ParticipantId, usize> = BTreeMap::new();
    for batch in batches {
        for participant in &batch.participant_ids {
            *seen.entry(*participant).or_insert(0) += 1;
        }
    }

    for (participant, count) in &seen {
        if *count > 1 {
            return Err(ConsistencyFault::DuplicateAssignment {
                participant_id: *participant,
                batch_count: *count,
            });
        }
    }

    let union: BTreeSet<ParticipantId> = seen.keys().copied().collect();
    if let Some(missing) = expected.difference(&union).next() {
        return Err(ConsistencyFault::AssignmentOutOfSync {
            participant_id: *missing,
            batch_id: BatchId::from_uuid(uuid::Uuid::nil()),
        });
    }
    if let Some(extra) = union.difference(expected).next() {
        return Err(ConsistencyFault::AssignmentOutOfSync {
            participant_id: *extra,
            batch_id: BatchId::from_uuid(uuid::Uuid::nil()),
        });
    }

    Ok(())
}

/// The full allocation state of one competition: its time window, the
/// registered population, and the persisted batch set.
///
/// All edit operations keep the cross-reference invariant: a participant's
/// `assigned_batch_id` always agrees with exactly one batch's membership.
/// The storage layer wraps each distribution in its transaction primitive so
/// edits serialize per competition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    pub competition_id: CompetitionId,
    pub window: CompetitionWindow,
    batches: BTreeMap<BatchId, Batch>,
    participants: BTreeMap<ParticipantId, Participant>,
    finalized: bool,
}

impl Distribution {
    pub fn new(competition_id: CompetitionId, window: CompetitionWindow) -> Self {
        Self {
            competition_id,
            window,
            batches: BTreeMap::new(),
            participants: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Register a participant into the population, unassigned.
    pub fn register(&mut self, participant_id: ParticipantId) {
        self.participants.entry(participant_id).or_insert(Participant {
            user_id: participant_id,
            assigned_batch_id: None,
        });
    }

    pub fn registered_ids(&self) -> Vec<ParticipantId> {
        self.participants.keys().copied().collect()
    }

    pub fn participant(&self, participant_id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&participant_id)
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<&Batch> {
        self.batches.get(&batch_id)
    }

    pub fn batches(&self) -> Vec<Batch> {
        self.batches.values().cloned().collect()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Commit a batch set as the distribution, all-or-nothing.
    ///
    /// Validation runs first and reports the first violation; nothing is
    /// persisted on failure. On success the new set replaces the persisted
    /// batches wholesale (re-finalize upserts new batches and drops absent
    /// ones) and every assignment is rewritten from the new memberships.
    pub fn finalize(&mut self, batches: Vec<Batch>) -> Result<(), DomainError> {
        validate_distribution(&batches, &self.window)?;

        let expected: BTreeSet<ParticipantId> = self.participants.keys().copied().collect();
        audit_conservation(&batches, &expected)?;

        // Stage into the keyed map before touching self: a repeated id would
        // silently collapse two validated batches into one.
        let mut staged: BTreeMap<BatchId, Batch> = BTreeMap::new();
        for batch in batches {
            let batch_id = batch.id;
            if staged.insert(batch_id, batch).is_some() {
                return Err(ValidationError::DuplicateBatchId { batch_id }.into());
            }
        }

        self.batches = staged;
        self.rewrite_assignments();
        self.finalized = true;
        Ok(())
    }

    /// Move one participant into another batch: remove from the current
    /// batch, add to the target, rewrite the assignment. One unit of work.
    ///
    /// Returns the source batch (None when previously unassigned) and the
    /// target.
    pub fn move_participant(
        &mut self,
        participant_id: ParticipantId,
        target_batch_id: BatchId,
    ) -> Result<(Option<BatchId>, BatchId), DomainError> {
        let participant = self
            .participants
            .get(&participant_id)
            .copied()
            .ok_or(ConflictError::ParticipantNotFound(participant_id))?;
        if !self.batches.contains_key(&target_batch_id) {
            return Err(ConflictError::BatchNotFound(target_batch_id).into());
        }

        let from = participant.assigned_batch_id;
        if let Some(from_id) = from {
            if let Some(source) = self.batches.get_mut(&from_id) {
                source.participant_ids.remove(&participant_id);
            }
        }

        if let Some(target) = self.batches.get_mut(&target_batch_id) {
            target.participant_ids.insert(participant_id);
        }
        if let Some(p) = self.participants.get_mut(&participant_id) {
            p.assigned_batch_id = Some(target_batch_id);
        }

        Ok((from, target_batch_id))
    }

    /// Delete a batch. Rejected while the batch still holds participants.
    pub fn delete_batch(&mut self, batch_id: BatchId) -> Result<(), DomainError> {
        let batch = self
            .batches
            .get(&batch_id)
            .ok_or(ConflictError::BatchNotFound(batch_id))?;
        if !batch.is_empty() {
            return Err(ConflictError::BatchNotEmpty {
                batch_id,
                participant_count: batch.participant_ids.len(),
            }
            .into());
        }
        self.batches.remove(&batch_id);
        Ok(())
    }

    /// Add an empty emergency/overflow batch to a live distribution.
    ///
    /// Completeness rules are deferred to the next full finalize; only the
    /// batch's own shape is checked here.
    pub fn add_emergency_batch(&mut self, spec: BatchSpec) -> Result<Batch, DomainError> {
        if spec.name.trim().is_empty() {
            return Err(ValidationError::IncompleteBatch {
                batch_name: "(unnamed)".to_string(),
                reason: "name must not be empty".to_string(),
            }
            .into());
        }
        if spec.start_time >= spec.end_time {
            return Err(ValidationError::InvalidTimeWindow {
                batch_name: spec.name,
                reason: "start time must be before end time".to_string(),
            }
            .into());
        }

        let mut batch = spec.into_batch(BTreeSet::new());
        batch.emergency = true;
        self.batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    /// Cross-reference audit over the persisted state.
    ///
    /// Checks conservation (each registered participant in exactly one batch)
    /// and that every `assigned_batch_id` agrees with the batch memberships.
    /// Only meaningful after finalize.
    pub fn audit(&self) -> Result<(), ConsistencyFault> {
        let batches: Vec<Batch> = self.batches.values().cloned().collect();
        let expected: BTreeSet<ParticipantId> = self.participants.keys().copied().collect();
        audit_conservation(&batches, &expected)?;

        for batch in self.batches.values() {
            for participant_id in &batch.participant_ids {
                let assigned = self
                    .participants
                    .get(participant_id)
                    .and_then(|p| p.assigned_batch_id);
                if assigned != Some(batch.id) {
                    return Err(ConsistencyFault::AssignmentOutOfSync {
                        participant_id: *participant_id,
                        batch_id: batch.id,
                    });
                }
            }
        }
        Ok(())
    }

    fn rewrite_assignments(&mut self) {
        for participant in self.participants.values_mut() {
            participant.assigned_batch_id = None;
        }
        let memberships: Vec<(BatchId, ParticipantId)> = self
            .batches
            .values()
            .flat_map(|b| b.participant_ids.iter().map(move |p| (b.id, *p)))
            .collect();
        for (batch_id, participant_id) in memberships {
            if let Some(participant) = self.participants.get_mut(&participant_id) {
                participant.assigned_batch_id = Some(batch_id);
            }
        }
    }
}
