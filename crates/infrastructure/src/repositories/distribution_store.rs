//! Distribution store implementation.
//!
//! Each competition's distribution lives behind its own mutex; every edit
//! locks it, delegates to the aggregate, and releases. The aggregate itself
//! is all-or-nothing, so a failed edit leaves the locked state untouched.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use contest_application::services::DistributionStorePort;
use contest_application::ApplicationError;
use contest_domain::batch::{Batch, BatchSpec, CompetitionWindow, Distribution};
use contest_domain::identifiers::{BatchId, CompetitionId, ParticipantId};

/// In-memory distribution store keyed by competition.
#[derive(Default)]
pub struct InMemoryDistributionStore {
    distributions: RwLock<HashMap<CompetitionId, Arc<Mutex<Distribution>>>>,
}

impl InMemoryDistributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(
        &self,
        competition_id: CompetitionId,
    ) -> Result<Arc<Mutex<Distribution>>, ApplicationError> {
        self.distributions
            .read()
            .get(&competition_id)
            .cloned()
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("Distribution not found: {}", competition_id))
            })
    }

    fn with_distribution<T>(
        &self,
        competition_id: CompetitionId,
        f: impl FnOnce(&mut Distribution) -> Result<T, ApplicationError>,
    ) -> Result<T, ApplicationError> {
        let entry = self.entry(competition_id)?;
        let mut guard = entry.lock();
        f(&mut guard)
    }
}

#[async_trait]
impl DistributionStorePort for InMemoryDistributionStore {
    async fn get(
        &self,
        competition_id: CompetitionId,
    ) -> Result<Option<Distribution>, ApplicationError> {
        Ok(self
            .distributions
            .read()
            .get(&competition_id)
            .map(|entry| entry.lock().clone()))
    }

    async fn create(
        &self,
        competition_id: CompetitionId,
        window: CompetitionWindow,
    ) -> Result<(), ApplicationError> {
        let mut guard = self.distributions.write();
        if guard.contains_key(&competition_id) {
            return Err(ApplicationError::Conflict(format!(
                "Distribution already exists: {}",
                competition_id
            )));
        }
        guard.insert(
            competition_id,
            Arc::new(Mutex::new(Distribution::new(competition_id, window))),
        );
        debug!(%competition_id, "Distribution created");
        Ok(())
    }

    async fn register_participants(
        &self,
        competition_id: CompetitionId,
        participants: Vec<ParticipantId>,
    ) -> Result<(), ApplicationError> {
        self.with_distribution(competition_id, |distribution| {
            for participant in participants {
                distribution.register(participant);
            }
            Ok(())
        })
    }

    async fn finalize(
        &self,
        competition_id: CompetitionId,
        batches: Vec<Batch>,
    ) -> Result<Distribution, ApplicationError> {
        self.with_distribution(competition_id, |distribution| {
            distribution.finalize(batches)?;
            Ok(distribution.clone())
        })
    }

    async fn move_participant(
        &self,
        competition_id: CompetitionId,
        participant_id: ParticipantId,
        target_batch_id: BatchId,
    ) -> Result<(Option<BatchId>, BatchId), ApplicationError> {
        self.with_distribution(competition_id, |distribution| {
            Ok(distribution.move_participant(participant_id, target_batch_id)?)
        })
    }

    async fn delete_batch(
        &self,
        competition_id: CompetitionId,
        batch_id: BatchId,
    ) -> Result<(), ApplicationError> {
        self.with_distribution(competition_id, |distribution| {
            Ok(distribution.delete_batch(batch_id)?)
        })
    }

    async fn add_emergency_batch(
        &self,
        competition_id: CompetitionId,
        spec: BatchSpec,
    ) -> Result<Batch, ApplicationError> {
        self.with_distribution(competition_id, |distribution| {
            Ok(distribution.add_emergency_batch(spec)?)
        })
    }
}
