//! Allocation Service
//!
//! Business logic for batch distribution: planning random splits,
//! finalizing them all-or-nothing, and the live edit operations that keep
//! the assignment cross-reference intact.

use super::{EventPublisher, ServiceContext};
use crate::validation::{
    DistributionMode, MoveParticipantRequest, PlanDistributionRequest, Validatable,
};
use crate::{ApplicationError, ApplicationResult};
use async_trait::async_trait;
use contest_domain::batch::{
    plan_equal_distribution, plan_manual_distribution, Batch, BatchSpec, CompetitionWindow,
    Distribution,
};
use contest_domain::events::{DomainEvent, EngineEvent};
use contest_domain::identifiers::{BatchId, CompetitionId, ParticipantId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Distribution store trait
///
/// Implementations must serialize concurrent edits on one competition and
/// apply each operation all-or-nothing.
#[async_trait]
pub trait DistributionStorePort: Send + Sync {
    async fn get(
        &self,
        competition_id: CompetitionId,
    ) -> Result<Option<Distribution>, ApplicationError>;

    async fn create(
        &self,
        competition_id: CompetitionId,
        window: CompetitionWindow,
    ) -> Result<(), ApplicationError>;

    async fn register_participants(
        &self,
        competition_id: CompetitionId,
        participants: Vec<ParticipantId>,
    ) -> Result<(), ApplicationError>;

    /// Validate and commit a batch set in one unit of work.
    async fn finalize(
        &self,
        competition_id: CompetitionId,
        batches: Vec<Batch>,
    ) -> Result<Distribution, ApplicationError>;

    /// Atomic remove-add-reassign of one participant.
    async fn move_participant(
        &self,
        competition_id: CompetitionId,
        participant_id: ParticipantId,
        target_batch_id: BatchId,
    ) -> Result<(Option<BatchId>, BatchId), ApplicationError>;

    async fn delete_batch(
        &self,
        competition_id: CompetitionId,
        batch_id: BatchId,
    ) -> Result<(), ApplicationError>;

    async fn add_emergency_batch(
        &self,
        competition_id: CompetitionId,
        spec: BatchSpec,
    ) -> Result<Batch, ApplicationError>;
}

/// Allocation service implementation
pub struct AllocationService<D, E>
where
    D: DistributionStorePort,
    E: EventPublisher,
{
    store: Arc<D>,
    event_publisher: Arc<E>,
}

impl<D, E> AllocationService<D, E>
where
    D: DistributionStorePort,
    E: EventPublisher,
{
    pub fn new(store: Arc<D>, event_publisher: Arc<E>) -> Self {
        Self {
            store,
            event_publisher,
        }
    }

    /// Create the allocation state for a competition.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id))]
    pub async fn create_distribution(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
        window: CompetitionWindow,
    ) -> ApplicationResult<()> {
        ctx.require_admin()?;
        self.store.create(competition_id, window).await?;
        info!(competition_id = %competition_id, "Distribution created");
        Ok(())
    }

    /// Register participants into the competition population.
    #[instrument(skip(self, ctx, participants), fields(correlation_id = %ctx.correlation_id))]
    pub async fn register_participants(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
        participants: Vec<ParticipantId>,
    ) -> ApplicationResult<()> {
        ctx.require_admin()?;
        self.store
            .register_participants(competition_id, participants)
            .await
    }

    /// Plan a distribution without persisting anything.
    ///
    /// Equal mode splits the shuffled population into `ceil(N / batches)`
    /// chunks; manual mode slices per declared capacity, rejecting totals
    /// that do not add up. The returned batches are a proposal for review
    /// and a later finalize.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id))]
    pub async fn plan_distribution(
        &self,
        ctx: &ServiceContext,
        request: PlanDistributionRequest,
    ) -> ApplicationResult<Vec<Batch>> {
        ctx.require_admin()?;
        request.validate_all().ensure_valid()?;

        let mut rng = StdRng::from_entropy();
        let planned = match request.mode {
            DistributionMode::Equal => {
                plan_equal_distribution(&request.participants, request.specs, &mut rng)
            }
            DistributionMode::Manual => {
                plan_manual_distribution(&request.participants, request.specs, &mut rng)
            }
        }
        .map_err(contest_domain::errors::DomainError::from)?;

        info!(
            mode = ?request.mode,
            batch_count = planned.len(),
            participant_count = request.participants.len(),
            "Distribution planned"
        );
        Ok(planned)
    }

    /// Validate and commit a batch set, all-or-nothing.
    ///
    /// Re-finalizing diffs against the persisted set: new batches are
    /// upserted, absent ones dropped, and every assignment rewritten in the
    /// same unit of work. The first validation failure aborts the whole
    /// commit.
    #[instrument(skip(self, ctx, batches), fields(correlation_id = %ctx.correlation_id))]
    pub async fn finalize_distribution(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
        batches: Vec<Batch>,
    ) -> ApplicationResult<Distribution> {
        ctx.require_admin()?;

        let distribution = self.store.finalize(competition_id, batches).await?;
        let batch_count = distribution.batches().len();
        let participant_count = distribution.registered_ids().len();

        info!(
            competition_id = %competition_id,
            batch_count,
            participant_count,
            "Distribution finalized"
        );

        self.event_publisher
            .publish(DomainEvent::new(
                EngineEvent::DistributionFinalized {
                    competition_id,
                    batch_count,
                    participant_count,
                },
                ctx.event_metadata(),
            ))
            .await?;

        Ok(distribution)
    }

    /// Move one participant to another batch atomically.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id))]
    pub async fn move_participant(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
        request: MoveParticipantRequest,
    ) -> ApplicationResult<()> {
        ctx.require_admin()?;
        request.validate_all().ensure_valid()?;

        let (from, to) = self
            .store
            .move_participant(competition_id, request.participant_id, request.target_batch_id)
            .await?;

        info!(
            participant_id = %request.participant_id,
            from_batch = ?from,
            to_batch = %to,
            "Participant moved"
        );

        self.event_publisher
            .publish(DomainEvent::new(
                EngineEvent::ParticipantMoved {
                    participant_id: request.participant_id,
                    from_batch: from,
                    to_batch: to,
                },
                ctx.event_metadata(),
            ))
            .await?;

        Ok(())
    }

    /// Delete a batch. Rejected while the batch still holds participants.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id))]
    pub async fn delete_batch(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
        batch_id: BatchId,
    ) -> ApplicationResult<()> {
        ctx.require_admin()?;

        self.store.delete_batch(competition_id, batch_id).await?;
        info!(batch_id = %batch_id, "Batch deleted");

        self.event_publisher
            .publish(DomainEvent::new(
                EngineEvent::BatchDeleted { batch_id },
                ctx.event_metadata(),
            ))
            .await?;

        Ok(())
    }

    /// Add an empty emergency/overflow batch to a live distribution.
    #[instrument(skip(self, ctx, spec), fields(correlation_id = %ctx.correlation_id))]
    pub async fn add_emergency_batch(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
        spec: BatchSpec,
    ) -> ApplicationResult<Batch> {
        ctx.require_admin()?;

        let batch = self.store.add_emergency_batch(competition_id, spec).await?;
        info!(batch_id = %batch.id, name = %batch.name, "Emergency batch added");
        Ok(batch)
    }

    /// Audit the persisted distribution's cross-reference invariants.
    ///
    /// Faults are logged loudly and returned, never repaired in place.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id))]
    pub async fn audit_distribution(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
    ) -> ApplicationResult<()> {
        ctx.require_admin()?;

        let distribution = self.store.get(competition_id).await?.ok_or_else(|| {
            ApplicationError::NotFound(format!("Distribution not found: {}", competition_id))
        })?;

        if let Err(fault) = distribution.audit() {
            error!(competition_id = %competition_id, fault = %fault, "Distribution audit failed");
            return Err(fault.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NoOpEventPublisher;
    use chrono::{Duration, Utc};
    use contest_domain::identifiers::ChallengeId;
    use parking_lot::Mutex;
    use std::collections::{BTreeSet, HashMap};

    struct InMemoryDistributions {
        distributions: Mutex<HashMap<CompetitionId, Distribution>>,
    }

    impl InMemoryDistributions {
        fn new() -> Self {
            Self {
                distributions: Mutex::new(HashMap::new()),
            }
        }

        fn with_distribution<T>(
            &self,
            competition_id: CompetitionId,
            f: impl FnOnce(&mut Distribution) -> Result<T, ApplicationError>,
        ) -> Result<T, ApplicationError> {
            let mut guard = self.distributions.lock();
            let distribution = guard.get_mut(&competition_id).ok_or_else(|| {
                ApplicationError::NotFound(format!("Distribution not found: {}", competition_id))
            })?;
            f(distribution)
        }
    }

    #[async_trait]
    impl DistributionStorePort for InMemoryDistributions {
        async fn get(
            &self,
            competition_id: CompetitionId,
        ) -> Result<Option<Distribution>, ApplicationError> {
            Ok(self.distributions.lock().get(&competition_id).cloned())
        }

        async fn create(
            &self,
            competition_id: CompetitionId,
            window: CompetitionWindow,
        ) -> Result<(), ApplicationError> {
            self.distributions
                .lock()
                .insert(competition_id, Distribution::new(competition_id, window));
            Ok(())
        }

        async fn register_participants(
            &self,
            competition_id: CompetitionId,
            participants: Vec<ParticipantId>,
        ) -> Result<(), ApplicationError> {
            self.with_distribution(competition_id, |d| {
                for p in participants {
                    d.register(p);
                }
                Ok(())
            })
        }

        async fn finalize(
            &self,
            competition_id: CompetitionId,
            batches: Vec<Batch>,
        ) -> Result<Distribution, ApplicationError> {
            self.with_distribution(competition_id, |d| {
                d.finalize(batches)?;
                Ok(d.clone())
            })
        }

        async fn move_participant(
            &self,
            competition_id: CompetitionId,
            participant_id: ParticipantId,
            target_batch_id: BatchId,
        ) -> Result<(Option<BatchId>, BatchId), ApplicationError> {
            self.with_distribution(competition_id, |d| {
                Ok(d.move_participant(participant_id, target_batch_id)?)
            })
        }

        async fn delete_batch(
            &self,
            competition_id: CompetitionId,
            batch_id: BatchId,
        ) -> Result<(), ApplicationError> {
            self.with_distribution(competition_id, |d| Ok(d.delete_batch(batch_id)?))
        }

        async fn add_emergency_batch(
            &self,
            competition_id: CompetitionId,
            spec: BatchSpec,
        ) -> Result<Batch, ApplicationError> {
            self.with_distribution(competition_id, |d| Ok(d.add_emergency_batch(spec)?))
        }
    }

    fn admin() -> ServiceContext {
        ServiceContext::acting_as(ParticipantId::new(), "test-corr".to_string()).with_admin()
    }

    fn window() -> CompetitionWindow {
        let start = Utc::now();
        CompetitionWindow {
            start,
            end: start + Duration::days(7),
        }
    }

    fn spec(name: &str, capacity: Option<usize>) -> BatchSpec {
        let w = window();
        BatchSpec {
            name: name.to_string(),
            start_time: w.start + Duration::hours(1),
            end_time: w.start + Duration::hours(3),
            challenge_ids: [ChallengeId::new()].into_iter().collect::<BTreeSet<_>>(),
            capacity,
            emergency: false,
        }
    }

    fn service() -> (
        Arc<InMemoryDistributions>,
        AllocationService<InMemoryDistributions, NoOpEventPublisher>,
    ) {
        let store = Arc::new(InMemoryDistributions::new());
        let service = AllocationService::new(store.clone(), Arc::new(NoOpEventPublisher));
        (store, service)
    }

    async fn seeded(
        service: &AllocationService<InMemoryDistributions, NoOpEventPublisher>,
        n: usize,
    ) -> (CompetitionId, Vec<ParticipantId>) {
        let competition_id = CompetitionId::new();
        let participants: Vec<ParticipantId> = (0..n).map(|_| ParticipantId::new()).collect();
        service
            .create_distribution(&admin(), competition_id, window())
            .await
            .unwrap();
        service
            .register_participants(&admin(), competition_id, participants.clone())
            .await
            .unwrap();
        (competition_id, participants)
    }

    #[tokio::test]
    async fn test_plan_and_finalize_equal_mode() {
        let (_, service) = service();
        let (competition_id, participants) = seeded(&service, 50).await;

        let planned = service
            .plan_distribution(
                &admin(),
                PlanDistributionRequest {
                    mode: DistributionMode::Equal,
                    participants,
                    specs: vec![spec("w1", None), spec("w2", None), spec("w3", None)],
                },
            )
            .await
            .unwrap();

        let mut sizes: Vec<usize> = planned.iter().map(|b| b.participant_ids.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![16, 17, 17]);

        let distribution = service
            .finalize_distribution(&admin(), competition_id, planned)
            .await
            .unwrap();
        assert!(distribution.is_finalized());
        assert!(distribution.audit().is_ok());
    }

    #[tokio::test]
    async fn test_manual_mode_capacity_mismatch_surfaces() {
        let (_, service) = service();
        let (_, participants) = seeded(&service, 50).await;

        let err = service
            .plan_distribution(
                &admin(),
                PlanDistributionRequest {
                    mode: DistributionMode::Manual,
                    participants,
                    specs: vec![spec("a", Some(20)), spec("b", Some(22))],
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert!(err.to_string().contains("deficit of 8"));
    }

    #[tokio::test]
    async fn test_move_and_delete_flow() {
        let (store, service) = service();
        let (competition_id, participants) = seeded(&service, 6).await;

        let planned = service
            .plan_distribution(
                &admin(),
                PlanDistributionRequest {
                    mode: DistributionMode::Equal,
                    participants,
                    specs: vec![spec("a", None), spec("b", None)],
                },
            )
            .await
            .unwrap();
        service
            .finalize_distribution(&admin(), competition_id, planned)
            .await
            .unwrap();

        let distribution = store.get(competition_id).await.unwrap().unwrap();
        let batches = distribution.batches();
        let mover = *batches[0].participant_ids.iter().next().unwrap();

        service
            .move_participant(
                &admin(),
                competition_id,
                MoveParticipantRequest {
                    participant_id: mover,
                    target_batch_id: batches[1].id,
                },
            )
            .await
            .unwrap();

        // A populated batch cannot be deleted.
        let err = service
            .delete_batch(&admin(), competition_id, batches[1].id)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");

        service
            .audit_distribution(&admin(), competition_id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_emergency_batch_added_empty() {
        let (_, service) = service();
        let (competition_id, participants) = seeded(&service, 4).await;

        let planned = service
            .plan_distribution(
                &admin(),
                PlanDistributionRequest {
                    mode: DistributionMode::Equal,
                    participants,
                    specs: vec![spec("a", None)],
                },
            )
            .await
            .unwrap();
        service
            .finalize_distribution(&admin(), competition_id, planned)
            .await
            .unwrap();

        let batch = service
            .add_emergency_batch(&admin(), competition_id, spec("overflow", None))
            .await
            .unwrap();
        assert!(batch.emergency);
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_admin_required_everywhere() {
        let (_, service) = service();
        let ctx = ServiceContext::anonymous("corr".to_string());
        let competition_id = CompetitionId::new();

        assert!(service
            .create_distribution(&ctx, competition_id, window())
            .await
            .is_err());
        assert!(service
            .plan_distribution(
                &ctx,
                PlanDistributionRequest {
                    mode: DistributionMode::Equal,
                    participants: vec![],
                    specs: vec![spec("a", None)],
                },
            )
            .await
            .is_err());
        assert!(service
            .audit_distribution(&ctx, competition_id)
            .await
            .is_err());
    }
}
