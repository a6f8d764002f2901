//! Evaluation Service
//!
//! Business logic for recording evaluator scores against submissions and
//! producing the competition-wide participant ranking.

use super::{EventPublisher, ServiceConfig, ServiceContext};
use crate::scoring::{ParticipantRanking, RankedParticipant};
use crate::validation::{SubmitScoreRequest, Validatable};
use crate::{ApplicationError, ApplicationResult};
use async_trait::async_trait;
use contest_common::{PaginatedResult, PaginationParams};
use contest_domain::errors::{DomainError, ValidationError};
use contest_domain::evaluation::{EvaluationRecord, Submission};
use contest_domain::events::{DomainEvent, EngineEvent};
use contest_domain::identifiers::{ChallengeId, CompetitionId, SubmissionId};
use contest_domain::rubric::{Rubric, ScoreSheet};
use std::sync::Arc;
use tracing::{info, instrument};

/// Submission repository trait
#[async_trait]
pub trait SubmissionRepositoryPort: Send + Sync {
    async fn get(&self, id: SubmissionId) -> Result<Option<Submission>, ApplicationError>;
    async fn save(&self, submission: &Submission) -> Result<(), ApplicationError>;
    async fn list_by_competition(
        &self,
        competition_id: CompetitionId,
    ) -> Result<Vec<Submission>, ApplicationError>;
    async fn rubric_for_challenge(
        &self,
        challenge_id: ChallengeId,
    ) -> Result<Option<Rubric>, ApplicationError>;
}

/// Evaluation service implementation
pub struct EvaluationService<R, E>
where
    R: SubmissionRepositoryPort,
    E: EventPublisher,
{
    repository: Arc<R>,
    event_publisher: Arc<E>,
    config: ServiceConfig,
}

impl<R, E> EvaluationService<R, E>
where
    R: SubmissionRepositoryPort,
    E: EventPublisher,
{
    pub fn new(repository: Arc<R>, event_publisher: Arc<E>, config: ServiceConfig) -> Self {
        Self {
            repository,
            event_publisher,
            config,
        }
    }

    /// Record an evaluator's score sheet against a submission.
    ///
    /// The sheet is scored through the challenge's rubric; a prior record by
    /// the same evaluator is replaced, never accumulated.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id))]
    pub async fn submit_score(
        &self,
        ctx: &ServiceContext,
        request: SubmitScoreRequest,
    ) -> ApplicationResult<EvaluationRecord> {
        request.validate_all().ensure_valid()?;

        let mut submission = self
            .repository
            .get(request.submission_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "Submission not found: {}",
                    request.submission_id
                ))
            })?;

        let rubric = self
            .repository
            .rubric_for_challenge(submission.challenge_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::from(DomainError::from(ValidationError::MissingRubric(
                    submission.challenge_id,
                )))
            })?;

        let sheet: ScoreSheet = request
            .scores
            .iter()
            .map(|s| (s.criterion.as_str(), s.raw_score))
            .collect();
        let record =
            EvaluationRecord::score_now(request.evaluator_id, request.kind, sheet, &rubric);

        submission.record_evaluation(record.clone());
        self.repository.save(&submission).await?;

        info!(
            submission_id = %submission.id,
            evaluator_id = %record.evaluator_id,
            weighted_total = record.weighted_total,
            "Evaluation recorded"
        );

        self.event_publisher
            .publish(DomainEvent::new(
                EngineEvent::ScoreRecorded {
                    submission_id: submission.id,
                    evaluator_id: record.evaluator_id,
                    weighted_total: record.weighted_total,
                },
                ctx.event_metadata(),
            ))
            .await?;

        Ok(record)
    }

    /// Recompute every evaluation's weighted total after a rubric change.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id))]
    pub async fn rescore_submission(
        &self,
        ctx: &ServiceContext,
        submission_id: SubmissionId,
    ) -> ApplicationResult<Submission> {
        ctx.require_admin()?;

        let mut submission = self.repository.get(submission_id).await?.ok_or_else(|| {
            ApplicationError::NotFound(format!("Submission not found: {}", submission_id))
        })?;

        let rubric = self
            .repository
            .rubric_for_challenge(submission.challenge_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::from(DomainError::from(ValidationError::MissingRubric(
                    submission.challenge_id,
                )))
            })?;

        submission.rescore_all(&rubric);
        self.repository.save(&submission).await?;

        info!(submission_id = %submission.id, "Submission re-scored against current rubric");
        Ok(submission)
    }

    /// Competition-wide participant ranking, recomputed on demand.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id))]
    pub async fn get_participant_ranking(
        &self,
        ctx: &ServiceContext,
        competition_id: CompetitionId,
        pagination: PaginationParams,
    ) -> ApplicationResult<PaginatedResult<RankedParticipant>> {
        let pagination = PaginationParams::new(
            pagination.page,
            pagination.per_page.min(self.config.max_page_size),
        );

        let submissions = self.repository.list_by_competition(competition_id).await?;
        let rows = ParticipantRanking::new(self.config.ranking_mode).compute(&submissions);

        Ok(PaginatedResult::from_full_set(rows, &pagination))
    }
}
