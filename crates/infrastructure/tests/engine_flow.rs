//! End-to-end flows through the application services backed by the
//! in-memory stores and the broadcast event bus.

use std::sync::Arc;

use contest_application::services::{
    AllocationService, EvaluationService, ServiceConfig, ServiceContext, SubmissionRepositoryPort,
    VoteOutcome, VoteStorePort, VotingService,
};
use contest_application::validation::{
    CastVoteRequest, CriterionScoreInput, DistributionMode, LeaderboardQuery,
    PlanDistributionRequest, SubmitScoreRequest,
};
use contest_domain::evaluation::EvaluatorKind;
use contest_domain::identifiers::{ChallengeId, CompetitionId, EvaluatorId, ParticipantId};
use contest_domain::vote::DEFAULT_PRIOR_WEIGHT;
use contest_infrastructure::{
    BroadcastEventBus, InMemoryDistributionStore, InMemorySubmissionRepository, InMemoryVoteStore,
};
use contest_testing::builders::{RubricBuilder, SubmissionBuilder};
use contest_testing::fixtures::{create_test_batch_specs, create_test_window};

fn ctx() -> ServiceContext {
    ServiceContext::acting_as(ParticipantId::new(), "it-corr".to_string())
}

fn admin() -> ServiceContext {
    ctx().with_admin()
}

#[tokio::test]
async fn scoring_flow_against_real_stores() {
    let repo = Arc::new(InMemorySubmissionRepository::new());
    let bus = Arc::new(BroadcastEventBus::default());
    let mut events = bus.subscribe();
    let service = EvaluationService::new(repo.clone(), bus, ServiceConfig::default());

    let competition_id = CompetitionId::new();
    let challenge_id = ChallengeId::new();
    repo.register_challenge(
        competition_id,
        challenge_id,
        RubricBuilder::new()
            .with_criterion("accuracy", 2.0)
            .with_criterion("clarity", 1.0)
            .build(),
    );

    let submission = SubmissionBuilder::new().with_challenge(challenge_id).build();
    repo.save(&submission).await.unwrap();

    let record = service
        .submit_score(
            &ctx(),
            SubmitScoreRequest {
                submission_id: submission.id,
                evaluator_id: EvaluatorId::new(),
                kind: EvaluatorKind::HumanJudge,
                scores: vec![
                    CriterionScoreInput {
                        criterion: "accuracy".to_string(),
                        raw_score: 90.0,
                    },
                    CriterionScoreInput {
                        criterion: "clarity".to_string(),
                        raw_score: 60.0,
                    },
                ],
            },
        )
        .await
        .unwrap();
    assert_eq!(record.weighted_total, 80.0);

    let event = events.recv().await.unwrap();
    assert_eq!(event.payload.name(), "score_recorded");

    let page = service
        .get_participant_ranking(
            &ctx(),
            competition_id,
            contest_common::PaginationParams::new(1, 10),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].overall_score, 80.0);
}

#[tokio::test]
async fn concurrent_votes_on_one_challenge_serialize() {
    let repo = Arc::new(InMemorySubmissionRepository::new());
    let votes = Arc::new(InMemoryVoteStore::new(DEFAULT_PRIOR_WEIGHT));
    let service = Arc::new(VotingService::new(
        repo.clone(),
        votes.clone(),
        Arc::new(BroadcastEventBus::default()),
        ServiceConfig::default(),
    ));

    let challenge_id = ChallengeId::new();
    let submission = SubmissionBuilder::new().with_challenge(challenge_id).build();
    repo.save(&submission).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..50u8 {
        let service = Arc::clone(&service);
        let submission_id = submission.id;
        handles.push(tokio::spawn(async move {
            service
                .cast_vote(
                    &ctx(),
                    CastVoteRequest {
                        voter_id: ParticipantId::new(),
                        challenge_id,
                        submission_id,
                        score: (i % 5) + 1,
                    },
                )
                .await
        }));
    }

    let mut accepted = 0u64;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            VoteOutcome::Accepted { .. } => accepted += 1,
            VoteOutcome::Rejected { reason } => panic!("unexpected rejection: {reason}"),
        }
    }
    assert_eq!(accepted, 50);

    // Every vote landed exactly once and the stored aggregates replay clean.
    let book = votes.snapshot(challenge_id).unwrap();
    assert_eq!(book.aggregate(submission.id).unwrap().vote_count, 50);
    votes.verify_consistency(challenge_id).await.unwrap();

    let entries = service
        .get_leaderboard(
            &ctx(),
            LeaderboardQuery {
                challenge_id,
                top_n: None,
                vote_threshold: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].vote_count, 50);
}

#[tokio::test]
async fn allocation_flow_against_real_store() {
    let store = Arc::new(InMemoryDistributionStore::new());
    let bus = Arc::new(BroadcastEventBus::default());
    let mut events = bus.subscribe();
    let service = AllocationService::new(store.clone(), bus);

    let competition_id = CompetitionId::new();
    let participants: Vec<ParticipantId> = (0..30).map(|_| ParticipantId::new()).collect();
    service
        .create_distribution(&admin(), competition_id, create_test_window())
        .await
        .unwrap();
    service
        .register_participants(&admin(), competition_id, participants.clone())
        .await
        .unwrap();

    let planned = service
        .plan_distribution(
            &admin(),
            PlanDistributionRequest {
                mode: DistributionMode::Equal,
                participants,
                specs: create_test_batch_specs(3),
            },
        )
        .await
        .unwrap();

    let distribution = service
        .finalize_distribution(&admin(), competition_id, planned)
        .await
        .unwrap();
    assert!(distribution.is_finalized());

    let event = events.recv().await.unwrap();
    assert_eq!(event.payload.name(), "distribution_finalized");

    service
        .audit_distribution(&admin(), competition_id)
        .await
        .unwrap();
}
