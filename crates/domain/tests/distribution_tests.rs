//! Tests for the distribution lifecycle
//!
//! Plans, finalizes, and edits a distribution end to end, checking the
//! conservation and cross-reference invariants at every step.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

use contest_domain::batch::{
    plan_equal_distribution, plan_manual_distribution, BatchSpec, CompetitionWindow, Distribution,
};
use contest_domain::identifiers::{ChallengeId, CompetitionId, ParticipantId};

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
        end_time: w.start + Duration::hours(4),
        challenge_ids: [ChallengeId::new()].into_iter().collect::<BTreeSet<_>>(),
        capacity,
        emergency: false,
    }
}

fn population(n: usize) -> Vec<ParticipantId> {
    (0..n).map(|_| ParticipantId::new()).collect()
}

#[test]
fn test_full_lifecycle_plan_finalize_edit() {
    let participants = population(50);
    let mut distribution = Distribution::new(CompetitionId::new(), window());
    for p in &participants {
        distribution.register(*p);
    }

    let mut rng = StdRng::seed_from_u64(3);
    let planned = plan_equal_distribution(
        &participants,
        vec![spec("w1", None), spec("w2", None), spec("w3", None)],
        &mut rng,
    )
    .unwrap();

    // ceil(50/3) = 17; the shortfall lands in the last chunk.
    let mut sizes: Vec<usize> = planned.iter().map(|b| b.participant_ids.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![16, 17, 17]);

    distribution.finalize(planned).unwrap();
    assert!(distribution.is_finalized());
    distribution.audit().unwrap();

    // Every participant's assignment points at the batch holding them.
    for p in &participants {
        let assigned = distribution.participant(*p).unwrap().assigned_batch_id;
        let batch = distribution.batch(assigned.unwrap()).unwrap();
        assert!(batch.participant_ids.contains(p));
    }

    // Move one participant and re-check the cross-reference.
    let batches = distribution.batches();
    let mover = *batches[0].participant_ids.iter().next().unwrap();
    let (from, to) = distribution
        .move_participant(mover, batches[2].id)
        .unwrap();
    assert_eq!(from, Some(batches[0].id));
    assert_eq!(to, batches[2].id);
    distribution.audit().unwrap();
}

#[test]
fn test_manual_planning_honors_capacities() {
    let participants = population(50);
    let mut rng = StdRng::seed_from_u64(9);

    let planned = plan_manual_distribution(
        &participants,
        vec![spec("a", Some(20)), spec("b", Some(18)), spec("c", Some(12))],
        &mut rng,
    )
    .unwrap();

    let by_name: Vec<(String, usize)> = planned
        .iter()
        .map(|b| (b.name.clone(), b.participant_ids.len()))
        .collect();
    assert!(by_name.contains(&("a".to_string(), 20)));
    assert!(by_name.contains(&("b".to_string(), 18)));
    assert!(by_name.contains(&("c".to_string(), 12)));
}

#[test]
fn test_manual_planning_names_the_gap() {
    let participants = population(50);
    let mut rng = StdRng::seed_from_u64(9);

    let deficit = plan_manual_distribution(
        &participants,
        vec![spec("a", Some(20)), spec("b", Some(22))],
        &mut rng,
    )
    .unwrap_err();
    assert!(deficit.to_string().contains("deficit of 8"));

    let surplus = plan_manual_distribution(
        &participants,
        vec![spec("a", Some(30)), spec("b", Some(25))],
        &mut rng,
    )
    .unwrap_err();
    assert!(surplus.to_string().contains("surplus of 5"));
}

#[test]
fn test_shuffle_is_seed_deterministic() {
    let participants = population(12);

    let plan_with = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        plan_equal_distribution(&participants, vec![spec("a", None), spec("b", None)], &mut rng)
            .unwrap()
            .into_iter()
            .map(|b| b.participant_ids)
            .collect::<Vec<_>>()
    };

    assert_eq!(plan_with(5), plan_with(5));
}

#[test]
fn test_emergency_batch_and_refinalize() {
    let participants = population(8);
    let mut distribution = Distribution::new(CompetitionId::new(), window());
    for p in &participants {
        distribution.register(*p);
    }

    let mut rng = StdRng::seed_from_u64(1);
    let planned =
        plan_equal_distribution(&participants, vec![spec("a", None), spec("b", None)], &mut rng)
            .unwrap();
    distribution.finalize(planned).unwrap();

    let overflow = distribution
        .add_emergency_batch(spec("overflow", None))
        .unwrap();
    assert!(overflow.emergency);
    assert!(overflow.is_empty());
    distribution.audit().unwrap();

    // Re-finalize with a freshly planned set; old batch ids disappear.
    let old_ids: BTreeSet<_> = distribution.batches().iter().map(|b| b.id).collect();
    let mut rng = StdRng::seed_from_u64(2);
    let replanned = plan_equal_distribution(
        &participants,
        vec![spec("x", None), spec("y", None), spec("z", None)],
        &mut rng,
    )
    .unwrap();
    distribution.finalize(replanned).unwrap();

    let new_ids: BTreeSet<_> = distribution.batches().iter().map(|b| b.id).collect();
    assert!(old_ids.is_disjoint(&new_ids));
    assert_eq!(new_ids.len(), 3);
    distribution.audit().unwrap();
}
