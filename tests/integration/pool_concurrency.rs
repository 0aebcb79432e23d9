//! Entity pool invariants under concurrent access.
//!
//! These tests verify:
//! - No handle is ever popped by two callers
//! - Push/pop/rotate conserve the pool's contents exactly
//! - Random op sequences agree with a multiset model

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use graphsoak::{EntityPool, SoakError};

#[test]
fn pops_are_exclusive_and_conserving() {
    let threads = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(8);
    let per_thread = 200;
    let pool = Arc::new(EntityPool::new());
    pool.extend(0..(threads * per_thread) as u64);

    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut rng =
                    StdRng::seed_from_u64((i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                let mut popped = Vec::with_capacity(per_thread);
                barrier.wait();
                for _ in 0..per_thread {
                    // Rotations shuffle the deque underneath the poppers.
                    if rng.gen_bool(0.3) {
                        let _ = pool.rotate_sample(rng.gen_range(0..16));
                    }
                    popped.push(pool.pop_random(&mut rng).expect("pool drained early"));
                }
                popped
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().expect("worker panicked") {
            assert!(seen.insert(id), "handle {id} popped twice");
        }
    }
    assert_eq!(seen.len(), threads * per_thread);
    assert!(pool.is_empty());
}

#[test]
fn racing_pushers_and_poppers_lose_no_handles() {
    let pushers = 2;
    let poppers = 2;
    let per_pusher = 500u64;
    let pool = Arc::new(EntityPool::new());
    let barrier = Arc::new(Barrier::new(pushers + poppers));

    let mut handles = Vec::new();
    for p in 0..pushers as u64 {
        let pool = Arc::clone(&pool);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for n in 0..per_pusher {
                pool.push(p * per_pusher + n);
            }
            Vec::new()
        }));
    }
    for i in 0..poppers as u64 {
        let pool = Arc::clone(&pool);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(i + 99);
            let mut got = Vec::new();
            barrier.wait();
            for _ in 0..600 {
                match pool.pop_random(&mut rng) {
                    Ok(id) => got.push(id),
                    // Racing ahead of the pushers is fine.
                    Err(SoakError::EmptyPool) => {}
                    Err(err) => panic!("unexpected pool error: {err}"),
                }
            }
            got
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().expect("worker panicked") {
            assert!(seen.insert(id), "handle {id} observed twice");
        }
    }
    // Whatever was never popped must still be pooled, exactly once.
    let mut rng = StdRng::seed_from_u64(0);
    while let Ok(id) = pool.pop_random(&mut rng) {
        assert!(seen.insert(id), "handle {id} observed twice");
    }
    assert_eq!(seen.len(), pushers * per_pusher as usize);
}

#[derive(Debug, Clone)]
enum PoolOp {
    Push(u64),
    PopRandom,
    RotateSample(usize),
}

fn arb_pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        (0u64..10_000).prop_map(PoolOp::Push),
        Just(PoolOp::PopRandom),
        (0usize..32).prop_map(PoolOp::RotateSample),
    ]
}

proptest! {
    #[test]
    fn any_op_sequence_matches_the_multiset_model(
        ops in prop::collection::vec(arb_pool_op(), 1..200)
    ) {
        let pool = EntityPool::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut model: Vec<u64> = Vec::new();

        for op in ops {
            match op {
                PoolOp::Push(id) => {
                    pool.push(id);
                    model.push(id);
                }
                PoolOp::PopRandom => match pool.pop_random(&mut rng) {
                    Ok(id) => {
                        let at = model.iter().position(|m| *m == id);
                        prop_assert!(at.is_some(), "popped {} not in model", id);
                        model.swap_remove(at.unwrap());
                    }
                    Err(SoakError::EmptyPool) => prop_assert!(model.is_empty()),
                    Err(err) => prop_assert!(false, "unexpected pool error: {}", err),
                },
                PoolOp::RotateSample(k) => match pool.rotate_sample(k) {
                    Ok(id) => prop_assert!(model.contains(&id), "sampled {} not in model", id),
                    Err(SoakError::EmptyPool) => prop_assert!(model.is_empty()),
                    Err(err) => prop_assert!(false, "unexpected pool error: {}", err),
                },
            }
            prop_assert_eq!(pool.len(), model.len());
        }

        let mut drained = Vec::new();
        while let Ok(id) = pool.pop_random(&mut rng) {
            drained.push(id);
        }
        drained.sort_unstable();
        model.sort_unstable();
        prop_assert_eq!(drained, model);
    }
}
