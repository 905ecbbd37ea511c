//! Batched executor behavior: ordering, fairness, concurrency ceiling,
//! rate-limit floor, and retry exhaustion.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sui_bulkops::executor::ItemOutcome;
use sui_bulkops::pool::{PoolConfig, RpcPool};

fn test_pool(size: usize, config: PoolConfig) -> RpcPool<()> {
    let clients = (0..size).map(|i| (format!("http://node{}", i), ())).collect();
    RpcPool::new(clients, config).unwrap()
}

fn fast_config(max_attempts: usize) -> PoolConfig {
    PoolConfig {
        min_round_delay: Duration::ZERO,
        max_attempts,
    }
}

#[tokio::test]
async fn test_order_preserved_under_retries() {
    let pool = test_pool(4, fast_config(3));
    let inputs: Vec<u32> = (0..23).collect();

    // Every third input fails its first attempt and succeeds on retry.
    let attempts: Arc<Mutex<HashMap<u32, usize>>> = Arc::new(Mutex::new(HashMap::new()));
    let attempts_op = Arc::clone(&attempts);

    let outcomes = pool
        .execute_in_batches(inputs.clone(), move |_client, input: u32| {
            let attempts = Arc::clone(&attempts_op);
            async move {
                let attempt = {
                    let mut map = attempts.lock().unwrap();
                    let entry = map.entry(input).or_insert(0);
                    *entry += 1;
                    *entry
                };
                if input % 3 == 0 && attempt == 1 {
                    Err(anyhow!("transient failure for {}", input))
                } else {
                    Ok(input * 10)
                }
            }
        })
        .await;

    assert_eq!(outcomes.len(), inputs.len());
    for (i, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            ItemOutcome::Ok(value) => assert_eq!(value, (i as u32) * 10),
            ItemOutcome::Exhausted { .. } => panic!("input {} should have succeeded on retry", i),
        }
    }
}

#[tokio::test]
async fn test_round_robin_fairness() {
    let pool = test_pool(4, fast_config(1));
    let inputs: Vec<u32> = (0..12).collect();

    let served: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let served_op = Arc::clone(&served);

    let outcomes = pool
        .execute_in_batches(inputs, move |client, input: u32| {
            let served = Arc::clone(&served_op);
            async move {
                served.lock().unwrap().push(client.endpoint.clone());
                Ok(input)
            }
        })
        .await;

    assert!(outcomes.iter().all(|o| o.is_ok()));

    // 12 inputs over 4 endpoints with no failures: each serves exactly 3.
    let mut counts: HashMap<String, usize> = HashMap::new();
    for endpoint in served.lock().unwrap().iter() {
        *counts.entry(endpoint.clone()).or_insert(0) += 1;
    }
    assert_eq!(counts.len(), 4);
    assert!(counts.values().all(|&n| n == 3), "uneven counts: {:?}", counts);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_pool_size() {
    let pool_size = 3;
    let pool = test_pool(pool_size, fast_config(1));
    let inputs: Vec<u32> = (0..14).collect();

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let in_flight_op = Arc::clone(&in_flight);
    let peak_op = Arc::clone(&peak);

    let outcomes = pool
        .execute_in_batches(inputs, move |_client, input: u32| {
            let in_flight = Arc::clone(&in_flight_op);
            let peak = Arc::clone(&peak_op);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(input)
            }
        })
        .await;

    assert_eq!(outcomes.len(), 14);
    assert!(
        peak.load(Ordering::SeqCst) <= pool_size,
        "peak concurrency {} exceeded pool size {}",
        peak.load(Ordering::SeqCst),
        pool_size
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_floor_between_rounds() {
    let delay = Duration::from_millis(100);
    let pool = test_pool(
        2,
        PoolConfig {
            min_round_delay: delay,
            max_attempts: 1,
        },
    );
    let inputs: Vec<u32> = (0..6).collect(); // 3 rounds of 2

    let starts: Arc<Mutex<Vec<tokio::time::Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let starts_op = Arc::clone(&starts);

    pool.execute_in_batches(inputs, move |_client, input: u32| {
        let starts = Arc::clone(&starts_op);
        async move {
            starts.lock().unwrap().push(tokio::time::Instant::now());
            Ok(input)
        }
    })
    .await;

    // With the clock paused, every operation in a round observes the same
    // instant; distinct instants are round starts.
    let mut round_starts: Vec<tokio::time::Instant> = starts.lock().unwrap().clone();
    round_starts.dedup();
    assert_eq!(round_starts.len(), 3);
    for pair in round_starts.windows(2) {
        assert!(pair[1] - pair[0] >= delay, "rounds started {:?} apart", pair[1] - pair[0]);
    }
}

#[tokio::test]
async fn test_exhausted_after_attempt_budget() {
    let max_attempts = 3;
    let pool = test_pool(2, fast_config(max_attempts));
    let inputs: Vec<u32> = (0..4).collect();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_op = Arc::clone(&calls);

    let outcomes = pool
        .execute_in_batches(inputs, move |_client, input: u32| {
            let calls = Arc::clone(&calls_op);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(anyhow!("endpoint rejected input {}", input))
            }
        })
        .await;

    assert_eq!(outcomes.len(), 4);
    for outcome in outcomes {
        match outcome {
            ItemOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, max_attempts);
                assert!(format!("{}", last_error).contains("endpoint rejected"));
            }
            ItemOutcome::Ok(_) => panic!("operation can never succeed"),
        }
    }
    // Each input was attempted exactly max_attempts times, then given up on.
    assert_eq!(calls.load(Ordering::SeqCst), 4 * max_attempts);
}

#[tokio::test]
async fn test_empty_input_returns_empty() {
    let pool = test_pool(3, fast_config(2));
    let outcomes = pool
        .execute_in_batches(Vec::<u32>::new(), |_client, input: u32| async move { Ok(input) })
        .await;
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn test_last_round_smaller_than_pool() {
    let pool = test_pool(4, fast_config(1));
    let inputs: Vec<u32> = (0..6).collect(); // one full round + one round of 2

    let outcomes = pool
        .execute_in_batches(inputs, |_client, input: u32| async move { Ok(input + 1) })
        .await;

    let values: Vec<u32> = outcomes.into_iter().map(|o| o.ok().unwrap()).collect();
    assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
}
