//! Order-preserving batched execution across the endpoint pool.
//!
//! Inputs are processed in rounds of `pool.len()` concurrent operations, one
//! endpoint per item in rotation. Rounds are sequential, so peak concurrency
//! never exceeds the pool size. Failed items are re-queued behind the
//! remaining first-pass work and retried on whichever endpoint rotation hands
//! them next, up to the configured attempt budget.

use crate::pool::{PoolClient, RpcPool};
use anyhow::Result;
use futures::future::join_all;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{sleep, Instant};

/// Per-input result of a batched run.
///
/// Exhaustion is reported per item instead of failing the whole run: in a bulk
/// query over thousands of addresses, a handful of items that no endpoint
/// could serve should not discard the rest.
#[derive(Debug)]
pub enum ItemOutcome<O> {
    Ok(O),
    Exhausted {
        /// Total attempts made, including the first.
        attempts: usize,
        last_error: anyhow::Error,
    },
}

impl<O> ItemOutcome<O> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ItemOutcome::Ok(_))
    }

    pub fn ok(self) -> Option<O> {
        match self {
            ItemOutcome::Ok(value) => Some(value),
            ItemOutcome::Exhausted { .. } => None,
        }
    }
}

impl<C> RpcPool<C> {
    /// Run `operation` for every input, fanning out across the pool.
    ///
    /// `outputs[i]` always corresponds to `inputs[i]`, no matter which
    /// endpoint served it or how many retries it took. Between rounds the
    /// executor enforces the pool's minimum delay so the aggregate request
    /// rate stays under the endpoints' rate limits.
    pub async fn execute_in_batches<I, O, F, Fut>(
        &self,
        inputs: Vec<I>,
        operation: F,
    ) -> Vec<ItemOutcome<O>>
    where
        I: Clone,
        F: Fn(Arc<PoolClient<C>>, I) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let total = inputs.len();
        let mut slots: Vec<Option<ItemOutcome<O>>> = (0..total).map(|_| None).collect();

        // (original index, attempt number, input). Retries go to the back so
        // first-pass rounds drain before any retry round starts.
        let mut pending: VecDeque<(usize, usize, I)> = inputs
            .into_iter()
            .enumerate()
            .map(|(idx, input)| (idx, 1, input))
            .collect();

        let round_size = self.len();
        let config = self.config();
        tracing::debug!(total, round_size, "executing operations in rounds");

        let mut round_num = 0usize;
        while !pending.is_empty() {
            round_num += 1;
            let round: Vec<(usize, usize, I)> = (0..round_size)
                .map_while(|_| pending.pop_front())
                .collect();
            tracing::debug!(
                round = round_num,
                items = round.len(),
                queued = pending.len(),
                "processing round"
            );

            let round_started = Instant::now();
            let calls = round.iter().map(|(idx, _, input)| {
                let client = self.next_client();
                let call = operation(client, input.clone());
                async move { (*idx, call.await) }
            });
            let results = join_all(calls).await;

            for ((idx, attempt, input), (_, result)) in round.into_iter().zip(results) {
                match result {
                    Ok(value) => slots[idx] = Some(ItemOutcome::Ok(value)),
                    Err(err) if attempt < config.max_attempts => {
                        tracing::warn!(index = idx, attempt, error = %format!("{err:#}"), "operation failed, queued for retry");
                        pending.push_back((idx, attempt + 1, input));
                    }
                    Err(err) => {
                        tracing::warn!(index = idx, attempts = attempt, "operation failed on every attempt");
                        slots[idx] = Some(ItemOutcome::Exhausted {
                            attempts: attempt,
                            last_error: err,
                        });
                    }
                }
            }

            if !pending.is_empty() {
                let elapsed = round_started.elapsed();
                if elapsed < config.min_round_delay {
                    sleep(config.min_round_delay - elapsed).await;
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.expect("every input fills its slot exactly once"))
            .collect()
    }
}
