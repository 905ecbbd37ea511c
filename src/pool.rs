//! Endpoint pool with round-robin client rotation.
//!
//! Public fullnodes enforce per-IP rate limits, so bulk reads are spread across
//! many interchangeable endpoints. The pool owns one client handle per endpoint
//! and hands them out in rotation; the cursor is atomic so a pool can be shared
//! across tasks.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A client handle tagged with the endpoint URL it talks to.
///
/// The URL is carried alongside the client so per-endpoint errors and latency
/// reports can name the offender.
#[derive(Debug)]
pub struct PoolClient<C> {
    pub endpoint: String,
    pub client: C,
}

/// Tuning knobs for batched execution over a pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Minimum wall-clock spacing between the starts of consecutive rounds.
    /// Public fullnodes allow roughly 100 requests per 30 seconds; going
    /// faster gets requests rejected outright rather than queued.
    pub min_round_delay: Duration,
    /// Total attempts per input (first try included) before the executor
    /// reports the input as exhausted.
    pub max_attempts: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_round_delay: Duration::from_millis(334),
            max_attempts: 3,
        }
    }
}

/// A fixed, ordered set of interchangeable endpoint clients.
///
/// Constructed once at startup and shared for the process lifetime. The only
/// mutable state is the rotation cursor.
#[derive(Debug)]
pub struct RpcPool<C> {
    clients: Vec<Arc<PoolClient<C>>>,
    cursor: AtomicUsize,
    config: PoolConfig,
}

impl<C> RpcPool<C> {
    /// Build a pool from `(endpoint, client)` pairs.
    ///
    /// An empty pool or a zero retry budget is a configuration error: both
    /// would make every batched call impossible, so they fail here rather
    /// than mid-run.
    pub fn new(clients: Vec<(String, C)>, config: PoolConfig) -> Result<Self> {
        if clients.is_empty() {
            return Err(anyhow!("endpoint pool is empty; configure at least one RPC endpoint"));
        }
        if config.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }
        Ok(Self {
            clients: clients
                .into_iter()
                .map(|(endpoint, client)| Arc::new(PoolClient { endpoint, client }))
                .collect(),
            cursor: AtomicUsize::new(0),
            config,
        })
    }

    /// Return the next client in rotation. O(1), never fails.
    pub fn next_client(&self) -> Arc<PoolClient<C>> {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        Arc::clone(&self.clients[idx])
    }

    /// Number of endpoints, which is also the per-round concurrency ceiling.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// All clients in pool order, for sequential walks (endpoint latency test).
    pub fn clients(&self) -> &[Arc<PoolClient<C>>] {
        &self.clients
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }
}
