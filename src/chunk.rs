//! Split transfer lists into per-transaction chunks.

use anyhow::{anyhow, Result};

/// Hard ceiling on operations bundled into one programmable transaction.
/// Above this the fullnode rejects the transaction with `SizeLimitExceeded`.
pub const MAX_TX_OPERATIONS: usize = 512;

/// Operations the submitter itself adds to each transaction (the funding-coin
/// split), reserved out of the per-chunk budget.
pub const SETUP_OPERATIONS: usize = 1;

/// Most transfer instructions one chunk can carry.
pub const MAX_TRANSFERS_PER_CHUNK: usize = MAX_TX_OPERATIONS - SETUP_OPERATIONS;

/// Default chunk size, with headroom below the protocol ceiling.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Partition `items` into consecutive chunks of at most `max_per_chunk`.
///
/// Order is preserved within and across chunks; the last chunk may be shorter.
/// An empty input yields zero chunks. A chunk size of zero or one above
/// [`MAX_TRANSFERS_PER_CHUNK`] is a configuration error, caught here before
/// any transaction is built.
pub fn plan_chunks<T>(items: &[T], max_per_chunk: usize) -> Result<Vec<&[T]>> {
    if max_per_chunk == 0 {
        return Err(anyhow!("chunk size must be at least 1"));
    }
    if max_per_chunk > MAX_TRANSFERS_PER_CHUNK {
        return Err(anyhow!(
            "chunk size {} exceeds the {} transfers a single transaction can carry",
            max_per_chunk,
            MAX_TRANSFERS_PER_CHUNK
        ));
    }
    Ok(items.chunks(max_per_chunk).collect())
}
