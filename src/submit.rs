//! Chunked transfer submission with per-chunk confirmation.
//!
//! The pipeline consumes an ordered list of transfer instructions, groups them
//! with [`crate::chunk::plan_chunks`], and submits one transaction per chunk,
//! strictly in order. A chunk only counts as confirmed when the remote status
//! is an explicit success *and* the number of created objects equals the
//! chunk's instruction count; anything else aborts the run, because later
//! chunks spend change left by earlier ones and a partially-applied chunk
//! must be reconciled by hand before more value moves.

use crate::audit::AuditLog;
use crate::chunk::{plan_chunks, DEFAULT_CHUNK_SIZE};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One recipient and the amount owed, in base units (no decimal scaling).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    pub recipient: String,
    pub amount: u64,
}

/// Gas charged by one transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSummary {
    pub computation_cost: u64,
    pub storage_cost: u64,
    pub storage_rebate: u64,
}

impl GasSummary {
    /// Net cost: computation + storage minus the rebate. The rebate can
    /// exceed the charges, so this is signed.
    pub fn net(&self) -> i128 {
        self.computation_cost as i128 + self.storage_cost as i128 - self.storage_rebate as i128
    }
}

/// Definitive remote status for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failure(String),
}

/// Typed view of the remote confirmation, extracted at the RPC boundary.
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    /// Opaque confirmation handle (transaction digest).
    pub digest: String,
    pub status: ExecutionStatus,
    /// Objects the transaction created; one per transfer when fully applied.
    pub created_count: usize,
    pub gas: GasSummary,
}

/// Immutable record of one chunk's submission.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub chunk_index: usize,
    pub instruction_count: usize,
    pub success: bool,
    pub digest: Option<String>,
    pub gas: Option<GasSummary>,
    pub error: Option<String>,
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunSummary {
    /// Sum of net gas across confirmed chunks.
    pub total_gas: i128,
    pub results: Vec<BatchResult>,
    /// False when the run aborted before submitting every chunk.
    pub completed: bool,
}

/// Submits one transaction bundling a funding split plus every transfer in
/// the chunk. Writes are signed by a single identity, so unlike bulk reads
/// there is one submitter, not a pool.
#[async_trait]
pub trait BatchSubmitter {
    async fn submit(&self, chunk: &[TransferInstruction]) -> Result<SubmitResponse>;
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    /// Pause between consecutive chunk submissions. `None` skips the pause
    /// entirely (local networks have no rate limit).
    pub inter_chunk_delay: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            inter_chunk_delay: Some(Duration::from_millis(500)),
        }
    }
}

/// Submit all `instructions` in chunks, recording every step in the audit log
/// at `log_path`.
///
/// Refuses to start if `log_path` already exists (see [`AuditLog::create`]);
/// the guard runs before anything is submitted, and chunk planning runs before
/// the log is created so a bad chunk size leaves no file behind. Configuration
/// errors return `Err`; a chunk that fails mid-run returns `Ok` with
/// `completed == false` and the failure captured in `results`, so the caller
/// can see exactly which chunks confirmed.
pub async fn send_in_chunks<S: BatchSubmitter>(
    submitter: &S,
    instructions: &[TransferInstruction],
    config: &PipelineConfig,
    log_path: &Path,
) -> Result<RunSummary> {
    let chunks = plan_chunks(instructions, config.chunk_size)?;
    let mut audit = AuditLog::create(log_path)?;

    let mut summary = RunSummary {
        total_gas: 0,
        results: Vec::with_capacity(chunks.len()),
        completed: false,
    };

    let total_chunks = chunks.len();
    for (chunk_index, chunk) in chunks.into_iter().enumerate() {
        let batch_number = chunk_index + 1;
        let batch_amount: u128 = chunk.iter().map(|t| t.amount as u128).sum();
        audit.append(&start_record(batch_amount, batch_number, chunk))?;
        tracing::info!(batch = batch_number, total = total_chunks, addresses = chunk.len(), "submitting batch");

        match submitter.submit(chunk).await.and_then(|r| confirm(r, chunk.len())) {
            Ok(response) => {
                audit.append(&format!("Transaction successful: {}", response.digest))?;
                summary.total_gas += response.gas.net();
                summary.results.push(BatchResult {
                    chunk_index,
                    instruction_count: chunk.len(),
                    success: true,
                    digest: Some(response.digest),
                    gas: Some(response.gas),
                    error: None,
                });
            }
            Err(err) => {
                let message = format!("{err:#}");
                audit.append(&format!("Batch {} failed: {}", batch_number, message))?;
                tracing::warn!(batch = batch_number, error = %message, "batch failed, aborting run");
                summary.results.push(BatchResult {
                    chunk_index,
                    instruction_count: chunk.len(),
                    success: false,
                    digest: None,
                    gas: None,
                    error: Some(message),
                });
                return Ok(summary);
            }
        }

        let is_last = batch_number == total_chunks;
        if !is_last {
            if let Some(delay) = config.inter_chunk_delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    summary.completed = true;
    Ok(summary)
}

/// Validate a confirmation: explicit success and an exact created-object
/// count. A "success" with a short count means some transfers silently did
/// not happen, which is a failure, not a partial success.
fn confirm(response: SubmitResponse, expected_count: usize) -> Result<SubmitResponse> {
    match &response.status {
        ExecutionStatus::Failure(reason) => Err(anyhow::anyhow!(
            "transaction status was 'failure' ({}): {}",
            reason,
            response.digest
        )),
        ExecutionStatus::Success if response.created_count != expected_count => {
            Err(anyhow::anyhow!(
                "transaction created {} objects for {} addresses: {}",
                response.created_count,
                expected_count,
                response.digest
            ))
        }
        ExecutionStatus::Success => Ok(response),
    }
}

/// `Sending 1250 to batch 3 (500 addresses): 0x326c, 0x445e, ...`
///
/// Recipients are opaque strings here, so the preview truncates on char
/// boundaries rather than byte offsets.
fn start_record(batch_amount: u128, batch_number: usize, chunk: &[TransferInstruction]) -> String {
    let addresses: Vec<String> = chunk
        .iter()
        .map(|t| t.recipient.chars().take(6).collect())
        .collect();
    format!(
        "Sending {} to batch {} ({} addresses): {}",
        batch_amount,
        batch_number,
        chunk.len(),
        addresses.join(", ")
    )
}
