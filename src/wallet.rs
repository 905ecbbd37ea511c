//! Wallet integration through the local `sui` client binary.
//!
//! Signing stays in the Sui CLI: the active keypair never leaves
//! `~/.sui/sui_config`. This module resolves the active address/env and
//! submits each airdrop chunk as one programmable transaction via
//! `sui client ptb --json`, parsing the confirmation out of the JSON reply.

use crate::submit::{
    BatchSubmitter, ExecutionStatus, GasSummary, SubmitResponse, TransferInstruction,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Command;

/// Output of `sui client active-address`.
pub fn active_address() -> Result<String> {
    run_sui(&["client", "active-address"])
}

/// Output of `sui client active-env` (e.g. "mainnet", "localnet").
pub fn active_env() -> Result<String> {
    run_sui(&["client", "active-env"])
}

fn run_sui(args: &[&str]) -> Result<String> {
    let output = Command::new("sui")
        .args(args)
        .output()
        .with_context(|| format!("run `sui {}`", args.join(" ")))?;
    if !output.status.success() {
        return Err(anyhow!(
            "`sui {}` failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Submits one PTB per chunk through the `sui` CLI, signed by the active
/// address. Each transaction splits the exact chunk total off the funding
/// coin and transfers one piece to each recipient.
#[derive(Debug, Clone)]
pub struct PtbSubmitter {
    /// The `Coin<T>` object funding the airdrop. Must be owned by the active
    /// address.
    pub coin_object: String,
    pub gas_budget: Option<u64>,
}

#[async_trait]
impl BatchSubmitter for PtbSubmitter {
    async fn submit(&self, chunk: &[TransferInstruction]) -> Result<SubmitResponse> {
        let args = build_ptb_args(&self.coin_object, chunk, self.gas_budget);
        let stdout = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = args.iter().map(String::as_str).collect();
            run_sui(&refs)
        })
        .await
        .context("ptb submission task panicked")??;

        // The CLI may print warnings ahead of the JSON body.
        let json_start = stdout
            .find('{')
            .ok_or_else(|| anyhow!("no JSON in `sui client ptb` output: {}", stdout))?;
        let value: Value =
            serde_json::from_str(&stdout[json_start..]).context("parse `sui client ptb` JSON")?;
        parse_submit_response(&value)
    }
}

/// Argument list for one chunk's `sui client ptb` invocation.
fn build_ptb_args(coin_object: &str, chunk: &[TransferInstruction], gas_budget: Option<u64>) -> Vec<String> {
    let amounts: Vec<String> = chunk.iter().map(|t| t.amount.to_string()).collect();

    let mut args = vec![
        "client".to_string(),
        "ptb".to_string(),
        "--split-coins".to_string(),
        format!("@{}", coin_object),
        format!("[{}]", amounts.join(", ")),
        "--assign".to_string(),
        "parts".to_string(),
    ];
    for (i, transfer) in chunk.iter().enumerate() {
        args.push("--transfer-objects".to_string());
        args.push(format!("[parts.{}]", i));
        args.push(format!("@{}", transfer.recipient));
    }
    if let Some(budget) = gas_budget {
        args.push("--gas-budget".to_string());
        args.push(budget.to_string());
    }
    args.push("--json".to_string());
    args
}

/// Extract the typed confirmation from a `SuiTransactionBlockResponse` value.
/// Missing required fields are rejected here instead of surfacing as bogus
/// zeros deeper in the pipeline.
fn parse_submit_response(value: &Value) -> Result<SubmitResponse> {
    let digest = value
        .get("digest")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("response missing digest"))?
        .to_string();

    let effects = value
        .get("effects")
        .ok_or_else(|| anyhow!("response missing effects"))?;

    let status_str = effects
        .get("status")
        .and_then(|s| s.get("status"))
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("response missing effects.status.status"))?;
    let status = if status_str == "success" {
        ExecutionStatus::Success
    } else {
        let error = effects
            .get("status")
            .and_then(|s| s.get("error"))
            .and_then(Value::as_str)
            .unwrap_or(status_str);
        ExecutionStatus::Failure(error.to_string())
    };

    let created_count = effects
        .get("created")
        .and_then(Value::as_array)
        .map(|a| a.len())
        .unwrap_or(0);

    let gas_used = effects
        .get("gasUsed")
        .ok_or_else(|| anyhow!("response missing effects.gasUsed"))?;
    let gas = GasSummary {
        computation_cost: u64_field(gas_used, "computationCost")?,
        storage_cost: u64_field(gas_used, "storageCost")?,
        storage_rebate: u64_field(gas_used, "storageRebate")?,
    };

    Ok(SubmitResponse {
        digest,
        status,
        created_count,
        gas,
    })
}

/// Gas figures arrive as decimal strings on current nodes and as numbers on
/// some older ones.
fn u64_field(value: &Value, key: &str) -> Result<u64> {
    let field = value
        .get(key)
        .ok_or_else(|| anyhow!("response missing gasUsed.{}", key))?;
    match field {
        Value::String(s) => s
            .parse::<u64>()
            .with_context(|| format!("gasUsed.{} is not an integer", key)),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| anyhow!("gasUsed.{} is out of range", key)),
        _ => Err(anyhow!("gasUsed.{} has unexpected JSON type", key)),
    }
}
