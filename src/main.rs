//! Bulk Sui operations CLI.
//!
//! Read-only bulk queries fan out across a rotating pool of public fullnodes;
//! the airdrop command submits chunked transactions through the local `sui`
//! client and keeps an append-only audit log of every batch.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sui_bulkops::args::{Cli, Command, PoolArgs};
use sui_bulkops::executor::ItemOutcome;
use sui_bulkops::input::{read_addresses_json, read_transfers_csv, write_json};
use sui_bulkops::pool::{PoolConfig, RpcPool};
use sui_bulkops::rpc::{JsonRpcClient, MAINNET_ENDPOINTS};
use sui_bulkops::submit::{send_in_chunks, PipelineConfig};
use sui_bulkops::wallet::{self, PtbSubmitter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::BulkSend {
            coin,
            input,
            log,
            chunk_size,
            gas_budget,
            no_delay,
            yes,
        } => cmd_bulk_send(coin, &input, &log, chunk_size, gas_budget, no_delay, yes).await,
        Command::FindBalances {
            coin_type,
            input,
            output,
            pool,
        } => cmd_find_balances(coin_type, &input, &output, &pool).await,
        Command::FindLastTx {
            input,
            output,
            pool,
        } => cmd_find_last_tx(&input, &output, &pool).await,
        Command::TestEndpoints { pool } => cmd_test_endpoints(&pool),
    }
}

fn build_pool(args: &PoolArgs) -> Result<RpcPool<JsonRpcClient>> {
    let endpoints: Vec<String> = if args.endpoints.is_empty() {
        MAINNET_ENDPOINTS.iter().map(|s| s.to_string()).collect()
    } else {
        args.endpoints.clone()
    };
    let clients = endpoints
        .into_iter()
        .map(|url| {
            let client = JsonRpcClient::new(&url);
            (url, client)
        })
        .collect();
    RpcPool::new(
        clients,
        PoolConfig {
            min_round_delay: Duration::from_millis(args.round_delay_ms),
            max_attempts: args.max_attempts,
        },
    )
}

async fn cmd_bulk_send(
    coin: String,
    input: &Path,
    log: &PathBuf,
    chunk_size: usize,
    gas_budget: Option<u64>,
    no_delay: bool,
    yes: bool,
) -> Result<()> {
    let transfers = read_transfers_csv(input)?;
    if transfers.is_empty() {
        return Err(anyhow!("{} contains no valid recipients", input.display()));
    }

    let total_amount: u128 = transfers.iter().map(|t| t.amount as u128).sum();
    let chunk_count = transfers.len().div_ceil(chunk_size.max(1));
    println!("Input file: {}", input.display());
    println!("Log file: {}", log.display());
    if let Ok(sender) = wallet::active_address() {
        println!("Sender: {}", sender);
    }
    println!("Coin object: {}", coin);
    println!("Recipients: {}", transfers.len());
    println!("Total amount (base units): {}", total_amount);
    println!("Batches: {} (up to {} transfers each)", chunk_count, chunk_size);

    if !yes && !prompt_user("\nDoes this look okay? (y/n) ")? {
        println!("Execution aborted by the user.");
        return Ok(());
    }

    let submitter = PtbSubmitter {
        coin_object: coin,
        gas_budget,
    };
    // Local networks confirm instantly, so the pacing delay is pointless there.
    let skip_delay = no_delay || matches!(wallet::active_env().as_deref(), Ok("localnet"));
    let config = PipelineConfig {
        chunk_size,
        inter_chunk_delay: if skip_delay {
            None
        } else {
            PipelineConfig::default().inter_chunk_delay
        },
    };

    let summary = send_in_chunks(&submitter, &transfers, &config, log).await?;

    for result in &summary.results {
        match (&result.digest, &result.error) {
            (Some(digest), _) => println!(
                "Batch {}: confirmed {} transfers ({})",
                result.chunk_index + 1,
                result.instruction_count,
                digest
            ),
            (None, Some(error)) => println!("Batch {}: FAILED: {}", result.chunk_index + 1, error),
            (None, None) => {}
        }
    }

    if summary.completed {
        println!("\nDone!");
        println!("Gas used: {} SUI", summary.total_gas as f64 / 1_000_000_000.0);
        Ok(())
    } else {
        Err(anyhow!(
            "run aborted after {} of {} batches; reconcile against {} before retrying",
            summary.results.len(),
            chunk_count,
            log.display()
        ))
    }
}

#[derive(Debug, Serialize)]
struct BalanceEntry {
    address: String,
    balance: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn cmd_find_balances(
    coin_type: String,
    input: &Path,
    output: &Path,
    pool_args: &PoolArgs,
) -> Result<()> {
    let addresses = read_addresses_json(input)?;
    println!("Fetching {} balances in rounds...", addresses.len());

    let pool = build_pool(pool_args)?;
    let coin_type = Arc::new(coin_type);
    let outcomes = pool
        .execute_in_batches(addresses.clone(), move |client, address: String| {
            let coin_type = Arc::clone(&coin_type);
            async move {
                tokio::task::spawn_blocking(move || {
                    client.client.get_balance(&address, &coin_type)
                })
                .await
                .context("balance fetch task panicked")?
            }
        })
        .await;

    let entries: Vec<BalanceEntry> = addresses
        .into_iter()
        .zip(outcomes)
        .map(|(address, outcome)| match outcome {
            ItemOutcome::Ok(balance) => BalanceEntry {
                address,
                balance: Some(balance.total_balance),
                error: None,
            },
            ItemOutcome::Exhausted {
                attempts,
                last_error,
            } => BalanceEntry {
                address,
                balance: None,
                error: Some(format!("failed after {} attempts: {:#}", attempts, last_error)),
            },
        })
        .collect();

    let failures = entries.iter().filter(|e| e.error.is_some()).count();
    write_json(output, &entries)?;
    println!("Wrote {} balances to {} ({} failed)", entries.len(), output.display(), failures);
    Ok(())
}

#[derive(Debug, Serialize)]
struct LastTxEntry {
    address: String,
    digest: Option<String>,
    timestamp_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn cmd_find_last_tx(input: &Path, output: &Path, pool_args: &PoolArgs) -> Result<()> {
    let addresses = read_addresses_json(input)?;
    println!("Fetching the last transaction of {} addresses in rounds...", addresses.len());

    let pool = build_pool(pool_args)?;
    let outcomes = pool
        .execute_in_batches(addresses.clone(), |client, address: String| async move {
            tokio::task::spawn_blocking(move || client.client.last_transaction(&address))
                .await
                .context("transaction fetch task panicked")?
        })
        .await;

    let entries: Vec<LastTxEntry> = addresses
        .into_iter()
        .zip(outcomes)
        .map(|(address, outcome)| match outcome {
            ItemOutcome::Ok(Some(tx)) => LastTxEntry {
                address,
                digest: Some(tx.digest),
                timestamp_ms: tx.timestamp_ms,
                error: None,
            },
            ItemOutcome::Ok(None) => LastTxEntry {
                address,
                digest: None,
                timestamp_ms: None,
                error: None,
            },
            ItemOutcome::Exhausted {
                attempts,
                last_error,
            } => LastTxEntry {
                address,
                digest: None,
                timestamp_ms: None,
                error: Some(format!("failed after {} attempts: {:#}", attempts, last_error)),
            },
        })
        .collect();

    write_json(output, &entries)?;
    println!("Wrote {} results to {}", entries.len(), output.display());
    Ok(())
}

/// Address with long-lived activity on mainnet, used purely as a probe target.
const PROBE_ADDRESS: &str = "0x8ec0945def230349b2cbd72abd0a91ceb1ca8a4604474d03ef16379414f05a10";

fn cmd_test_endpoints(pool_args: &PoolArgs) -> Result<()> {
    let pool = build_pool(pool_args)?;
    println!("Testing {} endpoints", pool.len());

    let total_started = Instant::now();
    for pool_client in pool.clients() {
        let started = Instant::now();
        match pool_client.client.get_balance(PROBE_ADDRESS, "0x2::sui::SUI") {
            Ok(balance) => println!(
                "{}: {:.0}ms (balance: {})",
                pool_client.endpoint,
                started.elapsed().as_secs_f64() * 1000.0,
                balance.total_balance
            ),
            Err(err) => println!("{}: FAILED: {:#}", pool_client.endpoint, err),
        }
    }
    println!("Total time: {:.1}s", total_started.elapsed().as_secs_f64());
    Ok(())
}

fn prompt_user(question: &str) -> Result<bool> {
    print!("{}", question);
    std::io::stdout().flush().context("flush stdout")?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("read from stdin")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
