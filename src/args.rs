use crate::chunk::DEFAULT_CHUNK_SIZE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about = "Bulk Sui RPC queries and chunked coin airdrops")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Endpoint pool options shared by the read-only bulk commands.
#[derive(Debug, Args)]
pub struct PoolArgs {
    /// RPC endpoint URL. Can be provided multiple times; defaults to the
    /// built-in mainnet pool.
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoints: Vec<String>,

    /// Minimum delay between request rounds, in milliseconds.
    #[arg(long, default_value_t = 334)]
    pub round_delay_ms: u64,

    /// Attempts per input (first try included) before giving up on it.
    #[arg(long, default_value_t = 3)]
    pub max_attempts: usize,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Airdrop a coin to a CSV of recipients in chunked transactions.
    BulkSend {
        /// The Coin<T> object paying for the airdrop. Must be owned by the
        /// current `sui client active-address`.
        #[arg(long, value_name = "OBJECT_ID")]
        coin: String,

        /// CSV input with `recipient,amount` rows (amounts in base units).
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Audit log path. Refused if it already exists, to prevent
        /// double-running the same instruction set.
        #[arg(long, value_name = "PATH")]
        log: PathBuf,

        /// Transfers per transaction.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Gas budget per transaction in MIST. Omit to let the Sui CLI
        /// estimate it.
        #[arg(long, value_name = "MIST")]
        gas_budget: Option<u64>,

        /// Skip the inter-batch delay (local/private networks only).
        #[arg(long, default_value_t = false)]
        no_delay: bool,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },

    /// Fetch the Coin<T> balance of every address in a JSON list.
    FindBalances {
        /// The T in Coin<T>, e.g. 0x2::sui::SUI.
        #[arg(long, value_name = "TYPE")]
        coin_type: String,

        /// JSON input: an array of addresses or of objects with an
        /// "address" field.
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Where to write the balances JSON.
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        #[command(flatten)]
        pool: PoolArgs,
    },

    /// Find the most recent transaction sent by every address in a JSON list.
    FindLastTx {
        /// JSON input: an array of addresses or of objects with an
        /// "address" field.
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Where to write the results JSON.
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        #[command(flatten)]
        pool: PoolArgs,
    },

    /// Probe the latency of every endpoint in the pool, sequentially.
    TestEndpoints {
        #[command(flatten)]
        pool: PoolArgs,
    },
}
