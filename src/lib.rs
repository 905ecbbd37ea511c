//! Sui bulk operation tools
//!
//! Building blocks for running many RPC operations against a pool of
//! interchangeable fullnode endpoints, and for airdropping coins to large
//! recipient lists in bounded-size transaction batches:
//!
//! - **Endpoint pool**: round-robin rotation over fullnode clients ([`pool`])
//! - **Batched executor**: order-preserving parallel fan-out with bounded
//!   retries and a rate-limit floor between rounds ([`executor`])
//! - **Chunked submission**: split transfer lists into per-transaction chunks,
//!   submit them sequentially with confirmation checks ([`chunk`], [`submit`])
//! - **Audit log**: append-only, flush-on-write run trail ([`audit`])
//!
//! See [`executor::ItemOutcome`] for how per-item retry exhaustion surfaces,
//! and [`submit::send_in_chunks`] for the airdrop pipeline.

pub mod args;
pub mod audit;
pub mod chunk;
pub mod executor;
pub mod input;
pub mod pool;
pub mod rpc;
pub mod submit;
pub mod wallet;
