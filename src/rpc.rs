//! Minimal Sui JSON-RPC client for the read-only bulk commands.
//!
//! Only the handful of methods the CLI needs. Calls are blocking (`ureq`);
//! async call sites wrap them in `tokio::task::spawn_blocking`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Public mainnet fullnodes that tolerate bulk traffic when rotated.
pub const MAINNET_ENDPOINTS: &[&str] = &[
    "https://mainnet.suiet.app",
    "https://rpc-mainnet.suiscan.xyz",
    "https://sui-mainnet-endpoint.blockvision.org",
    "https://sui-mainnet.public.blastapi.io",
    "https://sui-mainnet-ca-2.cosmostation.io",
    "https://sui-mainnet-eu-3.cosmostation.io",
    "https://sui-mainnet-eu-4.cosmostation.io",
    "https://sui-mainnet-us-1.cosmostation.io",
    "https://sui-mainnet-us-2.cosmostation.io",
    "https://fullnode.mainnet.sui.io",
    "https://sui.publicnode.com",
];

/// A coin balance owned by one address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinBalance {
    pub coin_type: String,
    pub coin_object_count: u64,
    pub total_balance: u128,
}

/// The most recent transaction sent by an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTransaction {
    pub digest: String,
    pub timestamp_ms: Option<u64>,
}

/// Blocking JSON-RPC client bound to one fullnode endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl JsonRpcClient {
    pub fn new(endpoint: &str) -> Self {
        Self::with_timeouts(endpoint, Duration::from_secs(30), Duration::from_secs(10))
    }

    pub fn with_timeouts(endpoint: &str, timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .timeout_connect(connect_timeout)
                .build(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| anyhow!("RPC request to {} failed: {}", self.endpoint, e))?
            .into_json()
            .map_err(|e| anyhow!("failed to parse RPC response from {}: {}", self.endpoint, e))?;

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(anyhow!("RPC error from {}: {}", self.endpoint, message));
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| anyhow!("no result in RPC response from {}", self.endpoint))
    }

    /// `suix_getBalance`: total balance of `Coin<coin_type>` owned by `owner`.
    pub fn get_balance(&self, owner: &str, coin_type: &str) -> Result<CoinBalance> {
        let result = self.call("suix_getBalance", json!([owner, coin_type]))?;
        parse_coin_balance(&result)
    }

    /// Latest transaction sent by `address`, if any
    /// (`suix_queryTransactionBlocks` with limit 1, descending).
    pub fn last_transaction(&self, address: &str) -> Result<Option<LastTransaction>> {
        let params = json!([
            { "filter": { "FromAddress": address } },
            null,
            1,
            true,
        ]);
        let result = self.call("suix_queryTransactionBlocks", params)?;
        let data = result
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("response missing data array"))?;
        match data.first() {
            Some(entry) => Ok(Some(parse_last_transaction(entry)?)),
            None => Ok(None),
        }
    }
}

fn parse_coin_balance(value: &Value) -> Result<CoinBalance> {
    let coin_type = value
        .get("coinType")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("balance response missing coinType"))?
        .to_string();
    let coin_object_count = value
        .get("coinObjectCount")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("balance response missing coinObjectCount"))?;
    let total_balance = value
        .get("totalBalance")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("balance response missing totalBalance"))?
        .parse::<u128>()
        .context("totalBalance is not an integer")?;

    Ok(CoinBalance {
        coin_type,
        coin_object_count,
        total_balance,
    })
}

fn parse_last_transaction(entry: &Value) -> Result<LastTransaction> {
    let digest = entry
        .get("digest")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("transaction entry missing digest"))?
        .to_string();
    // timestampMs arrives as a decimal string on current nodes and as a
    // number on some older ones; absent on very old entries.
    let timestamp_ms = entry.get("timestampMs").and_then(|v| match v {
        Value::String(s) => s.parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    });

    Ok(LastTransaction {
        digest,
        timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coin_balance() {
        let value = json!({
            "coinType": "0x2::sui::SUI",
            "coinObjectCount": 7,
            "totalBalance": "123456789",
            "lockedBalance": {},
        });
        let balance = parse_coin_balance(&value).unwrap();
        assert_eq!(balance.coin_type, "0x2::sui::SUI");
        assert_eq!(balance.coin_object_count, 7);
        assert_eq!(balance.total_balance, 123456789);
    }

    #[test]
    fn test_parse_coin_balance_missing_field() {
        let value = json!({ "coinType": "0x2::sui::SUI" });
        assert!(parse_coin_balance(&value).is_err());
    }

    #[test]
    fn test_parse_last_transaction() {
        let entry = json!({
            "digest": "8kKkmLuS2FvGknBJbu8CyUMrABAQhGb2mbBt3RrsDGMF",
            "timestampMs": "1701855725963",
        });
        let tx = parse_last_transaction(&entry).unwrap();
        assert_eq!(tx.digest, "8kKkmLuS2FvGknBJbu8CyUMrABAQhGb2mbBt3RrsDGMF");
        assert_eq!(tx.timestamp_ms, Some(1701855725963));
    }

    #[test]
    fn test_parse_last_transaction_numeric_timestamp() {
        let entry = json!({
            "digest": "abc",
            "timestampMs": 1701855725963u64,
        });
        let tx = parse_last_transaction(&entry).unwrap();
        assert_eq!(tx.timestamp_ms, Some(1701855725963));
    }

    #[test]
    fn test_parse_last_transaction_without_timestamp() {
        let entry = json!({ "digest": "abc" });
        let tx = parse_last_transaction(&entry).unwrap();
        assert_eq!(tx.timestamp_ms, None);
    }
}
