//! Input/output file helpers for the CLI commands.
//!
//! The transfer CSV is two bare columns, `recipient,amount`, with amounts in
//! base units. This is not a general CSV parser; it matches the files the
//! holder-aggregation tooling emits and will break on embedded commas.

use crate::submit::TransferInstruction;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Normalize an address to the canonical 66-character `0x`-prefixed form.
pub fn normalize_sui_address(addr: &str) -> Result<String> {
    let s = addr.trim();
    let hex_str = s.strip_prefix("0x").unwrap_or(s);

    if hex_str.is_empty() {
        return Err(anyhow!("empty address"));
    }
    if !hex_str.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!("invalid hex address: {}", addr));
    }
    if hex_str.len() > 64 {
        return Err(anyhow!("address too long: {}", addr));
    }

    Ok(format!("0x{:0>64}", hex_str.to_ascii_lowercase()))
}

/// Read `recipient,amount` pairs from a CSV file.
///
/// Lines with an invalid address are skipped (the upstream holder lists
/// contain burn markers and malformed rows); a malformed amount is an error
/// because silently dropping it would change the airdrop total.
pub fn read_transfers_csv(path: &Path) -> Result<Vec<TransferInstruction>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;

    let mut transfers = Vec::new();
    for (line_number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut columns = trimmed.split(',').map(|v| v.trim().trim_matches('"'));
        let address_str = columns.next().unwrap_or_default();
        let amount_str = columns
            .next()
            .ok_or_else(|| anyhow!("line {}: missing amount column", line_number + 1))?;

        let recipient = match normalize_sui_address(address_str) {
            Ok(addr) => addr,
            Err(_) => {
                tracing::debug!(line = line_number + 1, value = address_str, "skipping line with invalid address");
                continue;
            }
        };
        let amount = amount_str
            .parse::<u64>()
            .with_context(|| format!("line {}: invalid amount '{}'", line_number + 1, amount_str))?;

        transfers.push(TransferInstruction { recipient, amount });
    }
    Ok(transfers)
}

/// Read a list of addresses from a JSON file: either `["0x..", ...]` or
/// `[{"address": "0x..", ...}, ...]` (the holder-finder output shape).
pub fn read_addresses_json(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;

    let entries = value
        .as_array()
        .ok_or_else(|| anyhow!("{} is not a JSON array", path.display()))?;

    let mut addresses = Vec::with_capacity(entries.len());
    for entry in entries {
        let addr = match entry {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map
                .get("address")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("entry missing address field in {}", path.display()))?,
            _ => return Err(anyhow!("unexpected entry type in {}", path.display())),
        };
        addresses.push(normalize_sui_address(addr)?);
    }
    Ok(addresses)
}

/// Write a value as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("serialize JSON")?;
    fs::write(path, content + "\n").with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_sui_address() {
        let full = "0x0000000000000000000000000000000000000000000000000000000000000002";
        assert_eq!(normalize_sui_address("0x2").unwrap(), full);
        assert_eq!(normalize_sui_address("2").unwrap(), full);
        assert_eq!(normalize_sui_address(full).unwrap(), full);

        assert!(normalize_sui_address("").is_err());
        assert!(normalize_sui_address("0x").is_err());
        assert!(normalize_sui_address("0xzz").is_err());
        assert!(normalize_sui_address(&format!("0x{}", "a".repeat(65))).is_err());
    }

    #[test]
    fn test_read_transfers_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(
            &path,
            "0x326c,25\n\nnot-an-address,99\n\"0x445e\",33\n",
        )
        .unwrap();

        let transfers = read_transfers_csv(&path).unwrap();
        assert_eq!(transfers.len(), 2);
        assert!(transfers[0].recipient.ends_with("326c"));
        assert_eq!(transfers[0].amount, 25);
        assert_eq!(transfers[1].amount, 33);
    }

    #[test]
    fn test_read_transfers_csv_bad_amount_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "0x326c,twenty\n").unwrap();
        assert!(read_transfers_csv(&path).is_err());
    }

    #[test]
    fn test_read_addresses_json_both_shapes() {
        let dir = TempDir::new().unwrap();

        let plain = dir.path().join("plain.json");
        std::fs::write(&plain, r#"["0x1", "0x2"]"#).unwrap();
        assert_eq!(read_addresses_json(&plain).unwrap().len(), 2);

        let objects = dir.path().join("objects.json");
        std::fs::write(
            &objects,
            r#"[{"address": "0x1", "balance": "5"}, {"address": "0x2", "balance": "0"}]"#,
        )
        .unwrap();
        let addrs = read_addresses_json(&objects).unwrap();
        assert_eq!(addrs.len(), 2);
        assert!(addrs[0].ends_with("01"));
    }
}
