//! Raw transaction checks.
//!
//! The transaction proof carries the raw signed transaction bytes; the
//! verifier hashes them for identity and decodes the RLP to make sure the
//! claimed JSON transaction describes the same payload.

use serde_json::Value;

use super::{get, hex_bytes, hex_u64, EthError};
use crate::crypto::keccak256;
use crate::rlp::{self, Item};

/// Field positions inside the signed-transaction RLP list, per EIP-2718 type.
/// (nonce, to, value, input)
fn field_layout(tx_type: u64) -> Result<(usize, usize, usize, usize), EthError> {
    match tx_type {
        0 => Ok((0, 3, 4, 5)),
        1 => Ok((1, 4, 5, 6)),
        2 => Ok((1, 5, 6, 7)),
        3 => Ok((1, 5, 6, 7)),
        t => Err(EthError::InvalidTransaction(format!(
            "unsupported transaction type {t}"
        ))),
    }
}

/// Decode the raw transaction and, when a claimed JSON transaction is
/// supplied, cross-check the fields a caller relies on.
pub fn check_transaction(raw: &[u8], claimed: Option<&Value>) -> Result<(), EthError> {
    if raw.is_empty() {
        return Err(EthError::InvalidTransaction("empty transaction".into()));
    }
    let (tx_type, payload) = if raw[0] <= 0x7f {
        (raw[0] as u64, &raw[1..])
    } else {
        (0, raw)
    };

    let (item, rest) = rlp::decode(payload)
        .map_err(|e| EthError::InvalidTransaction(e.to_string()))?;
    if !rest.is_empty() {
        return Err(EthError::InvalidTransaction("trailing bytes".into()));
    }
    let fields: Vec<Item> = item
        .iter()
        .map_err(|e| EthError::InvalidTransaction(e.to_string()))?
        .collect::<Result<_, _>>()
        .map_err(|e| EthError::InvalidTransaction(e.to_string()))?;

    let (nonce_at, to_at, value_at, input_at) = field_layout(tx_type)?;
    if fields.len() <= input_at + 3 {
        return Err(EthError::InvalidTransaction(format!(
            "type {tx_type} transaction with only {} fields",
            fields.len()
        )));
    }

    let Some(claimed) = claimed else {
        return Ok(());
    };

    if let Ok(hash) = get(claimed, "hash") {
        if hex_bytes(hash, "hash")? != keccak256(raw) {
            return Err(EthError::Mismatch { field: "hash" });
        }
    }
    if let Some(v) = claimed.get("type").filter(|v| !v.is_null()) {
        if hex_u64(v, "type")? != tx_type {
            return Err(EthError::Mismatch { field: "type" });
        }
    }
    if let Ok(nonce) = get(claimed, "nonce") {
        let got = fields[nonce_at]
            .as_uint()
            .map_err(|e| EthError::InvalidTransaction(e.to_string()))?;
        if hex_u64(nonce, "nonce")? != got {
            return Err(EthError::Mismatch { field: "nonce" });
        }
    }
    if let Some(to) = claimed.get("to").filter(|v| !v.is_null()) {
        let got = fields[to_at]
            .as_bytes()
            .map_err(|e| EthError::InvalidTransaction(e.to_string()))?;
        if hex_bytes(to, "to")? != got {
            return Err(EthError::Mismatch { field: "to" });
        }
    }
    if let Ok(value) = get(claimed, "value") {
        let got = fields[value_at]
            .as_bytes()
            .map_err(|e| EthError::InvalidTransaction(e.to_string()))?;
        if hex_bytes(value, "value")? != got {
            return Err(EthError::Mismatch { field: "value" });
        }
    }
    if let Ok(input) = get(claimed, "input") {
        let got = fields[input_at]
            .as_bytes()
            .map_err(|e| EthError::InvalidTransaction(e.to_string()))?;
        if hex_bytes(input, "input")? != got {
            return Err(EthError::Mismatch { field: "input" });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Build a legacy signed transaction RLP for testing.
    fn legacy_tx(nonce: u64, to: &[u8; 20], value: u64, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        rlp::add_uint(&mut out, nonce);
        rlp::add_uint(&mut out, 20_000_000_000); // gasPrice
        rlp::add_uint(&mut out, 21_000); // gas
        rlp::add_item(&mut out, to);
        rlp::add_uint(&mut out, value);
        rlp::add_item(&mut out, input);
        rlp::add_uint(&mut out, 27); // v
        rlp::add_item(&mut out, &[0x11; 32]); // r
        rlp::add_item(&mut out, &[0x22; 32]); // s
        rlp::to_list(&mut out);
        out
    }

    fn eip1559_tx(nonce: u64, to: &[u8; 20], value: u64, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        rlp::add_uint(&mut out, 1); // chainId
        rlp::add_uint(&mut out, nonce);
        rlp::add_uint(&mut out, 1_000_000_000); // maxPriorityFeePerGas
        rlp::add_uint(&mut out, 30_000_000_000); // maxFeePerGas
        rlp::add_uint(&mut out, 21_000); // gas
        rlp::add_item(&mut out, to);
        rlp::add_uint(&mut out, value);
        rlp::add_item(&mut out, input);
        rlp::add_list(&mut out, &[]); // accessList
        rlp::add_uint(&mut out, 0); // yParity
        rlp::add_item(&mut out, &[0x11; 32]);
        rlp::add_item(&mut out, &[0x22; 32]);
        rlp::to_list(&mut out);
        let mut raw = vec![2u8];
        raw.extend_from_slice(&out);
        raw
    }

    fn claimed_for(raw: &[u8], nonce: u64, to: &[u8; 20], value: u64, tx_type: u64) -> Value {
        json!({
            "hash": format!("0x{}", hex::encode(keccak256(raw))),
            "nonce": format!("0x{nonce:x}"),
            "to": format!("0x{}", hex::encode(to)),
            "value": format!("0x{value:x}"),
            "input": "0x",
            "type": format!("0x{tx_type:x}"),
        })
    }

    #[test]
    fn test_legacy_transaction_matches_claim() {
        let to = [0xaa; 20];
        let raw = legacy_tx(7, &to, 1_000_000, &[]);
        let claimed = claimed_for(&raw, 7, &to, 1_000_000, 0);
        check_transaction(&raw, Some(&claimed)).unwrap();
    }

    #[test]
    fn test_eip1559_transaction_matches_claim() {
        let to = [0xbb; 20];
        let raw = eip1559_tx(3, &to, 42, &[]);
        let claimed = claimed_for(&raw, 3, &to, 42, 2);
        check_transaction(&raw, Some(&claimed)).unwrap();
    }

    #[test]
    fn test_wrong_nonce_rejected() {
        let to = [0xaa; 20];
        let raw = legacy_tx(7, &to, 1, &[]);
        let mut claimed = claimed_for(&raw, 7, &to, 1, 0);
        claimed["nonce"] = json!("0x8");
        assert!(matches!(
            check_transaction(&raw, Some(&claimed)),
            Err(EthError::Mismatch { field: "nonce" })
        ));
    }

    #[test]
    fn test_wrong_hash_rejected() {
        let to = [0xaa; 20];
        let raw = legacy_tx(7, &to, 1, &[]);
        let mut claimed = claimed_for(&raw, 7, &to, 1, 0);
        claimed["hash"] = json!(format!("0x{}", "00".repeat(32)));
        assert!(matches!(
            check_transaction(&raw, Some(&claimed)),
            Err(EthError::Mismatch { field: "hash" })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(check_transaction(&[0xc1], None).is_err());
        assert!(check_transaction(&[], None).is_err());
    }
}
