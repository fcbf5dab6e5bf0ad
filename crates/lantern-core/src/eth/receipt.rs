//! Canonical receipt serialization.
//!
//! Both sides of the system need the exact trie representation of a receipt:
//! the proofer rebuilds the receipts trie from `eth_getBlockReceipts`, the
//! verifier recomputes the value it expects to find under the receipts root.
//! The canonical form is `[statusOrStateRoot, cumulativeGasUsed, logsBloom,
//! [[address, [topics…], data], …]]`, wrapped in a one-byte typed envelope
//! when the transaction type is non-zero.

use serde_json::Value;

use super::{get, hex_bytes, hex_u64, EthError};
use crate::rlp;

/// Serialize one receipt JSON object (the `eth_getBlockReceipts` /
/// `eth_getTransactionReceipt` shape) into its canonical RLP.
pub fn serialize_receipt(receipt: &Value) -> Result<Vec<u8>, EthError> {
    let tx_type = match receipt.get("type") {
        Some(v) if !v.is_null() => hex_u64(v, "type")?,
        _ => 0,
    };

    let mut out = Vec::new();

    // pre-Byzantium receipts carry the intermediate state root instead of a
    // status flag
    let state_root = receipt
        .get("root")
        .filter(|v| !v.is_null())
        .map(|v| hex_bytes(v, "root"))
        .transpose()?;
    match state_root {
        Some(root) if root.len() == 32 => rlp::add_item(&mut out, &root),
        _ => rlp::add_uint(&mut out, hex_u64(get(receipt, "status")?, "status")?),
    }

    rlp::add_uint(
        &mut out,
        hex_u64(get(receipt, "cumulativeGasUsed")?, "cumulativeGasUsed")?,
    );
    rlp::add_item(&mut out, &hex_bytes(get(receipt, "logsBloom")?, "logsBloom")?);

    let mut logs_buf = Vec::new();
    if let Some(logs) = receipt.get("logs").and_then(|l| l.as_array()) {
        for log in logs {
            let mut log_buf = Vec::new();
            rlp::add_item(&mut log_buf, &hex_bytes(get(log, "address")?, "address")?);

            let mut topics_buf = Vec::new();
            if let Some(topics) = log.get("topics").and_then(|t| t.as_array()) {
                for topic in topics {
                    rlp::add_item(&mut topics_buf, &hex_bytes(topic, "topic")?);
                }
            }
            rlp::add_list(&mut log_buf, &topics_buf);
            rlp::add_item(&mut log_buf, &hex_bytes(get(log, "data")?, "data")?);
            rlp::add_list(&mut logs_buf, &log_buf);
        }
    }
    rlp::add_list(&mut out, &logs_buf);

    rlp::to_list(&mut out);
    if tx_type > 0 {
        out.insert(0, tx_type as u8);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_receipt() -> Value {
        json!({
            "type": "0x2",
            "status": "0x1",
            "cumulativeGasUsed": "0x5208",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": [{
                "address": format!("0x{}", "aa".repeat(20)),
                "topics": [format!("0x{}", "bb".repeat(32))],
                "data": "0x0102"
            }]
        })
    }

    #[test]
    fn test_typed_envelope() {
        let rlp_bytes = serialize_receipt(&sample_receipt()).unwrap();
        assert_eq!(rlp_bytes[0], 2);

        // everything after the envelope byte is one RLP list
        let (item, rest) = rlp::decode(&rlp_bytes[1..]).unwrap();
        assert!(rest.is_empty());
        let mut fields = item.iter().unwrap();
        assert_eq!(fields.next().unwrap().unwrap().as_uint().unwrap(), 1); // status
        assert_eq!(fields.next().unwrap().unwrap().as_uint().unwrap(), 0x5208);
        assert_eq!(fields.next().unwrap().unwrap().as_bytes().unwrap().len(), 256);
        let logs = fields.next().unwrap().unwrap();
        let mut logs = logs.iter().unwrap();
        let log = logs.next().unwrap().unwrap();
        let mut log_fields = log.iter().unwrap();
        assert_eq!(log_fields.next().unwrap().unwrap().as_bytes().unwrap(), &[0xaa; 20]);
        assert!(logs.next().is_none());
        assert!(fields.next().is_none());
    }

    #[test]
    fn test_legacy_receipt_has_no_envelope() {
        let mut receipt = sample_receipt();
        receipt["type"] = json!("0x0");
        let rlp_bytes = serialize_receipt(&receipt).unwrap();
        // a legacy receipt starts directly with the RLP list prefix
        assert!(rlp_bytes[0] >= 0xc0);
    }

    #[test]
    fn test_bloom_flip_changes_encoding() {
        let a = serialize_receipt(&sample_receipt()).unwrap();
        let mut receipt = sample_receipt();
        let mut bloom = "00".repeat(256);
        bloom.replace_range(0..2, "01");
        receipt["logsBloom"] = json!(format!("0x{bloom}"));
        let b = serialize_receipt(&receipt).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pre_byzantium_root() {
        let receipt = json!({
            "root": format!("0x{}", "cd".repeat(32)),
            "cumulativeGasUsed": "0x1",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": []
        });
        let rlp_bytes = serialize_receipt(&receipt).unwrap();
        let (item, _) = rlp::decode(&rlp_bytes).unwrap();
        let mut fields = item.iter().unwrap();
        assert_eq!(fields.next().unwrap().unwrap().as_bytes().unwrap(), &[0xcd; 32]);
    }
}
