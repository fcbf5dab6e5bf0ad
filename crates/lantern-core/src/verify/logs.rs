//! Logs proofs: a list of per-block receipt proofs. Every claimed log entry
//! must live inside a receipt proven under its block's receipts root, and
//! every block proof is anchored in its own signed body root.

use std::collections::BTreeMap;

use super::{
    signature, trie_nodes, u64_leaf, Ctx, VerifyError, GINDEX_BLOCK_HASH, GINDEX_BLOCK_NUMBER,
    GINDEX_RECEIPTS_ROOT,
};
use crate::crypto::keccak256;
use crate::eth::{get, hex_array, hex_bytes, hex_u64};
use crate::rlp::{self, Item};
use crate::ssz::{verify_multi_proof, Ob};
use crate::trie;
use serde_json::Value;

struct BlockEntry<'a> {
    block_hash: [u8; 32],
    receipts_root: [u8; 32],
    receipts: Ob<'a>,
}

pub(crate) fn verify<'a>(ctx: &mut Ctx<'a>, proof: Ob<'a>) -> Result<(), VerifyError> {
    let Some(claimed) = ctx.claimed else {
        return Err(VerifyError::Input(
            "logs proof requires the claimed log list".into(),
        ));
    };
    let logs = claimed
        .as_array()
        .ok_or_else(|| VerifyError::Input("claimed logs must be an array".into()))?;

    // verify each block proof and index it by block number
    let mut blocks: BTreeMap<u64, BlockEntry<'a>> = BTreeMap::new();
    for i in 0..proof.len() {
        let block = proof.at(i)?;
        let block_number = block.get("blockNumber")?.as_u64()?;
        let block_hash: [u8; 32] = block.get("blockHash")?.as_array()?;
        let header = block.get("header")?;
        let body_root: [u8; 32] = header.get("bodyRoot")?.as_array()?;

        let receipts = block.get("receipts")?;
        if receipts.is_empty() {
            return Err(VerifyError::Proof(
                "logs block proof carries no receipts".into(),
            ));
        }
        // all receipt proofs of a block share one root: the first node of
        // the first proof defines it, the rest must agree
        let first_nodes = trie_nodes(&receipts.at(0)?.get("proof")?)?;
        if first_nodes.is_empty() {
            return Err(VerifyError::Proof("empty receipt proof".into()));
        }
        let receipts_root = keccak256(&first_nodes[0]);

        let leaves = [receipts_root, u64_leaf(block_number), block_hash];
        let gindexes = [GINDEX_RECEIPTS_ROOT, GINDEX_BLOCK_NUMBER, GINDEX_BLOCK_HASH];
        let root = verify_multi_proof(block.get("proof")?.as_bytes(), &leaves, &gindexes)?;
        if root != body_root {
            return Err(VerifyError::Proof(
                "receipts root is not part of the block body".into(),
            ));
        }

        signature::verify_blockroot_signature(
            ctx,
            &header,
            &block.get("syncCommitteeBits")?,
            &block.get("syncCommitteeSignature")?,
        )?;

        blocks.insert(
            block_number,
            BlockEntry {
                block_hash,
                receipts_root,
                receipts,
            },
        );
    }

    for log in logs {
        let block_number = hex_u64(get(log, "blockNumber")?, "blockNumber")?;
        let entry = blocks.get(&block_number).ok_or_else(|| {
            VerifyError::Proof(format!("no proof supplied for block {block_number}"))
        })?;
        if let Some(v) = log.get("blockHash") {
            if hex_array::<32>(v, "blockHash")? != entry.block_hash {
                return Err(VerifyError::Proof("claimed blockHash mismatch".into()));
            }
        }
        let tx_index = hex_u64(get(log, "transactionIndex")?, "transactionIndex")? as u32;

        // locate the receipt proof for this transaction
        let mut receipt_proof = None;
        for i in 0..entry.receipts.len() {
            let r = entry.receipts.at(i)?;
            if r.get("txIndex")?.as_u32()? == tx_index {
                receipt_proof = Some(r);
                break;
            }
        }
        let receipt_proof = receipt_proof.ok_or_else(|| {
            VerifyError::Proof(format!(
                "no receipt proof for transaction {tx_index} in block {block_number}"
            ))
        })?;

        if let Some(v) = log.get("transactionHash") {
            if hex_array::<32>(v, "transactionHash")?
                != receipt_proof.get("txHash")?.as_array::<32>()?
            {
                return Err(VerifyError::Proof(
                    "claimed transactionHash mismatch".into(),
                ));
            }
        }

        let nodes = trie_nodes(&receipt_proof.get("proof")?)?;
        if nodes.is_empty() || keccak256(&nodes[0]) != entry.receipts_root {
            return Err(VerifyError::Proof(
                "receipt proofs disagree on the receipts root".into(),
            ));
        }
        let mut key = Vec::new();
        rlp::add_uint(&mut key, tx_index as u64);
        let Some(receipt_rlp) = trie::verify(&entry.receipts_root, &key, &nodes)? else {
            return Err(VerifyError::Proof(
                "receipt is not present under the receipts root".into(),
            ));
        };

        if !receipt_contains_log(&receipt_rlp, log)? {
            return Err(VerifyError::Proof(
                "claimed log is not part of the proven receipt".into(),
            ));
        }
    }

    Ok(())
}

/// Whether the canonical receipt RLP contains a log with the claimed
/// address, topics and data.
fn receipt_contains_log(receipt_rlp: &[u8], log: &Value) -> Result<bool, VerifyError> {
    let address = hex_bytes(get(log, "address")?, "address")?;
    let data = hex_bytes(get(log, "data")?, "data")?;
    let topics: Vec<Vec<u8>> = match log.get("topics").and_then(|t| t.as_array()) {
        Some(list) => list
            .iter()
            .map(|t| hex_bytes(t, "topic"))
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    };

    let payload = if !receipt_rlp.is_empty() && receipt_rlp[0] <= 0x7f {
        &receipt_rlp[1..]
    } else {
        receipt_rlp
    };
    let bad = |e: rlp::RlpError| VerifyError::Proof(format!("receipt RLP: {e}"));
    let (item, _) = rlp::decode(payload).map_err(bad)?;
    let fields: Vec<Item> = item.iter().map_err(bad)?.collect::<Result<_, _>>().map_err(bad)?;
    if fields.len() != 4 {
        return Err(VerifyError::Proof(format!(
            "receipt RLP with {} fields",
            fields.len()
        )));
    }

    for log_item in fields[3].iter().map_err(bad)? {
        let log_item = log_item.map_err(bad)?;
        let entries: Vec<Item> = log_item.iter().map_err(bad)?.collect::<Result<_, _>>().map_err(bad)?;
        if entries.len() != 3 {
            continue;
        }
        if entries[0].as_bytes().map_err(bad)? != address.as_slice()
            || entries[2].as_bytes().map_err(bad)? != data.as_slice()
        {
            continue;
        }
        let got_topics: Vec<&[u8]> = entries[1]
            .iter()
            .map_err(bad)?
            .map(|t| t.and_then(|t| t.as_bytes()))
            .collect::<Result<_, _>>()
            .map_err(bad)?;
        if got_topics.len() == topics.len()
            && got_topics.iter().zip(topics.iter()).all(|(a, b)| *a == b.as_slice())
        {
            return Ok(true);
        }
    }
    Ok(false)
}
