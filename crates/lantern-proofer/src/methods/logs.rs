//! `eth_getLogs` → LogsProof.
//!
//! One receipt proof per touched transaction, grouped per block, each block
//! anchored by its own beacon header. Block-level lookups are issued for
//! every covered block before the first `Pending` yield, so the host can
//! serve them in parallel.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use lantern_core::eth::{get, hex_array, hex_u64};
use lantern_core::rlp;
use lantern_core::ssz::{create_multi_proof, encode_dynamic_list, Builder};
use lantern_core::types::{DataVariant, ProofVariant, LOGS_BLOCK_PROOF, LOGS_RECEIPT};
use lantern_core::verify::{GINDEX_BLOCK_HASH, GINDEX_BLOCK_NUMBER, GINDEX_RECEIPTS_ROOT};

use super::{assemble_request, header_builder};
use crate::beacon::{self, body_ob, BeaconBlock};
use crate::proofer::{Interrupt, ProofError, ProoferCtx, Step};
use crate::rpc::send_eth_rpc;

struct BlockData {
    block_hash: [u8; 32],
    receipts: Vec<Value>,
    beacon: BeaconBlock,
}

pub(crate) fn prove(ctx: &mut ProoferCtx) -> Step<Vec<u8>> {
    let filter = ctx
        .params
        .get(0)
        .cloned()
        .ok_or_else(|| ProofError::InvalidInput("missing log filter".into()))?;

    let logs = send_eth_rpc(ctx, "eth_getLogs", &json!([filter]))?;
    let log_list = logs
        .as_array()
        .ok_or_else(|| ProofError::Rpc("eth_getLogs returned no array".into()))?;

    // group the touched transaction indices by block
    let mut touched: BTreeMap<u64, BTreeSet<u32>> = BTreeMap::new();
    for log in log_list {
        let block_number = hex_u64(
            get(log, "blockNumber").map_err(ProofError::from)?,
            "blockNumber",
        )
        .map_err(ProofError::from)?;
        let tx_index = hex_u64(
            get(log, "transactionIndex").map_err(ProofError::from)?,
            "transactionIndex",
        )
        .map_err(ProofError::from)? as u32;
        touched.entry(block_number).or_default().insert(tx_index);
    }

    // fetch per-block data, issuing every lookup before yielding
    let mut pending = false;
    let mut blocks: BTreeMap<u64, BlockData> = BTreeMap::new();
    for &block_number in touched.keys() {
        let tag = json!(format!("0x{block_number:x}"));
        let fetched = (|| -> Step<BlockData> {
            let receipts = send_eth_rpc(ctx, "eth_getBlockReceipts", &json!([tag.clone()]))?;
            let block = send_eth_rpc(ctx, "eth_getBlockByNumber", &json!([tag.clone(), false]))?;
            let beacon = beacon::block_for_execution_block(ctx, &block)?;
            let block_hash =
                hex_array::<32>(get(&block, "hash").map_err(ProofError::from)?, "hash")
                    .map_err(ProofError::from)?;
            let receipts = receipts
                .as_array()
                .cloned()
                .ok_or_else(|| ProofError::Rpc("eth_getBlockReceipts returned no array".into()))?;
            Ok(BlockData {
                block_hash,
                receipts,
                beacon,
            })
        })();
        match fetched {
            Ok(data) => {
                blocks.insert(block_number, data);
            }
            Err(Interrupt::Pending) => pending = true,
            Err(e) => return Err(e),
        }
    }
    if pending {
        return Err(Interrupt::Pending);
    }

    let mut block_proofs = Vec::with_capacity(blocks.len());
    for (&block_number, data) in &blocks {
        let trie = super::receipt::rebuild_receipts_trie(&data.receipts)?;
        let payload_root: [u8; 32] = body_ob(&data.beacon)
            .get("executionPayload")
            .and_then(|p| p.get("receiptsRoot"))
            .map_err(ProofError::from)?
            .as_array()
            .map_err(ProofError::from)?;
        if trie.root_hash() != payload_root {
            return Err(ProofError::Beacon(
                "reconstructed receipts trie does not match the block's receipts root".into(),
            )
            .into());
        }

        let mut receipt_entries = Vec::new();
        for &tx_index in &touched[&block_number] {
            let receipt = data
                .receipts
                .iter()
                .find(|r| {
                    r.get("transactionIndex")
                        .and_then(|v| hex_u64(v, "transactionIndex").ok())
                        == Some(tx_index as u64)
                })
                .ok_or_else(|| {
                    ProofError::Rpc(format!(
                        "no receipt for transaction {tx_index} in block {block_number}"
                    ))
                })?;
            let tx_hash = hex_array::<32>(
                get(receipt, "transactionHash").map_err(ProofError::from)?,
                "transactionHash",
            )
            .map_err(ProofError::from)?;

            let mut key = Vec::new();
            rlp::add_uint(&mut key, tx_index as u64);
            let nodes = trie.proof(&key);

            let mut entry = Builder::new(&LOGS_RECEIPT);
            entry.add_u32("txIndex", tx_index);
            entry.add_bytes("txHash", &tx_hash);
            entry.add_bytes("proof", &encode_dynamic_list(&nodes));
            receipt_entries.push(entry.into_bytes());
        }

        let chunks = create_multi_proof(
            body_ob(&data.beacon),
            &[GINDEX_RECEIPTS_ROOT, GINDEX_BLOCK_NUMBER, GINDEX_BLOCK_HASH],
        )?;

        let mut block_proof = Builder::new(&LOGS_BLOCK_PROOF);
        block_proof.add_u64("blockNumber", block_number);
        block_proof.add_bytes("blockHash", &data.block_hash);
        block_proof.add_bytes("proof", &chunks);
        block_proof.add_builder("header", header_builder(&data.beacon));
        block_proof.add_bytes("syncCommitteeBits", &data.beacon.sync_bits);
        block_proof.add_bytes("syncCommitteeSignature", &data.beacon.sync_signature);
        block_proof.add_bytes("receipts", &encode_dynamic_list(&receipt_entries));
        block_proofs.push(block_proof.into_bytes());
    }

    Ok(assemble_request(
        DataVariant::None as u8,
        &[],
        ProofVariant::Logs as u8,
        &encode_dynamic_list(&block_proofs),
    ))
}
