//! `eth_getTransactionReceipt` → ReceiptProof.
//!
//! The receipts trie is rebuilt locally from `eth_getBlockReceipts`: the
//! Patricia proof for the requested index is extracted from the rebuilt
//! trie, never taken from the RPC.

use serde_json::json;

use lantern_core::eth::{get, hex_array, hex_u64, serialize_receipt};
use lantern_core::rlp;
use lantern_core::ssz::{create_multi_proof, encode_dynamic_list, Builder};
use lantern_core::trie::Trie;
use lantern_core::types::{DataVariant, ProofVariant, RECEIPT_PROOF};
use lantern_core::verify::{GINDEX_BLOCK_HASH, GINDEX_BLOCK_NUMBER, GINDEX_RECEIPTS_ROOT};

use super::{assemble_request, header_builder};
use crate::beacon::{self, body_ob};
use crate::proofer::{ProofError, ProoferCtx, Step};
use crate::rpc::send_eth_rpc;

/// Rebuild the receipts trie of a block from its receipt list.
pub(crate) fn rebuild_receipts_trie(receipts: &[serde_json::Value]) -> Result<Trie, ProofError> {
    let mut trie = Trie::new();
    for (index, receipt) in receipts.iter().enumerate() {
        let mut key = Vec::new();
        rlp::add_uint(&mut key, index as u64);
        trie.insert(&key, &serialize_receipt(receipt).map_err(ProofError::from)?);
    }
    Ok(trie)
}

pub(crate) fn prove(ctx: &mut ProoferCtx) -> Step<Vec<u8>> {
    let txhash = ctx
        .params
        .get(0)
        .cloned()
        .ok_or_else(|| ProofError::InvalidInput("missing transaction hash".into()))?;

    let receipt = send_eth_rpc(ctx, "eth_getTransactionReceipt", &json!([txhash]))?;
    let block_number_json = get(&receipt, "blockNumber").map_err(ProofError::from)?.clone();
    let tx_index = hex_u64(
        get(&receipt, "transactionIndex").map_err(ProofError::from)?,
        "transactionIndex",
    )
    .map_err(ProofError::from)? as u32;

    let receipts = send_eth_rpc(ctx, "eth_getBlockReceipts", &json!([block_number_json.clone()]))?;
    let block = send_eth_rpc(
        ctx,
        "eth_getBlockByNumber",
        &json!([block_number_json.clone(), false]),
    )?;
    let beacon = beacon::block_for_execution_block(ctx, &block)?;

    let receipt_list = receipts
        .as_array()
        .ok_or_else(|| ProofError::Rpc("eth_getBlockReceipts returned no array".into()))?;
    let trie = rebuild_receipts_trie(receipt_list)?;

    // the rebuilt trie must agree with the block the proof anchors to
    let payload_root: [u8; 32] = body_ob(&beacon)
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

    let mut key = Vec::new();
    rlp::add_uint(&mut key, tx_index as u64);
    let receipt_nodes = trie.proof(&key);

    let chunks = create_multi_proof(
        body_ob(&beacon),
        &[GINDEX_RECEIPTS_ROOT, GINDEX_BLOCK_NUMBER, GINDEX_BLOCK_HASH],
    )?;

    let block_number = hex_u64(&block_number_json, "blockNumber").map_err(ProofError::from)?;
    let block_hash = hex_array::<32>(
        get(&receipt, "blockHash").map_err(ProofError::from)?,
        "blockHash",
    )
    .map_err(ProofError::from)?;

    let mut proof = Builder::new(&RECEIPT_PROOF);
    proof.add_u32("transactionIndex", tx_index);
    proof.add_u64("blockNumber", block_number);
    proof.add_bytes("blockHash", &block_hash);
    proof.add_bytes("receiptProof", &encode_dynamic_list(&receipt_nodes));
    proof.add_bytes("proof", &chunks);
    proof.add_builder("header", header_builder(&beacon));
    proof.add_bytes("syncCommitteeBits", &beacon.sync_bits);
    proof.add_bytes("syncCommitteeSignature", &beacon.sync_signature);

    let canonical = serialize_receipt(&receipt).map_err(ProofError::from)?;

    Ok(assemble_request(
        DataVariant::Receipt as u8,
        &canonical,
        ProofVariant::Receipt as u8,
        &proof.into_bytes(),
    ))
}
