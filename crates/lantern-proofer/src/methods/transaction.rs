//! `eth_getTransactionByHash` → TransactionProof.

use serde_json::json;

use lantern_core::crypto::keccak256;
use lantern_core::eth::{get, hex_array, hex_bytes, hex_u64};
use lantern_core::ssz::{create_multi_proof, gindex, Builder, PathItem};
use lantern_core::types::{DataVariant, ProofVariant, BEACON_BLOCK_BODY, TRANSACTION_PROOF};
use lantern_core::verify::{GINDEX_BLOCK_HASH, GINDEX_BLOCK_NUMBER};

use super::{assemble_request, header_builder};
use crate::beacon::{self, body_ob};
use crate::proofer::{ProofError, ProoferCtx, Step};
use crate::rpc::send_eth_rpc;

pub(crate) fn prove(ctx: &mut ProoferCtx) -> Step<Vec<u8>> {
    let txhash = ctx
        .params
        .get(0)
        .cloned()
        .ok_or_else(|| ProofError::InvalidInput("missing transaction hash".into()))?;
    match txhash.as_str() {
        Some(s) if s.len() == 66 && s.starts_with("0x") => {}
        _ => return Err(ProofError::InvalidInput("invalid transaction hash".into()).into()),
    }

    let tx = send_eth_rpc(ctx, "eth_getTransactionByHash", &json!([txhash.clone()]))?;
    let raw_json = send_eth_rpc(ctx, "eth_getRawTransactionByHash", &json!([txhash]))?;
    let raw = hex_bytes(&raw_json, "rawTransaction").map_err(ProofError::from)?;

    let tx_index = hex_u64(
        get(&tx, "transactionIndex").map_err(ProofError::from)?,
        "transactionIndex",
    )
    .map_err(ProofError::from)? as u32;
    let block_number_json = get(&tx, "blockNumber").map_err(ProofError::from)?.clone();
    let block_hash = hex_array::<32>(
        get(&tx, "blockHash").map_err(ProofError::from)?,
        "blockHash",
    )
    .map_err(ProofError::from)?;

    let block = send_eth_rpc(
        ctx,
        "eth_getBlockByNumber",
        &json!([block_number_json, false]),
    )?;
    let beacon = beacon::block_for_execution_block(ctx, &block)?;

    let tx_gindex = gindex(
        &BEACON_BLOCK_BODY,
        &[
            PathItem::Field("executionPayload"),
            PathItem::Field("transactions"),
            PathItem::Index(tx_index as usize),
        ],
    )?;
    let chunks = create_multi_proof(
        body_ob(&beacon),
        &[GINDEX_BLOCK_NUMBER, GINDEX_BLOCK_HASH, tx_gindex],
    )?;

    let block_number = hex_u64(
        get(&tx, "blockNumber").map_err(ProofError::from)?,
        "blockNumber",
    )
    .map_err(ProofError::from)?;

    let mut proof = Builder::new(&TRANSACTION_PROOF);
    proof.add_bytes("transaction", &raw);
    proof.add_u32("transactionIndex", tx_index);
    proof.add_u64("blockNumber", block_number);
    proof.add_bytes("blockHash", &block_hash);
    proof.add_bytes("proof", &chunks);
    proof.add_builder("header", header_builder(&beacon));
    proof.add_bytes("syncCommitteeBits", &beacon.sync_bits);
    proof.add_bytes("syncCommitteeSignature", &beacon.sync_signature);

    Ok(assemble_request(
        DataVariant::TransactionHash as u8,
        &keccak256(&raw),
        ProofVariant::Transaction as u8,
        &proof.into_bytes(),
    ))
}
