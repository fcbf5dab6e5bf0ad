//! `eth_getBlockByNumber` → BlockHashProof.

use serde_json::json;

use lantern_core::eth::{get, hex_array};
use lantern_core::ssz::{create_multi_proof, Builder};
use lantern_core::types::{DataVariant, ProofVariant, BLOCK_HASH_PROOF};
use lantern_core::verify::GINDEX_BLOCK_HASH;

use super::{assemble_request, header_builder};
use crate::beacon::{self, body_ob};
use crate::proofer::{ProofError, ProoferCtx, Step};
use crate::rpc::send_eth_rpc;

pub(crate) fn prove(ctx: &mut ProoferCtx) -> Step<Vec<u8>> {
    let tag = ctx
        .params
        .get(0)
        .cloned()
        .ok_or_else(|| ProofError::InvalidInput("missing block number".into()))?;

    let block = send_eth_rpc(ctx, "eth_getBlockByNumber", &json!([tag, false]))?;
    let block_hash =
        hex_array::<32>(get(&block, "hash").map_err(ProofError::from)?, "hash")
            .map_err(ProofError::from)?;

    let beacon = beacon::block_for_execution_block(ctx, &block)?;
    let chunks = create_multi_proof(body_ob(&beacon), &[GINDEX_BLOCK_HASH])?;

    let mut proof = Builder::new(&BLOCK_HASH_PROOF);
    proof.add_bytes("blockhashProof", &chunks);
    proof.add_builder("header", header_builder(&beacon));
    proof.add_bytes("syncCommitteeBits", &beacon.sync_bits);
    proof.add_bytes("syncCommitteeSignature", &beacon.sync_signature);

    Ok(assemble_request(
        DataVariant::BlockHash as u8,
        &block_hash,
        ProofVariant::BlockHash as u8,
        &proof.into_bytes(),
    ))
}
