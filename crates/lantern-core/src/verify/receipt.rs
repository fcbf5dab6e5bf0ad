//! Receipt proofs: a Patricia proof under the receipts root plus the SSZ
//! multi-proof binding that root (and the block identity) into the signed
//! body root.

use super::{
    signature, trie_nodes, u64_leaf, Ctx, VerifyError, GINDEX_BLOCK_HASH, GINDEX_BLOCK_NUMBER,
    GINDEX_RECEIPTS_ROOT,
};
use crate::crypto::keccak256;
use crate::eth::{hex_array, hex_u64, serialize_receipt};
use crate::rlp;
use crate::ssz::{verify_multi_proof, Ob};
use crate::trie;
use crate::types::DataVariant;

pub(crate) fn verify(ctx: &mut Ctx, proof: Ob) -> Result<(), VerifyError> {
    let tx_index = proof.get("transactionIndex")?.as_u32()?;
    let block_number = proof.get("blockNumber")?.as_u64()?;
    let block_hash: [u8; 32] = proof.get("blockHash")?.as_array()?;
    let header = proof.get("header")?;
    let body_root: [u8; 32] = header.get("bodyRoot")?.as_array()?;

    let nodes = trie_nodes(&proof.get("receiptProof")?)?;
    if nodes.is_empty() {
        return Err(VerifyError::Proof("empty receipt proof".into()));
    }
    let receipts_root = keccak256(&nodes[0]);

    // rebuild the canonical receipt RLP from the claimed JSON; fall back to
    // the data union when the caller only has the artifact
    let (selector, data) = ctx.data.union()?;
    let canonical = match ctx.claimed {
        Some(claimed) => {
            let rebuilt = serialize_receipt(claimed)?;
            if selector == DataVariant::Receipt as usize && data.as_bytes() != rebuilt {
                return Err(VerifyError::Input(
                    "claimed receipt JSON disagrees with the artifact data".into(),
                ));
            }
            rebuilt
        }
        None => {
            if selector != DataVariant::Receipt as usize {
                return Err(VerifyError::Input(
                    "receipt proof requires a claimed receipt".into(),
                ));
            }
            data.as_bytes().to_vec()
        }
    };

    let mut key = Vec::new();
    rlp::add_uint(&mut key, tx_index as u64);
    match trie::verify(&receipts_root, &key, &nodes)? {
        Some(value) => {
            if value != canonical {
                return Err(VerifyError::Proof(
                    "receipt does not match the proven trie value".into(),
                ));
            }
        }
        None => {
            return Err(VerifyError::Proof(
                "receipt is not present under the receipts root".into(),
            ))
        }
    }

    if let Some(claimed) = ctx.claimed {
        if let Some(v) = claimed.get("blockNumber") {
            if hex_u64(v, "blockNumber")? != block_number {
                return Err(VerifyError::Proof("claimed blockNumber mismatch".into()));
            }
        }
        if let Some(v) = claimed.get("blockHash") {
            if hex_array::<32>(v, "blockHash")? != block_hash {
                return Err(VerifyError::Proof("claimed blockHash mismatch".into()));
            }
        }
        if let Some(v) = claimed.get("transactionIndex") {
            if hex_u64(v, "transactionIndex")? != tx_index as u64 {
                return Err(VerifyError::Proof(
                    "claimed transactionIndex mismatch".into(),
                ));
            }
        }
    }

    let leaves = [receipts_root, u64_leaf(block_number), block_hash];
    let gindexes = [GINDEX_RECEIPTS_ROOT, GINDEX_BLOCK_NUMBER, GINDEX_BLOCK_HASH];
    let root = verify_multi_proof(proof.get("proof")?.as_bytes(), &leaves, &gindexes)?;
    if root != body_root {
        return Err(VerifyError::Proof(
            "receipts root is not part of the block body".into(),
        ));
    }

    signature::verify_blockroot_signature(
        ctx,
        &header,
        &proof.get("syncCommitteeBits")?,
        &proof.get("syncCommitteeSignature")?,
    )
}
