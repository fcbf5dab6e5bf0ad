//! Transaction proofs: a three-leaf multi-proof binding the raw transaction,
//! its block number and its block hash into the signed body root.

use super::{
    signature, u64_leaf, Ctx, VerifyError, GINDEX_BLOCK_HASH, GINDEX_BLOCK_NUMBER,
    GINDEX_FIRST_TRANSACTION,
};
use crate::crypto::keccak256;
use crate::eth::{check_transaction, hex_array, hex_u64};
use crate::ssz::{hash_tree_root, verify_multi_proof, Ob};
use crate::types::{DataVariant, TRANSACTION_BYTES};

pub(crate) fn verify(ctx: &mut Ctx, proof: Ob) -> Result<(), VerifyError> {
    let raw = proof.get("transaction")?.as_bytes();
    let tx_index = proof.get("transactionIndex")?.as_u32()?;
    let block_number = proof.get("blockNumber")?.as_u64()?;
    let block_hash: [u8; 32] = proof.get("blockHash")?.as_array()?;
    let header = proof.get("header")?;
    let body_root: [u8; 32] = header.get("bodyRoot")?.as_array()?;

    let (selector, data) = ctx.data.union()?;
    if selector != DataVariant::TransactionHash as usize {
        return Err(VerifyError::Input(
            "transaction proof requires a claimed transaction hash".into(),
        ));
    }
    let claimed_hash: [u8; 32] = data.as_array()?;
    if keccak256(raw) != claimed_hash {
        return Err(VerifyError::Proof(
            "transaction bytes do not hash to the claimed hash".into(),
        ));
    }
    if let Some(arg) = ctx.args.get(0) {
        if hex_array::<32>(arg, "transactionHash")? != claimed_hash {
            return Err(VerifyError::Input(
                "requested transaction hash disagrees with the claimed data".into(),
            ));
        }
    }

    // the raw bytes must decode as a transaction and match the claimed JSON
    check_transaction(raw, ctx.claimed)?;
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

    let tx_root = hash_tree_root(Ob::new(&TRANSACTION_BYTES, raw))?;
    let leaves = [u64_leaf(block_number), block_hash, tx_root];
    let gindexes = [
        GINDEX_BLOCK_NUMBER,
        GINDEX_BLOCK_HASH,
        GINDEX_FIRST_TRANSACTION + tx_index as u64,
    ];
    let root = verify_multi_proof(proof.get("proof")?.as_bytes(), &leaves, &gindexes)?;
    if root != body_root {
        return Err(VerifyError::Proof(
            "transaction is not part of the block body".into(),
        ));
    }

    signature::verify_blockroot_signature(
        ctx,
        &header,
        &proof.get("syncCommitteeBits")?,
        &proof.get("syncCommitteeSignature")?,
    )
}
