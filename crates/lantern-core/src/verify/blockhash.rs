//! Block hash proofs: a single Merkle leaf from
//! `executionPayload.blockHash` up to the signed body root.

use super::{signature, Ctx, VerifyError, GINDEX_BLOCK_HASH};
use crate::eth::hex_array;
use crate::ssz::{verify_multi_proof, Ob};
use crate::types::DataVariant;

pub(crate) fn verify(ctx: &mut Ctx, proof: Ob) -> Result<(), VerifyError> {
    let (selector, data) = ctx.data.union()?;
    if selector != DataVariant::BlockHash as usize {
        return Err(VerifyError::Input(
            "blockhash proof requires a claimed block hash".into(),
        ));
    }
    let claimed: [u8; 32] = data.as_array()?;

    // when a claimed JSON block is supplied, its hash must be the data hash
    if let Some(block) = ctx.claimed {
        if let Some(hash) = block.get("hash") {
            if hex_array::<32>(hash, "hash")? != claimed {
                return Err(VerifyError::Input(
                    "claimed block JSON disagrees with the claimed hash".into(),
                ));
            }
        }
    }

    let header = proof.get("header")?;
    let body_root: [u8; 32] = header.get("bodyRoot")?.as_array()?;
    let chunks = proof.get("blockhashProof")?;

    let root = verify_multi_proof(chunks.as_bytes(), &[claimed], &[GINDEX_BLOCK_HASH])?;
    if root != body_root {
        return Err(VerifyError::Proof(
            "execution block hash is not part of the block body".into(),
        ));
    }

    signature::verify_blockroot_signature(
        ctx,
        &header,
        &proof.get("syncCommitteeBits")?,
        &proof.get("syncCommitteeSignature")?,
    )
}
