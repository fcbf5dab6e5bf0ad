//! Account proofs: an `eth_getProof`-style Patricia proof under the
//! execution state root, plus the SSZ link from that state root into the
//! signed body root.

use super::{signature, trie_nodes, Ctx, VerifyError, GINDEX_STATE_ROOT};
use crate::crypto::{keccak256, EMPTY_CODE_HASH, EMPTY_TRIE_ROOT};
use crate::eth::pad_word;
use crate::rlp;
use crate::ssz::{verify_multi_proof, Ob};
use crate::trie;
use crate::types::DataVariant;

pub(crate) fn verify(ctx: &mut Ctx, proof: Ob) -> Result<(), VerifyError> {
    let nodes = trie_nodes(&proof.get("accountProof")?)?;
    if nodes.is_empty() {
        return Err(VerifyError::Proof("empty account proof".into()));
    }
    let address: [u8; 20] = proof.get("address")?.as_array()?;
    let balance: [u8; 32] = proof.get("balance")?.as_array()?;
    let nonce: [u8; 32] = proof.get("nonce")?.as_array()?;
    let code_hash: [u8; 32] = proof.get("codeHash")?.as_array()?;
    let storage_hash: [u8; 32] = proof.get("storageHash")?.as_array()?;

    // the state root is implied by the proof itself
    let state_root = keccak256(&nodes[0]);

    match trie::verify(&state_root, &address, &nodes)? {
        Some(account_rlp) => {
            let fields = rlp::list_items(&account_rlp)
                .map_err(|e| VerifyError::Proof(format!("account RLP: {e}")))?;
            if fields.len() != 4 {
                return Err(VerifyError::Proof(format!(
                    "account RLP with {} fields",
                    fields.len()
                )));
            }
            if pad_word(&fields[0])? != nonce
                || pad_word(&fields[1])? != balance
                || fields[2][..] != storage_hash[..]
                || fields[3][..] != code_hash[..]
            {
                return Err(VerifyError::Proof(
                    "account fields do not match the proven account".into(),
                ));
            }
        }
        None => {
            // proof of absence: the account must be the empty account
            if nonce != [0u8; 32]
                || balance != [0u8; 32]
                || code_hash != EMPTY_CODE_HASH
                || storage_hash != EMPTY_TRIE_ROOT
            {
                return Err(VerifyError::Proof(
                    "absent account claimed with non-empty state".into(),
                ));
            }
        }
    }

    // storage slots under the account's storage root
    let storage_proofs = proof.get("storageProof")?;
    for i in 0..storage_proofs.len() {
        let entry = storage_proofs.at(i)?;
        let key: [u8; 32] = entry.get("key")?.as_array()?;
        let value: [u8; 32] = entry.get("value")?.as_array()?;
        let slot_nodes = trie_nodes(&entry.get("proof")?)?;
        if slot_nodes.is_empty() {
            if storage_hash != EMPTY_TRIE_ROOT || value != [0u8; 32] {
                return Err(VerifyError::Proof("empty storage proof".into()));
            }
            continue;
        }
        match trie::verify(&storage_hash, &key, &slot_nodes)? {
            Some(raw) => {
                let (item, _) = rlp::decode(&raw)
                    .map_err(|e| VerifyError::Proof(format!("storage value RLP: {e}")))?;
                let stored = item
                    .as_bytes()
                    .map_err(|e| VerifyError::Proof(format!("storage value RLP: {e}")))?;
                if pad_word(stored)? != value {
                    return Err(VerifyError::Proof(
                        "storage value does not match the proven slot".into(),
                    ));
                }
            }
            None => {
                if value != [0u8; 32] {
                    return Err(VerifyError::Proof(
                        "absent storage slot claimed with non-zero value".into(),
                    ));
                }
            }
        }
    }

    // thread the state root into the signed body root
    let state_proof = proof.get("stateProof")?;
    let header = state_proof.get("header")?;
    let body_root: [u8; 32] = header.get("bodyRoot")?.as_array()?;
    let root = verify_multi_proof(
        state_proof.get("stateProof")?.as_bytes(),
        &[state_root],
        &[GINDEX_STATE_ROOT],
    )?;
    if root != body_root {
        return Err(VerifyError::Proof(
            "state root is not part of the block body".into(),
        ));
    }

    // the claimed value depends on the method this proof answers
    let (selector, data) = ctx.data.union()?;
    if selector == DataVariant::Balance as usize {
        let claimed: [u8; 32] = data.as_array()?;
        let proven = match ctx.method {
            "eth_getTransactionCount" => nonce,
            "eth_getStorageAt" => {
                if storage_proofs.is_empty() {
                    return Err(VerifyError::Input(
                        "storage query without a storage proof".into(),
                    ));
                }
                storage_proofs.at(0)?.get("value")?.as_array()?
            }
            _ => balance,
        };
        if claimed != proven {
            return Err(VerifyError::Proof(
                "claimed value does not match the proven account".into(),
            ));
        }
    }

    signature::verify_blockroot_signature(
        ctx,
        &header,
        &state_proof.get("syncCommitteeBits")?,
        &state_proof.get("syncCommitteeSignature")?,
    )
}
