//! `eth_getBalance` / `eth_getTransactionCount` / `eth_getStorageAt`
//! → AccountProof.

use serde_json::{json, Value};

use lantern_core::eth::{get, hex_array, hex_word};
use lantern_core::ssz::{create_multi_proof, encode_dynamic_list, Builder};
use lantern_core::types::{
    DataVariant, ProofVariant, ACCOUNT_PROOF, STATE_PROOF, STORAGE_PROOF,
};
use lantern_core::verify::GINDEX_STATE_ROOT;

use super::{assemble_request, header_builder, json_trie_nodes};
use crate::beacon::{self, body_ob};
use crate::proofer::{ProofError, ProoferCtx, Step};
use crate::rpc::send_eth_rpc;

pub(crate) fn prove(ctx: &mut ProoferCtx) -> Step<Vec<u8>> {
    let method = ctx.method.clone();
    let params = ctx.params.clone();

    let address_json = params
        .get(0)
        .cloned()
        .ok_or_else(|| ProofError::InvalidInput("missing address".into()))?;
    let address =
        hex_array::<20>(&address_json, "address").map_err(ProofError::from)?;

    let (storage_keys, block_tag) = if method == "eth_getStorageAt" {
        let key = params
            .get(1)
            .cloned()
            .ok_or_else(|| ProofError::InvalidInput("missing storage key".into()))?;
        (json!([key]), params.get(2).cloned().unwrap_or(json!("latest")))
    } else {
        (json!([]), params.get(1).cloned().unwrap_or(json!("latest")))
    };

    // pin the block first so the proof and the beacon lookup agree
    let block = send_eth_rpc(ctx, "eth_getBlockByNumber", &json!([block_tag, false]))?;
    let number = get(&block, "number").map_err(ProofError::from)?.clone();

    let proof_json = send_eth_rpc(
        ctx,
        "eth_getProof",
        &json!([address_json, storage_keys, number]),
    )?;
    let beacon = beacon::block_for_execution_block(ctx, &block)?;

    let chunks = create_multi_proof(body_ob(&beacon), &[GINDEX_STATE_ROOT])?;
    let mut state_proof = Builder::new(&STATE_PROOF);
    state_proof.add_bytes("stateProof", &chunks);
    state_proof.add_builder("header", header_builder(&beacon));
    state_proof.add_bytes("syncCommitteeBits", &beacon.sync_bits);
    state_proof.add_bytes("syncCommitteeSignature", &beacon.sync_signature);

    let nodes = json_trie_nodes(
        get(&proof_json, "accountProof").map_err(ProofError::from)?,
        "accountProof",
    )
    .map_err(ProofError::from)?;

    let balance = hex_word(get(&proof_json, "balance").map_err(ProofError::from)?, "balance")
        .map_err(ProofError::from)?;
    let nonce = hex_word(get(&proof_json, "nonce").map_err(ProofError::from)?, "nonce")
        .map_err(ProofError::from)?;

    let mut account = Builder::new(&ACCOUNT_PROOF);
    account.add_bytes("accountProof", &encode_dynamic_list(&nodes));
    account.add_bytes("address", &address);
    account.add_bytes("balance", &balance);
    account.add_bytes(
        "codeHash",
        &hex_array::<32>(get(&proof_json, "codeHash").map_err(ProofError::from)?, "codeHash")
            .map_err(ProofError::from)?,
    );
    account.add_bytes("nonce", &nonce);
    account.add_bytes(
        "storageHash",
        &hex_array::<32>(
            get(&proof_json, "storageHash").map_err(ProofError::from)?,
            "storageHash",
        )
        .map_err(ProofError::from)?,
    );

    let mut entries = Vec::new();
    let mut first_storage_value = [0u8; 32];
    if let Some(slots) = proof_json.get("storageProof").and_then(Value::as_array) {
        for (i, slot) in slots.iter().enumerate() {
            let value = hex_word(get(slot, "value").map_err(ProofError::from)?, "value")
                .map_err(ProofError::from)?;
            if i == 0 {
                first_storage_value = value;
            }
            let slot_nodes =
                json_trie_nodes(get(slot, "proof").map_err(ProofError::from)?, "proof")
                    .map_err(ProofError::from)?;
            let mut entry = Builder::new(&STORAGE_PROOF);
            entry.add_bytes(
                "key",
                &hex_word(get(slot, "key").map_err(ProofError::from)?, "key")
                    .map_err(ProofError::from)?,
            );
            entry.add_bytes("proof", &encode_dynamic_list(&slot_nodes));
            entry.add_bytes("value", &value);
            entries.push(entry.into_bytes());
        }
    }
    account.add_bytes("storageProof", &encode_dynamic_list(&entries));
    account.add_builder("stateProof", state_proof);

    let claimed = match method.as_str() {
        "eth_getTransactionCount" => nonce,
        "eth_getStorageAt" => first_storage_value,
        _ => balance,
    };

    Ok(assemble_request(
        DataVariant::Balance as u8,
        &claimed,
        ProofVariant::Account as u8,
        &account.into_bytes(),
    ))
}
