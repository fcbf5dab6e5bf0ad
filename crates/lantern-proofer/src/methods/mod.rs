//! Per-method proof builders.
//!
//! Every builder is a resumable computation over the deduplicating request
//! store: it can be re-entered any number of times after a `Pending` yield
//! and converges onto the same artifact bytes.

pub(crate) mod account;
pub(crate) mod blockhash;
pub(crate) mod logs;
pub(crate) mod receipt;
pub(crate) mod transaction;

use serde_json::Value;

use lantern_core::eth::{hex_bytes, EthError};
use lantern_core::ssz::Builder;
use lantern_core::types::{SyncVariant, BEACON_BLOCK_HEADER, PROOF_REQUEST};

use crate::beacon::BeaconBlock;

/// Build the `BeaconBlockHeader` container of a resolved beacon block.
pub(crate) fn header_builder(beacon: &BeaconBlock) -> Builder {
    let mut header = Builder::new(&BEACON_BLOCK_HEADER);
    header.add_u64("slot", beacon.slot);
    header.add_u64("proposerIndex", beacon.proposer_index);
    header.add_bytes("parentRoot", &beacon.parent_root);
    header.add_bytes("stateRoot", &beacon.state_root);
    header.add_bytes("bodyRoot", &beacon.body_root);
    header
}

/// Assemble the final artifact: data, proof and (empty) sync-data unions.
pub(crate) fn assemble_request(
    data_selector: u8,
    data: &[u8],
    proof_selector: u8,
    proof: &[u8],
) -> Vec<u8> {
    let mut request = Builder::new(&PROOF_REQUEST);
    request.add_union("data", data_selector, data);
    request.add_union("proof", proof_selector, proof);
    request.add_union("sync_data", SyncVariant::None as u8, &[]);
    request.into_bytes()
}

/// Decode a JSON array of hex trie nodes (the `eth_getProof` shape).
pub(crate) fn json_trie_nodes(value: &Value, field: &str) -> Result<Vec<Vec<u8>>, EthError> {
    value
        .as_array()
        .ok_or_else(|| EthError::UnexpectedJson(field.to_string()))?
        .iter()
        .map(|node| hex_bytes(node, field))
        .collect()
}
