//! Beacon-block resolution for an execution block.
//!
//! Execution blocks carry `parentBeaconBlockRoot`, the root of the beacon
//! block *before* the one embedding them. The child of that root is the
//! target block; the child of the target carries the sync aggregate that
//! signs the target's header. Every hop is its own deduplicated data
//! request, so a suspended builder resumes onto the same lookups.

use serde_json::Value;

use lantern_core::eth::{get, hex_array};
use lantern_core::ssz::{hash_tree_root, Ob};
use lantern_core::types::{BEACON_BLOCK_BODY, SIGNED_BEACON_BLOCK};

use crate::proofer::{ProofError, ProoferCtx, Step};
use crate::rpc::{get_beacon_json, get_beacon_ssz};

/// A resolved beacon block with everything the proof builders need: the
/// header fields, the raw SSZ body, and the sync aggregate of the following
/// block (the one that signs this header).
pub struct BeaconBlock {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: [u8; 32],
    pub state_root: [u8; 32],
    pub body_root: [u8; 32],
    pub root: [u8; 32],
    pub body: Vec<u8>,
    pub sync_bits: Vec<u8>,
    pub sync_signature: Vec<u8>,
    pub signature_slot: u64,
}

struct HeaderInfo {
    root: [u8; 32],
    slot: u64,
    body_root: [u8; 32],
}

fn header_by_parent(ctx: &mut ProoferCtx, parent_root: &[u8; 32]) -> Step<HeaderInfo> {
    let path = format!(
        "eth/v1/beacon/headers?parent_root=0x{}",
        hex::encode(parent_root)
    );
    let response = get_beacon_json(ctx, &path)?;
    let entry = response
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .ok_or_else(|| ProofError::Beacon(format!("no header with parent {path}")))?;

    let root = hex_array::<32>(get(entry, "root").map_err(ProofError::from)?, "root")
        .map_err(ProofError::from)?;
    let message = entry
        .get("header")
        .and_then(|h| h.get("message"))
        .ok_or_else(|| ProofError::Beacon("header response without message".into()))?;
    let slot = message
        .get("slot")
        .and_then(|s| s.as_str())
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ProofError::Beacon("header without slot".into()))?;
    let body_root = hex_array::<32>(
        get(message, "body_root").map_err(ProofError::from)?,
        "body_root",
    )
    .map_err(ProofError::from)?;

    Ok(HeaderInfo {
        root,
        slot,
        body_root,
    })
}

/// Resolve the beacon block embedding the given execution block (a JSON
/// block from `eth_getBlockByNumber`), plus the sync aggregate signing it.
pub(crate) fn block_for_execution_block(
    ctx: &mut ProoferCtx,
    block: &Value,
) -> Step<BeaconBlock> {
    let parent_root = hex_array::<32>(
        get(block, "parentBeaconBlockRoot").map_err(ProofError::from)?,
        "parentBeaconBlockRoot",
    )
    .map_err(ProofError::from)?;
    let block_hash =
        hex_array::<32>(get(block, "hash").map_err(ProofError::from)?, "hash")
            .map_err(ProofError::from)?;

    let target = header_by_parent(ctx, &parent_root)?;
    let signed = get_beacon_ssz(ctx, &format!("eth/v2/beacon/blocks/{}", target.slot))?;

    let signed_ob = Ob::new(&SIGNED_BEACON_BLOCK, &signed);
    signed_ob
        .validate()
        .map_err(|e| ProofError::Beacon(format!("malformed beacon block: {e}")))?;
    let message = signed_ob.get("message").map_err(ProofError::from)?;
    let slot = message
        .get("slot")
        .map_err(ProofError::from)?
        .as_u64()
        .map_err(ProofError::from)?;
    if slot != target.slot {
        return Err(ProofError::Beacon(format!(
            "beacon block slot {slot} does not match header slot {}",
            target.slot
        ))
        .into());
    }

    let body = message.get("body").map_err(ProofError::from)?;
    let body_root = hash_tree_root(body).map_err(ProofError::from)?;
    if body_root != target.body_root {
        return Err(ProofError::Beacon("beacon body does not match its header".into()).into());
    }

    // the body must actually embed the execution block we started from
    let payload = body.get("executionPayload").map_err(ProofError::from)?;
    if payload
        .get("blockHash")
        .map_err(ProofError::from)?
        .as_array::<32>()
        .map_err(ProofError::from)?
        != block_hash
    {
        return Err(
            ProofError::Beacon("beacon block embeds a different execution block".into()).into(),
        );
    }

    let parse_header_field = |name: &str| -> Result<[u8; 32], ProofError> {
        Ok(message
            .get(name)
            .map_err(ProofError::from)?
            .as_array::<32>()
            .map_err(ProofError::from)?)
    };

    // the aggregate signing this header lives in the child block's body
    let signer = header_by_parent(ctx, &target.root)?;
    let signer_block = get_beacon_ssz(ctx, &format!("eth/v2/beacon/blocks/{}", signer.slot))?;
    let signer_ob = Ob::new(&SIGNED_BEACON_BLOCK, &signer_block);
    signer_ob
        .validate()
        .map_err(|e| ProofError::Beacon(format!("malformed beacon block: {e}")))?;
    let aggregate = signer_ob
        .get("message")
        .and_then(|m| m.get("body"))
        .and_then(|b| b.get("syncAggregate"))
        .map_err(ProofError::from)?;
    let sync_bits = aggregate
        .get("syncCommitteeBits")
        .map_err(ProofError::from)?
        .as_bytes()
        .to_vec();
    let sync_signature = aggregate
        .get("syncCommitteeSignature")
        .map_err(ProofError::from)?
        .as_bytes()
        .to_vec();

    Ok(BeaconBlock {
        slot,
        proposer_index: message
            .get("proposerIndex")
            .map_err(ProofError::from)?
            .as_u64()
            .map_err(ProofError::from)?,
        parent_root: parse_header_field("parentRoot")?,
        state_root: parse_header_field("stateRoot")?,
        body_root,
        root: target.root,
        body: body.as_bytes().to_vec(),
        sync_bits,
        sync_signature,
        signature_slot: signer.slot,
    })
}

/// Typed view over the resolved body bytes.
pub(crate) fn body_ob(beacon: &BeaconBlock) -> Ob<'_> {
    Ob::new(&BEACON_BLOCK_BODY, &beacon.body)
}
