//! Sync-aggregate check for a proven beacon header.

use super::{Ctx, VerifyError};
use crate::chains::{
    compute_signing_root, slot_to_epoch, slot_to_period, BLS_PUBKEY_LEN,
    MIN_SYNC_COMMITTEE_PARTICIPANTS,
};
use crate::crypto::bls_fast_aggregate_verify;
use crate::ssz::{hash_tree_root, Ob};
use crate::sync::participant_indices;

/// Verify the sync aggregate carried next to a proven header.
///
/// The proof containers carry no explicit signature slot; the aggregate over
/// a header at slot `s` is produced in the following slot, so the committee
/// and domain are those of `s + 1`. A committee miss reports the inclusive
/// period range the caller has to fetch.
pub(crate) fn verify_blockroot_signature(
    ctx: &mut Ctx,
    header: &Ob,
    bits: &Ob,
    signature: &Ob,
) -> Result<(), VerifyError> {
    let slot = header.get("slot")?.as_u64()?;
    let signature_slot = slot + 1;
    let period = slot_to_period(signature_slot);

    let state = ctx.store.validators(ctx.spec.chain_id, period);
    let Some(pubkeys) = state.pubkeys else {
        let first = if state.last_period == 0 {
            period
        } else {
            state.last_period + 1
        };
        return Err(VerifyError::MissingSyncPeriod {
            first,
            last: period,
        });
    };

    let bits = bits.as_bytes();
    if bits.len() != 64 {
        return Err(VerifyError::Proof(
            "sync committee bits must be 64 bytes".into(),
        ));
    }
    let participants = participant_indices(bits);
    if participants.len() < MIN_SYNC_COMMITTEE_PARTICIPANTS {
        return Err(VerifyError::Proof(format!(
            "insufficient sync committee participation: {}",
            participants.len()
        )));
    }

    let keys: Vec<&[u8; 48]> = participants
        .iter()
        .map(|&i| {
            <&[u8; 48]>::try_from(&pubkeys[i * BLS_PUBKEY_LEN..(i + 1) * BLS_PUBKEY_LEN]).unwrap()
        })
        .collect();

    let header_root = hash_tree_root(*header)?;
    let domain = ctx.spec.sync_committee_domain(slot_to_epoch(signature_slot));
    let signing_root = compute_signing_root(&header_root, &domain);

    bls_fast_aggregate_verify(&keys, &signing_root, &signature.as_array::<96>()?)
        .map_err(|_| VerifyError::Signature)
}
