//! Period-indexed store of trusted sync-committee validator sets.
//!
//! The store learns new committees by processing `LightClientUpdate`
//! sequences: each update commits the *next* committee under the attested
//! header's state root and is signed by the *current* committee. Verified
//! committees are persisted through the pluggable [`Storage`] backend, so a
//! verifier restarted later picks up where it left off without replaying
//! updates.

mod storage;

pub use storage::{FileStorage, MemoryStorage, Storage};

use log::{debug, warn};
use thiserror::Error;

use crate::chains::{
    slot_to_epoch, slot_to_period, ChainSpec, BLS_PUBKEY_LEN, MIN_SYNC_COMMITTEE_PARTICIPANTS,
    SYNC_COMMITTEE_SIZE,
};
use crate::crypto::{bls_fast_aggregate_verify, sha256, sha256_pair, CryptoError};
use crate::ssz::{hash_tree_root, Ob, SszError};

/// Generalized index of `next_sync_committee` in the beacon state.
const NEXT_SYNC_COMMITTEE_GINDEX: u64 = 55;
const NEXT_SYNC_COMMITTEE_DEPTH: usize = 5;

/// Generalized index of the finalized checkpoint root in the beacon state.
const FINALIZED_ROOT_GINDEX: u64 = 105;
const FINALIZED_ROOT_DEPTH: usize = 6;

const PUBKEYS_BLOB_LEN: usize = SYNC_COMMITTEE_SIZE * BLS_PUBKEY_LEN;

/// Errors from applying light-client updates.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("missing sync committee periods {first}..={last}")]
    MissingPeriods { first: u64, last: u64 },

    #[error("invalid light client update: {0}")]
    InvalidUpdate(String),

    #[error("insufficient sync committee participation: {participants}/{}", SYNC_COMMITTEE_SIZE)]
    InsufficientParticipation { participants: usize },

    #[error("sync committee signature does not verify")]
    SignatureInvalid,

    #[error(transparent)]
    Ssz(#[from] SszError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// The stored view of one chain's committee history, as seen by a verifier.
pub struct SyncState {
    /// Highest period a committee is stored for (0 when nothing is stored).
    pub last_period: u64,
    /// The period that was asked for.
    pub current_period: u64,
    /// The 512 × 48-byte pubkey blob, when the period is known.
    pub pubkeys: Option<Vec<u8>>,
}

/// A caller-supplied root of trust for bootstrapping an empty store:
/// the SSZ root of the committee expected at `period`.
#[derive(Debug, Clone, Copy)]
pub struct TrustAnchor {
    pub period: u64,
    pub committee_root: [u8; 32],
}

/// Verify a fixed-depth Merkle branch against a root.
fn verify_merkle_branch(
    leaf: &[u8; 32],
    branch: &[[u8; 32]],
    depth: usize,
    index: u64,
    root: &[u8; 32],
) -> bool {
    if branch.len() != depth {
        return false;
    }
    let mut current = *leaf;
    for (i, node) in branch.iter().enumerate() {
        if (index >> i) & 1 == 1 {
            current = sha256_pair(node, &current);
        } else {
            current = sha256_pair(&current, node);
        }
    }
    current == *root
}

fn branch_nodes(ob: &Ob, expected: usize) -> Result<Vec<[u8; 32]>, SyncError> {
    let mut nodes = Vec::with_capacity(expected);
    for i in 0..ob.len() {
        nodes.push(ob.at(i)?.as_array::<32>()?);
    }
    if nodes.len() != expected {
        return Err(SyncError::InvalidUpdate(format!(
            "branch of {} nodes, expected {expected}",
            nodes.len()
        )));
    }
    Ok(nodes)
}

/// Count and collect the set bits of the 512-bit participation vector.
pub fn participant_indices(bits: &[u8]) -> Vec<usize> {
    let mut indices = Vec::new();
    for i in 0..SYNC_COMMITTEE_SIZE {
        let byte = i / 8;
        if byte < bits.len() && (bits[byte] >> (i % 8)) & 1 == 1 {
            indices.push(i);
        }
    }
    indices
}

/// Period-indexed cache of trusted sync-committee validator sets.
pub struct SyncStore {
    storage: Box<dyn Storage>,
    max_sync_states: u32,
}

impl SyncStore {
    pub fn new(storage: Box<dyn Storage>, max_sync_states: u32) -> Self {
        SyncStore {
            storage,
            max_sync_states: max_sync_states.max(1),
        }
    }

    fn states_key(chain_id: u64) -> String {
        format!("states_{chain_id}")
    }

    fn blob_key(chain_id: u64, period: u64) -> String {
        format!("sync_{chain_id}_{period}")
    }

    /// The `(period, committee_root)` records stored for a chain, ascending.
    fn trusted_periods(&self, chain_id: u64) -> Vec<(u64, [u8; 32])> {
        let Some(blob) = self.storage.get(&Self::states_key(chain_id)) else {
            return Vec::new();
        };
        let mut records: Vec<(u64, [u8; 32])> = blob
            .chunks_exact(40)
            .map(|rec| {
                let period = u64::from_le_bytes(rec[..8].try_into().unwrap());
                let mut root = [0u8; 32];
                root.copy_from_slice(&rec[8..]);
                (period, root)
            })
            .collect();
        records.sort_by_key(|(p, _)| *p);
        records
    }

    fn write_periods(&self, chain_id: u64, records: &[(u64, [u8; 32])]) {
        let mut blob = Vec::with_capacity(records.len() * 40);
        for (period, root) in records {
            blob.extend_from_slice(&period.to_le_bytes());
            blob.extend_from_slice(root);
        }
        self.storage.set(&Self::states_key(chain_id), &blob);
    }

    /// The stored validator set for a period, or an empty view if unknown.
    pub fn validators(&self, chain_id: u64, period: u64) -> SyncState {
        let last_period = self
            .trusted_periods(chain_id)
            .last()
            .map(|(p, _)| *p)
            .unwrap_or(0);
        let pubkeys = self
            .storage
            .get(&Self::blob_key(chain_id, period))
            .filter(|blob| blob.len() == PUBKEYS_BLOB_LEN);
        SyncState {
            last_period,
            current_period: period,
            pubkeys,
        }
    }

    /// Import a committee without update verification. This is the root of
    /// trust: only feed it data checked against an external checkpoint.
    pub fn insert_committee(&mut self, chain_id: u64, period: u64, pubkeys: &[u8]) -> Result<(), SyncError> {
        if pubkeys.len() != PUBKEYS_BLOB_LEN {
            return Err(SyncError::InvalidUpdate(format!(
                "pubkey blob of {} bytes",
                pubkeys.len()
            )));
        }
        self.store_period(chain_id, period, sha256(pubkeys), pubkeys);
        Ok(())
    }

    fn store_period(&mut self, chain_id: u64, period: u64, root: [u8; 32], pubkeys: &[u8]) {
        let mut records = self.trusted_periods(chain_id);
        if records.iter().any(|(p, _)| *p == period) {
            // trusted blocks are never rewritten
            return;
        }
        records.push((period, root));
        records.sort_by_key(|(p, _)| *p);
        while records.len() > self.max_sync_states as usize {
            let (oldest, _) = records.remove(0);
            self.storage.delete(&Self::blob_key(chain_id, oldest));
            debug!("evicted sync committee for period {oldest}");
        }
        self.write_periods(chain_id, &records);
        self.storage
            .set(&Self::blob_key(chain_id, period), pubkeys);
        debug!("stored sync committee for period {period}");
    }

    /// Apply a batch of light-client updates in ascending signature-slot
    /// order, extending the trusted committee history.
    pub fn apply_updates(
        &mut self,
        updates: &[Ob],
        spec: &ChainSpec,
        anchor: Option<TrustAnchor>,
    ) -> Result<(), SyncError> {
        let mut order: Vec<usize> = (0..updates.len()).collect();
        let mut slots = Vec::with_capacity(updates.len());
        for update in updates {
            update.validate()?;
            slots.push(update.get("signatureSlot")?.as_u64()?);
        }
        order.sort_by_key(|&i| slots[i]);

        for i in order {
            self.apply_update(&updates[i], spec, anchor)?;
        }
        Ok(())
    }

    fn apply_update(
        &mut self,
        update: &Ob,
        spec: &ChainSpec,
        anchor: Option<TrustAnchor>,
    ) -> Result<(), SyncError> {
        let attested = update.get("attestedHeader")?;
        let finalized = update.get("finalizedHeader")?;
        let committee = update.get("nextSyncCommittee")?;
        let aggregate = update.get("syncAggregate")?;
        let signature_slot = update.get("signatureSlot")?.as_u64()?;

        let attested_state_root = attested.get("stateRoot")?.as_array::<32>()?;
        let committee_root = hash_tree_root(committee)?;

        // 1. the next committee must be committed under the attested state
        let branch = branch_nodes(
            &update.get("nextSyncCommitteeBranch")?,
            NEXT_SYNC_COMMITTEE_DEPTH,
        )?;
        if !verify_merkle_branch(
            &committee_root,
            &branch,
            NEXT_SYNC_COMMITTEE_DEPTH,
            NEXT_SYNC_COMMITTEE_GINDEX,
            &attested_state_root,
        ) {
            return Err(SyncError::InvalidUpdate(
                "next sync committee branch does not verify".into(),
            ));
        }

        // 2. the finalized header must be committed under the attested state
        let finalized_root = hash_tree_root(finalized)?;
        let branch = branch_nodes(&update.get("finalityBranch")?, FINALIZED_ROOT_DEPTH)?;
        if !verify_merkle_branch(
            &finalized_root,
            &branch,
            FINALIZED_ROOT_DEPTH,
            FINALIZED_ROOT_GINDEX,
            &attested_state_root,
        ) {
            return Err(SyncError::InvalidUpdate(
                "finality branch does not verify".into(),
            ));
        }

        let signature_period = slot_to_period(signature_slot);
        let next_period = signature_period + 1;
        let pubkey_blob = committee.get("pubkeys")?.as_bytes().to_vec();

        // 3. verify the aggregate with the committee of the signing period
        let state = self.validators(spec.chain_id, signature_period);
        match state.pubkeys {
            Some(signers) => {
                let bits = aggregate.get("syncCommitteeBits")?.as_bytes();
                let signature = aggregate.get("syncCommitteeSignature")?.as_array::<96>()?;
                let participants = participant_indices(bits);
                if participants.len() < MIN_SYNC_COMMITTEE_PARTICIPANTS {
                    return Err(SyncError::InsufficientParticipation {
                        participants: participants.len(),
                    });
                }
                let keys: Vec<&[u8; 48]> = participants
                    .iter()
                    .map(|&i| {
                        <&[u8; 48]>::try_from(&signers[i * BLS_PUBKEY_LEN..(i + 1) * BLS_PUBKEY_LEN])
                            .unwrap()
                    })
                    .collect();
                let header_root = hash_tree_root(attested)?;
                let domain = spec.sync_committee_domain(slot_to_epoch(signature_slot));
                let signing_root = crate::chains::compute_signing_root(&header_root, &domain);
                bls_fast_aggregate_verify(&keys, &signing_root, &signature)
                    .map_err(|_| SyncError::SignatureInvalid)?;
            }
            None => {
                // bootstrap: accept the committee the caller anchored trust to
                let anchored = anchor
                    .filter(|a| a.period == next_period && a.committee_root == committee_root);
                if anchored.is_none() {
                    let first = if state.last_period == 0 {
                        signature_period
                    } else {
                        state.last_period + 1
                    };
                    warn!(
                        "no committee for signing period {signature_period} (have up to {})",
                        state.last_period
                    );
                    return Err(SyncError::MissingPeriods {
                        first,
                        last: signature_period,
                    });
                }
            }
        }

        self.store_period(spec.chain_id, next_period, sha256(&pubkey_blob), &pubkey_blob);
        Ok(())
    }
}
