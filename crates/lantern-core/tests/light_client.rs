//! Sync-committee store behavior over synthetic but fully signed
//! light-client updates.

use blst::min_pk::{AggregateSignature, PublicKey, SecretKey};

use lantern_core::chains::{
    compute_signing_root, slot_to_epoch, ChainSpec, SLOTS_PER_SYNC_COMMITTEE_PERIOD,
};
use lantern_core::crypto::sha256_pair;
use lantern_core::ssz::{hash_tree_root, Builder, Ob};
use lantern_core::sync::{MemoryStorage, SyncError, SyncStore, TrustAnchor};
use lantern_core::types::{
    BEACON_BLOCK_HEADER, LIGHT_CLIENT_UPDATE, SYNC_AGGREGATE, SYNC_COMMITTEE,
};

const CHAIN_ID: u64 = 1;
const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// 512 deterministic validator keys, distinct per committee seed.
fn committee_keys(seed: u8) -> Vec<SecretKey> {
    (0..512u16)
        .map(|i| {
            let mut ikm = [0u8; 32];
            ikm[0] = seed;
            ikm[1..3].copy_from_slice(&i.to_be_bytes());
            ikm[3] = 1;
            SecretKey::key_gen(&ikm, &[]).unwrap()
        })
        .collect()
}

fn pubkeys_blob(keys: &[SecretKey]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(512 * 48);
    for key in keys {
        blob.extend_from_slice(&key.sk_to_pk().to_bytes());
    }
    blob
}

/// SSZ bytes of a SyncCommittee container (with its true aggregate key).
fn committee_bytes(keys: &[SecretKey]) -> Vec<u8> {
    let pks: Vec<PublicKey> = keys.iter().map(|k| k.sk_to_pk()).collect();
    let pk_refs: Vec<&PublicKey> = pks.iter().collect();
    let aggregate = blst::min_pk::AggregatePublicKey::aggregate(&pk_refs, false)
        .unwrap()
        .to_public_key();

    let mut builder = Builder::new(&SYNC_COMMITTEE);
    builder.add_bytes("pubkeys", &pubkeys_blob(keys));
    builder.add_bytes("aggregatePubkey", &aggregate.to_bytes());
    builder.into_bytes()
}

fn header_bytes(slot: u64, state_root: [u8; 32]) -> Vec<u8> {
    let mut builder = Builder::new(&BEACON_BLOCK_HEADER);
    builder.add_u64("slot", slot);
    builder.add_u64("proposerIndex", 1);
    builder.add_bytes("parentRoot", &[0u8; 32]);
    builder.add_bytes("stateRoot", &state_root);
    builder.add_bytes("bodyRoot", &[0u8; 32]);
    builder.into_bytes()
}

/// Build a tiny beacon state whose tree holds the committee root at gindex
/// 55 and the finalized root at gindex 105; return the state root and both
/// branches.
fn mini_state(
    committee_root: [u8; 32],
    finalized_root: [u8; 32],
) -> ([u8; 32], Vec<[u8; 32]>, Vec<[u8; 32]>) {
    fn value(g: u64, cr: &[u8; 32], fr: &[u8; 32]) -> [u8; 32] {
        if g == 55 {
            return *cr;
        }
        if g == 105 {
            return *fr;
        }
        if g >= 128 {
            return [0u8; 32];
        }
        sha256_pair(&value(2 * g, cr, fr), &value(2 * g + 1, cr, fr))
    }
    let root = value(1, &committee_root, &finalized_root);
    let committee_branch = [54u64, 26, 12, 7, 2]
        .iter()
        .map(|&g| value(g, &committee_root, &finalized_root))
        .collect();
    let finality_branch = [104u64, 53, 27, 12, 7, 2]
        .iter()
        .map(|&g| value(g, &committee_root, &finalized_root))
        .collect();
    (root, committee_branch, finality_branch)
}

/// A fully signed update: the committee of `signature_slot`'s period signs
/// an attested header whose state commits to `next_keys`.
fn build_update(signers: &[SecretKey], next_keys: &[SecretKey], signature_slot: u64) -> Vec<u8> {
    let next_committee = committee_bytes(next_keys);
    let committee_root = hash_tree_root(Ob::new(&SYNC_COMMITTEE, &next_committee)).unwrap();

    let finalized = header_bytes(signature_slot - 40, [0u8; 32]);
    let finalized_root = hash_tree_root(Ob::new(&BEACON_BLOCK_HEADER, &finalized)).unwrap();

    let (state_root, committee_branch, finality_branch) =
        mini_state(committee_root, finalized_root);

    let attested = header_bytes(signature_slot - 1, state_root);
    let attested_root = hash_tree_root(Ob::new(&BEACON_BLOCK_HEADER, &attested)).unwrap();

    let spec = ChainSpec::get(CHAIN_ID).unwrap();
    let domain = spec.sync_committee_domain(slot_to_epoch(signature_slot));
    let signing_root = compute_signing_root(&attested_root, &domain);

    let sigs: Vec<_> = signers
        .iter()
        .map(|k| k.sign(&signing_root, BLS_DST, &[]))
        .collect();
    let sig_refs: Vec<_> = sigs.iter().collect();
    let signature = AggregateSignature::aggregate(&sig_refs, false)
        .unwrap()
        .to_signature();

    let mut aggregate = Builder::new(&SYNC_AGGREGATE);
    aggregate.add_bytes("syncCommitteeBits", &[0xff; 64]);
    aggregate.add_bytes("syncCommitteeSignature", &signature.to_bytes());

    let mut update = Builder::new(&LIGHT_CLIENT_UPDATE);
    update.add_bytes("attestedHeader", &attested);
    update.add_bytes("nextSyncCommittee", &next_committee);
    update.add_bytes(
        "nextSyncCommitteeBranch",
        &committee_branch.concat(),
    );
    update.add_bytes("finalizedHeader", &finalized);
    update.add_bytes("finalityBranch", &finality_branch.concat(),
    );
    update.add_builder("syncAggregate", aggregate);
    update.add_u64("signatureSlot", signature_slot);
    update.into_bytes()
}

fn store() -> SyncStore {
    SyncStore::new(Box::new(MemoryStorage::new()), 8)
}

fn period_slot(period: u64) -> u64 {
    period * SLOTS_PER_SYNC_COMMITTEE_PERIOD + 100
}

#[test]
fn applies_a_signed_update() {
    let spec = ChainSpec::get(CHAIN_ID).unwrap();
    let current = committee_keys(1);
    let next = committee_keys(2);

    let mut store = store();
    store
        .insert_committee(CHAIN_ID, 300, &pubkeys_blob(&current))
        .unwrap();

    let update = build_update(&current, &next, period_slot(300));
    let ob = Ob::new(&LIGHT_CLIENT_UPDATE, &update);
    store.apply_updates(&[ob], spec, None).unwrap();

    let state = store.validators(CHAIN_ID, 301);
    assert_eq!(state.last_period, 301);
    assert_eq!(state.pubkeys.unwrap(), pubkeys_blob(&next));
}

#[test]
fn committee_chain_is_monotone() {
    let spec = ChainSpec::get(CHAIN_ID).unwrap();
    let committees: Vec<_> = (1..=4).map(committee_keys).collect();

    let mut store = store();
    store
        .insert_committee(CHAIN_ID, 300, &pubkeys_blob(&committees[0]))
        .unwrap();

    // updates for periods 300..=302, each signed by the previous committee
    let updates: Vec<Vec<u8>> = (0..3)
        .map(|i| {
            build_update(
                &committees[i],
                &committees[i + 1],
                period_slot(300 + i as u64),
            )
        })
        .collect();
    let obs: Vec<Ob> = updates
        .iter()
        .map(|u| Ob::new(&LIGHT_CLIENT_UPDATE, u))
        .collect();
    store.apply_updates(&obs, spec, None).unwrap();

    for (i, keys) in committees.iter().enumerate() {
        let state = store.validators(CHAIN_ID, 300 + i as u64);
        assert_eq!(state.pubkeys.unwrap(), pubkeys_blob(keys), "period {}", 300 + i);
    }
}

#[test]
fn missing_period_is_reported_as_a_range() {
    let spec = ChainSpec::get(CHAIN_ID).unwrap();
    let current = committee_keys(1);
    let next = committee_keys(2);

    let mut store = store();
    store
        .insert_committee(CHAIN_ID, 300, &pubkeys_blob(&current))
        .unwrap();

    // an update signed three periods past our knowledge
    let update = build_update(&next, &committee_keys(3), period_slot(303));
    let ob = Ob::new(&LIGHT_CLIENT_UPDATE, &update);
    match store.apply_updates(&[ob], spec, None) {
        Err(SyncError::MissingPeriods { first, last }) => {
            assert_eq!(first, 301);
            assert_eq!(last, 303);
        }
        other => panic!("expected missing periods, got {other:?}"),
    }
}

#[test]
fn bootstrap_requires_a_matching_anchor() {
    let spec = ChainSpec::get(CHAIN_ID).unwrap();
    let current = committee_keys(1);
    let next = committee_keys(2);
    let update = build_update(&current, &next, period_slot(300));
    let ob = Ob::new(&LIGHT_CLIENT_UPDATE, &update);

    let next_committee = committee_bytes(&next);
    let committee_root = hash_tree_root(Ob::new(&SYNC_COMMITTEE, &next_committee)).unwrap();

    // without an anchor the empty store cannot accept anything
    let mut cold = store();
    assert!(matches!(
        cold.apply_updates(&[ob], spec, None),
        Err(SyncError::MissingPeriods { .. })
    ));

    // a wrong anchor is rejected too
    let mut cold = store();
    let wrong = TrustAnchor {
        period: 301,
        committee_root: [0u8; 32],
    };
    assert!(cold.apply_updates(&[ob], spec, Some(wrong)).is_err());

    // the matching anchor seeds the store
    let mut cold = store();
    let anchor = TrustAnchor {
        period: 301,
        committee_root,
    };
    cold.apply_updates(&[ob], spec, Some(anchor)).unwrap();
    assert!(cold.validators(CHAIN_ID, 301).pubkeys.is_some());
}

#[test]
fn tampered_update_is_rejected() {
    let spec = ChainSpec::get(CHAIN_ID).unwrap();
    let current = committee_keys(1);
    let next = committee_keys(2);

    let mut store = store();
    store
        .insert_committee(CHAIN_ID, 300, &pubkeys_blob(&current))
        .unwrap();

    // flip one byte of the committee branch
    let mut update = build_update(&current, &next, period_slot(300));
    let committee_len = committee_bytes(&next).len();
    update[112 + committee_len + 3] ^= 1;
    let ob = Ob::new(&LIGHT_CLIENT_UPDATE, &update);
    assert!(matches!(
        store.apply_updates(&[ob], spec, None),
        Err(SyncError::InvalidUpdate(_))
    ));

    // flip one bit of the signature
    let mut update = build_update(&current, &next, period_slot(300));
    let len = update.len();
    update[len - 9] ^= 1; // inside syncCommitteeSignature
    let ob = Ob::new(&LIGHT_CLIENT_UPDATE, &update);
    assert!(matches!(
        store.apply_updates(&[ob], spec, None),
        Err(SyncError::SignatureInvalid) | Err(SyncError::Crypto(_))
    ));
}

#[test]
fn sync_advance_only_artifact_verifies() {
    let current = committee_keys(1);
    let next = committee_keys(2);

    let mut store = store();
    store
        .insert_committee(CHAIN_ID, 300, &pubkeys_blob(&current))
        .unwrap();

    // an artifact carrying only sync data: data and proof stay None
    let update = build_update(&current, &next, period_slot(300));
    let mut artifact = Builder::new(&lantern_core::types::PROOF_REQUEST);
    artifact.add_union("data", 0, &[]);
    artifact.add_union("proof", 0, &[]);
    artifact.add_union("sync_data", 1, &update);
    let bytes = artifact.into_bytes();

    let verification = lantern_core::verify_request(
        &mut store,
        &bytes,
        "",
        &serde_json::Value::Null,
        None,
        CHAIN_ID,
    );
    assert!(verification.success, "{:?}", verification.error);
    assert_eq!(
        verification.proof_type,
        lantern_core::ProofType::SyncUpdate
    );
    assert!(store.validators(CHAIN_ID, 301).pubkeys.is_some());
}

#[test]
fn eviction_drops_the_oldest_period() {
    let mut store = SyncStore::new(Box::new(MemoryStorage::new()), 2);
    for period in 300..303 {
        let blob = pubkeys_blob(&committee_keys(period as u8));
        store.insert_committee(CHAIN_ID, period, &blob).unwrap();
    }
    assert!(store.validators(CHAIN_ID, 300).pubkeys.is_none());
    assert!(store.validators(CHAIN_ID, 301).pubkeys.is_some());
    assert!(store.validators(CHAIN_ID, 302).pubkeys.is_some());
    assert_eq!(store.validators(CHAIN_ID, 300).last_period, 302);
}
