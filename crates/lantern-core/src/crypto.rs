use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Errors from the cryptographic primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid BLS public key at index {index}: {reason}")]
    InvalidPublicKey { index: usize, reason: String },

    #[error("invalid BLS signature encoding: {reason}")]
    InvalidSignature { reason: String },

    #[error("aggregate signature does not verify against the participating keys")]
    SignatureMismatch,

    #[error("BLS aggregation failed: {reason}")]
    Aggregation { reason: String },

    #[error("no participating public keys")]
    NoParticipants,
}

/// DST (domain separation tag) for Ethereum beacon-chain BLS signatures.
const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// The keccak256 hash of empty bytes, the code hash of accounts without code.
pub const EMPTY_CODE_HASH: [u8; 32] = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
    0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
    0xa4, 0x70,
];

/// The root of an empty Merkle-Patricia trie.
pub const EMPTY_TRIE_ROOT: [u8; 32] = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
    0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
    0xb4, 0x21,
];

/// SHA256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// SHA256 hash of two 32-byte nodes concatenated, the SSZ Merkle combiner.
pub fn sha256_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(a);
    data[32..].copy_from_slice(b);
    sha256(&data)
}

/// Compute keccak256 hash of data, the execution-layer hash.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Verify an aggregate BLS12-381 signature over one message (FastAggregateVerify).
///
/// We verify one aggregate signature instead of up to 512 individual ones.
/// The pubkeys are the compressed G1 points of the participating committee
/// members, in committee order.
pub fn bls_fast_aggregate_verify(
    pubkeys: &[&[u8; 48]],
    message: &[u8; 32],
    signature: &[u8; 96],
) -> Result<(), CryptoError> {
    use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
    use blst::BLST_ERROR;

    if pubkeys.is_empty() {
        return Err(CryptoError::NoParticipants);
    }

    let sig = Signature::from_bytes(signature).map_err(|e| CryptoError::InvalidSignature {
        reason: format!("{:?}", e),
    })?;

    let pks: Vec<PublicKey> = pubkeys
        .iter()
        .enumerate()
        .map(|(i, pk)| {
            PublicKey::from_bytes(&pk[..]).map_err(|e| CryptoError::InvalidPublicKey {
                index: i,
                reason: format!("{:?}", e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pk_refs: Vec<&PublicKey> = pks.iter().collect();
    let agg = AggregatePublicKey::aggregate(&pk_refs, false).map_err(|e| {
        CryptoError::Aggregation {
            reason: format!("{:?}", e),
        }
    })?;
    let agg_pk = agg.to_public_key();

    let result = sig.verify(false, message, BLS_DST, &[], &agg_pk, false);
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(CryptoError::SignatureMismatch);
    }

    Ok(())
}
