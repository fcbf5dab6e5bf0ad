//! The verification pipeline.
//!
//! Entry points parse a `ProofRequest` artifact, apply any carried sync-data
//! updates, then dispatch on the proof union variant. No step trusts the RPC
//! that produced the artifact: every claimed value is threaded through
//! Merkle, Patricia and signature checks up to a sync-committee-signed
//! beacon header.

mod account;
mod blockhash;
mod logs;
mod receipt;
mod signature;
mod transaction;

use log::debug;
use serde_json::Value;
use thiserror::Error;

use crate::chains::ChainSpec;
use crate::crypto::CryptoError;
use crate::eth::EthError;
use crate::ssz::{encode_union, Ob, SszError};
use crate::sync::{SyncError, SyncStore};
use crate::trie::TrieError;
use crate::types::{DataVariant, ProofVariant, SyncVariant, DATA_UNION, PROOF_REQUEST};

/// gindex of `executionPayload.stateRoot` in the block body.
pub const GINDEX_STATE_ROOT: u64 = 802;
/// gindex of `executionPayload.receiptsRoot` in the block body.
pub const GINDEX_RECEIPTS_ROOT: u64 = 803;
/// gindex of `executionPayload.blockNumber` in the block body.
pub const GINDEX_BLOCK_NUMBER: u64 = 806;
/// gindex of `executionPayload.blockHash` in the block body.
pub const GINDEX_BLOCK_HASH: u64 = 812;
/// gindex of `executionPayload.transactions[0]` in the block body.
pub const GINDEX_FIRST_TRANSACTION: u64 = 1_704_984_576;

/// What kind of proof a verification ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofType {
    None,
    BeaconHeader,
    Account,
    Transaction,
    Receipt,
    Logs,
    SyncUpdate,
}

/// Errors a verification can end with.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("invalid proof: {0}")]
    Proof(String),

    #[error("sync committee signature does not verify")]
    Signature,

    #[error("missing sync committee periods {first}..={last}")]
    MissingSyncPeriod { first: u64, last: u64 },

    #[error("proof is not a supported proof type (selector {0})")]
    Unsupported(usize),
}

impl From<SszError> for VerifyError {
    fn from(e: SszError) -> Self {
        VerifyError::Proof(e.to_string())
    }
}

impl From<TrieError> for VerifyError {
    fn from(e: TrieError) -> Self {
        VerifyError::Proof(e.to_string())
    }
}

impl From<CryptoError> for VerifyError {
    fn from(e: CryptoError) -> Self {
        VerifyError::Proof(e.to_string())
    }
}

impl From<EthError> for VerifyError {
    fn from(e: EthError) -> Self {
        VerifyError::Proof(e.to_string())
    }
}

impl From<SyncError> for VerifyError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::MissingPeriods { first, last } => {
                VerifyError::MissingSyncPeriod { first, last }
            }
            SyncError::SignatureInvalid => VerifyError::Signature,
            other => VerifyError::Proof(other.to_string()),
        }
    }
}

/// Outcome of one verification.
#[derive(Debug)]
pub struct Verification {
    pub success: bool,
    pub proof_type: ProofType,
    pub error: Option<VerifyError>,
    pub first_missing_period: Option<u64>,
    pub last_missing_period: Option<u64>,
}

impl Verification {
    fn failure(proof_type: ProofType, error: VerifyError) -> Self {
        let (first, last) = match error {
            VerifyError::MissingSyncPeriod { first, last } => (Some(first), Some(last)),
            _ => (None, None),
        };
        Verification {
            success: false,
            proof_type,
            error: Some(error),
            first_missing_period: first,
            last_missing_period: last,
        }
    }
}

pub(crate) struct Ctx<'a> {
    pub store: &'a mut SyncStore,
    pub spec: &'static ChainSpec,
    pub method: &'a str,
    pub args: &'a Value,
    pub claimed: Option<&'a Value>,
    pub data: Ob<'a>,
}

/// Verify an artifact against the claimed result of a JSON-RPC call.
///
/// `args` are the original request parameters; `claimed` is the JSON result
/// the RPC reported, for methods whose result is a JSON document (receipts,
/// transactions, logs).
pub fn verify_request(
    store: &mut SyncStore,
    request: &[u8],
    method: &str,
    args: &Value,
    claimed: Option<&Value>,
    chain_id: u64,
) -> Verification {
    match run(store, request, method, args, claimed, chain_id, None) {
        Ok(proof_type) => Verification {
            success: true,
            proof_type,
            error: None,
            first_missing_period: None,
            last_missing_period: None,
        },
        Err((proof_type, error)) => Verification::failure(proof_type, error),
    }
}

/// Verify an artifact against an externally supplied block hash, which is
/// injected as the claimed data (union variant 1).
pub fn verify_with_blockhash(
    store: &mut SyncStore,
    request: &[u8],
    blockhash: [u8; 32],
    chain_id: u64,
) -> Verification {
    let data = encode_union(DataVariant::BlockHash as u8, &blockhash);
    match run(
        store,
        request,
        "eth_getBlockByNumber",
        &Value::Null,
        None,
        chain_id,
        Some(&data),
    ) {
        Ok(proof_type) => Verification {
            success: true,
            proof_type,
            error: None,
            first_missing_period: None,
            last_missing_period: None,
        },
        Err((proof_type, error)) => Verification::failure(proof_type, error),
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    store: &mut SyncStore,
    request: &[u8],
    method: &str,
    args: &Value,
    claimed: Option<&Value>,
    chain_id: u64,
    data_override: Option<&[u8]>,
) -> Result<ProofType, (ProofType, VerifyError)> {
    let fail = |e: VerifyError| (ProofType::None, e);

    let spec = ChainSpec::get(chain_id)
        .ok_or_else(|| fail(VerifyError::Input(format!("unsupported chain id {chain_id}"))))?;

    let req = Ob::new(&PROOF_REQUEST, request);
    req.validate()
        .map_err(|e| fail(VerifyError::Input(format!("malformed request: {e}"))))?;

    let data = match data_override {
        Some(bytes) => Ob::new(&DATA_UNION, bytes),
        None => req.get("data").map_err(|e| fail(e.into()))?,
    };
    let proof = req.get("proof").map_err(|e| fail(e.into()))?;
    let sync_data = req.get("sync_data").map_err(|e| fail(e.into()))?;

    // sync data first: it may supply exactly the committees the proof needs
    let (sync_selector, sync_inner) = sync_data.union().map_err(|e| fail(e.into()))?;
    if sync_selector == SyncVariant::LightClientUpdates as usize {
        let mut updates = Vec::with_capacity(sync_inner.len());
        for i in 0..sync_inner.len() {
            updates.push(sync_inner.at(i).map_err(|e| fail(e.into()))?);
        }
        debug!("applying {} light client updates", updates.len());
        store
            .apply_updates(&updates, spec, None)
            .map_err(|e| (ProofType::SyncUpdate, e.into()))?;
    }

    let (proof_selector, proof_inner) = proof.union().map_err(|e| fail(e.into()))?;
    let variant = ProofVariant::from_selector(proof_selector)
        .ok_or_else(|| fail(VerifyError::Unsupported(proof_selector)))?;

    let mut ctx = Ctx {
        store,
        spec,
        method,
        args,
        claimed,
        data,
    };

    match variant {
        ProofVariant::BlockHash => blockhash::verify(&mut ctx, proof_inner)
            .map(|()| ProofType::BeaconHeader)
            .map_err(|e| (ProofType::BeaconHeader, e)),
        ProofVariant::Account => account::verify(&mut ctx, proof_inner)
            .map(|()| ProofType::Account)
            .map_err(|e| (ProofType::Account, e)),
        ProofVariant::Transaction => transaction::verify(&mut ctx, proof_inner)
            .map(|()| ProofType::Transaction)
            .map_err(|e| (ProofType::Transaction, e)),
        ProofVariant::Receipt => receipt::verify(&mut ctx, proof_inner)
            .map(|()| ProofType::Receipt)
            .map_err(|e| (ProofType::Receipt, e)),
        ProofVariant::Logs => logs::verify(&mut ctx, proof_inner)
            .map(|()| ProofType::Logs)
            .map_err(|e| (ProofType::Logs, e)),
        ProofVariant::None => {
            let (data_selector, _) = data.union().map_err(|e| fail(e.into()))?;
            if sync_selector != SyncVariant::None as usize
                && data_selector == DataVariant::None as usize
            {
                // a pure sync-state update
                Ok(ProofType::SyncUpdate)
            } else {
                Err(fail(VerifyError::Unsupported(proof_selector)))
            }
        }
    }
}

/// Collect the trie nodes of a `List[TrieNode]` proof field.
pub(crate) fn trie_nodes(list: &Ob) -> Result<Vec<Vec<u8>>, VerifyError> {
    let mut nodes = Vec::with_capacity(list.len());
    for i in 0..list.len() {
        nodes.push(list.at(i)?.as_bytes().to_vec());
    }
    Ok(nodes)
}

/// A u64 as its 32-byte SSZ leaf (little-endian, zero-padded).
pub(crate) fn u64_leaf(value: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&value.to_le_bytes());
    leaf
}
