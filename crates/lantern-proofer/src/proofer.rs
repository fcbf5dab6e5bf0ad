//! The proofer context: a resumable computation.
//!
//! `execute()` makes maximal progress, then reports `Pending` while any
//! data request lacks a response. The host serves the open requests (in any
//! order, possibly concurrently) and re-invokes `execute()`; builders are
//! pure functions of their inputs and the request store, so re-entry
//! converges onto the same computation.

use log::debug;
use serde_json::Value;
use thiserror::Error;

use lantern_core::eth::EthError;
use lantern_core::ssz::SszError;
use lantern_core::trie::TrieError;

use crate::methods;
use crate::state::{DataRequest, State};

/// Errors a proof construction can end with.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Rpc(String),

    #[error("unsupported method {0}")]
    UnsupportedMethod(String),

    #[error("beacon lookup failed: {0}")]
    Beacon(String),

    #[error(transparent)]
    Ssz(#[from] SszError),

    #[error(transparent)]
    Trie(#[from] TrieError),

    #[error(transparent)]
    Eth(#[from] EthError),
}

/// Why a builder stopped short of producing a proof.
#[derive(Debug)]
pub enum Interrupt {
    /// At least one data request has no response yet.
    Pending,
    /// The computation failed for good.
    Failed(ProofError),
}

impl From<ProofError> for Interrupt {
    fn from(e: ProofError) -> Self {
        Interrupt::Failed(e)
    }
}

impl From<SszError> for Interrupt {
    fn from(e: SszError) -> Self {
        Interrupt::Failed(ProofError::Ssz(e))
    }
}

impl From<TrieError> for Interrupt {
    fn from(e: TrieError) -> Self {
        Interrupt::Failed(ProofError::Trie(e))
    }
}

impl From<EthError> for Interrupt {
    fn from(e: EthError) -> Self {
        Interrupt::Failed(ProofError::Eth(e))
    }
}

/// Result of one step of a resumable builder.
pub type Step<T> = Result<T, Interrupt>;

/// What `execute()` reports to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The proof artifact is ready.
    Success,
    /// Data requests are waiting for responses.
    Pending,
    /// Proof construction failed; see `error()`.
    Error,
}

/// A proof construction in progress.
pub struct ProoferCtx {
    pub method: String,
    pub params: Value,
    pub chain_id: u64,
    pub state: State,
    proof: Option<Vec<u8>>,
    error: Option<String>,
}

impl ProoferCtx {
    /// Create a context for one JSON-RPC request. `params` must be the JSON
    /// array of the request's parameters.
    pub fn new(method: &str, params: &str, chain_id: u64) -> Result<Self, ProofError> {
        let params: Value = serde_json::from_str(params)
            .map_err(|e| ProofError::InvalidInput(format!("params: {e}")))?;
        if !params.is_array() {
            return Err(ProofError::InvalidInput("params must be a JSON array".into()));
        }
        Ok(ProoferCtx {
            method: method.to_string(),
            params,
            chain_id,
            state: State::new(),
            proof: None,
            error: None,
        })
    }

    /// Make maximal progress on the proof.
    pub fn execute(&mut self) -> Status {
        if self.state.pending().is_some() {
            return Status::Pending;
        }
        if self.error.is_some() {
            return Status::Error;
        }
        if self.proof.is_some() {
            return Status::Success;
        }

        let method = self.method.clone();
        let result = match method.as_str() {
            "eth_getBlockByNumber" => methods::blockhash::prove(self),
            "eth_getBalance" | "eth_getTransactionCount" | "eth_getStorageAt" => {
                methods::account::prove(self)
            }
            "eth_getTransactionByHash" => methods::transaction::prove(self),
            "eth_getTransactionReceipt" => methods::receipt::prove(self),
            "eth_getLogs" => methods::logs::prove(self),
            other => Err(ProofError::UnsupportedMethod(other.to_string()).into()),
        };

        match result {
            Ok(proof) => {
                debug!("{method}: proof of {} bytes", proof.len());
                self.proof = Some(proof);
                Status::Success
            }
            Err(Interrupt::Pending) => Status::Pending,
            Err(Interrupt::Failed(e)) => {
                self.error = Some(e.to_string());
                Status::Error
            }
        }
    }

    /// Current status without making progress.
    pub fn status(&self) -> Status {
        if self.error.is_some() {
            Status::Error
        } else if self.proof.is_some() {
            Status::Success
        } else {
            Status::Pending
        }
    }

    /// The finished artifact, once `execute()` reported success.
    pub fn proof(&self) -> Option<&[u8]> {
        self.proof.as_deref()
    }

    /// The terminal error, once `execute()` reported failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The requests the host still has to serve.
    pub fn open_requests(&mut self) -> impl Iterator<Item = &mut DataRequest> {
        self.state.open_requests()
    }
}
