//! # Lantern Core
//!
//! Proof verification for Ethereum JSON-RPC results, anchored in the beacon
//! chain.
//!
//! This crate contains **no networking code**. It is the cryptographic heart
//! of Lantern. A verifier consumes a compact [`types::PROOF_REQUEST`]
//! artifact together with the claimed RPC result and accepts it only when
//! every link holds:
//!
//! - **SSZ Merkle proofs** (`ssz` module) thread execution-layer values
//!   (block hash, state root, receipts root, transactions) into the beacon
//!   block body root.
//! - **Patricia-Merkle proofs** (`trie` module) thread accounts, storage
//!   slots and receipts into their execution-layer roots.
//! - **Sync-committee signatures** (`sync` + `verify` modules) anchor the
//!   beacon header itself: 2/3+ of Ethereum's 512-member committee must have
//!   signed it (the same assumption Ethereum itself makes).
//!
//! The companion `lantern-proofer` crate builds these artifacts from
//! standard RPC responses; nothing it produces is trusted here.

pub mod chains;
pub mod crypto;
pub mod eth;
pub mod rlp;
pub mod ssz;
pub mod sync;
pub mod trie;
pub mod types;
pub mod verify;

// Re-export the types nearly every consumer touches.
pub use crypto::{keccak256, sha256};
pub use ssz::{Builder, Def, Ob, SszError};
pub use sync::{FileStorage, MemoryStorage, Storage, SyncStore, TrustAnchor};
pub use verify::{verify_request, verify_with_blockhash, ProofType, Verification, VerifyError};
