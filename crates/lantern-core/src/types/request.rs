//! The proof artifact exchanged between proofer and verifier.
//!
//! `ProofRequest` is a container of three unions. The variant numbering is
//! part of the wire format and must never change:
//!
//! * `data`:      {0 None, 1 BlockHash, 2 Balance, 3 TransactionHash, 4 Receipt}
//! * `proof`:     {0 None, 1 BlockHashProof, 2 AccountProof, 3 TransactionProof,
//!                  4 ReceiptProof, 5 LogsProof}
//! * `sync_data`: {0 None, 1 LightClientUpdateList}

use super::beacon::{
    BEACON_BLOCK_HEADER, LIGHT_CLIENT_UPDATE, SYNC_COMMITTEE_BITS, TRANSACTION_BYTES,
};
use crate::ssz::{field, Def, Field, BYTE, BYTES20, BYTES32, BYTES96, NONE, UINT32, UINT64};

/// One RLP-encoded trie node inside a Patricia proof.
pub static TRIE_NODE: Def = Def::List { elem: &BYTE, max: 1024 };

static TRIE_NODES_256: Def = Def::List { elem: &TRIE_NODE, max: 256 };
static TRIE_NODES_64: Def = Def::List { elem: &TRIE_NODE, max: 64 };

/// Sibling chunks of an SSZ multi-proof.
static MERKLE_CHUNKS: Def = Def::List { elem: &BYTES32, max: 256 };

// The blockhash proof carries everything needed to anchor an execution block
// hash under a signed beacon header; other proofs embed the same tail.
static BLOCK_HASH_PROOF_FIELDS: &[Field] = &[
    field("blockhashProof", &MERKLE_CHUNKS),
    field("header", &BEACON_BLOCK_HEADER),
    field("syncCommitteeBits", &SYNC_COMMITTEE_BITS),
    field("syncCommitteeSignature", &BYTES96),
];
pub static BLOCK_HASH_PROOF: Def = Def::Container {
    name: "BlockHashProof",
    fields: BLOCK_HASH_PROOF_FIELDS,
};

static STATE_PROOF_FIELDS: &[Field] = &[
    field("stateProof", &MERKLE_CHUNKS),
    field("header", &BEACON_BLOCK_HEADER),
    field("syncCommitteeBits", &SYNC_COMMITTEE_BITS),
    field("syncCommitteeSignature", &BYTES96),
];
pub static STATE_PROOF: Def = Def::Container {
    name: "StateProof",
    fields: STATE_PROOF_FIELDS,
};

static STORAGE_PROOF_FIELDS: &[Field] = &[
    field("key", &BYTES32),
    field("proof", &TRIE_NODES_64),
    field("value", &BYTES32),
];
pub static STORAGE_PROOF: Def = Def::Container {
    name: "StorageProof",
    fields: STORAGE_PROOF_FIELDS,
};

static STORAGE_PROOFS: Def = Def::List { elem: &STORAGE_PROOF, max: 256 };

static ACCOUNT_PROOF_FIELDS: &[Field] = &[
    field("accountProof", &TRIE_NODES_256),
    field("address", &BYTES20),
    field("balance", &BYTES32),
    field("codeHash", &BYTES32),
    field("nonce", &BYTES32),
    field("storageHash", &BYTES32),
    field("storageProof", &STORAGE_PROOFS),
    field("stateProof", &STATE_PROOF),
];
pub static ACCOUNT_PROOF: Def = Def::Container {
    name: "AccountProof",
    fields: ACCOUNT_PROOF_FIELDS,
};

static TRANSACTION_PROOF_FIELDS: &[Field] = &[
    field("transaction", &TRANSACTION_BYTES),
    field("transactionIndex", &UINT32),
    field("blockNumber", &UINT64),
    field("blockHash", &BYTES32),
    field("proof", &MERKLE_CHUNKS),
    field("header", &BEACON_BLOCK_HEADER),
    field("syncCommitteeBits", &SYNC_COMMITTEE_BITS),
    field("syncCommitteeSignature", &BYTES96),
];
pub static TRANSACTION_PROOF: Def = Def::Container {
    name: "TransactionProof",
    fields: TRANSACTION_PROOF_FIELDS,
};

static RECEIPT_PROOF_FIELDS: &[Field] = &[
    field("transactionIndex", &UINT32),
    field("blockNumber", &UINT64),
    field("blockHash", &BYTES32),
    field("receiptProof", &TRIE_NODES_64),
    field("proof", &MERKLE_CHUNKS),
    field("header", &BEACON_BLOCK_HEADER),
    field("syncCommitteeBits", &SYNC_COMMITTEE_BITS),
    field("syncCommitteeSignature", &BYTES96),
];
pub static RECEIPT_PROOF: Def = Def::Container {
    name: "ReceiptProof",
    fields: RECEIPT_PROOF_FIELDS,
};

static LOGS_RECEIPT_FIELDS: &[Field] = &[
    field("txIndex", &UINT32),
    field("txHash", &BYTES32),
    field("proof", &TRIE_NODES_64),
];
pub static LOGS_RECEIPT: Def = Def::Container {
    name: "LogsReceipt",
    fields: LOGS_RECEIPT_FIELDS,
};

static LOGS_RECEIPTS: Def = Def::List { elem: &LOGS_RECEIPT, max: 256 };

static LOGS_BLOCK_PROOF_FIELDS: &[Field] = &[
    field("blockNumber", &UINT64),
    field("blockHash", &BYTES32),
    field("proof", &MERKLE_CHUNKS),
    field("header", &BEACON_BLOCK_HEADER),
    field("syncCommitteeBits", &SYNC_COMMITTEE_BITS),
    field("syncCommitteeSignature", &BYTES96),
    field("receipts", &LOGS_RECEIPTS),
];
pub static LOGS_BLOCK_PROOF: Def = Def::Container {
    name: "LogsBlockProof",
    fields: LOGS_BLOCK_PROOF_FIELDS,
};

pub static LOGS_PROOF: Def = Def::List { elem: &LOGS_BLOCK_PROOF, max: 256 };

/// Canonical receipt RLP can carry many logs.
static RECEIPT_BYTES: Def = Def::List { elem: &BYTE, max: 1 << 20 };

static DATA_UNION_VARIANTS: &[Field] = &[
    field("none", &NONE),
    field("blockhash", &BYTES32),
    field("balance", &BYTES32),
    field("transactionHash", &BYTES32),
    field("receipt", &RECEIPT_BYTES),
];
pub static DATA_UNION: Def = Def::Union {
    name: "Data",
    variants: DATA_UNION_VARIANTS,
};

static PROOF_UNION_VARIANTS: &[Field] = &[
    field("none", &NONE),
    field("BlockHashProof", &BLOCK_HASH_PROOF),
    field("AccountProof", &ACCOUNT_PROOF),
    field("TransactionProof", &TRANSACTION_PROOF),
    field("ReceiptProof", &RECEIPT_PROOF),
    field("LogsProof", &LOGS_PROOF),
];
pub static PROOF_UNION: Def = Def::Union {
    name: "Proof",
    variants: PROOF_UNION_VARIANTS,
};

static LIGHT_CLIENT_UPDATES: Def = Def::List { elem: &LIGHT_CLIENT_UPDATE, max: 512 };

static SYNC_UNION_VARIANTS: &[Field] = &[
    field("none", &NONE),
    field("LightClientUpdateList", &LIGHT_CLIENT_UPDATES),
];
pub static SYNC_UNION: Def = Def::Union {
    name: "SyncData",
    variants: SYNC_UNION_VARIANTS,
};

static PROOF_REQUEST_FIELDS: &[Field] = &[
    field("data", &DATA_UNION),
    field("proof", &PROOF_UNION),
    field("sync_data", &SYNC_UNION),
];
pub static PROOF_REQUEST: Def = Def::Container {
    name: "ProofRequest",
    fields: PROOF_REQUEST_FIELDS,
};

/// Fixed selector values of the `data` union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataVariant {
    None = 0,
    BlockHash = 1,
    Balance = 2,
    TransactionHash = 3,
    Receipt = 4,
}

/// Fixed selector values of the `proof` union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProofVariant {
    None = 0,
    BlockHash = 1,
    Account = 2,
    Transaction = 3,
    Receipt = 4,
    Logs = 5,
}

impl ProofVariant {
    pub fn from_selector(selector: usize) -> Option<ProofVariant> {
        match selector {
            0 => Some(ProofVariant::None),
            1 => Some(ProofVariant::BlockHash),
            2 => Some(ProofVariant::Account),
            3 => Some(ProofVariant::Transaction),
            4 => Some(ProofVariant::Receipt),
            5 => Some(ProofVariant::Logs),
            _ => None,
        }
    }
}

/// Fixed selector values of the `sync_data` union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncVariant {
    None = 0,
    LightClientUpdates = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    // The selector enums are the canonical table; the descriptor arrays must
    // agree with them position by position.
    #[test]
    fn test_proof_union_matches_canonical_table() {
        let Def::Union { variants, .. } = &PROOF_UNION else {
            panic!("proof union descriptor");
        };
        assert_eq!(variants.len(), 6);
        assert_eq!(variants[ProofVariant::None as usize].name, "none");
        assert_eq!(variants[ProofVariant::BlockHash as usize].name, "BlockHashProof");
        assert_eq!(variants[ProofVariant::Account as usize].name, "AccountProof");
        assert_eq!(
            variants[ProofVariant::Transaction as usize].name,
            "TransactionProof"
        );
        assert_eq!(variants[ProofVariant::Receipt as usize].name, "ReceiptProof");
        assert_eq!(variants[ProofVariant::Logs as usize].name, "LogsProof");
    }

    #[test]
    fn test_data_union_matches_canonical_table() {
        let Def::Union { variants, .. } = &DATA_UNION else {
            panic!("data union descriptor");
        };
        assert_eq!(variants.len(), 5);
        assert_eq!(variants[DataVariant::BlockHash as usize].name, "blockhash");
        assert_eq!(variants[DataVariant::Balance as usize].name, "balance");
        assert_eq!(
            variants[DataVariant::TransactionHash as usize].name,
            "transactionHash"
        );
        assert_eq!(variants[DataVariant::Receipt as usize].name, "receipt");
    }

    #[test]
    fn test_sync_union_matches_canonical_table() {
        let Def::Union { variants, .. } = &SYNC_UNION else {
            panic!("sync union descriptor");
        };
        assert_eq!(variants.len(), 2);
        assert_eq!(
            variants[SyncVariant::LightClientUpdates as usize].name,
            "LightClientUpdateList"
        );
    }

    #[test]
    fn test_request_container_shape() {
        // three unions, one offset slot each
        assert_eq!(crate::ssz::fixed_region(PROOF_REQUEST_FIELDS), 12);
        assert!(PROOF_REQUEST.is_dynamic());
    }
}
