//! SSZ descriptors for the beacon-chain structures this crate consumes.
//!
//! The body layout is the Deneb one: the execution payload is field 9 of 12,
//! which is what pins the well-known generalized indices (stateRoot 802,
//! receiptsRoot 803, blockNumber 806, blockHash 812, transactions under
//! 1704984576).

use crate::ssz::{field, Def, Field, BYTE, BYTES20, BYTES32, BYTES48, BYTES96, UINT256, UINT64};

static CHECKPOINT_FIELDS: &[Field] = &[field("epoch", &UINT64), field("root", &BYTES32)];
pub static CHECKPOINT: Def = Def::Container { name: "Checkpoint", fields: CHECKPOINT_FIELDS };

static ATTESTATION_DATA_FIELDS: &[Field] = &[
    field("slot", &UINT64),
    field("index", &UINT64),
    field("beaconBlockRoot", &BYTES32),
    field("source", &CHECKPOINT),
    field("target", &CHECKPOINT),
];
pub static ATTESTATION_DATA: Def = Def::Container {
    name: "AttestationData",
    fields: ATTESTATION_DATA_FIELDS,
};

static VALIDATOR_INDICES: Def = Def::List { elem: &UINT64, max: 2048 };

static INDEXED_ATTESTATION_FIELDS: &[Field] = &[
    field("attestingIndices", &VALIDATOR_INDICES),
    field("data", &ATTESTATION_DATA),
    field("signature", &BYTES96),
];
pub static INDEXED_ATTESTATION: Def = Def::Container {
    name: "IndexedAttestation",
    fields: INDEXED_ATTESTATION_FIELDS,
};

static ATTESTER_SLASHING_FIELDS: &[Field] = &[
    field("attestation1", &INDEXED_ATTESTATION),
    field("attestation2", &INDEXED_ATTESTATION),
];
pub static ATTESTER_SLASHING: Def = Def::Container {
    name: "AttesterSlashing",
    fields: ATTESTER_SLASHING_FIELDS,
};

static AGGREGATION_BITS: Def = Def::BitList { max_bits: 2048 };

static ATTESTATION_FIELDS: &[Field] = &[
    field("aggregationBits", &AGGREGATION_BITS),
    field("data", &ATTESTATION_DATA),
    field("signature", &BYTES96),
];
pub static ATTESTATION: Def = Def::Container {
    name: "Attestation",
    fields: ATTESTATION_FIELDS,
};

static BEACON_BLOCK_HEADER_FIELDS: &[Field] = &[
    field("slot", &UINT64),
    field("proposerIndex", &UINT64),
    field("parentRoot", &BYTES32),
    field("stateRoot", &BYTES32),
    field("bodyRoot", &BYTES32),
];
pub static BEACON_BLOCK_HEADER: Def = Def::Container {
    name: "BeaconBlockHeader",
    fields: BEACON_BLOCK_HEADER_FIELDS,
};

static SIGNED_BEACON_BLOCK_HEADER_FIELDS: &[Field] = &[
    field("message", &BEACON_BLOCK_HEADER),
    field("signature", &BYTES96),
];
pub static SIGNED_BEACON_BLOCK_HEADER: Def = Def::Container {
    name: "SignedBeaconBlockHeader",
    fields: SIGNED_BEACON_BLOCK_HEADER_FIELDS,
};

static PROPOSER_SLASHING_FIELDS: &[Field] = &[
    field("signedHeader1", &SIGNED_BEACON_BLOCK_HEADER),
    field("signedHeader2", &SIGNED_BEACON_BLOCK_HEADER),
];
pub static PROPOSER_SLASHING: Def = Def::Container {
    name: "ProposerSlashing",
    fields: PROPOSER_SLASHING_FIELDS,
};

static DEPOSIT_DATA_FIELDS: &[Field] = &[
    field("pubkey", &BYTES48),
    field("withdrawalCredentials", &BYTES32),
    field("amount", &UINT64),
    field("signature", &BYTES96),
];
pub static DEPOSIT_DATA: Def = Def::Container {
    name: "DepositData",
    fields: DEPOSIT_DATA_FIELDS,
};

static DEPOSIT_PROOF: Def = Def::Vector { elem: &BYTES32, len: 33 };

static DEPOSIT_FIELDS: &[Field] = &[field("proof", &DEPOSIT_PROOF), field("data", &DEPOSIT_DATA)];
pub static DEPOSIT: Def = Def::Container { name: "Deposit", fields: DEPOSIT_FIELDS };

static VOLUNTARY_EXIT_FIELDS: &[Field] = &[
    field("epoch", &UINT64),
    field("validatorIndex", &UINT64),
];
pub static VOLUNTARY_EXIT: Def = Def::Container {
    name: "VoluntaryExit",
    fields: VOLUNTARY_EXIT_FIELDS,
};

static SIGNED_VOLUNTARY_EXIT_FIELDS: &[Field] = &[
    field("message", &VOLUNTARY_EXIT),
    field("signature", &BYTES96),
];
pub static SIGNED_VOLUNTARY_EXIT: Def = Def::Container {
    name: "SignedVoluntaryExit",
    fields: SIGNED_VOLUNTARY_EXIT_FIELDS,
};

static ETH1_DATA_FIELDS: &[Field] = &[
    field("depositRoot", &BYTES32),
    field("depositCount", &UINT64),
    field("blockHash", &BYTES32),
];
pub static ETH1_DATA: Def = Def::Container { name: "Eth1Data", fields: ETH1_DATA_FIELDS };

pub static SYNC_COMMITTEE_BITS: Def = Def::BitVector { bits: 512 };

static SYNC_AGGREGATE_FIELDS: &[Field] = &[
    field("syncCommitteeBits", &SYNC_COMMITTEE_BITS),
    field("syncCommitteeSignature", &BYTES96),
];
pub static SYNC_AGGREGATE: Def = Def::Container {
    name: "SyncAggregate",
    fields: SYNC_AGGREGATE_FIELDS,
};

static BLS_TO_EXECUTION_CHANGE_FIELDS: &[Field] = &[
    field("validatorIndex", &UINT64),
    field("fromBlsPubkey", &BYTES48),
    field("toExecutionAddress", &BYTES20),
];
pub static BLS_TO_EXECUTION_CHANGE: Def = Def::Container {
    name: "BLSToExecutionChange",
    fields: BLS_TO_EXECUTION_CHANGE_FIELDS,
};

static SIGNED_BLS_TO_EXECUTION_CHANGE_FIELDS: &[Field] = &[
    field("message", &BLS_TO_EXECUTION_CHANGE),
    field("signature", &BYTES96),
];
pub static SIGNED_BLS_TO_EXECUTION_CHANGE: Def = Def::Container {
    name: "SignedBLSToExecutionChange",
    fields: SIGNED_BLS_TO_EXECUTION_CHANGE_FIELDS,
};

static WITHDRAWAL_FIELDS: &[Field] = &[
    field("index", &UINT64),
    field("validatorIndex", &UINT64),
    field("address", &BYTES20),
    field("amount", &UINT64),
];
pub static WITHDRAWAL: Def = Def::Container { name: "Withdrawal", fields: WITHDRAWAL_FIELDS };

pub static LOGS_BLOOM: Def = Def::Vector { elem: &BYTE, len: 256 };
pub static EXTRA_DATA: Def = Def::List { elem: &BYTE, max: 32 };

/// One raw execution-layer transaction (opaque bytes).
pub static TRANSACTION_BYTES: Def = Def::List { elem: &BYTE, max: 1_073_741_824 };

pub static TRANSACTIONS: Def = Def::List { elem: &TRANSACTION_BYTES, max: 1_048_576 };
static WITHDRAWALS: Def = Def::List { elem: &WITHDRAWAL, max: 16 };

static EXECUTION_PAYLOAD_FIELDS: &[Field] = &[
    field("parentHash", &BYTES32),
    field("feeRecipient", &BYTES20),
    field("stateRoot", &BYTES32),
    field("receiptsRoot", &BYTES32),
    field("logsBloom", &LOGS_BLOOM),
    field("prevRandao", &BYTES32),
    field("blockNumber", &UINT64),
    field("gasLimit", &UINT64),
    field("gasUsed", &UINT64),
    field("timestamp", &UINT64),
    field("extraData", &EXTRA_DATA),
    field("baseFeePerGas", &UINT256),
    field("blockHash", &BYTES32),
    field("transactions", &TRANSACTIONS),
    field("withdrawals", &WITHDRAWALS),
    field("blobGasUsed", &UINT64),
    field("excessBlobGas", &UINT64),
];
pub static EXECUTION_PAYLOAD: Def = Def::Container {
    name: "ExecutionPayload",
    fields: EXECUTION_PAYLOAD_FIELDS,
};

static PROPOSER_SLASHINGS: Def = Def::List { elem: &PROPOSER_SLASHING, max: 16 };
static ATTESTER_SLASHINGS: Def = Def::List { elem: &ATTESTER_SLASHING, max: 2 };
static ATTESTATIONS: Def = Def::List { elem: &ATTESTATION, max: 128 };
static DEPOSITS: Def = Def::List { elem: &DEPOSIT, max: 16 };
static VOLUNTARY_EXITS: Def = Def::List { elem: &SIGNED_VOLUNTARY_EXIT, max: 16 };
static BLS_CHANGES: Def = Def::List { elem: &SIGNED_BLS_TO_EXECUTION_CHANGE, max: 16 };
static KZG_COMMITMENTS: Def = Def::List { elem: &BYTES48, max: 4096 };

static BEACON_BLOCK_BODY_FIELDS: &[Field] = &[
    field("randaoReveal", &BYTES96),
    field("eth1Data", &ETH1_DATA),
    field("graffiti", &BYTES32),
    field("proposerSlashings", &PROPOSER_SLASHINGS),
    field("attesterSlashings", &ATTESTER_SLASHINGS),
    field("attestations", &ATTESTATIONS),
    field("deposits", &DEPOSITS),
    field("voluntaryExits", &VOLUNTARY_EXITS),
    field("syncAggregate", &SYNC_AGGREGATE),
    field("executionPayload", &EXECUTION_PAYLOAD),
    field("blsToExecutionChanges", &BLS_CHANGES),
    field("blobKzgCommitments", &KZG_COMMITMENTS),
];
pub static BEACON_BLOCK_BODY: Def = Def::Container {
    name: "BeaconBlockBody",
    fields: BEACON_BLOCK_BODY_FIELDS,
};

static BEACON_BLOCK_FIELDS: &[Field] = &[
    field("slot", &UINT64),
    field("proposerIndex", &UINT64),
    field("parentRoot", &BYTES32),
    field("stateRoot", &BYTES32),
    field("body", &BEACON_BLOCK_BODY),
];
pub static BEACON_BLOCK: Def = Def::Container {
    name: "BeaconBlock",
    fields: BEACON_BLOCK_FIELDS,
};

static SIGNED_BEACON_BLOCK_FIELDS: &[Field] = &[
    field("message", &BEACON_BLOCK),
    field("signature", &BYTES96),
];
pub static SIGNED_BEACON_BLOCK: Def = Def::Container {
    name: "SignedBeaconBlock",
    fields: SIGNED_BEACON_BLOCK_FIELDS,
};

static SYNC_COMMITTEE_PUBKEYS: Def = Def::Vector { elem: &BYTES48, len: 512 };

static SYNC_COMMITTEE_FIELDS: &[Field] = &[
    field("pubkeys", &SYNC_COMMITTEE_PUBKEYS),
    field("aggregatePubkey", &BYTES48),
];
pub static SYNC_COMMITTEE: Def = Def::Container {
    name: "SyncCommittee",
    fields: SYNC_COMMITTEE_FIELDS,
};

static NEXT_SYNC_COMMITTEE_BRANCH: Def = Def::Vector { elem: &BYTES32, len: 5 };
static FINALITY_BRANCH: Def = Def::Vector { elem: &BYTES32, len: 6 };

static LIGHT_CLIENT_UPDATE_FIELDS: &[Field] = &[
    field("attestedHeader", &BEACON_BLOCK_HEADER),
    field("nextSyncCommittee", &SYNC_COMMITTEE),
    field("nextSyncCommitteeBranch", &NEXT_SYNC_COMMITTEE_BRANCH),
    field("finalizedHeader", &BEACON_BLOCK_HEADER),
    field("finalityBranch", &FINALITY_BRANCH),
    field("syncAggregate", &SYNC_AGGREGATE),
    field("signatureSlot", &UINT64),
];
pub static LIGHT_CLIENT_UPDATE: Def = Def::Container {
    name: "LightClientUpdate",
    fields: LIGHT_CLIENT_UPDATE_FIELDS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssz::{gindex, PathItem};

    #[test]
    fn test_execution_payload_gindices() {
        assert_eq!(
            gindex(
                &BEACON_BLOCK_BODY,
                &[PathItem::Field("executionPayload"), PathItem::Field("stateRoot")]
            )
            .unwrap(),
            802
        );
        assert_eq!(
            gindex(
                &BEACON_BLOCK_BODY,
                &[PathItem::Field("executionPayload"), PathItem::Field("receiptsRoot")]
            )
            .unwrap(),
            803
        );
        assert_eq!(
            gindex(
                &BEACON_BLOCK_BODY,
                &[PathItem::Field("executionPayload"), PathItem::Field("blockNumber")]
            )
            .unwrap(),
            806
        );
        assert_eq!(
            gindex(
                &BEACON_BLOCK_BODY,
                &[PathItem::Field("executionPayload"), PathItem::Field("blockHash")]
            )
            .unwrap(),
            812
        );
    }

    #[test]
    fn test_transaction_gindices() {
        for i in [0usize, 1, 77] {
            let g = gindex(
                &BEACON_BLOCK_BODY,
                &[
                    PathItem::Field("executionPayload"),
                    PathItem::Field("transactions"),
                    PathItem::Index(i),
                ],
            )
            .unwrap();
            assert_eq!(g, 1_704_984_576 + i as u64);
        }
    }

    #[test]
    fn test_body_field_gindices_distinct() {
        let names = [
            "randaoReveal",
            "eth1Data",
            "graffiti",
            "proposerSlashings",
            "attesterSlashings",
            "attestations",
            "deposits",
            "voluntaryExits",
            "syncAggregate",
            "executionPayload",
            "blsToExecutionChanges",
            "blobKzgCommitments",
        ];
        let mut seen = std::collections::BTreeSet::new();
        for name in names {
            let g = gindex(&BEACON_BLOCK_BODY, &[PathItem::Field(name)]).unwrap();
            assert!(seen.insert(g), "duplicate gindex for {name}");
        }
    }

    #[test]
    fn test_light_client_update_is_fixed_size() {
        assert!(!LIGHT_CLIENT_UPDATE.is_dynamic());
        // header 112, committee 512*48+48, branches 160+192, aggregate 64+96, slot 8
        assert_eq!(
            LIGHT_CLIENT_UPDATE.fixed_length(),
            112 + (512 * 48 + 48) + 160 + 112 + 192 + (64 + 96) + 8
        );
    }
}
