//! Per-chain beacon parameters: fork schedules, genesis validators roots and
//! the signing-domain math used for sync-committee signatures.

use crate::crypto::sha256_pair;

/// Number of validators in the sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Compressed BLS12-381 public key length.
pub const BLS_PUBKEY_LEN: usize = 48;

/// Minimum participants for a valid sync aggregate (2/3 of 512).
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: usize = 342;

pub const SLOTS_PER_EPOCH: u64 = 32;
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 = SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

/// Domain type for sync committee signatures.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

pub fn slot_to_epoch(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

pub fn slot_to_period(slot: u64) -> u64 {
    slot / SLOTS_PER_SYNC_COMMITTEE_PERIOD
}

/// A fork activation: every epoch at or past `epoch` signs with `version`.
pub struct Fork {
    pub epoch: u64,
    pub version: [u8; 4],
}

/// Static beacon parameters of one chain.
pub struct ChainSpec {
    pub chain_id: u64,
    pub genesis_validators_root: [u8; 32],
    /// Ascending by activation epoch.
    pub forks: &'static [Fork],
}

static MAINNET: ChainSpec = ChainSpec {
    chain_id: 1,
    genesis_validators_root: [
        0x4b, 0x36, 0x3d, 0xb9, 0x4e, 0x28, 0x61, 0x20, 0xd7, 0x6e, 0xb9, 0x05, 0x34, 0x0f,
        0xdd, 0x4e, 0x54, 0xbf, 0xe9, 0xf0, 0x6b, 0xf3, 0x3f, 0xf6, 0xcf, 0x5a, 0xd2, 0x7f,
        0x51, 0x1b, 0xfe, 0x95,
    ],
    forks: &[
        Fork { epoch: 0, version: [0x00, 0x00, 0x00, 0x00] },
        Fork { epoch: 74_240, version: [0x01, 0x00, 0x00, 0x00] },
        Fork { epoch: 144_896, version: [0x02, 0x00, 0x00, 0x00] },
        Fork { epoch: 194_048, version: [0x03, 0x00, 0x00, 0x00] },
        Fork { epoch: 269_568, version: [0x04, 0x00, 0x00, 0x00] },
    ],
};

static SEPOLIA: ChainSpec = ChainSpec {
    chain_id: 11_155_111,
    genesis_validators_root: [
        0xd8, 0xea, 0x17, 0x1f, 0x3c, 0x94, 0xae, 0xa2, 0x1e, 0xbc, 0x42, 0xa1, 0xed, 0x61,
        0x05, 0x2a, 0xcf, 0x3f, 0x92, 0x09, 0xc0, 0x0e, 0x4e, 0xfb, 0xaa, 0xdd, 0xac, 0x09,
        0xed, 0x9b, 0x80, 0x78,
    ],
    forks: &[
        Fork { epoch: 0, version: [0x90, 0x00, 0x00, 0x69] },
        Fork { epoch: 50, version: [0x90, 0x00, 0x00, 0x70] },
        Fork { epoch: 100, version: [0x90, 0x00, 0x00, 0x71] },
        Fork { epoch: 56_832, version: [0x90, 0x00, 0x00, 0x72] },
        Fork { epoch: 132_608, version: [0x90, 0x00, 0x00, 0x73] },
    ],
};

impl ChainSpec {
    /// Look up the static parameters of a supported chain.
    pub fn get(chain_id: u64) -> Option<&'static ChainSpec> {
        match chain_id {
            1 => Some(&MAINNET),
            11_155_111 => Some(&SEPOLIA),
            _ => None,
        }
    }

    /// Fork version active at the given epoch.
    pub fn fork_version_at(&self, epoch: u64) -> [u8; 4] {
        let mut version = self.forks[0].version;
        for fork in self.forks {
            if epoch >= fork.epoch {
                version = fork.version;
            }
        }
        version
    }

    /// Signing domain for sync committee signatures at the given epoch.
    /// domain = domain_type ++ fork_data_root[..28]
    pub fn sync_committee_domain(&self, epoch: u64) -> [u8; 32] {
        let fork_data_root = compute_fork_data_root(
            &self.fork_version_at(epoch),
            &self.genesis_validators_root,
        );
        let mut domain = [0u8; 32];
        domain[..4].copy_from_slice(&DOMAIN_SYNC_COMMITTEE);
        domain[4..].copy_from_slice(&fork_data_root[..28]);
        domain
    }
}

/// hash_tree_root of ForkData { current_version, genesis_validators_root }.
fn compute_fork_data_root(version: &[u8; 4], genesis_validators_root: &[u8; 32]) -> [u8; 32] {
    let mut version_leaf = [0u8; 32];
    version_leaf[..4].copy_from_slice(version);
    sha256_pair(&version_leaf, genesis_validators_root)
}

/// What the sync committee actually signs: not the header root directly but
/// hash_tree_root(SigningData { object_root, domain }).
pub fn compute_signing_root(object_root: &[u8; 32], domain: &[u8; 32]) -> [u8; 32] {
    sha256_pair(object_root, domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_math() {
        assert_eq!(slot_to_epoch(64), 2);
        assert_eq!(slot_to_period(0), 0);
        assert_eq!(slot_to_period(8191), 0);
        assert_eq!(slot_to_period(8192), 1);
    }

    #[test]
    fn test_fork_version_boundaries() {
        let spec = ChainSpec::get(1).unwrap();
        assert_eq!(spec.fork_version_at(0), [0x00, 0x00, 0x00, 0x00]);
        assert_eq!(spec.fork_version_at(74_239), [0x00, 0x00, 0x00, 0x00]);
        assert_eq!(spec.fork_version_at(74_240), [0x01, 0x00, 0x00, 0x00]);
        assert_eq!(spec.fork_version_at(1_000_000), [0x04, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_domain_shape() {
        let spec = ChainSpec::get(1).unwrap();
        let domain = spec.sync_committee_domain(300_000);
        assert_eq!(&domain[..4], &DOMAIN_SYNC_COMMITTEE);
        assert_eq!(domain, spec.sync_committee_domain(300_000));
        assert_ne!(domain, spec.sync_committee_domain(0));
    }

    #[test]
    fn test_unknown_chain() {
        assert!(ChainSpec::get(424242).is_none());
    }
}
