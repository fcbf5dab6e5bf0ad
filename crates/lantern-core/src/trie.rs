//! Merkle-Patricia trie proof verification and reconstruction.
//!
//! Verification walks the nibble path of `keccak256(key)` through the
//! supplied proof nodes: every 32-byte pointer must equal the keccak of the
//! next supplied node, nodes shorter than 32 bytes embed directly in their
//! parent. Reconstruction builds a small in-memory trie keyed the same way,
//! so the proofer can rebuild a receipts trie and extract proofs from it.

use thiserror::Error;

use crate::crypto::{keccak256, EMPTY_TRIE_ROOT};
use crate::rlp::{self, Item};

/// Errors during trie proof verification.
#[derive(Debug, Error)]
pub enum TrieError {
    #[error("empty proof: no trie nodes provided")]
    EmptyProof,

    #[error("proof node {index} does not hash to its reference")]
    HashMismatch { index: usize },

    #[error("invalid RLP in proof node {index}: {reason}")]
    InvalidRlp { index: usize, reason: String },

    #[error("invalid trie node at depth {depth}: {got}")]
    BadNode { depth: usize, got: String },

    #[error("proof path incomplete after {0} nodes")]
    Incomplete(usize),
}

fn nibbles_of(bytes: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    for byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    nibbles
}

/// Decode hex-prefix (compact) encoding. Returns (nibbles, is_leaf).
fn decode_compact(encoded: &[u8]) -> (Vec<u8>, bool) {
    if encoded.is_empty() {
        return (Vec::new(), false);
    }
    let flag = encoded[0] >> 4;
    let is_leaf = flag >= 2;
    let mut nibbles = Vec::new();
    if flag % 2 == 1 {
        nibbles.push(encoded[0] & 0x0f);
    }
    for &byte in &encoded[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    (nibbles, is_leaf)
}

/// Encode nibbles in hex-prefix (compact) form.
fn encode_compact(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let mut flag: u8 = if is_leaf { 2 } else { 0 };
    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);
    let rest = if nibbles.len() % 2 == 1 {
        flag += 1;
        out.push((flag << 4) | nibbles[0]);
        &nibbles[1..]
    } else {
        out.push(flag << 4);
        nibbles
    };
    for pair in rest.chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }
    out
}

fn list_payload(node: &[u8], index: usize) -> Result<&[u8], TrieError> {
    let (item, rest) = rlp::decode(node).map_err(|e| TrieError::InvalidRlp {
        index,
        reason: e.to_string(),
    })?;
    if !rest.is_empty() {
        return Err(TrieError::InvalidRlp {
            index,
            reason: "trailing bytes after node".to_string(),
        });
    }
    match item {
        Item::List(payload) => Ok(payload),
        Item::Bytes(_) => Err(TrieError::InvalidRlp {
            index,
            reason: "node is not a list".to_string(),
        }),
    }
}

fn node_items<'a>(payload: &'a [u8], index: usize) -> Result<Vec<Item<'a>>, TrieError> {
    let mut items = Vec::new();
    let mut rest = payload;
    while !rest.is_empty() {
        let (item, r) = rlp::decode(rest).map_err(|e| TrieError::InvalidRlp {
            index,
            reason: e.to_string(),
        })?;
        items.push(item);
        rest = r;
    }
    Ok(items)
}

/// Verify that `key` maps to a value under `root`.
///
/// Returns `Ok(Some(value))` when the proof shows the key present,
/// `Ok(None)` when it proves absence, and an error for any structural
/// violation. The key is hashed (`keccak256`) before the nibble walk.
pub fn verify(
    root: &[u8; 32],
    key: &[u8],
    nodes: &[Vec<u8>],
) -> Result<Option<Vec<u8>>, TrieError> {
    if nodes.is_empty() {
        if *root == EMPTY_TRIE_ROOT {
            return Ok(None);
        }
        return Err(TrieError::EmptyProof);
    }
    if keccak256(&nodes[0]) != *root {
        return Err(TrieError::HashMismatch { index: 0 });
    }

    let hashed = keccak256(key);
    let nibbles = nibbles_of(&hashed);
    let mut ni = 0usize;

    let mut payload: &[u8] = list_payload(&nodes[0], 0)?;
    let mut next = 1usize;
    let mut depth = 0usize;

    loop {
        let items = node_items(payload, next - 1)?;
        match items.len() {
            17 => {
                if ni == nibbles.len() {
                    let value = items[16].as_bytes().map_err(|e| TrieError::InvalidRlp {
                        index: next - 1,
                        reason: e.to_string(),
                    })?;
                    return Ok(if value.is_empty() {
                        None
                    } else {
                        Some(value.to_vec())
                    });
                }
                let child = items[nibbles[ni] as usize];
                ni += 1;
                match child {
                    Item::Bytes(b) if b.is_empty() => return Ok(None),
                    Item::Bytes(b) if b.len() == 32 => {
                        let node = nodes.get(next).ok_or(TrieError::Incomplete(next))?;
                        if keccak256(node) != *<&[u8; 32]>::try_from(b).unwrap() {
                            return Err(TrieError::HashMismatch { index: next });
                        }
                        payload = list_payload(node, next)?;
                        next += 1;
                    }
                    Item::Bytes(_) => {
                        return Err(TrieError::BadNode {
                            depth,
                            got: "branch pointer is neither empty, hash nor node".to_string(),
                        })
                    }
                    Item::List(embedded) => payload = embedded,
                }
            }
            2 => {
                let encoded_path = items[0].as_bytes().map_err(|e| TrieError::InvalidRlp {
                    index: next - 1,
                    reason: e.to_string(),
                })?;
                let (path, is_leaf) = decode_compact(encoded_path);
                if is_leaf {
                    if nibbles[ni..] == path[..] {
                        let value = items[1].as_bytes().map_err(|e| TrieError::InvalidRlp {
                            index: next - 1,
                            reason: e.to_string(),
                        })?;
                        return Ok(if value.is_empty() {
                            None
                        } else {
                            Some(value.to_vec())
                        });
                    }
                    // path diverges: valid proof of absence
                    return Ok(None);
                }
                if !nibbles[ni..].starts_with(&path) {
                    return Ok(None);
                }
                ni += path.len();
                match items[1] {
                    Item::Bytes(b) if b.len() == 32 => {
                        let node = nodes.get(next).ok_or(TrieError::Incomplete(next))?;
                        if keccak256(node) != *<&[u8; 32]>::try_from(b).unwrap() {
                            return Err(TrieError::HashMismatch { index: next });
                        }
                        payload = list_payload(node, next)?;
                        next += 1;
                    }
                    Item::List(embedded) => payload = embedded,
                    _ => {
                        return Err(TrieError::BadNode {
                            depth,
                            got: "extension pointer is neither hash nor node".to_string(),
                        })
                    }
                }
            }
            n => {
                return Err(TrieError::BadNode {
                    depth,
                    got: format!("{}-element list", n),
                })
            }
        }
        depth += 1;
        if depth > nodes.len() + 64 {
            return Err(TrieError::Incomplete(nodes.len()));
        }
    }
}

// --- In-memory trie for rebuilding the receipts trie ---

enum Node {
    Empty,
    Leaf {
        path: Vec<u8>,
        value: Vec<u8>,
    },
    Ext {
        path: Vec<u8>,
        child: Box<Node>,
    },
    Branch {
        children: Box<[Node; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl Node {
    fn take(&mut self) -> Node {
        std::mem::replace(self, Node::Empty)
    }
}

fn empty_children() -> Box<[Node; 16]> {
    Box::new(std::array::from_fn(|_| Node::Empty))
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// A small in-memory Merkle-Patricia trie.
///
/// Keys are hashed exactly as [`verify`] hashes them, so proofs extracted
/// here verify against [`verify`] without further translation.
pub struct Trie {
    root: Node,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Trie { root: Node::Empty }
    }

    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        let hashed = keccak256(key);
        let nibbles = nibbles_of(&hashed);
        let root = self.root.take();
        self.root = insert_node(root, &nibbles, value.to_vec());
    }

    pub fn root_hash(&self) -> [u8; 32] {
        keccak256(&encode_node(&self.root))
    }

    /// The proof nodes for `key`: every hashed node along its path, root
    /// first. Embedded (short) nodes stay inline in their parents.
    pub fn proof(&self, key: &[u8]) -> Vec<Vec<u8>> {
        let hashed = keccak256(key);
        let nibbles = nibbles_of(&hashed);
        let mut out = Vec::new();
        let mut node = &self.root;
        let mut ni = 0usize;
        loop {
            let enc = encode_node(node);
            if out.is_empty() || enc.len() >= 32 {
                out.push(enc);
            }
            match node {
                Node::Empty | Node::Leaf { .. } => break,
                Node::Ext { path, child } => {
                    if !nibbles[ni..].starts_with(path) {
                        break;
                    }
                    ni += path.len();
                    node = child.as_ref();
                }
                Node::Branch { children, .. } => {
                    if ni == nibbles.len() {
                        break;
                    }
                    node = &children[nibbles[ni] as usize];
                    ni += 1;
                    if matches!(node, Node::Empty) {
                        break;
                    }
                }
            }
        }
        out
    }
}

fn insert_node(node: Node, path: &[u8], value: Vec<u8>) -> Node {
    match node {
        Node::Empty => Node::Leaf {
            path: path.to_vec(),
            value,
        },
        Node::Leaf {
            path: old_path,
            value: old_value,
        } => {
            if old_path == path {
                return Node::Leaf {
                    path: old_path,
                    value,
                };
            }
            let common = common_prefix(&old_path, path);
            let mut children = empty_children();
            let mut branch_value = None;
            if old_path.len() == common {
                branch_value = Some(old_value);
            } else {
                children[old_path[common] as usize] = Node::Leaf {
                    path: old_path[common + 1..].to_vec(),
                    value: old_value,
                };
            }
            if path.len() == common {
                branch_value = Some(value);
            } else {
                children[path[common] as usize] = Node::Leaf {
                    path: path[common + 1..].to_vec(),
                    value,
                };
            }
            let branch = Node::Branch {
                children,
                value: branch_value,
            };
            if common > 0 {
                Node::Ext {
                    path: path[..common].to_vec(),
                    child: Box::new(branch),
                }
            } else {
                branch
            }
        }
        Node::Ext {
            path: ext_path,
            child,
        } => {
            let common = common_prefix(&ext_path, path);
            if common == ext_path.len() {
                return Node::Ext {
                    path: ext_path,
                    child: Box::new(insert_node(*child, &path[common..], value)),
                };
            }
            let mut children = empty_children();
            let mut branch_value = None;
            let rest = ext_path[common + 1..].to_vec();
            children[ext_path[common] as usize] = if rest.is_empty() {
                *child
            } else {
                Node::Ext {
                    path: rest,
                    child,
                }
            };
            if path.len() == common {
                branch_value = Some(value);
            } else {
                children[path[common] as usize] = Node::Leaf {
                    path: path[common + 1..].to_vec(),
                    value,
                };
            }
            let branch = Node::Branch {
                children,
                value: branch_value,
            };
            if common > 0 {
                Node::Ext {
                    path: path[..common].to_vec(),
                    child: Box::new(branch),
                }
            } else {
                branch
            }
        }
        Node::Branch {
            mut children,
            value: branch_value,
        } => {
            if path.is_empty() {
                return Node::Branch {
                    children,
                    value: Some(value),
                };
            }
            let i = path[0] as usize;
            let sub = children[i].take();
            children[i] = insert_node(sub, &path[1..], value);
            Node::Branch {
                children,
                value: branch_value,
            }
        }
    }
}

/// RLP-encode a node. Children shorter than 32 bytes embed in place, longer
/// ones are referenced by keccak hash.
fn encode_node(node: &Node) -> Vec<u8> {
    match node {
        Node::Empty => vec![0x80],
        Node::Leaf { path, value } => {
            let mut out = Vec::new();
            rlp::add_item(&mut out, &encode_compact(path, true));
            rlp::add_item(&mut out, value);
            rlp::to_list(&mut out);
            out
        }
        Node::Ext { path, child } => {
            let mut out = Vec::new();
            rlp::add_item(&mut out, &encode_compact(path, false));
            append_ref(&mut out, child);
            rlp::to_list(&mut out);
            out
        }
        Node::Branch { children, value } => {
            let mut out = Vec::new();
            for child in children.iter() {
                append_ref(&mut out, child);
            }
            match value {
                Some(v) => rlp::add_item(&mut out, v),
                None => rlp::add_item(&mut out, &[]),
            }
            rlp::to_list(&mut out);
            out
        }
    }
}

fn append_ref(out: &mut Vec<u8>, child: &Node) {
    if matches!(child, Node::Empty) {
        rlp::add_item(out, &[]);
        return;
    }
    let enc = encode_node(child);
    if enc.len() < 32 {
        out.extend_from_slice(&enc);
    } else {
        rlp::add_item(out, &keccak256(&enc));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn test_empty_trie_root() {
        assert_eq!(Trie::new().root_hash(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_single_entry_roundtrip() {
        let mut trie = Trie::new();
        trie.insert(b"key", b"value");
        let root = trie.root_hash();
        let proof = trie.proof(b"key");
        let got = verify(&root, b"key", &proof).unwrap();
        assert_eq!(got, Some(b"value".to_vec()));
    }

    #[test]
    fn test_many_entries_roundtrip() {
        let mut trie = Trie::new();
        let mut pairs = Vec::new();
        for i in 0u32..64 {
            // deterministic pseudo-random keys and values
            let key = sha256(&i.to_be_bytes()).to_vec();
            let value = sha256(&key)[..(1 + (i as usize % 32))].to_vec();
            trie.insert(&key, &value);
            pairs.push((key, value));
        }
        let root = trie.root_hash();
        for (key, value) in &pairs {
            let proof = trie.proof(key);
            assert_eq!(verify(&root, key, &proof).unwrap(), Some(value.clone()));
        }
    }

    #[test]
    fn test_insert_overwrites() {
        let mut trie = Trie::new();
        trie.insert(b"key", b"old");
        trie.insert(b"key", b"new");
        let root = trie.root_hash();
        let proof = trie.proof(b"key");
        assert_eq!(verify(&root, b"key", &proof).unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_absent_key() {
        let mut trie = Trie::new();
        for i in 0u32..16 {
            trie.insert(&sha256(&i.to_be_bytes()), b"present");
        }
        let root = trie.root_hash();
        let absent = b"never inserted";
        let proof = trie.proof(absent);
        assert_eq!(verify(&root, absent, &proof).unwrap(), None);
    }

    #[test]
    fn test_empty_proof_against_empty_root() {
        assert_eq!(verify(&EMPTY_TRIE_ROOT, b"anything", &[]).unwrap(), None);
        assert!(verify(&[1u8; 32], b"anything", &[]).is_err());
    }

    #[test]
    fn test_tampered_node_rejected() {
        let mut trie = Trie::new();
        for i in 0u32..32 {
            trie.insert(&sha256(&i.to_be_bytes()), b"data");
        }
        let root = trie.root_hash();
        let key = sha256(&7u32.to_be_bytes());
        let mut proof = trie.proof(&key);
        assert!(proof.len() > 1);

        // tamper a nibble somewhere in a non-root node
        let last = proof.len() - 1;
        proof[last][3] ^= 0x10;
        assert!(verify(&root, &key, &proof).is_err());

        // tampering the root node breaks the root hash check
        let mut proof = trie.proof(&key);
        proof[0][3] ^= 0x10;
        assert!(matches!(
            verify(&root, &key, &proof),
            Err(TrieError::HashMismatch { index: 0 })
        ));
    }

    #[test]
    fn test_compact_encoding_roundtrip() {
        for (nibbles, is_leaf) in [
            (vec![], false),
            (vec![0xa], true),
            (vec![0xa, 0xb], false),
            (vec![0x1, 0x2, 0x3], true),
        ] {
            let enc = encode_compact(&nibbles, is_leaf);
            let (dec, leaf) = decode_compact(&enc);
            assert_eq!(dec, nibbles);
            assert_eq!(leaf, is_leaf);
        }
    }
}
