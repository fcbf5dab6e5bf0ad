//! SSZ Merkleization: `hash_tree_root`, generalized indices and multi-proofs.
//!
//! The generalized index (gindex) of the tree root is 1; the children of a
//! node `g` are `2g` and `2g+1`. Lists and bit lists mix their length into
//! the root, so their data subtree lives under `2g` and the length chunk
//! under `2g+1`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use super::{Def, Ob, SszError};
use crate::crypto::sha256_pair;

const ZERO_DEPTHS: usize = 64;

/// Roots of all-zero subtrees, indexed by depth.
fn zero_hash(depth: usize) -> [u8; 32] {
    static TABLE: OnceLock<[[u8; 32]; ZERO_DEPTHS]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut t = [[0u8; 32]; ZERO_DEPTHS];
        for i in 1..ZERO_DEPTHS {
            t[i] = sha256_pair(&t[i - 1], &t[i - 1]);
        }
        t
    });
    table[depth]
}

fn depth_of(g: u64) -> u32 {
    63 - g.leading_zeros()
}

fn next_pow2(n: u64) -> u64 {
    n.max(1).next_power_of_two()
}

fn u64_chunk(v: u64) -> [u8; 32] {
    let mut chunk = [0u8; 32];
    chunk[..8].copy_from_slice(&v.to_le_bytes());
    chunk
}

fn mix_in(root: [u8; 32], value: u64) -> [u8; 32] {
    sha256_pair(&root, &u64_chunk(value))
}

/// Split packed bytes into 32-byte chunks, zero-padding the tail.
fn bytes_chunks(data: &[u8]) -> Vec<[u8; 32]> {
    data.chunks(32)
        .map(|c| {
            let mut chunk = [0u8; 32];
            chunk[..c.len()].copy_from_slice(c);
            chunk
        })
        .collect()
}

/// Number of 32-byte chunks a packed vector/list of `count` basic elements
/// of `size` bytes occupies.
fn packed_chunk_capacity(count: usize, size: usize) -> u64 {
    ((count * size + 31) / 32) as u64
}

/// Root of the `span`-wide (power of two) subtree whose leftmost leaf is
/// `leaves[start]`, with zero chunks past the end.
fn range_root<F>(leaf: &F, count: usize, start: u64, span: u64) -> Result<[u8; 32], SszError>
where
    F: Fn(usize) -> Result<[u8; 32], SszError>,
{
    if start >= count as u64 {
        return Ok(zero_hash(depth_of(span) as usize));
    }
    if span == 1 {
        return leaf(start as usize);
    }
    let half = span / 2;
    let left = range_root(leaf, count, start, half)?;
    let right = range_root(leaf, count, start + half, half)?;
    Ok(sha256_pair(&left, &right))
}

fn merkleize<F>(leaf: &F, count: usize, limit: u64) -> Result<[u8; 32], SszError>
where
    F: Fn(usize) -> Result<[u8; 32], SszError>,
{
    range_root(leaf, count, 0, limit)
}

/// Node at gindex `g` of a perfect tree with `limit` leaf slots, where leaf
/// `i` is produced by `leaf(i)` and nodes below leaf level are resolved by
/// `descend(i, sub_gindex)`.
fn tree_node<F, G>(
    count: usize,
    limit: u64,
    g: u64,
    leaf: &F,
    descend: &G,
) -> Result<[u8; 32], SszError>
where
    F: Fn(usize) -> Result<[u8; 32], SszError>,
    G: Fn(usize, u64) -> Result<[u8; 32], SszError>,
{
    let d = depth_of(g);
    let k = depth_of(limit);
    if d <= k {
        let span = limit >> d;
        let start = (g - (1u64 << d)) * span;
        return range_root(leaf, count, start, span);
    }
    let local = g >> (d - k);
    let i = (local - limit) as usize;
    if i >= count {
        return Err(SszError::GindexOutOfRange);
    }
    let sub = (1u64 << (d - k)) | (g & ((1u64 << (d - k)) - 1));
    descend(i, sub)
}

fn no_descend(_: usize, _: u64) -> Result<[u8; 32], SszError> {
    Err(SszError::GindexOutOfRange)
}

/// Bit-list bytes with the delimiter bit cleared, ready for chunking.
fn bit_list_data(ob: &Ob) -> Vec<u8> {
    let mut data = ob.bytes.to_vec();
    if let Some(last) = data.last_mut() {
        if *last != 0 {
            let top = 7 - last.leading_zeros();
            *last &= !(1 << top);
        }
    }
    data
}

/// Canonical SSZ hash tree root.
pub fn hash_tree_root(ob: Ob) -> Result<[u8; 32], SszError> {
    match ob.def {
        Def::Uint(_) | Def::Boolean => {
            let mut chunk = [0u8; 32];
            if ob.bytes.len() > 32 {
                return Err(SszError::Malformed("basic value exceeds one chunk"));
            }
            chunk[..ob.bytes.len()].copy_from_slice(ob.bytes);
            Ok(chunk)
        }
        Def::None => Ok([0u8; 32]),
        Def::BitVector { bits } => {
            let chunks = bytes_chunks(ob.bytes);
            let limit = next_pow2((*bits as u64 + 255) / 256);
            merkleize(&|i| Ok(chunks[i]), chunks.len(), limit)
        }
        Def::BitList { max_bits } => {
            let count = ob.len() as u64;
            let data = bit_list_data(&ob);
            let chunks = bytes_chunks(&data);
            let limit = next_pow2((*max_bits as u64 + 255) / 256);
            let root = merkleize(&|i| Ok(chunks[i]), chunks.len(), limit)?;
            Ok(mix_in(root, count))
        }
        Def::Vector { elem, len } => {
            if matches!(elem, Def::Uint(_) | Def::Boolean) {
                let chunks = bytes_chunks(ob.bytes);
                let limit = next_pow2(packed_chunk_capacity(*len, elem.fixed_length()));
                merkleize(&|i| Ok(chunks[i]), chunks.len(), limit)
            } else {
                let limit = next_pow2(*len as u64);
                merkleize(&|i| hash_tree_root(ob.at(i)?), ob.len(), limit)
            }
        }
        Def::List { elem, max } => {
            let count = ob.len();
            let root = if matches!(elem, Def::Uint(_) | Def::Boolean) {
                let chunks = bytes_chunks(ob.bytes);
                let limit = next_pow2(packed_chunk_capacity(*max, elem.fixed_length()));
                merkleize(&|i| Ok(chunks[i]), chunks.len(), limit)?
            } else {
                let limit = next_pow2(*max as u64);
                merkleize(&|i| hash_tree_root(ob.at(i)?), count, limit)?
            };
            Ok(mix_in(root, count as u64))
        }
        Def::Container { fields, .. } => {
            let limit = next_pow2(fields.len() as u64);
            merkleize(&|i| hash_tree_root(ob.field_at(i)?), fields.len(), limit)
        }
        Def::Union { .. } => {
            let (selector, inner) = ob.union()?;
            let value_root = hash_tree_root(inner)?;
            Ok(mix_in(value_root, selector as u64))
        }
    }
}

/// Hash of the tree node at generalized index `g` within `ob`'s tree.
pub fn node_at(ob: Ob, g: u64) -> Result<[u8; 32], SszError> {
    if g == 0 {
        return Err(SszError::GindexOutOfRange);
    }
    if g == 1 {
        return hash_tree_root(ob);
    }
    match ob.def {
        Def::Container { fields, .. } => {
            let limit = next_pow2(fields.len() as u64);
            tree_node(
                fields.len(),
                limit,
                g,
                &|i| hash_tree_root(ob.field_at(i)?),
                &|i, sub| node_at(ob.field_at(i)?, sub),
            )
        }
        Def::Vector { elem, len } => {
            if matches!(elem, Def::Uint(_) | Def::Boolean) {
                let chunks = bytes_chunks(ob.bytes);
                let limit = next_pow2(packed_chunk_capacity(*len, elem.fixed_length()));
                tree_node(chunks.len(), limit, g, &|i| Ok(chunks[i]), &no_descend)
            } else {
                let limit = next_pow2(*len as u64);
                tree_node(
                    ob.len(),
                    limit,
                    g,
                    &|i| hash_tree_root(ob.at(i)?),
                    &|i, sub| node_at(ob.at(i)?, sub),
                )
            }
        }
        Def::BitVector { bits } => {
            let chunks = bytes_chunks(ob.bytes);
            let limit = next_pow2((*bits as u64 + 255) / 256);
            tree_node(chunks.len(), limit, g, &|i| Ok(chunks[i]), &no_descend)
        }
        Def::List { .. } | Def::BitList { .. } => {
            let d = depth_of(g);
            // the bit below the root selects data (0) or length mix-in (1)
            let side = (g >> (d - 1)) & 1;
            if side == 1 {
                if g == 3 {
                    return Ok(u64_chunk(ob.len() as u64));
                }
                return Err(SszError::GindexOutOfRange);
            }
            let sub = (1u64 << (d - 1)) | (g & ((1u64 << (d - 1)) - 1));
            match ob.def {
                Def::List { elem, max } => {
                    if matches!(elem, Def::Uint(_) | Def::Boolean) {
                        let chunks = bytes_chunks(ob.bytes);
                        let limit = next_pow2(packed_chunk_capacity(*max, elem.fixed_length()));
                        tree_node(chunks.len(), limit, sub, &|i| Ok(chunks[i]), &no_descend)
                    } else {
                        let limit = next_pow2(*max as u64);
                        tree_node(
                            ob.len(),
                            limit,
                            sub,
                            &|i| hash_tree_root(ob.at(i)?),
                            &|i, s| node_at(ob.at(i)?, s),
                        )
                    }
                }
                Def::BitList { max_bits } => {
                    let data = bit_list_data(&ob);
                    let chunks = bytes_chunks(&data);
                    let limit = next_pow2((*max_bits as u64 + 255) / 256);
                    tree_node(chunks.len(), limit, sub, &|i| Ok(chunks[i]), &no_descend)
                }
                _ => unreachable!(),
            }
        }
        Def::Union { .. } => {
            let (selector, inner) = ob.union()?;
            let d = depth_of(g);
            let side = (g >> (d - 1)) & 1;
            if side == 1 {
                if g == 3 {
                    return Ok(u64_chunk(selector as u64));
                }
                return Err(SszError::GindexOutOfRange);
            }
            let sub = (1u64 << (d - 1)) | (g & ((1u64 << (d - 1)) - 1));
            node_at(inner, sub)
        }
        _ => Err(SszError::GindexOutOfRange),
    }
}

/// One step of a field path: a container field name or an element index.
#[derive(Debug, Clone, Copy)]
pub enum PathItem<'a> {
    Field(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for PathItem<'a> {
    fn from(name: &'a str) -> Self {
        PathItem::Field(name)
    }
}

impl From<usize> for PathItem<'static> {
    fn from(index: usize) -> Self {
        PathItem::Index(index)
    }
}

/// Concatenate a child gindex under a parent gindex.
fn compose(parent: u64, child: u64) -> u64 {
    let d = depth_of(child);
    (parent << d) | (child - (1u64 << d))
}

/// Generalized index of a nested field, interleaving names and indices.
pub fn gindex(def: &'static Def, path: &[PathItem]) -> Result<u64, SszError> {
    let mut g = 1u64;
    let mut cur = def;
    for item in path {
        match (cur, item) {
            (Def::Container { fields, .. }, PathItem::Field(name)) => {
                let i = fields
                    .iter()
                    .position(|f| f.name == *name)
                    .ok_or_else(|| SszError::UnknownField(name.to_string()))?;
                g = compose(g, next_pow2(fields.len() as u64) + i as u64);
                cur = fields[i].def;
            }
            (Def::Vector { elem, len }, PathItem::Index(i)) => {
                if *i >= *len {
                    return Err(SszError::IndexOutOfRange { index: *i, len: *len });
                }
                if matches!(elem, Def::Uint(_) | Def::Boolean) {
                    let limit = next_pow2(packed_chunk_capacity(*len, elem.fixed_length()));
                    g = compose(g, limit + (i * elem.fixed_length() / 32) as u64);
                } else {
                    g = compose(g, next_pow2(*len as u64) + *i as u64);
                }
                cur = *elem;
            }
            (Def::List { elem, max }, PathItem::Index(i)) => {
                if *i >= *max {
                    return Err(SszError::IndexOutOfRange { index: *i, len: *max });
                }
                g = compose(g, 2); // data subtree of the length mix-in
                if matches!(elem, Def::Uint(_) | Def::Boolean) {
                    let limit = next_pow2(packed_chunk_capacity(*max, elem.fixed_length()));
                    g = compose(g, limit + (i * elem.fixed_length() / 32) as u64);
                } else {
                    g = compose(g, next_pow2(*max as u64) + *i as u64);
                }
                cur = *elem;
            }
            _ => return Err(SszError::TypeMismatch("path does not match descriptor")),
        }
    }
    Ok(g)
}

/// Pick the next gindex to fold: greatest depth first, lowest index within a
/// depth. This tie-break makes proofs bit-identical across implementations.
fn fold_next<'a, I>(keys: I) -> u64
where
    I: Iterator<Item = &'a u64>,
{
    let mut best = 0u64;
    let mut best_depth = 0u32;
    for &g in keys {
        let d = depth_of(g);
        if best == 0 || d > best_depth {
            best = g;
            best_depth = d;
        }
    }
    best
}

/// Produce the sibling chunks needed to fold `gindexes` up to the root of
/// `ob`'s tree, in the order [`verify_multi_proof`] consumes them.
pub fn create_multi_proof(ob: Ob, gindexes: &[u64]) -> Result<Vec<u8>, SszError> {
    let mut known: BTreeSet<u64> = BTreeSet::new();
    for &g in gindexes {
        if g == 0 {
            return Err(SszError::GindexOutOfRange);
        }
        if !known.insert(g) {
            return Err(SszError::Multiproof("duplicate gindex"));
        }
    }
    if known.is_empty() {
        return Err(SszError::Multiproof("no leaves"));
    }

    let mut siblings: Vec<u64> = Vec::new();
    while !(known.len() == 1 && known.contains(&1)) {
        let g = fold_next(known.iter());
        if g == 1 {
            return Err(SszError::Multiproof("gindex 1 mixed with deeper leaves"));
        }
        let sib = g ^ 1;
        if !known.remove(&sib) {
            siblings.push(sib);
        }
        known.remove(&g);
        if !known.insert(g >> 1) {
            return Err(SszError::Multiproof("overlapping gindexes"));
        }
    }

    let mut out = Vec::with_capacity(siblings.len() * 32);
    for s in siblings {
        out.extend_from_slice(&node_at(ob, s)?);
    }
    Ok(out)
}

/// Fold `leaves` at `gindexes` together with the supplied sibling chunks up
/// to a single root. Every chunk must be consumed and no sibling may be
/// missing; duplicate or overlapping gindexes are rejected.
pub fn verify_multi_proof(
    proof: &[u8],
    leaves: &[[u8; 32]],
    gindexes: &[u64],
) -> Result<[u8; 32], SszError> {
    if leaves.len() != gindexes.len() {
        return Err(SszError::Multiproof("leaf / gindex count mismatch"));
    }
    if proof.len() % 32 != 0 {
        return Err(SszError::Multiproof("proof is not a sequence of chunks"));
    }
    let mut known: BTreeMap<u64, [u8; 32]> = BTreeMap::new();
    for (&g, &leaf) in gindexes.iter().zip(leaves.iter()) {
        if g == 0 {
            return Err(SszError::GindexOutOfRange);
        }
        if known.insert(g, leaf).is_some() {
            return Err(SszError::Multiproof("duplicate gindex"));
        }
    }
    if known.is_empty() {
        return Err(SszError::Multiproof("no leaves"));
    }

    let mut chunks = proof.chunks_exact(32);
    while !(known.len() == 1 && known.contains_key(&1)) {
        let g = fold_next(known.keys());
        if g == 1 {
            return Err(SszError::Multiproof("gindex 1 mixed with deeper leaves"));
        }
        let own = known.remove(&g).unwrap();
        let sib = match known.remove(&(g ^ 1)) {
            Some(v) => v,
            None => {
                let chunk = chunks
                    .next()
                    .ok_or(SszError::Multiproof("proof chunks exhausted"))?;
                chunk.try_into().unwrap()
            }
        };
        let parent = if g & 1 == 0 {
            sha256_pair(&own, &sib)
        } else {
            sha256_pair(&sib, &own)
        };
        if known.insert(g >> 1, parent).is_some() {
            return Err(SszError::Multiproof("overlapping gindexes"));
        }
    }
    if chunks.next().is_some() {
        return Err(SszError::Multiproof("leftover proof chunks"));
    }
    Ok(known[&1])
}

#[cfg(test)]
mod tests {
    use super::super::{field, Def, Field, Ob, BYTE, BYTES32, UINT64};
    use super::*;
    use crate::crypto::sha256_pair;

    static PAIR_FIELDS: &[Field] = &[field("left", &UINT64), field("right", &UINT64)];
    static PAIR: Def = Def::Container {
        name: "Pair",
        fields: PAIR_FIELDS,
    };

    static QUAD_FIELDS: &[Field] = &[
        field("a", &UINT64),
        field("b", &BYTES32),
        field("c", &Def::List { elem: &BYTE, max: 64 }),
        field("d", &PAIR),
    ];
    static QUAD: Def = Def::Container {
        name: "Quad",
        fields: QUAD_FIELDS,
    };

    fn quad_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&11u64.to_le_bytes()); // a
        bytes.extend_from_slice(&[0x33; 32]); // b
        bytes.extend_from_slice(&60u32.to_le_bytes()); // offset of c
        bytes.extend_from_slice(&21u64.to_le_bytes()); // d.left
        bytes.extend_from_slice(&22u64.to_le_bytes()); // d.right
        bytes.extend_from_slice(&[0xaa, 0xbb, 0xcc]); // c payload
        bytes
    }

    #[test]
    fn test_uint_root_is_padded_leaf() {
        let bytes = 42u64.to_le_bytes();
        let root = hash_tree_root(Ob::new(&UINT64, &bytes)).unwrap();
        assert_eq!(root[..8], bytes);
        assert_eq!(root[8..], [0u8; 24]);
    }

    #[test]
    fn test_bytes32_root_is_identity() {
        let bytes = [0x5au8; 32];
        let root = hash_tree_root(Ob::new(&BYTES32, &bytes)).unwrap();
        assert_eq!(root, bytes);
    }

    #[test]
    fn test_container_root_matches_manual_fold() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&7u64.to_le_bytes());
        bytes.extend_from_slice(&9u64.to_le_bytes());
        let ob = Ob::new(&PAIR, &bytes);
        let root = hash_tree_root(ob).unwrap();

        let left = hash_tree_root(Ob::new(&UINT64, &7u64.to_le_bytes())).unwrap();
        let right = hash_tree_root(Ob::new(&UINT64, &9u64.to_le_bytes())).unwrap();
        assert_eq!(root, sha256_pair(&left, &right));
    }

    #[test]
    fn test_list_root_mixes_in_length() {
        static U64_LIST: Def = Def::List { elem: &UINT64, max: 4 };
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&2u64.to_le_bytes());
        let root = hash_tree_root(Ob::new(&U64_LIST, &bytes)).unwrap();

        // 4 × u64 pack into a single chunk
        let mut chunk = [0u8; 32];
        chunk[..8].copy_from_slice(&1u64.to_le_bytes());
        chunk[8..16].copy_from_slice(&2u64.to_le_bytes());
        assert_eq!(root, mix_in(chunk, 2));
    }

    #[test]
    fn test_empty_list_root() {
        static U64_LIST: Def = Def::List { elem: &UINT64, max: 4 };
        let root = hash_tree_root(Ob::new(&U64_LIST, &[])).unwrap();
        assert_eq!(root, mix_in([0u8; 32], 0));
    }

    #[test]
    fn test_hash_tree_root_deterministic() {
        let bytes = quad_bytes();
        let ob = Ob::new(&QUAD, &bytes);
        assert_eq!(hash_tree_root(ob).unwrap(), hash_tree_root(ob).unwrap());
    }

    #[test]
    fn test_node_at_field_roots() {
        let bytes = quad_bytes();
        let ob = Ob::new(&QUAD, &bytes);
        // 4 fields: field i sits at gindex 4 + i
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            let expected = hash_tree_root(ob.get(name).unwrap()).unwrap();
            assert_eq!(node_at(ob, 4 + i as u64).unwrap(), expected);
        }
        assert_eq!(node_at(ob, 1).unwrap(), hash_tree_root(ob).unwrap());
        // internal nodes combine their children
        assert_eq!(
            node_at(ob, 2).unwrap(),
            sha256_pair(&node_at(ob, 4).unwrap(), &node_at(ob, 5).unwrap())
        );
    }

    #[test]
    fn test_gindex_paths() {
        let g = gindex(&QUAD, &[PathItem::Field("d"), PathItem::Field("right")]).unwrap();
        // d is field 3 of 4 (gindex 7), right is field 1 of 2 → 7*2+1
        assert_eq!(g, 15);

        let bytes = quad_bytes();
        let ob = Ob::new(&QUAD, &bytes);
        let leaf = node_at(ob, g).unwrap();
        assert_eq!(
            leaf,
            hash_tree_root(Ob::new(&UINT64, &22u64.to_le_bytes())).unwrap()
        );
    }

    #[test]
    fn test_single_proof_roundtrip() {
        let bytes = quad_bytes();
        let ob = Ob::new(&QUAD, &bytes);
        let g = gindex(&QUAD, &[PathItem::Field("b")]).unwrap();
        let proof = create_multi_proof(ob, &[g]).unwrap();
        let leaf = [0x33u8; 32];
        let root = verify_multi_proof(&proof, &[leaf], &[g]).unwrap();
        assert_eq!(root, hash_tree_root(ob).unwrap());
    }

    #[test]
    fn test_multi_proof_roundtrip() {
        let bytes = quad_bytes();
        let ob = Ob::new(&QUAD, &bytes);
        let ga = gindex(&QUAD, &[PathItem::Field("a")]).unwrap();
        let gd = gindex(&QUAD, &[PathItem::Field("d"), PathItem::Field("left")]).unwrap();
        let proof = create_multi_proof(ob, &[ga, gd]).unwrap();

        let leaves = [node_at(ob, ga).unwrap(), node_at(ob, gd).unwrap()];
        let root = verify_multi_proof(&proof, &leaves, &[ga, gd]).unwrap();
        assert_eq!(root, hash_tree_root(ob).unwrap());
    }

    #[test]
    fn test_multi_proof_rejects_tampering() {
        let bytes = quad_bytes();
        let ob = Ob::new(&QUAD, &bytes);
        let ga = gindex(&QUAD, &[PathItem::Field("a")]).unwrap();
        let gd = gindex(&QUAD, &[PathItem::Field("d"), PathItem::Field("left")]).unwrap();
        let proof = create_multi_proof(ob, &[ga, gd]).unwrap();
        let leaves = [node_at(ob, ga).unwrap(), node_at(ob, gd).unwrap()];
        let root = hash_tree_root(ob).unwrap();

        // flipping any byte of the proof changes the root
        let mut bad = proof.clone();
        bad[0] ^= 1;
        assert_ne!(verify_multi_proof(&bad, &leaves, &[ga, gd]).unwrap(), root);

        // dropping a chunk fails
        let short = &proof[..proof.len() - 32];
        assert!(verify_multi_proof(short, &leaves, &[ga, gd]).is_err());

        // appending a chunk fails (strict consumption)
        let mut long = proof.clone();
        long.extend_from_slice(&[0u8; 32]);
        assert!(verify_multi_proof(&long, &leaves, &[ga, gd]).is_err());

        // permuting chunks changes the root
        if proof.len() >= 64 {
            let mut swapped = proof.clone();
            let (a, b) = swapped.split_at_mut(32);
            a.swap_with_slice(&mut b[..32]);
            assert_ne!(
                verify_multi_proof(&swapped, &leaves, &[ga, gd]).unwrap_or([0u8; 32]),
                root
            );
        }
    }

    #[test]
    fn test_multi_proof_rejects_duplicates() {
        let bytes = quad_bytes();
        let ob = Ob::new(&QUAD, &bytes);
        assert!(create_multi_proof(ob, &[4, 4]).is_err());
        assert!(verify_multi_proof(&[], &[[0u8; 32], [0u8; 32]], &[4, 4]).is_err());
    }

    #[test]
    fn test_deep_list_node_uses_zero_subtrees() {
        static BIG_LIST: Def = Def::List {
            elem: &Def::List { elem: &BYTE, max: 1024 },
            max: 1 << 20,
        };
        // a list with one element: proof for element 0 must verify
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[0xde, 0xad]);
        let ob = Ob::new(&BIG_LIST, &bytes);

        let g = gindex(&BIG_LIST, &[PathItem::Index(0)]).unwrap();
        assert_eq!(g, 2 * (1 << 20)); // data root at 2, element 0 at 2^20 within

        let proof = create_multi_proof(ob, &[g]).unwrap();
        let leaf = hash_tree_root(ob.at(0).unwrap()).unwrap();
        let root = verify_multi_proof(&proof, &[leaf], &[g]).unwrap();
        assert_eq!(root, hash_tree_root(ob).unwrap());
    }
}
