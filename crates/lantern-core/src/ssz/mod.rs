//! Typed SSZ (Simple Serialize) codec.
//!
//! Every beacon-chain structure this crate touches is described by a
//! recursive [`Def`] descriptor; the descriptor tables live in
//! [`crate::types`] as `static` items, mirroring how the beacon specs define
//! their containers. An [`Ob`] pairs a descriptor with a borrowed byte view
//! and gives typed access (`get`, `at`, `union`, `len`) without copying.
//!
//! The Merkle side (`hash_tree_root`, generalized indices, multi-proofs)
//! lives in [`merkle`]; encoding lives in [`builder`].

mod builder;
pub mod merkle;

pub use builder::{encode_dynamic_list, encode_fixed_list, encode_union, Builder};
pub use merkle::{create_multi_proof, gindex, hash_tree_root, node_at, verify_multi_proof, PathItem};

use thiserror::Error;

/// Errors from parsing or walking SSZ data.
#[derive(Debug, Error)]
pub enum SszError {
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown field {0}")]
    UnknownField(String),

    #[error("union selector {selector} out of range (arity {arity})")]
    UnionSelector { selector: u8, arity: usize },

    #[error("malformed SSZ: {0}")]
    Malformed(&'static str),

    #[error("SSZ type mismatch: {0}")]
    TypeMismatch(&'static str),

    #[error("generalized index out of range")]
    GindexOutOfRange,

    #[error("invalid multiproof: {0}")]
    Multiproof(&'static str),
}

/// A named field of a container, or a named variant of a union.
#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub def: &'static Def,
}

/// Const constructor so descriptor tables stay one line per field.
pub const fn field(name: &'static str, def: &'static Def) -> Field {
    Field { name, def }
}

/// A recursive SSZ type descriptor.
#[derive(Debug)]
pub enum Def {
    /// Little-endian unsigned integer of 1, 2, 4, 8, 16 or 32 bytes.
    Uint(usize),
    Boolean,
    /// Placeholder for the `None` variant of a union.
    None,
    Container {
        name: &'static str,
        fields: &'static [Field],
    },
    Vector {
        elem: &'static Def,
        len: usize,
    },
    List {
        elem: &'static Def,
        max: usize,
    },
    BitVector {
        bits: usize,
    },
    BitList {
        max_bits: usize,
    },
    Union {
        name: &'static str,
        variants: &'static [Field],
    },
}

// Basic building-block descriptors shared by all tables.
pub static BYTE: Def = Def::Uint(1);
pub static UINT16: Def = Def::Uint(2);
pub static UINT32: Def = Def::Uint(4);
pub static UINT64: Def = Def::Uint(8);
pub static UINT256: Def = Def::Uint(32);
pub static BOOLEAN: Def = Def::Boolean;
pub static NONE: Def = Def::None;
pub static BYTES20: Def = Def::Vector { elem: &BYTE, len: 20 };
pub static BYTES32: Def = Def::Vector { elem: &BYTE, len: 32 };
pub static BYTES48: Def = Def::Vector { elem: &BYTE, len: 48 };
pub static BYTES96: Def = Def::Vector { elem: &BYTE, len: 96 };

impl Def {
    /// Whether the byte size of this type depends on the value.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Def::List { .. } | Def::BitList { .. } | Def::Union { .. } => true,
            Def::Container { fields, .. } => fields.iter().any(|f| f.def.is_dynamic()),
            Def::Vector { elem, .. } => elem.is_dynamic(),
            _ => false,
        }
    }

    /// Size this type occupies in the fixed region of its parent:
    /// the exact encoded size, or 4 (an offset slot) for dynamic types.
    pub fn fixed_length(&self) -> usize {
        if self.is_dynamic() {
            return 4;
        }
        match self {
            Def::Uint(n) => *n,
            Def::Boolean => 1,
            Def::None => 0,
            Def::Container { fields, .. } => fixed_region(fields),
            Def::Vector { elem, len } => len * elem.fixed_length(),
            Def::BitVector { bits } => (bits + 7) / 8,
            _ => 0,
        }
    }

    pub fn container_name(&self) -> Option<&'static str> {
        match self {
            Def::Container { name, .. } | Def::Union { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Byte size of a container's fixed region.
pub(crate) fn fixed_region(fields: &[Field]) -> usize {
    fields.iter().map(|f| f.def.fixed_length()).sum()
}

fn read_u32_le(bytes: &[u8], pos: usize) -> Result<usize, SszError> {
    let slice = bytes
        .get(pos..pos + 4)
        .ok_or(SszError::Malformed("offset slot out of bounds"))?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]) as usize)
}

/// A typed view over SSZ bytes.
#[derive(Debug, Clone, Copy)]
pub struct Ob<'a> {
    pub def: &'static Def,
    pub bytes: &'a [u8],
}

impl<'a> Ob<'a> {
    pub fn new(def: &'static Def, bytes: &'a [u8]) -> Self {
        Ob { def, bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn as_u64(&self) -> Result<u64, SszError> {
        match (self.def, self.bytes.len()) {
            (Def::Uint(8), 8) => Ok(u64::from_le_bytes(self.bytes.try_into().unwrap())),
            _ => Err(SszError::TypeMismatch("expected uint64")),
        }
    }

    pub fn as_u32(&self) -> Result<u32, SszError> {
        match (self.def, self.bytes.len()) {
            (Def::Uint(4), 4) => Ok(u32::from_le_bytes(self.bytes.try_into().unwrap())),
            _ => Err(SszError::TypeMismatch("expected uint32")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, SszError> {
        match (self.def, self.bytes.len()) {
            (Def::Boolean, 1) => Ok(self.bytes[0] != 0),
            _ => Err(SszError::TypeMismatch("expected boolean")),
        }
    }

    /// Fixed-size byte copy, for bytes32-style fields.
    pub fn as_array<const N: usize>(&self) -> Result<[u8; N], SszError> {
        self.bytes
            .try_into()
            .map_err(|_| SszError::TypeMismatch("unexpected byte length"))
    }

    /// Number of elements (lists, vectors) or bits (bit vectors, bit lists).
    pub fn len(&self) -> usize {
        match self.def {
            Def::Vector { len, .. } => *len,
            Def::List { elem, .. } => {
                if elem.is_dynamic() {
                    if self.bytes.len() < 4 {
                        0
                    } else {
                        u32::from_le_bytes(self.bytes[..4].try_into().unwrap()) as usize / 4
                    }
                } else {
                    let size = elem.fixed_length();
                    if size == 0 {
                        0
                    } else {
                        self.bytes.len() / size
                    }
                }
            }
            Def::BitVector { bits } => *bits,
            Def::BitList { .. } => {
                let Some(&last) = self.bytes.last() else {
                    return 0;
                };
                if last == 0 {
                    return 0;
                }
                // the highest set bit of the final byte is the delimiter
                let top = 7 - last.leading_zeros() as usize;
                (self.bytes.len() - 1) * 8 + top
            }
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The i-th element of a list or vector.
    pub fn at(&self, index: usize) -> Result<Ob<'a>, SszError> {
        let elem = match self.def {
            Def::Vector { elem, .. } | Def::List { elem, .. } => *elem,
            _ => return Err(SszError::TypeMismatch("expected a list or vector")),
        };
        let count = self.len();
        if index >= count {
            return Err(SszError::IndexOutOfRange { index, len: count });
        }
        if elem.is_dynamic() {
            let start = read_u32_le(self.bytes, index * 4)?;
            let end = if index + 1 < count {
                read_u32_le(self.bytes, (index + 1) * 4)?
            } else {
                self.bytes.len()
            };
            if start > end || end > self.bytes.len() {
                return Err(SszError::Malformed("element offsets out of bounds"));
            }
            Ok(Ob::new(elem, &self.bytes[start..end]))
        } else {
            let size = elem.fixed_length();
            let start = index * size;
            let slice = self
                .bytes
                .get(start..start + size)
                .ok_or(SszError::Malformed("element out of bounds"))?;
            Ok(Ob::new(elem, slice))
        }
    }

    /// Container field lookup by declaration index.
    pub fn field_at(&self, index: usize) -> Result<Ob<'a>, SszError> {
        let fields = match self.def {
            Def::Container { fields, .. } => *fields,
            _ => return Err(SszError::TypeMismatch("expected a container")),
        };
        if index >= fields.len() {
            return Err(SszError::IndexOutOfRange {
                index,
                len: fields.len(),
            });
        }
        let mut pos = 0usize;
        for (j, f) in fields.iter().enumerate() {
            let flen = f.def.fixed_length();
            if j == index {
                if !f.def.is_dynamic() {
                    let slice = self
                        .bytes
                        .get(pos..pos + flen)
                        .ok_or(SszError::Malformed("fixed field out of bounds"))?;
                    return Ok(Ob::new(f.def, slice));
                }
                let start = read_u32_le(self.bytes, pos)?;
                // the field ends where the next dynamic field begins
                let mut end = self.bytes.len();
                let mut probe = pos + 4;
                for g in &fields[j + 1..] {
                    if g.def.is_dynamic() {
                        end = read_u32_le(self.bytes, probe)?;
                        break;
                    }
                    probe += g.def.fixed_length();
                }
                if start > end || end > self.bytes.len() {
                    return Err(SszError::Malformed("container offsets out of bounds"));
                }
                return Ok(Ob::new(f.def, &self.bytes[start..end]));
            }
            pos += flen;
        }
        unreachable!()
    }

    /// Container field lookup by name. For unions, resolves the selected
    /// variant first when the name matches a variant.
    pub fn get(&self, name: &str) -> Result<Ob<'a>, SszError> {
        match self.def {
            Def::Container { fields, .. } => {
                let index = fields
                    .iter()
                    .position(|f| f.name == name)
                    .ok_or_else(|| SszError::UnknownField(name.to_string()))?;
                self.field_at(index)
            }
            Def::Union { .. } => {
                let (_, inner) = self.union()?;
                inner.get(name)
            }
            _ => Err(SszError::TypeMismatch("expected a container")),
        }
    }

    /// Resolve a union into its selector and variant payload.
    pub fn union(&self) -> Result<(usize, Ob<'a>), SszError> {
        let variants = match self.def {
            Def::Union { variants, .. } => *variants,
            _ => return Err(SszError::TypeMismatch("expected a union")),
        };
        let selector = *self
            .bytes
            .first()
            .ok_or(SszError::Malformed("empty union"))?;
        let variant = variants
            .get(selector as usize)
            .ok_or(SszError::UnionSelector {
                selector,
                arity: variants.len(),
            })?;
        Ok((selector as usize, Ob::new(variant.def, &self.bytes[1..])))
    }

    /// Whether a union currently holds its `None` variant.
    pub fn is_none(&self) -> Result<bool, SszError> {
        let (_, inner) = self.union()?;
        Ok(matches!(inner.def, Def::None))
    }

    /// Structural validation. Mandatory first step for externally supplied
    /// artifacts: checks offset monotonicity, bounds, bit-list delimiters and
    /// union selectors, recursively.
    pub fn validate(&self) -> Result<(), SszError> {
        match self.def {
            Def::Uint(n) => {
                if self.bytes.len() != *n {
                    return Err(SszError::Malformed("uint length mismatch"));
                }
            }
            Def::Boolean => {
                if self.bytes.len() != 1 || self.bytes[0] > 1 {
                    return Err(SszError::Malformed("invalid boolean"));
                }
            }
            Def::None => {
                if !self.bytes.is_empty() {
                    return Err(SszError::Malformed("none variant carries bytes"));
                }
            }
            Def::BitVector { bits } => {
                if self.bytes.len() != (bits + 7) / 8 {
                    return Err(SszError::Malformed("bit vector length mismatch"));
                }
            }
            Def::BitList { max_bits } => {
                match self.bytes.last() {
                    Some(0) | Option::None => {
                        return Err(SszError::Malformed("bit list delimiter missing"))
                    }
                    _ => {}
                }
                if self.len() > *max_bits {
                    return Err(SszError::Malformed("bit list exceeds capacity"));
                }
            }
            Def::Vector { elem, len } => {
                if elem.is_dynamic() {
                    self.validate_dynamic_elements(Some(*len))?;
                } else {
                    if self.bytes.len() != len * elem.fixed_length() {
                        return Err(SszError::Malformed("vector length mismatch"));
                    }
                    if !matches!(elem, Def::Uint(_) | Def::Boolean) {
                        for i in 0..*len {
                            self.at(i)?.validate()?;
                        }
                    }
                }
            }
            Def::List { elem, max } => {
                if elem.is_dynamic() {
                    self.validate_dynamic_elements(None)?;
                    if self.len() > *max {
                        return Err(SszError::Malformed("list exceeds capacity"));
                    }
                } else {
                    let size = elem.fixed_length();
                    if size == 0 || self.bytes.len() % size != 0 {
                        return Err(SszError::Malformed("list length not a multiple of element size"));
                    }
                    if self.len() > *max {
                        return Err(SszError::Malformed("list exceeds capacity"));
                    }
                    if !matches!(elem, Def::Uint(_) | Def::Boolean) {
                        for i in 0..self.len() {
                            self.at(i)?.validate()?;
                        }
                    }
                }
            }
            Def::Container { fields, .. } => {
                if self.bytes.len() < fixed_region(fields) {
                    return Err(SszError::Malformed("container shorter than fixed region"));
                }
                let mut pos = 0usize;
                let mut last_offset = 0usize;
                for (i, f) in fields.iter().enumerate() {
                    if f.def.is_dynamic() {
                        // offsets must be monotone in declaration order
                        let off = read_u32_le(self.bytes, pos)?;
                        if off < last_offset || off > self.bytes.len() {
                            return Err(SszError::Malformed("container offsets not monotone"));
                        }
                        last_offset = off;
                    }
                    pos += f.def.fixed_length();
                    self.field_at(i)?.validate()?;
                }
            }
            Def::Union { variants, .. } => {
                let (selector, inner) = self.union()?;
                if selector >= variants.len() {
                    return Err(SszError::UnionSelector {
                        selector: selector as u8,
                        arity: variants.len(),
                    });
                }
                inner.validate()?;
            }
        }
        Ok(())
    }

    fn validate_dynamic_elements(&self, expect_count: Option<usize>) -> Result<(), SszError> {
        if self.bytes.is_empty() {
            return match expect_count {
                Some(0) | Option::None => Ok(()),
                Some(_) => Err(SszError::Malformed("vector element count mismatch")),
            };
        }
        if self.bytes.len() < 4 {
            return Err(SszError::Malformed("truncated offset table"));
        }
        let first = read_u32_le(self.bytes, 0)?;
        if first % 4 != 0 || first > self.bytes.len() || first == 0 {
            return Err(SszError::Malformed("invalid first offset"));
        }
        let count = first / 4;
        if let Some(expected) = expect_count {
            if count != expected {
                return Err(SszError::Malformed("vector element count mismatch"));
            }
        }
        let mut prev = first;
        for i in 1..count {
            let off = read_u32_le(self.bytes, i * 4)?;
            if off < prev || off > self.bytes.len() {
                return Err(SszError::Malformed("element offsets not monotone"));
            }
            prev = off;
        }
        for i in 0..count {
            self.at(i)?.validate()?;
        }
        Ok(())
    }
}
