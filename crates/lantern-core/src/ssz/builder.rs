//! SSZ encoding.
//!
//! A [`Builder`] accumulates a container field by field, in declaration
//! order: fixed-size fields land inline in the fixed region, dynamic fields
//! occupy a 4-byte offset slot there and append their payload to the dynamic
//! region. Offsets point from the start of the container, so they can be
//! written as soon as the field is added.
//!
//! Misusing a builder (wrong field name, wrong order, wrong size) is a
//! programming error and panics.

use super::{fixed_region, Def, Field};

pub struct Builder {
    def: &'static Def,
    fixed: Vec<u8>,
    dynamic: Vec<u8>,
    next: usize,
}

impl Builder {
    pub fn new(def: &'static Def) -> Self {
        assert!(
            matches!(def, Def::Container { .. }),
            "ssz::Builder requires a container descriptor"
        );
        Builder {
            def,
            fixed: Vec::new(),
            dynamic: Vec::new(),
            next: 0,
        }
    }

    fn fields(&self) -> &'static [Field] {
        match self.def {
            Def::Container { fields, .. } => fields,
            _ => unreachable!(),
        }
    }

    fn push_field(&mut self, name: &str, data: &[u8]) {
        let fields = self.fields();
        let field = fields
            .get(self.next)
            .unwrap_or_else(|| panic!("all fields of {:?} already added", self.def.container_name()));
        assert_eq!(
            field.name, name,
            "fields must be added in declaration order (expected {:?})",
            field.name
        );
        if field.def.is_dynamic() {
            let offset = (fixed_region(fields) + self.dynamic.len()) as u32;
            self.fixed.extend_from_slice(&offset.to_le_bytes());
            self.dynamic.extend_from_slice(data);
        } else {
            assert_eq!(
                data.len(),
                field.def.fixed_length(),
                "fixed field {:?} has wrong size",
                field.name
            );
            self.fixed.extend_from_slice(data);
        }
        self.next += 1;
    }

    pub fn add_bytes(&mut self, name: &str, data: &[u8]) -> &mut Self {
        self.push_field(name, data);
        self
    }

    pub fn add_u8(&mut self, name: &str, value: u8) -> &mut Self {
        self.push_field(name, &[value]);
        self
    }

    pub fn add_u32(&mut self, name: &str, value: u32) -> &mut Self {
        self.push_field(name, &value.to_le_bytes());
        self
    }

    pub fn add_u64(&mut self, name: &str, value: u64) -> &mut Self {
        self.push_field(name, &value.to_le_bytes());
        self
    }

    /// Add a union-typed field: 1 selector byte + variant payload.
    pub fn add_union(&mut self, name: &str, selector: u8, payload: &[u8]) -> &mut Self {
        let mut data = Vec::with_capacity(1 + payload.len());
        data.push(selector);
        data.extend_from_slice(payload);
        self.push_field(name, &data);
        self
    }

    /// Add a nested container built by another builder.
    pub fn add_builder(&mut self, name: &str, child: Builder) -> &mut Self {
        let data = child.into_bytes();
        self.push_field(name, &data);
        self
    }

    /// Concatenate the fixed and dynamic regions. Panics unless every field
    /// was added.
    pub fn into_bytes(self) -> Vec<u8> {
        assert_eq!(
            self.next,
            self.fields().len(),
            "container {:?} is missing fields",
            self.def.container_name()
        );
        let mut out = self.fixed;
        out.extend_from_slice(&self.dynamic);
        out
    }
}

/// Encode a union value on its own: 1 selector byte + payload.
pub fn encode_union(selector: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(selector);
    out.extend_from_slice(payload);
    out
}

/// Encode a list of dynamic elements: an offset table followed by payloads.
pub fn encode_dynamic_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offset = items.len() * 4;
    for item in items {
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += item.len();
    }
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Encode a list of fixed-size elements: plain concatenation.
pub fn encode_fixed_list(items: &[Vec<u8>]) -> Vec<u8> {
    items.iter().flat_map(|i| i.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::super::{field, Def, Field, Ob, BYTE, BYTES32, UINT64};
    use super::*;

    static MIXED_FIELDS: &[Field] = &[
        field("slot", &UINT64),
        field("root", &BYTES32),
        field("extra", &Def::List { elem: &BYTE, max: 64 }),
        field("more", &Def::List { elem: &BYTE, max: 64 }),
    ];
    static MIXED: Def = Def::Container {
        name: "Mixed",
        fields: MIXED_FIELDS,
    };

    #[test]
    fn test_builder_roundtrip() {
        let mut b = Builder::new(&MIXED);
        b.add_u64("slot", 1234);
        b.add_bytes("root", &[0x44; 32]);
        b.add_bytes("extra", &[0x01, 0x02]);
        b.add_bytes("more", &[0x03]);
        let bytes = b.into_bytes();

        let ob = Ob::new(&MIXED, &bytes);
        ob.validate().unwrap();
        assert_eq!(ob.get("slot").unwrap().as_u64().unwrap(), 1234);
        assert_eq!(ob.get("root").unwrap().as_bytes(), &[0x44; 32]);
        assert_eq!(ob.get("extra").unwrap().as_bytes(), &[0x01, 0x02]);
        assert_eq!(ob.get("more").unwrap().as_bytes(), &[0x03]);
    }

    #[test]
    fn test_builder_offsets_point_past_fixed_region() {
        let mut b = Builder::new(&MIXED);
        b.add_u64("slot", 0);
        b.add_bytes("root", &[0; 32]);
        b.add_bytes("extra", &[0xaa]);
        b.add_bytes("more", &[]);
        let bytes = b.into_bytes();
        // fixed region: 8 + 32 + 4 + 4 = 48
        let first = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        let second = u32::from_le_bytes(bytes[44..48].try_into().unwrap());
        assert_eq!(first, 48);
        assert_eq!(second, 49);
    }

    #[test]
    #[should_panic(expected = "declaration order")]
    fn test_builder_rejects_out_of_order() {
        let mut b = Builder::new(&MIXED);
        b.add_bytes("root", &[0x44; 32]);
    }

    #[test]
    fn test_encode_dynamic_list() {
        let items = vec![vec![0x01], vec![0x02, 0x03], vec![]];
        let out = encode_dynamic_list(&items);
        assert_eq!(
            out,
            vec![
                12, 0, 0, 0, // item 0 at 12
                13, 0, 0, 0, // item 1 at 13
                15, 0, 0, 0, // item 2 at 15 (empty)
                0x01, 0x02, 0x03
            ]
        );
    }

    #[test]
    fn test_encode_union() {
        assert_eq!(encode_union(0, &[]), vec![0]);
        assert_eq!(encode_union(3, &[0xaa]), vec![3, 0xaa]);
    }
}
