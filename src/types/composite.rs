//! Struct and array composite types (`spec.md` §4.3).
//!
//! Grounded on `examples/original_source/include/type.hpp`'s `StructType`
//! and `ArrayType` builders. Nested struct types are reference-counted
//! (`Rc<StructType>`) rather than owned recursively: the source model lets
//! one struct type be reused as a member of several others and as the
//! element type of several arrays, which in Rust is a shared, not an
//! owned, sub-structure (`SPEC_FULL.md` §9).

use std::rc::Rc;

use crate::types::scalar::ScalarKind;

/// Emission strategy for an array instance. Affects only how
/// [`crate::emit::Emitter`] spells the declaration — never the generator's
/// or evaluator's semantics (`spec.md` §4.3 edge case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum ArrayKind {
    /// A raw C array: `T name[N];`
    CArray,
    /// `std::vector<T>` (C++ only).
    DynamicVector,
    /// `std::array<T, N>` (C++ only).
    FixedArray,
    /// `std::valarray<T>` (C++ only).
    Valarray,
}

/// The type of one array element or struct member.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberType {
    /// A scalar of the given kind.
    Scalar(ScalarKind),
    /// A nested struct, shared by reference.
    Struct(Rc<StructType>),
}

/// One field of a [`StructType`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructMember {
    /// Field name, as emitted.
    pub name: String,
    /// Field type.
    pub ty: MemberType,
    /// Bit-field width in bits, if this member is declared as one.
    /// Restricted to `int`/`unsigned int` base types in C mode
    /// (`spec.md` §4.3 edge case; see [`bitfield_base_allowed`]).
    pub bitfield_width: Option<u32>,
    /// `static` members are shared across every instance of the struct
    /// type rather than stored per-instance (`spec.md` §4.4).
    pub is_static: bool,
}

impl StructMember {
    /// True if this member is eligible to carry a `bitfield_width`.
    pub fn bitfield_base_allowed(kind: ScalarKind) -> bool {
        matches!(kind, ScalarKind::SInt | ScalarKind::UInt)
    }
}

/// A generated struct type: a random member count, optionally nesting
/// another struct type up to a configured maximum depth, with optional
/// bit-field members and static members (`spec.md` §4.3).
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    /// Emitted type name (`StructN`).
    pub name: String,
    /// Declared fields, instance and static, in declaration order.
    pub members: Vec<StructMember>,
    /// Nesting depth of this struct type: `0` if it contains no nested
    /// struct members, `1 + max(child depth)` otherwise.
    pub depth: u32,
}

impl StructType {
    /// Build a struct type, deriving `depth` from its members.
    pub fn new(name: impl Into<String>, members: Vec<StructMember>) -> Self {
        let depth = members
            .iter()
            .map(|m| match &m.ty {
                MemberType::Struct(inner) => inner.depth + 1,
                MemberType::Scalar(_) => 0,
            })
            .max()
            .unwrap_or(0);
        Self {
            name: name.into(),
            members,
            depth,
        }
    }

    /// Members with per-instance storage.
    pub fn instance_members(&self) -> impl Iterator<Item = &StructMember> {
        self.members.iter().filter(|m| !m.is_static)
    }

    /// Members with one shared storage slot across every instance.
    pub fn static_members(&self) -> impl Iterator<Item = &StructMember> {
        self.members.iter().filter(|m| m.is_static)
    }
}

/// A generated array type: an element type (scalar or struct), a fixed
/// element count, and an emission [`ArrayKind`] (`spec.md` §4.3).
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// Element type.
    pub element: MemberType,
    /// Number of elements.
    pub count: usize,
    /// Emission strategy; semantics-neutral.
    pub kind: ArrayKind,
}

impl ArrayType {
    /// Build an array type.
    pub fn new(element: MemberType, count: usize, kind: ArrayKind) -> Self {
        debug_assert!(count > 0, "array types always have at least one element");
        Self { element, count, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_member(name: &str, kind: ScalarKind) -> StructMember {
        StructMember {
            name: name.to_string(),
            ty: MemberType::Scalar(kind),
            bitfield_width: None,
            is_static: false,
        }
    }

    #[test]
    fn depth_is_zero_for_scalar_only_struct() {
        let s = StructType::new("Struct0", vec![leaf_member("a", ScalarKind::SInt)]);
        assert_eq!(s.depth, 0);
    }

    #[test]
    fn depth_increases_by_one_per_nesting_level() {
        let inner = Rc::new(StructType::new("Struct0", vec![leaf_member("a", ScalarKind::SInt)]));
        let outer = StructType::new(
            "Struct1",
            vec![StructMember {
                name: "nested".to_string(),
                ty: MemberType::Struct(inner),
                bitfield_width: None,
                is_static: false,
            }],
        );
        assert_eq!(outer.depth, 1);
    }

    #[test]
    fn static_members_are_excluded_from_instance_members() {
        let mut shared = leaf_member("counter", ScalarKind::SInt);
        shared.is_static = true;
        let s = StructType::new("Struct0", vec![leaf_member("a", ScalarKind::SInt), shared]);
        assert_eq!(s.instance_members().count(), 1);
        assert_eq!(s.static_members().count(), 1);
    }

    #[test]
    fn bitfield_base_restricted_to_int_and_unsigned_int() {
        assert!(StructMember::bitfield_base_allowed(ScalarKind::SInt));
        assert!(StructMember::bitfield_base_allowed(ScalarKind::UInt));
        assert!(!StructMember::bitfield_base_allowed(ScalarKind::SChar));
        assert!(!StructMember::bitfield_base_allowed(ScalarKind::SLong));
    }
}
