//! Type model: scalar descriptors plus struct/array composite types
//! (`spec.md` §4.2, §4.3).

pub mod composite;
pub mod scalar;

pub use composite::{ArrayKind, ArrayType, MemberType, StructMember, StructType};
pub use scalar::{BitMode, ScalarDescriptor, ScalarKind, TypeRegistry};
