//! `TypedValue`: the tagged union at the center of the IR (`spec.md` §3,
//! §4.1). Every evaluated expression node carries one of these.
//!
//! Grounded on `examples/original_source/include/ir_value.hpp`'s
//! `IRValue` (a type-tagged union plus a UB code) and on the
//! width-parameterized operator design called out in `spec.md` §9. Rather
//! than a literal `union` of nine native Rust integer types, the payload is
//! stored as a 128-bit two's-complement bit pattern (for integers) or an
//! `f64` (for floats), always interpreted against a [`ScalarDescriptor`]
//! resolved from a [`TypeRegistry`]. This keeps every arithmetic helper a
//! single width-generic function instead of nine near-duplicate match arms.

mod ops;
pub mod ub;

pub use ub::UbCode;

use crate::types::{ScalarDescriptor, ScalarKind, TypeRegistry};

/// The active representation of a [`TypedValue`]'s payload.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Payload {
    /// Two's-complement bit pattern, valid within `kind`'s declared width.
    Int(u128),
    /// IEEE-754 double; `float`-kind values are additionally round-tripped
    /// through `f32` on every read/write so narrowing behaves correctly.
    Float(f64),
}

/// A scalar value tagged with its static type and carrying a UB code.
///
/// Invariant (`spec.md` §3): the active payload variant matches `kind`;
/// arithmetic methods return a *new* `TypedValue` and never mutate their
/// operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypedValue {
    kind: ScalarKind,
    payload: Payload,
    ub: UbCode,
}

impl TypedValue {
    /// Construct a zero-valued, `NoUB` value of `kind`.
    pub fn zero(reg: &TypeRegistry, kind: ScalarKind) -> Self {
        if kind.is_float() {
            Self {
                kind,
                payload: Payload::Float(0.0),
                ub: UbCode::NoUB,
            }
        } else {
            let _ = reg.describe(kind);
            Self {
                kind,
                payload: Payload::Int(0),
                ub: UbCode::NoUB,
            }
        }
    }

    /// Construct an integer-kinded value from a signed 128-bit value,
    /// masking it down to `kind`'s declared width (wrapping, never UB —
    /// used for constants and for storing already-checked results).
    pub fn from_i128(reg: &TypeRegistry, kind: ScalarKind, value: i128) -> Self {
        debug_assert!(kind.is_integer());
        let width = reg.describe(kind).width_bits;
        Self {
            kind,
            payload: Payload::Int(truncate_to_width(value, width)),
            ub: UbCode::NoUB,
        }
    }

    /// Construct a float-kinded value.
    pub fn from_f64(kind: ScalarKind, value: f64) -> Self {
        debug_assert!(kind.is_float());
        let value = if kind == ScalarKind::Float { value as f32 as f64 } else { value };
        Self {
            kind,
            payload: Payload::Float(value),
            ub: UbCode::NoUB,
        }
    }

    /// Build a value carrying a UB code and an otherwise-unspecified
    /// payload. Callers must check [`TypedValue::ub`] before trusting the
    /// numeric value of anything returned this way.
    fn with_ub(kind: ScalarKind, ub: UbCode) -> Self {
        debug_assert!(ub.is_ub());
        Self {
            kind,
            payload: Payload::Int(0),
            ub,
        }
    }

    /// The value's static type tag.
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// The UB code raised while computing this value, if any.
    pub const fn ub(&self) -> UbCode {
        self.ub
    }

    /// True iff this value's UB code is `NoUB`; a published IR node must
    /// uphold this (`spec.md` §3 invariants, §8 property 3).
    pub const fn is_well_defined(&self) -> bool {
        !self.ub.is_ub()
    }

    /// Read this value as a signed 128-bit integer (sign-extended per the
    /// type's width/signedness). Panics if this is a float-kinded value.
    pub fn as_i128(&self, reg: &TypeRegistry) -> i128 {
        let Payload::Int(bits) = self.payload else {
            panic!("as_i128 called on a float-kinded TypedValue");
        };
        let desc = reg.describe(self.kind);
        if desc.is_signed {
            sign_extend(bits, desc.width_bits)
        } else {
            bits as i128
        }
    }

    /// Read this value's raw two's-complement bit pattern.
    pub fn as_u128_bits(&self) -> u128 {
        match self.payload {
            Payload::Int(bits) => bits,
            Payload::Float(_) => panic!("as_u128_bits called on a float-kinded TypedValue"),
        }
    }

    /// Read this value as an `f64`. Panics if this is an integer-kinded
    /// value.
    pub fn as_f64(&self) -> f64 {
        match self.payload {
            Payload::Float(f) => f,
            Payload::Int(_) => panic!("as_f64 called on an integer-kinded TypedValue"),
        }
    }

    /// True iff the integer value is zero, or the float value is `0.0`.
    pub fn is_zero(&self) -> bool {
        match self.payload {
            Payload::Int(bits) => bits == 0,
            Payload::Float(f) => f == 0.0,
        }
    }

    /// Cast this value's bit pattern to `target`, applying implicit
    /// target-language conversion semantics (`spec.md` §4.1
    /// `cast_to`): wrap for unsigned, truncate/extend int-to-int,
    /// implementation conversion for int↔float. Never raises UB.
    pub fn cast_to(&self, reg: &TypeRegistry, target: ScalarKind) -> TypedValue {
        match (self.kind.is_float(), target.is_float()) {
            (false, false) => {
                let v = self.as_i128(reg);
                TypedValue::from_i128(reg, target, v)
            }
            (false, true) => {
                let v = self.as_i128(reg) as f64;
                TypedValue::from_f64(target, v)
            }
            (true, false) => {
                let desc = reg.describe(target);
                let v = self.as_f64();
                // Implementation-defined if out of range; clamp into the
                // representable range the way a saturating cast would, so
                // the generator never emits a value the target width can't
                // hold for a value it constructed itself.
                let clamped = v.clamp(desc.min_i128() as f64, desc.max_i128() as f64);
                TypedValue::from_i128(reg, target, clamped as i128)
            }
            (true, true) => {
                let v = self.as_f64();
                TypedValue::from_f64(target, v)
            }
        }
    }

    /// Resolve this value's descriptor against `reg`.
    pub fn descriptor(&self, reg: &TypeRegistry) -> ScalarDescriptor {
        reg.describe(self.kind)
    }
}

/// Sign-extend the low `width` bits of `bits` to a full 128-bit signed
/// integer.
fn sign_extend(bits: u128, width: u32) -> i128 {
    if width >= 128 {
        return bits as i128;
    }
    let shift = 128 - width;
    ((bits << shift) as i128) >> shift
}

/// Truncate a signed 128-bit value down to `width` bits of two's-complement
/// storage (wrapping, matching C's modulo-2^n unsigned conversion and
/// well-defined truncation for values that already fit).
fn truncate_to_width(value: i128, width: u32) -> u128 {
    if width >= 128 {
        return value as u128;
    }
    let mask = (1u128 << width) - 1;
    (value as u128) & mask
}

/// Number of bits needed to represent nonnegative `x` (`0` for `x == 0`).
/// Shared by the shift operators (`ops.rs`) and the rebuild strategy for
/// oversized left-shifts (`crate::expr::rebuild`).
pub(crate) fn msb_position(x: u128) -> u32 {
    if x == 0 {
        0
    } else {
        128 - x.leading_zeros()
    }
}

pub use ops::{BinOp, UnOp};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BitMode;

    #[test]
    fn round_trips_through_width() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let v = TypedValue::from_i128(&reg, ScalarKind::SChar, -1);
        assert_eq!(v.as_i128(&reg), -1);
        let v = TypedValue::from_i128(&reg, ScalarKind::UChar, 255);
        assert_eq!(v.as_i128(&reg), 255);
    }

    #[test]
    fn cast_truncates_like_c() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let v = TypedValue::from_i128(&reg, ScalarKind::SInt, 300);
        let narrowed = v.cast_to(&reg, ScalarKind::UChar);
        assert_eq!(narrowed.as_i128(&reg), 300 % 256);
    }

    #[test]
    fn float_kind_round_trips_through_f32() {
        let v = TypedValue::from_f64(ScalarKind::Float, 1.0 / 3.0);
        assert_eq!(v.as_f64(), (1.0 / 3.0f32) as f64);
    }
}
