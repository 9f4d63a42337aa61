//! Undefined-behavior classification for [`super::TypedValue`] operators.

use std::fmt;

/// Undefined-behavior category detected while evaluating an operator.
///
/// `NoUB` is the only value a *published* IR node may carry (see
/// `ExprTree` construction discipline); any other value triggers the
/// constructor's rebuild step before the node is handed back to its
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[non_exhaustive]
pub enum UbCode {
    /// No undefined behavior; the value is well-defined.
    NoUB,
    /// Null-pointer dereference. Reserved: this engine never constructs
    /// pointer-typed values, so this variant is unreachable in practice —
    /// kept to mirror the source data model exactly.
    NullPtr,
    /// Signed integer overflow from `+`, `-`, `*`, `++`, `--`, or unary `-`.
    SignOvf,
    /// Special case of signed overflow: the type's minimum value
    /// multiplied or divided by `-1`.
    SignOvfMin,
    /// Division or modulo by zero.
    ZeroDiv,
    /// Shift by a negative right-hand side.
    ShiftRhsNeg,
    /// Shift by an amount greater than or equal to the left-hand side's
    /// bit width (or, for signed `<<`, that would push a set bit past the
    /// width once the left-hand side's most-significant bit is accounted
    /// for).
    ShiftRhsLarge,
    /// Left- or right-shift of a negative left-hand side value. The
    /// standard only calls right-shift-of-negative
    /// implementation-defined; this generator classifies it as UB anyway
    /// so that emitted programs stay portable (see `SPEC_FULL.md` §9).
    NegShift,
    /// Member lookup failed to resolve to a known struct member. Never
    /// produced by this generator's own member-access construction (which
    /// always derives paths from an existing `StructType`); retained so
    /// the UB data model matches the source exactly.
    NoMember,
}

impl UbCode {
    /// True for the only value a published node may carry.
    pub const fn is_ub(self) -> bool {
        !matches!(self, UbCode::NoUB)
    }
}

impl fmt::Display for UbCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
