//! Deterministic, non-backtracking rebuild strategy (`spec.md` §4.5).
//!
//! When evaluating a freshly type-propagated node surfaces UB, the
//! constructor swaps the operator (or rewrites an operand) according to a
//! fixed table and re-evaluates — never searching, never giving up.
//! Termination is guaranteed because every rewrite strictly reduces to an
//! operator/operand pairing that cannot raise the same UB code again
//! (`examples/original_source/src/expr.cpp`'s `rebuild` methods).

use crate::types::TypeRegistry;
use crate::value::{msb_position, BinOp, TypedValue, UbCode, UnOp};

use super::{raw_binary, Expr};

/// Maximum rebuild attempts before giving up and treating the situation
/// as a programmer error. In practice every rebuild table entry reaches
/// `NoUB` within two iterations; this bound only guards against a future
/// table edit introducing a cycle.
const MAX_REBUILD_ATTEMPTS: usize = 6;

/// Evaluate and, if necessary, rebuild a unary node until it publishes a
/// well-defined value.
pub(crate) fn construct_unary(reg: &TypeRegistry, op: UnOp, child: Expr) -> (UnOp, Expr, TypedValue) {
    let mut op = op;
    for _ in 0..MAX_REBUILD_ATTEMPTS {
        let result = child.result().apply_unary(reg, op);
        if result.is_well_defined() {
            return (op, child, result);
        }
        let rebuilt = op.rebuild_complement();
        debug_assert_ne!(rebuilt, op, "unary rebuild table has no complement for {op:?}");
        op = rebuilt;
    }
    unreachable!("unary rebuild failed to reach NoUB within {MAX_REBUILD_ATTEMPTS} attempts")
}

/// Evaluate and, if necessary, rebuild a binary node until it publishes a
/// well-defined value.
pub(crate) fn construct_binary(reg: &TypeRegistry, op: BinOp, lhs: Expr, rhs: Expr) -> (BinOp, Expr, Expr, TypedValue) {
    if op.is_never_ub() {
        let result = lhs.result().apply_binary(reg, op, &rhs.result());
        debug_assert!(result.is_well_defined(), "comparison/bitwise operator raised UB");
        return (op, lhs, rhs, result);
    }

    if op.is_shift() {
        return construct_shift(reg, op, lhs, rhs);
    }

    construct_arithmetic(reg, op, lhs, rhs)
}

fn construct_arithmetic(reg: &TypeRegistry, op: BinOp, lhs: Expr, rhs: Expr) -> (BinOp, Expr, Expr, TypedValue) {
    let mut op = op;
    for _ in 0..MAX_REBUILD_ATTEMPTS {
        let result = lhs.result().apply_binary(reg, op, &rhs.result());
        if result.is_well_defined() {
            return (op, lhs, rhs, result);
        }
        op = rebuild_arithmetic_op(op, result.ub());
    }
    unreachable!("arithmetic rebuild failed to reach NoUB within {MAX_REBUILD_ATTEMPTS} attempts")
}

/// The rebuild table for `+ - * / %` (`spec.md` §4.5):
/// `+` ↔ `-`; `*` on `SignOvfMin` → `-`, else → `/`; `/` or `%` on
/// `ZeroDiv` → `*`, else → `-`.
fn rebuild_arithmetic_op(op: BinOp, ub: UbCode) -> BinOp {
    match (op, ub) {
        (BinOp::Add, _) => BinOp::Sub,
        (BinOp::Sub, _) => BinOp::Add,
        (BinOp::Mul, UbCode::SignOvfMin) => BinOp::Sub,
        (BinOp::Mul, _) => BinOp::Div,
        (BinOp::Div, UbCode::ZeroDiv) => BinOp::Mul,
        (BinOp::Div, _) => BinOp::Sub,
        (BinOp::Rem, UbCode::ZeroDiv) => BinOp::Mul,
        (BinOp::Rem, _) => BinOp::Sub,
        (other, _) => other,
    }
}

fn construct_shift(reg: &TypeRegistry, op: BinOp, lhs: Expr, rhs: Expr) -> (BinOp, Expr, Expr, TypedValue) {
    let mut lhs = lhs;
    let mut rhs = rhs;
    for _ in 0..MAX_REBUILD_ATTEMPTS {
        let result = lhs.result().apply_binary(reg, op, &rhs.result());
        match result.ub() {
            UbCode::NoUB => return (op, lhs, rhs, result),
            UbCode::ShiftRhsNeg | UbCode::ShiftRhsLarge => rhs = rewrite_shift_rhs(reg, op, &lhs, rhs),
            UbCode::NegShift => lhs = rewrite_shift_lhs(reg, lhs),
            other => unreachable!("shift raised unexpected UB code {other:?}"),
        }
    }
    unreachable!("shift rebuild failed to reach NoUB within {MAX_REBUILD_ATTEMPTS} attempts")
}

/// Rewrite an out-of-range shift amount as `rhs − k`, landing in
/// `[0, max_exclusive)` where `max_exclusive` accounts for the
/// left-hand side's most-significant-bit position when the operator is
/// `<<` on a nonnegative signed operand (`spec.md` §4.5 rebuild table).
fn rewrite_shift_rhs(reg: &TypeRegistry, op: BinOp, lhs: &Expr, rhs: Expr) -> Expr {
    let lhs_val = lhs.result();
    let lhs_desc = reg.describe(lhs_val.kind());
    let width = lhs_desc.width_bits as i128;

    let max_exclusive = if op == BinOp::Shl && lhs_desc.is_signed {
        let lv = lhs_val.as_i128(reg);
        if lv >= 0 {
            (width - msb_position(lv as u128) as i128).max(1)
        } else {
            width
        }
    } else {
        width
    };

    let rhs_kind = rhs.kind();
    let rhs_val = rhs.result().as_i128(reg);
    let new_rhs_val = rhs_val.rem_euclid(max_exclusive);
    let k = rhs_val - new_rhs_val;
    if k == 0 {
        return rhs;
    }
    let const_k = TypedValue::from_i128(reg, rhs_kind, k);
    let new_result = TypedValue::from_i128(reg, rhs_kind, new_rhs_val);
    raw_binary(BinOp::Sub, rhs, Expr::Const(const_k), new_result)
}

/// Rewrite a negative shift left-hand side as `lhs + TYPE_MAX`
/// (`spec.md` §4.5 rebuild table), falling back to `lhs & TYPE_MAX` (never
/// UB) if the addition would itself overflow.
fn rewrite_shift_lhs(reg: &TypeRegistry, lhs: Expr) -> Expr {
    let val = lhs.result();
    let desc = reg.describe(val.kind());
    let max_val = TypedValue::from_i128(reg, val.kind(), desc.max_i128());

    let added = val.apply_binary(reg, BinOp::Add, &max_val);
    if added.is_well_defined() {
        raw_binary(BinOp::Add, lhs, Expr::Const(max_val), added)
    } else {
        let anded = val.apply_binary(reg, BinOp::BitAnd, &max_val);
        debug_assert!(anded.is_well_defined());
        raw_binary(BinOp::BitAnd, lhs, Expr::Const(max_val), anded)
    }
}
