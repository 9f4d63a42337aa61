//! Operator implementations for [`super::TypedValue`] (`spec.md` §4.1).
//!
//! Grounded on `examples/original_source/include/ir_value.hpp`'s
//! `addOperator`/`subOperator`/`mulOperator`/`divModImpl`/shift-operator
//! template family. Each C++ template specialized per concrete integer
//! type here becomes one function parameterized on the operand's
//! [`crate::types::ScalarDescriptor`] (width + signedness), matching the
//! "branchless lookup" replacement for virtual dispatch called out in
//! `spec.md` §9.

use super::{msb_position, truncate_to_width, TypedValue, UbCode};
use crate::types::{ScalarKind, TypeRegistry};

/// Unary operators over a [`TypedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    /// Unary `+` (no-op beyond promotion, never UB).
    Plus,
    /// Unary `-`.
    Minus,
    /// Bitwise `~`.
    BitNot,
    /// Logical `!`.
    LogNot,
    /// Prefix `++`.
    PreInc,
    /// Prefix `--`.
    PreDec,
    /// Postfix `++` (evaluates to the pre-increment value; the generator
    /// models this identically to prefix at the value level since both
    /// mutate the same variable — only the emitted spelling differs).
    PostInc,
    /// Postfix `--`.
    PostDec,
}

impl UnOp {
    /// The operator this one is rewritten to when it raises UB
    /// (`spec.md` §4.5 rebuild strategy: "swap operator to its
    /// complement").
    pub const fn rebuild_complement(self) -> UnOp {
        match self {
            UnOp::Minus => UnOp::Plus,
            UnOp::PreInc => UnOp::PreDec,
            UnOp::PreDec => UnOp::PreInc,
            UnOp::PostInc => UnOp::PostDec,
            UnOp::PostDec => UnOp::PostInc,
            // BitNot, LogNot, Plus never raise UB; left unchanged.
            other => other,
        }
    }
}

/// Binary operators over a pair of [`TypedValue`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&&`
    LogAnd,
    /// `||`
    LogOr,
}

impl BinOp {
    /// True for `+ - * / % << >>` and the bitwise trio — operators whose
    /// operands undergo usual arithmetic conversion / independent integral
    /// promotion. False for comparisons and logical operators, which
    /// convert to a truth/boolean type instead.
    pub const fn is_arithmetic_or_bitwise(self) -> bool {
        matches!(
            self,
            BinOp::Add
                | BinOp::Sub
                | BinOp::Mul
                | BinOp::Div
                | BinOp::Rem
                | BinOp::Shl
                | BinOp::Shr
                | BinOp::BitAnd
                | BinOp::BitOr
                | BinOp::BitXor
        )
    }

    /// True for `<< >>` — independent integral promotion per side, no
    /// common type.
    pub const fn is_shift(self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr)
    }

    /// True for relational/equality comparisons.
    pub const fn is_comparison(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne)
    }

    /// True for `&&`/`||`.
    pub const fn is_logical(self) -> bool {
        matches!(self, BinOp::LogAnd | BinOp::LogOr)
    }

    /// Never-UB bitwise/comparison operators pass through unchanged on
    /// rebuild; arithmetic ones swap per `spec.md` §4.5's rebuild table.
    pub const fn is_never_ub(self) -> bool {
        matches!(
            self,
            BinOp::BitAnd
                | BinOp::BitOr
                | BinOp::BitXor
                | BinOp::Lt
                | BinOp::Gt
                | BinOp::Le
                | BinOp::Ge
                | BinOp::Eq
                | BinOp::Ne
                | BinOp::LogAnd
                | BinOp::LogOr
        )
    }
}

impl TypedValue {
    /// Apply a unary operator, per-type-kind, with UB detection
    /// (`spec.md` §4.1).
    pub fn apply_unary(&self, reg: &TypeRegistry, op: UnOp) -> TypedValue {
        if self.kind.is_float() {
            let v = self.as_f64();
            return match op {
                UnOp::Plus => TypedValue::from_f64(self.kind, v),
                UnOp::Minus => TypedValue::from_f64(self.kind, -v),
                UnOp::PreInc | UnOp::PostInc => TypedValue::from_f64(self.kind, v + 1.0),
                UnOp::PreDec | UnOp::PostDec => TypedValue::from_f64(self.kind, v - 1.0),
                UnOp::LogNot => TypedValue::from_i128(reg, ScalarKind::Bool, (v == 0.0) as i128),
                UnOp::BitNot => unreachable!("BitNot is never formed over a float operand"),
            };
        }

        let desc = reg.describe(self.kind);
        let v = self.as_i128(reg);
        match op {
            UnOp::Plus => *self,
            UnOp::BitNot => {
                let bits = self.as_u128_bits();
                let flipped = (!bits) & width_mask(desc.width_bits);
                TypedValue {
                    kind: self.kind,
                    payload: super::Payload::Int(flipped),
                    ub: UbCode::NoUB,
                }
            }
            UnOp::LogNot => TypedValue::from_i128(reg, ScalarKind::Bool, (v == 0) as i128),
            UnOp::Minus => {
                if desc.is_signed && v == desc.min_i128() {
                    TypedValue::with_ub(self.kind, UbCode::SignOvf)
                } else {
                    checked_or_ub(self.kind, desc.is_signed, desc.width_bits, -v, reg)
                }
            }
            UnOp::PreInc | UnOp::PostInc => add_or_ub(reg, self.kind, v, 1),
            UnOp::PreDec | UnOp::PostDec => add_or_ub(reg, self.kind, v, -1),
        }
    }

    /// Apply a binary arithmetic/bitwise operator. Both operands must
    /// already share a type (`spec.md` §3 invariant, enforced by the
    /// expression constructor's type-propagation phase) except for the
    /// shift operators, which promote each side independently.
    pub fn apply_binary(&self, reg: &TypeRegistry, op: BinOp, rhs: &TypedValue) -> TypedValue {
        if op.is_shift() {
            return self.apply_shift(reg, op, rhs);
        }
        if op.is_comparison() {
            return self.apply_comparison(reg, op, rhs);
        }
        if op.is_logical() {
            return self.apply_logical(op, rhs, reg);
        }

        if self.kind.is_float() || rhs.kind.is_float() {
            return self.apply_float_arithmetic(op, rhs);
        }

        debug_assert_eq!(self.kind, rhs.kind, "binary arithmetic requires equal operand types");
        let desc = reg.describe(self.kind);
        let a = self.as_i128(reg);
        let b = rhs.as_i128(reg);

        match op {
            BinOp::Add => add_or_ub(reg, self.kind, a, b),
            BinOp::Sub => sub_or_ub(reg, self.kind, a, b),
            BinOp::Mul => mul_or_ub(reg, self.kind, desc.is_signed, desc.min_i128(), a, b),
            BinOp::Div => div_or_ub(reg, self.kind, desc.is_signed, desc.min_i128(), a, b),
            BinOp::Rem => rem_or_ub(reg, self.kind, desc.is_signed, desc.min_i128(), a, b),
            BinOp::BitAnd => bitwise(reg, self.kind, desc.width_bits, a as u128 & b as u128),
            BinOp::BitOr => bitwise(reg, self.kind, desc.width_bits, (self.as_u128_bits()) | (rhs.as_u128_bits())),
            BinOp::BitXor => bitwise(reg, self.kind, desc.width_bits, (self.as_u128_bits()) ^ (rhs.as_u128_bits())),
            _ => unreachable!("handled above"),
        }
    }

    fn apply_float_arithmetic(&self, op: BinOp, rhs: &TypedValue) -> TypedValue {
        debug_assert_eq!(self.kind, rhs.kind, "binary arithmetic requires equal operand types");
        let a = self.as_f64();
        let b = rhs.as_f64();
        let result = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            // FP division by zero is not classified as UB by this core
            // (`spec.md` §4.1, §9 Open Questions).
            BinOp::Div => a / b,
            BinOp::Rem => a % b,
            _ => unreachable!("bitwise/shift ops never reach float operands"),
        };
        TypedValue::from_f64(self.kind, result)
    }

    fn apply_shift(&self, reg: &TypeRegistry, op: BinOp, rhs: &TypedValue) -> TypedValue {
        let lhs_desc = reg.describe(self.kind);
        let rhs_desc = reg.describe(rhs.kind);
        let rhs_val = rhs.as_i128(reg);

        if rhs_desc.is_signed && rhs_val < 0 {
            return TypedValue::with_ub(self.kind, UbCode::ShiftRhsNeg);
        }
        if rhs_val >= lhs_desc.width_bits as i128 {
            return TypedValue::with_ub(self.kind, UbCode::ShiftRhsLarge);
        }

        if lhs_desc.is_signed {
            let lhs_val = self.as_i128(reg);
            if lhs_val < 0 {
                return TypedValue::with_ub(self.kind, UbCode::NegShift);
            }
            if op == BinOp::Shl {
                let msb = msb_position(lhs_val as u128);
                let max_avail_shift = lhs_desc.width_bits as i128 - msb as i128;
                if rhs_val > max_avail_shift {
                    return TypedValue::with_ub(self.kind, UbCode::ShiftRhsLarge);
                }
            }
            let shifted = match op {
                BinOp::Shl => lhs_val << rhs_val,
                BinOp::Shr => lhs_val >> rhs_val,
                _ => unreachable!(),
            };
            TypedValue::from_i128(reg, self.kind, shifted)
        } else {
            let bits = self.as_u128_bits();
            let amount = rhs_val as u32;
            let shifted = match op {
                BinOp::Shl => (bits << amount) & width_mask(lhs_desc.width_bits),
                BinOp::Shr => bits >> amount,
                _ => unreachable!(),
            };
            TypedValue {
                kind: self.kind,
                payload: super::Payload::Int(shifted),
                ub: UbCode::NoUB,
            }
        }
    }

    fn apply_comparison(&self, reg: &TypeRegistry, op: BinOp, rhs: &TypedValue) -> TypedValue {
        let ord = if self.kind.is_float() || rhs.kind.is_float() {
            self.as_f64().partial_cmp(&rhs.as_f64())
        } else {
            self.as_i128(reg).partial_cmp(&rhs.as_i128(reg))
        };
        let result = match (op, ord) {
            (BinOp::Lt, Some(o)) => o.is_lt(),
            (BinOp::Gt, Some(o)) => o.is_gt(),
            (BinOp::Le, Some(o)) => o.is_le(),
            (BinOp::Ge, Some(o)) => o.is_ge(),
            (BinOp::Eq, Some(o)) => o.is_eq(),
            (BinOp::Ne, Some(o)) => !o.is_eq(),
            // Unordered (NaN) comparisons: only `!=` is true.
            (BinOp::Ne, None) => true,
            (_, None) => false,
            _ => unreachable!(),
        };
        TypedValue::from_i128(reg, ScalarKind::Bool, result as i128)
    }

    fn apply_logical(&self, op: BinOp, rhs: &TypedValue, reg: &TypeRegistry) -> TypedValue {
        let a = !self.is_zero();
        let b = !rhs.is_zero();
        let result = match op {
            BinOp::LogAnd => a && b,
            BinOp::LogOr => a || b,
            _ => unreachable!(),
        };
        TypedValue::from_i128(reg, ScalarKind::Bool, result as i128)
    }
}

fn width_mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

fn checked_or_ub(kind: ScalarKind, is_signed: bool, width: u32, result: i128, reg: &TypeRegistry) -> TypedValue {
    let desc = reg.describe(kind);
    if is_signed && (result < desc.min_i128() || result > desc.max_i128()) {
        TypedValue::with_ub(kind, UbCode::SignOvf)
    } else {
        TypedValue::from_i128(reg, kind, truncate_to_width(result, width) as i128)
    }
}

fn add_or_ub(reg: &TypeRegistry, kind: ScalarKind, a: i128, b: i128) -> TypedValue {
    let desc = reg.describe(kind);
    let sum = a + b;
    if desc.is_signed {
        if sum < desc.min_i128() || sum > desc.max_i128() {
            TypedValue::with_ub(kind, UbCode::SignOvf)
        } else {
            TypedValue::from_i128(reg, kind, sum)
        }
    } else {
        // Unsigned wraps modulo 2^n, never UB (`spec.md` §4.1).
        TypedValue::from_i128(reg, kind, truncate_to_width(sum, desc.width_bits) as i128)
    }
}

fn sub_or_ub(reg: &TypeRegistry, kind: ScalarKind, a: i128, b: i128) -> TypedValue {
    let desc = reg.describe(kind);
    let diff = a - b;
    if desc.is_signed {
        if diff < desc.min_i128() || diff > desc.max_i128() {
            TypedValue::with_ub(kind, UbCode::SignOvf)
        } else {
            TypedValue::from_i128(reg, kind, diff)
        }
    } else {
        TypedValue::from_i128(reg, kind, truncate_to_width(diff, desc.width_bits) as i128)
    }
}

fn mul_or_ub(reg: &TypeRegistry, kind: ScalarKind, is_signed: bool, min: i128, a: i128, b: i128) -> TypedValue {
    let desc = reg.describe(kind);
    if is_signed {
        if (a == min && b == -1) || (b == min && a == -1) {
            return TypedValue::with_ub(kind, UbCode::SignOvfMin);
        }
        let product = a * b;
        if product < desc.min_i128() || product > desc.max_i128() {
            TypedValue::with_ub(kind, UbCode::SignOvf)
        } else {
            TypedValue::from_i128(reg, kind, product)
        }
    } else {
        let product = (a as u128).wrapping_mul(b as u128);
        TypedValue::from_i128(reg, kind, truncate_to_width(product as i128, desc.width_bits) as i128)
    }
}

fn div_or_ub(reg: &TypeRegistry, kind: ScalarKind, is_signed: bool, min: i128, a: i128, b: i128) -> TypedValue {
    if b == 0 {
        return TypedValue::with_ub(kind, UbCode::ZeroDiv);
    }
    if is_signed && a == min && b == -1 {
        return TypedValue::with_ub(kind, UbCode::SignOvf);
    }
    TypedValue::from_i128(reg, kind, a / b)
}

fn rem_or_ub(reg: &TypeRegistry, kind: ScalarKind, is_signed: bool, min: i128, a: i128, b: i128) -> TypedValue {
    if b == 0 {
        return TypedValue::with_ub(kind, UbCode::ZeroDiv);
    }
    if is_signed && a == min && b == -1 {
        return TypedValue::with_ub(kind, UbCode::SignOvf);
    }
    TypedValue::from_i128(reg, kind, a % b)
}

fn bitwise(reg: &TypeRegistry, kind: ScalarKind, width: u32, raw: u128) -> TypedValue {
    TypedValue::from_i128(reg, kind, truncate_to_width((raw & width_mask(width)) as i128, width) as i128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BitMode;

    fn reg() -> TypeRegistry {
        TypeRegistry::new(BitMode::Mode64)
    }

    #[test]
    fn s1_signed_minimum_negation_rebuilds_to_plus() {
        let reg = reg();
        let min_int = TypedValue::from_i128(&reg, ScalarKind::SInt, i32::MIN as i128);
        let negated = min_int.apply_unary(&reg, UnOp::Minus);
        assert_eq!(negated.ub(), UbCode::SignOvf);

        let rebuilt_op = UnOp::Minus.rebuild_complement();
        assert_eq!(rebuilt_op, UnOp::Plus);
        let published = min_int.apply_unary(&reg, rebuilt_op);
        assert!(published.is_well_defined());
        assert_eq!(published.as_i128(&reg), i32::MIN as i128);
    }

    #[test]
    fn s2_zero_division_rebuilds_to_multiply() {
        let reg = reg();
        let seven = TypedValue::from_i128(&reg, ScalarKind::UInt, 7);
        let zero = TypedValue::from_i128(&reg, ScalarKind::UInt, 0);
        let divided = seven.apply_binary(&reg, BinOp::Div, &zero);
        assert_eq!(divided.ub(), UbCode::ZeroDiv);

        let published = seven.apply_binary(&reg, BinOp::Mul, &zero);
        assert!(published.is_well_defined());
        assert_eq!(published.as_i128(&reg), 0);
    }

    #[test]
    fn unsigned_add_never_ub() {
        let reg = reg();
        let max = TypedValue::from_i128(&reg, ScalarKind::UChar, 255);
        let one = TypedValue::from_i128(&reg, ScalarKind::UChar, 1);
        let wrapped = max.apply_binary(&reg, BinOp::Add, &one);
        assert!(wrapped.is_well_defined());
        assert_eq!(wrapped.as_i128(&reg), 0);
    }

    #[test]
    fn signed_add_overflow_is_ub() {
        let reg = reg();
        let max = TypedValue::from_i128(&reg, ScalarKind::SChar, 127);
        let one = TypedValue::from_i128(&reg, ScalarKind::SChar, 1);
        let result = max.apply_binary(&reg, BinOp::Add, &one);
        assert_eq!(result.ub(), UbCode::SignOvf);
    }

    #[test]
    fn mul_by_minus_one_at_min_is_sign_ovf_min() {
        let reg = reg();
        let min = TypedValue::from_i128(&reg, ScalarKind::SInt, i32::MIN as i128);
        let neg_one = TypedValue::from_i128(&reg, ScalarKind::SInt, -1);
        let result = min.apply_binary(&reg, BinOp::Mul, &neg_one);
        assert_eq!(result.ub(), UbCode::SignOvfMin);
    }

    #[test]
    fn div_by_minus_one_at_min_is_sign_ovf() {
        let reg = reg();
        let min = TypedValue::from_i128(&reg, ScalarKind::SInt, i32::MIN as i128);
        let neg_one = TypedValue::from_i128(&reg, ScalarKind::SInt, -1);
        let result = min.apply_binary(&reg, BinOp::Div, &neg_one);
        assert_eq!(result.ub(), UbCode::SignOvf);
    }

    #[test]
    fn s3_shift_too_large_raises_shift_rhs_large() {
        let reg = reg();
        let one = TypedValue::from_i128(&reg, ScalarKind::SInt, 1);
        let forty = TypedValue::from_i128(&reg, ScalarKind::SInt, 40);
        let result = one.apply_binary(&reg, BinOp::Shl, &forty);
        assert_eq!(result.ub(), UbCode::ShiftRhsLarge);
    }

    #[test]
    fn shift_rhs_negative_raises_shift_rhs_neg() {
        let reg = reg();
        let one = TypedValue::from_i128(&reg, ScalarKind::SInt, 1);
        let neg = TypedValue::from_i128(&reg, ScalarKind::SInt, -1);
        let result = one.apply_binary(&reg, BinOp::Shl, &neg);
        assert_eq!(result.ub(), UbCode::ShiftRhsNeg);
    }

    #[test]
    fn negative_lhs_shift_is_neg_shift() {
        let reg = reg();
        let neg = TypedValue::from_i128(&reg, ScalarKind::SInt, -4);
        let one = TypedValue::from_i128(&reg, ScalarKind::SInt, 1);
        let result = neg.apply_binary(&reg, BinOp::Shr, &one);
        assert_eq!(result.ub(), UbCode::NegShift);
    }

    #[test]
    fn comparison_never_raises_ub() {
        let reg = reg();
        let a = TypedValue::from_i128(&reg, ScalarKind::SInt, 3);
        let b = TypedValue::from_i128(&reg, ScalarKind::SInt, 5);
        let lt = a.apply_binary(&reg, BinOp::Lt, &b);
        assert!(lt.is_well_defined());
        assert_eq!(lt.kind(), ScalarKind::Bool);
        assert_eq!(lt.as_i128(&reg), 1);
    }

    #[test]
    fn fp_division_by_zero_is_not_ub() {
        let zero = TypedValue::from_f64(ScalarKind::Double, 0.0);
        let one = TypedValue::from_f64(ScalarKind::Double, 1.0);
        let result = one.apply_binary(&reg(), BinOp::Div, &zero);
        assert!(result.is_well_defined());
        assert!(result.as_f64().is_infinite());
    }
}
