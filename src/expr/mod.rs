//! Expression trees: construction discipline, type propagation, and value
//! propagation with rebuild-on-UB (`spec.md` §4.5 — the most important
//! semantic section of the system).
//!
//! Grounded on `examples/original_source/src/expr.cpp`'s node constructors,
//! which run type propagation then value propagation and rebuild the node
//! in place when evaluation surfaces undefined behavior. Shared
//! substructure (a `MemberExpr` pointing at a struct instance, a CSE
//! template reused at several call sites) becomes either a cheap `Rc`
//! clone (struct/array storage — owned by `crate::object`, referenced, not
//! duplicated) or, for CSE templates specifically, a real clone of the
//! template subtree (`spec.md` §9 design note; `SPEC_FULL.md` §10).

pub mod rebuild;

use std::rc::Rc;

use rand::Rng;

use crate::object::ScalarVariable;
use crate::types::{ScalarKind, TypeRegistry};
use crate::value::{BinOp, TypedValue, UnOp};

/// A unary expression node: operator, operand, and the published
/// (UB-free) result.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub child: Expr,
    pub result: TypedValue,
}

/// A binary expression node.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub lhs: Expr,
    pub rhs: Expr,
    pub result: TypedValue,
}

/// A ternary (`cond ? then : else`) expression node. `then`/`else` have
/// already been usual-arithmetic-converted to a single static type
/// (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct TernaryExpr {
    pub cond: Expr,
    pub then_branch: Expr,
    pub else_branch: Expr,
    pub result: TypedValue,
}

/// An explicit implicit-conversion node, `(T)(expr)`.
#[derive(Debug, Clone)]
pub struct CastExpr {
    pub target: ScalarKind,
    pub child: Expr,
    pub result: TypedValue,
}

/// An assignment expression: `place = value`. `place` is always a
/// `VarUse` or `MemberAccess` node.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub place: Expr,
    pub value: Expr,
    pub result: TypedValue,
}

/// One node of a generated expression tree.
///
/// Every constructor below upholds the "published node" invariant from
/// `spec.md` §3/§4.5: the returned node's [`TypedValue::is_well_defined`]
/// is always `true`. UB detected mid-construction is resolved internally
/// by [`rebuild`] before the node is handed back.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal constant.
    Const(TypedValue),
    /// A read of a plain (non-member) scalar variable.
    VarUse(Rc<ScalarVariable>),
    /// A read reached through struct-member or array-subscript access.
    /// The `Rc<str>` is the emitted access path (`"s.a.b"`, `"arr[2]"`);
    /// semantics are carried entirely by the referenced `ScalarVariable`.
    MemberAccess(Rc<ScalarVariable>, Rc<str>),
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Ternary(Box<TernaryExpr>),
    Cast(Box<CastExpr>),
    Assign(Box<AssignExpr>),
    /// A reuse of a previously generated common-subexpression template,
    /// cloned at the point of use (`spec.md` §9, `SPEC_FULL.md` §10).
    Cse(Box<Expr>),
}

impl Expr {
    /// The value this node publishes. Always well-defined.
    pub fn result(&self) -> TypedValue {
        match self {
            Expr::Const(v) => *v,
            Expr::VarUse(v) => v.current(),
            Expr::MemberAccess(v, _) => v.current(),
            Expr::Unary(e) => e.result,
            Expr::Binary(e) => e.result,
            Expr::Ternary(e) => e.result,
            Expr::Cast(e) => e.result,
            Expr::Assign(e) => e.result,
            Expr::Cse(inner) => inner.result(),
        }
    }

    /// The static type of this node's result.
    pub fn kind(&self) -> ScalarKind {
        self.result().kind()
    }

    /// True for `VarUse`/`MemberAccess` — nodes that may appear as an
    /// assignment's left-hand side.
    pub fn is_place(&self) -> bool {
        matches!(self, Expr::VarUse(_) | Expr::MemberAccess(..))
    }

    pub fn new_const(value: TypedValue) -> Expr {
        Expr::Const(value)
    }

    pub fn new_var_use(var: Rc<ScalarVariable>) -> Expr {
        Expr::VarUse(var)
    }

    pub fn new_member_access(var: Rc<ScalarVariable>, path: impl Into<Rc<str>>) -> Expr {
        Expr::MemberAccess(var, path.into())
    }

    /// Wrap a previously built template expression for reuse as a common
    /// subexpression (`spec.md` §9: "CSE templates…stored centrally by
    /// index, cloned on use"). The template is rebuilt bottom-up through
    /// the same constructors used when it was first generated rather than
    /// just cloned: a compound node's published `result` is a fact about
    /// the variable values at the moment it was *built*, and a reused
    /// template may be textually re-emitted at a later point in the
    /// program where those variables have since been reassigned — so the
    /// reuse must re-evaluate, not replay a stale value (`spec.md` §4.5).
    pub fn new_cse_use(reg: &TypeRegistry, template: &Expr) -> Expr {
        Expr::Cse(Box::new(reevaluate(reg, template)))
    }

    /// Build an implicit-conversion node. Never raises UB
    /// ([`TypedValue::cast_to`]'s contract).
    pub fn new_cast(reg: &TypeRegistry, target: ScalarKind, child: Expr) -> Expr {
        if child.kind() == target {
            return child;
        }
        let result = child.result().cast_to(reg, target);
        Expr::Cast(Box::new(CastExpr { target, child, result }))
    }

    /// Build a unary expression: type-propagate (promotion), then
    /// value-propagate with rebuild-on-UB (`spec.md` §4.5).
    pub fn new_unary(reg: &TypeRegistry, op: UnOp, child: Expr) -> Expr {
        let child = promote_operand(reg, child);
        let (op, child, result) = rebuild::construct_unary(reg, op, child);
        Expr::Unary(Box::new(UnaryExpr { op, child, result }))
    }

    /// Build a binary expression, applying the operator-family-specific
    /// type propagation rule (`spec.md` §4.5) before value propagation and
    /// rebuild.
    pub fn new_binary(reg: &TypeRegistry, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        let (lhs, rhs) = if op.is_shift() {
            (promote_operand(reg, lhs), promote_operand(reg, rhs))
        } else if op.is_logical() {
            (coerce_to_truth(reg, lhs), coerce_to_truth(reg, rhs))
        } else {
            usual_arithmetic_convert(reg, lhs, rhs)
        };
        let (op, lhs, rhs, result) = rebuild::construct_binary(reg, op, lhs, rhs);
        Expr::Binary(Box::new(BinaryExpr { op, lhs, rhs, result }))
    }

    /// Build a ternary expression. The condition is truth-converted; the
    /// two branches are usual-arithmetic-converted so the whole expression
    /// has one static type (`spec.md` §4.5 edge case).
    pub fn new_ternary(reg: &TypeRegistry, cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        let cond = coerce_to_truth(reg, cond);
        let (then_branch, else_branch) = usual_arithmetic_convert(reg, then_branch, else_branch);
        let result = if !cond.result().is_zero() {
            then_branch.result()
        } else {
            else_branch.result()
        };
        Expr::Ternary(Box::new(TernaryExpr {
            cond,
            then_branch,
            else_branch,
            result,
        }))
    }

    /// Build an assignment. `value` is implicitly cast to `place`'s type
    /// (narrowing permitted here — `spec.md` §8 property 5). If `place` is
    /// a bit-field member and the cast value doesn't fit, the rhs is
    /// rewritten to `(rhs − rhs) + random_in_range(min, max)` so the
    /// stored value always lands in range (`spec.md` §4.5 edge case).
    ///
    /// `taken` is the enclosing branch's precomputed taken flag
    /// (`spec.md` §3 `If` node, `Context::taken`): a syntactically valid
    /// `Assign` node is always returned for emission, but `place`'s
    /// backing variable is only actually mutated when `taken` is true —
    /// an assignment textually inside a not-taken `if`/`else` branch must
    /// not affect values reachable along the path that really executes
    /// (`examples/original_source/src/expr.cpp`'s `AssignExpr::propagate_value`:
    /// `if (!taken) return NoUB;` before `set_value`).
    pub fn new_assign(reg: &TypeRegistry, rng: &mut impl Rng, place: Expr, value: Expr, taken: bool) -> Expr {
        debug_assert!(place.is_place(), "assignment target must be a VarUse or MemberAccess");
        let place_kind = place.kind();
        let value = Expr::new_cast(reg, place_kind, value);
        let mut result = value.result();
        let mut value = value;

        if let Expr::MemberAccess(var, _) = &place {
            if let Some(_width) = var.bitfield_width() {
                let (min, max) = var.value_range(reg);
                let v = result.as_i128(reg);
                if v < min || v > max {
                    let random_val = rng.gen_range(min..=max);
                    let zero = TypedValue::from_i128(reg, place_kind, 0);
                    let self_diff = raw_binary(BinOp::Sub, value.clone(), value.clone(), zero);
                    let random_const = TypedValue::from_i128(reg, place_kind, random_val);
                    value = raw_binary(BinOp::Add, self_diff, Expr::Const(random_const), random_const);
                    result = random_const;
                }
            }
        }

        if taken {
            match &place {
                Expr::VarUse(var) => var.assign(result),
                Expr::MemberAccess(var, _) => var.assign(result),
                _ => unreachable!("checked by is_place"),
            }
        }

        Expr::Assign(Box::new(AssignExpr { place, value, result }))
    }
}

/// Build a binary node directly from an already-known result, bypassing
/// the rebuild loop. Used internally by the rebuild strategy itself (the
/// rewritten rhs/lhs wrapper expressions are constructed to already be
/// UB-free by the arithmetic used to derive them) and by bit-field
/// assignment clamping.
pub(crate) fn raw_binary(op: BinOp, lhs: Expr, rhs: Expr, result: TypedValue) -> Expr {
    debug_assert!(result.is_well_defined());
    Expr::Binary(Box::new(BinaryExpr { op, lhs, rhs, result }))
}

/// Re-run a cloned subtree through its original constructors, recursing
/// into children first so every compound node's `result` reflects current
/// variable state rather than whatever it was when the template was first
/// built. Leaves (`Const`/`VarUse`/`MemberAccess`) already read live state
/// on every `.result()` call, so they're cloned as-is; `Assign` never
/// appears inside a CSE template (`Generator::gen_expr` never produces
/// one), so it's cloned rather than re-run too.
fn reevaluate(reg: &TypeRegistry, expr: &Expr) -> Expr {
    match expr {
        Expr::Const(_) | Expr::VarUse(_) | Expr::MemberAccess(..) | Expr::Assign(_) => expr.clone(),
        Expr::Unary(u) => Expr::new_unary(reg, u.op, reevaluate(reg, &u.child)),
        Expr::Binary(b) => Expr::new_binary(reg, b.op, reevaluate(reg, &b.lhs), reevaluate(reg, &b.rhs)),
        Expr::Ternary(t) => Expr::new_ternary(reg, reevaluate(reg, &t.cond), reevaluate(reg, &t.then_branch), reevaluate(reg, &t.else_branch)),
        Expr::Cast(c) => Expr::new_cast(reg, c.target, reevaluate(reg, &c.child)),
        Expr::Cse(inner) => reevaluate(reg, inner),
    }
}

/// Bit-field-aware integral promotion for one operand (`spec.md` §4.2):
/// floats pass through; integers below `int` rank promote to `int`,
/// unless they're a narrow bit-field member, handled by
/// [`TypeRegistry::integral_promotion_target`].
fn promote_operand(reg: &TypeRegistry, e: Expr) -> Expr {
    let kind = e.kind();
    if kind.is_float() {
        return e;
    }
    let hint = match &e {
        Expr::MemberAccess(var, _) => var.bitfield_width(),
        _ => None,
    };
    let target = reg.integral_promotion_target(kind, hint);
    Expr::new_cast(reg, target, e)
}

/// Convert `e` to a truth-typed operand (`bool`) for `&&`/`||`/ternary
/// conditions (`spec.md` §4.1 logical operator rule).
fn coerce_to_truth(reg: &TypeRegistry, e: Expr) -> Expr {
    if e.kind() == ScalarKind::Bool {
        e
    } else {
        Expr::new_cast(reg, ScalarKind::Bool, e)
    }
}

/// Usual arithmetic conversion (`spec.md` §4.5): promote both operands,
/// then unify their types per the five-case ladder:
///
/// 1. same type → done
/// 2. same signedness → cast the lower-rank operand up
/// 3. unsigned rank ≥ signed rank → cast the signed operand to unsigned
/// 4. the signed type can represent every value of the unsigned type →
///    cast the unsigned operand to signed
/// 5. otherwise → cast both operands to the signed side's corresponding
///    unsigned type
///
/// Floating-point operands short-circuit to the widest float type
/// involved; an int operand paired with a float widens to that float
/// type.
pub(crate) fn usual_arithmetic_convert(reg: &TypeRegistry, lhs: Expr, rhs: Expr) -> (Expr, Expr) {
    let lhs = promote_operand(reg, lhs);
    let rhs = promote_operand(reg, rhs);
    let lk = lhs.kind();
    let rk = rhs.kind();

    if lk.is_float() || rk.is_float() {
        let target = match (lk.is_float(), rk.is_float()) {
            (true, true) => reg.wider_float(lk, rk),
            (true, false) => lk,
            (false, true) => rk,
            (false, false) => unreachable!(),
        };
        return (Expr::new_cast(reg, target, lhs), Expr::new_cast(reg, target, rhs));
    }

    if lk == rk {
        return (lhs, rhs);
    }

    let ld = reg.describe(lk);
    let rd = reg.describe(rk);
    let target = if ld.is_signed == rd.is_signed {
        if ld.rank >= rd.rank {
            lk
        } else {
            rk
        }
    } else {
        let (signed_kind, unsigned_kind) = if ld.is_signed { (lk, rk) } else { (rk, lk) };
        let signed_rank = reg.rank(signed_kind);
        let unsigned_rank = reg.rank(unsigned_kind);
        if unsigned_rank >= signed_rank {
            unsigned_kind
        } else if reg.can_represent(unsigned_kind, signed_kind) {
            signed_kind
        } else {
            reg.corresponding_unsigned(signed_kind)
        }
    };

    (Expr::new_cast(reg, target, lhs), Expr::new_cast(reg, target, rhs))
}
