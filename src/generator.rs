//! `Generator`: top-down recursive program construction under shared
//! budgets (`spec.md` §4.9).
//!
//! Grounded on `examples/original_source/src/program.cpp` and
//! `src/gen_policy.cpp`'s driving loop: a global expression counter and a
//! per-function counter gate recursion depth the same way
//! `examples/FuelLabs-fuel-vm/src/interpreter/internal.rs` gates gas
//! consumption — shared mutable state threaded through recursive calls
//! rather than returned and re-added by each caller.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::Rng;

use crate::context::Context;
use crate::expr::Expr;
use crate::object::{ArrayInstance, DataObject, ScalarVariable, StructInstance, StructStatics};
use crate::policy::{AssignTarget, ConstPattern, GenPolicy, StmtKind};
use crate::stmt::{DeclStmt, IfStmt, Scope, Stmt};
use crate::symtable::SymbolTable;
use crate::types::{ArrayKind, ArrayType, MemberType, ScalarKind, StructMember, StructType, TypeRegistry};
use crate::value::TypedValue;

/// A scalar storage location reachable either directly (a bare variable)
/// or through a struct-member/array-element access path rooted at a
/// mixed/output struct or array instance (`spec.md` §4.3/§4.4). The
/// backing `ScalarVariable` is the same either way; only the emitted
/// access expression differs.
#[derive(Clone)]
enum ScalarSite {
    Direct(Rc<ScalarVariable>),
    Member(Rc<ScalarVariable>, Rc<str>),
}

impl ScalarSite {
    fn var(&self) -> &Rc<ScalarVariable> {
        match self {
            ScalarSite::Direct(v) | ScalarSite::Member(v, _) => v,
        }
    }

    fn into_expr(self) -> Expr {
        match self {
            ScalarSite::Direct(v) => Expr::new_var_use(v),
            ScalarSite::Member(v, path) => Expr::new_member_access(v, path),
        }
    }
}

/// Every struct-member and array-element scalar reachable off `table`'s
/// struct/array instances, paired with the dotted/indexed path used to
/// address it in emitted source (`spec.md` §4.3/§4.4: member/element
/// access, not whole-struct/whole-array access).
fn struct_array_sites(table: &SymbolTable) -> Vec<ScalarSite> {
    let mut sites = Vec::new();
    for s in table.structs() {
        for member in &s.instance_members {
            if let DataObject::Scalar(var) = member {
                let path: Rc<str> = format!("{}.{}", s.instance_name, var.name()).into();
                sites.push(ScalarSite::Member(Rc::clone(var), path));
            }
        }
    }
    for a in table.arrays() {
        for i in 0..a.len() {
            if let Some(DataObject::Scalar(var)) = a.slot(i) {
                let path: Rc<str> = format!("{}[{i}]", a.instance_name).into();
                sites.push(ScalarSite::Member(var, path));
            }
        }
    }
    sites
}

fn random_scalar_value(reg: &TypeRegistry, kind: ScalarKind, rng: &mut impl Rng) -> TypedValue {
    if kind.is_float() {
        TypedValue::from_f64(kind, rng.gen_range(-100.0..100.0))
    } else {
        let desc = reg.describe(kind);
        let lo = desc.min_i128().max(-10_000);
        let hi = desc.max_i128().min(10_000);
        TypedValue::from_i128(reg, kind, rng.gen_range(lo..=hi))
    }
}

/// Build one flat (no nested-struct members) struct type: a random
/// member count, each an allowed scalar kind, occasionally a bit-field
/// or a `static` member (`spec.md` §4.3; grounded on
/// `examples/original_source/src/type.cpp`'s `StructType::generate`).
/// Nested struct members are left to `crate::types::composite`'s own
/// unit tests rather than this pipeline (see `DESIGN.md`): reusing an
/// already-generated `StructType` as a member needs the same
/// instance/path-naming machinery this function already provides one
/// level deep, without yet adding the recursive instance construction
/// that would need.
fn gen_struct_type(policy: &GenPolicy, rng: &mut impl Rng, name_gen: &mut crate::namegen::NameGenerator) -> StructType {
    let member_count = rng.gen_range(1..=4usize);
    let members = (0..member_count)
        .map(|i| {
            let kind = policy.allowed_scalar_types[rng.gen_range(0..policy.allowed_scalar_types.len())];
            // Never `static`: `StructStatics` backing storage is never
            // populated by `gen_struct_instance` below, and a `static`
            // struct member doesn't parse as plain C (only C++ allows it)
            // — see `DESIGN.md`.
            let bitfield_width = if StructMember::bitfield_base_allowed(kind) && rng.gen_bool(0.2) {
                Some(rng.gen_range(1..=8))
            } else {
                None
            };
            StructMember {
                name: format!("m{i}"),
                ty: MemberType::Scalar(kind),
                bitfield_width,
                is_static: false,
            }
        })
        .collect();
    StructType::new(name_gen.next_struct_type(), members)
}

/// Instantiate one `StructType`'s instance members as fresh scalar
/// storage, bit-field-narrowed members zero-initialized (always in
/// range regardless of width) and the rest drawn from the type's
/// allowed range (`spec.md` §4.4).
fn gen_struct_instance(ty: Rc<StructType>, instance_name: String, reg: &TypeRegistry, rng: &mut impl Rng) -> StructInstance {
    let instance_members = ty
        .instance_members()
        .map(|member| {
            let MemberType::Scalar(kind) = &member.ty else {
                unreachable!("gen_struct_type only builds scalar-member struct types")
            };
            let kind = *kind;
            let initial = if member.bitfield_width.is_some() {
                TypedValue::zero(reg, kind)
            } else {
                random_scalar_value(reg, kind, rng)
            };
            DataObject::Scalar(Rc::new(ScalarVariable::new(member.name.clone(), kind, initial, member.bitfield_width)))
        })
        .collect();
    StructInstance {
        instance_name,
        ty,
        instance_members,
        statics: StructStatics::new(),
    }
}

/// Build and eagerly fill one scalar-element array instance (extern
/// arrays need every element's initial value up front, unlike the
/// lazy-on-first-access pattern `ArrayInstance` otherwise supports for
/// locally-declared arrays — `spec.md` §4.4 edge case).
fn gen_array_instance(ty: Rc<ArrayType>, instance_name: String, reg: &TypeRegistry, rng: &mut impl Rng) -> ArrayInstance {
    let MemberType::Scalar(kind) = &ty.element else {
        unreachable!("gen_array_instance only builds scalar-element array types")
    };
    let kind = *kind;
    let arr = ArrayInstance::new(instance_name, Rc::clone(&ty));
    for i in 0..ty.count {
        let initial = random_scalar_value(reg, kind, rng);
        arr.get_or_init(i, || DataObject::Scalar(Rc::new(ScalarVariable::new(format!("elem{i}"), kind, initial, None))));
    }
    arr
}

/// One generated test function: a name and a statement body.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub body: Scope,
}

/// A complete generated program: the three extern buckets plus every
/// generated function (`spec.md` §4.9, §4.11).
#[derive(Debug, Clone)]
pub struct Program {
    pub input: SymbolTable,
    pub mixed: SymbolTable,
    pub output: SymbolTable,
    pub functions: Vec<Function>,
}

/// Drives expression and statement construction, holding the budgets
/// that are shared across an entire program (`total_expr_count`) or reset
/// per function (`func_expr_count`), plus the common-subexpression
/// template pool built once per function (`spec.md` §9, `SPEC_FULL.md`
/// §10 supplement #4). The pool lives here rather than on `GenPolicy`
/// (which stays a plain, `Clone`-shared table of declarative weights and
/// bounds): it's per-run mutable state, the same role `total_expr_count`/
/// `func_expr_count` already play on `Generator`.
pub struct Generator {
    total_expr_count: Cell<u32>,
    func_expr_count: Cell<u32>,
    max_total_exprs: u32,
    cse_templates: RefCell<Vec<Expr>>,
}

impl Generator {
    pub fn new(max_total_exprs: u32) -> Self {
        Self {
            total_expr_count: Cell::new(0),
            func_expr_count: Cell::new(0),
            max_total_exprs,
            cse_templates: RefCell::new(Vec::new()),
        }
    }

    pub fn total_expr_count(&self) -> u32 {
        self.total_expr_count.get()
    }

    fn budget_exhausted(&self, policy: &GenPolicy) -> bool {
        self.total_expr_count.get() >= self.max_total_exprs || self.func_expr_count.get() >= policy.max_func_exprs
    }

    fn charge(&self) {
        self.total_expr_count.set(self.total_expr_count.get() + 1);
        self.func_expr_count.set(self.func_expr_count.get() + 1);
    }

    /// Build one expression tree of type `target_kind` (or any kind, if
    /// `None`), descending until `policy.max_expr_depth`, the shared
    /// budget, or a policy coin-flip picks a leaf (`spec.md` §4.9 edge
    /// case: "leaf emission at depth limit/policy-choice/budget
    /// exhaustion").
    pub fn gen_expr(&self, ctx: &Context, policy: &GenPolicy, rng: &mut impl Rng, depth: u32, target_kind: Option<ScalarKind>) -> Expr {
        let reg = &ctx.reg;
        let leaf_chance = 0.15 + 0.85 * (depth as f64 / policy.max_expr_depth.max(1) as f64);
        if depth >= policy.max_expr_depth || self.budget_exhausted(policy) || rng.gen_bool(leaf_chance.min(1.0)) {
            return self.gen_leaf(ctx, policy, rng, target_kind);
        }
        self.charge();

        // Roughly even split between unary, binary, and ternary; leaves
        // (including CSE template reuse) are handled by `gen_leaf`.
        match rng.gen_range(0..4) {
            0 if !policy.allowed_unary_ops.is_empty() => {
                let op = policy.allowed_unary_ops[rng.gen_range(0..policy.allowed_unary_ops.len())];
                let child = self.gen_expr(ctx, policy, rng, depth + 1, target_kind);
                Expr::new_unary(reg, op, child)
            }
            1 if !policy.allowed_binary_ops.is_empty() => {
                let op = policy.allowed_binary_ops[rng.gen_range(0..policy.allowed_binary_ops.len())];
                let lhs = self.gen_expr(ctx, policy, rng, depth + 1, target_kind);
                let rhs = self.gen_expr(ctx, policy, rng, depth + 1, target_kind);
                Expr::new_binary(reg, op, lhs, rhs)
            }
            2 => {
                let cond = self.gen_expr(ctx, policy, rng, depth + 1, Some(ScalarKind::Bool));
                let then_e = self.gen_expr(ctx, policy, rng, depth + 1, target_kind);
                let else_e = self.gen_expr(ctx, policy, rng, depth + 1, target_kind);
                Expr::new_ternary(reg, cond, then_e, else_e)
            }
            _ => self.gen_leaf(ctx, policy, rng, target_kind),
        }
    }

    /// Build a leaf: a constant, a reuse of an existing variable in
    /// scope, or a clone of a matching-kind CSE template, per
    /// `policy.const_pattern` (`spec.md` §10 supplement #2, #4).
    fn gen_leaf(&self, ctx: &Context, policy: &GenPolicy, rng: &mut impl Rng, target_kind: Option<ScalarKind>) -> Expr {
        let kind = target_kind.unwrap_or_else(|| self.random_scalar_kind(policy, rng));
        let use_const = match policy.const_pattern {
            ConstPattern::AllConst => true,
            ConstPattern::HalfConst => rng.gen_bool(0.5),
            ConstPattern::Unconstrained => rng.gen_bool(0.4),
        };
        if !use_const {
            if policy.cse_count > 0 && rng.gen_bool(0.2) {
                if let Some(cse) = self.pick_cse_template(ctx, kind, rng) {
                    return cse;
                }
            }
            if let Some(site) = self.pick_visible_var(ctx, kind, rng) {
                return site.into_expr();
            }
        }
        Expr::new_const(self.random_const(ctx, kind, rng))
    }

    /// Build the function's CSE template pool: up to `policy.cse_count`
    /// small expression trees, each over the extern tables only (the
    /// function's locals don't exist yet at this point, and a template
    /// must stay valid for reuse anywhere later in the body —
    /// `spec.md` §9, `SPEC_FULL.md` §10 supplement #4).
    fn build_cse_templates(&self, ctx: &Context, policy: &GenPolicy, rng: &mut impl Rng) {
        let shallow_depth = policy.max_expr_depth.saturating_sub(1);
        let mut pool = Vec::new();
        for _ in 0..policy.cse_count {
            if self.budget_exhausted(policy) {
                break;
            }
            let kind = self.random_scalar_kind(policy, rng);
            pool.push(self.gen_expr(ctx, policy, rng, shallow_depth, Some(kind)));
        }
        *self.cse_templates.borrow_mut() = pool;
    }

    /// Pick a pool template whose kind matches and wrap it for reuse,
    /// re-evaluating it against current variable state rather than
    /// replaying the value it had when first built (`Expr::new_cse_use`).
    fn pick_cse_template(&self, ctx: &Context, kind: ScalarKind, rng: &mut impl Rng) -> Option<Expr> {
        let pool = self.cse_templates.borrow();
        let matching: Vec<&Expr> = pool.iter().filter(|e| e.kind() == kind).collect();
        if matching.is_empty() {
            None
        } else {
            Some(Expr::new_cse_use(&ctx.reg, matching[rng.gen_range(0..matching.len())]))
        }
    }

    fn random_scalar_kind(&self, policy: &GenPolicy, rng: &mut impl Rng) -> ScalarKind {
        policy.allowed_scalar_types[rng.gen_range(0..policy.allowed_scalar_types.len())]
    }

    fn random_const(&self, ctx: &Context, kind: ScalarKind, rng: &mut impl Rng) -> TypedValue {
        if kind.is_float() {
            TypedValue::from_f64(kind, rng.gen_range(-1000.0..1000.0))
        } else {
            let desc = ctx.reg.describe(kind);
            let lo = desc.min_i128().max(-1_000_000);
            let hi = desc.max_i128().min(1_000_000);
            TypedValue::from_i128(&ctx.reg, kind, rng.gen_range(lo..=hi))
        }
    }

    fn pick_visible_var(&self, ctx: &Context, kind: ScalarKind, rng: &mut impl Rng) -> Option<ScalarSite> {
        let mut candidates: Vec<ScalarSite> = ctx.visible_locals().scalars().iter().cloned().map(ScalarSite::Direct).collect();
        for table in [ctx.externs.input, ctx.externs.mixed, ctx.externs.output] {
            candidates.extend(table.scalars().iter().cloned().map(ScalarSite::Direct));
            candidates.extend(struct_array_sites(table));
        }
        candidates.retain(|c| c.var().kind() == kind);
        if candidates.is_empty() {
            None
        } else {
            Some(candidates.swap_remove(rng.gen_range(0..candidates.len())))
        }
    }

    /// Pick an assignment place per `policy.assign_target_weights`
    /// (`spec.md` §4.9): a bare mixed/output scalar, or a struct-member /
    /// array-element access rooted at a mixed/output struct or array
    /// instance (`spec.md` §4.3/§4.4).
    fn pick_assignable_var(&self, ctx: &Context, policy: &GenPolicy, rng: &mut impl Rng) -> Option<ScalarSite> {
        let target = policy.assign_target_weights.pick(rng.gen_range(0.0..1.0));
        let mut pool: Vec<ScalarSite> = match target {
            AssignTarget::NewOutputVar | AssignTarget::ExistingMixedVar => ctx
                .externs
                .mixed
                .scalars()
                .iter()
                .chain(ctx.externs.output.scalars().iter())
                .cloned()
                .map(ScalarSite::Direct)
                .collect(),
            AssignTarget::MixedOrOutputStructMember | AssignTarget::MixedOrOutputArrayElement => {
                let mut sites = struct_array_sites(ctx.externs.mixed);
                sites.extend(struct_array_sites(ctx.externs.output));
                if sites.is_empty() {
                    // No struct/array instances this run; fall back to a
                    // plain scalar so the statement still has somewhere
                    // to assign.
                    ctx.externs
                        .mixed
                        .scalars()
                        .iter()
                        .chain(ctx.externs.output.scalars().iter())
                        .cloned()
                        .map(ScalarSite::Direct)
                        .collect()
                } else {
                    sites
                }
            }
        };
        if pool.is_empty() {
            None
        } else {
            Some(pool.swap_remove(rng.gen_range(0..pool.len())))
        }
    }

    /// Build one statement, possibly recursing into nested scopes for
    /// `If` (`spec.md` §4.6).
    fn gen_stmt(&self, ctx: &mut Context, policy: &GenPolicy, rng: &mut impl Rng, name_gen: &mut crate::namegen::NameGenerator) -> Stmt {
        let kind = policy.stmt_kind_weights.pick(rng.gen_range(0.0..1.0));
        match kind {
            StmtKind::Decl => {
                let scalar_kind = self.random_scalar_kind(policy, rng);
                let initial = self.random_const(ctx, scalar_kind, rng);
                let init_expr = self.gen_expr(ctx, policy, rng, 0, Some(scalar_kind));
                let var = Rc::new(ScalarVariable::new(name_gen.next_local(), scalar_kind, initial, None));
                ctx.declare_local(Rc::clone(&var));
                Stmt::Decl(DeclStmt {
                    var,
                    initializer: Some(init_expr),
                })
            }
            StmtKind::ExprStmt => {
                if let Some(place_site) = self.pick_assignable_var(ctx, policy, rng) {
                    let place_kind = place_site.var().kind();
                    let place = place_site.into_expr();
                    let value = self.gen_expr(ctx, policy, rng, 0, Some(place_kind));
                    Stmt::ExprStmt(Expr::new_assign(&ctx.reg, rng, place, value, ctx.taken))
                } else {
                    Stmt::ExprStmt(self.gen_expr(ctx, policy, rng, 0, None))
                }
            }
            StmtKind::If => {
                let cond = self.gen_expr(ctx, policy, rng, 0, Some(ScalarKind::Bool));
                let taken = !cond.result().is_zero();
                let mut then_ctx = ctx.enter_if_branch(taken);
                let then_scope = self.gen_scope(&mut then_ctx, policy, rng, name_gen);
                let mut else_ctx = ctx.enter_if_branch(!taken);
                let else_scope = self.gen_scope(&mut else_ctx, policy, rng, name_gen);
                Stmt::If(IfStmt {
                    cond,
                    then_scope,
                    else_scope: Some(else_scope),
                })
            }
        }
    }

    /// Build a scope: a policy-bounded number of statements
    /// (`spec.md` §4.6).
    pub fn gen_scope(&self, ctx: &mut Context, policy: &GenPolicy, rng: &mut impl Rng, name_gen: &mut crate::namegen::NameGenerator) -> Scope {
        let count = rng.gen_range(policy.scope_stmt_count.min..=policy.scope_stmt_count.max);
        let mut scope = Scope::new();
        for _ in 0..count {
            if self.func_expr_count.get() >= policy.max_stmts_per_func {
                break;
            }
            let stmt = self.gen_stmt(ctx, policy, rng, name_gen);
            if let Stmt::Decl(decl) = &stmt {
                scope.declare_local(Rc::clone(&decl.var));
            }
            scope.push(stmt);
        }
        scope
    }

    /// Build one function body, resetting the per-function budget first
    /// and rebuilding the CSE template pool for this function.
    pub fn gen_function(&self, ctx: &Context, policy: &GenPolicy, rng: &mut impl Rng, name_gen: &mut crate::namegen::NameGenerator) -> Function {
        self.func_expr_count.set(0);
        self.build_cse_templates(ctx, policy, rng);
        let mut func_ctx = ctx.enter_scope();
        let body = self.gen_scope(&mut func_ctx, policy, rng, name_gen);
        Function {
            name: name_gen.next_func(),
            body,
        }
    }
}

/// Allocate the extern input/mixed/output scalar buckets for one program,
/// sized per `policy`'s bounds (`spec.md` §4.9).
pub fn gen_externs(ctx_reg: &crate::types::TypeRegistry, policy: &GenPolicy, rng: &mut impl Rng, name_gen: &mut crate::namegen::NameGenerator) -> (SymbolTable, SymbolTable, SymbolTable) {
    let mut input = SymbolTable::new();
    let mut mixed = SymbolTable::new();
    let mut output = SymbolTable::new();

    let mut fill = |table: &mut SymbolTable, bounds: crate::policy::Bounds, prefix: fn(&mut crate::namegen::NameGenerator) -> String| {
        let count = rng.gen_range(bounds.min..=bounds.max);
        for _ in 0..count {
            let kind = policy.allowed_scalar_types[rng.gen_range(0..policy.allowed_scalar_types.len())];
            let initial = if kind.is_float() {
                TypedValue::from_f64(kind, rng.gen_range(-100.0..100.0))
            } else {
                let desc = ctx_reg.describe(kind);
                let lo = desc.min_i128().max(-10_000);
                let hi = desc.max_i128().min(10_000);
                TypedValue::from_i128(ctx_reg, kind, rng.gen_range(lo..=hi))
            };
            table.push_scalar(Rc::new(ScalarVariable::new(prefix(name_gen), kind, initial, None)));
        }
    };

    fill(&mut input, policy.input_var_count, crate::namegen::NameGenerator::next_input);
    fill(&mut mixed, policy.mixed_var_count, crate::namegen::NameGenerator::next_mixed);
    fill(&mut output, policy.output_var_count, crate::namegen::NameGenerator::next_output);

    // Struct/array types and instances always land in the mixed or
    // output bucket (`spec.md` §4.3/§4.4: `AssignTarget` only ever
    // targets a mixed/output struct member or array element — input is
    // read-only source data, so it never owns one).
    let struct_count = rng.gen_range(policy.struct_count.min..=policy.struct_count.max);
    for _ in 0..struct_count {
        let ty = Rc::new(gen_struct_type(policy, rng, name_gen));
        let use_mixed = rng.gen_bool(0.5);
        let instance_name = if use_mixed { name_gen.next_mixed() } else { name_gen.next_output() };
        let instance = Rc::new(gen_struct_instance(ty, instance_name, ctx_reg, rng));
        if use_mixed {
            mixed.push_struct(instance);
        } else {
            output.push_struct(instance);
        }
    }

    let array_count = rng.gen_range(policy.array_count.min..=policy.array_count.max);
    for _ in 0..array_count {
        let kind = policy.allowed_scalar_types[rng.gen_range(0..policy.allowed_scalar_types.len())];
        let count = rng.gen_range(1..=6usize);
        let ty = Rc::new(ArrayType::new(MemberType::Scalar(kind), count, ArrayKind::CArray));
        let use_mixed = rng.gen_bool(0.5);
        let instance_name = if use_mixed { name_gen.next_mixed() } else { name_gen.next_output() };
        let instance = Rc::new(gen_array_instance(ty, instance_name, ctx_reg, rng));
        if use_mixed {
            mixed.push_array(instance);
        } else {
            output.push_array(instance);
        }
    }

    (input, mixed, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, ExternTables};
    use crate::types::{BitMode, TypeRegistry};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn same_seed_produces_identical_function_body_text() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let policy = GenPolicy::default();

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut name_gen = crate::namegen::NameGenerator::new();
            let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);
            let externs = ExternTables {
                input: &input,
                mixed: &mixed,
                output: &output,
            };
            let ctx = Context::root(reg, externs);
            let generator = Generator::new(policy.max_total_exprs);
            let func = generator.gen_function(&ctx, &policy, &mut rng, &mut name_gen);
            let emitter = crate::emit::Emitter::new(&reg, crate::options::LangStd::Cxx17);
            emitter.emit_scope(&func.body, 0)
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn gen_externs_places_struct_and_array_instances_in_mixed_or_output_only() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let mut policy = GenPolicy::default();
        policy.struct_count = crate::policy::Bounds::new(2, 2);
        policy.array_count = crate::policy::Bounds::new(2, 2);
        let mut rng = StdRng::seed_from_u64(11);
        let mut name_gen = crate::namegen::NameGenerator::new();
        let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);

        assert!(input.structs().is_empty() && input.arrays().is_empty(), "input is read-only source data, never owns a struct/array instance");
        assert_eq!(mixed.structs().len() + output.structs().len(), 2);
        assert_eq!(mixed.arrays().len() + output.arrays().len(), 2);

        for s in mixed.structs().iter().chain(output.structs().iter()) {
            assert!(!s.instance_members.is_empty());
            assert!(s.ty.static_members().next().is_none(), "generator never emits a static struct member");
        }
        for a in mixed.arrays().iter().chain(output.arrays().iter()) {
            for i in 0..a.len() {
                assert!(a.slot(i).is_some(), "array elements are eagerly filled at generation time");
            }
        }
    }

    #[test]
    fn pick_assignable_var_reaches_struct_members_and_array_elements() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let mut policy = GenPolicy::default();
        policy.struct_count = crate::policy::Bounds::new(1, 1);
        policy.array_count = crate::policy::Bounds::new(1, 1);
        policy.mixed_var_count = crate::policy::Bounds::new(0, 0);
        policy.output_var_count = crate::policy::Bounds::new(0, 0);
        policy.input_var_count = crate::policy::Bounds::new(0, 0);
        use crate::policy::AssignTarget;
        policy.assign_target_weights = crate::policy::Weighted::new(vec![
            (AssignTarget::MixedOrOutputStructMember, 0.5),
            (AssignTarget::MixedOrOutputArrayElement, 0.5),
        ]);

        let mut rng = StdRng::seed_from_u64(5);
        let mut name_gen = crate::namegen::NameGenerator::new();
        let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);
        let externs = ExternTables {
            input: &input,
            mixed: &mixed,
            output: &output,
        };
        let ctx = Context::root(reg, externs);
        let generator = Generator::new(policy.max_total_exprs);

        let place_site = generator.pick_assignable_var(&ctx, &policy, &mut rng).expect("a struct member or array element is always available");
        let emitter = crate::emit::Emitter::new(&reg, crate::options::LangStd::Cxx17);
        let rendered = emitter.emit_expr(&place_site.into_expr());
        assert!(rendered.contains('.') || rendered.contains('['), "expected a member/element access path, got {rendered:?}");
    }

    #[test]
    fn cse_template_reuse_wraps_a_matching_kind_template_in_a_cse_node() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let mut policy = GenPolicy::default();
        policy.cse_count = 4;
        policy.allowed_scalar_types = vec![ScalarKind::SInt];
        let mut rng = StdRng::seed_from_u64(7);
        let mut name_gen = crate::namegen::NameGenerator::new();
        let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);
        let externs = ExternTables {
            input: &input,
            mixed: &mixed,
            output: &output,
        };
        let ctx = Context::root(reg, externs);
        let generator = Generator::new(policy.max_total_exprs);

        generator.build_cse_templates(&ctx, &policy, &mut rng);
        assert!(!generator.cse_templates.borrow().is_empty(), "cse_count > 0 should populate the template pool");

        let reused = generator.pick_cse_template(&ctx, ScalarKind::SInt, &mut rng).expect("a matching-kind template was just built");
        assert!(matches!(reused, Expr::Cse(_)), "a template reuse must be wrapped in Expr::Cse, not spliced in bare");

        assert!(generator.pick_cse_template(&ctx, ScalarKind::Bool, &mut rng).is_none(), "no Bool template exists in a pool built from SInt-only externs");
    }

    #[test]
    fn different_seeds_usually_differ() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let policy = GenPolicy::default();
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut name_gen = crate::namegen::NameGenerator::new();
            let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);
            let externs = ExternTables {
                input: &input,
                mixed: &mixed,
                output: &output,
            };
            let ctx = Context::root(reg, externs);
            let generator = Generator::new(policy.max_total_exprs);
            let func = generator.gen_function(&ctx, &policy, &mut rng, &mut name_gen);
            let emitter = crate::emit::Emitter::new(&reg, crate::options::LangStd::Cxx17);
            emitter.emit_scope(&func.body, 0)
        };
        assert_ne!(run(1), run(2));
    }
}
