//! Whole-program invariants from `spec.md` §8: every published node is
//! well-defined (property 3, "no observable UB"), and binary/ternary
//! operands share a single static type after usual-arithmetic-conversion
//! (property 2, "type closure").

use rand::rngs::StdRng;
use rand::SeedableRng;

use rpgen::context::{Context, ExternTables};
use rpgen::expr::Expr;
use rpgen::generator::{gen_externs, Generator};
use rpgen::namegen::NameGenerator;
use rpgen::policy::GenPolicy;
use rpgen::stmt::{Scope, Stmt};
use rpgen::types::{BitMode, TypeRegistry};

fn walk_expr(expr: &Expr, sink: &mut Vec<Expr>) {
    sink.push(expr.clone());
    match expr {
        Expr::Const(_) | Expr::VarUse(_) | Expr::MemberAccess(..) => {}
        Expr::Unary(u) => walk_expr(&u.child, sink),
        Expr::Binary(b) => {
            walk_expr(&b.lhs, sink);
            walk_expr(&b.rhs, sink);
        }
        Expr::Ternary(t) => {
            walk_expr(&t.cond, sink);
            walk_expr(&t.then_branch, sink);
            walk_expr(&t.else_branch, sink);
        }
        Expr::Cast(c) => walk_expr(&c.child, sink),
        Expr::Assign(a) => {
            walk_expr(&a.place, sink);
            walk_expr(&a.value, sink);
        }
        Expr::Cse(inner) => walk_expr(inner, sink),
    }
}

fn walk_scope(scope: &Scope, sink: &mut Vec<Expr>) {
    for stmt in &scope.stmts {
        match stmt {
            Stmt::Decl(decl) => {
                if let Some(init) = &decl.initializer {
                    walk_expr(init, sink);
                }
            }
            Stmt::ExprStmt(expr) => walk_expr(expr, sink),
            Stmt::If(if_stmt) => {
                walk_expr(&if_stmt.cond, sink);
                walk_scope(&if_stmt.then_scope, sink);
                if let Some(else_scope) = &if_stmt.else_scope {
                    walk_scope(else_scope, sink);
                }
            }
        }
    }
}

#[test]
fn every_published_node_in_a_generated_function_is_well_defined() {
    for seed in 0..8u64 {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let policy = GenPolicy::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut name_gen = NameGenerator::new();
        let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);
        let externs = ExternTables {
            input: &input,
            mixed: &mixed,
            output: &output,
        };
        let ctx = Context::root(reg, externs);
        let generator = Generator::new(policy.max_total_exprs);
        let func = generator.gen_function(&ctx, &policy, &mut rng, &mut name_gen);

        let mut nodes = Vec::new();
        walk_scope(&func.body, &mut nodes);
        assert!(!nodes.is_empty(), "seed {seed} produced an empty function body");
        for node in &nodes {
            assert!(node.result().is_well_defined(), "seed {seed} published a UB-carrying node: {node:?}");
        }
    }
}

#[test]
fn binary_and_ternary_operands_share_a_single_static_type() {
    for seed in 0..8u64 {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let policy = GenPolicy::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut name_gen = NameGenerator::new();
        let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);
        let externs = ExternTables {
            input: &input,
            mixed: &mixed,
            output: &output,
        };
        let ctx = Context::root(reg, externs);
        let generator = Generator::new(policy.max_total_exprs);
        let func = generator.gen_function(&ctx, &policy, &mut rng, &mut name_gen);

        let mut nodes = Vec::new();
        walk_scope(&func.body, &mut nodes);
        for node in &nodes {
            match node {
                Expr::Binary(b) => {
                    assert_eq!(b.lhs.kind(), b.rhs.kind(), "seed {seed}: binary operand kinds diverged");
                    assert_eq!(b.lhs.kind(), b.result.kind(), "seed {seed}: binary result kind diverged from operands");
                }
                Expr::Ternary(t) => {
                    assert_eq!(t.then_branch.kind(), t.else_branch.kind(), "seed {seed}: ternary branch kinds diverged");
                }
                _ => {}
            }
        }
    }
}
