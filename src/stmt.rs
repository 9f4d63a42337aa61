//! `StmtTree`: statement-level IR nodes (`spec.md` §4.6).
//!
//! Grounded on `examples/original_source/src/stmt.cpp`'s `DeclStmt`,
//! `ExprStmt`, and `ScopeStmt`/`IfStmt` constructors. This module owns the
//! tree's shape only; the decisions about *which* kind of statement to
//! build next, how many, and when to stop belong to
//! [`crate::generator::Generator`] (`spec.md` §4.9), which calls these
//! constructors.

use std::rc::Rc;

use crate::expr::Expr;
use crate::object::ScalarVariable;
use crate::symtable::SymbolTable;

/// `T name = initializer;` — or, for an extern declaration, no
/// initializer at all (`spec.md` §4.6).
#[derive(Debug, Clone)]
pub struct DeclStmt {
    pub var: Rc<ScalarVariable>,
    pub initializer: Option<Expr>,
}

/// `if (cond) { then_scope } else { else_scope }`.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_scope: Scope,
    pub else_scope: Option<Scope>,
}

/// One statement in a [`Scope`]'s body.
#[derive(Debug, Clone)]
pub enum Stmt {
    Decl(DeclStmt),
    ExprStmt(Expr),
    If(IfStmt),
}

/// A block of statements together with the local variables declared
/// directly in it (`spec.md` §4.6: `Scope::generate` gathers visible
/// variables from enclosing locals and the extern tables, then picks a
/// statement count/kind from the active [`crate::policy::GenPolicy`]).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub stmts: Vec<Stmt>,
    pub locals: SymbolTable,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    /// Record a new local declared by a `Decl` statement just pushed into
    /// this scope.
    pub fn declare_local(&mut self, var: Rc<ScalarVariable>) {
        self.locals.push_scalar(var);
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BitMode, ScalarKind, TypeRegistry};
    use crate::value::TypedValue;

    #[test]
    fn declaring_a_local_makes_it_visible_in_scope_locals() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let var = Rc::new(ScalarVariable::new(
            "loc0",
            ScalarKind::SInt,
            TypedValue::from_i128(&reg, ScalarKind::SInt, 0),
            None,
        ));
        let mut scope = Scope::new();
        scope.push(Stmt::Decl(DeclStmt {
            var: Rc::clone(&var),
            initializer: None,
        }));
        scope.declare_local(var);
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.locals.scalars().len(), 1);
    }
}
