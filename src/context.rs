//! `Context`: the generation-time environment threaded through the
//! recursive descent (`spec.md` §4.7).
//!
//! Grounded on `examples/original_source/include/context.hpp`'s
//! `Context`/`GenCtx` pair, and on `spec.md` §9's note that global
//! singletons (RNG, options, default policy) become explicit parameters.
//! Rather than a borrowed parent-context chain (which would need
//! self-referential lifetimes to grow with arbitrary scope nesting),
//! enclosing locals are folded into each child's own `SymbolTable` as it
//! is cloned going down — every entry is an `Rc`, so cloning is cheap and
//! a declaration added at depth 2 stays invisible to depth 1's context,
//! exactly like a real lexical parent chain.

use std::rc::Rc;

use crate::object::ScalarVariable;
use crate::symtable::SymbolTable;
use crate::types::TypeRegistry;

/// The program's three extern buckets, borrowed for the whole generation
/// pass.
#[derive(Debug, Clone, Copy)]
pub struct ExternTables<'a> {
    pub input: &'a SymbolTable,
    pub mixed: &'a SymbolTable,
    pub output: &'a SymbolTable,
}

/// The environment visible at one point in the generated program: extern
/// tables, the locals declared so far in every enclosing scope, and the
/// bookkeeping needed to decide what's legal to generate next.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    pub reg: TypeRegistry,
    pub externs: ExternTables<'a>,
    locals: SymbolTable,
    pub scope_depth: u32,
    pub if_depth: u32,
    /// Whether this point in the program is definitely reached given the
    /// branches taken to get here (`spec.md` §4.6: `If` sets
    /// `taken = parent.taken ∧ cond` / `∧ ¬cond` for its two scopes).
    pub taken: bool,
}

impl<'a> Context<'a> {
    /// The top-level context for a function body.
    pub fn root(reg: TypeRegistry, externs: ExternTables<'a>) -> Self {
        Self {
            reg,
            externs,
            locals: SymbolTable::new(),
            scope_depth: 0,
            if_depth: 0,
            taken: true,
        }
    }

    /// Enter a nested block scope (not an `if` branch): same `taken`
    /// status, one deeper scope nesting.
    pub fn enter_scope(&self) -> Self {
        Self {
            reg: self.reg,
            externs: self.externs,
            locals: self.locals.clone(),
            scope_depth: self.scope_depth + 1,
            if_depth: self.if_depth,
            taken: self.taken,
        }
    }

    /// Enter one branch of an `if` statement.
    pub fn enter_if_branch(&self, branch_condition_holds: bool) -> Self {
        Self {
            reg: self.reg,
            externs: self.externs,
            locals: self.locals.clone(),
            scope_depth: self.scope_depth + 1,
            if_depth: self.if_depth + 1,
            taken: self.taken && branch_condition_holds,
        }
    }

    /// Record a new local declaration, visible to this context and any
    /// scope entered from it afterward.
    pub fn declare_local(&mut self, var: Rc<ScalarVariable>) {
        self.locals.push_scalar(var);
    }

    /// Locals visible at this point (this scope and every enclosing one).
    pub fn visible_locals(&self) -> &SymbolTable {
        &self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BitMode;
    use crate::value::TypedValue;

    #[test]
    fn child_scope_sees_parent_locals_but_not_vice_versa() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let empty = SymbolTable::new();
        let externs = ExternTables {
            input: &empty,
            mixed: &empty,
            output: &empty,
        };
        let mut root = Context::root(reg, externs);
        root.declare_local(Rc::new(ScalarVariable::new(
            "a",
            crate::types::ScalarKind::SInt,
            TypedValue::from_i128(&reg, crate::types::ScalarKind::SInt, 0),
            None,
        )));
        let child = root.enter_scope();
        assert_eq!(child.visible_locals().scalars().len(), 1);
        assert_eq!(root.visible_locals().scalars().len(), 1);
    }

    #[test]
    fn if_branch_taken_flag_conjoins_with_condition() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let empty = SymbolTable::new();
        let externs = ExternTables {
            input: &empty,
            mixed: &empty,
            output: &empty,
        };
        let root = Context::root(reg, externs);
        let then_branch = root.enter_if_branch(true);
        let else_branch = root.enter_if_branch(false);
        assert!(then_branch.taken);
        assert!(!else_branch.taken);
        assert_eq!(then_branch.if_depth, 1);
    }
}
