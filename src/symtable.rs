//! `SymbolTable`: a named bucket of generated data objects (`spec.md`
//! §3).
//!
//! Used both for the program-level extern buckets (input/mixed/output)
//! and for each scope's local declarations. Cloning a `SymbolTable` is
//! cheap — every entry is `Rc`-shared storage, not owned data.

use std::rc::Rc;

use crate::object::{ArrayInstance, DataObject, ScalarVariable, StructInstance};

/// A named collection of scalar, struct, and array objects.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    scalars: Vec<Rc<ScalarVariable>>,
    structs: Vec<Rc<StructInstance>>,
    arrays: Vec<Rc<ArrayInstance>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scalar(&mut self, var: Rc<ScalarVariable>) {
        self.scalars.push(var);
    }

    pub fn push_struct(&mut self, s: Rc<StructInstance>) {
        self.structs.push(s);
    }

    pub fn push_array(&mut self, a: Rc<ArrayInstance>) {
        self.arrays.push(a);
    }

    pub fn scalars(&self) -> &[Rc<ScalarVariable>] {
        &self.scalars
    }

    pub fn structs(&self) -> &[Rc<StructInstance>] {
        &self.structs
    }

    pub fn arrays(&self) -> &[Rc<ArrayInstance>] {
        &self.arrays
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.structs.is_empty() && self.arrays.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scalars.len() + self.structs.len() + self.arrays.len()
    }

    /// All objects in this table, boxed uniformly for iteration.
    pub fn objects(&self) -> impl Iterator<Item = DataObject> + '_ {
        self.scalars
            .iter()
            .cloned()
            .map(DataObject::Scalar)
            .chain(self.structs.iter().cloned().map(DataObject::Struct))
            .chain(self.arrays.iter().cloned().map(DataObject::Array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BitMode, ScalarKind, TypeRegistry};
    use crate::value::TypedValue;

    #[test]
    fn tracks_counts_across_buckets() {
        let reg = TypeRegistry::new(BitMode::Mode64);
        let mut table = SymbolTable::new();
        assert!(table.is_empty());
        table.push_scalar(Rc::new(ScalarVariable::new(
            "x",
            ScalarKind::SInt,
            TypedValue::from_i128(&reg, ScalarKind::SInt, 0),
            None,
        )));
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
    }
}
