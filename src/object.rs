//! Data objects: the runtime storage backing declared variables
//! (`spec.md` §4.4).
//!
//! Grounded on `examples/original_source/include/type.hpp`'s
//! `ScalarVariable`/`StructObject`/`ArrayObject` family. Mutable,
//! shared-ownership storage (a variable's `current` value, a struct
//! type's static members, an array's lazily-generated elements) is
//! modeled with `Rc<RefCell<_>>` rather than the source's raw pointers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::types::{ArrayType, ScalarKind, StructType, TypeRegistry};
use crate::value::TypedValue;

/// A named scalar storage location.
///
/// Tracks both the value it was initialized with and its current value,
/// plus whether it has ever been written to after initialization — the
/// generator uses `was_changed` to decide whether re-reading it would be
/// observably different from its initializer (`spec.md` §4.4).
#[derive(Debug)]
pub struct ScalarVariable {
    name: String,
    kind: ScalarKind,
    initial: TypedValue,
    current: RefCell<TypedValue>,
    was_changed: Cell<bool>,
    /// `Some(width)` if this scalar is a struct bit-field member; narrows
    /// its effective min/max below the full type range.
    bitfield_width: Option<u32>,
}

impl ScalarVariable {
    /// Declare a new scalar, initialized to `initial`.
    pub fn new(name: impl Into<String>, kind: ScalarKind, initial: TypedValue, bitfield_width: Option<u32>) -> Self {
        debug_assert_eq!(initial.kind(), kind);
        Self {
            name: name.into(),
            kind,
            initial,
            current: RefCell::new(initial),
            was_changed: Cell::new(false),
            bitfield_width,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub const fn initial(&self) -> TypedValue {
        self.initial
    }

    pub fn current(&self) -> TypedValue {
        *self.current.borrow()
    }

    pub const fn bitfield_width(&self) -> Option<u32> {
        self.bitfield_width
    }

    pub fn was_changed(&self) -> bool {
        self.was_changed.get()
    }

    /// Overwrite the current value (an assignment was generated against
    /// this variable).
    pub fn assign(&self, value: TypedValue) {
        debug_assert_eq!(value.kind(), self.kind);
        *self.current.borrow_mut() = value;
        self.was_changed.set(true);
    }

    /// The effective `[min, max]` range this variable's value must stay
    /// within: the full type range, narrowed to the bit-field's width when
    /// one is declared (`spec.md` §4.4 edge case).
    pub fn value_range(&self, reg: &TypeRegistry) -> (i128, i128) {
        let desc = reg.describe(self.kind);
        match self.bitfield_width {
            None => (desc.min_i128(), desc.max_i128()),
            Some(width) => {
                if desc.is_signed {
                    (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
                } else {
                    (0, (1i128 << width) - 1)
                }
            }
        }
    }
}

/// Shared static storage for one [`StructType`]: one `ScalarVariable` per
/// static member, allocated once and referenced by every instance
/// (`spec.md` §4.4: "static members shared across instances").
#[derive(Debug, Default)]
pub struct StructStatics {
    members: RefCell<Vec<Rc<ScalarVariable>>>,
}

impl StructStatics {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn get_or_init(&self, index: usize, init: impl FnOnce() -> Rc<ScalarVariable>) -> Rc<ScalarVariable> {
        {
            let members = self.members.borrow();
            if let Some(existing) = members.get(index) {
                return Rc::clone(existing);
            }
        }
        let created = init();
        let mut members = self.members.borrow_mut();
        debug_assert_eq!(members.len(), index);
        members.push(Rc::clone(&created));
        created
    }
}

/// A generated struct instance: one [`DataObject`] per instance member,
/// plus a shared reference to its type's static storage.
#[derive(Debug)]
pub struct StructInstance {
    /// The declared variable name this instance is bound to (distinct
    /// from `ty.name`, which is the struct's type name).
    pub instance_name: String,
    pub ty: Rc<StructType>,
    pub instance_members: Vec<DataObject>,
    pub statics: Rc<StructStatics>,
}

/// A generated array instance. Elements are generated lazily — one per
/// slot, the first time that slot is read or written (`spec.md` §4.4) —
/// rather than eagerly on construction.
#[derive(Debug)]
pub struct ArrayInstance {
    /// The declared variable name this instance is bound to.
    pub instance_name: String,
    pub ty: Rc<ArrayType>,
    slots: RefCell<Vec<Option<DataObject>>>,
}

impl ArrayInstance {
    pub fn new(instance_name: impl Into<String>, ty: Rc<ArrayType>) -> Self {
        let count = ty.count;
        Self {
            instance_name: instance_name.into(),
            ty,
            slots: RefCell::new(vec![None; count]),
        }
    }

    pub fn len(&self) -> usize {
        self.ty.count
    }

    pub fn is_empty(&self) -> bool {
        self.ty.count == 0
    }

    /// Fetch the element at `index` if it has already been generated,
    /// without triggering generation.
    pub fn slot(&self, index: usize) -> Option<DataObject> {
        self.slots.borrow().get(index).cloned().flatten()
    }

    /// Fetch the element at `index`, generating it via `init` on first
    /// access.
    pub fn get_or_init(&self, index: usize, init: impl FnOnce() -> DataObject) -> DataObject {
        {
            let slots = self.slots.borrow();
            if let Some(Some(existing)) = slots.get(index) {
                return existing.clone();
            }
        }
        let created = init();
        let mut slots = self.slots.borrow_mut();
        slots[index] = Some(created.clone());
        created
    }
}

/// Any one generated data object: a scalar, a struct instance, or an
/// array instance. Stored by `Rc` since the same object may be aliased by
/// several `VarUse`/`MemberAccess` expression nodes (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub enum DataObject {
    Scalar(Rc<ScalarVariable>),
    Struct(Rc<StructInstance>),
    Array(Rc<ArrayInstance>),
}

impl DataObject {
    /// The emitted declaration name of this object (its top-level
    /// variable name; struct members and array elements are addressed
    /// relative to it by the expression tree, not here).
    pub fn name(&self) -> String {
        match self {
            DataObject::Scalar(s) => s.name().to_string(),
            DataObject::Struct(s) => s.instance_name.clone(),
            DataObject::Array(a) => a.instance_name.clone(),
        }
    }
}
