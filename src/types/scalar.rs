//! Scalar type descriptors and the type registry.
//!
//! Grounded on `examples/original_source/include/type.hpp`'s
//! `IntegralTypeHelper<T>` family (one descriptor per C scalar type, each
//! knowing its width/signedness/min/max/literal-suffix/rank) and on the
//! "table-per-operator-per-type…replaces virtual dispatch with a
//! branchless lookup" guidance in `spec.md` §9. Here the table is a single
//! `ScalarDescriptor` struct returned by [`TypeRegistry::describe`],
//! parameterized on bit width instead of one struct per concrete type.

use std::fmt;

/// Process-wide `long`/`unsigned long` width selection (`spec.md` §3, §6).
///
/// Carried explicitly through [`TypeRegistry`] rather than as a global,
/// per the "Global singletons…should become explicit parameters" note in
/// `spec.md` §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitMode {
    /// `long`/`unsigned long` are 32 bits wide.
    Mode32,
    /// `long`/`unsigned long` are 64 bits wide (the default).
    #[default]
    Mode64,
}

/// Every scalar type kind this generator can produce a value of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::EnumIter)]
pub enum ScalarKind {
    /// `bool` / `_Bool`.
    Bool,
    /// `signed char`.
    SChar,
    /// `unsigned char`.
    UChar,
    /// `short`.
    SShort,
    /// `unsigned short`.
    UShort,
    /// `int`.
    SInt,
    /// `unsigned int`.
    UInt,
    /// `long` (width depends on [`BitMode`]).
    SLong,
    /// `unsigned long` (width depends on [`BitMode`]).
    ULong,
    /// `long long`.
    SLLong,
    /// `unsigned long long`.
    ULLong,
    /// `float`.
    Float,
    /// `double`.
    Double,
    /// `long double`.
    LongDouble,
}

impl ScalarKind {
    /// All integer kinds, in ascending rank order within their signedness
    /// family.
    pub const INTEGERS: [ScalarKind; 11] = [
        ScalarKind::Bool,
        ScalarKind::SChar,
        ScalarKind::UChar,
        ScalarKind::SShort,
        ScalarKind::UShort,
        ScalarKind::SInt,
        ScalarKind::UInt,
        ScalarKind::SLong,
        ScalarKind::ULong,
        ScalarKind::SLLong,
        ScalarKind::ULLong,
    ];

    /// All floating-point kinds.
    pub const FLOATS: [ScalarKind; 3] = [ScalarKind::Float, ScalarKind::Double, ScalarKind::LongDouble];

    /// True for any of the integer kinds (including `bool`).
    pub const fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// True for `float`/`double`/`long double`.
    pub const fn is_float(self) -> bool {
        matches!(self, ScalarKind::Float | ScalarKind::Double | ScalarKind::LongDouble)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Static facts about one [`ScalarKind`], resolved against a [`BitMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarDescriptor {
    /// The kind this descriptor describes.
    pub kind: ScalarKind,
    /// Width in bits of the underlying representation.
    pub width_bits: u32,
    /// Whether the type is signed. Always `false` for floats (the sign is
    /// not part of the integer promotion/conversion machinery for them).
    pub is_signed: bool,
    /// Integer conversion rank (`spec.md` §3); meaningless (`0`) for float
    /// kinds, which use a separate widening rule.
    pub rank: u8,
    /// C literal suffix appended by the emitter (`""`, `"U"`, `"L"`, …).
    pub literal_suffix: &'static str,
    /// Source-level type name the emitter prints.
    pub source_name: &'static str,
}

impl ScalarDescriptor {
    /// Minimum representable value as a signed 128-bit integer (unsigned
    /// types always have minimum `0`). Meaningless for float kinds.
    pub fn min_i128(&self) -> i128 {
        if !self.is_signed {
            0
        } else {
            -(1i128 << (self.width_bits - 1))
        }
    }

    /// Maximum representable value as a 128-bit integer. Meaningless for
    /// float kinds.
    pub fn max_i128(&self) -> i128 {
        if self.is_signed {
            (1i128 << (self.width_bits - 1)) - 1
        } else {
            (1i128 << self.width_bits) - 1
        }
    }
}

/// Describes every [`ScalarKind`] against a fixed [`BitMode`].
///
/// Replaces the source's per-type singleton descriptors
/// (`TypeSInt::min`/`TypeSInt::max` static members in
/// `examples/original_source/include/type.hpp`) with one value threaded
/// explicitly through [`crate::context::Context`] and
/// [`crate::generator::Generator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRegistry {
    bit_mode: BitMode,
}

impl TypeRegistry {
    /// Build a registry for the given bit mode.
    pub const fn new(bit_mode: BitMode) -> Self {
        Self { bit_mode }
    }

    /// The bit mode this registry was built with.
    pub const fn bit_mode(&self) -> BitMode {
        self.bit_mode
    }

    /// Resolve the static descriptor for `kind`.
    pub fn describe(&self, kind: ScalarKind) -> ScalarDescriptor {
        let long_width = match self.bit_mode {
            BitMode::Mode32 => 32,
            BitMode::Mode64 => 64,
        };
        use ScalarKind::*;
        let (width_bits, is_signed, rank, literal_suffix, source_name) = match kind {
            Bool => (8, false, 0, "", "bool"),
            SChar => (8, true, 1, "", "signed char"),
            UChar => (8, false, 1, "", "unsigned char"),
            SShort => (16, true, 2, "", "short"),
            UShort => (16, false, 2, "", "unsigned short"),
            SInt => (32, true, 3, "", "int"),
            UInt => (32, false, 3, "U", "unsigned int"),
            SLong => (long_width, true, 4, "L", "long"),
            ULong => (long_width, false, 4, "UL", "unsigned long"),
            SLLong => (64, true, 5, "LL", "long long"),
            ULLong => (64, false, 5, "ULL", "unsigned long long"),
            Float => (32, false, 0, "f", "float"),
            Double => (64, false, 0, "", "double"),
            LongDouble => (64, false, 0, "L", "long double"),
        };
        ScalarDescriptor {
            kind,
            width_bits,
            is_signed,
            rank,
            literal_suffix,
            source_name,
        }
    }

    /// Integer conversion rank of `kind` (`spec.md` §3: `bool < char <
    /// short < int < long < long long`; signed/unsigned share a rank).
    pub fn rank(&self, kind: ScalarKind) -> u8 {
        self.describe(kind).rank
    }

    /// The unsigned partner of an integer kind (itself, if already
    /// unsigned).
    pub fn corresponding_unsigned(&self, kind: ScalarKind) -> ScalarKind {
        use ScalarKind::*;
        match kind {
            Bool => Bool,
            SChar | UChar => UChar,
            SShort | UShort => UShort,
            SInt | UInt => UInt,
            SLong | ULong => ULong,
            SLLong | ULLong => ULLong,
            other => other,
        }
    }

    /// The signed partner of an integer kind (itself, if already signed;
    /// `bool` has no signed partner and maps to itself).
    pub fn corresponding_signed(&self, kind: ScalarKind) -> ScalarKind {
        use ScalarKind::*;
        match kind {
            Bool => Bool,
            SChar | UChar => SChar,
            SShort | UShort => SShort,
            SInt | UInt => SInt,
            SLong | ULong => SLong,
            SLLong | ULLong => SLLong,
            other => other,
        }
    }

    /// Integral promotion target (`spec.md` §4.2/§4.5): kinds with rank
    /// below `int` promote to `int`, unless a bit-field's declared width
    /// means its values don't all fit in `int`, in which case it promotes
    /// to `unsigned int`, or — if even that doesn't fit — stays as its own
    /// type. Kinds already at or above `int` rank are unaffected.
    pub fn integral_promotion_target(&self, kind: ScalarKind, bitfield_width: Option<u32>) -> ScalarKind {
        if kind.is_float() {
            return kind;
        }
        let int_desc = self.describe(ScalarKind::SInt);
        if let Some(width) = bitfield_width {
            let uint_desc = self.describe(ScalarKind::UInt);
            return if width < int_desc.width_bits {
                ScalarKind::SInt
            } else if width <= uint_desc.width_bits {
                ScalarKind::UInt
            } else {
                kind
            };
        }
        if self.rank(kind) < self.rank(ScalarKind::SInt) {
            ScalarKind::SInt
        } else {
            kind
        }
    }

    /// True iff every value representable in `a` is representable in `b`,
    /// honoring the configured [`BitMode`] (`spec.md` §4.2).
    pub fn can_represent(&self, a: ScalarKind, b: ScalarKind) -> bool {
        if a.is_float() || b.is_float() {
            // Conservative: only allow float-to-wider-or-equal-float and
            // any-integer-to-float widening implicitly; anything else is
            // not implicitly safe.
            return match (a.is_float(), b.is_float()) {
                (true, true) => self.float_rank(a) <= self.float_rank(b),
                (false, true) => true,
                _ => false,
            };
        }
        let da = self.describe(a);
        let db = self.describe(b);
        da.min_i128() >= db.min_i128() && da.max_i128() <= db.max_i128()
    }

    fn float_rank(&self, kind: ScalarKind) -> u8 {
        match kind {
            ScalarKind::Float => 0,
            ScalarKind::Double => 1,
            ScalarKind::LongDouble => 2,
            _ => 0,
        }
    }

    /// The wider of two floating-point kinds (`spec.md` §4.5 FP path).
    pub fn wider_float(&self, a: ScalarKind, b: ScalarKind) -> ScalarKind {
        if self.float_rank(a) >= self.float_rank(b) {
            a
        } else {
            b
        }
    }
}
