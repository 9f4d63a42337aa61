//! `GenPolicy`: the resolved set of probability weights and bounds that
//! shape one generation run (`spec.md` §4.8).
//!
//! Grounded on `examples/original_source/include/options.hpp`'s
//! `GenPolicy` class and the pattern-application methods
//! (`set_similar_op_pattern`/`set_const_use_pattern`) that clone before
//! mutating. A [`GenPolicy`] is the *resolved* (sampled-from-[`crate::config::GenConfig`])
//! form of those settings — concrete bounds and weighted choice tables
//! rather than live distributions.

use crate::types::{ArrayKind, ScalarKind};
use crate::value::{BinOp, UnOp};

/// The kind of statement `Generator` may emit next inside a scope
/// (`spec.md` §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum StmtKind {
    Decl,
    ExprStmt,
    If,
}

/// Where a generated `ExprStmt`'s assignment target comes from
/// (`spec.md` §4.6 edge case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum AssignTarget {
    NewOutputVar,
    ExistingMixedVar,
    MixedOrOutputStructMember,
    MixedOrOutputArrayElement,
}

/// How an array-element access is subscripted when the generator needs
/// one (`spec.md` §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum SubscriptStyle {
    /// A literal constant index.
    Constant,
    /// An expression evaluated to an index at generation time.
    Computed,
}

/// One of the "similar operator" single-statement families
/// (`spec.md` §10 supplement #1): restricts `allowed_binary_ops` to a
/// related cluster instead of the full operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum OperatorFamily {
    Additive,
    Bitwise,
    Logic,
    Multiplicative,
    BitShift,
    AddMul,
}

impl OperatorFamily {
    pub fn operators(self) -> &'static [BinOp] {
        match self {
            OperatorFamily::Additive => &[BinOp::Add, BinOp::Sub],
            OperatorFamily::Bitwise => &[BinOp::BitAnd, BinOp::BitOr, BinOp::BitXor],
            OperatorFamily::Logic => &[BinOp::LogAnd, BinOp::LogOr],
            OperatorFamily::Multiplicative => &[BinOp::Mul, BinOp::Div, BinOp::Rem],
            OperatorFamily::BitShift => &[BinOp::Shl, BinOp::Shr],
            OperatorFamily::AddMul => &[BinOp::Add, BinOp::Sub, BinOp::Mul],
        }
    }
}

/// How heavily generated expressions lean on constants versus variable
/// reads (`spec.md` §10 supplement #2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, Default)]
pub enum ConstPattern {
    /// No bias; leaves (default).
    #[default]
    Unconstrained,
    /// Every leaf is a constant.
    AllConst,
    /// Leaves alternate between constants and variable reads.
    HalfConst,
}

/// Inclusive bounds sampled once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// A weighted choice table: candidates paired with a relative weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Weighted<T> {
    pub choices: Vec<(T, f64)>,
}

impl<T: Copy> Weighted<T> {
    pub fn new(choices: Vec<(T, f64)>) -> Self {
        debug_assert!(!choices.is_empty());
        Self { choices }
    }

    /// Pick one candidate using `roll` in `[0, 1)`.
    pub fn pick(&self, roll: f64) -> T {
        let total: f64 = self.choices.iter().map(|(_, w)| w).sum();
        let mut acc = 0.0;
        let target = roll * total;
        for (value, weight) in &self.choices {
            acc += weight;
            if target < acc {
                return *value;
            }
        }
        self.choices.last().unwrap().0
    }
}

/// The resolved generation policy for one run (`spec.md` §4.8).
#[derive(Debug, Clone)]
pub struct GenPolicy {
    pub allowed_scalar_types: Vec<ScalarKind>,
    pub allowed_unary_ops: Vec<UnOp>,
    pub allowed_binary_ops: Vec<BinOp>,
    pub stmt_kind_weights: Weighted<StmtKind>,
    pub assign_target_weights: Weighted<AssignTarget>,
    pub max_expr_depth: u32,
    pub max_total_exprs: u32,
    pub max_func_exprs: u32,
    pub max_stmts_per_func: u32,
    pub scope_stmt_count: Bounds,
    pub input_var_count: Bounds,
    pub mixed_var_count: Bounds,
    pub output_var_count: Bounds,
    pub struct_count: Bounds,
    pub array_count: Bounds,
    pub max_struct_depth: u32,
    pub array_kind_weights: Weighted<ArrayKind>,
    pub subscript_style_weights: Weighted<SubscriptStyle>,
    pub bitfield_width: Bounds,
    pub cse_count: u32,
    pub operator_family: Option<OperatorFamily>,
    pub const_pattern: ConstPattern,
}

impl Default for GenPolicy {
    fn default() -> Self {
        use ScalarKind::*;
        Self {
            allowed_scalar_types: vec![Bool, SChar, UChar, SShort, UShort, SInt, UInt, SLong, ULong, SLLong, ULLong, Float, Double],
            allowed_unary_ops: vec![UnOp::Plus, UnOp::Minus, UnOp::BitNot, UnOp::LogNot, UnOp::PreInc, UnOp::PreDec],
            allowed_binary_ops: vec![
                BinOp::Add,
                BinOp::Sub,
                BinOp::Mul,
                BinOp::Div,
                BinOp::Rem,
                BinOp::Shl,
                BinOp::Shr,
                BinOp::BitAnd,
                BinOp::BitOr,
                BinOp::BitXor,
                BinOp::Lt,
                BinOp::Gt,
                BinOp::Le,
                BinOp::Ge,
                BinOp::Eq,
                BinOp::Ne,
                BinOp::LogAnd,
                BinOp::LogOr,
            ],
            stmt_kind_weights: Weighted::new(vec![(StmtKind::Decl, 0.2), (StmtKind::ExprStmt, 0.65), (StmtKind::If, 0.15)]),
            assign_target_weights: Weighted::new(vec![
                (AssignTarget::NewOutputVar, 0.25),
                (AssignTarget::ExistingMixedVar, 0.35),
                (AssignTarget::MixedOrOutputStructMember, 0.2),
                (AssignTarget::MixedOrOutputArrayElement, 0.2),
            ]),
            max_expr_depth: 5,
            max_total_exprs: 5000,
            max_func_exprs: 500,
            max_stmts_per_func: 64,
            scope_stmt_count: Bounds::new(1, 8),
            input_var_count: Bounds::new(2, 6),
            mixed_var_count: Bounds::new(2, 6),
            output_var_count: Bounds::new(1, 4),
            struct_count: Bounds::new(0, 3),
            array_count: Bounds::new(0, 3),
            max_struct_depth: crate::consts::DEFAULT_MAX_STRUCT_DEPTH,
            array_kind_weights: Weighted::new(vec![
                (ArrayKind::CArray, 0.4),
                (ArrayKind::DynamicVector, 0.2),
                (ArrayKind::FixedArray, 0.2),
                (ArrayKind::Valarray, 0.2),
            ]),
            subscript_style_weights: Weighted::new(vec![(SubscriptStyle::Constant, 0.5), (SubscriptStyle::Computed, 0.5)]),
            bitfield_width: Bounds::new(1, 8),
            cse_count: 4,
            operator_family: None,
            const_pattern: ConstPattern::default(),
        }
    }
}

impl GenPolicy {
    /// Clone this policy restricted to one "similar operator" family
    /// (`spec.md` §10 supplement #1). Never mutates `self`.
    pub fn with_operator_family(&self, family: OperatorFamily) -> GenPolicy {
        let mut cloned = self.clone();
        cloned.allowed_binary_ops = family.operators().to_vec();
        cloned.operator_family = Some(family);
        cloned
    }

    /// Clone this policy with a given constant-use bias (`spec.md` §10
    /// supplement #2). Never mutates `self`.
    pub fn with_const_pattern(&self, pattern: ConstPattern) -> GenPolicy {
        let mut cloned = self.clone();
        cloned.const_pattern = pattern;
        cloned
    }

    /// Resolve one run's concrete bounds from a sampleable
    /// [`crate::config::GenConfig`], starting from [`GenPolicy::default`]
    /// for every knob the config doesn't name (`spec.md` §4.8, §6).
    pub fn from_config(config: &crate::config::GenConfig, rng: &mut impl rand::Rng) -> GenPolicy {
        let mut policy = GenPolicy::default();

        if let Some(v) = sample_u32(config, "max_expr_depth", rng) {
            policy.max_expr_depth = v;
        }
        if let Some(v) = sample_u32(config, "max_total_exprs", rng) {
            policy.max_total_exprs = v;
        }
        if let Some(v) = sample_u32(config, "max_func_exprs", rng) {
            policy.max_func_exprs = v;
        }
        if let Some(v) = sample_u32(config, "max_stmts_per_func", rng) {
            policy.max_stmts_per_func = v;
        }
        if let (Some(lo), Some(hi)) = (sample_u32(config, "scope_stmt_count_min", rng), sample_u32(config, "scope_stmt_count_max", rng)) {
            policy.scope_stmt_count = Bounds::new(lo, hi.max(lo));
        }
        if let (Some(lo), Some(hi)) = (sample_u32(config, "input_var_count_min", rng), sample_u32(config, "input_var_count_max", rng)) {
            policy.input_var_count = Bounds::new(lo, hi.max(lo));
        }
        if let (Some(lo), Some(hi)) = (sample_u32(config, "mixed_var_count_min", rng), sample_u32(config, "mixed_var_count_max", rng)) {
            policy.mixed_var_count = Bounds::new(lo, hi.max(lo));
        }
        if let (Some(lo), Some(hi)) = (sample_u32(config, "output_var_count_min", rng), sample_u32(config, "output_var_count_max", rng)) {
            policy.output_var_count = Bounds::new(lo, hi.max(lo));
        }
        if let (Some(lo), Some(hi)) = (sample_u32(config, "struct_count_min", rng), sample_u32(config, "struct_count_max", rng)) {
            policy.struct_count = Bounds::new(lo, hi.max(lo));
        }
        if let (Some(lo), Some(hi)) = (sample_u32(config, "array_count_min", rng), sample_u32(config, "array_count_max", rng)) {
            policy.array_count = Bounds::new(lo, hi.max(lo));
        }
        if let Some(v) = sample_u32(config, "max_struct_depth", rng) {
            policy.max_struct_depth = v;
        }
        if let Some(v) = sample_u32(config, "cse_count", rng) {
            policy.cse_count = v;
        }

        let decl_w = config.get("stmt_kind_weight_decl").map(|c| c.value.sample(rng));
        let expr_w = config.get("stmt_kind_weight_expr").map(|c| c.value.sample(rng));
        let if_w = config.get("stmt_kind_weight_if").map(|c| c.value.sample(rng));
        if let (Some(d), Some(e), Some(i)) = (decl_w, expr_w, if_w) {
            policy.stmt_kind_weights = Weighted::new(vec![(StmtKind::Decl, d), (StmtKind::ExprStmt, e), (StmtKind::If, i)]);
        }

        policy
    }
}

/// Sample one bounded-integer option from `config` if present, leaving the
/// caller's default untouched otherwise.
fn sample_u32(config: &crate::config::GenConfig, name: &str, rng: &mut impl rand::Rng) -> Option<u32> {
    config.get(name).map(|c| c.value.sample_u32(rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_application_never_mutates_original() {
        let base = GenPolicy::default();
        let original_ops = base.allowed_binary_ops.clone();
        let restricted = base.with_operator_family(OperatorFamily::Additive);
        assert_eq!(restricted.allowed_binary_ops, vec![BinOp::Add, BinOp::Sub]);
        assert_eq!(base.allowed_binary_ops, original_ops);
    }

    #[test]
    fn weighted_pick_is_deterministic_given_roll() {
        let w = Weighted::new(vec![("a", 1.0), ("b", 1.0), ("c", 2.0)]);
        assert_eq!(w.pick(0.0), "a");
        assert_eq!(w.pick(0.99), "c");
    }

    #[test]
    fn from_config_overrides_named_bounds_and_keeps_the_rest_default() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut config = crate::config::GenConfig::default_config();
        config.options.insert(
            "max_expr_depth".to_string(),
            crate::config::ConfigValue::new(crate::config::Distribution::uniform(9.0, 9.0), "fixed for test"),
        );
        let mut rng = StdRng::seed_from_u64(1);
        let resolved = GenPolicy::from_config(&config, &mut rng);
        assert_eq!(resolved.max_expr_depth, 9);
        assert_eq!(resolved.allowed_scalar_types, GenPolicy::default().allowed_scalar_types);
    }
}
