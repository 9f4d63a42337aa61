//! JSON configuration: distributions, patch diff/apply, and a compact
//! textual patch encoding (`spec.md` §6, `SPEC_FULL.md` §4.14).
//!
//! Grounded on `examples/original_source/include/options.hpp`'s
//! `GenerationOptions`/`ProbabilityOption` pair (a JSON object keyed by
//! option name, each entry carrying a `value` distribution and a
//! human-readable `descr`) and on `serde`/`serde_json`, the teacher's
//! JSON stack (`examples/FuelLabs-fuel-vm/Cargo.toml`).

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// A sampleable probability distribution. Percentages are encoded as
/// plain `f64` in `[0.0, 100.0]` or as raw bounds, depending on the
/// option; `sample` always returns a value in the distribution's support.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "value", rename_all = "snake_case")]
pub enum Distribution {
    Uniform { min: f64, max: f64 },
    Normal { mean: f64, dev: f64 },
}

impl Distribution {
    pub fn uniform(min: f64, max: f64) -> Self {
        Distribution::Uniform { min, max }
    }

    pub fn normal(mean: f64, dev: f64) -> Self {
        Distribution::Normal { mean, dev }
    }

    /// Draw one sample. Normal samples are produced via a Box-Muller
    /// transform (no extra dependency beyond `rand`) and clamped to a
    /// sane range around the mean.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        match *self {
            Distribution::Uniform { min, max } => {
                if min >= max {
                    min
                } else {
                    rng.gen_range(min..max)
                }
            }
            Distribution::Normal { mean, dev } => {
                let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = rng.gen_range(0.0..1.0);
                let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
                mean + z0 * dev
            }
        }
    }

    /// Sample and round to a non-negative integer bound.
    pub fn sample_u32(&self, rng: &mut impl Rng) -> u32 {
        self.sample(rng).round().max(0.0) as u32
    }
}

/// One named, documented configuration knob.
///
/// `value` is flattened so the distribution's tag and fields sit as
/// direct siblings of `descr` (`examples/original_source/include/config_parser.hpp`'s
/// `ADD_UNIFORM_DISTR`/`ADD_NORM_DISTR` macros: `{"value": "uniform", "min":.., "max":..,
/// "descr":..}`, not a nested object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigValue {
    #[serde(flatten)]
    pub value: Distribution,
    pub descr: String,
}

impl ConfigValue {
    pub fn new(value: Distribution, descr: impl Into<String>) -> Self {
        Self { value, descr: descr.into() }
    }
}

/// The generation configuration: a JSON object keyed by option name
/// (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenConfig {
    #[serde(flatten)]
    pub options: BTreeMap<String, ConfigValue>,
}

/// Canonical option names, in a fixed order, used only to assign stable
/// small integer IDs for the compact patch encoding.
pub const OPTION_NAMES: &[&str] = &[
    "max_expr_depth",
    "max_total_exprs",
    "max_func_exprs",
    "max_stmts_per_func",
    "scope_stmt_count_min",
    "scope_stmt_count_max",
    "input_var_count_min",
    "input_var_count_max",
    "mixed_var_count_min",
    "mixed_var_count_max",
    "output_var_count_min",
    "output_var_count_max",
    "struct_count_min",
    "struct_count_max",
    "array_count_min",
    "array_count_max",
    "max_struct_depth",
    "cse_count",
    "stmt_kind_weight_decl",
    "stmt_kind_weight_expr",
    "stmt_kind_weight_if",
];

fn option_id(name: &str) -> Option<usize> {
    OPTION_NAMES.iter().position(|n| *n == name)
}

fn option_name(id: usize) -> Option<&'static str> {
    OPTION_NAMES.get(id).copied()
}

impl GenConfig {
    /// The built-in default configuration (`spec.md` §6; mirrors
    /// [`crate::policy::GenPolicy::default`]'s bounds as distributions).
    pub fn default_config() -> Self {
        let mut options = BTreeMap::new();
        let mut put = |name: &str, value: Distribution, descr: &str| {
            options.insert(name.to_string(), ConfigValue::new(value, descr));
        };
        put("max_expr_depth", Distribution::uniform(3.0, 6.0), "maximum expression tree depth");
        put("max_total_exprs", Distribution::uniform(2000.0, 5000.0), "program-wide expression budget");
        put("max_func_exprs", Distribution::uniform(200.0, 500.0), "per-function expression budget");
        put("max_stmts_per_func", Distribution::uniform(32.0, 64.0), "per-function statement cap");
        put("scope_stmt_count_min", Distribution::uniform(1.0, 1.0), "minimum statements per scope");
        put("scope_stmt_count_max", Distribution::uniform(4.0, 8.0), "maximum statements per scope");
        put("input_var_count_min", Distribution::uniform(2.0, 2.0), "minimum input-bucket variables");
        put("input_var_count_max", Distribution::uniform(4.0, 6.0), "maximum input-bucket variables");
        put("mixed_var_count_min", Distribution::uniform(2.0, 2.0), "minimum mixed-bucket variables");
        put("mixed_var_count_max", Distribution::uniform(4.0, 6.0), "maximum mixed-bucket variables");
        put("output_var_count_min", Distribution::uniform(1.0, 1.0), "minimum output-bucket variables");
        put("output_var_count_max", Distribution::uniform(2.0, 4.0), "maximum output-bucket variables");
        put("struct_count_min", Distribution::uniform(0.0, 0.0), "minimum struct types");
        put("struct_count_max", Distribution::uniform(1.0, 3.0), "maximum struct types");
        put("array_count_min", Distribution::uniform(0.0, 0.0), "minimum array types");
        put("array_count_max", Distribution::uniform(1.0, 3.0), "maximum array types");
        put(
            "max_struct_depth",
            Distribution::uniform(crate::consts::DEFAULT_MAX_STRUCT_DEPTH as f64, crate::consts::DEFAULT_MAX_STRUCT_DEPTH as f64),
            "maximum struct nesting depth",
        );
        put("cse_count", Distribution::uniform(0.0, 4.0), "number of common-subexpression templates");
        put("stmt_kind_weight_decl", Distribution::uniform(20.0, 20.0), "relative weight of Decl statements");
        put("stmt_kind_weight_expr", Distribution::uniform(65.0, 65.0), "relative weight of ExprStmt statements");
        put("stmt_kind_weight_if", Distribution::uniform(15.0, 15.0), "relative weight of If statements");
        Self { options }
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.options.get(name)
    }

    /// Produce the list of patch ops that would turn `self` into `other`
    /// (`spec.md` §6 JSON-patch round trip: values that differ or are
    /// added/removed between the two configs).
    pub fn diff(&self, other: &GenConfig) -> Vec<PatchOp> {
        let mut ops = Vec::new();
        for (name, value) in &other.options {
            match self.options.get(name) {
                Some(existing) if existing == value => {}
                Some(_) => ops.push(PatchOp::replace(name, value.clone())),
                None => ops.push(PatchOp::add(name, value.clone())),
            }
        }
        for name in self.options.keys() {
            if !other.options.contains_key(name) {
                ops.push(PatchOp::remove(name));
            }
        }
        ops
    }

    /// Apply a list of patch ops, returning the patched configuration.
    /// `apply(diff(a, b)) == b` for any two configs `a`, `b` (`spec.md`
    /// §8 round-trip property).
    pub fn apply(&self, ops: &[PatchOp]) -> GenConfig {
        let mut result = self.clone();
        for op in ops {
            match &op.action {
                PatchAction::Add | PatchAction::Replace => {
                    result.options.insert(op.option.clone(), op.value.clone().expect("add/replace carries a value"));
                }
                PatchAction::Remove => {
                    result.options.remove(&op.option);
                }
            }
        }
        result
    }
}

/// One JSON-patch-style operation against a [`GenConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOp {
    pub action: PatchAction,
    pub option: String,
    pub value: Option<ConfigValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    Add,
    Remove,
    Replace,
}

const ACTIONS: [PatchAction; 3] = [PatchAction::Add, PatchAction::Remove, PatchAction::Replace];

impl PatchAction {
    fn id(self) -> usize {
        ACTIONS.iter().position(|a| *a == self).expect("exhaustive action list")
    }

    fn from_id(id: usize) -> Option<Self> {
        ACTIONS.get(id).copied()
    }
}

impl PatchOp {
    pub fn add(option: impl Into<String>, value: ConfigValue) -> Self {
        Self {
            action: PatchAction::Add,
            option: option.into(),
            value: Some(value),
        }
    }

    pub fn replace(option: impl Into<String>, value: ConfigValue) -> Self {
        Self {
            action: PatchAction::Replace,
            option: option.into(),
            value: Some(value),
        }
    }

    pub fn remove(option: impl Into<String>) -> Self {
        Self {
            action: PatchAction::Remove,
            option: option.into(),
            value: None,
        }
    }
}

/// Compact textual encoding of a batch of [`PatchOp`]s: `action` and
/// `option` are written as numeric IDs (into [`ACTIONS`]/[`OPTION_NAMES`]),
/// fields within one patch are joined with `#`, and patches are joined
/// with `|` (`spec.md` §6).
pub struct CompactPatch;

impl CompactPatch {
    pub fn encode(ops: &[PatchOp]) -> Result<String> {
        let mut parts = Vec::with_capacity(ops.len());
        for op in ops {
            let option_id = option_id(&op.option)
                .ok_or_else(|| GenError::BadConfig(format!("unknown option in patch: {}", op.option)))?;
            let value_json = match &op.value {
                Some(v) => serde_json::to_string(v)?,
                None => String::new(),
            };
            parts.push(format!("{}#{}#{}", op.action.id(), option_id, value_json));
        }
        Ok(parts.join("|"))
    }

    pub fn decode(encoded: &str) -> Result<Vec<PatchOp>> {
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        encoded.split('|').map(Self::decode_one).collect()
    }

    fn decode_one(part: &str) -> Result<PatchOp> {
        let mut fields = part.splitn(3, '#');
        let action_id: usize = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| GenError::BadConfig(format!("malformed patch action in {part:?}")))?;
        let option_id: usize = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| GenError::BadConfig(format!("malformed patch option in {part:?}")))?;
        let value_json = fields.next().unwrap_or("");

        let action = PatchAction::from_id(action_id).ok_or_else(|| GenError::BadConfig(format!("unknown action id {action_id}")))?;
        let option = option_name(option_id)
            .ok_or_else(|| GenError::BadConfig(format!("unknown option id {option_id}")))?
            .to_string();
        let value = if value_json.is_empty() {
            None
        } else {
            Some(serde_json::from_str(value_json)?)
        };

        Ok(PatchOp { action, option, value })
    }
}

impl fmt::Display for PatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatchAction::Add => "add",
            PatchAction::Remove => "remove",
            PatchAction::Replace => "replace",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_of_diff_round_trips() {
        let base = GenConfig::default_config();
        let mut changed = base.clone();
        changed.options.insert(
            "max_expr_depth".to_string(),
            ConfigValue::new(Distribution::uniform(1.0, 2.0), "overridden"),
        );
        let patch = base.diff(&changed);
        let applied = base.apply(&patch);
        assert_eq!(applied, changed);
    }

    #[test]
    fn compact_patch_decode_of_encode_is_identity() {
        let base = GenConfig::default_config();
        let mut changed = base.clone();
        changed.options.insert("cse_count".to_string(), ConfigValue::new(Distribution::uniform(9.0, 9.0), "bumped"));
        let patch = base.diff(&changed);
        let encoded = CompactPatch::encode(&patch).unwrap();
        let decoded = CompactPatch::decode(&encoded).unwrap();
        assert_eq!(decoded, patch);
    }

    #[test]
    fn empty_patch_encodes_to_empty_string() {
        assert_eq!(CompactPatch::encode(&[]).unwrap(), "");
        assert!(CompactPatch::decode("").unwrap().is_empty());
    }
}
