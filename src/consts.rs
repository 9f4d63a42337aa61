//! Generator-wide constants.

/// Generator version string. Encoded into `V_SEED`-form seeds so that a
/// seed produced by one generator version is never silently reinterpreted
/// by an incompatible one.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix used for input-bucket scalar/struct/array names.
pub const INPUT_PREFIX: &str = "var_inp";

/// Prefix used for mixed-bucket (read/write) scalar/struct/array names.
pub const MIXED_PREFIX: &str = "var_mix";

/// Prefix used for output-bucket scalar/struct/array names.
pub const OUTPUT_PREFIX: &str = "var_out";

/// Prefix used for locally declared scalars.
pub const LOCAL_PREFIX: &str = "var_loc";

/// Prefix used for generated struct type names.
pub const STRUCT_TYPE_PREFIX: &str = "Struct";

/// Prefix used for generated test function names.
pub const FUNC_PREFIX: &str = "test_func_";

/// Default maximum struct nesting depth honored by [`crate::types::composite`].
pub const DEFAULT_MAX_STRUCT_DEPTH: u32 = 2;

/// Default number of test functions emitted into one program.
pub const DEFAULT_TEST_FUNC_COUNT: usize = 1;

/// 64-bit mixing constant used by the driver's `hash` function
/// (`seed ^= v + 0x9e3779b9 + (seed<<6) + (seed>>2)`).
pub const HASH_MIX_CONST: u64 = 0x9e3779b9;
