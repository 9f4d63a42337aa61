//! Command-line surface (`spec.md` §6, `SPEC_FULL.md` §4.15).
//!
//! Grounded on `examples/Vector35-idb-rs/src/tools/tools.rs`'s
//! `clap::Parser` usage — the only `clap`-based CLI in the retrieval pack.
//! `--help`/`-h` and `--version`/`-v` are provided by `clap` itself.

use std::path::PathBuf;

use clap::Parser;

use crate::options::LangStd;

/// Deterministic random program generator for compiler stress testing.
#[derive(Debug, Parser)]
#[command(name = "rpgen", version, about)]
pub struct CliArgs {
    /// Suppress informational logging.
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory to write the generated program and harness into.
    #[arg(short = 'd', long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,

    /// Seed: a bare integer, or `VERSION_SEED` to pin the generator
    /// version a seed was produced by.
    #[arg(short, long, default_value = "0")]
    pub seed: String,

    /// Target language standard.
    #[arg(long = "std", value_enum, default_value_t = LangStd::Cxx17)]
    pub std: LangStd,

    /// Optional JSON configuration file overriding the built-in defaults.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Force 32-bit `long`/`unsigned long` (default: 64-bit).
    #[arg(long = "mode32")]
    pub mode32: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation_with_defaults() {
        let args = CliArgs::parse_from(["rpgen"]);
        assert!(!args.quiet);
        assert_eq!(args.out_dir, PathBuf::from("."));
        assert_eq!(args.seed, "0");
        assert_eq!(args.std, LangStd::Cxx17);
    }

    #[test]
    fn parses_full_invocation() {
        let args = CliArgs::parse_from(["rpgen", "-q", "-d", "/tmp/out", "-s", "42_7", "--std", "c11", "--mode32"]);
        assert!(args.quiet);
        assert_eq!(args.out_dir, PathBuf::from("/tmp/out"));
        assert_eq!(args.seed, "42_7");
        assert_eq!(args.std, LangStd::C11);
        assert!(args.mode32);
    }
}
