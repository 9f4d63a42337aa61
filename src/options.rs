//! Process-wide generator options: the target language standard, the
//! output directory, the seed, and the 32/64-bit `long` mode
//! (`spec.md` §3, §6).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::consts;
use crate::error::GenError;
use crate::types::BitMode;

/// Target language/standard, selecting both surface syntax
/// ([`crate::emit::Emitter`]) and the file extensions
/// [`crate::harness`] writes (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum LangStd {
    #[value(name = "c99")]
    C99,
    #[value(name = "c11")]
    C11,
    #[value(name = "c++98")]
    Cxx98,
    #[value(name = "c++03")]
    Cxx03,
    #[value(name = "c++11")]
    Cxx11,
    #[value(name = "c++14")]
    Cxx14,
    #[value(name = "c++17")]
    Cxx17,
}

impl LangStd {
    pub const fn is_cpp(self) -> bool {
        !matches!(self, LangStd::C99 | LangStd::C11)
    }

    /// File extension used for the definitions/function/driver files.
    pub const fn source_extension(self) -> &'static str {
        if self.is_cpp() {
            "cpp"
        } else {
            "c"
        }
    }
}

impl fmt::Display for LangStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LangStd::C99 => "c99",
            LangStd::C11 => "c11",
            LangStd::Cxx98 => "c++98",
            LangStd::Cxx03 => "c++03",
            LangStd::Cxx11 => "c++11",
            LangStd::Cxx14 => "c++14",
            LangStd::Cxx17 => "c++17",
        };
        write!(f, "{s}")
    }
}

/// A parsed `-s/--seed` argument: either a bare seed or a
/// version-tagged `V_N` form that must match this generator's version
/// (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSpec {
    Bare(u64),
    Versioned { version: String, seed: u64 },
}

impl SeedSpec {
    /// Resolve to a concrete seed, checking the version tag if present.
    pub fn resolve(&self) -> Result<u64, GenError> {
        match self {
            SeedSpec::Bare(seed) => Ok(*seed),
            SeedSpec::Versioned { version, seed } => {
                if version == consts::VERSION {
                    Ok(*seed)
                } else {
                    Err(GenError::BadConfig(format!(
                        "seed was produced by generator version {version}, this is version {}",
                        consts::VERSION
                    )))
                }
            }
        }
    }
}

impl FromStr for SeedSpec {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('_') {
            Some((version, rest)) => {
                let seed = rest
                    .parse()
                    .map_err(|_| GenError::BadConfig(format!("invalid seed number in {s:?}")))?;
                Ok(SeedSpec::Versioned {
                    version: version.to_string(),
                    seed,
                })
            }
            None => {
                let seed = s.parse().map_err(|_| GenError::BadConfig(format!("invalid seed {s:?}")))?;
                Ok(SeedSpec::Bare(seed))
            }
        }
    }
}

/// Process-wide environment and surface options (`spec.md` §6).
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub bit_mode: BitMode,
    pub lang_std: LangStd,
    pub out_dir: PathBuf,
    pub seed: u64,
    pub quiet: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            bit_mode: BitMode::default(),
            lang_std: LangStd::Cxx17,
            out_dir: PathBuf::from("."),
            seed: 0,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_seed_parses_as_is() {
        assert_eq!("42".parse::<SeedSpec>().unwrap(), SeedSpec::Bare(42));
    }

    #[test]
    fn versioned_seed_resolves_when_version_matches() {
        let spec = SeedSpec::Versioned {
            version: consts::VERSION.to_string(),
            seed: 7,
        };
        assert_eq!(spec.resolve().unwrap(), 7);
    }

    #[test]
    fn versioned_seed_rejects_mismatched_version() {
        let spec = SeedSpec::Versioned {
            version: "not-a-real-version".to_string(),
            seed: 7,
        };
        assert!(spec.resolve().is_err());
    }

    #[test]
    fn cpp_standards_use_cpp_extension() {
        assert_eq!(LangStd::Cxx17.source_extension(), "cpp");
        assert_eq!(LangStd::C11.source_extension(), "c");
    }
}
