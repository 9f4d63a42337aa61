//! `rpgen` binary entry point: wires the CLI surface through config
//! loading, policy resolution, generation, and harness emission
//! (`SPEC_FULL.md` §2 `bin/rpgen` row, §4.15).
//!
//! Grounded on the teacher's `bin/fuel-core.rs`-style thin `main` (parse
//! args, install a `tracing_subscriber`, delegate to library code,
//! normalize errors to a process exit code) rather than doing any real
//! work here.

use std::fs;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rpgen::cli::CliArgs;
use rpgen::config::GenConfig;
use rpgen::emit::Emitter;
use rpgen::error::{GenError, Result};
use rpgen::generator::{gen_externs, Generator, Program};
use rpgen::harness::Harness;
use rpgen::namegen::NameGenerator;
use rpgen::options::{GeneratorOptions, SeedSpec};
use rpgen::policy::GenPolicy;
use rpgen::prelude::{BitMode, Context};
use rpgen::types::TypeRegistry;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    if !args.quiet {
        tracing_subscriber::fmt::init();
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rpgen: {err}");
            ExitCode::from(255) // matches spec.md's -1 exit code
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let seed: SeedSpec = args.seed.parse()?;
    let seed = seed.resolve()?;

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))
                .map_err(|err| GenError::BadConfig(format!("{err:#}")))?;
            serde_json::from_str::<GenConfig>(&text)?
        }
        None => GenConfig::default_config(),
    };

    let bit_mode = if args.mode32 { BitMode::Mode32 } else { BitMode::Mode64 };
    let options = GeneratorOptions {
        bit_mode,
        lang_std: args.std,
        out_dir: args.out_dir.clone(),
        seed,
        quiet: args.quiet,
    };

    let reg = TypeRegistry::new(options.bit_mode);
    let mut policy_rng = StdRng::seed_from_u64(seed);
    let policy = GenPolicy::from_config(&config, &mut policy_rng);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut name_gen = NameGenerator::new();
    let (input, mixed, output) = gen_externs(&reg, &policy, &mut rng, &mut name_gen);
    let externs = rpgen::context::ExternTables {
        input: &input,
        mixed: &mixed,
        output: &output,
    };
    let ctx = Context::root(reg, externs);

    let generator = Generator::new(policy.max_total_exprs);
    let func_count = rpgen::consts::DEFAULT_TEST_FUNC_COUNT;
    let mut functions = Vec::with_capacity(func_count);
    for _ in 0..func_count {
        functions.push(generator.gen_function(&ctx, &policy, &mut rng, &mut name_gen));
    }
    let program = Program {
        input,
        mixed,
        output,
        functions,
    };

    tracing::debug!(total_exprs = generator.total_expr_count(), seed, "generation complete");

    let emitter = Emitter::new(&reg, options.lang_std);
    let basename = "func";
    let harness = Harness::new(&emitter, options.lang_std, basename);
    harness.write_all(&options.out_dir, &program, &options)?;

    if !options.quiet {
        println!("// rpgen seed {seed}");
    }
    Ok(())
}
