//! Quasigroup simplification CLI.
//!
//! Commands:
//! - cyclic: derive the simple form of a (scrambled) cyclic quasigroup
//! - load: derive the simple form of a generator output file
//! - classify: read saved checker outputs and print the verdicts

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use quasigroup_simple::{AffinityReport, IndexOrigin, Quasigroup, SubgroupVerdict};

#[derive(Parser)]
#[command(name = "quasigroup-simple")]
#[command(version)]
#[command(about = "Reduce finite quasigroups to a 2-simple form")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start from the cyclic quasigroup Z_n
    Cyclic {
        /// Order of the quasigroup
        #[arg(long)]
        order: usize,

        #[command(flatten)]
        derive: DeriveArgs,
    },

    /// Start from a table written by a generator program
    Load {
        /// Table file
        #[arg(long)]
        input: PathBuf,

        /// Elements in the file are numbered from 0 instead of 1
        #[arg(long)]
        zero_based: bool,

        #[command(flatten)]
        derive: DeriveArgs,
    },

    /// Print verdicts from saved checker outputs
    Classify {
        /// Captured standard output of the subgroup checker
        #[arg(long)]
        subgroups: PathBuf,

        /// Report file written by the affinity checker
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Args)]
struct DeriveArgs {
    /// Scramble rows, columns, and labels before deriving
    #[arg(long)]
    scramble: bool,

    /// Random seed for scrambling
    #[arg(long, env = "QUASIGROUP_SEED")]
    seed: Option<u64>,

    /// Where to export the simple quasigroup
    #[arg(long, env = "QUASIGROUP_OUT", default_value = "in.txt")]
    out: PathBuf,

    /// Print the source and derived tables
    #[arg(long)]
    show: bool,
}

fn derive(mut q: Quasigroup, args: &DeriveArgs) -> Result<()> {
    if args.scramble {
        let seed = args.seed.unwrap_or_else(rand::random);
        info!(seed, "scrambling");
        q.randomize(&mut ChaCha20Rng::seed_from_u64(seed));
    }
    if args.show {
        println!("{}\n", q);
    }

    let start = Instant::now();
    let simple = q.create_simple();
    let elapsed = start.elapsed();

    let Some(simple) = simple else {
        warn!(order = q.order(), "no simple form derivable");
        return Ok(());
    };
    if args.show {
        println!("{}", simple);
    }

    simple
        .export_to_file(&args.out)
        .with_context(|| format!("failed to export to {}", args.out.display()))?;
    info!(
        order = simple.order(),
        exec_time = elapsed.as_secs_f64(),
        out = %args.out.display(),
        "exported simple quasigroup"
    );
    Ok(())
}

fn classify(subgroups: &Path, report: Option<&Path>) -> Result<()> {
    let stdout = fs::read_to_string(subgroups)
        .with_context(|| format!("failed to read {}", subgroups.display()))?;
    let verdict = SubgroupVerdict::from_output(&stdout);
    match &verdict {
        SubgroupVerdict::NoSubgroups => println!("subgroups: none"),
        SubgroupVerdict::Other(line) => println!("subgroups: {}", line),
    }

    if !verdict.proceed() {
        return Ok(());
    }
    if let Some(path) = report {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let report = AffinityReport::parse(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        println!("not affine: {}", report.not_affine);
        println!("1-simple: {}", report.one_simple);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Commands::Cyclic { order, derive: args } => {
            if !(1..=quasigroup_simple::MAX_ORDER).contains(&order) {
                anyhow::bail!("order must be in range 1..={}", quasigroup_simple::MAX_ORDER);
            }
            derive(Quasigroup::new_cyclic(order), &args)
        }
        Commands::Load {
            input,
            zero_based,
            derive: args,
        } => {
            let origin = if zero_based {
                IndexOrigin::ZeroBased
            } else {
                IndexOrigin::OneBased
            };
            let q = Quasigroup::from_file(&input, origin)
                .with_context(|| format!("failed to load {}", input.display()))?;
            info!(order = q.order(), input = %input.display(), "loaded quasigroup");
            derive(q, &args)
        }
        Commands::Classify { subgroups, report } => classify(&subgroups, report.as_deref()),
    }
}
