//! Caseforge command line
//!
//! Usage:
//!   caseforge inspect <case>           - List items and drop odds
//!   caseforge open <case>              - Run one animated open headlessly
//!   caseforge simulate <case> -n 1000  - Batch-simulate opens

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use cf_case_lab::{
    CaseParser, CaseSimulator, LoadedCase, SpinConfig, SpinProfile, SpinSession,
    expected_tier_odds,
};
use cf_core::Condition;
use cf_stage::Stage;

#[derive(Parser)]
#[command(name = "caseforge", about = "Loot case outcome engine", version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Spin config file (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a case's items and analytic drop odds
    Inspect {
        /// Case document
        case: PathBuf,
    },
    /// Run one animated open and print its stage events
    Open {
        /// Case document
        case: PathBuf,
        /// Seed for reproducible draws
        #[arg(long)]
        seed: Option<u64>,
        /// Physics preset (ignored when --config is given)
        #[arg(long, value_enum, default_value_t = Profile::Standard)]
        profile: Profile,
        /// Frames per second used to step the reel
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// Give up after this many frames
        #[arg(long, default_value_t = 100_000)]
        max_steps: usize,
        /// Hide scroll ticks
        #[arg(long)]
        no_ticks: bool,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Resolve many opens without animation
    Simulate {
        /// Case document
        case: PathBuf,
        /// Number of opens
        #[arg(short, long, default_value_t = 100_000)]
        n: u64,
        /// Seed for reproducible draws
        #[arg(long)]
        seed: Option<u64>,
        /// Print the raw statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Standard,
    Turbo,
    Classic,
}

impl From<Profile> for SpinProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Standard => SpinProfile::Standard,
            Profile::Turbo => SpinProfile::Turbo,
            Profile::Classic => SpinProfile::Classic,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Inspect { case } => inspect(&case),
        Commands::Open {
            case,
            seed,
            profile,
            fps,
            max_steps,
            no_ticks,
            json,
        } => {
            let config = spin_config(cli.config.as_deref(), profile.into())?;
            open(&case, config, seed, fps, max_steps, no_ticks, json)
        }
        Commands::Simulate { case, n, seed, json } => simulate(&case, n, seed, json),
    }
}

fn load_case(path: &Path) -> Result<LoadedCase> {
    CaseParser::new()
        .load(path)
        .with_context(|| format!("Failed to load case {}", path.display()))
}

fn spin_config(path: Option<&Path>, profile: SpinProfile) -> Result<SpinConfig> {
    match path {
        Some(path) => SpinConfig::load(path)
            .with_context(|| format!("Failed to load spin config {}", path.display())),
        None => Ok(SpinConfig::from_profile(profile)),
    }
}

fn inspect(path: &Path) -> Result<()> {
    let LoadedCase { case, table } = load_case(path)?;

    println!("{} ({} items, {} keys)", case.name(), case.items().len(), case.key_count());
    if let Some(image) = case.image() {
        println!("  image: {image}");
    }
    println!();
    for item in case.items() {
        println!("  [{:<12}] {}", item.rarity.display_name(), item.display_name());
    }

    println!();
    println!("Drop odds:");
    let odds = expected_tier_odds(&case, &table).context("Case cannot be drawn")?;
    for (tier, chance) in odds {
        println!(
            "  {:<12} {:>8.4}%  ({} items)",
            tier.display_name(),
            chance * 100.0,
            case.count_of(tier)
        );
    }
    Ok(())
}

fn open(
    path: &Path,
    config: SpinConfig,
    seed: Option<u64>,
    fps: f64,
    max_steps: usize,
    no_ticks: bool,
    json: bool,
) -> Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("--fps must be positive, got {fps}");
    }
    let LoadedCase { case, table } = load_case(path)?;
    let case = Arc::new(case);

    let mut session = match seed {
        Some(seed) => SpinSession::seeded(case, table, config, seed),
        None => SpinSession::new(case, table, config),
    }
    .context("Invalid case or spin configuration")?;

    session.open().context("Failed to open case")?;
    let outcome = session
        .settle(1.0 / fps, max_steps)
        .context("Reel did not settle")?;

    for event in session.drain_events() {
        if no_ticks && matches!(event.stage, Stage::ScrollTick { .. }) {
            continue;
        }
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{event}");
        }
    }

    if !json {
        println!();
        println!(
            "{} | {} ({}) wear {:.6} after {} frames ({:.0} ms)",
            outcome.tier,
            outcome.item.display_name(),
            outcome.condition,
            outcome.wear.value(),
            outcome.steps,
            outcome.elapsed_ms
        );
    }
    Ok(())
}

fn simulate(path: &Path, n: u64, seed: Option<u64>, json: bool) -> Result<()> {
    let LoadedCase { case, table } = load_case(path)?;

    let mut simulator = match seed {
        Some(seed) => CaseSimulator::seeded(seed),
        None => CaseSimulator::new(),
    };
    let stats = simulator
        .run(&case, &table, n)
        .context("Simulation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}: {} opens", case.name(), stats.opens);
    println!();
    println!("  {:<12} {:>10} {:>10}", "Tier", "Observed", "Expected");
    for (tier, expected) in expected_tier_odds(&case, &table)? {
        println!(
            "  {:<12} {:>9.4}% {:>9.4}%",
            tier.display_name(),
            stats.tier_frequency(tier) * 100.0,
            expected * 100.0
        );
    }

    println!();
    for condition in Condition::ALL {
        let (lower, upper) = condition.wear_range().unwrap_or((0.0, 0.0));
        println!(
            "  {} {:<15} {:>9.4}%  (wear {:.2}-{:.2})",
            condition.short_name(),
            condition.display_name(),
            stats.condition_frequency(condition) * 100.0,
            lower,
            upper
        );
    }
    println!();
    println!("  mean wear {:.4}, fallbacks {}", stats.mean_wear(), stats.fallbacks);
    Ok(())
}
