//! nozzle-wipe CLI - turn G-code retractions into nozzle wipes
//!
//! Streams a G-code program through the position tracker and the wipe
//! engine. `plan` reports the wipes it would make; `apply` rewrites the
//! program with them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nozzle_wipe_gcode::{LineAction, WipeProcessor};
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "nozzle-wipe")]
#[command(about = "Replace G-code retractions with nozzle wipes", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WipeOptions {
    /// TOML file with wipe settings
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Wipe half the distance, retracting both ways
    #[arg(long)]
    half_wipe: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the wipe planned at every retraction
    Plan {
        /// Input G-code file
        input: PathBuf,
        #[command(flatten)]
        options: WipeOptions,
    },
    /// Write a copy of the program with retractions replaced by wipes
    Apply {
        /// Input G-code file
        input: PathBuf,
        /// Output G-code file
        output: PathBuf,
        #[command(flatten)]
        options: WipeOptions,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Plan { input, options } => {
            let config = load_config(&options)?;
            let stdout = std::io::stdout();
            plan(&input, &config, &mut stdout.lock())?;
        }
        Commands::Apply {
            input,
            output,
            options,
        } => {
            let config = load_config(&options)?;
            let file = File::create(&output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            let mut writer = BufWriter::new(file);
            apply(&input, &config, &mut writer)?;
            writer
                .flush()
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    // RUST_LOG still wins over the default level, e.g.
    // RUST_LOG=nozzle_wipe=trace nozzle-wipe plan part.gcode
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn load_config(options: &WipeOptions) -> Result<Config> {
    let mut config = Config::load(options.config.as_deref())?;
    if options.half_wipe {
        config.full_wipe = false;
    }
    Ok(config)
}

fn read_program(input: &Path) -> Result<String> {
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn processor(config: &Config) -> Result<WipeProcessor> {
    WipeProcessor::new(config.settings, config.gcode, config.full_wipe)
        .context("invalid wipe settings")
}

/// Report every planned wipe; the program itself is not echoed.
fn plan(input: &Path, config: &Config, out: &mut impl Write) -> Result<()> {
    let program = read_program(input)?;
    let mut processor = processor(config)?;
    let mut wipes = 0;
    for line in program.lines() {
        if let LineAction::Wipe(wipe) = processor.process_line(line)? {
            writeln!(
                out,
                "; line {}: {} trail entries, {:.3} mm",
                wipe.line, wipe.trail_len, wipe.trail_distance
            )?;
            out.write_all(wipe.to_gcode(&config.output).as_bytes())?;
            wipes += 1;
        }
    }
    info!(input = %input.display(), wipes, "planned wipes");
    Ok(())
}

/// Copy the program, swapping each wipeable retraction for its wipe.
fn apply(input: &Path, config: &Config, out: &mut impl Write) -> Result<()> {
    let program = read_program(input)?;
    let mut processor = processor(config)?;
    let mut wipes = 0;
    for line in program.lines() {
        match processor.process_line(line)? {
            LineAction::Keep => writeln!(out, "{line}")?,
            LineAction::Wipe(wipe) => {
                out.write_all(wipe.to_gcode(&config.output).as_bytes())?;
                wipes += 1;
            }
        }
    }
    info!(input = %input.display(), wipes, "applied wipes");
    Ok(())
}
