use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};

use mdsim::elements::{element_mass, ELEMENTS};
use mdsim::io::SnapshotWriter;
use mdsim::sink::{LogSink, PacedSink};
use mdsim::{SimConfig, Simulation};

#[derive(Parser)]
#[command(name = "mdsim")]
#[command(about = "Toy molecular dynamics: confined atoms, elastic collisions, clustering", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Config TOML file (defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for snapshots
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation
    Run {
        #[command(flatten)]
        common: Common,

        /// Number of steps (overrides run.num_steps)
        #[arg(long)]
        steps: Option<u64>,

        /// Write a snapshot every N steps
        #[arg(long, value_name = "N")]
        interval: Option<u64>,

        /// Throttle stepping to at most this many frames per second (0 = unthrottled)
        #[arg(long, default_value_t = 0)]
        fps: u32,

        /// Print the energy log (step, kinetic, potential, total) to stdout
        #[arg(long, action = ArgAction::SetTrue)]
        print_energy: bool,
    },
    /// Run once per element, with mass and label taken from the element table
    Sweep {
        #[command(flatten)]
        common: Common,

        /// Comma-separated element symbols (default: the whole table)
        #[arg(long, value_delimiter = ',')]
        elements: Option<Vec<String>>,
    },
    /// Validate a configuration and print it with defaults filled in
    Check {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    match path {
        Some(p) => SimConfig::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(SimConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Run {
            common,
            steps,
            interval,
            fps,
            print_energy,
        } => {
            let mut cfg = load_config(common.config.as_ref())?;
            if let Some(n) = steps {
                cfg.run.num_steps = n;
            }
            if let Some(dir) = common.output {
                cfg.output.directory = dir;
            }
            if interval.is_some() {
                cfg.output.interval = interval;
            }

            let writer = SnapshotWriter::from_config(&cfg);
            let mut sim = Simulation::new(cfg, common.seed).context("initializing simulation")?;
            let mut sink = PacedSink::new(LogSink, fps);
            let summary = sim.run(&mut sink, Some(&writer))?;

            if print_energy {
                println!("# step kinetic potential total");
                for (i, e) in sim.energy_log().iter().enumerate() {
                    println!("{} {:.6} {:.6} {:.6}", i + 1, e.kinetic, e.potential, e.total);
                }
            }
            log::info!(
                "{} steps, {} hard-core collisions, {} merges, {} clusters of 2+",
                summary.steps,
                summary.hard_core_collisions,
                summary.merges,
                sim.clusters().num_multi()
            );
            if summary.export_failures > 0 {
                log::warn!("{} snapshot(s) failed to write", summary.export_failures);
            }
        }
        Commands::Sweep { common, elements } => {
            let base = load_config(common.config.as_ref())?;
            let selected: Vec<(String, f64)> = match elements {
                Some(symbols) => symbols
                    .into_iter()
                    .map(|s| match element_mass(&s) {
                        Some(m) => Ok((s, m)),
                        None => bail!("unknown element symbol {s:?}"),
                    })
                    .collect::<anyhow::Result<_>>()?,
                None => ELEMENTS.iter().map(|&(s, m)| (s.to_string(), m)).collect(),
            };

            for (symbol, mass) in selected {
                let mut cfg = base.clone();
                cfg.system.mass = mass;
                cfg.system.masses = None;
                cfg.system.label = symbol.clone();
                cfg.output.write_final = true;
                if let Some(dir) = &common.output {
                    cfg.output.directory = dir.clone();
                }

                let writer = SnapshotWriter::from_config(&cfg);
                let mut sim = Simulation::new(cfg, common.seed)
                    .with_context(|| format!("initializing {symbol} run"))?;
                let summary = sim
                    .run(&mut LogSink, Some(&writer))
                    .with_context(|| format!("running {symbol}"))?;
                log::info!(
                    "{symbol} (mass {mass}): {} merges, {} clusters of 2+",
                    summary.merges,
                    sim.clusters().num_multi()
                );
            }
        }
        Commands::Check { config } => {
            let cfg = load_config(config.as_ref())?;
            print!("{}", cfg.to_toml_string()?);
        }
    }
    Ok(())
}
