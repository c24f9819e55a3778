use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cafbench::{output, run_suite, Config};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of images (threads) taking part
    #[arg(default_value_t = 2)]
    images: usize,

    /// Use reduced sizes and repetition counts
    #[arg(long)]
    quick: bool,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Load the configuration from a JSON file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verify transferred data on every round trip
    #[arg(long)]
    check: bool,

    /// Run the sort benchmark
    #[arg(long)]
    sort: bool,

    /// Run the fixed-iteration get and allocation latency benchmarks
    #[arg(long)]
    osu: bool,

    /// Seed for random neighbour patterns and sort keys
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None if self.quick => Config::quick(),
            None => Config::default(),
        };
        if self.check {
            config.p2p.check = true;
        }
        if self.sort {
            config.sort.enabled = true;
        }
        if self.osu {
            config.osu.enabled = true;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.config()?;
    info!(images = cli.images, quick = cli.quick, "starting cafbench");

    let report = run_suite(cli.images, &config)?;

    if cli.json {
        println!("{}", output::to_json_pretty(&report)?);
    } else {
        print!("{}", output::format_report(&report));
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
