use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use freemix::session::{FreeMix, REMIX_FILE_NAME};
use freemix::{EngineConfig, RemixConfig, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Seeded, bar-locked remix variations
    Freestyle,
    /// One remix from a manual per-stem config
    Remix,
}

#[derive(Debug, Parser)]
#[command(name = "freemix")]
#[command(about = "Model-free stem separation and freestyle remixing", long_about = None)]
#[command(version)]
struct Cli {
    /// Input WAV file
    input: PathBuf,

    /// Output directory for stems, mixes and the manifest
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Freestyle)]
    mode: Mode,

    /// Number of freestyle variations
    #[arg(long, default_value_t = 8)]
    variations: usize,

    /// Bars per variation
    #[arg(long, default_value_t = 4)]
    bars: usize,

    /// Seed for reproducible freestyle runs (drawn at random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Remix config as JSON, e.g. '{"drums":{"volume":1.5},"vocals":{"pitch":-2}}'
    #[arg(long)]
    config: Option<String>,

    /// Engine config JSON file; missing fields use defaults
    #[arg(long)]
    engine_config: Option<PathBuf>,

    /// Processing sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = engine_config(cli)?;
    let mut fm = FreeMix::new(config)?;
    fm.load(&cli.input)?;
    fm.separate()?;

    match cli.mode {
        Mode::Freestyle => {
            let seed = cli.seed.unwrap_or_else(rand::random);
            info!(seed, "freestyle seed");
            let manifest = fm.freestyle_to_dir(&cli.output_dir, cli.variations, cli.bars, seed)?;
            eprintln!(
                "Done. {} variations, manifest in {}",
                manifest.variations.len(),
                cli.output_dir.display()
            );
        }
        Mode::Remix => {
            let remix = match &cli.config {
                Some(json) => RemixConfig::from_json(json)?,
                None => RemixConfig::new(),
            };
            let path = fm.remix_to_file(cli.output_dir.join(REMIX_FILE_NAME), &remix)?;
            eprintln!("Done. Remix: {}", path.display());
        }
    }
    Ok(())
}

fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.engine_config {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(rate) = cli.sample_rate {
        config = config.with_sample_rate(rate);
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["freemix", "in.wav", "out"]);
        assert_eq!(cli.mode, Mode::Freestyle);
        assert_eq!(cli.variations, 8);
        assert_eq!(cli.bars, 4);
        assert!(cli.seed.is_none());
        assert_eq!(engine_config(&cli).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_remix_mode_with_config() {
        let cli = Cli::parse_from([
            "freemix",
            "in.wav",
            "out",
            "--mode",
            "remix",
            "--config",
            r#"{"drums":{"volume":1.5}}"#,
            "--sample-rate",
            "48000",
        ]);
        assert_eq!(cli.mode, Mode::Remix);
        assert_eq!(engine_config(&cli).unwrap().sample_rate, 48000);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let cli = Cli::parse_from(["freemix", "in.wav", "out", "--sample-rate", "0"]);
        assert!(engine_config(&cli).is_err());
    }
}
