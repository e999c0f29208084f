use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use zaoai_mnist::{LoaderConfig, MnistDataset, ProgressKind, Split, TruncationPolicy};

#[derive(Parser)]
#[command(version, about = "Load, inspect and render the MNIST IDX files", long_about = None)]
struct Cli {
    /// JSON file with a LoaderConfig
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Zero-fill records after an early end of file instead of failing
    #[arg(long, global = true)]
    zero_fill: bool,
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SplitArg {
    Train,
    Test,
}

impl From<SplitArg> for Split {
    fn from(split: SplitArg) -> Self {
        match split {
            SplitArg::Train => Split::Train,
            SplitArg::Test => Split::Test,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load every file and log counts, shapes and label histograms
    Info {
        #[arg(long, default_value = "mnist/")]
        dir: PathBuf,
    },
    /// Write one record as "<prefix> - <label>.png"
    Render {
        #[arg(long, default_value = "mnist/")]
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = SplitArg::Train)]
        split: SplitArg,
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Defaults to "<split>-<index>"
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Print one record as ASCII art
    Print {
        #[arg(long, default_value = "mnist/")]
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = SplitArg::Train)]
        split: SplitArg,
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
}

fn load_config(cli: &Cli) -> Result<LoaderConfig> {
    let mut config = match &cli.config {
        #[cfg(feature = "serde")]
        Some(path) => LoaderConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        #[cfg(not(feature = "serde"))]
        Some(path) => anyhow::bail!(
            "config {} given but built without the serde feature",
            path.display()
        ),
        None => LoaderConfig::default(),
    };
    if cli.zero_fill {
        config = config.with_truncation(TruncationPolicy::ZeroFill);
    }
    if cli.no_progress {
        config = config.with_progress(ProgressKind::Log);
    }
    Ok(config)
}

fn load(dir: &Path, config: &LoaderConfig) -> Result<MnistDataset> {
    MnistDataset::load(dir, config)
        .with_context(|| format!("failed to load MNIST from {}", dir.display()))
}

fn info(dir: &Path, config: &LoaderConfig) -> Result<()> {
    let dataset = load(dir, config)?;
    for split in [Split::Train, Split::Test] {
        let images = dataset.images(split);
        log::info!(
            "{split}: {} images of {}x{}, {} labels",
            images.len(),
            images.rows(),
            images.cols(),
            dataset.labels(split).len()
        );
        log::info!("{split} label histogram: {:?}", dataset.labels(split).histogram());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Info { dir } => info(&dir, &config),
        Commands::Render {
            dir,
            split,
            index,
            out,
            prefix,
        } => {
            let split = Split::from(split);
            let dataset = load(&dir, &config)?;
            let record = dataset.record(split, index)?;
            let prefix = prefix.unwrap_or_else(|| format!("{split}-{index}"));
            let path = record
                .render(&out, &prefix)
                .with_context(|| format!("failed to render {split} record {index}"))?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Print { dir, split, index } => {
            let dataset = load(&dir, &config)?;
            println!("{}", dataset.record(split.into(), index)?);
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
