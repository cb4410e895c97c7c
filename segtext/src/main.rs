//! segtext - Split narrative text into length-bounded segments for
//! narration pipelines.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::SegtextConfig;
use log::info;
use segmenter::{
    ContentType, SmartChunkOptions, SmartSplitter, SplitOptions, smart_split, validate_segments,
};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "segtext")]
#[command(about = "Split narrative text into length-bounded segments", long_about = None)]
#[command(version)]
struct Args {
    /// Input text file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Preferred segment length (overrides config)
    #[arg(long)]
    target: Option<usize>,

    /// Hard upper bound for segment length (overrides config)
    #[arg(long)]
    max: Option<usize>,

    /// Lower bound for non-terminal segments (overrides config)
    #[arg(long)]
    min: Option<usize>,

    /// Uniformity tolerance around the target (overrides config)
    #[arg(long)]
    tolerance: Option<usize>,

    /// Cut at exact positions instead of seeking punctuation on hard
    /// splits
    #[arg(long, default_value_t = false)]
    no_sentence_boundary: bool,

    /// Pretty-print the JSON output
    #[arg(short, long, default_value_t = false)]
    pretty: bool,

    /// Print a segment quality report to stderr
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Overlap-preserving chunking instead of strict segmentation
    Chunk {
        /// Input text file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Content type: novel, dialogue, article, or general
        #[arg(long, default_value = "general")]
        content_type: String,

        /// Chunk size upper bound
        #[arg(long)]
        size: Option<usize>,

        /// Overlap carried between consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default length bounds
    Set {
        #[arg(long)]
        target: Option<usize>,
        #[arg(long)]
        max: Option<usize>,
        #[arg(long)]
        min: Option<usize>,
        #[arg(long)]
        tolerance: Option<usize>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match &args.command {
        Some(Commands::Chunk {
            input,
            content_type,
            size,
            overlap,
        }) => run_chunk(input.as_deref(), content_type, *size, *overlap, &args),
        Some(Commands::Config { action }) => handle_config_command(action),
        None => run_split(&args),
    }
}

/// Segment the input and emit the segment list as JSON.
fn run_split(args: &Args) -> Result<()> {
    let config = SegtextConfig::load().context("failed to load configuration")?;
    let mut options = config.split_options();
    apply_overrides(&mut options, args);

    let splitter = SmartSplitter::new(options.clone()).context("invalid length bounds")?;
    let text = read_input(args.input.as_deref())?;
    let segments = splitter.split(&text);

    info!("segmented input into {} segments", segments.len());

    if args.check {
        let report = validate_segments(&segments, &options);
        eprintln!(
            "segments: {}, avg length: {}, in range: {}",
            report.stats.total_segments, report.stats.avg_length, report.stats.segments_in_range
        );
        for issue in &report.issues {
            eprintln!("issue: {issue}");
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&segments)?
    } else {
        serde_json::to_string(&segments)?
    };
    write_output(args.output.as_deref(), &json)
}

/// Chunk the input with the content-type-aware chunker.
fn run_chunk(
    input: Option<&std::path::Path>,
    content_type: &str,
    size: Option<usize>,
    overlap: Option<usize>,
    args: &Args,
) -> Result<()> {
    let content_type = parse_content_type(content_type)?;
    let text = read_input(input)?;

    let chunks = smart_split(
        &text,
        SmartChunkOptions {
            content_type,
            chunk_size: size,
            chunk_overlap: overlap,
        },
    )
    .context("invalid chunk options")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&chunks)?
    } else {
        serde_json::to_string(&chunks)?
    };
    write_output(args.output.as_deref(), &json)
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = SegtextConfig::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Set {
            target,
            max,
            min,
            tolerance,
        } => {
            let mut config = SegtextConfig::load()?;
            if let Some(target) = target {
                config.target_length = *target;
            }
            if let Some(max) = max {
                config.max_length = *max;
            }
            if let Some(min) = min {
                config.min_length = *min;
            }
            if let Some(tolerance) = tolerance {
                config.tolerance = *tolerance;
            }
            // Reject inconsistent bounds before persisting them.
            config
                .split_options()
                .validate()
                .context("invalid length bounds")?;
            config.save()?;
            println!("Configuration saved to {}", SegtextConfig::config_path()?.display());
            Ok(())
        }
    }
}

fn apply_overrides(options: &mut SplitOptions, args: &Args) {
    if let Some(target) = args.target {
        options.target_length = target;
    }
    if let Some(max) = args.max {
        options.max_length = max;
    }
    if let Some(min) = args.min {
        options.min_length = min;
    }
    if let Some(tolerance) = args.tolerance {
        options.tolerance = tolerance;
    }
    if args.no_sentence_boundary {
        options.prefer_sentence_boundary = false;
    }
}

fn parse_content_type(value: &str) -> Result<ContentType> {
    match value {
        "novel" => Ok(ContentType::Novel),
        "dialogue" => Ok(ContentType::Dialogue),
        "article" => Ok(ContentType::Article),
        "general" => Ok(ContentType::General),
        other => anyhow::bail!(
            "unknown content type '{other}' (expected novel, dialogue, article, or general)"
        ),
    }
}

fn read_input(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(path: Option<&std::path::Path>, json: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
