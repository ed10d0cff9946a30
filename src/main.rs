//! Headless inspection tool for the textport layout engine.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use textport::cli::{
    document_stats, format_gutter, format_layout, format_stats, gutter_report, layout_report,
    load_text,
};
use textport::EditorConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "textport", about = "Inspect viewport layout of a text file", version)]
struct Cli {
    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Wrap width in points (no wrapping when unset)
    #[arg(long, global = true, env = "TEXTPORT_WRAP_WIDTH")]
    wrap_width: Option<f32>,

    /// Extra layout margin above and below the viewport
    #[arg(long, global = true, env = "TEXTPORT_OVERSCAN")]
    overscan: Option<f32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fragments materialized for a viewport
    Layout {
        file: PathBuf,
        #[arg(long, default_value = "0")]
        top: f32,
        #[arg(long, default_value = "600")]
        height: f32,
    },
    /// Print gutter line entries for a viewport
    Gutter {
        file: PathBuf,
        #[arg(long, default_value = "0")]
        top: f32,
        #[arg(long, default_value = "600")]
        height: f32,
    },
    /// Print paragraph and line counts
    Stats { file: PathBuf },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("textport=warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = EditorConfig::from_env();
    if cli.wrap_width.is_some() {
        config.wrap_width = cli.wrap_width;
    }
    if let Some(overscan) = cli.overscan {
        config.overscan = overscan;
    }
    debug!(?config, "resolved configuration");

    let output = match cli.command {
        Commands::Layout { file, top, height } => {
            let report = layout_report(&load_text(&file)?, &config, top, height)?;
            if cli.json {
                serde_json::to_string_pretty(&report)?
            } else {
                format_layout(&report)
            }
        }
        Commands::Gutter { file, top, height } => {
            let entries = gutter_report(&load_text(&file)?, &config, top, height)?;
            if cli.json {
                serde_json::to_string_pretty(&entries)?
            } else {
                format_gutter(&entries)
            }
        }
        Commands::Stats { file } => {
            let stats = document_stats(&load_text(&file)?, &config)?;
            if cli.json {
                serde_json::to_string_pretty(&stats)?
            } else {
                format_stats(&stats)
            }
        }
    };
    print!("{output}");
    if cli.json {
        println!();
    }
    Ok(())
}
