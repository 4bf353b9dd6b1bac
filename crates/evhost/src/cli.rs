use std::path::PathBuf;

use clap::{Parser, Subcommand};
use evcurve::ADJUSTMENT_CURVE_PRECISION;

#[derive(Parser, Debug)]
#[command(
    name = "evhost",
    author,
    version,
    about = "Plays a host timeline against the toon EV adjustment curve publisher"
)]
pub struct Cli {
    /// Configuration file; defaults to `evhost.toml` in the config directory.
    #[arg(long, global = true, env = "EVHOST_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate host frames and report what was published each tick.
    Run(RunArgs),
    /// Resample the configured curve and print the lookup table.
    Sample(SampleArgs),
    /// Print the resolved configuration path.
    Where,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Number of frames to simulate (overrides `host.frames`).
    #[arg(long, value_name = "COUNT", value_parser = parse_positive_u32)]
    pub frames: Option<u32>,

    /// Output format: `text` or `json`.
    #[arg(long, value_name = "FORMAT", value_parser = parse_format, default_value = "text")]
    pub format: OutputFormat,

    /// Sleep `host.frame_interval` between frames instead of running flat out.
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// Number of samples to take across the curve.
    #[arg(
        long,
        value_name = "COUNT",
        value_parser = parse_count,
        default_value_t = ADJUSTMENT_CURVE_PRECISION
    )]
    pub count: usize,

    /// Output format: `text` or `json`.
    #[arg(long, value_name = "FORMAT", value_parser = parse_format, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_format(value: &str) -> Result<OutputFormat, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("output format must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "text" | "plain" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(format!("unknown output format '{other}'; expected text or json")),
    }
}

fn parse_positive_u32(value: &str) -> Result<u32, String> {
    let parsed: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame count '{value}'"))?;
    if parsed == 0 {
        return Err("frame count must be greater than zero".into());
    }
    Ok(parsed)
}

fn parse_count(value: &str) -> Result<usize, String> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid sample count '{value}'"))?;
    if parsed == 0 {
        return Err("sample count must be greater than zero".into());
    }
    Ok(parsed)
}
