use std::io::{self, Write};

use anyhow::{Context, Result};
use evconfig::EvConfig;
use evcurve::resample;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{OutputFormat, RunArgs, SampleArgs};
use crate::paths::{AppPaths, ConfigLocation};
use crate::simulate::{Simulation, SimulationOptions, SimulationReport};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn load_config(location: &ConfigLocation) -> Result<EvConfig> {
    match location {
        ConfigLocation::Explicit(path) => EvConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        ConfigLocation::Discovered(path) if path.exists() => EvConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        ConfigLocation::Discovered(path) => {
            tracing::debug!(
                path = %path.display(),
                "no config file found; using built-in defaults"
            );
            Ok(EvConfig::default())
        }
    }
}

pub fn run(config: &EvConfig, args: RunArgs) -> Result<()> {
    let mut options = SimulationOptions::from_config(config);
    if let Some(frames) = args.frames {
        options.frames = frames;
    }
    if args.realtime {
        options.pace = Some(config.host.frame_interval);
    }

    tracing::info!(
        frames = options.frames,
        mode = ?config.exposure.mode,
        enabled = config.exposure.enabled,
        events = config.host.events.len(),
        "starting host simulation"
    );
    let report = Simulation::new(config).run(options);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => write_json(&mut out, &report)?,
        OutputFormat::Text => write_run_text(&mut out, &report)?,
    }
    Ok(())
}

pub fn sample(config: &EvConfig, args: SampleArgs) -> Result<()> {
    let table = resample(&config.curve(), args.count);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => write_json(&mut out, &table)?,
        OutputFormat::Text => {
            writeln!(
                out,
                "min={} max={} samples={}",
                table.min_time(),
                table.max_time(),
                table.len()
            )?;
            let step = if table.len() > 1 {
                (table.max_time() - table.min_time()) / (table.len() - 1) as f32
            } else {
                0.0
            };
            for (index, value) in table.samples().iter().enumerate() {
                let time = table.min_time() + step * index as f32;
                writeln!(out, "{index:>4} {time:>10.4} {value:>10.4}")?;
            }
        }
    }
    Ok(())
}

pub fn describe_location(paths: &AppPaths, location: &ConfigLocation) -> Result<()> {
    let path = location.path();
    let status = if path.exists() { "present" } else { "missing" };
    let origin = match location {
        ConfigLocation::Explicit(_) => "explicit",
        ConfigLocation::Discovered(_) => "discovered",
    };
    println!("Configuration:");
    println!("  config dir: {}", paths.config_dir().display());
    println!("  file:       {} ({origin}, {status})", path.display());
    Ok(())
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialise report")?;
    writeln!(out)?;
    Ok(())
}

fn write_run_text<W: Write>(out: &mut W, report: &SimulationReport) -> Result<()> {
    writeln!(
        out,
        "{:>5}  {:<10} {:<14} {:<7} {:<7} events",
        "frame", "outcome", "lifecycle", "unsafe", "flag"
    )?;
    for record in &report.frames {
        let outcome = record
            .outcome
            .map(|outcome| format!("{outcome:?}").to_ascii_lowercase())
            .unwrap_or_else(|| "-".to_string());
        let lifecycle = format!("{:?}", record.lifecycle).to_ascii_lowercase();
        let flag = record
            .enabled_flag
            .map(|flag| flag.to_string())
            .unwrap_or_else(|| "-".to_string());
        let events = record
            .events
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(
            out,
            "{:>5}  {:<10} {:<14} {:<7} {:<7} {}",
            record.frame, outcome, lifecycle, record.host_unsafe, flag, events
        )?;
    }
    writeln!(
        out,
        "uniform uploads: {}, global writes: {}",
        report.uniform_uploads,
        report.globals.publish_count()
    )?;
    Ok(())
}
