//! Command-line driver: wires configuration, logging, the in-memory device model and the FTL
//! façade together, drives a sequence of host events, and prints a final report.
//!
//! Grounded on `Ssd::event_arrive`'s dispatch loop in the original implementation for the
//! read/write parsing and reporting shape, and on the pack's `ryanbreen-breenix` and
//! `metta-systems-vesper` repos for the `clap`-derive CLI idiom.

mod config;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ftl_core::{Error, Event, Ftl, InMemoryDevice, Kind};

/// Drive a flash translation layer simulation over a scripted or file-supplied event sequence.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to a TOML geometry/device configuration file. Defaults to a small built-in
    /// geometry if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a newline-delimited event script (`R <lba>` or `W <lba>` per line). Defaults to
    /// a small built-in workload if omitted.
    #[arg(long)]
    events: Option<PathBuf>,
}

fn default_config() -> config::Config {
    config::Config {
        geometry: ftl_core::Geometry {
            ssd_size: 2,
            package_size: 2,
            die_size: 2,
            plane_size: 2,
            block_size: 4,
            overprovisioning: 20,
        },
        block_erases: 100_000,
    }
}

fn default_events() -> Vec<(Kind, u64)> {
    vec![
        (Kind::Write, 0),
        (Kind::Write, 1),
        (Kind::Read, 0),
        (Kind::Write, 0),
        (Kind::Write, 0),
        (Kind::Read, 0),
    ]
}

fn parse_events(text: &str) -> Vec<(Kind, u64)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let kind = match parts.next()? {
                "R" | "r" => Kind::Read,
                "W" | "w" => Kind::Write,
                other => {
                    log::warn!("ignoring unrecognized event kind: {other}");
                    return None;
                }
            };
            let lba: u64 = parts.next()?.parse().ok()?;
            Some((kind, lba))
        })
        .collect()
}

#[derive(Debug, Default)]
struct Report {
    events_processed: u64,
    successes: u64,
    failures: u64,
    reads_succeeded: u64,
    writes_succeeded: u64,
}

fn run() -> Result<Report, Error> {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => config::load(path).unwrap_or_else(|err| {
            eprintln!("failed to load config: {err}");
            std::process::exit(1);
        }),
        None => default_config(),
    };

    let events = match &args.events {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|err| {
                eprintln!("failed to read events file: {err}");
                std::process::exit(1);
            });
            parse_events(&text)
        }
        None => default_events(),
    };

    let device = InMemoryDevice::new(config.block_erases);
    let mut ftl = Ftl::new(config.geometry, device).unwrap_or_else(|err| {
        eprintln!("failed to build FTL: {err}");
        std::process::exit(1);
    });

    let mut report = Report::default();
    for (i, (kind, lba)) in events.into_iter().enumerate() {
        let mut event = Event::new(kind, lba, i as u64);
        let outcome = match kind {
            Kind::Read => ftl.read(&mut event),
            Kind::Write => ftl.write(&mut event),
            Kind::Erase => ftl.erase(&mut event),
            Kind::Merge => ftl.merge(&mut event),
        };
        report.events_processed += 1;
        match outcome {
            Ok(()) => {
                report.successes += 1;
                match kind {
                    Kind::Read => report.reads_succeeded += 1,
                    Kind::Write => report.writes_succeeded += 1,
                    Kind::Erase | Kind::Merge => {}
                }
            }
            Err(err @ (Error::OutOfMemory | Error::GarbageCollectionFailed)) => return Err(err),
            Err(err) => {
                log::warn!("event {i} (LBA {lba}) failed: {err}");
                report.failures += 1;
            }
        }
    }

    println!("events processed: {}", report.events_processed);
    println!("  successes: {}", report.successes);
    println!("  failures:  {}", report.failures);
    println!("  reads ok:  {}", report.reads_succeeded);
    println!("  writes ok: {}", report.writes_succeeded);
    println!("log blocks bound: {}", ftl.directory().len());

    Ok(report)
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(report) if report.failures == 0 => ExitCode::from(0),
        Ok(_) => ExitCode::from(1),
        Err(Error::OutOfMemory) => {
            eprintln!("out of memory");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("simulation terminated: {err}");
            ExitCode::from(1)
        }
    }
}
