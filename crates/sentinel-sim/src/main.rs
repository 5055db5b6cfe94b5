//! # Sentinel Sim
//!
//! Headless runner for the Sentinel behavior engine. Loads a scenario
//! (agents, panels, walls and a scripted player), plays it at a fixed
//! timestep against kinematic mock ports, logs every behavior event and
//! prints a summary.
//!
//! ```text
//! sentinel-sim [scenario.toml]
//! sentinel-sim --write-default [scenario.toml]
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod sim;

use anyhow::Result;
use config::{SimConfig, CONFIG_FILE};
use sim::{SimSummary, Simulation};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("sentinel=info".parse()?))
        .init();

    let mut args = std::env::args().skip(1);
    let first = args.next();
    if first.as_deref() == Some("--write-default") {
        let path = args.next().map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
        SimConfig::default().save_to(&path)?;
        return Ok(());
    }

    let path = first.map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = SimConfig::load_from(&path);
    let json = config.json_summary;

    info!("Sentinel sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut simulation = Simulation::new(config)?;
    let summary = simulation.run();
    info!(elapsed = summary.elapsed, events = summary.events, "run complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_table(&summary);
    }
    Ok(())
}

fn print_table(summary: &SimSummary) {
    println!(
        "{:.1}s in {} ticks, {} events ({} transitions), {} panels triggered, {} bodies",
        summary.elapsed,
        summary.ticks,
        summary.events,
        summary.transitions,
        summary.panels_triggered,
        summary.bodies
    );
    println!(
        "{:<16} {:<8} {:>22} {:>6} {:>7} {:>10} {:>7}",
        "agent", "state", "position", "panels", "summons", "instakills", "attacks"
    );
    for agent in &summary.agents {
        let position = format!(
            "({:.1}, {:.1}, {:.1})",
            agent.position.x, agent.position.y, agent.position.z
        );
        println!(
            "{:<16} {:<8} {:>22} {:>6} {:>7} {:>10} {:>7}",
            agent.name,
            agent.behavior.name(),
            position,
            agent.panel_alarms,
            agent.summons,
            agent.instakills,
            agent.attacks
        );
    }
}
