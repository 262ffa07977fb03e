//! Kinship CLI - manage friendships in a local social graph.

use clap::Parser;
use kinship_cli::{commands, Cli, Config, Formatter};
use kinship_graph::{HookEvent, HookPoint, HookRegistry, Observer};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> kinship_cli::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Log to stderr so stdout stays machine readable
    let filter = EnvFilter::try_from_env("KINSHIP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let hooks = HookRegistry::global();
    let log_events: Arc<dyn Observer> = Arc::new(|event: &HookEvent| -> anyhow::Result<()> {
        tracing::info!(
            hook = event.point.as_str(),
            actor = %event.actor,
            edge = %event.edge.id,
            "Transition event"
        );
        Ok(())
    });
    for point in HookPoint::ALL {
        hooks.subscribe_shared(point, Arc::clone(&log_events));
    }

    let database = cli.database.unwrap_or(config.database);
    let format = cli.format.map(Into::into).unwrap_or(config.format);
    let formatter = Formatter::new(format);

    let output = commands::run(cli.command, &database, &formatter)?;
    println!("{}", output);
    Ok(())
}
