use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod report;
mod scenario;

use scenario::Scenario;

/// Submit every operation of a scenario to an in-memory orchestrator, then write the receipts
/// and final ledger state as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Scenario file (accounts, sponsors, host state, operations).
    #[arg(long, env = "OPGATE_SCENARIO")]
    scenario: PathBuf,

    /// Where to write the report.
    #[arg(long, env = "OPGATE_OUTPUT", default_value = "receipts.json")]
    output: PathBuf,

    /// Log filter (eg. `debug`, `opgate=trace`). Falls back to `RUST_LOG`, then `info`.
    #[arg(long)]
    log_level: Option<String>,

    /// Network label recorded in the report.
    #[arg(long, default_value = "devnet")]
    network: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let scenario = Scenario::load(&cli.scenario)?;
    let mut world = scenario.build()?;
    let receipts = world.orchestrator.submit_batch(&mut world.ledger, &world.operations);

    let report = report::render(&cli.network, &world, &receipts)?;
    report::write_json_atomic(&cli.output, &report)?;

    let executed = receipts.iter().filter(|r| r.outcome.is_executed()).count();
    println!(
        "Ran {} operations ({} executed), report written to {}",
        receipts.len(),
        executed,
        cli.output.display()
    );
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
