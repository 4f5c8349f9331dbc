mod cli;

use anyhow::Result;
use areaweight::{RunConfig, SpatialRef};
use cli::Cli;
use tracing_subscriber::EnvFilter;

/// Log to stderr; stdout may carry the output CSV.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn config(cli: Cli) -> Result<RunConfig> {
    let from_crs = cli.from_crs.as_deref().map(SpatialRef::parse).transpose()?;
    let to_crs = cli.to_crs.as_deref().map(SpatialRef::parse).transpose()?;

    Ok(RunConfig {
        from_layer: cli.from_layer,
        to_layer: cli.to_layer,
        from_id: cli.from_id,
        to_id: cli.to_id,
        attributes: cli.attributes,
        buffer: cli.buffer,
        transform_before_buffer: cli.transform_before_buffer,
        total_area: cli.total_area,
        from_table: cli.from_table,
        from_table_id: cli.from_table_id,
        output: cli.output,
        contrib: cli.contrib,
        from_crs,
        to_crs,
    })
}

pub fn run() -> Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let summary = areaweight::run(&config(cli)?)?;
    tracing::debug!(targets = summary.targets, contributions = summary.contributions, "done");
    Ok(())
}

fn main() -> Result<()> { run() }
