use anyhow::Context;
use clap::Parser;
use log::info;

use netbatch::cli::Cli;
use netbatch::{PlatformRegistry, SshConnector, TaskRunner, inventory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let rows = inventory::load(&cli.inventory)?;
    info!("{} rows loaded from {}", rows.len(), cli.inventory.display());

    let connector = SshConnector::new(PlatformRegistry::with_builtins()?, cli.ssh_options());
    let report = TaskRunner::new(connector, cli.run_config())
        .run(rows)
        .await
        .context("run aborted")?;

    println!("{} rows: {}", report.counts.total(), report.counts);
    println!("summary: {}", report.summary_path.display());
    println!("outputs: {}", report.output_dir.display());
    Ok(())
}
