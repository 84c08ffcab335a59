use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod common;
mod esa_worldcereal;
mod indexing_tools;
mod iwmi_odr;
mod storage_parameters;
mod wapor_v3;

/// Prepare Earth observation raster products for Open Data Cube indexing.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// FAO WaPOR version 3 mapset tools.
    #[command(subcommand)]
    WaporV3(wapor_v3::Command),

    /// ESA WorldCereal 2021 product tools.
    #[command(subcommand)]
    EsaWorldcereal(esa_worldcereal::Command),

    /// IWMI Open Data Repository tools.
    #[command(subcommand)]
    IwmiOdr(iwmi_odr::Command),

    /// Helpers for indexing prepared metadata documents.
    #[command(subcommand)]
    IndexingTools(indexing_tools::Command),

    /// Report the distinct storage parameters across a product's geotiffs.
    StorageParameters(storage_parameters::StorageParametersArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli.command) {
        tracing::error!("{error:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::WaporV3(command) => wapor_v3::run(command),
        Command::EsaWorldcereal(command) => esa_worldcereal::run(command),
        Command::IwmiOdr(command) => iwmi_odr::run(command),
        Command::IndexingTools(command) => indexing_tools::run(command),
        Command::StorageParameters(args) => storage_parameters::run(&args),
    }
}
