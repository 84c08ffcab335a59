//! Indexing preparation tools for dataset documents already on disk or in
//! object storage.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use tracing::{error, info};

use odc_prep::eo3::{self, DatasetDoc};
use odc_prep::{fs, stac};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate dataset documents found by a glob and stage them for
    /// indexing.
    FsToDc(FsToDcArgs),
    /// Rewrite the proj:code property of STAC items to the proj:epsg form
    /// the indexer understands.
    FixStacFiles(FixStacFilesArgs),
}

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::FsToDc(args) => fs_to_dc(&args),
        Command::FixStacFiles(args) => fix_stac_files(&args),
    }
}

#[derive(Args, Debug)]
pub struct FsToDcArgs {
    /// Directory to scan for dataset documents.
    input_directory: String,

    /// Product names to restrict indexing to.
    products: Vec<String>,

    /// Expect STAC 1.0 Items instead of EO3 dataset documents.
    #[arg(long)]
    stac: bool,

    /// File system glob to use, defaults to **/*.yaml or **/*.json for STAC.
    #[arg(long)]
    glob: Option<String>,

    /// Directory to write converted EO3 dataset documents to.
    #[arg(long)]
    eo3_output_dir: Option<String>,
}

fn fs_to_dc(args: &FsToDcArgs) -> Result<()> {
    let default_glob = if args.stac { "**/*.json" } else { "**/*.yaml" };
    let pattern = args.glob.as_deref().unwrap_or(default_glob);

    let files = fs::find_files_matching(&args.input_directory, pattern)?;

    let mut added = 0usize;
    let mut failed = 0usize;
    for file in &files {
        match add_dataset(file, args) {
            Ok(()) => added += 1,
            Err(error) => {
                error!("Failed to add dataset {file}: {error:#}");
                failed += 1;
            }
        }
    }

    info!("Added {added} and failed {failed} datasets.");
    Ok(())
}

/// Parses one document, validates it and optionally writes the EO3
/// rendition.
fn add_dataset(file: &str, args: &FsToDcArgs) -> Result<()> {
    let bytes = fs::get_object(file)?;
    let value: Value = if file.ends_with(".yaml") || file.ends_with(".yml") {
        serde_yaml::from_slice(&bytes).with_context(|| format!("Failed to parse {file}"))?
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {file}"))?
    };
    let value = if args.stac {
        stac::stac_to_eo3(&value)?
    } else {
        value
    };
    let doc: DatasetDoc = serde_json::from_value(value)
        .with_context(|| format!("{file} is not an EO3 dataset document"))?;

    if !args.products.is_empty() && !args.products.contains(&doc.product.name) {
        bail!(
            "Product {} is not in the given product list",
            doc.product.name
        );
    }

    if let Some(output_dir) = &args.eo3_output_dir {
        let output_path = Path::new(output_dir).join(format!("{}.odc-metadata.yaml", doc.id));
        eo3::write_doc(&doc, &output_path)?;
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct FixStacFilesArgs {
    /// Directory containing the stac files to fix.
    #[arg(long)]
    stac_files_dir: String,
}

fn fix_stac_files(args: &FixStacFilesArgs) -> Result<()> {
    let stac_files = fs::find_json_files(&args.stac_files_dir)?;
    info!("Found {} stac files", stac_files.len());

    for stac_file in &stac_files {
        if let Err(error) = fix_one_stac_file(stac_file) {
            error!("Failed to fix {stac_file}: {error:#}");
        }
    }
    Ok(())
}

fn fix_one_stac_file(stac_file: &str) -> Result<()> {
    let bytes = fs::get_object(stac_file)?;
    let mut stac_item: Value =
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {stac_file}"))?;
    stac::fix_proj_code_property(&mut stac_item)?;
    stac::write_stac_item(&stac_item, stac_file)
}
