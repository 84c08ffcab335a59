//! Storage parameter survey across a product's geotiffs, used to verify a
//! product definition matches the files it describes.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use clap::Args;
use tracing::{error, info};

use odc_prep::{catalog, cog, fs, paths, products};

#[derive(Args, Debug)]
pub struct StorageParametersArgs {
    /// Name of the product to get the storage parameters for.
    #[arg(long)]
    product_name: String,

    /// File path to the directory containing the COG files.
    #[arg(long)]
    geotiffs_dir: Option<String>,

    /// Directory to write the storage parameters file to.
    #[arg(long)]
    output_dir: String,
}

pub fn run(args: &StorageParametersArgs) -> Result<()> {
    let geotiffs: Vec<String> = match &args.geotiffs_dir {
        Some(geotiffs_dir) => fs::find_geotiff_files(geotiffs_dir)?,
        None => match products::wapor_mapset_for_product(&args.product_name) {
            Ok(mapset_code) => catalog::get_mapset_rasters(mapset_code)?
                .into_iter()
                .map(|url| paths::https_to_gs_uri(&url).unwrap_or(url))
                .collect(),
            Err(_) => bail!("No file path to the directory containing the COG files provided"),
        },
    };
    info!("Found {} geotiff files", geotiffs.len());

    // Serialized maps have sorted keys, so equal parameters dedupe as
    // strings.
    let mut unique_parameters = BTreeSet::new();
    for geotiff in &geotiffs {
        match cog::storage_parameters(geotiff) {
            Ok(parameters) => {
                unique_parameters.insert(serde_json::to_string(&parameters)?);
            }
            Err(error) => error!("Failed to read {geotiff}: {error:#}"),
        }
    }

    let parameters: Vec<serde_json::Value> = unique_parameters
        .iter()
        .map(|parameters| serde_json::from_str(parameters))
        .collect::<Result<_, _>>()?;

    if !fs::check_directory_exists(&args.output_dir)? {
        fs::FileSystem::for_path(&args.output_dir)?.makedirs(&args.output_dir)?;
        info!("Created directory {}", args.output_dir);
    }

    let output_file_name = format!("{}_storage_parameters", args.product_name);
    let output_file = paths::join(&args.output_dir, &[&output_file_name]);
    fs::put_object(
        &output_file,
        serde_json::to_string(&parameters)?.as_bytes(),
        "application/json",
    )?;
    info!("Tasks chunks written to {output_file}");
    Ok(())
}
