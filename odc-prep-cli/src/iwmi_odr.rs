//! IWMI Open Data Repository tools: dataset metadata generation for the
//! DIWASA evapotranspiration rasters.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;
use tracing::{error, info, warn};

use odc_prep::assemble::DatasetAssembler;
use odc_prep::eo3::{self, DatasetDoc};
use odc_prep::fs::{self, http};
use odc_prep::model::IwmiTileId;
use odc_prep::{identity, paths, products, stac};
use odc_prep::{odc_uuid, partition, select, PrepError};

use crate::common::{self, OverwriteFlag};

const VALID_PRODUCT_NAMES: [&str; 2] = ["iwmi_blue_et_monthly", "iwmi_green_et_monthly"];

/// EO3 documents are staged on local disk before indexing.
const METADATA_SCRATCH_DIR: &str = "tmp/metadata_docs";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate EO3 metadata documents and STAC items for IWMI COGs.
    CreateStacFiles(CreateStacFilesArgs),
}

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::CreateStacFiles(args) => create_stac_files(&args),
    }
}

#[derive(Args, Debug)]
pub struct CreateStacFilesArgs {
    /// Name of the product to generate the stac item files for.
    #[arg(long)]
    product_name: String,

    /// File path or URL to the product definition yaml file.
    #[arg(long)]
    product_yaml: String,

    /// File path to the directory containing the COG files.
    #[arg(long)]
    geotiffs_dir: String,

    /// Directory to write the stac files docs to.
    #[arg(long)]
    stac_output_dir: String,

    #[command(flatten)]
    overwrite: OverwriteFlag,

    /// Maximum number of parallel steps/pods to have in the workflow.
    #[arg(long, default_value_t = 1)]
    max_parallel_steps: usize,

    /// Sequential index which will be used to define the range of geotiffs
    /// the pod will work with.
    #[arg(long, default_value_t = 0)]
    worker_idx: usize,
}

fn create_stac_files(args: &CreateStacFilesArgs) -> Result<()> {
    if !VALID_PRODUCT_NAMES.contains(&args.product_name.as_str()) {
        return Err(PrepError::UnsupportedProduct {
            product: args.product_name.clone(),
        }
        .into());
    }

    let metadata_output_dir = common::with_product_leaf(METADATA_SCRATCH_DIR, &args.product_name);

    let product_yaml = products::resolve_product_yaml(&args.product_yaml)?;

    let stac_output_dir = common::with_product_leaf(&args.stac_output_dir, &args.product_name);

    let all_geotiffs = fs::find_geotiff_files(&args.geotiffs_dir)?;
    info!(
        "Found {} geotiffs in {}",
        all_geotiffs.len(),
        args.geotiffs_dir
    );

    let chunks = partition(&all_geotiffs, args.max_parallel_steps);
    let Some(geotiffs) = select(&chunks, args.worker_idx) else {
        warn!("Worker {} Skipped!", args.worker_idx);
        return Ok(());
    };
    info!("Executing worker {}", args.worker_idx);

    info!("Generating stac files for the product {}", args.product_name);

    for (idx, geotiff) in geotiffs.iter().enumerate() {
        info!(
            "Generating stac file for {} {}/{}",
            geotiff,
            idx + 1,
            geotiffs.len()
        );
        if let Err(error) = create_one_stac_file(
            geotiff,
            &metadata_output_dir,
            &stac_output_dir,
            &product_yaml,
            args.overwrite.enabled(),
        ) {
            error!("Failed to generate stac file for {geotiff}: {error:#}");
        }
    }
    Ok(())
}

fn create_one_stac_file(
    geotiff: &str,
    metadata_output_dir: &str,
    stac_output_dir: &str,
    product_yaml: &Path,
    overwrite: bool,
) -> Result<()> {
    let tile = identity::parse_iwmi_tile_id(&identity::tile_id_from_path(geotiff))?;

    let metadata_file = format!("{}.odc-metadata.yaml", tile.tile_id);
    let metadata_output_path = paths::join(metadata_output_dir, &[&metadata_file]);
    let stac_file = format!("{}.stac-item.json", tile.tile_id);
    let stac_item_destination_url = paths::join(stac_output_dir, &[&stac_file]);

    if !overwrite && fs::check_file_exists(&stac_item_destination_url)? {
        info!("{stac_item_destination_url} exists! Skipping stac file generation for {geotiff}");
        return Ok(());
    }

    common::ensure_directory(paths::parent(&metadata_output_path))?;
    common::ensure_directory(paths::parent(&stac_item_destination_url))?;

    let doc = prepare_dataset(geotiff, &tile, product_yaml)?;
    eo3::write_doc(&doc, Path::new(&metadata_output_path))?;

    let mut stac_item = stac::to_stac_item(&doc, &stac_item_destination_url)?;
    stac::fix_proj_code_property(&mut stac_item)?;
    stac::write_stac_item(&stac_item, &stac_item_destination_url)
}

/// Builds the EO3 dataset document for one IWMI raster.
fn prepare_dataset(
    dataset_path: &str,
    tile: &IwmiTileId,
    product_yaml: &Path,
) -> Result<DatasetDoc> {
    let mut assembler = DatasetAssembler::new(dataset_path, product_yaml)?;
    let product_name = assembler.product_name().to_string();

    assembler.set_product_uri(products::product_uri(&product_name));
    assembler.set_dataset_version("v1.0.0");
    assembler.set_dataset_id(odc_uuid(&product_name, "v1.0.0", [tile.tile_id.as_str()]));
    assembler.set_platform("DIWASA");
    assembler.set_producer("www.iwmi.cgiar.org");
    assembler.set_property("odc:file_format", json!("GeoTIFF"));
    assembler.set_property("odc:product", json!(product_name));

    let datetime = tile
        .date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date in {}", tile.tile_id))?;
    assembler.set_datetime(datetime);

    if let Some(url) = paths::as_public_url(dataset_path) {
        if let Some(last_modified) = http::get_last_modified(&url)? {
            assembler.set_processed(last_modified.naive_utc());
        }
    }

    assembler.note_measurement("data", dataset_path);

    assembler.to_dataset_doc()
}
