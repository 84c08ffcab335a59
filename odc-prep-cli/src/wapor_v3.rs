//! WaPOR version 3 tools: mapset rasters reduced to Africa-extent COGs,
//! plus EO3 and STAC metadata for the prepared files.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;
use tracing::{error, info, warn};

use odc_prep::assemble::DatasetAssembler;
use odc_prep::eo3::{self, DatasetDoc};
use odc_prep::fs::{self, http};
use odc_prep::model::WaporTileId;
use odc_prep::{catalog, cog, dekad, identity, paths, products, stac};
use odc_prep::{odc_uuid, partition, select, PrepError};

use crate::common::{self, OverwriteFlag};

/// Products with mapset-backed metadata support.
const VALID_PRODUCT_NAMES: [&str; 1] = ["wapor_soil_moisture"];

/// EO3 documents are staged on local disk before indexing.
const METADATA_SCRATCH_DIR: &str = "tmp/metadata_docs";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crop WaPOR v3 mapset rasters to the Africa extent and write COGs.
    DownloadCogs(MapsetCogsArgs),
    /// Regrid WaPOR v3 mapset rasters onto the Africa extent and write COGs.
    CropCogs(MapsetCogsArgs),
    /// Generate EO3 metadata documents and STAC items for prepared COGs.
    CreateStacFiles(CreateStacFilesArgs),
}

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::DownloadCogs(args) => prepare_mapset_cogs(&args, cog::crop_geotiff),
        Command::CropCogs(args) => prepare_mapset_cogs(&args, cog::reproject_geotiff),
        Command::CreateStacFiles(args) => create_stac_files(&args),
    }
}

#[derive(Args, Debug)]
pub struct MapsetCogsArgs {
    /// WaPOR version 3 mapset to crop COG files for.
    #[arg(long)]
    mapset_code: String,

    /// Directory to write the cropped COG files to.
    #[arg(long)]
    output_dir: String,

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

/// Lists the mapset, takes this worker's share and converts each raster
/// with `make_cog`.
fn prepare_mapset_cogs(args: &MapsetCogsArgs, make_cog: fn(&str, &str) -> Result<()>) -> Result<()> {
    let all_geotiffs: Vec<String> = catalog::get_mapset_rasters(&args.mapset_code)?
        .into_iter()
        .map(|url| paths::https_to_gs_uri(&url).unwrap_or(url))
        .collect();

    let chunks = partition(&all_geotiffs, args.max_parallel_steps);
    let Some(geotiffs) = select(&chunks, args.worker_idx) else {
        warn!("Worker {} Skipped!", args.worker_idx);
        return Ok(());
    };
    info!("Executing worker {}", args.worker_idx);
    info!("Creating COGs for {} geotiffs", geotiffs.len());

    for (idx, geotiff) in geotiffs.iter().enumerate() {
        info!("Proceesing {} {}/{}", geotiff, idx + 1, geotiffs.len());
        if let Err(error) = prepare_one_cog(geotiff, args, make_cog) {
            error!("Failed to process {geotiff}: {error:#}");
        }
    }
    Ok(())
}

fn prepare_one_cog(
    geotiff: &str,
    args: &MapsetCogsArgs,
    make_cog: fn(&str, &str) -> Result<()>,
) -> Result<()> {
    let tile = identity::parse_wapor_tile_id(&identity::tile_id_from_path(geotiff))?;

    let file_name = format!("{}.tif", tile.tile_id);
    let output_cog_path = paths::join(&args.output_dir, &[&tile.year, &tile.month, &file_name]);
    if !args.overwrite.enabled() && fs::check_file_exists(&output_cog_path)? {
        info!("{output_cog_path} exists! Skipping stac file generation for {output_cog_path}");
        return Ok(());
    }

    common::ensure_directory(paths::parent(&output_cog_path))?;
    make_cog(geotiff, &output_cog_path)
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
    geotiffs_dir: Option<String>,

    /// Directory to write the stac files docs to.
    #[arg(long)]
    stac_output_dir: String,

    #[command(flatten)]
    overwrite: OverwriteFlag,
}

fn create_stac_files(args: &CreateStacFilesArgs) -> Result<()> {
    if !VALID_PRODUCT_NAMES.contains(&args.product_name.as_str()) {
        return Err(PrepError::UnsupportedProduct {
            product: args.product_name.clone(),
        }
        .into());
    }

    let metadata_output_dir = common::with_product_leaf(METADATA_SCRATCH_DIR, &args.product_name);
    common::ensure_directory(&metadata_output_dir)?;

    let product_yaml = products::resolve_product_yaml(&args.product_yaml)?;

    let stac_output_dir = common::with_product_leaf(&args.stac_output_dir, &args.product_name);
    common::ensure_directory(&stac_output_dir)?;

    let geotiffs: Vec<String> = match &args.geotiffs_dir {
        Some(geotiffs_dir) => fs::find_geotiff_files(geotiffs_dir)?,
        None => {
            let mapset_code = products::wapor_mapset_for_product(&args.product_name)?;
            catalog::get_mapset_rasters(mapset_code)?
                .into_iter()
                .map(|url| paths::https_to_gs_uri(&url).unwrap_or(url))
                .collect()
        }
    };
    info!("Found {} geotiffs", geotiffs.len());

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
    let tile = identity::parse_wapor_tile_id(&identity::tile_id_from_path(geotiff))?;

    let metadata_file = format!("{}.odc-metadata.yaml", tile.tile_id);
    let metadata_output_path = paths::join(
        metadata_output_dir,
        &[&tile.year, &tile.month, &metadata_file],
    );
    let stac_file = format!("{}.stac-item.json", tile.tile_id);
    let stac_item_destination_url =
        paths::join(stac_output_dir, &[&tile.year, &tile.month, &stac_file]);

    if !overwrite && fs::check_file_exists(&stac_item_destination_url)? {
        info!("{stac_item_destination_url} exists! Skipping stac file generation for {geotiff}");
        return Ok(());
    }

    let doc = prepare_dataset(geotiff, &tile, product_yaml)?;
    eo3::write_doc(&doc, Path::new(&metadata_output_path))?;

    let mut stac_item = stac::to_stac_item(&doc, &stac_item_destination_url)?;
    stac::rewrite_gs_asset_hrefs(&mut stac_item);
    stac::write_stac_item(&stac_item, &stac_item_destination_url)
}

/// Builds the EO3 dataset document for one mapset raster.
fn prepare_dataset(
    dataset_path: &str,
    tile: &WaporTileId,
    product_yaml: &Path,
) -> Result<DatasetDoc> {
    let mut assembler = DatasetAssembler::new(dataset_path, product_yaml)?;
    let product_name = assembler.product_name().to_string();

    assembler.set_product_uri(products::product_uri(&product_name));
    assembler.set_dataset_version("v3.0");
    assembler.set_dataset_id(odc_uuid(&product_name, "v3.0", [tile.tile_id.as_str()]));
    assembler.set_platform("WaPORv3");
    assembler.set_producer("www.fao.org");
    assembler.set_property("odc:file_format", json!("GeoTIFF"));
    assembler.set_property("odc:product", json!(product_name));

    // Dekadal mapsets carry a D1/D2/D3 label, monthly ones cover the
    // whole month.
    let (year, month) = tile.year_month()?;
    let range = match tile.dekad_label.as_deref() {
        Some(label) => dekad::dekad(year, month, label)?,
        None => dekad::month_range(year, month)?,
    };
    assembler.set_datetime(range.reference);
    assembler.set_datetime_range(range.start, range.end);

    if let Some(url) = paths::as_public_url(dataset_path) {
        if let Some(last_modified) = http::get_last_modified(&url)? {
            assembler.set_processed(last_modified.naive_utc());
        }
    }

    if product_name == "wapor_soil_moisture" {
        assembler.note_measurement("relative_soil_moisture", dataset_path);
    }

    assembler.to_dataset_doc()
}
