//! ESA WorldCereal tools: Zenodo archives filtered to African AEZ regions,
//! COG encoding and dataset metadata generation.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Subcommand};
use serde_json::json;
use tracing::{error, info, warn};

use odc_prep::assemble::DatasetAssembler;
use odc_prep::eo3::{self, DatasetDoc};
use odc_prep::{cog, fs, identity, paths, products, stac, worldcereal};
use odc_prep::{odc_uuid, partition, select, PrepError};

use crate::common::{self, OverwriteFlag};

const VALID_PRODUCT_NAMES: [&str; 1] = ["esa_worldcereal_wintercereals"];

/// EO3 documents are staged on local disk before indexing.
const METADATA_SCRATCH_DIR: &str = "tmp/metadata_docs/esa_worldcereal";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download WorldCereal geotiffs for the AEZ regions within Africa.
    DownloadCogs(DownloadCogsArgs),
    /// Generate EO3 metadata documents and STAC items for downloaded COGs.
    CreateStacFiles(CreateStacFilesArgs),
}

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::DownloadCogs(args) => download_cogs(&args),
        Command::CreateStacFiles(args) => create_stac_files(&args),
    }
}

#[derive(Args, Debug)]
pub struct DownloadCogsArgs {
    /// Year the WorldCereal product was released for.
    #[arg(long)]
    year: String,

    /// Season of the WorldCereal product.
    #[arg(long)]
    season: String,

    /// WorldCereal product layer to download.
    #[arg(long)]
    product: String,

    /// Directory to write the COG files to.
    #[arg(long)]
    output_dir: String,

    #[command(flatten)]
    overwrite: OverwriteFlag,
}

fn download_cogs(args: &DownloadCogsArgs) -> Result<()> {
    products::validate_worldcereal_request(&args.year, &args.season, &args.product)?;

    let aez_ids = worldcereal::africa_aez_ids()?;

    for kind in worldcereal::MEASUREMENT_KINDS {
        info!("Processing {kind} geotiffs");
        let zip_url = worldcereal::zenodo_zip_url(&args.year, &args.season, &args.product, kind);
        let local_geotiffs = worldcereal::download_and_unzip_data(&zip_url, &aez_ids)?;

        for (idx, local_geotiff) in local_geotiffs.iter().enumerate() {
            let local_path = local_geotiff.to_string_lossy();
            info!(
                "Processing geotiff {local_path} {}/{}",
                idx + 1,
                local_geotiffs.len()
            );
            if let Err(error) = encode_one_cog(&local_path, args) {
                error!("Failed to process {local_path}: {error:#}");
            }
        }
    }
    Ok(())
}

fn encode_one_cog(local_geotiff: &str, args: &DownloadCogsArgs) -> Result<()> {
    let tile = identity::parse_worldcereal_tile_id(&identity::tile_id_from_path(local_geotiff))?;

    let file_name = format!("{}.tif", tile.tile_id);
    let output_cog_path = paths::join(
        &args.output_dir,
        &[
            &args.product,
            &args.season,
            &tile.aez_id,
            &args.year,
            &file_name,
        ],
    );
    if !args.overwrite.enabled() && fs::check_file_exists(&output_cog_path)? {
        info!("{output_cog_path} exists! Skipping ...");
        return Ok(());
    }

    let parent = paths::parent(&output_cog_path);
    if !fs::check_directory_exists(parent)? {
        fs::FileSystem::for_path(parent)?.makedirs(parent)?;
    }
    cog::cog_encode(local_geotiff, &output_cog_path)
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

    common::ensure_directory(METADATA_SCRATCH_DIR)?;

    let product_yaml = products::resolve_product_yaml(&args.product_yaml)?;

    // A dataset directory holds the classification and confidence geotiffs
    // of one AEZ.
    let all_dataset_paths: Vec<String> = fs::find_geotiff_files(&args.geotiffs_dir)?
        .iter()
        .map(|file| paths::parent(file).to_string())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    info!("Found {} datasets", all_dataset_paths.len());

    let chunks = partition(&all_dataset_paths, args.max_parallel_steps);
    let Some(dataset_paths) = select(&chunks, args.worker_idx) else {
        warn!("Worker {} Skipped!", args.worker_idx);
        return Ok(());
    };
    info!("Executing worker {}", args.worker_idx);

    info!("Generating stac files for the product {}", args.product_name);

    for (idx, dataset_path) in dataset_paths.iter().enumerate() {
        info!(
            "Generating stac file for {} {}/{}",
            dataset_path,
            idx + 1,
            dataset_paths.len()
        );
        if let Err(error) = create_one_stac_file(
            dataset_path,
            &args.stac_output_dir,
            &product_yaml,
            args.overwrite.enabled(),
        ) {
            error!("Failed to generate stac file for {dataset_path}: {error:#}");
        }
    }
    Ok(())
}

fn create_one_stac_file(
    dataset_path: &str,
    stac_output_dir: &str,
    product_yaml: &Path,
    overwrite: bool,
) -> Result<()> {
    let measurement_files = fs::find_geotiff_files(dataset_path)?;
    let first = measurement_files
        .first()
        .with_context(|| format!("No geotiffs found in the dataset directory {dataset_path}"))?;
    let tile = identity::parse_worldcereal_tile_id(&identity::tile_id_from_path(first))?;

    // Dataset directories are laid out as {product}/{season}/{aez_id}/{year}.
    let year = paths::file_name(dataset_path).to_string();
    let tile_id = tile.unique_name();

    let metadata_file = format!("{tile_id}.odc-metadata.yaml");
    let metadata_output_path = paths::join(
        METADATA_SCRATCH_DIR,
        &[
            &tile.product,
            &tile.season,
            &tile.aez_id,
            &year,
            &metadata_file,
        ],
    );
    let stac_file = format!("{tile_id}.stac-item.json");
    let stac_item_destination_url = paths::join(
        stac_output_dir,
        &[&tile.product, &tile.season, &tile.aez_id, &year, &stac_file],
    );

    if !overwrite && fs::check_file_exists(&stac_item_destination_url)? {
        info!(
            "{stac_item_destination_url} exists! Skipping stac file generation for {dataset_path}"
        );
        return Ok(());
    }

    common::ensure_directory(paths::parent(&metadata_output_path))?;
    common::ensure_directory(paths::parent(&stac_item_destination_url))?;

    let doc = prepare_dataset(dataset_path, &measurement_files, &tile_id, product_yaml)?;
    eo3::write_doc(&doc, Path::new(&metadata_output_path))?;

    let mut stac_item = stac::to_stac_item(&doc, &stac_item_destination_url)?;
    stac::fix_proj_code_property(&mut stac_item)?;
    stac::write_stac_item(&stac_item, &stac_item_destination_url)
}

struct ClassificationAttrs {
    start_date: String,
    end_date: String,
    creation_time: String,
    aez_id: String,
}

fn classification_attrs(path: &str) -> Result<ClassificationAttrs> {
    let dataset = cog::open_raster(path)?;
    let read = |key: &str| {
        cog::metadata_item(&dataset, key)
            .with_context(|| format!("Geotiff {path} has no {key} metadata"))
    };
    Ok(ClassificationAttrs {
        start_date: read("start_date")?,
        end_date: read("end_date")?,
        creation_time: read("creation_time")?,
        aez_id: read("AEZ_ID")?,
    })
}

/// Builds the EO3 dataset document for one AEZ dataset directory.
fn prepare_dataset(
    dataset_path: &str,
    measurement_files: &[String],
    tile_id: &str,
    product_yaml: &Path,
) -> Result<DatasetDoc> {
    let mut assembler = DatasetAssembler::new(dataset_path, product_yaml)?;
    let product_name = assembler.product_name().to_string();

    assembler.set_product_uri(products::product_uri(&product_name));
    assembler.set_dataset_version("v1.0.0");
    assembler.set_dataset_id(odc_uuid(&product_name, "v1.0.0", [tile_id]));
    assembler.set_platform("ESA WorldCereal project");
    assembler.set_producer("https://vito.be/");
    assembler.set_property("odc:file_format", json!("GeoTIFF"));
    assembler.set_property("odc:product", json!(product_name));

    // Acquisition attributes live in the classification geotiff's metadata.
    let mut attrs = None;
    for file in measurement_files {
        let tile = identity::parse_worldcereal_tile_id(&identity::tile_id_from_path(file))?;
        if tile.measurement_kind == "classification" {
            attrs = Some(classification_attrs(file)?);
        }
        assembler.note_measurement(tile.measurement_kind, file.as_str());
    }
    let attrs = attrs.with_context(|| format!("No classification geotiff in {dataset_path}"))?;

    let start = NaiveDate::parse_from_str(&attrs.start_date, "%Y-%m-%d")
        .with_context(|| format!("Invalid start_date {}", attrs.start_date))?
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid start_date {}", attrs.start_date))?;
    let end = NaiveDate::parse_from_str(&attrs.end_date, "%Y-%m-%d")
        .with_context(|| format!("Invalid end_date {}", attrs.end_date))?
        .and_hms_opt(23, 59, 59)
        .with_context(|| format!("Invalid end_date {}", attrs.end_date))?;
    let processed = NaiveDateTime::parse_from_str(&attrs.creation_time, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Invalid creation_time {}", attrs.creation_time))?;

    assembler.set_datetime(start);
    assembler.set_datetime_range(start, end);
    assembler.set_processed(processed);
    assembler.set_region_code(attrs.aez_id);

    assembler.to_dataset_doc()
}
