//! Product definitions and per-product constants.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::PrepError;
use crate::fs::{self, http};
use crate::paths;

/// Explorer page prefix used as the `product_uri` of every dataset.
pub const PRODUCT_URI_PREFIX: &str = "https://explorer.digitalearth.africa/product";

/// WaPOR products and the mapset each one is derived from.
pub const WAPOR_PRODUCT_MAPSETS: [(&str, &str); 2] = [
    ("wapor_soil_moisture", "L2-RSM-D"),
    ("wapor_monthly_npp", "L2-NPP-M"),
];

/// Release years available on Zenodo for the WorldCereal products.
pub const VALID_WORLDCEREAL_YEARS: [&str; 1] = ["2021"];

/// WorldCereal temporal coverage seasons.
pub const VALID_WORLDCEREAL_SEASONS: [&str; 5] = [
    "tc-annual",
    "tc-wintercereals",
    "tc-springcereals",
    "tc-maize-main",
    "tc-maize-second",
];

/// WorldCereal product layers.
pub const VALID_WORLDCEREAL_PRODUCTS: [&str; 6] = [
    "activecropland",
    "irrigation",
    "maize",
    "springcereals",
    "temporarycrops",
    "wintercereals",
];

/// AEZ ids dropped from the Africa set even though their zones intersect
/// the Africa bounding box.
pub const WORLDCEREAL_AEZ_EXCLUSIONS: [u32; 7] =
    [17135, 17166, 34119, 40129, 46171, 43134, 43170];

/// Scratch directory for downloaded product definition files.
pub const PRODUCTS_SCRATCH_DIR: &str = "tmp/products";

/// Explorer page for a product.
pub fn product_uri(product_name: &str) -> String {
    format!("{PRODUCT_URI_PREFIX}/{product_name}")
}

/// Mapset code backing a WaPOR product.
pub fn wapor_mapset_for_product(product_name: &str) -> Result<&'static str, PrepError> {
    WAPOR_PRODUCT_MAPSETS
        .iter()
        .find(|(name, _)| *name == product_name)
        .map(|(_, mapset_code)| *mapset_code)
        .ok_or_else(|| PrepError::UnsupportedProduct {
            product: product_name.to_string(),
        })
}

/// Validates a WorldCereal download request before any I/O happens.
pub fn validate_worldcereal_request(
    year: &str,
    season: &str,
    product: &str,
) -> Result<(), PrepError> {
    if !VALID_WORLDCEREAL_YEARS.contains(&year) {
        return Err(PrepError::UnsupportedYear {
            year: year.to_string(),
        });
    }
    if !VALID_WORLDCEREAL_SEASONS.contains(&season) {
        return Err(PrepError::UnsupportedSeason {
            season: season.to_string(),
        });
    }
    if !VALID_WORLDCEREAL_PRODUCTS.contains(&product) {
        return Err(PrepError::UnsupportedProduct {
            product: product.to_string(),
        });
    }
    Ok(())
}

/// ODC product definition, reduced to the fields the assembler needs.
/// Unknown keys in the YAML are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDef {
    pub name: String,
    #[serde(default)]
    pub measurements: Vec<MeasurementDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementDef {
    pub name: String,
}

impl ProductDef {
    /// Parses a product definition from a local YAML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read product definition {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse product definition {}", path.display()))
    }

    /// Names of the measurements every dataset of this product must carry.
    pub fn measurement_names(&self) -> Vec<&str> {
        self.measurements.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Fetches a product definition from a URL and stores it under
/// [`PRODUCTS_SCRATCH_DIR`], re-serialized in block style with a `---`
/// document marker. Returns the local path.
pub fn download_product_yaml(url: &str) -> Result<PathBuf> {
    if !fs::check_directory_exists(PRODUCTS_SCRATCH_DIR)? {
        fs::FileSystem::for_path(PRODUCTS_SCRATCH_DIR)?.makedirs(PRODUCTS_SCRATCH_DIR)?;
        tracing::info!("Created the directory {PRODUCTS_SCRATCH_DIR}");
    }

    let output_path = Path::new(PRODUCTS_SCRATCH_DIR).join(paths::file_name(url));

    let body = http::get_text(url)?;
    let content: serde_yaml::Value = serde_yaml::from_str(&body)
        .with_context(|| format!("Failed to parse product definition from {url}"))?;
    let yaml_string = serde_yaml::to_string(&content)
        .with_context(|| format!("Failed to re-serialize product definition from {url}"))?;

    std::fs::write(&output_path, format!("---\n{yaml_string}")).with_context(|| {
        format!(
            "Failed to write product definition to {}",
            output_path.display()
        )
    })?;
    tracing::info!(
        "Product definition file written to {}",
        output_path.display()
    );
    Ok(output_path)
}

/// Resolves a `--product-yaml` argument to a local file: URLs are downloaded
/// to scratch, local paths are used as-is. S3 paths are not supported.
pub fn resolve_product_yaml(path_or_url: &str) -> Result<PathBuf> {
    if paths::is_s3_path(path_or_url) {
        anyhow::bail!("Product yaml is expected to be a local file or url, not an s3 path");
    }
    if paths::is_url(path_or_url) {
        return download_product_yaml(path_or_url);
    }
    Ok(PathBuf::from(path_or_url))
}
