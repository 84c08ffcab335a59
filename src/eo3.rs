//! EO3 dataset documents and their YAML serialization.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema identifier carried by every EO3 dataset document.
pub const DATASET_SCHEMA: &str = "https://schemas.opendatacube.org/dataset";

/// An EO3 dataset document, one per dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDoc {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub product: ProductRef,
    pub crs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
    pub grids: BTreeMap<String, GridDoc>,
    pub properties: BTreeMap<String, serde_json::Value>,
    pub measurements: BTreeMap<String, MeasurementDoc>,
    #[serde(default)]
    pub accessories: BTreeMap<String, AccessoryDoc>,
    #[serde(default)]
    pub lineage: BTreeMap<String, Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Pixel grid: `shape` is `[rows, cols]`, `transform` a row-major 3x3
/// affine matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDoc {
    pub shape: [usize; 2],
    pub transform: [f64; 9],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementDoc {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryDoc {
    pub path: String,
}

/// Formats a document timestamp: RFC 3339, second precision, UTC.
pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Key for a grid other than the default one, named after its pixel
/// resolution.
pub fn grid_key(resolution: f64) -> String {
    format!("g{resolution}")
}

/// Serializes a document as block YAML prefixed with the `---` marker.
pub fn to_yaml_string(doc: &DatasetDoc) -> Result<String> {
    let yaml = serde_yaml::to_string(doc).context("Failed to serialize dataset document")?;
    Ok(format!("---\n{yaml}"))
}

/// Writes a document to a local path, creating parent directories.
pub fn write_doc(doc: &DatasetDoc, output_path: &Path) -> Result<()> {
    let yaml = to_yaml_string(doc)?;
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(output_path, yaml).with_context(|| {
        format!(
            "Failed to write dataset document {}",
            output_path.display()
        )
    })?;
    tracing::info!("Wrote dataset to {}", output_path.display());
    Ok(())
}
