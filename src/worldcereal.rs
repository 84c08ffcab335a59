//! ESA WorldCereal source data: Zenodo archives and AEZ filtering.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::extent::{self, Bounds};
use crate::fs::{self, http};
use crate::paths;
use crate::products::WORLDCEREAL_AEZ_EXCLUSIONS;

/// GeoJSON describing every WorldCereal Agro-Ecological Zone.
pub const WORLDCEREAL_AEZ_URL: &str =
    "https://zenodo.org/records/7875105/files/WorldCereal_AEZ.geojson";

/// Scratch directory for downloaded archives and extracted GeoTIFFs.
pub const DOWNLOAD_SCRATCH_DIR: &str = "tmp/worldcereal_data";

/// Measurement kinds shipped per product, one Zenodo archive each.
pub const MEASUREMENT_KINDS: [&str; 2] = ["classification", "confidence"];

/// Zenodo archive URL for one product/season/kind combination.
pub fn zenodo_zip_url(year: &str, season: &str, product: &str, kind: &str) -> String {
    format!(
        "https://zenodo.org/records/7875105/files/WorldCereal_{year}_{season}_{product}_{kind}.zip?download=1"
    )
}

/// AEZ ids whose zone envelope intersects the Africa bounding box, minus
/// the excluded ids.
pub fn africa_aez_ids() -> Result<HashSet<String>> {
    let africa = extent::africa_bounds()?;
    let aez_doc: Value = http::get_json(WORLDCEREAL_AEZ_URL)?;
    Ok(filter_aez_features(&aez_doc, &africa))
}

fn filter_aez_features(aez_doc: &Value, africa: &Bounds) -> HashSet<String> {
    let mut ids = HashSet::new();
    let Some(features) = aez_doc.get("features").and_then(Value::as_array) else {
        return ids;
    };
    for feature in features {
        let Some(bounds) = feature.get("geometry").and_then(extent::geometry_bounds) else {
            continue;
        };
        if !bounds.intersects(africa) {
            continue;
        }
        let Some(aez_id) = feature.pointer("/properties/aez_id").and_then(Value::as_u64) else {
            continue;
        };
        if WORLDCEREAL_AEZ_EXCLUSIONS.iter().any(|&e| u64::from(e) == aez_id) {
            continue;
        }
        ids.insert(aez_id.to_string());
    }
    ids
}

/// Downloads one Zenodo archive into the scratch directory, skipping the
/// download when the file is already present. Returns the local path.
pub fn download_zip(zip_url: &str) -> Result<PathBuf> {
    if !fs::check_directory_exists(DOWNLOAD_SCRATCH_DIR)? {
        fs::FileSystem::for_path(DOWNLOAD_SCRATCH_DIR)?.makedirs(DOWNLOAD_SCRATCH_DIR)?;
        tracing::info!("Created the directory {DOWNLOAD_SCRATCH_DIR}");
    }

    let local_zip_path = Path::new(DOWNLOAD_SCRATCH_DIR).join(zip_file_name(zip_url));
    if local_zip_path.exists() {
        tracing::info!(
            "Skipping download, {} already exists!",
            local_zip_path.display()
        );
    } else {
        http::download_to(zip_url, &local_zip_path)?;
    }
    Ok(local_zip_path)
}

/// Basename of the archive URL with the `?download=1` query stripped.
fn zip_file_name(zip_url: &str) -> String {
    let base = paths::file_name(zip_url);
    match base.split_once(".zip") {
        Some((stem, _)) => format!("{stem}.zip"),
        None => base.to_string(),
    }
}

/// Extracts the GeoTIFF members whose leading AEZ id is in `aez_ids` into
/// `output_dir`, keeping the archive-internal layout. Members already on
/// disk are not re-extracted. Returns the local paths.
pub fn extract_aez_geotiffs(
    zip_path: &Path,
    aez_ids: &HashSet<String>,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open archive {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read zip structure of {}", zip_path.display()))?;

    let mut local_geotiffs = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read entry {} in {}", i, zip_path.display()))?;
        let name = entry.name().to_string();
        if !name.ends_with(".tif") {
            continue;
        }
        let base = paths::file_name(&name);
        let aez_id = base.split('_').next().unwrap_or_default();
        if !aez_ids.contains(aez_id) {
            continue;
        }
        let Some(enclosed) = entry.enclosed_name() else {
            continue;
        };
        let out_path = output_dir.join(enclosed);
        if out_path.exists() {
            local_geotiffs.push(out_path);
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {name} from {}", zip_path.display()))?;
        local_geotiffs.push(out_path);
    }

    Ok(local_geotiffs)
}

/// Downloads one product archive and extracts its Africa GeoTIFFs into the
/// scratch directory.
pub fn download_and_unzip_data(
    zip_url: &str,
    aez_ids: &HashSet<String>,
) -> Result<Vec<PathBuf>> {
    let zip_path = download_zip(zip_url)?;
    let local_geotiffs = extract_aez_geotiffs(&zip_path, aez_ids, Path::new(DOWNLOAD_SCRATCH_DIR))?;
    tracing::info!("Download complete! \nDownloaded {} geotiffs", local_geotiffs.len());
    Ok(local_geotiffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_zenodo_zip_url() {
        assert_eq!(
            zenodo_zip_url("2021", "tc-annual", "temporarycrops", "classification"),
            "https://zenodo.org/records/7875105/files/WorldCereal_2021_tc-annual_temporarycrops_classification.zip?download=1"
        );
    }

    #[test]
    fn test_zip_file_name_strips_query() {
        assert_eq!(
            zip_file_name(
                "https://zenodo.org/records/7875105/files/WorldCereal_2021_tc-annual_temporarycrops_confidence.zip?download=1"
            ),
            "WorldCereal_2021_tc-annual_temporarycrops_confidence.zip"
        );
        assert_eq!(zip_file_name("https://host/archive.zip"), "archive.zip");
    }

    #[test]
    fn test_filter_aez_features() {
        let africa = Bounds::new(-20.0, -40.0, 55.0, 40.0);
        let aez_doc = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "properties": {"aez_id": 25000},
                    "geometry": {"type": "Polygon", "coordinates": [[
                        [10.0, 0.0], [20.0, 0.0], [20.0, 10.0], [10.0, 10.0], [10.0, 0.0]
                    ]]}
                },
                {
                    "properties": {"aez_id": 31000},
                    "geometry": {"type": "Polygon", "coordinates": [[
                        [100.0, 0.0], [110.0, 0.0], [110.0, 10.0], [100.0, 10.0], [100.0, 0.0]
                    ]]}
                },
                {
                    "properties": {"aez_id": 17166},
                    "geometry": {"type": "Polygon", "coordinates": [[
                        [10.0, 0.0], [20.0, 0.0], [20.0, 10.0], [10.0, 10.0], [10.0, 0.0]
                    ]]}
                }
            ]
        });

        let ids = filter_aez_features(&aez_doc, &africa);
        assert_eq!(ids, HashSet::from(["25000".to_string()]));
    }

    #[test]
    fn test_extract_aez_geotiffs() {
        let tmp_dir = TempDir::new().unwrap();
        let zip_path = tmp_dir.path().join("worldcereal.zip");

        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for name in [
            "WorldCereal/17166_tc-annual_temporarycrops_2021-01-01_2021-12-31_classification.tif",
            "WorldCereal/25000_tc-annual_temporarycrops_2021-01-01_2021-12-31_classification.tif",
            "WorldCereal/readme.txt",
        ] {
            writer.start_file(name, options).unwrap();
            writer.write_all(b"payload").unwrap();
        }
        writer.finish().unwrap();

        let aez_ids = HashSet::from(["25000".to_string()]);
        let extracted = extract_aez_geotiffs(&zip_path, &aez_ids, tmp_dir.path()).unwrap();
        assert_eq!(extracted.len(), 1);
        assert!(extracted[0].ends_with(
            "WorldCereal/25000_tc-annual_temporarycrops_2021-01-01_2021-12-31_classification.tif"
        ));
        assert!(extracted[0].is_file());

        // Second pass keeps the already-extracted member.
        let again = extract_aez_geotiffs(&zip_path, &aez_ids, tmp_dir.path()).unwrap();
        assert_eq!(again, extracted);
    }
}
