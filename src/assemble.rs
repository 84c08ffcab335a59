//! Assembles EO3 dataset documents from noted measurements and properties.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde_json::json;
use uuid::Uuid;

use crate::cog::{self, GridSpec};
use crate::eo3::{self, DatasetDoc, GridDoc, MeasurementDoc, ProductRef, DATASET_SCHEMA};
use crate::error::PrepError;
use crate::extent::Bounds;
use crate::products::ProductDef;

/// Builder for a dataset document. Callers note measurement rasters and set
/// properties, then [`DatasetAssembler::to_dataset_doc`] reads the grids and
/// produces the document.
#[derive(Debug)]
pub struct DatasetAssembler {
    dataset_location: String,
    product: ProductDef,
    dataset_id: Option<Uuid>,
    label: Option<String>,
    product_uri: Option<String>,
    dataset_version: Option<String>,
    platform: Option<String>,
    producer: Option<String>,
    region_code: Option<String>,
    datetime: Option<NaiveDateTime>,
    datetime_range: Option<(NaiveDateTime, NaiveDateTime)>,
    processed: Option<NaiveDateTime>,
    properties: BTreeMap<String, serde_json::Value>,
    measurements: Vec<(String, String)>,
}

impl DatasetAssembler {
    /// Starts a document for the dataset at `dataset_location`, validated
    /// against the product definition at `product_yaml`.
    pub fn new(dataset_location: &str, product_yaml: &Path) -> Result<Self> {
        let product = ProductDef::from_path(product_yaml)?;
        Ok(Self {
            dataset_location: dataset_location.to_string(),
            product,
            dataset_id: None,
            label: None,
            product_uri: None,
            dataset_version: None,
            platform: None,
            producer: None,
            region_code: None,
            datetime: None,
            datetime_range: None,
            processed: None,
            properties: BTreeMap::new(),
            measurements: Vec::new(),
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product.name
    }

    pub fn dataset_location(&self) -> &str {
        &self.dataset_location
    }

    pub fn set_dataset_id(&mut self, id: Uuid) {
        self.dataset_id = Some(id);
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn set_product_uri(&mut self, uri: impl Into<String>) {
        self.product_uri = Some(uri.into());
    }

    pub fn set_dataset_version(&mut self, version: impl Into<String>) {
        self.dataset_version = Some(version.into());
    }

    pub fn set_platform(&mut self, platform: impl Into<String>) {
        self.platform = Some(platform.into());
    }

    pub fn set_producer(&mut self, producer: impl Into<String>) {
        self.producer = Some(producer.into());
    }

    pub fn set_region_code(&mut self, region_code: impl Into<String>) {
        self.region_code = Some(region_code.into());
    }

    pub fn set_datetime(&mut self, datetime: NaiveDateTime) {
        self.datetime = Some(datetime);
    }

    pub fn set_datetime_range(&mut self, start: NaiveDateTime, end: NaiveDateTime) {
        self.datetime_range = Some((start, end));
    }

    pub fn set_processed(&mut self, processed: NaiveDateTime) {
        self.processed = Some(processed);
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.properties.insert(key.into(), value);
    }

    /// Notes a measurement raster. `path` is recorded verbatim in the
    /// document, so pass the path the indexed dataset will be read from.
    pub fn note_measurement(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.measurements.push((name.into(), path.into()));
    }

    fn check_required_measurements(&self) -> Result<(), PrepError> {
        let missing: Vec<String> = self
            .product
            .measurement_names()
            .iter()
            .filter(|name| !self.measurements.iter().any(|(noted, _)| noted == *name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PrepError::IncompleteDataset {
                path: self.dataset_location.clone(),
                missing,
            })
        }
    }

    fn build_properties(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        let mut properties = self.properties.clone();
        let datetime = self.datetime.context("Dataset datetime is not set")?;
        properties.insert("datetime".to_string(), json!(eo3::format_datetime(datetime)));
        if let Some((start, end)) = self.datetime_range {
            properties.insert(
                "dtr:start_datetime".to_string(),
                json!(eo3::format_datetime(start)),
            );
            properties.insert(
                "dtr:end_datetime".to_string(),
                json!(eo3::format_datetime(end)),
            );
        }
        if let Some(platform) = &self.platform {
            properties.insert("eo:platform".to_string(), json!(platform.to_lowercase()));
        }
        if let Some(producer) = &self.producer {
            properties.insert("odc:producer".to_string(), json!(producer));
        }
        if let Some(version) = &self.dataset_version {
            properties.insert("odc:dataset_version".to_string(), json!(version));
        }
        if let Some(processed) = self.processed {
            properties.insert(
                "odc:processing_datetime".to_string(),
                json!(eo3::format_datetime(processed)),
            );
        }
        if let Some(region_code) = &self.region_code {
            properties.insert("odc:region_code".to_string(), json!(region_code));
        }
        Ok(properties)
    }

    /// Reads the grid of every noted measurement and builds the document.
    /// Missing required measurements surface as [`PrepError::IncompleteDataset`].
    pub fn to_dataset_doc(&self) -> Result<DatasetDoc> {
        self.check_required_measurements()?;
        let id = self.dataset_id.context("Dataset id is not set")?;
        if self.measurements.is_empty() {
            anyhow::bail!("Dataset {} has no measurements", self.dataset_location);
        }

        // Grids are grouped by shape and transform. The first one becomes
        // `default`, others are keyed by pixel resolution.
        let mut grids: Vec<(String, GridSpec)> = Vec::new();
        let mut measurements = BTreeMap::new();
        for (name, path) in &self.measurements {
            let grid = cog::read_grid(path)
                .with_context(|| format!("Failed to read the grid of measurement {name}"))?;
            let key = match grids
                .iter()
                .find(|(_, known)| known.shape == grid.shape && known.transform == grid.transform)
            {
                Some((key, _)) => key.clone(),
                None => {
                    let key = if grids.is_empty() {
                        "default".to_string()
                    } else {
                        eo3::grid_key(grid.transform[0])
                    };
                    grids.push((key.clone(), grid.clone()));
                    key
                }
            };
            measurements.insert(
                name.clone(),
                MeasurementDoc {
                    path: path.clone(),
                    grid: (key != "default").then_some(key),
                    band: None,
                },
            );
        }

        let crs = grids[0].1.crs.clone();
        for (_, grid) in &grids {
            if grid.crs != crs {
                anyhow::bail!(
                    "Dataset {} mixes CRSs: {} and {}",
                    self.dataset_location,
                    crs,
                    grid.crs
                );
            }
        }

        let bounds = grids
            .iter()
            .skip(1)
            .fold(grids[0].1.bounds, |acc, (_, grid)| {
                Bounds::new(
                    acc.minx.min(grid.bounds.minx),
                    acc.miny.min(grid.bounds.miny),
                    acc.maxx.max(grid.bounds.maxx),
                    acc.maxy.max(grid.bounds.maxy),
                )
            });

        Ok(DatasetDoc {
            schema: DATASET_SCHEMA.to_string(),
            id,
            label: self.label.clone(),
            product: ProductRef {
                name: self.product.name.clone(),
                href: self.product_uri.clone(),
            },
            crs,
            geometry: Some(bounds_polygon(&bounds)),
            grids: grids
                .into_iter()
                .map(|(key, grid)| {
                    (
                        key,
                        GridDoc {
                            shape: grid.shape,
                            transform: grid.transform,
                        },
                    )
                })
                .collect(),
            properties: self.build_properties()?,
            measurements,
            accessories: BTreeMap::new(),
            lineage: BTreeMap::new(),
        })
    }
}

/// GeoJSON polygon covering a bounding box.
pub fn bounds_polygon(bounds: &Bounds) -> serde_json::Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [bounds.maxx, bounds.miny],
            [bounds.maxx, bounds.maxy],
            [bounds.minx, bounds.maxy],
            [bounds.minx, bounds.miny],
            [bounds.maxx, bounds.miny],
        ]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset_id::odc_uuid;
    use chrono::NaiveDate;
    use gdal::raster::Buffer;
    use gdal::spatial_ref::SpatialRef;
    use gdal::DriverManager;
    use std::io::Write;
    use tempfile::TempDir;

    const PRODUCT_YAML: &str = "\
name: wapor_soil_moisture
metadata_type: eo3
measurements:
  - name: relative_soil_moisture
    dtype: float32
    nodata: -9999
    units: percent
";

    fn write_product_yaml(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("product.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(PRODUCT_YAML.as_bytes()).unwrap();
        path
    }

    fn gdal_available() -> bool {
        DriverManager::get_driver_by_name("GTiff").is_ok()
    }

    fn create_test_raster(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<f32, _>(&path, 4, 3, 1)
            .unwrap();
        dataset
            .set_geo_transform(&[10.0, 0.5, 0.0, 20.0, 0.0, -0.5])
            .unwrap();
        let srs = SpatialRef::from_epsg(4326).unwrap();
        dataset.set_projection(&srs.to_wkt().unwrap()).unwrap();
        let mut band = dataset.rasterband(1).unwrap();
        let mut buffer = Buffer::new((4, 3), vec![1.0f32; 12]);
        band.write((0, 0), (4, 3), &mut buffer).unwrap();
        path.to_string_lossy().to_string()
    }

    fn dekad_datetime(day: u32, hms: (u32, u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, day)
            .unwrap()
            .and_hms_opt(hms.0, hms.1, hms.2)
            .unwrap()
    }

    #[test]
    fn test_missing_measurement_is_incomplete() {
        let tmp_dir = TempDir::new().unwrap();
        let product_yaml = write_product_yaml(&tmp_dir);

        let assembler = DatasetAssembler::new("gs://bucket/tile", &product_yaml).unwrap();
        let error = assembler.to_dataset_doc().unwrap_err();
        let prep = error.downcast_ref::<PrepError>().unwrap();
        match prep {
            PrepError::IncompleteDataset { path, missing } => {
                assert_eq!(path, "gs://bucket/tile");
                assert_eq!(missing, &["relative_soil_moisture".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_to_dataset_doc() {
        if !gdal_available() {
            eprintln!("Skipping test: GDAL drivers not available");
            return;
        }
        let tmp_dir = TempDir::new().unwrap();
        let product_yaml = write_product_yaml(&tmp_dir);
        let raster = create_test_raster(&tmp_dir, "L2-RSM-D.2021-01-D1.tif");

        let mut assembler = DatasetAssembler::new(&raster, &product_yaml).unwrap();
        assembler.set_dataset_id(odc_uuid(
            "wapor_soil_moisture",
            "v3.0",
            ["L2-RSM-D.2021-01-D1"],
        ));
        assembler.set_product_uri("https://explorer.digitalearth.africa/product/wapor_soil_moisture");
        assembler.set_dataset_version("v3.0");
        assembler.set_platform("WaPORv3");
        assembler.set_producer("www.fao.org");
        assembler.set_datetime(dekad_datetime(10, (0, 0, 0)));
        assembler.set_datetime_range(dekad_datetime(1, (0, 0, 0)), dekad_datetime(10, (23, 59, 59)));
        assembler.set_property("odc:file_format", json!("GeoTIFF"));
        assembler.note_measurement("relative_soil_moisture", &raster);

        let doc = assembler.to_dataset_doc().unwrap();
        assert_eq!(doc.schema, DATASET_SCHEMA);
        assert_eq!(doc.product.name, "wapor_soil_moisture");
        assert_eq!(doc.crs, "epsg:4326");
        assert_eq!(doc.grids.len(), 1);
        assert_eq!(doc.grids["default"].shape, [3, 4]);
        assert_eq!(
            doc.grids["default"].transform,
            [0.5, 0.0, 10.0, 0.0, -0.5, 20.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(doc.properties["datetime"], json!("2021-01-10T00:00:00Z"));
        assert_eq!(
            doc.properties["dtr:start_datetime"],
            json!("2021-01-01T00:00:00Z")
        );
        assert_eq!(
            doc.properties["dtr:end_datetime"],
            json!("2021-01-10T23:59:59Z")
        );
        assert_eq!(doc.properties["eo:platform"], json!("waporv3"));
        assert_eq!(doc.properties["odc:producer"], json!("www.fao.org"));
        assert_eq!(doc.properties["odc:file_format"], json!("GeoTIFF"));
        assert!(doc.measurements["relative_soil_moisture"].grid.is_none());

        let geometry = doc.geometry.unwrap();
        assert_eq!(geometry["type"], json!("Polygon"));
        assert_eq!(geometry["coordinates"][0][0], json!([12.0, 18.5]));
    }

    #[test]
    fn test_measurements_on_two_grids() {
        if !gdal_available() {
            eprintln!("Skipping test: GDAL drivers not available");
            return;
        }
        let tmp_dir = TempDir::new().unwrap();
        let product_yaml = write_product_yaml(&tmp_dir);
        let fine = create_test_raster(&tmp_dir, "fine.tif");

        let coarse_path = tmp_dir.path().join("coarse.tif");
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut coarse = driver
            .create_with_band_type::<f32, _>(&coarse_path, 2, 2, 1)
            .unwrap();
        coarse
            .set_geo_transform(&[10.0, 1.0, 0.0, 20.0, 0.0, -1.0])
            .unwrap();
        let srs = SpatialRef::from_epsg(4326).unwrap();
        coarse.set_projection(&srs.to_wkt().unwrap()).unwrap();
        drop(coarse);

        let mut assembler = DatasetAssembler::new(&fine, &product_yaml).unwrap();
        assembler.set_dataset_id(odc_uuid("wapor_soil_moisture", "v3.0", ["two-grids"]));
        assembler.set_datetime(dekad_datetime(10, (0, 0, 0)));
        assembler.note_measurement("relative_soil_moisture", &fine);
        assembler.note_measurement("quality", coarse_path.to_string_lossy());

        let doc = assembler.to_dataset_doc().unwrap();
        assert_eq!(doc.grids.len(), 2);
        assert!(doc.grids.contains_key("default"));
        assert!(doc.grids.contains_key("g1"));
        assert_eq!(doc.measurements["quality"].grid.as_deref(), Some("g1"));
    }
}
