//! STAC item rendering of dataset documents, item repair helpers, and the
//! STAC to EO3 transform used at indexing time.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::assemble::bounds_polygon;
use crate::cog;
use crate::dataset_id::odc_uuid;
use crate::eo3::{self, DatasetDoc};
use crate::extent;
use crate::fs;
use crate::paths;

pub const STAC_VERSION: &str = "1.0.0";
pub const COG_MEDIA_TYPE: &str = "image/tiff; application=geotiff; profile=cloud-optimized";

const STAC_EXTENSIONS: [&str; 2] = [
    "https://stac-extensions.github.io/eo/v1.0.0/schema.json",
    "https://stac-extensions.github.io/projection/v2.0.0/schema.json",
];

/// EO3 property names and their STAC spellings.
const EO3_TO_STAC_PROPERTIES: [(&str, &str); 11] = [
    ("dtr:start_datetime", "start_datetime"),
    ("dtr:end_datetime", "end_datetime"),
    ("eo:gsd", "gsd"),
    ("eo:instrument", "instruments"),
    ("eo:platform", "platform"),
    ("eo:constellation", "constellation"),
    ("eo:off_nadir", "view:off_nadir"),
    ("eo:azimuth", "view:azimuth"),
    ("eo:sun_azimuth", "view:sun_azimuth"),
    ("eo:sun_elevation", "view:sun_elevation"),
    ("odc:processing_datetime", "created"),
];

/// STAC property names that EO3 documents spell differently. `created` is
/// not mapped back; the transform copies it into `odc:processing_datetime`
/// separately.
const STAC_TO_EO3_PROPERTIES: [(&str, &str); 10] = [
    ("start_datetime", "dtr:start_datetime"),
    ("end_datetime", "dtr:end_datetime"),
    ("gsd", "eo:gsd"),
    ("instruments", "eo:instrument"),
    ("platform", "eo:platform"),
    ("constellation", "eo:constellation"),
    ("view:off_nadir", "eo:off_nadir"),
    ("view:azimuth", "eo:azimuth"),
    ("view:sun_azimuth", "eo:sun_azimuth"),
    ("view:sun_elevation", "eo:sun_elevation"),
];

/// EPSG code of a `EPSG:{n}` CRS string.
pub fn crs_str_to_int(crs: &str) -> Result<i64> {
    let code = crs
        .strip_prefix("EPSG:")
        .or_else(|| crs.strip_prefix("epsg:"))
        .with_context(|| format!("CRS {crs} is not an EPSG code"))?;
    code.parse()
        .with_context(|| format!("CRS {crs} is not an EPSG code"))
}

fn epsg_code(crs: &str) -> Option<i64> {
    crs_str_to_int(crs).ok()
}

/// Renders a dataset document as a STAC 1.0 item. The item geometry and
/// bbox are in WGS84; the native CRS is carried in the `proj:` fields.
pub fn to_stac_item(doc: &DatasetDoc, stac_item_destination_url: &str) -> Result<Value> {
    let native_bounds = doc
        .geometry
        .as_ref()
        .and_then(extent::geometry_bounds)
        .with_context(|| format!("Dataset {} has no usable geometry", doc.id))?;
    let wgs84_bounds = if epsg_code(&doc.crs) == Some(4326) {
        native_bounds
    } else {
        cog::bounds_to_wgs84(&native_bounds, &doc.crs)?
    };

    let default_grid = doc
        .grids
        .get("default")
        .with_context(|| format!("Dataset {} has no default grid", doc.id))?;

    let mut properties = Map::new();
    for (key, value) in &doc.properties {
        let stac_key = EO3_TO_STAC_PROPERTIES
            .iter()
            .find(|(eo3_key, _)| eo3_key == key)
            .map(|(_, stac_key)| *stac_key)
            .unwrap_or(key.as_str());
        properties.insert(stac_key.to_string(), value.clone());
    }
    if let Some(code) = epsg_code(&doc.crs) {
        properties.insert("proj:code".to_string(), json!(format!("EPSG:{code}")));
    }
    properties.insert("proj:shape".to_string(), json!(default_grid.shape));
    properties.insert("proj:transform".to_string(), json!(default_grid.transform));
    properties.insert("odc:product".to_string(), json!(doc.product.name));

    let mut assets = Map::new();
    for (name, measurement) in &doc.measurements {
        let grid_name = measurement.grid.as_deref().unwrap_or("default");
        let grid = doc
            .grids
            .get(grid_name)
            .with_context(|| format!("Measurement {name} names unknown grid {grid_name}"))?;
        let mut asset = Map::new();
        asset.insert("eo:bands".to_string(), json!([{ "name": name }]));
        asset.insert("proj:shape".to_string(), json!(grid.shape));
        asset.insert("proj:transform".to_string(), json!(grid.transform));
        if let Some(band) = measurement.band {
            asset.insert("band".to_string(), json!(band));
        }
        asset.insert("href".to_string(), json!(measurement.path));
        asset.insert("type".to_string(), json!(COG_MEDIA_TYPE));
        asset.insert("roles".to_string(), json!(["data"]));
        assets.insert(name.clone(), Value::Object(asset));
    }
    for (name, accessory) in &doc.accessories {
        assets.insert(
            name.clone(),
            json!({ "href": accessory.path, "roles": ["metadata"] }),
        );
    }

    let mut links = vec![json!({
        "rel": "self",
        "type": "application/json",
        "href": stac_item_destination_url,
    })];
    if let Some(href) = &doc.product.href {
        links.push(json!({
            "title": "ODC Product Overview",
            "rel": "product_overview",
            "type": "text/html",
            "href": href,
        }));
    }

    Ok(json!({
        "type": "Feature",
        "stac_version": STAC_VERSION,
        "stac_extensions": STAC_EXTENSIONS,
        "id": doc.id.to_string(),
        "geometry": bounds_polygon(&wgs84_bounds),
        "bbox": [
            wgs84_bounds.minx,
            wgs84_bounds.miny,
            wgs84_bounds.maxx,
            wgs84_bounds.maxy,
        ],
        "properties": Value::Object(properties),
        "assets": Value::Object(assets),
        "links": links,
        "collection": doc.product.name,
    }))
}

fn replace_proj_code(object: &Map<String, Value>) -> Result<Option<Map<String, Value>>> {
    let Some(proj_code) = object.get("proj:code").and_then(Value::as_str) else {
        return Ok(None);
    };
    let epsg = crs_str_to_int(proj_code)?;
    let mut rebuilt = Map::new();
    for (key, value) in object {
        if key == "proj:code" {
            rebuilt.insert("proj:epsg".to_string(), json!(epsg));
        } else {
            rebuilt.insert(key.clone(), value.clone());
        }
    }
    Ok(Some(rebuilt))
}

/// Rewrites `proj:code` (`"EPSG:{n}"`) to an integer `proj:epsg` in the item
/// properties and in every asset, keeping key order.
pub fn fix_proj_code_property(stac_item: &mut Value) -> Result<()> {
    if let Some(properties) = stac_item.get("properties").and_then(Value::as_object) {
        if let Some(rebuilt) = replace_proj_code(properties)? {
            stac_item["properties"] = Value::Object(rebuilt);
        }
    }

    let asset_names: Vec<String> = stac_item
        .get("assets")
        .and_then(Value::as_object)
        .map(|assets| assets.keys().cloned().collect())
        .unwrap_or_default();
    for name in asset_names {
        if let Some(asset) = stac_item["assets"].get(&name).and_then(Value::as_object) {
            if let Some(rebuilt) = replace_proj_code(asset)? {
                stac_item["assets"][&name] = Value::Object(rebuilt);
            }
        }
    }
    Ok(())
}

/// Rewrites `gs://` asset hrefs to their public HTTPS form.
pub fn rewrite_gs_asset_hrefs(stac_item: &mut Value) {
    let Some(assets) = stac_item.get_mut("assets").and_then(Value::as_object_mut) else {
        return;
    };
    for asset in assets.values_mut() {
        let Some(href) = asset.get("href").and_then(Value::as_str) else {
            continue;
        };
        if let Some(url) = paths::gs_uri_to_https(href) {
            asset["href"] = json!(url);
        }
    }
}

/// Writes a STAC item as 2-space-indented JSON, locally or to an object
/// store.
pub fn write_stac_item(stac_item: &Value, destination_url: &str) -> Result<()> {
    let body = serde_json::to_string_pretty(stac_item).context("Failed to serialize STAC item")?;
    fs::put_object(destination_url, body.as_bytes(), "application/json")?;
    tracing::info!("STAC item written to {destination_url}");
    Ok(())
}

fn transform_resolution(transform: &Value) -> Result<f64> {
    transform
        .get(0)
        .and_then(Value::as_f64)
        .context("proj:transform has no resolution element")
}

fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}

/// Translates a STAC 1.0 item into an EO3 document ready for indexing.
///
/// The product is taken from the `odc:product` property, grids from the
/// `proj:shape`/`proj:transform` fields (item level as the fallback for
/// assets), and the geometry is moved back to the native CRS when that CRS
/// is not WGS84.
pub fn stac_to_eo3(input_stac: &Value) -> Result<Value> {
    let input_id = input_stac
        .get("id")
        .and_then(Value::as_str)
        .context("STAC item has no id")?;
    let properties = input_stac
        .get("properties")
        .and_then(Value::as_object)
        .context("STAC item has no properties")?;
    let product_name = properties
        .get("odc:product")
        .and_then(Value::as_str)
        .context("STAC item has no odc:product property")?;
    let label = input_stac
        .get("title")
        .or_else(|| properties.get("title"))
        .and_then(Value::as_str);
    let region_code = properties.get("odc:region_code").cloned();

    let dataset_id = match Uuid::parse_str(input_id) {
        Ok(id) => id,
        Err(_) => odc_uuid(&format!("{product_name}_stac_process"), "1.0.0", [input_id]),
    };

    // Projection extension v2 spells the CRS as `proj:code`, v1 as
    // `proj:epsg`.
    let native_crs = if let Some(code) = properties.get("proj:code").and_then(Value::as_str) {
        code.to_lowercase()
    } else if let Some(epsg) = properties.get("proj:epsg").and_then(Value::as_i64) {
        format!("epsg:{epsg}")
    } else {
        anyhow::bail!("STAC item has neither proj:code nor proj:epsg");
    };

    let item_shape = properties.get("proj:shape");
    let item_transform = properties.get("proj:transform");

    let empty = Map::new();
    let assets = input_stac
        .get("assets")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut grids = Map::new();
    let mut measurements = Map::new();
    let mut accessories = Map::new();
    for (name, asset) in assets {
        let href = asset
            .get("href")
            .and_then(Value::as_str)
            .with_context(|| format!("Asset {name} has no href"))?;
        let media_type = asset.get("type").and_then(Value::as_str).unwrap_or("");
        if !media_type.contains("geotiff") {
            accessories.insert(name.clone(), json!({ "path": href }));
            continue;
        }

        let transform = asset
            .get("proj:transform")
            .or(item_transform)
            .with_context(|| format!("Asset {name} has no proj:transform"))?
            .clone();
        let shape = asset
            .get("proj:shape")
            .or(item_shape)
            .with_context(|| format!("Asset {name} has no proj:shape"))?
            .clone();
        let grid = eo3::grid_key(transform_resolution(&transform)?);
        if !grids.contains_key(&grid) {
            grids.insert(grid.clone(), json!({ "shape": shape, "transform": transform }));
        }

        let mut band_info = Map::new();
        band_info.insert("path".to_string(), json!(href));
        if let Some(band) = asset.get("band") {
            band_info.insert("band".to_string(), band.clone());
        }
        band_info.insert("grid".to_string(), json!(grid));
        measurements.insert(name.clone(), Value::Object(band_info));
    }

    // The first grid becomes the default; its measurements drop the grid key.
    let default_key = grids
        .keys()
        .next()
        .cloned()
        .context("STAC item has no raster assets")?;
    let grids: Map<String, Value> = grids
        .into_iter()
        .map(|(key, value)| {
            if key == default_key {
                ("default".to_string(), value)
            } else {
                (key, value)
            }
        })
        .collect();
    for measurement in measurements.values_mut() {
        if measurement.get("grid").and_then(Value::as_str) == Some(default_key.as_str()) {
            if let Some(object) = measurement.as_object_mut() {
                object.remove("grid");
            }
        }
    }

    let mut eo3_properties = Map::new();
    for (key, value) in properties {
        let eo3_key = STAC_TO_EO3_PROPERTIES
            .iter()
            .find(|(stac_key, _)| stac_key == key)
            .map(|(_, eo3_key)| *eo3_key)
            .unwrap_or(key.as_str());
        eo3_properties.insert(eo3_key.to_string(), value.clone());
    }
    if !eo3_properties.contains_key("odc:processing_datetime") {
        let fallback = properties
            .get("created")
            .or_else(|| properties.get("datetime"))
            .cloned()
            .context("STAC item has no datetime property")?;
        eo3_properties.insert("odc:processing_datetime".to_string(), fallback);
    }
    if !eo3_properties.contains_key("odc:file_format") {
        eo3_properties.insert("odc:file_format".to_string(), json!("GeoTIFF"));
    }
    let lineage = eo3_properties.get("odc:lineage").cloned();
    if lineage.is_some() {
        eo3_properties = eo3_properties
            .into_iter()
            .filter(|(key, _)| key != "odc:lineage")
            .collect();
    }
    if let Some(region_code) = region_code {
        eo3_properties.insert("odc:region_code".to_string(), region_code);
    }

    let geometry = input_stac
        .get("geometry")
        .filter(|geometry| !geometry.is_null())
        .context("STAC item has no geometry")?;
    let geometry = if native_crs == "epsg:4326" {
        geometry.clone()
    } else {
        let wgs84_bounds = extent::geometry_bounds(geometry)
            .context("STAC item geometry has no coordinates")?;
        let pixel_size = transform_resolution(&default_grid_transform(&grids)?)?;
        let precision = if pixel_size < 0.0 { 6 } else { 0 };
        let bounds = cog::bounds_from_wgs84(&wgs84_bounds, &native_crs)?;
        bounds_polygon(&extent::Bounds::new(
            round_to(bounds.minx, precision),
            round_to(bounds.miny, precision),
            round_to(bounds.maxx, precision),
            round_to(bounds.maxy, precision),
        ))
    };

    let mut eo3 = Map::new();
    eo3.insert("$schema".to_string(), json!(eo3::DATASET_SCHEMA));
    eo3.insert("id".to_string(), json!(dataset_id.to_string()));
    eo3.insert("crs".to_string(), json!(native_crs));
    eo3.insert("grids".to_string(), Value::Object(grids));
    eo3.insert(
        "product".to_string(),
        json!({ "name": product_name.to_lowercase() }),
    );
    eo3.insert("properties".to_string(), Value::Object(eo3_properties));
    eo3.insert("measurements".to_string(), Value::Object(measurements));
    eo3.insert("lineage".to_string(), lineage.unwrap_or_else(|| json!({})));
    eo3.insert("accessories".to_string(), Value::Object(accessories));
    if let Some(label) = label {
        eo3.insert("label".to_string(), json!(label));
    }
    eo3.insert("geometry".to_string(), geometry);

    Ok(Value::Object(eo3))
}

fn default_grid_transform(grids: &Map<String, Value>) -> Result<Value> {
    grids
        .get("default")
        .and_then(|grid| grid.get("transform"))
        .cloned()
        .context("STAC item has no default grid transform")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eo3::{DatasetDoc, GridDoc, MeasurementDoc, ProductRef, DATASET_SCHEMA};
    use std::collections::BTreeMap;

    fn sample_doc() -> DatasetDoc {
        let mut properties = BTreeMap::new();
        properties.insert("datetime".to_string(), json!("2021-01-31T00:00:00Z"));
        properties.insert(
            "dtr:start_datetime".to_string(),
            json!("2021-01-21T00:00:00Z"),
        );
        properties.insert(
            "dtr:end_datetime".to_string(),
            json!("2021-01-31T23:59:59Z"),
        );
        properties.insert("eo:platform".to_string(), json!("waporv3"));
        properties.insert("odc:producer".to_string(), json!("www.fao.org"));
        properties.insert("odc:product".to_string(), json!("wapor_soil_moisture"));

        let mut grids = BTreeMap::new();
        grids.insert(
            "default".to_string(),
            GridDoc {
                shape: [1800, 1600],
                transform: [0.025, 0.0, -30.0, 0.0, -0.025, 40.0, 0.0, 0.0, 1.0],
            },
        );

        let mut measurements = BTreeMap::new();
        measurements.insert(
            "relative_soil_moisture".to_string(),
            MeasurementDoc {
                path: "gs://fao-gismgr-wapor-3-data/L2-RSM-D.2021-01-D3.tif".to_string(),
                grid: None,
                band: None,
            },
        );

        DatasetDoc {
            schema: DATASET_SCHEMA.to_string(),
            id: Uuid::parse_str("ea74f480-ae39-5f0b-9396-990c3241397c").unwrap(),
            label: None,
            product: ProductRef {
                name: "wapor_soil_moisture".to_string(),
                href: Some(
                    "https://explorer.digitalearth.africa/product/wapor_soil_moisture".to_string(),
                ),
            },
            crs: "epsg:4326".to_string(),
            geometry: Some(bounds_polygon(&extent::Bounds::new(
                -30.0, -5.0, 10.0, 40.0,
            ))),
            grids,
            properties,
            measurements,
            accessories: BTreeMap::new(),
            lineage: BTreeMap::new(),
        }
    }

    #[test]
    fn test_crs_str_to_int() {
        assert_eq!(crs_str_to_int("EPSG:4326").unwrap(), 4326);
        assert_eq!(crs_str_to_int("epsg:6933").unwrap(), 6933);
        assert!(crs_str_to_int("WGS84").is_err());
    }

    #[test]
    fn test_to_stac_item() {
        let doc = sample_doc();
        let item = to_stac_item(
            &doc,
            "s3://deafrica-data-dev-af/wapor_soil_moisture/item.stac-item.json",
        )
        .unwrap();

        assert_eq!(item["type"], json!("Feature"));
        assert_eq!(item["stac_version"], json!(STAC_VERSION));
        assert_eq!(item["id"], json!("ea74f480-ae39-5f0b-9396-990c3241397c"));
        assert_eq!(item["collection"], json!("wapor_soil_moisture"));
        assert_eq!(item["bbox"], json!([-30.0, -5.0, 10.0, 40.0]));

        // EO3 property names pick up their STAC spellings.
        let properties = &item["properties"];
        assert_eq!(properties["start_datetime"], json!("2021-01-21T00:00:00Z"));
        assert_eq!(properties["end_datetime"], json!("2021-01-31T23:59:59Z"));
        assert_eq!(properties["platform"], json!("waporv3"));
        assert_eq!(properties["proj:code"], json!("EPSG:4326"));
        assert_eq!(properties["proj:shape"], json!([1800, 1600]));
        assert_eq!(properties["odc:product"], json!("wapor_soil_moisture"));
        assert!(properties.get("dtr:start_datetime").is_none());

        let asset = &item["assets"]["relative_soil_moisture"];
        assert_eq!(
            asset["href"],
            json!("gs://fao-gismgr-wapor-3-data/L2-RSM-D.2021-01-D3.tif")
        );
        assert_eq!(asset["type"], json!(COG_MEDIA_TYPE));
        assert_eq!(asset["roles"], json!(["data"]));
        assert_eq!(asset["eo:bands"], json!([{ "name": "relative_soil_moisture" }]));

        assert_eq!(item["links"][0]["rel"], json!("self"));
        assert_eq!(
            item["links"][0]["href"],
            json!("s3://deafrica-data-dev-af/wapor_soil_moisture/item.stac-item.json")
        );
        assert_eq!(item["links"][1]["rel"], json!("product_overview"));
    }

    #[test]
    fn test_fix_proj_code_property_keeps_key_order() {
        let mut item = json!({
            "properties": {
                "datetime": "2021-01-31T00:00:00Z",
                "proj:code": "EPSG:6933",
                "odc:product": "esa_worldcereal_wintercereals",
            },
            "assets": {
                "classification": {
                    "href": "s3://bucket/classification.tif",
                    "proj:code": "EPSG:6933",
                    "roles": ["data"],
                },
            },
        });

        fix_proj_code_property(&mut item).unwrap();

        let keys: Vec<&String> = item["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["datetime", "proj:epsg", "odc:product"]);
        assert_eq!(item["properties"]["proj:epsg"], json!(6933));

        let asset_keys: Vec<&String> = item["assets"]["classification"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(asset_keys, ["href", "proj:epsg", "roles"]);
        assert_eq!(item["assets"]["classification"]["proj:epsg"], json!(6933));
    }

    #[test]
    fn test_fix_proj_code_property_without_proj_code() {
        let mut item = json!({
            "properties": { "proj:epsg": 4326 },
            "assets": { "data": { "href": "x.tif" } },
        });
        fix_proj_code_property(&mut item).unwrap();
        assert_eq!(item["properties"]["proj:epsg"], json!(4326));
    }

    #[test]
    fn test_rewrite_gs_asset_hrefs() {
        let mut item = json!({
            "assets": {
                "a": { "href": "gs://bucket/key.tif" },
                "b": { "href": "s3://bucket/key.tif" },
            },
        });
        rewrite_gs_asset_hrefs(&mut item);
        assert_eq!(
            item["assets"]["a"]["href"],
            json!("https://storage.googleapis.com/bucket/key.tif")
        );
        assert_eq!(item["assets"]["b"]["href"], json!("s3://bucket/key.tif"));
    }

    #[test]
    fn test_stac_to_eo3_roundtrip() {
        let doc = sample_doc();
        let item = to_stac_item(&doc, "s3://bucket/item.stac-item.json").unwrap();

        let eo3 = stac_to_eo3(&item).unwrap();
        assert_eq!(eo3["$schema"], json!(DATASET_SCHEMA));
        // A valid item id is kept as the dataset id.
        assert_eq!(eo3["id"], json!("ea74f480-ae39-5f0b-9396-990c3241397c"));
        assert_eq!(eo3["crs"], json!("epsg:4326"));
        assert_eq!(eo3["product"]["name"], json!("wapor_soil_moisture"));
        assert_eq!(eo3["grids"]["default"]["shape"], json!([1800, 1600]));
        assert_eq!(
            eo3["measurements"]["relative_soil_moisture"]["path"],
            json!("gs://fao-gismgr-wapor-3-data/L2-RSM-D.2021-01-D3.tif")
        );
        assert!(eo3["measurements"]["relative_soil_moisture"]
            .get("grid")
            .is_none());

        // STAC spellings map back to the EO3 ones.
        let properties = &eo3["properties"];
        assert_eq!(
            properties["dtr:start_datetime"],
            json!("2021-01-21T00:00:00Z")
        );
        assert_eq!(
            properties["dtr:end_datetime"],
            json!("2021-01-31T23:59:59Z")
        );
        assert_eq!(properties["eo:platform"], json!("waporv3"));
        assert_eq!(properties["odc:file_format"], json!("GeoTIFF"));
        assert_eq!(
            properties["odc:processing_datetime"],
            json!("2021-01-31T00:00:00Z")
        );
        assert_eq!(eo3["lineage"], json!({}));
        assert_eq!(eo3["geometry"], doc.geometry.unwrap());
    }

    #[test]
    fn test_stac_to_eo3_generates_id_for_invalid_uuid() {
        let item = json!({
            "id": "not-a-uuid",
            "properties": {
                "datetime": "2023-01-01T00:00:00Z",
                "odc:product": "iwmi_blue_et_monthly",
                "proj:epsg": 4326,
                "proj:shape": [100, 100],
                "proj:transform": [0.1, 0.0, 0.0, 0.0, -0.1, 10.0, 0.0, 0.0, 1.0],
            },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0], [10.0, 0.0]]],
            },
            "assets": {
                "data": {
                    "href": "s3://bucket/data.tif",
                    "type": COG_MEDIA_TYPE,
                },
                "thumbnail": {
                    "href": "s3://bucket/thumb.png",
                    "type": "image/png",
                },
            },
        });

        let eo3 = stac_to_eo3(&item).unwrap();
        let expected = odc_uuid("iwmi_blue_et_monthly_stac_process", "1.0.0", ["not-a-uuid"]);
        assert_eq!(eo3["id"], json!(expected.to_string()));
        // Assets fall back to the item-level grid fields.
        assert_eq!(eo3["grids"]["default"]["shape"], json!([100, 100]));
        assert_eq!(eo3["measurements"]["data"]["path"], json!("s3://bucket/data.tif"));
        // Non-geotiff assets become accessories.
        assert_eq!(
            eo3["accessories"]["thumbnail"]["path"],
            json!("s3://bucket/thumb.png")
        );
    }
}
