//! WaPOR v3 catalog client.
//!
//! Mapset rasters are listed through the paginated catalog API; when the
//! API is unreachable the public bucket holding the same files is walked
//! instead.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::fs::{self, http};
use crate::paths;

/// Root of the WaPOR v3 catalog API.
pub const WAPOR_API_BASE: &str =
    "https://data.apps.fao.org/gismgr/api/v2/catalog/workspaces/WAPOR-3";

/// Bucket prefix holding the same rasters the API serves.
pub const WAPOR_GS_BASE: &str = "gs://fao-gismgr-wapor-3-data/DATA/WAPOR-3/MAPSET";

/// Follows `links[rel="next"]` from `url` and returns the items of every
/// page, in page order.
pub fn fetch_paged_items(url: &str) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut next = Some(url.to_string());
    while let Some(page_url) = next {
        let body: Value = http::get_json(&page_url)?;
        let data = body
            .get("response")
            .with_context(|| format!("Missing response envelope in {page_url}"))?;
        if let Some(page_items) = data.get("items").and_then(Value::as_array) {
            items.extend(page_items.iter().cloned());
        }
        next = next_page_url(data);
    }
    Ok(items)
}

fn next_page_url(data: &Value) -> Option<String> {
    data.get("links")
        .and_then(Value::as_array)?
        .iter()
        .find(|link| link.get("rel").and_then(Value::as_str) == Some("next"))?
        .get("href")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Download URLs of raster items, sorted by raster code. Items without a
/// download URL are dropped with a warning.
fn sorted_download_urls(items: &[Value]) -> Vec<String> {
    let mut rasters: Vec<(String, String)> = Vec::with_capacity(items.len());
    for item in items {
        let code = item
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match item.get("downloadUrl").and_then(Value::as_str) {
            Some(download_url) => rasters.push((code, download_url.to_string())),
            None => tracing::warn!("Catalog item {code} has no downloadUrl, dropping it"),
        }
    }
    rasters.sort_by(|a, b| a.0.cmp(&b.0));
    rasters.into_iter().map(|(_, url)| url).collect()
}

/// Raster download URLs for a mapset, via the catalog API.
pub fn mapset_rasters_from_api(mapset_code: &str) -> Result<Vec<String>> {
    let url = format!("{WAPOR_API_BASE}/mapsets/{mapset_code}/rasters");
    let items = fetch_paged_items(&url)?;
    Ok(sorted_download_urls(&items))
}

/// Raster URIs for a mapset, from the public bucket listing.
pub fn mapset_rasters_from_bucket(mapset_code: &str) -> Result<Vec<String>> {
    let prefix = paths::join(WAPOR_GS_BASE, &[mapset_code]);
    fs::find_geotiff_files(&prefix)
}

/// Raster list for a mapset: the catalog API first, the bucket listing when
/// the API fails.
pub fn get_mapset_rasters(mapset_code: &str) -> Result<Vec<String>> {
    let rasters = match mapset_rasters_from_api(mapset_code) {
        Ok(rasters) => rasters,
        Err(error) => {
            tracing::warn!(
                "WaPOR catalog API failed for mapset {mapset_code}, listing the bucket instead: {error:#}"
            );
            mapset_rasters_from_bucket(mapset_code)?
        }
    };
    tracing::info!(
        "Found {} rasters for the mapset {mapset_code}",
        rasters.len()
    );
    Ok(rasters)
}
