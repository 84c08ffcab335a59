//! Bounding-box math over GeoJSON documents.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::fs::http;

/// URL of the canonical Africa extent polygon.
pub const AFRICA_EXTENT_URL: &str =
    "https://raw.githubusercontent.com/digitalearthafrica/deafrica-extent/master/africa-extent-bbox.json";

/// Axis-aligned bounding box. The CRS is whatever the producing document
/// used; callers keep track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Bounds {
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    /// True when the two boxes overlap. Touching edges count as overlap.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.minx <= other.maxx
            && other.minx <= self.maxx
            && self.miny <= other.maxy
            && other.miny <= self.maxy
    }
}

/// Envelope of a GeoJSON geometry's coordinates, over any nesting depth.
pub fn geometry_bounds(geometry: &Value) -> Option<Bounds> {
    let coordinates = geometry.get("coordinates")?;
    let mut bounds: Option<Bounds> = None;
    walk_positions(coordinates, &mut bounds);
    bounds
}

/// Envelope of a full GeoJSON document: a FeatureCollection, a single
/// Feature or a bare geometry.
pub fn document_bounds(document: &Value) -> Option<Bounds> {
    if let Some(features) = document.get("features").and_then(Value::as_array) {
        let mut bounds: Option<Bounds> = None;
        for feature in features {
            if let Some(feature_bounds) = feature.get("geometry").and_then(geometry_bounds) {
                expand_bounds(&mut bounds, feature_bounds);
            }
        }
        return bounds;
    }
    if let Some(geometry) = document.get("geometry") {
        return geometry_bounds(geometry);
    }
    geometry_bounds(document)
}

/// Fetches the Africa extent document and returns its WGS84 envelope.
pub fn africa_bounds() -> Result<Bounds> {
    let document: Value = http::get_json(AFRICA_EXTENT_URL)?;
    document_bounds(&document).context("No geometry found in the Africa extent document")
}

fn walk_positions(node: &Value, bounds: &mut Option<Bounds>) {
    let Some(items) = node.as_array() else {
        return;
    };
    if items.len() >= 2 {
        if let (Some(x), Some(y)) = (items[0].as_f64(), items[1].as_f64()) {
            expand_point(bounds, x, y);
            return;
        }
    }
    for item in items {
        walk_positions(item, bounds);
    }
}

fn expand_point(bounds: &mut Option<Bounds>, x: f64, y: f64) {
    match bounds {
        Some(b) => {
            b.minx = b.minx.min(x);
            b.miny = b.miny.min(y);
            b.maxx = b.maxx.max(x);
            b.maxy = b.maxy.max(y);
        }
        None => *bounds = Some(Bounds::new(x, y, x, y)),
    }
}

fn expand_bounds(bounds: &mut Option<Bounds>, other: Bounds) {
    expand_point(bounds, other.minx, other.miny);
    expand_point(bounds, other.maxx, other.maxy);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_polygon_bounds() {
        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[-26.36, -47.97], [64.50, -47.97], [64.50, 38.35], [-26.36, 38.35], [-26.36, -47.97]]]
        });
        let bounds = geometry_bounds(&polygon).unwrap();
        assert_eq!(bounds, Bounds::new(-26.36, -47.97, 64.50, 38.35));
    }

    #[test]
    fn test_point_and_multipolygon_bounds() {
        let point = json!({"type": "Point", "coordinates": [10.0, -5.0]});
        assert_eq!(
            geometry_bounds(&point).unwrap(),
            Bounds::new(10.0, -5.0, 10.0, -5.0)
        );

        let multi = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [6.0, 7.0], [5.0, 5.0]]]
            ]
        });
        assert_eq!(
            geometry_bounds(&multi).unwrap(),
            Bounds::new(0.0, 0.0, 6.0, 7.0)
        );
    }

    #[test]
    fn test_feature_collection_bounds() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"aez_id": 17135},
                    "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"aez_id": 46172},
                    "geometry": {"type": "Polygon", "coordinates": [[[-4.0, 1.0], [1.0, 1.0], [1.0, 3.0], [-4.0, 1.0]]]}
                }
            ]
        });
        assert_eq!(
            document_bounds(&collection).unwrap(),
            Bounds::new(-4.0, 0.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_intersects() {
        let africa = Bounds::new(-26.36, -47.97, 64.50, 38.35);
        assert!(africa.intersects(&Bounds::new(30.0, -5.0, 35.0, 5.0)));
        // Touching edge counts.
        assert!(africa.intersects(&Bounds::new(64.50, 0.0, 70.0, 5.0)));
        // Europe is out.
        assert!(!africa.intersects(&Bounds::new(-10.0, 45.0, 30.0, 60.0)));
    }

    #[test]
    fn test_no_geometry() {
        assert_eq!(geometry_bounds(&json!({"type": "Feature"})), None);
        assert_eq!(document_bounds(&json!({"features": []})), None);
    }
}
