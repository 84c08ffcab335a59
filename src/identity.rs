//! Filename parsers for the supported product families.
//!
//! Tile identity is purely syntactic: each family splits its id on fixed
//! delimiters and rejects anything with an unexpected field count instead
//! of guessing at partial matches.

use chrono::NaiveDate;

use crate::error::PrepError;
use crate::model::{IwmiTileId, WaporTileId, WorldCerealTileId};
use crate::paths::{self, GEOTIFF_EXTENSIONS};

/// File name of `path` with its GeoTIFF extension removed. Dots inside the
/// id itself survive, so `L2-RSM-D.2021-01-D1.tif` becomes
/// `L2-RSM-D.2021-01-D1`.
pub fn tile_id_from_path(path: &str) -> String {
    let name = paths::file_name(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if GEOTIFF_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) => {
            stem.to_string()
        }
        _ => name.to_string(),
    }
}

/// Parses a WaPOR v3 tile id, `{mapset_code}.{year}-{month}` for monthly
/// mapsets or `{mapset_code}.{year}-{month}-{dekad}` for dekadal ones.
///
/// The trailing group is dispatched on token count: two tokens parse as a
/// monthly id, three as a dekadal id, anything else is malformed.
pub fn parse_wapor_tile_id(tile_id: &str) -> Result<WaporTileId, PrepError> {
    let malformed = || PrepError::MalformedIdentifier {
        family: "WaPOR",
        filename: tile_id.to_string(),
    };
    let (mapset_code, period) = tile_id.rsplit_once('.').ok_or_else(malformed)?;
    if mapset_code.is_empty() {
        return Err(malformed());
    }
    let tokens: Vec<&str> = period.split('-').collect();
    let (year, month, dekad_label) = match tokens[..] {
        [year, month] => (year, month, None),
        [year, month, dekad] => (year, month, Some(dekad.to_string())),
        _ => return Err(malformed()),
    };
    Ok(WaporTileId {
        tile_id: tile_id.to_string(),
        mapset_code: mapset_code.to_string(),
        year: year.to_string(),
        month: month.to_string(),
        dekad_label,
    })
}

/// Parses an ESA WorldCereal tile id,
/// `{aez_id}_{season}_{product}_{startdate}_{enddate}_{measurement_kind}`.
/// Exactly six underscore-separated fields are required.
pub fn parse_worldcereal_tile_id(tile_id: &str) -> Result<WorldCerealTileId, PrepError> {
    let fields: Vec<&str> = tile_id.split('_').collect();
    match fields[..] {
        [aez_id, season, product, start_date, end_date, measurement_kind] => {
            Ok(WorldCerealTileId {
                tile_id: tile_id.to_string(),
                aez_id: aez_id.to_string(),
                season: season.to_string(),
                product: product.to_string(),
                start_date: start_date.to_string(),
                end_date: end_date.to_string(),
                measurement_kind: measurement_kind.to_string(),
            })
        }
        _ => Err(PrepError::MalformedIdentifier {
            family: "WorldCereal",
            filename: tile_id.to_string(),
        }),
    }
}

/// Parses an IWMI tile id, `{name...}_{YYYY.MM.DD}`. Everything before the
/// final underscore is free-form; the final field must be a valid date.
pub fn parse_iwmi_tile_id(tile_id: &str) -> Result<IwmiTileId, PrepError> {
    let (_, raw_date) = tile_id
        .rsplit_once('_')
        .ok_or_else(|| PrepError::MalformedIdentifier {
            family: "IWMI",
            filename: tile_id.to_string(),
        })?;
    let date =
        NaiveDate::parse_from_str(raw_date, "%Y.%m.%d").map_err(|_| PrepError::InvalidDate {
            filename: tile_id.to_string(),
            value: raw_date.to_string(),
        })?;
    Ok(IwmiTileId {
        tile_id: tile_id.to_string(),
        date,
    })
}
