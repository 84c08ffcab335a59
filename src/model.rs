use chrono::{NaiveDate, NaiveDateTime};

use crate::error::PrepError;

/// Identity fields of a WaPOR v3 raster, named
/// `{mapset_code}.{year}-{month}` or `{mapset_code}.{year}-{month}-{dekad}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaporTileId {
    /// Full tile id, e.g. `L2-RSM-D.2021-01-D1`.
    pub tile_id: String,
    pub mapset_code: String,
    pub year: String,
    pub month: String,
    /// Present only for dekadal mapsets.
    pub dekad_label: Option<String>,
}

impl WaporTileId {
    /// Numeric year and month for calendar arithmetic.
    pub fn year_month(&self) -> Result<(i32, u32), PrepError> {
        let year = self.year.parse().map_err(|_| PrepError::InvalidDate {
            filename: self.tile_id.clone(),
            value: self.year.clone(),
        })?;
        let month = self.month.parse().map_err(|_| PrepError::InvalidDate {
            filename: self.tile_id.clone(),
            value: self.month.clone(),
        })?;
        Ok((year, month))
    }
}

/// Identity fields of an ESA WorldCereal raster, named
/// `{aez_id}_{season}_{product}_{startdate}_{enddate}_{measurement_kind}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldCerealTileId {
    /// Full tile id, e.g. `46172_tc-wintercereals_wintercereals_2021-10-01_2022-06-30_classification`.
    pub tile_id: String,
    pub aez_id: String,
    pub season: String,
    pub product: String,
    pub start_date: String,
    pub end_date: String,
    /// `classification` or `confidence`.
    pub measurement_kind: String,
}

impl WorldCerealTileId {
    /// Dataset name shared by the classification and confidence files.
    pub fn unique_name(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}",
            self.aez_id, self.season, self.product, self.start_date, self.end_date
        )
    }
}

/// Identity fields of an IWMI raster, named `{name...}_{YYYY.MM.DD}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IwmiTileId {
    pub tile_id: String,
    pub date: NaiveDate,
}

/// Inclusive datetime range of one dekad or month, with the reference
/// datetime used as the dataset timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DekadRange {
    /// Midnight of the period's last day.
    pub reference: NaiveDateTime,
    /// 00:00:00 of the period's first day.
    pub start: NaiveDateTime,
    /// 23:59:59 of the period's last day.
    pub end: NaiveDateTime,
}
