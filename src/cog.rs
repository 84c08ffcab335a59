//! GDAL raster operations: opening, cropping, regridding, COG encoding.

use std::path::Path;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use gdal::raster::{GdalDataType, GdalType, RasterBand, RasterCreationOptions};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::{Dataset, DriverManager, Metadata};

use crate::extent::{self, Bounds};
use crate::fs;
use crate::paths::{self, PathKind};

/// Path GDAL can open directly: local paths stay as-is, remote URIs go
/// through the `/vsicurl/` handler on their public HTTPS form.
pub fn gdal_path(path: &str) -> String {
    match paths::classify(path) {
        PathKind::Local => path.to_string(),
        PathKind::S3 => match paths::s3_uri_to_public_url(path, paths::DEFAULT_S3_REGION) {
            Some(url) => format!("/vsicurl/{url}"),
            None => path.to_string(),
        },
        PathKind::Gcs => match paths::gs_uri_to_https(path) {
            Some(url) => format!("/vsicurl/{url}"),
            None => path.to_string(),
        },
        PathKind::Http => format!("/vsicurl/{path}"),
    }
}

/// Opens a raster dataset, local or remote.
pub fn open_raster(path: &str) -> Result<Dataset> {
    Dataset::open(Path::new(&gdal_path(path)))
        .with_context(|| format!("Failed to open raster {path}"))
}

/// Reads an item from the dataset's default metadata domain.
pub fn metadata_item(dataset: &Dataset, key: &str) -> Option<String> {
    dataset.metadata_item(key, "")
}

/// CRS of a dataset as `epsg:{code}`, falling back to WKT when the CRS
/// carries no EPSG authority code.
pub fn crs_string(dataset: &Dataset) -> Result<String> {
    let srs = dataset
        .spatial_ref()
        .context("Raster has no spatial reference")?;
    match (srs.auth_name(), srs.auth_code()) {
        (Some(name), Ok(code)) if name == "EPSG" => Ok(format!("epsg:{code}")),
        _ => srs.to_wkt().context("Failed to serialize raster CRS"),
    }
}

fn dataset_srs(dataset: &Dataset) -> Result<SpatialRef> {
    let mut srs = dataset
        .spatial_ref()
        .context("Raster has no spatial reference")?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

fn wgs84_srs() -> Result<SpatialRef> {
    let mut srs = SpatialRef::from_epsg(4326).context("Failed to create EPSG:4326 SpatialRef")?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// SpatialRef from a document CRS string (`epsg:{code}` or WKT).
pub fn srs_from_crs(crs: &str) -> Result<SpatialRef> {
    let mut srs =
        SpatialRef::from_definition(crs).with_context(|| format!("Failed to parse CRS {crs}"))?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// Reprojects bounds from the given CRS to WGS84.
pub fn bounds_to_wgs84(bounds: &Bounds, crs: &str) -> Result<Bounds> {
    transform_bounds(bounds, &srs_from_crs(crs)?, &wgs84_srs()?)
}

/// Reprojects bounds from WGS84 to the given CRS.
pub fn bounds_from_wgs84(bounds: &Bounds, crs: &str) -> Result<Bounds> {
    transform_bounds(bounds, &wgs84_srs()?, &srs_from_crs(crs)?)
}

/// Transforms a bounding box between CRSs by its four corners.
pub fn transform_bounds(bounds: &Bounds, from: &SpatialRef, to: &SpatialRef) -> Result<Bounds> {
    let transform =
        CoordTransform::new(from, to).context("Failed to create coordinate transform")?;

    let mut xs = [bounds.minx, bounds.maxx, bounds.maxx, bounds.minx];
    let mut ys = [bounds.miny, bounds.miny, bounds.maxy, bounds.maxy];
    let mut zs = [0.0; 4];
    transform
        .transform_coords(&mut xs, &mut ys, &mut zs)
        .context("Failed to transform bounds")?;

    for value in xs.iter().chain(ys.iter()) {
        if !value.is_finite() {
            anyhow::bail!("Bounds transform produced non-finite coordinates");
        }
    }

    Ok(Bounds::new(
        xs.iter().copied().fold(f64::MAX, f64::min),
        ys.iter().copied().fold(f64::MAX, f64::min),
        xs.iter().copied().fold(f64::MIN, f64::max),
        ys.iter().copied().fold(f64::MIN, f64::max),
    ))
}

/// Africa bounding box expressed in the dataset's CRS.
pub fn africa_bounds_in(dataset: &Dataset) -> Result<Bounds> {
    let africa = extent::africa_bounds()?;
    transform_bounds(&africa, &wgs84_srs()?, &dataset_srs(dataset)?)
}

/// Pixel grid of a raster as recorded in dataset documents.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// `[rows, cols]`.
    pub shape: [usize; 2],
    /// Row-major 3x3 affine matrix mapping pixel to CRS coordinates.
    pub transform: [f64; 9],
    pub crs: String,
    /// Extent in the raster's own CRS.
    pub bounds: Bounds,
}

/// Reads the grid of a raster without touching its pixels.
pub fn read_grid(path: &str) -> Result<GridSpec> {
    let dataset = open_raster(path)?;
    let geo_transform = dataset
        .geo_transform()
        .context("Raster has no geo transform")?;
    let (cols, rows) = dataset.raster_size();

    let x_edge = geo_transform[0] + cols as f64 * geo_transform[1];
    let y_edge = geo_transform[3] + rows as f64 * geo_transform[5];
    let bounds = Bounds::new(
        geo_transform[0].min(x_edge),
        geo_transform[3].min(y_edge),
        geo_transform[0].max(x_edge),
        geo_transform[3].max(y_edge),
    );

    Ok(GridSpec {
        shape: [rows, cols],
        transform: [
            geo_transform[1],
            geo_transform[2],
            geo_transform[0],
            geo_transform[4],
            geo_transform[5],
            geo_transform[3],
            0.0,
            0.0,
            1.0,
        ],
        crs: crs_string(&dataset)?,
        bounds,
    })
}

/// Pixel window relative to a source grid. `col_start`/`row_start` may be
/// negative when the window extends past the source raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelWindow {
    col_start: isize,
    row_start: isize,
    cols: usize,
    rows: usize,
}

impl PixelWindow {
    fn geo_transform(&self, source: &[f64; 6]) -> [f64; 6] {
        [
            source[0] + self.col_start as f64 * source[1],
            source[1],
            source[2],
            source[3] + self.row_start as f64 * source[5],
            source[4],
            source[5],
        ]
    }
}

/// Window covering `bounds` on the source grid, without clamping.
fn bounds_window(geo_transform: &[f64; 6], bounds: &Bounds) -> PixelWindow {
    // Row order follows the sign of the y resolution (negative = north up).
    let col_start = ((bounds.minx - geo_transform[0]) / geo_transform[1]).floor() as isize;
    let col_end = ((bounds.maxx - geo_transform[0]) / geo_transform[1]).ceil() as isize;
    let (row_start, row_end) = if geo_transform[5] < 0.0 {
        (
            ((bounds.maxy - geo_transform[3]) / geo_transform[5]).floor() as isize,
            ((bounds.miny - geo_transform[3]) / geo_transform[5]).ceil() as isize,
        )
    } else {
        (
            ((bounds.miny - geo_transform[3]) / geo_transform[5]).floor() as isize,
            ((bounds.maxy - geo_transform[3]) / geo_transform[5]).ceil() as isize,
        )
    };
    PixelWindow {
        col_start,
        row_start,
        cols: (col_end - col_start).max(0) as usize,
        rows: (row_end - row_start).max(0) as usize,
    }
}

/// Window covering `bounds`, clamped to the raster. `None` when the bounds
/// do not intersect the raster at all.
fn clamped_window(
    geo_transform: &[f64; 6],
    size: (usize, usize),
    bounds: &Bounds,
) -> Option<PixelWindow> {
    let window = bounds_window(geo_transform, bounds);
    let col_start = window.col_start.max(0);
    let row_start = window.row_start.max(0);
    let col_end = (window.col_start + window.cols as isize).min(size.0 as isize);
    let row_end = (window.row_start + window.rows as isize).min(size.1 as isize);
    if col_end <= col_start || row_end <= row_start {
        return None;
    }
    Some(PixelWindow {
        col_start,
        row_start,
        cols: (col_end - col_start) as usize,
        rows: (row_end - row_start) as usize,
    })
}

fn create_mem_dataset(
    band_type: GdalDataType,
    cols: usize,
    rows: usize,
    bands: usize,
) -> Result<Dataset> {
    let driver = DriverManager::get_driver_by_name("MEM").context("Failed to get MEM driver")?;
    let dataset = match band_type {
        GdalDataType::UInt8 => driver.create_with_band_type::<u8, _>("", cols, rows, bands),
        GdalDataType::UInt16 => driver.create_with_band_type::<u16, _>("", cols, rows, bands),
        GdalDataType::Int16 => driver.create_with_band_type::<i16, _>("", cols, rows, bands),
        GdalDataType::UInt32 => driver.create_with_band_type::<u32, _>("", cols, rows, bands),
        GdalDataType::Int32 => driver.create_with_band_type::<i32, _>("", cols, rows, bands),
        GdalDataType::Float32 => driver.create_with_band_type::<f32, _>("", cols, rows, bands),
        GdalDataType::Float64 => driver.create_with_band_type::<f64, _>("", cols, rows, bands),
        other => anyhow::bail!("Unsupported raster data type {other:?}"),
    };
    dataset.context("Failed to create in-memory dataset")
}

fn copy_band<T: Copy + GdalType>(
    src: &RasterBand,
    dst: &mut RasterBand,
    src_window: (isize, isize),
    size: (usize, usize),
    dst_offset: (isize, isize),
) -> Result<()> {
    let mut buffer = src
        .read_as::<T>(src_window, size, size, None)
        .context("Failed to read raster window")?;
    dst.write(dst_offset, size, &mut buffer)
        .context("Failed to write raster window")?;
    Ok(())
}

fn copy_windows(
    src: &Dataset,
    dst: &Dataset,
    src_window: (isize, isize),
    size: (usize, usize),
    dst_offset: (isize, isize),
) -> Result<()> {
    for band_index in 1..=src.raster_count() {
        let src_band = src
            .rasterband(band_index)
            .with_context(|| format!("Failed to get source band {band_index}"))?;
        let mut dst_band = dst
            .rasterband(band_index)
            .with_context(|| format!("Failed to get target band {band_index}"))?;
        match src_band.band_type() {
            GdalDataType::UInt8 => {
                copy_band::<u8>(&src_band, &mut dst_band, src_window, size, dst_offset)?
            }
            GdalDataType::UInt16 => {
                copy_band::<u16>(&src_band, &mut dst_band, src_window, size, dst_offset)?
            }
            GdalDataType::Int16 => {
                copy_band::<i16>(&src_band, &mut dst_band, src_window, size, dst_offset)?
            }
            GdalDataType::UInt32 => {
                copy_band::<u32>(&src_band, &mut dst_band, src_window, size, dst_offset)?
            }
            GdalDataType::Int32 => {
                copy_band::<i32>(&src_band, &mut dst_band, src_window, size, dst_offset)?
            }
            GdalDataType::Float32 => {
                copy_band::<f32>(&src_band, &mut dst_band, src_window, size, dst_offset)?
            }
            GdalDataType::Float64 => {
                copy_band::<f64>(&src_band, &mut dst_band, src_window, size, dst_offset)?
            }
            other => anyhow::bail!("Unsupported raster data type {other:?}"),
        }
    }
    Ok(())
}

fn prepare_target(src: &Dataset, window: &PixelWindow) -> Result<Dataset> {
    let band_type = src
        .rasterband(1)
        .context("Failed to get source band 1")?
        .band_type();
    let mut target = create_mem_dataset(band_type, window.cols, window.rows, src.raster_count())?;
    let geo_transform = src.geo_transform().context("Raster has no geo transform")?;
    target
        .set_geo_transform(&window.geo_transform(&geo_transform))
        .context("Failed to set geo transform")?;
    target
        .set_projection(&src.projection())
        .context("Failed to set projection")?;
    for band_index in 1..=src.raster_count() {
        if let Some(nodata) = src.rasterband(band_index)?.no_data_value() {
            target
                .rasterband(band_index)?
                .set_no_data_value(Some(nodata))
                .context("Failed to set no data value")?;
        }
    }
    Ok(target)
}

/// Crops a dataset to the given bounds (in the dataset's CRS), returning an
/// in-memory dataset on the same grid.
pub fn crop_to_bounds(src: &Dataset, bounds: &Bounds) -> Result<Dataset> {
    let geo_transform = src.geo_transform().context("Raster has no geo transform")?;
    let window = clamped_window(&geo_transform, src.raster_size(), bounds)
        .context("Raster does not intersect the crop bounds")?;

    let target = prepare_target(src, &window)?;
    copy_windows(
        src,
        &target,
        (window.col_start, window.row_start),
        (window.cols, window.rows),
        (0, 0),
    )?;
    Ok(target)
}

/// Regrids a dataset onto the given bounds keeping its CRS and resolution.
/// Pixels outside the source raster are filled with the nodata value.
pub fn regrid_to_bounds(src: &Dataset, bounds: &Bounds) -> Result<Dataset> {
    let geo_transform = src.geo_transform().context("Raster has no geo transform")?;
    let window = bounds_window(&geo_transform, bounds);
    if window.cols == 0 || window.rows == 0 {
        anyhow::bail!("Regrid bounds collapse to an empty raster");
    }

    let target = prepare_target(src, &window)?;
    for band_index in 1..=src.raster_count() {
        if let Some(nodata) = src.rasterband(band_index)?.no_data_value() {
            target
                .rasterband(band_index)?
                .fill(nodata, None)
                .context("Failed to fill band with nodata")?;
        }
    }

    // Overlap between the target window and the source raster.
    let (src_cols, src_rows) = src.raster_size();
    let col_start = window.col_start.max(0);
    let row_start = window.row_start.max(0);
    let col_end = (window.col_start + window.cols as isize).min(src_cols as isize);
    let row_end = (window.row_start + window.rows as isize).min(src_rows as isize);
    if col_end > col_start && row_end > row_start {
        copy_windows(
            src,
            &target,
            (col_start, row_start),
            (
                (col_end - col_start) as usize,
                (row_end - row_start) as usize,
            ),
            (col_start - window.col_start, row_start - window.row_start),
        )?;
    }
    Ok(target)
}

/// Encodes a dataset as a COG at `output_path`. Remote outputs are staged
/// in a temporary directory and uploaded.
pub fn write_cog(src: &Dataset, output_path: &str) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("COG").context("Failed to get COG driver")?;
    let options = RasterCreationOptions::from_iter(["OVERVIEW_RESAMPLING=NEAREST"]);

    if paths::is_local_path(output_path) {
        src.create_copy(&driver, Path::new(output_path), &options)
            .with_context(|| format!("Failed to write COG {output_path}"))?;
        return Ok(());
    }

    let staging_dir = tempfile::tempdir().context("Failed to create staging directory")?;
    let staging_path = staging_dir.path().join(paths::file_name(output_path));
    let staged = src
        .create_copy(&driver, &staging_path, &options)
        .with_context(|| format!("Failed to write COG {}", staging_path.display()))?;
    // Close the dataset so the file is flushed before reading it back.
    drop(staged);

    let bytes = std::fs::read(&staging_path)
        .with_context(|| format!("Failed to read staged COG {}", staging_path.display()))?;
    tracing::info!("Uploading {} to {output_path}", staging_path.display());
    fs::put_object(output_path, &bytes, "image/tiff")?;
    Ok(())
}

/// Crops a raster to the Africa extent and writes it as a COG.
pub fn crop_geotiff(img_path: &str, output_path: &str) -> Result<()> {
    let src = open_raster(img_path)?;
    let bounds = africa_bounds_in(&src)?;
    let cropped = crop_to_bounds(&src, &bounds)?;
    write_cog(&cropped, output_path)?;
    tracing::info!("Cropped geotiff written to {output_path}");
    Ok(())
}

/// Regrids a raster onto the Africa extent on its own grid and writes it
/// as a COG.
pub fn reproject_geotiff(img_path: &str, output_path: &str) -> Result<()> {
    let src = open_raster(img_path)?;
    let bounds = africa_bounds_in(&src)?;
    let regridded = regrid_to_bounds(&src, &bounds)?;
    write_cog(&regridded, output_path)?;
    tracing::info!("Cropped geotiff written to {output_path}");
    Ok(())
}

/// COG-encodes a raster without changing its grid.
pub fn cog_encode(img_path: &str, output_path: &str) -> Result<()> {
    let src = open_raster(img_path)?;
    write_cog(&src, output_path)?;
    tracing::info!("File {output_path} cloud optimised successfully");
    Ok(())
}

/// Name of a band data type, lowercase as used in product definitions.
pub fn dtype_name(data_type: GdalDataType) -> Result<&'static str> {
    Ok(match data_type {
        GdalDataType::UInt8 => "uint8",
        GdalDataType::UInt16 => "uint16",
        GdalDataType::Int16 => "int16",
        GdalDataType::UInt32 => "uint32",
        GdalDataType::Int32 => "int32",
        GdalDataType::Float32 => "float32",
        GdalDataType::Float64 => "float64",
        other => anyhow::bail!("Unsupported raster data type {other:?}"),
    })
}

/// Storage parameters of a raster, stringified for the indexing report.
/// Unset values are recorded as the string `None`.
pub fn storage_parameters(path: &str) -> Result<BTreeMap<String, String>> {
    let dataset = open_raster(path)?;
    let geo_transform = dataset
        .geo_transform()
        .context("Raster has no geo transform")?;
    let srs = dataset
        .spatial_ref()
        .context("Raster has no spatial reference")?;
    let epsg = srs.auth_code().context("Raster CRS has no EPSG code")?;
    let band = dataset.rasterband(1).context("Failed to get band 1")?;

    let stringify = |value: Option<f64>| match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    };

    let mut parameters = BTreeMap::new();
    parameters.insert("crs".to_string(), format!("EPSG:{epsg}"));
    parameters.insert("res_x".to_string(), geo_transform[1].to_string());
    parameters.insert("res_y".to_string(), geo_transform[5].to_string());
    parameters.insert("add_offset".to_string(), stringify(band.offset()));
    parameters.insert("scale_factor".to_string(), stringify(band.scale()));
    parameters.insert(
        "dtype".to_string(),
        dtype_name(band.band_type())?.to_string(),
    );
    parameters.insert("nodata".to_string(), stringify(band.no_data_value()));
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::raster::Buffer;
    use std::sync::Once;
    use tempfile::TempDir;

    static INIT: Once = Once::new();

    fn init_gdal() -> bool {
        INIT.call_once(|| {});
        DriverManager::get_driver_by_name("GTiff").is_ok()
            && DriverManager::get_driver_by_name("MEM").is_ok()
    }

    // 10x10 float32 raster over x 0..10, y 0..10, value = row * 10 + col.
    fn create_test_raster(dir: &TempDir) -> String {
        let path = dir.path().join("test.tif");
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<f32, _>(&path, 10, 10, 1)
            .unwrap();
        dataset
            .set_geo_transform(&[0.0, 1.0, 0.0, 10.0, 0.0, -1.0])
            .unwrap();
        let srs = SpatialRef::from_epsg(4326).unwrap();
        dataset.set_projection(&srs.to_wkt().unwrap()).unwrap();

        let values: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let mut band = dataset.rasterband(1).unwrap();
        band.set_no_data_value(Some(-9999.0)).unwrap();
        let mut buffer = Buffer::new((10, 10), values);
        band.write((0, 0), (10, 10), &mut buffer).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_bounds_window() {
        let geo_transform = [0.0, 1.0, 0.0, 10.0, 0.0, -1.0];
        let window = bounds_window(&geo_transform, &Bounds::new(2.5, 2.5, 7.5, 7.5));
        assert_eq!(
            window,
            PixelWindow {
                col_start: 2,
                row_start: 2,
                cols: 6,
                rows: 6
            }
        );

        // Bounds wider than the raster produce negative starts.
        let window = bounds_window(&geo_transform, &Bounds::new(-2.0, -2.0, 12.0, 12.0));
        assert_eq!(window.col_start, -2);
        assert_eq!(window.row_start, -2);
        assert_eq!((window.cols, window.rows), (14, 14));
    }

    #[test]
    fn test_clamped_window() {
        let geo_transform = [0.0, 1.0, 0.0, 10.0, 0.0, -1.0];
        let window =
            clamped_window(&geo_transform, (10, 10), &Bounds::new(-2.0, -2.0, 12.0, 12.0))
                .unwrap();
        assert_eq!(
            window,
            PixelWindow {
                col_start: 0,
                row_start: 0,
                cols: 10,
                rows: 10
            }
        );

        assert!(
            clamped_window(&geo_transform, (10, 10), &Bounds::new(20.0, 20.0, 30.0, 30.0))
                .is_none()
        );
    }

    #[test]
    fn test_crop_to_bounds() {
        if !init_gdal() {
            eprintln!("Skipping test: GDAL drivers not available");
            return;
        }
        let tmp_dir = TempDir::new().unwrap();
        let src = Dataset::open(create_test_raster(&tmp_dir)).unwrap();

        let cropped = crop_to_bounds(&src, &Bounds::new(2.5, 2.5, 7.5, 7.5)).unwrap();
        assert_eq!(cropped.raster_size(), (6, 6));

        let geo_transform = cropped.geo_transform().unwrap();
        assert_eq!(geo_transform[0], 2.0);
        assert_eq!(geo_transform[3], 8.0);

        // Top-left pixel of the crop is source pixel (2, 2).
        let band = cropped.rasterband(1).unwrap();
        let buffer = band.read_as::<f32>((0, 0), (1, 1), (1, 1), None).unwrap();
        assert_eq!(buffer.data()[0], 22.0);
    }

    #[test]
    fn test_regrid_to_bounds_pads_with_nodata() {
        if !init_gdal() {
            eprintln!("Skipping test: GDAL drivers not available");
            return;
        }
        let tmp_dir = TempDir::new().unwrap();
        let src = Dataset::open(create_test_raster(&tmp_dir)).unwrap();

        let regridded = regrid_to_bounds(&src, &Bounds::new(-2.0, -2.0, 12.0, 12.0)).unwrap();
        assert_eq!(regridded.raster_size(), (14, 14));

        let geo_transform = regridded.geo_transform().unwrap();
        assert_eq!(geo_transform[0], -2.0);
        assert_eq!(geo_transform[3], 12.0);

        let band = regridded.rasterband(1).unwrap();
        assert_eq!(band.no_data_value(), Some(-9999.0));

        // Padding carries nodata, the source origin lands at offset (2, 2).
        let padded = band.read_as::<f32>((0, 0), (1, 1), (1, 1), None).unwrap();
        assert_eq!(padded.data()[0], -9999.0);
        let origin = band.read_as::<f32>((2, 2), (1, 1), (1, 1), None).unwrap();
        assert_eq!(origin.data()[0], 0.0);
    }

    #[test]
    fn test_write_cog() {
        if !init_gdal() {
            eprintln!("Skipping test: GDAL drivers not available");
            return;
        }
        if DriverManager::get_driver_by_name("COG").is_err() {
            eprintln!("Skipping test: COG driver not available");
            return;
        }
        let tmp_dir = TempDir::new().unwrap();
        let src = Dataset::open(create_test_raster(&tmp_dir)).unwrap();
        let output_path = tmp_dir.path().join("cog.tif");

        write_cog(&src, &output_path.to_string_lossy()).unwrap();

        let written = Dataset::open(&output_path).unwrap();
        assert_eq!(written.raster_size(), (10, 10));
        assert_eq!(
            written.rasterband(1).unwrap().no_data_value(),
            Some(-9999.0)
        );
    }

    #[test]
    fn test_read_grid() {
        if !init_gdal() {
            eprintln!("Skipping test: GDAL drivers not available");
            return;
        }
        let tmp_dir = TempDir::new().unwrap();
        let path = create_test_raster(&tmp_dir);

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid.shape, [10, 10]);
        assert_eq!(
            grid.transform,
            [1.0, 0.0, 0.0, 0.0, -1.0, 10.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(grid.crs, "epsg:4326");
        assert_eq!(grid.bounds, Bounds::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_storage_parameters() {
        if !init_gdal() {
            eprintln!("Skipping test: GDAL drivers not available");
            return;
        }
        let tmp_dir = TempDir::new().unwrap();
        let path = create_test_raster(&tmp_dir);

        let parameters = storage_parameters(&path).unwrap();
        assert_eq!(parameters["crs"], "EPSG:4326");
        assert_eq!(parameters["res_x"], "1");
        assert_eq!(parameters["res_y"], "-1");
        assert_eq!(parameters["dtype"], "float32");
        assert_eq!(parameters["nodata"], "-9999");
        assert_eq!(parameters["add_offset"], "None");
        assert_eq!(parameters["scale_factor"], "None");
    }

    #[test]
    fn test_gdal_path() {
        assert_eq!(gdal_path("/local/file.tif"), "/local/file.tif");
        assert_eq!(
            gdal_path("gs://bucket/key.tif"),
            "/vsicurl/https://storage.googleapis.com/bucket/key.tif"
        );
        assert_eq!(
            gdal_path("s3://bucket/key.tif"),
            "/vsicurl/https://bucket.s3.af-south-1.amazonaws.com/key.tif"
        );
        assert_eq!(
            gdal_path("https://host/key.tif"),
            "/vsicurl/https://host/key.tif"
        );
    }
}
