use ::odc_prep::eo3::format_datetime;
use ::odc_prep::identity;
use ::odc_prep::model::{DekadRange, IwmiTileId, WaporTileId, WorldCerealTileId};
use ::odc_prep::paths::{self, PathKind};
use ::odc_prep::{partition, select};
use pyo3::prelude::*;

#[pymodule]
fn odc_prep(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyWaporTileId>()?;
    m.add_class::<PyWorldCerealTileId>()?;
    m.add_class::<PyIwmiTileId>()?;
    m.add_class::<PyDekadRange>()?;
    m.add_function(wrap_pyfunction!(classify_path, m)?)?;
    m.add_function(wrap_pyfunction!(tile_id_from_path, m)?)?;
    m.add_function(wrap_pyfunction!(parse_wapor_tile_id, m)?)?;
    m.add_function(wrap_pyfunction!(parse_worldcereal_tile_id, m)?)?;
    m.add_function(wrap_pyfunction!(parse_iwmi_tile_id, m)?)?;
    m.add_function(wrap_pyfunction!(dekad, m)?)?;
    m.add_function(wrap_pyfunction!(month_range, m)?)?;
    m.add_function(wrap_pyfunction!(odc_uuid, m)?)?;
    m.add_function(wrap_pyfunction!(partition_tasks, m)?)?;
    m.add_function(wrap_pyfunction!(select_tasks, m)?)?;
    Ok(())
}

#[pyclass(name = "WaporTileId")]
#[derive(Clone)]
pub struct PyWaporTileId {
    #[pyo3(get)]
    pub tile_id: String,
    #[pyo3(get)]
    pub mapset_code: String,
    #[pyo3(get)]
    pub year: String,
    #[pyo3(get)]
    pub month: String,
    #[pyo3(get)]
    pub dekad_label: Option<String>,
}

impl From<WaporTileId> for PyWaporTileId {
    fn from(tile: WaporTileId) -> Self {
        PyWaporTileId {
            tile_id: tile.tile_id,
            mapset_code: tile.mapset_code,
            year: tile.year,
            month: tile.month,
            dekad_label: tile.dekad_label,
        }
    }
}

#[pymethods]
impl PyWaporTileId {
    fn __repr__(&self) -> String {
        format!(
            "WaporTileId(tile_id='{}', mapset_code='{}', year='{}', month='{}', dekad_label={:?})",
            self.tile_id, self.mapset_code, self.year, self.month, self.dekad_label
        )
    }
}

#[pyclass(name = "WorldCerealTileId")]
#[derive(Clone)]
pub struct PyWorldCerealTileId {
    #[pyo3(get)]
    pub tile_id: String,
    #[pyo3(get)]
    pub aez_id: String,
    #[pyo3(get)]
    pub season: String,
    #[pyo3(get)]
    pub product: String,
    #[pyo3(get)]
    pub start_date: String,
    #[pyo3(get)]
    pub end_date: String,
    #[pyo3(get)]
    pub measurement_kind: String,
}

impl From<WorldCerealTileId> for PyWorldCerealTileId {
    fn from(tile: WorldCerealTileId) -> Self {
        PyWorldCerealTileId {
            tile_id: tile.tile_id,
            aez_id: tile.aez_id,
            season: tile.season,
            product: tile.product,
            start_date: tile.start_date,
            end_date: tile.end_date,
            measurement_kind: tile.measurement_kind,
        }
    }
}

impl From<PyWorldCerealTileId> for WorldCerealTileId {
    fn from(py_tile: PyWorldCerealTileId) -> Self {
        WorldCerealTileId {
            tile_id: py_tile.tile_id,
            aez_id: py_tile.aez_id,
            season: py_tile.season,
            product: py_tile.product,
            start_date: py_tile.start_date,
            end_date: py_tile.end_date,
            measurement_kind: py_tile.measurement_kind,
        }
    }
}

#[pymethods]
impl PyWorldCerealTileId {
    /// Dataset name shared by the classification and confidence files.
    fn unique_name(&self) -> String {
        WorldCerealTileId::from(self.clone()).unique_name()
    }

    fn __repr__(&self) -> String {
        format!(
            "WorldCerealTileId(tile_id='{}', aez_id='{}', season='{}', product='{}', measurement_kind='{}')",
            self.tile_id, self.aez_id, self.season, self.product, self.measurement_kind
        )
    }
}

#[pyclass(name = "IwmiTileId")]
#[derive(Clone)]
pub struct PyIwmiTileId {
    #[pyo3(get)]
    pub tile_id: String,
    #[pyo3(get)]
    pub date: String,
}

impl From<IwmiTileId> for PyIwmiTileId {
    fn from(tile: IwmiTileId) -> Self {
        PyIwmiTileId {
            tile_id: tile.tile_id,
            date: tile.date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[pymethods]
impl PyIwmiTileId {
    fn __repr__(&self) -> String {
        format!("IwmiTileId(tile_id='{}', date='{}')", self.tile_id, self.date)
    }
}

#[pyclass(name = "DekadRange")]
#[derive(Clone)]
pub struct PyDekadRange {
    #[pyo3(get)]
    pub reference: String,
    #[pyo3(get)]
    pub start: String,
    #[pyo3(get)]
    pub end: String,
}

impl From<DekadRange> for PyDekadRange {
    fn from(range: DekadRange) -> Self {
        PyDekadRange {
            reference: format_datetime(range.reference),
            start: format_datetime(range.start),
            end: format_datetime(range.end),
        }
    }
}

#[pymethods]
impl PyDekadRange {
    fn __repr__(&self) -> String {
        format!(
            "DekadRange(reference='{}', start='{}', end='{}')",
            self.reference, self.start, self.end
        )
    }
}

#[pyfunction]
pub fn classify_path(path: &str) -> &'static str {
    match paths::classify(path) {
        PathKind::Local => "local",
        PathKind::S3 => "s3",
        PathKind::Gcs => "gcs",
        PathKind::Http => "http",
    }
}

#[pyfunction]
pub fn tile_id_from_path(path: &str) -> String {
    identity::tile_id_from_path(path)
}

#[pyfunction]
pub fn parse_wapor_tile_id(tile_id: &str) -> PyResult<PyWaporTileId> {
    let tile = identity::parse_wapor_tile_id(tile_id).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Failed to parse tile id: {}", e))
    })?;
    Ok(PyWaporTileId::from(tile))
}

#[pyfunction]
pub fn parse_worldcereal_tile_id(tile_id: &str) -> PyResult<PyWorldCerealTileId> {
    let tile = identity::parse_worldcereal_tile_id(tile_id).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Failed to parse tile id: {}", e))
    })?;
    Ok(PyWorldCerealTileId::from(tile))
}

#[pyfunction]
pub fn parse_iwmi_tile_id(tile_id: &str) -> PyResult<PyIwmiTileId> {
    let tile = identity::parse_iwmi_tile_id(tile_id).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Failed to parse tile id: {}", e))
    })?;
    Ok(PyIwmiTileId::from(tile))
}

#[pyfunction]
pub fn dekad(year: i32, month: u32, label: &str) -> PyResult<PyDekadRange> {
    let range = ::odc_prep::dekad::dekad(year, month, label).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid dekad: {}", e))
    })?;
    Ok(PyDekadRange::from(range))
}

#[pyfunction]
pub fn month_range(year: i32, month: u32) -> PyResult<PyDekadRange> {
    let range = ::odc_prep::dekad::month_range(year, month).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid month: {}", e))
    })?;
    Ok(PyDekadRange::from(range))
}

#[pyfunction]
pub fn odc_uuid(algorithm: &str, algorithm_version: &str, sources: Vec<String>) -> String {
    ::odc_prep::odc_uuid(algorithm, algorithm_version, sources).to_string()
}

#[pyfunction]
pub fn partition_tasks(tasks: Vec<String>, chunks: usize) -> Vec<Vec<String>> {
    partition(&tasks, chunks)
        .into_iter()
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[pyfunction]
pub fn select_tasks(tasks: Vec<String>, chunks: usize, worker_idx: usize) -> Option<Vec<String>> {
    let parts = partition(&tasks, chunks);
    select(&parts, worker_idx).map(|chunk| chunk.to_vec())
}
