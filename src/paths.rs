//! Path and URI classification.

/// Region used for public S3 endpoints when `AWS_REGION` is not set.
pub const DEFAULT_S3_REGION: &str = "af-south-1";

const GCS_HTTPS_PREFIX: &str = "https://storage.googleapis.com/";

/// Storage family of a path or URI, decided by scheme inspection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Local,
    S3,
    Gcs,
    Http,
}

/// Classifies `path` by its URI scheme. Paths without a scheme, and paths
/// with a scheme outside the known set, are treated as local.
pub fn classify(path: &str) -> PathKind {
    match scheme(path) {
        Some("s3") => PathKind::S3,
        Some("gs") | Some("gcs") => PathKind::Gcs,
        Some("http") | Some("https") => PathKind::Http,
        _ => PathKind::Local,
    }
}

fn scheme(path: &str) -> Option<&str> {
    let (scheme, _) = path.split_once("://")?;
    if !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        Some(scheme)
    } else {
        None
    }
}

pub fn is_s3_path(path: &str) -> bool {
    classify(path) == PathKind::S3
}

pub fn is_gcs_path(path: &str) -> bool {
    classify(path) == PathKind::Gcs
}

pub fn is_url(path: &str) -> bool {
    classify(path) == PathKind::Http
}

pub fn is_local_path(path: &str) -> bool {
    classify(path) == PathKind::Local
}

/// Bucket and key of an object-store URI, e.g. `s3://bucket/some/key`.
pub fn split_bucket_key(uri: &str) -> Option<(&str, &str)> {
    let (_, rest) = uri.split_once("://")?;
    match rest.split_once('/') {
        Some((bucket, key)) => Some((bucket, key)),
        None => Some((rest, "")),
    }
}

/// Public HTTPS endpoint of an S3 object.
pub fn s3_uri_to_public_url(uri: &str, region: &str) -> Option<String> {
    if !is_s3_path(uri) {
        return None;
    }
    let (bucket, key) = split_bucket_key(uri)?;
    Some(format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"))
}

/// Public HTTPS endpoint of a GCS object.
pub fn gs_uri_to_https(uri: &str) -> Option<String> {
    if !is_gcs_path(uri) {
        return None;
    }
    let (bucket, key) = split_bucket_key(uri)?;
    Some(format!("{GCS_HTTPS_PREFIX}{bucket}/{key}"))
}

/// Canonical `gs://` form of a public GCS URL; other URLs pass through.
pub fn https_to_gs_uri(url: &str) -> Option<String> {
    url.strip_prefix(GCS_HTTPS_PREFIX)
        .map(|rest| format!("gs://{rest}"))
}

/// Public HTTPS URL of a path, for backends that expose one. Local paths
/// have no public endpoint and return `None`.
pub fn as_public_url(path: &str) -> Option<String> {
    match classify(path) {
        PathKind::Http => Some(path.to_string()),
        PathKind::Gcs => gs_uri_to_https(path),
        PathKind::S3 => s3_uri_to_public_url(path, DEFAULT_S3_REGION),
        PathKind::Local => None,
    }
}

/// Joins path segments with `/`. Works for local paths and object URIs.
pub fn join(base: &str, segments: &[&str]) -> String {
    let mut out = base.trim_end_matches('/').to_string();
    for segment in segments {
        out.push('/');
        out.push_str(segment.trim_matches('/'));
    }
    out
}

/// Final component of a path or URI.
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Everything before the final component, without the trailing slash.
pub fn parent(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[..idx],
        None => "",
    }
}

/// File extensions treated as GeoTIFF rasters.
pub const GEOTIFF_EXTENSIONS: [&str; 3] = ["tif", "tiff", "gtiff"];

/// True when the final path component carries a GeoTIFF extension.
pub fn is_geotiff(path: &str) -> bool {
    match file_name(path).rsplit_once('.') {
        Some((_, ext)) => GEOTIFF_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)),
        None => false,
    }
}
