//! Anonymous access to public Google Cloud Storage buckets.
//!
//! Listing goes through the JSON API; object reads and writes use the plain
//! `storage.googleapis.com` endpoint.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::fs::http;
use crate::paths;

const JSON_API_BASE: &str = "https://storage.googleapis.com/storage/v1/b";

/// Client for public GCS buckets.
#[derive(Debug, Clone, Default)]
pub struct GcsStore;

impl GcsStore {
    pub fn new() -> Self {
        Self
    }

    fn object_url(&self, uri: &str) -> Result<String> {
        paths::gs_uri_to_https(uri).with_context(|| format!("Not a gs:// URI: {uri}"))
    }

    pub fn exists(&self, uri: &str) -> Result<bool> {
        http::head_ok(&self.object_url(uri)?)
    }

    /// True when at least one object sits under `uri` treated as a prefix.
    pub fn is_dir(&self, uri: &str) -> Result<bool> {
        let Some((bucket, key)) = paths::split_bucket_key(uri) else {
            bail!("Not a gs:// URI: {uri}");
        };
        let prefix = format!("{}/", key.trim_end_matches('/'));
        let page = list_page(bucket, &prefix, None, Some(1))?;
        Ok(!page.items.is_empty())
    }

    pub fn read(&self, uri: &str) -> Result<Vec<u8>> {
        http::get_bytes(&self.object_url(uri)?)
    }

    pub fn write(&self, uri: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        http::put_bytes(&self.object_url(uri)?, bytes.to_vec(), content_type, &[])
    }

    /// All object URIs under `uri`, in the lexicographic name order the API
    /// returns. Zero-byte directory markers are dropped.
    pub fn walk(&self, uri: &str) -> Result<Vec<String>> {
        let Some((bucket, key)) = paths::split_bucket_key(uri) else {
            bail!("Not a gs:// URI: {uri}");
        };
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{}/", key.trim_end_matches('/'))
        };

        let mut uris = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = list_page(bucket, &prefix, token.as_deref(), None)?;
            for item in page.items {
                if !item.name.ends_with('/') {
                    uris.push(format!("gs://{bucket}/{}", item.name));
                }
            }
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(uris)
    }
}

#[derive(Debug, Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectEntry>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

fn list_page(
    bucket: &str,
    prefix: &str,
    token: Option<&str>,
    max_results: Option<u32>,
) -> Result<ObjectList> {
    let endpoint = format!("{JSON_API_BASE}/{bucket}/o");
    let mut request = http::http_client()?
        .get(&endpoint)
        .query(&[("prefix", prefix), ("fields", "items(name),nextPageToken")]);
    if let Some(token) = token {
        request = request.query(&[("pageToken", token)]);
    }
    if let Some(max_results) = max_results {
        request = request.query(&[("maxResults", max_results.to_string().as_str())]);
    }
    let response = request
        .send()
        .with_context(|| format!("Failed to list gs://{bucket}/{prefix}"))?
        .error_for_status()
        .with_context(|| format!("Listing gs://{bucket}/{prefix} failed"))?;
    response
        .json()
        .with_context(|| format!("Failed to decode listing of gs://{bucket}/{prefix}"))
}
