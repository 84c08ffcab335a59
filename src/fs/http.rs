//! Shared blocking HTTP plumbing for the catalog client and object stores.

use std::fs::File;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::blocking::{Client, Response};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

static CLIENT: OnceLock<Client> = OnceLock::new();

/// Shared blocking client, built once per process.
pub fn http_client() -> Result<&'static Client> {
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("odc-prep/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    Ok(CLIENT.get_or_init(|| client))
}

fn get(url: &str) -> Result<Response> {
    let response = http_client()?
        .get(url)
        .send()
        .with_context(|| format!("Failed to request {url}"))?;
    response
        .error_for_status()
        .with_context(|| format!("Request to {url} failed"))
}

/// GET `url` into memory.
pub fn get_bytes(url: &str) -> Result<Vec<u8>> {
    let body = get(url)?
        .bytes()
        .with_context(|| format!("Failed to read response body from {url}"))?;
    Ok(body.to_vec())
}

/// GET `url` as text.
pub fn get_text(url: &str) -> Result<String> {
    get(url)?
        .text()
        .with_context(|| format!("Failed to read response body from {url}"))
}

/// GET `url` and deserialize the JSON body.
pub fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T> {
    get(url)?
        .json()
        .with_context(|| format!("Failed to decode JSON from {url}"))
}

/// Streams `url` into a local file without buffering the body in memory.
pub fn download_to(url: &str, target: &Path) -> Result<()> {
    let mut response = get(url)?;
    let mut file =
        File::create(target).with_context(|| format!("Failed to create {}", target.display()))?;
    response
        .copy_to(&mut file)
        .with_context(|| format!("Failed to download {url}"))?;
    Ok(())
}

/// True when a HEAD request for `url` succeeds.
pub fn head_ok(url: &str) -> Result<bool> {
    let response = http_client()?
        .head(url)
        .send()
        .with_context(|| format!("Failed to request {url}"))?;
    Ok(response.status().is_success())
}

/// `Last-Modified` header of `url`, when the server reports one.
pub fn get_last_modified(url: &str) -> Result<Option<DateTime<FixedOffset>>> {
    let response = http_client()?
        .head(url)
        .send()
        .with_context(|| format!("Failed to request {url}"))?;
    let parsed = response
        .headers()
        .get(reqwest::header::LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(|text| DateTime::parse_from_rfc2822(text).ok());
    Ok(parsed)
}

/// PUT `body` to `url` with the given content type and extra headers.
pub fn put_bytes(
    url: &str,
    body: Vec<u8>,
    content_type: &str,
    headers: &[(&str, &str)],
) -> Result<()> {
    let mut request = http_client()?
        .put(url)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .body(body);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = request
        .send()
        .with_context(|| format!("Failed to upload to {url}"))?;
    response
        .error_for_status()
        .with_context(|| format!("Upload to {url} failed"))?;
    Ok(())
}
