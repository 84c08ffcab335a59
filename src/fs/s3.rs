//! Anonymous access to public S3 buckets over plain HTTPS.
//!
//! Listing uses the ListObjectsV2 REST API and parses the XML response
//! directly. Uploads are unsigned PUTs, which is sufficient for the public
//! ingestion buckets this pipeline targets.

use std::env;

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::fs::http;
use crate::paths::{self, DEFAULT_S3_REGION};

/// Canned ACL applied to every uploaded object.
pub const UPLOAD_ACL: &str = "bucket-owner-full-control";

/// Client for a single S3 region.
#[derive(Debug, Clone)]
pub struct S3Store {
    region: String,
}

impl Default for S3Store {
    fn default() -> Self {
        Self::new()
    }
}

impl S3Store {
    /// Store for the region named by `AWS_REGION`, falling back to
    /// [`DEFAULT_S3_REGION`].
    pub fn new() -> Self {
        let region = env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_S3_REGION.to_string());
        Self { region }
    }

    pub fn with_region(region: &str) -> Self {
        Self {
            region: region.to_string(),
        }
    }

    fn object_url(&self, uri: &str) -> Result<String> {
        paths::s3_uri_to_public_url(uri, &self.region)
            .with_context(|| format!("Not an s3:// URI: {uri}"))
    }

    fn bucket_endpoint(&self, bucket: &str) -> String {
        format!("https://{bucket}.s3.{}.amazonaws.com/", self.region)
    }

    pub fn exists(&self, uri: &str) -> Result<bool> {
        http::head_ok(&self.object_url(uri)?)
    }

    /// True when at least one object sits under `uri` treated as a prefix.
    pub fn is_dir(&self, uri: &str) -> Result<bool> {
        let Some((bucket, key)) = paths::split_bucket_key(uri) else {
            bail!("Not an s3:// URI: {uri}");
        };
        let prefix = directory_prefix(key);
        let page = self.list_page(bucket, &prefix, None, Some(1))?;
        Ok(!page.keys.is_empty())
    }

    pub fn read(&self, uri: &str) -> Result<Vec<u8>> {
        http::get_bytes(&self.object_url(uri)?)
    }

    /// Unsigned PUT with the bucket-owner ACL the catalog buckets expect.
    pub fn write(&self, uri: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        http::put_bytes(
            &self.object_url(uri)?,
            bytes.to_vec(),
            content_type,
            &[("x-amz-acl", UPLOAD_ACL)],
        )
    }

    /// All object URIs under `uri`, in the lexicographic key order the API
    /// returns. Zero-byte directory markers are dropped.
    pub fn walk(&self, uri: &str) -> Result<Vec<String>> {
        let Some((bucket, key)) = paths::split_bucket_key(uri) else {
            bail!("Not an s3:// URI: {uri}");
        };
        let prefix = directory_prefix(key);

        let mut uris = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list_page(bucket, &prefix, token.as_deref(), None)?;
            for key in page.keys {
                if !key.ends_with('/') {
                    uris.push(format!("s3://{bucket}/{key}"));
                }
            }
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(uris)
    }

    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<&str>,
        max_keys: Option<u32>,
    ) -> Result<ListPage> {
        let endpoint = self.bucket_endpoint(bucket);
        let mut request = http::http_client()?
            .get(&endpoint)
            .query(&[("list-type", "2"), ("prefix", prefix)]);
        if let Some(token) = token {
            request = request.query(&[("continuation-token", token)]);
        }
        if let Some(max_keys) = max_keys {
            request = request.query(&[("max-keys", max_keys.to_string().as_str())]);
        }
        let response = request
            .send()
            .with_context(|| format!("Failed to list s3://{bucket}/{prefix}"))?
            .error_for_status()
            .with_context(|| format!("Listing s3://{bucket}/{prefix} failed"))?;
        let xml = response
            .text()
            .with_context(|| format!("Failed to read listing of s3://{bucket}/{prefix}"))?;
        parse_list_page(&xml)
    }
}

fn directory_prefix(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!("{}/", key.trim_end_matches('/'))
    }
}

#[derive(Debug)]
struct ListPage {
    keys: Vec<String>,
    next_token: Option<String>,
}

enum ListField {
    Key,
    IsTruncated,
    NextToken,
}

/// Extracts object keys and the pagination token from a ListObjectsV2
/// response body.
fn parse_list_page(xml: &str) -> Result<ListPage> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut keys = Vec::new();
    let mut truncated = false;
    let mut token: Option<String> = None;
    let mut current: Option<ListField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                current = match start.name().as_ref() {
                    b"Key" => Some(ListField::Key),
                    b"IsTruncated" => Some(ListField::IsTruncated),
                    b"NextContinuationToken" => Some(ListField::NextToken),
                    _ => None,
                };
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .context("Failed to decode bucket listing XML")?;
                match current {
                    Some(ListField::Key) => keys.push(value.into_owned()),
                    Some(ListField::IsTruncated) => truncated = value.as_ref() == "true",
                    Some(ListField::NextToken) => token = Some(value.into_owned()),
                    None => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => bail!("Failed to parse bucket listing XML: {e}"),
            _ => {}
        }
    }

    let next_token = if truncated { token } else { None };
    Ok(ListPage { keys, next_token })
}
