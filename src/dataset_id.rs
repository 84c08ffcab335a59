//! Deterministic dataset identifiers.
//!
//! A dataset's UUID is a name-based (version 5) UUID over the algorithm
//! name, version and source ids that produced it. Re-running a pipeline
//! over the same inputs therefore derives the same ids, which is what lets
//! repeated indexing runs stay idempotent.

use std::collections::BTreeMap;

use uuid::Uuid;

/// Namespace under which every dataset UUID is derived.
pub const ODC_UUID_NAMESPACE: Uuid = Uuid::from_u128(0x6f34_c6f4_13d6_43c0_8e4e_42b6_c132_03af);

/// Derives the stable UUID of a dataset from the algorithm that produced
/// it, the algorithm version and the source identifiers.
pub fn odc_uuid<S: AsRef<str>>(
    algorithm: &str,
    algorithm_version: &str,
    sources: impl IntoIterator<Item = S>,
) -> Uuid {
    odc_uuid_with(algorithm, algorithm_version, sources, "", &BTreeMap::new())
}

/// [`odc_uuid`] with an explicit deployment id and extra `key=value` tags.
///
/// Sources and tags are sorted before hashing and every component is
/// lower-cased, so neither iteration order nor letter case changes the
/// result.
pub fn odc_uuid_with<S: AsRef<str>>(
    algorithm: &str,
    algorithm_version: &str,
    sources: impl IntoIterator<Item = S>,
    deployment_id: &str,
    tags: &BTreeMap<String, String>,
) -> Uuid {
    let mut parts: Vec<String> = vec![
        algorithm.to_string(),
        algorithm_version.to_string(),
        deployment_id.to_string(),
    ];

    let mut tag_parts: Vec<String> = tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
    tag_parts.sort();
    parts.extend(tag_parts);

    let mut source_parts: Vec<String> = sources
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    source_parts.sort();
    parts.extend(source_parts);

    let name = parts
        .iter()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");
    Uuid::new_v5(&ODC_UUID_NAMESPACE, name.as_bytes())
}
