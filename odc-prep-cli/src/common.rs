//! Argument types and helpers shared across the subcommands.

use anyhow::Result;
use clap::Args;
use odc_prep::fs::{self, FileSystem};
use tracing::info;

/// `--overwrite/--no-overwrite` flag pair. Skipping existing outputs is the
/// default; when both flags are given the last one wins.
#[derive(Args, Debug)]
pub struct OverwriteFlag {
    /// Replace outputs that already exist.
    #[arg(long, overrides_with = "no_overwrite")]
    overwrite: bool,

    /// Keep outputs that already exist and skip the work for them.
    #[arg(long)]
    no_overwrite: bool,
}

impl OverwriteFlag {
    pub fn enabled(&self) -> bool {
        self.overwrite && !self.no_overwrite
    }
}

/// Creates `dir` when it does not exist yet, logging the creation.
pub fn ensure_directory(dir: &str) -> Result<()> {
    if !fs::check_directory_exists(dir)? {
        FileSystem::for_path(dir)?.makedirs(dir)?;
        info!("Created the directory {dir}");
    }
    Ok(())
}

/// Appends the product name to `dir` unless its final component already
/// carries it.
pub fn with_product_leaf(dir: &str, product_name: &str) -> String {
    if odc_prep::paths::file_name(dir).contains(product_name) {
        dir.trim_end_matches('/').to_string()
    } else {
        odc_prep::paths::join(dir, &[product_name])
    }
}
