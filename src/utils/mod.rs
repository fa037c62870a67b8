//! Utility functions

use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(anyhow!("path exists but is not a directory: {:?}", path));
    }
    Ok(())
}
