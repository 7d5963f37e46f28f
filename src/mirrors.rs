//! The list of download mirrors.

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;

/// Reads the mirrors from `files`.
///
/// Each file lists one mirror per line.  Files that do not exist
/// are skipped.  The result is in order of first appearance, without
/// duplicates.
pub fn load_mirrors(files: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    let mut mirrors: Vec<String> = Vec::new();
    for file in files {
        let contents = match fs::read_to_string(file) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err).with_context(
                || format!("Reading mirrors from {}", file.display())),
        };

        for mirror in contents.lines().map(str::trim) {
            if mirror.is_empty() {
                continue;
            }
            if ! mirrors.iter().any(|m| m == mirror) {
                mirrors.push(mirror.into());
            }
        }
    }
    Ok(mirrors)
}
