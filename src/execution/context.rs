//! Build context packing.
//!
//! The engine receives the build context as a gzip-compressed tar stream.
//! Entries matched by `.dockerignore` are left out; only plain path prefixes
//! are understood (`target`, `node_modules/`, `dist/**`). Wildcard and
//! negation patterns are skipped.

use std::fs;
use std::path::{Component, Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder as TarBuilder;
use walkdir::WalkDir;

use crate::error::EngineError;

const DOCKERIGNORE: &str = ".dockerignore";

/// Packs `dir` into a gzip tar archive suitable as a Docker build context.
///
/// # Errors
///
/// Returns `EngineError::InvalidContext` if `dir` is not a directory or
/// `dockerfile` does not exist inside it.
pub fn pack_build_context(dir: &Path, dockerfile: &str) -> Result<Vec<u8>, EngineError> {
    if !dir.is_dir() {
        return Err(EngineError::InvalidContext(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let dockerfile_path = normalize(dockerfile);
    if !dir.join(&dockerfile_path).is_file() {
        return Err(EngineError::InvalidContext(format!(
            "{dockerfile} not found in {}",
            dir.display()
        )));
    }

    let exclude_patterns = read_dockerignore(dir)?;

    let enc = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = TarBuilder::new(enc);
    tar.follow_symlinks(false);

    let walker = WalkDir::new(dir).min_depth(1).into_iter().filter_entry(|entry| {
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        // The Dockerfile is always sent, even when ignored. Directories on
        // its path are kept so the walk reaches it; their other children
        // are still filtered.
        relative == dockerfile_path
            || (entry.file_type().is_dir() && dockerfile_path.starts_with(relative))
            || !is_excluded(&relative.to_string_lossy(), &exclude_patterns)
    });

    for entry in walker {
        let entry = entry.map_err(|e| EngineError::InvalidContext(e.to_string()))?;
        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);

        if entry.file_type().is_dir() {
            tar.append_dir(relative, path)?;
        } else {
            tar.append_path_with_name(path, relative)?;
        }
    }

    let enc = tar.into_inner()?;
    Ok(enc.finish()?)
}

/// Drops `.` components so `./Dockerfile` compares equal to `Dockerfile`.
/// Repeated separators are already collapsed by `Path::components`.
fn normalize(dockerfile: &str) -> PathBuf {
    Path::new(dockerfile)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn read_dockerignore(dir: &Path) -> Result<Vec<String>, EngineError> {
    let path = dir.join(DOCKERIGNORE);
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter(|line| !line.trim_end_matches("/**").contains('*'))
        .map(|line| {
            line.trim_end_matches("/**")
                .trim_start_matches("./")
                .trim_matches('/')
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect())
}

fn is_excluded(relative: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        relative == pattern
            || relative
                .strip_prefix(pattern.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}
