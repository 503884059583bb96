// Parse dispatch: runs the header parser over every discovered file, on a
// rayon pool when there are enough files to pay for it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use mundi_reflect_parse::{parse_header, ClassEntity, MacroRegistry};
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::config::ParallelConfig;
use crate::error::{CodegenError, CodegenResult};

/// One header after parsing. `entity` is `None` for unreflected headers.
#[derive(Debug, Clone)]
pub struct ParsedHeader {
    pub path: PathBuf,
    pub entity: Option<ClassEntity>,
    /// Hex SHA-256 of the file bytes.
    pub content_hash: String,
    pub modified: SystemTime,
}

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Successful parses, in input order.
    pub parsed: Vec<ParsedHeader>,
    pub failures: Vec<CodegenError>,
}

/// How a batch of headers is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Sequential,
    Pooled,
}

/// Batches smaller than `min_files` stay on the calling thread.
pub fn dispatch_mode(count: usize, parallel: &ParallelConfig) -> DispatchMode {
    if count < parallel.min_files {
        DispatchMode::Sequential
    } else {
        DispatchMode::Pooled
    }
}

/// Parse every path. A failing file is recorded in `failures` and never
/// stops the others.
///
/// The registry is shared read-only by all workers.
pub fn parse_headers(
    paths: &[PathBuf],
    registry: &MacroRegistry,
    parallel: &ParallelConfig,
) -> DispatchOutcome {
    let results = match dispatch_mode(paths.len(), parallel) {
        DispatchMode::Sequential => parse_sequential(paths, registry),
        DispatchMode::Pooled => parse_pooled(paths, registry, || {
            rayon::ThreadPoolBuilder::new().num_threads(parallel.workers).build()
        }),
    };
    collect_outcome(results)
}

/// Parse on the pool returned by `build_pool`, falling back to the calling
/// thread when the pool cannot be built.
fn parse_pooled<F>(
    paths: &[PathBuf],
    registry: &MacroRegistry,
    build_pool: F,
) -> Vec<CodegenResult<ParsedHeader>>
where
    F: FnOnce() -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError>,
{
    match build_pool() {
        Ok(pool) => pool.install(|| {
            paths.par_iter().map(|path| parse_one(path, registry)).collect()
        }),
        Err(e) => {
            eprintln!("mundi-reflect: warning: worker pool unavailable ({e}), parsing sequentially");
            parse_sequential(paths, registry)
        }
    }
}

fn collect_outcome(results: Vec<CodegenResult<ParsedHeader>>) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for result in results {
        match result {
            Ok(parsed) => outcome.parsed.push(parsed),
            Err(e) => outcome.failures.push(e),
        }
    }
    outcome
}

fn parse_sequential(paths: &[PathBuf], registry: &MacroRegistry) -> Vec<CodegenResult<ParsedHeader>> {
    paths.iter().map(|path| parse_one(path, registry)).collect()
}

/// Read, fingerprint and parse a single header.
pub fn parse_one(path: &Path, registry: &MacroRegistry) -> CodegenResult<ParsedHeader> {
    let bytes = fs::read(path).map_err(|e| CodegenError::read(path, e))?;
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| CodegenError::read(path, e))?;
    let content_hash = content_hash(&bytes);

    let text = String::from_utf8_lossy(&bytes);
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let entity = parse_header(&text, &stem, registry).map_err(|source| CodegenError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ParsedHeader { path: path.to_path_buf(), entity, content_hash, modified })
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
