// Configuration types for mundi-reflect, deserialized from mundi-reflect.toml.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CodegenError, CodegenResult};

/// Top-level config file.
#[derive(Debug, Deserialize)]
pub struct ReflectConfig {
    pub codegen: CodegenConfig,
    #[serde(default)]
    pub project: Option<ProjectConfig>,
}

#[derive(Debug, Deserialize)]
pub struct CodegenConfig {
    /// Scanned recursively for `*.h`.
    pub source_root: String,
    /// Header holding the `ADD_PROPERTY_*` macro definitions.
    pub macro_header: String,
    pub generated_out: String,
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    /// Directory names skipped during discovery, on top of the built-in ones.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    #[serde(default)]
    pub parallel: ParallelConfig,
}

fn default_cache_file() -> String {
    "Generated/.reflect_cache.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParallelConfig {
    /// Below this many headers, parse on the calling thread.
    #[serde(default = "default_min_files")]
    pub min_files: usize,
    /// Worker threads; 0 lets rayon decide.
    #[serde(default)]
    pub workers: usize,
}

fn default_min_files() -> usize {
    8
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self { min_files: default_min_files(), workers: 0 }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Visual Studio project receiving the generated files.
    pub vcxproj: String,
    /// Filters file; defaults to `<vcxproj>.filters`.
    #[serde(default)]
    pub filters: Option<String>,
}

/// Config paths resolved against the config file's directory.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub source_root: PathBuf,
    pub macro_header: PathBuf,
    pub generated_out: PathBuf,
    pub cache_file: PathBuf,
    pub vcxproj: Option<PathBuf>,
    pub filters: Option<PathBuf>,
}

impl ReflectConfig {
    pub fn load(path: &Path) -> CodegenResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CodegenError::read(path, e))?;
        Self::from_toml(&text, path)
    }

    /// Parse config text; `origin` only labels errors.
    pub fn from_toml(text: &str, origin: &Path) -> CodegenResult<Self> {
        toml::from_str(text).map_err(|source| CodegenError::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn resolve(&self, config_dir: &Path) -> ResolvedPaths {
        let codegen = &self.codegen;
        let vcxproj = self.project.as_ref().map(|p| config_dir.join(&p.vcxproj));
        let filters = self.project.as_ref().map(|p| match &p.filters {
            Some(filters) => config_dir.join(filters),
            None => config_dir.join(format!("{}.filters", p.vcxproj)),
        });
        ResolvedPaths {
            source_root: config_dir.join(&codegen.source_root),
            macro_header: config_dir.join(&codegen.macro_header),
            generated_out: config_dir.join(&codegen.generated_out),
            cache_file: config_dir.join(&codegen.cache_file),
            vcxproj,
            filters,
        }
    }
}

/// Directory the config's relative paths hang off.
///
/// `Path::parent` of a bare file name is the empty path, so fall back to `.`.
pub fn config_dir(config_path: &Path) -> PathBuf {
    let parent = match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf())
}
