// Incremental build cache: remembers, per header, when it was last rendered
// and which artifacts that produced.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{CodegenError, CodegenResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// SHA-256 of the header when it was recorded. Stored, not consulted.
    pub hash: String,
    pub modified: SystemTime,
    pub artifacts: Vec<PathBuf>,
}

/// Header path → last recorded state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildCache {
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

fn cache_key(header: &Path) -> String {
    header.to_string_lossy().into_owned()
}

impl BuildCache {
    /// Load the cache, or start empty when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&text) {
            Ok(cache) => cache,
            Err(e) => {
                eprintln!(
                    "mundi-reflect: warning: ignoring unreadable cache {}: {e}",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> CodegenResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| CodegenError::Cache {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CodegenError::write(parent, e))?;
        }
        fs::write(path, json).map_err(|e| CodegenError::write(path, e))
    }

    pub fn get(&self, header: &Path) -> Option<&CacheEntry> {
        self.entries.get(&cache_key(header))
    }

    pub fn record(&mut self, header: &Path, hash: &str, modified: SystemTime, artifacts: Vec<PathBuf>) {
        self.entries.insert(
            cache_key(header),
            CacheEntry { hash: hash.to_string(), modified, artifacts },
        );
    }

    /// True when `header` was recorded with exactly `modified` and every
    /// artifact it produced is still on disk.
    ///
    /// Content is not compared: a rewrite that keeps the old mtime is missed.
    pub fn is_unchanged(&self, header: &Path, modified: SystemTime) -> bool {
        match self.get(header) {
            Some(entry) => entry.modified == modified && entry.artifacts.iter().all(|a| a.exists()),
            None => false,
        }
    }

    /// Drop entries for headers not in `live` and return them, so their
    /// artifacts can be removed.
    pub fn prune<'a>(&mut self, live: impl IntoIterator<Item = &'a Path>) -> Vec<CacheEntry> {
        let keep: BTreeSet<String> = live.into_iter().map(cache_key).collect();
        let stale: Vec<String> = self.entries.keys().filter(|key| !keep.contains(*key)).cloned().collect();
        stale.iter().filter_map(|key| self.entries.remove(key)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scratch_dir;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn unchanged_only_on_equal_mtime() {
        let mut cache = BuildCache::default();
        let header = Path::new("/proj/Source/Lamp.h");
        cache.record(header, "abc", at(1_000), Vec::new());

        assert!(cache.is_unchanged(header, at(1_000)));
        // Same content, different mtime: still treated as changed.
        assert!(!cache.is_unchanged(header, at(1_001)));
        assert!(!cache.is_unchanged(Path::new("/proj/Source/Other.h"), at(1_000)));
    }

    #[test]
    fn missing_artifact_invalidates_entry() {
        let dir = scratch_dir("cache-artifacts");
        let artifact = dir.join("ALamp.generated.cpp");
        fs::write(&artifact, "").unwrap();

        let mut cache = BuildCache::default();
        let header = dir.join("Lamp.h");
        cache.record(&header, "abc", at(5), vec![artifact.clone()]);
        assert!(cache.is_unchanged(&header, at(5)));

        fs::remove_file(&artifact).unwrap();
        assert!(!cache.is_unchanged(&header, at(5)));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn save_load_and_prune() {
        let dir = scratch_dir("cache-save");
        let path = dir.join("Generated").join(".reflect_cache.json");
        let a = Path::new("/proj/A.h");
        let b = Path::new("/proj/B.h");

        let mut cache = BuildCache::default();
        cache.record(a, "aa", at(1), vec![PathBuf::from("/proj/Generated/A.generated.cpp")]);
        cache.record(b, "bb", at(2), Vec::new());
        cache.save(&path).unwrap();

        let mut loaded = BuildCache::load(&path);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(a), cache.get(a));

        let dropped = loaded.prune([a]);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].hash, "bb");
        assert!(loaded.get(b).is_none());
        assert_eq!(loaded.len(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_or_missing_file_is_empty() {
        let dir = scratch_dir("cache-corrupt");
        let path = dir.join("cache.json");
        assert!(BuildCache::load(&path).is_empty());
        fs::write(&path, "{ not json").unwrap();
        assert!(BuildCache::load(&path).is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }
}
