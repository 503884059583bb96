// Header discovery: walks the source tree for reflectable headers.

use std::fs;
use std::path::{Path, PathBuf};

use mundi_reflect_markers::GENERATED_HEADER_SUFFIX;

/// Directories never scanned for headers.
const EXCLUDED_DIRS: &[&str] = &["Generated", "Binaries", "Intermediate", ".git", ".vs"];

/// All `*.h` files under `source_root`, sorted.
///
/// Generated headers, `generated_out` and directories named in
/// [`EXCLUDED_DIRS`] or `extra_excludes` are skipped. An unreadable directory
/// contributes nothing.
pub fn discover_headers(
    source_root: &Path,
    generated_out: &Path,
    extra_excludes: &[String],
) -> Vec<PathBuf> {
    let mut headers = Vec::new();
    collect_headers(source_root, generated_out, extra_excludes, &mut headers);
    headers.sort();
    headers
}

fn collect_headers(dir: &Path, generated_out: &Path, extra_excludes: &[String], out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if path.is_dir() {
            if EXCLUDED_DIRS.contains(&name.as_ref())
                || extra_excludes.iter().any(|e| e.as_str() == name)
                || path == generated_out
            {
                continue;
            }
            collect_headers(&path, generated_out, extra_excludes, out);
        } else if name.ends_with(".h") && !name.ends_with(GENERATED_HEADER_SUFFIX) {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scratch_dir;

    #[test]
    fn walks_tree_and_skips_generated_and_excluded() {
        let root = scratch_dir("discovery");
        let source = root.join("Source");
        let out = source.join("Out");
        for dir in ["Runtime/Engine", "ThirdParty/imgui", "Intermediate", "Out"] {
            fs::create_dir_all(source.join(dir)).unwrap();
        }
        for file in [
            "Runtime/Engine/Actor.h",
            "Runtime/Engine/Actor.cpp",
            "Runtime/Engine/Actor.generated.h",
            "Runtime/Pawn.h",
            "ThirdParty/imgui/imgui.h",
            "Intermediate/Temp.h",
            "Out/Stale.h",
        ] {
            fs::write(source.join(file), "").unwrap();
        }

        let headers = discover_headers(&source, &out, &["ThirdParty".to_string()]);
        let rel: Vec<PathBuf> = headers
            .iter()
            .map(|p| p.strip_prefix(&source).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![PathBuf::from("Runtime/Engine/Actor.h"), PathBuf::from("Runtime/Pawn.h")]
        );

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_root_yields_nothing() {
        let root = scratch_dir("discovery-missing").join("nope");
        assert!(discover_headers(&root, &root, &[]).is_empty());
    }
}
