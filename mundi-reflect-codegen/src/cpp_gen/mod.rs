// C++ emission: turns classified entities into `.generated.h` / `.generated.cpp`.

pub mod header;
pub mod source;

use std::fs;
use std::path::{Path, PathBuf};

use mundi_reflect_markers::{GENERATED_HEADER_SUFFIX, GENERATED_SOURCE_SUFFIX};
use mundi_reflect_parse::{ClassEntity, ClassKind, ClassRole};

use crate::error::{CodegenError, CodegenResult};

/// One generated file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

/// Paths `render` would produce for `entity`, without building the text.
pub fn artifact_paths(entity: &ClassEntity, out_dir: &Path) -> Vec<PathBuf> {
    let source = out_dir.join(format!("{}{GENERATED_SOURCE_SUFFIX}", entity.name));
    if entity.kind == ClassKind::EnumOnly {
        return vec![source];
    }
    vec![out_dir.join(format!("{}{GENERATED_HEADER_SUFFIX}", entity.name)), source]
}

/// Render every artifact for one entity.
///
/// `source_header` is the file name of the header the entity came from; the
/// generated source includes it.
pub fn render(entity: &ClassEntity, role: ClassRole, source_header: &str, out_dir: &Path) -> Vec<Artifact> {
    let source_text = source::generate_source(entity, role, source_header);
    let mut paths = artifact_paths(entity, out_dir).into_iter();

    let mut artifacts = Vec::with_capacity(2);
    if entity.kind != ClassKind::EnumOnly {
        if let Some(path) = paths.next() {
            artifacts.push(Artifact { path, contents: header::generate_header(entity) });
        }
    }
    if let Some(path) = paths.next() {
        artifacts.push(Artifact { path, contents: source_text });
    }
    artifacts
}

/// Write `artifact` unless the file already holds the same text, so
/// untouched outputs keep their timestamps. Returns whether it wrote.
pub fn write_if_changed(artifact: &Artifact) -> CodegenResult<bool> {
    let needs_write = match fs::read(&artifact.path) {
        Ok(existing) => existing != artifact.contents.as_bytes(),
        Err(_) => true,
    };
    if needs_write {
        fs::write(&artifact.path, &artifact.contents)
            .map_err(|e| CodegenError::write(&artifact.path, e))?;
    }
    Ok(needs_write)
}

/// C++ string literal body: escapes backslashes, quotes and newlines.
pub(crate) fn escape_cpp(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
