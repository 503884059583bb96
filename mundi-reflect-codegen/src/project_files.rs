// Visual Studio project patching: registers generated files in the
// `.vcxproj` and files them under a `Generated` filter in `.vcxproj.filters`.
//
// Edits are text splices so the rest of each file is left byte-for-byte
// alone. Running twice with the same files changes nothing the second time.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CodegenError, CodegenResult};

const GENERATED_FILTER: &str = "Generated";
const GENERATED_FILTER_GUID: &str = "{93995380-89BD-4b04-88EB-625FBE52EBFB}";

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<(ClCompile|ClInclude)\s+Include="([^"]+)""#).expect("project item regex"));
static FILTER_DECL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Filter\s+Include="([^"]+)""#).expect("filter declaration regex"));
static FILTER_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Filter>([^<]*)</Filter>").expect("filter value regex"));

/// A generated file as the project sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectItem {
    /// `ClCompile` or `ClInclude`.
    kind: &'static str,
    /// Project-relative, backslash separated.
    include: String,
}

fn project_items(project_dir: &Path, files: &[PathBuf]) -> Vec<ProjectItem> {
    files
        .iter()
        .filter_map(|file| {
            let kind = match file.extension()?.to_str()? {
                "cpp" => "ClCompile",
                "h" => "ClInclude",
                _ => return None,
            };
            let rel = file.strip_prefix(project_dir).unwrap_or(file);
            Some(ProjectItem { kind, include: rel.to_string_lossy().replace('/', "\\") })
        })
        .collect()
}

/// Item paths compare case-insensitively with either separator.
fn item_key(kind: &str, include: &str) -> (String, String) {
    (kind.to_string(), include.replace('/', "\\").to_ascii_lowercase())
}

fn newline_of(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Insert `lines` at the end of the first `<ItemGroup>` whose content matches
/// `group_pattern`, or in a new `<ItemGroup>` before `</Project>`.
fn insert_into_group(text: &mut String, group_pattern: &Regex, lines: &str, nl: &str) {
    if let Some(m) = group_pattern.find(text.as_str()) {
        if let Some(close) = text[m.end()..].find("</ItemGroup>") {
            let close = m.end() + close;
            let line_start = text[..close].rfind('\n').map_or(close, |i| i + 1);
            text.insert_str(line_start, lines);
            return;
        }
    }
    let group = format!("  <ItemGroup>{nl}{lines}  </ItemGroup>{nl}");
    match text.rfind("</Project>") {
        Some(end) => {
            let line_start = text[..end].rfind('\n').map_or(end, |i| i + 1);
            text.insert_str(line_start, &group);
        }
        None => text.push_str(&group),
    }
}

static COMPILE_PROBE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<ClCompile\s+Include=""#).expect("compile item regex"));
static INCLUDE_PROBE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<ClInclude\s+Include=""#).expect("include item regex"));

/// Finds the first item group holding `kind` items.
fn item_pattern(kind: &str) -> &'static Regex {
    if kind == "ClCompile" { &COMPILE_PROBE_RE } else { &INCLUDE_PROBE_RE }
}

// ---------------------------------------------------------------------------
// .vcxproj
// ---------------------------------------------------------------------------

/// Project text with every missing `files` entry added, or `None` when all
/// are already present.
pub fn add_project_items(text: &str, project_dir: &Path, files: &[PathBuf]) -> Option<String> {
    let existing: BTreeSet<(String, String)> = ITEM_RE
        .captures_iter(text)
        .map(|caps| item_key(&caps[1], &caps[2]))
        .collect();

    let mut seen = existing;
    let missing: Vec<ProjectItem> = project_items(project_dir, files)
        .into_iter()
        .filter(|item| seen.insert(item_key(item.kind, &item.include)))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let nl = newline_of(text);
    let mut out = text.to_string();
    for kind in ["ClCompile", "ClInclude"] {
        let lines: String = missing
            .iter()
            .filter(|item| item.kind == kind)
            .map(|item| format!("    <{kind} Include=\"{}\" />{nl}", item.include))
            .collect();
        if !lines.is_empty() {
            insert_into_group(&mut out, item_pattern(kind), &lines, nl);
        }
    }
    Some(out)
}

/// Patch the project file on disk. Returns whether it was rewritten.
pub fn patch_vcxproj(vcxproj: &Path, files: &[PathBuf]) -> CodegenResult<bool> {
    let text = fs::read_to_string(vcxproj).map_err(|e| CodegenError::read(vcxproj, e))?;
    let project_dir = vcxproj.parent().unwrap_or(Path::new("."));
    match add_project_items(&text, project_dir, files) {
        Some(patched) => {
            fs::write(vcxproj, patched).map_err(|e| CodegenError::write(vcxproj, e))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// .vcxproj.filters
// ---------------------------------------------------------------------------

/// Filters text with the `Generated` filter declared and every file assigned
/// to it, or `None` when nothing had to change.
pub fn add_filter_items(text: &str, project_dir: &Path, files: &[PathBuf]) -> Option<String> {
    let nl = newline_of(text);
    let mut out = text.to_string();

    let has_filter = FILTER_DECL_RE
        .captures_iter(&out)
        .any(|caps| &caps[1] == GENERATED_FILTER);
    if !has_filter {
        let decl = format!(
            "    <Filter Include=\"{GENERATED_FILTER}\">{nl}      <UniqueIdentifier>{GENERATED_FILTER_GUID}</UniqueIdentifier>{nl}    </Filter>{nl}"
        );
        insert_into_group(&mut out, &FILTER_DECL_RE, &decl, nl);
    }

    let mut added: BTreeSet<(String, String)> = BTreeSet::new();
    let mut missing: Vec<ProjectItem> = Vec::new();
    for item in project_items(project_dir, files) {
        if !added.insert(item_key(item.kind, &item.include)) {
            continue;
        }
        if !assign_existing(&mut out, &item, nl) {
            missing.push(item);
        }
    }

    for kind in ["ClCompile", "ClInclude"] {
        let lines: String = missing
            .iter()
            .filter(|item| item.kind == kind)
            .map(|item| filtered_element(item, nl))
            .collect();
        if !lines.is_empty() {
            insert_into_group(&mut out, item_pattern(kind), &lines, nl);
        }
    }

    (out != text).then_some(out)
}

fn filtered_element(item: &ProjectItem, nl: &str) -> String {
    let kind = item.kind;
    format!(
        "    <{kind} Include=\"{}\">{nl}      <Filter>{GENERATED_FILTER}</Filter>{nl}    </{kind}>{nl}",
        item.include
    )
}

/// Point an already listed item at the `Generated` filter. Returns false
/// when the item is not listed at all.
fn assign_existing(text: &mut String, item: &ProjectItem, nl: &str) -> bool {
    let kind = item.kind;
    let wanted = item_key(kind, &item.include);
    let found = ITEM_RE
        .captures_iter(text.as_str())
        .find(|caps| item_key(&caps[1], &caps[2]) == wanted)
        .and_then(|caps| Some((caps.get(0)?.range(), caps[2].to_string())));
    let Some((open, include)) = found else {
        return false;
    };

    let rest = &text[open.end..];
    let Some(gt) = rest.find('>') else {
        return true;
    };
    if rest[..gt].trim_end().ends_with('/') {
        // Self-closing: expand it in place.
        let expanded = format!(
            "<{kind} Include=\"{include}\">{nl}      <Filter>{GENERATED_FILTER}</Filter>{nl}    </{kind}>"
        );
        text.replace_range(open.start..open.end + gt + 1, &expanded);
        return true;
    }

    let Some(close) = rest.find(&format!("</{kind}>")) else {
        return true;
    };
    let (body_start, body_end) = (open.end, open.end + close);
    let filter = FILTER_VALUE_RE
        .captures(&text[body_start..body_end])
        .and_then(|caps| caps.get(1))
        .map(|m| (m.as_str() == GENERATED_FILTER, m.range()));
    match filter {
        Some((true, _)) => {}
        Some((false, value)) => {
            text.replace_range(body_start + value.start..body_start + value.end, GENERATED_FILTER);
        }
        None => {
            let line_start = text[..body_end].rfind('\n').map_or(body_end, |i| i + 1);
            text.insert_str(line_start, &format!("      <Filter>{GENERATED_FILTER}</Filter>{nl}"));
        }
    }
    true
}

/// Patch the filters file on disk. A missing filters file is skipped.
pub fn patch_filters(filters: &Path, project_dir: &Path, files: &[PathBuf]) -> CodegenResult<bool> {
    if !filters.exists() {
        eprintln!(
            "mundi-reflect: warning: filters file not found: {}",
            filters.display()
        );
        return Ok(false);
    }
    let text = fs::read_to_string(filters).map_err(|e| CodegenError::read(filters, e))?;
    match add_filter_items(&text, project_dir, files) {
        Some(patched) => {
            fs::write(filters, patched).map_err(|e| CodegenError::write(filters, e))?;
            Ok(true)
        }
        None => Ok(false),
    }
}
