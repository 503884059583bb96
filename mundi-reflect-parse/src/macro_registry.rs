// Macro registry: reads the engine's macro-definition header and learns which
// `ADD_PROPERTY_*` macro encodes which property kind.
//
// Only definitions of the shape
//   #define NAME(args) { ... Prop.Type = Namespace::Kind; ... }
// are recorded; every other `#define` is ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::text::strip_block_comments;

static CONTINUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[ \t]*\r?\n").expect("continuation regex"));
static DEFINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#[ \t]*define\s+(\w+)\s*\([^)]*\)\s*\{[^\n]*?Prop\.Type\s*=\s*(\w+)::(\w+)\s*;")
        .expect("define regex")
});

/// Kinds that denote containers or script files; they never match by type name.
const PATTERNLESS_KINDS: &[&str] = &["Array", "ScriptFile"];
/// Shader-resource-view kind and its fixed literal patterns.
const SRV_KIND: &str = "SRV";
const SRV_PATTERNS: &[&str] = &["ShaderResourceView", "SRV"];

/// One recognised property macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroEntry {
    pub macro_name: String,
    /// Kind named on the right of `Prop.Type = EPropertyType::<Kind>`.
    pub property_kind: String,
    pub type_name_patterns: Vec<String>,
}

impl MacroEntry {
    fn new(macro_name: &str, property_kind: &str) -> Self {
        Self {
            macro_name: macro_name.to_string(),
            property_kind: property_kind.to_string(),
            type_name_patterns: type_name_patterns(property_kind),
        }
    }
}

/// Type-name patterns deduced from a property kind.
///
/// `Texture` → `Texture, UTexture, UTextureBase, TextureBase`.
pub fn type_name_patterns(kind: &str) -> Vec<String> {
    if PATTERNLESS_KINDS.contains(&kind) {
        return Vec::new();
    }
    if kind == SRV_KIND {
        return SRV_PATTERNS.iter().map(|p| p.to_string()).collect();
    }
    vec![
        kind.to_string(),
        format!("U{kind}"),
        format!("U{kind}Base"),
        format!("{kind}Base"),
    ]
}

/// Registered property macros in definition order.
///
/// Built once per run and shared read-only by every header parse.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MacroRegistry {
    entries: Vec<MacroEntry>,
}

impl MacroRegistry {
    /// Parse a macro-definition header.
    ///
    /// A redefined macro keeps its first position and takes the later kind.
    pub fn parse(macro_header_text: &str) -> Self {
        let without_comments = strip_block_comments(macro_header_text);
        let joined = CONTINUATION_RE.replace_all(&without_comments, " ");

        let mut entries: Vec<MacroEntry> = Vec::new();
        for caps in DEFINE_RE.captures_iter(&joined) {
            let name = &caps[1];
            let kind = &caps[3];
            match entries.iter_mut().find(|e| e.macro_name == name) {
                Some(existing) => *existing = MacroEntry::new(name, kind),
                None => entries.push(MacroEntry::new(name, kind)),
            }
        }
        Self { entries }
    }

    pub fn get(&self, macro_name: &str) -> Option<&MacroEntry> {
        self.entries.iter().find(|e| e.macro_name == macro_name)
    }

    pub fn contains(&self, macro_name: &str) -> bool {
        self.get(macro_name).is_some()
    }

    /// Entries in definition order.
    pub fn entries(&self) -> &[MacroEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First macro (in definition order) with a pattern occurring in a
    /// pointer-shaped type string, compared case-insensitively.
    ///
    /// Two kinds whose patterns both match resolve by definition order only.
    pub fn macro_for_type(&self, cpp_type: &str) -> Option<&MacroEntry> {
        if !cpp_type.contains('*') {
            return None;
        }
        let lowered = cpp_type.to_ascii_lowercase();
        self.entries.iter().find(|entry| {
            entry
                .type_name_patterns
                .iter()
                .any(|pattern| lowered.contains(&pattern.to_ascii_lowercase()))
        })
    }
}
