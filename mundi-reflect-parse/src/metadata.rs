// Marker argument lists → metadata dictionaries.
//
// `UPROPERTY(EditAnywhere, Category="Lighting", Tooltip="Light " "color")`
//   → { EditAnywhere: "true", Category: "Lighting", Tooltip: "Light color" }

use std::collections::BTreeMap;
use std::sync::LazyLock;

use mundi_reflect_markers::FLAG_VALUE;
use regex::Regex;

/// Parsed marker arguments, ordered by key.
pub type Metadata = BTreeMap<String, String>;

static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:((?:"[^"]*"\s*)+)|([\w.+\-]+))"#).expect("key/value regex")
});
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("quoted segment regex"));
static FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]\w*)\b").expect("flag regex"));

/// Parse a marker's argument text into a metadata dictionary.
///
/// Explicit `key=value` entries win over a bare flag of the same name.
pub fn parse_metadata(args: &str) -> Metadata {
    let mut explicit = Metadata::new();
    for caps in KEY_VALUE_RE.captures_iter(args) {
        let key = caps[1].to_string();
        let value = match (caps.get(2), caps.get(3)) {
            (Some(quoted), _) => join_quoted(quoted.as_str()),
            (None, Some(bare)) => bare.as_str().to_string(),
            (None, None) => continue,
        };
        explicit.insert(key, value);
    }

    let blanked = blank_quoted(args);
    let bytes = blanked.as_bytes();
    let mut meta = Metadata::new();
    for m in FLAG_RE.captures_iter(&blanked).filter_map(|c| c.get(1)) {
        if next_non_space(bytes, m.end()) == Some(b'=') || prev_non_space(bytes, m.start()) == Some(b'=') {
            continue;
        }
        meta.insert(m.as_str().to_string(), FLAG_VALUE.to_string());
    }
    meta.extend(explicit);
    meta
}

/// True when `key` is present as a bare flag (or explicitly set to `true`).
pub fn has_flag(meta: &Metadata, key: &str) -> bool {
    meta.get(key).is_some_and(|v| v.eq_ignore_ascii_case(FLAG_VALUE))
}

/// Adjacent string literals joined verbatim: `"a" "b"` → `ab`.
fn join_quoted(segments: &str) -> String {
    QUOTED_RE
        .captures_iter(segments)
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
        .collect()
}

/// Replace the contents of every string literal with spaces, preserving offsets.
fn blank_quoted(args: &str) -> String {
    let mut out = String::with_capacity(args.len());
    let mut in_quote = false;
    for ch in args.chars() {
        if ch == '"' {
            in_quote = !in_quote;
            out.push(ch);
        } else if in_quote {
            for _ in 0..ch.len_utf8() {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn next_non_space(bytes: &[u8], from: usize) -> Option<u8> {
    bytes[from..].iter().copied().find(|b| !b.is_ascii_whitespace())
}

fn prev_non_space(bytes: &[u8], before: usize) -> Option<u8> {
    bytes[..before].iter().rev().copied().find(|b| !b.is_ascii_whitespace())
}
