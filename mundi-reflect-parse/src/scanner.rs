// Header scanner: finds reflection markers in one header's text and recovers
// the raw declarations that follow them.
//
// Works on comment-stripped text. Marker argument lists are extracted by
// counting parentheses; the declaration after a marker is recovered with a
// single anchored pattern.

use std::sync::LazyLock;

use mundi_reflect_markers::{
    CLASS_MARKER, ENUM_MARKER, FUNCTION_MARKER, META_DESCRIPTION, META_DISPLAY_NAME,
    PROPERTY_MARKER, REFLECTION_BODY_MARKER, STRUCT_MARKER,
};
use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::metadata::parse_metadata;
use crate::model::{normalize_type, ClassKind, EnumEntity};
use crate::text::{
    advance_chars, extract_balanced, extract_balanced_parens, is_commented_out, split_top_level,
    strip_comments,
};

/// How far past a property marker the declaration may start.
const PROPERTY_LOOKAHEAD_CHARS: usize = 200;

/// Underlying type of an `enum class` declared without one.
const DEFAULT_ENUM_UNDERLYING: &str = "uint8";

/// Specifiers dropped from the front of a recovered return type.
const RETURN_TYPE_SPECIFIERS: &[&str] = &["virtual", "static", "inline", "FORCEINLINE", "explicit"];

fn marker_regex(marker: &str) -> Regex {
    Regex::new(&format!(r"\b{}\s*\(", regex::escape(marker))).expect("marker regex")
}

static BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b{}\s*\(\s*\)", REFLECTION_BODY_MARKER)).expect("body marker regex")
});
static CLASS_START_RE: LazyLock<Regex> = LazyLock::new(|| marker_regex(CLASS_MARKER));
static STRUCT_START_RE: LazyLock<Regex> = LazyLock::new(|| marker_regex(STRUCT_MARKER));
static PROPERTY_START_RE: LazyLock<Regex> = LazyLock::new(|| marker_regex(PROPERTY_MARKER));
static FUNCTION_START_RE: LazyLock<Regex> = LazyLock::new(|| marker_regex(FUNCTION_MARKER));
static ENUM_START_RE: LazyLock<Regex> = LazyLock::new(|| marker_regex(ENUM_MARKER));

static CLASS_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bclass\s+(?:\w+_API\s+)?(\w+)\s*(?:final\s*)?:\s*public\s+(\w+)")
        .expect("class declaration regex")
});
static STRUCT_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bstruct\s+(?:\w+_API\s+)?(\w+)").expect("struct declaration regex")
});
static PROPERTY_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([\w<>*&:,\s]+?)\s*\b(\w+)\s*(?:[;=]|\{[^}]*\};?)")
        .expect("property tail regex")
});
static FUNCTION_HEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^;{}()]*?)\s*\b(\w+)\s*\(").expect("function head regex")
});
static FUNCTION_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(const\b)?\s*(?:(?:override|final|noexcept)\b\s*)*(?:[;{]|=\s*0\s*;)")
        .expect("function tail regex")
});
static ENUM_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*enum\s+class\s+(\w+)\s*(?::\s*(\w+))?\s*\{").expect("enum declaration regex")
});
static ENUM_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)(?:\s*=\s*(-?\s*\w+))?").expect("enum item regex")
});

// ---------------------------------------------------------------------------
// Scan output
// ---------------------------------------------------------------------------

/// The `class Name : public Parent` (or `struct Name`) following the
/// class-level marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub name: String,
    /// Empty for structs.
    pub parent_name: String,
    pub kind: ClassKind,
    /// Raw argument text of the `UCLASS(...)` / `USTRUCT(...)` marker.
    pub metadata_string: String,
}

/// `UPROPERTY(metadata) type identifier;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    pub metadata_string: String,
    pub type_string: String,
    pub identifier: String,
}

/// `UFUNCTION(metadata) return_type name(parameters) [const];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFunction {
    pub metadata_string: String,
    pub return_type: String,
    pub name: String,
    pub parameters_string: String,
    pub is_const: bool,
}

/// Everything the scanner found in one header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScannedHeader {
    /// `None` for headers that only declare enums.
    pub class_header: Option<ClassHeader>,
    pub properties: Vec<RawDeclaration>,
    pub functions: Vec<RawFunction>,
    pub enums: Vec<EnumEntity>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Scan one header.
///
/// Returns `Ok(None)` when the header carries neither the reflection body
/// marker nor an enum marker, or when a class-level marker is not followed by
/// a recognisable class/struct declaration.
pub fn scan(header_text: &str) -> ParseResult<Option<ScannedHeader>> {
    let text = strip_comments(header_text);

    let has_body = BODY_RE.is_match(&text);
    let has_enum = live_markers(&ENUM_START_RE, &text).next().is_some();
    if !has_body && !has_enum {
        return Ok(None);
    }

    let enums = scan_enums(&text)?;
    if !has_body {
        return Ok(Some(ScannedHeader { enums, ..ScannedHeader::default() }));
    }

    let Some(class_header) = scan_class_header(&text)? else {
        return Ok(None);
    };

    Ok(Some(ScannedHeader {
        class_header: Some(class_header),
        properties: scan_properties(&text)?,
        functions: scan_functions(&text)?,
        enums,
    }))
}

/// Marker matches that are not inside a comment.
fn live_markers<'t>(re: &'t Regex, text: &'t str) -> impl Iterator<Item = regex::Match<'t>> + 't {
    re.find_iter(text).filter(move |m| !is_commented_out(text, m.start()))
}

/// Argument text of the marker match `m` and the byte index past its `)`.
fn marker_args<'t>(
    text: &'t str,
    m: &regex::Match<'_>,
    marker: &'static str,
) -> ParseResult<(&'t str, usize)> {
    extract_balanced_parens(text, m.end())
        .ok_or(ParseError::UnbalancedParens { marker, offset: m.start() })
}

// ---------------------------------------------------------------------------
// Class / struct header
// ---------------------------------------------------------------------------

fn scan_class_header(text: &str) -> ParseResult<Option<ClassHeader>> {
    if let Some(m) = live_markers(&CLASS_START_RE, text).next() {
        let (args, end) = marker_args(text, &m, CLASS_MARKER)?;
        return Ok(CLASS_DECL_RE.captures(&text[end..]).map(|caps| ClassHeader {
            name: caps[1].to_string(),
            parent_name: caps[2].to_string(),
            kind: ClassKind::Class,
            metadata_string: args.to_string(),
        }));
    }
    if let Some(m) = live_markers(&STRUCT_START_RE, text).next() {
        let (args, end) = marker_args(text, &m, STRUCT_MARKER)?;
        return Ok(STRUCT_DECL_RE.captures(&text[end..]).map(|caps| ClassHeader {
            name: caps[1].to_string(),
            parent_name: String::new(),
            kind: ClassKind::Struct,
            metadata_string: args.to_string(),
        }));
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn scan_properties(text: &str) -> ParseResult<Vec<RawDeclaration>> {
    let mut out = Vec::new();
    for m in live_markers(&PROPERTY_START_RE, text) {
        let (args, end) = marker_args(text, &m, PROPERTY_MARKER)?;
        let window = &text[end..advance_chars(text, end, PROPERTY_LOOKAHEAD_CHARS)];
        if let Some(caps) = PROPERTY_TAIL_RE.captures(window) {
            out.push(RawDeclaration {
                metadata_string: args.to_string(),
                type_string: normalize_type(&caps[1]),
                identifier: caps[2].to_string(),
            });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

fn scan_functions(text: &str) -> ParseResult<Vec<RawFunction>> {
    let mut out = Vec::new();
    for m in live_markers(&FUNCTION_START_RE, text) {
        let (args, end) = marker_args(text, &m, FUNCTION_MARKER)?;
        let Some(head) = FUNCTION_HEAD_RE.captures(&text[end..]) else {
            continue;
        };
        let return_type = strip_specifiers(&head[1]);
        if return_type.is_empty() {
            continue;
        }
        let params_start = end + head.get(0).map_or(0, |g| g.end());
        let (params, params_end) = extract_balanced_parens(text, params_start).ok_or(
            ParseError::UnbalancedParens { marker: FUNCTION_MARKER, offset: m.start() },
        )?;
        let Some(tail) = FUNCTION_TAIL_RE.captures(&text[params_end..]) else {
            continue;
        };
        out.push(RawFunction {
            metadata_string: args.to_string(),
            return_type,
            name: head[2].to_string(),
            parameters_string: params.trim().to_string(),
            is_const: tail.get(1).is_some(),
        });
    }
    Ok(out)
}

fn strip_specifiers(return_type: &str) -> String {
    let kept: Vec<&str> = return_type
        .split_whitespace()
        .skip_while(|word| RETURN_TYPE_SPECIFIERS.contains(word))
        .collect();
    normalize_type(&kept.join(" "))
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

fn scan_enums(text: &str) -> ParseResult<Vec<EnumEntity>> {
    let mut out = Vec::new();
    for m in live_markers(&ENUM_START_RE, text) {
        let (args, end) = marker_args(text, &m, ENUM_MARKER)?;
        let Some(decl) = ENUM_DECL_RE.captures(&text[end..]) else {
            continue;
        };
        let body_start = end + decl.get(0).map_or(0, |g| g.end());
        let (body, _) = extract_balanced(text, body_start, b'{', b'}')
            .ok_or(ParseError::UnbalancedParens { marker: ENUM_MARKER, offset: m.start() })?;

        let meta = parse_metadata(args);
        out.push(EnumEntity {
            name: decl[1].to_string(),
            underlying_type: decl
                .get(2)
                .map_or(DEFAULT_ENUM_UNDERLYING, |g| g.as_str())
                .to_string(),
            values: enum_values(body),
            display_name: meta.get(META_DISPLAY_NAME).cloned().unwrap_or_default(),
            description: meta.get(META_DESCRIPTION).cloned().unwrap_or_default(),
        });
    }
    Ok(out)
}

/// Resolve item values: unassigned items take the running counter, an
/// explicit `= N` resets the counter to `N + 1`. Anything after the leading
/// name and value (`UMETA(..)`, trailing expressions) is ignored.
pub fn enum_values(body: &str) -> Vec<(String, i64)> {
    let mut values = Vec::new();
    let mut next = 0i64;
    for item in split_top_level(body) {
        let Some(caps) = ENUM_ITEM_RE.captures(item) else {
            continue;
        };
        let value = caps
            .get(2)
            .and_then(|v| parse_int_literal(v.as_str()))
            .unwrap_or(next);
        values.push((caps[1].to_string(), value));
        next = value.wrapping_add(1);
    }
    values
}

/// Decimal, `0x` hex and negative integer literals, with optional `u`/`l` suffixes.
fn parse_int_literal(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let digits = digits.trim_end_matches(['u', 'U', 'l', 'L']);
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}
