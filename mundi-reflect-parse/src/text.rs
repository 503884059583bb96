// Low-level text helpers: comment stripping, balanced scanning, top-level splitting.

use std::sync::LazyLock;

use regex::Regex;

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex"));
static LINE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$").expect("line comment regex"));

/// Remove block comments (across lines) and then line comments.
///
/// Block comments go first so that a `//` inside `/* ... */` cannot eat the
/// closing delimiter.
pub fn strip_comments(text: &str) -> String {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(text, "");
    LINE_COMMENT_RE.replace_all(&without_blocks, "").into_owned()
}

/// Remove block comments only. Line comments are kept.
pub fn strip_block_comments(text: &str) -> String {
    BLOCK_COMMENT_RE.replace_all(text, "").into_owned()
}

/// True when the marker starting at `pos` sits inside a comment.
///
/// Checks for a `//` earlier on the same line and for a `/*` opened before
/// `pos` that is not closed before it.
pub fn is_commented_out(text: &str, pos: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    if text[line_start..pos].contains("//") {
        return true;
    }
    let last_open = text[..pos].rfind("/*");
    let last_close = text[..pos].rfind("*/");
    match (last_open, last_close) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Scan from `start` (just after an opening delimiter) to its matching closer.
///
/// Returns the enclosed text and the byte index just past the closer, or
/// `None` when the text ends first.
pub fn extract_balanced(text: &str, start: usize, open: u8, close: u8) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some((&text[start..i], i + 1));
            }
        }
    }
    None
}

/// Balanced `( ... )` scan starting just after the `(`.
pub fn extract_balanced_parens(text: &str, start: usize) -> Option<(&str, usize)> {
    extract_balanced(text, start, b'(', b')')
}

/// Split on commas that are not nested inside `<>`, `()`, `[]` or `{}`.
///
/// Pieces are trimmed; empty pieces are kept so callers can decide.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut piece_start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[piece_start..i].trim());
                piece_start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[piece_start..].trim());
    parts
}

/// Template arguments of the outermost `<...>` pair.
///
/// `TMap<FString, TArray<int32>>` → `["FString", "TArray<int32>"]`.
/// Types without angle brackets yield an empty list.
pub fn extract_template_args(type_str: &str) -> Vec<String> {
    let (Some(start), Some(end)) = (type_str.find('<'), type_str.rfind('>')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }
    split_top_level(&type_str[start + 1..end])
        .into_iter()
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect()
}

/// Name of the outermost template, without qualifiers.
///
/// `const TArray<int32>` → `TArray`, `std::vector<int>` → `vector`.
pub fn template_head(type_str: &str) -> Option<&str> {
    let lt = type_str.find('<')?;
    let head = type_str[..lt].trim_end();
    let head = head.rsplit(|c: char| c.is_whitespace()).next().unwrap_or(head);
    let head = head.rsplit("::").next().unwrap_or(head);
    if head.is_empty() { None } else { Some(head) }
}

/// Byte index `max_chars` characters past `start`, clamped to the text end.
pub fn advance_chars(text: &str, start: usize, max_chars: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| start + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_block_then_line_comments() {
        let src = "int A; /* block\n UPROPERTY() // inside */ int B; // tail\nint C;";
        let out = strip_comments(src);
        assert!(!out.contains("UPROPERTY"));
        assert!(!out.contains("tail"));
        assert!(out.contains("int A;"));
        assert!(out.contains("int B;"));
        assert!(out.contains("int C;"));
    }

    #[test]
    fn commented_out_detects_same_line_and_open_block() {
        let src = "x // UPROPERTY()\n/* open\nUPROPERTY()\n*/ UPROPERTY()";
        let first = src.find("UPROPERTY").unwrap();
        assert!(is_commented_out(src, first));
        let second = src[first + 1..].find("UPROPERTY").unwrap() + first + 1;
        assert!(is_commented_out(src, second));
        let third = src.rfind("UPROPERTY").unwrap();
        assert!(!is_commented_out(src, third));
    }

    #[test]
    fn balanced_parens_handle_nesting() {
        let src = "UPROPERTY(Meta=(A, B(1)), Category=\"X\") float F;";
        let open = src.find('(').unwrap();
        let (inner, end) = extract_balanced_parens(src, open + 1).unwrap();
        assert_eq!(inner, "Meta=(A, B(1)), Category=\"X\"");
        assert_eq!(&src[end..], " float F;");
    }

    #[test]
    fn balanced_parens_report_unterminated() {
        assert!(extract_balanced_parens("UPROPERTY(EditAnywhere", 10).is_none());
    }

    #[test]
    fn template_args_respect_nesting() {
        assert_eq!(
            extract_template_args("TMap<FString, TArray<TMap<int32, float>>>"),
            vec!["FString", "TArray<TMap<int32, float>>"]
        );
        assert_eq!(
            extract_template_args("TMap<FString, int32, FDefaultSetAllocator>"),
            vec!["FString", "int32", "FDefaultSetAllocator"]
        );
        assert!(extract_template_args("float").is_empty());
    }

    #[test]
    fn template_head_drops_qualifiers() {
        assert_eq!(template_head("TArray<int32>"), Some("TArray"));
        assert_eq!(template_head("const TMap<A, B>"), Some("TMap"));
        assert_eq!(template_head("std::vector<int>"), Some("vector"));
        assert_eq!(template_head("UTexture*"), None);
    }

    #[test]
    fn advance_chars_stays_on_char_boundaries() {
        let src = "UPROPERTY() 액터 int32 X;";
        let end = advance_chars(src, 12, 2);
        assert!(src.is_char_boundary(end));
        assert_eq!(&src[12..end], "액터");
        assert_eq!(advance_chars(src, 0, 10_000), src.len());
    }
}
