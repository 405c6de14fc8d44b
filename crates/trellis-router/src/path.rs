// File: src/path.rs
// Purpose: Request path normalization applied before matching

use std::borrow::Cow;

/// Normalizes a request path into its segment sequence.
///
/// All functions here are **pure**: same input, same output, no side effects.
///
/// # Rules
///
/// - Trailing slashes are insignificant: `/about/` and `/about` are the same.
/// - Empty segments collapse: `/a//b` becomes `["a", "b"]`.
/// - Backslashes are treated as separators (common paste mistake).
/// - Each segment is percent-decoded exactly once.
/// - Case is preserved; case handling is the matcher's concern.
///
/// # Examples
///
/// ```
/// use trellis_router::path::normalize;
///
/// assert_eq!(normalize("/users/123/"), vec!["users", "123"]);
/// assert_eq!(normalize("//a///b"), vec!["a", "b"]);
/// assert_eq!(normalize("/"), Vec::<String>::new());
/// assert_eq!(normalize("/caf%C3%A9"), vec!["café"]);
/// ```
pub fn normalize(path: &str) -> Vec<String> {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect()
}

/// Percent-decodes a single segment, once.
///
/// A segment that fails to decode (invalid UTF-8 after unescaping) is kept
/// verbatim rather than rejected; the matcher then compares raw bytes.
fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => segment.to_string(),
    }
}

/// Rebuilds the canonical display form of a segment sequence.
///
/// # Examples
///
/// ```
/// use trellis_router::path::display_path;
///
/// assert_eq!(display_path(&["users".into(), "123".into()]), "/users/123");
/// assert_eq!(display_path(&[]), "/");
/// ```
pub fn display_path(segments: &[String]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trailing_slash_is_insignificant() {
        assert_eq!(normalize("/about/"), normalize("/about"));
    }

    #[test]
    fn empty_segments_collapse() {
        assert_eq!(normalize("/a//b///c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn root_is_empty_sequence() {
        assert!(normalize("/").is_empty());
        assert!(normalize("").is_empty());
        assert!(normalize("///").is_empty());
    }

    #[test]
    fn percent_decoding_happens_once() {
        // %2532 decodes to "%32", not "2": decoding is applied exactly once.
        assert_eq!(normalize("/a%2532"), vec!["a%32"]);
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(normalize("/About"), vec!["About"]);
    }

    #[test]
    fn backslashes_are_separators() {
        assert_eq!(normalize("\\users\\123"), vec!["users", "123"]);
    }

    #[test]
    fn display_round_trip() {
        let segments = normalize("/product/999");
        assert_eq!(display_path(&segments), "/product/999");
    }
}
