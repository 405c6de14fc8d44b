// File: src/segment.rs
// Purpose: Parse a convention-annotated hierarchy listing into a segment tree

use std::collections::BTreeMap;

use crate::error::CompileError;

/// One entry of the hierarchy listing, as supplied by the file-discovery
/// collaborator. Discovery is mechanical I/O and lives outside this crate;
/// the builder only sees ordered `(name, kind)` listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub children: Vec<DirEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Leaf,
}

impl DirEntry {
    /// A directory entry with an ordered child listing.
    pub fn dir(name: impl Into<String>, children: Vec<DirEntry>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            children,
        }
    }

    /// A leaf (file) entry.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Leaf,
            children: Vec::new(),
        }
    }
}

/// What a segment contributes to the matchable URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal token, matched by exact equality.
    Static,
    /// `[ident]` — consumes exactly one segment.
    DynamicParam,
    /// `[...ident]` — consumes all remaining segments, including zero.
    RestParam,
    /// `(group)` — structures the hierarchy without a URL token.
    PathlessGroup,
    /// `index` — the endpoint of its containing directory, no token.
    Index,
}

/// A layout declared inside a directory. The empty name is the default.
///
/// `body_ref` is an opaque reference to the renderable wrapper; the
/// compiler records it, rendering is someone else's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDef {
    pub name: String,
    pub body_ref: String,
}

/// One node of the parsed segment tree. Children are owned exclusively by
/// their parent; layouts are keyed by name (empty string = default).
#[derive(Debug, Clone)]
pub struct SegmentNode {
    pub kind: SegmentKind,
    /// Original convention string, for diagnostics.
    pub raw_name: String,
    /// Derived path token; empty for pathless groups and index nodes.
    pub url_token: String,
    /// Parameter name for dynamic and rest segments.
    pub param_name: Option<String>,
    /// Opaque handler reference, present only on endpoint nodes.
    pub handler_ref: Option<String>,
    /// Named layout requested via the `@name` suffix, endpoints only.
    pub layout_request: Option<String>,
    /// Layouts declared at this level, default keyed by `""`.
    pub layouts: BTreeMap<String, LayoutDef>,
    pub children: Vec<SegmentNode>,
    /// Hierarchy path of this node, for error reporting.
    pub source: String,
}

impl SegmentNode {
    fn new(kind: SegmentKind, raw_name: &str, source: &str) -> Self {
        Self {
            kind,
            raw_name: raw_name.to_string(),
            url_token: String::new(),
            param_name: None,
            handler_ref: None,
            layout_request: None,
            layouts: BTreeMap::new(),
            children: Vec::new(),
            source: source.to_string(),
        }
    }

    /// True for nodes that carry a handler reference.
    pub fn is_endpoint(&self) -> bool {
        self.handler_ref.is_some()
    }
}

/// Builds the segment tree from the root directory listing.
///
/// The returned root node is a pathless group: it contributes no URL token
/// but owns the root-level layouts and children.
///
/// # Examples
///
/// ```
/// use trellis_router::segment::{build_tree, DirEntry};
///
/// let tree = build_tree(&[
///     DirEntry::leaf("layout.rsx"),
///     DirEntry::leaf("index.rsx"),
///     DirEntry::dir("product", vec![DirEntry::leaf("[skuId].rsx")]),
/// ])
/// .unwrap();
///
/// assert!(tree.layouts.contains_key(""));
/// assert_eq!(tree.children.len(), 2);
/// ```
pub fn build_tree(entries: &[DirEntry]) -> Result<SegmentNode, CompileError> {
    let mut root = SegmentNode::new(SegmentKind::PathlessGroup, "", "");
    populate(&mut root, entries, "")?;
    Ok(root)
}

/// Fills `node` from a directory listing, validating sibling invariants.
fn populate(
    node: &mut SegmentNode,
    entries: &[DirEntry],
    dir_path: &str,
) -> Result<(), CompileError> {
    let mut seen_tokens: Vec<String> = Vec::new();
    let mut rest_seen: Option<String> = None;

    for entry in entries {
        let source = join_path(dir_path, &entry.name);

        match entry.kind {
            EntryKind::Leaf => {
                let stem = strip_extension(&entry.name);

                if let Some(layout) = parse_layout(stem) {
                    let previous = node.layouts.insert(
                        layout.to_string(),
                        LayoutDef {
                            name: layout.to_string(),
                            body_ref: source.clone(),
                        },
                    );
                    if previous.is_some() {
                        return Err(CompileError::DuplicateLayout {
                            path: dir_path.to_string(),
                            name: layout.to_string(),
                        });
                    }
                    continue;
                }

                // Endpoint leaf: split off the `@name` layout selector first,
                // it is consumed during chain resolution and never matched.
                let (base, requested) = match stem.split_once('@') {
                    Some((base, name)) => (base, Some(name.to_string())),
                    None => (stem, None),
                };

                let mut child = classify(base, &source);
                child.handler_ref = Some(source.clone());
                child.layout_request = requested;
                check_siblings(&child, &mut seen_tokens, &mut rest_seen, &source)?;
                node.children.push(child);
            }
            EntryKind::Directory => {
                let mut child = classify(&entry.name, &source);
                check_siblings(&child, &mut seen_tokens, &mut rest_seen, &source)?;
                populate(&mut child, &entry.children, &source)?;
                node.children.push(child);
            }
        }
    }

    Ok(())
}

/// Validates the per-sibling-set invariants: unique URL tokens and at most
/// one rest param.
fn check_siblings(
    child: &SegmentNode,
    seen_tokens: &mut Vec<String>,
    rest_seen: &mut Option<String>,
    source: &str,
) -> Result<(), CompileError> {
    if child.kind == SegmentKind::RestParam {
        if rest_seen.is_some() {
            return Err(CompileError::AmbiguousRestParam {
                path: source.to_string(),
                segment: child.raw_name.clone(),
            });
        }
        *rest_seen = Some(child.raw_name.clone());
    }

    // Index nodes and pathless groups contribute no token; a directory and
    // an endpoint with the same token are a genuine collision either way.
    if !child.url_token.is_empty() {
        if seen_tokens.contains(&child.url_token) {
            return Err(CompileError::DuplicateRoute {
                path: source.to_string(),
                token: child.url_token.clone(),
            });
        }
        seen_tokens.push(child.url_token.clone());
    }

    Ok(())
}

/// Classifies one convention name into a segment node.
fn classify(name: &str, source: &str) -> SegmentNode {
    if name == "index" {
        return SegmentNode::new(SegmentKind::Index, name, source);
    }

    if name.starts_with('(') && name.ends_with(')') && name.len() > 1 {
        return SegmentNode::new(SegmentKind::PathlessGroup, name, source);
    }

    if let Some(inner) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
        if let Some(param) = inner.strip_prefix("...") {
            let mut node = SegmentNode::new(SegmentKind::RestParam, name, source);
            node.url_token = format!("*{param}");
            node.param_name = Some(param.to_string());
            return node;
        }
        let mut node = SegmentNode::new(SegmentKind::DynamicParam, name, source);
        node.url_token = format!(":{inner}");
        node.param_name = Some(inner.to_string());
        return node;
    }

    let mut node = SegmentNode::new(SegmentKind::Static, name, source);
    node.url_token = name.to_string();
    node
}

/// Returns the layout name if the stem follows the layout convention:
/// `layout` (default, empty name) or `layout-<name>`.
fn parse_layout(stem: &str) -> Option<&str> {
    if stem == "layout" {
        Some("")
    } else {
        stem.strip_prefix("layout-")
    }
}

/// Strips a trailing file extension from a leaf name.
///
/// Only a purely alphanumeric extension is stripped, so bracket
/// conventions like `[...slug]` survive intact.
fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_alphanumeric()) =>
        {
            stem
        }
        _ => name,
    }
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_static_dynamic_rest_and_groups() {
        assert_eq!(classify("about", "about").kind, SegmentKind::Static);
        assert_eq!(classify("[id]", "[id]").kind, SegmentKind::DynamicParam);
        assert_eq!(
            classify("[...slug]", "[...slug]").kind,
            SegmentKind::RestParam
        );
        assert_eq!(
            classify("(account)", "(account)").kind,
            SegmentKind::PathlessGroup
        );
        assert_eq!(classify("index", "index").kind, SegmentKind::Index);
    }

    #[test]
    fn dynamic_param_binds_its_identifier() {
        let node = classify("[skuId]", "[skuId]");
        assert_eq!(node.param_name.as_deref(), Some("skuId"));
        assert_eq!(node.url_token, ":skuId");
    }

    #[test]
    fn extension_stripping_leaves_brackets_alone() {
        assert_eq!(strip_extension("index.rsx"), "index");
        assert_eq!(strip_extension("[...slug].rsx"), "[...slug]");
        assert_eq!(strip_extension("[...slug]"), "[...slug]");
        assert_eq!(strip_extension("layout-narrow.tsx"), "layout-narrow");
    }

    #[test]
    fn layout_convention_parses_default_and_named() {
        assert_eq!(parse_layout("layout"), Some(""));
        assert_eq!(parse_layout("layout-narrow"), Some("narrow"));
        assert_eq!(parse_layout("layouts"), None);
        assert_eq!(parse_layout("index"), None);
    }

    #[test]
    fn at_suffix_records_a_layout_request() {
        let tree = build_tree(&[DirEntry::dir(
            "contact",
            vec![DirEntry::leaf("index@narrow.rsx")],
        )])
        .unwrap();
        let contact = &tree.children[0];
        let index = &contact.children[0];
        assert_eq!(index.kind, SegmentKind::Index);
        assert_eq!(index.layout_request.as_deref(), Some("narrow"));
        assert!(index.is_endpoint());
    }

    #[test]
    fn duplicate_sibling_tokens_fail() {
        let err = build_tree(&[
            DirEntry::leaf("about.rsx"),
            DirEntry::dir("about", vec![DirEntry::leaf("index.rsx")]),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateRoute { token, .. } if token == "about"));
    }

    #[test]
    fn two_rest_params_in_one_sibling_set_fail() {
        let err = build_tree(&[
            DirEntry::leaf("[...rest].rsx"),
            DirEntry::dir("[...other]", vec![DirEntry::leaf("index.rsx")]),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::AmbiguousRestParam { .. }));
    }

    #[test]
    fn duplicate_layout_names_in_one_directory_fail() {
        let err = build_tree(&[
            DirEntry::leaf("layout-narrow.rsx"),
            DirEntry::leaf("layout-narrow.tsx"),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateLayout { name, .. } if name == "narrow"));
    }

    #[test]
    fn pathless_group_contributes_children_and_layouts() {
        let tree = build_tree(&[DirEntry::dir(
            "(account)",
            vec![
                DirEntry::leaf("layout.rsx"),
                DirEntry::dir("profile", vec![DirEntry::leaf("index.rsx")]),
            ],
        )])
        .unwrap();
        let group = &tree.children[0];
        assert_eq!(group.kind, SegmentKind::PathlessGroup);
        assert!(group.url_token.is_empty());
        assert!(group.layouts.contains_key(""));
        assert_eq!(group.children.len(), 1);
    }
}
