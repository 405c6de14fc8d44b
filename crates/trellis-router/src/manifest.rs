// File: src/manifest.rs
// Purpose: Flatten the segment tree into the immutable compiled manifest

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{CompileError, MatchError};
use crate::path;
use crate::pattern::{MatchOptions, MatchPolicy, Matcher, PathParams, Pattern, RankClass};
use crate::segment::{SegmentKind, SegmentNode};

/// Index into the manifest's layout registry.
pub type LayoutId = usize;

/// A compiled layout. Layouts never own their ancestors; the chain on each
/// route entry records ancestry by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Layout name, empty string for a directory's default.
    pub name: String,
    /// Opaque reference to the renderable wrapper.
    pub body_ref: String,
    /// Hierarchy directory that declared this layout, for diagnostics.
    pub dir: String,
}

/// One matchable route of the manifest.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub pattern: Pattern,
    /// Ordered parameter names, unique within the entry.
    pub param_names: Vec<String>,
    /// Opaque handler reference (the endpoint's hierarchy path).
    pub handler_ref: String,
    /// Resolved layout chain, outermost first.
    pub layout_chain: Vec<LayoutId>,
    /// Filename-safe server entry identifier for deployment packaging.
    pub entry_id: String,
    /// Emission position in the depth-first walk; the rank tie-break.
    decl_index: usize,
}

impl RouteEntry {
    pub fn decl_index(&self) -> usize {
        self.decl_index
    }
}

/// A successful match: the winning entry plus its extracted parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub params: PathParams,
}

/// The compiled route manifest. Built once at build time, immutable
/// thereafter; matching is a pure, reentrant read, so one manifest value
/// serves unboundedly many concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct CompiledManifest {
    entries: Vec<RouteEntry>,
    layouts: Vec<LayoutEntry>,
    options: MatchOptions,
}

impl CompiledManifest {
    /// Compiles a segment tree into a manifest.
    ///
    /// Walks depth-first, accumulating the ancestor default-layout chain,
    /// and emits one entry per endpoint node. Static patterns always order
    /// first, so a static route is never shadowed regardless of policy; the
    /// policy decides only how dynamic and rest entries interleave. Ties
    /// break by declaration order so rebuilds are reproducible.
    ///
    /// All `CompileError`s are fatal: no manifest is produced.
    pub fn compile(tree: &SegmentNode, options: MatchOptions) -> Result<Self, CompileError> {
        let mut walker = Walker::default();
        walker.walk_dir(tree, &[])?;

        let mut entries = walker.entries;
        // Stable sorts: declaration order survives within each key.
        match options.policy {
            MatchPolicy::Ranked => entries.sort_by_key(|e| e.pattern.rank_class()),
            MatchPolicy::DeclarationOrder => {
                entries.sort_by_key(|e| e.pattern.rank_class() != RankClass::Static);
            }
        }

        for entry in &entries {
            debug!(pattern = %entry.pattern, entry_id = %entry.entry_id, "compiled route");
        }

        Ok(Self {
            entries,
            layouts: walker.layouts,
            options,
        })
    }

    /// Matches a request path against the manifest.
    ///
    /// Linear scan in rank order; the first entry whose pattern and the
    /// path fully consume each other wins. Greedy first-match-in-rank-order
    /// is the correctness property here: a static route is never shadowed
    /// by a dynamic or rest route at the same position.
    ///
    /// `NotFound` is recoverable; callers drive a fallback route from it.
    pub fn match_path(&self, raw_path: &str) -> Result<RouteMatch<'_>, MatchError> {
        let segments = path::normalize(raw_path);
        trace!(path = raw_path, segments = segments.len(), "matching");

        self.entries
            .iter()
            .find_map(|entry| {
                entry
                    .pattern
                    .match_segments(&segments, &self.options)
                    .map(|params| RouteMatch { entry, params })
            })
            .ok_or_else(|| MatchError::NotFound {
                path: path::display_path(&segments),
            })
    }

    /// All route entries, in match order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// The layout registry.
    pub fn layouts(&self) -> &[LayoutEntry] {
        &self.layouts
    }

    pub fn layout(&self, id: LayoutId) -> &LayoutEntry {
        &self.layouts[id]
    }

    /// Resolves an entry's layout chain to the actual layouts, outermost
    /// first.
    pub fn layout_chain(&self, entry: &RouteEntry) -> Vec<&LayoutEntry> {
        entry
            .layout_chain
            .iter()
            .map(|&id| &self.layouts[id])
            .collect()
    }

    /// Looks up an entry by its canonical pattern string, e.g. for the
    /// caller's designated not-found fallback route.
    pub fn entry_for_pattern(&self, pattern: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.pattern.display() == pattern)
    }

    /// Looks up an entry by its handler reference.
    pub fn entry_for_handler(&self, handler_ref: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.handler_ref == handler_ref)
    }

    /// The read-only server entry identifiers consumed by deployment
    /// adapters. Opaque, filename-safe, prefix-matchable strings.
    pub fn server_entries(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.entry_id.clone()).collect()
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Serializable summary handed across the adapter boundary.
    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            routes: self
                .entries
                .iter()
                .map(|e| RouteSummary {
                    pattern: e.pattern.display(),
                    entry_id: e.entry_id.clone(),
                    params: e.param_names.clone(),
                    layout_depth: e.layout_chain.len(),
                })
                .collect(),
            layouts: self.layouts.clone(),
        }
    }
}

/// Flat, serializable view of a manifest for build tooling and adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSummary {
    pub routes: Vec<RouteSummary>,
    pub layouts: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub pattern: String,
    pub entry_id: String,
    pub params: Vec<String>,
    pub layout_depth: usize,
}

// ----------------------------------------------------------------------------
// Depth-first walker
// ----------------------------------------------------------------------------

/// One directory level on the walk stack: its default layout (if any) and
/// the named alternatives declared at that level.
struct Frame {
    default: Option<LayoutId>,
    named: BTreeMap<String, LayoutId>,
}

#[derive(Default)]
struct Walker {
    layouts: Vec<LayoutEntry>,
    entries: Vec<RouteEntry>,
    frames: Vec<Frame>,
    seen_shapes: HashMap<String, String>,
}

impl Walker {
    /// Enters a directory-like node (root, pathless group, or segment
    /// directory), registers its layouts, walks children, leaves.
    fn walk_dir(&mut self, node: &SegmentNode, prefix: &[Matcher]) -> Result<(), CompileError> {
        let mut frame = Frame {
            default: None,
            named: BTreeMap::new(),
        };
        // Duplicate names per directory were already rejected by the tree
        // builder; registration here is unconditional.
        for layout in node.layouts.values() {
            let id = self.layouts.len();
            self.layouts.push(LayoutEntry {
                name: layout.name.clone(),
                body_ref: layout.body_ref.clone(),
                dir: node.source.clone(),
            });
            if layout.name.is_empty() {
                frame.default = Some(id);
            } else {
                frame.named.insert(layout.name.clone(), id);
            }
        }
        self.frames.push(frame);

        for child in &node.children {
            self.walk_child(child, prefix)?;
        }

        self.frames.pop();
        Ok(())
    }

    fn walk_child(&mut self, node: &SegmentNode, prefix: &[Matcher]) -> Result<(), CompileError> {
        let mut matchers = prefix.to_vec();

        // A matcher after a rest param can never participate in a match:
        // the rest segment has to stay the last alternative of its subtree.
        let extends_past_rest = matches!(matchers.last(), Some(Matcher::Rest(_)))
            && node.kind != SegmentKind::Index;
        if extends_past_rest && (node.is_endpoint() || !node.children.is_empty()) {
            return Err(CompileError::AmbiguousRestParam {
                path: node.source.clone(),
                segment: node.raw_name.clone(),
            });
        }

        match node.kind {
            SegmentKind::Static => matchers.push(Matcher::Literal(node.url_token.clone())),
            SegmentKind::DynamicParam => {
                matchers.push(Matcher::Param(node.param_name.clone().unwrap_or_default()));
            }
            SegmentKind::RestParam => {
                matchers.push(Matcher::Rest(node.param_name.clone().unwrap_or_default()));
            }
            SegmentKind::PathlessGroup | SegmentKind::Index => {}
        }

        if node.is_endpoint() {
            self.emit_entry(node, &matchers)?;
        }

        if !node.children.is_empty() {
            self.walk_dir(node, &matchers)?;
        }

        Ok(())
    }

    /// Emits one route entry for an endpoint node.
    fn emit_entry(&mut self, node: &SegmentNode, matchers: &[Matcher]) -> Result<(), CompileError> {
        let pattern = Pattern::new(matchers.to_vec());

        let shape = pattern.shape();
        if let Some(other) = self.seen_shapes.insert(shape.clone(), node.source.clone()) {
            return Err(CompileError::ConflictingPattern {
                path: node.source.clone(),
                other,
                pattern: shape,
            });
        }

        let handler_ref = node
            .handler_ref
            .clone()
            .unwrap_or_else(|| node.source.clone());

        let param_names = pattern.param_names();
        // A repeated name would leave every binding after the first
        // unreachable through `PathParams::get`.
        for (idx, name) in param_names.iter().enumerate() {
            if param_names[..idx].contains(name) {
                return Err(CompileError::DuplicateParam {
                    path: node.source.clone(),
                    name: name.clone(),
                });
            }
        }

        let layout_chain = self.resolve_chain(node)?;
        let entry_id = entry_identifier(&pattern);

        self.entries.push(RouteEntry {
            pattern,
            param_names,
            handler_ref,
            layout_chain,
            entry_id,
            decl_index: self.entries.len(),
        });
        Ok(())
    }

    /// Resolves the layout chain for an endpoint, outermost first.
    ///
    /// The chain starts from each ancestor level's default layout. A
    /// requested named layout is an alternative, not an addition: it
    /// replaces the default contribution of the level that declares the
    /// name, searched from the leaf's own directory upward.
    fn resolve_chain(&self, node: &SegmentNode) -> Result<Vec<LayoutId>, CompileError> {
        let mut per_level: Vec<Option<LayoutId>> =
            self.frames.iter().map(|f| f.default).collect();

        if let Some(requested) = &node.layout_request {
            let declaring_level = self
                .frames
                .iter()
                .rposition(|f| f.named.contains_key(requested))
                .ok_or_else(|| CompileError::UnresolvedLayout {
                    path: node.source.clone(),
                    name: requested.clone(),
                })?;
            per_level[declaring_level] = Some(self.frames[declaring_level].named[requested]);
        }

        Ok(per_level.into_iter().flatten().collect())
    }
}

/// Derives the filename-safe server entry identifier for a pattern.
///
/// Deterministic across rebuilds and injective: distinct patterns never
/// share an identifier, so adapters can use one file per entry. An
/// alphanumeric literal head passes through unchanged and stays a prefix
/// of the identifier, which is what adapter prefix matching relies on.
fn entry_identifier(pattern: &Pattern) -> String {
    if pattern.matchers().is_empty() {
        return "index".to_string();
    }
    let parts: Vec<String> = pattern
        .matchers()
        .iter()
        .map(|m| match m {
            Matcher::Literal(token) => escape_token(token),
            Matcher::Param(name) => format!("_p{}", escape_token(name)),
            Matcher::Rest(name) => format!("_r{}", escape_token(name)),
        })
        .collect();
    parts.join("-")
}

/// Escapes one token for embedding in an entry identifier.
///
/// ASCII alphanumerics pass through; every other byte becomes `_` plus
/// two hex digits. The escape never emits the `-` joiner, and `p`/`r`
/// are not hex digits, so escaped literals cannot collide with the
/// `_p`/`_r` parameter markers.
fn escape_token(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{build_tree, DirEntry};
    use pretty_assertions::assert_eq;

    fn compile(entries: &[DirEntry]) -> CompiledManifest {
        let tree = build_tree(entries).unwrap();
        CompiledManifest::compile(&tree, MatchOptions::default()).unwrap()
    }

    #[test]
    fn index_leaf_is_the_directory_endpoint() {
        let manifest = compile(&[DirEntry::dir(
            "product",
            vec![DirEntry::leaf("index.rsx")],
        )]);
        assert_eq!(manifest.entries().len(), 1);
        assert_eq!(manifest.entries()[0].pattern.display(), "/product");
    }

    #[test]
    fn entry_identifiers_are_deterministic_and_prefixed() {
        let manifest = compile(&[
            DirEntry::leaf("index.rsx"),
            DirEntry::dir("product", vec![DirEntry::leaf("[skuId].rsx")]),
        ]);
        let ids = manifest.server_entries();
        assert!(ids.contains(&"index".to_string()));
        assert!(ids.iter().any(|id| id.starts_with("product")));
    }

    #[test]
    fn conflicting_shapes_fail_even_with_different_param_names() {
        let tree = build_tree(&[
            DirEntry::dir("x", vec![DirEntry::leaf("[a].rsx")]),
            DirEntry::dir("(group)", vec![DirEntry::dir(
                "x",
                vec![DirEntry::leaf("[b].rsx")],
            )]),
        ])
        .unwrap();
        let err = CompiledManifest::compile(&tree, MatchOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::ConflictingPattern { .. }));
    }

    #[test]
    fn endpoint_under_rest_directory_fails() {
        let tree = build_tree(&[DirEntry::dir(
            "[...slug]",
            vec![DirEntry::dir("extra", vec![DirEntry::leaf("index.rsx")])],
        )])
        .unwrap();
        let err = CompiledManifest::compile(&tree, MatchOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::AmbiguousRestParam { .. }));
    }

    #[test]
    fn rest_directory_own_index_is_fine() {
        let manifest = compile(&[DirEntry::dir(
            "[...slug]",
            vec![DirEntry::leaf("index.rsx")],
        )]);
        assert_eq!(manifest.entries()[0].pattern.display(), "/*slug");
    }

    #[test]
    fn literal_and_param_identifiers_stay_distinct() {
        // A literal directory spelled like an escaped param marker must
        // not share an identifier with an actual param pattern.
        let manifest = compile(&[
            DirEntry::dir("a", vec![DirEntry::leaf("[b].rsx")]),
            DirEntry::dir("a-_pb", vec![DirEntry::leaf("index.rsx")]),
        ]);
        let ids = manifest.server_entries();
        assert!(ids.contains(&"a-_pb".to_string()));
        assert!(ids.contains(&"a_2d_5fpb".to_string()));
        let mut dedup = ids.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), ids.len());
    }

    #[test]
    fn summary_is_serializable() {
        let manifest = compile(&[
            DirEntry::leaf("layout.rsx"),
            DirEntry::dir("product", vec![DirEntry::leaf("[skuId].rsx")]),
        ]);
        let json = serde_json::to_string(&manifest.summary()).unwrap();
        assert!(json.contains("/product/:skuId"));
    }
}
