//! # Trellis Router
//!
//! File-convention route compilation and matching:
//! - Static segments (`about`)
//! - Dynamic parameters (`[id]`)
//! - Rest parameters (`[...slug]`)
//! - Pathless groups (`(account)`)
//! - Default and named layouts (`layout`, `layout-narrow`), selected per
//!   endpoint with the `@name` suffix (`index@narrow`)
//!
//! The crate is split along the build/runtime seam:
//!
//! 1. [`segment::build_tree`] parses the hierarchy listing into a segment
//!    tree and rejects malformed conventions.
//! 2. [`CompiledManifest::compile`] flattens the tree into rank-ordered
//!    route entries with resolved layout chains. All errors here are
//!    build-time and fatal.
//! 3. [`CompiledManifest::match_path`] is a pure, reentrant read of the
//!    immutable manifest; it runs concurrently for unrelated requests with
//!    no shared mutable state.
//!
//! ## Example
//!
//! ```
//! use trellis_router::segment::{build_tree, DirEntry};
//! use trellis_router::{CompiledManifest, MatchOptions};
//!
//! let tree = build_tree(&[
//!     DirEntry::leaf("layout.rsx"),
//!     DirEntry::dir("product", vec![DirEntry::leaf("[skuId].rsx")]),
//! ])
//! .unwrap();
//! let manifest = CompiledManifest::compile(&tree, MatchOptions::default()).unwrap();
//!
//! let matched = manifest.match_path("/product/999").unwrap();
//! assert_eq!(matched.params.get_str("skuId"), Some("999"));
//! ```

mod error;
pub mod manifest;
pub mod path;
pub mod pattern;
pub mod segment;

pub use error::{CompileError, MatchError};
pub use manifest::{
    CompiledManifest, LayoutEntry, LayoutId, ManifestSummary, RouteEntry, RouteMatch, RouteSummary,
};
pub use pattern::{MatchOptions, MatchPolicy, Matcher, ParamValue, PathParams, Pattern, RankClass};
pub use segment::{build_tree, DirEntry, EntryKind, LayoutDef, SegmentKind, SegmentNode};
