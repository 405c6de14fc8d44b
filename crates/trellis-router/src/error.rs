// File: src/error.rs
// Purpose: Error taxonomy for route compilation and matching

use thiserror::Error;

/// Fatal build-time errors. Compilation aborts and no manifest is produced.
///
/// Every variant carries the hierarchy path of the offending entry so the
/// operator sees exactly which file or directory broke the build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Two sibling entries produce the same URL token.
    #[error("duplicate route: `{path}` produces URL token `{token}` more than once")]
    DuplicateRoute { path: String, token: String },

    /// More than one rest parameter in a single sibling set.
    #[error("ambiguous rest param: `{path}` declares a second rest segment `{segment}`")]
    AmbiguousRestParam { path: String, segment: String },

    /// A leaf requested a named layout that no ancestor directory declares.
    #[error("unresolved layout: `{path}` requests layout `{name}` but no ancestor declares it")]
    UnresolvedLayout { path: String, name: String },

    /// Two layouts with the same name in the same directory.
    #[error("duplicate layout: directory `{path}` declares layout `{name}` twice")]
    DuplicateLayout { path: String, name: String },

    /// Two entries normalize to an identical matchable pattern.
    #[error("conflicting pattern: `{path}` and `{other}` both compile to `{pattern}`")]
    ConflictingPattern {
        path: String,
        other: String,
        pattern: String,
    },

    /// One entry binds the same parameter name more than once.
    #[error("duplicate param: `{path}` binds parameter `{name}` more than once")]
    DuplicateParam { path: String, name: String },
}

/// Recoverable runtime matching errors.
///
/// `NotFound` never aborts a request pipeline; the caller selects a
/// fallback route or response instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No compiled entry fully consumed the request path.
    #[error("no route matches `{path}`")]
    NotFound { path: String },
}
