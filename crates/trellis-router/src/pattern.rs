// File: src/pattern.rs
// Purpose: Matchable route patterns and parameter extraction

use serde::{Deserialize, Serialize};

/// One element of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Matcher {
    /// Exact token equality.
    Literal(String),
    /// Consumes exactly one segment and binds it.
    Param(String),
    /// Consumes all remaining segments, including zero, as one sequence.
    /// Always the final matcher of its pattern.
    Rest(String),
}

/// An ordered matcher sequence compiled from a route's segment chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    matchers: Vec<Matcher>,
}

/// Specificity class of a whole pattern. Lower ranks match first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RankClass {
    /// Literals only.
    Static = 0,
    /// At least one dynamic param, no rest.
    Dynamic = 1,
    /// Ends in a rest param.
    Rest = 2,
}

/// How the compiled entry list is ordered for matching.
///
/// Static entries always order first; no policy can shadow a static route
/// with a dynamic or rest one. The dynamic-vs-rest tie-break is policy,
/// not a hidden default: `Ranked` reorders by specificity class,
/// `DeclarationOrder` trusts the hierarchy walk order for the non-static
/// entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Static before dynamic before rest, declaration order within a class.
    #[default]
    Ranked,
    /// Static first, then dynamic and rest entries in pure declaration
    /// order (root-to-leaf, then listing order).
    DeclarationOrder,
}

/// Matching options, defaulted from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub case_insensitive: bool,
    pub policy: MatchPolicy,
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// From a dynamic param: exactly one segment.
    Single(String),
    /// From a rest param: the ordered trailing segment sequence, possibly
    /// empty. Joining with `/` reconstructs the unmatched tail exactly.
    Many(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Many(_) => None,
        }
    }

    pub fn as_segments(&self) -> Option<&[String]> {
        match self {
            Self::Single(_) => None,
            Self::Many(segments) => Some(segments),
        }
    }
}

/// Extracted path parameters, insertion-ordered (pattern order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, ParamValue)>,
}

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Single-segment value, the common case.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Rest sequence for a rest param.
    pub fn get_rest(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ParamValue::as_segments)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn insert(&mut self, name: &str, value: ParamValue) {
        self.entries.push((name.to_string(), value));
    }
}

impl Pattern {
    pub fn new(matchers: Vec<Matcher>) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Ordered parameter names of this pattern.
    pub fn param_names(&self) -> Vec<String> {
        self.matchers
            .iter()
            .filter_map(|m| match m {
                Matcher::Literal(_) => None,
                Matcher::Param(name) | Matcher::Rest(name) => Some(name.clone()),
            })
            .collect()
    }

    /// Specificity class used for rank ordering.
    pub fn rank_class(&self) -> RankClass {
        if self
            .matchers
            .iter()
            .any(|m| matches!(m, Matcher::Rest(_)))
        {
            RankClass::Rest
        } else if self
            .matchers
            .iter()
            .any(|m| matches!(m, Matcher::Param(_)))
        {
            RankClass::Dynamic
        } else {
            RankClass::Static
        }
    }

    /// Matches a normalized segment sequence against this pattern.
    ///
    /// Pure function: returns bound params on a full match, `None`
    /// otherwise. Both the pattern and the path must be fully consumed.
    pub fn match_segments(
        &self,
        segments: &[String],
        options: &MatchOptions,
    ) -> Option<PathParams> {
        let mut params = PathParams::default();
        let mut idx = 0;

        for matcher in &self.matchers {
            match matcher {
                Matcher::Literal(token) => {
                    let segment = segments.get(idx)?;
                    let equal = if options.case_insensitive {
                        token.eq_ignore_ascii_case(segment)
                    } else {
                        token == segment
                    };
                    if !equal {
                        return None;
                    }
                    idx += 1;
                }
                Matcher::Param(name) => {
                    let segment = segments.get(idx)?;
                    params.insert(name, ParamValue::Single(segment.clone()));
                    idx += 1;
                }
                Matcher::Rest(name) => {
                    params.insert(name, ParamValue::Many(segments[idx..].to_vec()));
                    idx = segments.len();
                }
            }
        }

        (idx == segments.len()).then_some(params)
    }

    /// Rebuilds a URL from this pattern and a parameter set.
    ///
    /// Returns `None` if a required parameter is missing. The inverse of
    /// `match_segments` for the params it produced.
    pub fn generate_url(&self, params: &PathParams) -> Option<String> {
        let mut segments: Vec<String> = Vec::new();
        for matcher in &self.matchers {
            match matcher {
                Matcher::Literal(token) => segments.push(token.clone()),
                Matcher::Param(name) => segments.push(params.get_str(name)?.to_string()),
                Matcher::Rest(name) => {
                    segments.extend(params.get_rest(name)?.iter().cloned());
                }
            }
        }
        Some(crate::path::display_path(&segments))
    }

    /// Canonical display form, also the key for conflict detection when
    /// combined with [`Pattern::shape`].
    pub fn display(&self) -> String {
        if self.matchers.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for matcher in &self.matchers {
            out.push('/');
            match matcher {
                Matcher::Literal(token) => out.push_str(token),
                Matcher::Param(name) => {
                    out.push(':');
                    out.push_str(name);
                }
                Matcher::Rest(name) => {
                    out.push('*');
                    out.push_str(name);
                }
            }
        }
        out
    }

    /// Normalized shape with parameter names erased, so `/x/[a]` and
    /// `/x/[b]` are recognized as the same matchable pattern.
    pub fn shape(&self) -> String {
        if self.matchers.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for matcher in &self.matchers {
            out.push('/');
            match matcher {
                Matcher::Literal(token) => out.push_str(token),
                Matcher::Param(_) => out.push(':'),
                Matcher::Rest(_) => out.push('*'),
            }
        }
        out
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}
