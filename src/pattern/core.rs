//! Pattern core module - template compilation and segment matching.

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 path params (e.g., /customers/{id}/orders/{order_id}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the compiled pattern (known at
/// startup); values are per-request data taken from the path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Error returned when a route template cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Templates must be absolute (`/orders`, not `orders`)
    MissingLeadingSlash { template: String },
    /// A segment opens a `{` without closing it, or closes a `}` it never opened
    UnbalancedBrace { template: String, segment: String },
    /// `:` or `{}` with no name
    EmptyParameterName { template: String, segment: String },
    /// Parameter names are limited to ASCII alphanumerics and `_`
    InvalidParameterName { template: String, name: String },
    /// Literal text and a parameter inside the same segment (`v{id}`)
    MixedSegment { template: String, segment: String },
    /// The same parameter name bound twice
    DuplicateParameter { template: String, name: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingLeadingSlash { template } => {
                write!(f, "route template '{template}' must start with '/'")
            }
            PatternError::UnbalancedBrace { template, segment } => write!(
                f,
                "route template '{template}': unbalanced '{{' or '}}' in segment '{segment}'"
            ),
            PatternError::EmptyParameterName { template, segment } => write!(
                f,
                "route template '{template}': parameter segment '{segment}' has no name"
            ),
            PatternError::InvalidParameterName { template, name } => write!(
                f,
                "route template '{template}': invalid parameter name '{name}' \
                (expected ASCII letters, digits or '_')"
            ),
            PatternError::MixedSegment { template, segment } => write!(
                f,
                "route template '{template}': segment '{segment}' mixes literal text \
                with a parameter"
            ),
            PatternError::DuplicateParameter { template, name } => write!(
                f,
                "route template '{template}': parameter '{name}' is bound more than once"
            ),
        }
    }
}

impl std::error::Error for PatternError {}

/// One compiled segment of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this text
    Literal(Box<str>),
    /// Matches any non-empty segment and binds it to the name
    Param(Arc<str>),
}

/// Path parameters extracted by a successful match.
///
/// Keys are the template's parameter names, values are the percent-decoded path
/// segments. Iteration follows template order, but callers should not rely on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: ParamVec,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Convert to a HashMap for callers that want owned keys
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.inner
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: String) {
        self.inner.push((name, value));
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for (k, v) in &self.inner {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

/// Immutable compiled representation of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    template: Box<str>,
    segments: Vec<Segment>,
    param_names: Vec<Arc<str>>,
}

/// Split an absolute path into its `/`-delimited segments.
///
/// `/` yields no segments; `/orders/` yields `["orders", ""]`; repeated slashes yield
/// empty segments. Paths without a leading `/` are split as-is.
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let mut parts = rest.split('/');
    // "" splits into one empty item; the root has zero segments
    if rest.is_empty() {
        parts.next();
    }
    parts
}

/// Compile a route template into a [`RoutePattern`].
///
/// # Errors
///
/// Returns a [`PatternError`] describing the first malformed segment.
pub fn compile(template: &str) -> Result<RoutePattern, PatternError> {
    if !template.starts_with('/') {
        return Err(PatternError::MissingLeadingSlash {
            template: template.to_string(),
        });
    }

    let mut segments = Vec::new();
    let mut param_names: Vec<Arc<str>> = Vec::new();

    for raw in split_segments(template) {
        let segment = parse_segment(template, raw)?;
        if let Segment::Param(name) = &segment {
            if param_names.iter().any(|n| n == name) {
                return Err(PatternError::DuplicateParameter {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }
            param_names.push(Arc::clone(name));
        }
        segments.push(segment);
    }

    Ok(RoutePattern {
        template: template.into(),
        segments,
        param_names,
    })
}

fn parse_segment(template: &str, raw: &str) -> Result<Segment, PatternError> {
    if let Some(name) = raw.strip_prefix(':') {
        return param_segment(template, raw, name);
    }

    let opens = raw.matches('{').count();
    let closes = raw.matches('}').count();
    if opens == 0 && closes == 0 {
        return Ok(Segment::Literal(raw.into()));
    }
    if opens != 1 || closes != 1 {
        return Err(PatternError::UnbalancedBrace {
            template: template.to_string(),
            segment: raw.to_string(),
        });
    }
    match raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        Some(name) => param_segment(template, raw, name),
        None => {
            // exactly one pair, but in the wrong order or embedded in text
            let open = raw.find('{').unwrap_or(0);
            let close = raw.find('}').unwrap_or(0);
            if close < open {
                Err(PatternError::UnbalancedBrace {
                    template: template.to_string(),
                    segment: raw.to_string(),
                })
            } else {
                Err(PatternError::MixedSegment {
                    template: template.to_string(),
                    segment: raw.to_string(),
                })
            }
        }
    }
}

fn param_segment(template: &str, raw: &str, name: &str) -> Result<Segment, PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyParameterName {
            template: template.to_string(),
            segment: raw.to_string(),
        });
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(PatternError::InvalidParameterName {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    Ok(Segment::Param(Arc::from(name)))
}

fn decode_segment(raw: &str) -> String {
    if !raw.contains('%') {
        return raw.to_string();
    }
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        // invalid UTF-8 after decoding: keep the segment as sent
        Err(_) => raw.to_string(),
    }
}

impl RoutePattern {
    /// The template this pattern was compiled from
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in template order
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// True when the template has no parameter segments
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.param_names.is_empty()
    }

    /// Test `path` against this pattern.
    ///
    /// `path` must already be stripped of its query string and fragment. Literal
    /// segments compare against the raw path bytes; captured parameter values are
    /// percent-decoded.
    ///
    /// # Returns
    ///
    /// * `Some(Params)` - one entry per parameter segment
    /// * `None` - segment count differs or a segment does not match
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        if !path.starts_with('/') {
            return None;
        }

        let mut params = Params::new();
        let mut candidate = split_segments(path);

        for segment in &self.segments {
            let part = candidate.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal.as_ref() != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push(Arc::clone(name), decode_segment(part));
                }
            }
        }

        if candidate.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
