//! Path pattern parsing and matching.
//!
//! # Syntax
//!
//! Patterns are segment-based: literal segments match exactly
//! (case-sensitive) and `:name` segments match any single non-empty segment,
//! capturing it as a parameter. `/todos/:id` matches `/todos/42` with
//! `id = "42"` but not `/todos` or `/todos/42/extra`.
//!
//! No wildcards and no regex — matching is O(segments), and the limited
//! syntax translates losslessly into the axum engine's `{name}` form.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern such as `/todos/:id`.
    ///
    /// Leading slash is required; a trailing slash is ignored, so `/todos`
    /// and `/todos/` are the same pattern.
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Match a concrete request path, capturing any `:name` parameters.
    ///
    /// Returns `None` if the path does not match. Unlike pattern parsing,
    /// a trailing slash on the request path is significant: `/todos/` does
    /// not match `/todos` (the root path `/` is the one exception). This
    /// mirrors the axum engine's exact matching, keeping both engines in
    /// agreement.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        if path.len() > 1 && path.ends_with('/') {
            return None;
        }

        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        Some(params)
    }

    /// Render the pattern in axum's `{name}` parameter syntax.
    pub fn to_axum(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }

        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Param(name) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
        }
        out
    }

    /// The pattern as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Join a group prefix and a route path into a single pattern string.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{path}"),
    }
}
