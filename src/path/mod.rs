//! Trigger path patterns.
//!
//! Database and Firestore triggers are declared against patterns such as
//! `/users/{uid}/posts/{postId}`. A `{name}` segment matches exactly one path segment;
//! `{name=**}` matches every remaining segment.


use std::collections::HashMap;
use std::fmt;

/// Trims leading and trailing slashes and collapses repeated ones.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins two slash-separated paths.
pub fn join_path(base: &str, child: &str) -> String {
    let base = normalize_path(base);
    let child = normalize_path(child);
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child,
        (_, true) => base,
        _ => format!("{}/{}", base, child),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard(String),
    MultiWildcard(String),
}

/// A parsed trigger path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let raw = normalize_path(pattern);
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                {
                    Some(inner) => match inner.strip_suffix("=**") {
                        Some(name) => Segment::MultiWildcard(name.to_string()),
                        None => Segment::Wildcard(inner.to_string()),
                    },
                    None => Segment::Literal(segment.to_string()),
                }
            })
            .collect();
        Self { raw, segments }
    }

    /// The normalized pattern, e.g. `users/{uid}`.
    pub fn value(&self) -> &str {
        &self.raw
    }

    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }

    /// Names of the wildcards, in declaration order.
    pub fn wildcards(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Wildcard(name) | Segment::MultiWildcard(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Matches a concrete path and returns the wildcard values.
    ///
    /// Returns an empty map when the path does not match the pattern.
    pub fn extract_matches(&self, path: &str) -> HashMap<String, String> {
        let normalized = normalize_path(path);
        let parts: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        let mut matches = HashMap::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::MultiWildcard(name) => {
                    if index >= parts.len() {
                        return HashMap::new();
                    }
                    matches.insert(name.clone(), parts[index..].join("/"));
                    return matches;
                }
                Segment::Wildcard(name) => match parts.get(index) {
                    Some(part) => {
                        matches.insert(name.clone(), (*part).to_string());
                    }
                    None => return HashMap::new(),
                },
                Segment::Literal(literal) => {
                    if parts.get(index) != Some(&literal.as_str()) {
                        return HashMap::new();
                    }
                }
            }
        }

        if parts.len() != self.segments.len() {
            return HashMap::new();
        }
        matches
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
