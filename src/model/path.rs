//! JSON path expressions used as keys throughout the model builder.
//!
//! Only the subset of JSONPath that a resource schema can address is
//! supported: the root `$`, dotted property names and the "any element"
//! wildcard `[*]`. Numeric indices are rejected because a relational column
//! describes every element of an array, never a single position.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Errors produced while compiling a path string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("JSON path '{path}' uses a numeric array index; only '[*]' is supported")]
    NumericArrayIndex { path: String },

    #[error("JSON path '{path}' is malformed: {reason}")]
    Malformed { path: String, reason: String },
}

/// One step of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonPathSegment {
    /// `.name`
    Property(String),
    /// `[*]`
    AnyArrayElement,
}

/// A compiled JSON path.
///
/// Equality, ordering and hashing use the canonical string only, so two
/// expressions compiled from equivalent text are interchangeable as map keys.
#[derive(Debug, Clone)]
pub struct JsonPathExpression {
    canonical: String,
    segments: Vec<JsonPathSegment>,
}

impl JsonPathExpression {
    /// The root path `$`.
    pub fn root() -> Self {
        Self {
            canonical: "$".to_string(),
            segments: Vec::new(),
        }
    }

    /// Parse a path string such as `$.addresses[*].city`.
    pub fn compile(path: &str) -> Result<Self, PathError> {
        let malformed = |reason: &str| PathError::Malformed {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let rest = path
            .strip_prefix('$')
            .ok_or_else(|| malformed("path must start with '$'"))?;

        let mut segments = Vec::new();
        let mut chars = rest.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next == '.' || next == '[' {
                            break;
                        }
                        name.push(next);
                        chars.next();
                    }
                    if name.is_empty() {
                        return Err(malformed("empty property name"));
                    }
                    segments.push(JsonPathSegment::Property(name));
                }
                '[' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(next);
                    }
                    if !closed {
                        return Err(malformed("unclosed '['"));
                    }
                    if inner == "*" {
                        segments.push(JsonPathSegment::AnyArrayElement);
                    } else if !inner.is_empty() && inner.chars().all(|d| d.is_ascii_digit()) {
                        return Err(PathError::NumericArrayIndex {
                            path: path.to_string(),
                        });
                    } else {
                        return Err(malformed("only '[*]' array selectors are supported"));
                    }
                }
                other => {
                    return Err(malformed(&format!("unexpected character '{}'", other)));
                }
            }
        }

        Ok(Self::from_segments(segments))
    }

    /// Rebuild a canonical path from segments.
    pub fn from_segments(segments: Vec<JsonPathSegment>) -> Self {
        let mut canonical = String::from("$");
        for segment in &segments {
            match segment {
                JsonPathSegment::Property(name) => {
                    canonical.push('.');
                    canonical.push_str(name);
                }
                JsonPathSegment::AnyArrayElement => canonical.push_str("[*]"),
            }
        }
        Self {
            canonical,
            segments,
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn segments(&self) -> &[JsonPathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// `self.name`
    pub fn child_property(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(JsonPathSegment::Property(name.to_string()));
        Self::from_segments(segments)
    }

    /// `self[*]`
    pub fn child_any_element(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(JsonPathSegment::AnyArrayElement);
        Self::from_segments(segments)
    }

    /// The path with its last segment removed; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        Some(Self::from_segments(segments))
    }

    /// Name of the last property segment, skipping trailing wildcards.
    pub fn last_property(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            JsonPathSegment::Property(name) => Some(name.as_str()),
            JsonPathSegment::AnyArrayElement => None,
        })
    }

    /// True when `prefix` is equal to this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &JsonPathExpression) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl PartialEq for JsonPathExpression {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for JsonPathExpression {}

impl Hash for JsonPathExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for JsonPathExpression {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsonPathExpression {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for JsonPathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_root_has_no_segments() {
        let path = JsonPathExpression::compile("$").unwrap();
        assert!(path.is_root());
        assert_eq!(path.canonical(), "$");
        assert_eq!(path, JsonPathExpression::root());
    }

    #[rstest]
    fn test_compile_nested_array_path() {
        let path = JsonPathExpression::compile("$.addresses[*].periods[*].beginDate").unwrap();
        assert_eq!(
            path.segments(),
            &[
                JsonPathSegment::Property("addresses".to_string()),
                JsonPathSegment::AnyArrayElement,
                JsonPathSegment::Property("periods".to_string()),
                JsonPathSegment::AnyArrayElement,
                JsonPathSegment::Property("beginDate".to_string()),
            ]
        );
        assert_eq!(path.canonical(), "$.addresses[*].periods[*].beginDate");
    }

    #[rstest]
    fn test_numeric_index_rejected() {
        let err = JsonPathExpression::compile("$.a[0]").unwrap_err();
        assert_eq!(
            err,
            PathError::NumericArrayIndex {
                path: "$.a[0]".to_string()
            }
        );
    }

    #[rstest]
    #[case("a.b")]
    #[case("$.")]
    #[case("$.a[*")]
    #[case("$.a['b']")]
    fn test_malformed_paths_rejected(#[case] input: &str) {
        assert!(matches!(
            JsonPathExpression::compile(input),
            Err(PathError::Malformed { .. })
        ));
    }

    #[rstest]
    fn test_from_segments_matches_compile() {
        let compiled = JsonPathExpression::compile("$.a[*].b").unwrap();
        let rebuilt = JsonPathExpression::from_segments(compiled.segments().to_vec());
        assert_eq!(compiled, rebuilt);
        assert_eq!(rebuilt.canonical(), "$.a[*].b");
    }

    #[rstest]
    fn test_navigation_helpers() {
        let scope = JsonPathExpression::compile("$.addresses").unwrap().child_any_element();
        let city = scope.child_property("city");
        assert_eq!(city.canonical(), "$.addresses[*].city");
        assert_eq!(city.parent().unwrap(), scope);
        assert_eq!(scope.last_property(), Some("addresses"));
        assert!(city.starts_with(&scope));
        assert!(!scope.starts_with(&city));
        assert!(JsonPathExpression::root().parent().is_none());
    }
}
