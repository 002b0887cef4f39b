//! Structured HTTP path templates.
//!
//! Accepts both the protobuf binding form (`/v1/{parent=projects/*}/secrets`)
//! and the OpenAPI form (`/v1/projects/{project}/secrets/{secret}:addVersion`).

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PathSegment {
    /// Fixed text between slashes.
    Literal(String),
    /// Reference to a request field, possibly dotted (`book.name`).
    FieldPath(String),
    /// Trailing custom verb, without the leading `:`.
    Verb(String),
}

/// A parsed REST path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathTemplate {
    /// Segments in path order; a verb, when present, is last.
    pub segments: Vec<PathSegment>,
}

impl PathTemplate {
    /// Parse either template form. Binding patterns (`=projects/*`) are
    /// dropped; only the field path is kept.
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::Specification(format!("invalid path template '{path}': {reason}"));

        let trimmed = path.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        let (body, verb) = split_verb(trimmed).map_err(|reason| invalid(reason))?;

        // `/` has no segments; `/v1/books/` reads as `/v1/books`.
        let body = body.strip_suffix('/').unwrap_or(body);
        let pieces = if body.is_empty() {
            Vec::new()
        } else {
            split_top_level(body).map_err(|reason| invalid(reason))?
        };

        let mut segments = Vec::new();
        for piece in pieces {
            if piece.is_empty() {
                return Err(invalid("empty segment"));
            }
            if let Some(inner) = piece.strip_prefix('{') {
                let inner = inner.strip_suffix('}').ok_or_else(|| invalid("unbalanced braces"))?;
                let name = inner.split('=').next().unwrap_or_default().trim();
                if !is_field_path(name) {
                    return Err(invalid("variable must name a field"));
                }
                segments.push(PathSegment::FieldPath(name.to_string()));
            } else if piece.contains(['{', '}']) {
                return Err(invalid("unbalanced braces"));
            } else {
                segments.push(PathSegment::Literal(piece.to_string()));
            }
        }
        if let Some(verb) = verb {
            if verb.is_empty() {
                return Err(invalid("empty verb"));
            }
            segments.push(PathSegment::Verb(verb.to_string()));
        }
        Ok(Self { segments })
    }

    /// Field paths in the order they appear.
    pub fn field_paths(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            PathSegment::FieldPath(path) => Some(path.as_str()),
            _ => None,
        })
    }

    /// The custom verb, if any.
    pub fn verb(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            PathSegment::Verb(verb) => Some(verb.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.segments.first(), None | Some(PathSegment::Verb(_))) {
            f.write_str("/")?;
        }
        for segment in &self.segments {
            match segment {
                PathSegment::Literal(lit) => write!(f, "/{lit}")?,
                PathSegment::FieldPath(path) => write!(f, "/{{{path}}}")?,
                PathSegment::Verb(verb) => write!(f, ":{verb}")?,
            }
        }
        Ok(())
    }
}

/// Split a trailing `:verb` that sits outside any braces.
fn split_verb(path: &str) -> std::result::Result<(&str, Option<&str>), &'static str> {
    let mut depth = 0i32;
    let mut colon = None;
    for (i, c) in path.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ':' if depth == 0 => colon = Some(i),
            '/' if depth == 0 && colon.is_some() => return Err("verb must be the last segment"),
            _ => {}
        }
        if depth < 0 {
            return Err("unbalanced braces");
        }
    }
    if depth != 0 {
        return Err("unbalanced braces");
    }
    Ok(match colon {
        Some(i) => (&path[..i], Some(&path[i + 1..])),
        None => (path, None),
    })
}

/// Split on `/` outside braces.
fn split_top_level(path: &str) -> std::result::Result<Vec<&str>, &'static str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            '/' if depth == 0 => {
                pieces.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if depth > 1 {
            return Err("nested braces");
        }
    }
    pieces.push(&path[start..]);
    Ok(pieces)
}

fn is_field_path(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn lit(s: &str) -> PathSegment {
        PathSegment::Literal(s.into())
    }

    fn field(s: &str) -> PathSegment {
        PathSegment::FieldPath(s.into())
    }

    #[test]
    fn test_parse_protobuf_binding() {
        let t = PathTemplate::parse("/v1/{parent=projects/*}/secrets/{secretId}").unwrap();
        assert_eq!(
            t.segments,
            vec![lit("v1"), field("parent"), lit("secrets"), field("secretId")]
        );
        assert_eq!(t.field_paths().count(), 2);
        assert_eq!(t.verb(), None);
    }

    #[test]
    fn test_parse_verb_and_nested_field() {
        let t = PathTemplate::parse("/v1/{secret.name=projects/*/secrets/*}:addVersion").unwrap();
        assert_eq!(
            t.segments,
            vec![
                lit("v1"),
                field("secret.name"),
                PathSegment::Verb("addVersion".into())
            ]
        );
        assert_eq!(t.to_string(), "/v1/{secret.name}:addVersion");
    }

    #[test]
    fn test_parse_openapi_path() {
        let t = PathTemplate::parse("/v1/projects/{project}/secrets/{secret}:access").unwrap();
        let fields: Vec<_> = t.field_paths().collect();
        assert_eq!(fields, vec!["project", "secret"]);
        assert_eq!(t.verb(), Some("access"));
    }

    #[test]
    fn test_parse_root_path() {
        let t = PathTemplate::parse("/").unwrap();
        assert!(t.segments.is_empty());
        assert_eq!(t.field_paths().count(), 0);
        assert_eq!(t.to_string(), "/");
    }

    #[test]
    fn test_parse_trailing_slash() {
        let t = PathTemplate::parse("/v1/books/").unwrap();
        assert_eq!(t.segments, vec![lit("v1"), lit("books")]);
        assert_eq!(t, PathTemplate::parse("/v1/books").unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(PathTemplate::parse("v1/foo").is_err());
        assert!(PathTemplate::parse("/v1/{parent").is_err());
        assert!(PathTemplate::parse("/v1/parent}").is_err());
        assert!(PathTemplate::parse("/v1/{}").is_err());
        assert!(PathTemplate::parse("/v1//foo").is_err());
        assert!(PathTemplate::parse("/v1/foo:bar/baz").is_err());
        assert!(PathTemplate::parse("/v1/foo:").is_err());
    }
}
