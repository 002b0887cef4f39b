//! Documentation lookup from `SourceCodeInfo`.
//!
//! Comments are keyed by the structural path protoc records for each
//! element. The path schema is fixed by `descriptor.proto`:
//!
//! | path | element |
//! |---|---|
//! | `[4, i]` | top-level message `i` |
//! | `[4, i, 2, j]` | field `j` of that message |
//! | `[4, i, 3, k, ...]` | nested message `k` (recursively) |
//! | `[4, i, 4, k]` | nested enum `k` |
//! | `[5, i]` / `[5, i, 2, j]` | top-level enum / its value |
//! | `[6, i]` / `[6, i, 2, j]` | service / its method |

use std::collections::HashMap;

use super::descriptor::SourceCodeInfo;

pub const FILE_MESSAGE: i32 = 4;
pub const FILE_ENUM: i32 = 5;
pub const FILE_SERVICE: i32 = 6;
pub const MESSAGE_FIELD: i32 = 2;
pub const MESSAGE_NESTED_MESSAGE: i32 = 3;
pub const MESSAGE_NESTED_ENUM: i32 = 4;
pub const ENUM_VALUE: i32 = 2;
pub const SERVICE_METHOD: i32 = 2;

#[derive(Debug, Default)]
pub struct DocIndex {
    comments: HashMap<Vec<i32>, String>,
}

impl DocIndex {
    pub fn new(info: Option<&SourceCodeInfo>) -> Self {
        let comments = info
            .map(|info| {
                info.location
                    .iter()
                    .filter(|loc| !loc.leading_comments.is_empty())
                    .map(|loc| (loc.path.clone(), clean_comment(&loc.leading_comments)))
                    .collect()
            })
            .unwrap_or_default();
        Self { comments }
    }

    pub fn get(&self, path: &[i32]) -> String {
        self.comments.get(path).cloned().unwrap_or_default()
    }
}

/// Extend a path with one more `(kind, index)` step.
pub fn child(path: &[i32], kind: i32, index: usize) -> Vec<i32> {
    let mut out = Vec::with_capacity(path.len() + 2);
    out.extend_from_slice(path);
    out.push(kind);
    out.push(index as i32);
    out
}

/// protoc keeps the space after `//`; drop one leading space per line.
fn clean_comment(raw: &str) -> String {
    raw.lines()
        .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::super::descriptor::Location;
    use super::*;

    #[test]
    fn test_lookup_by_path() {
        let info = SourceCodeInfo {
            location: vec![
                Location {
                    path: vec![4, 0],
                    leading_comments: " A secret.\n  Indented line.\n".into(),
                },
                Location {
                    path: vec![4, 0, 3, 1, 2, 0],
                    leading_comments: " Nested field.\n".into(),
                },
            ],
        };
        let index = DocIndex::new(Some(&info));
        assert_eq!(index.get(&[4, 0]), "A secret.\n Indented line.");
        let nested = child(&child(&[4, 0], MESSAGE_NESTED_MESSAGE, 1), MESSAGE_FIELD, 0);
        assert_eq!(index.get(&nested), "Nested field.");
        assert_eq!(index.get(&[6, 0]), "");
    }
}
