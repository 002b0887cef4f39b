//! Template sources.
//!
//! Templates either ship inside the binary ([`BundledTemplates`]) or come from
//! a directory on disk ([`DirTemplates`]). The renderer only sees the
//! [`TemplateProvider`] trait, so both are interchangeable.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rust_embed::RustEmbed;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A read-only set of named templates.
///
/// Names are `/`-separated paths relative to the provider.
pub trait TemplateProvider: Send + Sync + fmt::Debug {
    /// Every template name, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Contents of the template `name`.
    fn load(&self, name: &str) -> Result<String>;

    /// Prefix shared by every name, stripped from output paths.
    fn root(&self) -> &str {
        ""
    }
}

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Assets;

/// Templates compiled into the binary, rooted at one language directory.
#[derive(Debug, Clone)]
pub struct BundledTemplates {
    language: String,
}

impl BundledTemplates {
    /// Templates under `templates/<language>/`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Languages that have bundled templates.
    pub fn languages() -> Vec<String> {
        let mut languages: Vec<String> = Assets::iter()
            .filter_map(|name| name.split_once('/').map(|(lang, _)| lang.to_string()))
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }
}

impl TemplateProvider for BundledTemplates {
    fn list(&self) -> Result<Vec<String>> {
        let prefix = format!("{}/", self.language);
        let mut names: Vec<String> = Assets::iter()
            .filter(|name| name.starts_with(&prefix))
            .map(|name| name.into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<String> {
        let file = Assets::get(name).ok_or_else(|| Error::Template {
            name: name.to_string(),
            message: "no such bundled template".into(),
        })?;
        String::from_utf8(file.data.into_owned()).map_err(|err| Error::Template {
            name: name.to_string(),
            message: format!("template is not valid UTF-8: {err}"),
        })
    }

    fn root(&self) -> &str {
        &self.language
    }
}

/// Templates read from a directory tree.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    root: PathBuf,
}

impl DirTemplates {
    /// Templates under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory templates are read from.
    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl TemplateProvider for DirTemplates {
    fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(Error::Configuration(format!(
                "template directory '{}' does not exist",
                self.root.display()
            )));
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(&self.root).to_path_buf();
                Error::io(path, err.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel_path = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|err| Error::io(entry.path(), std::io::Error::other(err.to_string())))?;
            names.push(rel_path.to_string_lossy().replace('\\', "/"));
        }
        names.sort();
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        fs::read_to_string(&path).map_err(|err| Error::io(path, err))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_languages() {
        assert_eq!(BundledTemplates::languages(), vec!["dart", "go", "rust"]);
    }

    #[test]
    fn test_bundled_list_is_rooted() {
        let provider = BundledTemplates::new("go");
        let names = provider.list().unwrap();
        assert!(!names.is_empty());
        assert!(names.iter().all(|name| name.starts_with("go/")));
        assert!(names.contains(&"go/go.mod.jinja2".to_string()));
        assert!(provider.load("go/go.mod.jinja2").unwrap().contains("module"));
    }

    #[test]
    fn test_bundled_missing_template() {
        let err = BundledTemplates::new("go").load("go/missing.jinja2").unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn test_dir_templates() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("README.md.jinja2"), "# {{ api.title }}").unwrap();
        fs::write(temp.path().join("src/lib.rs.jinja2"), "// lib").unwrap();

        let provider = DirTemplates::new(temp.path());
        assert_eq!(
            provider.list().unwrap(),
            vec!["README.md.jinja2", "src/lib.rs.jinja2"]
        );
        assert_eq!(provider.load("src/lib.rs.jinja2").unwrap(), "// lib");
        assert_eq!(provider.root(), "");
    }

    #[test]
    fn test_dir_templates_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = DirTemplates::new(temp.path().join("nope")).list().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
