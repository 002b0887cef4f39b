//! Generation configuration.
//!
//! A run is configured from an optional `clientgen.toml` file merged with
//! command-line values. The core never reads the environment; callers build a
//! [`Config`] and hand the pieces to the pipeline.
//!
//! ```toml
//! [general]
//! specification-format = "protobuf"
//! specification-source = "descriptors/secretmanager.binpb"
//! service-config = "secretmanager_v1.yaml"
//! language = "rust"
//!
//! [source]
//! include-list = "google/cloud/secretmanager/v1/service.proto"
//!
//! [codec]
//! copyright-year = "2024"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parsed `clientgen.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Input, output and language selection.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Source options, including the selection keys `skipped-ids` and
    /// `included-ids`.
    #[serde(default)]
    pub source: BTreeMap<String, String>,
    /// Free-form codec options, interpreted per language.
    #[serde(default)]
    pub codec: BTreeMap<String, String>,
}

/// The `[general]` table. Every key may also come from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneralConfig {
    /// `protobuf` or `openapi`.
    pub specification_format: Option<String>,
    /// Descriptor set or OpenAPI document.
    pub specification_source: Option<PathBuf>,
    /// Optional `google.api.Service` YAML.
    pub service_config: Option<PathBuf>,
    /// Target language, or a comma-separated list of them.
    pub language: Option<String>,
    /// Templates to use instead of the bundled ones.
    pub template_dir: Option<PathBuf>,
    /// Output root.
    pub output: Option<PathBuf>,
}

impl Config {
    /// Parse `content`; `path` is only used in errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::parse(&content, path)
    }

    /// Overlay `other` on top of `self`; values present in `other` win.
    pub fn merge(mut self, other: Config) -> Config {
        let general = other.general;
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if general.$field.is_some() {
                    self.general.$field = general.$field;
                })*
            };
        }
        overlay!(
            specification_format,
            specification_source,
            service_config,
            language,
            template_dir,
            output
        );
        self.source.extend(other.source);
        self.codec.extend(other.codec);
        self
    }
}

/// Split a `key=value` command-line option.
pub fn parse_key_value(input: &str) -> Result<(String, String)> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(Error::Configuration(format!(
            "expected KEY=VALUE, got '{input}'"
        ))),
    }
}

/// Split a comma-separated option value, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// String-keyed options handed to the descriptor parsers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceOptions(BTreeMap<String, String>);

impl SourceOptions {
    /// Proto files (or path prefixes) whose elements become part of the API.
    pub const INCLUDE_LIST: &'static str = "include-list";
    /// Proto files (or path prefixes) left out of the API.
    pub const EXCLUDE_LIST: &'static str = "exclude-list";
    /// Overrides the derived package name.
    pub const PACKAGE_NAME: &'static str = "package-name";
    /// Name of the single service synthesized from an OpenAPI document.
    pub const SERVICE_NAME: &'static str = "service-name";
    /// Element IDs removed by the filter.
    pub const SKIPPED_IDS: &'static str = "skipped-ids";
    /// Element IDs the filter keeps, together with their ancestors.
    pub const INCLUDED_IDS: &'static str = "included-ids";

    /// Wrap an existing map.
    pub fn new(options: BTreeMap<String, String>) -> Self {
        Self(options)
    }

    /// Value of `key`, treating an empty value as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Comma-separated list option; `None` when the key is absent or empty.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(split_list)
    }

    /// Set `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl From<BTreeMap<String, String>> for SourceOptions {
    fn from(options: BTreeMap<String, String>) -> Self {
        Self(options)
    }
}

/// Free-form per-language options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodecOptions(BTreeMap<String, String>);

impl CodecOptions {
    /// Year for license headers.
    pub const COPYRIGHT_YEAR: &'static str = "copyright-year";
    /// Replaces the package name the codec would derive.
    pub const PACKAGE_NAME_OVERRIDE: &'static str = "package-name-override";
    /// Version of the generated library.
    pub const VERSION: &'static str = "version";
    /// Go module path.
    pub const MODULE_PATH: &'static str = "module-path";
    /// Mark the generated library as unpublishable.
    pub const NOT_FOR_PUBLICATION: &'static str = "not-for-publication";
    /// Run the language formatter over the output.
    pub const POST_FORMAT: &'static str = "post-format";

    /// Wrap an existing map.
    pub fn new(options: BTreeMap<String, String>) -> Self {
        Self(options)
    }

    /// Value of `key`, treating an empty value as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Set `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// `true`/`false` option; absent means `false`.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(Error::Configuration(format!(
                "codec option '{key}' must be true or false, got '{other}'"
            ))),
        }
    }

    /// The year stamped into license headers. Always explicit input, never
    /// derived from the clock.
    pub fn copyright_year(&self) -> Result<Option<String>> {
        match self.get(Self::COPYRIGHT_YEAR) {
            None => Ok(None),
            Some(year) if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) => {
                Ok(Some(year.to_string()))
            }
            Some(other) => Err(Error::Configuration(format!(
                "copyright-year must be a four digit year, got '{other}'"
            ))),
        }
    }

    /// Library version, `0.1.0` unless set.
    pub fn version(&self) -> &str {
        self.get(Self::VERSION).unwrap_or("0.1.0")
    }

    /// All options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for CodecOptions {
    fn from(options: BTreeMap<String, String>) -> Self {
        Self(options)
    }
}
