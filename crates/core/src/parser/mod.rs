//! Descriptor parsers.
//!
//! Both backends produce the same [`Api`] and populate the same
//! [`crate::model::ApiState`] maps, so cross-reference, codecs and templates
//! never know which format the model came from.
//!
//! ## Module Structure
//!
//! - `protobuf`: binary `FileDescriptorSet` -> model
//! - `openapi`: OpenAPI v3 JSON/YAML -> model
//! - `service_config`: service-config YAML (titles, doc overrides, HTTP rules, mixins)

pub mod openapi;
pub mod protobuf;
pub mod service_config;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::config::SourceOptions;
use crate::error::{Error, Result};
use crate::model::{Api, HttpVerb, PathInfo, PathTemplate};

pub use service_config::ServiceConfig;

/// Source format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// An encoded `FileDescriptorSet`.
    Protobuf,
    /// An OpenAPI v3 document, JSON or YAML.
    OpenApi,
}

impl Format {
    /// Name used on the command line and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Protobuf => "protobuf",
            Format::OpenApi => "openapi",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "protobuf" => Ok(Format::Protobuf),
            "openapi" => Ok(Format::OpenApi),
            other => Err(Error::Configuration(format!(
                "unknown specification format '{other}', expected 'protobuf' or 'openapi'"
            ))),
        }
    }
}

/// Which source files contribute elements to the generated API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// Every file.
    All,
    /// Only the listed files.
    Include(BTreeSet<String>),
    /// Every file except the listed ones.
    Exclude(BTreeSet<String>),
}

impl FileFilter {
    /// Build the filter from `include-list` / `exclude-list`. Giving both is a
    /// configuration error.
    pub fn from_options(options: &SourceOptions) -> Result<Self> {
        let include = options.list(SourceOptions::INCLUDE_LIST);
        let exclude = options.list(SourceOptions::EXCLUDE_LIST);
        match (include, exclude) {
            (Some(_), Some(_)) => Err(Error::Configuration(
                "include-list and exclude-list are mutually exclusive".into(),
            )),
            (Some(include), None) => Ok(FileFilter::Include(include.into_iter().collect())),
            (None, Some(exclude)) => Ok(FileFilter::Exclude(exclude.into_iter().collect())),
            (None, None) => Ok(FileFilter::All),
        }
    }

    /// Whether the file `name` contributes elements.
    pub fn allows(&self, name: &str) -> bool {
        match self {
            FileFilter::All => true,
            FileFilter::Include(names) => names.contains(name),
            FileFilter::Exclude(names) => !names.contains(name),
        }
    }
}

/// Parse a source into an unresolved model.
///
/// Options are validated before any model construction starts.
pub fn parse(
    format: Format,
    source: &Path,
    options: &SourceOptions,
    service_config: Option<&Path>,
) -> Result<Api> {
    let filter = FileFilter::from_options(options)?;
    let service_config = service_config.map(ServiceConfig::load).transpose()?;

    debug!(
        format = %format,
        source = %source.display(),
        "Parsing API specification."
    );
    let mut api = match format {
        Format::Protobuf => protobuf::parse(source, &filter, options, service_config.as_ref())?,
        Format::OpenApi => openapi::parse(source, options)?,
    };

    if let Some(config) = &service_config {
        config.apply(&mut api);
    }

    debug!(
        messages = api.state.message_by_id.len(),
        enums = api.state.enum_by_id.len(),
        services = api.services.len(),
        methods = api.state.method_by_id.len(),
        "Parsed API specification."
    );
    Ok(api)
}

/// Build a [`PathInfo`] from a verb, a path and a body selector.
pub(crate) fn binding(verb: HttpVerb, path: &str, body: &str) -> Result<PathInfo> {
    Ok(PathInfo::new(verb, PathTemplate::parse(path)?).with_body(body))
}

/// Make a type reference fully-qualified with a leading `.`.
///
/// References already qualified keep their package; bare names are placed in
/// `package`.
pub(crate) fn qualify(name: &str, package: &str) -> String {
    if name.starts_with('.') {
        name.to_string()
    } else if name.contains('.') {
        format!(".{name}")
    } else {
        element_id(package, name)
    }
}

/// `.package.Name`, or `.Name` for the empty package.
pub(crate) fn element_id(package: &str, name: &str) -> String {
    if package.is_empty() {
        format!(".{name}")
    } else {
        format!(".{package}.{name}")
    }
}

/// Short API name from a package, skipping trailing version components.
pub(crate) fn api_name_from_package(package: &str) -> String {
    package
        .rsplit('.')
        .find(|part| !is_version(part))
        .unwrap_or(package)
        .to_string()
}

fn is_version(part: &str) -> bool {
    part.strip_prefix('v')
        .is_some_and(|rest| rest.chars().next().is_some_and(|c| c.is_ascii_digit()))
}
