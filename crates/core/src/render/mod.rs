//! Template rendering.
//!
//! Every `.jinja2` file of a provider is registered with Tera first, so any
//! template can `{% include %}` any other. Only top-level templates are then
//! rendered to the output tree; partials (a second interior `.` in the file
//! name, e.g. `message.inc.rs.jinja2`) exist only to be included.
//!
//! ## Module Structure
//!
//! - `provider`: bundled and on-disk template sources
//! - `context`: JSON view of the annotated model

pub mod context;
pub mod provider;

use std::error::Error as _;
use std::fs;
use std::path::{Path, PathBuf};

use tera::{Context, Tera};
use tracing::{debug, info};

use crate::config::CodecOptions;
use crate::error::{Error, Result};
use crate::model::Api;

pub use provider::{BundledTemplates, DirTemplates, TemplateProvider};

const TEMPLATE_EXTENSION: &str = ".jinja2";

/// A top-level template and the output path it renders to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TemplateTarget {
    /// Template name as listed by the provider.
    pub template: String,
    /// Output path relative to the output root, extension stripped.
    pub output: String,
}

/// Name of a template relative to the provider root.
fn relative_name<'a>(name: &'a str, root: &str) -> &'a str {
    if root.is_empty() {
        return name;
    }
    name.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(name)
}

fn is_partial(stem: &str) -> bool {
    let file_name = stem.rsplit('/').next().unwrap_or(stem);
    file_name.trim_start_matches('.').matches('.').count() > 1
}

/// Select the top-level templates among `names`, sorted by template name.
pub fn discover(names: &[String], root: &str) -> Vec<TemplateTarget> {
    let mut targets: Vec<TemplateTarget> = names
        .iter()
        .filter_map(|name| {
            let stem = relative_name(name, root).strip_suffix(TEMPLATE_EXTENSION)?;
            if is_partial(stem) {
                return None;
            }
            Some(TemplateTarget {
                template: relative_name(name, root).to_string(),
                output: stem.to_string(),
            })
        })
        .collect();
    targets.sort();
    targets
}

fn template_error(name: &str, err: &tera::Error) -> Error {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    Error::Template {
        name: name.to_string(),
        message,
    }
}

/// Register every template of `provider` under its root-relative name.
fn load_templates(provider: &dyn TemplateProvider, names: &[String]) -> Result<Tera> {
    let root = provider.root();
    let mut sources = Vec::new();
    for name in names {
        if !name.ends_with(TEMPLATE_EXTENSION) {
            continue;
        }
        let content = provider.load(name)?;
        sources.push((relative_name(name, root).to_string(), content));
    }
    let mut tera = Tera::default();
    tera.add_raw_templates(sources)
        .map_err(|err| template_error(provider.root(), &err))?;
    Ok(tera)
}

/// Render every top-level template of `provider` into `output_root`.
///
/// Returns the written paths in template order.
pub fn render(
    output_root: &Path,
    api: &Api,
    options: &CodecOptions,
    provider: &dyn TemplateProvider,
) -> Result<Vec<PathBuf>> {
    let names = provider.list()?;
    let targets = discover(&names, provider.root());
    if targets.is_empty() {
        return Err(Error::Configuration(
            "template set contains no top-level .jinja2 templates".into(),
        ));
    }
    let tera = load_templates(provider, &names)?;
    let context = Context::from_value(context::build(api, options))
        .map_err(|err| template_error("<context>", &err))?;

    let mut written = Vec::with_capacity(targets.len());
    for target in &targets {
        let rendered = tera
            .render(&target.template, &context)
            .map_err(|err| template_error(&target.template, &err))?;
        let path = output_root.join(&target.output);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        fs::write(&path, rendered).map_err(|err| Error::io(&path, err))?;
        debug!(template = %target.template, path = %path.display(), "Rendered template.");
        written.push(path);
    }
    info!(
        files = written.len(),
        output = %output_root.display(),
        "Rendered client library."
    );
    Ok(written)
}
