//! The generation state machine.
//!
//! A run moves strictly forward through [`Stage`]: the model is parsed,
//! cross-referenced and filtered once, then annotated and rendered for each
//! requested language. Any failure is wrapped with the stage being entered.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::codec::{Codec, new_codec};
use crate::config::{CodecOptions, SourceOptions};
use crate::error::{Error, Result, Stage};
use crate::filter::{self, Selection};
use crate::model::Api;
use crate::parser::{self, Format};
use crate::postprocess;
use crate::render::{self, BundledTemplates, DirTemplates, TemplateProvider};
use crate::xref;

/// Everything needed to go from a source description to output trees.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Kind of source description.
    pub format: Format,
    /// Descriptor set file or directory, or OpenAPI document.
    pub source: PathBuf,
    /// Optional `google.api.Service` YAML.
    pub service_config: Option<PathBuf>,
    /// Options read by the parser and the element filter.
    pub source_options: SourceOptions,
    /// Codec names; every one renders its own tree.
    pub languages: Vec<String>,
    /// Output root. With several languages each one renders into
    /// `<output>/<language>`.
    pub output: PathBuf,
    /// Template root replacing the bundled templates. With several languages
    /// each one reads `<template_dir>/<language>`.
    pub template_dir: Option<PathBuf>,
    /// Options handed to every codec.
    pub codec_options: CodecOptions,
}

/// One language rendering into one output tree.
#[derive(Debug)]
pub struct Target {
    /// Annotates the model for the language.
    pub codec: Box<dyn Codec>,
    /// Templates to render.
    pub templates: Box<dyn TemplateProvider>,
    /// Directory the rendered files land in.
    pub output_root: PathBuf,
}

impl GenerateRequest {
    /// Resolve codecs and template providers. Unknown languages and bad codec
    /// options fail here, before any parsing.
    pub fn targets(&self) -> Result<Vec<Target>> {
        if self.languages.is_empty() {
            return Err(Error::Configuration("no target language given".into()));
        }
        let several = self.languages.len() > 1;
        self.languages
            .iter()
            .map(|language| {
                let codec = new_codec(language, &self.codec_options)?;
                let templates: Box<dyn TemplateProvider> = match &self.template_dir {
                    Some(dir) if several => Box::new(DirTemplates::new(dir.join(language))),
                    Some(dir) => Box::new(DirTemplates::new(dir)),
                    None => Box::new(BundledTemplates::new(codec.template_dir())),
                };
                let output_root = if several {
                    self.output.join(language)
                } else {
                    self.output.clone()
                };
                Ok(Target {
                    codec,
                    templates,
                    output_root,
                })
            })
            .collect()
    }
}

/// Parse, cross-reference and filter the source of `request`.
pub fn prepare(request: &GenerateRequest) -> Result<Api> {
    let selection = Selection::from_options(&request.source_options)?;
    let mut api = parser::parse(
        request.format,
        &request.source,
        &request.source_options,
        request.service_config.as_deref(),
    )
    .map_err(|err| err.at_stage(Stage::Parsed))?;

    xref::cross_reference(&mut api).map_err(|err| err.at_stage(Stage::CrossReferenced))?;
    let report = filter::apply(&mut api, &selection);
    debug!(
        removed = report.removed.len(),
        stale = report.stale_ids.len(),
        "Applied element selection."
    );
    Ok(api)
}

/// Generate one language from a parsed model.
pub fn generate(
    model: Api,
    codec: &dyn Codec,
    output_root: &Path,
    templates: &dyn TemplateProvider,
) -> Result<Vec<PathBuf>> {
    let mut api = model;
    xref::cross_reference(&mut api).map_err(|err| err.at_stage(Stage::CrossReferenced))?;
    annotate_and_render(api, codec, output_root, templates)
}

fn annotate_and_render(
    mut api: Api,
    codec: &dyn Codec,
    output_root: &Path,
    templates: &dyn TemplateProvider,
) -> Result<Vec<PathBuf>> {
    codec
        .annotate_model(&mut api)
        .map_err(|err| err.at_stage(Stage::Annotated))?;
    let written = render::render(output_root, &api, codec.options(), templates)
        .map_err(|err| err.at_stage(Stage::Rendered))?;

    let post_format = codec
        .options()
        .get_bool(CodecOptions::POST_FORMAT)
        .map_err(|err| err.at_stage(Stage::Done))?;
    if post_format {
        postprocess::run_formatter(codec, output_root).map_err(|err| err.at_stage(Stage::Done))?;
    }
    info!(
        language = codec.name(),
        files = written.len(),
        output = %output_root.display(),
        "Generated client library."
    );
    Ok(written)
}

/// Annotate and render a cross-referenced model for every target.
///
/// Each target works on its own clone of `api`, so targets run in parallel.
pub fn generate_all(api: &Api, targets: &[Target]) -> Result<Vec<PathBuf>> {
    let results: Vec<Result<Vec<PathBuf>>> = targets
        .par_iter()
        .map(|target| {
            annotate_and_render(
                api.clone(),
                target.codec.as_ref(),
                &target.output_root,
                target.templates.as_ref(),
            )
        })
        .collect();
    let mut written = Vec::new();
    for result in results {
        written.extend(result?);
    }
    Ok(written)
}

/// Run a whole request, from source to output trees.
pub fn run(request: &GenerateRequest) -> Result<Vec<PathBuf>> {
    let targets = request.targets()?;
    let api = prepare(request)?;
    generate_all(&api, &targets)
}
