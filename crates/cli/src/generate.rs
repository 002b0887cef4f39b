use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use clientgen_core::config::{GeneralConfig, parse_key_value, split_list};
use clientgen_core::{CodecOptions, Config, Format, GenerateRequest, SourceOptions};
use tracing::debug;

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    #[arg(
        long = "config",
        value_name = "PATH",
        help = "clientgen.toml with defaults for every other flag"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "specification-format",
        value_name = "FORMAT",
        help = "Source format: protobuf or openapi"
    )]
    pub specification_format: Option<String>,
    #[arg(
        long = "specification-source",
        value_name = "PATH",
        help = "Descriptor set (file or directory) or OpenAPI document"
    )]
    pub specification_source: Option<PathBuf>,
    #[arg(
        long = "service-config",
        value_name = "PATH",
        help = "Service configuration YAML with documentation, HTTP rules and mixins"
    )]
    pub service_config: Option<PathBuf>,
    #[arg(
        long = "language",
        value_name = "LANGUAGE",
        value_delimiter = ',',
        help = "Target language: rust, go or dart. Repeat for several targets"
    )]
    pub language: Vec<String>,
    #[arg(long = "output", value_name = "DIR", help = "Output directory")]
    pub output: Option<PathBuf>,
    #[arg(
        long = "template-dir",
        value_name = "DIR",
        help = "Template directory replacing the bundled templates"
    )]
    pub template_dir: Option<PathBuf>,
    #[arg(long = "source-option", value_name = "KEY=VALUE", help = "Parser option")]
    pub source_option: Vec<String>,
    #[arg(long = "codec-option", value_name = "KEY=VALUE", help = "Codec option")]
    pub codec_option: Vec<String>,
    #[arg(
        long = "skipped-ids",
        value_name = "IDS",
        help = "Comma-separated element IDs to leave out"
    )]
    pub skipped_ids: Option<String>,
    #[arg(
        long = "included-ids",
        value_name = "IDS",
        help = "Comma-separated element IDs to keep, with their ancestors"
    )]
    pub included_ids: Option<String>,
}

pub fn run(args: GenerateArgs) -> Result<(), String> {
    let request = build_request(args)?;
    debug!(?request, "Resolved generation request.");
    let written = clientgen_core::run(&request).map_err(|err| err.to_string())?;
    println!(
        "Generated {} files in {}",
        written.len(),
        request.output.display()
    );
    Ok(())
}

fn options(pairs: &[String]) -> Result<BTreeMap<String, String>, String> {
    pairs
        .iter()
        .map(|pair| parse_key_value(pair).map_err(|err| err.to_string()))
        .collect()
}

/// Command-line values as a config overlay.
fn overlay(args: &GenerateArgs) -> Result<Config, String> {
    let mut source = options(&args.source_option)?;
    if let Some(ids) = &args.skipped_ids {
        source.insert(SourceOptions::SKIPPED_IDS.to_string(), ids.clone());
    }
    if let Some(ids) = &args.included_ids {
        source.insert(SourceOptions::INCLUDED_IDS.to_string(), ids.clone());
    }
    Ok(Config {
        general: GeneralConfig {
            specification_format: args.specification_format.clone(),
            specification_source: args.specification_source.clone(),
            service_config: args.service_config.clone(),
            language: (!args.language.is_empty()).then(|| args.language.join(",")),
            template_dir: args.template_dir.clone(),
            output: args.output.clone(),
        },
        source,
        codec: options(&args.codec_option)?,
    })
}

pub fn build_request(args: GenerateArgs) -> Result<GenerateRequest, String> {
    let base = match &args.config {
        Some(path) => Config::load(path).map_err(|err| err.to_string())?,
        None => Config::default(),
    };
    let config = base.merge(overlay(&args)?);
    let general = config.general;

    let format = general
        .specification_format
        .as_deref()
        .ok_or("Missing --specification-format")
        .and_then(|format| Format::from_str(format).map_err(|_| "Invalid --specification-format"))
        .map_err(str::to_string)?;
    let source = general
        .specification_source
        .ok_or("Missing --specification-source")?;
    let output = general.output.ok_or("Missing --output")?;
    let languages = general
        .language
        .as_deref()
        .map(split_list)
        .unwrap_or_default();
    if languages.is_empty() {
        return Err("Missing --language".to_string());
    }

    Ok(GenerateRequest {
        format,
        source,
        service_config: general.service_config,
        source_options: SourceOptions::new(config.source),
        languages,
        output,
        template_dir: general.template_dir,
        codec_options: CodecOptions::new(config.codec),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args() -> GenerateArgs {
        GenerateArgs {
            specification_format: Some("openapi".into()),
            specification_source: Some("openapi.yaml".into()),
            language: vec!["rust".into()],
            output: Some("out".into()),
            ..GenerateArgs::default()
        }
    }

    #[test]
    fn test_flags_only() {
        let mut args = args();
        args.codec_option = vec!["copyright-year=2024".into()];
        args.skipped_ids = Some(".pkg.Legacy".into());
        let request = build_request(args).unwrap();
        assert_eq!(request.format, Format::OpenApi);
        assert_eq!(request.languages, vec!["rust"]);
        assert_eq!(request.codec_options.get("copyright-year"), Some("2024"));
        assert_eq!(
            request.source_options.get(SourceOptions::SKIPPED_IDS),
            Some(".pkg.Legacy")
        );
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clientgen.toml");
        fs::write(
            &path,
            r#"
[general]
specification-format = "protobuf"
specification-source = "descriptors.binpb"
language = "go,dart"
output = "generated"

[codec]
copyright-year = "2023"
version = "1.2.0"
"#,
        )
        .unwrap();

        let request = build_request(GenerateArgs {
            config: Some(path.clone()),
            codec_option: vec!["copyright-year=2025".into()],
            ..GenerateArgs::default()
        })
        .unwrap();
        assert_eq!(request.format, Format::Protobuf);
        assert_eq!(request.languages, vec!["go", "dart"]);
        assert_eq!(request.output, PathBuf::from("generated"));
        assert_eq!(request.codec_options.get("copyright-year"), Some("2025"));
        assert_eq!(request.codec_options.version(), "1.2.0");

        let request = build_request(GenerateArgs {
            config: Some(path),
            language: vec!["rust".into()],
            ..GenerateArgs::default()
        })
        .unwrap();
        assert_eq!(request.languages, vec!["rust"]);
    }

    #[test]
    fn test_missing_values() {
        let mut no_language = args();
        no_language.language.clear();
        assert_eq!(build_request(no_language).unwrap_err(), "Missing --language");

        let mut bad_format = args();
        bad_format.specification_format = Some("wsdl".into());
        assert_eq!(
            build_request(bad_format).unwrap_err(),
            "Invalid --specification-format"
        );
    }

    #[test]
    fn test_malformed_option() {
        let mut args = args();
        args.source_option = vec!["no-equals-sign".into()];
        assert!(build_request(args).unwrap_err().contains("KEY=VALUE"));
    }
}
