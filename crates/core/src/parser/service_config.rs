//! Service-config documents (`google.api.Service` YAML).
//!
//! Only the parts the generator consumes are modelled: the title and summary,
//! per-element documentation overrides, HTTP rules and the list of APIs
//! (which names the mixins a service exposes).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::binding;
use crate::error::{Error, Result};
use crate::model::{Api, HttpVerb, PathInfo};

/// A `google.api.Service` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    /// Service hostname, e.g. `secretmanager.googleapis.com`.
    #[serde(default)]
    pub name: String,
    /// Human-readable API title.
    #[serde(default)]
    pub title: String,
    /// Interfaces the service exposes, mixins included.
    #[serde(default)]
    pub apis: Vec<ApiEntry>,
    /// Summary and per-element documentation.
    #[serde(default)]
    pub documentation: Documentation,
    /// REST bindings that override or add to the descriptor's.
    #[serde(default)]
    pub http: Http,
}

/// One entry of `apis`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEntry {
    /// Fully-qualified interface name, without a leading `.`.
    pub name: String,
}

/// The `documentation` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Documentation {
    /// One-paragraph API description.
    #[serde(default)]
    pub summary: String,
    /// Per-element documentation overrides.
    #[serde(default)]
    pub rules: Vec<DocumentationRule>,
}

/// Documentation for a single element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentationRule {
    /// Fully-qualified element name, without a leading `.`.
    pub selector: String,
    /// Replaces the element's own documentation.
    #[serde(default)]
    pub description: String,
}

/// The `http` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Http {
    /// One rule per bound method.
    #[serde(default)]
    pub rules: Vec<HttpRule>,
}

/// REST binding of one method. Exactly one pattern field is expected;
/// `additional_bindings` are not read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpRule {
    /// Fully-qualified method name, without a leading `.`.
    pub selector: String,
    /// `GET` path.
    pub get: Option<String>,
    /// `PUT` path.
    pub put: Option<String>,
    /// `POST` path.
    pub post: Option<String>,
    /// `DELETE` path.
    pub delete: Option<String>,
    /// `PATCH` path.
    pub patch: Option<String>,
    /// Any other verb.
    pub custom: Option<CustomPattern>,
    /// Body field path, `*` or empty.
    #[serde(default)]
    pub body: String,
}

/// A pattern with a verb outside the standard set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomPattern {
    /// The verb, e.g. `HEAD`.
    pub kind: String,
    /// The path.
    pub path: String,
}

impl HttpRule {
    /// The primary binding of the rule.
    pub fn path_info(&self) -> Result<PathInfo> {
        let (verb, path) = if let Some(path) = &self.get {
            (HttpVerb::Get, path)
        } else if let Some(path) = &self.post {
            (HttpVerb::Post, path)
        } else if let Some(path) = &self.put {
            (HttpVerb::Put, path)
        } else if let Some(path) = &self.patch {
            (HttpVerb::Patch, path)
        } else if let Some(path) = &self.delete {
            (HttpVerb::Delete, path)
        } else if let Some(custom) = &self.custom {
            let verb = HttpVerb::parse(&custom.kind).ok_or_else(|| {
                Error::Specification(format!(
                    "http rule for '{}' uses unsupported verb '{}'",
                    self.selector, custom.kind
                ))
            })?;
            (verb, &custom.path)
        } else {
            return Err(Error::Specification(format!(
                "http rule for '{}' has no pattern",
                self.selector
            )));
        };
        binding(verb, path, &self.body)
    }
}

impl ServiceConfig {
    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::parse(&content, path)
    }

    /// Parse `content`; `path` is only used in errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The HTTP rule whose selector names `id` (with or without leading `.`).
    pub fn http_rule(&self, id: &str) -> Option<&HttpRule> {
        let selector = id.strip_prefix('.').unwrap_or(id);
        self.http.rules.iter().find(|rule| rule.selector == selector)
    }

    /// Documentation override for `id`, if the config has one.
    pub fn documentation_for(&self, id: &str) -> Option<&str> {
        let selector = id.strip_prefix('.').unwrap_or(id);
        self.documentation
            .rules
            .iter()
            .find(|rule| rule.selector == selector)
            .map(|rule| rule.description.as_str())
    }

    /// Whether the config lists `id` among its APIs.
    pub fn lists_api(&self, id: &str) -> bool {
        let name = id.strip_prefix('.').unwrap_or(id);
        self.apis.iter().any(|api| api.name == name)
    }

    /// Apply title, summary, default host and documentation overrides.
    pub fn apply(&self, api: &mut Api) {
        if !self.title.is_empty() {
            api.title.clone_from(&self.title);
        }
        if !self.documentation.summary.is_empty() {
            api.description = self.documentation.summary.trim().to_string();
        }
        if !self.name.is_empty() {
            for service in api.state.service_by_id.values_mut() {
                if service.default_host.is_empty() {
                    service.default_host.clone_from(&self.name);
                }
            }
        }

        for rule in &self.documentation.rules {
            let id = format!(".{}", rule.selector);
            let description = rule.description.trim().to_string();
            let state = &mut api.state;
            if let Some(message) = state.message_by_id.get_mut(&id) {
                message.documentation = description;
            } else if let Some(enum_) = state.enum_by_id.get_mut(&id) {
                enum_.documentation = description;
            } else if let Some(service) = state.service_by_id.get_mut(&id) {
                service.documentation = description;
            } else if let Some(method) = state.method_by_id.get_mut(&id) {
                method.documentation = description;
            } else if let Some((owner, field_name)) = id.rsplit_once('.')
                && let Some(message) = state.message_by_id.get_mut(owner)
                && let Some(field) = message.fields.iter_mut().find(|f| f.name == field_name)
            {
                field.documentation = description;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{Field, Message, Service, Typez};

    const CONFIG: &str = r#"
type: google.api.Service
config_version: 3
name: secretmanager.googleapis.com
title: Secret Manager API
apis:
- name: google.cloud.location.Locations
- name: google.cloud.secretmanager.v1.SecretManagerService
documentation:
  summary: |-
    Stores sensitive data such as API keys.
  rules:
  - selector: google.cloud.secretmanager.v1.Secret
    description: A secret.
  - selector: google.cloud.secretmanager.v1.Secret.name
    description: The resource name.
http:
  rules:
  - selector: google.cloud.location.Locations.GetLocation
    get: '/v1/{name=projects/*/locations/*}'
  - selector: google.cloud.location.Locations.ListLocations
    custom:
      kind: GET
      path: '/v1/{name=projects/*}/locations'
"#;

    fn config() -> ServiceConfig {
        ServiceConfig::parse(CONFIG, Path::new("secretmanager_v1.yaml")).unwrap()
    }

    #[test]
    fn test_parse_service_config() {
        let config = config();
        assert_eq!(config.title, "Secret Manager API");
        assert_eq!(config.apis.len(), 2);
        assert!(config.lists_api(".google.cloud.location.Locations"));

        let rule = config
            .http_rule(".google.cloud.location.Locations.GetLocation")
            .unwrap();
        let info = rule.path_info().unwrap();
        assert_eq!(info.verb, HttpVerb::Get);
        assert_eq!(info.path_template.to_string(), "/v1/{name}");
        assert_eq!(info.body_field_path, None);

        let custom = config
            .http_rule("google.cloud.location.Locations.ListLocations")
            .unwrap();
        assert_eq!(custom.path_info().unwrap().verb, HttpVerb::Get);
    }

    #[test]
    fn test_rule_without_pattern_is_an_error() {
        let rule = HttpRule {
            selector: "a.B.C".into(),
            ..HttpRule::default()
        };
        assert!(matches!(
            rule.path_info().unwrap_err(),
            Error::Specification(_)
        ));
    }

    #[test]
    fn test_apply_overrides_documentation() {
        let mut api = Api::new("secretmanager", "google.cloud.secretmanager.v1");
        let id = ".google.cloud.secretmanager.v1.Secret";
        let mut secret = Message::new(id, "Secret", "google.cloud.secretmanager.v1");
        secret.fields.push(Field::new(id, "name", Typez::String));
        api.state.insert_message(secret).unwrap();
        api.state
            .insert_service(Service::new(
                ".google.cloud.secretmanager.v1.SecretManagerService",
                "SecretManagerService",
                "google.cloud.secretmanager.v1",
            ))
            .unwrap();

        config().apply(&mut api);

        assert_eq!(api.title, "Secret Manager API");
        assert_eq!(api.description, "Stores sensitive data such as API keys.");
        let secret = api.state.message(id).unwrap();
        assert_eq!(secret.documentation, "A secret.");
        assert_eq!(secret.fields[0].documentation, "The resource name.");
        let service = api
            .state
            .service(".google.cloud.secretmanager.v1.SecretManagerService")
            .unwrap();
        assert_eq!(service.default_host, "secretmanager.googleapis.com");
    }
}
