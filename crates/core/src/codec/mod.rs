//! Language codecs.
//!
//! A codec knows how one target language spells the model: identifiers,
//! types, REST path formats and request accessors. Its only write access to
//! the model is [`Codec::annotate_model`], which fills every node's
//! annotation slot with the values the templates need.
//!
//! ## Module Structure
//!
//! - `naming`: casing helpers shared by all codecs
//! - `rust`, `go`, `dart`: the concrete codecs
//!
//! Codecs are looked up by name in a static [`registry`] once per run.

pub mod dart;
pub mod go;
pub mod naming;
pub mod rust;

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, error};

use self::naming::{escape_reserved, to_camel_case, to_pascal_case, to_snake_case};
use crate::config::CodecOptions;
use crate::error::{Error, Result};
use crate::model::wkt::WKT_PACKAGE;
use crate::model::{
    Annotation, Api, ApiState, Enum, EnumValue, Field, HttpVerb, Message, Method, PathSegment,
    Service, Typez,
};

/// One query parameter of a REST call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParam {
    /// Wire (JSON) name sent in the query string.
    pub name: String,
    /// Expression reading the value from the request.
    pub accessor: String,
    /// Sent once per element.
    pub repeated: bool,
    /// Skipped when unset.
    pub optional: bool,
}

/// Per-language naming, typing and annotation.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Registry name of the language.
    fn name(&self) -> &'static str;

    /// Directory of the bundled templates for this language.
    fn template_dir(&self) -> &'static str;

    /// Options the codec was built with.
    fn options(&self) -> &CodecOptions;

    /// Identifiers that get a trailing `_` when a name collides with them.
    fn reserved_words(&self) -> &HashSet<&'static str>;

    /// snake_case, escaped.
    fn to_snake(&self, name: &str) -> String {
        escape_reserved(to_snake_case(name), self.reserved_words())
    }

    /// PascalCase, escaped.
    fn to_pascal(&self, name: &str) -> String {
        escape_reserved(to_pascal_case(name), self.reserved_words())
    }

    /// lowerCamelCase, escaped.
    fn to_camel(&self, name: &str) -> String {
        escape_reserved(to_camel_case(name), self.reserved_words())
    }

    /// Name of a message relative to its package, nested names included.
    fn message_name(&self, message: &Message, state: &ApiState) -> String;

    /// Name usable from anywhere in the generated library.
    fn fq_message_name(&self, message: &Message, state: &ApiState) -> String;

    /// Enum counterpart of [`Codec::message_name`].
    fn enum_name(&self, enum_: &Enum, state: &ApiState) -> String;

    /// Enum counterpart of [`Codec::fq_message_name`].
    fn fq_enum_name(&self, enum_: &Enum, state: &ApiState) -> String;

    /// Identifier of an enum value, with any prefix the language requires.
    fn enum_value_name(&self, value: &EnumValue, state: &ApiState) -> String;

    /// Identifier of a field in the generated type.
    fn field_name(&self, field: &Field) -> String;

    /// Declared type of a field. Logs and returns `""` when the field's type
    /// does not resolve.
    fn field_type(&self, field: &Field, state: &ApiState) -> String;

    /// Accessor expression for a (possibly dotted) request field path.
    fn field_accessor(&self, path: &str) -> String;

    /// The placeholder a path argument is spliced into.
    fn path_placeholder(&self, argument: &str) -> String;

    /// Expression for the whole request.
    fn request_expr(&self) -> &'static str;

    /// Identifier of the client method for an RPC.
    fn method_name(&self, method: &Method) -> String;

    /// Identifier of the generated client type.
    fn service_name(&self, service: &Service) -> String {
        self.to_pascal(&service.name)
    }

    /// Library-level values: package name, version, license year.
    fn api_annotation(&self, api: &Api) -> Result<ApiAnnotation>;

    /// Formatter to run in the output root, as program and arguments.
    fn formatter(&self) -> (&'static str, &'static [&'static str]);

    /// Path format with one placeholder per field path, and the argument
    /// expressions in placeholder order.
    fn http_path_format(&self, method: &Method) -> (String, Vec<String>) {
        let Some(info) = &method.path_info else {
            return (String::new(), Vec::new());
        };
        let mut format = String::new();
        let mut args = Vec::new();
        for segment in &info.path_template.segments {
            match segment {
                PathSegment::Literal(literal) => {
                    format.push('/');
                    format.push_str(literal);
                }
                PathSegment::FieldPath(path) => {
                    let accessor = self.field_accessor(path);
                    format.push('/');
                    format.push_str(&self.path_placeholder(&accessor));
                    args.push(accessor);
                }
                PathSegment::Verb(verb) => {
                    format.push(':');
                    format.push_str(verb);
                }
            }
        }
        if !format.starts_with('/') {
            format.insert(0, '/');
        }
        (format, args)
    }

    /// Request fields sent in the query string, in wire-name order.
    fn query_params(&self, method: &Method, state: &ApiState) -> Vec<QueryParam> {
        let Some(info) = &method.path_info else {
            return Vec::new();
        };
        let Some(request) = state.message(&method.input_type_id) else {
            return Vec::new();
        };
        info.query_parameters
            .iter()
            .filter_map(|wire| request.fields.iter().find(|f| &f.json_name == wire))
            .map(|field| QueryParam {
                name: field.json_name.clone(),
                accessor: self.field_accessor(&field.name),
                repeated: field.repeated,
                optional: field.optional,
            })
            .collect()
    }

    /// `*` sends the whole request, a field name sends that field, no body
    /// yields an empty string.
    fn body_accessor(&self, method: &Method) -> String {
        match method
            .path_info
            .as_ref()
            .and_then(|info| info.body_field_path.as_deref())
        {
            None => String::new(),
            Some("*") => self.request_expr().to_string(),
            Some(field) => self.field_accessor(field),
        }
    }

    /// Fill the annotation slot of every generated node.
    fn annotate_model(&self, api: &mut Api) -> Result<()>;
}

type Constructor = fn(&CodecOptions) -> Result<Box<dyn Codec>>;

static REGISTRY: &[(&str, Constructor)] = &[
    ("rust", rust::RustCodec::boxed),
    ("go", go::GoCodec::boxed),
    ("dart", dart::DartCodec::boxed),
];

/// Known codecs, by language name.
pub fn registry() -> &'static [(&'static str, Constructor)] {
    REGISTRY
}

/// Resolve a language name to a codec.
pub fn new_codec(language: &str, options: &CodecOptions) -> Result<Box<dyn Codec>> {
    let (_, constructor) = REGISTRY
        .iter()
        .find(|(name, _)| *name == language)
        .ok_or_else(|| {
            let known: Vec<&str> = REGISTRY.iter().map(|(name, _)| *name).collect();
            Error::Configuration(format!(
                "unknown language '{language}', expected one of: {}",
                known.join(", ")
            ))
        })?;
    constructor(options)
}

// ============================================================================
// Annotations
// ============================================================================

/// Library-level template values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiAnnotation {
    /// Name of the generated package, crate or module.
    pub package_name: String,
    /// Import path (Go) or crate root; empty when the language has none.
    pub module_path: String,
    /// Version of the generated library.
    pub version: String,
    /// License header year; no header when absent.
    pub copyright_year: Option<String>,
    /// Keep the library out of package registries.
    pub not_for_publication: bool,
    /// Human-readable API title.
    pub title: String,
    /// API description, one entry per line.
    pub description_lines: Vec<String>,
    /// Host of the first service that names one.
    pub default_host: String,
    /// Libraries generated for other packages that this one refers to, named
    /// the way the language names them. Empty when the language resolves
    /// them without a manifest entry.
    pub dependencies: Vec<String>,
}

/// Template values for a message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageAnnotation {
    /// Identifier of the generated type.
    pub name: String,
    /// Name relative to the package, nested names included.
    pub qualified_name: String,
    /// Name usable from anywhere in the library.
    pub fq_name: String,
    /// Module holding the nested types of the message.
    pub module_name: String,
    /// Documentation, one entry per line.
    pub doc_lines: Vec<String>,
    /// The message has nested messages or enums to emit.
    pub has_nested_types: bool,
}

/// Template values for a field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldAnnotation {
    /// Identifier in the generated type.
    pub name: String,
    /// Declared type, wrappers included.
    pub field_type: String,
    /// JSON name on the wire.
    pub wire_name: String,
    /// Documentation, one entry per line.
    pub doc_lines: Vec<String>,
    /// The field is a map.
    pub is_map: bool,
}

/// Template values for an enum.
#[derive(Debug, Clone, Serialize)]
pub struct EnumAnnotation {
    /// Identifier of the generated type.
    pub name: String,
    /// Name relative to the package, nested names included.
    pub qualified_name: String,
    /// Name usable from anywhere in the library.
    pub fq_name: String,
    /// Documentation, one entry per line.
    pub doc_lines: Vec<String>,
}

/// Template values for an enum value.
#[derive(Debug, Clone, Serialize)]
pub struct EnumValueAnnotation {
    /// Identifier of the value.
    pub name: String,
    /// Wire number.
    pub number: i32,
    /// Documentation, one entry per line.
    pub doc_lines: Vec<String>,
}

/// Template values for a service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceAnnotation {
    /// Identifier of the client type.
    pub name: String,
    /// Module or file stem the client lives in.
    pub module_name: String,
    /// Host used when the caller gives no endpoint.
    pub default_host: String,
    /// Documentation, one entry per line.
    pub doc_lines: Vec<String>,
}

/// Template values for a method.
#[derive(Debug, Clone, Serialize)]
pub struct MethodAnnotation {
    /// Identifier of the client method.
    pub name: String,
    /// HTTP verb; `None` for methods without a REST binding.
    pub verb: Option<HttpVerb>,
    /// Fully-qualified request type.
    pub request_type: String,
    /// Fully-qualified response type.
    pub response_type: String,
    /// Path with one placeholder per argument.
    pub path_format: String,
    /// Accessors filling the path placeholders, in order.
    pub path_args: Vec<String>,
    /// Fields sent in the query string.
    pub query_params: Vec<QueryParam>,
    /// Accessor of the body, or empty for no body.
    pub body_accessor: String,
    /// Returns a long-running operation.
    pub is_lro: bool,
    /// Documentation, one entry per line.
    pub doc_lines: Vec<String>,
}

/// Split documentation into lines for comment emission.
pub fn doc_lines(documentation: &str) -> Vec<String> {
    if documentation.trim().is_empty() {
        return Vec::new();
    }
    documentation
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Enclosing messages of a node, outermost first.
pub fn enclosing<'a>(state: &'a ApiState, parent: Option<&'a str>) -> Vec<&'a Message> {
    let mut chain = Vec::new();
    let mut next = parent;
    while let Some(id) = next {
        // A cycle cannot survive cross-reference; the bound guards direct use.
        if chain.len() > state.message_by_id.len() {
            break;
        }
        let Some(message) = state.message(id) else {
            break;
        };
        chain.push(message);
        next = message.parent.as_deref();
    }
    chain.reverse();
    chain
}

/// Packages other than the API's own whose messages or enums the generated
/// code names. Well-known types ship with the library and are left out.
pub fn external_packages(api: &Api) -> BTreeSet<String> {
    let state = &api.state;
    let mut ids: Vec<&str> = api
        .all_messages()
        .into_iter()
        .flat_map(|m| m.fields.iter())
        .filter_map(|f| f.typez_id.as_deref())
        .collect();
    for service in api.services() {
        for method in api.methods_of(service) {
            ids.push(&method.input_type_id);
            ids.push(&method.output_type_id);
            if let Some(info) = &method.operation_info {
                ids.push(&info.metadata_type_id);
                ids.push(&info.response_type_id);
            }
        }
    }
    ids.into_iter()
        .filter_map(|id| {
            state
                .message(id)
                .map(|m| m.package.as_str())
                .or_else(|| state.enum_(id).map(|e| e.package.as_str()))
        })
        .filter(|package| *package != api.package_name && *package != WKT_PACKAGE)
        .map(str::to_string)
        .collect()
}

/// Type name of a message or enum reference, or `None` when it does not
/// resolve.
pub(crate) fn reference_name(
    codec: &dyn Codec,
    field: &Field,
    state: &ApiState,
) -> Option<String> {
    let Some(id) = field.typez_id.as_deref() else {
        error!(field = %field.id, "Reference field has no type ID.");
        return None;
    };
    let name = match field.typez {
        Typez::Enum => state.enum_(id).map(|e| codec.fq_enum_name(e, state)),
        _ => state.message(id).map(|m| codec.fq_message_name(m, state)),
    };
    if name.is_none() {
        error!(field = %field.id, id = %id, "Cannot resolve field type.");
    }
    name
}

/// Map-entry message of a map field, if the field is one.
pub(crate) fn map_entry<'a>(field: &Field, state: &'a ApiState) -> Option<&'a Message> {
    if field.typez != Typez::Message || !field.repeated {
        return None;
    }
    state
        .message(field.typez_id.as_deref()?)
        .filter(|m| m.is_map_entry)
}

/// Shared annotation walk. Reads everything first, then writes each slot
/// exactly once.
pub(crate) fn annotate(codec: &dyn Codec, api: &mut Api) -> Result<()> {
    let api_data = codec.api_annotation(api)?;
    let state = &api.state;

    let mut messages = Vec::new();
    for message in api.all_messages() {
        let fields: Vec<FieldAnnotation> = message
            .fields
            .iter()
            .map(|field| FieldAnnotation {
                name: codec.field_name(field),
                field_type: codec.field_type(field, state),
                wire_name: field.json_name.clone(),
                doc_lines: doc_lines(&field.documentation),
                is_map: map_entry(field, state).is_some(),
            })
            .collect();
        let data = MessageAnnotation {
            name: codec.to_pascal(&message.name),
            qualified_name: codec.message_name(message, state),
            fq_name: codec.fq_message_name(message, state),
            module_name: codec.to_snake(&message.name),
            doc_lines: doc_lines(&message.documentation),
            has_nested_types: !message.messages.is_empty() || !message.enums.is_empty(),
        };
        messages.push((message.id.clone(), data, fields));
    }

    let mut enums = Vec::new();
    for enum_ in api.all_enums() {
        let values: Vec<EnumValueAnnotation> = enum_
            .values
            .iter()
            .map(|value| EnumValueAnnotation {
                name: codec.enum_value_name(value, state),
                number: value.number,
                doc_lines: doc_lines(&value.documentation),
            })
            .collect();
        let data = EnumAnnotation {
            name: codec.to_pascal(&enum_.name),
            qualified_name: codec.enum_name(enum_, state),
            fq_name: codec.fq_enum_name(enum_, state),
            doc_lines: doc_lines(&enum_.documentation),
        };
        enums.push((enum_.id.clone(), data, values));
    }

    let mut services = Vec::new();
    let mut methods = Vec::new();
    for service in api.services() {
        services.push((
            service.id.clone(),
            ServiceAnnotation {
                name: codec.service_name(service),
                module_name: codec.to_snake(&service.name),
                default_host: service.default_host.clone(),
                doc_lines: doc_lines(&service.documentation),
            },
        ));
        for method in api.methods_of(service) {
            let (path_format, path_args) = codec.http_path_format(method);
            let type_name = |id: &str| {
                state
                    .message(id)
                    .map(|m| codec.fq_message_name(m, state))
                    .unwrap_or_default()
            };
            methods.push((
                method.id.clone(),
                MethodAnnotation {
                    name: codec.method_name(method),
                    verb: method.path_info.as_ref().map(|info| info.verb),
                    request_type: type_name(&method.input_type_id),
                    response_type: type_name(&method.output_type_id),
                    path_format,
                    path_args,
                    query_params: codec.query_params(method, state),
                    body_accessor: codec.body_accessor(method),
                    is_lro: method.operation_info.is_some(),
                    doc_lines: doc_lines(&method.documentation),
                },
            ));
        }
    }

    let name = codec.name();
    Annotation::set(&mut api.annotation, name, &api.package_name, &api_data)?;
    let state = &mut api.state;
    for (id, data, fields) in messages {
        let Some(message) = state.message_by_id.get_mut(&id) else {
            continue;
        };
        Annotation::set(&mut message.annotation, name, &id, &data)?;
        for (field, data) in message.fields.iter_mut().zip(fields) {
            Annotation::set(&mut field.annotation, name, &field.id, &data)?;
        }
    }
    for (id, data, values) in enums {
        let Some(enum_) = state.enum_by_id.get_mut(&id) else {
            continue;
        };
        Annotation::set(&mut enum_.annotation, name, &id, &data)?;
        for (value, data) in enum_.values.iter_mut().zip(values) {
            Annotation::set(&mut value.annotation, name, &value.id, &data)?;
        }
    }
    for (id, data) in services {
        if let Some(service) = state.service_by_id.get_mut(&id) {
            Annotation::set(&mut service.annotation, name, &id, &data)?;
        }
    }
    let method_count = methods.len();
    for (id, data) in methods {
        if let Some(method) = state.method_by_id.get_mut(&id) {
            Annotation::set(&mut method.annotation, name, &id, &data)?;
        }
    }
    debug!(codec = name, methods = method_count, "Annotated model.");
    Ok(())
}

/// Library values common to every codec.
pub(crate) fn base_api_annotation(
    options: &CodecOptions,
    api: &Api,
    package_name: String,
    module_path: String,
) -> Result<ApiAnnotation> {
    Ok(ApiAnnotation {
        package_name,
        module_path,
        version: options.version().to_string(),
        copyright_year: options.copyright_year()?,
        not_for_publication: options.get_bool(CodecOptions::NOT_FOR_PUBLICATION)?,
        title: api.title.clone(),
        description_lines: doc_lines(&api.description),
        default_host: api
            .services()
            .map(|s| s.default_host.clone())
            .find(|host| !host.is_empty())
            .unwrap_or_default(),
        dependencies: Vec::new(),
    })
}
