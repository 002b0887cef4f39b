//! OpenAPI v3 parser.
//!
//! Component schemas become messages (or enums, for string enumerations) and
//! every operation becomes a method of a single service. Each method gets a
//! synthetic `<Operation>Request` message carrying its path and query
//! parameters plus the request body, so both source formats reach the codecs
//! with the same request/response shape.

pub mod spec;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use self::spec::{AdditionalProperties, OpenApiSpec, Operation, Parameter, Schema};
use super::{api_name_from_package, element_id};
use crate::codec::naming::{to_camel_case, to_pascal_case};
use crate::config::SourceOptions;
use crate::error::{Error, Result};
use crate::model::wkt::load_well_known_types;
use crate::model::{
    Api, Enum, EnumValue, Field, HttpVerb, Message, Method, PathInfo, PathTemplate, Service, Typez,
};

const STRUCT_ID: &str = ".google.protobuf.Struct";
const EMPTY_ID: &str = ".google.protobuf.Empty";

/// Parse an OpenAPI document at `source`. Files ending in `.json` are read as
/// JSON, everything else as YAML.
pub fn parse(source: &Path, options: &SourceOptions) -> Result<Api> {
    let content = fs::read_to_string(source).map_err(|err| Error::io(source, err))?;
    let is_json = source
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let document: OpenApiSpec = if is_json {
        serde_json::from_str(&content).map_err(|source_err| Error::Json {
            path: source.to_path_buf(),
            source: source_err,
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|source_err| Error::Yaml {
            path: source.to_path_buf(),
            source: source_err,
        })?
    };
    parse_document(&document, options)
}

/// Build the model from an already deserialized document.
pub fn parse_document(document: &OpenApiSpec, options: &SourceOptions) -> Result<Api> {
    let package = options
        .get(SourceOptions::PACKAGE_NAME)
        .map_or_else(|| package_from_title(&document.info.title), str::to_string);

    let mut api = Api::new(api_name_from_package(&package), &package);
    api.title.clone_from(&document.info.title);
    api.description = document.info.description.clone().unwrap_or_default();
    load_well_known_types(&mut api.state)?;

    let empty = BTreeMap::new();
    let schemas = document
        .components
        .as_ref()
        .map_or(&empty, |components| &components.schemas);
    let mut mapper = SchemaMapper {
        package: &package,
        schemas,
        api: &mut api,
    };

    for (name, schema) in schemas {
        if schema.is_string_enum() {
            mapper.add_enum(name, schema)?;
        } else {
            mapper.add_message(name, schema)?;
        }
    }

    if !document.paths.is_empty() {
        let service_name = options
            .get(SourceOptions::SERVICE_NAME)
            .map_or_else(|| service_from_title(&document.info.title), str::to_string);
        mapper.add_service(&service_name, document)?;
    }

    debug!(
        package = %package,
        schemas = schemas.len(),
        paths = document.paths.len(),
        "Mapped OpenAPI document."
    );
    Ok(api)
}

/// `Secret Manager API` -> `secretmanager`.
fn package_from_title(title: &str) -> String {
    let package: String = title
        .split_whitespace()
        .filter(|word| !word.eq_ignore_ascii_case("api"))
        .flat_map(|word| word.chars().filter(char::is_ascii_alphanumeric))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if package.is_empty() {
        "api".to_string()
    } else {
        package
    }
}

fn service_from_title(title: &str) -> String {
    let name = to_pascal_case(title);
    if name.is_empty() { "Service".to_string() } else { name }
}

struct SchemaMapper<'a> {
    package: &'a str,
    schemas: &'a BTreeMap<String, Schema>,
    api: &'a mut Api,
}

impl SchemaMapper<'_> {
    fn add_enum(&mut self, name: &str, schema: &Schema) -> Result<()> {
        let id = element_id(self.package, name);
        let mut enum_ = Enum::new(&id, name, self.package);
        enum_.documentation = schema.description.clone().unwrap_or_default();
        enum_.deprecated = schema.deprecated;
        let values = schema.enum_values.iter().flatten().filter_map(|v| v.as_str());
        for (number, value) in values.enumerate() {
            let number = i32::try_from(number).map_err(|_| {
                Error::Specification(format!("enum '{name}' has too many values"))
            })?;
            enum_.values.push(EnumValue::new(&id, value, number));
        }
        self.api.state.insert_enum(enum_)?;
        self.api.enums.push(id);
        Ok(())
    }

    fn add_message(&mut self, name: &str, schema: &Schema) -> Result<()> {
        let id = element_id(self.package, name);
        let mut message = Message::new(&id, name, self.package);
        message.documentation = schema.description.clone().unwrap_or_default();
        message.deprecated = schema.deprecated;

        for (prop_name, prop) in schema.properties.iter().flatten() {
            let required = schema.required.iter().any(|r| r == prop_name);
            let field = self.map_field(&mut message, prop_name, prop, required)?;
            message.fields.push(field);
        }

        self.api.state.insert_message(message)?;
        self.api.messages.push(id);
        Ok(())
    }

    /// Map one property. Map-valued properties add a nested entry message to
    /// `owner`.
    fn map_field(
        &mut self,
        owner: &mut Message,
        name: &str,
        schema: &Schema,
        required: bool,
    ) -> Result<Field> {
        let schema = schema.unwrap_nullable();
        let documentation = schema.description.clone().unwrap_or_default();

        if schema.type_name() == Some("array") {
            let items = schema.items.as_deref().ok_or_else(|| {
                Error::Specification(format!(
                    "array property '{}.{name}' has no items",
                    owner.name
                ))
            })?;
            let items = items.unwrap_nullable();
            if items.type_name() == Some("array") {
                return Err(Error::Specification(format!(
                    "nested arrays are not supported in '{}.{name}'",
                    owner.name
                )));
            }
            let (typez, typez_id) = self.element_type(&owner.name, name, items)?;
            let mut field = Field::new(&owner.id, name, typez)
                .with_repeated(true)
                .with_json_name(name)
                .with_documentation(documentation);
            field.typez_id = typez_id;
            field.deprecated = schema.deprecated;
            return Ok(field);
        }

        if let Some(AdditionalProperties::Schema(values)) = &schema.additional_properties
            && schema.properties.is_none()
        {
            let entry_id = self.add_map_entry(owner, name, values)?;
            return Ok(Field::new(&owner.id, name, Typez::Message)
                .with_type_id(entry_id)
                .with_repeated(true)
                .with_json_name(name)
                .with_documentation(documentation));
        }

        let (typez, typez_id) = self.element_type(&owner.name, name, schema)?;
        let optional = typez == Typez::Message || !required;
        let mut field = Field::new(&owner.id, name, typez)
            .with_optional(optional)
            .with_json_name(name)
            .with_documentation(documentation);
        field.typez_id = typez_id;
        field.deprecated = schema.deprecated;
        Ok(field)
    }

    fn add_map_entry(&mut self, owner: &mut Message, name: &str, values: &Schema) -> Result<String> {
        let entry_name = format!("{}Entry", to_pascal_case(name));
        let entry_id = format!("{}.{entry_name}", owner.id);
        let mut entry = Message::new(&entry_id, &entry_name, self.package);
        entry.is_map_entry = true;
        entry.fields.push(Field::new(&entry_id, "key", Typez::String));
        let (typez, typez_id) = self.element_type(&owner.name, name, values.unwrap_nullable())?;
        let mut value = Field::new(&entry_id, "value", typez);
        value.typez_id = typez_id;
        entry.fields.push(value);
        self.api.state.insert_message(entry)?;
        owner.messages.push(entry_id.clone());
        Ok(entry_id)
    }

    /// Scalar, enum or message type of a non-array schema.
    fn element_type(
        &self,
        owner: &str,
        prop: &str,
        schema: &Schema,
    ) -> Result<(Typez, Option<String>)> {
        if let Some(target) = schema.ref_name() {
            let id = element_id(self.package, target);
            let typez = if self.schemas.get(target).is_some_and(Schema::is_string_enum) {
                Typez::Enum
            } else {
                Typez::Message
            };
            return Ok((typez, Some(id)));
        }
        let format = schema.format.as_deref();
        let typez = match schema.type_name() {
            Some("string") => match format {
                Some("byte") => Typez::Bytes,
                Some("int64") => Typez::Int64,
                Some("uint64") => Typez::Uint64,
                _ => Typez::String,
            },
            Some("integer") => match format {
                Some("int64") => Typez::Int64,
                Some("uint32") => Typez::Uint32,
                Some("uint64") => Typez::Uint64,
                _ => Typez::Int32,
            },
            Some("number") => match format {
                Some("float") => Typez::Float,
                _ => Typez::Double,
            },
            Some("boolean") => Typez::Bool,
            Some("object") | None => return Ok((Typez::Message, Some(STRUCT_ID.to_string()))),
            Some(other) => {
                return Err(Error::Specification(format!(
                    "property '{owner}.{prop}' has unsupported type '{other}'"
                )));
            }
        };
        Ok((typez, None))
    }

    fn add_service(&mut self, service_name: &str, document: &OpenApiSpec) -> Result<()> {
        let service_id = element_id(self.package, service_name);
        let mut service = Service::new(&service_id, service_name, self.package);
        service.documentation = document.info.description.clone().unwrap_or_default();

        for (path, item) in &document.paths {
            let template = PathTemplate::parse(path)?;
            for (verb, operation) in item.operations() {
                let method_name = operation
                    .operation_id
                    .as_deref()
                    .map_or_else(|| fallback_method_name(verb, path), to_pascal_case);
                let verb = HttpVerb::parse(verb).unwrap_or_default();
                let parameters: Vec<&Parameter> =
                    item.parameters.iter().chain(&operation.parameters).collect();

                let method = self.add_method(
                    &service_id,
                    &method_name,
                    PathInfo::new(verb, template.clone()),
                    operation,
                    &parameters,
                )?;
                service.methods.push(method);
            }
        }

        self.api.state.insert_service(service)?;
        self.api.services.push(service_id);
        Ok(())
    }

    fn add_method(
        &mut self,
        service_id: &str,
        name: &str,
        mut path_info: PathInfo,
        operation: &Operation,
        parameters: &[&Parameter],
    ) -> Result<String> {
        let request_name = format!("{name}Request");
        let request_id = element_id(self.package, &request_name);
        let mut request = Message::new(&request_id, &request_name, self.package);
        request.documentation = format!("The request message for {name}.");

        for param in parameters {
            if param.location != "path" && param.location != "query" {
                continue;
            }
            let schema = param.schema.clone().unwrap_or_default();
            let required = param.required || param.location == "path";
            let mut field = self.map_field(&mut request, &param.name, &schema, required)?;
            field.documentation = param.description.clone().unwrap_or_default();
            request.fields.push(field);
        }

        if let Some(body) = operation.body_schema() {
            if let Some(target) = body.ref_name() {
                let field_name = to_camel_case(target);
                let field = Field::new(&request_id, &field_name, Typez::Message)
                    .with_type_id(element_id(self.package, target))
                    .with_optional(true)
                    .with_json_name(&field_name);
                path_info = path_info.with_body(field_name);
                request.fields.push(field);
            } else {
                debug!(method = name, "Skipping inline request body without $ref.");
            }
        }

        let output_type_id = operation
            .success_schema()
            .and_then(Schema::ref_name)
            .map_or_else(|| EMPTY_ID.to_string(), |target| element_id(self.package, target));

        self.api.state.insert_message(request)?;
        self.api.messages.push(request_id.clone());

        let mut method = Method::new(service_id, name);
        method.input_type_id = request_id;
        method.output_type_id = output_type_id;
        method.path_info = Some(path_info);
        method.deprecated = operation.deprecated;
        method.documentation = operation
            .description
            .as_ref()
            .or(operation.summary.as_ref())
            .cloned()
            .unwrap_or_default();
        let id = method.id.clone();
        self.api.state.insert_method(method)?;
        Ok(id)
    }
}

/// `GET /v1/secrets/{secret}` -> `GetV1SecretsSecret`.
fn fallback_method_name(verb: &str, path: &str) -> String {
    to_pascal_case(&format!("{verb} {path}"))
}
