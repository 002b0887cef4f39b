//! Canonical, format-agnostic API model.
//!
//! Every message, enum, service and method lives in the [`ApiState`] arena,
//! keyed by its fully-qualified ID (`.package.Outer.Inner`). Anything that
//! refers to another node (child sequences, parents, field types, method
//! inputs) stores the ID, never a pointer, so the model stays serializable and
//! can be built in any order before [`crate::xref`] checks it.
//!
//! ## Module Structure
//!
//! - `path_template`: structured HTTP path templates
//! - `wkt`: well-known types pre-registered before type mapping

pub mod path_template;
pub mod wkt;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use path_template::{PathSegment, PathTemplate};

/// Declared type of a field, mirroring the protobuf scalar set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Typez {
    /// 64-bit float.
    Double,
    /// 32-bit float.
    Float,
    /// Signed 64-bit integer, varint encoded.
    Int64,
    /// Unsigned 64-bit integer, varint encoded.
    Uint64,
    /// Signed 32-bit integer, varint encoded.
    Int32,
    /// Unsigned 64-bit integer, fixed width.
    Fixed64,
    /// Unsigned 32-bit integer, fixed width.
    Fixed32,
    /// Boolean.
    Bool,
    /// UTF-8 text.
    String,
    /// proto2 group; refers to a message through `typez_id`.
    Group,
    /// Refers to a message through `typez_id`.
    Message,
    /// Arbitrary bytes, base64 in JSON.
    Bytes,
    /// Unsigned 32-bit integer, varint encoded.
    Uint32,
    /// Refers to an enum through `typez_id`.
    Enum,
    /// Signed 32-bit integer, fixed width.
    Sfixed32,
    /// Signed 64-bit integer, fixed width.
    Sfixed64,
    /// Signed 32-bit integer, zigzag encoded.
    Sint32,
    /// Signed 64-bit integer, zigzag encoded.
    Sint64,
}

impl Typez {
    /// Map a `FieldDescriptorProto.Type` wire value.
    pub fn from_proto(value: i32) -> Option<Self> {
        let typez = match value {
            1 => Typez::Double,
            2 => Typez::Float,
            3 => Typez::Int64,
            4 => Typez::Uint64,
            5 => Typez::Int32,
            6 => Typez::Fixed64,
            7 => Typez::Fixed32,
            8 => Typez::Bool,
            9 => Typez::String,
            10 => Typez::Group,
            11 => Typez::Message,
            12 => Typez::Bytes,
            13 => Typez::Uint32,
            14 => Typez::Enum,
            15 => Typez::Sfixed32,
            16 => Typez::Sfixed64,
            17 => Typez::Sint32,
            18 => Typez::Sint64,
            _ => return None,
        };
        Some(typez)
    }

    /// Whether the type refers to another node through `typez_id`.
    pub fn is_reference(&self) -> bool {
        matches!(self, Typez::Message | Typez::Enum | Typez::Group)
    }
}

/// The single opaque per-node slot written by a codec.
///
/// A node carries at most one annotation per run; [`Annotation::set`]
/// rejects a second write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Name of the codec that wrote the slot.
    pub codec: String,
    /// The codec's annotation struct, serialized for the templates.
    pub data: serde_json::Value,
}

impl Annotation {
    /// Write `data` into an empty slot.
    pub fn set<T: Serialize>(
        slot: &mut Option<Annotation>,
        codec: &str,
        node_id: &str,
        data: &T,
    ) -> Result<()> {
        if let Some(existing) = slot {
            return Err(Error::Annotation(format!(
                "'{node_id}' is already annotated by codec '{}'",
                existing.codec
            )));
        }
        let data = serde_json::to_value(data).map_err(|err| {
            Error::Annotation(format!("cannot serialize annotation for '{node_id}': {err}"))
        })?;
        *slot = Some(Annotation {
            codec: codec.to_string(),
            data,
        });
        Ok(())
    }
}

/// A structured record type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Message {
    /// Declared name, without enclosing messages.
    pub name: String,
    /// Fully-qualified ID, `.package.Outer.Name`.
    pub id: String,
    /// Package the message is declared in.
    pub package: String,
    /// ID of the enclosing message, for nested messages.
    pub parent: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// IDs of nested messages, in declaration order.
    pub messages: Vec<String>,
    /// IDs of nested enums, in declaration order.
    pub enums: Vec<String>,
    /// Synthetic `MapEntry` message generated for a map field.
    pub is_map_entry: bool,
    /// Marked deprecated in the source.
    pub deprecated: bool,
    /// Leading comment or description, possibly empty.
    pub documentation: String,
    /// Codec slot; `None` until annotation.
    pub annotation: Option<Annotation>,
}

impl Message {
    /// Empty message with the given identity.
    pub fn new(id: impl Into<String>, name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            package: package.into(),
            ..Self::default()
        }
    }

    /// Look up a field by declared name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by declared name or by wire (JSON) name.
    pub fn field_by_any_name(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.json_name == name)
    }
}

/// A field of a [`Message`].
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    /// Declared name, usually snake_case.
    pub name: String,
    /// `<message id>.<name>`
    pub id: String,
    /// Declared type.
    pub typez: Typez,
    /// Target message or enum ID for reference types.
    pub typez_id: Option<String>,
    /// Presence is tracked: proto3 `optional`, a oneof member, or a message.
    pub optional: bool,
    /// A list, or a map when the target is a map entry.
    pub repeated: bool,
    /// Name used on the wire in JSON payloads and query strings.
    pub json_name: String,
    /// Marked deprecated in the source.
    pub deprecated: bool,
    /// Leading comment or description, possibly empty.
    pub documentation: String,
    /// Codec slot; `None` until annotation.
    pub annotation: Option<Annotation>,
}

impl Field {
    /// Singular, non-optional field of `owner_id`.
    pub fn new(owner_id: &str, name: impl Into<String>, typez: Typez) -> Self {
        let name = name.into();
        Self {
            id: format!("{owner_id}.{name}"),
            json_name: default_json_name(&name),
            name,
            typez,
            typez_id: None,
            optional: false,
            repeated: false,
            deprecated: false,
            documentation: String::new(),
            annotation: None,
        }
    }

    /// Set the referenced message or enum.
    pub fn with_type_id(mut self, id: impl Into<String>) -> Self {
        self.typez_id = Some(id.into());
        self
    }

    /// Set presence tracking.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Make the field a list (or map).
    pub fn with_repeated(mut self, repeated: bool) -> Self {
        self.repeated = repeated;
        self
    }

    /// Override the derived wire name.
    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = json_name.into();
        self
    }

    /// Attach documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }
}

/// protoc's default JSON name: lowerCamelCase of the declared name.
pub fn default_json_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// An enumeration type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Enum {
    /// Declared name, without enclosing messages.
    pub name: String,
    /// Fully-qualified ID.
    pub id: String,
    /// Package the enum is declared in.
    pub package: String,
    /// ID of the enclosing message, for nested enums.
    pub parent: Option<String>,
    /// Values in declaration order.
    pub values: Vec<EnumValue>,
    /// Marked deprecated in the source.
    pub deprecated: bool,
    /// Leading comment or description, possibly empty.
    pub documentation: String,
    /// Codec slot; `None` until annotation.
    pub annotation: Option<Annotation>,
}

impl Enum {
    /// Enum without values.
    pub fn new(id: impl Into<String>, name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            package: package.into(),
            ..Self::default()
        }
    }
}

/// One named value of an [`Enum`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnumValue {
    /// Declared name, e.g. `STATE_UNSPECIFIED`.
    pub name: String,
    /// `<enum id>.<name>`
    pub id: String,
    /// Wire number.
    pub number: i32,
    /// ID of the owning enum.
    pub parent: String,
    /// Leading comment or description, possibly empty.
    pub documentation: String,
    /// Codec slot; `None` until annotation.
    pub annotation: Option<Annotation>,
}

impl EnumValue {
    /// Value `number` of `enum_id`.
    pub fn new(enum_id: &str, name: impl Into<String>, number: i32) -> Self {
        let name = name.into();
        Self {
            id: format!("{enum_id}.{name}"),
            name,
            number,
            parent: enum_id.to_string(),
            ..Self::default()
        }
    }
}

/// A group of RPC methods.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Service {
    /// Declared name.
    pub name: String,
    /// Fully-qualified ID.
    pub id: String,
    /// Package the service is declared in.
    pub package: String,
    /// Hostname clients connect to by default, e.g. `secretmanager.googleapis.com`.
    pub default_host: String,
    /// IDs of the service methods, in declaration order.
    pub methods: Vec<String>,
    /// Marked deprecated in the source.
    pub deprecated: bool,
    /// Leading comment or description, possibly empty.
    pub documentation: String,
    /// Codec slot; `None` until annotation.
    pub annotation: Option<Annotation>,
}

impl Service {
    /// Service without methods.
    pub fn new(id: impl Into<String>, name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            package: package.into(),
            ..Self::default()
        }
    }
}

/// One RPC of a [`Service`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Method {
    /// Declared name.
    pub name: String,
    /// `<service id>.<name>`
    pub id: String,
    /// ID of the owning service.
    pub service_id: String,
    /// Request message ID.
    pub input_type_id: String,
    /// Response message ID.
    pub output_type_id: String,
    /// REST binding; `None` for gRPC-only methods.
    pub path_info: Option<PathInfo>,
    /// Present for long-running operations.
    pub operation_info: Option<OperationInfo>,
    /// The client sends a stream of requests.
    pub client_side_streaming: bool,
    /// The server answers with a stream of responses.
    pub server_side_streaming: bool,
    /// Marked deprecated in the source.
    pub deprecated: bool,
    /// Leading comment or description, possibly empty.
    pub documentation: String,
    /// Codec slot; `None` until annotation.
    pub annotation: Option<Annotation>,
}

impl Method {
    /// Method of `service_id` without types or binding.
    pub fn new(service_id: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("{service_id}.{name}"),
            name,
            service_id: service_id.to_string(),
            ..Self::default()
        }
    }
}

/// HTTP method of a REST binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpVerb {
    /// Uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        }
    }

    /// Case-insensitive parse; `None` for verbs outside this set.
    pub fn parse(verb: &str) -> Option<Self> {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpVerb::Get),
            "POST" => Some(HttpVerb::Post),
            "PUT" => Some(HttpVerb::Put),
            "PATCH" => Some(HttpVerb::Patch),
            "DELETE" => Some(HttpVerb::Delete),
            _ => None,
        }
    }
}

/// REST binding of a method.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PathInfo {
    /// HTTP method.
    pub verb: HttpVerb,
    /// Parsed path, including any custom verb.
    pub path_template: PathTemplate,
    /// Wire names of request fields sent as query parameters. Filled in by
    /// cross-reference.
    pub query_parameters: BTreeSet<String>,
    /// `*` for the whole request, a field name, or `None` for no body.
    pub body_field_path: Option<String>,
}

impl PathInfo {
    /// Binding without a body.
    pub fn new(verb: HttpVerb, path_template: PathTemplate) -> Self {
        Self {
            verb,
            path_template,
            query_parameters: BTreeSet::new(),
            body_field_path: None,
        }
    }

    /// Set the body field path; empty means no body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body_field_path = if body.is_empty() { None } else { Some(body) };
        self
    }
}

/// Long-running operation metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationInfo {
    /// Message reported while the operation runs.
    pub metadata_type_id: String,
    /// Message the finished operation resolves to.
    pub response_type_id: String,
}

/// Lookup tables from fully-qualified ID to model node.
///
/// Built once per generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiState {
    /// Package of the generated elements. Codecs qualify references to any
    /// other package.
    pub package: String,
    /// Every message, dependencies included.
    pub message_by_id: BTreeMap<String, Message>,
    /// Every enum, dependencies included.
    pub enum_by_id: BTreeMap<String, Enum>,
    /// Every service.
    pub service_by_id: BTreeMap<String, Service>,
    /// Every method.
    pub method_by_id: BTreeMap<String, Method>,
}

impl ApiState {
    /// Message registered under `id`.
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.message_by_id.get(id)
    }

    /// Enum registered under `id`.
    pub fn enum_(&self, id: &str) -> Option<&Enum> {
        self.enum_by_id.get(id)
    }

    /// Service registered under `id`.
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.service_by_id.get(id)
    }

    /// Method registered under `id`.
    pub fn method(&self, id: &str) -> Option<&Method> {
        self.method_by_id.get(id)
    }

    /// Whether any node of any kind is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.message_by_id.contains_key(id)
            || self.enum_by_id.contains_key(id)
            || self.service_by_id.contains_key(id)
            || self.method_by_id.contains_key(id)
    }

    /// Register a message; IDs are unique across all node kinds.
    pub fn insert_message(&mut self, message: Message) -> Result<()> {
        self.ensure_unique(&message.id)?;
        self.message_by_id.insert(message.id.clone(), message);
        Ok(())
    }

    /// Register an enum.
    pub fn insert_enum(&mut self, enum_: Enum) -> Result<()> {
        self.ensure_unique(&enum_.id)?;
        self.enum_by_id.insert(enum_.id.clone(), enum_);
        Ok(())
    }

    /// Register a service.
    pub fn insert_service(&mut self, service: Service) -> Result<()> {
        self.ensure_unique(&service.id)?;
        self.service_by_id.insert(service.id.clone(), service);
        Ok(())
    }

    /// Register a method.
    pub fn insert_method(&mut self, method: Method) -> Result<()> {
        self.ensure_unique(&method.id)?;
        self.method_by_id.insert(method.id.clone(), method);
        Ok(())
    }

    fn ensure_unique(&self, id: &str) -> Result<()> {
        if self.contains(id) {
            return Err(Error::Specification(format!("duplicate element ID '{id}'")));
        }
        Ok(())
    }
}

/// Root of the model: one package worth of messages, enums and services.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Api {
    /// Short API name, e.g. `secretmanager`.
    pub name: String,
    /// Package of the generated elements, e.g. `google.cloud.secretmanager.v1`.
    pub package_name: String,
    /// Human-readable title, e.g. `Secret Manager API`.
    pub title: String,
    /// Overview of the API, possibly empty.
    pub description: String,
    /// IDs of top-level messages in declaration order.
    pub messages: Vec<String>,
    /// IDs of top-level enums in declaration order.
    pub enums: Vec<String>,
    /// IDs of services in declaration order.
    pub services: Vec<String>,
    /// Every node, generated or only referenced.
    pub state: ApiState,
    /// Codec slot; `None` until annotation.
    pub annotation: Option<Annotation>,
}

impl Api {
    /// Empty API for `package_name`.
    pub fn new(name: impl Into<String>, package_name: impl Into<String>) -> Self {
        let package_name = package_name.into();
        Self {
            name: name.into(),
            state: ApiState {
                package: package_name.clone(),
                ..ApiState::default()
            },
            package_name,
            ..Self::default()
        }
    }

    /// Top-level messages, resolved through the state.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter_map(|id| self.state.message(id))
    }

    /// Top-level enums, resolved through the state.
    pub fn enums(&self) -> impl Iterator<Item = &Enum> {
        self.enums.iter().filter_map(|id| self.state.enum_(id))
    }

    /// Services, resolved through the state.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter().filter_map(|id| self.state.service(id))
    }

    /// Every message reachable from the top-level sequences, parents before
    /// children.
    pub fn all_messages(&self) -> Vec<&Message> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = self.messages.iter().rev().map(String::as_str).collect();
        while let Some(id) = stack.pop() {
            if let Some(message) = self.state.message(id) {
                out.push(message);
                stack.extend(message.messages.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Every enum reachable from the top-level sequences, top-level first.
    pub fn all_enums(&self) -> Vec<&Enum> {
        let mut ids: Vec<&str> = self.enums.iter().map(String::as_str).collect();
        for message in self.all_messages() {
            ids.extend(message.enums.iter().map(String::as_str));
        }
        ids.into_iter()
            .filter_map(|id| self.state.enum_(id))
            .collect()
    }

    /// Methods of a service, resolved through the state.
    pub fn methods_of<'a>(&'a self, service: &'a Service) -> impl Iterator<Item = &'a Method> {
        service
            .methods
            .iter()
            .filter_map(|id| self.state.method(id))
    }
}
