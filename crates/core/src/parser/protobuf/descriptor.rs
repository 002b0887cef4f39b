//! Subset of `google/protobuf/descriptor.proto` decoded with prost.
//!
//! `prost-types` drops unknown fields, which is where the `google.api.http`,
//! `google.api.default_host` and `google.longrunning.operation_info` option
//! extensions live. Declaring the option messages here with the extension
//! tags keeps them. Fields the parser never reads are left undeclared and
//! skipped by the decoder.

use crate::model::HttpVerb;

/// Output of `protoc --descriptor_set_out`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileDescriptorSet {
    /// One entry per `.proto` file, dependencies first.
    #[prost(message, repeated, tag = "1")]
    pub file: Vec<FileDescriptorProto>,
}

/// One `.proto` file.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileDescriptorProto {
    /// Path relative to the import root.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Declared package, without a leading `.`.
    #[prost(string, tag = "2")]
    pub package: String,
    /// Top-level messages.
    #[prost(message, repeated, tag = "4")]
    pub message_type: Vec<DescriptorProto>,
    /// Top-level enums.
    #[prost(message, repeated, tag = "5")]
    pub enum_type: Vec<EnumDescriptorProto>,
    /// Services.
    #[prost(message, repeated, tag = "6")]
    pub service: Vec<ServiceDescriptorProto>,
    /// Comments; only present with `--include_source_info`.
    #[prost(message, optional, tag = "9")]
    pub source_code_info: Option<SourceCodeInfo>,
}

/// A message declaration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DescriptorProto {
    /// Simple name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Fields in declaration order.
    #[prost(message, repeated, tag = "2")]
    pub field: Vec<FieldDescriptorProto>,
    /// Nested messages, map entries included.
    #[prost(message, repeated, tag = "3")]
    pub nested_type: Vec<DescriptorProto>,
    /// Nested enums.
    #[prost(message, repeated, tag = "4")]
    pub enum_type: Vec<EnumDescriptorProto>,
    /// Message options.
    #[prost(message, optional, tag = "7")]
    pub options: Option<MessageOptions>,
}

/// The message options the parser reads.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct MessageOptions {
    /// `deprecated = true`
    #[prost(bool, tag = "3")]
    pub deprecated: bool,
    /// Set on the synthetic entry message of a map field.
    #[prost(bool, tag = "7")]
    pub map_entry: bool,
}

/// `FieldDescriptorProto.Label.LABEL_REPEATED`
pub const LABEL_REPEATED: i32 = 3;

/// `FieldDescriptorProto.Type.TYPE_MESSAGE`
pub const TYPE_MESSAGE: i32 = 11;

/// `FieldDescriptorProto.Type.TYPE_ENUM`
pub const TYPE_ENUM: i32 = 14;

/// A field declaration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FieldDescriptorProto {
    /// Declared name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Field number.
    #[prost(int32, tag = "3")]
    pub number: i32,
    /// Optional, required or repeated.
    #[prost(int32, tag = "4")]
    pub label: i32,
    /// Scalar type or message/enum marker.
    #[prost(int32, tag = "5")]
    pub r#type: i32,
    /// Fully-qualified target for message and enum fields.
    #[prost(string, tag = "6")]
    pub type_name: String,
    /// Field options.
    #[prost(message, optional, tag = "8")]
    pub options: Option<FieldOptions>,
    /// Index of the containing oneof, real or synthetic.
    #[prost(int32, optional, tag = "9")]
    pub oneof_index: Option<i32>,
    /// JSON name as computed by protoc.
    #[prost(string, tag = "10")]
    pub json_name: String,
    /// Declared with the proto3 `optional` keyword.
    #[prost(bool, tag = "17")]
    pub proto3_optional: bool,
}

/// The field options the parser reads.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct FieldOptions {
    /// `deprecated = true`
    #[prost(bool, tag = "3")]
    pub deprecated: bool,
}

/// An enum declaration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnumDescriptorProto {
    /// Simple name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Values in declaration order.
    #[prost(message, repeated, tag = "2")]
    pub value: Vec<EnumValueDescriptorProto>,
    /// Enum options.
    #[prost(message, optional, tag = "3")]
    pub options: Option<EnumOptions>,
}

/// The enum options the parser reads.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct EnumOptions {
    /// `deprecated = true`
    #[prost(bool, tag = "3")]
    pub deprecated: bool,
}

/// One enum value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnumValueDescriptorProto {
    /// Declared name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Wire number.
    #[prost(int32, tag = "2")]
    pub number: i32,
}

/// A service declaration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceDescriptorProto {
    /// Simple name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Methods in declaration order.
    #[prost(message, repeated, tag = "2")]
    pub method: Vec<MethodDescriptorProto>,
    /// Service options.
    #[prost(message, optional, tag = "3")]
    pub options: Option<ServiceOptions>,
}

/// Service options, with the `google.api` extensions.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceOptions {
    /// `deprecated = true`
    #[prost(bool, tag = "33")]
    pub deprecated: bool,
    /// `google.api.default_host`
    #[prost(string, tag = "1049")]
    pub default_host: String,
}

/// An RPC declaration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MethodDescriptorProto {
    /// Simple name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Fully-qualified request type.
    #[prost(string, tag = "2")]
    pub input_type: String,
    /// Fully-qualified response type.
    #[prost(string, tag = "3")]
    pub output_type: String,
    /// Method options.
    #[prost(message, optional, tag = "4")]
    pub options: Option<MethodOptions>,
    /// `stream` on the request.
    #[prost(bool, tag = "5")]
    pub client_streaming: bool,
    /// `stream` on the response.
    #[prost(bool, tag = "6")]
    pub server_streaming: bool,
}

/// Method options, with the `google.api` and `google.longrunning` extensions.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MethodOptions {
    /// `deprecated = true`
    #[prost(bool, tag = "33")]
    pub deprecated: bool,
    /// `google.longrunning.operation_info`
    #[prost(message, optional, tag = "1049")]
    pub operation_info: Option<OperationInfo>,
    /// `google.api.http`
    #[prost(message, optional, tag = "72295728")]
    pub http: Option<HttpRule>,
}

/// `google.longrunning.OperationInfo`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OperationInfo {
    /// Type the operation resolves to, possibly unqualified.
    #[prost(string, tag = "1")]
    pub response_type: String,
    /// Type of the progress metadata, possibly unqualified.
    #[prost(string, tag = "2")]
    pub metadata_type: String,
}

/// `google.api.HttpRule`, primary binding only.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpRule {
    /// Verb and path.
    #[prost(oneof = "http_rule::Pattern", tags = "2, 3, 4, 5, 6, 8")]
    pub pattern: Option<http_rule::Pattern>,
    /// Body field path, `*` or empty.
    #[prost(string, tag = "7")]
    pub body: String,
}

/// Nested types of [`HttpRule`].
pub mod http_rule {
    /// The `pattern` oneof.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Pattern {
        /// `get: "<path>"`
        #[prost(string, tag = "2")]
        Get(String),
        /// `put: "<path>"`
        #[prost(string, tag = "3")]
        Put(String),
        /// `post: "<path>"`
        #[prost(string, tag = "4")]
        Post(String),
        /// `delete: "<path>"`
        #[prost(string, tag = "5")]
        Delete(String),
        /// `patch: "<path>"`
        #[prost(string, tag = "6")]
        Patch(String),
        /// Any other verb.
        #[prost(message, tag = "8")]
        Custom(super::CustomHttpPattern),
    }
}

/// `google.api.CustomHttpPattern`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CustomHttpPattern {
    /// The verb.
    #[prost(string, tag = "1")]
    pub kind: String,
    /// The path.
    #[prost(string, tag = "2")]
    pub path: String,
}

impl HttpRule {
    /// Verb and path of the primary binding; `None` for an unknown custom verb.
    pub fn binding(&self) -> Option<(HttpVerb, &str)> {
        use http_rule::Pattern;
        match self.pattern.as_ref()? {
            Pattern::Get(path) => Some((HttpVerb::Get, path.as_str())),
            Pattern::Put(path) => Some((HttpVerb::Put, path.as_str())),
            Pattern::Post(path) => Some((HttpVerb::Post, path.as_str())),
            Pattern::Delete(path) => Some((HttpVerb::Delete, path.as_str())),
            Pattern::Patch(path) => Some((HttpVerb::Patch, path.as_str())),
            Pattern::Custom(custom) => {
                HttpVerb::parse(&custom.kind).map(|verb| (verb, custom.path.as_str()))
            }
        }
    }
}

/// Comments and spans of a file.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SourceCodeInfo {
    /// One entry per commented element.
    #[prost(message, repeated, tag = "1")]
    pub location: Vec<Location>,
}

/// Comments attached to one element.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Location {
    /// Field-number path from the file root to the element.
    #[prost(int32, repeated, tag = "1")]
    pub path: Vec<i32>,
    /// Comment block directly above the element.
    #[prost(string, tag = "3")]
    pub leading_comments: String,
}
