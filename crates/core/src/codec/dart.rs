//! Dart codec.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::naming::to_snake_case;
use super::{ApiAnnotation, Codec, annotate, base_api_annotation, enclosing, map_entry, reference_name};
use crate::config::CodecOptions;
use crate::error::Result;
use crate::model::wkt::well_known_name;
use crate::model::{Api, ApiState, Enum, EnumValue, Field, Message, Method, Typez};

static DART_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "assert", "break", "case", "catch", "class", "const", "continue", "default", "do",
        "else", "enum", "extends", "false", "final", "finally", "for", "if", "in", "is", "new",
        "null", "rethrow", "return", "super", "switch", "this", "throw", "true", "try", "var",
        "void", "while", "with", "await", "yield", "hashCode", "runtimeType", "toString",
        "noSuchMethod",
    ]
    .into_iter()
    .collect()
});

/// Dart: a package with JSON-mapped classes and an http client.
#[derive(Debug, Clone)]
pub struct DartCodec {
    options: CodecOptions,
}

impl DartCodec {
    /// Validate the options this codec reads.
    pub fn new(options: &CodecOptions) -> Result<Self> {
        options.copyright_year()?;
        options.get_bool(CodecOptions::POST_FORMAT)?;
        options.get_bool(CodecOptions::NOT_FOR_PUBLICATION)?;
        Ok(Self {
            options: options.clone(),
        })
    }

    /// Registry constructor.
    pub fn boxed(options: &CodecOptions) -> Result<Box<dyn Codec>> {
        Ok(Box::new(Self::new(options)?))
    }

    fn relative_name(&self, name: &str, parent: Option<&str>, state: &ApiState) -> String {
        let mut parts: Vec<String> = enclosing(state, parent)
            .iter()
            .map(|m| self.to_pascal(&m.name))
            .collect();
        parts.push(self.to_pascal(name));
        parts.join("_")
    }

    /// Types from other packages are reached through an import prefix named
    /// after the package.
    fn qualify(&self, package: &str, relative: String, state: &ApiState) -> String {
        if package == state.package {
            relative
        } else {
            format!("{}.{relative}", to_snake_case(package))
        }
    }

    fn scalar(typez: Typez) -> Option<&'static str> {
        let name = match typez {
            Typez::Double | Typez::Float => "double",
            Typez::Int64
            | Typez::Sint64
            | Typez::Sfixed64
            | Typez::Uint64
            | Typez::Fixed64
            | Typez::Int32
            | Typez::Sint32
            | Typez::Sfixed32
            | Typez::Uint32
            | Typez::Fixed32 => "int",
            Typez::Bool => "bool",
            Typez::String => "String",
            Typez::Bytes => "Uint8List",
            Typez::Message | Typez::Enum | Typez::Group => return None,
        };
        Some(name)
    }

    fn base_type(&self, field: &Field, state: &ApiState) -> Option<String> {
        match Self::scalar(field.typez) {
            Some(scalar) => Some(scalar.to_string()),
            None => reference_name(self, field, state),
        }
    }
}

impl Codec for DartCodec {
    fn name(&self) -> &'static str {
        "dart"
    }

    fn template_dir(&self) -> &'static str {
        "dart"
    }

    fn options(&self) -> &CodecOptions {
        &self.options
    }

    fn reserved_words(&self) -> &HashSet<&'static str> {
        &DART_RESERVED_WORDS
    }

    fn message_name(&self, message: &Message, state: &ApiState) -> String {
        self.relative_name(&message.name, message.parent.as_deref(), state)
    }

    fn fq_message_name(&self, message: &Message, state: &ApiState) -> String {
        if let Some(name) = well_known_name(&message.id) {
            return format!("protobuf.{name}");
        }
        self.qualify(&message.package, self.message_name(message, state), state)
    }

    fn enum_name(&self, enum_: &Enum, state: &ApiState) -> String {
        self.relative_name(&enum_.name, enum_.parent.as_deref(), state)
    }

    fn fq_enum_name(&self, enum_: &Enum, state: &ApiState) -> String {
        if let Some(name) = well_known_name(&enum_.id) {
            return format!("protobuf.{name}");
        }
        self.qualify(&enum_.package, self.enum_name(enum_, state), state)
    }

    fn enum_value_name(&self, value: &EnumValue, _state: &ApiState) -> String {
        self.to_camel(&value.name)
    }

    fn field_name(&self, field: &Field) -> String {
        self.to_camel(&field.name)
    }

    fn field_type(&self, field: &Field, state: &ApiState) -> String {
        if let Some(entry) = map_entry(field, state) {
            let key = entry.field("key").and_then(|f| self.base_type(f, state));
            let value = entry.field("value").and_then(|f| self.base_type(f, state));
            return match (key, value) {
                (Some(key), Some(value)) => format!("Map<{key}, {value}>"),
                _ => String::new(),
            };
        }
        let Some(base) = self.base_type(field, state) else {
            return String::new();
        };
        if field.repeated {
            format!("List<{base}>")
        } else if field.optional {
            format!("{base}?")
        } else {
            base
        }
    }

    fn field_accessor(&self, path: &str) -> String {
        let parts: Vec<String> = path.split('.').map(|p| self.to_camel(p)).collect();
        format!("request.{}", parts.join("!."))
    }

    fn path_placeholder(&self, argument: &str) -> String {
        format!("${{{argument}}}")
    }

    fn request_expr(&self) -> &'static str {
        "request"
    }

    fn method_name(&self, method: &Method) -> String {
        self.to_camel(&method.name)
    }

    fn api_annotation(&self, api: &Api) -> Result<ApiAnnotation> {
        let package_name = self
            .options
            .get(CodecOptions::PACKAGE_NAME_OVERRIDE)
            .map_or_else(|| to_snake_case(&api.package_name), str::to_string);
        base_api_annotation(&self.options, api, package_name, String::new())
    }

    fn formatter(&self) -> (&'static str, &'static [&'static str]) {
        ("dart", &["format", "."])
    }

    fn annotate_model(&self, api: &mut Api) -> Result<()> {
        annotate(self, api)
    }
}
