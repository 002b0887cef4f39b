//! Rust codec.
//!
//! Nested messages and enums live in a module named after the enclosing
//! message (`secret_version::State`). Types from other packages are reached
//! through the crate generated for that package.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::naming::{escape_reserved, to_screaming_snake_case};
use super::{
    ApiAnnotation, Codec, annotate, base_api_annotation, enclosing, external_packages, map_entry,
    reference_name,
};
use crate::config::CodecOptions;
use crate::error::Result;
use crate::model::wkt::well_known_name;
use crate::model::{Api, ApiState, Enum, EnumValue, Field, Message, Method, Typez};

/// Rust keywords, strict and reserved.
static RUST_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
        "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do",
        "final", "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual",
        "yield",
    ]
    .into_iter()
    .collect()
});

/// Rust: a crate with serde models and a reqwest client.
#[derive(Debug, Clone)]
pub struct RustCodec {
    options: CodecOptions,
}

impl RustCodec {
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
            .map(|m| self.to_snake(&m.name))
            .collect();
        parts.push(self.to_pascal(name));
        parts.join("::")
    }

    /// Path prefix for an element of `package`.
    fn package_prefix(&self, package: &str, state: &ApiState) -> String {
        if package == state.package {
            "crate::model".to_string()
        } else {
            format!("{}::model", package.replace('.', "_"))
        }
    }

    fn scalar(typez: Typez) -> Option<&'static str> {
        let name = match typez {
            Typez::Double => "f64",
            Typez::Float => "f32",
            Typez::Int64 | Typez::Sint64 | Typez::Sfixed64 => "i64",
            Typez::Uint64 | Typez::Fixed64 => "u64",
            Typez::Int32 | Typez::Sint32 | Typez::Sfixed32 => "i32",
            Typez::Uint32 | Typez::Fixed32 => "u32",
            Typez::Bool => "bool",
            Typez::String => "String",
            Typez::Bytes => "bytes::Bytes",
            Typez::Message | Typez::Enum | Typez::Group => return None,
        };
        Some(name)
    }

    fn well_known(name: &str) -> &'static str {
        match name {
            "Empty" => "()",
            "Struct" => "serde_json::Map<String, serde_json::Value>",
            "Value" => "serde_json::Value",
            "ListValue" => "Vec<serde_json::Value>",
            "BoolValue" => "bool",
            "BytesValue" => "bytes::Bytes",
            "DoubleValue" => "f64",
            "FloatValue" => "f32",
            "Int32Value" => "i32",
            "Int64Value" => "i64",
            "StringValue" => "String",
            "UInt32Value" => "u32",
            "UInt64Value" => "u64",
            "Timestamp" => "wkt::Timestamp",
            "Duration" => "wkt::Duration",
            "FieldMask" => "wkt::FieldMask",
            "NullValue" => "wkt::NullValue",
            _ => "wkt::Any",
        }
    }

    /// Whether a singular message field leads back to its owner through
    /// other singular message fields. Such a struct only has a finite size
    /// when the field is boxed.
    fn is_recursive(field: &Field, state: &ApiState) -> bool {
        if field.typez != Typez::Message || field.repeated {
            return false;
        }
        let Some(target) = field.typez_id.as_deref() else {
            return false;
        };
        let suffix = format!(".{}", field.name);
        let Some(owner) = field.id.strip_suffix(suffix.as_str()) else {
            return false;
        };
        let mut seen = HashSet::new();
        let mut pending = vec![target];
        while let Some(id) = pending.pop() {
            if id == owner {
                return true;
            }
            if well_known_name(id).is_some() || !seen.insert(id) {
                continue;
            }
            if let Some(message) = state.message(id) {
                pending.extend(
                    message
                        .fields
                        .iter()
                        .filter(|f| f.typez == Typez::Message && !f.repeated)
                        .filter_map(|f| f.typez_id.as_deref()),
                );
            }
        }
        false
    }

    fn base_type(&self, field: &Field, state: &ApiState) -> Option<String> {
        match Self::scalar(field.typez) {
            Some(scalar) => Some(scalar.to_string()),
            None => reference_name(self, field, state),
        }
    }
}

impl Codec for RustCodec {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn template_dir(&self) -> &'static str {
        "rust"
    }

    fn options(&self) -> &CodecOptions {
        &self.options
    }

    fn reserved_words(&self) -> &HashSet<&'static str> {
        &RUST_RESERVED_WORDS
    }

    fn message_name(&self, message: &Message, state: &ApiState) -> String {
        self.relative_name(&message.name, message.parent.as_deref(), state)
    }

    fn fq_message_name(&self, message: &Message, state: &ApiState) -> String {
        if let Some(name) = well_known_name(&message.id) {
            return Self::well_known(name).to_string();
        }
        format!(
            "{}::{}",
            self.package_prefix(&message.package, state),
            self.message_name(message, state)
        )
    }

    fn enum_name(&self, enum_: &Enum, state: &ApiState) -> String {
        self.relative_name(&enum_.name, enum_.parent.as_deref(), state)
    }

    fn fq_enum_name(&self, enum_: &Enum, state: &ApiState) -> String {
        if let Some(name) = well_known_name(&enum_.id) {
            return Self::well_known(name).to_string();
        }
        format!(
            "{}::{}",
            self.package_prefix(&enum_.package, state),
            self.enum_name(enum_, state)
        )
    }

    fn enum_value_name(&self, value: &EnumValue, _state: &ApiState) -> String {
        escape_reserved(to_screaming_snake_case(&value.name), self.reserved_words())
    }

    fn field_name(&self, field: &Field) -> String {
        self.to_snake(&field.name)
    }

    fn field_type(&self, field: &Field, state: &ApiState) -> String {
        if let Some(entry) = map_entry(field, state) {
            let key = entry.field("key").and_then(|f| self.base_type(f, state));
            let value = entry.field("value").and_then(|f| self.base_type(f, state));
            return match (key, value) {
                (Some(key), Some(value)) => format!("std::collections::HashMap<{key}, {value}>"),
                _ => String::new(),
            };
        }
        let Some(mut base) = self.base_type(field, state) else {
            return String::new();
        };
        if Self::is_recursive(field, state) {
            base = format!("Box<{base}>");
        }
        if field.repeated {
            format!("Vec<{base}>")
        } else if field.optional {
            format!("Option<{base}>")
        } else {
            base
        }
    }

    fn field_accessor(&self, path: &str) -> String {
        let parts: Vec<String> = path.split('.').map(|p| self.to_snake(p)).collect();
        match parts.as_slice() {
            [] => "req".to_string(),
            [single] => format!("req.{single}"),
            [first, middle @ .., last] => {
                let mut expr = format!("req.{first}.as_ref()");
                for part in middle {
                    expr.push_str(&format!(".and_then(|v| v.{part}.as_ref())"));
                }
                format!("{expr}.map(|v| v.{last}.as_str()).unwrap_or_default()")
            }
        }
    }

    fn path_placeholder(&self, _argument: &str) -> String {
        "{}".to_string()
    }

    fn request_expr(&self) -> &'static str {
        "req"
    }

    fn method_name(&self, method: &Method) -> String {
        self.to_snake(&method.name)
    }

    fn api_annotation(&self, api: &Api) -> Result<ApiAnnotation> {
        let package_name = self
            .options
            .get(CodecOptions::PACKAGE_NAME_OVERRIDE)
            .map_or_else(|| api.package_name.replace('.', "-"), str::to_string);
        let mut data = base_api_annotation(&self.options, api, package_name, String::new())?;
        // Cargo exposes `google-cloud-location` as `google_cloud_location`,
        // the prefix `package_prefix` emits.
        data.dependencies = external_packages(api)
            .into_iter()
            .map(|package| package.replace('.', "-"))
            .collect();
        Ok(data)
    }

    fn formatter(&self) -> (&'static str, &'static [&'static str]) {
        ("cargo", &["fmt"])
    }

    fn annotate_model(&self, api: &mut Api) -> Result<()> {
        annotate(self, api)
    }
}
