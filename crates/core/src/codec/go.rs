//! Go codec.
//!
//! Nested names are flattened with `_` (`SecretVersion_State`), the way
//! protoc-gen-go spells them. Other packages are imported under a `<name>pb`
//! alias.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::naming::to_screaming_snake_case;
use super::{ApiAnnotation, Codec, annotate, base_api_annotation, enclosing, map_entry, reference_name};
use crate::config::CodecOptions;
use crate::error::Result;
use crate::model::wkt::well_known_name;
use crate::model::{Api, ApiState, Enum, EnumValue, Field, Message, Method, Typez};
use crate::parser::api_name_from_package;

static GO_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
        "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
        "return", "select", "struct", "switch", "type", "var",
    ]
    .into_iter()
    .collect()
});

/// Go: a module with protobuf-compatible types and a net/http client.
#[derive(Debug, Clone)]
pub struct GoCodec {
    options: CodecOptions,
}

impl GoCodec {
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

    fn qualify(&self, package: &str, relative: String, state: &ApiState) -> String {
        if package == state.package {
            relative
        } else {
            format!("{}.{relative}", package_alias(package))
        }
    }

    fn scalar(typez: Typez) -> Option<&'static str> {
        let name = match typez {
            Typez::Double => "float64",
            Typez::Float => "float32",
            Typez::Int64 | Typez::Sint64 | Typez::Sfixed64 => "int64",
            Typez::Uint64 | Typez::Fixed64 => "uint64",
            Typez::Int32 | Typez::Sint32 | Typez::Sfixed32 => "int32",
            Typez::Uint32 | Typez::Fixed32 => "uint32",
            Typez::Bool => "bool",
            Typez::String => "string",
            Typez::Bytes => "[]byte",
            Typez::Message | Typez::Enum | Typez::Group => return None,
        };
        Some(name)
    }

    fn well_known(name: &str) -> String {
        let package = match name {
            "Timestamp" => "timestamppb",
            "Duration" => "durationpb",
            "FieldMask" => "fieldmaskpb",
            "Empty" => "emptypb",
            "Any" => "anypb",
            "Struct" | "Value" | "ListValue" | "NullValue" => "structpb",
            _ => "wrapperspb",
        };
        format!("{package}.{name}")
    }

    /// Element type without repetition; messages are pointers.
    fn base_type(&self, field: &Field, state: &ApiState) -> Option<String> {
        if let Some(scalar) = Self::scalar(field.typez) {
            return Some(scalar.to_string());
        }
        let name = reference_name(self, field, state)?;
        if field.typez == Typez::Enum {
            Some(name)
        } else {
            Some(format!("*{name}"))
        }
    }
}

/// `google.cloud.location` -> `locationpb`.
pub fn package_alias(package: &str) -> String {
    format!("{}pb", api_name_from_package(package).to_ascii_lowercase())
}

impl Codec for GoCodec {
    fn name(&self) -> &'static str {
        "go"
    }

    fn template_dir(&self) -> &'static str {
        "go"
    }

    fn options(&self) -> &CodecOptions {
        &self.options
    }

    fn reserved_words(&self) -> &HashSet<&'static str> {
        &GO_RESERVED_WORDS
    }

    fn message_name(&self, message: &Message, state: &ApiState) -> String {
        self.relative_name(&message.name, message.parent.as_deref(), state)
    }

    fn fq_message_name(&self, message: &Message, state: &ApiState) -> String {
        if let Some(name) = well_known_name(&message.id) {
            return Self::well_known(name);
        }
        self.qualify(&message.package, self.message_name(message, state), state)
    }

    fn enum_name(&self, enum_: &Enum, state: &ApiState) -> String {
        self.relative_name(&enum_.name, enum_.parent.as_deref(), state)
    }

    fn fq_enum_name(&self, enum_: &Enum, state: &ApiState) -> String {
        if let Some(name) = well_known_name(&enum_.id) {
            return Self::well_known(name);
        }
        self.qualify(&enum_.package, self.enum_name(enum_, state), state)
    }

    /// `SecretVersion_State_ENABLED`.
    fn enum_value_name(&self, value: &EnumValue, state: &ApiState) -> String {
        let value_name = to_screaming_snake_case(&value.name);
        match state.enum_(&value.parent) {
            Some(enum_) => format!("{}_{value_name}", self.enum_name(enum_, state)),
            None => value_name,
        }
    }

    fn field_name(&self, field: &Field) -> String {
        self.to_pascal(&field.name)
    }

    fn field_type(&self, field: &Field, state: &ApiState) -> String {
        if let Some(entry) = map_entry(field, state) {
            let key = entry.field("key").and_then(|f| self.base_type(f, state));
            let value = entry.field("value").and_then(|f| self.base_type(f, state));
            return match (key, value) {
                (Some(key), Some(value)) => format!("map[{key}]{value}"),
                _ => String::new(),
            };
        }
        let Some(base) = self.base_type(field, state) else {
            return String::new();
        };
        if field.repeated {
            format!("[]{base}")
        } else if field.optional && Self::scalar(field.typez).is_some() {
            format!("*{base}")
        } else {
            base
        }
    }

    fn field_accessor(&self, path: &str) -> String {
        path.split('.').fold("req".to_string(), |expr, part| {
            format!("{expr}.Get{}()", self.to_pascal(part))
        })
    }

    fn path_placeholder(&self, _argument: &str) -> String {
        "%s".to_string()
    }

    fn request_expr(&self) -> &'static str {
        "req"
    }

    fn method_name(&self, method: &Method) -> String {
        self.to_pascal(&method.name)
    }

    fn api_annotation(&self, api: &Api) -> Result<ApiAnnotation> {
        let package_name = self
            .options
            .get(CodecOptions::PACKAGE_NAME_OVERRIDE)
            .map_or_else(
                || {
                    api.name
                        .chars()
                        .filter(char::is_ascii_alphanumeric)
                        .collect::<String>()
                        .to_ascii_lowercase()
                },
                str::to_string,
            );
        let module_path = self
            .options
            .get(CodecOptions::MODULE_PATH)
            .map_or_else(|| api.package_name.replace('.', "/"), str::to_string);
        base_api_annotation(&self.options, api, package_name, module_path)
    }

    fn formatter(&self) -> (&'static str, &'static [&'static str]) {
        ("gofmt", &["-w", "."])
    }

    fn annotate_model(&self, api: &mut Api) -> Result<()> {
        annotate(self, api)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::codec::tests::{create_secret, secret_api, state_enum};

    fn codec() -> GoCodec {
        GoCodec::new(&CodecOptions::default()).unwrap()
    }

    #[test]
    fn test_nested_names_are_flattened() {
        let api = secret_api();
        let codec = codec();
        assert_eq!(codec.enum_name(state_enum(&api), &api.state), "SecretVersion_State");
        assert_eq!(
            codec.enum_value_name(&state_enum(&api).values[1], &api.state),
            "SecretVersion_State_ENABLED"
        );
    }

    #[test]
    fn test_field_types() {
        let api = secret_api();
        let codec = codec();
        let secret = api.state.message(".google.cloud.secretmanager.v1.Secret").unwrap();
        let types: Vec<String> = secret
            .fields
            .iter()
            .map(|f| codec.field_type(f, &api.state))
            .collect();
        assert_eq!(
            types,
            vec!["string", "map[string]string", "*string", "[]*SecretVersion"]
        );
        let version = api
            .state
            .message(".google.cloud.secretmanager.v1.SecretVersion")
            .unwrap();
        assert_eq!(
            codec.field_type(version.field("create_time").unwrap(), &api.state),
            "*timestamppb.Timestamp"
        );
        assert_eq!(
            codec.field_type(version.field("state").unwrap(), &api.state),
            "SecretVersion_State"
        );
    }

    #[test]
    fn test_http_path_format() {
        let api = secret_api();
        let codec = codec();
        let method = create_secret(&api);
        let (format, args) = codec.http_path_format(method);
        assert_eq!(format, "/v1/%s/secrets/%s");
        assert_eq!(args, vec!["req.GetParent()", "req.GetSecretId()"]);
        assert_eq!(codec.body_accessor(method), "req.GetSecret()");
        assert_eq!(codec.field_accessor("secret.name"), "req.GetSecret().GetName()");
    }

    #[test]
    fn test_module_path() {
        let api = secret_api();
        let data = codec().api_annotation(&api).unwrap();
        assert_eq!(data.package_name, "secretmanager");
        assert_eq!(data.module_path, "google/cloud/secretmanager/v1");
        assert_eq!(package_alias("google.cloud.location"), "locationpb");
    }
}
