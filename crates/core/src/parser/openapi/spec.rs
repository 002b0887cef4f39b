//! OpenAPI document structs for serde deserialization.
//!
//! A subset of OpenAPI 3.x: enough to map component schemas to messages and
//! operations to methods. Maps are `BTreeMap` so iteration order never
//! depends on the document's key order.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Root OpenAPI document.
#[derive(Debug, Deserialize)]
pub struct OpenApiSpec {
    /// Title, description and version.
    #[serde(default)]
    pub info: Info,
    /// Operations keyed by path.
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    /// Reusable schemas.
    pub components: Option<Components>,
}

/// The `info` object.
#[derive(Debug, Default, Deserialize)]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: String,
    /// Markdown description.
    pub description: Option<String>,
    /// Document version, e.g. `v1`.
    pub version: Option<String>,
}

/// `components`; only `schemas` matter here.
#[derive(Debug, Deserialize)]
pub struct Components {
    /// Named schemas, each becoming a message or enum.
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
}

/// One entry of `paths`.
#[derive(Debug, Deserialize)]
pub struct PathItem {
    /// `GET` operation.
    pub get: Option<Operation>,
    /// `POST` operation.
    pub post: Option<Operation>,
    /// `PUT` operation.
    pub put: Option<Operation>,
    /// `PATCH` operation.
    pub patch: Option<Operation>,
    /// `DELETE` operation.
    pub delete: Option<Operation>,
    /// Inherited by every operation of the path.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// One HTTP operation; becomes a method.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Method name source; derived from verb and path when absent.
    pub operation_id: Option<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Marked deprecated.
    #[serde(default)]
    pub deprecated: bool,
    /// Operation parameters, added to the path item's.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Request body, if any.
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

/// A parameter (query, path, header or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Wire name.
    pub name: String,
    /// `query`, `path`, `header` or `cookie`.
    #[serde(rename = "in")]
    pub location: String,
    /// Path parameters are always required.
    #[serde(default)]
    pub required: bool,
    /// Parameter description.
    pub description: Option<String>,
    /// Value schema; a string when absent.
    pub schema: Option<Schema>,
}

/// The `requestBody` object.
#[derive(Debug, Deserialize)]
pub struct RequestBody {
    /// The body must be sent.
    #[serde(default)]
    pub required: bool,
    /// Schemas keyed by media type.
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

/// One entry of `responses`.
#[derive(Debug, Deserialize)]
pub struct Response {
    /// Response description.
    pub description: Option<String>,
    /// Schemas keyed by media type.
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

/// A media type entry of `content`.
#[derive(Debug, Deserialize)]
pub struct MediaType {
    /// Payload schema.
    pub schema: Option<Schema>,
}

/// The subset of JSON Schema that maps onto messages, fields and enums.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// `type`, single or list.
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// `#/components/schemas/<Name>`
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    /// Schema description.
    pub description: Option<String>,

    /// Object properties; each becomes a field.
    pub properties: Option<BTreeMap<String, Schema>>,

    /// Listed properties are not optional.
    #[serde(default)]
    pub required: Vec<String>,

    /// Required when the type is `array`.
    pub items: Option<Box<Schema>>,

    /// Allowed values.
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,

    /// Alternatives; only `[X, null]` is understood.
    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<Schema>>,

    /// Present on map-like objects.
    pub additional_properties: Option<AdditionalProperties>,

    /// Refines `type`, e.g. `int64` or `date-time`.
    pub format: Option<String>,

    /// Marked deprecated.
    #[serde(default)]
    pub deprecated: bool,

    /// 3.0 style; 3.1 documents list `null` in `type` instead.
    pub nullable: Option<bool>,
}

/// `type: string` or `type: [string, "null"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `type: string`
    Single(String),
    /// `type: [string, "null"]`
    Multiple(Vec<String>),
}

/// `additionalProperties`, boolean or schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` allows any value; `false` none.
    Bool(bool),
    /// Schema of every value.
    Schema(Box<Schema>),
}

impl PathItem {
    /// Operations in a fixed verb order.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("GET", self.get.as_ref()),
            ("POST", self.post.as_ref()),
            ("PUT", self.put.as_ref()),
            ("PATCH", self.patch.as_ref()),
            ("DELETE", self.delete.as_ref()),
        ]
        .into_iter()
        .filter_map(|(verb, op)| op.map(|op| (verb, op)))
    }
}

impl Schema {
    /// The first non-`null` type name.
    pub fn type_name(&self) -> Option<&str> {
        match self.schema_type.as_ref()? {
            SchemaType::Single(t) => Some(t.as_str()),
            SchemaType::Multiple(types) => types.iter().map(String::as_str).find(|t| *t != "null"),
        }
    }

    /// Resolve `anyOf: [X, {type: null}]` to `X`; anything else is returned as is.
    pub fn unwrap_nullable(&self) -> &Schema {
        if let Some(any_of) = &self.any_of {
            let mut non_null = any_of
                .iter()
                .filter(|s| !matches!(&s.schema_type, Some(SchemaType::Single(t)) if t == "null"));
            if let (Some(inner), None) = (non_null.next(), non_null.next()) {
                return inner;
            }
        }
        self
    }

    /// Whether the schema is a string enumeration.
    pub fn is_string_enum(&self) -> bool {
        self.type_name().is_none_or(|t| t == "string")
            && self
                .enum_values
                .as_ref()
                .is_some_and(|values| !values.is_empty() && values.iter().all(|v| v.is_string()))
    }

    /// Name of the component schema a `$ref` points at.
    pub fn ref_name(&self) -> Option<&str> {
        self.ref_path
            .as_deref()
            .map(|path| path.rsplit('/').next().unwrap_or(path))
    }
}

impl Operation {
    /// JSON `$ref` schema of the 200 or 201 response.
    pub fn success_schema(&self) -> Option<&Schema> {
        ["200", "201"]
            .iter()
            .filter_map(|code| self.responses.get(*code))
            .find_map(|response| json_schema(&response.content))
    }

    /// JSON schema of the request body.
    pub fn body_schema(&self) -> Option<&Schema> {
        self.request_body
            .as_ref()
            .and_then(|body| json_schema(&body.content))
    }
}

fn json_schema(content: &BTreeMap<String, MediaType>) -> Option<&Schema> {
    content
        .get("application/json")
        .or_else(|| content.values().next())
        .and_then(|media| media.schema.as_ref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_any_of() {
        let schema: Schema = serde_json::from_str(
            r##"{"anyOf": [{"$ref": "#/components/schemas/Secret"}, {"type": "null"}]}"##,
        )
        .unwrap();
        assert_eq!(schema.unwrap_nullable().ref_name(), Some("Secret"));

        let schema: Schema = serde_json::from_str(r#"{"type": ["string", "null"]}"#).unwrap();
        assert_eq!(schema.type_name(), Some("string"));
    }

    #[test]
    fn test_string_enum() {
        let schema: Schema =
            serde_json::from_str(r#"{"type": "string", "enum": ["ENABLED", "DISABLED"]}"#).unwrap();
        assert!(schema.is_string_enum());
        let schema: Schema = serde_json::from_str(r#"{"type": "integer", "enum": [1, 2]}"#).unwrap();
        assert!(!schema.is_string_enum());
    }
}
