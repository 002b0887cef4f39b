//! JSON view of an annotated model handed to the templates.
//!
//! Every node appears with its model fields plus its codec annotation under
//! `annotation`. Nested messages and enums are inlined under their parent,
//! and `all_messages`/`all_enums` list every node flat, parents first.

use serde_json::{Map, Value, json};

use crate::config::CodecOptions;
use crate::model::{Annotation, Api, Enum, Field, Message, Method, Service};

/// Build the render context for `api`.
pub fn build(api: &Api, options: &CodecOptions) -> Value {
    let codec: Map<String, Value> = options
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    json!({
        "api": {
            "name": api.name,
            "package_name": api.package_name,
            "title": api.title,
            "description": api.description,
            "annotation": annotation(api.annotation.as_ref()),
        },
        "messages": api.messages().map(|m| message(api, m)).collect::<Vec<_>>(),
        "enums": api.enums().map(enum_).collect::<Vec<_>>(),
        "services": api.services().map(|s| service(api, s)).collect::<Vec<_>>(),
        "all_messages": api.all_messages().into_iter().map(|m| message(api, m)).collect::<Vec<_>>(),
        "all_enums": api.all_enums().into_iter().map(enum_).collect::<Vec<_>>(),
        "codec": codec,
    })
}

fn annotation(slot: Option<&Annotation>) -> Value {
    slot.map_or(Value::Null, |a| a.data.clone())
}

fn message(api: &Api, message: &Message) -> Value {
    let messages: Vec<Value> = message
        .messages
        .iter()
        .filter_map(|id| api.state.message(id))
        .map(|m| self::message(api, m))
        .collect();
    let enums: Vec<Value> = message
        .enums
        .iter()
        .filter_map(|id| api.state.enum_(id))
        .map(enum_)
        .collect();
    json!({
        "id": message.id,
        "name": message.name,
        "package": message.package,
        "documentation": message.documentation,
        "deprecated": message.deprecated,
        "is_map_entry": message.is_map_entry,
        "fields": message.fields.iter().map(field).collect::<Vec<_>>(),
        "messages": messages,
        "enums": enums,
        "annotation": annotation(message.annotation.as_ref()),
    })
}

fn field(field: &Field) -> Value {
    json!({
        "id": field.id,
        "name": field.name,
        "typez": field.typez,
        "typez_id": field.typez_id,
        "optional": field.optional,
        "repeated": field.repeated,
        "json_name": field.json_name,
        "deprecated": field.deprecated,
        "documentation": field.documentation,
        "annotation": annotation(field.annotation.as_ref()),
    })
}

fn enum_(enum_: &Enum) -> Value {
    let values: Vec<Value> = enum_
        .values
        .iter()
        .map(|value| {
            json!({
                "id": value.id,
                "name": value.name,
                "number": value.number,
                "documentation": value.documentation,
                "annotation": annotation(value.annotation.as_ref()),
            })
        })
        .collect();
    json!({
        "id": enum_.id,
        "name": enum_.name,
        "package": enum_.package,
        "documentation": enum_.documentation,
        "deprecated": enum_.deprecated,
        "values": values,
        "annotation": annotation(enum_.annotation.as_ref()),
    })
}

fn service(api: &Api, service: &Service) -> Value {
    json!({
        "id": service.id,
        "name": service.name,
        "default_host": service.default_host,
        "documentation": service.documentation,
        "deprecated": service.deprecated,
        "methods": api.methods_of(service).map(method).collect::<Vec<_>>(),
        "annotation": annotation(service.annotation.as_ref()),
    })
}

fn method(method: &Method) -> Value {
    json!({
        "id": method.id,
        "name": method.name,
        "input_type_id": method.input_type_id,
        "output_type_id": method.output_type_id,
        "path_info": method.path_info,
        "operation_info": method.operation_info,
        "client_side_streaming": method.client_side_streaming,
        "server_side_streaming": method.server_side_streaming,
        "deprecated": method.deprecated,
        "documentation": method.documentation,
        "annotation": annotation(method.annotation.as_ref()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::codec::new_codec;
    use crate::codec::tests::secret_api;

    fn annotated() -> (Api, CodecOptions) {
        let mut api = secret_api();
        let mut options = CodecOptions::default();
        options.insert(CodecOptions::COPYRIGHT_YEAR, "2024");
        new_codec("rust", &options)
            .unwrap()
            .annotate_model(&mut api)
            .unwrap();
        (api, options)
    }

    #[test]
    fn test_nested_types_are_inlined() {
        let (api, options) = annotated();
        let context = build(&api, &options);

        let version = context["messages"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["name"] == "SecretVersion")
            .unwrap();
        assert_eq!(version["enums"][0]["name"], "State");
        assert_eq!(
            version["enums"][0]["annotation"]["qualified_name"],
            "secret_version::State"
        );
        assert_eq!(version["annotation"]["has_nested_types"], true);
    }

    #[test]
    fn test_flat_lists_and_codec_options() {
        let (api, options) = annotated();
        let context = build(&api, &options);

        assert_eq!(context["codec"]["copyright-year"], "2024");
        assert_eq!(context["api"]["annotation"]["copyright_year"], "2024");
        let all: Vec<&str> = context["all_enums"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(all, vec!["State"]);
        let method = &context["services"][0]["methods"][0];
        assert_eq!(method["annotation"]["name"], "create_secret");
        assert_eq!(method["annotation"]["verb"], "POST");
    }

    #[test]
    fn test_context_is_deterministic() {
        let (api, options) = annotated();
        assert_eq!(build(&api, &options), build(&api, &options));
    }
}
