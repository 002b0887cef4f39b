//! Cross-reference pass.
//!
//! Runs once on a parsed model. It links every nested node to its parent,
//! checks that the nesting is a tree, verifies that every type reference
//! resolves and computes the query parameters of each REST binding. Nothing
//! here rewrites a reference; IDs stay IDs.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Api, ApiState, Message, Method};

/// Link, validate and compute derived data for `api`.
pub fn cross_reference(api: &mut Api) -> Result<()> {
    link_parents(&mut api.state)?;
    check_acyclic(&api.state)?;
    validate_references(&api.state)?;
    compute_query_parameters(&mut api.state);
    debug!(
        messages = api.state.message_by_id.len(),
        methods = api.state.method_by_id.len(),
        "Cross-referenced model."
    );
    Ok(())
}

fn link_parents(state: &mut ApiState) -> Result<()> {
    // child id -> the parent listing it
    let mut owners: BTreeMap<String, String> = BTreeMap::new();
    let mut claim = |child: &str, parent: &str| -> Result<()> {
        if let Some(previous) = owners.insert(child.to_string(), parent.to_string())
            && previous != parent
        {
            return Err(Error::Specification(format!(
                "'{child}' is nested in both '{previous}' and '{parent}'"
            )));
        }
        Ok(())
    };

    for message in state.message_by_id.values() {
        for child in message.messages.iter().chain(&message.enums) {
            claim(child, &message.id)?;
        }
    }
    let mut method_owners = BTreeMap::new();
    for service in state.service_by_id.values() {
        for method in &service.methods {
            if let Some(previous) = method_owners.insert(method.clone(), service.id.clone()) {
                return Err(Error::Specification(format!(
                    "method '{method}' is listed by both '{previous}' and '{}'",
                    service.id
                )));
            }
        }
    }

    for (child, parent) in owners {
        let existing = if let Some(message) = state.message_by_id.get_mut(&child) {
            &mut message.parent
        } else if let Some(enum_) = state.enum_by_id.get_mut(&child) {
            &mut enum_.parent
        } else {
            return Err(Error::Reference {
                element: format!("nested elements of '{parent}'"),
                id: child,
            });
        };
        if let Some(current) = existing.as_deref()
            && current != parent
        {
            return Err(Error::Specification(format!(
                "'{child}' points at parent '{current}' but is nested in '{parent}'"
            )));
        }
        *existing = Some(parent);
    }

    for enum_ in state.enum_by_id.values_mut() {
        for value in &mut enum_.values {
            value.parent.clone_from(&enum_.id);
        }
    }

    for (method_id, service_id) in method_owners {
        let method = state
            .method_by_id
            .get_mut(&method_id)
            .ok_or_else(|| Error::Reference {
                element: format!("methods of '{service_id}'"),
                id: method_id.clone(),
            })?;
        method.service_id = service_id;
    }
    Ok(())
}

/// Parent chain of `id`, nearest first.
///
/// Fails when the chain loops back on itself.
pub fn ancestors(state: &ApiState, id: &str) -> Result<Vec<String>> {
    let mut chain: Vec<String> = Vec::new();
    let mut seen = BTreeSet::from([id.to_string()]);
    let mut next = parent_of(state, id);
    while let Some(parent) = next {
        if !seen.insert(parent.to_string()) {
            return Err(Error::Specification(format!(
                "nesting cycle through '{parent}' while resolving '{id}'"
            )));
        }
        chain.push(parent.to_string());
        next = parent_of(state, parent);
    }
    Ok(chain)
}

fn parent_of<'a>(state: &'a ApiState, id: &str) -> Option<&'a str> {
    state
        .message(id)
        .and_then(|m| m.parent.as_deref())
        .or_else(|| state.enum_(id).and_then(|e| e.parent.as_deref()))
}

/// Fail if any message or enum is its own ancestor.
pub fn check_acyclic(state: &ApiState) -> Result<()> {
    for id in state.message_by_id.keys().chain(state.enum_by_id.keys()) {
        ancestors(state, id)?;
    }
    Ok(())
}

fn validate_references(state: &ApiState) -> Result<()> {
    for message in state.message_by_id.values() {
        for field in &message.fields {
            if let Some(target) = &field.typez_id
                && state.message(target).is_none()
                && state.enum_(target).is_none()
            {
                return Err(Error::Reference {
                    element: format!("field '{}'", field.id),
                    id: target.clone(),
                });
            }
        }
    }

    for method in state.method_by_id.values() {
        let mut targets = vec![
            ("input", &method.input_type_id),
            ("output", &method.output_type_id),
        ];
        if let Some(info) = &method.operation_info {
            targets.push(("operation response", &info.response_type_id));
            targets.push(("operation metadata", &info.metadata_type_id));
        }
        for (role, target) in targets {
            if state.message(target).is_none() {
                return Err(Error::Reference {
                    element: format!("{role} type of method '{}'", method.id),
                    id: target.clone(),
                });
            }
        }
    }
    Ok(())
}

fn compute_query_parameters(state: &mut ApiState) {
    let mut computed = Vec::new();
    for method in state.method_by_id.values() {
        if method.path_info.is_none() {
            continue;
        }
        if let Some(request) = state.message(&method.input_type_id) {
            computed.push((method.id.clone(), query_parameters(method, request)));
        }
    }
    for (id, params) in computed {
        if let Some(info) = state
            .method_by_id
            .get_mut(&id)
            .and_then(|m| m.path_info.as_mut())
        {
            info.query_parameters = params;
        }
    }
}

/// Wire names of request fields that are neither bound in the path nor sent
/// as the body.
fn query_parameters(method: &Method, request: &Message) -> BTreeSet<String> {
    let Some(info) = &method.path_info else {
        return BTreeSet::new();
    };
    let body = info.body_field_path.as_deref();
    if body == Some("*") {
        return BTreeSet::new();
    }
    let mut consumed: BTreeSet<&str> = BTreeSet::new();
    for path in info.path_template.field_paths() {
        let head = path.split('.').next().unwrap_or(path);
        if let Some(field) = request.field_by_any_name(head) {
            consumed.insert(field.name.as_str());
        }
    }
    if let Some(body) = body
        && let Some(field) = request.field_by_any_name(body)
    {
        consumed.insert(field.name.as_str());
    }
    request
        .fields
        .iter()
        .filter(|field| !consumed.contains(field.name.as_str()))
        .map(|field| field.json_name.clone())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{
        Enum, EnumValue, Field, HttpVerb, OperationInfo, PathInfo, PathTemplate, Service, Typez,
    };

    const PKG: &str = "google.cloud.secretmanager.v1";

    fn secret_api() -> Api {
        let mut api = Api::new("secretmanager", PKG);
        let secret_id = ".google.cloud.secretmanager.v1.Secret";
        let version_id = ".google.cloud.secretmanager.v1.SecretVersion";
        let state_id = ".google.cloud.secretmanager.v1.SecretVersion.State";
        let request_id = ".google.cloud.secretmanager.v1.CreateSecretRequest";
        let service_id = ".google.cloud.secretmanager.v1.SecretManagerService";

        let mut secret = Message::new(secret_id, "Secret", PKG);
        secret.fields.push(Field::new(secret_id, "name", Typez::String));
        let mut version = Message::new(version_id, "SecretVersion", PKG);
        version.enums.push(state_id.into());
        version
            .fields
            .push(Field::new(version_id, "state", Typez::Enum).with_type_id(state_id));
        let mut state_enum = Enum::new(state_id, "State", PKG);
        state_enum.values.push(EnumValue::new(state_id, "ENABLED", 1));

        let mut request = Message::new(request_id, "CreateSecretRequest", PKG);
        request.fields = vec![
            Field::new(request_id, "parent", Typez::String),
            Field::new(request_id, "secret_id", Typez::String),
            Field::new(request_id, "secret", Typez::Message)
                .with_type_id(secret_id)
                .with_optional(true),
            Field::new(request_id, "request_id", Typez::String),
            Field::new(request_id, "validate_only", Typez::Bool),
        ];

        let mut method = Method::new(service_id, "CreateSecret");
        method.input_type_id = request_id.into();
        method.output_type_id = secret_id.into();
        method.path_info = Some(
            PathInfo::new(
                HttpVerb::Post,
                PathTemplate::parse("/v1/{parent=projects/*}/secrets/{secretId}").unwrap(),
            )
            .with_body("secret"),
        );
        let mut service = Service::new(service_id, "SecretManagerService", PKG);
        service.methods.push(method.id.clone());

        for message in [secret, version, request] {
            api.messages.push(message.id.clone());
            api.state.insert_message(message).unwrap();
        }
        api.state.insert_enum(state_enum).unwrap();
        api.state.insert_method(method).unwrap();
        api.services.push(service_id.into());
        api.state.insert_service(service).unwrap();
        api
    }

    #[test]
    fn test_parent_links_are_bidirectional() {
        let mut api = secret_api();
        cross_reference(&mut api).unwrap();

        let state_id = ".google.cloud.secretmanager.v1.SecretVersion.State";
        let state = api.state.enum_(state_id).unwrap();
        let parent = state.parent.as_deref().unwrap();
        assert!(api.state.message(parent).unwrap().enums.iter().any(|e| e == state_id));
        assert_eq!(state.values[0].parent, state_id);
        assert_eq!(
            ancestors(&api.state, state_id).unwrap(),
            vec![".google.cloud.secretmanager.v1.SecretVersion"]
        );
    }

    #[test]
    fn test_query_parameters_skip_path_and_body() {
        let mut api = secret_api();
        cross_reference(&mut api).unwrap();
        let method = api
            .state
            .method(".google.cloud.secretmanager.v1.SecretManagerService.CreateSecret")
            .unwrap();
        let params: Vec<_> = method
            .path_info
            .as_ref()
            .unwrap()
            .query_parameters
            .iter()
            .cloned()
            .collect();
        assert_eq!(params, vec!["requestId", "validateOnly"]);
    }

    #[test]
    fn test_body_star_consumes_everything() {
        let mut api = secret_api();
        let id = ".google.cloud.secretmanager.v1.SecretManagerService.CreateSecret";
        let info = api.state.method_by_id.get_mut(id).unwrap().path_info.as_mut().unwrap();
        info.body_field_path = Some("*".into());
        cross_reference(&mut api).unwrap();
        let info = api.state.method(id).unwrap().path_info.as_ref().unwrap();
        assert!(info.query_parameters.is_empty());
    }

    #[test]
    fn test_unresolved_field_type_is_fatal() {
        let mut api = secret_api();
        let secret = api
            .state
            .message_by_id
            .get_mut(".google.cloud.secretmanager.v1.Secret")
            .unwrap();
        secret
            .fields
            .push(Field::new(&secret.id, "missing", Typez::Message).with_type_id(".nowhere.Missing"));
        let err = cross_reference(&mut api).unwrap_err();
        assert!(matches!(&err, Error::Reference { id, .. } if id == ".nowhere.Missing"));
        assert!(err.to_string().contains("Secret.missing"));
    }

    #[test]
    fn test_unresolved_operation_type_is_fatal() {
        let mut api = secret_api();
        let id = ".google.cloud.secretmanager.v1.SecretManagerService.CreateSecret";
        api.state.method_by_id.get_mut(id).unwrap().operation_info = Some(OperationInfo {
            metadata_type_id: ".google.cloud.secretmanager.v1.OperationMetadata".into(),
            response_type_id: ".google.cloud.secretmanager.v1.Secret".into(),
        });
        let err = cross_reference(&mut api).unwrap_err();
        assert!(err.to_string().contains("OperationMetadata"));
    }

    #[test]
    fn test_child_listed_twice_is_rejected() {
        let mut api = secret_api();
        let other = Message {
            enums: vec![".google.cloud.secretmanager.v1.SecretVersion.State".into()],
            ..Message::new(".google.cloud.secretmanager.v1.Other", "Other", PKG)
        };
        api.state.insert_message(other).unwrap();
        assert!(cross_reference(&mut api).is_err());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut api = Api::new("test", "test");
        let mut a = Message::new(".test.A", "A", "test");
        a.messages.push(".test.B".into());
        let mut b = Message::new(".test.B", "B", "test");
        b.messages.push(".test.A".into());
        api.state.insert_message(a).unwrap();
        api.state.insert_message(b).unwrap();
        let err = cross_reference(&mut api).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_cross_reference_is_repeatable() {
        let mut api = secret_api();
        cross_reference(&mut api).unwrap();
        cross_reference(&mut api).unwrap();
    }
}
