//! Protobuf descriptor parser.
//!
//! Input is a binary `FileDescriptorSet` as written by
//! `protoc --descriptor_set_out=... --include_source_info --include_imports`,
//! either a single file or a directory of `*.pb`, `*.binpb` and `*.desc`
//! files. Files selected by the include/exclude lists are generated; every
//! other file only contributes elements for reference resolution.

pub mod descriptor;
mod docs;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use prost::Message as _;
use tracing::{debug, warn};

use self::descriptor::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet, LABEL_REPEATED, MethodDescriptorProto, ServiceDescriptorProto,
    TYPE_MESSAGE,
};
use self::docs::{
    DocIndex, ENUM_VALUE, FILE_ENUM, FILE_MESSAGE, FILE_SERVICE, MESSAGE_FIELD,
    MESSAGE_NESTED_ENUM, MESSAGE_NESTED_MESSAGE, SERVICE_METHOD, child,
};
use super::{FileFilter, ServiceConfig, api_name_from_package, binding, element_id, qualify};
use crate::config::SourceOptions;
use crate::error::{Error, Result};
use crate::model::wkt::{is_well_known, load_well_known_types};
use crate::model::{
    Api, Enum, EnumValue, Field, Message, Method, OperationInfo, Service, Typez,
};

const DESCRIPTOR_EXTENSIONS: &[&str] = &["pb", "binpb", "desc"];

/// Parse descriptor files at `source`.
pub fn parse(
    source: &Path,
    filter: &FileFilter,
    options: &SourceOptions,
    service_config: Option<&ServiceConfig>,
) -> Result<Api> {
    let set = load_descriptor_set(source)?;
    parse_descriptor_set(&set, filter, options, service_config)
}

/// Decode and merge every descriptor set found at `source`.
pub fn load_descriptor_set(source: &Path) -> Result<FileDescriptorSet> {
    let paths = if source.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(source)
            .map_err(|err| Error::io(source, err))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| DESCRIPTOR_EXTENSIONS.contains(&ext))
            })
            .collect();
        // Sort for deterministic output
        paths.sort();
        paths
    } else {
        vec![source.to_path_buf()]
    };

    let mut merged = FileDescriptorSet::default();
    for path in paths {
        let bytes = fs::read(&path).map_err(|err| Error::io(&path, err))?;
        let set = FileDescriptorSet::decode(bytes.as_slice())
            .map_err(|source| Error::Decode { path: path.clone(), source })?;
        for file in set.file {
            // The same import shows up in every set built with --include_imports.
            if !merged.file.iter().any(|f| f.name == file.name) {
                merged.file.push(file);
            }
        }
    }
    debug!(files = merged.file.len(), "Loaded descriptor set.");
    Ok(merged)
}

/// Build the model from an already decoded descriptor set.
pub fn parse_descriptor_set(
    set: &FileDescriptorSet,
    filter: &FileFilter,
    options: &SourceOptions,
    service_config: Option<&ServiceConfig>,
) -> Result<Api> {
    let mut builder = Builder::new()?;

    let mut package_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for file in &set.file {
        let generate = filter.allows(&file.name) && file.package != "google.protobuf";
        if generate {
            *package_counts.entry(file.package.as_str()).or_default() += 1;
        }
        builder.add_file(file, generate)?;
    }

    let package = match options.get(SourceOptions::PACKAGE_NAME) {
        Some(package) => package.to_string(),
        None => most_frequent(&package_counts).ok_or_else(|| {
            Error::Specification("descriptor set contains no files to generate".into())
        })?,
    };

    let mut api = builder.api;
    api.name = api_name_from_package(&package);
    api.state.package.clone_from(&package);
    api.package_name = package;

    if let Some(config) = service_config {
        if let Some(label) = config.name.split('.').next()
            && !label.is_empty()
        {
            api.name = label.to_string();
        }
        apply_http_overrides(&mut api, config)?;
        add_mixins(&mut api, config)?;
    }
    Ok(api)
}

/// Most common package; ties resolve to the lexicographically smallest.
fn most_frequent(counts: &BTreeMap<&str, usize>) -> Option<String> {
    let max = counts.values().copied().max()?;
    counts
        .iter()
        .find(|(_, count)| **count == max)
        .map(|(package, _)| (*package).to_string())
}

struct Builder {
    api: Api,
}

impl Builder {
    fn new() -> Result<Self> {
        let mut api = Api::default();
        load_well_known_types(&mut api.state)?;
        Ok(Self { api })
    }

    fn add_file(&mut self, file: &FileDescriptorProto, generate: bool) -> Result<()> {
        let docs = DocIndex::new(file.source_code_info.as_ref());
        let package = file.package.as_str();

        for (i, message) in file.message_type.iter().enumerate() {
            let id = element_id(package, &message.name);
            let path = vec![FILE_MESSAGE, i as i32];
            if self.add_message(message, &id, package, &docs, &path)? && generate {
                self.api.messages.push(id);
            }
        }
        for (i, enum_) in file.enum_type.iter().enumerate() {
            let id = element_id(package, &enum_.name);
            let path = vec![FILE_ENUM, i as i32];
            if self.add_enum(enum_, &id, package, &docs, &path)? && generate {
                self.api.enums.push(id);
            }
        }
        for (i, service) in file.service.iter().enumerate() {
            let path = vec![FILE_SERVICE, i as i32];
            let id = self.add_service(service, package, &docs, &path)?;
            if generate {
                self.api.services.push(id);
            }
        }
        Ok(())
    }

    /// Returns `false` when the message is a pre-registered well-known type.
    fn add_message(
        &mut self,
        proto: &DescriptorProto,
        id: &str,
        package: &str,
        docs: &DocIndex,
        path: &[i32],
    ) -> Result<bool> {
        if is_well_known(id) && self.api.state.contains(id) {
            return Ok(false);
        }
        let mut message = Message::new(id, &proto.name, package);
        message.documentation = docs.get(path);
        if let Some(options) = &proto.options {
            message.is_map_entry = options.map_entry;
            message.deprecated = options.deprecated;
        }

        for (j, field) in proto.field.iter().enumerate() {
            let mut field = convert_field(field, id)?;
            field.documentation = docs.get(&child(path, MESSAGE_FIELD, j));
            message.fields.push(field);
        }
        for (k, nested) in proto.nested_type.iter().enumerate() {
            let nested_id = format!("{id}.{}", nested.name);
            let nested_path = child(path, MESSAGE_NESTED_MESSAGE, k);
            if self.add_message(nested, &nested_id, package, docs, &nested_path)? {
                message.messages.push(nested_id);
            }
        }
        for (k, nested) in proto.enum_type.iter().enumerate() {
            let nested_id = format!("{id}.{}", nested.name);
            let nested_path = child(path, MESSAGE_NESTED_ENUM, k);
            if self.add_enum(nested, &nested_id, package, docs, &nested_path)? {
                message.enums.push(nested_id);
            }
        }

        self.api.state.insert_message(message)?;
        Ok(true)
    }

    fn add_enum(
        &mut self,
        proto: &EnumDescriptorProto,
        id: &str,
        package: &str,
        docs: &DocIndex,
        path: &[i32],
    ) -> Result<bool> {
        if is_well_known(id) && self.api.state.contains(id) {
            return Ok(false);
        }
        let mut enum_ = Enum::new(id, &proto.name, package);
        enum_.documentation = docs.get(path);
        enum_.deprecated = proto.options.as_ref().is_some_and(|o| o.deprecated);
        for (j, value) in proto.value.iter().enumerate() {
            let mut value_ = EnumValue::new(id, &value.name, value.number);
            value_.documentation = docs.get(&child(path, ENUM_VALUE, j));
            enum_.values.push(value_);
        }
        self.api.state.insert_enum(enum_)?;
        Ok(true)
    }

    fn add_service(
        &mut self,
        proto: &ServiceDescriptorProto,
        package: &str,
        docs: &DocIndex,
        path: &[i32],
    ) -> Result<String> {
        let id = element_id(package, &proto.name);
        let mut service = Service::new(&id, &proto.name, package);
        service.documentation = docs.get(path);
        if let Some(options) = &proto.options {
            service.default_host.clone_from(&options.default_host);
            service.deprecated = options.deprecated;
        }
        for (j, method) in proto.method.iter().enumerate() {
            let mut method = convert_method(method, &id, package)?;
            method.documentation = docs.get(&child(path, SERVICE_METHOD, j));
            service.methods.push(method.id.clone());
            self.api.state.insert_method(method)?;
        }
        self.api.state.insert_service(service)?;
        Ok(id)
    }
}

fn convert_field(proto: &FieldDescriptorProto, message_id: &str) -> Result<Field> {
    let typez = Typez::from_proto(proto.r#type).ok_or_else(|| {
        Error::Specification(format!(
            "field '{message_id}.{}' has unknown type {}",
            proto.name, proto.r#type
        ))
    })?;
    let repeated = proto.label == LABEL_REPEATED;
    // Oneof members track presence; proto3 `optional` is a synthetic oneof.
    let in_oneof = proto.oneof_index.is_some() || proto.proto3_optional;
    let mut field = Field::new(message_id, &proto.name, typez)
        .with_repeated(repeated)
        .with_optional(in_oneof || (proto.r#type == TYPE_MESSAGE && !repeated));
    if !proto.json_name.is_empty() {
        field.json_name.clone_from(&proto.json_name);
    }
    if typez.is_reference() {
        if proto.type_name.is_empty() {
            return Err(Error::Specification(format!(
                "field '{}' is missing its type name",
                field.id
            )));
        }
        field.typez_id = Some(proto.type_name.clone());
    }
    field.deprecated = proto.options.as_ref().is_some_and(|o| o.deprecated);
    Ok(field)
}

fn convert_method(proto: &MethodDescriptorProto, service_id: &str, package: &str) -> Result<Method> {
    let mut method = Method::new(service_id, &proto.name);
    method.input_type_id = qualify(&proto.input_type, package);
    method.output_type_id = qualify(&proto.output_type, package);
    method.client_side_streaming = proto.client_streaming;
    method.server_side_streaming = proto.server_streaming;

    let Some(options) = &proto.options else {
        return Ok(method);
    };
    method.deprecated = options.deprecated;
    if let Some(rule) = &options.http {
        let (verb, path) = rule.binding().ok_or_else(|| {
            Error::Specification(format!("method '{}' has an unsupported HTTP binding", method.id))
        })?;
        method.path_info = Some(binding(verb, path, &rule.body)?);
    }
    if let Some(info) = &options.operation_info {
        method.operation_info = Some(OperationInfo {
            response_type_id: qualify(&info.response_type, package),
            metadata_type_id: qualify(&info.metadata_type, package),
        });
    }
    Ok(method)
}

/// Service-config HTTP rules replace descriptor bindings for generated methods.
fn apply_http_overrides(api: &mut Api, config: &ServiceConfig) -> Result<()> {
    let method_ids: Vec<String> = api
        .services
        .iter()
        .filter_map(|id| api.state.service(id))
        .flat_map(|s| s.methods.iter().cloned())
        .collect();
    for id in method_ids {
        if let Some(rule) = config.http_rule(&id) {
            let info = rule.path_info()?;
            if let Some(method) = api.state.method_by_id.get_mut(&id) {
                method.path_info = Some(info);
            }
        }
    }
    Ok(())
}

/// Copy mixin methods (e.g. `google.cloud.location.Locations`) into every
/// generated service. Only mixin methods with an HTTP rule in the service
/// config are copied.
fn add_mixins(api: &mut Api, config: &ServiceConfig) -> Result<()> {
    let mut mixin_methods = Vec::new();
    for entry in &config.apis {
        let mixin_id = format!(".{}", entry.name);
        if api.services.contains(&mixin_id) {
            continue;
        }
        let Some(mixin) = api.state.service(&mixin_id) else {
            warn!(mixin = %entry.name, "Mixin listed in service config is not in the descriptor set.");
            continue;
        };
        for method_id in &mixin.methods {
            let Some(rule) = config.http_rule(method_id) else {
                continue;
            };
            if let Some(method) = api.state.method(method_id) {
                mixin_methods.push((method.clone(), rule.path_info()?));
            }
        }
    }

    for service_id in api.services.clone() {
        for (template, path_info) in &mixin_methods {
            let mut method = Method {
                path_info: Some(path_info.clone()),
                ..Method::new(&service_id, &template.name)
            };
            method.input_type_id.clone_from(&template.input_type_id);
            method.output_type_id.clone_from(&template.output_type_id);
            method.operation_info.clone_from(&template.operation_info);
            method.documentation = config
                .documentation_for(&template.id)
                .map_or_else(|| template.documentation.clone(), str::to_string);
            if api.state.contains(&method.id) {
                // The service already declares a method with this name.
                continue;
            }
            if let Some(service) = api.state.service_by_id.get_mut(&service_id) {
                service.methods.push(method.id.clone());
            }
            api.state.insert_method(method)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::descriptor::{
        HttpRule, Location, MessageOptions, MethodOptions, OperationInfo as OperationInfoProto,
        ServiceOptions, SourceCodeInfo, TYPE_ENUM, http_rule::Pattern,
    };
    use super::*;
    use crate::model::HttpVerb;
    use std::path::Path;

    const TYPE_STRING: i32 = 9;

    fn field(name: &str, number: i32, r#type: i32, type_name: &str) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: name.into(),
            number,
            label: 1,
            r#type,
            type_name: type_name.into(),
            ..FieldDescriptorProto::default()
        }
    }

    fn test_file() -> FileDescriptorProto {
        let foo = DescriptorProto {
            name: "Foo".into(),
            field: vec![
                field("name", 1, TYPE_STRING, ""),
                field("content", 2, TYPE_STRING, ""),
                field("state", 3, TYPE_ENUM, ".test.Foo.State"),
                FieldDescriptorProto {
                    label: LABEL_REPEATED,
                    ..field("labels", 4, TYPE_MESSAGE, ".test.Foo.LabelsEntry")
                },
            ],
            nested_type: vec![DescriptorProto {
                name: "LabelsEntry".into(),
                field: vec![
                    field("key", 1, TYPE_STRING, ""),
                    field("value", 2, TYPE_STRING, ""),
                ],
                options: Some(MessageOptions {
                    map_entry: true,
                    ..MessageOptions::default()
                }),
                ..DescriptorProto::default()
            }],
            enum_type: vec![EnumDescriptorProto {
                name: "State".into(),
                value: vec![
                    descriptor::EnumValueDescriptorProto {
                        name: "STATE_UNSPECIFIED".into(),
                        number: 0,
                    },
                    descriptor::EnumValueDescriptorProto {
                        name: "ENABLED".into(),
                        number: 1,
                    },
                ],
                ..EnumDescriptorProto::default()
            }],
            ..DescriptorProto::default()
        };
        let request = DescriptorProto {
            name: "CreateFooRequest".into(),
            field: vec![
                field("parent", 1, TYPE_STRING, ""),
                field("foo", 2, TYPE_MESSAGE, ".test.Foo"),
            ],
            ..DescriptorProto::default()
        };
        let create = MethodDescriptorProto {
            name: "CreateFoo".into(),
            input_type: ".test.CreateFooRequest".into(),
            output_type: ".test.Foo".into(),
            options: Some(MethodOptions {
                http: Some(HttpRule {
                    pattern: Some(Pattern::Post("/v1/{parent=projects/*}/foos".into())),
                    body: "foo".into(),
                }),
                ..MethodOptions::default()
            }),
            ..MethodDescriptorProto::default()
        };
        let delete = MethodDescriptorProto {
            name: "DeleteFoo".into(),
            input_type: ".test.CreateFooRequest".into(),
            output_type: ".google.longrunning.Operation".into(),
            options: Some(MethodOptions {
                operation_info: Some(OperationInfoProto {
                    response_type: "google.protobuf.Empty".into(),
                    metadata_type: "OperationMetadata".into(),
                }),
                ..MethodOptions::default()
            }),
            ..MethodDescriptorProto::default()
        };
        FileDescriptorProto {
            name: "test/service.proto".into(),
            package: "test".into(),
            message_type: vec![foo, request],
            service: vec![ServiceDescriptorProto {
                name: "FooService".into(),
                method: vec![create, delete],
                options: Some(ServiceOptions {
                    default_host: "foo.googleapis.com".into(),
                    ..ServiceOptions::default()
                }),
            }],
            source_code_info: Some(SourceCodeInfo {
                location: vec![
                    Location {
                        path: vec![4, 0],
                        leading_comments: " A Foo resource.\n".into(),
                    },
                    Location {
                        path: vec![4, 0, 4, 0],
                        leading_comments: " Foo states.\n".into(),
                    },
                    Location {
                        path: vec![6, 0, 2, 0],
                        leading_comments: " Creates a Foo.\n".into(),
                    },
                ],
            }),
            ..FileDescriptorProto::default()
        }
    }

    fn parse_set(files: Vec<FileDescriptorProto>, filter: &FileFilter) -> Api {
        let set = FileDescriptorSet { file: files };
        parse_descriptor_set(&set, filter, &SourceOptions::default(), None).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let api = parse_set(vec![test_file()], &FileFilter::All);
        assert_eq!(api.package_name, "test");
        assert_eq!(api.services.len(), 1);

        let service = api.state.service(".test.FooService").unwrap();
        assert_eq!(service.default_host, "foo.googleapis.com");
        assert_eq!(service.methods.len(), 2);

        let method = api.state.method(".test.FooService.CreateFoo").unwrap();
        assert!(api.state.message(&method.input_type_id).is_some());
        let info = method.path_info.as_ref().unwrap();
        assert_eq!(info.verb, HttpVerb::Post);
        assert_eq!(info.body_field_path.as_deref(), Some("foo"));
        assert_eq!(method.documentation, "Creates a Foo.");

        let foo = api.state.message(".test.Foo").unwrap();
        assert_eq!(foo.documentation, "A Foo resource.");
        assert_eq!(foo.field("name").unwrap().typez, Typez::String);
        assert_eq!(foo.messages, vec![".test.Foo.LabelsEntry"]);
        assert_eq!(foo.enums, vec![".test.Foo.State"]);
        let labels = foo.field("labels").unwrap();
        assert!(labels.repeated);
        assert!(!labels.optional);
        assert!(
            api.state
                .message(".test.Foo.LabelsEntry")
                .unwrap()
                .is_map_entry
        );
        let state = api.state.enum_(".test.Foo.State").unwrap();
        assert_eq!(state.documentation, "Foo states.");
        assert_eq!(state.values[1].number, 1);
    }

    #[test]
    fn test_operation_info_is_qualified() {
        let api = parse_set(vec![test_file()], &FileFilter::All);
        let method = api.state.method(".test.FooService.DeleteFoo").unwrap();
        let info = method.operation_info.as_ref().unwrap();
        assert_eq!(info.response_type_id, ".google.protobuf.Empty");
        assert_eq!(info.metadata_type_id, ".test.OperationMetadata");
        assert!(method.path_info.is_none());
    }

    #[test]
    fn test_dependency_files_are_not_generated() {
        let mut dependency = FileDescriptorProto {
            name: "other/dep.proto".into(),
            package: "other".into(),
            message_type: vec![DescriptorProto {
                name: "Dep".into(),
                ..DescriptorProto::default()
            }],
            ..FileDescriptorProto::default()
        };
        dependency.message_type.push(DescriptorProto {
            name: "Dep2".into(),
            ..DescriptorProto::default()
        });
        let filter = FileFilter::Exclude(["other/dep.proto".to_string()].into());
        let api = parse_set(vec![test_file(), dependency], &filter);
        assert_eq!(api.messages, vec![".test.Foo", ".test.CreateFooRequest"]);
        assert!(api.state.message(".other.Dep").is_some());
    }

    #[test]
    fn test_well_known_types_are_not_duplicated() {
        let wkt = FileDescriptorProto {
            name: "google/protobuf/timestamp.proto".into(),
            package: "google.protobuf".into(),
            message_type: vec![DescriptorProto {
                name: "Timestamp".into(),
                ..DescriptorProto::default()
            }],
            ..FileDescriptorProto::default()
        };
        let api = parse_set(vec![wkt, test_file()], &FileFilter::All);
        assert!(api.state.message(".google.protobuf.Timestamp").is_some());
        assert!(!api.messages.iter().any(|id| id.contains("Timestamp")));
    }

    #[test]
    fn test_oneof_members_track_presence() {
        let mut file = test_file();
        let fields = &mut file.message_type[0].field;
        fields.push(FieldDescriptorProto {
            oneof_index: Some(0),
            ..field("text", 5, TYPE_STRING, "")
        });
        fields.push(FieldDescriptorProto {
            oneof_index: Some(1),
            proto3_optional: true,
            ..field("etag", 6, TYPE_STRING, "")
        });
        let api = parse_set(vec![file], &FileFilter::All);

        let foo = api.state.message(".test.Foo").unwrap();
        assert!(foo.field("text").unwrap().optional);
        assert!(foo.field("etag").unwrap().optional);
        assert!(!foo.field("content").unwrap().optional);
    }

    #[test]
    fn test_unknown_field_type_names_field() {
        let mut file = test_file();
        file.message_type[0].field[0].r#type = 42;
        let set = FileDescriptorSet { file: vec![file] };
        let err = parse_descriptor_set(&set, &FileFilter::All, &SourceOptions::default(), None)
            .unwrap_err();
        assert!(err.to_string().contains(".test.Foo.name"));
    }

    #[test]
    fn test_mixins_from_service_config() {
        let locations = FileDescriptorProto {
            name: "google/cloud/location/locations.proto".into(),
            package: "google.cloud.location".into(),
            message_type: vec![
                DescriptorProto {
                    name: "GetLocationRequest".into(),
                    ..DescriptorProto::default()
                },
                DescriptorProto {
                    name: "Location".into(),
                    ..DescriptorProto::default()
                },
            ],
            service: vec![ServiceDescriptorProto {
                name: "Locations".into(),
                method: vec![MethodDescriptorProto {
                    name: "GetLocation".into(),
                    input_type: ".google.cloud.location.GetLocationRequest".into(),
                    output_type: ".google.cloud.location.Location".into(),
                    ..MethodDescriptorProto::default()
                }],
                ..ServiceDescriptorProto::default()
            }],
            ..FileDescriptorProto::default()
        };
        let config = ServiceConfig::parse(
            r#"
name: foo.googleapis.com
apis:
- name: google.cloud.location.Locations
- name: test.FooService
http:
  rules:
  - selector: google.cloud.location.Locations.GetLocation
    get: '/v1/{name=projects/*/locations/*}'
"#,
            Path::new("foo.yaml"),
        )
        .unwrap();
        let set = FileDescriptorSet {
            file: vec![locations, test_file()],
        };
        let filter = FileFilter::Include(["test/service.proto".to_string()].into());
        let api =
            parse_descriptor_set(&set, &filter, &SourceOptions::default(), Some(&config)).unwrap();

        assert_eq!(api.services, vec![".test.FooService"]);
        assert_eq!(api.name, "foo");
        let service = api.state.service(".test.FooService").unwrap();
        assert_eq!(
            service.methods.last().map(String::as_str),
            Some(".test.FooService.GetLocation")
        );
        let mixin = api.state.method(".test.FooService.GetLocation").unwrap();
        assert_eq!(mixin.input_type_id, ".google.cloud.location.GetLocationRequest");
        assert_eq!(mixin.path_info.as_ref().unwrap().verb, HttpVerb::Get);
    }

    #[test]
    fn test_load_descriptor_set_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let set = FileDescriptorSet {
            file: vec![test_file()],
        };
        fs::write(dir.path().join("service.binpb"), set.encode_to_vec()).unwrap();
        // Duplicate file in a second set is merged away.
        fs::write(dir.path().join("again.pb"), set.encode_to_vec()).unwrap();
        fs::write(dir.path().join("README.md"), "not a descriptor").unwrap();

        let loaded = load_descriptor_set(dir.path()).unwrap();
        assert_eq!(loaded.file.len(), 1);
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_load_descriptor_set_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pb");
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        let err = load_descriptor_set(&path).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
