//! Well-known types shared across APIs.
//!
//! These are registered into the state before any parser runs, so a field of
//! type `.google.protobuf.Timestamp` always resolves even when the descriptor
//! set or OpenAPI document does not carry the definition.

use super::{ApiState, Enum, EnumValue, Message};
use crate::error::Result;

/// Package of the well-known types.
pub const WKT_PACKAGE: &str = "google.protobuf";

/// Messages from `google/protobuf/*.proto` that codecs special-case.
pub const WELL_KNOWN_MESSAGES: &[&str] = &[
    "Any",
    "Struct",
    "Value",
    "ListValue",
    "Empty",
    "FieldMask",
    "Duration",
    "Timestamp",
    "BoolValue",
    "BytesValue",
    "DoubleValue",
    "FloatValue",
    "Int32Value",
    "Int64Value",
    "StringValue",
    "UInt32Value",
    "UInt64Value",
];

/// Whether `id` names a well-known type.
pub fn is_well_known(id: &str) -> bool {
    well_known_name(id).is_some()
}

/// Short name (`Timestamp`) of a well-known type ID.
pub fn well_known_name(id: &str) -> Option<&str> {
    id.strip_prefix(".google.protobuf.")
        .filter(|name| *name == "NullValue" || WELL_KNOWN_MESSAGES.contains(name))
}

/// Register every well-known type that is not already present.
pub fn load_well_known_types(state: &mut ApiState) -> Result<()> {
    for name in WELL_KNOWN_MESSAGES {
        let id = format!(".{WKT_PACKAGE}.{name}");
        if state.contains(&id) {
            continue;
        }
        state.insert_message(Message::new(id, *name, WKT_PACKAGE))?;
    }

    let null_id = format!(".{WKT_PACKAGE}.NullValue");
    if !state.contains(&null_id) {
        let mut null_value = Enum::new(null_id.clone(), "NullValue", WKT_PACKAGE);
        null_value
            .values
            .push(EnumValue::new(&null_id, "NULL_VALUE", 0));
        state.insert_enum(null_value)?;
    }
    Ok(())
}
