//! Parameter lists embedded in project, build type and build records.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::Record;

use super::fields;

/// One entry of a `{"property": [...]}` parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Absent for password parameters, which the server never returns.
    pub value: Option<String>,
    /// The parameter's type spec, e.g. `password display='hidden'`.
    pub raw_type: Option<String>,
}

impl Parameter {
    fn from_record(record: &Record) -> Option<Self> {
        let name = fields::text(record, "name")?;
        let raw_type = match record.get("type") {
            Some(Value::Object(spec)) => fields::text(spec, "rawValue"),
            Some(Value::String(spec)) => Some(spec.clone()),
            _ => None,
        };
        Some(Self {
            name,
            value: fields::text(record, "value"),
            raw_type,
        })
    }
}

/// Read `record[field].property` into a map keyed by parameter name.
///
/// A missing field yields an empty map. Later entries with the same name
/// replace earlier ones.
pub fn parameters(record: &Record, field: &str) -> BTreeMap<String, Parameter> {
    fields::object(record, field)
        .and_then(|list| list.get("property"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(Parameter::from_record)
                .map(|p| (p.name.clone(), p))
                .collect()
        })
        .unwrap_or_default()
}
