use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::schema::SchemaError;

/// The JTD keywords, in their JSON spelling. Any other key is rejected.
const KEYWORDS: [&str; 13] = [
    "metadata",
    "nullable",
    "definitions",
    "ref",
    "type",
    "enum",
    "elements",
    "properties",
    "optionalProperties",
    "additionalProperties",
    "values",
    "discriminator",
    "mapping",
];

/// A JTD schema as it appears on the wire: one optional field per keyword,
/// with no structural rules enforced yet.
///
/// A `RawSchema` is produced either by [`RawSchema::from_value`] or by serde
/// deserialization; both reject unknown keywords. Call
/// [`verify`](RawSchema::verify) to check the RFC 8927 form rules and obtain
/// a [`Schema`](crate::Schema) suitable for validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct RawSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<BTreeMap<String, RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Box<RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_properties: Option<BTreeMap<String, RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Box<RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<BTreeMap<String, RawSchema>>,
}

/// Which of the eight RFC 8927 forms a schema takes, judged by keyword
/// presence alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Empty,
    Ref,
    Type,
    Enum,
    Elements,
    Properties,
    Values,
    Discriminator,
}

impl RawSchema {
    /// Parses a decoded JSON value into a `RawSchema`.
    ///
    /// Fails with [`SchemaError::TypeMismatch`] when the value is not an
    /// object or a keyword's value has the wrong JSON type, and with
    /// [`SchemaError::IllegalKeyword`] when the object carries a key outside
    /// the JTD keyword set. Nested schemas are parsed recursively.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let members = match value.as_object() {
            Some(members) => members,
            None => return Err(SchemaError::TypeMismatch("schema".to_owned())),
        };

        for key in members.keys() {
            if !KEYWORDS.contains(&key.as_str()) {
                return Err(SchemaError::IllegalKeyword(key.clone()));
            }
        }

        Ok(RawSchema {
            metadata: members
                .get("metadata")
                .map(|value| metadata_member(value))
                .transpose()?,
            nullable: members
                .get("nullable")
                .map(|value| bool_member("nullable", value))
                .transpose()?,
            definitions: members
                .get("definitions")
                .map(|value| schema_map_member("definitions", value))
                .transpose()?,
            ref_: members
                .get("ref")
                .map(|value| string_member("ref", value))
                .transpose()?,
            type_: members
                .get("type")
                .map(|value| string_member("type", value))
                .transpose()?,
            enum_: members
                .get("enum")
                .map(|value| string_seq_member("enum", value))
                .transpose()?,
            elements: members
                .get("elements")
                .map(|value| RawSchema::from_value(value).map(Box::new))
                .transpose()?,
            properties: members
                .get("properties")
                .map(|value| schema_map_member("properties", value))
                .transpose()?,
            optional_properties: members
                .get("optionalProperties")
                .map(|value| schema_map_member("optionalProperties", value))
                .transpose()?,
            additional_properties: members
                .get("additionalProperties")
                .map(|value| bool_member("additionalProperties", value))
                .transpose()?,
            values: members
                .get("values")
                .map(|value| RawSchema::from_value(value).map(Box::new))
                .transpose()?,
            discriminator: members
                .get("discriminator")
                .map(|value| string_member("discriminator", value))
                .transpose()?,
            mapping: members
                .get("mapping")
                .map(|value| schema_map_member("mapping", value))
                .transpose()?,
        })
    }

    /// Reports the schema's form from which structural keywords are present.
    ///
    /// When an invalid keyword combination is present the precedence is
    /// ref, type, enum, elements, properties, values, discriminator; such
    /// schemas are rejected by [`verify`](RawSchema::verify) anyway.
    pub fn form(&self) -> FormKind {
        if self.ref_.is_some() {
            FormKind::Ref
        } else if self.type_.is_some() {
            FormKind::Type
        } else if self.enum_.is_some() {
            FormKind::Enum
        } else if self.elements.is_some() {
            FormKind::Elements
        } else if self.properties.is_some() || self.optional_properties.is_some() {
            FormKind::Properties
        } else if self.values.is_some() {
            FormKind::Values
        } else if self.discriminator.is_some() {
            FormKind::Discriminator
        } else {
            FormKind::Empty
        }
    }
}

fn bool_member(keyword: &str, value: &Value) -> Result<bool, SchemaError> {
    value
        .as_bool()
        .ok_or_else(|| SchemaError::TypeMismatch(keyword.to_owned()))
}

fn string_member(keyword: &str, value: &Value) -> Result<String, SchemaError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| SchemaError::TypeMismatch(keyword.to_owned()))
}

fn string_seq_member(keyword: &str, value: &Value) -> Result<Vec<String>, SchemaError> {
    let items = value
        .as_array()
        .ok_or_else(|| SchemaError::TypeMismatch(keyword.to_owned()))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| SchemaError::TypeMismatch(keyword.to_owned()))
        })
        .collect()
}

fn metadata_member(value: &Value) -> Result<BTreeMap<String, Value>, SchemaError> {
    let members = value
        .as_object()
        .ok_or_else(|| SchemaError::TypeMismatch("metadata".to_owned()))?;

    Ok(members
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect())
}

fn schema_map_member(
    keyword: &str,
    value: &Value,
) -> Result<BTreeMap<String, RawSchema>, SchemaError> {
    let members = value
        .as_object()
        .ok_or_else(|| SchemaError::TypeMismatch(keyword.to_owned()))?;

    members
        .iter()
        .map(|(key, value)| Ok((key.clone(), RawSchema::from_value(value)?)))
        .collect()
}

#[cfg(feature = "fuzz")]
impl<'a> arbitrary::Arbitrary<'a> for RawSchema {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(RawSchema {
            // serde_json::Value does not implement Arbitrary, and the fuzz
            // targets never look inside metadata anyway.
            metadata: None,
            nullable: arbitrary::Arbitrary::arbitrary(u)?,
            definitions: arbitrary::Arbitrary::arbitrary(u)?,
            ref_: arbitrary::Arbitrary::arbitrary(u)?,
            type_: arbitrary::Arbitrary::arbitrary(u)?,
            enum_: arbitrary::Arbitrary::arbitrary(u)?,
            elements: arbitrary::Arbitrary::arbitrary(u)?,
            properties: arbitrary::Arbitrary::arbitrary(u)?,
            optional_properties: arbitrary::Arbitrary::arbitrary(u)?,
            additional_properties: arbitrary::Arbitrary::arbitrary(u)?,
            values: arbitrary::Arbitrary::arbitrary(u)?,
            discriminator: arbitrary::Arbitrary::arbitrary(u)?,
            mapping: arbitrary::Arbitrary::arbitrary(u)?,
        })
    }
}
