use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use thiserror::Error;

use crate::raw::{FormKind, RawSchema};

/// Why a schema was rejected during parsing or verification.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema itself, or the named keyword's value, had the wrong JSON
    /// type.
    #[error("wrong JSON type for {0:?}")]
    TypeMismatch(String),

    /// A key outside the JTD keyword set.
    #[error("illegal keyword {0:?}")]
    IllegalKeyword(String),

    /// The combination of structural keywords matches none of the RFC 8927
    /// forms.
    #[error("invalid combination of keywords")]
    InvalidForm,

    /// `definitions` on a schema other than the root.
    #[error("definitions may only appear on the root schema")]
    NonRootDefinitions,

    /// `ref` names no entry of the root's `definitions`.
    #[error("ref to non-existent definition {0:?}")]
    DanglingRef(String),

    /// `type` is not one of the eleven primitive tags.
    #[error("invalid type {0:?}")]
    InvalidType(String),

    /// `enum` breaks the non-empty / no-duplicates rules.
    #[error("invalid enum: {0}")]
    InvalidEnum(EnumError),

    /// A key declared in both `properties` and `optionalProperties`.
    #[error("property {0:?} is both required and optional")]
    RepeatedProperty(String),

    /// A `mapping` value breaks the discriminator rules.
    #[error("invalid mapping: {0}")]
    InvalidMapping(MappingError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EnumError {
    #[error("enum is empty")]
    Empty,

    #[error("duplicated value {0:?}")]
    Duplicate(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("value for tag {0:?} is not a properties schema")]
    NotProperties(String),

    #[error("value for tag {0:?} is nullable")]
    Nullable(String),

    #[error("value for tag {0:?} re-declares the discriminator")]
    TagShadowed(String),
}

/// A verified JTD schema.
///
/// Unlike [`RawSchema`], a `Schema` is keyed by form: exactly one of the
/// eight RFC 8927 forms, with the shared keywords hoisted out. Only the root
/// carries a non-empty `definitions` table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    pub definitions: BTreeMap<String, Schema>,
    pub metadata: BTreeMap<String, Value>,
    pub nullable: bool,
    pub form: Form,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Form {
    #[default]
    Empty,
    Ref(String),
    Type(Type),
    Enum(BTreeSet<String>),
    Elements(Box<Schema>),
    Properties(Properties),
    Values(Box<Schema>),
    Discriminator(Discriminator),
}

/// The eleven primitive type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Boolean,
    Float32,
    Float64,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    String,
    Timestamp,
}

impl FromStr for Type {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(Self::Boolean),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            "int8" => Ok(Self::Int8),
            "uint8" => Ok(Self::Uint8),
            "int16" => Ok(Self::Int16),
            "uint16" => Ok(Self::Uint16),
            "int32" => Ok(Self::Int32),
            "uint32" => Ok(Self::Uint32),
            "string" => Ok(Self::String),
            "timestamp" => Ok(Self::Timestamp),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Properties {
    pub required: BTreeMap<String, Schema>,
    pub optional: BTreeMap<String, Schema>,
    pub additional: bool,

    /// Whether the `properties` keyword itself was present. Decides which
    /// schema token names a non-object instance error.
    pub has_required: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Discriminator {
    pub tag: String,
    pub mapping: BTreeMap<String, Schema>,
}

impl RawSchema {
    /// Checks this schema against the RFC 8927 form rules and converts it
    /// into a [`Schema`].
    ///
    /// Checks run root-first, and per node: the keyword combination, the
    /// root-only rule for `definitions`, that `ref` targets an existing
    /// definition, the `type` tag, `enum` non-emptiness and uniqueness,
    /// disjointness of `properties` and `optionalProperties`, and the
    /// `mapping` rules, before recursing into child schemas in keyword
    /// order. The first violation is returned.
    pub fn verify(self) -> Result<Schema, SchemaError> {
        let definition_names: BTreeSet<String> = self
            .definitions
            .iter()
            .flat_map(|definitions| definitions.keys().cloned())
            .collect();

        verify_schema(self, &definition_names, true)
    }
}

fn verify_schema(
    mut raw: RawSchema,
    definition_names: &BTreeSet<String>,
    is_root: bool,
) -> Result<Schema, SchemaError> {
    check_signature(&raw)?;

    if !is_root && raw.definitions.is_some() {
        return Err(SchemaError::NonRootDefinitions);
    }

    check_form(&raw, definition_names)?;

    let mut definitions = BTreeMap::new();
    for (name, sub_schema) in raw.definitions.take().unwrap_or_default() {
        definitions.insert(name, verify_schema(sub_schema, definition_names, false)?);
    }

    let metadata = raw.metadata.take().unwrap_or_default();
    let nullable = raw.nullable.unwrap_or(false);

    let form = match raw {
        RawSchema {
            ref_: Some(definition),
            ..
        } => Form::Ref(definition),

        RawSchema {
            type_: Some(tag), ..
        } => Form::Type(tag.parse().map_err(|()| SchemaError::InvalidType(tag))?),

        RawSchema {
            enum_: Some(variants),
            ..
        } => Form::Enum(variants.into_iter().collect()),

        RawSchema {
            elements: Some(sub_schema),
            ..
        } => Form::Elements(Box::new(verify_schema(
            *sub_schema,
            definition_names,
            false,
        )?)),

        RawSchema {
            properties,
            optional_properties,
            additional_properties,
            ..
        } if properties.is_some() || optional_properties.is_some() => {
            let has_required = properties.is_some();

            let mut required = BTreeMap::new();
            for (name, sub_schema) in properties.unwrap_or_default() {
                required.insert(name, verify_schema(sub_schema, definition_names, false)?);
            }

            let mut optional = BTreeMap::new();
            for (name, sub_schema) in optional_properties.unwrap_or_default() {
                optional.insert(name, verify_schema(sub_schema, definition_names, false)?);
            }

            Form::Properties(Properties {
                required,
                optional,
                additional: additional_properties.unwrap_or(false),
                has_required,
            })
        }

        RawSchema {
            values: Some(sub_schema),
            ..
        } => Form::Values(Box::new(verify_schema(
            *sub_schema,
            definition_names,
            false,
        )?)),

        RawSchema {
            discriminator: Some(tag),
            mapping: Some(mapping),
            ..
        } => {
            let mut verified = BTreeMap::new();
            for (tag_value, sub_schema) in mapping {
                verified.insert(
                    tag_value,
                    verify_schema(sub_schema, definition_names, false)?,
                );
            }

            Form::Discriminator(Discriminator {
                tag,
                mapping: verified,
            })
        }

        _ => Form::Empty,
    };

    Ok(Schema {
        definitions,
        metadata,
        nullable,
        form,
    })
}

/// Rejects keyword combinations outside the thirteen signatures RFC 8927
/// allows. Tuple order: ref, type, enum, elements, properties,
/// optionalProperties, additionalProperties, values, discriminator, mapping.
fn check_signature(raw: &RawSchema) -> Result<(), SchemaError> {
    #[rustfmt::skip]
    let allowed = matches!(
        (
            raw.ref_.is_some(),
            raw.type_.is_some(),
            raw.enum_.is_some(),
            raw.elements.is_some(),
            raw.properties.is_some(),
            raw.optional_properties.is_some(),
            raw.additional_properties.is_some(),
            raw.values.is_some(),
            raw.discriminator.is_some(),
            raw.mapping.is_some(),
        ),
        (false, false, false, false, false, false, false, false, false, false)
            | (true, false, false, false, false, false, false, false, false, false)
            | (false, true, false, false, false, false, false, false, false, false)
            | (false, false, true, false, false, false, false, false, false, false)
            | (false, false, false, true, false, false, false, false, false, false)
            | (false, false, false, false, true, _, _, false, false, false)
            | (false, false, false, false, false, true, _, false, false, false)
            | (false, false, false, false, false, false, false, true, false, false)
            | (false, false, false, false, false, false, false, false, true, true)
    );

    if allowed {
        Ok(())
    } else {
        Err(SchemaError::InvalidForm)
    }
}

fn check_form(raw: &RawSchema, definition_names: &BTreeSet<String>) -> Result<(), SchemaError> {
    if let Some(definition) = &raw.ref_ {
        if !definition_names.contains(definition) {
            return Err(SchemaError::DanglingRef(definition.clone()));
        }
    }

    if let Some(tag) = &raw.type_ {
        if tag.parse::<Type>().is_err() {
            return Err(SchemaError::InvalidType(tag.clone()));
        }
    }

    if let Some(variants) = &raw.enum_ {
        if variants.is_empty() {
            return Err(SchemaError::InvalidEnum(EnumError::Empty));
        }

        let mut seen = BTreeSet::new();
        for variant in variants {
            if !seen.insert(variant) {
                return Err(SchemaError::InvalidEnum(EnumError::Duplicate(
                    variant.clone(),
                )));
            }
        }
    }

    if let (Some(required), Some(optional)) = (&raw.properties, &raw.optional_properties) {
        for name in required.keys() {
            if optional.contains_key(name) {
                return Err(SchemaError::RepeatedProperty(name.clone()));
            }
        }
    }

    if let (Some(tag), Some(mapping)) = (&raw.discriminator, &raw.mapping) {
        for (tag_value, sub_schema) in mapping {
            if sub_schema.form() != FormKind::Properties {
                return Err(SchemaError::InvalidMapping(MappingError::NotProperties(
                    tag_value.clone(),
                )));
            }

            if sub_schema.nullable == Some(true) {
                return Err(SchemaError::InvalidMapping(MappingError::Nullable(
                    tag_value.clone(),
                )));
            }

            let shadowed = sub_schema
                .properties
                .iter()
                .chain(sub_schema.optional_properties.iter())
                .any(|members| members.contains_key(tag));
            if shadowed {
                return Err(SchemaError::InvalidMapping(MappingError::TagShadowed(
                    tag_value.clone(),
                )));
            }
        }
    }

    Ok(())
}
