use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::{Discriminator, Form, Properties, Schema, Type};

/// Caps applied to a single [`validate`] call. The default is no caps.
///
/// `max_depth` bounds how many `ref` frames may be live at once and is the
/// defense against circular schemas; `max_errors` stops the walk early once
/// enough errors have been collected.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidateOptions {
    max_depth: usize,
    max_errors: usize,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail validation outright once this many `ref` frames are live.
    /// 0 means unlimited.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Stop collecting after this many errors. 0 means unlimited.
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

/// A fault that aborts validation without producing an error list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("max depth exceeded")]
    MaxDepthExceeded,
}

/// One validation failure: where in the instance, and which part of the
/// schema rejected it.
///
/// Serializes to the `{"instancePath": [...], "schemaPath": [...]}` shape
/// used by the JTD conformance suite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub instance_path: Vec<String>,
    pub schema_path: Vec<String>,
}

/// Validates `instance` against a verified `schema`, returning every
/// validation error in walk order.
///
/// `Err(MaxDepthExceeded)` signals a `ref` chain longer than the configured
/// `max_depth`, not an invalid instance.
pub fn validate(
    schema: &Schema,
    instance: &Value,
    options: ValidateOptions,
) -> Result<Vec<ValidationError>, ValidateError> {
    let mut walker = Walker {
        root: schema,
        max_depth: options.max_depth,
        max_errors: options.max_errors,
        instance_tokens: vec![],
        schema_tokens: vec![vec![]],
        errors: vec![],
    };

    match walker.walk(schema, None, instance) {
        Ok(()) | Err(Interrupt::MaxErrorsReached) => Ok(walker.errors),
        Err(Interrupt::MaxDepthExceeded) => Err(ValidateError::MaxDepthExceeded),
    }
}

struct Walker<'a> {
    root: &'a Schema,
    max_depth: usize,
    max_errors: usize,
    instance_tokens: Vec<String>,

    /// One frame of schema tokens per `ref` hop; errors report the top frame.
    schema_tokens: Vec<Vec<String>>,
    errors: Vec<ValidationError>,
}

enum Interrupt {
    MaxErrorsReached,
    MaxDepthExceeded,
}

impl<'a> Walker<'a> {
    fn walk(
        &mut self,
        schema: &'a Schema,
        parent_tag: Option<&str>,
        instance: &Value,
    ) -> Result<(), Interrupt> {
        if schema.nullable && instance.is_null() {
            return Ok(());
        }

        match &schema.form {
            Form::Empty => {}

            Form::Ref(definition) => {
                if self.max_depth > 0 && self.schema_tokens.len() == self.max_depth {
                    return Err(Interrupt::MaxDepthExceeded);
                }

                self.schema_tokens
                    .push(vec!["definitions".to_owned(), definition.clone()]);
                let root = self.root;
                self.walk(&root.definitions[definition], None, instance)?;
                self.schema_tokens.pop();
            }

            Form::Type(tag) => {
                self.push_schema_token("type");

                match tag {
                    Type::Boolean => {
                        if !instance.is_boolean() {
                            self.push_error()?;
                        }
                    }
                    Type::Float32 | Type::Float64 => {
                        if !instance.is_number() {
                            self.push_error()?;
                        }
                    }
                    Type::Int8 => self.check_int(instance, -128.0, 127.0)?,
                    Type::Uint8 => self.check_int(instance, 0.0, 255.0)?,
                    Type::Int16 => self.check_int(instance, -32768.0, 32767.0)?,
                    Type::Uint16 => self.check_int(instance, 0.0, 65535.0)?,
                    Type::Int32 => self.check_int(instance, -2147483648.0, 2147483647.0)?,
                    Type::Uint32 => self.check_int(instance, 0.0, 4294967295.0)?,
                    Type::String => {
                        if !instance.is_string() {
                            self.push_error()?;
                        }
                    }
                    Type::Timestamp => {
                        let ok = instance
                            .as_str()
                            .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                            .unwrap_or(false);
                        if !ok {
                            self.push_error()?;
                        }
                    }
                }

                self.pop_schema_token();
            }

            Form::Enum(variants) => {
                self.push_schema_token("enum");
                let ok = instance
                    .as_str()
                    .map(|s| variants.contains(s))
                    .unwrap_or(false);
                if !ok {
                    self.push_error()?;
                }
                self.pop_schema_token();
            }

            Form::Elements(elements) => {
                self.push_schema_token("elements");

                if let Some(items) = instance.as_array() {
                    for (index, item) in items.iter().enumerate() {
                        self.push_instance_token(&index.to_string());
                        self.walk(elements, None, item)?;
                        self.pop_instance_token();
                    }
                } else {
                    self.push_error()?;
                }

                self.pop_schema_token();
            }

            Form::Properties(Properties {
                required,
                optional,
                additional,
                has_required,
            }) => {
                let members = match instance.as_object() {
                    Some(members) => members,
                    None => {
                        let token = if *has_required {
                            "properties"
                        } else {
                            "optionalProperties"
                        };
                        return self.error_at(token, None);
                    }
                };

                self.push_schema_token("properties");
                for (name, sub_schema) in required {
                    self.push_schema_token(name);
                    if let Some(sub_instance) = members.get(name) {
                        self.push_instance_token(name);
                        self.walk(sub_schema, None, sub_instance)?;
                        self.pop_instance_token();
                    } else {
                        self.push_error()?;
                    }
                    self.pop_schema_token();
                }
                self.pop_schema_token();

                self.push_schema_token("optionalProperties");
                for (name, sub_schema) in optional {
                    self.push_schema_token(name);
                    if let Some(sub_instance) = members.get(name) {
                        self.push_instance_token(name);
                        self.walk(sub_schema, None, sub_instance)?;
                        self.pop_instance_token();
                    }
                    self.pop_schema_token();
                }
                self.pop_schema_token();

                if !*additional {
                    for name in members.keys() {
                        if parent_tag != Some(name.as_str())
                            && !required.contains_key(name)
                            && !optional.contains_key(name)
                        {
                            self.push_instance_token(name);
                            self.push_error()?;
                            self.pop_instance_token();
                        }
                    }
                }
            }

            Form::Values(values) => {
                self.push_schema_token("values");

                if let Some(members) = instance.as_object() {
                    for (name, sub_instance) in members {
                        self.push_instance_token(name);
                        self.walk(values, None, sub_instance)?;
                        self.pop_instance_token();
                    }
                } else {
                    self.push_error()?;
                }

                self.pop_schema_token();
            }

            Form::Discriminator(Discriminator { tag, mapping }) => {
                let members = match instance.as_object() {
                    Some(members) => members,
                    None => return self.error_at("discriminator", None),
                };

                match members.get(tag).map(Value::as_str) {
                    None => self.error_at("discriminator", None)?,
                    Some(None) => self.error_at("discriminator", Some(tag.as_str()))?,
                    Some(Some(tag_value)) => {
                        if let Some(sub_schema) = mapping.get(tag_value) {
                            self.push_schema_token("mapping");
                            self.push_schema_token(tag_value);
                            self.walk(sub_schema, Some(tag.as_str()), instance)?;
                            self.pop_schema_token();
                            self.pop_schema_token();
                        } else {
                            self.error_at("mapping", Some(tag.as_str()))?;
                        }
                    }
                }
            }
        };

        Ok(())
    }

    fn check_int(&mut self, instance: &Value, min: f64, max: f64) -> Result<(), Interrupt> {
        match instance.as_f64() {
            Some(n) if n.fract() == 0.0 && n >= min && n <= max => Ok(()),
            _ => self.push_error(),
        }
    }

    /// One error under an extra schema token (and optionally an extra
    /// instance token), with the tokens restored afterwards.
    fn error_at(&mut self, schema_token: &str, instance_token: Option<&str>) -> Result<(), Interrupt> {
        self.push_schema_token(schema_token);
        if let Some(token) = instance_token {
            self.push_instance_token(token);
        }

        let result = self.push_error();

        if instance_token.is_some() {
            self.pop_instance_token();
        }
        self.pop_schema_token();

        result
    }

    fn push_error(&mut self) -> Result<(), Interrupt> {
        self.errors.push(ValidationError {
            instance_path: self.instance_tokens.clone(),
            schema_path: self.schema_tokens.last().cloned().unwrap_or_default(),
        });

        if self.errors.len() == self.max_errors {
            Err(Interrupt::MaxErrorsReached)
        } else {
            Ok(())
        }
    }

    fn push_schema_token(&mut self, token: &str) {
        if let Some(frame) = self.schema_tokens.last_mut() {
            frame.push(token.to_owned());
        }
    }

    fn pop_schema_token(&mut self) {
        if let Some(frame) = self.schema_tokens.last_mut() {
            frame.pop();
        }
    }

    fn push_instance_token(&mut self, token: &str) {
        self.instance_tokens.push(token.to_owned());
    }

    fn pop_instance_token(&mut self) {
        self.instance_tokens.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawSchema;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        RawSchema::from_value(&value)
            .expect("parse schema")
            .verify()
            .expect("verify schema")
    }

    fn error(instance_path: &[&str], schema_path: &[&str]) -> ValidationError {
        ValidationError {
            instance_path: instance_path.iter().map(|s| s.to_string()).collect(),
            schema_path: schema_path.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_schema_accepts_anything() {
        let empty = schema(json!({}));

        for instance in [
            json!(null),
            json!(true),
            json!(0),
            json!("x"),
            json!([1, "two"]),
            json!({ "a": { "b": [] } }),
        ] {
            assert_eq!(
                Vec::<ValidationError>::new(),
                validate(&empty, &instance, ValidateOptions::new()).unwrap()
            );
        }
    }

    #[test]
    fn string_round_trip() {
        let schema = schema(json!({ "type": "string" }));

        assert_eq!(
            Vec::<ValidationError>::new(),
            validate(&schema, &json!("hello"), ValidateOptions::new()).unwrap()
        );
    }

    #[test]
    fn uint8_out_of_range() {
        let schema = schema(json!({ "type": "uint8" }));

        assert_eq!(
            vec![error(&[], &["type"])],
            validate(&schema, &json!(300), ValidateOptions::new()).unwrap()
        );
    }

    #[test]
    fn nullable_short_circuits_every_form() {
        for value in [
            json!({ "nullable": true }),
            json!({ "type": "uint8", "nullable": true }),
            json!({ "enum": ["a"], "nullable": true }),
            json!({ "elements": { "type": "string" }, "nullable": true }),
            json!({ "properties": { "a": {} }, "nullable": true }),
            json!({ "values": { "type": "string" }, "nullable": true }),
            json!({
                "discriminator": "d",
                "mapping": { "x": { "properties": {} } },
                "nullable": true,
            }),
        ] {
            let schema = schema(value);
            assert_eq!(
                Vec::<ValidationError>::new(),
                validate(&schema, &json!(null), ValidateOptions::new()).unwrap()
            );
        }
    }

    #[test]
    fn properties_report_in_key_order() {
        let schema = schema(json!({
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "uint32" },
            },
        }));

        assert_eq!(
            vec![
                error(&["age"], &["properties", "age", "type"]),
                error(&[], &["properties", "name"]),
            ],
            validate(&schema, &json!({ "age": "43" }), ValidateOptions::new()).unwrap()
        );
    }

    #[test]
    fn discriminator_selects_mapping() {
        let schema = schema(json!({
            "discriminator": "kind",
            "mapping": {
                "cat": { "properties": { "sound": { "type": "string" } } },
            },
        }));

        assert_eq!(
            Vec::<ValidationError>::new(),
            validate(
                &schema,
                &json!({ "kind": "cat", "sound": "meow" }),
                ValidateOptions::new()
            )
            .unwrap()
        );

        assert_eq!(
            vec![error(&["kind"], &["mapping"])],
            validate(&schema, &json!({ "kind": "dog" }), ValidateOptions::new()).unwrap()
        );
    }

    #[test]
    fn max_depth() {
        let schema = schema(json!({
            "definitions": {
                "loop": { "ref": "loop" },
            },
            "ref": "loop",
        }));

        for max_depth in [1, 2, 32] {
            assert_eq!(
                ValidateError::MaxDepthExceeded,
                validate(
                    &schema,
                    &json!(null),
                    ValidateOptions::new().with_max_depth(max_depth)
                )
                .unwrap_err()
            );
        }
    }

    #[test]
    fn max_errors() {
        let schema = schema(json!({
            "elements": { "type": "string" },
        }));

        assert_eq!(
            vec![
                error(&["0"], &["elements", "type"]),
                error(&["1"], &["elements", "type"]),
                error(&["2"], &["elements", "type"]),
            ],
            validate(
                &schema,
                &json!([null, null, null, null]),
                ValidateOptions::new().with_max_errors(3)
            )
            .unwrap()
        );
    }

    #[test]
    fn max_errors_is_prefix_of_unlimited() {
        let schema = schema(json!({
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "boolean" },
            },
            "optionalProperties": {
                "c": { "type": "uint8" },
            },
        }));
        let instance = json!({ "a": 1, "c": 300, "x": 0, "y": 0 });

        let all = validate(&schema, &instance, ValidateOptions::new()).unwrap();
        assert_eq!(5, all.len());

        for n in 1..=all.len() {
            assert_eq!(
                all[..n],
                validate(
                    &schema,
                    &instance,
                    ValidateOptions::new().with_max_errors(n)
                )
                .unwrap()[..]
            );
        }
    }

    #[test]
    fn wire_format() {
        let err = error(&["phones", "1"], &["properties", "phones", "elements", "type"]);

        assert_eq!(
            json!({
                "instancePath": ["phones", "1"],
                "schemaPath": ["properties", "phones", "elements", "type"],
            }),
            serde_json::to_value(&err).unwrap()
        );
    }

    #[test]
    fn validation_conformance() {
        use std::collections::BTreeMap;

        #[derive(serde::Deserialize)]
        struct TestCase {
            schema: serde_json::Value,
            instance: serde_json::Value,
            errors: Vec<ValidationError>,
        }

        let cases: BTreeMap<String, TestCase> =
            serde_json::from_str(include_str!("../conformance/validation.json"))
                .expect("parse validation.json");

        for (name, case) in cases {
            let schema = RawSchema::from_value(&case.schema)
                .and_then(RawSchema::verify)
                .expect(&name);

            let errors = validate(&schema, &case.instance, ValidateOptions::new()).expect(&name);

            assert_eq!(
                case.errors, errors,
                "wrong validation errors returned: {}",
                name
            );
        }
    }
}
