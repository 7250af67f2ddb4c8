//! A validator for [JSON Type Definition](https://jsontypedef.com), [RFC
//! 8927](https://tools.ietf.org/html/rfc8927).
//!
//! `typedef` takes a JTD schema through a three-step pipeline: parse an
//! untyped JSON value into a [`RawSchema`], verify it against the RFC's form
//! rules to obtain a [`Schema`], and then [`validate()`] JSON instances
//! against it.
//!
//! # Quick start
//!
//! ```
//! use serde_json::json;
//! use typedef::{validate, RawSchema, ValidateOptions};
//!
//! let schema = RawSchema::from_value(&json!({
//!     "properties": {
//!         "foo": { "type": "string" },
//!         "bar": { "type": "boolean" }
//!     }
//! }))
//! .expect("parse schema")
//! .verify()
//! .expect("verify schema");
//!
//! // This input is ok, so validate comes back empty.
//! let good = json!({ "foo": "xxx", "bar": true });
//! assert!(validate(&schema, &good, ValidateOptions::new()).unwrap().is_empty());
//!
//! // This input is bad (bar has type string, not boolean), so validate does
//! // not come back empty.
//! let bad = json!({ "foo": "xxx", "bar": "false" });
//! assert!(!validate(&schema, &bad, ValidateOptions::new()).unwrap().is_empty());
//! ```
//!
//! # Validation errors
//!
//! Flatly rejecting input as "invalid" is rarely enough. JSON Type
//! Definition specifies the exact data inside every validation error, so
//! errors are portable across implementations: each one pairs the path to
//! the rejected part of the instance with the path to the part of the schema
//! that rejected it.
//!
//! ```
//! use serde_json::json;
//! use typedef::{validate, RawSchema, ValidateOptions, ValidationError};
//!
//! let schema = RawSchema::from_value(&json!({
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "uint32" },
//!         "phones": {
//!             "elements": { "type": "string" }
//!         }
//!     }
//! }))
//! .expect("parse schema")
//! .verify()
//! .expect("verify schema");
//!
//! // Three problems here: "age" has the wrong type, "name" is missing, and
//! // "phones[1]" has the wrong type.
//! let bad = json!({
//!     "age": "43",
//!     "phones": ["+44 1234567", 442345678]
//! });
//!
//! assert_eq!(
//!     vec![
//!         // "age" has the wrong type (required by "/properties/age/type")
//!         ValidationError {
//!             instance_path: vec!["age".into()],
//!             schema_path: vec!["properties".into(), "age".into(), "type".into()],
//!         },
//!
//!         // "name" is missing (required by "/properties/name")
//!         ValidationError {
//!             instance_path: vec![],
//!             schema_path: vec!["properties".into(), "name".into()],
//!         },
//!
//!         // "phones/1" has the wrong type (required by
//!         // "/properties/phones/elements/type")
//!         ValidationError {
//!             instance_path: vec!["phones".into(), "1".into()],
//!             schema_path: vec![
//!                 "properties".into(),
//!                 "phones".into(),
//!                 "elements".into(),
//!                 "type".into(),
//!             ],
//!         },
//!     ],
//!     validate(&schema, &bad, ValidateOptions::new()).unwrap(),
//! );
//! ```
//!
//! # Security considerations
//!
//! Validating untrusted *instances* is always safe. If the *schema* is
//! untrusted too, be aware of this consideration from RFC 8927:
//!
//! > Implementations that evaluate user-inputted schemas SHOULD implement
//! > mechanisms to detect and abort circular references that might cause a
//! > naive implementation to go into an infinite loop.  Without such
//! > mechanisms, implementations may be vulnerable to denial-of-service
//! > attacks.
//!
//! Schemas whose `ref`s form a cycle pass verification; the walk over them
//! is bounded by [`ValidateOptions::with_max_depth`], which makes
//! [`validate()`] fail with [`ValidateError::MaxDepthExceeded`] instead of
//! overflowing the stack. Set it whenever the schema comes from outside.

mod raw;
mod schema;
mod validate;

pub use crate::raw::{FormKind, RawSchema};
pub use crate::schema::{
    Discriminator, EnumError, Form, MappingError, Properties, Schema, SchemaError, Type,
};
pub use crate::validate::{validate, ValidateError, ValidateOptions, ValidationError};
