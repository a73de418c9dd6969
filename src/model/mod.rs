//! # Model Module
//!
//! Models describe the data that flows through an API, as JSON-Schema.
//!
//! ## Native and custom models
//!
//! A [`ModelType`] is either *native*, mapping straight onto a JSON-Schema
//! primitive (`void`, `integer`, `float`, `string`, `boolean`, `date`,
//! `date-time`), or *custom*, carrying its own schema fragment:
//!
//! ```rust
//! use serde_json::json;
//! use swaggery::model::ModelType;
//!
//! let vector = ModelType::custom(
//!     "Vector",
//!     "A 2 or 3 dimensional vector.",
//!     json!({"type": "object", "required": ["x", "y"]}),
//! );
//! assert_eq!(vector.name(), "Vector");
//! ```
//!
//! A native model is named by its JSON-Schema keyword, a custom one by its
//! type name. The [`ModelRegistry`] resolves both spellings of a native
//! (`string` and `String`).
//!
//! ## Per-use descriptions
//!
//! The schema belongs to the type; the description belongs to each *use*.
//! A [`ModelRef`] pairs a model with the text describing one parameter (or
//! response) and optional constraints such as `enum` or `defaultValue`:
//!
//! ```rust
//! use serde_json::json;
//! use swaggery::model::{ModelRef, NativeType};
//!
//! let op = ModelRef::native(NativeType::String, "One of the arithmetic operations.")
//!     .with("enum", json!(["add", "sub"]))
//!     .unwrap();
//! assert_eq!(op.describe()["type"], "string");
//! ```

mod registry;
mod types;

pub use registry::ModelRegistry;
pub use types::{ModelDeclaration, ModelError, ModelKind, ModelRef, ModelType, NativeType};
