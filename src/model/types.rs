use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// JSON-Schema primitives a model can map onto directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Void,
    Integer,
    Float,
    String,
    Boolean,
    Date,
    DateTime,
}

impl NativeType {
    pub const ALL: [NativeType; 7] = [
        NativeType::Void,
        NativeType::Integer,
        NativeType::Float,
        NativeType::String,
        NativeType::Boolean,
        NativeType::Date,
        NativeType::DateTime,
    ];

    /// The JSON-Schema keyword, which is also the model name.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            NativeType::Void => "void",
            NativeType::Integer => "integer",
            NativeType::Float => "float",
            NativeType::String => "string",
            NativeType::Boolean => "boolean",
            NativeType::Date => "date",
            NativeType::DateTime => "date-time",
        }
    }

    /// The type name, registered as an alias of the keyword.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            NativeType::Void => "Void",
            NativeType::Integer => "Integer",
            NativeType::Float => "Float",
            NativeType::String => "String",
            NativeType::Boolean => "Boolean",
            NativeType::Date => "Date",
            NativeType::DateTime => "DateTime",
        }
    }

    /// Look a native up by keyword (`date-time`) or type name (`DateTime`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|native| native.keyword() == name || native.type_name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            NativeType::Void => "None objects.",
            NativeType::Integer => "Integer numbers.",
            NativeType::Float => "Floating point numbers.",
            NativeType::String => "Unicode strings.",
            NativeType::Boolean => "Boolean.",
            NativeType::Date => "Dates.",
            NativeType::DateTime => "DateTimes.",
        }
    }

    /// Constraint keys a use of this type may carry.
    #[must_use]
    pub fn allowed_extras(self) -> &'static [&'static str] {
        match self {
            NativeType::Float => &["defaultValue", "format", "minimum", "maximum"],
            NativeType::String => &["defaultValue", "format", "enum"],
            _ => &["defaultValue", "format"],
        }
    }

    /// Coerce a raw textual request value into this type's JSON value.
    ///
    /// Values that do not parse are passed through as strings.
    #[must_use]
    pub fn coerce(self, raw: &str) -> Value {
        let parsed = match self {
            NativeType::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
            NativeType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::from),
            NativeType::Boolean => raw.trim().parse::<bool>().ok().map(Value::from),
            _ => None,
        };
        parsed.unwrap_or_else(|| Value::String(raw.to_string()))
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    Native(NativeType),
    Custom(Value),
}

/// A named, JSON-Schema-describable data type.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelType {
    type_name: Arc<str>,
    description: String,
    kind: ModelKind,
}

impl ModelType {
    #[must_use]
    pub fn native(native: NativeType) -> Self {
        Self {
            type_name: Arc::from(native.type_name()),
            description: native.description().to_string(),
            kind: ModelKind::Native(native),
        }
    }

    #[must_use]
    pub fn custom(type_name: &str, description: &str, schema: Value) -> Self {
        Self {
            type_name: Arc::from(type_name),
            description: description.to_string(),
            kind: ModelKind::Custom(schema),
        }
    }

    /// The name used in parameter and response declarations.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.kind {
            ModelKind::Native(native) => native.keyword(),
            ModelKind::Custom(_) => &self.type_name,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    #[must_use]
    pub fn native_type(&self) -> Option<NativeType> {
        match self.kind {
            ModelKind::Native(native) => Some(native),
            ModelKind::Custom(_) => None,
        }
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self.kind, ModelKind::Native(_))
    }

    /// The schema of a custom model; natives have none.
    #[must_use]
    pub fn schema(&self) -> Option<&Value> {
        match &self.kind {
            ModelKind::Native(_) => None,
            ModelKind::Custom(schema) => Some(schema),
        }
    }

    /// The entry this model contributes to an api declaration's `models`.
    #[must_use]
    pub fn declaration(&self) -> Option<ModelDeclaration> {
        self.schema().map(|schema| ModelDeclaration {
            id: self.name().to_string(),
            schema: schema.clone(),
        })
    }

    fn allowed_extras(&self) -> &'static [&'static str] {
        match self.kind {
            ModelKind::Native(native) => native.allowed_extras(),
            ModelKind::Custom(_) => &[],
        }
    }
}

/// The `models` entry of an api declaration: a custom model's raw schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDeclaration {
    pub id: String,
    pub schema: Value,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Parameter \"{param}\" invalid for type \"{model}\"")]
    InvalidExtra { param: String, model: String },
}

/// One use of a model: the model's name plus a per-use description and
/// constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRef {
    model: Arc<str>,
    native: Option<NativeType>,
    allowed: &'static [&'static str],
    description: String,
    extras: BTreeMap<String, Value>,
}

impl ModelRef {
    #[must_use]
    pub fn new(model: &ModelType, description: &str) -> Self {
        Self {
            model: Arc::from(model.name()),
            native: model.native_type(),
            allowed: model.allowed_extras(),
            description: description.to_string(),
            extras: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn native(native: NativeType, description: &str) -> Self {
        Self::new(&ModelType::native(native), description)
    }

    /// Reference a model by name. Custom models take no constraints; a
    /// native name resolves to the same reference as [`ModelRef::native`].
    #[must_use]
    pub fn named(model: &str, description: &str) -> Self {
        if let Some(native) = NativeType::from_name(model) {
            return Self::native(native, description);
        }
        Self {
            model: Arc::from(model),
            native: None,
            allowed: &[],
            description: description.to_string(),
            extras: BTreeMap::new(),
        }
    }

    /// Attach a constraint (`defaultValue`, `format`, `enum`, `minimum`,
    /// `maximum`), rejecting keys the model type does not accept.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Result<Self, ModelError> {
        if !self.allowed.contains(&key) {
            return Err(ModelError::InvalidExtra {
                param: key.to_string(),
                model: self.model.to_string(),
            });
        }
        self.extras.insert(key.to_string(), value.into());
        Ok(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn native_type(&self) -> Option<NativeType> {
        self.native
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn extras(&self) -> &BTreeMap<String, Value> {
        &self.extras
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.extras.get("defaultValue")
    }

    /// `{description, type, ...constraints}`.
    #[must_use]
    pub fn describe(&self) -> Value {
        let mut out = Map::new();
        out.insert("description".into(), Value::String(self.description.clone()));
        out.insert("type".into(), Value::String(self.model.to_string()));
        for (k, v) in &self.extras {
            out.insert(k.clone(), v.clone());
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_native_name_is_keyword() {
        for native in NativeType::ALL {
            let model = ModelType::native(native);
            assert_eq!(model.name(), native.keyword());
            assert!(model.schema().is_none());
            assert!(model.declaration().is_none());
        }
    }

    #[test]
    fn test_custom_name_is_type_name() {
        let schema = json!({"type": "array", "items": {"type": "integer"}});
        let model = ModelType::custom("Fibonacci", "A series.", schema.clone());
        assert_eq!(model.name(), "Fibonacci");
        let decl = model.declaration().unwrap();
        assert_eq!(decl.id, "Fibonacci");
        assert_eq!(decl.schema, schema);
    }

    #[test]
    fn test_extras_are_checked_per_native_type() {
        assert!(ModelRef::native(NativeType::Float, "x")
            .with("minimum", 0.0)
            .is_ok());
        let err = ModelRef::native(NativeType::Integer, "x")
            .with("enum", json!([1, 2]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter \"enum\" invalid for type \"integer\""
        );
        assert!(ModelRef::named("Vector", "v").with("format", "x").is_err());
    }

    #[test]
    fn test_describe_carries_use_description_and_extras() {
        let r = ModelRef::native(NativeType::String, "The operation.")
            .with("enum", json!(["add", "sub"]))
            .unwrap();
        assert_eq!(
            r.describe(),
            json!({"description": "The operation.", "type": "string", "enum": ["add", "sub"]})
        );
    }

    #[test]
    fn test_named_native_resolves_to_native() {
        for name in ["string", "String"] {
            let r = ModelRef::named(name, "Text.");
            assert_eq!(r, ModelRef::native(NativeType::String, "Text."));
            assert_eq!(r.native_type(), Some(NativeType::String));
            assert!(r.with("enum", json!(["a"])).is_ok());
        }
        assert_eq!(NativeType::from_name("date-time"), Some(NativeType::DateTime));
        assert_eq!(NativeType::from_name("Quotient"), None);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(NativeType::Integer.coerce("42"), json!(42));
        assert_eq!(NativeType::Float.coerce("1.5"), json!(1.5));
        assert_eq!(NativeType::Boolean.coerce("true"), json!(true));
        assert_eq!(NativeType::Float.coerce("spam"), json!("spam"));
        assert_eq!(NativeType::String.coerce("7"), json!("7"));
    }
}
