use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::types::{ModelType, NativeType};
use crate::registry::{LeafRegistry, RegistryError};

/// Leaf registry of models plus the name index used by declarations.
pub struct ModelRegistry {
    types: LeafRegistry<ModelType>,
    by_name: HashMap<String, Arc<ModelType>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// An empty registry, without even the native types.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: LeafRegistry::new("model"),
            by_name: HashMap::new(),
        }
    }

    /// A registry holding the native types plus `List` and `Set`.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut reg = Self::new();
        for native in NativeType::ALL {
            reg.register(ModelType::native(native), None)?;
        }
        reg.register(
            ModelType::custom("List", "Lists.", json!({"type": "array"})),
            None,
        )?;
        reg.register(
            ModelType::custom(
                "Set",
                "Sets.",
                json!({"type": "array", "uniqueItems": true}),
            ),
            None,
        )?;
        Ok(reg)
    }

    /// Register a model under its type name. Natives are indexed under both
    /// their keyword and their type name; deriving from `parent` drops the
    /// parent's names from the index.
    pub fn register(
        &mut self,
        model: ModelType,
        parent: Option<&str>,
    ) -> Result<Arc<ModelType>, RegistryError> {
        let type_name = model.type_name().to_string();
        let model = self.types.register(&type_name, parent, model)?;

        if let Some(parent) = parent.and_then(|p| self.types.get(p)) {
            let parent = Arc::clone(parent);
            self.by_name.remove(parent.name());
            self.by_name.remove(parent.type_name());
        }

        self.by_name
            .insert(model.name().to_string(), Arc::clone(&model));
        if model.is_native() {
            self.by_name.insert(type_name, Arc::clone(&model));
        }
        Ok(model)
    }

    /// Resolve a model name (or native type name) to its type.
    pub fn by_name(&self, name: &str) -> Result<&Arc<ModelType>, RegistryError> {
        self.by_name
            .get(name)
            .ok_or_else(|| RegistryError::UnknownModel(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Arc<ModelType>> + '_ {
        self.types.leaves()
    }

    #[must_use]
    pub fn registry(&self) -> &LeafRegistry<ModelType> {
        &self.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natives_resolve_by_keyword_and_type_name() {
        let reg = ModelRegistry::with_builtins().unwrap();
        let a = reg.by_name("date-time").unwrap();
        let b = reg.by_name("DateTime").unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert!(reg.by_name("List").is_ok());
    }

    #[test]
    fn test_unknown_model_is_a_lookup_failure() {
        let reg = ModelRegistry::with_builtins().unwrap();
        assert_eq!(
            reg.by_name("Spam").unwrap_err(),
            RegistryError::UnknownModel("Spam".into())
        );
    }

    #[test]
    fn test_derived_model_replaces_parent_name() {
        let mut reg = ModelRegistry::with_builtins().unwrap();
        reg.register(
            ModelType::custom("Shape", "Any shape.", json!({"type": "object"})),
            None,
        )
        .unwrap();
        reg.register(
            ModelType::custom("Circle", "A circle.", json!({"type": "object"})),
            Some("Shape"),
        )
        .unwrap();
        assert!(reg.by_name("Shape").is_err());
        assert_eq!(reg.by_name("Circle").unwrap().name(), "Circle");
        assert!(!reg.leaves().any(|m| m.name() == "Shape"));
    }
}
