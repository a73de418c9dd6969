use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

/// Errors raised while registering or looking up declarations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{family} `{name}` is already registered")]
    Duplicate { family: &'static str, name: String },
    #[error("{family} `{name}` derives from unknown {family} `{parent}`")]
    UnknownParent {
        family: &'static str,
        name: String,
        parent: String,
    },
    #[error("resource `{resource}` belongs to unknown api `{api}`")]
    UnknownApi { resource: String, api: String },
    #[error("no model registered under the name `{0}`")]
    UnknownModel(String),
    #[error("schema of model `{model}` is not valid JSON: {reason}")]
    InvalidSchema { model: String, reason: String },
}

struct Entry<T> {
    name: Arc<str>,
    parent: Option<Arc<str>>,
    children: usize,
    value: Arc<T>,
}

/// Append-only registry that exposes only leaf declarations.
///
/// Entries keep their registration order, which is also the iteration
/// order of [`LeafRegistry::leaves`].
pub struct LeafRegistry<T> {
    family: &'static str,
    entries: Vec<Entry<T>>,
    index: HashMap<Arc<str>, usize>,
}

impl<T> LeafRegistry<T> {
    /// Create an empty registry. `family` names the kind of declaration in
    /// error messages and logs ("api", "resource", "model").
    #[must_use]
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register `value` under `name`, optionally deriving from `parent`.
    ///
    /// The parent must already be registered. Once registered, the parent
    /// stops being a leaf for the rest of the process lifetime.
    pub fn register(
        &mut self,
        name: &str,
        parent: Option<&str>,
        value: T,
    ) -> Result<Arc<T>, RegistryError> {
        if self.index.contains_key(name) {
            return Err(RegistryError::Duplicate {
                family: self.family,
                name: name.to_string(),
            });
        }

        let parent = match parent {
            Some(parent_name) => {
                let idx = *self.index.get(parent_name).ok_or_else(|| {
                    RegistryError::UnknownParent {
                        family: self.family,
                        name: name.to_string(),
                        parent: parent_name.to_string(),
                    }
                })?;
                self.entries[idx].children += 1;
                Some(Arc::clone(&self.entries[idx].name))
            }
            None => None,
        };

        let name: Arc<str> = Arc::from(name);
        let value = Arc::new(value);
        debug!(
            family = self.family,
            name = %name,
            parent = ?parent.as_deref(),
            "Declaration registered"
        );
        self.index.insert(Arc::clone(&name), self.entries.len());
        self.entries.push(Entry {
            name,
            parent,
            children: 0,
            value: Arc::clone(&value),
        });
        Ok(value)
    }

    /// Current leaf declarations, in registration order.
    pub fn leaves(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
        self.entries
            .iter()
            .filter(|e| e.children == 0)
            .map(|e| &e.value)
    }

    /// Names of the current leaves, in registration order.
    pub fn leaf_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(|e| e.children == 0)
            .map(|e| e.name.as_ref())
    }

    /// Look up any registered declaration, leaf or not.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.index.get(name).map(|&idx| &self.entries[idx].value)
    }

    /// `true` when `name` is registered and nothing derives from it.
    #[must_use]
    pub fn is_leaf(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&idx| self.entries[idx].children == 0)
    }

    /// The declaration `name` derives from, if any.
    #[must_use]
    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .and_then(|&idx| self.entries[idx].parent.as_deref())
    }

    #[must_use]
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Number of registered declarations, leaves and bases alike.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> std::fmt::Debug for LeafRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafRegistry")
            .field("family", &self.family)
            .field("leaves", &self.leaf_names().collect::<Vec<_>>())
            .finish()
    }
}
