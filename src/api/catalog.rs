use std::sync::Arc;

use tracing::info;

use super::types::{ApiDef, ResourceDef};
use crate::introspection::Introspector;
use crate::model::{ModelRegistry, ModelType};
use crate::registry::{LeafRegistry, RegistryError};

/// Every declaration known to the process.
///
/// Filled once at startup, then shared read-only behind an `Arc` by the
/// dispatcher, the handlers and the introspection endpoints.
pub struct Catalog {
    apis: LeafRegistry<ApiDef>,
    resources: LeafRegistry<ResourceDef>,
    models: ModelRegistry,
    introspector: Introspector,
}

impl Catalog {
    /// A catalog with the built-in models and the `introspect` API.
    pub fn new() -> Result<Self, RegistryError> {
        let mut catalog = Self::bare()?;
        crate::introspection::install(&mut catalog)?;
        Ok(catalog)
    }

    /// A catalog holding only the built-in models.
    pub fn bare() -> Result<Self, RegistryError> {
        Ok(Self {
            apis: LeafRegistry::new("api"),
            resources: LeafRegistry::new("resource"),
            models: ModelRegistry::with_builtins()?,
            introspector: Introspector::new(),
        })
    }

    pub fn register_api(&mut self, api: ApiDef) -> Result<Arc<ApiDef>, RegistryError> {
        self.register_api_extending(api, None)
    }

    /// Register `api` as a specialisation of `parent`, which then stops
    /// being listed or mounted.
    pub fn register_api_extending(
        &mut self,
        api: ApiDef,
        parent: Option<&str>,
    ) -> Result<Arc<ApiDef>, RegistryError> {
        let name = api.name.clone();
        let api = self.apis.register(&name, parent, api)?;
        info!(api = %api.name, path = %api.path, version = %api.version, "API registered");
        Ok(api)
    }

    pub fn register_resource(
        &mut self,
        resource: ResourceDef,
    ) -> Result<Arc<ResourceDef>, RegistryError> {
        self.register_resource_extending(resource, None)
    }

    /// Register `resource`, binding its endpoint path to its API's path.
    pub fn register_resource_extending(
        &mut self,
        mut resource: ResourceDef,
        parent: Option<&str>,
    ) -> Result<Arc<ResourceDef>, RegistryError> {
        let api = self
            .apis
            .get(&resource.api)
            .ok_or_else(|| RegistryError::UnknownApi {
                resource: resource.name.clone(),
                api: resource.api.clone(),
            })?;
        resource.bind(api);
        let name = resource.name.clone();
        let resource = self.resources.register(&name, parent, resource)?;
        info!(
            resource = %resource.name,
            endpoint = %resource.endpoint_path(),
            operations = resource.operations.len(),
            "Resource registered"
        );
        Ok(resource)
    }

    pub fn register_model(
        &mut self,
        model: ModelType,
        parent: Option<&str>,
    ) -> Result<Arc<ModelType>, RegistryError> {
        self.models.register(model, parent)
    }

    /// Leaf APIs, in registration order.
    pub fn apis(&self) -> impl Iterator<Item = &Arc<ApiDef>> + '_ {
        self.apis.leaves()
    }

    /// Leaf resources, in registration order.
    pub fn resources(&self) -> impl Iterator<Item = &Arc<ResourceDef>> + '_ {
        self.resources.leaves()
    }

    /// Leaf resources whose API is mounted under `api_path`.
    pub fn resources_under<'a>(
        &'a self,
        api_path: &'a str,
    ) -> impl Iterator<Item = &'a Arc<ResourceDef>> + 'a {
        self.resources().filter(move |r| r.api_path() == api_path)
    }

    #[must_use]
    pub fn api(&self, name: &str) -> Option<&Arc<ApiDef>> {
        self.apis.get(name)
    }

    #[must_use]
    pub fn api_by_path(&self, path: &str) -> Option<&Arc<ApiDef>> {
        self.apis().find(|api| api.path == path)
    }

    #[must_use]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    #[must_use]
    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("apis", &self.apis)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OperationDef;
    use crate::flow::Respond;
    use http::Method;

    #[test]
    fn test_resource_requires_known_api() {
        let mut catalog = Catalog::bare().unwrap();
        let err = catalog
            .register_resource(ResourceDef::new("Orphan", "Nowhere"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownApi {
                resource: "Orphan".into(),
                api: "Nowhere".into()
            }
        );
    }

    #[test]
    fn test_derived_resource_replaces_base() {
        let mut catalog = Catalog::bare().unwrap();
        catalog
            .register_api(ApiDef::new("Shop", "shop", "0.1"))
            .unwrap();
        let op = || OperationDef::new("get", Method::GET, |_| Ok(Respond::status(200)));
        catalog
            .register_resource(ResourceDef::new("Base", "Shop").operation(op()))
            .unwrap();
        catalog
            .register_resource_extending(
                ResourceDef::new("Items", "Shop").subpath("items").operation(op()),
                Some("Base"),
            )
            .unwrap();
        let endpoints: Vec<_> = catalog
            .resources_under("shop")
            .map(|r| r.endpoint_path().to_string())
            .collect();
        assert_eq!(endpoints, vec!["/shop/items"]);
    }

    #[test]
    fn test_new_catalog_mounts_introspection() {
        let catalog = Catalog::new().unwrap();
        let api = catalog.api_by_path("introspect").unwrap();
        assert_eq!(api.version, "1.0.0");
        assert_eq!(catalog.resources_under("introspect").count(), 2);
        assert!(catalog.models().contains("ApiDeclarationModel"));
    }
}
