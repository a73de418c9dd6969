use dashmap::DashMap;
use http::Method;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::{ApiDef, Catalog, OperationDef, ParameterMeta, ResourceDef};
use crate::flow::{Call, Respond};
use crate::model::{ModelRef, ModelType, NativeType};
use crate::registry::RegistryError;

/// Path of the built-in introspection API.
pub const INTROSPECTION_PATH: &str = "introspect";
pub const INTROSPECTION_VERSION: &str = "1.0.0";
pub const SWAGGER_VERSION: &str = "1.2";

const RESOURCE_LISTING_SCHEMA: &str = include_str!("resource-listing.json");
const API_DECLARATION_SCHEMA: &str = include_str!("api-declaration.json");

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntrospectionError {
    #[error("no public resource is mounted under `{0}`")]
    NoSuchApi(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Builds the swagger documents and caches each api declaration.
///
/// The catalog is immutable once serving starts, so a cached declaration
/// never goes stale. Two requests racing on a cold entry may both compute
/// it; the results are identical and the second insert wins.
#[derive(Debug, Default)]
pub struct Introspector {
    declarations: DashMap<String, Arc<Value>>,
    computations: AtomicUsize,
}

impl Introspector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `{apiVersion, swaggerVersion, apis}` over every public API.
    #[must_use]
    pub fn resource_listing(&self, catalog: &Catalog) -> Value {
        let apis: Vec<Value> = catalog
            .apis()
            .filter(|api| !api.private)
            .map(|api| api_fragment(api))
            .collect();
        json!({
            "apiVersion": INTROSPECTION_VERSION,
            "swaggerVersion": SWAGGER_VERSION,
            "apis": apis,
        })
    }

    /// The declaration of every public resource under `api_path`.
    ///
    /// `host` becomes the document's `basePath` on first computation only.
    pub fn api_declaration(
        &self,
        catalog: &Catalog,
        api_path: &str,
        host: Option<&str>,
    ) -> Result<Arc<Value>, IntrospectionError> {
        let api_path = api_path.trim_matches('/');
        if let Some(cached) = self.declarations.get(api_path) {
            debug!(api_path = %api_path, "Api declaration served from cache");
            return Ok(Arc::clone(cached.value()));
        }

        let resources: Vec<&Arc<ResourceDef>> = catalog
            .resources_under(api_path)
            .filter(|r| !r.private)
            .collect();
        if resources.is_empty() {
            return Err(IntrospectionError::NoSuchApi(api_path.to_string()));
        }

        self.computations.fetch_add(1, Ordering::Relaxed);
        let apis: Vec<Value> = resources.iter().map(|r| resource_fragment(r)).collect();
        let models = extract_models(catalog, &apis)?;
        let version = catalog
            .api_by_path(api_path)
            .map_or(INTROSPECTION_VERSION, |api| api.version.as_str());
        let doc = Arc::new(json!({
            "apiVersion": version,
            "swaggerVersion": SWAGGER_VERSION,
            "basePath": format!("http://{}", host.unwrap_or("localhost")),
            "resourcePath": format!("/{api_path}"),
            "apis": apis,
            "models": models,
            "consumes": ["application/json"],
            "produces": ["application/json"],
        }));
        info!(api_path = %api_path, resources = resources.len(), "Api declaration computed");
        self.declarations
            .insert(api_path.to_string(), Arc::clone(&doc));
        Ok(doc)
    }

    /// How many declarations have been computed (not served from cache).
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }
}

/// `{path, description}` as listed in the resource listing.
#[must_use]
pub fn api_fragment(api: &ApiDef) -> Value {
    json!({
        "path": format!("/{}", api.path),
        "description": api.description,
    })
}

/// `{path, description, operations}` for one resource.
#[must_use]
pub fn resource_fragment(resource: &ResourceDef) -> Value {
    let operations: Vec<Value> = resource
        .operations
        .iter()
        .flat_map(|op| op.methods.iter().map(move |m| operation_fragment(m, op)))
        .collect();
    json!({
        "path": resource.swagger_path(),
        "description": resource.description,
        "operations": operations,
    })
}

fn operation_fragment(method: &Method, op: &OperationDef) -> Value {
    let parameters: Vec<Value> = op.parameters.iter().map(parameter_fragment).collect();
    let responses: Vec<Value> = op
        .responses
        .iter()
        .map(|(code, meta)| {
            json!({
                "code": code,
                "message": meta.message,
                "responseModel": meta.model.as_deref().unwrap_or("void"),
            })
        })
        .collect();
    json!({
        "method": method.as_str(),
        "nickname": op.name,
        "type": op.success_model(),
        "parameters": parameters,
        "summary": op.summary,
        "notes": op.notes,
        "responseMessages": responses,
    })
}

fn parameter_fragment(param: &ParameterMeta) -> Value {
    let mut out = Map::new();
    for (k, v) in param.model.extras() {
        out.insert(k.clone(), v.clone());
    }
    out.insert("paramType".into(), json!(param.location.as_str()));
    out.insert("name".into(), json!(param.name));
    out.insert("description".into(), json!(param.model.description()));
    out.insert("dataType".into(), json!(param.model.name()));
    out.insert("required".into(), json!(param.required));
    Value::Object(out)
}

/// Resolve every model named by the emitted operations and keep the
/// schemas of the custom ones, keyed by name.
fn extract_models(catalog: &Catalog, apis: &[Value]) -> Result<Value, RegistryError> {
    let mut names = BTreeSet::new();
    for api in apis {
        for op in api["operations"].as_array().into_iter().flatten() {
            names.insert(op["type"].as_str().unwrap_or("void"));
            for param in op["parameters"].as_array().into_iter().flatten() {
                names.insert(param["dataType"].as_str().unwrap_or("void"));
            }
            for msg in op["responseMessages"].as_array().into_iter().flatten() {
                names.insert(msg["responseModel"].as_str().unwrap_or("void"));
            }
        }
    }

    let mut models = Map::new();
    for name in names {
        let model = catalog.models().by_name(name)?;
        if let Some(decl) = model.declaration() {
            models.insert(
                decl.id.clone(),
                json!({"id": decl.id, "schema": decl.schema}),
            );
        }
    }
    Ok(Value::Object(models))
}

fn schema_model(name: &str, description: &str, raw: &str) -> Result<ModelType, RegistryError> {
    let schema = serde_json::from_str(raw).map_err(|e| RegistryError::InvalidSchema {
        model: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(ModelType::custom(name, description, schema))
}

fn resource_listing(call: &mut Call) -> anyhow::Result<Respond> {
    let catalog = Arc::clone(call.catalog());
    let listing = catalog.introspector().resource_listing(&catalog);
    Ok(Respond::json(200, listing))
}

fn api_declaration(call: &mut Call) -> anyhow::Result<Respond> {
    let api_path: String = call.param_as("api_path")?;
    let catalog = Arc::clone(call.catalog());
    match catalog
        .introspector()
        .api_declaration(&catalog, &api_path, call.host())
    {
        Ok(doc) => Ok(Respond::json(200, Value::clone(&doc))),
        Err(IntrospectionError::NoSuchApi(_)) => Ok(Respond::status(404)),
        Err(err) => Err(err.into()),
    }
}

/// Register the `introspect` API, its two resources and their models.
pub fn install(catalog: &mut Catalog) -> Result<(), RegistryError> {
    catalog.register_model(
        schema_model(
            "ResourceListingModel",
            "The model of the resource listing.",
            RESOURCE_LISTING_SCHEMA,
        )?,
        None,
    )?;
    catalog.register_model(
        schema_model(
            "ApiDeclarationModel",
            "The model of the api declaration.",
            API_DECLARATION_SCHEMA,
        )?,
        None,
    )?;

    catalog.register_api(
        ApiDef::new("Introspection", INTROSPECTION_PATH, INTROSPECTION_VERSION)
            .doc("Swagger support for Swaggery API."),
    )?;

    catalog.register_resource(
        ResourceDef::new("ResourceListing", "Introspection")
            .doc("Resource listing (show all APIs + description path).")
            .operation(
                OperationDef::new("resource_listing", Method::GET, resource_listing)
                    .doc(
                        "Return the list of all available resources on the system.\n\n\
                         Private APIs are left out of the listing.",
                    )
                    .response(200, "Ok", Some("ResourceListingModel")),
            ),
    )?;

    catalog.register_resource(
        ResourceDef::new("ApiDeclaration", "Introspection")
            .subpath("<api_path>")
            .doc("API description (show all possible data for each resource).")
            .operation(
                OperationDef::new("api_declaration", Method::GET, api_declaration)
                    .doc(
                        "Return the complete declaration of a single API.\n\n\
                         The document is computed once per API and cached.",
                    )
                    .param(ParameterMeta::path(
                        "api_path",
                        ModelRef::native(
                            NativeType::String,
                            "The path for the info on the resource.",
                        ),
                    ))
                    .response(200, "Ok", Some("ApiDeclarationModel"))
                    .response(404, "Not a valid resource.", None),
            ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResponseMeta;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new().unwrap();
        catalog
            .register_model(
                ModelType::custom(
                    "Vector",
                    "A 2D vector.",
                    json!({"type": "object", "properties": {"x": {"type": "number"}}}),
                ),
                None,
            )
            .unwrap();
        catalog
            .register_api(ApiDef::new("Geo", "geo", "0.3.0").doc("Geometry."))
            .unwrap();
        catalog
            .register_api(ApiDef::new("Hidden", "hidden", "1.0").private())
            .unwrap();
        catalog
            .register_resource(
                ResourceDef::new("Shift", "Geo")
                    .subpath("shift/<dx>")
                    .doc("Shift a vector.")
                    .operation(
                        OperationDef::new("shift", Method::POST, |_| Ok(Respond::status(200)))
                            .doc("Shift.\n\n    Adds dx\n    to x.")
                            .param(ParameterMeta::path(
                                "dx",
                                ModelRef::native(NativeType::Float, "Offset."),
                            ))
                            .param(ParameterMeta::body(
                                "v",
                                ModelRef::named("Vector", "The vector."),
                            ))
                            .response(200, "Shifted", Some("Vector")),
                    ),
            )
            .unwrap();
        catalog
            .register_resource(
                ResourceDef::new("Secret", "Geo")
                    .subpath("secret")
                    .private()
                    .operation(OperationDef::new("secret", Method::GET, |_| {
                        Ok(Respond::status(200))
                    })),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_listing_skips_private_apis() {
        let catalog = catalog();
        let listing = catalog.introspector().resource_listing(&catalog);
        assert_eq!(listing["apiVersion"], "1.0.0");
        assert_eq!(listing["swaggerVersion"], "1.2");
        let paths: Vec<_> = listing["apis"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["/introspect", "/geo"]);
    }

    #[test]
    fn test_declaration_shape() {
        let catalog = catalog();
        let doc = catalog
            .introspector()
            .api_declaration(&catalog, "geo", Some("example.org:8080"))
            .unwrap();
        assert_eq!(doc["apiVersion"], "0.3.0");
        assert_eq!(doc["basePath"], "http://example.org:8080");
        assert_eq!(doc["resourcePath"], "/geo");
        let apis = doc["apis"].as_array().unwrap();
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0]["path"], "/geo/shift/{dx}");

        let op = &apis[0]["operations"][0];
        assert_eq!(op["method"], "POST");
        assert_eq!(op["nickname"], "shift");
        assert_eq!(op["type"], "Vector");
        assert_eq!(op["summary"], "Shift.");
        assert_eq!(op["notes"], "Adds dx to x.");
        assert_eq!(
            op["parameters"][0],
            json!({
                "paramType": "path",
                "name": "dx",
                "description": "Offset.",
                "dataType": "float",
                "required": true
            })
        );
        assert_eq!(
            op["responseMessages"],
            json!([{"code": 200, "message": "Shifted", "responseModel": "Vector"}])
        );
    }

    #[test]
    fn test_declaration_models_are_custom_only() {
        let catalog = catalog();
        let doc = catalog
            .introspector()
            .api_declaration(&catalog, "geo", None)
            .unwrap();
        let models = doc["models"].as_object().unwrap();
        assert_eq!(models.keys().collect::<Vec<_>>(), vec!["Vector"]);
        assert_eq!(models["Vector"]["id"], "Vector");
        assert_eq!(
            models["Vector"]["schema"],
            *catalog.models().by_name("Vector").unwrap().schema().unwrap()
        );
    }

    #[test]
    fn test_declaration_is_cached() {
        let catalog = catalog();
        let intro = catalog.introspector();
        let first = intro.api_declaration(&catalog, "geo", Some("a")).unwrap();
        let second = intro.api_declaration(&catalog, "geo", Some("b")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(intro.computations(), 1);
    }

    #[test]
    fn test_unknown_or_private_api_is_not_found() {
        let catalog = catalog();
        let intro = catalog.introspector();
        assert_eq!(
            intro.api_declaration(&catalog, "hidden", None),
            Err(IntrospectionError::NoSuchApi("hidden".into()))
        );
        assert!(intro.api_declaration(&catalog, "nowhere", None).is_err());
        assert_eq!(intro.computations(), 0);
    }

    #[test]
    fn test_introspection_declares_its_models() {
        let catalog = Catalog::new().unwrap();
        let doc = catalog
            .introspector()
            .api_declaration(&catalog, INTROSPECTION_PATH, None)
            .unwrap();
        let models = doc["models"].as_object().unwrap();
        assert!(models.contains_key("ResourceListingModel"));
        assert!(models.contains_key("ApiDeclarationModel"));
        let res = catalog
            .resources_under(INTROSPECTION_PATH)
            .find(|r| r.name == "ApiDeclaration")
            .unwrap();
        let op = &res.operations[0];
        assert_eq!(
            op.responses.get(&404),
            Some(&ResponseMeta {
                message: "Not a valid resource.".into(),
                model: None
            })
        );
    }
}
