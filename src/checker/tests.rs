#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Unit tests for the declaration checker

use super::*;
use crate::api::{ApiDef, Catalog, OperationDef, ParameterMeta, ResourceDef};
use crate::flow::Respond;
use crate::model::{ModelRef, ModelRegistry, NativeType};
use http::Method;

fn op(name: &str, method: Method) -> OperationDef {
    OperationDef::new(name, method, |_| Ok(Respond::status(200)))
        .doc("Does a thing.")
        .response(200, "Ok", None)
}

fn id_param(name: &str) -> ParameterMeta {
    ParameterMeta::path(name, ModelRef::native(NativeType::Integer, "Identifier."))
}

fn kinds(issues: &[CheckIssue]) -> Vec<&'static str> {
    issues.iter().map(|i| i.kind).collect()
}

#[test]
fn test_path_consistency_mismatch() {
    let resource = ResourceDef::new("Widget", "Shop")
        .subpath("widget/<id>")
        .operation(op("get", Method::GET).param(id_param("other")));
    let issues = check_path_consistency(&resource);
    assert_eq!(kinds(&issues), vec!["path_consistency"]);
    assert_eq!(issues[0].location, "operation:Widget.get");
    assert_eq!(issues[0].severity, CheckSeverity::Error);
}

#[test]
fn test_path_consistency_match() {
    let resource = ResourceDef::new("Widget", "Shop")
        .subpath("widget/<id>")
        .operation(op("get", Method::GET).param(id_param("id")));
    assert!(check_path_consistency(&resource).is_empty());
}

#[test]
fn test_path_consistency_checks_every_operation() {
    let resource = ResourceDef::new("Widget", "Shop")
        .subpath("widget/<id>")
        .operation(op("get", Method::GET).param(id_param("id")))
        .operation(op("delete", Method::DELETE));
    let issues = check_path_consistency(&resource);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].location, "operation:Widget.delete");
}

#[test]
fn test_no_subpath_means_no_path_params() {
    let resource = ResourceDef::new("Root", "Shop").operation(op("get", Method::GET));
    assert!(check_path_consistency(&resource).is_empty());
}

#[test]
fn test_duplicate_post_rejected() {
    let resource = ResourceDef::new("Orders", "Shop")
        .operation(op("create", Method::POST))
        .operation(op("create_again", Method::POST));
    assert_eq!(
        kinds(&check_no_multiple_handlers(&resource)),
        vec!["duplicate_verb"]
    );
}

#[test]
fn test_get_and_post_accepted() {
    let resource = ResourceDef::new("Orders", "Shop")
        .operation(op("list", Method::GET))
        .operation(op("create", Method::POST));
    assert!(check_no_multiple_handlers(&resource).is_empty());
}

#[test]
fn test_operation_rules() {
    let models = ModelRegistry::with_builtins().unwrap();
    let resource = ResourceDef::new("Orders", "Shop").subpath("<id>");
    let bad = OperationDef::new("bad", Method::PUT, |_| Ok(Respond::status(200)))
        .param(id_param("id").optional())
        .param(ParameterMeta::body("a", ModelRef::named("Order", "First.")))
        .param(ParameterMeta::body("b", ModelRef::named("List", "Second.")))
        .response(42, "Huh", Some("Ghost"));
    let issues = check_operation(&resource, &bad, &models);
    assert_eq!(
        kinds(&issues),
        vec![
            "missing_doc",
            "invalid_status",
            "unknown_model",
            "optional_path_param",
            "unknown_model",
            "multiple_bodies"
        ]
    );
}

#[test]
fn test_api_metadata() {
    let issues = check_api(&ApiDef::new("Bare", "", ""));
    assert_eq!(
        kinds(&issues),
        vec!["missing_description", "missing_version", "missing_path"]
    );
    assert!(issues[0].suggestion.is_some());
}

#[test]
fn test_collisions_across_resources() {
    let mut catalog = Catalog::bare().unwrap();
    catalog
        .register_api(ApiDef::new("Shop", "shop", "1.0").doc("Shop."))
        .unwrap();
    catalog
        .register_resource(
            ResourceDef::new("ById", "Shop")
                .subpath("<id>")
                .operation(op("get", Method::GET).param(id_param("id"))),
        )
        .unwrap();
    catalog
        .register_resource(
            ResourceDef::new("ByName", "Shop")
                .subpath("<name>")
                .operation(op("get", Method::GET).param(id_param("name"))),
        )
        .unwrap();
    let issues = check_catalog(&catalog);
    assert_eq!(kinds(&issues).iter().filter(|k| **k == "route_collision").count(), 1);
    assert!(has_errors(&issues));
}

#[test]
fn test_builtin_catalog_is_clean() {
    let catalog = Catalog::new().unwrap();
    assert!(check_catalog(&catalog).is_empty());
}
