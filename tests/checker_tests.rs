//! Integration tests for the consistency checker over whole catalogs

use http::Method;
use swaggery::api::{Catalog, OperationDef, ParameterMeta, ResourceDef};
use swaggery::checker::{check_catalog, has_errors, CheckSeverity};
use swaggery::config::AppConfig;
use swaggery::flow::Respond;
use swaggery::model::{ModelRef, NativeType};

mod common;
use common::calc_catalog;

fn noop(name: &str, method: Method) -> OperationDef {
    OperationDef::new(name, method, |_| Ok(Respond::status(200)))
        .doc("Does nothing.")
        .response(200, "Ok", None)
}

fn broken_catalog() -> Catalog {
    let mut catalog = calc_catalog();
    catalog
        .register_resource(
            ResourceDef::new("Mismatch", "Calc")
                .subpath("items/<id>")
                .doc("Declares a placeholder nobody reads.")
                .operation(noop("get_item", Method::GET).param(ParameterMeta::path(
                    "item_id",
                    ModelRef::native(NativeType::Integer, "Item."),
                ))),
        )
        .unwrap();
    catalog
        .register_resource(
            ResourceDef::new("Twice", "Calc")
                .subpath("twice")
                .doc("Two operations on one verb.")
                .operation(noop("create", Method::POST))
                .operation(noop("create_again", Method::POST)),
        )
        .unwrap();
    catalog
}

#[test]
fn test_calc_catalog_is_clean() {
    let issues = check_catalog(&calc_catalog());
    assert!(!has_errors(&issues), "{issues:?}");
}

#[test]
fn test_broken_catalog_is_reported() {
    let issues = check_catalog(&broken_catalog());
    assert!(has_errors(&issues));
    let kinds: Vec<&str> = issues
        .iter()
        .filter(|i| i.severity == CheckSeverity::Error)
        .map(|i| i.kind)
        .collect();
    assert!(kinds.contains(&"path_consistency"), "{kinds:?}");
    assert!(kinds.contains(&"duplicate_verb"), "{kinds:?}");
    assert!(issues.iter().any(|i| i.location.contains("Mismatch")));
}

#[test]
fn test_serve_refuses_broken_catalog() {
    let mut config = AppConfig::default();
    config.application.addr = "127.0.0.1:0".to_string();
    let err = swaggery::cli::serve(&config, broken_catalog()).unwrap_err();
    assert!(err.to_string().contains("consistency checks"));
}
