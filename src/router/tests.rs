use super::{Route, RouteError, RouteMiss, Router};
use crate::api::{ApiDef, OperationDef, ResourceDef};
use crate::flow::Respond;
use http::Method;
use std::sync::Arc;

fn resource(api: &ApiDef, name: &str, subpath: &str, verbs: &[Method]) -> Arc<ResourceDef> {
    let mut res = ResourceDef::new(name, &api.name).subpath(subpath);
    for verb in verbs {
        let op_name = format!("{}_{}", name.to_lowercase(), verb.as_str().to_lowercase());
        res = res.operation(OperationDef::new(&op_name, verb.clone(), |_| {
            Ok(Respond::status(200))
        }));
    }
    res.bind(api);
    Arc::new(res)
}

fn routes_for(res: &Arc<ResourceDef>) -> Vec<Route> {
    res.operations
        .iter()
        .flat_map(|op| op.methods.iter().map(move |m| Route::new(m.clone(), res, op)))
        .collect()
}

fn calc_router() -> Router {
    let api = ApiDef::new("Calc", "calc", "1.0");
    let mut routes = routes_for(&resource(&api, "Root", "", &[Method::GET]));
    routes.extend(routes_for(&resource(
        &api,
        "Op",
        "<op>/<a>/<b>",
        &[Method::GET, Method::POST],
    )));
    Router::new(routes).unwrap()
}

#[test]
fn test_root_path() {
    let (re, params) = Router::path_to_regex("/").unwrap();
    assert!(re.is_match("/"));
    assert!(params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let (re, params) = Router::path_to_regex("/items/<id>").unwrap();
    assert!(re.is_match("/items/123"));
    assert!(!re.is_match("/items/1/2"));
    assert_eq!(params, vec!["id"]);
}

#[test]
fn test_literals_are_escaped() {
    let (re, params) = Router::path_to_regex("/files/<name>.json").unwrap();
    assert!(re.is_match("/files/a.json"));
    assert!(!re.is_match("/files/axjson"));
    assert_eq!(params, vec!["name"]);
}

#[test]
fn test_bad_templates() {
    assert!(matches!(
        Router::path_to_regex("/a/<b"),
        Err(RouteError::BadTemplate { .. })
    ));
    assert!(matches!(
        Router::path_to_regex("/a/<>"),
        Err(RouteError::BadTemplate { .. })
    ));
    assert!(matches!(
        Router::path_to_regex("/a/b>"),
        Err(RouteError::BadTemplate { .. })
    ));
}

#[test]
fn test_route_extracts_captures() {
    let router = calc_router();
    let m = router.route(&Method::GET, "/calc/add/1/2").unwrap();
    assert_eq!(&*m.route.handler_id, "Calc.op_get");
    assert_eq!(m.get_path_param("op"), Some("add"));
    assert_eq!(m.get_path_param("b"), Some("2"));
}

#[test]
fn test_captures_are_percent_decoded() {
    let router = calc_router();
    let m = router.route(&Method::GET, "/calc/a%20b/1/2").unwrap();
    assert_eq!(m.get_path_param("op"), Some("a b"));
}

#[test]
fn test_trailing_slash_is_ignored() {
    let router = calc_router();
    assert_eq!(
        &*router.route(&Method::GET, "/calc/").unwrap().route.handler_id,
        "Calc.root_get"
    );
    assert!(router.route(&Method::GET, "/calc/add/1/2/").is_ok());
}

#[test]
fn test_not_found_vs_method_not_allowed() {
    let router = calc_router();
    assert_eq!(
        router.route(&Method::GET, "/nowhere").unwrap_err(),
        RouteMiss::NotFound
    );
    assert_eq!(
        router.route(&Method::DELETE, "/calc/add/1/2").unwrap_err(),
        RouteMiss::MethodNotAllowed {
            allowed: vec![Method::GET, Method::POST]
        }
    );
    assert!(router.matches_path("/calc/add/1/2"));
    assert!(!router.matches_path("/calc/add"));
}

#[test]
fn test_duplicate_verb_and_shape_is_rejected() {
    let api = ApiDef::new("Shop", "shop", "1.0");
    let mut routes = routes_for(&resource(&api, "A", "item/<id>", &[Method::GET]));
    routes.extend(routes_for(&resource(&api, "B", "item/<key>", &[Method::GET])));
    let err = Router::new(routes).unwrap_err();
    assert!(matches!(err, RouteError::Duplicate { ref method, .. } if *method == Method::GET));
}

#[test]
fn test_same_shape_different_verbs_share_a_path() {
    let api = ApiDef::new("Shop", "shop", "1.0");
    let mut routes = routes_for(&resource(&api, "A", "item/<id>", &[Method::GET]));
    routes.extend(routes_for(&resource(&api, "B", "item/<id>", &[Method::PUT])));
    let router = Router::new(routes).unwrap();
    assert_eq!(router.len(), 2);
    assert_eq!(router.templates().count(), 1);
}

#[test]
fn test_same_shape_keeps_each_routes_placeholder_names() {
    let api = ApiDef::new("Shop", "shop", "1.0");
    let mut routes = routes_for(&resource(&api, "Reader", "<id>", &[Method::GET]));
    routes.extend(routes_for(&resource(&api, "Writer", "<item>", &[Method::POST])));
    let router = Router::new(routes).unwrap();
    assert_eq!(router.templates().count(), 1);

    let read = router.route(&Method::GET, "/shop/42").unwrap();
    assert_eq!(read.get_path_param("id"), Some("42"));
    let write = router.route(&Method::POST, "/shop/42").unwrap();
    assert_eq!(&*write.route.handler_id, "Shop.writer_post");
    assert_eq!(write.get_path_param("item"), Some("42"));
    assert_eq!(write.get_path_param("id"), None);
}

#[test]
fn test_literal_segment_wins_over_placeholder() {
    let api = ApiDef::new("Shop", "shop", "1.0");
    let mut routes = routes_for(&resource(&api, "Item", "<id>", &[Method::GET, Method::DELETE]));
    routes.extend(routes_for(&resource(&api, "New", "new", &[Method::GET])));
    let router = Router::new(routes).unwrap();

    let m = router.route(&Method::GET, "/shop/new").unwrap();
    assert_eq!(&*m.route.handler_id, "Shop.new_get");
    let m = router.route(&Method::GET, "/shop/7").unwrap();
    assert_eq!(&*m.route.handler_id, "Shop.item_get");
    // Verbs the literal route lacks still fall through to the placeholder.
    let m = router.route(&Method::DELETE, "/shop/new").unwrap();
    assert_eq!(m.get_path_param("id"), Some("new"));
}
