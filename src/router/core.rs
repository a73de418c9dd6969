use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{OperationDef, ResourceDef};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated `(name, value)` storage for request parameters.
///
/// Names are `Arc<str>` shared with the route table; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("{method} {template} is bound to both `{first}` and `{second}`")]
    Duplicate {
        method: Method,
        template: String,
        first: String,
        second: String,
    },
    #[error("invalid path template `{template}`: {reason}")]
    BadTemplate { template: String, reason: String },
}

/// Why a request did not resolve to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMiss {
    NotFound,
    MethodNotAllowed { allowed: Vec<Method> },
}

/// One routing rule: a verb and a URL template bound to an operation.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub template: Arc<str>,
    /// `"<Api>.<operation>"`
    pub handler_id: Arc<str>,
    pub resource: Arc<ResourceDef>,
    pub operation: Arc<OperationDef>,
}

impl Route {
    #[must_use]
    pub fn new(method: Method, resource: &Arc<ResourceDef>, operation: &Arc<OperationDef>) -> Self {
        Self {
            method,
            template: Arc::from(resource.endpoint_path()),
            handler_id: Arc::from(format!("{}.{}", resource.api, operation.name)),
            resource: Arc::clone(resource),
            operation: Arc::clone(operation),
        }
    }
}

/// A request path resolved to a route, with its path captures.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Last capture named `name`.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Routes sharing one path shape. Placeholder names may differ per route,
/// so each route keeps its own.
struct PathPattern {
    template: Arc<str>,
    regex: Regex,
    /// Per segment, whether it holds a placeholder
    placeholders: Vec<bool>,
    methods: Vec<(Method, Arc<Route>, Vec<Arc<str>>)>,
}

/// Route table built once at startup from `<name>` URL templates.
pub struct Router {
    patterns: Vec<PathPattern>,
}

impl Router {
    /// Compile `routes` into a table. Two routes sharing a verb and a path
    /// shape (placeholder names aside) are rejected.
    ///
    /// Shapes are tried segment by segment, literal before placeholder, so
    /// `/shop/new` wins over `/shop/<id>` whatever the registration order.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteError> {
        let mut patterns: Vec<PathPattern> = Vec::new();
        let mut by_shape: HashMap<String, usize> = HashMap::new();
        let route_count = routes.len();

        for route in routes {
            let (regex, param_names) = Self::path_to_regex(&route.template)?;
            let shape = regex.as_str().to_string();
            let idx = match by_shape.get(&shape) {
                Some(&idx) => idx,
                None => {
                    patterns.push(PathPattern {
                        template: Arc::clone(&route.template),
                        regex,
                        placeholders: normalize(&route.template)
                            .split('/')
                            .map(|segment| segment.contains('<'))
                            .collect(),
                        methods: Vec::new(),
                    });
                    by_shape.insert(shape, patterns.len() - 1);
                    patterns.len() - 1
                }
            };

            let pattern = &mut patterns[idx];
            if let Some((_, existing, _)) =
                pattern.methods.iter().find(|(m, _, _)| *m == route.method)
            {
                return Err(RouteError::Duplicate {
                    method: route.method.clone(),
                    template: route.template.to_string(),
                    first: existing.handler_id.to_string(),
                    second: route.handler_id.to_string(),
                });
            }
            debug!(
                method = %route.method,
                template = %route.template,
                handler_id = %route.handler_id,
                "Path mapped"
            );
            let names: Vec<Arc<str>> = param_names.into_iter().map(Arc::from).collect();
            pattern.methods.push((route.method.clone(), Arc::new(route), names));
        }
        patterns.sort_by(|a, b| a.placeholders.cmp(&b.placeholders));

        info!(
            routes_count = route_count,
            paths_count = patterns.len(),
            "Routing table loaded"
        );
        Ok(Self { patterns })
    }

    /// Resolve `method path`. A trailing slash is ignored.
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch, RouteMiss> {
        debug!(method = %method, path = %path, "Route match attempt");
        let path = normalize(path);

        let mut allowed: Vec<Method> = Vec::new();
        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(path) else {
                continue;
            };
            match pattern.methods.iter().find(|(m, _, _)| m == method) {
                Some((_, route, param_names)) => {
                    let mut path_params = ParamVec::new();
                    for (i, name) in param_names.iter().enumerate() {
                        let raw = caps.get(i + 1).map_or("", |m| m.as_str());
                        let value = urlencoding::decode(raw)
                            .map_or_else(|_| raw.to_string(), |v| v.into_owned());
                        path_params.push((Arc::clone(name), value));
                    }
                    debug!(
                        method = %method,
                        path = %path,
                        handler_id = %route.handler_id,
                        path_params = ?path_params,
                        "Route matched"
                    );
                    return Ok(RouteMatch {
                        route: Arc::clone(route),
                        path_params,
                    });
                }
                None => {
                    for (m, _, _) in &pattern.methods {
                        if !allowed.contains(m) {
                            allowed.push(m.clone());
                        }
                    }
                }
            }
        }

        if allowed.is_empty() {
            warn!(method = %method, path = %path, "No route matched");
            Err(RouteMiss::NotFound)
        } else {
            warn!(method = %method, path = %path, allowed = ?allowed, "Method not allowed");
            Err(RouteMiss::MethodNotAllowed { allowed })
        }
    }

    /// `true` when some route matches `path`, whatever its verb.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        let path = normalize(path);
        self.patterns.iter().any(|p| p.regex.is_match(path))
    }

    /// All routes, grouped by template in table order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> + '_ {
        self.patterns
            .iter()
            .flat_map(|p| p.methods.iter().map(|(_, r, _)| r))
    }

    /// Distinct URL templates, in table order.
    pub fn templates(&self) -> impl Iterator<Item = &str> + '_ {
        self.patterns.iter().map(|p| p.template.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.iter().map(|p| p.methods.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Convert a `<name>` template into an anchored regex plus the ordered
    /// placeholder names.
    ///
    /// `/calc/<op>/<a>` becomes `^/calc/([^/]+)/([^/]+)$` with `["op", "a"]`.
    pub(crate) fn path_to_regex(template: &str) -> Result<(Regex, Vec<String>), RouteError> {
        let bad = |reason: &str| RouteError::BadTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let template = normalize(template);
        let mut pattern = String::with_capacity(template.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(template.matches('<').count());

        let mut rest = template;
        while let Some(open) = rest.find('<') {
            pattern.push_str(&regex::escape(&rest[..open]));
            let after = &rest[open + 1..];
            let close = after.find('>').ok_or_else(|| bad("unclosed `<`"))?;
            let name = &after[..close];
            if name.is_empty() || name.contains(['<', '/']) {
                return Err(bad("placeholder names must be non-empty single segments"));
            }
            pattern.push_str("([^/]+)");
            param_names.push(name.to_string());
            rest = &after[close + 1..];
        }
        if rest.contains('>') {
            return Err(bad("unmatched `>`"));
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| bad(&e.to_string()))?;
        Ok((regex, param_names))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes().map(|r| format!("{} {}", r.method, r.template)))
            .finish()
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}
