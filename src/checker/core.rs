use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::{ApiDef, Catalog, OperationDef, ParamLocation, ResourceDef};
use crate::model::ModelRegistry;

static PATH_PARAMS: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"<(.*?)>").unwrap()
});

/// Severity level for check issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckSeverity {
    /// Aborts `serve` unless boot checks are disabled
    Error,
    /// Worth fixing, never blocking
    Warning,
}

impl fmt::Display for CheckSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckSeverity::Error => f.write_str("error"),
            CheckSeverity::Warning => f.write_str("warning"),
        }
    }
}

/// A problem found in a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIssue {
    /// Where the issue occurred (e.g. `resource:Calc`, `operation:Calc.add`)
    pub location: String,
    pub severity: CheckSeverity,
    /// Machine-readable rule name (e.g. `path_consistency`)
    pub kind: &'static str,
    pub message: String,
    pub suggestion: Option<String>,
}

impl CheckIssue {
    pub fn new(
        location: impl Into<String>,
        severity: CheckSeverity,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        CheckIssue {
            location: location.into(),
            severity,
            kind,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn error(location: impl Into<String>, kind: &'static str, message: impl Into<String>) -> Self {
        Self::new(location, CheckSeverity::Error, kind, message)
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Run every check over the leaf declarations of `catalog`.
#[must_use]
pub fn check_catalog(catalog: &Catalog) -> Vec<CheckIssue> {
    let mut issues = Vec::new();
    for api in catalog.apis() {
        issues.extend(check_api(api));
    }
    for resource in catalog.resources() {
        if catalog.api(&resource.api).is_none() {
            issues.push(CheckIssue::error(
                format!("resource:{}", resource.name),
                "unknown_api",
                format!(
                    "Resource \"{}\" belongs to unregistered API \"{}\".",
                    resource.name, resource.api
                ),
            ));
        }
        issues.extend(check_resource(resource, catalog.models()));
    }
    issues.extend(check_collisions(catalog.resources().map(Arc::as_ref)));

    for issue in &issues {
        match issue.severity {
            CheckSeverity::Error => {
                error!(location = %issue.location, kind = issue.kind, "{}", issue.message);
            }
            CheckSeverity::Warning => {
                warn!(location = %issue.location, kind = issue.kind, "{}", issue.message);
            }
        }
    }
    if issues.is_empty() {
        info!("All declarations checked, no problem detected");
    }
    issues
}

/// An API must carry a description, a version and a path.
#[must_use]
pub fn check_api(api: &ApiDef) -> Vec<CheckIssue> {
    let location = format!("api:{}", api.name);
    let mut issues = Vec::new();
    if api.description.is_empty() {
        issues.push(
            CheckIssue::error(
                &location,
                "missing_description",
                format!("The API \"{}\" lacks a description.", api.name),
            )
            .with_suggestion("Call ApiDef::doc with a one-line summary"),
        );
    }
    if api.version.is_empty() {
        issues.push(CheckIssue::error(
            &location,
            "missing_version",
            format!("The API \"{}\" lacks a version.", api.name),
        ));
    }
    if api.path.is_empty() {
        issues.push(CheckIssue::error(
            &location,
            "missing_path",
            format!("The API \"{}\" lacks a path.", api.name),
        ));
    }
    issues
}

/// Resource-level rules plus every rule for each of its operations.
#[must_use]
pub fn check_resource(resource: &ResourceDef, models: &ModelRegistry) -> Vec<CheckIssue> {
    let mut issues = Vec::new();
    if resource.description.is_empty() {
        issues.push(CheckIssue::new(
            format!("resource:{}", resource.name),
            CheckSeverity::Warning,
            "missing_description",
            format!("The resource \"{}\" lacks a description.", resource.name),
        ));
    }
    issues.extend(check_path_consistency(resource));
    issues.extend(check_no_multiple_handlers(resource));
    for op in &resource.operations {
        issues.extend(check_operation(resource, op, models));
    }
    issues
}

/// Placeholders in the subpath must equal the path parameters of every
/// operation.
#[must_use]
pub fn check_path_consistency(resource: &ResourceDef) -> Vec<CheckIssue> {
    let declared: BTreeSet<&str> = resource
        .subpath
        .as_deref()
        .map(|sub| {
            PATH_PARAMS
                .captures_iter(sub)
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect()
        })
        .unwrap_or_default();

    resource
        .operations
        .iter()
        .filter_map(|op| {
            let actual: BTreeSet<&str> = op
                .params_in(ParamLocation::Path)
                .map(|p| p.name.as_str())
                .collect();
            (actual != declared).then(|| {
                CheckIssue::error(
                    format!("operation:{}.{}", resource.name, op.name),
                    "path_consistency",
                    format!(
                        "Method \"{}.{}\" path variables {:?} do not conform with the resource subpath declaration ({}).",
                        resource.name,
                        op.name,
                        actual,
                        resource.subpath.as_deref().unwrap_or("")
                    ),
                )
            })
        })
        .collect()
}

/// A verb may be bound to at most one operation per resource.
#[must_use]
pub fn check_no_multiple_handlers(resource: &ResourceDef) -> Vec<CheckIssue> {
    let mut seen = BTreeSet::new();
    let mut issues = Vec::new();
    for op in &resource.operations {
        for method in &op.methods {
            if !seen.insert(method.as_str()) {
                issues.push(CheckIssue::error(
                    format!("resource:{}", resource.name),
                    "duplicate_verb",
                    format!(
                        "HTTP verb \"{}\" associated to more than one endpoint in \"{}\".",
                        method, resource.name
                    ),
                ));
            }
        }
    }
    issues
}

/// Operation rules: documentation, responses, model names, path parameters
/// and the single body parameter.
#[must_use]
pub fn check_operation(
    resource: &ResourceDef,
    op: &OperationDef,
    models: &ModelRegistry,
) -> Vec<CheckIssue> {
    let location = format!("operation:{}.{}", resource.name, op.name);
    let mut issues = Vec::new();

    if op.summary.is_empty() {
        issues.push(CheckIssue::error(
            &location,
            "missing_doc",
            format!("Missing doc text for method \"{}\".", op.name),
        ));
    }
    if op.responses.is_empty() {
        issues.push(CheckIssue::error(
            &location,
            "missing_responses",
            format!("Missing return types for method \"{}\".", op.name),
        ));
    }
    for (code, meta) in &op.responses {
        if http::StatusCode::from_u16(*code).is_err() {
            issues.push(CheckIssue::error(
                &location,
                "invalid_status",
                format!("Method {} declares invalid status code {}.", op.name, code),
            ));
        }
        if let Some(model) = &meta.model {
            if !models.contains(model) {
                issues.push(CheckIssue::error(
                    &location,
                    "unknown_model",
                    format!(
                        "Method {} return type for code {} names unknown model \"{}\".",
                        op.name, code, model
                    ),
                ));
            }
        }
    }

    let mut bodies = Vec::new();
    for param in &op.parameters {
        if !models.contains(param.model.name()) {
            issues.push(CheckIssue::error(
                &location,
                "unknown_model",
                format!(
                    "Type \"{}\" for param {} in method {} is not a registered model.",
                    param.model.name(),
                    param.name,
                    op.name
                ),
            ));
        }
        match param.location {
            ParamLocation::Body => bodies.push(param.name.as_str()),
            ParamLocation::Path if !param.required => {
                issues.push(
                    CheckIssue::error(
                        &location,
                        "optional_path_param",
                        format!(
                            "Path parameter {} in method {} is optional (which is wrong!).",
                            param.name, op.name
                        ),
                    )
                    .with_suggestion("Drop the call to ParameterMeta::optional"),
                );
            }
            _ => {}
        }
    }
    if bodies.len() > 1 {
        issues.push(CheckIssue::error(
            &location,
            "multiple_bodies",
            format!(
                "Too many body params {:?} for method {} (max=1).",
                bodies, op.name
            ),
        ));
    }
    issues
}

/// Two resources of one API must not bind the same verb to the same path.
pub fn check_collisions<'a>(resources: impl Iterator<Item = &'a ResourceDef>) -> Vec<CheckIssue> {
    let mut seen: HashMap<(String, String, String), &str> = HashMap::new();
    let mut issues = Vec::new();
    for resource in resources {
        let shape = PATH_PARAMS
            .replace_all(resource.endpoint_path(), "<>")
            .into_owned();
        for op in &resource.operations {
            for method in &op.methods {
                let key = (resource.api.clone(), method.to_string(), shape.clone());
                match seen.get(&key) {
                    Some(first) if *first != resource.name => {
                        issues.push(CheckIssue::error(
                            format!("resource:{}", resource.name),
                            "route_collision",
                            format!(
                                "{} {} of \"{}\" collides with resource \"{}\".",
                                method,
                                resource.endpoint_path(),
                                resource.name,
                                first
                            ),
                        ));
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(key, &resource.name);
                    }
                }
            }
        }
    }
    issues
}

#[must_use]
pub fn has_errors(issues: &[CheckIssue]) -> bool {
    issues.iter().any(|i| i.severity == CheckSeverity::Error)
}

/// Print check issues grouped by severity.
pub fn print_check_issues(issues: &[CheckIssue]) {
    if issues.is_empty() {
        println!("✅ No check issues found!");
        return;
    }

    let errors: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == CheckSeverity::Error)
        .collect();
    let warnings: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == CheckSeverity::Warning)
        .collect();

    println!("\n📋 Check Results:");
    println!("   {} error(s), {} warning(s)\n", errors.len(), warnings.len());

    for (title, group) in [("❌ Errors (must fix):", errors), ("⚠️  Warnings (should fix):", warnings)] {
        if group.is_empty() {
            continue;
        }
        println!("{title}");
        for issue in group {
            println!("   [{}] {}", issue.kind, issue.location);
            println!("      {}", issue.message);
            if let Some(suggestion) = &issue.suggestion {
                println!("      💡 Suggestion: {suggestion}");
            }
        }
        println!();
    }
}
