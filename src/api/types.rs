use http::Method;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::flow::{Call, Respond};
use crate::model::ModelRef;

/// Signature every operation body implements.
///
/// Returning `Err` (or panicking) is an unhandled fault; every declared
/// outcome goes through [`Respond`].
pub type Handler = Arc<dyn Fn(&mut Call) -> anyhow::Result<Respond> + Send + Sync>;

/// Where a parameter's value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
    Header,
    Form,
}

impl ParamLocation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Body => "body",
            ParamLocation::Header => "header",
            ParamLocation::Form => "form",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statically declared parameter of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParamLocation,
    pub model: ModelRef,
    pub required: bool,
}

impl ParameterMeta {
    #[must_use]
    pub fn new(name: &str, location: ParamLocation, model: ModelRef) -> Self {
        Self {
            name: name.to_string(),
            location,
            model,
            required: true,
        }
    }

    #[must_use]
    pub fn path(name: &str, model: ModelRef) -> Self {
        Self::new(name, ParamLocation::Path, model)
    }

    #[must_use]
    pub fn query(name: &str, model: ModelRef) -> Self {
        Self::new(name, ParamLocation::Query, model)
    }

    #[must_use]
    pub fn body(name: &str, model: ModelRef) -> Self {
        Self::new(name, ParamLocation::Body, model)
    }

    #[must_use]
    pub fn header(name: &str, model: ModelRef) -> Self {
        Self::new(name, ParamLocation::Header, model)
    }

    #[must_use]
    pub fn form(name: &str, model: ModelRef) -> Self {
        Self::new(name, ParamLocation::Form, model)
    }

    /// Mark the parameter as optional. When absent from the request it takes
    /// the model's `defaultValue`, if any.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// One row of an operation's response table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub message: String,
    pub model: Option<String>,
}

/// A declared API: a named, versioned group of resources under one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDef {
    pub name: String,
    pub version: String,
    pub path: String,
    pub description: String,
    pub private: bool,
}

impl ApiDef {
    #[must_use]
    pub fn new(name: &str, path: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            path: path.trim_matches('/').to_string(),
            description: String::new(),
            private: false,
        }
    }

    /// Set the description from a doc text; only its first line is kept.
    #[must_use]
    pub fn doc(mut self, text: &str) -> Self {
        self.description = split_doc(text).0;
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }
}

/// A declared endpoint under an API, exposing verb-bound operations.
#[derive(Clone)]
pub struct ResourceDef {
    pub name: String,
    pub api: String,
    pub subpath: Option<String>,
    pub description: String,
    pub private: bool,
    pub operations: Vec<Arc<OperationDef>>,
    pub(crate) api_path: String,
    pub(crate) endpoint_path: String,
}

impl ResourceDef {
    /// A resource belonging to the API registered under `api`.
    #[must_use]
    pub fn new(name: &str, api: &str) -> Self {
        Self {
            name: name.to_string(),
            api: api.to_string(),
            subpath: None,
            description: String::new(),
            private: false,
            operations: Vec::new(),
            api_path: String::new(),
            endpoint_path: String::new(),
        }
    }

    /// URL template fragment appended to the API path, with `<name>`
    /// placeholders. An empty fragment is the same as none.
    #[must_use]
    pub fn subpath(mut self, subpath: &str) -> Self {
        let subpath = subpath.trim_matches('/');
        self.subpath = (!subpath.is_empty()).then(|| subpath.to_string());
        self
    }

    #[must_use]
    pub fn doc(mut self, text: &str) -> Self {
        self.description = split_doc(text).0;
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    #[must_use]
    pub fn operation(mut self, op: OperationDef) -> Self {
        self.operations.push(Arc::new(op));
        self
    }

    /// `/<api path>[/<subpath>]`, fixed when the resource is registered.
    #[must_use]
    pub fn endpoint_path(&self) -> &str {
        &self.endpoint_path
    }

    /// Path of the owning API, fixed when the resource is registered.
    #[must_use]
    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// The endpoint path with `<name>` rewritten to `{name}`.
    #[must_use]
    pub fn swagger_path(&self) -> String {
        self.endpoint_path.replace('<', "{").replace('>', "}")
    }

    pub(crate) fn bind(&mut self, api: &ApiDef) {
        self.api_path = api.path.clone();
        self.endpoint_path = match &self.subpath {
            Some(sub) => format!("/{}/{}", api.path, sub),
            None => format!("/{}", api.path),
        };
    }

    /// The operation implementing `method`, if any.
    #[must_use]
    pub fn operation_for(&self, method: &Method) -> Option<&Arc<OperationDef>> {
        self.operations
            .iter()
            .find(|op| op.methods.contains(method))
    }
}

impl fmt::Debug for ResourceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDef")
            .field("name", &self.name)
            .field("api", &self.api)
            .field("endpoint_path", &self.endpoint_path)
            .field("operations", &self.operations)
            .finish()
    }
}

/// One verb-bound handler with its parameter list and response table.
#[derive(Clone)]
pub struct OperationDef {
    pub name: String,
    pub methods: Vec<Method>,
    pub summary: String,
    pub notes: String,
    pub parameters: Vec<ParameterMeta>,
    pub responses: BTreeMap<u16, ResponseMeta>,
    handler: Handler,
}

impl OperationDef {
    pub fn new<F>(name: &str, method: Method, handler: F) -> Self
    where
        F: Fn(&mut Call) -> anyhow::Result<Respond> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            methods: vec![method],
            summary: String::new(),
            notes: String::new(),
            parameters: Vec::new(),
            responses: BTreeMap::new(),
            handler: Arc::new(handler),
        }
    }

    /// Bind an additional verb to the same handler.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// First line becomes the summary, the rest the notes.
    #[must_use]
    pub fn doc(mut self, text: &str) -> Self {
        let (summary, notes) = split_doc(text);
        self.summary = summary;
        self.notes = notes;
        self
    }

    #[must_use]
    pub fn param(mut self, param: ParameterMeta) -> Self {
        self.parameters.push(param);
        self
    }

    /// Declare a possible outcome. `model` names the payload model; `None`
    /// documents it as `void`.
    #[must_use]
    pub fn response(mut self, status: u16, message: &str, model: Option<&str>) -> Self {
        self.responses.insert(
            status,
            ResponseMeta {
                message: message.to_string(),
                model: model.map(str::to_string),
            },
        );
        self
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The model of the 200 response, else of the first 2xx, else `void`.
    #[must_use]
    pub fn success_model(&self) -> &str {
        self.responses
            .get(&200)
            .or_else(|| {
                self.responses
                    .range(200..300)
                    .next()
                    .map(|(_, meta)| meta)
            })
            .and_then(|meta| meta.model.as_deref())
            .unwrap_or("void")
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &ParameterMeta> + '_ {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }
}

impl fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDef")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .field("parameters", &self.parameters)
            .field("responses", &self.responses)
            .finish_non_exhaustive()
    }
}

/// Split a doc text into a one-line summary and notes.
///
/// The notes are the remaining lines, dedented and folded onto one line.
#[must_use]
pub fn split_doc(text: &str) -> (String, String) {
    let Some((summary, rest)) = text.split_once('\n') else {
        return (text.trim().to_string(), String::new());
    };
    let indent = rest
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let notes = rest
        .lines()
        .map(|l| l.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join(" ");
    (summary.trim().to_string(), notes.trim().to_string())
}
