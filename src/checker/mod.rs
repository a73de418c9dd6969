//! # Checker Module
//!
//! Pre-flight consistency checks over a [`Catalog`](crate::api::Catalog).
//! `serve` runs them at boot (unless disabled in the configuration) and
//! refuses to start on any error; `swaggery check` runs them on demand.
//!
//! ## Checks Performed
//!
//! 1. **API metadata** - description, version and path are set
//! 2. **Path consistency** - the `<name>` placeholders of a resource's
//!    subpath equal the path parameters of each of its operations
//! 3. **Single handler per verb** - a verb is bound to at most one
//!    operation of a resource
//! 4. **Operation metadata** - doc text, at least one response, valid
//!    status codes, resolvable model names
//! 5. **Path parameters are required**
//! 6. **At most one body parameter** per operation
//! 7. **Route collisions** - no two resources of one API share a verb and
//!    a path shape
//!
//! ## Usage
//!
//! ```rust
//! use swaggery::api::Catalog;
//! use swaggery::checker::{check_catalog, has_errors};
//!
//! let catalog = Catalog::new()?;
//! let issues = check_catalog(&catalog);
//! assert!(!has_errors(&issues));
//! # Ok::<(), swaggery::registry::RegistryError>(())
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    check_api, check_catalog, check_collisions, check_no_multiple_handlers, check_operation,
    check_path_consistency, check_resource, has_errors, print_check_issues, CheckIssue,
    CheckSeverity,
};
