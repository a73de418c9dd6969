//! # Introspection Module
//!
//! Swagger 1.2 documents derived from the [`Catalog`](crate::api::Catalog),
//! served by the built-in `introspect` API as ordinary endpoints:
//!
//! | Endpoint                    | Document                                  |
//! |-----------------------------|-------------------------------------------|
//! | `GET /introspect`           | resource listing: every public API        |
//! | `GET /introspect/<api_path>`| api declaration: resources of one API     |
//!
//! The declaration lists each public resource with its operations,
//! parameters and response messages, plus the schemas of the custom models
//! they reference. It is computed once per API path and then served from
//! the [`Introspector`]'s cache; its `basePath` comes from the `Host`
//! header of the request that computed it.
//!
//! [`install`] runs as part of [`Catalog::new`](crate::api::Catalog::new),
//! so every catalog carries the introspection API.

mod core;

pub use core::{
    api_fragment, install, resource_fragment, IntrospectionError, Introspector,
    INTROSPECTION_PATH, INTROSPECTION_VERSION, SWAGGER_VERSION,
};
