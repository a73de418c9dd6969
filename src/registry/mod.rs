//! # Registry Module
//!
//! Leaf-tracking registries for the three kinds of declarations Swaggery
//! knows about: APIs, Resources and Models.
//!
//! ## Overview
//!
//! Every declaration is registered once at startup, optionally naming the
//! declaration it derives from. A registry only ever exposes its *leaves*:
//! declarations that nothing else derives from. Registering a child
//! retroactively hides its parent, so a generic base can be declared first
//! and specialised later without ever being mounted itself.
//!
//! ```text
//!   Base ──┬── Left          leaves() = [Left, Right]
//!          └── Right
//! ```
//!
//! Each kind gets its own [`LeafRegistry`] instance, so an API and a Model
//! sharing a name never interfere with each other.
//!
//! ## Lifetime
//!
//! Registries are filled while the [`Catalog`](crate::api::Catalog) is being
//! built and are read-only afterwards; request handling reads them through
//! an `Arc` without any locking.

mod core;

pub use core::{LeafRegistry, RegistryError};
