//! Vendor-extension enrichment for OpenAPI documents.
//!
//! A host generates a plain OpenAPI draft and an [`AnnotationIndex`] of what
//! its source declares about operations, parameters and data types. This
//! crate rewrites the draft so a workflow designer can render it:
//!
//! - friendly names, descriptions and visibility tiers (`x-ms-summary`,
//!   `x-ms-visibility`)
//! - value lookups and dynamic schemas resolved against sibling operations
//!   (`x-ms-dynamic-values`, `x-ms-dynamic-schema`)
//! - polling and subscription trigger semantics (`x-ms-trigger`,
//!   `x-ms-notification-content`, `x-ms-notification-url`)
//! - a `default` response for every operation with a success response
//!
//! Start with [`enrich_json`] or [`enrich`].

#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

pub mod annotations;
pub mod decorate;
pub mod error;
pub mod lookup;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod spec;

pub use annotations::{AnnotationIndex, TypeRef};
pub use error::{Error, Result};
pub use lookup::{LookupResolution, parse_parameter_spec};
pub use pipeline::{EnrichReport, PipelineOptions, enrich, enrich_json};
pub use registry::{RegistryGenerator, SchemaGenerator, SchemaRegistry};
pub use spec::Document;
