//! Cross-operation lookups.
//!
//! - `params`: parsing of declared lookup arguments
//! - `resolver`: matching a declared lookup target to a sibling operation

mod params;
mod resolver;

pub use params::{ParamValue, ParameterMap, parse_parameter_spec};
pub use resolver::{FallbackReason, LookupResolution, Resolution, SiblingResolver};
