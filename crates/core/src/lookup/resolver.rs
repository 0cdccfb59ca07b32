//! Resolution of lookup targets to operation identifiers.
//!
//! A lookup names the operation it calls by action name and arguments. The
//! identifier the designer needs is derived from that operation's friendly
//! name, so the declaration is matched against every operation signature
//! in the annotation index.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annotations::{AnnotationIndex, OperationAnnotations};
use crate::error::{Error, Result};
use crate::naming::operation_id;

/// What to do when a lookup names no operation, or several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupResolution {
    /// Fall back to the declared action name.
    #[default]
    Permissive,
    /// Fail the build.
    Strict,
}

/// Why a lookup kept its declared action name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No operation has the requested signature.
    NoMatch,
    /// This many operations have the requested signature.
    Ambiguous(usize),
    /// The single match declares no friendly name.
    NoFriendlyName,
}

/// Outcome of resolving a lookup target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one operation matched; this is its identifier.
    Matched(String),
    /// The declared action name was kept.
    Fallback {
        /// The declared action name, unchanged.
        operation_id: String,
        /// Why no identifier was derived.
        reason: FallbackReason,
    },
}

impl Resolution {
    /// Identifier to write into the lookup record.
    pub fn operation_id(&self) -> &str {
        match self {
            Resolution::Matched(id) | Resolution::Fallback { operation_id: id, .. } => id,
        }
    }

    /// Whether the declared action name was kept.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback { .. })
    }
}

/// Matches lookup declarations against the operations of one API.
#[derive(Debug, Clone, Copy)]
pub struct SiblingResolver<'a> {
    index: &'a AnnotationIndex,
    mode: LookupResolution,
}

impl<'a> SiblingResolver<'a> {
    /// Resolver over `index`.
    pub fn new(index: &'a AnnotationIndex, mode: LookupResolution) -> Self {
        Self { index, mode }
    }

    /// Annotations this resolver matches against.
    pub fn index(&self) -> &'a AnnotationIndex {
        self.index
    }

    /// Resolve `action` called with `parameter_names` to an operation identifier.
    ///
    /// An operation matches when its action name equals `action` exactly
    /// (case-sensitive) and its sorted parameter names equal the sorted
    /// `parameter_names`. In [`LookupResolution::Strict`] mode zero or
    /// several matches fail the build; otherwise they fall back to `action`.
    pub fn resolve(&self, action: &str, parameter_names: &[&str]) -> Result<Resolution> {
        let mut wanted: Vec<&str> = parameter_names.to_vec();
        wanted.sort_unstable();

        let candidates: Vec<&OperationAnnotations> = self
            .index
            .operations
            .iter()
            .filter(|op| op.action == action && op.sorted_parameter_names() == wanted)
            .collect();

        let fallback = |reason| Resolution::Fallback {
            operation_id: action.to_string(),
            reason,
        };

        let resolution = match candidates.as_slice() {
            [] => {
                if self.mode == LookupResolution::Strict {
                    return Err(Error::UnresolvedLookupOperation {
                        action: action.to_string(),
                        parameters: owned(&wanted),
                    });
                }
                fallback(FallbackReason::NoMatch)
            }
            [single] => match single.metadata.as_ref().and_then(|m| m.friendly_name()) {
                Some(name) => Resolution::Matched(operation_id(name)),
                None => fallback(FallbackReason::NoFriendlyName),
            },
            several => {
                if self.mode == LookupResolution::Strict {
                    return Err(Error::AmbiguousLookupOperation {
                        action: action.to_string(),
                        parameters: owned(&wanted),
                        candidates: several
                            .iter()
                            .map(|op| format!("{} {}", op.method, op.path))
                            .collect(),
                    });
                }
                fallback(FallbackReason::Ambiguous(several.len()))
            }
        };

        match &resolution {
            Resolution::Matched(id) => {
                debug!(action, operation_id = %id, "Resolved lookup operation.");
            }
            Resolution::Fallback { reason, .. } => {
                warn!(
                    action,
                    parameters = ?wanted,
                    reason = ?reason,
                    "Lookup operation not resolved, keeping action name."
                );
            }
        }

        Ok(resolution)
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}
