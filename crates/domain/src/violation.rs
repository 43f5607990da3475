use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy constraint failures raised while validating a lifecycle transition.
///
/// All variants are user-facing: they block the transition entirely and are
/// never retried automatically. The caller corrects the input (for example by
/// retracting a conflicting assignment) and resubmits.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyViolation {
    /// The user already holds an active assignment and one of the involved
    /// roles forbids overlap.
    #[error("user '{user}' cannot hold more than one active role assignment")]
    Overlap {
        /// User whose assignments collide.
        user: String,
    },

    /// Activating would exceed the role's configured number of actors for the
    /// territory.
    #[error("role '{role}' is allowed for at most {limit} user(s)")]
    QuotaExceeded {
        /// Constrained role name.
        role: String,
        /// Configured quota.
        limit: u32,
    },

    /// A scoped entity resolved to a link value outside the policy whitelist.
    #[error("{entity_type} '{entity_id}' is only allowed for {dimension}: {allowed:?}")]
    ScopeViolation {
        /// Candidate entity type.
        entity_type: String,
        /// Candidate entity identifier.
        entity_id: String,
        /// Constrained dimension (link target entity type).
        dimension: String,
        /// Permitted values for the dimension.
        allowed: Vec<String>,
    },

    /// A second permission profile tried to activate for a role that already
    /// has an active one.
    #[error("role '{role}' already has an active permission profile")]
    DuplicateProfile {
        /// Role with the competing profiles.
        role: String,
    },
}
