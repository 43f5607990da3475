//! Domain entities and invariants for the Rolegate assignment engine.

#![forbid(unsafe_code)]

mod assignment;
mod directory;
mod lifecycle;
mod policy;
mod profile;
mod record;
mod violation;

pub use assignment::UserRoleAssignment;
pub use directory::{
    COMPANY_ENTITY, LinkFieldCatalog, LinkFieldDeclaration, ScopeEntityRecord, TERRITORY_ENTITY,
    TERRITORY_TYPE_ENTITY,
};
pub use lifecycle::LifecycleState;
pub use policy::{RoleLevelPolicy, ScopeRow};
pub use profile::RolePermissionProfile;
pub use record::{GrantOrigin, PermissionRecord, RecordFilter};
pub use violation::PolicyViolation;
