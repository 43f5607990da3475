//! Application services and ports for the Rolegate assignment engine.

#![forbid(unsafe_code)]

mod assignment_ports;
mod assignment_service;
mod profile_service;
mod territory_lookup;
mod transition;
mod transition_serializer;

#[cfg(test)]
mod test_support;

pub use assignment_ports::{
    AssignmentQuery, AssignmentRepository, CreateAssignmentInput, CreateProfileInput,
    DirectoryAdminRepository, EntityDirectory, PermissionRecordStore, PolicyAdminRepository,
    PolicyRegistry, ProfileQuery, ProfileRepository, RecordChangeSet, ScopeRowInput,
    TerritoryMatch, TerritoryQuery, TerritorySummary,
};
pub use assignment_service::AssignmentService;
pub use profile_service::ProfileService;
pub use territory_lookup::TerritoryLookupService;
pub use transition::{TransitionError, TransitionResult};
pub use transition_serializer::TransitionSerializer;
