use std::sync::Arc;

use rolegate_application::{
    AssignmentService, DirectoryAdminRepository, PermissionRecordStore, PolicyAdminRepository,
    ProfileService, TerritoryLookupService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub assignment_service: AssignmentService,
    pub profile_service: ProfileService,
    pub territory_lookup_service: TerritoryLookupService,
    pub policy_admin_repository: Arc<dyn PolicyAdminRepository>,
    pub directory_admin_repository: Arc<dyn DirectoryAdminRepository>,
    pub record_store: Arc<dyn PermissionRecordStore>,
}
