use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use rolegate_application::{AssignmentQuery, ProfileQuery, ScopeRowInput};
use rolegate_core::{AssignmentId, ProfileId};
use rolegate_domain::LifecycleState;

use crate::dto::{
    AssignmentListParams, AssignmentResponse, CreateAssignmentRequest, CreateProfileRequest,
    DeclareLinkFieldsRequest, PolicyResponse, ProfileListParams, ProfileResponse,
    RecordListParams, RecordResponse, SavePolicyRequest, TerritoryLookupParams,
    TerritoryResponse, UpsertEntityRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

mod assignments;
mod directory;
mod health;
mod policies;
mod profiles;
mod records;
mod territories;

pub use assignments::{
    activate_assignment_handler, create_assignment_handler, get_assignment_handler,
    list_assignments_handler, retract_assignment_handler, validate_assignment_handler,
};
pub use directory::{declare_link_fields_handler, upsert_entity_handler};
pub use health::health_handler;
pub use policies::{list_policies_handler, save_policy_handler};
pub use profiles::{
    activate_profile_handler, create_profile_handler, get_profile_handler, list_profiles_handler,
    retract_profile_handler, validate_profile_handler,
};
pub use records::list_records_handler;
pub use territories::lookup_territories_handler;

fn parse_state(value: Option<&str>) -> ApiResult<Option<LifecycleState>> {
    value
        .map(LifecycleState::from_str)
        .transpose()
        .map_err(ApiError::from)
}
