use rolegate_core::NonEmptyString;
use rolegate_domain::{
    PermissionRecord, RolePermissionProfile, ScopeRow, UserRoleAssignment,
};
use serde::{Deserialize, Serialize};

use rolegate_application::{ScopeRowInput, TerritorySummary};

/// One scope row in a request or response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeRowPayload {
    /// Target entity type.
    pub entity_type: String,
    /// Target entity identifier.
    pub entity_id: String,
}

impl From<&ScopeRow> for ScopeRowPayload {
    fn from(value: &ScopeRow) -> Self {
        Self {
            entity_type: value.entity_type().as_str().to_owned(),
            entity_id: value.entity_id().as_str().to_owned(),
        }
    }
}

impl From<ScopeRowPayload> for ScopeRowInput {
    fn from(value: ScopeRowPayload) -> Self {
        Self {
            entity_type: value.entity_type,
            entity_id: value.entity_id,
        }
    }
}

/// Request payload for creating a draft assignment.
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    /// User receiving the role.
    pub user: String,
    /// Role being assigned.
    pub role: String,
    /// Optional territory scope.
    pub territory: Option<String>,
    /// Optional company scope.
    pub company: Option<String>,
    /// Assignment-owned scope rows.
    #[serde(default)]
    pub detail_rows: Vec<ScopeRowPayload>,
}

/// Assignment projection returned to callers.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    /// Assignment identifier.
    pub id: String,
    /// Assigned user.
    pub user: String,
    /// Assigned role.
    pub role: String,
    /// Territory scope, when set.
    pub territory: Option<String>,
    /// Company scope, when set.
    pub company: Option<String>,
    /// Assignment-owned scope rows.
    pub detail_rows: Vec<ScopeRowPayload>,
    /// Lifecycle state.
    pub state: String,
}

impl From<UserRoleAssignment> for AssignmentResponse {
    fn from(value: UserRoleAssignment) -> Self {
        Self {
            id: value.id().to_string(),
            user: value.user().as_str().to_owned(),
            role: value.role().as_str().to_owned(),
            territory: value.territory().map(|territory| territory.as_str().to_owned()),
            company: value.company().map(|company| company.as_str().to_owned()),
            detail_rows: value.detail_rows().iter().map(ScopeRowPayload::from).collect(),
            state: value.state().as_str().to_owned(),
        }
    }
}

/// Request payload for creating a draft profile.
#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    /// Role the profile grants for.
    pub role: String,
    /// Rows granted to every active assignment of the role.
    #[serde(default)]
    pub detail_rows: Vec<ScopeRowPayload>,
}

/// Profile projection returned to callers.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Profile identifier.
    pub id: String,
    /// Role the profile grants for.
    pub role: String,
    /// Profile detail rows.
    pub detail_rows: Vec<ScopeRowPayload>,
    /// Lifecycle state.
    pub state: String,
}

impl From<RolePermissionProfile> for ProfileResponse {
    fn from(value: RolePermissionProfile) -> Self {
        Self {
            id: value.id().to_string(),
            role: value.role().as_str().to_owned(),
            detail_rows: value.detail_rows().iter().map(ScopeRowPayload::from).collect(),
            state: value.state().as_str().to_owned(),
        }
    }
}

/// Request payload for configuring a role policy.
#[derive(Debug, Deserialize)]
pub struct SavePolicyRequest {
    /// Whether the role tolerates other active assignments for the same user.
    pub overlappable: bool,
    /// Enforced quota; zero or absent means unenforced.
    pub number_of_actors: Option<u32>,
    /// Default territory-type scope dimension.
    pub territory_type: Option<String>,
    /// Scope whitelist rows.
    #[serde(default)]
    pub scope_rows: Vec<ScopeRowPayload>,
}

/// Policy projection returned to callers.
#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    /// Constrained role name.
    pub role: String,
    /// Whether the role tolerates other active assignments for the same user.
    pub overlappable: bool,
    /// Configured number of actors.
    pub number_of_actors: Option<u32>,
    /// Default territory-type scope dimension.
    pub territory_type: Option<String>,
    /// Scope whitelist rows.
    pub scope_rows: Vec<ScopeRowPayload>,
}

impl From<rolegate_domain::RoleLevelPolicy> for PolicyResponse {
    fn from(value: rolegate_domain::RoleLevelPolicy) -> Self {
        Self {
            role: value.role().as_str().to_owned(),
            overlappable: value.overlappable(),
            number_of_actors: value.number_of_actors(),
            territory_type: value
                .territory_type()
                .map(|territory_type| territory_type.as_str().to_owned()),
            scope_rows: value.scope_rows().iter().map(ScopeRowPayload::from).collect(),
        }
    }
}

/// One declared link field in a schema request.
#[derive(Debug, Deserialize)]
pub struct LinkFieldPayload {
    /// Field name on the declaring entity type.
    pub field_name: String,
    /// Entity type the field links to.
    pub target_type: String,
}

/// Request payload replacing the declared link fields of an entity type.
#[derive(Debug, Deserialize)]
pub struct DeclareLinkFieldsRequest {
    /// Declared link fields.
    pub link_fields: Vec<LinkFieldPayload>,
}

/// Request payload creating or replacing one scoped entity record.
#[derive(Debug, Deserialize)]
pub struct UpsertEntityRequest {
    /// Link-field values of the record.
    #[serde(default)]
    pub fields: std::collections::BTreeMap<String, String>,
}

/// Permission record projection for downstream authorization checks.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    /// Record identifier.
    pub id: String,
    /// Granted user.
    pub user: String,
    /// Origin kind; always `assignment`.
    pub origin_kind: String,
    /// Owning assignment identifier.
    pub origin_id: String,
    /// Granted entity type, when this is an entity grant.
    pub entity_type: Option<String>,
    /// Granted entity identifier, when this is an entity grant.
    pub entity_id: Option<String>,
    /// True when the record grants a concrete entity.
    pub is_entity_grant: bool,
    /// True when the record grants role membership.
    pub is_role_grant: bool,
    /// Granted role name, when this is a role grant.
    pub role_name: Option<String>,
}

impl From<PermissionRecord> for RecordResponse {
    fn from(value: PermissionRecord) -> Self {
        Self {
            id: value.id().to_string(),
            user: value.user().as_str().to_owned(),
            origin_kind: value.origin().kind().to_owned(),
            origin_id: value.origin().assignment_id().to_string(),
            entity_type: value.entity_type().map(NonEmptyString::as_str).map(str::to_owned),
            entity_id: value.entity_id().map(NonEmptyString::as_str).map(str::to_owned),
            is_entity_grant: value.is_entity_grant(),
            is_role_grant: value.is_role_grant(),
            role_name: value.role_name().map(NonEmptyString::as_str).map(str::to_owned),
        }
    }
}

/// Query parameters for assignment listings.
#[derive(Debug, Deserialize)]
pub struct AssignmentListParams {
    /// Optional user filter.
    pub user: Option<String>,
    /// Optional role filter.
    pub role: Option<String>,
    /// Optional lifecycle state filter.
    pub state: Option<String>,
}

/// Query parameters for profile listings.
#[derive(Debug, Deserialize)]
pub struct ProfileListParams {
    /// Optional role filter.
    pub role: Option<String>,
    /// Optional lifecycle state filter.
    pub state: Option<String>,
}

/// Query parameters for permission record listings.
#[derive(Debug, Deserialize)]
pub struct RecordListParams {
    /// Optional granted-user filter.
    pub user: Option<String>,
    /// Optional owning-assignment filter.
    pub origin: Option<uuid::Uuid>,
    /// Optional granted entity type filter.
    pub entity_type: Option<String>,
    /// Optional granted entity identifier filter.
    pub entity_id: Option<String>,
    /// Optional role-grant flag filter.
    pub role_grants: Option<bool>,
}

/// Query parameters for the territory lookup endpoint.
#[derive(Debug, Deserialize)]
pub struct TerritoryLookupParams {
    /// Optional role whose policy scopes the lookup.
    pub role: Option<String>,
    /// Optional substring filter on territory name.
    pub q: Option<String>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
    /// Rows skipped for offset pagination.
    pub offset: Option<usize>,
}

/// Territory row returned by the lookup endpoint.
#[derive(Debug, Serialize)]
pub struct TerritoryResponse {
    /// Territory name.
    pub name: String,
    /// Territory classification, when recorded.
    pub territory_type: Option<String>,
}

impl From<TerritorySummary> for TerritoryResponse {
    fn from(value: TerritorySummary) -> Self {
        Self {
            name: value.name,
            territory_type: value.territory_type,
        }
    }
}
