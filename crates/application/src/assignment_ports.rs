use async_trait::async_trait;
use rolegate_core::{AppResult, AssignmentId, ProfileId, RecordId};
use rolegate_domain::{
    LifecycleState, LinkFieldDeclaration, PermissionRecord, RecordFilter, RoleLevelPolicy,
    RolePermissionProfile, ScopeEntityRecord, UserRoleAssignment,
};

/// Input payload for creating a draft assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssignmentInput {
    /// User receiving the role.
    pub user: String,
    /// Role being assigned.
    pub role: String,
    /// Optional territory scope.
    pub territory: Option<String>,
    /// Optional company scope.
    pub company: Option<String>,
    /// Assignment-owned scope rows.
    pub detail_rows: Vec<ScopeRowInput>,
}

/// Input payload for creating a draft profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProfileInput {
    /// Role the profile grants for.
    pub role: String,
    /// Rows granted to every active assignment of the role.
    pub detail_rows: Vec<ScopeRowInput>,
}

/// One scope row in an input payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRowInput {
    /// Target entity type.
    pub entity_type: String,
    /// Target entity identifier.
    pub entity_id: String,
}

/// Territory equality constraint for assignment queries.
///
/// Quota counting groups assignments by the raw territory value, so "no
/// territory" is its own group and must be expressible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerritoryMatch {
    /// Assignments scoped to this exact territory.
    Is(String),
    /// Assignments with no territory scope.
    Unset,
}

/// Equality filter over assignments. Unset dimensions match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
    /// Match on assigned user.
    pub user: Option<String>,
    /// Match on assigned role.
    pub role: Option<String>,
    /// Match on territory scope.
    pub territory: Option<TerritoryMatch>,
    /// Match on lifecycle state.
    pub state: Option<LifecycleState>,
    /// Exclude one assignment by identifier.
    pub exclude: Option<AssignmentId>,
}

/// Equality filter over profiles. Unset dimensions match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileQuery {
    /// Match on profile role.
    pub role: Option<String>,
    /// Match on lifecycle state.
    pub state: Option<LifecycleState>,
    /// Exclude one profile by identifier.
    pub exclude: Option<ProfileId>,
}

/// Repository port for user role assignments.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persists a new draft assignment.
    async fn insert_assignment(&self, assignment: UserRoleAssignment) -> AppResult<()>;

    /// Loads one assignment by identifier.
    async fn find_assignment(&self, id: AssignmentId) -> AppResult<Option<UserRoleAssignment>>;

    /// Lists assignments matching every set query dimension.
    async fn list_assignments(&self, query: AssignmentQuery) -> AppResult<Vec<UserRoleAssignment>>;

    /// Persists a lifecycle state change.
    async fn update_assignment_state(
        &self,
        id: AssignmentId,
        state: LifecycleState,
    ) -> AppResult<()>;
}

/// Repository port for role permission profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Persists a new draft profile.
    async fn insert_profile(&self, profile: RolePermissionProfile) -> AppResult<()>;

    /// Loads one profile by identifier.
    async fn find_profile(&self, id: ProfileId) -> AppResult<Option<RolePermissionProfile>>;

    /// Lists profiles matching every set query dimension.
    async fn list_profiles(&self, query: ProfileQuery) -> AppResult<Vec<RolePermissionProfile>>;

    /// Persists a lifecycle state change.
    async fn update_profile_state(&self, id: ProfileId, state: LifecycleState) -> AppResult<()>;
}

/// Read-only lookup of per-role constraints.
#[async_trait]
pub trait PolicyRegistry: Send + Sync {
    /// Returns the policy configured for a role; absent means the role is
    /// unconstrained, never an error.
    async fn get(&self, role: &str) -> AppResult<Option<RoleLevelPolicy>>;
}

/// Administrative write port feeding the policy registry. The engine itself
/// never writes policy.
#[async_trait]
pub trait PolicyAdminRepository: Send + Sync {
    /// Creates or replaces the policy for a role.
    async fn upsert_policy(&self, policy: RoleLevelPolicy) -> AppResult<()>;

    /// Lists all configured policies.
    async fn list_policies(&self) -> AppResult<Vec<RoleLevelPolicy>>;
}

/// Pending permission-record writes and deletes collected during one
/// lifecycle transition and committed as a single atomic unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordChangeSet {
    appends: Vec<PermissionRecord>,
    removals: Vec<RecordId>,
}

impl RecordChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a record append.
    pub fn append(&mut self, record: PermissionRecord) {
        self.appends.push(record);
    }

    /// Queues a record removal.
    pub fn remove(&mut self, id: RecordId) {
        self.removals.push(id);
    }

    /// True when the change set carries no work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.appends.is_empty() && self.removals.is_empty()
    }

    /// Returns the queued appends.
    #[must_use]
    pub fn appends(&self) -> &[PermissionRecord] {
        &self.appends
    }

    /// Returns the queued removals.
    #[must_use]
    pub fn removals(&self) -> &[RecordId] {
        &self.removals
    }
}

/// Append/retract ledger of atomic permission grants.
#[async_trait]
pub trait PermissionRecordStore: Send + Sync {
    /// Applies every append and removal in the change set as one atomic unit;
    /// on failure nothing is applied. Appends carry no uniqueness constraint
    /// (duplicate grants are permitted); removing an absent identifier is a
    /// no-op, not an error.
    async fn commit(&self, change_set: RecordChangeSet) -> AppResult<()>;

    /// Returns records matching every set filter dimension.
    async fn find(&self, filter: RecordFilter) -> AppResult<Vec<PermissionRecord>>;
}

/// Query over directory territories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerritoryQuery {
    /// Restrict to territories of this type.
    pub territory_type: Option<String>,
    /// Case-insensitive substring match on territory name.
    pub name_contains: Option<String>,
    /// Maximum rows returned; zero means unbounded.
    pub limit: usize,
    /// Rows skipped for offset pagination.
    pub offset: usize,
}

/// Territory row returned by the lookup query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerritorySummary {
    /// Territory name.
    pub name: String,
    /// Territory classification, when recorded.
    pub territory_type: Option<String>,
}

/// Read access to dynamically-typed scoped entities and their declared link
/// fields.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Loads one scoped entity record.
    async fn load(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> AppResult<Option<ScopeEntityRecord>>;

    /// Returns the names of fields on `entity_type` declared as links to
    /// `target_type`. Consulted at validation time; never a hardcoded list.
    async fn link_fields(&self, entity_type: &str, target_type: &str) -> AppResult<Vec<String>>;

    /// Lists directory territories for the lookup endpoint.
    async fn list_territories(&self, query: TerritoryQuery) -> AppResult<Vec<TerritorySummary>>;
}

/// Administrative write port for seeding the entity directory.
#[async_trait]
pub trait DirectoryAdminRepository: Send + Sync {
    /// Creates or replaces one scoped entity record.
    async fn upsert_entity(&self, record: ScopeEntityRecord) -> AppResult<()>;

    /// Replaces the declared link fields of an entity type.
    async fn declare_link_fields(
        &self,
        entity_type: &str,
        declarations: Vec<LinkFieldDeclaration>,
    ) -> AppResult<()>;
}
