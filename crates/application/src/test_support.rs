//! Shared in-memory fakes for service tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rolegate_core::{AppError, AppResult, AssignmentId, ProfileId};
use rolegate_domain::{
    LifecycleState, LinkFieldCatalog, PermissionRecord, RecordFilter, RoleLevelPolicy,
    RolePermissionProfile, ScopeEntityRecord, ScopeRow, TERRITORY_ENTITY, TERRITORY_TYPE_ENTITY,
    UserRoleAssignment,
};
use tokio::sync::RwLock;

use crate::assignment_ports::{
    AssignmentQuery, AssignmentRepository, EntityDirectory, PermissionRecordStore, PolicyRegistry,
    ProfileQuery, ProfileRepository, RecordChangeSet, TerritoryMatch, TerritoryQuery,
    TerritorySummary,
};
use crate::assignment_service::AssignmentService;
use crate::profile_service::ProfileService;
use crate::territory_lookup::TerritoryLookupService;
use crate::transition_serializer::TransitionSerializer;

pub(crate) fn policy(
    role: &str,
    overlappable: bool,
    quota: Option<u32>,
    territory_type: Option<&str>,
    scope_rows: Vec<ScopeRow>,
) -> RoleLevelPolicy {
    RoleLevelPolicy::new(
        role,
        overlappable,
        quota,
        territory_type.map(str::to_owned),
        scope_rows,
    )
    .unwrap_or_else(|_| unreachable!())
}

pub(crate) fn scope_row(entity_type: &str, entity_id: &str) -> ScopeRow {
    ScopeRow::new(entity_type, entity_id).unwrap_or_else(|_| unreachable!())
}

#[derive(Default)]
pub(crate) struct FakeAssignmentStore {
    assignments: RwLock<Vec<UserRoleAssignment>>,
    profiles: RwLock<Vec<RolePermissionProfile>>,
}

#[async_trait]
impl AssignmentRepository for FakeAssignmentStore {
    async fn insert_assignment(&self, assignment: UserRoleAssignment) -> AppResult<()> {
        self.assignments.write().await.push(assignment);
        Ok(())
    }

    async fn find_assignment(&self, id: AssignmentId) -> AppResult<Option<UserRoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .find(|assignment| assignment.id() == id)
            .cloned())
    }

    async fn list_assignments(&self, query: AssignmentQuery) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|assignment| assignment_matches(assignment, &query))
            .cloned()
            .collect())
    }

    async fn update_assignment_state(
        &self,
        id: AssignmentId,
        state: LifecycleState,
    ) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        let stored = assignments
            .iter_mut()
            .find(|assignment| assignment.id() == id)
            .ok_or_else(|| AppError::NotFound(format!("assignment '{id}' does not exist")))?;
        *stored = UserRoleAssignment::restore(
            stored.id(),
            stored.user().as_str(),
            stored.role().as_str(),
            stored.territory().map(|t| t.as_str().to_owned()),
            stored.company().map(|c| c.as_str().to_owned()),
            stored.detail_rows().to_vec(),
            state,
        )?;
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for FakeAssignmentStore {
    async fn insert_profile(&self, profile: RolePermissionProfile) -> AppResult<()> {
        self.profiles.write().await.push(profile);
        Ok(())
    }

    async fn find_profile(&self, id: ProfileId) -> AppResult<Option<RolePermissionProfile>> {
        Ok(self
            .profiles
            .read()
            .await
            .iter()
            .find(|profile| profile.id() == id)
            .cloned())
    }

    async fn list_profiles(&self, query: ProfileQuery) -> AppResult<Vec<RolePermissionProfile>> {
        Ok(self
            .profiles
            .read()
            .await
            .iter()
            .filter(|profile| profile_matches(profile, &query))
            .cloned()
            .collect())
    }

    async fn update_profile_state(&self, id: ProfileId, state: LifecycleState) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        let stored = profiles
            .iter_mut()
            .find(|profile| profile.id() == id)
            .ok_or_else(|| AppError::NotFound(format!("profile '{id}' does not exist")))?;
        *stored = RolePermissionProfile::restore(
            stored.id(),
            stored.role().as_str(),
            stored.detail_rows().to_vec(),
            state,
        )?;
        Ok(())
    }
}

pub(crate) fn assignment_matches(
    assignment: &UserRoleAssignment,
    query: &AssignmentQuery,
) -> bool {
    if let Some(user) = &query.user {
        if assignment.user().as_str() != user {
            return false;
        }
    }
    if let Some(role) = &query.role {
        if assignment.role().as_str() != role {
            return false;
        }
    }
    if let Some(territory) = &query.territory {
        let matches = match territory {
            TerritoryMatch::Is(value) => {
                assignment.territory().map(|t| t.as_str()) == Some(value.as_str())
            }
            TerritoryMatch::Unset => assignment.territory().is_none(),
        };
        if !matches {
            return false;
        }
    }
    if let Some(state) = query.state {
        if assignment.state() != state {
            return false;
        }
    }
    if let Some(excluded) = query.exclude {
        if assignment.id() == excluded {
            return false;
        }
    }

    true
}

pub(crate) fn profile_matches(profile: &RolePermissionProfile, query: &ProfileQuery) -> bool {
    if let Some(role) = &query.role {
        if profile.role().as_str() != role {
            return false;
        }
    }
    if let Some(state) = query.state {
        if profile.state() != state {
            return false;
        }
    }
    if let Some(excluded) = query.exclude {
        if profile.id() == excluded {
            return false;
        }
    }

    true
}

#[derive(Default)]
pub(crate) struct FakePolicyStore {
    policies: RwLock<HashMap<String, RoleLevelPolicy>>,
}

#[async_trait]
impl PolicyRegistry for FakePolicyStore {
    async fn get(&self, role: &str) -> AppResult<Option<RoleLevelPolicy>> {
        Ok(self.policies.read().await.get(role).cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeRecordStore {
    records: RwLock<Vec<PermissionRecord>>,
    fail_next: RwLock<bool>,
}

impl FakeRecordStore {
    pub(crate) async fn fail_next_commit(&self) {
        *self.fail_next.write().await = true;
    }

    pub(crate) async fn find_all(&self, filter: RecordFilter) -> Vec<PermissionRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PermissionRecordStore for FakeRecordStore {
    async fn commit(&self, change_set: RecordChangeSet) -> AppResult<()> {
        if std::mem::take(&mut *self.fail_next.write().await) {
            return Err(AppError::Internal("record store unavailable".to_owned()));
        }

        let mut records = self.records.write().await;
        records.retain(|record| !change_set.removals().contains(&record.id()));
        records.extend(change_set.appends().iter().cloned());
        Ok(())
    }

    async fn find(&self, filter: RecordFilter) -> AppResult<Vec<PermissionRecord>> {
        Ok(self.find_all(filter).await)
    }
}

pub(crate) struct FakeDirectory {
    entities: RwLock<HashMap<(String, String), ScopeEntityRecord>>,
    catalog: RwLock<LinkFieldCatalog>,
}

impl Default for FakeDirectory {
    fn default() -> Self {
        // The territory-type link is part of the startup catalog in every
        // deployment; tests get it for free.
        let mut catalog = LinkFieldCatalog::new();
        catalog.declare(TERRITORY_ENTITY, "territory_type", TERRITORY_TYPE_ENTITY);
        Self {
            entities: RwLock::new(HashMap::new()),
            catalog: RwLock::new(catalog),
        }
    }
}

#[async_trait]
impl EntityDirectory for FakeDirectory {
    async fn load(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> AppResult<Option<ScopeEntityRecord>> {
        Ok(self
            .entities
            .read()
            .await
            .get(&(entity_type.to_owned(), entity_id.to_owned()))
            .cloned())
    }

    async fn link_fields(&self, entity_type: &str, target_type: &str) -> AppResult<Vec<String>> {
        Ok(self.catalog.read().await.link_fields(entity_type, target_type))
    }

    async fn list_territories(&self, query: TerritoryQuery) -> AppResult<Vec<TerritorySummary>> {
        let entities = self.entities.read().await;
        let mut territories: Vec<TerritorySummary> = entities
            .values()
            .filter(|record| record.entity_type().as_str() == TERRITORY_ENTITY)
            .filter(|record| match &query.territory_type {
                Some(territory_type) => record.field("territory_type") == Some(territory_type),
                None => true,
            })
            .filter(|record| match &query.name_contains {
                Some(text) => record
                    .entity_id()
                    .as_str()
                    .to_lowercase()
                    .contains(&text.to_lowercase()),
                None => true,
            })
            .map(|record| TerritorySummary {
                name: record.entity_id().as_str().to_owned(),
                territory_type: record.field("territory_type").map(str::to_owned),
            })
            .collect();
        territories.sort_by(|left, right| left.name.cmp(&right.name));

        let limit = if query.limit == 0 { usize::MAX } else { query.limit };
        Ok(territories.into_iter().skip(query.offset).take(limit).collect())
    }
}

pub(crate) struct TestWorld {
    pub(crate) store: Arc<FakeAssignmentStore>,
    pub(crate) policies: Arc<FakePolicyStore>,
    pub(crate) records: Arc<FakeRecordStore>,
    pub(crate) directory: Arc<FakeDirectory>,
    pub(crate) serializer: Arc<TransitionSerializer>,
}

impl TestWorld {
    pub(crate) fn new() -> Self {
        Self {
            store: Arc::new(FakeAssignmentStore::default()),
            policies: Arc::new(FakePolicyStore::default()),
            records: Arc::new(FakeRecordStore::default()),
            directory: Arc::new(FakeDirectory::default()),
            serializer: Arc::new(TransitionSerializer::new()),
        }
    }

    pub(crate) fn assignment_service(&self) -> AssignmentService {
        AssignmentService::new(
            self.store.clone(),
            self.store.clone(),
            self.policies.clone(),
            self.records.clone(),
            self.directory.clone(),
            self.serializer.clone(),
        )
    }

    pub(crate) fn profile_service(&self) -> ProfileService {
        ProfileService::new(
            self.store.clone(),
            self.store.clone(),
            self.records.clone(),
            self.serializer.clone(),
        )
    }

    pub(crate) fn lookup_service(&self) -> TerritoryLookupService {
        TerritoryLookupService::new(self.policies.clone(), self.directory.clone())
    }

    pub(crate) async fn seed_policy(&self, policy: RoleLevelPolicy) {
        self.policies
            .policies
            .write()
            .await
            .insert(policy.role().as_str().to_owned(), policy);
    }

    pub(crate) async fn seed_territory(&self, name: &str, territory_type: Option<&str>) {
        let mut fields = BTreeMap::new();
        if let Some(territory_type) = territory_type {
            fields.insert("territory_type".to_owned(), territory_type.to_owned());
        }
        let record = ScopeEntityRecord::new(TERRITORY_ENTITY, name, fields)
            .unwrap_or_else(|_| unreachable!());
        self.directory
            .entities
            .write()
            .await
            .insert((TERRITORY_ENTITY.to_owned(), name.to_owned()), record);
    }

    pub(crate) async fn seed_entity(&self, entity_type: &str, entity_id: &str) {
        self.seed_entity_with_links(entity_type, entity_id, &[]).await;
    }

    pub(crate) async fn seed_entity_with_links(
        &self,
        entity_type: &str,
        entity_id: &str,
        links: &[(&str, &str)],
    ) {
        let fields = links
            .iter()
            .map(|(field, value)| ((*field).to_owned(), (*value).to_owned()))
            .collect();
        let record = ScopeEntityRecord::new(entity_type, entity_id, fields)
            .unwrap_or_else(|_| unreachable!());
        self.directory
            .entities
            .write()
            .await
            .insert((entity_type.to_owned(), entity_id.to_owned()), record);
    }

    pub(crate) async fn declare_link_field(
        &self,
        entity_type: &str,
        field_name: &str,
        target_type: &str,
    ) {
        self.directory
            .catalog
            .write()
            .await
            .declare(entity_type, field_name, target_type);
    }

    pub(crate) async fn seed_active_profile(
        &self,
        role: &str,
        rows: &[(&str, &str)],
    ) -> ProfileId {
        let detail_rows = rows
            .iter()
            .map(|(entity_type, entity_id)| scope_row(entity_type, entity_id))
            .collect();
        let profile = RolePermissionProfile::new(role, detail_rows)
            .unwrap_or_else(|_| unreachable!());
        let profile =
            RolePermissionProfile::restore(profile.id(), role, profile.detail_rows().to_vec(), LifecycleState::Active)
                .unwrap_or_else(|_| unreachable!());
        let id = profile.id();
        self.store.profiles.write().await.push(profile);
        id
    }

    pub(crate) async fn records_of(&self, id: AssignmentId) -> Vec<PermissionRecord> {
        self.records.find_all(RecordFilter::by_origin(id)).await
    }
}
