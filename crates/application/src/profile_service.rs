use std::sync::Arc;

use rolegate_core::{AppError, AppResult, ProfileId};
use rolegate_domain::{
    GrantOrigin, LifecycleState, PermissionRecord, PolicyViolation, RecordFilter,
    RolePermissionProfile, ScopeRow, UserRoleAssignment,
};

use crate::assignment_ports::{
    AssignmentQuery, AssignmentRepository, CreateProfileInput, PermissionRecordStore,
    ProfileQuery, ProfileRepository, RecordChangeSet,
};
use crate::transition::TransitionResult;
use crate::transition_serializer::TransitionSerializer;

/// Owns the single active-profile-per-role invariant and cascades profile
/// grants to every active assignment of the role.
///
/// Cascades never re-validate assignments and never touch grants the profile
/// did not contribute: creation appends exactly one record per assignment per
/// profile detail row, removal deletes by exact (origin, entity) match.
#[derive(Clone)]
pub struct ProfileService {
    assignments: Arc<dyn AssignmentRepository>,
    profiles: Arc<dyn ProfileRepository>,
    records: Arc<dyn PermissionRecordStore>,
    serializer: Arc<TransitionSerializer>,
}

impl ProfileService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        profiles: Arc<dyn ProfileRepository>,
        records: Arc<dyn PermissionRecordStore>,
        serializer: Arc<TransitionSerializer>,
    ) -> Self {
        Self {
            assignments,
            profiles,
            records,
            serializer,
        }
    }

    /// Creates a new draft profile.
    pub async fn create(&self, input: CreateProfileInput) -> AppResult<RolePermissionProfile> {
        let detail_rows = input
            .detail_rows
            .into_iter()
            .map(|row| ScopeRow::new(row.entity_type, row.entity_id))
            .collect::<AppResult<Vec<_>>>()?;

        let profile = RolePermissionProfile::new(input.role, detail_rows)?;
        self.profiles.insert_profile(profile.clone()).await?;
        Ok(profile)
    }

    /// Loads one profile.
    pub async fn get(&self, id: ProfileId) -> AppResult<RolePermissionProfile> {
        self.require_profile(id).await
    }

    /// Lists profiles matching the query.
    pub async fn list(&self, query: ProfileQuery) -> AppResult<Vec<RolePermissionProfile>> {
        self.profiles.list_profiles(query).await
    }

    /// Checks the one-active-profile-per-role invariant without committing
    /// anything.
    pub async fn validate_uniqueness(&self, id: ProfileId) -> TransitionResult<()> {
        let profile = self.require_profile(id).await?;
        self.check_uniqueness(&profile).await
    }

    /// Activates a draft profile and cascades its detail rows to every active
    /// assignment of the role, as one atomic unit.
    pub async fn activate(&self, id: ProfileId) -> TransitionResult<()> {
        let profile = self.require_profile(id).await?;
        let _guard = self.serializer.acquire(profile_key(&profile)).await;

        let profile = self.require_profile(id).await?;
        profile
            .state()
            .ensure_can_activate(&format!("profile '{id}'"))?;
        self.check_uniqueness(&profile).await?;

        let mut change_set = RecordChangeSet::new();
        for assignment in self.active_assignments(&profile).await? {
            let origin = GrantOrigin::assignment(assignment.id());
            for row in profile.detail_rows() {
                change_set.append(PermissionRecord::entity_grant(
                    assignment.user().clone(),
                    origin,
                    row.entity_type().clone(),
                    row.entity_id().clone(),
                ));
            }
        }
        self.records.commit(change_set).await?;

        self.profiles
            .update_profile_state(id, LifecycleState::Active)
            .await?;
        Ok(())
    }

    /// Retracts an active profile and removes the exact records its cascade
    /// contributed, as one atomic unit. Never blocked by policy.
    pub async fn retract(&self, id: ProfileId) -> TransitionResult<()> {
        let profile = self.require_profile(id).await?;
        let _guard = self.serializer.acquire(profile_key(&profile)).await;

        let profile = self.require_profile(id).await?;
        profile
            .state()
            .ensure_can_retract(&format!("profile '{id}'"))?;

        let mut change_set = RecordChangeSet::new();
        for assignment in self.active_assignments(&profile).await? {
            for row in profile.detail_rows() {
                let matching = self
                    .records
                    .find(
                        RecordFilter::by_origin(assignment.id())
                            .with_entity(row.entity_type().as_str(), row.entity_id().as_str()),
                    )
                    .await?;
                for record in matching {
                    change_set.remove(record.id());
                }
            }
        }
        self.records.commit(change_set).await?;

        self.profiles
            .update_profile_state(id, LifecycleState::Retracted)
            .await?;
        Ok(())
    }

    async fn check_uniqueness(&self, profile: &RolePermissionProfile) -> TransitionResult<()> {
        let competing = self
            .profiles
            .list_profiles(ProfileQuery {
                role: Some(profile.role().as_str().to_owned()),
                state: Some(LifecycleState::Active),
                exclude: Some(profile.id()),
            })
            .await?;

        if competing.is_empty() {
            Ok(())
        } else {
            Err(PolicyViolation::DuplicateProfile {
                role: profile.role().as_str().to_owned(),
            }
            .into())
        }
    }

    async fn active_assignments(
        &self,
        profile: &RolePermissionProfile,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        self.assignments
            .list_assignments(AssignmentQuery {
                role: Some(profile.role().as_str().to_owned()),
                state: Some(LifecycleState::Active),
                ..AssignmentQuery::default()
            })
            .await
    }

    async fn require_profile(&self, id: ProfileId) -> AppResult<RolePermissionProfile> {
        self.profiles
            .find_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile '{id}' does not exist")))
    }
}

fn profile_key(profile: &RolePermissionProfile) -> String {
    format!("profile:{}", profile.role())
}
