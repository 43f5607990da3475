use std::collections::HashMap;

use async_trait::async_trait;
use rolegate_application::{
    AssignmentQuery, AssignmentRepository, ProfileQuery, ProfileRepository, TerritoryMatch,
};
use rolegate_core::{AppError, AppResult, AssignmentId, ProfileId};
use rolegate_domain::{LifecycleState, RolePermissionProfile, UserRoleAssignment};
use tokio::sync::RwLock;

/// In-memory assignment repository for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentRepository {
    assignments: RwLock<Vec<UserRoleAssignment>>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn insert_assignment(&self, assignment: UserRoleAssignment) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        if assignments.iter().any(|stored| stored.id() == assignment.id()) {
            return Err(AppError::Conflict(format!(
                "assignment '{}' already exists",
                assignment.id()
            )));
        }

        assignments.push(assignment);
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
            .filter(|assignment| matches_assignment(assignment, &query))
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
            stored.territory().map(|territory| territory.as_str().to_owned()),
            stored.company().map(|company| company.as_str().to_owned()),
            stored.detail_rows().to_vec(),
            state,
        )?;
        Ok(())
    }
}

fn matches_assignment(assignment: &UserRoleAssignment, query: &AssignmentQuery) -> bool {
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

/// In-memory profile repository for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<ProfileId, RolePermissionProfile>>,
}

impl InMemoryProfileRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn insert_profile(&self, profile: RolePermissionProfile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.id()) {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                profile.id()
            )));
        }

        profiles.insert(profile.id(), profile);
        Ok(())
    }

    async fn find_profile(&self, id: ProfileId) -> AppResult<Option<RolePermissionProfile>> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn list_profiles(&self, query: ProfileQuery) -> AppResult<Vec<RolePermissionProfile>> {
        let profiles = self.profiles.read().await;
        let mut listed: Vec<RolePermissionProfile> = profiles
            .values()
            .filter(|profile| {
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
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.id().as_uuid().cmp(&right.id().as_uuid()));
        Ok(listed)
    }

    async fn update_profile_state(&self, id: ProfileId, state: LifecycleState) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        let stored = profiles
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("profile '{id}' does not exist")))?;

        let updated = RolePermissionProfile::restore(
            stored.id(),
            stored.role().as_str(),
            stored.detail_rows().to_vec(),
            state,
        )?;
        profiles.insert(id, updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rolegate_application::{
        AssignmentQuery, AssignmentRepository, ProfileQuery, ProfileRepository, TerritoryMatch,
    };
    use rolegate_domain::{LifecycleState, RolePermissionProfile, UserRoleAssignment};

    use super::{InMemoryAssignmentRepository, InMemoryProfileRepository};

    fn assignment(user: &str, role: &str, territory: Option<&str>) -> UserRoleAssignment {
        UserRoleAssignment::new(user, role, territory.map(str::to_owned), None, Vec::new())
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn territory_match_distinguishes_unset() {
        let repository = InMemoryAssignmentRepository::new();
        let scoped = assignment("amira", "Area Manager", Some("T-001"));
        let unscoped = assignment("basim", "Area Manager", None);
        repository
            .insert_assignment(scoped.clone())
            .await
            .unwrap_or_else(|_| unreachable!());
        repository
            .insert_assignment(unscoped.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        let unset_only = repository
            .list_assignments(AssignmentQuery {
                territory: Some(TerritoryMatch::Unset),
                ..AssignmentQuery::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(unset_only.len(), 1);
        assert_eq!(unset_only[0].id(), unscoped.id());
    }

    #[tokio::test]
    async fn state_update_is_persisted() {
        let repository = InMemoryAssignmentRepository::new();
        let stored = assignment("amira", "Area Manager", None);
        repository
            .insert_assignment(stored.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        repository
            .update_assignment_state(stored.id(), LifecycleState::Active)
            .await
            .unwrap_or_else(|_| unreachable!());

        let found = repository
            .find_assignment(stored.id())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(found.map(|a| a.state()), Some(LifecycleState::Active));
    }

    #[tokio::test]
    async fn profile_queries_filter_by_role_and_state() {
        let repository = InMemoryProfileRepository::new();
        let profile = RolePermissionProfile::new("Area Manager", Vec::new())
            .unwrap_or_else(|_| unreachable!());
        repository
            .insert_profile(profile.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        let active = repository
            .list_profiles(ProfileQuery {
                role: Some("Area Manager".to_owned()),
                state: Some(LifecycleState::Active),
                exclude: None,
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(active.is_empty());

        repository
            .update_profile_state(profile.id(), LifecycleState::Active)
            .await
            .unwrap_or_else(|_| unreachable!());
        let active = repository
            .list_profiles(ProfileQuery {
                role: Some("Area Manager".to_owned()),
                state: Some(LifecycleState::Active),
                exclude: None,
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(active.len(), 1);
    }
}
