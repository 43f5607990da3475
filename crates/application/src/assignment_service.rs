use std::sync::Arc;

use rolegate_core::{AppError, AppResult, AssignmentId, NonEmptyString};
use rolegate_domain::{
    COMPANY_ENTITY, GrantOrigin, LifecycleState, PermissionRecord, PolicyViolation, RecordFilter,
    ScopeRow, TERRITORY_ENTITY, UserRoleAssignment,
};

use crate::assignment_ports::{
    AssignmentQuery, AssignmentRepository, CreateAssignmentInput, EntityDirectory,
    PermissionRecordStore, PolicyRegistry, ProfileQuery, ProfileRepository, RecordChangeSet,
    TerritoryMatch,
};
use crate::transition::TransitionResult;
use crate::transition_serializer::TransitionSerializer;

/// Validates and activates or retracts a single user's role assignment.
///
/// The central orchestrator: consumes the policy registry, writes through the
/// permission record store, and is cascaded into by profile transitions.
#[derive(Clone)]
pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepository>,
    profiles: Arc<dyn ProfileRepository>,
    policies: Arc<dyn PolicyRegistry>,
    records: Arc<dyn PermissionRecordStore>,
    directory: Arc<dyn EntityDirectory>,
    serializer: Arc<TransitionSerializer>,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        profiles: Arc<dyn ProfileRepository>,
        policies: Arc<dyn PolicyRegistry>,
        records: Arc<dyn PermissionRecordStore>,
        directory: Arc<dyn EntityDirectory>,
        serializer: Arc<TransitionSerializer>,
    ) -> Self {
        Self {
            assignments,
            profiles,
            policies,
            records,
            directory,
            serializer,
        }
    }

    /// Creates a new draft assignment.
    pub async fn create(&self, input: CreateAssignmentInput) -> AppResult<UserRoleAssignment> {
        let detail_rows = input
            .detail_rows
            .into_iter()
            .map(|row| ScopeRow::new(row.entity_type, row.entity_id))
            .collect::<AppResult<Vec<_>>>()?;

        let assignment = UserRoleAssignment::new(
            input.user,
            input.role,
            input.territory,
            input.company,
            detail_rows,
        )?;

        self.assignments.insert_assignment(assignment.clone()).await?;
        Ok(assignment)
    }

    /// Loads one assignment.
    pub async fn get(&self, id: AssignmentId) -> AppResult<UserRoleAssignment> {
        self.require_assignment(id).await
    }

    /// Lists assignments matching the query.
    pub async fn list(&self, query: AssignmentQuery) -> AppResult<Vec<UserRoleAssignment>> {
        self.assignments.list_assignments(query).await
    }

    /// Runs draft→active validation without committing anything.
    pub async fn validate(&self, id: AssignmentId) -> TransitionResult<()> {
        let assignment = self.require_assignment(id).await?;
        self.run_validation(&assignment).await
    }

    /// Activates a draft assignment: validation plus permission creation as
    /// one atomic unit. On any failure the assignment stays draft and no
    /// record is persisted.
    pub async fn activate(&self, id: AssignmentId) -> TransitionResult<()> {
        let assignment = self.require_assignment(id).await?;
        let _guard = self.serializer.acquire(activation_key(&assignment)).await;

        // Re-read inside the critical section; a competing transition for the
        // same counted set may have landed while we waited.
        let assignment = self.require_assignment(id).await?;
        assignment
            .state()
            .ensure_can_activate(&format!("assignment '{id}'"))?;

        self.run_validation(&assignment).await?;

        let mut change_set = RecordChangeSet::new();
        for record in self.permission_appends(&assignment).await? {
            change_set.append(record);
        }
        self.records.commit(change_set).await?;

        self.assignments
            .update_assignment_state(id, LifecycleState::Active)
            .await?;
        Ok(())
    }

    /// Retracts an active assignment, removing every record it owns.
    /// Retraction is never blocked by policy.
    pub async fn retract(&self, id: AssignmentId) -> TransitionResult<()> {
        let assignment = self.require_assignment(id).await?;
        let _guard = self.serializer.acquire(activation_key(&assignment)).await;

        let assignment = self.require_assignment(id).await?;
        assignment
            .state()
            .ensure_can_retract(&format!("assignment '{id}'"))?;

        self.remove_permissions(id).await?;

        self.assignments
            .update_assignment_state(id, LifecycleState::Retracted)
            .await?;
        Ok(())
    }

    /// Emits the permission records derived from an assignment: its role
    /// grant, territory and company grants, its own scope rows, then the
    /// detail rows of the currently active profile for the role. Duplicate
    /// tuples are permitted. Callers run validation first.
    pub async fn create_permissions(&self, id: AssignmentId) -> AppResult<()> {
        let assignment = self.require_assignment(id).await?;

        let mut change_set = RecordChangeSet::new();
        for record in self.permission_appends(&assignment).await? {
            change_set.append(record);
        }
        self.records.commit(change_set).await
    }

    /// Removes every permission record whose origin is this assignment.
    /// Idempotent: repeated calls and calls with zero records succeed with no
    /// effect.
    pub async fn remove_permissions(&self, id: AssignmentId) -> AppResult<()> {
        self.require_assignment(id).await?;

        let owned = self.records.find(RecordFilter::by_origin(id)).await?;
        let mut change_set = RecordChangeSet::new();
        for record in owned {
            change_set.remove(record.id());
        }
        self.records.commit(change_set).await
    }

    async fn require_assignment(&self, id: AssignmentId) -> AppResult<UserRoleAssignment> {
        self.assignments
            .find_assignment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("assignment '{id}' does not exist")))
    }

    async fn run_validation(&self, assignment: &UserRoleAssignment) -> TransitionResult<()> {
        let siblings = self
            .assignments
            .list_assignments(AssignmentQuery {
                user: Some(assignment.user().as_str().to_owned()),
                state: Some(LifecycleState::Active),
                exclude: Some(assignment.id()),
                ..AssignmentQuery::default()
            })
            .await?;

        for sibling in &siblings {
            if let Some(policy) = self.policies.get(sibling.role().as_str()).await? {
                if !policy.overlappable() {
                    return Err(PolicyViolation::Overlap {
                        user: assignment.user().as_str().to_owned(),
                    }
                    .into());
                }
            }
        }

        let Some(policy) = self.policies.get(assignment.role().as_str()).await? else {
            return Ok(());
        };

        if let Some(limit) = policy.quota() {
            let territory = match assignment.territory() {
                Some(territory) => TerritoryMatch::Is(territory.as_str().to_owned()),
                None => TerritoryMatch::Unset,
            };
            let active = self
                .assignments
                .list_assignments(AssignmentQuery {
                    role: Some(assignment.role().as_str().to_owned()),
                    territory: Some(territory),
                    state: Some(LifecycleState::Active),
                    exclude: Some(assignment.id()),
                    ..AssignmentQuery::default()
                })
                .await?;

            // The candidate counts as already activated; the transition fails
            // only past the configured limit.
            let count = active.len().saturating_add(1);
            if count > limit as usize {
                return Err(PolicyViolation::QuotaExceeded {
                    role: assignment.role().as_str().to_owned(),
                    limit,
                }
                .into());
            }
        }

        if !policy.overlappable() && !siblings.is_empty() {
            return Err(PolicyViolation::Overlap {
                user: assignment.user().as_str().to_owned(),
            }
            .into());
        }

        let allowed = policy.allowed_values();
        if allowed.is_empty() {
            return Ok(());
        }

        for candidate in assignment.scope_candidates()? {
            let record = self
                .directory
                .load(candidate.entity_type().as_str(), candidate.entity_id().as_str())
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "{} '{}' does not exist",
                        candidate.entity_type(),
                        candidate.entity_id()
                    ))
                })?;

            for (dimension, values) in &allowed {
                let fields = self
                    .directory
                    .link_fields(candidate.entity_type().as_str(), dimension)
                    .await?;

                for field in fields {
                    let in_allowed = record
                        .field(&field)
                        .is_some_and(|value| values.iter().any(|allowed| allowed == value));
                    if !in_allowed {
                        return Err(PolicyViolation::ScopeViolation {
                            entity_type: candidate.entity_type().as_str().to_owned(),
                            entity_id: candidate.entity_id().as_str().to_owned(),
                            dimension: dimension.clone(),
                            allowed: values.clone(),
                        }
                        .into());
                    }
                }
            }
        }

        Ok(())
    }

    async fn permission_appends(
        &self,
        assignment: &UserRoleAssignment,
    ) -> AppResult<Vec<PermissionRecord>> {
        let origin = GrantOrigin::assignment(assignment.id());
        let user = assignment.user().clone();
        let mut appends = Vec::new();

        appends.push(PermissionRecord::role_grant(
            user.clone(),
            origin,
            assignment.role().clone(),
        ));

        if let Some(territory) = assignment.territory() {
            appends.push(PermissionRecord::entity_grant(
                user.clone(),
                origin,
                NonEmptyString::new(TERRITORY_ENTITY)?,
                territory.clone(),
            ));
        }

        if let Some(company) = assignment.company() {
            appends.push(PermissionRecord::entity_grant(
                user.clone(),
                origin,
                NonEmptyString::new(COMPANY_ENTITY)?,
                company.clone(),
            ));
        }

        for row in assignment.detail_rows() {
            appends.push(PermissionRecord::entity_grant(
                user.clone(),
                origin,
                row.entity_type().clone(),
                row.entity_id().clone(),
            ));
        }

        // At most one active profile per role; its rows ride along with every
        // assignment activation.
        let active_profiles = self
            .profiles
            .list_profiles(ProfileQuery {
                role: Some(assignment.role().as_str().to_owned()),
                state: Some(LifecycleState::Active),
                exclude: None,
            })
            .await?;
        if let Some(profile) = active_profiles.first() {
            for row in profile.detail_rows() {
                appends.push(PermissionRecord::entity_grant(
                    user.clone(),
                    origin,
                    row.entity_type().clone(),
                    row.entity_id().clone(),
                ));
            }
        }

        Ok(appends)
    }
}

fn activation_key(assignment: &UserRoleAssignment) -> String {
    match assignment.territory() {
        Some(territory) => format!("assignment:{}:{territory}", assignment.role()),
        None => format!("assignment:{}:", assignment.role()),
    }
}

#[cfg(test)]
mod tests {
    use rolegate_core::AppError;
    use rolegate_domain::{LifecycleState, PolicyViolation, RecordFilter};

    use crate::assignment_ports::{CreateAssignmentInput, ScopeRowInput};
    use crate::test_support::{TestWorld, policy, scope_row};
    use crate::transition::TransitionError;

    fn input(user: &str, role: &str, territory: Option<&str>) -> CreateAssignmentInput {
        CreateAssignmentInput {
            user: user.to_owned(),
            role: role.to_owned(),
            territory: territory.map(str::to_owned),
            company: None,
            detail_rows: Vec::new(),
        }
    }

    #[tokio::test]
    async fn activation_emits_role_territory_and_detail_grants() {
        let world = TestWorld::new();
        world.seed_territory("T-001", Some("Zone")).await;
        world.seed_entity("Warehouse", "WH-01").await;
        let service = world.assignment_service();

        let assignment = service
            .create(CreateAssignmentInput {
                user: "amira@example.test".to_owned(),
                role: "Area Manager".to_owned(),
                territory: Some("T-001".to_owned()),
                company: Some("ACME".to_owned()),
                detail_rows: vec![ScopeRowInput {
                    entity_type: "Warehouse".to_owned(),
                    entity_id: "WH-01".to_owned(),
                }],
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(service.activate(assignment.id()).await.is_ok());

        let records = world.records_of(assignment.id()).await;
        assert_eq!(records.len(), 4);
        assert!(records[0].is_role_grant());
        assert_eq!(records[1].entity_id().map(|id| id.as_str()), Some("T-001"));
        assert_eq!(records[2].entity_id().map(|id| id.as_str()), Some("ACME"));
        assert_eq!(records[3].entity_id().map(|id| id.as_str()), Some("WH-01"));

        let stored = service.get(assignment.id()).await;
        assert_eq!(stored.map(|a| a.state()).ok(), Some(LifecycleState::Active));
    }

    #[tokio::test]
    async fn activation_includes_active_profile_rows() {
        let world = TestWorld::new();
        world.seed_active_profile("Area Manager", &[("Warehouse", "WH-09")]).await;
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(assignment.id()).await.is_ok());

        let records = world.records_of(assignment.id()).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].entity_id().map(|id| id.as_str()), Some("WH-09"));
    }

    #[tokio::test]
    async fn second_activation_conflicts() {
        let world = TestWorld::new();
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(assignment.id()).await.is_ok());

        let second = service.activate(assignment.id()).await;
        assert!(matches!(
            second,
            Err(TransitionError::App(AppError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn retracted_assignment_cannot_reactivate() {
        let world = TestWorld::new();
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(assignment.id()).await.is_ok());
        assert!(service.retract(assignment.id()).await.is_ok());

        let reactivation = service.activate(assignment.id()).await;
        assert!(matches!(
            reactivation,
            Err(TransitionError::App(AppError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn overlap_rejected_when_sibling_role_forbids_it() {
        let world = TestWorld::new();
        world.seed_policy(policy("Cashier", false, None, None, Vec::new())).await;
        let service = world.assignment_service();

        let first = service
            .create(input("amira@example.test", "Cashier", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(first.id()).await.is_ok());

        // The second assignment's own role is unconstrained; the sibling's
        // policy still forbids the overlap.
        let second = service
            .create(input("amira@example.test", "Auditor", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        let result = service.activate(second.id()).await;

        assert!(matches!(
            result,
            Err(TransitionError::Policy(PolicyViolation::Overlap { .. }))
        ));
        assert!(world.records_of(second.id()).await.is_empty());
    }

    #[tokio::test]
    async fn overlap_rejected_by_own_non_overlappable_role() {
        let world = TestWorld::new();
        world.seed_policy(policy("Cashier", false, None, None, Vec::new())).await;
        let service = world.assignment_service();

        let first = service
            .create(input("amira@example.test", "Auditor", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(first.id()).await.is_ok());

        let second = service
            .create(input("amira@example.test", "Cashier", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        let result = service.activate(second.id()).await;

        assert!(matches!(
            result,
            Err(TransitionError::Policy(PolicyViolation::Overlap { .. }))
        ));
    }

    #[tokio::test]
    async fn quota_of_one_rejects_second_activation_in_territory() {
        let world = TestWorld::new();
        world
            .seed_policy(policy("Area Manager", true, Some(1), None, Vec::new()))
            .await;
        let service = world.assignment_service();

        let first = service
            .create(input("amira@example.test", "Area Manager", Some("T-001")))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(first.id()).await.is_ok());

        let second = service
            .create(input("basim@example.test", "Area Manager", Some("T-001")))
            .await
            .unwrap_or_else(|_| unreachable!());
        let result = service.activate(second.id()).await;

        assert!(matches!(
            result,
            Err(TransitionError::Policy(PolicyViolation::QuotaExceeded {
                limit: 1,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn quota_is_keyed_by_territory() {
        let world = TestWorld::new();
        world
            .seed_policy(policy("Area Manager", true, Some(1), None, Vec::new()))
            .await;
        let service = world.assignment_service();

        let first = service
            .create(input("amira@example.test", "Area Manager", Some("T-001")))
            .await
            .unwrap_or_else(|_| unreachable!());
        let second = service
            .create(input("basim@example.test", "Area Manager", Some("T-002")))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(service.activate(first.id()).await.is_ok());
        assert!(service.activate(second.id()).await.is_ok());
    }

    #[tokio::test]
    async fn scope_violation_on_wrong_territory_type() {
        let world = TestWorld::new();
        world
            .seed_policy(policy("Area Manager", true, None, Some("Zone-A"), Vec::new()))
            .await;
        world.seed_territory("T-900", Some("Zone-B")).await;
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", Some("T-900")))
            .await
            .unwrap_or_else(|_| unreachable!());
        let result = service.activate(assignment.id()).await;

        assert!(matches!(
            result,
            Err(TransitionError::Policy(PolicyViolation::ScopeViolation { .. }))
        ));
        assert!(world.records_of(assignment.id()).await.is_empty());
    }

    #[tokio::test]
    async fn matching_territory_type_passes_scope_check() {
        let world = TestWorld::new();
        world
            .seed_policy(policy("Area Manager", true, None, Some("Zone-A"), Vec::new()))
            .await;
        world.seed_territory("T-100", Some("Zone-A")).await;
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", Some("T-100")))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(service.activate(assignment.id()).await.is_ok());
    }

    #[tokio::test]
    async fn scope_check_restricts_detail_rows_by_whitelist() {
        let world = TestWorld::new();
        world
            .seed_policy(policy(
                "Area Manager",
                true,
                None,
                None,
                vec![scope_row("Company", "ACME")],
            ))
            .await;
        world
            .seed_entity_with_links("Warehouse", "WH-01", &[("company", "Globex")])
            .await;
        world.declare_link_field("Warehouse", "company", "Company").await;
        let service = world.assignment_service();

        let assignment = service
            .create(CreateAssignmentInput {
                user: "amira@example.test".to_owned(),
                role: "Area Manager".to_owned(),
                territory: None,
                company: None,
                detail_rows: vec![ScopeRowInput {
                    entity_type: "Warehouse".to_owned(),
                    entity_id: "WH-01".to_owned(),
                }],
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        let result = service.activate(assignment.id()).await;

        assert!(matches!(
            result,
            Err(TransitionError::Policy(PolicyViolation::ScopeViolation { .. }))
        ));
    }

    #[tokio::test]
    async fn missing_candidate_entity_is_not_found() {
        let world = TestWorld::new();
        world
            .seed_policy(policy("Area Manager", true, None, Some("Zone-A"), Vec::new()))
            .await;
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", Some("T-404")))
            .await
            .unwrap_or_else(|_| unreachable!());
        let result = service.activate(assignment.id()).await;

        assert!(matches!(
            result,
            Err(TransitionError::App(AppError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn remove_permissions_is_idempotent() {
        let world = TestWorld::new();
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(assignment.id()).await.is_ok());
        assert!(!world.records_of(assignment.id()).await.is_empty());

        assert!(service.remove_permissions(assignment.id()).await.is_ok());
        assert!(service.remove_permissions(assignment.id()).await.is_ok());
        assert!(world.records_of(assignment.id()).await.is_empty());
    }

    #[tokio::test]
    async fn create_then_remove_restores_prior_record_set() {
        let world = TestWorld::new();
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(service.create_permissions(assignment.id()).await.is_ok());
        assert!(service.remove_permissions(assignment.id()).await.is_ok());

        let remaining = world
            .records
            .find_all(RecordFilter::by_origin(assignment.id()))
            .await;
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn failed_record_commit_leaves_assignment_draft() {
        let world = TestWorld::new();
        let service = world.assignment_service();

        let assignment = service
            .create(input("amira@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());

        world.records.fail_next_commit().await;
        let result = service.activate(assignment.id()).await;

        assert!(matches!(
            result,
            Err(TransitionError::App(AppError::Internal(_)))
        ));
        let stored = service.get(assignment.id()).await;
        assert_eq!(stored.map(|a| a.state()).ok(), Some(LifecycleState::Draft));
        assert!(world.records_of(assignment.id()).await.is_empty());
    }

    #[tokio::test]
    async fn retraction_removes_only_own_records() {
        let world = TestWorld::new();
        let service = world.assignment_service();

        let kept = service
            .create(input("amira@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        let retracted = service
            .create(input("basim@example.test", "Area Manager", None))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(service.activate(kept.id()).await.is_ok());
        assert!(service.activate(retracted.id()).await.is_ok());

        assert!(service.retract(retracted.id()).await.is_ok());

        assert!(world.records_of(retracted.id()).await.is_empty());
        assert!(!world.records_of(kept.id()).await.is_empty());
        let stored = service.get(retracted.id()).await;
        assert_eq!(
            stored.map(|a| a.state()).ok(),
            Some(LifecycleState::Retracted)
        );
    }
}
