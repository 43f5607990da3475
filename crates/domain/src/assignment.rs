use rolegate_core::{AppResult, AssignmentId, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::directory::TERRITORY_ENTITY;
use crate::lifecycle::LifecycleState;
use crate::policy::ScopeRow;

/// One user holding one role, optionally scoped to a territory and company.
///
/// Created as a draft by an administrator and mutated only through lifecycle
/// transitions; never partially active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    id: AssignmentId,
    user: NonEmptyString,
    role: NonEmptyString,
    territory: Option<NonEmptyString>,
    company: Option<NonEmptyString>,
    detail_rows: Vec<ScopeRow>,
    state: LifecycleState,
}

impl UserRoleAssignment {
    /// Creates a new draft assignment.
    pub fn new(
        user: impl Into<String>,
        role: impl Into<String>,
        territory: Option<String>,
        company: Option<String>,
        detail_rows: Vec<ScopeRow>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: AssignmentId::new(),
            user: NonEmptyString::new(user)?,
            role: NonEmptyString::new(role)?,
            territory: territory.map(NonEmptyString::new).transpose()?,
            company: company.map(NonEmptyString::new).transpose()?,
            detail_rows,
            state: LifecycleState::Draft,
        })
    }

    /// Rehydrates a persisted assignment.
    pub fn restore(
        id: AssignmentId,
        user: impl Into<String>,
        role: impl Into<String>,
        territory: Option<String>,
        company: Option<String>,
        detail_rows: Vec<ScopeRow>,
        state: LifecycleState,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            user: NonEmptyString::new(user)?,
            role: NonEmptyString::new(role)?,
            territory: territory.map(NonEmptyString::new).transpose()?,
            company: company.map(NonEmptyString::new).transpose()?,
            detail_rows,
            state,
        })
    }

    /// Returns the assignment identifier.
    #[must_use]
    pub fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the assigned user.
    #[must_use]
    pub fn user(&self) -> &NonEmptyString {
        &self.user
    }

    /// Returns the assigned role.
    #[must_use]
    pub fn role(&self) -> &NonEmptyString {
        &self.role
    }

    /// Returns the territory scope, when set.
    #[must_use]
    pub fn territory(&self) -> Option<&NonEmptyString> {
        self.territory.as_ref()
    }

    /// Returns the company scope, when set.
    #[must_use]
    pub fn company(&self) -> Option<&NonEmptyString> {
        self.company.as_ref()
    }

    /// Returns the assignment's own scope rows.
    #[must_use]
    pub fn detail_rows(&self) -> &[ScopeRow] {
        &self.detail_rows
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Builds the candidate list for scope validation: the territory as a
    /// territory reference, prepended to the assignment's own scope rows.
    pub fn scope_candidates(&self) -> AppResult<Vec<ScopeRow>> {
        let mut candidates = Vec::with_capacity(self.detail_rows.len() + 1);
        if let Some(territory) = &self.territory {
            candidates.push(ScopeRow::new(TERRITORY_ENTITY, territory.as_str())?);
        }
        candidates.extend(self.detail_rows.iter().cloned());
        Ok(candidates)
    }
}
