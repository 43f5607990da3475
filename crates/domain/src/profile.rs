use rolegate_core::{AppResult, NonEmptyString, ProfileId};
use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleState;
use crate::policy::ScopeRow;

/// A per-role permission profile.
///
/// While active, every active assignment of the role receives one permission
/// record per detail row. At most one profile per role is active at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionProfile {
    id: ProfileId,
    role: NonEmptyString,
    detail_rows: Vec<ScopeRow>,
    state: LifecycleState,
}

impl RolePermissionProfile {
    /// Creates a new draft profile.
    pub fn new(role: impl Into<String>, detail_rows: Vec<ScopeRow>) -> AppResult<Self> {
        Ok(Self {
            id: ProfileId::new(),
            role: NonEmptyString::new(role)?,
            detail_rows,
            state: LifecycleState::Draft,
        })
    }

    /// Rehydrates a persisted profile.
    pub fn restore(
        id: ProfileId,
        role: impl Into<String>,
        detail_rows: Vec<ScopeRow>,
        state: LifecycleState,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            role: NonEmptyString::new(role)?,
            detail_rows,
            state,
        })
    }

    /// Returns the profile identifier.
    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    /// Returns the role this profile grants for.
    #[must_use]
    pub fn role(&self) -> &NonEmptyString {
        &self.role
    }

    /// Returns the rows granted to every active assignment of the role.
    #[must_use]
    pub fn detail_rows(&self) -> &[ScopeRow] {
        &self.detail_rows
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }
}
