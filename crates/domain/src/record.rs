use rolegate_core::{AssignmentId, NonEmptyString, RecordId};
use serde::{Deserialize, Serialize};

/// The entity a permission record traces back to.
///
/// Every record is owned by exactly one assignment; profile cascades act on
/// assignments' records rather than owning records themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrantOrigin {
    /// The record was created by activating a user role assignment.
    Assignment {
        /// Identifier of the owning assignment.
        assignment_id: AssignmentId,
    },
}

impl GrantOrigin {
    /// Creates an assignment origin.
    #[must_use]
    pub fn assignment(assignment_id: AssignmentId) -> Self {
        Self::Assignment { assignment_id }
    }

    /// Returns a stable storage value for the origin kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Assignment { .. } => "assignment",
        }
    }

    /// Returns the owning assignment identifier.
    #[must_use]
    pub fn assignment_id(&self) -> AssignmentId {
        match self {
            Self::Assignment { assignment_id } => *assignment_id,
        }
    }
}

/// An atomic permission grant queryable by downstream authorization checks.
///
/// Destroyed only by its owning assignment's retraction or by a cascading
/// profile retraction matching it exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    id: RecordId,
    user: NonEmptyString,
    origin: GrantOrigin,
    entity_type: Option<NonEmptyString>,
    entity_id: Option<NonEmptyString>,
    is_role_grant: bool,
    role_name: Option<NonEmptyString>,
}

impl PermissionRecord {
    /// Creates a role grant for the owning assignment's user.
    #[must_use]
    pub fn role_grant(user: NonEmptyString, origin: GrantOrigin, role: NonEmptyString) -> Self {
        Self {
            id: RecordId::new(),
            user,
            origin,
            entity_type: None,
            entity_id: None,
            is_role_grant: true,
            role_name: Some(role),
        }
    }

    /// Creates a grant on one concrete entity.
    #[must_use]
    pub fn entity_grant(
        user: NonEmptyString,
        origin: GrantOrigin,
        entity_type: NonEmptyString,
        entity_id: NonEmptyString,
    ) -> Self {
        Self {
            id: RecordId::new(),
            user,
            origin,
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            is_role_grant: false,
            role_name: None,
        }
    }

    /// Rehydrates a persisted record.
    #[must_use]
    pub fn restore(
        id: RecordId,
        user: NonEmptyString,
        origin: GrantOrigin,
        entity_type: Option<NonEmptyString>,
        entity_id: Option<NonEmptyString>,
        is_role_grant: bool,
        role_name: Option<NonEmptyString>,
    ) -> Self {
        Self {
            id,
            user,
            origin,
            entity_type,
            entity_id,
            is_role_grant,
            role_name,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the granted user.
    #[must_use]
    pub fn user(&self) -> &NonEmptyString {
        &self.user
    }

    /// Returns the owning origin.
    #[must_use]
    pub fn origin(&self) -> GrantOrigin {
        self.origin
    }

    /// Returns the granted entity type, when this is an entity grant.
    #[must_use]
    pub fn entity_type(&self) -> Option<&NonEmptyString> {
        self.entity_type.as_ref()
    }

    /// Returns the granted entity identifier, when this is an entity grant.
    #[must_use]
    pub fn entity_id(&self) -> Option<&NonEmptyString> {
        self.entity_id.as_ref()
    }

    /// True when the record grants a concrete entity.
    #[must_use]
    pub fn is_entity_grant(&self) -> bool {
        self.entity_id.is_some()
    }

    /// True when the record grants role membership.
    #[must_use]
    pub fn is_role_grant(&self) -> bool {
        self.is_role_grant
    }

    /// Returns the granted role name, when this is a role grant.
    #[must_use]
    pub fn role_name(&self) -> Option<&NonEmptyString> {
        self.role_name.as_ref()
    }
}

/// Equality filter over permission records.
///
/// Unset dimensions match everything; set dimensions must match exactly. Used
/// by cascading removals for exact matching and by the query surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Match on granted user.
    pub user: Option<String>,
    /// Match on owning assignment.
    pub origin_assignment: Option<AssignmentId>,
    /// Match on granted entity type.
    pub entity_type: Option<String>,
    /// Match on granted entity identifier.
    pub entity_id: Option<String>,
    /// Match on the role-grant flag.
    pub is_role_grant: Option<bool>,
}

impl RecordFilter {
    /// Creates a filter matching every record of one owning assignment.
    #[must_use]
    pub fn by_origin(assignment_id: AssignmentId) -> Self {
        Self {
            origin_assignment: Some(assignment_id),
            ..Self::default()
        }
    }

    /// Creates a filter matching every record granted to one user.
    #[must_use]
    pub fn by_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }

    /// Restricts the filter to one granted entity.
    #[must_use]
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Returns whether a record satisfies every set dimension.
    #[must_use]
    pub fn matches(&self, record: &PermissionRecord) -> bool {
        if let Some(user) = &self.user {
            if record.user().as_str() != user {
                return false;
            }
        }
        if let Some(assignment_id) = self.origin_assignment {
            if record.origin().assignment_id() != assignment_id {
                return false;
            }
        }
        if let Some(entity_type) = &self.entity_type {
            if record.entity_type().map(NonEmptyString::as_str) != Some(entity_type.as_str()) {
                return false;
            }
        }
        if let Some(entity_id) = &self.entity_id {
            if record.entity_id().map(NonEmptyString::as_str) != Some(entity_id.as_str()) {
                return false;
            }
        }
        if let Some(is_role_grant) = self.is_role_grant {
            if record.is_role_grant() != is_role_grant {
                return false;
            }
        }

        true
    }
}
