use std::collections::BTreeMap;

use rolegate_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::directory::TERRITORY_TYPE_ENTITY;

/// A (target-entity-type, target-entity-id) pair granting or restricting
/// access to one concrete entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRow {
    entity_type: NonEmptyString,
    entity_id: NonEmptyString,
}

impl ScopeRow {
    /// Creates a validated scope row.
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            entity_type: NonEmptyString::new(entity_type)?,
            entity_id: NonEmptyString::new(entity_id)?,
        })
    }

    /// Returns the target entity type.
    #[must_use]
    pub fn entity_type(&self) -> &NonEmptyString {
        &self.entity_type
    }

    /// Returns the target entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> &NonEmptyString {
        &self.entity_id
    }
}

/// Per-role constraints consulted when an assignment activates.
///
/// Owned by a policy administrator; the engine only ever reads it. A role
/// without a policy is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLevelPolicy {
    role: NonEmptyString,
    overlappable: bool,
    number_of_actors: Option<u32>,
    territory_type: Option<NonEmptyString>,
    scope_rows: Vec<ScopeRow>,
}

impl RoleLevelPolicy {
    /// Creates a validated role policy.
    pub fn new(
        role: impl Into<String>,
        overlappable: bool,
        number_of_actors: Option<u32>,
        territory_type: Option<String>,
        scope_rows: Vec<ScopeRow>,
    ) -> AppResult<Self> {
        Ok(Self {
            role: NonEmptyString::new(role)?,
            overlappable,
            number_of_actors,
            territory_type: territory_type.map(NonEmptyString::new).transpose()?,
            scope_rows,
        })
    }

    /// Returns the constrained role name.
    #[must_use]
    pub fn role(&self) -> &NonEmptyString {
        &self.role
    }

    /// Returns whether a user holding this role may hold other active
    /// assignments at the same time.
    #[must_use]
    pub fn overlappable(&self) -> bool {
        self.overlappable
    }

    /// Returns the configured number of actors as entered, zero included.
    #[must_use]
    pub fn number_of_actors(&self) -> Option<u32> {
        self.number_of_actors
    }

    /// Returns the enforced quota, when configured. Zero means unenforced.
    #[must_use]
    pub fn quota(&self) -> Option<u32> {
        self.number_of_actors.filter(|limit| *limit > 0)
    }

    /// Returns the default territory-type scope dimension.
    #[must_use]
    pub fn territory_type(&self) -> Option<&NonEmptyString> {
        self.territory_type.as_ref()
    }

    /// Returns the ordered scope whitelist rows.
    #[must_use]
    pub fn scope_rows(&self) -> &[ScopeRow] {
        &self.scope_rows
    }

    /// Builds the allowed-values map for scope validation: one entry per
    /// declared dimension, keyed by target entity type, holding the permitted
    /// entity identifiers.
    ///
    /// The configured territory type contributes an implicit dimension on the
    /// territory-type entity. Duplicate identifiers within a dimension
    /// collapse to one.
    #[must_use]
    pub fn allowed_values(&self) -> BTreeMap<String, Vec<String>> {
        let mut allowed: BTreeMap<String, Vec<String>> = BTreeMap::new();

        if let Some(territory_type) = &self.territory_type {
            allowed
                .entry(TERRITORY_TYPE_ENTITY.to_owned())
                .or_default()
                .push(territory_type.as_str().to_owned());
        }

        for row in &self.scope_rows {
            let values = allowed.entry(row.entity_type().as_str().to_owned()).or_default();
            if !values.iter().any(|value| value == row.entity_id().as_str()) {
                values.push(row.entity_id().as_str().to_owned());
            }
        }

        allowed
    }
}
