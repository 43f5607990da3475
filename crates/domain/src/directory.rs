use std::collections::BTreeMap;

use rolegate_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Entity type of territories referenced by assignments and policies.
pub const TERRITORY_ENTITY: &str = "Territory";

/// Entity type of companies referenced by assignments.
pub const COMPANY_ENTITY: &str = "Company";

/// Entity type of territory classifications; the implicit dimension added by
/// a policy's configured territory type.
pub const TERRITORY_TYPE_ENTITY: &str = "TerritoryType";

/// A dynamically-typed entity visible to scope validation.
///
/// Carries only the link-field values of the underlying record; scope checks
/// resolve declared link fields against this bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeEntityRecord {
    entity_type: NonEmptyString,
    entity_id: NonEmptyString,
    fields: BTreeMap<String, String>,
}

impl ScopeEntityRecord {
    /// Creates a validated scoped entity record.
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) -> AppResult<Self> {
        Ok(Self {
            entity_type: NonEmptyString::new(entity_type)?,
            entity_id: NonEmptyString::new(entity_id)?,
            fields,
        })
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> &NonEmptyString {
        &self.entity_type
    }

    /// Returns the entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> &NonEmptyString {
        &self.entity_id
    }

    /// Returns all stored link-field values.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Resolves the current value of one link field, when present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Declared table of link fields per entity type, keyed by link target type.
///
/// Replaces runtime schema reflection: each scoped entity type declares, at
/// startup, which of its fields are links and what type they point at. Scope
/// validation asks "which fields on type X link to type Y" and resolves those
/// fields on the candidate record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFieldCatalog {
    entries: BTreeMap<String, Vec<LinkFieldDeclaration>>,
}

/// One declared link field on an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFieldDeclaration {
    /// Field name on the declaring entity type.
    pub field_name: String,
    /// Entity type the field links to.
    pub target_type: String,
}

impl LinkFieldCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a link field on an entity type.
    pub fn declare(
        &mut self,
        entity_type: impl Into<String>,
        field_name: impl Into<String>,
        target_type: impl Into<String>,
    ) {
        self.entries
            .entry(entity_type.into())
            .or_default()
            .push(LinkFieldDeclaration {
                field_name: field_name.into(),
                target_type: target_type.into(),
            });
    }

    /// Returns the names of fields on `entity_type` declared as links to
    /// `target_type`.
    #[must_use]
    pub fn link_fields(&self, entity_type: &str, target_type: &str) -> Vec<String> {
        self.entries
            .get(entity_type)
            .map(|declarations| {
                declarations
                    .iter()
                    .filter(|declaration| declaration.target_type == target_type)
                    .map(|declaration| declaration.field_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns all declarations for an entity type.
    #[must_use]
    pub fn declarations(&self, entity_type: &str) -> &[LinkFieldDeclaration] {
        self.entries
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Removes every declaration for an entity type.
    pub fn clear_entity_type(&mut self, entity_type: &str) {
        self.entries.remove(entity_type);
    }
}
