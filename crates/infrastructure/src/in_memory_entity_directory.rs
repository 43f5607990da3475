use std::collections::HashMap;

use async_trait::async_trait;
use rolegate_application::{
    DirectoryAdminRepository, EntityDirectory, TerritoryQuery, TerritorySummary,
};
use rolegate_core::AppResult;
use rolegate_domain::{LinkFieldCatalog, LinkFieldDeclaration, ScopeEntityRecord, TERRITORY_ENTITY};
use tokio::sync::RwLock;

/// In-memory scoped-entity directory for tests and local runs.
///
/// Territory listings are derived from entity records of the territory type;
/// the territory classification is read from the `territory_type` link field.
#[derive(Debug, Default)]
pub struct InMemoryEntityDirectory {
    entities: RwLock<HashMap<(String, String), ScopeEntityRecord>>,
    catalog: RwLock<LinkFieldCatalog>,
}

impl InMemoryEntityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory with a pre-declared link-field catalog.
    #[must_use]
    pub fn with_catalog(catalog: LinkFieldCatalog) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            catalog: RwLock::new(catalog),
        }
    }
}

#[async_trait]
impl EntityDirectory for InMemoryEntityDirectory {
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
        Ok(self
            .catalog
            .read()
            .await
            .link_fields(entity_type, target_type))
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
        Ok(territories
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl DirectoryAdminRepository for InMemoryEntityDirectory {
    async fn upsert_entity(&self, record: ScopeEntityRecord) -> AppResult<()> {
        self.entities.write().await.insert(
            (
                record.entity_type().as_str().to_owned(),
                record.entity_id().as_str().to_owned(),
            ),
            record,
        );
        Ok(())
    }

    async fn declare_link_fields(
        &self,
        entity_type: &str,
        declarations: Vec<LinkFieldDeclaration>,
    ) -> AppResult<()> {
        let mut catalog = self.catalog.write().await;
        catalog.clear_entity_type(entity_type);
        for declaration in declarations {
            catalog.declare(entity_type, declaration.field_name, declaration.target_type);
        }
        Ok(())
    }
}
