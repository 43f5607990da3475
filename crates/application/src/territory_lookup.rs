use std::sync::Arc;

use rolegate_core::AppResult;

use crate::assignment_ports::{EntityDirectory, PolicyRegistry, TerritoryQuery, TerritorySummary};

/// Thin query service behind the territory lookup endpoint.
///
/// When a role filter is supplied and that role's policy configures a
/// territory type, results are restricted to territories of that type; a text
/// filter applies substring matching on the name. No side effects.
#[derive(Clone)]
pub struct TerritoryLookupService {
    policies: Arc<dyn PolicyRegistry>,
    directory: Arc<dyn EntityDirectory>,
}

impl TerritoryLookupService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(policies: Arc<dyn PolicyRegistry>, directory: Arc<dyn EntityDirectory>) -> Self {
        Self {
            policies,
            directory,
        }
    }

    /// Returns territories matching the optional role and text filters.
    pub async fn find_scoped_territories(
        &self,
        role: Option<&str>,
        text: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<TerritorySummary>> {
        let mut query = TerritoryQuery {
            limit,
            offset,
            ..TerritoryQuery::default()
        };

        if let Some(text) = text.filter(|text| !text.trim().is_empty()) {
            query.name_contains = Some(text.to_owned());
        }

        if let Some(role) = role {
            if let Some(policy) = self.policies.get(role).await? {
                if let Some(territory_type) = policy.territory_type() {
                    query.territory_type = Some(territory_type.as_str().to_owned());
                }
            }
        }

        self.directory.list_territories(query).await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{TestWorld, policy};

    #[tokio::test]
    async fn role_filter_restricts_to_policy_territory_type() {
        let world = TestWorld::new();
        world
            .seed_policy(policy("Area Manager", true, None, Some("Zone"), Vec::new()))
            .await;
        world.seed_territory("T-001", Some("Zone")).await;
        world.seed_territory("T-002", Some("Region")).await;
        let service = world.lookup_service();

        let territories = service
            .find_scoped_territories(Some("Area Manager"), None, 20, 0)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(territories.len(), 1);
        assert_eq!(territories[0].name, "T-001");
    }

    #[tokio::test]
    async fn unknown_role_applies_no_type_restriction() {
        let world = TestWorld::new();
        world.seed_territory("T-001", Some("Zone")).await;
        world.seed_territory("T-002", Some("Region")).await;
        let service = world.lookup_service();

        let territories = service
            .find_scoped_territories(Some("Auditor"), None, 20, 0)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(territories.len(), 2);
    }

    #[tokio::test]
    async fn text_filter_matches_substring_case_insensitively() {
        let world = TestWorld::new();
        world.seed_territory("North-East", Some("Zone")).await;
        world.seed_territory("North-West", Some("Zone")).await;
        world.seed_territory("South", Some("Zone")).await;
        let service = world.lookup_service();

        let territories = service
            .find_scoped_territories(None, Some("north"), 20, 0)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(territories.len(), 2);
    }

    #[tokio::test]
    async fn pagination_honors_limit_and_offset() {
        let world = TestWorld::new();
        world.seed_territory("T-001", Some("Zone")).await;
        world.seed_territory("T-002", Some("Zone")).await;
        world.seed_territory("T-003", Some("Zone")).await;
        let service = world.lookup_service();

        let page = service
            .find_scoped_territories(None, None, 2, 1)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "T-002");
        assert_eq!(page[1].name, "T-003");
    }
}
