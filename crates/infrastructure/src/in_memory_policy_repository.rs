use std::collections::BTreeMap;

use async_trait::async_trait;
use rolegate_application::{PolicyAdminRepository, PolicyRegistry};
use rolegate_core::AppResult;
use rolegate_domain::RoleLevelPolicy;
use tokio::sync::RwLock;

/// In-memory policy registry and administration adapter.
#[derive(Debug, Default)]
pub struct InMemoryPolicyRepository {
    policies: RwLock<BTreeMap<String, RoleLevelPolicy>>,
}

impl InMemoryPolicyRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyRegistry for InMemoryPolicyRepository {
    async fn get(&self, role: &str) -> AppResult<Option<RoleLevelPolicy>> {
        Ok(self.policies.read().await.get(role).cloned())
    }
}

#[async_trait]
impl PolicyAdminRepository for InMemoryPolicyRepository {
    async fn upsert_policy(&self, policy: RoleLevelPolicy) -> AppResult<()> {
        self.policies
            .write()
            .await
            .insert(policy.role().as_str().to_owned(), policy);
        Ok(())
    }

    async fn list_policies(&self) -> AppResult<Vec<RoleLevelPolicy>> {
        Ok(self.policies.read().await.values().cloned().collect())
    }
}
