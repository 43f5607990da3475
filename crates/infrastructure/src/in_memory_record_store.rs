use async_trait::async_trait;
use rolegate_application::{PermissionRecordStore, RecordChangeSet};
use rolegate_core::AppResult;
use rolegate_domain::{PermissionRecord, RecordFilter};
use tokio::sync::RwLock;

/// In-memory permission record ledger for tests and local runs.
///
/// A change set applies under one write lock, so partial application is never
/// observable. Appends carry no uniqueness constraint; removing an absent
/// identifier is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<PermissionRecord>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRecordStore for InMemoryRecordStore {
    async fn commit(&self, change_set: RecordChangeSet) -> AppResult<()> {
        let mut records = self.records.write().await;
        records.retain(|record| !change_set.removals().contains(&record.id()));
        records.extend(change_set.appends().iter().cloned());
        Ok(())
    }

    async fn find(&self, filter: RecordFilter) -> AppResult<Vec<PermissionRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
