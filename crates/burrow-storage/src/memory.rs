use async_trait::async_trait;
use burrow_core::store::{RecordStore, Result};
use burrow_core::{ShortCode, ShortUrlRecord, StorageError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use tracing::trace;

/// Process-local [`RecordStore`] backed by a [`DashMap`].
///
/// Conditional creation and increments go through the shard lock of the
/// affected key, so they are atomic with respect to other callers in the
/// same process. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: DashMap<ShortCode, ShortUrlRecord>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>> {
        Ok(self.records.get(code).map(|r| r.value().clone()))
    }

    async fn put_if_absent(&self, record: &ShortUrlRecord) -> Result<bool> {
        let now = Timestamp::now();

        match self.records.entry(record.code.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired_at(now) {
                    trace!(code = %record.code, "replacing expired record");
                    occupied.insert(record.clone());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record.clone());
                Ok(true)
            }
        }
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<u64> {
        let mut record = self
            .records
            .get_mut(code)
            .ok_or_else(|| StorageError::NotFound(code.to_string()))?;

        record.click_count = record.click_count.saturating_add(1);
        Ok(record.click_count)
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = Timestamp::now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired_at(now));
        Ok(before.saturating_sub(self.records.len()) as u64)
    }
}
