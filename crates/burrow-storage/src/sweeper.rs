use burrow_core::store::Result;
use burrow_core::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodically reclaims expired records from a [`RecordStore`].
pub struct ExpirySweeper<S: ?Sized> {
    store: Arc<S>,
    interval: Duration,
}

impl<S> ExpirySweeper<S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: Arc<S>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Runs a single `delete_expired` pass.
    pub async fn sweep_once(&self) -> Result<u64> {
        let removed = self.store.delete_expired().await?;
        if removed > 0 {
            info!(removed, "swept expired records");
        } else {
            debug!("no expired records to sweep");
        }
        Ok(removed)
    }

    /// Sweeps every `interval` until `shutdown` flips to `true` or its
    /// sender is dropped. Failed passes are logged and retried next tick.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            warn!(error = %e, "expiry sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("expiry sweeper stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryRecordStore;
    use burrow_core::{CanonicalUrl, ShortCode, ShortUrlRecord};
    use jiff::{SignedDuration, Timestamp};

    async fn seeded_store() -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::new());
        let expired = Timestamp::now() - SignedDuration::from_secs(5);
        for (code, expires_at) in [("aaaaaa", Some(expired)), ("bbbbbb", None)] {
            let record = ShortUrlRecord::new(
                ShortCode::new_unchecked(code),
                CanonicalUrl::new_unchecked(format!("https://{code}.example")),
                Timestamp::now(),
                expires_at,
            );
            store.put_if_absent(&record).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn sweep_once_removes_expired() {
        let store = seeded_store().await;
        let sweeper = ExpirySweeper::new(Arc::clone(&store), Duration::from_secs(60));

        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn spawned_sweeper_runs_and_stops() {
        let store = seeded_store().await;
        let sweeper = ExpirySweeper::new(Arc::clone(&store), Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);

        let handle = sweeper.spawn(rx);
        // the first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.len(), 1);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn dropping_sender_stops_sweeper() {
        let store: Arc<dyn RecordStore> = seeded_store().await;
        let (tx, rx) = watch::channel(false);
        let handle = ExpirySweeper::new(store, Duration::from_secs(3600)).spawn(rx);

        drop(tx);
        handle.await.unwrap();
    }
}
