use burrow_core::store::Result;
use burrow_core::StorageError;
use std::future::Future;
use std::time::Duration;
use typed_builder::TypedBuilder;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadlines applied to remote store calls.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct StoreTimeouts {
    /// Upper bound for a single store operation.
    #[builder(default = DEFAULT_CALL_TIMEOUT)]
    pub call: Duration,
}

impl Default for StoreTimeouts {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl StoreTimeouts {
    /// Runs `fut`, failing with [`StorageError::Timeout`] past the call deadline.
    pub(crate) async fn bound<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.call, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(format!(
                "{operation} exceeded {}ms",
                self.call.as_millis()
            ))),
        }
    }
}
