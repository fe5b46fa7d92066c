use burrow_core::ExpirationPolicy;
use burrow_generator::DEFAULT_MAX_ATTEMPTS;
use std::time::Duration;
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    /// Candidate codes examined per request, collisions and lost races combined.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    /// Lifetime applied when the request carries no expiration policy.
    #[builder(default, setter(strip_option))]
    pub default_ttl: Option<Duration>,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ShortenerConfig {
    pub(crate) fn default_expiration(&self) -> ExpirationPolicy {
        self.default_ttl
            .map(ExpirationPolicy::AfterDuration)
            .unwrap_or_default()
    }
}
