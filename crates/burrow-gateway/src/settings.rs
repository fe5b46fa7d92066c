use burrow_cache::CacheConfig;
use burrow_generator::HashGeneratorSettings;
use burrow_redirector::RedirectorConfig;
use burrow_shortener::ShortenerConfig;
use typed_builder::TypedBuilder;

/// Everything needed to assemble a [`Gateway`](crate::Gateway) besides the store.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct GatewaySettings {
    #[builder(default)]
    pub cache: CacheConfig,
    #[builder(default)]
    pub generator: HashGeneratorSettings,
    #[builder(default)]
    pub shortener: ShortenerConfig,
    #[builder(default)]
    pub redirector: RedirectorConfig,
}
