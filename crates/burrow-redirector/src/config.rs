use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// How a resolution accounts its click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAccounting {
    /// Await the increment before returning; failures are logged.
    #[default]
    Inline,
    /// Spawn the increment on the runtime and return immediately.
    Detached,
}

#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct RedirectorConfig {
    #[builder(default)]
    pub click_accounting: ClickAccounting,
}
