use async_trait::async_trait;
use selector_core::ConfigError;

/// Reloads whatever plugin configuration (today: the deny-list) the running
/// selection pipeline was built with. The RPC layer stays decoupled from
/// `selector-pipeline`'s concrete type -- the composition root supplies the
/// implementation that actually reaches into the live pipeline.
#[async_trait]
pub trait PluginConfigReloader: Send + Sync {
    async fn reload(&self) -> Result<(), ConfigError>;
}
