use crate::domain::model::{Network, Service};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Read-only view of the orchestrator. Timeouts are the implementation's concern.
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>>;
    async fn list_networks(&self) -> Result<Vec<Network>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

pub trait TargetStore: Send + Sync {
    fn location(&self) -> &Path;

    fn read_current(&self) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Replace the stored document; readers see either the old or the new bytes.
    fn replace(&self, data: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;
}
