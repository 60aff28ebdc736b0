pub mod discovery;
pub mod emitter;
pub mod network;
pub mod port;
pub mod refresh;
pub mod scanner;

pub use crate::domain::model::{Discovery, MonitoredNetworks, Network, Service, TargetGroup};
pub use crate::domain::ports::{OrchestratorClient, TargetStore, WriteOutcome};
pub use crate::utils::error::Result;
