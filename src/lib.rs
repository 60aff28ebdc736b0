pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{docker::DockerClient, storage::AtomicFileStore};
pub use config::{ConfigLayer, Settings};
pub use core::discovery::{discover, DiscoveryRules};
pub use core::refresh::{CycleReport, LoopState, RefreshLoop};
pub use utils::error::{SdError, Result};
