use crate::core::discovery::{discover, DiscoveryRules};
use crate::core::emitter::{emit, render};
use crate::domain::model::NetworkSource;
use crate::domain::ports::{OrchestratorClient, TargetStore, WriteOutcome};
use crate::utils::error::{ErrorCategory, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Polling,
    Emitting,
    Error,
    Stopped,
}

/// Summary of one completed refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub services: usize,
    pub networks: usize,
    pub candidates: usize,
    pub targets: usize,
    pub unresolved: usize,
    pub source: NetworkSource,
    pub outcome: WriteOutcome,
}

pub struct RefreshLoop<C: OrchestratorClient, S: TargetStore> {
    client: C,
    store: S,
    rules: DiscoveryRules,
    interval: Duration,
    require_orchestrator: bool,
    state: LoopState,
}

impl<C: OrchestratorClient, S: TargetStore> RefreshLoop<C, S> {
    pub fn new(client: C, store: S, rules: DiscoveryRules) -> Self {
        Self {
            client,
            store,
            rules,
            interval: DEFAULT_INTERVAL,
            require_orchestrator: false,
            state: LoopState::Idle,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Fail `run` if the orchestrator cannot be reached on the first cycle.
    pub fn with_require_orchestrator(mut self, require: bool) -> Self {
        self.require_orchestrator = require;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run a single refresh to completion.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        self.state = LoopState::Polling;
        match self.cycle().await {
            Ok(report) => {
                self.state = LoopState::Idle;
                Ok(report)
            }
            Err(e) => {
                self.state = LoopState::Error;
                Err(e)
            }
        }
    }

    async fn cycle(&mut self) -> Result<CycleReport> {
        let services = self.client.list_services().await?;
        let networks = self.client.list_networks().await?;
        tracing::debug!("Listed {} services and {} networks", services.len(), networks.len());

        let discovery = discover(&services, &networks, &self.rules);
        let payload = render(&discovery.groups)?;

        self.state = LoopState::Emitting;
        let outcome = emit(&self.store, &payload).await?;

        Ok(CycleReport {
            services: services.len(),
            networks: networks.len(),
            candidates: discovery.candidates,
            targets: discovery.groups.len(),
            unresolved: discovery.unresolved,
            source: discovery.monitored.source,
            outcome,
        })
    }

    /// Refresh on every tick until `shutdown` resolves.
    ///
    /// Shutdown is only observed between cycles, so a write in progress
    /// always completes. Failures are logged and retried on the next tick.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            "Refreshing {} every {:?}",
            self.store.location().display(),
            self.interval
        );

        let mut first_cycle = true;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            match self.run_once().await {
                Ok(report) => {
                    tracing::info!(
                        "Refreshed targets: {} targets from {} candidates ({} unresolved, {} services), networks from {}, file {:?}",
                        report.targets,
                        report.candidates,
                        report.unresolved,
                        report.services,
                        report.source,
                        report.outcome
                    );
                }
                Err(e) => {
                    if !e.is_retryable() {
                        tracing::error!("Refresh failed and cannot recover: {}", e);
                        self.state = LoopState::Stopped;
                        return Err(e);
                    }
                    if first_cycle
                        && self.require_orchestrator
                        && e.category() == ErrorCategory::Orchestrator
                    {
                        tracing::error!("Orchestrator unavailable at startup: {}", e);
                        self.state = LoopState::Stopped;
                        return Err(e);
                    }
                    tracing::warn!(
                        "Refresh failed ({:?}), keeping previous target file: {}",
                        e.category(),
                        e
                    );
                }
            }

            first_cycle = false;
            self.state = LoopState::Idle;
        }

        self.state = LoopState::Stopped;
        tracing::info!("Refresh loop stopped");
        Ok(())
    }
}
