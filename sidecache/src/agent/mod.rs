//! Agent facade and event dispatch.
//!
//! The host runtime delivers four kinds of events: one-time startup, one-time
//! activation, per-request interception, and asynchronous control messages.
//! [`AgentEvent`] is that tagged union; [`Agent`] has one handler per tag and
//! an event loop for channel-driven hosts.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::AgentConfig;
use crate::control::{ControlChannel, ControlReply};
use crate::lifecycle::{
    ActivationReport, HostControl, LifecycleManager, LoggingHostControl, PreloadSet, StartupReport,
};
use crate::net::{InterceptedRequest, NetworkClient, NetworkError, ReqwestClient};
use crate::store::{ResponseSnapshot, Store, StoreError, StoreStatsSnapshot};
use crate::strategy::{StrategyEngine, StrategyStatsSnapshot};

/// Events delivered to the agent.
#[derive(Debug)]
pub enum AgentEvent {
    /// Delivered once per process instance.
    Startup,
    /// Delivered once after startup, or when superseding an older instance.
    Activate,
    /// Delivered once per outgoing request from a controlled session.
    Intercept {
        request: InterceptedRequest,
        reply: oneshot::Sender<Option<ResponseSnapshot>>,
    },
    /// Out-of-band control message with its reply channel.
    Control {
        message: Value,
        reply: oneshot::Sender<ControlReply>,
    },
}

/// Errors building an [`Agent`].
#[derive(Debug, Error)]
pub enum AgentBuildError {
    /// No store was configured
    #[error("agent requires a store")]
    MissingStore,

    /// Default network client construction failed
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Builder wiring the store, network client and host control together.
pub struct AgentBuilder {
    config: AgentConfig,
    store: Option<Arc<dyn Store>>,
    network: Option<Arc<dyn NetworkClient>>,
    host: Option<Arc<dyn HostControl>>,
}

impl AgentBuilder {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            store: None,
            network: None,
            host: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn network(mut self, network: Arc<dyn NetworkClient>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn host(mut self, host: Arc<dyn HostControl>) -> Self {
        self.host = Some(host);
        self
    }

    /// Build the agent.
    ///
    /// A store is required. The network client defaults to [`ReqwestClient`]
    /// (resolving relative URLs against the configured origin) and host
    /// control defaults to the logging no-op.
    pub fn build(self) -> Result<Agent, AgentBuildError> {
        let store = self.store.ok_or(AgentBuildError::MissingStore)?;

        let network: Arc<dyn NetworkClient> = match self.network {
            Some(network) => network,
            None => {
                let mut client = ReqwestClient::new()?;
                if let Some(origin) = &self.config.origin {
                    client = client.with_origin(origin)?;
                }
                Arc::new(client)
            }
        };

        let host: Arc<dyn HostControl> = self
            .host
            .unwrap_or_else(|| Arc::new(LoggingHostControl::new()));

        let engine = Arc::new(StrategyEngine::new(
            Arc::clone(&store),
            Arc::clone(&network),
            &self.config,
        ));
        let lifecycle = LifecycleManager::new(
            Arc::clone(&store),
            Arc::clone(&network),
            host,
            self.config.cache_version.clone(),
        );
        let control = ControlChannel::new(
            Arc::clone(&store),
            self.config.cache_version.clone(),
        );
        let preload = PreloadSet::from_urls(&self.config.preload_manifest);

        Ok(Agent {
            store,
            engine,
            lifecycle,
            control,
            preload: Mutex::new(Some(preload)),
        })
    }
}

/// The background interception process.
///
/// All components share one store; the preload set is consumed by the first
/// startup event.
pub struct Agent {
    store: Arc<dyn Store>,
    engine: Arc<StrategyEngine>,
    lifecycle: LifecycleManager,
    control: ControlChannel,
    preload: Mutex<Option<PreloadSet>>,
}

impl Agent {
    pub fn builder(config: AgentConfig) -> AgentBuilder {
        AgentBuilder::new(config)
    }

    /// Handle the startup event: warm the store and request eager activation.
    pub async fn on_startup(&self) -> Result<StartupReport, StoreError> {
        let preload = self
            .preload
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .unwrap_or_else(|| {
                debug!("preload manifest already consumed, warming nothing");
                PreloadSet::new()
            });

        self.lifecycle.startup(preload).await
    }

    /// Handle the activation event: prune stale partitions and claim clients.
    pub async fn on_activate(&self) -> ActivationReport {
        self.lifecycle.activate().await
    }

    /// Resolve one intercepted request.
    pub async fn on_intercept(&self, request: InterceptedRequest) -> Option<ResponseSnapshot> {
        self.engine.resolve(request).await
    }

    /// Handle one control message.
    pub async fn on_control(&self, message: Value, reply: oneshot::Sender<ControlReply>) {
        self.control.handle(message, reply).await;
    }

    /// Dispatch one event to its handler.
    ///
    /// Interceptions are spawned so a stalled network call never blocks the
    /// loop; the other events are handled inline.
    pub async fn dispatch(self: Arc<Self>, event: AgentEvent) {
        match event {
            AgentEvent::Startup => {
                if let Err(e) = self.on_startup().await {
                    // Startup trouble is never fatal to the process.
                    error!(error = %e, "startup failed");
                }
            }
            AgentEvent::Activate => {
                self.on_activate().await;
            }
            AgentEvent::Intercept { request, reply } => {
                let engine = Arc::clone(&self.engine);
                tokio::spawn(async move {
                    let response = engine.resolve(request).await;
                    let _ = reply.send(response);
                });
            }
            AgentEvent::Control { message, reply } => {
                self.on_control(message, reply).await;
            }
        }
    }

    /// Run the event loop until the channel closes or `shutdown` fires.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<AgentEvent>,
        shutdown: CancellationToken,
    ) {
        info!("agent event loop started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("agent event loop shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => Arc::clone(&self).dispatch(event).await,
                    None => {
                        info!("event channel closed, stopping agent");
                        break;
                    }
                },
            }
        }
    }

    /// Resolution counters from the strategy engine.
    pub fn strategy_stats(&self) -> StrategyStatsSnapshot {
        self.engine.stats()
    }

    /// Access counters from the shared store.
    pub fn store_stats(&self) -> StoreStatsSnapshot {
        self.store.stats()
    }
}
