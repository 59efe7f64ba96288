//! Service lifecycle over both networks.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{info, instrument};

use paywire_common::Network;
use paywire_crypto::{AddressGenerator, HashedAddressGenerator};
use paywire_notifier::{DeliveryError, HttpTransport, NotificationTransport};

use crate::chain::Chain;
use crate::config::ServiceConfig;
use crate::state::ServiceState;

/// Errors from building or driving the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] DeliveryError),

    #[error("Cannot {action} service in state {state:?}")]
    InvalidState {
        action: &'static str,
        state: ServiceState,
    },
}

/// The ledger service: an independent [`Chain`] per network.
pub struct Service {
    config: ServiceConfig,
    state: Arc<RwLock<ServiceState>>,
    mainnet: Arc<Chain>,
    testnet: Arc<Chain>,
}

impl Service {
    /// Create a service with the given collaborators.
    pub fn new(
        config: ServiceConfig,
        generator: Arc<dyn AddressGenerator>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Result<Self, ServiceError> {
        config.validate().map_err(ServiceError::Config)?;

        let mainnet = Arc::new(Chain::new(
            Network::MainNet,
            &config,
            0,
            generator.clone(),
            transport.clone(),
        ));
        let testnet = Arc::new(Chain::new(Network::TestNet3, &config, 1, generator, transport));

        info!(
            max_hooks = config.hook_limits.max_hooks,
            max_page_limit = config.page_limits.max_limit,
            "Service created"
        );

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(ServiceState::Starting)),
            mainnet,
            testnet,
        })
    }

    /// Create a service with the default address generator and the HTTP
    /// transport.
    pub fn with_defaults(config: ServiceConfig) -> Result<Self, ServiceError> {
        let transport = HttpTransport::new(config.notify.delivery_timeout)?;
        Self::new(config, Arc::new(HashedAddressGenerator::new()), Arc::new(transport))
    }

    /// Start dispatching notifications. Must be called within a tokio
    /// runtime.
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<(), ServiceError> {
        let mut state = self.state.write();
        if *state != ServiceState::Starting {
            return Err(ServiceError::InvalidState {
                action: "start",
                state: *state,
            });
        }

        for chain in self.chains() {
            chain.dispatcher().start();
        }
        *state = ServiceState::Running;

        info!("Service started");
        Ok(())
    }

    /// Close the dispatch queues and wait for queued deliveries to be handed
    /// off. Ledger operations keep working; new notifications are dropped.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), ServiceError> {
        {
            let mut state = self.state.write();
            if state.is_terminal() {
                return Err(ServiceError::InvalidState {
                    action: "stop",
                    state: *state,
                });
            }
            *state = ServiceState::Stopping;
        }

        for chain in self.chains() {
            chain.dispatcher().stop().await;
        }
        *self.state.write() = ServiceState::Stopped;

        info!("Service stopped");
        Ok(())
    }

    /// Get current service state.
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Chain serving `network`.
    pub fn chain(&self, network: Network) -> &Arc<Chain> {
        match network {
            Network::MainNet => &self.mainnet,
            Network::TestNet3 => &self.testnet,
        }
    }

    /// Both chains, mainnet first.
    pub fn chains(&self) -> [&Arc<Chain>; 2] {
        [&self.mainnet, &self.testnet]
    }

    /// Check integrity of every chain.
    pub fn verify_integrity(&self) -> bool {
        self.chains().iter().all(|chain| chain.verify_integrity())
    }

    /// Export metrics of both chains in Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        self.chains()
            .iter()
            .map(|chain| chain.metrics().to_prometheus(chain.network().name()))
            .collect()
    }
}
