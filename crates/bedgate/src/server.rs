//! `Gateway` builder and accept loop.
//!
//! This is the entry point for running bedgate. It ties the layers
//! together: transport → protocol → session → handoff.

use std::sync::Arc;
use std::time::Duration;

use bedgate_protocol::CodecRegistry;
use bedgate_session::ChainVerifier;
use bedgate_transport::{Transport, TransportError, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{
    GatewayConfig, GatewayError, ServerDirectory, SessionRouter, StaticDirectory, TransferRouter,
};

/// Read-only state shared by every connection task.
pub(crate) struct ServerState<R, D> {
    pub(crate) registry: CodecRegistry,
    pub(crate) verifier: ChainVerifier,
    pub(crate) router: R,
    pub(crate) directory: D,
    pub(crate) login_timeout: Duration,
    pub(crate) idle_timeout: Duration,
}

impl<R, D> ServerState<R, D> {
    pub(crate) fn new(
        registry: CodecRegistry,
        verifier: ChainVerifier,
        router: R,
        directory: D,
    ) -> Self {
        let defaults = GatewayConfig::default();
        Self {
            registry,
            verifier,
            router,
            directory,
            login_timeout: defaults.login_timeout,
            idle_timeout: defaults.idle_timeout,
        }
    }
}

/// Builder for configuring and starting a gateway.
///
/// # Example
///
/// ```rust,no_run
/// use bedgate::prelude::*;
///
/// # async fn start() -> Result<(), GatewayError> {
/// let config = GatewayConfig::from_env()?;
/// let gateway = GatewayBuilder::new(config).build().await?;
/// gateway.run().await
/// # }
/// ```
pub struct GatewayBuilder<R = TransferRouter, D = StaticDirectory> {
    config: GatewayConfig,
    registry: CodecRegistry,
    router: R,
    directory: D,
}

impl GatewayBuilder {
    /// A builder that hands every player to the target in `config`.
    pub fn new(config: GatewayConfig) -> Self {
        let directory = StaticDirectory::new(config.server_info());
        Self {
            config,
            registry: CodecRegistry::default(),
            router: TransferRouter,
            directory,
        }
    }
}

impl<R, D> GatewayBuilder<R, D>
where
    R: SessionRouter,
    D: ServerDirectory,
{
    /// Sets the codecs clients may negotiate.
    pub fn registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the routing collaborator.
    pub fn router<R2: SessionRouter>(self, router: R2) -> GatewayBuilder<R2, D> {
        GatewayBuilder {
            config: self.config,
            registry: self.registry,
            router,
            directory: self.directory,
        }
    }

    /// Replaces the server directory.
    pub fn directory<D2: ServerDirectory>(self, directory: D2) -> GatewayBuilder<R, D2> {
        GatewayBuilder {
            config: self.config,
            registry: self.registry,
            router: self.router,
            directory,
        }
    }

    /// Binds a WebSocket listener on the configured address. Clients get
    /// the login timeout to finish the WebSocket upgrade.
    pub async fn build(self) -> Result<Gateway<WebSocketTransport, R, D>, GatewayError> {
        let transport = WebSocketTransport::bind_with_upgrade_timeout(
            &self.config.bind,
            self.config.login_timeout,
        )
        .await?;
        Ok(self.with_transport(transport))
    }

    /// Uses an already constructed transport.
    pub fn with_transport<T: Transport>(self, transport: T) -> Gateway<T, R, D> {
        tracing::debug!(
            mode = %self.config.trust.mode,
            roots = self.config.trust.roots.len(),
            versions = ?self.registry.supported_versions(),
            "gateway configured"
        );
        let mut state = ServerState::new(
            self.registry,
            ChainVerifier::new(self.config.trust),
            self.router,
            self.directory,
        );
        state.login_timeout = self.config.login_timeout;
        state.idle_timeout = self.config.idle_timeout;

        Gateway {
            transport,
            state: Arc::new(state),
        }
    }
}

/// A gateway ready to accept clients.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Gateway<T, R = TransferRouter, D = StaticDirectory> {
    transport: T,
    state: Arc<ServerState<R, D>>,
}

impl Gateway<WebSocketTransport> {
    /// A builder with the default configuration.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new(GatewayConfig::default())
    }
}

impl<R, D> Gateway<WebSocketTransport, R, D> {
    /// Returns the local address the gateway is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }
}

impl<T, R, D> Gateway<T, R, D>
where
    T: Transport,
    R: SessionRouter,
    D: ServerDirectory,
{
    /// Runs the accept loop until the transport shuts down.
    ///
    /// Spawns a handler task for each connection.
    pub async fn run(self) -> Result<(), GatewayError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then shuts the
    /// transport down. Connections already accepted keep running.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!("bedgate gateway running");
        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                accepted = self.transport.accept() => Some(accepted),
                () = &mut shutdown => None,
            };
            let Some(accepted) = accepted else {
                tracing::info!("shutdown requested, gateway stopping");
                self.transport.shutdown().await?;
                return Ok(());
            };

            match accepted {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(TransportError::Shutdown) => {
                    tracing::info!("transport shut down, gateway stopping");
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
