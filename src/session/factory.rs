use super::SessionHandle;
use crate::config::EndpointConfig;
use crate::datatypes::BindType;
use crate::error::GatewayError;
use crate::transport::{BindRequest, Connector, InboundListener, KeepAliveConfig};
use std::sync::Arc;
use tracing::{info, warn};

/// Opens and destroys sessions against one configured endpoint.
pub struct SessionFactory<C> {
    connector: C,
    config: EndpointConfig,
    bind_type: BindType,
    listener: Option<Arc<dyn InboundListener>>,
}

impl<C: Connector> SessionFactory<C> {
    pub fn new(
        connector: C,
        config: EndpointConfig,
        bind_type: BindType,
        listener: Option<Arc<dyn InboundListener>>,
    ) -> Self {
        Self {
            connector,
            config,
            bind_type,
            listener,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Everything the connector needs to bind. The URL is parsed here, before
    /// any connection attempt.
    pub fn bind_request(&self) -> Result<BindRequest, GatewayError> {
        let config = &self.config;
        let endpoint = config.validate()?;
        Ok(BindRequest {
            endpoint,
            bind_type: self.bind_type,
            system_id: config.username.clone(),
            password: config.password.clone(),
            system_type: config.system_type.clone(),
            addr_ton: config.source_ton,
            addr_npi: config.source_npi,
            address_range: config.address_range.clone(),
            connection_timeout: config.connection_timeout,
            request_timeout: config.request_timeout,
            keep_alive: KeepAliveConfig::new(config.connection_timeout)
                .with_timeout(config.request_timeout),
            threads: config.threads(),
        })
    }

    /// Open and bind a new session. Nothing is returned on failure.
    pub async fn create(&self) -> Result<SessionHandle<C::Transport>, GatewayError> {
        let request = self.bind_request()?;
        let transport = self
            .connector
            .connect(&request, self.listener.clone())
            .await?;
        info!(endpoint = %request.endpoint, bind_type = ?request.bind_type, "session opened");
        Ok(SessionHandle::new(transport))
    }

    /// Physically close a session evicted from the pool. Failures are logged.
    pub async fn destroy(&self, handle: SessionHandle<C::Transport>) {
        match handle.close().await {
            Ok(()) => info!(system_id = %self.config.username, "session closed"),
            Err(err) => warn!(
                system_id = %self.config.username,
                error = %err,
                "session did not close cleanly"
            ),
        }
    }
}
