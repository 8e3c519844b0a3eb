//! Per-source management API clients.
//!
//! The orchestrator asks the factory for a fresh client for every source in
//! every cycle and passes it explicitly into the fetch and peek calls.

use std::sync::Arc;
use std::time::Duration;

use rmqmon_config::RabbitMqServer;
use rmqmon_rabbitmq::{ClientResult, HttpManagementClient, ManagementApi, ManagementEndpoint};

pub trait ClientFactory: Send + Sync {
    fn create(&self, source: &RabbitMqServer) -> ClientResult<Arc<dyn ManagementApi>>;
}

/// Builds [`HttpManagementClient`]s with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    timeout: Duration,
}

impl HttpClientFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn endpoint(&self, source: &RabbitMqServer) -> ManagementEndpoint {
        ManagementEndpoint {
            scheme: source.scheme.clone(),
            host: source.host.clone(),
            port: source.port,
            username: source.username.clone(),
            password: source.password.clone(),
            timeout: self.timeout,
        }
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, source: &RabbitMqServer) -> ClientResult<Arc<dyn ManagementApi>> {
        let client = HttpManagementClient::new(&self.endpoint(source))?;
        Ok(Arc::new(client))
    }
}
