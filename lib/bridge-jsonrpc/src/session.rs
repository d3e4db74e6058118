//! HTTP sessions posting JSON-RPC envelopes to a remote bridge

use crate::envelope::{RpcRequest, RpcResponse};
use async_trait::async_trait;
use bridge_core::{Session, SessionFactory, TransportError};
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;
use tracing::{debug, warn};

/// Opens an HTTP session per access URL.
///
/// Sessions share the factory's connection pool, but each one is bound to a
/// single URL and closed independently.
pub struct HttpSessionFactory {
    client: Client,
    timeout: Duration,
}

impl HttpSessionFactory {
    /// Create a factory whose calls time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self::with_client(client, timeout))
    }

    /// Create a factory over an existing HTTP client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn parse_url(url: &str) -> Result<Url, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(TransportError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                url, scheme
            ))),
        }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self, url: &str) -> Result<Arc<dyn Session>, TransportError> {
        let url = Self::parse_url(url)?;
        debug!("Opening JSON-RPC session to {}", url);
        Ok(Arc::new(HttpSession {
            client: self.client.clone(),
            url,
            timeout: self.timeout,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }))
    }
}

/// A JSON-RPC session bound to one bridge URL
pub struct HttpSession {
    client: Client,
    url: Url,
    timeout: Duration,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl HttpSession {
    async fn exchange(&self, request: &RpcRequest<'_>) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        if !status.is_success() {
            // Some bridges still send a JSON-RPC error object with an error status
            if let Ok(reply) = RpcResponse::parse(&body) {
                if reply.error.is_some() {
                    return reply.into_result();
                }
            }
            return Err(TransportError::Protocol(format!("HTTP status {}", status)));
        }

        RpcResponse::parse(&body)?.into_result()
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let request = RpcRequest {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            method,
            params: &params,
        };
        debug!("JSON-RPC call #{} {} to {}", request.id, method, self.url);

        match tokio_timeout(self.timeout, self.exchange(&request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("JSON-RPC call {} timed out after {:?}", method, self.timeout);
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closed JSON-RPC session to {}", self.url);
        }
        Ok(())
    }
}
