//! Transport sessions and call channels

use crate::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// A call/response exchange with a remote bridge
#[async_trait]
pub trait Session: Send + Sync {
    /// Call a remote method with positional parameters
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError>;

    /// Release the resources held by the session
    async fn close(&self) -> Result<(), TransportError>;
}

/// Opens one session per access URL, without pooling
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, url: &str) -> Result<Arc<dyn Session>, TransportError>;
}

/// A session bound to one access URL, closed at most once
pub struct Channel {
    url: String,
    session: Arc<dyn Session>,
    closed: AtomicBool,
}

impl Channel {
    /// Open a channel through the given factory
    pub async fn open(factory: &dyn SessionFactory, url: &str) -> Result<Self, TransportError> {
        let session = factory.open(url).await?;
        debug!("Opened channel to {}", url);
        Ok(Self {
            url: url.to_string(),
            session,
            closed: AtomicBool::new(false),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.session.call(method, params).await
    }

    /// Close the underlying session.
    ///
    /// Returns true if this call closed the channel. Session errors are
    /// logged and swallowed: a half-broken session is still considered closed.
    pub async fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }

        match self.session.close().await {
            Ok(()) => debug!("Closed channel to {}", self.url),
            Err(e) => warn!("Error closing channel to {}: {}", self.url, e),
        }
        true
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EventLog, FakeSessionFactory};
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_call_and_close_once() {
        let log = EventLog::default();
        let factory = FakeSessionFactory::new(log.clone());
        let channel = Channel::open(&factory, "http://host/bridge").await.unwrap();

        let result = channel.call("svc.echo", vec![json!(1)]).await.unwrap();
        assert_eq!(result, json!({"method": "svc.echo", "params": [1]}));

        assert!(channel.close().await);
        assert!(!channel.close().await);
        assert!(channel.is_closed());
        assert_eq!(log.matching("close"), vec!["close http://host/bridge"]);
    }

    #[tokio::test]
    async fn test_closed_channel_rejects_calls() {
        let factory = FakeSessionFactory::new(EventLog::default());
        let channel = Channel::open(&factory, "http://host/bridge").await.unwrap();
        channel.close().await;
        assert_eq!(
            channel.call("svc.echo", vec![]).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn test_close_swallows_session_errors() {
        let factory = FakeSessionFactory::new(EventLog::default()).failing_close();
        let channel = Channel::open(&factory, "http://host/bridge").await.unwrap();
        assert!(channel.close().await);
        assert!(channel.is_closed());
    }

    #[tokio::test]
    async fn test_open_failure() {
        let factory = FakeSessionFactory::new(EventLog::default()).failing_open();
        let err = Channel::open(&factory, "http://host/bridge").await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
