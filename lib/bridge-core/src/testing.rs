//! Recording fakes shared by the unit tests

use crate::endpoint::{EndpointDescriptor, Properties};
use crate::proxy::ProxyHandle;
use crate::services::{RegistrationHandle, ServicePublisher};
use crate::transport::{Session, SessionFactory};
use crate::types::{MethodSignature, Module, ModuleRegistry, ModuleState, TypeDescriptor, TypeLookup};
use crate::{PublishError, TransportError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of collaborator calls
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.split(' ').next() == Some(prefix))
            .collect()
    }
}

struct FakeSession {
    url: String,
    log: EventLog,
    calls: Arc<AtomicUsize>,
    fail_calls: bool,
    fail_close: bool,
    reply: Option<Value>,
}

#[async_trait]
impl Session for FakeSession {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls {
            return Err(TransportError::Remote {
                code: 500,
                message: format!("remote failure in {}", method),
            });
        }
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Ok(json!({"method": method, "params": params})),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.log.push(format!("close {}", self.url));
        if self.fail_close {
            return Err(TransportError::Connection("broken pipe".to_string()));
        }
        Ok(())
    }
}

/// Session factory echoing calls back and recording opens and closes
pub struct FakeSessionFactory {
    log: EventLog,
    opened: Mutex<Vec<String>>,
    calls: Arc<AtomicUsize>,
    fail_open: bool,
    fail_calls: bool,
    fail_close: bool,
    reply: Option<Value>,
}

impl FakeSessionFactory {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            opened: Mutex::new(Vec::new()),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
            fail_calls: false,
            fail_close: false,
            reply: None,
        }
    }

    /// Answer every call with `reply` instead of echoing it
    pub fn replying(mut self, reply: Value) -> Self {
        self.reply = Some(reply);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_calls(mut self) -> Self {
        self.fail_calls = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self, url: &str) -> Result<Arc<dyn Session>, TransportError> {
        if self.fail_open {
            return Err(TransportError::Connection(format!("can't reach {}", url)));
        }
        self.opened.lock().unwrap().push(url.to_string());
        self.log.push(format!("open {}", url));
        Ok(Arc::new(FakeSession {
            url: url.to_string(),
            log: self.log.clone(),
            calls: self.calls.clone(),
            fail_calls: self.fail_calls,
            fail_close: self.fail_close,
            reply: self.reply.clone(),
        }))
    }
}

/// Publisher recording every call in the event log
pub struct RecordingPublisher {
    log: EventLog,
    next_id: AtomicU64,
    last_properties: Mutex<Option<Properties>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            next_id: AtomicU64::new(1),
            last_properties: Mutex::new(None),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Properties of the latest publish or update
    pub fn last_properties(&self) -> Option<Properties> {
        self.last_properties.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServicePublisher for RecordingPublisher {
    async fn publish(
        &self,
        interfaces: &[String],
        _proxy: Arc<ProxyHandle>,
        properties: Properties,
    ) -> Result<RegistrationHandle, PublishError> {
        if self.fail {
            return Err(PublishError::Rejected("publisher unavailable".to_string()));
        }
        self.log.push(format!("publish {:?}", interfaces));
        *self.last_properties.lock().unwrap() = Some(properties);
        Ok(RegistrationHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn unpublish(&self, handle: RegistrationHandle) -> Result<(), PublishError> {
        self.log.push(format!("unpublish {}", handle.id()));
        Ok(())
    }

    async fn update_properties(
        &self,
        handle: RegistrationHandle,
        properties: Properties,
    ) -> Result<(), PublishError> {
        self.log.push(format!("update {}", handle.id()));
        *self.last_properties.lock().unwrap() = Some(properties);
        Ok(())
    }
}

/// An active module exporting IFoo and IBar, and a resolved-only one exporting IHidden
pub fn sample_modules() -> Arc<dyn TypeLookup> {
    Arc::new(ModuleRegistry::from_modules([
        Module {
            name: "example-api".to_string(),
            state: ModuleState::Active,
            types: vec![
                TypeDescriptor::new(
                    "com.example.IFoo",
                    vec![
                        MethodSignature::new("hello", ["java.lang.String"]).returning("java.lang.String"),
                        MethodSignature::new("hello", ["java.lang.String", "int"]).returning("java.lang.String"),
                        MethodSignature::new("add", ["int", "int"]).returning("int"),
                    ],
                ),
                TypeDescriptor::new(
                    "com.example.IBar",
                    vec![MethodSignature::new("reset", Vec::<String>::new())],
                ),
            ],
        },
        Module {
            name: "example-hidden".to_string(),
            state: ModuleState::Resolved,
            types: vec![TypeDescriptor::new("com.example.IHidden", Vec::new())],
        },
    ]))
}

pub fn sample_descriptor() -> EndpointDescriptor {
    EndpointDescriptor::new("ep1")
        .with_interface("com.example.IFoo")
        .with_configuration("jabsorb-rpc")
        .with_property("jabsorb.http.accesses", "http://host/bridge")
        .with_property("endpoint.name", "svc1")
}
