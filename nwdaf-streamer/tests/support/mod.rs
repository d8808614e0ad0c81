#![allow(dead_code)]

use async_trait::async_trait;
use nwdaf_streamer::{
    AppState, CommandAction, CommandSurface, CorrelationPolicy, CreateSubscriptionRequest,
    DirectoryClient, DirectoryError, EventSink, ProducerEndpoint, Signal, SubscriptionClient,
    SubscriptionError, SubscriptionRegistry, SubscriptionTemplates, TargetType,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const NOTIFICATION_BASE: &str = "http://127.0.0.1:8000";

/// Producer stand-in that counts requests and hands out `sub-{target}-{n}` ids.
#[derive(Default)]
pub(crate) struct CountingClient {
    creates: AtomicUsize,
    deletes: AtomicUsize,
    create_delay: Option<Duration>,
}

impl CountingClient {
    pub(crate) fn with_create_delay(delay: Duration) -> Self {
        Self {
            create_delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionClient for CountingClient {
    async fn create(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> Result<String, SubscriptionError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(format!("sub-{}-{n}", request.target()))
    }

    async fn delete(
        &self,
        _producer: &ProducerEndpoint,
        _target: TargetType,
        _subscription_id: &str,
    ) -> Result<(), SubscriptionError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Directory that resolves every target to a fixed local producer.
#[derive(Default)]
pub(crate) struct StaticDirectory {
    registrations: AtomicUsize,
    deregistrations: AtomicUsize,
    discoveries: AtomicUsize,
}

impl StaticDirectory {
    pub(crate) fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub(crate) fn deregistrations(&self) -> usize {
        self.deregistrations.load(Ordering::SeqCst)
    }

    pub(crate) fn discoveries(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for StaticDirectory {
    async fn register(&self) -> Result<(), DirectoryError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn discover(&self, target: TargetType) -> Result<ProducerEndpoint, DirectoryError> {
        self.discoveries.fetch_add(1, Ordering::SeqCst);
        Ok(ProducerEndpoint::new(
            &format!("{target}-instance"),
            "http://127.0.0.18:8000",
        ))
    }

    async fn deregister(&self) -> Result<(), DirectoryError> {
        self.deregistrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink that keeps every signal in arrival order.
#[derive(Default)]
pub(crate) struct RecordingSink {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingSink {
    pub(crate) fn signals(&self) -> Vec<Signal> {
        self.signals.lock().expect("sink lock").clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn record(&self, signal: Signal) {
        self.signals.lock().expect("sink lock").push(signal);
    }
}

pub(crate) struct Harness {
    pub(crate) state: AppState,
    pub(crate) client: Arc<CountingClient>,
    pub(crate) directory: Arc<StaticDirectory>,
    pub(crate) sink: Arc<RecordingSink>,
}

impl Harness {
    pub(crate) fn new(policy: CorrelationPolicy) -> Self {
        Self::with_client(Arc::new(CountingClient::default()), policy)
    }

    pub(crate) fn with_client(client: Arc<CountingClient>, policy: CorrelationPolicy) -> Self {
        let directory = Arc::new(StaticDirectory::default());
        let sink = Arc::new(RecordingSink::default());
        let registry = Arc::new(SubscriptionRegistry::new(client.clone()));
        let commands = Arc::new(CommandSurface::new(
            registry,
            directory.clone(),
            SubscriptionTemplates::all_events(NOTIFICATION_BASE),
        ));
        let state = AppState::new(commands, sink.clone()).with_policy(policy);

        Self {
            state,
            client,
            directory,
            sink,
        }
    }

    /// Subscribes the target and returns the correlation id the producer will echo.
    pub(crate) async fn subscribe(&self, target: TargetType) -> String {
        let reply = self
            .state
            .commands()
            .execute(CommandAction::Subscribe, target)
            .await;
        assert_eq!(reply.code, "subscribed");

        self.state
            .registry()
            .get(target)
            .expect("subscription stored")
            .correlation_id()
            .to_string()
    }
}
