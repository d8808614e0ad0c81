/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use async_trait::async_trait;
use nwdaf_streamer::model::wire::{Guami, PlmnId};
use nwdaf_streamer::{
    AmfStatusSubscription, AppState, CommandAction, CommandSurface, CreateSubscriptionRequest,
    DirectoryClient, DirectoryError, LifecycleSettings, NwdafStreamer, ProducerEndpoint,
    RetryPolicy, StartupError, SubscriptionClient, SubscriptionError, SubscriptionRegistry,
    SubscriptionTemplates, TargetType,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use support::{CountingClient, RecordingSink, StaticDirectory, NOTIFICATION_BASE};
use tokio::net::TcpStream;

/// Producer whose delete checks that the notification listener still accepts connections.
#[derive(Default)]
struct ListenerCheckingClient {
    listener: OnceLock<SocketAddr>,
    deletes: AtomicUsize,
    listener_open_during_delete: Mutex<Vec<bool>>,
    status_subscriptions: Mutex<Vec<(String, AmfStatusSubscription)>>,
}

#[async_trait]
impl SubscriptionClient for ListenerCheckingClient {
    async fn create(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> Result<String, SubscriptionError> {
        Ok(format!("sub-{}", request.target()))
    }

    async fn delete(
        &self,
        _producer: &ProducerEndpoint,
        _target: TargetType,
        _subscription_id: &str,
    ) -> Result<(), SubscriptionError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let open = match self.listener.get() {
            Some(addr) => TcpStream::connect(addr).await.is_ok(),
            None => false,
        };
        self.listener_open_during_delete
            .lock()
            .expect("client lock")
            .push(open);
        Ok(())
    }

    async fn subscribe_amf_status(
        &self,
        producer: &ProducerEndpoint,
        subscription: &AmfStatusSubscription,
    ) -> Result<(), SubscriptionError> {
        self.status_subscriptions
            .lock()
            .expect("client lock")
            .push((producer.nf_instance_id().to_string(), subscription.clone()));
        Ok(())
    }
}

fn streamer(
    client: Arc<dyn SubscriptionClient>,
    directory: Arc<dyn DirectoryClient>,
    targets: Vec<TargetType>,
) -> NwdafStreamer {
    streamer_with_status(client, directory, targets, None)
}

fn streamer_with_status(
    client: Arc<dyn SubscriptionClient>,
    directory: Arc<dyn DirectoryClient>,
    targets: Vec<TargetType>,
    amf_status: Option<AmfStatusSubscription>,
) -> NwdafStreamer {
    let registry = Arc::new(SubscriptionRegistry::new(client));
    let commands = Arc::new(CommandSurface::new(
        registry,
        directory.clone(),
        SubscriptionTemplates::all_events(NOTIFICATION_BASE),
    ));
    let state = AppState::new(commands, Arc::new(RecordingSink::default()));

    let mut settings = LifecycleSettings::new("127.0.0.1:0");
    settings.subscribe_on_startup = targets;
    settings.amf_status = amf_status;
    settings.shutdown_timeout = Duration::from_secs(2);
    settings.registration_retry = RetryPolicy {
        max_attempts: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        multiplier: 2.0,
        jitter_factor: 0.0,
    };
    NwdafStreamer::new(state, directory, settings)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_unsubscribes_while_listener_is_open_then_releases_it() {
    let client = Arc::new(ListenerCheckingClient::default());
    let directory = Arc::new(StaticDirectory::default());

    let running = streamer(client.clone(), directory.clone(), vec![TargetType::Amf])
        .start()
        .await
        .expect("streamer starts");
    let addr = running.local_addr();
    client.listener.set(addr).expect("listener address set once");
    assert!(running
        .state()
        .registry()
        .get(TargetType::Amf)
        .is_some_and(|subscription| subscription.is_active()));

    running.shutdown().await.expect("clean shutdown");

    assert_eq!(client.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(
        *client.listener_open_during_delete.lock().expect("client lock"),
        vec![true]
    );
    assert!(TcpStream::connect(addr).await.is_err());
    assert_eq!(directory.registrations(), 1);
    assert_eq!(directory.deregistrations(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_removes_a_subscription_created_while_it_runs() {
    let client = Arc::new(CountingClient::with_create_delay(Duration::from_millis(150)));
    let running = streamer(
        client.clone(),
        Arc::new(StaticDirectory::default()),
        Vec::new(),
    )
    .start()
    .await
    .expect("streamer starts");

    let commands = running.state().commands().clone();
    let subscribing = tokio::spawn(async move {
        commands
            .execute(CommandAction::Subscribe, TargetType::Smf)
            .await
    });
    while client.creates() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    running.shutdown().await.expect("clean shutdown");

    assert_eq!(subscribing.await.expect("subscribe task").code, "subscribed");
    assert_eq!(client.creates(), 1);
    assert_eq!(client.deletes(), 1);
}

fn amf_status() -> AmfStatusSubscription {
    AmfStatusSubscription {
        guami_list: vec![Guami {
            plmn_id: PlmnId {
                mcc: "208".to_string(),
                mnc: "93".to_string(),
            },
            amf_id: "cafe00".to_string(),
        }],
        callback_uri: format!("{NOTIFICATION_BASE}/nnwdaf-amfStatus"),
    }
}

#[tokio::test]
async fn startup_registers_the_amf_status_callback_with_the_discovered_amf() {
    let client = Arc::new(ListenerCheckingClient::default());
    let directory = Arc::new(StaticDirectory::default());

    let running = streamer_with_status(
        client.clone(),
        directory.clone(),
        vec![TargetType::Amf],
        Some(amf_status()),
    )
    .start()
    .await
    .expect("streamer starts");

    assert_eq!(
        *client.status_subscriptions.lock().expect("client lock"),
        vec![("amf-instance".to_string(), amf_status())]
    );
    assert_eq!(directory.discoveries(), 2);

    running.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn startup_without_amf_status_settings_sends_no_status_request() {
    let client = Arc::new(ListenerCheckingClient::default());

    let running = streamer(
        client.clone(),
        Arc::new(StaticDirectory::default()),
        vec![TargetType::Smf],
    )
    .start()
    .await
    .expect("streamer starts");

    assert!(client
        .status_subscriptions
        .lock()
        .expect("client lock")
        .is_empty());

    running.shutdown().await.expect("clean shutdown");
}

struct NoProducers;

#[async_trait]
impl DirectoryClient for NoProducers {
    async fn register(&self) -> Result<(), DirectoryError> {
        Ok(())
    }

    async fn discover(&self, target: TargetType) -> Result<ProducerEndpoint, DirectoryError> {
        Err(DirectoryError::NoInstance(target))
    }

    async fn deregister(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}

#[tokio::test]
async fn startup_skips_targets_that_cannot_be_discovered() {
    let client = Arc::new(ListenerCheckingClient::default());

    let running = streamer_with_status(
        client.clone(),
        Arc::new(NoProducers),
        vec![TargetType::Amf, TargetType::Smf],
        Some(amf_status()),
    )
    .start()
    .await
    .expect("discovery failures do not abort startup");

    assert!(running.state().registry().subscriptions().is_empty());
    assert!(client
        .status_subscriptions
        .lock()
        .expect("client lock")
        .is_empty());

    running.shutdown().await.expect("clean shutdown");
    assert_eq!(client.deletes.load(Ordering::SeqCst), 0);
}

struct Unreachable;

#[async_trait]
impl DirectoryClient for Unreachable {
    async fn register(&self) -> Result<(), DirectoryError> {
        Err(DirectoryError::Transport("connection refused".to_string()))
    }

    async fn discover(&self, target: TargetType) -> Result<ProducerEndpoint, DirectoryError> {
        Err(DirectoryError::NoInstance(target))
    }

    async fn deregister(&self) -> Result<(), DirectoryError> {
        Ok(())
    }
}

#[tokio::test]
async fn unreachable_directory_aborts_startup() {
    let result = streamer(
        Arc::new(ListenerCheckingClient::default()),
        Arc::new(Unreachable),
        vec![TargetType::Amf],
    )
    .start()
    .await;

    assert!(matches!(
        result,
        Err(StartupError::Registration { attempts: 2, .. })
    ));
}
