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

//! Ordered startup and shutdown of the notification server and its directory presence.

use crate::control_plane::command::CommandAction;
use crate::control_plane::subscription_registry::UnsubscribeOutcome;
use crate::data_plane::notification_router::{notification_router, AppState};
use crate::error::{DirectoryError, StartupError};
use crate::model::target::TargetType;
use crate::observability::events;
use crate::runtime::retry::{retry, RetryPolicy};
use crate::sbi::directory_client::DirectoryClient;
use crate::sbi::subscription_client::AmfStatusSubscription;
use futures::future::join_all;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const COMPONENT: &str = "lifecycle";

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Knobs for [`NwdafStreamer::start`].
#[derive(Clone, Debug)]
pub struct LifecycleSettings {
    pub bind_addr: String,
    pub registration_retry: RetryPolicy,
    /// Upper bound on the whole best-effort unsubscribe phase of shutdown.
    pub shutdown_timeout: Duration,
    /// Targets subscribed to right after registration, in order.
    pub subscribe_on_startup: Vec<TargetType>,
    /// AMF status-change callback registered after the startup targets.
    pub amf_status: Option<AmfStatusSubscription>,
}

impl LifecycleSettings {
    pub fn new(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            registration_retry: RetryPolicy::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            subscribe_on_startup: vec![TargetType::Amf, TargetType::Smf],
            amf_status: None,
        }
    }
}

/// A configured but not yet started streamer.
pub struct NwdafStreamer {
    state: AppState,
    directory: Arc<dyn DirectoryClient>,
    settings: LifecycleSettings,
}

impl NwdafStreamer {
    pub fn new(
        state: AppState,
        directory: Arc<dyn DirectoryClient>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            state,
            directory,
            settings,
        }
    }

    /// Binds the listener, registers with the directory and opens the startup subscriptions,
    /// then asks the AMF for status changes when configured.
    ///
    /// Registration failure aborts startup and releases the listener. A target that cannot be
    /// discovered or subscribed is logged and skipped; the command endpoint can retry it later.
    pub async fn start(self) -> Result<RunningStreamer, StartupError> {
        info!(
            event = events::STARTUP_BEGIN,
            component = COMPONENT,
            bind_addr = self.settings.bind_addr.as_str(),
            "starting nwdaf streamer"
        );

        let listener = TcpListener::bind(&self.settings.bind_addr)
            .await
            .map_err(|source| StartupError::Bind {
                addr: self.settings.bind_addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
            addr: self.settings.bind_addr.clone(),
            source,
        })?;
        info!(
            event = events::LISTENER_BOUND,
            component = COMPONENT,
            local_addr = %local_addr,
            "notification listener bound"
        );

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let app = notification_router(self.state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        let running = RunningStreamer {
            local_addr,
            state: self.state,
            directory: self.directory,
            shutdown_timeout: self.settings.shutdown_timeout,
            stop_tx,
            server,
        };

        if let Err(err) = register(running.directory.as_ref(), &self.settings.registration_retry)
            .await
        {
            let _ = running.stop_server().await;
            return Err(err);
        }

        for target in &self.settings.subscribe_on_startup {
            let reply = running
                .state
                .commands()
                .execute(CommandAction::Subscribe, *target)
                .await;
            if reply.error.is_some() {
                warn!(
                    event = events::STARTUP_TARGET_SKIPPED,
                    component = COMPONENT,
                    target = target.as_str(),
                    code = reply.code,
                    err = reply.error.as_deref().unwrap_or_default(),
                    "startup subscription skipped"
                );
            }
        }

        if let Some(subscription) = &self.settings.amf_status {
            let reply = running
                .state
                .commands()
                .subscribe_amf_status(subscription)
                .await;
            if reply.error.is_some() {
                warn!(
                    event = events::STARTUP_TARGET_SKIPPED,
                    component = COMPONENT,
                    target = "amf_status",
                    code = reply.code,
                    err = reply.error.as_deref().unwrap_or_default(),
                    "AMF status change subscription skipped"
                );
            }
        }

        info!(
            event = events::STARTUP_COMPLETE,
            component = COMPONENT,
            local_addr = %local_addr,
            subscriptions = running.state.registry().subscriptions().len(),
            "nwdaf streamer started"
        );
        Ok(running)
    }
}

async fn register(
    directory: &dyn DirectoryClient,
    policy: &RetryPolicy,
) -> Result<(), StartupError> {
    retry(
        policy,
        || directory.register(),
        DirectoryError::is_retryable,
        |attempt, err, delay| {
            warn!(
                event = events::DIRECTORY_REGISTER_RETRY,
                component = COMPONENT,
                attempt,
                delay_ms = delay.as_millis() as u64,
                err = %err,
                "directory registration failed; retrying"
            );
        },
    )
    .await
    .map_err(|exhausted| {
        error!(
            event = events::DIRECTORY_REGISTER_FAILED,
            component = COMPONENT,
            attempts = exhausted.attempts,
            err = %exhausted.last_error,
            "directory registration failed"
        );
        StartupError::Registration {
            attempts: exhausted.attempts,
            source: exhausted.last_error,
        }
    })
}

/// A started streamer. Dropping it without [`RunningStreamer::shutdown`] leaves the server task
/// running detached.
pub struct RunningStreamer {
    local_addr: SocketAddr,
    state: AppState,
    directory: Arc<dyn DirectoryClient>,
    shutdown_timeout: Duration,
    stop_tx: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl RunningStreamer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves until `signal` resolves, then shuts down.
    pub async fn run_until<F>(self, signal: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        signal.await;
        self.shutdown().await
    }

    /// Stops intake, removes subscriptions, deregisters and finally stops the server.
    ///
    /// Each step is attempted once; failures are logged and the sequence continues.
    pub async fn shutdown(self) -> Result<(), StartupError> {
        info!(
            event = events::SHUTDOWN_BEGIN,
            component = COMPONENT,
            subscriptions = self.state.registry().subscriptions().len(),
            "shutting down nwdaf streamer"
        );

        self.state.gate().close();

        // Every target, not a snapshot: a subscribe admitted just before the gate closed holds
        // the target lock, so its unsubscribe runs once the create settles.
        let registry = self.state.registry();
        let removals = TargetType::ALL
            .into_iter()
            .map(|target| registry.unsubscribe(target));
        let removed = match tokio::time::timeout(self.shutdown_timeout, join_all(removals)).await {
            Ok(results) => results
                .iter()
                .filter(|result| matches!(result, Ok(UnsubscribeOutcome::Unsubscribed(_))))
                .count(),
            Err(_) => {
                warn!(
                    event = events::SHUTDOWN_UNSUBSCRIBE_TIMEOUT,
                    component = COMPONENT,
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    remaining = registry.subscriptions().len(),
                    "unsubscribe phase timed out"
                );
                0
            }
        };

        if let Err(err) = self.directory.deregister().await {
            warn!(
                event = events::DIRECTORY_DEREGISTER_FAILED,
                component = COMPONENT,
                err = %err,
                "directory deregistration failed"
            );
        }

        let result = self.stop_server().await;
        info!(
            event = events::SHUTDOWN_COMPLETE,
            component = COMPONENT,
            removed,
            "nwdaf streamer stopped"
        );
        result
    }

    async fn stop_server(self) -> Result<(), StartupError> {
        let _ = self.stop_tx.send(());
        match self.server.await {
            Ok(result) => result.map_err(StartupError::Serve),
            Err(join_err) => Err(StartupError::Serve(std::io::Error::other(join_err))),
        }
    }
}
