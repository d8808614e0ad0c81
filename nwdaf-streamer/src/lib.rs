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

//! # nwdaf-streamer
//!
//! `nwdaf-streamer` keeps an NWDAF subscribed to the event-exposure services of its AMF and SMF
//! producers and turns the reports they push back into observability signals.
//!
//! Typical usage goes through [`SubscriptionRegistry`], [`CommandSurface`] and
//! [`NwdafStreamer`]. Internal modules are organized by layer to keep behavior ownership
//! explicit:
//!
//! - `control_plane`: the per-target subscription registry and the subscribe/unsubscribe
//!   command surface.
//! - `data_plane`: the axum router receiving notifications, status changes and commands.
//! - `sbi`: outbound HTTP clients for producers and the NRF directory.
//! - `sink`: [`EventSink`] implementations fed by the router.
//! - `runtime`: startup, retry and ordered shutdown.
//!
//! ## Subscribing
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use nwdaf_streamer::{
//!     CreateSubscriptionRequest, EventFilter, ProducerEndpoint, SubscribeOutcome,
//!     SubscriptionClient, SubscriptionError, SubscriptionRegistry, TargetType,
//! };
//!
//! struct AcceptingProducer;
//!
//! #[async_trait]
//! impl SubscriptionClient for AcceptingProducer {
//!     async fn create(
//!         &self,
//!         _request: &CreateSubscriptionRequest,
//!     ) -> Result<String, SubscriptionError> {
//!         Ok("sub-1".to_string())
//!     }
//!
//!     async fn delete(
//!         &self,
//!         _producer: &ProducerEndpoint,
//!         _target: TargetType,
//!         _subscription_id: &str,
//!     ) -> Result<(), SubscriptionError> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = SubscriptionRegistry::new(Arc::new(AcceptingProducer));
//! let amf = ProducerEndpoint::new("amf-1", "http://127.0.0.18:8000");
//!
//! let first = registry
//!     .subscribe(amf.clone(), EventFilter::all(TargetType::Amf), "http://nwdaf/nnwdaf-amfEvents")
//!     .await
//!     .unwrap();
//! let second = registry
//!     .subscribe(amf, EventFilter::all(TargetType::Amf), "http://nwdaf/nnwdaf-amfEvents")
//!     .await
//!     .unwrap();
//!
//! assert_eq!(first, SubscribeOutcome::Created("sub-1".to_string()));
//! assert_eq!(second, SubscribeOutcome::AlreadySubscribed("sub-1".to_string()));
//! # });
//! ```
//!
//! ## Observability
//!
//! Library code emits `tracing` events carrying canonical `event` and `component` fields (see
//! `observability::events`) and never installs a subscriber. Metrics go through the `metrics`
//! facade; the binary decides which recorder is installed.

pub mod control_plane;
pub mod data_plane;
pub mod error;
pub mod model;
pub mod observability;
pub mod runtime;
pub mod sbi;
pub mod sink;

pub use control_plane::command::{
    CommandAction, CommandReply, CommandStatus, CommandSurface, SubscriptionTemplate,
    SubscriptionTemplates,
};
pub use control_plane::subscription_registry::{
    SubscribeOutcome, SubscriptionRegistry, UnsubscribeOutcome,
};
pub use data_plane::notification_router::{
    notification_router, AcceptGate, AppState, CorrelationPolicy,
};
pub use error::{DirectoryError, NotificationError, StartupError, SubscriptionError};
pub use model::subscription::{ProducerEndpoint, Subscription, SubscriptionState};
pub use model::target::{EventFilter, EventKind, TargetType};
pub use runtime::lifecycle::{LifecycleSettings, NwdafStreamer, RunningStreamer};
pub use runtime::retry::RetryPolicy;
pub use sbi::directory_client::{DirectoryClient, NfProfile, NrfDirectoryClient, Snssai};
pub use sbi::subscription_client::{
    AmfStatusSubscription, CreateSubscriptionRequest, HttpSubscriptionClient, SubscriptionClient,
};
pub use sink::{EventSink, MetricsEventSink, QueuedEventSink, Signal};
