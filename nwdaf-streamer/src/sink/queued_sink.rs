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

//! Bounded-queue wrapper that moves sink writes off the request path.

use crate::observability::events;
use crate::sink::signal::Signal;
use crate::sink::EventSink;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

const COMPONENT: &str = "queued_sink";

/// Forwards signals to an inner sink from a single worker task.
///
/// `record` never waits on the inner sink: when the queue is full the signal is dropped
/// and a warning is logged. Must be created inside a tokio runtime.
pub struct QueuedEventSink {
    sender: mpsc::Sender<Signal>,
    dropped: Arc<AtomicU64>,
}

impl QueuedEventSink {
    pub fn new(inner: Arc<dyn EventSink>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(Self::forward_loop(inner, receiver));
        Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Signals discarded because the queue was full or the worker was gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    async fn forward_loop(inner: Arc<dyn EventSink>, mut receiver: mpsc::Receiver<Signal>) {
        while let Some(signal) = receiver.recv().await {
            inner.record(signal).await;
        }
        debug!(
            event = events::SINK_QUEUE_CLOSED,
            component = COMPONENT,
            "sink queue closed; worker exiting"
        );
    }
}

#[async_trait]
impl EventSink for QueuedEventSink {
    async fn record(&self, signal: Signal) {
        match self.sender.try_send(signal) {
            Ok(()) => {}
            Err(TrySendError::Full(signal)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    event = events::SINK_QUEUE_FULL,
                    component = COMPONENT,
                    dropped,
                    signal = ?signal,
                    "sink queue full; dropping signal"
                );
            }
            Err(TrySendError::Closed(signal)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event = events::SINK_QUEUE_CLOSED,
                    component = COMPONENT,
                    signal = ?signal,
                    "sink worker is gone; dropping signal"
                );
            }
        }
    }
}
