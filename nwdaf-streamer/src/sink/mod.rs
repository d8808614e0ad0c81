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

//! Observability sinks fed by the notification router.
//!
//! The router only ever sees `Arc<dyn EventSink>`. [`MetricsEventSink`] writes straight into the
//! `metrics` facade; [`QueuedEventSink`] decouples any slower sink behind a bounded queue.

pub mod metrics_sink;
pub mod queued_sink;
pub mod signal;

use async_trait::async_trait;

pub use metrics_sink::MetricsEventSink;
pub use queued_sink::QueuedEventSink;
pub use signal::{SessionDirection, Signal};

/// Recorder for signals derived from validated reports.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, signal: Signal);
}
