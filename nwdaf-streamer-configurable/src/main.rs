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

mod config;

use crate::config::Config;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use nwdaf_streamer::sink::metrics_sink::describe_metrics;
use nwdaf_streamer::{
    AppState, CommandSurface, EventSink, HttpSubscriptionClient, MetricsEventSink, NfProfile,
    NrfDirectoryClient, NwdafStreamer, QueuedEventSink, SubscriptionRegistry,
};
use std::error::Error;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(version, about)]
struct StreamerArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = StreamerArgs::parse();
    let config = Config::load(&args.config)?;
    let templates = config.subscription_templates()?;
    let nf_instance_id = config
        .nf_instance_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(
        config = args.config.as_str(),
        nf_instance_id = nf_instance_id.as_str(),
        "Started nwdaf-streamer-configurable"
    );

    let prometheus = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();

    let profile = NfProfile::nwdaf(
        &nf_instance_id,
        &config.sbi.scheme,
        &config.sbi.register_ipv4,
        config.sbi.port,
        config.plmn.clone(),
        config.snssais.clone(),
    );
    let directory = Arc::new(NrfDirectoryClient::new(
        &config.nrf_uri,
        profile,
        &config.sbi.scheme,
        config.producer_port,
    )?);
    let producers = Arc::new(HttpSubscriptionClient::new(nf_instance_id.as_str())?);
    let registry = Arc::new(SubscriptionRegistry::new(producers));
    let commands = Arc::new(CommandSurface::new(registry, directory.clone(), templates));

    let metrics_sink: Arc<dyn EventSink> = Arc::new(MetricsEventSink::new());
    let sink: Arc<dyn EventSink> = match config.notification.sink_queue_size {
        Some(capacity) => Arc::new(QueuedEventSink::new(metrics_sink, capacity)),
        None => metrics_sink,
    };

    let state = AppState::new(commands, sink)
        .with_policy(config.notification.correlation_policy)
        .with_metrics(prometheus);

    let running = NwdafStreamer::new(state, directory, config.lifecycle_settings())
        .start()
        .await?;
    info!(
        local_addr = %running.local_addr(),
        "Serving notifications; press Ctrl-C to stop"
    );

    running.run_until(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(err = %err, "unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(err = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
