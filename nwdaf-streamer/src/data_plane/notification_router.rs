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

//! HTTP surface: notification intake, AMF status changes, commands and metrics.

use crate::control_plane::command::{CommandReply, CommandStatus, CommandSurface};
use crate::control_plane::subscription_registry::SubscriptionRegistry;
use crate::data_plane::dispatch::DispatchReport;
use crate::data_plane::problem::{notification_status, ProblemDetails};
use crate::error::NotificationError;
use crate::model::target::TargetType;
use crate::model::wire::{
    AmfEventNotification, AmfStatusChangeNotification, NotificationEnvelope,
    NsmfEventExposureNotification,
};
use crate::observability::{events, fields};
use crate::sink::{EventSink, Signal};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "notification_router";

pub const AMF_EVENTS_PATH: &str = "/nnwdaf-amfEvents";
pub const SMF_EVENTS_PATH: &str = "/nnwdaf-smfEvents";
pub const AMF_STATUS_PATH: &str = "/nnwdaf-amfStatus";
pub const COMMAND_PATH: &str = "/nwdaf/command";
pub const METRICS_PATH: &str = "/metrics";

/// What to do with a notification whose correlation id matches no subscription.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationPolicy {
    /// Reject with 404; nothing is dispatched.
    #[default]
    Enforce,
    /// Dispatch anyway. The mismatch is still logged and counted.
    Permissive,
}

/// Open/closed switch for notification intake. Closing it is the first step of shutdown.
#[derive(Clone, Debug)]
pub struct AcceptGate(Arc<AtomicBool>);

impl AcceptGate {
    pub fn open() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn close(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for AcceptGate {
    fn default() -> Self {
        Self::open()
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<SubscriptionRegistry>,
    sink: Arc<dyn EventSink>,
    commands: Arc<CommandSurface>,
    policy: CorrelationPolicy,
    gate: AcceptGate,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(commands: Arc<CommandSurface>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry: commands.registry().clone(),
            sink,
            commands,
            policy: CorrelationPolicy::default(),
            gate: AcceptGate::open(),
            metrics: None,
        }
    }

    pub fn with_policy(mut self, policy: CorrelationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn gate(&self) -> &AcceptGate {
        &self.gate
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn commands(&self) -> &Arc<CommandSurface> {
        &self.commands
    }

    /// Passes when the correlation id belongs to a subscription of `target`.
    async fn check_correlation(
        &self,
        target: TargetType,
        correlation_id: &str,
    ) -> Result<(), NotificationError> {
        let matched = self.registry.lookup(correlation_id);
        let reason = match &matched {
            Some(subscription) if subscription.target() == target => return Ok(()),
            Some(_) => fields::REASON_TARGET_MISMATCH,
            None => fields::REASON_UNKNOWN_CORRELATION,
        };

        warn!(
            event = events::NOTIFICATION_UNCORRELATED,
            component = COMPONENT,
            target = target.as_str(),
            correlation_id,
            subscription_id = fields::format_subscription_id(matched.as_ref()).as_str(),
            reason,
            policy = ?self.policy,
            "notification does not match a subscription"
        );
        self.sink
            .record(Signal::UncorrelatedNotification { target })
            .await;

        match self.policy {
            CorrelationPolicy::Enforce => Err(NotificationError::UnknownCorrelation(
                correlation_id.to_string(),
            )),
            CorrelationPolicy::Permissive => Ok(()),
        }
    }
}

/// Builds the router serving every inbound endpoint.
pub fn notification_router(state: AppState) -> Router {
    Router::new()
        .route(
            AMF_EVENTS_PATH,
            post(receive_notification::<AmfEventNotification>),
        )
        .route(
            SMF_EVENTS_PATH,
            post(receive_notification::<NsmfEventExposureNotification>),
        )
        .route(
            AMF_STATUS_PATH,
            post(receive_amf_status).fallback(method_not_allowed),
        )
        .route(COMMAND_PATH, post(receive_command))
        .route(METRICS_PATH, get(render_metrics))
        .with_state(state)
}

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, NotificationError> {
    body.map_err(|rejection| NotificationError::BodyUnreadable(rejection.body_text()))
}

async fn route_envelope<E>(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<usize, NotificationError>
where
    E: NotificationEnvelope + DeserializeOwned + Send + Sync,
    E::Report: DispatchReport + Send + Sync,
{
    if !state.gate.is_open() {
        return Err(NotificationError::ShuttingDown);
    }

    let body = read_body(body)?;
    let envelope: E = serde_json::from_slice(&body)
        .map_err(|err| NotificationError::MalformedPayload(err.to_string()))?;
    if envelope.reports().is_empty() {
        return Err(NotificationError::MalformedPayload(
            "report list is empty".to_string(),
        ));
    }

    state
        .check_correlation(E::TARGET, envelope.correlation_id())
        .await?;

    for report in envelope.reports() {
        let signals = match report.signals() {
            Ok(signals) => signals,
            Err(err) => {
                if matches!(err, NotificationError::UnsupportedEventKind(_)) {
                    warn!(
                        event = events::NOTIFICATION_UNSUPPORTED_KIND,
                        component = COMPONENT,
                        target = E::TARGET.as_str(),
                        kind = report.wire_kind(),
                        "unsupported event kind; stopping dispatch"
                    );
                }
                return Err(err);
            }
        };

        for signal in signals {
            state.sink.record(signal).await;
        }
        debug!(
            event = events::NOTIFICATION_REPORT_DISPATCHED,
            component = COMPONENT,
            target = E::TARGET.as_str(),
            kind = report.wire_kind(),
            "report dispatched"
        );
    }

    Ok(envelope.reports().len())
}

async fn receive_notification<E>(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    E: NotificationEnvelope + DeserializeOwned + Send + Sync,
    E::Report: DispatchReport + Send + Sync,
{
    match route_envelope::<E>(&state, body).await {
        Ok(reports) => {
            debug!(
                event = events::NOTIFICATION_RECEIVE,
                component = COMPONENT,
                target = E::TARGET.as_str(),
                reports,
                "notification accepted"
            );
            StatusCode::OK.into_response()
        }
        Err(err) => {
            warn!(
                event = events::NOTIFICATION_REJECTED,
                component = COMPONENT,
                target = E::TARGET.as_str(),
                status = notification_status(&err).as_u16(),
                err = %err,
                "notification rejected"
            );
            err.into_response()
        }
    }
}

async fn route_amf_status(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<(), NotificationError> {
    if !state.gate.is_open() {
        return Err(NotificationError::ShuttingDown);
    }

    let body = read_body(body)?;
    let notification: AmfStatusChangeNotification = serde_json::from_slice(&body)
        .map_err(|err| NotificationError::MalformedPayload(err.to_string()))?;
    if notification.amf_status_info_list.is_empty() {
        return Err(NotificationError::MalformedPayload(
            "amfStatusInfoList is empty".to_string(),
        ));
    }

    for info in notification.amf_status_info_list {
        info!(
            event = events::AMF_STATUS_CHANGE,
            component = COMPONENT,
            status = info.status_change.as_str(),
            "AMF status changed"
        );
        state
            .sink
            .record(Signal::AmfStatusChange {
                status: info.status_change,
            })
            .await;
    }
    Ok(())
}

async fn receive_amf_status(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match route_amf_status(&state, body).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => ProblemDetails::from(&err).into_response(),
    }
}

async fn method_not_allowed() -> Response {
    (
        [(header::ALLOW, "POST")],
        ProblemDetails::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "only POST is accepted on this endpoint",
        ),
    )
        .into_response()
}

async fn receive_command(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    // No producer subscription may be opened once shutdown has begun.
    if !state.gate.is_open() {
        warn!(
            event = events::COMMAND_REJECTED,
            component = COMPONENT,
            reason = fields::REASON_SHUTTING_DOWN,
            "command rejected"
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(CommandReply::shutting_down()),
        )
            .into_response();
    }

    let reply = match body {
        Ok(body) => state.commands.handle(&body).await,
        Err(rejection) => CommandReply::invalid_request(rejection.body_text()),
    };
    let status = match reply.status {
        CommandStatus::Ok => StatusCode::OK,
        CommandStatus::InvalidRequest => StatusCode::BAD_REQUEST,
        CommandStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        CommandStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(reply)).into_response()
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => ProblemDetails::new(StatusCode::NOT_FOUND, "no metrics recorder installed")
            .into_response(),
    }
}
