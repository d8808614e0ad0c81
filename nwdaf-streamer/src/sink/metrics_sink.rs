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

//! `metrics`-facade sink. Whatever recorder the process installed receives the values.

use crate::sink::signal::{SessionDirection, Signal};
use crate::sink::EventSink;
use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_gauge, gauge, Label};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

pub const ACTIVE_UES: &str = "nwdaf_active_ues";
pub const UE_REGISTRATION_STATE: &str = "nwdaf_ue_registration_state";
pub const REGISTRATION_STATE_EVENTS_TOTAL: &str = "nwdaf_registration_state_events_total";
pub const UE_LOCATION: &str = "nwdaf_ue_location";
pub const UE_TIMEZONE: &str = "nwdaf_ue_timezone";
pub const UE_ACCESS_TYPE: &str = "nwdaf_ue_access_type";
pub const UE_REACHABILITY: &str = "nwdaf_ue_reachability";
pub const UE_CONNECTIVITY: &str = "nwdaf_ue_connectivity";
pub const ACTIVE_PDU_SESSIONS: &str = "nwdaf_active_pdu_sessions";
pub const PDU_SESSION_EVENTS_TOTAL: &str = "nwdaf_pdu_session_events_total";
pub const EVENT_REPORTS_TOTAL: &str = "nwdaf_event_reports_total";
pub const AMF_STATUS_CHANGES_TOTAL: &str = "nwdaf_amf_status_changes_total";
pub const UNCORRELATED_NOTIFICATIONS_TOTAL: &str = "nwdaf_uncorrelated_notifications_total";

/// Registers help text for every metric this sink writes. Call once after installing a recorder.
pub fn describe_metrics() {
    describe_gauge!(ACTIVE_UES, "Registered subscribers as last reported by the AMF");
    describe_gauge!(UE_REGISTRATION_STATE, "Registration state per SUPI (1 registered, 0 not)");
    describe_counter!(
        REGISTRATION_STATE_EVENTS_TOTAL,
        "Registration state reports per SUPI and state"
    );
    describe_gauge!(UE_LOCATION, "Last reported NR location per SUPI");
    describe_gauge!(UE_TIMEZONE, "Last reported timezone per SUPI");
    describe_gauge!(UE_ACCESS_TYPE, "Reported access types per SUPI");
    describe_gauge!(UE_REACHABILITY, "Last reported reachability per SUPI");
    describe_gauge!(UE_CONNECTIVITY, "Connection-management state per SUPI and access type");
    describe_gauge!(ACTIVE_PDU_SESSIONS, "PDU sessions currently established");
    describe_counter!(
        PDU_SESSION_EVENTS_TOTAL,
        "PDU session establishments and releases"
    );
    describe_counter!(EVENT_REPORTS_TOTAL, "Dispatched event reports per kind");
    describe_counter!(AMF_STATUS_CHANGES_TOTAL, "AMF status changes per status");
    describe_counter!(
        UNCORRELATED_NOTIFICATIONS_TOTAL,
        "Notifications whose correlation id matched no subscription"
    );
}

type SeriesKey = (&'static str, String);

/// Writes signals as gauges and counters.
///
/// Per-SUPI state gauges keep one series at 1: a new value zeroes the series it replaces.
#[derive(Debug, Default)]
pub struct MetricsEventSink {
    current: Mutex<HashMap<SeriesKey, Vec<Label>>>,
}

impl MetricsEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark_current(&self, name: &'static str, subject_id: &str, labels: Vec<Label>) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((name, subject_id.to_string()), labels.clone());
        if let Some(previous) = previous.filter(|previous| *previous != labels) {
            gauge!(name, previous).set(0.0);
        }
        gauge!(name, labels).set(1.0);
    }

    /// Writes one signal into the current recorder.
    pub fn apply(&self, signal: &Signal) {
        match signal {
            Signal::ActiveSubscribers { count } => {
                gauge!(ACTIVE_UES, "state" => "current").set(*count as f64);
            }
            Signal::RegistrationState { subject_id, active } => {
                let value = if *active { 1.0 } else { 0.0 };
                let state = if *active { "registered" } else { "deregistered" };
                gauge!(UE_REGISTRATION_STATE, "supi" => subject_id.clone()).set(value);
                counter!(
                    REGISTRATION_STATE_EVENTS_TOTAL,
                    "supi" => subject_id.clone(),
                    "state" => state
                )
                .increment(1);
            }
            Signal::Location {
                subject_id,
                tac,
                nr_cell_id,
                reported_at,
            } => self.mark_current(
                UE_LOCATION,
                subject_id,
                vec![
                    Label::new("supi", subject_id.clone()),
                    Label::new("tac", tac.clone()),
                    Label::new("nr_cell_id", nr_cell_id.clone()),
                    Label::new("time", reported_at.clone()),
                ],
            ),
            Signal::Timezone {
                subject_id,
                timezone,
            } => self.mark_current(
                UE_TIMEZONE,
                subject_id,
                vec![
                    Label::new("supi", subject_id.clone()),
                    Label::new("timezone", timezone.clone()),
                ],
            ),
            // Several access types can be in use at once; each keeps its own series.
            Signal::AccessType {
                subject_id,
                access_type,
            } => {
                gauge!(
                    UE_ACCESS_TYPE,
                    "supi" => subject_id.clone(),
                    "access_type" => access_type.clone()
                )
                .set(1.0);
            }
            Signal::Reachability {
                subject_id,
                reachability,
            } => self.mark_current(
                UE_REACHABILITY,
                subject_id,
                vec![
                    Label::new("supi", subject_id.clone()),
                    Label::new("reachability", reachability.clone()),
                ],
            ),
            Signal::Connectivity {
                subject_id,
                cm_state,
                access_type,
            } => self.mark_current(
                UE_CONNECTIVITY,
                subject_id,
                vec![
                    Label::new("supi", subject_id.clone()),
                    Label::new("cm_state", cm_state.clone()),
                    Label::new("access_type", access_type.clone()),
                ],
            ),
            Signal::PduSession {
                subject_id,
                pdu_session_id,
                direction,
            } => {
                let active = gauge!(ACTIVE_PDU_SESSIONS, "state" => "active");
                match direction {
                    SessionDirection::Established => active.increment(1.0),
                    SessionDirection::Released => active.decrement(1.0),
                }
                counter!(
                    PDU_SESSION_EVENTS_TOTAL,
                    "supi" => subject_id.clone(),
                    "pdu_session_id" => pdu_session_id.to_string(),
                    "direction" => direction.as_str()
                )
                .increment(1);
            }
            Signal::EventReported { kind } => {
                counter!(EVENT_REPORTS_TOTAL, "kind" => kind.wire_name()).increment(1);
            }
            Signal::AmfStatusChange { status } => {
                counter!(AMF_STATUS_CHANGES_TOTAL, "status" => status.clone()).increment(1);
            }
            Signal::UncorrelatedNotification { target } => {
                counter!(UNCORRELATED_NOTIFICATIONS_TOTAL, "target" => target.as_str())
                    .increment(1);
            }
        }
    }
}

#[async_trait]
impl EventSink for MetricsEventSink {
    async fn record(&self, signal: Signal) {
        self.apply(&signal);
    }
}
