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

//! Maps typed reports to the sink signals they produce.

use crate::error::NotificationError;
use crate::model::event_report::{EventReport, MobilityEvent, SessionEvent};
use crate::model::wire::{AmfEventReport, SmfEventNotification};
use crate::observability::fields;
use crate::sink::signal::{SessionDirection, Signal};

/// A wire report that can be validated and turned into sink signals.
pub trait DispatchReport {
    /// Wire event type string, for logging.
    fn wire_kind(&self) -> &str;

    fn signals(&self) -> Result<Vec<Signal>, NotificationError>;
}

impl DispatchReport for AmfEventReport {
    fn wire_kind(&self) -> &str {
        &self.kind
    }

    fn signals(&self) -> Result<Vec<Signal>, NotificationError> {
        EventReport::<MobilityEvent>::try_from(self).map(|report| mobility_signals(&report))
    }
}

impl DispatchReport for SmfEventNotification {
    fn wire_kind(&self) -> &str {
        &self.event
    }

    fn signals(&self) -> Result<Vec<Signal>, NotificationError> {
        EventReport::<SessionEvent>::try_from(self).map(|report| session_signals(&report))
    }
}

fn subject<E>(report: &EventReport<E>) -> String {
    fields::format_subject(report.subject_id.as_deref())
}

pub fn mobility_signals(report: &EventReport<MobilityEvent>) -> Vec<Signal> {
    let mut signals = vec![Signal::EventReported {
        kind: report.event.kind(),
    }];

    match &report.event {
        MobilityEvent::RegistrationState {
            active,
            number_of_ues,
        } => {
            if let Some(count) = number_of_ues {
                signals.push(Signal::ActiveSubscribers { count: *count });
            }
            signals.push(Signal::RegistrationState {
                subject_id: subject(report),
                active: *active,
            });
        }
        MobilityEvent::Location {
            tac,
            nr_cell_id,
            reported_at,
        } => signals.push(Signal::Location {
            subject_id: subject(report),
            tac: tac.clone(),
            nr_cell_id: nr_cell_id.clone(),
            reported_at: reported_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| fields::NONE.to_string()),
        }),
        MobilityEvent::Timezone(timezone) => signals.push(Signal::Timezone {
            subject_id: subject(report),
            timezone: timezone.clone(),
        }),
        MobilityEvent::AccessType(access_types) => {
            signals.extend(access_types.iter().map(|access_type| Signal::AccessType {
                subject_id: subject(report),
                access_type: access_type.clone(),
            }));
        }
        MobilityEvent::ConnectivityState(entries) => {
            signals.extend(entries.iter().map(|entry| Signal::Connectivity {
                subject_id: subject(report),
                cm_state: entry.cm_state.clone(),
                access_type: entry.access_type.clone(),
            }));
        }
        MobilityEvent::Reachability(reachability) => signals.push(Signal::Reachability {
            subject_id: subject(report),
            reachability: reachability.clone(),
        }),
        MobilityEvent::PresenceInAoi | MobilityEvent::UesInArea => {}
    }

    signals
}

pub fn session_signals(report: &EventReport<SessionEvent>) -> Vec<Signal> {
    let mut signals = vec![Signal::EventReported {
        kind: report.event.kind(),
    }];

    match &report.event {
        SessionEvent::SessionEstablished { pdu_session_id } => signals.push(Signal::PduSession {
            subject_id: subject(report),
            pdu_session_id: *pdu_session_id,
            direction: SessionDirection::Established,
        }),
        SessionEvent::SessionReleased { pdu_session_id } => signals.push(Signal::PduSession {
            subject_id: subject(report),
            pdu_session_id: *pdu_session_id,
            direction: SessionDirection::Released,
        }),
        SessionEvent::AccessTypeChange(_)
        | SessionEvent::PlmnChange { .. }
        | SessionEvent::UpPathChange => {}
    }

    signals
}
