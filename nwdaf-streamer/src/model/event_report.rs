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

//! Typed event reports produced from validated notification envelopes.

use crate::model::target::EventKind;
use chrono::{DateTime, Utc};

/// One validated report. `E` is [`MobilityEvent`] or [`SessionEvent`].
#[derive(Clone, Debug, PartialEq)]
pub struct EventReport<E> {
    /// Subscriber (SUPI) the event pertains to; absent for network-wide events.
    pub subject_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub event: E,
}

/// Connection-management state of a UE on one access type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CmInfo {
    pub cm_state: String,
    pub access_type: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MobilityEvent {
    RegistrationState {
        active: bool,
        number_of_ues: Option<u64>,
    },
    Location {
        tac: String,
        nr_cell_id: String,
        reported_at: Option<DateTime<Utc>>,
    },
    PresenceInAoi,
    Timezone(String),
    AccessType(Vec<String>),
    ConnectivityState(Vec<CmInfo>),
    Reachability(String),
    UesInArea,
}

impl MobilityEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MobilityEvent::RegistrationState { .. } => EventKind::RegistrationState,
            MobilityEvent::Location { .. } => EventKind::Location,
            MobilityEvent::PresenceInAoi => EventKind::PresenceInAoi,
            MobilityEvent::Timezone(_) => EventKind::Timezone,
            MobilityEvent::AccessType(_) => EventKind::AccessType,
            MobilityEvent::ConnectivityState(_) => EventKind::ConnectivityState,
            MobilityEvent::Reachability(_) => EventKind::Reachability,
            MobilityEvent::UesInArea => EventKind::UesInArea,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    SessionEstablished { pdu_session_id: u8 },
    SessionReleased { pdu_session_id: u8 },
    AccessTypeChange(String),
    PlmnChange { mcc: String, mnc: String },
    UpPathChange,
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::SessionEstablished { .. } => EventKind::SessionEstablished,
            SessionEvent::SessionReleased { .. } => EventKind::SessionReleased,
            SessionEvent::AccessTypeChange(_) => EventKind::SessionAccessTypeChange,
            SessionEvent::PlmnChange { .. } => EventKind::PlmnChange,
            SessionEvent::UpPathChange => EventKind::UpPathChange,
        }
    }
}
