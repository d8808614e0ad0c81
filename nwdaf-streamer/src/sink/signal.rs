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

use crate::model::target::{EventKind, TargetType};

/// Direction of a PDU session lifetime event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionDirection {
    Established,
    Released,
}

impl SessionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionDirection::Established => "established",
            SessionDirection::Released => "released",
        }
    }
}

/// One observation derived from a validated report or from the router itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// Number of registered subscribers as last reported by the AMF.
    ActiveSubscribers { count: u64 },
    RegistrationState { subject_id: String, active: bool },
    Location {
        subject_id: String,
        tac: String,
        nr_cell_id: String,
        reported_at: String,
    },
    Timezone { subject_id: String, timezone: String },
    AccessType { subject_id: String, access_type: String },
    Reachability { subject_id: String, reachability: String },
    Connectivity {
        subject_id: String,
        cm_state: String,
        access_type: String,
    },
    PduSession {
        subject_id: String,
        pdu_session_id: u8,
        direction: SessionDirection,
    },
    /// Emitted once per dispatched report, whatever its kind.
    EventReported { kind: EventKind },
    AmfStatusChange { status: String },
    UncorrelatedNotification { target: TargetType },
}
