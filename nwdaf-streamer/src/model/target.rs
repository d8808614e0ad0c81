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

//! Producer targets, event kinds and per-target event filters.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Kind of producing network function a subscription is held against.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Mobility management (AMF event exposure).
    Amf,
    /// Session management (SMF event exposure).
    Smf,
}

impl TargetType {
    pub const ALL: [TargetType; 2] = [TargetType::Amf, TargetType::Smf];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Amf => "amf",
            TargetType::Smf => "smf",
        }
    }

    /// NF type string used by the directory service.
    pub fn nf_type(&self) -> &'static str {
        match self {
            TargetType::Amf => "AMF",
            TargetType::Smf => "SMF",
        }
    }
}

impl Display for TargetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown target `{0}`; must be 'amf' or 'smf'")]
pub struct UnknownTarget(pub String);

impl FromStr for TargetType {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amf" => Ok(TargetType::Amf),
            "smf" => Ok(TargetType::Smf),
            other => Err(UnknownTarget(other.to_string())),
        }
    }
}

/// Closed set of event kinds the streamer knows how to subscribe to and dispatch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventKind {
    RegistrationState,
    Location,
    PresenceInAoi,
    Timezone,
    AccessType,
    ConnectivityState,
    Reachability,
    UesInArea,
    SessionEstablished,
    SessionReleased,
    SessionAccessTypeChange,
    PlmnChange,
    UpPathChange,
}

impl EventKind {
    pub const MOBILITY: [EventKind; 8] = [
        EventKind::RegistrationState,
        EventKind::Location,
        EventKind::PresenceInAoi,
        EventKind::Timezone,
        EventKind::AccessType,
        EventKind::ConnectivityState,
        EventKind::Reachability,
        EventKind::UesInArea,
    ];

    pub const SESSION: [EventKind; 5] = [
        EventKind::SessionEstablished,
        EventKind::SessionReleased,
        EventKind::SessionAccessTypeChange,
        EventKind::PlmnChange,
        EventKind::UpPathChange,
    ];

    /// Event type string as it appears on the producer's SBI.
    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::RegistrationState => "REGISTRATION_STATE_REPORT",
            EventKind::Location => "LOCATION_REPORT",
            EventKind::PresenceInAoi => "PRESENCE_IN_AOI_REPORT",
            EventKind::Timezone => "TIMEZONE_REPORT",
            EventKind::AccessType => "ACCESS_TYPE_REPORT",
            EventKind::ConnectivityState => "CONNECTIVITY_STATE_REPORT",
            EventKind::Reachability => "REACHABILITY_REPORT",
            EventKind::UesInArea => "UES_IN_AREA_REPORT",
            EventKind::SessionEstablished => "PDU_SES_EST",
            EventKind::SessionReleased => "PDU_SES_REL",
            EventKind::SessionAccessTypeChange => "AC_TY_CH",
            EventKind::PlmnChange => "PLMN_CH",
            EventKind::UpPathChange => "UP_PATH_CH",
        }
    }

    pub fn target(&self) -> TargetType {
        if Self::MOBILITY.contains(self) {
            TargetType::Amf
        } else {
            TargetType::Smf
        }
    }

    /// Resolves a wire name within one target's vocabulary.
    ///
    /// Returns `None` for names the target does not publish or this crate does not handle.
    pub fn from_wire(target: TargetType, name: &str) -> Option<EventKind> {
        let kinds: &[EventKind] = match target {
            TargetType::Amf => &Self::MOBILITY,
            TargetType::Smf => &Self::SESSION,
        };
        kinds.iter().copied().find(|kind| kind.wire_name() == name)
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("event `{event}` is not a known {target} event")]
pub struct InvalidEventFilter {
    pub target: TargetType,
    pub event: String,
}

/// Ordered, de-duplicated set of event kinds covered by one subscription.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventFilter {
    target: TargetType,
    kinds: Vec<EventKind>,
}

impl EventFilter {
    pub fn new(target: TargetType, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        let mut ordered = Vec::new();
        for kind in kinds {
            if kind.target() == target && !ordered.contains(&kind) {
                ordered.push(kind);
            }
        }
        Self {
            target,
            kinds: ordered,
        }
    }

    /// Builds a filter from configured event names, rejecting names outside the target's set.
    pub fn from_names<S: AsRef<str>>(
        target: TargetType,
        names: &[S],
    ) -> Result<Self, InvalidEventFilter> {
        let kinds = names
            .iter()
            .map(|name| {
                EventKind::from_wire(target, name.as_ref()).ok_or_else(|| InvalidEventFilter {
                    target,
                    event: name.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(target, kinds))
    }

    /// Every event kind the target publishes, in canonical order.
    pub fn all(target: TargetType) -> Self {
        match target {
            TargetType::Amf => Self::new(target, EventKind::MOBILITY),
            TargetType::Smf => Self::new(target, EventKind::SESSION),
        }
    }

    pub fn target(&self) -> TargetType {
        self.target
    }

    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
