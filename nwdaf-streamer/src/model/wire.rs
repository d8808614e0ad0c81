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

//! Notification envelopes as pushed by producers, and their conversion into typed reports.
//!
//! Event type strings are kept as plain strings here so an unknown kind can be told apart from
//! a malformed body: the former is resolved against [`EventKind`] during conversion.

use crate::error::NotificationError;
use crate::model::event_report::{CmInfo, EventReport, MobilityEvent, SessionEvent};
use crate::model::target::{EventKind, TargetType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope pushed to `/nnwdaf-amfEvents`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfEventNotification {
    #[serde(default)]
    pub notify_correlation_id: String,
    #[serde(default)]
    pub report_list: Vec<AmfEventReport>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfEventReport {
    #[serde(rename = "type")]
    pub kind: String,
    pub time_stamp: Option<DateTime<Utc>>,
    pub supi: Option<String>,
    pub state: Option<AmfEventState>,
    pub location: Option<UserLocation>,
    pub timezone: Option<String>,
    pub access_type_list: Option<Vec<String>>,
    pub cm_info_list: Option<Vec<WireCmInfo>>,
    pub reachability: Option<String>,
    pub number_of_ues: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AmfEventState {
    pub active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    pub nr_location: Option<NrLocation>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NrLocation {
    pub tai: Option<Tai>,
    pub ncgi: Option<Ncgi>,
    pub ue_location_timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Tai {
    pub tac: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ncgi {
    pub nr_cell_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCmInfo {
    pub cm_state: String,
    pub access_type: String,
}

/// Envelope pushed to `/nnwdaf-smfEvents`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NsmfEventExposureNotification {
    #[serde(default)]
    pub notif_id: String,
    #[serde(default)]
    pub event_notifs: Vec<SmfEventNotification>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmfEventNotification {
    pub event: String,
    pub time_stamp: Option<DateTime<Utc>>,
    pub supi: Option<String>,
    pub pdu_se_id: Option<u8>,
    pub acc_type: Option<String>,
    pub plmn_id: Option<PlmnId>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

/// Globally unique AMF identifier.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Guami {
    pub plmn_id: PlmnId,
    pub amf_id: String,
}

/// Body pushed to `/nnwdaf-amfStatus`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfStatusChangeNotification {
    #[serde(default)]
    pub amf_status_info_list: Vec<AmfStatusInfo>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfStatusInfo {
    pub status_change: String,
    pub target_amf_removal: Option<String>,
    pub target_amf_failure: Option<String>,
}

/// Common view over both envelope shapes used by the router.
pub trait NotificationEnvelope {
    type Report;

    const TARGET: TargetType;

    fn correlation_id(&self) -> &str;

    fn reports(&self) -> &[Self::Report];
}

impl NotificationEnvelope for AmfEventNotification {
    type Report = AmfEventReport;

    const TARGET: TargetType = TargetType::Amf;

    fn correlation_id(&self) -> &str {
        &self.notify_correlation_id
    }

    fn reports(&self) -> &[AmfEventReport] {
        &self.report_list
    }
}

impl NotificationEnvelope for NsmfEventExposureNotification {
    type Report = SmfEventNotification;

    const TARGET: TargetType = TargetType::Smf;

    fn correlation_id(&self) -> &str {
        &self.notif_id
    }

    fn reports(&self) -> &[SmfEventNotification] {
        &self.event_notifs
    }
}

fn missing(kind: EventKind, field: &str) -> NotificationError {
    NotificationError::MalformedPayload(format!("{kind} report is missing `{field}`"))
}

fn required<T>(value: Option<T>, kind: EventKind, field: &str) -> Result<T, NotificationError> {
    value.ok_or_else(|| missing(kind, field))
}

impl TryFrom<&AmfEventReport> for EventReport<MobilityEvent> {
    type Error = NotificationError;

    fn try_from(report: &AmfEventReport) -> Result<Self, Self::Error> {
        let kind = EventKind::from_wire(TargetType::Amf, &report.kind)
            .ok_or_else(|| NotificationError::UnsupportedEventKind(report.kind.clone()))?;

        let event = match kind {
            EventKind::RegistrationState => {
                required(report.supi.as_ref(), kind, "supi")?;
                let state = required(report.state.as_ref(), kind, "state")?;
                MobilityEvent::RegistrationState {
                    active: state.active,
                    number_of_ues: report.number_of_ues,
                }
            }
            EventKind::Location => {
                required(report.supi.as_ref(), kind, "supi")?;
                let nr_location = required(
                    report
                        .location
                        .as_ref()
                        .and_then(|location| location.nr_location.as_ref()),
                    kind,
                    "location.nrLocation",
                )?;
                let tai = required(nr_location.tai.as_ref(), kind, "location.nrLocation.tai")?;
                let ncgi = required(nr_location.ncgi.as_ref(), kind, "location.nrLocation.ncgi")?;
                MobilityEvent::Location {
                    tac: tai.tac.clone(),
                    nr_cell_id: ncgi.nr_cell_id.clone(),
                    reported_at: nr_location.ue_location_timestamp,
                }
            }
            EventKind::PresenceInAoi => MobilityEvent::PresenceInAoi,
            EventKind::Timezone => {
                required(report.supi.as_ref(), kind, "supi")?;
                MobilityEvent::Timezone(required(report.timezone.clone(), kind, "timezone")?)
            }
            EventKind::AccessType => {
                required(report.supi.as_ref(), kind, "supi")?;
                MobilityEvent::AccessType(required(
                    report.access_type_list.clone(),
                    kind,
                    "accessTypeList",
                )?)
            }
            EventKind::ConnectivityState => {
                required(report.supi.as_ref(), kind, "supi")?;
                let entries = required(report.cm_info_list.as_ref(), kind, "cmInfoList")?;
                MobilityEvent::ConnectivityState(
                    entries
                        .iter()
                        .map(|entry| CmInfo {
                            cm_state: entry.cm_state.clone(),
                            access_type: entry.access_type.clone(),
                        })
                        .collect(),
                )
            }
            EventKind::Reachability => {
                required(report.supi.as_ref(), kind, "supi")?;
                MobilityEvent::Reachability(required(
                    report.reachability.clone(),
                    kind,
                    "reachability",
                )?)
            }
            EventKind::UesInArea => MobilityEvent::UesInArea,
            EventKind::SessionEstablished
            | EventKind::SessionReleased
            | EventKind::SessionAccessTypeChange
            | EventKind::PlmnChange
            | EventKind::UpPathChange => {
                return Err(NotificationError::UnsupportedEventKind(report.kind.clone()))
            }
        };

        Ok(EventReport {
            subject_id: report.supi.clone(),
            timestamp: report.time_stamp,
            event,
        })
    }
}

impl TryFrom<&SmfEventNotification> for EventReport<SessionEvent> {
    type Error = NotificationError;

    fn try_from(report: &SmfEventNotification) -> Result<Self, Self::Error> {
        let kind = EventKind::from_wire(TargetType::Smf, &report.event)
            .ok_or_else(|| NotificationError::UnsupportedEventKind(report.event.clone()))?;

        let event = match kind {
            EventKind::SessionEstablished => {
                required(report.supi.as_ref(), kind, "supi")?;
                SessionEvent::SessionEstablished {
                    pdu_session_id: required(report.pdu_se_id, kind, "pduSeId")?,
                }
            }
            EventKind::SessionReleased => {
                required(report.supi.as_ref(), kind, "supi")?;
                SessionEvent::SessionReleased {
                    pdu_session_id: required(report.pdu_se_id, kind, "pduSeId")?,
                }
            }
            EventKind::SessionAccessTypeChange => {
                SessionEvent::AccessTypeChange(required(report.acc_type.clone(), kind, "accType")?)
            }
            EventKind::PlmnChange => {
                let plmn = required(report.plmn_id.as_ref(), kind, "plmnId")?;
                SessionEvent::PlmnChange {
                    mcc: plmn.mcc.clone(),
                    mnc: plmn.mnc.clone(),
                }
            }
            EventKind::UpPathChange => SessionEvent::UpPathChange,
            EventKind::RegistrationState
            | EventKind::Location
            | EventKind::PresenceInAoi
            | EventKind::Timezone
            | EventKind::AccessType
            | EventKind::ConnectivityState
            | EventKind::Reachability
            | EventKind::UesInArea => {
                return Err(NotificationError::UnsupportedEventKind(report.event.clone()))
            }
        };

        Ok(EventReport {
            subject_id: report.supi.clone(),
            timestamp: report.time_stamp,
            event,
        })
    }
}
