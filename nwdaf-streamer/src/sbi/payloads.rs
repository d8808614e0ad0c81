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

//! JSON bodies exchanged with producer event-exposure services.

use crate::model::wire::Guami;
use serde::{Deserialize, Serialize};

pub const AMF_SUBSCRIPTIONS_PATH: &str = "/namf-evts/v1/subscriptions";
pub const SMF_SUBSCRIPTIONS_PATH: &str = "/nsmf-event-exposure/v1/subscriptions";
pub const AMF_STATUS_SUBSCRIPTIONS_PATH: &str = "/namf-comm/v1/subscriptions";

/// `AMFStatusChangeSubscribe` body of the AMF communication service.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfStatusSubscriptionData {
    pub amf_status_uri: String,
    pub guami_list: Vec<Guami>,
}

/// Create body in the dialect of the target producer.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum CreateSubscriptionBody {
    Amf(AmfCreateEventSubscription),
    Smf(NsmfEventExposure),
}

#[derive(Clone, Debug, Serialize)]
pub struct AmfCreateEventSubscription {
    pub subscription: AmfEventSubscription,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfEventSubscription {
    pub event_list: Vec<AmfEvent>,
    pub event_notify_uri: String,
    pub notify_correlation_id: String,
    pub nf_id: String,
    #[serde(rename = "anyUE")]
    pub any_ue: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub immediate_flag: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmfCreatedEventSubscription {
    #[serde(default)]
    pub subscription_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NsmfEventExposure {
    pub event_subs: Vec<SmfEventSubscription>,
    pub notif_uri: String,
    pub notif_id: String,
    pub any_ue_ind: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SmfEventSubscription {
    pub event: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NsmfEventExposureCreated {
    #[serde(default)]
    pub sub_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{AmfCreateEventSubscription, AmfEvent, AmfEventSubscription};
    use serde_json::json;

    #[test]
    fn amf_subscription_uses_3gpp_field_names() {
        let body = AmfCreateEventSubscription {
            subscription: AmfEventSubscription {
                event_list: vec![AmfEvent {
                    kind: "LOCATION_REPORT".to_string(),
                    immediate_flag: true,
                }],
                event_notify_uri: "http://127.0.0.1:8000/nnwdaf-amfEvents".to_string(),
                notify_correlation_id: "corr-1".to_string(),
                nf_id: "nwdaf-1".to_string(),
                any_ue: true,
            },
        };

        assert_eq!(
            serde_json::to_value(&body).expect("serializes"),
            json!({
                "subscription": {
                    "eventList": [{ "type": "LOCATION_REPORT", "immediateFlag": true }],
                    "eventNotifyUri": "http://127.0.0.1:8000/nnwdaf-amfEvents",
                    "notifyCorrelationId": "corr-1",
                    "nfId": "nwdaf-1",
                    "anyUE": true
                }
            })
        );
    }
}
