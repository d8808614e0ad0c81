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

//! Create/delete requests against a producer's event-exposure service.

use crate::error::SubscriptionError;
use crate::model::subscription::ProducerEndpoint;
use crate::model::target::{EventFilter, TargetType};
use crate::model::wire::Guami;
use crate::observability::events;
use crate::sbi::payloads::{
    AmfCreateEventSubscription, AmfCreatedEventSubscription, AmfEvent, AmfEventSubscription,
    AmfStatusSubscriptionData, CreateSubscriptionBody, NsmfEventExposure,
    NsmfEventExposureCreated, SmfEventSubscription, AMF_STATUS_SUBSCRIPTIONS_PATH,
    AMF_SUBSCRIPTIONS_PATH, SMF_SUBSCRIPTIONS_PATH,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

const COMPONENT: &str = "subscription_client";

/// Timeout for one create or delete round trip.
pub const PRODUCER_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a producer needs to open a subscription on our behalf.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateSubscriptionRequest {
    pub producer: ProducerEndpoint,
    pub event_filter: EventFilter,
    pub callback_uri: String,
    pub correlation_id: String,
}

impl CreateSubscriptionRequest {
    pub fn target(&self) -> TargetType {
        self.event_filter.target()
    }
}

/// Which AMFs should report status changes, and where to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AmfStatusSubscription {
    pub guami_list: Vec<Guami>,
    pub callback_uri: String,
}

/// Single-shot producer calls. Implementations never retry on their own.
#[async_trait]
pub trait SubscriptionClient: Send + Sync {
    /// Returns the producer-assigned subscription id.
    async fn create(&self, request: &CreateSubscriptionRequest)
        -> Result<String, SubscriptionError>;

    async fn delete(
        &self,
        producer: &ProducerEndpoint,
        target: TargetType,
        subscription_id: &str,
    ) -> Result<(), SubscriptionError>;

    /// Asks an AMF to push its status changes to `subscription.callback_uri`.
    ///
    /// Clients without an AMF communication dialect answer like a producer lacking the service.
    async fn subscribe_amf_status(
        &self,
        _producer: &ProducerEndpoint,
        _subscription: &AmfStatusSubscription,
    ) -> Result<(), SubscriptionError> {
        Err(SubscriptionError::RejectedByProducer { status: 501 })
    }
}

fn subscriptions_path(target: TargetType) -> &'static str {
    match target {
        TargetType::Amf => AMF_SUBSCRIPTIONS_PATH,
        TargetType::Smf => SMF_SUBSCRIPTIONS_PATH,
    }
}

/// `reqwest`-backed client speaking the AMF and SMF event-exposure dialects.
#[derive(Clone, Debug)]
pub struct HttpSubscriptionClient {
    client: Client,
    nf_instance_id: String,
}

impl HttpSubscriptionClient {
    /// `nf_instance_id` is this consumer's own instance id, sent as `nfId` to the AMF.
    pub fn new(nf_instance_id: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(PRODUCER_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, nf_instance_id))
    }

    pub fn with_client(client: Client, nf_instance_id: impl Into<String>) -> Self {
        Self {
            client,
            nf_instance_id: nf_instance_id.into(),
        }
    }

    fn create_body(&self, request: &CreateSubscriptionRequest) -> CreateSubscriptionBody {
        let events = request.event_filter.kinds().iter();
        match request.target() {
            TargetType::Amf => CreateSubscriptionBody::Amf(AmfCreateEventSubscription {
                subscription: AmfEventSubscription {
                    event_list: events
                        .map(|kind| AmfEvent {
                            kind: kind.wire_name().to_string(),
                            immediate_flag: true,
                        })
                        .collect(),
                    event_notify_uri: request.callback_uri.clone(),
                    notify_correlation_id: request.correlation_id.clone(),
                    nf_id: self.nf_instance_id.clone(),
                    any_ue: true,
                },
            }),
            TargetType::Smf => CreateSubscriptionBody::Smf(NsmfEventExposure {
                event_subs: events
                    .map(|kind| SmfEventSubscription {
                        event: kind.wire_name().to_string(),
                    })
                    .collect(),
                notif_uri: request.callback_uri.clone(),
                notif_id: request.correlation_id.clone(),
                any_ue_ind: true,
            }),
        }
    }

    fn transport_error(target: TargetType, err: reqwest::Error) -> SubscriptionError {
        warn!(
            event = events::PRODUCER_REQUEST_FAILED,
            component = COMPONENT,
            target = target.as_str(),
            err = %err,
            "producer request failed in transport"
        );
        SubscriptionError::TransientNetwork(err.to_string())
    }
}

fn extract_subscription_id(target: TargetType, body: &[u8]) -> Result<String, SubscriptionError> {
    let id = match target {
        TargetType::Amf => serde_json::from_slice::<AmfCreatedEventSubscription>(body)
            .map(|created| created.subscription_id),
        TargetType::Smf => serde_json::from_slice::<NsmfEventExposureCreated>(body)
            .map(|created| created.sub_id),
    }
    .map_err(|err| {
        SubscriptionError::ProtocolViolation(format!("unparseable create response: {err}"))
    })?;

    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(SubscriptionError::ProtocolViolation(
            "create response carries no subscription id".to_string(),
        )),
    }
}

#[async_trait]
impl SubscriptionClient for HttpSubscriptionClient {
    async fn create(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> Result<String, SubscriptionError> {
        let target = request.target();
        let url = format!(
            "{}{}",
            request.producer.base_uri(),
            subscriptions_path(target)
        );
        debug!(
            event = events::PRODUCER_REQUEST_SENT,
            component = COMPONENT,
            target = target.as_str(),
            url = url.as_str(),
            correlation_id = request.correlation_id.as_str(),
            "sending create subscription"
        );

        let response = self
            .client
            .post(&url)
            .json(&self.create_body(request))
            .send()
            .await
            .map_err(|err| Self::transport_error(target, err))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(SubscriptionError::RejectedByProducer {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| Self::transport_error(target, err))?;
        extract_subscription_id(target, &body)
    }

    async fn delete(
        &self,
        producer: &ProducerEndpoint,
        target: TargetType,
        subscription_id: &str,
    ) -> Result<(), SubscriptionError> {
        let url = format!(
            "{}{}/{}",
            producer.base_uri(),
            subscriptions_path(target),
            subscription_id
        );
        debug!(
            event = events::PRODUCER_REQUEST_SENT,
            component = COMPONENT,
            target = target.as_str(),
            url = url.as_str(),
            "sending delete subscription"
        );

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|err| Self::transport_error(target, err))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(SubscriptionError::RejectedByProducer {
                status: status.as_u16(),
            }),
        }
    }

    async fn subscribe_amf_status(
        &self,
        producer: &ProducerEndpoint,
        subscription: &AmfStatusSubscription,
    ) -> Result<(), SubscriptionError> {
        let url = format!("{}{}", producer.base_uri(), AMF_STATUS_SUBSCRIPTIONS_PATH);
        debug!(
            event = events::PRODUCER_REQUEST_SENT,
            component = COMPONENT,
            target = TargetType::Amf.as_str(),
            url = url.as_str(),
            guamis = subscription.guami_list.len(),
            "sending AMF status change subscription"
        );

        let body = AmfStatusSubscriptionData {
            amf_status_uri: subscription.callback_uri.clone(),
            guami_list: subscription.guami_list.clone(),
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| Self::transport_error(TargetType::Amf, err))?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status => Err(SubscriptionError::RejectedByProducer {
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::extract_subscription_id;
    use crate::error::SubscriptionError;
    use crate::model::target::TargetType;

    #[test]
    fn subscription_id_field_depends_on_target() {
        assert_eq!(
            extract_subscription_id(TargetType::Amf, br#"{"subscriptionId":"amf-sub-1"}"#),
            Ok("amf-sub-1".to_string())
        );
        assert_eq!(
            extract_subscription_id(TargetType::Smf, br#"{"subId":"smf-sub-1"}"#),
            Ok("smf-sub-1".to_string())
        );
    }

    #[test]
    fn missing_or_empty_id_is_a_protocol_violation() {
        for body in [&br#"{}"#[..], br#"{"subscriptionId":""}"#, b"not json"] {
            assert!(matches!(
                extract_subscription_id(TargetType::Amf, body),
                Err(SubscriptionError::ProtocolViolation(_))
            ));
        }
    }
}
