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

use crate::model::target::{EventFilter, TargetType};

/// [`ProducerEndpoint`] identifies one producer instance resolved from the directory service
/// and the base URI of its SBI.
///
/// # Examples
///
/// ```
/// use nwdaf_streamer::ProducerEndpoint;
///
/// let amf = ProducerEndpoint::new("6a4a1d5c-amf", "http://10.100.200.16:8000/");
/// assert_eq!(amf.base_uri(), "http://10.100.200.16:8000");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProducerEndpoint {
    nf_instance_id: String,
    base_uri: String,
}

impl ProducerEndpoint {
    pub fn new(nf_instance_id: &str, base_uri: &str) -> Self {
        Self {
            nf_instance_id: nf_instance_id.to_string(),
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    pub fn nf_instance_id(&self) -> &str {
        &self.nf_instance_id
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }
}

/// Lifecycle state of a registry entry. An absent entry is the unsubscribed state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubscriptionState {
    /// Create request in flight.
    Pending,
    /// Producer accepted the subscription and assigned `subscription_id`.
    Active { subscription_id: String },
    /// Delete request in flight, or the last delete failed and may be retried.
    PendingRemoval { subscription_id: String },
}

impl SubscriptionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubscriptionState::Pending => "pending",
            SubscriptionState::Active { .. } => "active",
            SubscriptionState::PendingRemoval { .. } => "pending_removal",
        }
    }
}

/// One standing subscription against a producer, as tracked by the registry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subscription {
    pub(crate) target: TargetType,
    pub(crate) correlation_id: String,
    pub(crate) callback_uri: String,
    pub(crate) event_filter: EventFilter,
    pub(crate) producer: ProducerEndpoint,
    pub(crate) state: SubscriptionState,
}

impl Subscription {
    pub fn target(&self) -> TargetType {
        self.target
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn callback_uri(&self) -> &str {
        &self.callback_uri
    }

    pub fn event_filter(&self) -> &EventFilter {
        &self.event_filter
    }

    pub fn producer(&self) -> &ProducerEndpoint {
        &self.producer
    }

    pub fn state(&self) -> &SubscriptionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SubscriptionState::Active { .. })
    }

    /// Producer-assigned id. Only an active subscription exposes one.
    pub fn subscription_id(&self) -> Option<&str> {
        match &self.state {
            SubscriptionState::Active { subscription_id } => Some(subscription_id),
            _ => None,
        }
    }

    /// Id a delete request should target: the active id, or the id a failed removal left behind.
    pub(crate) fn removable_id(&self) -> Option<&str> {
        match &self.state {
            SubscriptionState::Active { subscription_id }
            | SubscriptionState::PendingRemoval { subscription_id } => Some(subscription_id),
            SubscriptionState::Pending => None,
        }
    }

    pub(crate) fn with_state(&self, state: SubscriptionState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}
