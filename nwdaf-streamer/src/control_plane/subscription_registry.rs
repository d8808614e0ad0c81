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

//! Registry owning at most one subscription per producer target.

use crate::error::SubscriptionError;
use crate::model::subscription::{ProducerEndpoint, Subscription, SubscriptionState};
use crate::model::target::{EventFilter, TargetType};
use crate::observability::events;
use crate::sbi::subscription_client::{CreateSubscriptionRequest, SubscriptionClient};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

const COMPONENT: &str = "subscription_registry";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubscribeOutcome {
    /// The producer accepted a new subscription with this id.
    Created(String),
    /// A subscription was already active; no request was sent.
    AlreadySubscribed(String),
}

impl SubscribeOutcome {
    pub fn subscription_id(&self) -> &str {
        match self {
            SubscribeOutcome::Created(id) | SubscribeOutcome::AlreadySubscribed(id) => id,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UnsubscribeOutcome {
    /// The producer deleted the subscription with this id.
    Unsubscribed(String),
    /// Nothing was subscribed; no request was sent.
    NotSubscribed,
}

type Entries = HashMap<TargetType, Subscription>;

/// Subscription table keyed by target.
///
/// Subscribe and unsubscribe for one target are linearized by a per-target lock held across the
/// producer round trip. Readers go through an atomically swapped snapshot and never wait on
/// that lock.
pub struct SubscriptionRegistry {
    client: Arc<dyn SubscriptionClient>,
    amf_lock: Mutex<()>,
    smf_lock: Mutex<()>,
    entries: ArcSwap<Entries>,
}

impl SubscriptionRegistry {
    pub fn new(client: Arc<dyn SubscriptionClient>) -> Self {
        Self {
            client,
            amf_lock: Mutex::new(()),
            smf_lock: Mutex::new(()),
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn client(&self) -> &Arc<dyn SubscriptionClient> {
        &self.client
    }

    fn lock_for(&self, target: TargetType) -> &Mutex<()> {
        match target {
            TargetType::Amf => &self.amf_lock,
            TargetType::Smf => &self.smf_lock,
        }
    }

    fn store(&self, subscription: Subscription) {
        self.entries.rcu(|current| {
            let mut next = Entries::clone(current);
            next.insert(subscription.target, subscription.clone());
            next
        });
    }

    fn remove(&self, target: TargetType) {
        self.entries.rcu(|current| {
            let mut next = Entries::clone(current);
            next.remove(&target);
            next
        });
    }

    /// Opens a subscription for the filter's target unless one is already active.
    ///
    /// The target is the one carried by `event_filter`.
    pub async fn subscribe(
        &self,
        producer: ProducerEndpoint,
        event_filter: EventFilter,
        callback_uri: &str,
    ) -> Result<SubscribeOutcome, SubscriptionError> {
        let target = event_filter.target();
        let _guard = self.lock_for(target).lock().await;

        if let Some(existing) = self.get(target) {
            match existing.state() {
                SubscriptionState::Active { subscription_id } => {
                    info!(
                        event = events::SUBSCRIBE_ALREADY_ACTIVE,
                        component = COMPONENT,
                        target = target.as_str(),
                        subscription_id = subscription_id.as_str(),
                        "subscription already active"
                    );
                    return Ok(SubscribeOutcome::AlreadySubscribed(subscription_id.clone()));
                }
                SubscriptionState::PendingRemoval { subscription_id } => {
                    warn!(
                        event = events::SUBSCRIBE_REJECTED_REMOVAL_PENDING,
                        component = COMPONENT,
                        target = target.as_str(),
                        subscription_id = subscription_id.as_str(),
                        "previous subscription still awaiting removal"
                    );
                    return Err(SubscriptionError::RemovalPending(target));
                }
                // Left behind by a cancelled call; nothing was confirmed by the producer.
                SubscriptionState::Pending => {}
            }
        }

        let pending = Subscription {
            target,
            correlation_id: Uuid::new_v4().to_string(),
            callback_uri: callback_uri.to_string(),
            event_filter,
            producer,
            state: SubscriptionState::Pending,
        };
        self.store(pending.clone());

        info!(
            event = events::SUBSCRIBE_START,
            component = COMPONENT,
            target = target.as_str(),
            correlation_id = pending.correlation_id(),
            producer = pending.producer().base_uri(),
            "creating subscription"
        );

        let request = CreateSubscriptionRequest {
            producer: pending.producer.clone(),
            event_filter: pending.event_filter.clone(),
            callback_uri: pending.callback_uri.clone(),
            correlation_id: pending.correlation_id.clone(),
        };

        match self.client.create(&request).await {
            Ok(subscription_id) => {
                self.store(pending.with_state(SubscriptionState::Active {
                    subscription_id: subscription_id.clone(),
                }));
                info!(
                    event = events::SUBSCRIBE_OK,
                    component = COMPONENT,
                    target = target.as_str(),
                    correlation_id = pending.correlation_id(),
                    subscription_id = subscription_id.as_str(),
                    "subscription active"
                );
                Ok(SubscribeOutcome::Created(subscription_id))
            }
            Err(err) => {
                self.remove(target);
                warn!(
                    event = events::SUBSCRIBE_FAILED,
                    component = COMPONENT,
                    target = target.as_str(),
                    correlation_id = pending.correlation_id(),
                    err = %err,
                    "subscription create failed"
                );
                Err(err)
            }
        }
    }

    /// Deletes the target's subscription at the producer that holds it.
    ///
    /// A failed delete leaves the entry in `PendingRemoval`; calling again re-issues the delete.
    pub async fn unsubscribe(
        &self,
        target: TargetType,
    ) -> Result<UnsubscribeOutcome, SubscriptionError> {
        let _guard = self.lock_for(target).lock().await;

        let Some(existing) = self.get(target) else {
            info!(
                event = events::UNSUBSCRIBE_NOT_SUBSCRIBED,
                component = COMPONENT,
                target = target.as_str(),
                "nothing to unsubscribe"
            );
            return Ok(UnsubscribeOutcome::NotSubscribed);
        };

        let Some(subscription_id) = existing.removable_id().map(str::to_string) else {
            // Stale pending entry from a cancelled subscribe; the producer never confirmed it.
            self.remove(target);
            return Ok(UnsubscribeOutcome::NotSubscribed);
        };

        self.store(existing.with_state(SubscriptionState::PendingRemoval {
            subscription_id: subscription_id.clone(),
        }));

        info!(
            event = events::UNSUBSCRIBE_START,
            component = COMPONENT,
            target = target.as_str(),
            subscription_id = subscription_id.as_str(),
            producer = existing.producer().base_uri(),
            "deleting subscription"
        );

        match self
            .client
            .delete(existing.producer(), target, &subscription_id)
            .await
        {
            Ok(()) => {
                self.remove(target);
                info!(
                    event = events::UNSUBSCRIBE_OK,
                    component = COMPONENT,
                    target = target.as_str(),
                    subscription_id = subscription_id.as_str(),
                    "subscription removed"
                );
                Ok(UnsubscribeOutcome::Unsubscribed(subscription_id))
            }
            Err(err) => {
                warn!(
                    event = events::UNSUBSCRIBE_FAILED,
                    component = COMPONENT,
                    target = target.as_str(),
                    subscription_id = subscription_id.as_str(),
                    err = %err,
                    "subscription delete failed; entry kept for retry"
                );
                Err(err)
            }
        }
    }

    /// Finds the subscription a notification's correlation id belongs to.
    ///
    /// Pending entries match too: producers may push immediate reports before answering the
    /// create request.
    pub fn lookup(&self, correlation_id: &str) -> Option<Subscription> {
        self.entries
            .load()
            .values()
            .find(|subscription| subscription.correlation_id == correlation_id)
            .cloned()
    }

    pub fn get(&self, target: TargetType) -> Option<Subscription> {
        self.entries.load().get(&target).cloned()
    }

    /// Snapshot of every entry, ordered by target.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        let mut all: Vec<Subscription> = self.entries.load().values().cloned().collect();
        all.sort_by_key(|subscription| subscription.target);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::{SubscribeOutcome, SubscriptionRegistry, UnsubscribeOutcome};
    use crate::error::SubscriptionError;
    use crate::model::subscription::{ProducerEndpoint, SubscriptionState};
    use crate::model::target::{EventFilter, TargetType};
    use crate::sbi::subscription_client::{CreateSubscriptionRequest, SubscriptionClient};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct ScriptedClient {
        creates: Mutex<VecDeque<Result<String, SubscriptionError>>>,
        deletes: Mutex<VecDeque<Result<(), SubscriptionError>>>,
        delete_calls: Mutex<Vec<(String, String)>>,
        create_gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl SubscriptionClient for ScriptedClient {
        async fn create(
            &self,
            _request: &CreateSubscriptionRequest,
        ) -> Result<String, SubscriptionError> {
            if let Some(gate) = &self.create_gate {
                gate.notified().await;
            }
            self.creates
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok("sub-default".to_string()))
        }

        async fn delete(
            &self,
            producer: &ProducerEndpoint,
            _target: TargetType,
            subscription_id: &str,
        ) -> Result<(), SubscriptionError> {
            self.delete_calls.lock().expect("lock").push((
                producer.base_uri().to_string(),
                subscription_id.to_string(),
            ));
            self.deletes
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }

    fn amf_producer() -> ProducerEndpoint {
        ProducerEndpoint::new("amf-1", "http://127.0.0.18:8000")
    }

    const CALLBACK: &str = "http://127.0.0.1:8000/nnwdaf-amfEvents";

    #[tokio::test]
    async fn failed_create_leaves_target_unsubscribed() {
        let client = ScriptedClient::default();
        client
            .creates
            .lock()
            .expect("lock")
            .push_back(Err(SubscriptionError::RejectedByProducer { status: 403 }));
        let registry = SubscriptionRegistry::new(Arc::new(client));

        let err = registry
            .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
            .await
            .expect_err("producer rejected");

        assert_eq!(err, SubscriptionError::RejectedByProducer { status: 403 });
        assert!(registry.get(TargetType::Amf).is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_entry_and_retry_reissues_it() {
        let client = Arc::new(ScriptedClient::default());
        client
            .deletes
            .lock()
            .expect("lock")
            .push_back(Err(SubscriptionError::TransientNetwork("reset".to_string())));
        let registry = SubscriptionRegistry::new(client.clone());

        registry
            .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
            .await
            .expect("subscribe");

        assert!(registry.unsubscribe(TargetType::Amf).await.is_err());
        let entry = registry.get(TargetType::Amf).expect("entry kept");
        assert_eq!(
            entry.state(),
            &SubscriptionState::PendingRemoval {
                subscription_id: "sub-default".to_string()
            }
        );
        assert_eq!(entry.subscription_id(), None);

        let err = registry
            .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
            .await
            .expect_err("removal still pending");
        assert_eq!(err, SubscriptionError::RemovalPending(TargetType::Amf));

        assert_eq!(
            registry.unsubscribe(TargetType::Amf).await,
            Ok(UnsubscribeOutcome::Unsubscribed("sub-default".to_string()))
        );
        assert!(registry.subscriptions().is_empty());

        let calls = client.delete_calls.lock().expect("lock").clone();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|(base, id)| base == "http://127.0.0.18:8000" && id == "sub-default"));
    }

    #[tokio::test]
    async fn lookup_sees_pending_entry_while_create_is_in_flight() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient {
            create_gate: Some(gate.clone()),
            ..Default::default()
        };
        let registry = Arc::new(SubscriptionRegistry::new(Arc::new(client)));

        let subscribing = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
                    .await
            })
        };

        let pending = loop {
            if let Some(entry) = registry.get(TargetType::Amf) {
                break entry;
            }
            tokio::task::yield_now().await;
        };
        assert_eq!(pending.state(), &SubscriptionState::Pending);
        let found = registry
            .lookup(pending.correlation_id())
            .expect("pending entry is correlatable");
        assert_eq!(found.target(), TargetType::Amf);

        gate.notify_one();
        let outcome = subscribing.await.expect("task").expect("subscribe");
        assert_eq!(outcome, SubscribeOutcome::Created("sub-default".to_string()));
        assert!(registry.lookup("unknown").is_none());
    }
}
