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

mod support;

use futures::future::join_all;
use nwdaf_streamer::{
    EventFilter, ProducerEndpoint, SubscribeOutcome, SubscriptionRegistry, TargetType,
    UnsubscribeOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use support::CountingClient;

const CALLBACK: &str = "http://127.0.0.1:8000/nnwdaf-amfEvents";

fn amf_producer() -> ProducerEndpoint {
    ProducerEndpoint::new("amf-1", "http://127.0.0.18:8000")
}

#[tokio::test]
async fn sequential_subscribes_share_one_producer_subscription() {
    let client = Arc::new(CountingClient::default());
    let registry = SubscriptionRegistry::new(client.clone());

    let first = registry
        .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
        .await
        .expect("first subscribe");
    let second = registry
        .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
        .await
        .expect("second subscribe");

    assert_eq!(first, SubscribeOutcome::Created("sub-amf-1".to_string()));
    assert_eq!(
        second,
        SubscribeOutcome::AlreadySubscribed("sub-amf-1".to_string())
    );
    assert_eq!(client.creates(), 1);
}

#[tokio::test]
async fn unsubscribe_without_subscription_is_a_no_op() {
    let client = Arc::new(CountingClient::default());
    let registry = SubscriptionRegistry::new(client.clone());

    let outcome = registry
        .unsubscribe(TargetType::Smf)
        .await
        .expect("no-op unsubscribe");

    assert_eq!(outcome, UnsubscribeOutcome::NotSubscribed);
    assert_eq!(client.deletes(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_subscribes_issue_a_single_create() {
    let client = Arc::new(CountingClient::with_create_delay(Duration::from_millis(50)));
    let registry = Arc::new(SubscriptionRegistry::new(client.clone()));

    let attempts = (0..8).map(|_| {
        let registry = registry.clone();
        tokio::spawn(async move {
            registry
                .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
                .await
        })
    });
    let outcomes: Vec<SubscribeOutcome> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task joins").expect("subscribe succeeds"))
        .collect();

    assert_eq!(client.creates(), 1);
    assert!(outcomes
        .iter()
        .all(|outcome| outcome.subscription_id() == "sub-amf-1"));
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(outcome, SubscribeOutcome::Created(_)))
            .count(),
        1
    );
}

#[tokio::test]
async fn targets_are_independent() {
    let client = Arc::new(CountingClient::default());
    let registry = SubscriptionRegistry::new(client.clone());

    registry
        .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
        .await
        .expect("amf subscribe");
    registry
        .subscribe(
            ProducerEndpoint::new("smf-1", "http://127.0.0.2:8000"),
            EventFilter::all(TargetType::Smf),
            "http://127.0.0.1:8000/nnwdaf-smfEvents",
        )
        .await
        .expect("smf subscribe");

    let removed = registry
        .unsubscribe(TargetType::Amf)
        .await
        .expect("amf unsubscribe");

    assert_eq!(removed, UnsubscribeOutcome::Unsubscribed("sub-amf-1".to_string()));
    assert!(registry.get(TargetType::Amf).is_none());
    assert!(registry
        .get(TargetType::Smf)
        .is_some_and(|subscription| subscription.is_active()));
    assert_eq!(client.deletes(), 1);
}

#[tokio::test]
async fn resubscribe_after_unsubscribe_gets_a_fresh_correlation_id() {
    let client = Arc::new(CountingClient::default());
    let registry = SubscriptionRegistry::new(client.clone());

    registry
        .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
        .await
        .expect("subscribe");
    let first_correlation = registry
        .get(TargetType::Amf)
        .expect("stored")
        .correlation_id()
        .to_string();
    registry
        .unsubscribe(TargetType::Amf)
        .await
        .expect("unsubscribe");

    let again = registry
        .subscribe(amf_producer(), EventFilter::all(TargetType::Amf), CALLBACK)
        .await
        .expect("subscribe again");

    assert_eq!(again, SubscribeOutcome::Created("sub-amf-2".to_string()));
    assert!(registry.lookup(&first_correlation).is_none());
    assert_eq!(client.creates(), 2);
}
