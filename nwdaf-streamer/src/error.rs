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

//! Error taxonomy shared by the control plane, data plane and runtime.

use crate::model::target::TargetType;
use thiserror::Error;

/// Failures of a subscribe/unsubscribe round trip against a producer.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SubscriptionError {
    #[error("producer unreachable: {0}")]
    TransientNetwork(String),
    #[error("producer rejected the request with status {status}")]
    RejectedByProducer { status: u16 },
    #[error("producer response violated the protocol: {0}")]
    ProtocolViolation(String),
    #[error("a previous {0} subscription is still being removed; unsubscribe first")]
    RemovalPending(TargetType),
}

impl SubscriptionError {
    /// Stable code reported to command callers.
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::TransientNetwork(_) => "producer_unreachable",
            SubscriptionError::RejectedByProducer { .. } => "producer_rejected",
            SubscriptionError::ProtocolViolation(_) => "producer_protocol_violation",
            SubscriptionError::RemovalPending(_) => "removal_pending",
        }
    }
}

/// Failures talking to the directory service (NRF).
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DirectoryError {
    #[error("directory unreachable: {0}")]
    Transport(String),
    #[error("directory rejected the request with status {status}")]
    Rejected { status: u16 },
    #[error("directory returned no usable {0} instance")]
    NoInstance(TargetType),
    #[error("directory response malformed: {0}")]
    Malformed(String),
}

impl DirectoryError {
    pub fn code(&self) -> &'static str {
        "directory_lookup_failed"
    }

    /// Whether a later attempt can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DirectoryError::Transport(_) => true,
            DirectoryError::Rejected { status } => *status >= 500,
            DirectoryError::NoInstance(_) | DirectoryError::Malformed(_) => false,
        }
    }
}

/// Reasons an inbound notification is rejected.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NotificationError {
    #[error("malformed notification: {0}")]
    MalformedPayload(String),
    #[error("unsupported event type `{0}`")]
    UnsupportedEventKind(String),
    #[error("no subscription matches correlation id `{0}`")]
    UnknownCorrelation(String),
    #[error("unable to read request body: {0}")]
    BodyUnreadable(String),
    #[error("notification endpoint is shutting down")]
    ShuttingDown,
}

/// Fatal failures while bringing the streamer up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("directory registration failed after {attempts} attempt(s): {source}")]
    Registration {
        attempts: u32,
        #[source]
        source: DirectoryError,
    },
    #[error("unable to bind notification listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("notification server failed: {0}")]
    Serve(#[source] std::io::Error),
}
