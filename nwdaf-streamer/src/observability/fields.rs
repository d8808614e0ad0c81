/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

//! Canonical structured field values and value-format helpers.

use crate::model::subscription::Subscription;

pub const NONE: &str = "none";
pub const REASON_UNKNOWN_CORRELATION: &str = "unknown_correlation";
pub const REASON_TARGET_MISMATCH: &str = "target_mismatch";
pub const REASON_SHUTTING_DOWN: &str = "shutting_down";

/// Stable rendering of a subscription's producer-assigned id for log fields.
pub fn format_subscription_id(subscription: Option<&Subscription>) -> String {
    subscription
        .and_then(|subscription| subscription.removable_id())
        .unwrap_or(NONE)
        .to_string()
}

/// Renders an optional subject id (SUPI) for log fields.
pub fn format_subject(subject_id: Option<&str>) -> String {
    subject_id.unwrap_or(NONE).to_string()
}
