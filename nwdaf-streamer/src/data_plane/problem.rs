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

//! Problem-details error bodies returned by the HTTP surface.

use crate::error::NotificationError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

const PROBLEM_JSON: &str = "application/problem+json";

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProblemDetails {
    pub status: u16,
    pub title: String,
    pub detail: String,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            title: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, PROBLEM_JSON)], Json(self)).into_response()
    }
}

/// HTTP status a rejected notification is answered with.
pub fn notification_status(err: &NotificationError) -> StatusCode {
    match err {
        NotificationError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        NotificationError::UnknownCorrelation(_) => StatusCode::NOT_FOUND,
        NotificationError::UnsupportedEventKind(_) => StatusCode::NOT_IMPLEMENTED,
        NotificationError::BodyUnreadable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        NotificationError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<&NotificationError> for ProblemDetails {
    fn from(err: &NotificationError) -> Self {
        ProblemDetails::new(notification_status(err), err.to_string())
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        ProblemDetails::from(&self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{notification_status, ProblemDetails};
    use crate::error::NotificationError;
    use axum::http::StatusCode;

    #[test]
    fn problem_title_follows_status_reason() {
        let problem = ProblemDetails::new(StatusCode::METHOD_NOT_ALLOWED, "use POST");
        assert_eq!(problem.status, 405);
        assert_eq!(problem.title, "Method Not Allowed");
    }

    #[test]
    fn notification_errors_map_to_distinct_statuses() {
        assert_eq!(
            notification_status(&NotificationError::UnsupportedEventKind("X".to_string())),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            notification_status(&NotificationError::UnknownCorrelation("c".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            notification_status(&NotificationError::ShuttingDown),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
