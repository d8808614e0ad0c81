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

//! Subscribe/unsubscribe command entry point and its stable result codes.

use crate::control_plane::subscription_registry::{
    SubscribeOutcome, SubscriptionRegistry, UnsubscribeOutcome,
};
use crate::error::{DirectoryError, SubscriptionError};
use crate::model::target::{EventFilter, TargetType};
use crate::observability::events;
use crate::sbi::directory_client::DirectoryClient;
use crate::sbi::subscription_client::AmfStatusSubscription;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

const COMPONENT: &str = "command_surface";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandAction {
    Subscribe,
    Unsubscribe,
}

impl FromStr for CommandAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscribe" => Ok(CommandAction::Subscribe),
            "unsubscribe" => Ok(CommandAction::Unsubscribe),
            other => Err(format!(
                "unknown action `{other}`; must be 'subscribe' or 'unsubscribe'"
            )),
        }
    }
}

/// Body of `POST /nwdaf/command`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub action: String,
    pub target: String,
    /// Accepted for compatibility; the registry owns subscription ids.
    #[serde(default)]
    pub subscription_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandStatus {
    Ok,
    InvalidRequest,
    Failed,
    Unavailable,
}

/// Result of one command, ready to be rendered as JSON.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReply {
    #[serde(skip)]
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

impl CommandReply {
    fn ok(code: &'static str, message: String, subscription_id: Option<String>) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: Some(message),
            error: None,
            code,
            subscription_id,
        }
    }

    fn failed(status: CommandStatus, code: &'static str, error: String) -> Self {
        Self {
            status,
            message: None,
            error: Some(error),
            code,
            subscription_id: None,
        }
    }

    pub fn invalid_request(error: impl Into<String>) -> Self {
        Self::failed(CommandStatus::InvalidRequest, "invalid_request", error.into())
    }

    /// Answer while shutdown is removing subscriptions.
    pub fn shutting_down() -> Self {
        Self::failed(
            CommandStatus::Unavailable,
            "shutting_down",
            "service is shutting down".to_string(),
        )
    }

    fn from_subscription_error(err: &SubscriptionError) -> Self {
        Self::failed(CommandStatus::Failed, err.code(), err.to_string())
    }

    fn from_directory_error(err: &DirectoryError) -> Self {
        Self::failed(CommandStatus::Failed, err.code(), err.to_string())
    }
}

/// What a subscription for one target asks of its producer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscriptionTemplate {
    pub event_filter: EventFilter,
    pub callback_uri: String,
}

/// Subscription templates for both targets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscriptionTemplates {
    pub amf: SubscriptionTemplate,
    pub smf: SubscriptionTemplate,
}

impl SubscriptionTemplates {
    /// Subscribes to every event of each target, pushing to `{notification_base}/nnwdaf-*Events`.
    pub fn all_events(notification_base: &str) -> Self {
        let base = notification_base.trim_end_matches('/');
        Self {
            amf: SubscriptionTemplate {
                event_filter: EventFilter::all(TargetType::Amf),
                callback_uri: format!("{base}/nnwdaf-amfEvents"),
            },
            smf: SubscriptionTemplate {
                event_filter: EventFilter::all(TargetType::Smf),
                callback_uri: format!("{base}/nnwdaf-smfEvents"),
            },
        }
    }

    pub fn for_target(&self, target: TargetType) -> &SubscriptionTemplate {
        match target {
            TargetType::Amf => &self.amf,
            TargetType::Smf => &self.smf,
        }
    }
}

/// Translates subscribe/unsubscribe commands into registry calls.
pub struct CommandSurface {
    registry: Arc<SubscriptionRegistry>,
    directory: Arc<dyn DirectoryClient>,
    templates: SubscriptionTemplates,
}

impl CommandSurface {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        directory: Arc<dyn DirectoryClient>,
        templates: SubscriptionTemplates,
    ) -> Self {
        Self {
            registry,
            directory,
            templates,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Parses a raw command body and executes it.
    pub async fn handle(&self, body: &[u8]) -> CommandReply {
        let request: CommandRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                return CommandReply::invalid_request(format!("invalid command body: {err}"))
            }
        };

        let action = match request.action.parse::<CommandAction>() {
            Ok(action) => action,
            Err(err) => return CommandReply::invalid_request(err),
        };
        let target = match request.target.parse::<TargetType>() {
            Ok(target) => target,
            Err(err) => return CommandReply::invalid_request(err.to_string()),
        };

        info!(
            event = events::COMMAND_RECEIVE,
            component = COMPONENT,
            action = request.action.as_str(),
            target = target.as_str(),
            "command received"
        );

        let reply = self.execute(action, target).await;

        info!(
            event = events::COMMAND_COMPLETE,
            component = COMPONENT,
            action = request.action.as_str(),
            target = target.as_str(),
            code = reply.code,
            "command complete"
        );
        reply
    }

    pub async fn execute(&self, action: CommandAction, target: TargetType) -> CommandReply {
        match action {
            CommandAction::Subscribe => self.subscribe(target).await,
            CommandAction::Unsubscribe => self.unsubscribe(target).await,
        }
    }

    async fn subscribe(&self, target: TargetType) -> CommandReply {
        // An active subscription answers without consulting the directory.
        if let Some(id) = self
            .registry
            .get(target)
            .and_then(|existing| existing.subscription_id().map(str::to_string))
        {
            return CommandReply::ok(
                "already_subscribed",
                format!("already subscribed to {target} events"),
                Some(id),
            );
        }

        let producer = match self.directory.discover(target).await {
            Ok(producer) => producer,
            Err(err) => return CommandReply::from_directory_error(&err),
        };

        let template = self.templates.for_target(target);
        match self
            .registry
            .subscribe(
                producer,
                template.event_filter.clone(),
                &template.callback_uri,
            )
            .await
        {
            Ok(SubscribeOutcome::Created(id)) => CommandReply::ok(
                "subscribed",
                format!("subscribed to {target} events"),
                Some(id),
            ),
            Ok(SubscribeOutcome::AlreadySubscribed(id)) => CommandReply::ok(
                "already_subscribed",
                format!("already subscribed to {target} events"),
                Some(id),
            ),
            Err(err) => CommandReply::from_subscription_error(&err),
        }
    }

    /// Registers the status-change callback with the AMF the directory resolves.
    ///
    /// Status subscriptions are not tracked by the registry; the AMF keeps them until it
    /// restarts.
    pub async fn subscribe_amf_status(&self, subscription: &AmfStatusSubscription) -> CommandReply {
        let producer = match self.directory.discover(TargetType::Amf).await {
            Ok(producer) => producer,
            Err(err) => return CommandReply::from_directory_error(&err),
        };

        match self
            .registry
            .client()
            .subscribe_amf_status(&producer, subscription)
            .await
        {
            Ok(()) => {
                info!(
                    event = events::AMF_STATUS_SUBSCRIBED,
                    component = COMPONENT,
                    producer = producer.nf_instance_id(),
                    callback_uri = subscription.callback_uri.as_str(),
                    "subscribed to AMF status changes"
                );
                CommandReply::ok(
                    "amf_status_subscribed",
                    "subscribed to AMF status changes".to_string(),
                    None,
                )
            }
            Err(err) => CommandReply::from_subscription_error(&err),
        }
    }

    async fn unsubscribe(&self, target: TargetType) -> CommandReply {
        match self.registry.unsubscribe(target).await {
            Ok(UnsubscribeOutcome::Unsubscribed(id)) => CommandReply::ok(
                "unsubscribed",
                format!("unsubscribed from {target} events"),
                Some(id),
            ),
            Ok(UnsubscribeOutcome::NotSubscribed) => CommandReply::ok(
                "not_subscribed",
                format!("not subscribed to {target} events"),
                None,
            ),
            Err(err) => CommandReply::from_subscription_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandAction, CommandReply, CommandStatus, SubscriptionTemplates};
    use crate::model::target::TargetType;
    use serde_json::json;

    #[test]
    fn reply_bodies_carry_either_message_or_error() {
        let invalid = CommandReply::invalid_request("bad target");
        assert_eq!(invalid.status, CommandStatus::InvalidRequest);
        assert_eq!(
            serde_json::to_value(&invalid).expect("serializes"),
            json!({ "error": "bad target", "code": "invalid_request" })
        );

        let closing = CommandReply::shutting_down();
        assert_eq!(closing.status, CommandStatus::Unavailable);
        assert_eq!(
            serde_json::to_value(&closing).expect("serializes"),
            json!({ "error": "service is shutting down", "code": "shutting_down" })
        );
    }

    #[test]
    fn action_parsing_is_exact() {
        assert_eq!(
            "subscribe".parse::<CommandAction>(),
            Ok(CommandAction::Subscribe)
        );
        assert!("Subscribe".parse::<CommandAction>().is_err());
    }

    #[test]
    fn templates_point_callbacks_at_notification_endpoints() {
        let templates = SubscriptionTemplates::all_events("http://127.0.0.1:8000/");
        assert_eq!(
            templates.for_target(TargetType::Smf).callback_uri,
            "http://127.0.0.1:8000/nnwdaf-smfEvents"
        );
        assert_eq!(
            templates.for_target(TargetType::Amf).event_filter.kinds().len(),
            8
        );
    }
}
