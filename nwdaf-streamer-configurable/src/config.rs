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

use nwdaf_streamer::data_plane::notification_router::AMF_STATUS_PATH;
use nwdaf_streamer::model::target::InvalidEventFilter;
use nwdaf_streamer::model::wire::{Guami, PlmnId};
use nwdaf_streamer::{
    AmfStatusSubscription, CorrelationPolicy, EventFilter, LifecycleSettings, RetryPolicy, Snssai,
    SubscriptionTemplate, SubscriptionTemplates, TargetType,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config file: {0}")]
    Parse(#[from] json5::Error),
    #[error("invalid subscription events: {0}")]
    Events(#[from] InvalidEventFilter),
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) sbi: SbiConfig,
    pub(crate) nrf_uri: String,
    /// Generated at startup when absent.
    #[serde(default)]
    pub(crate) nf_instance_id: Option<String>,
    pub(crate) plmn: Vec<PlmnId>,
    #[serde(default)]
    pub(crate) snssais: Vec<Snssai>,
    /// SBI port producers listen on; discovery only returns their addresses.
    #[serde(default = "default_producer_port")]
    pub(crate) producer_port: u16,
    #[serde(default)]
    pub(crate) notification: NotificationConfig,
    #[serde(default)]
    pub(crate) subscriptions: SubscriptionsConfig,
    /// AMFs asked for status changes at startup; absent skips the request.
    #[serde(default)]
    pub(crate) amf_status: Option<AmfStatusConfig>,
    #[serde(default)]
    pub(crate) registration_retry: RetryConfig,
    #[serde(default = "default_shutdown_timeout_ms")]
    pub(crate) shutdown_timeout_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SbiConfig {
    pub(crate) scheme: String,
    /// Address advertised to the NRF and used in callback URIs.
    pub(crate) register_ipv4: String,
    pub(crate) binding_ipv4: String,
    pub(crate) port: u16,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    #[serde(default)]
    pub(crate) correlation_policy: CorrelationPolicy,
    /// Puts the metrics sink behind a bounded queue of this size.
    #[serde(default)]
    pub(crate) sink_queue_size: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionsConfig {
    #[serde(default)]
    pub(crate) amf: TargetSubscriptionConfig,
    #[serde(default)]
    pub(crate) smf: TargetSubscriptionConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TargetSubscriptionConfig {
    /// Wire event names; empty subscribes to everything the target publishes.
    #[serde(default)]
    pub(crate) events: Vec<String>,
    #[serde(default = "enabled")]
    pub(crate) subscribe_on_startup: bool,
}

impl Default for TargetSubscriptionConfig {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            subscribe_on_startup: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct AmfStatusConfig {
    pub(crate) guami_list: Vec<GuamiConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GuamiConfig {
    pub(crate) plmn: PlmnId,
    pub(crate) amf_id: String,
}

impl From<&GuamiConfig> for Guami {
    fn from(config: &GuamiConfig) -> Self {
        Guami {
            plmn_id: config.plmn.clone(),
            amf_id: config.amf_id.clone(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    pub(crate) max_attempts: u32,
    pub(crate) initial_delay_ms: u64,
    pub(crate) max_delay_ms: u64,
    pub(crate) multiplier: f64,
    pub(crate) jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            multiplier: policy.multiplier,
            jitter_factor: policy.jitter_factor,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
            jitter_factor: config.jitter_factor,
        }
    }
}

fn default_producer_port() -> u16 {
    8000
}

fn default_shutdown_timeout_ms() -> u64 {
    5_000
}

fn enabled() -> bool {
    true
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = json5::from_str(contents)?;
        // Surface bad event names at load time rather than on first subscribe.
        config.subscription_templates()?;
        Ok(config)
    }

    fn target(&self, target: TargetType) -> &TargetSubscriptionConfig {
        match target {
            TargetType::Amf => &self.subscriptions.amf,
            TargetType::Smf => &self.subscriptions.smf,
        }
    }

    pub fn event_filter(&self, target: TargetType) -> Result<EventFilter, InvalidEventFilter> {
        let events = &self.target(target).events;
        if events.is_empty() {
            Ok(EventFilter::all(target))
        } else {
            EventFilter::from_names(target, events)
        }
    }

    /// Base URI producers push notifications to.
    pub fn notification_base(&self) -> String {
        format!(
            "{}://{}:{}",
            self.sbi.scheme, self.sbi.register_ipv4, self.sbi.port
        )
    }

    pub fn subscription_templates(&self) -> Result<SubscriptionTemplates, InvalidEventFilter> {
        let defaults = SubscriptionTemplates::all_events(&self.notification_base());
        Ok(SubscriptionTemplates {
            amf: SubscriptionTemplate {
                event_filter: self.event_filter(TargetType::Amf)?,
                ..defaults.amf
            },
            smf: SubscriptionTemplate {
                event_filter: self.event_filter(TargetType::Smf)?,
                ..defaults.smf
            },
        })
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        let mut settings =
            LifecycleSettings::new(format!("{}:{}", self.sbi.binding_ipv4, self.sbi.port));
        settings.registration_retry = RetryPolicy::from(&self.registration_retry);
        settings.shutdown_timeout = Duration::from_millis(self.shutdown_timeout_ms);
        settings.subscribe_on_startup = TargetType::ALL
            .into_iter()
            .filter(|target| self.target(*target).subscribe_on_startup)
            .collect();
        settings.amf_status = self
            .amf_status
            .as_ref()
            .map(|amf_status| AmfStatusSubscription {
                guami_list: amf_status.guami_list.iter().map(Guami::from).collect(),
                callback_uri: format!("{}{AMF_STATUS_PATH}", self.notification_base()),
            });
        settings
    }
}
