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

//! Directory-service (NRF) client: registration, producer discovery and deregistration.

use crate::error::DirectoryError;
use crate::model::subscription::ProducerEndpoint;
use crate::model::target::TargetType;
use crate::model::wire::PlmnId;
use crate::observability::events;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const COMPONENT: &str = "directory_client";

pub const DIRECTORY_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const EVENTS_SUBSCRIPTION_SERVICE: &str = "nnwdaf-eventssubscription";

/// Narrow view of the directory service used by the runtime and the command surface.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn register(&self) -> Result<(), DirectoryError>;

    /// Resolves one producer instance of the given type.
    async fn discover(&self, target: TargetType) -> Result<ProducerEndpoint, DirectoryError>;

    async fn deregister(&self) -> Result<(), DirectoryError>;
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Snssai {
    pub sst: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NfServiceVersion {
    pub api_version_in_uri: String,
    pub api_full_version: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpEndPoint {
    pub ipv4_address: String,
    pub transport: String,
    pub port: u16,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NfService {
    pub service_instance_id: String,
    pub service_name: String,
    pub versions: Vec<NfServiceVersion>,
    pub scheme: String,
    pub nf_service_status: String,
    pub api_prefix: String,
    pub ip_end_points: Vec<IpEndPoint>,
}

/// Profile this NWDAF registers under.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NfProfile {
    pub nf_instance_id: String,
    pub nf_type: String,
    pub nf_status: String,
    pub heart_beat_timer: u32,
    pub ipv4_addresses: Vec<String>,
    pub plmn_list: Vec<PlmnId>,
    #[serde(rename = "sNssais")]
    pub s_nssais: Vec<Snssai>,
    pub nf_services: Vec<NfService>,
}

impl NfProfile {
    /// Builds an NWDAF profile exposing the event-subscription service on `scheme://ipv4:port`.
    pub fn nwdaf(
        nf_instance_id: &str,
        scheme: &str,
        register_ipv4: &str,
        port: u16,
        plmn_list: Vec<PlmnId>,
        s_nssais: Vec<Snssai>,
    ) -> Self {
        Self {
            nf_instance_id: nf_instance_id.to_string(),
            nf_type: "NWDAF".to_string(),
            nf_status: "REGISTERED".to_string(),
            heart_beat_timer: 60,
            ipv4_addresses: vec![register_ipv4.to_string()],
            plmn_list,
            s_nssais,
            nf_services: vec![NfService {
                service_instance_id: "eventssubscription".to_string(),
                service_name: EVENTS_SUBSCRIPTION_SERVICE.to_string(),
                versions: vec![NfServiceVersion {
                    api_version_in_uri: "v1".to_string(),
                    api_full_version: "1.0.0".to_string(),
                }],
                scheme: scheme.to_string(),
                nf_service_status: "REGISTERED".to_string(),
                api_prefix: format!("{scheme}://{register_ipv4}:{port}"),
                ip_end_points: vec![IpEndPoint {
                    ipv4_address: register_ipv4.to_string(),
                    transport: "TCP".to_string(),
                    port,
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    nf_instances: Vec<DiscoveredInstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveredInstance {
    nf_instance_id: String,
    #[serde(default)]
    ipv4_addresses: Vec<String>,
}

/// `reqwest`-backed NRF client.
#[derive(Clone, Debug)]
pub struct NrfDirectoryClient {
    client: Client,
    nrf_uri: String,
    profile: NfProfile,
    producer_scheme: String,
    producer_port: u16,
}

impl NrfDirectoryClient {
    pub fn new(
        nrf_uri: &str,
        profile: NfProfile,
        producer_scheme: &str,
        producer_port: u16,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(DIRECTORY_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(
            client,
            nrf_uri,
            profile,
            producer_scheme,
            producer_port,
        ))
    }

    pub fn with_client(
        client: Client,
        nrf_uri: &str,
        profile: NfProfile,
        producer_scheme: &str,
        producer_port: u16,
    ) -> Self {
        Self {
            client,
            nrf_uri: nrf_uri.trim_end_matches('/').to_string(),
            profile,
            producer_scheme: producer_scheme.to_string(),
            producer_port,
        }
    }

    pub fn profile(&self) -> &NfProfile {
        &self.profile
    }

    fn instance_url(&self) -> String {
        format!(
            "{}/nnrf-nfm/v1/nf-instances/{}",
            self.nrf_uri, self.profile.nf_instance_id
        )
    }
}

fn transport(err: reqwest::Error) -> DirectoryError {
    DirectoryError::Transport(err.to_string())
}

#[async_trait]
impl DirectoryClient for NrfDirectoryClient {
    async fn register(&self) -> Result<(), DirectoryError> {
        let response = self
            .client
            .put(self.instance_url())
            .json(&self.profile)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                info!(
                    event = events::DIRECTORY_REGISTER_OK,
                    component = COMPONENT,
                    nf_instance_id = self.profile.nf_instance_id.as_str(),
                    "registered with directory"
                );
                Ok(())
            }
            status => Err(DirectoryError::Rejected {
                status: status.as_u16(),
            }),
        }
    }

    async fn discover(&self, target: TargetType) -> Result<ProducerEndpoint, DirectoryError> {
        let url = format!("{}/nnrf-disc/v1/nf-instances", self.nrf_uri);
        let result = async {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("target-nf-type", target.nf_type()),
                    ("requester-nf-type", "NWDAF"),
                ])
                .send()
                .await
                .map_err(transport)?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(DirectoryError::Rejected {
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(transport)?;
            let search: SearchResult = serde_json::from_slice(&body)
                .map_err(|err| DirectoryError::Malformed(err.to_string()))?;

            search
                .nf_instances
                .iter()
                .find_map(|instance| {
                    instance.ipv4_addresses.first().map(|ipv4| {
                        ProducerEndpoint::new(
                            &instance.nf_instance_id,
                            &format!("{}://{}:{}", self.producer_scheme, ipv4, self.producer_port),
                        )
                    })
                })
                .ok_or(DirectoryError::NoInstance(target))
        }
        .await;

        match &result {
            Ok(producer) => info!(
                event = events::DIRECTORY_DISCOVER_OK,
                component = COMPONENT,
                target = target.as_str(),
                producer = producer.base_uri(),
                "resolved producer instance"
            ),
            Err(err) => warn!(
                event = events::DIRECTORY_DISCOVER_FAILED,
                component = COMPONENT,
                target = target.as_str(),
                err = %err,
                "producer discovery failed"
            ),
        }
        result
    }

    async fn deregister(&self) -> Result<(), DirectoryError> {
        let response = self
            .client
            .delete(self.instance_url())
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => {
                info!(
                    event = events::DIRECTORY_DEREGISTER_OK,
                    component = COMPONENT,
                    nf_instance_id = self.profile.nf_instance_id.as_str(),
                    "deregistered from directory"
                );
                Ok(())
            }
            status => Err(DirectoryError::Rejected {
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NfProfile, Snssai};
    use crate::model::wire::PlmnId;

    #[test]
    fn nwdaf_profile_advertises_event_subscription_service() {
        let profile = NfProfile::nwdaf(
            "nwdaf-1",
            "http",
            "127.0.0.50",
            8000,
            vec![PlmnId {
                mcc: "208".to_string(),
                mnc: "93".to_string(),
            }],
            vec![Snssai {
                sst: 1,
                sd: Some("010203".to_string()),
            }],
        );

        let value = serde_json::to_value(&profile).expect("profile serializes");
        assert_eq!(value["nfType"], "NWDAF");
        assert_eq!(value["sNssais"][0]["sd"], "010203");
        assert_eq!(
            value["nfServices"][0]["serviceName"],
            "nnwdaf-eventssubscription"
        );
        assert_eq!(
            value["nfServices"][0]["apiPrefix"],
            "http://127.0.0.50:8000"
        );
        assert_eq!(value["nfServices"][0]["ipEndPoints"][0]["port"], 8000);
    }
}
