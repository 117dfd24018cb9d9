//! HTTP client for the MongoDB Atlas administration API

use anyhow::{Context, Result};
use async_trait::async_trait;
use digest_auth::AuthContext;
use inventory_lib::{
    AtlasApi, ClusterIdentity, MeasurementQuery, MetricSample, ProcessInfo, ProjectInfo,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::{Position, Url};

/// Versioned media type required by the v2 endpoints
const V2_ACCEPT: &str = "application/vnd.atlas.2025-11-02+json";

/// Page size for list endpoints
const PAGE_SIZE: usize = 500;

/// API client for Atlas, authenticated with HTTP digest
pub struct AtlasClient {
    client: Client,
    base_url: Url,
    public_key: String,
    private_key: String,
}

impl AtlasClient {
    /// Create a new API client
    pub fn new(base_url: &str, public_key: &str, private_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(base_url).context("Invalid Atlas base URL")?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
        })
    }

    fn v1(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(&format!("api/atlas/v1.0/{}", path))
            .context("Invalid path")
    }

    fn v2(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(&format!("api/atlas/v2/{}", path))
            .context("Invalid path")
    }

    /// GET with the digest handshake: an unauthenticated attempt, then a
    /// retry answering the server's challenge
    async fn send(&self, url: &Url, accept: Option<&str>) -> Result<reqwest::Response> {
        let request = |authorization: Option<&str>| {
            let mut request = self.client.get(url.clone());
            if let Some(accept) = accept {
                request = request.header(ACCEPT, accept);
            }
            if let Some(authorization) = authorization {
                request = request.header(AUTHORIZATION, authorization);
            }
            request
        };

        let response = request(None)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url.path()))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .context("Server answered 401 without a digest challenge")?
            .to_str()
            .context("Invalid WWW-Authenticate header")?
            .to_string();
        let authorization = self.answer_challenge(&challenge, url)?;

        request(Some(&authorization))
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url.path()))
    }

    fn answer_challenge(&self, challenge: &str, url: &Url) -> Result<String> {
        let mut prompt = digest_auth::parse(challenge)
            .map_err(|e| anyhow::anyhow!("Invalid digest challenge: {}", e))?;
        let context = AuthContext::new(
            self.public_key.as_str(),
            self.private_key.as_str(),
            &url[Position::BeforePath..],
        );
        let answer = prompt
            .respond(&context)
            .map_err(|e| anyhow::anyhow!("Failed to answer digest challenge: {}", e))?;
        Ok(answer.to_header_string())
    }

    /// Make an authenticated GET request
    async fn get<T: DeserializeOwned>(&self, url: Url, accept: Option<&str>) -> Result<T> {
        debug!(path = %url.path(), "GET");
        let response = self.send(&url, accept).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url.path()))
    }

    /// Fetch every page of a list endpoint
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.v1(path)?;
            url.query_pairs_mut()
                .append_pair("itemsPerPage", &PAGE_SIZE.to_string())
                .append_pair("pageNum", &page.to_string());

            let body: Paginated<T> = self.get(url, None).await?;
            let received = body.results.len();
            items.extend(body.results);

            let done = match body.total_count {
                Some(total) => items.len() >= total,
                None => received < PAGE_SIZE,
            };
            if done || received == 0 {
                return Ok(items);
            }
            page += 1;
        }
    }

    fn measurement_url(&self, base: Url, metric: &str, query: &MeasurementQuery) -> Url {
        let mut url = base;
        url.query_pairs_mut()
            .append_pair("granularity", &query.granularity)
            .append_pair("period", &query.period)
            .append_pair("m", metric);
        url
    }
}

#[async_trait]
impl AtlasApi for AtlasClient {
    async fn list_projects(&self, org_id: &str) -> Result<Vec<ProjectInfo>> {
        let groups: Vec<RawProject> = self.get_all(&format!("orgs/{}/groups", org_id)).await?;
        Ok(groups.into_iter().map(ProjectInfo::from).collect())
    }

    async fn list_clusters(&self, project_id: &str) -> Result<Vec<ClusterIdentity>> {
        let clusters: Vec<RawCluster> = self
            .get_all(&format!("groups/{}/clusters", project_id))
            .await?;
        Ok(clusters.into_iter().map(ClusterIdentity::from).collect())
    }

    async fn list_processes(&self, project_id: &str) -> Result<Vec<ProcessInfo>> {
        let processes: Vec<RawProcess> = self
            .get_all(&format!("groups/{}/processes", project_id))
            .await?;
        Ok(processes.into_iter().map(ProcessInfo::from).collect())
    }

    async fn get_measurements(
        &self,
        project_id: &str,
        process_id: &str,
        metric: &str,
        query: &MeasurementQuery,
    ) -> Result<Vec<MetricSample>> {
        let base = self.v1(&format!(
            "groups/{}/processes/{}/measurements",
            project_id, process_id
        ))?;
        let body: RawMeasurements = self
            .get(self.measurement_url(base, metric, query), None)
            .await?;
        Ok(body.series(metric))
    }

    async fn list_disk_partitions(&self, project_id: &str, process_id: &str) -> Result<Vec<String>> {
        let url = self.v2(&format!("groups/{}/processes/{}/disks", project_id, process_id))?;
        let body: Paginated<RawDisk> = self.get(url, Some(V2_ACCEPT)).await?;
        Ok(body
            .results
            .into_iter()
            .filter_map(|d| d.partition_name)
            .collect())
    }

    async fn get_disk_measurements(
        &self,
        project_id: &str,
        process_id: &str,
        partition: &str,
        metric: &str,
        query: &MeasurementQuery,
    ) -> Result<Vec<MetricSample>> {
        let base = self.v2(&format!(
            "groups/{}/processes/{}/disks/{}/measurements",
            project_id, process_id, partition
        ))?;
        let body: RawMeasurements = self
            .get(self.measurement_url(base, metric, query), Some(V2_ACCEPT))
            .await?;
        Ok(body.series(metric))
    }
}

// Atlas response payloads

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paginated<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    total_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawProject> for ProjectInfo {
    fn from(raw: RawProject) -> Self {
        Self {
            id: raw.id,
            name: raw.name.unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCluster {
    name: String,
    #[serde(default)]
    id: String,
    cluster_type: Option<String>,
    #[serde(rename = "mongoDBVersion")]
    mongodb_version: Option<String>,
    state_name: Option<String>,
    create_date: Option<String>,
    #[serde(rename = "diskSizeGB")]
    disk_size_gb: Option<f64>,
    #[serde(rename = "mongoURI")]
    mongo_uri: Option<String>,
    provider_settings: Option<RawProviderSettings>,
    #[serde(default)]
    replication_specs: Vec<RawReplicationSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProviderSettings {
    provider_name: Option<String>,
    region_name: Option<String>,
    instance_size_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReplicationSpec {
    #[serde(default)]
    regions_config: BTreeMap<String, RawRegionConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRegionConfig {
    #[serde(default)]
    electable_specs: Vec<RawHardwareSpec>,
    #[serde(default)]
    read_only_specs: Vec<RawHardwareSpec>,
    #[serde(default)]
    analytics_specs: Vec<RawHardwareSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHardwareSpec {
    instance_size: Option<String>,
}

impl RawCluster {
    /// First region of the first replication spec, in key order
    fn first_region(&self) -> Option<(&String, &RawRegionConfig)> {
        self.replication_specs
            .first()
            .and_then(|spec| spec.regions_config.iter().next())
    }

    /// Instance size from provider settings, else from the first region's
    /// electable, read-only or analytics specs
    fn tier(&self) -> Option<String> {
        let from_settings = self
            .provider_settings
            .as_ref()
            .and_then(|s| s.instance_size_name.clone());

        from_settings.or_else(|| {
            let (_, region) = self.first_region()?;
            [&region.electable_specs, &region.read_only_specs, &region.analytics_specs]
                .into_iter()
                .find_map(|specs| specs.first().and_then(|s| s.instance_size.clone()))
        })
    }

    fn region(&self) -> Option<String> {
        self.provider_settings
            .as_ref()
            .and_then(|s| s.region_name.clone())
            .or_else(|| self.first_region().map(|(name, _)| name.clone()))
    }
}

impl From<RawCluster> for ClusterIdentity {
    fn from(raw: RawCluster) -> Self {
        let tier = raw.tier();
        let region = raw.region();
        let provider = raw
            .provider_settings
            .as_ref()
            .and_then(|s| s.provider_name.clone());

        Self {
            name: raw.name,
            id: raw.id,
            cluster_type: raw.cluster_type,
            mongodb_version: raw.mongodb_version,
            state: raw.state_name,
            provider,
            region,
            tier,
            disk_size_gb: raw.disk_size_gb,
            created_at: raw.create_date,
            mongo_uri: raw.mongo_uri,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProcess {
    id: String,
    #[serde(default)]
    hostname: String,
    user_alias: Option<String>,
    type_name: Option<String>,
}

impl From<RawProcess> for ProcessInfo {
    fn from(raw: RawProcess) -> Self {
        Self {
            id: raw.id,
            hostname: raw.hostname,
            user_alias: raw.user_alias,
            type_name: raw.type_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDisk {
    partition_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMeasurements {
    #[serde(default)]
    measurements: Vec<RawMeasurement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMeasurement {
    name: String,
    #[serde(default)]
    data_points: Vec<MetricSample>,
}

impl RawMeasurements {
    /// Data points of the series named `metric`; empty when absent
    fn series(self, metric: &str) -> Vec<MetricSample> {
        self.measurements
            .into_iter()
            .find(|m| m.name == metric)
            .map(|m| m.data_points)
            .unwrap_or_default()
    }
}
