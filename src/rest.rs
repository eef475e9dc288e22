//! REST client for the `/api/v2/` request/response endpoints.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::endpoint;
use crate::model::control::ControlRequest;
use crate::model::{
    BasicControlAction, FanSpeedPreset, Map, MapSegmentsRequest, PresetControl, RobotInfo,
    RobotState, Segment, StateAttribute, StatisticsDataPoint, WaterUsagePreset,
};
use crate::retry::{retry_async, RetryPolicy};
use crate::tls::{PinnedCertificate, TlsError};

const ERROR_BODY_SNIPPET_LEN: usize = 220;

/// Options applied when building a [`RestClient`].
#[derive(Clone, Debug)]
pub struct RestClientOptions {
    pub connect_timeout: Duration,
    pub attempt_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub pinned_certificate: Option<PinnedCertificate>,
}

impl Default for RestClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
            retry_policy: RetryPolicy::local_network(),
            pinned_certificate: None,
        }
    }
}

/// Request/response client for robot status, map, segment, and control
/// endpoints.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
    attempt_timeout: Duration,
    retry_policy: RetryPolicy,
}

impl RestClient {
    /// Creates a client with default options.
    pub fn new(base_url: &str) -> Result<Self, RestError> {
        Self::with_options(base_url, RestClientOptions::default())
    }

    pub fn with_options(base_url: &str, options: RestClientOptions) -> Result<Self, RestError> {
        let base_url =
            Url::parse(base_url).map_err(|error| RestError::InvalidBaseUrl(error.to_string()))?;
        if !base_url.has_host() {
            return Err(RestError::InvalidBaseUrl(format!(
                "`{base_url}` has no host"
            )));
        }

        let mut builder = Client::builder()
            .no_proxy()
            .connect_timeout(options.connect_timeout);
        if let Some(pinned) = &options.pinned_certificate {
            builder = builder.add_root_certificate(pinned.reqwest_certificate()?);
            if pinned.hostname_check_disabled() {
                builder = builder.danger_accept_invalid_hostnames(true);
            }
        }
        let http = builder.build().map_err(RestError::Transport)?;

        Ok(Self {
            http,
            base_url,
            attempt_timeout: options.attempt_timeout,
            retry_policy: options.retry_policy,
        })
    }

    /// Vendor and model information.
    pub async fn fetch_info(&self) -> Result<RobotInfo, RestError> {
        self.get_json(endpoint::ROBOT).await
    }

    /// Combined attribute and map snapshot.
    pub async fn fetch_state(&self) -> Result<RobotState, RestError> {
        self.get_json(endpoint::STATE).await
    }

    /// Current state attributes only.
    pub async fn fetch_state_attributes(&self) -> Result<Vec<StateAttribute>, RestError> {
        self.get_json(endpoint::STATE_ATTRIBUTES).await
    }

    /// Current map snapshot only.
    pub async fn fetch_map(&self) -> Result<Map, RestError> {
        self.get_json(endpoint::MAP).await
    }

    /// Statistics for the running or most recent cleanup.
    pub async fn fetch_current_statistics(&self) -> Result<Vec<StatisticsDataPoint>, RestError> {
        self.get_json(endpoint::CURRENT_STATISTICS).await
    }

    /// Lifetime statistics.
    pub async fn fetch_total_statistics(&self) -> Result<Vec<StatisticsDataPoint>, RestError> {
        self.get_json(endpoint::TOTAL_STATISTICS).await
    }

    /// Named segments known to the map.
    pub async fn fetch_segments(&self) -> Result<Vec<Segment>, RestError> {
        self.get_json(endpoint::MAP_SEGMENTATION).await
    }

    /// Starts a one-pass cleanup of the given segments, in order.
    pub async fn clean_segments(&self, segments: &[Segment]) -> Result<(), RestError> {
        let request =
            MapSegmentsRequest::start(segments.iter().map(|segment| segment.id.clone()).collect());
        self.put_json(endpoint::MAP_SEGMENTATION, &request).await
    }

    pub async fn start_cleaning(&self) -> Result<(), RestError> {
        self.basic_control(BasicControlAction::Start).await
    }

    pub async fn stop_cleaning(&self) -> Result<(), RestError> {
        self.basic_control(BasicControlAction::Stop).await
    }

    pub async fn pause_cleaning(&self) -> Result<(), RestError> {
        self.basic_control(BasicControlAction::Pause).await
    }

    /// Sends the robot back to its dock.
    pub async fn drive_home(&self) -> Result<(), RestError> {
        self.basic_control(BasicControlAction::Home).await
    }

    /// Fan presets the robot supports.
    pub async fn fetch_fan_speed_presets(&self) -> Result<Vec<FanSpeedPreset>, RestError> {
        self.get_json(endpoint::FAN_SPEED_PRESET).await
    }

    pub async fn control_fan_speed(&self, preset: FanSpeedPreset) -> Result<(), RestError> {
        self.put_json(endpoint::FAN_SPEED_PRESET, &PresetControl { name: preset })
            .await
    }

    /// Water usage presets the robot supports.
    pub async fn fetch_water_usage_presets(&self) -> Result<Vec<WaterUsagePreset>, RestError> {
        self.get_json(endpoint::WATER_USAGE_PRESET).await
    }

    pub async fn control_water_usage(&self, preset: WaterUsagePreset) -> Result<(), RestError> {
        self.put_json(
            endpoint::WATER_USAGE_PRESETS_PUT,
            &PresetControl { name: preset },
        )
        .await
    }

    async fn basic_control(&self, action: BasicControlAction) -> Result<(), RestError> {
        self.put_json(endpoint::BASIC_CONTROL, &ControlRequest { action })
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        let url = endpoint::resolve(&self.base_url, path);
        let body = retry_async(
            &self.retry_policy,
            |_| {
                let url = url.clone();
                async move { self.fetch_body(url).await }
            },
            RestError::is_retryable,
        )
        .await?;
        serde_json::from_str(&body).map_err(RestError::Decode)
    }

    async fn put_json<B: Serialize>(&self, path: &str, request: &B) -> Result<(), RestError> {
        let url = endpoint::resolve(&self.base_url, path);
        retry_async(
            &self.retry_policy,
            |_| {
                let url = url.clone();
                async move {
                    let response = self
                        .http
                        .put(url)
                        .timeout(self.attempt_timeout)
                        .json(request)
                        .send()
                        .await
                        .map_err(RestError::Transport)?;
                    check_status(response).await.map(|_| ())
                }
            },
            RestError::is_retryable,
        )
        .await
    }

    async fn fetch_body(&self, url: Url) -> Result<String, RestError> {
        let response = self
            .http
            .get(url)
            .timeout(self.attempt_timeout)
            .send()
            .await
            .map_err(RestError::Transport)?;
        let response = check_status(response).await?;
        response.text().await.map_err(RestError::Transport)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RestError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RestError::Status {
        status,
        body: body.chars().take(ERROR_BODY_SNIPPET_LEN).collect(),
    })
}

/// Errors produced by REST requests.
#[derive(Debug, Error)]
pub enum RestError {
    /// The base address did not parse as an origin URL.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// A pinned certificate could not be applied.
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// The request failed below the HTTP layer.
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    /// The robot answered with a non-200 status.
    #[error("http status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl RestError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_timeout() || error.is_connect(),
            Self::Status { status, .. } => status.is_server_error(),
            Self::InvalidBaseUrl(_) | Self::Tls(_) | Self::Decode(_) => false,
        }
    }
}
