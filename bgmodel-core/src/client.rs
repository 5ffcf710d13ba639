//! One-shot queries against the background model service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::{fmt::Debug, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    config::ServiceConfig,
    error::FetchError,
    model::BackgroundMeasurement,
    request::ObservationRequest,
    response::ServiceResponse,
    units::MjyPerSr,
};

/// Logged whenever a query fails after the request was built.
pub const FAILURE_WARNING: &str = "Sorry, something went wrong. Try again.";

/// Default User-Agent string for requests.
pub const DEFAULT_USER_AGENT: &str = concat!("bgmodel/", env!("CARGO_PKG_VERSION"));

/// Fetches the body of a GET request.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Transport`] over HTTPS with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self { http })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, FetchError> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        check_status(status, body)
    }
}

/// Pass a 2xx body through; anything else becomes [`FetchError::HttpStatus`].
fn check_status(status: StatusCode, body: String) -> Result<String, FetchError> {
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    Ok(body)
}

/// Result of one background model query.
///
/// Input problems never get this far: they fail in [`ObservationRequest::new`].
/// Anything that goes wrong afterwards is kept in [`outcome`](Self::outcome)
/// and the measurement accessors return `None`.
#[derive(Debug)]
pub struct BackgroundModel {
    request: ObservationRequest,
    url: String,
    response: Option<ServiceResponse>,
    outcome: Result<BackgroundMeasurement, FetchError>,
}

impl BackgroundModel {
    /// Send `request` and decode the reply.
    pub async fn query(
        transport: &dyn Transport,
        request: ObservationRequest,
        config: &ServiceConfig,
    ) -> Self {
        let url = request.url(&config.base_url, config.parameter_layout);
        debug!(%url, "querying background model");

        let (response, outcome) = match fetch(transport, &url).await {
            Ok(response) => {
                let outcome = BackgroundMeasurement::from_response(&response);
                (Some(response), outcome)
            }
            Err(err) => (None, Err(err)),
        };

        match &outcome {
            Ok(m) => info!(total = m.total_background.value(), "background model query succeeded"),
            Err(err) => warn!(error = %err, %url, "{}", FAILURE_WARNING),
        }

        Self { request, url, response, outcome }
    }

    pub fn request(&self) -> &ObservationRequest {
        &self.request
    }

    /// URL the query was sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parsed service reply, when one was received and decoded.
    pub fn response(&self) -> Option<&ServiceResponse> {
        self.response.as_ref()
    }

    /// `results/@status` as reported by the service.
    pub fn request_status(&self) -> Option<&str> {
        self.response.as_ref().and_then(ServiceResponse::status)
    }

    pub fn outcome(&self) -> Result<&BackgroundMeasurement, &FetchError> {
        self.outcome.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn measurement(&self) -> Option<&BackgroundMeasurement> {
        self.outcome.as_ref().ok()
    }

    pub fn zodiacal_light(&self) -> Option<MjyPerSr> {
        self.measurement().map(|m| m.zodiacal_light)
    }

    pub fn ism(&self) -> Option<MjyPerSr> {
        self.measurement().map(|m| m.ism)
    }

    pub fn stars(&self) -> Option<MjyPerSr> {
        self.measurement().map(|m| m.stars)
    }

    pub fn cib(&self) -> Option<MjyPerSr> {
        self.measurement().map(|m| m.cib)
    }

    pub fn total_background(&self) -> Option<MjyPerSr> {
        self.measurement().map(|m| m.total_background)
    }
}

async fn fetch(transport: &dyn Transport, url: &str) -> Result<ServiceResponse, FetchError> {
    let body = transport.get(url).await?;
    ServiceResponse::parse(&body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
