use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::api::{ApiError, ReviewApi};
use crate::config::DashboardConfig;
use crate::review::domain::{Grant, GrantApplication, ListingId, SponsorId, Submission};
use crate::review::payload::{
    ApplicationPage, ApplicationQuery, RecordPaymentRequest, RejectSubmissionsRequest,
    StatusUpdateResponse, UpdateApplicationStatusRequest,
};
use crate::review::router::SPONSOR_HEADER;

/// [`ReviewApi`] over HTTP against the sponsor dashboard endpoints.
#[derive(Debug, Clone)]
pub struct HttpReviewApi {
    client: Client,
    base_url: Url,
    sponsor: SponsorId,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpReviewApi {
    pub fn new(config: &DashboardConfig, sponsor: SponsorId) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self::with_client(client, config.api_base_url.clone(), sponsor))
    }

    /// `base_url` must end with `/` so relative paths resolve beneath it.
    pub fn with_client(client: Client, base_url: Url, sponsor: SponsorId) -> Self {
        Self {
            client,
            base_url,
            sponsor,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `segments` beneath the base URL; each segment is percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Endpoint {
                path: segments.join("/"),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<(Url, RequestBuilder), ApiError> {
        let url = self.endpoint(segments)?;
        Ok((url.clone(), self.with_sponsor(method, url)))
    }

    fn with_sponsor(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(SPONSOR_HEADER, self.sponsor.0.as_str())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: Url,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let endpoint = url.path().to_string();
        debug!(%endpoint, "dashboard api request");
        let response = builder
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|parsed| parsed.error)
                .unwrap_or_else(|_| body.trim().to_string());
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[async_trait]
impl ReviewApi for HttpReviewApi {
    async fn grant(&self, slug: &str) -> Result<Grant, ApiError> {
        let (url, builder) = self.request(Method::GET, &["grants", slug])?;
        self.send(url, builder).await
    }

    async fn applications(
        &self,
        slug: &str,
        query: &ApplicationQuery,
    ) -> Result<ApplicationPage, ApiError> {
        let mut url = self.endpoint(&["grants", slug, "applications"])?;
        url.query_pairs_mut()
            .append_pair("searchText", &query.search_text)
            .append_pair("length", &query.length.to_string())
            .append_pair("skip", &query.skip.to_string());
        let builder = self.with_sponsor(Method::GET, url.clone());
        self.send(url, builder).await
    }

    async fn update_application_status(
        &self,
        request: UpdateApplicationStatusRequest,
    ) -> Result<Vec<GrantApplication>, ApiError> {
        let (url, builder) =
            self.request(Method::POST, &["grants", "update-application-status"])?;
        let response: StatusUpdateResponse = self.send(url, builder.json(&request)).await?;
        Ok(response.updated)
    }

    async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> Result<GrantApplication, ApiError> {
        let (url, builder) = self.request(Method::POST, &["grants", "record-payment"])?;
        self.send(url, builder.json(&request)).await
    }

    async fn submissions(&self, listing: &ListingId) -> Result<Vec<Submission>, ApiError> {
        let (url, builder) =
            self.request(Method::GET, &["listings", listing.0.as_str(), "submissions"])?;
        self.send(url, builder).await
    }

    async fn reject_submissions(
        &self,
        request: RejectSubmissionsRequest,
    ) -> Result<Vec<Submission>, ApiError> {
        let (url, builder) = self.request(Method::POST, &["submission", "reject"])?;
        self.send(url, builder.json(&request)).await
    }
}
