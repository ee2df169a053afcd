use crate::error::{ApiError, ApiResult};
use crate::model::{ClientConfig, LoginRequest, LoginResponse, SearchEnvelope, StatusUpdate};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Remote recruitment API as seen by the controller and the transition engine.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// Look up candidates by registration number.
    async fn search(&self, token: &str, reg_no: &str) -> ApiResult<SearchEnvelope>;

    /// Overwrite all three round levels of one candidate.
    async fn update_status(
        &self,
        token: &str,
        candidate_id: &str,
        update: &StatusUpdate,
    ) -> ApiResult<()>;

    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;
}

#[async_trait]
impl<T: PortalApi + ?Sized> PortalApi for std::sync::Arc<T> {
    async fn search(&self, token: &str, reg_no: &str) -> ApiResult<SearchEnvelope> {
        (**self).search(token, reg_no).await
    }

    async fn update_status(
        &self,
        token: &str,
        candidate_id: &str,
        update: &StatusUpdate,
    ) -> ApiResult<()> {
        (**self).update_status(token, candidate_id, update).await
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        (**self).login(request).await
    }
}

#[derive(Debug, Clone)]
pub struct PortalClient {
    pub http: reqwest::Client,
    pub base_url: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    #[serde(rename = "regNo")]
    reg_no: &'a str,
}

impl PortalClient {
    pub fn new(cfg: &ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Network {
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_url(&self) -> String {
        format!("{}/admin/response/", self.base_url)
    }

    /// The candidate id is a single percent-encoded path segment.
    pub fn update_status_url(&self, candidate_id: &str) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ApiError::Network {
            message: format!("invalid base URL {}: {e}", self.base_url),
        })?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Network {
                message: format!("base URL {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(["admin", "updatestatus", candidate_id]);
        Ok(url)
    }

    pub fn login_url(&self) -> String {
        format!("{}/auth/login", self.base_url)
    }

    fn bearer(token: &str) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let value =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ApiError::Unauthenticated)?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Send and map non-2xx answers to `ApiError::Status`.
    async fn send(request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PortalApi for PortalClient {
    async fn search(&self, token: &str, reg_no: &str) -> ApiResult<SearchEnvelope> {
        let url = self.search_url();
        debug!(url = %url, reg_no, "searching candidate");
        let request = self
            .http
            .post(&url)
            .headers(Self::bearer(token)?)
            .json(&SearchRequest { reg_no });
        let response = Self::send(request).await?;
        Self::decode(response).await
    }

    async fn update_status(
        &self,
        token: &str,
        candidate_id: &str,
        update: &StatusUpdate,
    ) -> ApiResult<()> {
        let url = self.update_status_url(candidate_id)?;
        debug!(
            url = %url,
            tech = update.tech,
            design = update.design,
            management = update.management,
            "updating round status"
        );
        let request = self
            .http
            .put(url.clone())
            .headers(Self::bearer(token)?)
            .json(update);
        Self::send(request).await?;
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let url = self.login_url();
        debug!(url = %url, email = %request.email, "logging in");
        let response = Self::send(self.http.post(&url).json(request)).await?;
        let body: LoginResponse = Self::decode(response).await?;
        match body.token.as_deref() {
            Some(t) if !t.is_empty() => Ok(body),
            _ => Err(ApiError::LoginRejected {
                message: body
                    .error
                    .as_ref()
                    .map(|e| match e.as_str() {
                        Some(s) => s.to_string(),
                        None => e.to_string(),
                    })
                    .unwrap_or_else(|| "no token in response".into()),
            }),
        }
    }
}
