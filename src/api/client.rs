use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    models::{CtfId, CtfRecord, LeaderboardEntry, SubmissionRecord},
    session::SessionStore,
};

use super::{
    types::{
        CtfDetailResponse, CtfListResponse, FlagSubmission, JoinedResponse, LeaderboardResponse,
        LimitParams, SubmissionsResponse,
    },
    ApiError, CtfBackend, CtfListParams, ProgressBackend, SubmissionReceipt,
};

/// JSON-over-HTTPS client for the CTF backend.
///
/// Attaches the session's bearer token to every request and expires the
/// session when the backend answers 401.
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<ApiClient, ApiError> {
        static APP_USER_AGENT: &str =
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let http_client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(ApiClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.http_client.request(method, self.url(path));

        if let Some(token) = self.session.bearer_for(path) {
            request = request.bearer_auth(token);
        }

        request
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!("{path} answered {status}");

        if status == StatusCode::UNAUTHORIZED {
            warn!("Request to {path} was rejected as unauthorized");
            self.session.expire_for(path);
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(path, request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CtfBackend for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn available_ctfs(&self, params: &CtfListParams) -> Result<Vec<CtfRecord>, ApiError> {
        let path = "/user/ctfs/available";
        let request = self.request(Method::GET, path).query(params);

        let response: CtfListResponse = self.send_json(path, request).await?;
        Ok(response.ctfs)
    }

    #[tracing::instrument(skip(self))]
    async fn ctf_detail(&self, id: &CtfId) -> Result<CtfRecord, ApiError> {
        let path = format!("/ctfs/{id}");
        let request = self.request(Method::GET, &path);

        let response: CtfDetailResponse = self.send_json(&path, request).await?;
        Ok(response.into())
    }

    #[tracing::instrument(skip(self))]
    async fn is_joined(&self, id: &CtfId) -> Result<bool, ApiError> {
        let path = format!("/user/ctfs/{id}/joined");
        let request = self.request(Method::GET, &path);

        let response: JoinedResponse = self.send_json(&path, request).await?;
        Ok(response.joined)
    }

    #[tracing::instrument(skip(self))]
    async fn join_ctf(&self, id: &CtfId) -> Result<(), ApiError> {
        let path = format!("/user/ctfs/{id}/join");
        let request = self.request(Method::POST, &path);

        self.send(&path, request).await.map(|_| ())
    }

    #[tracing::instrument(skip(self, flag))]
    async fn submit_flag(&self, id: &CtfId, flag: &str) -> Result<SubmissionReceipt, ApiError> {
        let path = format!("/ctfs/{id}/submit");
        let request = self
            .request(Method::POST, &path)
            .json(&FlagSubmission { flag });

        self.send_json(&path, request).await
    }
}

#[async_trait]
impl ProgressBackend for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn global_leaderboard(&self, limit: Option<u32>) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let path = "/leaderboard/global";
        let request = self
            .request(Method::GET, path)
            .query(&LimitParams { limit });

        let response: LeaderboardResponse = self.send_json(path, request).await?;
        Ok(response.leaderboard)
    }

    #[tracing::instrument(skip(self))]
    async fn ctf_leaderboard(&self, id: &CtfId) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let path = format!("/ctfs/{id}/leaderboard");
        let request = self.request(Method::GET, &path);

        let response: LeaderboardResponse = self.send_json(&path, request).await?;
        Ok(response.leaderboard)
    }

    #[tracing::instrument(skip(self))]
    async fn my_submissions(&self, limit: Option<u32>) -> Result<Vec<SubmissionRecord>, ApiError> {
        let path = "/user/my-submissions";
        let request = self
            .request(Method::GET, path)
            .query(&LimitParams { limit });

        let response: SubmissionsResponse = self.send_json(path, request).await?;
        Ok(response.submissions)
    }
}
