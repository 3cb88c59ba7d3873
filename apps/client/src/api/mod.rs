//! Backend API client, the single point of entry for all Gradpilot backend
//! calls in this crate.
//!
//! ARCHITECTURAL RULE: no other module may talk to the backend directly.
//! Every request goes through [`ApiClient`], which owns the base URL, the
//! per-request timeout, and bearer-credential attachment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::TokenStore;
use crate::context::store::{Context, ContextPusher, CvFile};
use crate::errors::{error_detail, ApiError};

pub mod models;

use models::{
    ChatRequest, ChatResponse, RegisterRequest, SummarizeRequest, TailorResponse, TokenResponse,
    UserProfile,
};

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    auth: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, auth: TokenStore) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Exchanges credentials for an access token and stores it for the rest
    /// of the session. The token endpoint takes a form body with `username`
    /// carrying the email address.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/api/token"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;
        let token: TokenResponse = Self::decode(response).await?;
        self.auth.set(token.access_token.clone());
        debug!("login succeeded; credential stored");
        Ok(token)
    }

    /// Drops the stored credential. Purely client-side: the server keeps no
    /// session to tear down.
    pub fn logout(&self) {
        self.auth.clear();
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/api/register"))
            .json(request)
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let response = self
            .authed(self.http.get(self.url("/api/users/me")))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn chat(&self, message: &str) -> Result<ChatResponse, ApiError> {
        let response = self
            .authed(self.http.post(self.url("/api/chat")))
            .json(&ChatRequest {
                message: message.to_string(),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Clears the server-side conversation history.
    pub async fn reset(&self) -> Result<(), ApiError> {
        let response = self
            .authed(self.http.post(self.url("/api/reset")))
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    pub async fn tailor_cv(
        &self,
        file: &CvFile,
        job_description: &str,
    ) -> Result<TailorResponse, ApiError> {
        let form = multipart::Form::new()
            .part("file", file_part(file)?)
            .text("job_description", job_description.to_string());
        let response = self
            .authed(self.http.post(self.url("/api/tailor_cv")))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn analyze_jd(
        &self,
        file: &CvFile,
        job_description: &str,
    ) -> Result<ChatResponse, ApiError> {
        let form = multipart::Form::new()
            .part("file", file_part(file)?)
            .text("job_description", job_description.to_string());
        let response = self
            .authed(self.http.post(self.url("/api/analyze_jd")))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn summarize_jd(&self, job_description: &str) -> Result<ChatResponse, ApiError> {
        let response = self
            .authed(self.http.post(self.url("/api/summarize_jd")))
            .json(&SummarizeRequest {
                job_description: job_description.to_string(),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn extract_skills(&self, file: &CvFile) -> Result<ChatResponse, ApiError> {
        let form = multipart::Form::new().part("file", file_part(file)?);
        let response = self
            .authed(self.http.post(self.url("/api/extract_skills")))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn ats_score(&self, file: &CvFile) -> Result<ChatResponse, ApiError> {
        let form = multipart::Form::new().part("file", file_part(file)?);
        let response = self
            .authed(self.http.post(self.url("/api/ats_score")))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.auth.bearer() {
            Some(header) => builder.header(AUTHORIZATION, header),
            None => builder,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn ensure_success(response: Response) -> Result<(), ApiError> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }
        Ok(response)
    }
}

/// Pushes the full context snapshot to the backend: only the parts that
/// exist are attached, and the bearer header rides along when a credential
/// is present. The empty-snapshot guard lives in the store.
#[async_trait]
impl ContextPusher for ApiClient {
    async fn push_context(&self, snapshot: Context) -> Result<(), ApiError> {
        let mut form = multipart::Form::new();
        if let Some(file) = &snapshot.file {
            form = form.part("file", file_part(file)?);
        }
        if !snapshot.job_text.is_empty() {
            form = form.text("job_description", snapshot.job_text.clone());
        }

        let response = self
            .authed(self.http.post(self.url("/api/update_context")))
            .multipart(form)
            .send()
            .await?;
        Self::ensure_success(response).await
    }
}

fn file_part(file: &CvFile) -> Result<multipart::Part, ApiError> {
    let mut part = multipart::Part::bytes(file.bytes.to_vec()).file_name(file.name.clone());
    if let Some(mime) = &file.mime_type {
        part = part.mime_str(mime)?;
    }
    Ok(part)
}
