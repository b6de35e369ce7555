//! HTTP client for the dashboard backend.
//!
//! One [`ApiClient`] is built at startup and passed by reference to every
//! command. It owns the session [`TokenStore`], so login and registration
//! persist the token and authenticated calls pick it up.

use crate::api::error::ApiError;
use crate::config::ApiConfig;
use crate::models::{
    ApiEnvelope, AuthPayload, InstitutionPage, LoginRequest, RegisterRequest, StatsData, UserInfo,
};
use crate::session::{decode_user_info, TokenStore};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

const REGISTER_PATH: &[&str] = &[
    "super-admin",
    "auth",
    "super-admin",
    "register-super-institution-admin",
];
const LOGIN_PATH: &[&str] = &["super-admin", "auth", "super-institution-admin", "login"];
const MY_INSTITUTIONS_PATH: &[&str] = &["super-admin", "institutions", "my"];

/// Message used when an error body is not JSON at all.
const FALLBACK_ERROR_MESSAGE: &str = "An error occurred";

/// Client for the institution dashboard API.
pub struct ApiClient {
    base_url: String,
    timeout_seconds: u64,
    http: reqwest::Client,
    tokens: TokenStore,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(config: &ApiConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        // Fail early on a malformed base URL rather than on the first request.
        build_url(&config.base_url, &[])?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("institution-insights/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!("API client for {}", config.base_url);

        Ok(Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            http,
            tokens,
        })
    }

    /// Base URL the client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register a new institution administrator and store the session token.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        let url = build_url(&self.base_url, REGISTER_PATH)?;
        info!("Registering {}", request.email);

        let payload: AuthPayload = self.send(self.http.post(url).json(request)).await?;
        self.remember_token(&payload)?;
        Ok(payload)
    }

    /// Sign in and store the session token.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, ApiError> {
        let url = build_url(&self.base_url, LOGIN_PATH)?;
        info!("Signing in as {}", request.email);

        let payload: AuthPayload = self.send(self.http.post(url).json(request)).await?;
        self.remember_token(&payload)?;
        Ok(payload)
    }

    /// Fetch the analytics payload of one institution.
    pub async fn get_institution_stats(&self, institution_id: &str) -> Result<StatsData, ApiError> {
        let url = build_url(
            &self.base_url,
            &["super-admin", "institutions", institution_id, "stats"],
        )?;
        debug!("Fetching stats for {}", institution_id);

        let request = self.authorized(self.http.get(url))?;
        self.send(request).await
    }

    /// Fetch one page of the institutions managed by the signed-in admin.
    pub async fn get_my_institutions(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<InstitutionPage, ApiError> {
        let url = build_url(&self.base_url, MY_INSTITUTIONS_PATH)?;
        debug!("Fetching institutions page {} (limit {})", page, limit);

        let query = [("page", page), ("limit", limit)];
        let request = self.authorized(self.http.get(url).query(&query))?;
        self.send(request).await
    }

    /// Forget the stored session token.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.tokens.delete()?;
        info!("Signed out");
        Ok(())
    }

    /// Whether a session token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.load().is_some()
    }

    /// The stored session token, if any.
    pub fn token(&self) -> Option<String> {
        self.tokens.load()
    }

    /// Profile fields decoded from the stored token.
    pub fn user_info(&self) -> Option<UserInfo> {
        self.token().and_then(|t| decode_user_info(&t))
    }

    fn remember_token(&self, payload: &AuthPayload) -> Result<(), ApiError> {
        if payload.token.is_empty() {
            warn!("Server returned no session token");
            return Ok(());
        }
        self.tokens.store(&payload.token)?;
        Ok(())
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.tokens.load().ok_or(ApiError::NotAuthenticated)?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            warn!("API error {}: {}", status, message);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        decode_envelope(&body)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_seconds)
        } else if e.is_connect() {
            ApiError::Connect(self.base_url.clone())
        } else {
            ApiError::Request(e)
        }
    }
}

/// Join path segments onto the base URL, percent-encoding each segment.
pub fn build_url(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(base.to_string()))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Extract a user-facing message from an error response body.
///
/// A JSON body with a non-empty `message` wins; JSON without one falls back
/// to the status; a body that is not JSON yields a generic message.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status)),
        Err(_) => FALLBACK_ERROR_MESSAGE.to_string(),
    }
}

/// Decode the `data` field of a response envelope.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(envelope.data)
}
