//! HTTP client for the platform's callback endpoints.
//!
//! One [`ApiClient`] is shared by the whole bot. Endpoint choice follows the
//! authentication mode: callbacks go to the v3 paths with a bearer token, or
//! to the unauthenticated v2 paths when credentials are disabled. The
//! platform's answer always comes back as an [`ApiResponse`]; a non-2xx
//! status is data for the caller, not an error.

use reqwest::multipart;
use uuid::Uuid;

use botx_core::api::ApiResponse;
use botx_core::error::{ApiError, ApiResult};
use botx_models::{OutgoingCommandResult, OutgoingFile, OutgoingNotification};

/// Thin wrapper around [`reqwest::Client`] speaking the platform's wire API.
pub struct ApiClient {
    http: reqwest::Client,
    scheme: &'static str,
}

impl ApiClient {
    /// Creates a client talking HTTPS, the production transport.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            scheme: "https",
        }
    }

    /// Creates a client talking plain HTTP, for local development and tests.
    pub fn insecure() -> Self {
        Self {
            http: reqwest::Client::new(),
            scheme: "http",
        }
    }

    fn url(&self, host: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, host, path)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> ApiResult<ApiResponse> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Http(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Http(err.to_string()))?;
        Ok(ApiResponse { body, status })
    }

    /// Fetches a bearer token for `bot_id` from `host`.
    pub async fn request_token(
        &self,
        host: &str,
        bot_id: Uuid,
        signature: &str,
    ) -> ApiResult<ApiResponse> {
        let url = self.url(host, &format!("/api/v2/botx/bots/{bot_id}/token"));
        let request = self.http.get(url).query(&[("signature", signature)]);
        self.execute(request).await
    }

    /// POSTs a command result to the command callback.
    ///
    /// With a token the v3 endpoint is used; without one the unauthenticated
    /// v2 endpoint.
    pub async fn send_command_result(
        &self,
        host: &str,
        result: &OutgoingCommandResult,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let path = match token {
            Some(_) => "/api/v3/botx/command/callback",
            None => "/api/v2/botx/command/callback",
        };
        let mut request = self.http.post(self.url(host, path)).json(result);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.execute(request).await
    }

    /// POSTs a notification to the notification callback.
    pub async fn send_notification(
        &self,
        host: &str,
        notification: &OutgoingNotification,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let path = match token {
            Some(_) => "/api/v3/botx/notification/callback",
            None => "/api/v2/botx/notification/callback",
        };
        let mut request = self.http.post(self.url(host, path)).json(notification);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.execute(request).await
    }

    /// Uploads a file to the file callback as multipart form data.
    ///
    /// The `file` part carries the decoded raw bytes; `bot_id` and `sync_id`
    /// travel as plain text fields.
    pub async fn send_file(
        &self,
        host: &str,
        upload: &OutgoingFile,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let bytes = upload.file.raw_data()?;
        let part = multipart::Part::bytes(bytes)
            .file_name(upload.file.file_name.clone())
            .mime_str(upload.file.media_type())
            .map_err(|err| ApiError::Http(err.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("bot_id", upload.bot_id.to_string())
            .text("sync_id", upload.sync_id.to_string());

        let mut request = self
            .http
            .post(self.url(host, "/api/v1/botx/file/callback"))
            .multipart(form);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.execute(request).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
