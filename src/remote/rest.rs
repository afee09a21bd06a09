//! HTTP client for the dashboard REST API.
//!
//! Every request carries the bearer token from the shared [`AuthContext`]
//! as a sensitive header built from a [`RedactedHeader`](crate::auth::RedactedHeader),
//! so neither our own tracing nor reqwest's can print it. Keep reqwest and
//! hyper logging at `warn` in production regardless:
//!
//! ```bash
//! # KEEPCONNECT_LOG=reqwest=trace  <-- avoid outside local debugging
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use super::{ApiError, MediaRemote, MediaUpload, RemoteCollaborator};
use crate::auth::AuthContext;
use crate::config::Config;
use crate::entity::{Entity, MediaPost, decode_single, mime_for_path};
use crate::error::{AdminError, FetchError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The signed-in account, as returned by `GET /api/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "role")]
    pub roles: Option<Value>,
}

impl Profile {
    /// Role names, whether the server sends a string, a list of names or a
    /// list of role objects.
    pub fn role_names(&self) -> Vec<String> {
        match &self.roles {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Client for `{api_url}/api/...`.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    auth: Arc<AuthContext>,
}

impl RestClient {
    /// Configures HTTP client with 30s connect timeout and 60s total timeout.
    pub fn new(api_url: &str, auth: Arc<AuthContext>) -> Result<Self> {
        Self::with_timeout(api_url, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_url: &str, auth: Arc<AuthContext>, timeout: Duration) -> Result<Self> {
        let base_url = api_base(api_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    pub fn from_config(config: &Config, auth: Arc<AuthContext>) -> Result<Self> {
        Self::with_timeout(
            &config.api_url(),
            auth,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }

    /// Base URL including the `/api` prefix, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request with auth and accept headers; decode the JSON body.
    ///
    /// A 401 clears the shared session before the error is returned.
    async fn execute(&self, request: RequestBuilder) -> std::result::Result<Value, ApiError> {
        let mut request = request.header(ACCEPT, "application/json");
        if let Some(bearer) = self.auth.bearer() {
            let value = bearer
                .as_header_value()
                .map_err(|e| ApiError::new(e.to_string()))?;
            request = request.header(AUTHORIZATION, value);
        }

        let request = request.build()?;
        debug!(method = %request.method(), url = %request.url(), "sending request");
        let response = self.client.execute(request).await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "received response");

        if !status.is_success() {
            let err = ApiError::from_body(status, &text);
            if err.is_unauthorized() && self.auth.is_authenticated() {
                warn!("server rejected the session token, clearing it");
                self.auth.clear();
            }
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn execute_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, ApiError> {
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request).await
    }

    /// `POST /login`; stores the returned token in the auth context.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let body = json!({ "email": email, "password": password });
        let response = match self.execute_json(Method::POST, "login", Some(&body)).await {
            Ok(response) => response,
            Err(err) if err.is_client_error() => {
                return Err(AdminError::Auth(format!(
                    "wrong email or password ({})",
                    err.message
                )));
            }
            Err(err) => return Err(AdminError::Auth(format!("login failed: {err}"))),
        };

        let token = ["token", "access_token"]
            .iter()
            .find_map(|key| {
                response
                    .get(key)
                    .or_else(|| response.get("data").and_then(|d| d.get(key)))
                    .and_then(Value::as_str)
            })
            .ok_or_else(|| AdminError::Auth("invalid login response: no token".to_string()))?;

        self.auth.set_token(token);
        info!(email, "logged in");
        Ok(())
    }

    /// `GET /me`
    pub async fn me(&self) -> Result<Profile> {
        if !self.auth.is_authenticated() {
            return Err(AdminError::Auth(
                "not logged in; run `kcadmin login`".to_string(),
            ));
        }
        let mut body = self
            .execute_json(Method::GET, "me", None)
            .await
            .map_err(|e| e.into_fetch_error("profile"))?;
        if let Some(user) = body.get_mut("user").map(Value::take) {
            body = user;
        }
        decode_single(body)
    }

    /// `POST /forgot_password`; returns the server's `result` flag.
    pub async fn request_password_reset(&self, email: &str) -> Result<bool> {
        let body = json!({ "email": email });
        let response = self
            .execute_json(Method::POST, "forgot_password", Some(&body))
            .await
            .map_err(|e| e.into_mutation_error("password reset", None))?;
        Ok(response
            .get("result")
            .and_then(Value::as_bool)
            .unwrap_or(true))
    }
}

/// Normalize a configured API URL to `<origin>/api` with no trailing slash.
fn api_base(api_url: &str) -> Result<String> {
    let parsed = Url::parse(api_url.trim())
        .map_err(|e| AdminError::Config(format!("invalid api_url '{api_url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AdminError::Config(format!(
            "api_url must be http or https, got '{}'",
            parsed.scheme()
        )));
    }
    let trimmed = parsed.as_str().trim_end_matches('/').to_string();
    if trimmed.ends_with("/api") {
        Ok(trimmed)
    } else {
        Ok(format!("{trimmed}/api"))
    }
}

impl<E: Entity> RemoteCollaborator<E> for RestClient {
    async fn list(&self) -> Result<Vec<E>> {
        let kind = E::KIND;
        let body = self
            .execute_json(Method::GET, kind.list_path(), None)
            .await
            .map_err(|e| e.into_fetch_error(kind.label()))?;
        E::decode_list(body).map_err(|e| FetchError::new(kind.label(), e.to_string()).into())
    }

    async fn create(&self, payload: &Value) -> Result<E> {
        let kind = E::KIND;
        let body = self
            .execute_json(Method::POST, kind.collection(), Some(payload))
            .await
            .map_err(|e| e.into_mutation_error(kind.singular(), None))?;
        E::decode_record(body)
    }

    async fn update(&self, id: &E::Id, patch: &Value) -> Result<E> {
        let kind = E::KIND;
        let path = format!("{}/{}", kind.collection(), id);
        let body = self
            .execute_json(Method::PUT, &path, Some(patch))
            .await
            .map_err(|e| e.into_mutation_error(kind.singular(), Some(id.to_string())))?;
        E::decode_record(body)
    }

    async fn delete(&self, id: &E::Id) -> Result<()> {
        let kind = E::KIND;
        let path = format!("{}/{}", kind.collection(), id);
        self.execute_json(Method::DELETE, &path, None)
            .await
            .map_err(|e| e.into_mutation_error(kind.singular(), Some(id.to_string())))?;
        Ok(())
    }

    async fn toggle_status(&self, id: &E::Id) -> Result<E> {
        let kind = E::KIND;
        let path = format!("{}/{}/toggle-status", kind.collection(), id);
        let body = self
            .execute_json(Method::PUT, &path, None)
            .await
            .map_err(|e| e.into_mutation_error(kind.singular(), Some(id.to_string())))?;
        E::decode_record(body)
    }
}

impl MediaRemote for RestClient {
    async fn upload(&self, upload: MediaUpload) -> Result<Option<MediaPost>> {
        let title = upload.effective_title();
        let mime = mime_for_path(&upload.file_name);
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(mime)?;
        let form = Form::new()
            .part("file", part)
            .text("collection", upload.collection.to_string())
            .text("title", title);

        debug!(file = %upload.file_name, collection = %upload.collection, "uploading media");
        let request = self.request(Method::POST, "media/upload").multipart(form);
        let body = self
            .execute(request)
            .await
            .map_err(|e| e.into_mutation_error("media post", None))?;

        // Upload responses vary; a record is returned only when one decodes.
        let mut record = body;
        if let Some(inner) = record.get_mut("media").map(Value::take) {
            record = inner;
        }
        Ok(decode_single::<MediaPost>(record).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_appends_api() {
        assert_eq!(api_base("http://localhost:8000").unwrap(), "http://localhost:8000/api");
        assert_eq!(api_base("http://localhost:8000/").unwrap(), "http://localhost:8000/api");
        assert_eq!(
            api_base("https://admin.example.com/api/").unwrap(),
            "https://admin.example.com/api"
        );
    }

    #[test]
    fn test_api_base_rejects_bad_urls() {
        assert!(matches!(api_base("not a url"), Err(AdminError::Config(_))));
        assert!(matches!(api_base("ftp://example.com"), Err(AdminError::Config(_))));
    }

    #[test]
    fn test_profile_role_names() {
        let profile: Profile = serde_json::from_value(json!({
            "id": 1, "name": "Ada", "email": "ada@example.com",
            "roles": [{"id": 1, "name": "Admin"}, "Editor"]
        }))
        .unwrap();
        assert_eq!(profile.role_names(), vec!["Admin", "Editor"]);
    }

    #[test]
    fn test_client_debug_hides_token() {
        let auth = Arc::new(AuthContext::with_token("hunter2"));
        let client = RestClient::new("http://localhost:8000", auth).unwrap();
        assert!(!format!("{client:?}").contains("hunter2"));
    }
}
