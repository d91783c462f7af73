//! Session-authenticated HTTP client for the vSphere Automation REST API.
//!
//! All calls go to `https://{server}:{port}/api/...` on vCenter or ESXi.
//! Manages session lifecycle (create / delete), waits on tasks and
//! provides typed request helpers used by the host, storage and
//! appliance managers.

use crate::error::{VsphereError, VsphereErrorKind, VsphereResult};
use crate::types::{ApiType, TaskInfo, VsphereConfig};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

const SESSION_HEADER: &str = "vmware-api-session-id";
const TASK_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// REST client bound to one vCenter or ESXi endpoint.
pub struct VsphereClient {
    client: Client,
    base_url: String,
    session_id: Option<String>,
    config: VsphereConfig,
    api_type: OnceCell<ApiType>,
}

impl VsphereClient {
    /// Validate `config` and build the HTTP client. Call `login` before use.
    pub fn new(config: &VsphereConfig) -> VsphereResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| VsphereError::connection(format!("Failed to build HTTP client: {e}")))?;

        let base = Url::parse(&format!("https://{}:{}", config.host, config.port)).map_err(|e| {
            VsphereError::invalid_argument(format!("invalid vSphere server '{}': {e}", config.host))
        })?;
        let base_url = base.as_str().trim_end_matches('/').to_string();

        let api_type = match config.api_type {
            Some(t) => OnceCell::new_with(Some(t)),
            None => OnceCell::new(),
        };

        Ok(Self {
            client,
            base_url,
            session_id: None,
            config: config.clone(),
            api_type,
        })
    }

    /// `https://server:port`, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True once `login` has succeeded.
    pub fn is_connected(&self) -> bool {
        self.session_id.is_some()
    }

    /// Session token sent with every request.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn config(&self) -> &VsphereConfig {
        &self.config
    }

    // ── Session ─────────────────────────────────────────────────────

    /// POST /api/session with basic auth and keep the returned token.
    pub async fn login(&mut self) -> VsphereResult<String> {
        let url = format!("{}/api/session", self.base_url);
        log::debug!("Creating vSphere session on {} as {}", self.base_url, self.config.username);

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(VsphereError::auth("Invalid credentials"));
        }

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VsphereError::api(
                status.as_u16(),
                format!("session create rejected: {body}"),
            ));
        }

        // token is a bare JSON string
        let session_id: String = resp.json().await.map_err(|e| {
            VsphereError::parse(format!("Failed to parse session response: {e}"))
        })?;

        self.session_id = Some(session_id.clone());
        log::info!("Connected to {}", self.config.host);
        Ok(session_id)
    }

    /// DELETE /api/session. Failures are logged, never returned.
    pub async fn logout(&mut self) -> VsphereResult<()> {
        if let Some(ref sid) = self.session_id {
            let url = format!("{}/api/session", self.base_url);
            if let Err(e) = self
                .client
                .delete(&url)
                .header(SESSION_HEADER, sid.as_str())
                .send()
                .await
            {
                log::warn!("Session logout on {} failed: {e}", self.config.host);
            }
        }
        self.session_id = None;
        Ok(())
    }

    /// GET /api/session; false once the token has expired.
    pub async fn check_session(&self) -> VsphereResult<bool> {
        let sid = self.require_session()?;
        let url = format!("{}/api/session", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header(SESSION_HEADER, sid)
            .send()
            .await?;

        Ok(resp.status().is_success())
    }

    /// Endpoint type, detected once per client unless pinned in config.
    ///
    /// Only vCenter serves the datacenter inventory, so a 404 there means
    /// the session is talking to a standalone ESXi host agent.
    pub async fn detect_api_type(&self) -> VsphereResult<ApiType> {
        self.api_type
            .get_or_try_init(|| async {
                match self.get_raw("/api/vcenter/datacenter").await {
                    Ok(_) => Ok(ApiType::VirtualCenter),
                    Err(e) if e.kind == VsphereErrorKind::NotFound => Ok(ApiType::HostAgent),
                    Err(e) => Err(e),
                }
            })
            .await
            .copied()
    }

    // ── Tasks ───────────────────────────────────────────────────────

    /// Poll a task until it finishes or `timeout` elapses.
    pub async fn wait_for_task(&self, task: &str, timeout: Duration) -> VsphereResult<TaskInfo> {
        let path = format!("/api/cis/tasks/{task}");
        let poll = async {
            loop {
                let mut info: TaskInfo = self.get(&path).await?;
                if info.status.is_finished() {
                    info.task = task.to_string();
                    return Ok::<_, VsphereError>(info);
                }
                tokio::time::sleep(TASK_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            VsphereError::timeout(format!("task {task} did not finish within {}s", timeout.as_secs()))
        })?
    }

    // ── Requests ────────────────────────────────────────────────────

    fn require_session(&self) -> VsphereResult<&str> {
        self.session_id
            .as_deref()
            .ok_or_else(|| VsphereError::auth("Not logged in: no active session"))
    }

    /// Request builder for `path` carrying the session header.
    fn request(&self, method: Method, path: &str) -> VsphereResult<RequestBuilder> {
        let sid = self.require_session()?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.client.request(method, url).header(SESSION_HEADER, sid))
    }

    async fn send(&self, req: RequestBuilder) -> VsphereResult<Response> {
        Self::check_status(req.send().await?).await
    }

    /// GET, parsed as JSON.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> VsphereResult<T> {
        let resp = self.get_raw(path).await?;
        Self::parse_response(resp).await
    }

    /// GET; the status is checked, the body left unread.
    pub async fn get_raw(&self, path: &str) -> VsphereResult<Response> {
        self.send(self.request(Method::GET, path)?).await
    }

    /// GET with query parameters, parsed as JSON.
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> VsphereResult<T> {
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let resp = self.send(self.request(Method::GET, path)?.query(&borrowed)).await?;
        Self::parse_response(resp).await
    }

    /// POST a JSON body and parse the reply.
    pub async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> VsphereResult<T> {
        let resp = self.post_raw(path, body).await?;
        Self::parse_response(resp).await
    }

    /// POST a JSON body and hand back the checked response.
    pub async fn post_raw<B: serde::Serialize>(&self, path: &str, body: &B) -> VsphereResult<Response> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    /// POST without a body (actions such as `?action=rescan`).
    pub async fn post_empty(&self, path: &str) -> VsphereResult<()> {
        self.send(self.request(Method::POST, path)?).await.map(drop)
    }

    pub async fn patch<B: serde::Serialize>(&self, path: &str, body: &B) -> VsphereResult<()> {
        self.send(self.request(Method::PATCH, path)?.json(body)).await.map(drop)
    }

    pub async fn put<B: serde::Serialize>(&self, path: &str, body: &B) -> VsphereResult<()> {
        self.send(self.request(Method::PUT, path)?.json(body)).await.map(drop)
    }

    /// DELETE; any response body is dropped.
    pub async fn delete(&self, path: &str) -> VsphereResult<()> {
        self.send(self.request(Method::DELETE, path)?).await.map(drop)
    }

    // ── Response handling ───────────────────────────────────────────

    async fn check_status(resp: Response) -> VsphereResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();

        let message = match status {
            StatusCode::UNAUTHORIZED => format!("session rejected: {body}"),
            StatusCode::FORBIDDEN => format!("permission denied: {body}"),
            StatusCode::NOT_FOUND => format!("no such object: {body}"),
            _ => format!("HTTP {code}: {body}"),
        };
        Err(VsphereError::new(kind_for_status(status), message))
    }

    async fn parse_response<T: DeserializeOwned>(resp: Response) -> VsphereResult<T> {
        let text = resp.text().await.map_err(|e| {
            VsphereError::parse(format!("Failed to read response body: {e}"))
        })?;
        decode_body(&text)
    }
}

/// Error kind for a non-success HTTP status.
fn kind_for_status(status: StatusCode) -> VsphereErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => VsphereErrorKind::AuthenticationError,
        StatusCode::FORBIDDEN => VsphereErrorKind::AccessDenied,
        StatusCode::NOT_FOUND => VsphereErrorKind::NotFound,
        other => VsphereErrorKind::ApiError(other.as_u16()),
    }
}

/// Decode a response body; some vSphere endpoints return an empty body for success.
fn decode_body<T: DeserializeOwned>(text: &str) -> VsphereResult<T> {
    if text.is_empty() {
        return serde_json::from_str("null").map_err(|e| {
            VsphereError::parse(format!("Cannot deserialise empty response: {e}"))
        });
    }

    serde_json::from_str(text).map_err(|e| {
        let cut = text.char_indices().nth(500).map(|(i, _)| i).unwrap_or(text.len());
        VsphereError::parse(format!("JSON parse error: {e}; body: {}", &text[..cut]))
    })
}
