use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::AppConfig;
use crate::error::ProxyError;
use crate::routing::CapabilityProbe;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
const MAX_ERROR_MESSAGE_LEN: usize = 500;

fn build_reqwest_client(
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Option<Duration>,
    timeout: Duration,
    use_env_proxy: bool,
    proxy_url: Option<&str>,
) -> Result<reqwest::Client, ProxyError> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(pool_max_idle_per_host)
        .pool_idle_timeout(pool_idle_timeout)
        .tcp_nodelay(true)
        .connect_timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout);

    if let Some(proxy_url) = proxy_url {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|err| ProxyError::Config(format!("Invalid proxy URL: {err}")))?;
        builder = builder.no_proxy().proxy(proxy);
    } else if !use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|err| ProxyError::Transport(format!("Failed to build HTTP client: {err}")))
}

/// `<base>/chat/completions`, tolerating a trailing slash on the base.
fn chat_completions_url(base_url: &str) -> Result<url::Url, ProxyError> {
    let base = format!("{}/", base_url.trim_end_matches('/'));
    url::Url::parse(&base)
        .and_then(|base| base.join(CHAT_COMPLETIONS_PATH))
        .map_err(|err| ProxyError::Config(format!("Invalid upstream base_url '{base_url}': {err}")))
}

/// Reduce an upstream error body to a short message.
///
/// Prefers `error.message`, then a top-level `message` or `detail` string,
/// and otherwise the lossy UTF-8 body capped at 500 bytes.
pub(crate) fn sanitize_upstream_error(body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        let message = json
            .get("error")
            .and_then(|e| e.get("message"))
            .or_else(|| json.get("message"))
            .or_else(|| json.get("detail"))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return truncate(message);
        }
    }
    truncate(&String::from_utf8_lossy(body))
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_MESSAGE_LEN {
        return text.to_string();
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// reqwest-backed client for the NIM chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    chat_url: url::Url,
    headers: HeaderMap,
    probe_timeout: Duration,
}

impl HttpTransport {
    /// Build the client from `server` pool/timeout settings and the
    /// `upstream` section.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Config`] for an unusable base URL, proxy URL or
    /// API key, and [`ProxyError::Transport`] if the client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, ProxyError> {
        let server = &config.server;
        let pool_idle_timeout = if server.http_pool_idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(server.http_pool_idle_timeout_secs))
        };
        let client = build_reqwest_client(
            server.http_pool_max_idle_per_host.max(1),
            pool_idle_timeout,
            Duration::from_secs(server.timeout),
            server.http_use_env_proxy,
            config.upstream.proxy.as_deref(),
        )?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.upstream.api_key.is_empty() {
            let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.upstream.api_key))
                .map_err(|_| ProxyError::Config("upstream api_key contains invalid characters".into()))?;
            bearer.set_sensitive(true);
            headers.insert(AUTHORIZATION, bearer);
        }

        Ok(Self {
            client,
            chat_url: chat_completions_url(&config.upstream.base_url)?,
            headers,
            probe_timeout: Duration::from_secs(config.upstream.probe_timeout_secs),
        })
    }

    #[must_use]
    pub fn chat_url(&self) -> &url::Url {
        &self.chat_url
    }

    /// POST a serialized chat request.
    ///
    /// A non-2xx upstream answer becomes [`ProxyError::Upstream`] carrying
    /// the upstream status.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Transport`] when the request cannot be sent and
    /// [`ProxyError::Upstream`] for error statuses.
    pub async fn send_chat(&self, body: Bytes) -> Result<reqwest::Response, ProxyError> {
        self.post(body, None).await
    }

    async fn post(
        &self,
        body: Bytes,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut request = self
            .client
            .post(self.chat_url.clone())
            .headers(self.headers.clone())
            .body(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ProxyError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = if body.is_empty() {
            format!("Upstream request failed with status code {}", status.as_u16())
        } else {
            sanitize_upstream_error(&body)
        };
        Err(ProxyError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

impl CapabilityProbe for HttpTransport {
    /// Single-token completion against `model` verbatim.
    async fn probe(&self, model: &str) -> Result<(), ProxyError> {
        let body = serde_json::json!({
            "model": model,
            "messages": [{ "role": "user", "content": "test" }],
            "max_tokens": 1,
        });
        let body = serde_json::to_vec(&body)
            .map_err(|err| ProxyError::Internal(format!("probe body: {err}")))?;
        self.post(Bytes::from(body), Some(self.probe_timeout))
            .await
            .map(drop)
    }
}
