//! `/api/gemini` proxy.
//!
//! Keeps the Gemini API key on the server. The panel posts
//! `{model, action, base64Data?, prompt?}` and gets the upstream
//! `generateContent` JSON back unchanged; `GET` lists the available models.
//! Every failure is answered as `{"error": "..."}` with a matching status.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use super::{error_message, AiError, ProxyRequest};

pub const API_PATH: &str = "/api/gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini proxy for the Penpot AI Designer panel
#[derive(Parser, Debug, Clone)]
#[command(name = "gemini-proxy")]
#[command(version, about, long_about = None)]
pub struct ProxyConfig {
    /// Address to listen on
    #[arg(short, long, env = "PROXY_LISTEN", default_value = "127.0.0.1:5174")]
    pub listen: SocketAddr,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid JSON response from API")]
    InvalidUpstreamJson,

    #[error("{0}")]
    Transport(reqwest::Error),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingApiKey | ProxyError::InvalidUpstreamJson | ProxyError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::BadRequest(_) | ProxyError::Ai(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors print the request URL, which carries the key
        ProxyError::Transport(err.without_url())
    }
}

/// Replace the API key in `text` for logging.
pub fn redact(text: &str, key: &str) -> String {
    if key.is_empty() {
        text.to_string()
    } else {
        text.replace(key, "API_KEY")
    }
}

/// Map a failed upstream response to an error with the API's own message.
fn upstream_failure(status: u16, body: &str, fallback: &str) -> ProxyError {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(_) => error_message(body).unwrap_or_else(|| fallback.to_string()),
        Err(_) => format!("API returned status {status}: {body}"),
    };
    ProxyError::Upstream { status, message }
}

fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// HTTP client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiUpstream {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiUpstream {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn key(&self) -> Result<&str, ProxyError> {
        self.api_key.as_deref().ok_or(ProxyError::MissingApiKey)
    }

    /// `GET {base}/models`.
    pub async fn list_models(&self) -> Result<Value, ProxyError> {
        let key = self.key()?;
        let url = format!("{}/models?key={key}", self.base_url);
        tracing::info!(url = %redact(&url, key), "fetching model list");

        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(upstream_failure(status, &body, "Failed to fetch models"));
        }
        serde_json::from_str(&body).map_err(|_| ProxyError::InvalidUpstreamJson)
    }

    /// Parse a proxy request body and forward it to `generateContent`.
    pub async fn generate(&self, body: &[u8]) -> Result<Value, ProxyError> {
        let key = self.key()?;
        let request: ProxyRequest =
            serde_json::from_slice(body).map_err(|e| ProxyError::BadRequest(format!("invalid request body: {e}")))?;
        let payload = request.body()?;

        let url = format!("{}/{}:generateContent?key={key}", self.base_url, request.model);
        tracing::info!(
            action = %request.action,
            model = %request.model,
            url = %redact(&url, key),
            "forwarding generation request"
        );

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        tracing::info!(status, "upstream responded");

        if !(200..300).contains(&status) {
            tracing::error!(status, body = %preview(&text, 500), "upstream error response");
            return Err(upstream_failure(status, &text, "Generation failed"));
        }
        serde_json::from_str(&text).map_err(|_| {
            tracing::error!(body = %preview(&text, 200), "failed to parse upstream response");
            ProxyError::InvalidUpstreamJson
        })
    }
}

/// Dispatch one request. Returns the status and JSON body to send.
pub async fn route(upstream: &GeminiUpstream, method: &Method, path: &str, body: &[u8]) -> (StatusCode, Value) {
    let result = if path.trim_end_matches('/') != API_PATH {
        Err(ProxyError::NotFound)
    } else if *method == Method::GET {
        upstream.list_models().await
    } else if *method == Method::POST {
        upstream.generate(body).await
    } else {
        Err(ProxyError::MethodNotAllowed)
    };

    match result {
        Ok(value) => (StatusCode::OK, value),
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                tracing::error!(%method, path, %status, error = %err, "request failed");
            } else {
                tracing::warn!(%method, path, %status, error = %err, "request rejected");
            }
            (status, err.to_json())
        }
    }
}

fn json_response(status: StatusCode, payload: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(payload.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

async fn handle(upstream: Arc<GeminiUpstream>, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let err = ProxyError::BadRequest(format!("failed to read request body: {err}"));
            return Ok(json_response(err.status(), &err.to_json()));
        }
    };

    let (status, payload) = route(&upstream, &method, &path, &body).await;
    Ok(json_response(status, &payload))
}

/// Accept connections until Ctrl-C.
pub async fn serve(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    let upstream = Arc::new(GeminiUpstream::new(&config)?);
    if upstream.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set, API requests will fail");
    }

    let listener = TcpListener::bind(config.listen).await?;
    tracing::info!(listen = %config.listen, base_url = %config.base_url, "gemini proxy listening");

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        };

        let upstream = Arc::clone(&upstream);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle(Arc::clone(&upstream), req));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!(%peer, error = %err, "connection error");
            }
        });
    }
}

/// Install the `tracing` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_subscriber() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn upstream_at(base_url: &str, api_key: Option<&str>) -> GeminiUpstream {
        let config = ProxyConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            timeout_secs: 5,
        };
        GeminiUpstream::new(&config).unwrap()
    }

    fn upstream(api_key: Option<&str>) -> GeminiUpstream {
        upstream_at("http://127.0.0.1:9", api_key)
    }

    #[derive(Debug)]
    struct Received {
        method: Method,
        uri: String,
        body: Value,
    }

    /// Local Gemini stand-in that answers every request with `status` and `reply`.
    async fn fake_gemini(status: StatusCode, reply: &'static str) -> (String, Arc<Mutex<Vec<Received>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let log = Arc::clone(&log);
                        async move {
                            let method = req.method().clone();
                            let uri = req.uri().to_string();
                            let bytes = req.into_body().collect().await?.to_bytes();
                            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                            log.lock().unwrap().push(Received { method, uri, body });

                            let mut response = Response::new(Full::new(Bytes::from(reply)));
                            *response.status_mut() = status;
                            Ok::<_, hyper::Error>(response)
                        }
                    });
                    let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await;
                });
            }
        });

        (format!("http://{addr}/v1beta/"), received)
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (status, body) = route(&upstream(Some("k")), &Method::GET, "/api/other", b"").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn test_missing_key_is_500() {
        let up = upstream(None);
        let (status, body) = route(&up, &Method::GET, API_PATH, b"").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "API key not configured"}));

        // Checked before the body is parsed
        let (status, _) = route(&up, &Method::POST, API_PATH, b"not json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        assert!(matches!(upstream(Some("")).key(), Err(ProxyError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_invalid_action_is_400() {
        let body = br#"{"model": "models/gemini-2.5-flash-image", "action": "upscale"}"#;
        let (status, payload) = route(&upstream(Some("k")), &Method::POST, API_PATH, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload, json!({"error": "Invalid action"}));
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let up = upstream(Some("k"));

        let (status, payload) = route(&up, &Method::POST, "/api/gemini/", b"{").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(payload["error"].as_str().unwrap().starts_with("invalid request body"));

        let body = br#"{"model": "m", "action": "background-removal"}"#;
        let (status, _) = route(&up, &Method::POST, API_PATH, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = route(&up, &Method::DELETE, API_PATH, b"").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_generate_forwards_to_model() {
        let reply = r#"{"candidates": [{"content": {"parts": [{"text": "Hello"}]}}]}"#;
        let (base, received) = fake_gemini(StatusCode::OK, reply).await;
        let up = upstream_at(&base, Some("secret"));

        let body = br#"{"model": "models/gemini-2.5-flash", "action": "translation", "prompt": "Hola"}"#;
        let (status, payload) = route(&up, &Method::POST, API_PATH, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, serde_json::from_str::<Value>(reply).unwrap());

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].method, Method::POST);
        assert_eq!(received[0].uri, "/v1beta/models/gemini-2.5-flash:generateContent?key=secret");
        assert_eq!(received[0].body, json!({"contents": [{"parts": [{"text": "Hola"}]}]}));
    }

    #[tokio::test]
    async fn test_background_removal_sends_inline_image() {
        let (base, received) = fake_gemini(StatusCode::OK, r#"{"candidates": []}"#).await;
        let up = upstream_at(&base, Some("secret"));

        let body = br#"{"model": "models/gemini-2.5-flash-image", "action": "background-removal", "base64Data": "iVBORw0"}"#;
        let (status, _) = route(&up, &Method::POST, API_PATH, body).await;

        assert_eq!(status, StatusCode::OK);
        let received = received.lock().unwrap();
        let parts = &received[0].body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], crate::ai::BACKGROUND_REMOVAL_INSTRUCTION);
        assert_eq!(parts[1]["inline_data"], json!({"mime_type": "image/png", "data": "iVBORw0"}));
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let (base, _) = fake_gemini(StatusCode::TOO_MANY_REQUESTS, r#"{"error": {"message": "Quota exceeded"}}"#).await;
        let up = upstream_at(&base, Some("secret"));

        let body = br#"{"model": "models/gemini-2.5-flash", "action": "translation", "prompt": "Hola"}"#;
        let (status, payload) = route(&up, &Method::POST, API_PATH, body).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(payload, json!({"error": "Quota exceeded"}));
    }

    #[tokio::test]
    async fn test_unparseable_upstream_body_is_500() {
        let (base, _) = fake_gemini(StatusCode::OK, "not json").await;
        let up = upstream_at(&base, Some("secret"));

        let body = br#"{"model": "m", "action": "translation", "prompt": "Hola"}"#;
        let (status, payload) = route(&up, &Method::POST, API_PATH, body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload, json!({"error": "Invalid JSON response from API"}));
    }

    #[tokio::test]
    async fn test_list_models_passthrough() {
        let reply = r#"{"models": [{"name": "models/gemini-2.5-flash"}]}"#;
        let (base, received) = fake_gemini(StatusCode::OK, reply).await;
        let up = upstream_at(&base, Some("secret"));

        let (status, payload) = route(&up, &Method::GET, API_PATH, b"").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["models"][0]["name"], "models/gemini-2.5-flash");
        let received = received.lock().unwrap();
        assert_eq!(received[0].method, Method::GET);
        assert_eq!(received[0].uri, "/v1beta/models?key=secret");
    }

    #[test]
    fn test_upstream_failure_messages() {
        let err = upstream_failure(429, r#"{"error": {"message": "Quota exceeded"}}"#, "Generation failed");
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_json(), json!({"error": "Quota exceeded"}));

        let err = upstream_failure(400, r#"{"error": {}}"#, "Generation failed");
        assert_eq!(err.to_string(), "Generation failed");

        let err = upstream_failure(502, "<html>Bad Gateway</html>", "Generation failed");
        assert_eq!(err.to_string(), "API returned status 502: <html>Bad Gateway</html>");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_redact_hides_key() {
        let url = "https://host/v1beta/models?key=secret123";
        assert_eq!(redact(url, "secret123"), "https://host/v1beta/models?key=API_KEY");
        assert_eq!(redact(url, ""), url);
    }

    #[test]
    fn test_config_from_args() {
        let config = ProxyConfig::parse_from(["gemini-proxy", "--listen", "0.0.0.0:8080", "--api-key", "abc"]);
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.timeout_secs, 120);
    }
}
