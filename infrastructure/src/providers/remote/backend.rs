//! Remote backend adapter

use super::types::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use bridge_application::{BackendFault, InferenceBackend};
use bridge_domain::{BackendKind, BackendReply, BackendRequest, truncate};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of an unparseable error body quoted in a failure line.
const MAX_ERROR_BODY: usize = 120;

/// Connection settings for [`RemoteChatBackend`].
#[derive(Debug, Clone)]
pub struct RemoteBackendSettings {
    /// Base URL, e.g. `https://api.groq.com/openai/v1`
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

/// Chat-completion client for OpenAI-compatible services.
///
/// The client is built once and shared by every session. Every error is
/// reported as [`BackendReply::Failure`]; this backend never faults.
pub struct RemoteChatBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl RemoteChatBackend {
    pub fn new(settings: RemoteBackendSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("kernel-bridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
            model: settings.model,
            api_key: settings.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, request: &BackendRequest) -> Result<String, String> {
        let body = ChatCompletionRequest::new(&self.model, request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(describe_transport_error)?;

        if !status.is_success() {
            return Err(describe_status(status, &text));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| format!("malformed response: {}", e))?;

        parsed
            .into_text()
            .ok_or_else(|| "malformed response: no message content".to_string())
    }
}

#[async_trait]
impl InferenceBackend for RemoteChatBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn describe(&self) -> String {
        format!("{} via {}", self.model, self.endpoint)
    }

    async fn complete(&self, request: &BackendRequest) -> Result<BackendReply, BackendFault> {
        match self.call(request).await {
            Ok(text) => {
                debug!(model = %self.model, chars = text.len(), "Remote reply received");
                Ok(BackendReply::Text(text))
            }
            Err(cause) => {
                warn!(model = %self.model, "Remote request failed: {}", cause);
                Ok(BackendReply::Failure(cause))
            }
        }
    }
}

fn describe_transport_error(error: reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        format!("network error: {}", error)
    }
}

fn describe_status(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| truncate(body.trim(), MAX_ERROR_BODY));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if detail.is_empty() => {
            format!("authentication failed (HTTP {})", status.as_u16())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("authentication failed (HTTP {}): {}", status.as_u16(), detail)
        }
        _ if detail.is_empty() => format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        ),
        _ => format!("HTTP {}: {}", status.as_u16(), detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_domain::{Request, SamplingConfig};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn settings(base_url: String) -> RemoteBackendSettings {
        RemoteBackendSettings {
            base_url,
            model: "test-model".to_string(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn request(query: &str) -> BackendRequest {
        BackendRequest::new(
            "Be brief.",
            &Request::from_raw(query).unwrap(),
            SamplingConfig::default(),
        )
    }

    async fn read_http_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data).into_owned();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Serve one canned HTTP response; the handle yields the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let raw = read_http_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            raw
        });
        (format!("http://{}/v1", addr), handle)
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let backend =
            RemoteChatBackend::new(settings("https://api.groq.com/openai/v1/".to_string()))
                .unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(backend.kind(), BackendKind::Remote);
        assert!(backend.describe().contains("test-model"));
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"Four."}}]}"#,
        )
        .await;
        let backend = RemoteChatBackend::new(settings(base_url)).unwrap();

        let reply = backend.complete(&request("what is 2+2")).await.unwrap();
        assert_eq!(reply, BackendReply::Text("Four.".to_string()));

        let raw = server.await.unwrap();
        let lower = raw.to_lowercase();
        assert!(raw.starts_with("POST /v1/chat/completions"));
        assert!(lower.contains("authorization: bearer test-key"));
        assert!(raw.contains(r#""model":"test-model""#));
        assert!(raw.contains(r#""max_tokens":50"#));
        assert!(raw.contains("what is 2+2"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_failure() {
        let (base_url, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#,
        )
        .await;
        let backend = RemoteChatBackend::new(settings(base_url)).unwrap();

        let reply = backend.complete(&request("hello")).await.unwrap();
        assert_eq!(
            reply,
            BackendReply::failure("authentication failed (HTTP 401): Invalid API Key")
        );
    }

    #[tokio::test]
    async fn test_forbidden_without_message() {
        let (base_url, _server) =
            serve_once("403 Forbidden", r#"{"error":{"message":""}}"#).await;
        let backend = RemoteChatBackend::new(settings(base_url)).unwrap();

        let reply = backend.complete(&request("hello")).await.unwrap();
        assert_eq!(reply, BackendReply::failure("authentication failed (HTTP 403)"));
    }

    #[test]
    fn test_describe_status_unauthorized_empty_body() {
        assert_eq!(
            describe_status(StatusCode::UNAUTHORIZED, "   "),
            "authentication failed (HTTP 401)"
        );
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let (base_url, _server) = serve_once("503 Service Unavailable", "").await;
        let backend = RemoteChatBackend::new(settings(base_url)).unwrap();

        let reply = backend.complete(&request("hello")).await.unwrap();
        assert_eq!(reply, BackendReply::failure("HTTP 503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_failure() {
        let (base_url, _server) = serve_once("200 OK", "not json!").await;
        let backend = RemoteChatBackend::new(settings(base_url)).unwrap();

        let reply = backend.complete(&request("hello")).await.unwrap();
        match reply {
            BackendReply::Failure(cause) => assert!(cause.starts_with("malformed response")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_failure() {
        let (base_url, _server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let backend = RemoteChatBackend::new(settings(base_url)).unwrap();

        let reply = backend.complete(&request("hello")).await.unwrap();
        assert_eq!(
            reply,
            BackendReply::failure("malformed response: no message content")
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let backend =
            RemoteChatBackend::new(settings(format!("http://127.0.0.1:{}/v1", port))).unwrap();

        let reply = backend.complete(&request("hello")).await.unwrap();
        match reply {
            BackendReply::Failure(cause) => assert!(cause.starts_with("connection failed")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let mut slow = settings(format!("http://{}/v1", addr));
        slow.timeout = Duration::from_millis(200);
        let backend = RemoteChatBackend::new(slow).unwrap();

        let reply = backend.complete(&request("hello")).await.unwrap();
        assert_eq!(reply, BackendReply::failure("request timed out"));
    }
}
