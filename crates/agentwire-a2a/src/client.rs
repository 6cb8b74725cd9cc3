//! A2A client: talks to a single peer agent

use reqwest::{Client, Response, StatusCode};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{A2aError, Result};
use crate::protocol::{AgentMetadata, METADATA_PATH, RUN_PATH, RunRequest};

/// Client bound to one remote agent.
///
/// The agent's capability document is fetched on first use and kept for the
/// lifetime of the client. Failed fetches are not cached.
#[derive(Debug)]
pub struct AgentClient {
    base_url: String,
    http: Client,
    metadata: RwLock<Option<Arc<AgentMetadata>>>,
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, Client::new())
    }

    /// Build a client that shares an existing HTTP connection pool
    pub fn with_http(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            metadata: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Metadata already in the cache, without touching the network
    pub async fn cached_metadata(&self) -> Option<Arc<AgentMetadata>> {
        self.metadata.read().await.clone()
    }

    /// Fetch the agent's capability document, or return the cached copy
    pub async fn get_metadata(&self) -> Result<Arc<AgentMetadata>> {
        if let Some(meta) = self.cached_metadata().await {
            return Ok(meta);
        }

        let url = self.url_for(METADATA_PATH);
        debug!("Fetching agent metadata from {}", url);

        let resp = self.http.get(&url).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(A2aError::MetadataFetch {
                status: resp.status(),
            });
        }

        let meta: AgentMetadata = serde_json::from_slice(&resp.bytes().await?)?;
        let meta = Arc::new(meta);
        info!(
            "Fetched agent metadata: {} ({} endpoints)",
            meta.name().unwrap_or("unknown"),
            meta.endpoints().map_or(0, |e| e.len())
        );

        // Concurrent first fetches may race here; last successful write wins
        *self.metadata.write().await = Some(Arc::clone(&meta));
        Ok(meta)
    }

    /// Send a message to the agent's `/run` endpoint.
    ///
    /// The response body is returned as-is.
    pub async fn run(
        &self,
        message: &str,
        context: Map<String, Value>,
        session_id: Option<&str>,
    ) -> Result<Value> {
        if message.is_empty() {
            return Err(A2aError::InvalidArgument("message must not be empty".into()));
        }

        let url = self.url_for(RUN_PATH);
        debug!(
            "Running agent at {} (session: {})",
            url,
            session_id.unwrap_or("none")
        );

        let request = RunRequest {
            message: message.to_string(),
            context,
            session_id: session_id.map(str::to_string),
        };

        let resp = self.http.post(&url).json(&request).send().await?;
        let reply = read_reply(resp).await?;

        info!("Agent at {} answered /run", self.base_url);
        Ok(reply)
    }

    /// Call a custom endpoint advertised in the agent's metadata.
    ///
    /// Endpoints missing from the advertised list are rejected before any
    /// request is sent.
    pub async fn call_endpoint(&self, endpoint: &str, data: &Value) -> Result<Value> {
        let endpoint = endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            return Err(A2aError::InvalidArgument("endpoint must not be empty".into()));
        }

        let meta = self.get_metadata().await?;
        if !meta.advertises(endpoint) {
            return Err(A2aError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
                agent: meta.name().unwrap_or("unknown").to_string(),
            });
        }

        let url = self.url_for(endpoint);
        debug!("Calling custom endpoint {}", url);

        let resp = self.http.post(&url).json(data).send().await?;
        let reply = read_reply(resp).await?;

        info!("Agent at {} answered /{}", self.base_url, endpoint);
        Ok(reply)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Parse a 200 response as JSON; anything else becomes `AgentRequest`
async fn read_reply(resp: Response) -> Result<Value> {
    let status = resp.status();
    if status != StatusCode::OK {
        let body = resp
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        return Err(A2aError::AgentRequest { status, body });
    }
    Ok(serde_json::from_slice(&resp.bytes().await?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, Uri, header};
    use axum::response::{IntoResponse, Response as AxumResponse};
    use axum::routing::{get, post};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process stand-in for a remote agent
    #[derive(Clone)]
    struct MockAgent {
        card: Value,
        metadata_failures: usize,
        run_status: StatusCode,
        run_reply: Value,
        metadata_hits: Arc<AtomicUsize>,
        run_hits: Arc<AtomicUsize>,
        custom_hits: Arc<AtomicUsize>,
        last_run: Arc<Mutex<Option<(Option<String>, Value)>>>,
        last_custom: Arc<Mutex<Option<(String, Value)>>>,
    }

    impl MockAgent {
        fn new(card: Value) -> Self {
            Self {
                card,
                metadata_failures: 0,
                run_status: StatusCode::OK,
                run_reply: json!({"message": "ok"}),
                metadata_hits: Arc::new(AtomicUsize::new(0)),
                run_hits: Arc::new(AtomicUsize::new(0)),
                custom_hits: Arc::new(AtomicUsize::new(0)),
                last_run: Arc::new(Mutex::new(None)),
                last_custom: Arc::new(Mutex::new(None)),
            }
        }

        async fn spawn(&self) -> String {
            let router = Router::new()
                .route("/.well-known/agent.json", get(metadata_handler))
                .route("/run", post(run_handler))
                .route("/foo", post(custom_handler))
                .route("/bar", post(custom_handler))
                .route("/garbled", post(garbled_handler))
                .route("/boom", post(boom_handler))
                .route("/created", post(created_handler))
                .with_state(self.clone());

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, router).await.unwrap();
            });
            format!("http://{}", addr)
        }
    }

    async fn metadata_handler(State(agent): State<MockAgent>) -> AxumResponse {
        let hit = agent.metadata_hits.fetch_add(1, Ordering::SeqCst);
        if hit < agent.metadata_failures {
            return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
        }
        axum::Json(agent.card.clone()).into_response()
    }

    async fn run_handler(
        State(agent): State<MockAgent>,
        headers: HeaderMap,
        axum::Json(body): axum::Json<Value>,
    ) -> AxumResponse {
        agent.run_hits.fetch_add(1, Ordering::SeqCst);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *agent.last_run.lock().unwrap() = Some((content_type, body));

        if agent.run_status != StatusCode::OK {
            return (agent.run_status, "agent exploded").into_response();
        }
        axum::Json(agent.run_reply.clone()).into_response()
    }

    async fn custom_handler(
        State(agent): State<MockAgent>,
        uri: Uri,
        axum::Json(body): axum::Json<Value>,
    ) -> AxumResponse {
        agent.custom_hits.fetch_add(1, Ordering::SeqCst);
        *agent.last_custom.lock().unwrap() = Some((uri.path().to_string(), body.clone()));
        axum::Json(json!({"echo": body})).into_response()
    }

    async fn garbled_handler() -> &'static str {
        "this is not json"
    }

    async fn boom_handler() -> AxumResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, "bad").into_response()
    }

    async fn created_handler() -> AxumResponse {
        (StatusCode::CREATED, axum::Json(json!({"ok": true}))).into_response()
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = AgentClient::new("http://localhost:8003/");
        assert_eq!(client.base_url(), "http://localhost:8003");
        assert_eq!(client.url_for("run"), "http://localhost:8003/run");

        let client = AgentClient::new("http://localhost:8003//");
        assert_eq!(client.base_url(), "http://localhost:8003");
    }

    #[tokio::test]
    async fn test_metadata_is_memoized() {
        let agent = MockAgent::new(json!({"name": "speaker"}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        assert!(client.cached_metadata().await.is_none());
        let first = client.get_metadata().await.unwrap();
        let second = client.get_metadata().await.unwrap();

        assert_eq!(agent.metadata_hits.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), Some("speaker"));
    }

    #[tokio::test]
    async fn test_metadata_failure_not_cached() {
        let mut agent = MockAgent::new(json!({"name": "speaker"}));
        agent.metadata_failures = 1;
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let err = client.get_metadata().await.unwrap_err();
        assert!(matches!(
            err,
            A2aError::MetadataFetch { status } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        assert!(client.cached_metadata().await.is_none());

        let meta = client.get_metadata().await.unwrap();
        assert_eq!(meta.name(), Some("speaker"));
        assert_eq!(agent.metadata_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_call_endpoint_rejects_unadvertised() {
        let agent = MockAgent::new(json!({"name": "nifi", "endpoints": ["foo"]}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let err = client.call_endpoint("bar", &json!({})).await.unwrap_err();
        match err {
            A2aError::UnknownEndpoint { endpoint, agent: name } => {
                assert_eq!(endpoint, "bar");
                assert_eq!(name, "nifi");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(agent.custom_hits.load(Ordering::SeqCst), 0);

        let reply = client.call_endpoint("foo", &json!({"x": 1})).await.unwrap();
        assert_eq!(reply, json!({"echo": {"x": 1}}));
        assert_eq!(agent.custom_hits.load(Ordering::SeqCst), 1);
        let (path, body) = agent.last_custom.lock().unwrap().clone().unwrap();
        assert_eq!(path, "/foo");
        assert_eq!(body, json!({"x": 1}));

        // Gating check reused the cached document
        assert_eq!(agent.metadata_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_call_endpoint_without_list_is_ungated() {
        let agent = MockAgent::new(json!({"name": "speaker"}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        client.call_endpoint("/bar", &json!({})).await.unwrap();
        let (path, _) = agent.last_custom.lock().unwrap().clone().unwrap();
        assert_eq!(path, "/bar");
    }

    #[tokio::test]
    async fn test_call_endpoint_metadata_failure_blocks_call() {
        let mut agent = MockAgent::new(json!({"name": "speaker"}));
        agent.metadata_failures = usize::MAX;
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let err = client.call_endpoint("foo", &json!({})).await.unwrap_err();
        assert!(matches!(err, A2aError::MetadataFetch { .. }));
        assert_eq!(agent.custom_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_pass_through() {
        let mut agent = MockAgent::new(json!({"name": "speaker"}));
        agent.run_reply = json!({"message": "ok", "data": {"audio_url": "file:///tmp/a.mp3"}});
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let mut context = Map::new();
        context.insert("k".to_string(), json!("v"));
        let reply = client.run("hi", context, Some("sess-1")).await.unwrap();

        assert_eq!(
            reply,
            json!({"message": "ok", "data": {"audio_url": "file:///tmp/a.mp3"}})
        );
        let (content_type, body) = agent.last_run.lock().unwrap().clone().unwrap();
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(
            body,
            json!({"message": "hi", "context": {"k": "v"}, "session_id": "sess-1"})
        );
        // /run never consults metadata
        assert_eq!(agent.metadata_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_without_session_sends_null() {
        let agent = MockAgent::new(json!({"name": "speaker"}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        client.run("hello", Map::new(), None).await.unwrap();
        let (_, body) = agent.last_run.lock().unwrap().clone().unwrap();
        assert_eq!(body, json!({"message": "hello", "context": {}, "session_id": null}));
    }

    #[tokio::test]
    async fn test_run_surfaces_http_error() {
        let mut agent = MockAgent::new(json!({"name": "speaker"}));
        agent.run_status = StatusCode::INTERNAL_SERVER_ERROR;
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let err = client.run("hi", Map::new(), None).await.unwrap_err();
        match err {
            A2aError::AgentRequest { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "agent exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(agent.run_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_rejects_empty_message() {
        let client = AgentClient::new("http://127.0.0.1:1");
        let err = client.run("", Map::new(), None).await.unwrap_err();
        assert!(matches!(err, A2aError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_call_endpoint_surfaces_http_error() {
        let agent = MockAgent::new(json!({"name": "nifi", "endpoints": ["boom"]}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let err = client.call_endpoint("boom", &json!({})).await.unwrap_err();
        match err {
            A2aError::AgentRequest { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_call_endpoint_non_200_success_is_failure() {
        let agent = MockAgent::new(json!({"name": "nifi"}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let err = client.call_endpoint("created", &json!({})).await.unwrap_err();
        match err {
            A2aError::AgentRequest { status, body } => {
                assert_eq!(status, StatusCode::CREATED);
                assert_eq!(body, r#"{"ok":true}"#);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_call_endpoint_collapses_leading_slashes() {
        let agent = MockAgent::new(json!({"name": "nifi", "endpoints": ["bar"]}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        client.call_endpoint("//bar", &json!({})).await.unwrap();
        let (path, _) = agent.last_custom.lock().unwrap().clone().unwrap();
        assert_eq!(path, "/bar");

        let err = client.call_endpoint("///", &json!({})).await.unwrap_err();
        assert!(matches!(err, A2aError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_unreadable_error_body_keeps_diagnostic() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promises 100 bytes of body, sends 5, then hangs up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nshort")
                    .await;
                let _ = stream.shutdown().await;
            }
        });

        let client = AgentClient::new(format!("http://{}", addr));
        let err = client.run("hi", Map::new(), None).await.unwrap_err();
        match err {
            A2aError::AgentRequest { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(body.starts_with("<unreadable body:"), "body was {body:?}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let agent = MockAgent::new(json!({"name": "speaker"}));
        let url = agent.spawn().await;
        let client = AgentClient::new(url);

        let err = client.call_endpoint("garbled", &json!({})).await.unwrap_err();
        assert!(matches!(err, A2aError::Decode(_)));
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = AgentClient::new("http://127.0.0.1:1/");
        let err = client.get_metadata().await.unwrap_err();
        assert!(matches!(err, A2aError::Transport(_)));

        let err = client.run("hi", Map::new(), None).await.unwrap_err();
        assert!(matches!(err, A2aError::Transport(_)));
    }
}
