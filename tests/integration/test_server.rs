use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Body of `GET /`, shaped like the real service's home endpoint
pub const HEALTH_BODY: &str = r#"{"ok":true,"service":"Website Audit Tool Backend","docs":"/docs","try_audit":"POST /audit { 'url': 'https://example.com' }"}"#;

/// One canned answer for `POST /audit`
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub status: u16,
    pub body: String,
}

impl ScriptedResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ScriptedResponse {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: &serde_json::Value) -> Self {
        Self::new(200, body.to_string())
    }
}

/// A request as seen by the server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

struct State {
    script: VecDeque<ScriptedResponse>,
    fallback: ScriptedResponse,
    requests: Vec<RecordedRequest>,
}

/// Test HTTP server standing in for the audit service.
///
/// `POST /audit` answers from the script in order, then with the fallback.
pub struct TestServer {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl TestServer {
    pub async fn new() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(Mutex::new(State {
            script: VecDeque::new(),
            fallback: ScriptedResponse::new(503, "Service Unavailable"),
            requests: Vec::new(),
        }));
        let state_clone = state.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };

                let io = TokioIo::new(stream);
                let state = state_clone.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = state.clone();
                        async move { handle_request(req, state).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        Ok(TestServer { addr, state })
    }

    /// Starts a server that plays `responses` in order
    pub async fn with_script(responses: Vec<ScriptedResponse>) -> anyhow::Result<Self> {
        let server = Self::new().await?;
        for response in responses {
            server.push(response).await;
        }
        Ok(server)
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn push(&self, response: ScriptedResponse) {
        self.state.lock().await.script.push_back(response);
    }

    /// Answer used once the script is exhausted
    pub async fn set_fallback(&self, response: ScriptedResponse) {
        self.state.lock().await.fallback = response;
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn audit_calls(&self) -> usize {
        self.requests()
            .await
            .iter()
            .filter(|r| r.method == Method::POST && r.path == "/audit")
            .count()
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<Mutex<State>>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = req.into_body().collect().await?.to_bytes();

    let mut state = state.lock().await;
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        content_type,
        body: body.to_vec(),
        received_at: Instant::now(),
    });

    let answer = match (method, path.as_str()) {
        (Method::POST, "/audit") => match state.script.pop_front() {
            Some(scripted) => scripted,
            None => state.fallback.clone(),
        },
        (Method::GET, "/") => ScriptedResponse::new(200, HEALTH_BODY),
        _ => ScriptedResponse::new(404, "Not Found"),
    };

    let status = StatusCode::from_u16(answer.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(answer.body)))
        .unwrap())
}
