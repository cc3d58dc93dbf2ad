//! Local axum server for download tests.
//!
//! Every request is recorded and answered from a scripted list of replies;
//! once the list is exhausted the last reply repeats.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

/// What the server sends back for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Complete response with a matching Content-Length
    Full { status: StatusCode, body: Vec<u8> },
    /// 200 announcing `announced` bytes, then aborting after `body`
    Truncated { announced: usize, body: Vec<u8> },
}

impl Reply {
    pub fn ok(body: Vec<u8>) -> Self {
        Reply::Full {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Reply::Full {
            status,
            body: status.to_string().into_bytes(),
        }
    }
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

struct ServerState {
    replies: Vec<Reply>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    /// URL of `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    /// Number of requests served so far
    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copy of the `index`-th recorded request
    pub fn request(&self, index: usize) -> RecordedRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

async fn respond(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let index = {
        let mut requests = state.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method,
            path: uri.path().to_string(),
            headers,
        });
        requests.len() - 1
    };

    match &state.replies[index.min(state.replies.len() - 1)] {
        Reply::Full { status, body } => (*status, body.clone()).into_response(),
        Reply::Truncated { announced, body } => {
            let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
                Ok(Bytes::from(body.clone())),
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionAborted,
                    "connection dropped mid-body",
                )),
            ];
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "image/png")
                .header(header::CONTENT_LENGTH, *announced)
                .body(Body::from_stream(futures::stream::iter(chunks)))
                .unwrap()
        }
    }
}

/// Start a server that plays `replies` in order on a random local port.
pub async fn serve_sequence(replies: Vec<Reply>) -> TestServer {
    assert!(!replies.is_empty(), "at least one reply is needed");

    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = Arc::new(ServerState {
        replies,
        requests: Arc::clone(&requests),
    });
    let app = Router::new().fallback(respond).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to test port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    TestServer { addr, requests }
}

/// Start a server answering every request with `status` and `body`.
pub async fn serve(status: StatusCode, body: Vec<u8>) -> TestServer {
    serve_sequence(vec![Reply::Full { status, body }]).await
}
