#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::RawQuery;
use axum::http::{Request, Response, StatusCode, header};
use axum::routing::get;
use axum::{Router, response::IntoResponse};
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nzbdrop::api::{AppState, create_router};
use nzbdrop::enqueue::{Enqueuer, FailurePolicy};
use nzbdrop::executor::{ExecError, ProcessExecutor, ProcessOutput};
use nzbdrop::search::SearchClient;

pub const TEST_API_KEY: &str = "test-key";

/// A stand-in for the NZBGeek API on an ephemeral local port.
pub struct FakeIndexer {
    pub url: String,
    hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
}

impl FakeIndexer {
    pub async fn spawn(status: StatusCode, body: &'static str, delay: Duration) -> FakeIndexer {
        let hits = Arc::new(AtomicUsize::new(0));
        let last_query = Arc::new(Mutex::new(None));

        let handler_hits = hits.clone();
        let handler_query = last_query.clone();
        let app = Router::new().route(
            "/api",
            get(move |RawQuery(query): RawQuery| {
                let hits = handler_hits.clone();
                let last_query = handler_query.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    *last_query.lock().unwrap() = query;
                    tokio::time::sleep(delay).await;
                    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeIndexer {
            url: format!("http://{addr}/api"),
            hits,
            last_query,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }
}

/// An address nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

pub enum Outcome {
    Output(ProcessOutput),
    SpawnFails,
    TimesOut,
}

impl Outcome {
    pub fn clean(stdout: &str) -> Outcome {
        Outcome::Output(ProcessOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }

    pub fn with_stderr(stderr: &str, exit_code: i32) -> Outcome {
        Outcome::Output(ProcessOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
        })
    }
}

/// Records every invocation and answers with a scripted outcome.
pub struct FakeExecutor {
    outcome: Outcome,
    delay: Duration,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExecutor {
    pub fn new(outcome: Outcome) -> Arc<FakeExecutor> {
        Self::with_delay(outcome, Duration::ZERO)
    }

    pub fn with_delay(outcome: Outcome, delay: Duration) -> Arc<FakeExecutor> {
        Arc::new(FakeExecutor {
            outcome,
            delay,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessExecutor for FakeExecutor {
    async fn execute(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, ExecError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.outcome {
            Outcome::Output(output) => Ok(output.clone()),
            Outcome::SpawnFails => Err(ExecError::Spawn {
                program: program.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
            Outcome::TimesOut => Err(ExecError::Timeout {
                program: program.to_path_buf(),
                timeout: Duration::from_secs(60),
            }),
        }
    }
}

pub fn search_client(api_url: &str, timeout: Duration) -> SearchClient {
    SearchClient::new(api_url, TEST_API_KEY, timeout).unwrap()
}

pub fn enqueuer(
    executor: Arc<dyn ProcessExecutor>,
    policy: FailurePolicy,
    max_concurrent: usize,
) -> Enqueuer {
    Enqueuer::new(executor, PathBuf::from("./sabcmd/sabcmd"), policy, max_concurrent)
}

pub fn app(search_client: SearchClient, enqueuer: Enqueuer) -> Router {
    create_router(AppState::new(search_client, enqueuer), None)
}

/// Router whose indexer side points at `api_url` and whose sabcmd side is a
/// fake that always succeeds.
pub fn search_app(api_url: &str, timeout: Duration) -> Router {
    let executor: Arc<dyn ProcessExecutor> = FakeExecutor::new(Outcome::clean(""));
    app(
        search_client(api_url, timeout),
        enqueuer(executor, FailurePolicy::Strict, 4),
    )
}

/// Router whose sabcmd side is `executor` and whose indexer is unreachable.
pub fn save_app(executor: Arc<dyn ProcessExecutor>, policy: FailurePolicy) -> Router {
    app(
        search_client("http://127.0.0.1:9/api", Duration::from_secs(1)),
        enqueuer(executor, policy, 4),
    )
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
