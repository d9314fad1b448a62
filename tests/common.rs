#![allow(dead_code)]
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use sheet_relay::adapters::feed::{FeedFetcher, FeedStream, FetchError};
use sheet_relay::adapters::transport::{Transport, TransportError};
use sheet_relay::api::{MgmtState, app_router, mgmt_router};
use sheet_relay::config::{
    Config, DispatchConfig, FeedConfig, LogFormat, ServerConfig, TelemetryConfig, TransportConfig,
};
use sheet_relay::domain::batch::DispatchMode;
use sheet_relay::domain::session::SessionStatus;
use sheet_relay::services::session::SessionState;
use sheet_relay::AppBuilder;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("sheet_relay=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
        },
        dispatch: DispatchConfig {
            mode: DispatchMode::CrossProduct,
            country_code: "55".to_string(),
            chat_id_suffix: "@c.us".to_string(),
            intra_recipient_delay_ms: 0,
            inter_recipient_delay_ms: 0,
        },
        feed: FeedConfig { export_base_url: "http://127.0.0.1:1".to_string(), fetch_timeout_secs: 5, read_timeout_secs: 5 },
        transport: TransportConfig {
            bridge_url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 5,
            poll_interval_secs: 1,
        },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

/// In-memory transport that records every send and fails on the configured call numbers (1-based).
#[derive(Debug, Default)]
pub struct RecordingTransport {
    fail_on: Mutex<HashSet<usize>>,
    sent: Mutex<Vec<(String, String)>>,
    in_flight: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl RecordingTransport {
    pub fn fail_on(&self, call_numbers: &[usize]) {
        self.fail_on.lock().unwrap().extend(call_numbers.iter().copied());
    }

    /// Makes every send wait for a permit from the returned semaphore.
    pub fn hold_sends(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn send_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, chat_id: &str, body: &str) -> Result<(), TransportError> {
        assert!(!self.in_flight.swap(true, Ordering::SeqCst), "transport invoked while a previous send was pending");

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        tokio::task::yield_now().await;

        let call_no = {
            let mut sent = self.sent.lock().unwrap();
            sent.push((chat_id.to_string(), body.to_string()));
            sent.len()
        };
        self.in_flight.store(false, Ordering::SeqCst);

        if self.fail_on.lock().unwrap().contains(&call_no) {
            return Err(TransportError::Rejected("simulated failure".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum FeedScript {
    Csv(String),
    NotPublic,
    /// Serves the given text, then fails the stream.
    BrokenAfter(String),
}

/// Serves scripted feeds keyed by document id.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    feeds: Mutex<HashMap<String, FeedScript>>,
    fetches: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn insert(&self, document_id: &str, script: FeedScript) {
        self.feeds.lock().unwrap().insert(document_id.to_string(), script);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch_csv(&self, document_id: &str) -> Result<FeedStream, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let script = self.feeds.lock().unwrap().get(document_id).cloned();
        match script {
            Some(FeedScript::Csv(text)) => Ok(futures::stream::iter(vec![Ok(Bytes::from(text))]).boxed()),
            Some(FeedScript::BrokenAfter(text)) => Ok(futures::stream::iter(vec![
                Ok(Bytes::from(text)),
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer")),
            ])
            .boxed()),
            Some(FeedScript::NotPublic) | None => Err(FetchError::NotPublic(401)),
        }
    }
}

pub fn sheet_url(document_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{document_id}/edit#gid=0")
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    pub session: SessionState,
    pub transport: Arc<RecordingTransport>,
    pub fetcher: Arc<ScriptedFetcher>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let session = SessionState::with_status(SessionStatus::Ready);
        let transport = Arc::new(RecordingTransport::default());
        let fetcher = Arc::new(ScriptedFetcher::default());

        let app = AppBuilder::new(config.clone())
            .with_session(session.clone())
            .with_transport(transport.clone())
            .with_feed_fetcher(fetcher.clone())
            .build()
            .unwrap();

        let api_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", api_listener.local_addr().unwrap());
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());

        let router = app_router(config.clone(), app.services);
        let mgmt = mgmt_router(MgmtState { session: app.session });
        tokio::spawn(async move { axum::serve(api_listener, router).await.unwrap() });
        tokio::spawn(async move { axum::serve(mgmt_listener, mgmt).await.unwrap() });

        Self { server_url, mgmt_url, client: reqwest::Client::new(), config, session, transport, fetcher }
    }

    pub async fn send_batch(&self, feed_url: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/batch/send", self.server_url))
            .json(&serde_json::json!({ "feedUrl": feed_url }))
            .send()
            .await
            .unwrap()
    }

    pub async fn send_text(&self, recipient: &str, body: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/messages/send", self.server_url))
            .json(&serde_json::json!({ "recipient": recipient, "body": body }))
            .send()
            .await
            .unwrap()
    }
}
