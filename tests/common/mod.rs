#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lead_tracker_api::app::{app, AppState, Stores};
use lead_tracker_api::config::AppConfig;
use lead_tracker_api::database::MemoryStore;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: MemoryStore,
}

impl TestServer {
    /// Serve the router over a fresh in-memory store on its own thread and
    /// runtime, so it outlives the runtime of any single test.
    pub fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = MemoryStore::new();
        let config = AppConfig::from_lookup(|key| match key {
            "API_ENABLE_REQUEST_LOGGING" | "API_ENABLE_RATE_LIMITING" => Some("false".to_string()),
            _ => None,
        });
        let router = app(AppState::new(&Stores::from_memory(store.clone()), config));

        let listener = std::net::TcpListener::bind(("127.0.0.1", port)).context("failed to bind test port")?;
        listener.set_nonblocking(true)?;

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("failed to build server runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("failed to adopt listener");
                axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
                    .await
                    .expect("server");
            });
        });

        Ok(Self { port, base_url, store })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// The server shared by every test in a test binary
pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Unique per call, so tests sharing a server never collide on emails
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4().simple())
}

/// HTTP client bound to one server and, optionally, one account's token
pub struct ApiClient {
    pub client: reqwest::Client,
    pub base_url: String,
    pub token: Option<String>,
    pub email: String,
}

impl ApiClient {
    pub fn anonymous(server: &TestServer) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: server.base_url.clone(),
            token: None,
            email: String::new(),
        }
    }

    /// Register a fresh account and keep its bearer token
    pub async fn register(server: &TestServer) -> Result<Self> {
        let mut api = Self::anonymous(server);
        let email = unique_email("user");
        let res = api
            .post("/api/auth/register")
            .json(&json!({
                "email": email,
                "password": "test123",
                "firstName": "Test",
                "lastName": "User"
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = res.json().await?;
        api.token = body["token"].as_str().map(str::to_string);
        api.email = email;
        Ok(api)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.put(self.url(path)))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.delete(self.url(path)))
    }

    /// POST a lead and return the stored record
    pub async fn create_lead(&self, body: Value) -> Result<Value> {
        let res = self.post("/api/leads").json(&body).send().await?;
        let status = res.status();
        let payload: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create lead failed: {} {}", status, payload);
        Ok(payload)
    }

    /// GET /api/leads with raw query pairs
    pub async fn list_leads(&self, query: &[(&str, &str)]) -> Result<Value> {
        let res = self.get("/api/leads").query(query).send().await?;
        let status = res.status();
        let payload: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::OK, "list leads failed: {} {}", status, payload);
        Ok(payload)
    }
}

/// Minimal valid lead body
pub fn lead(email: &str) -> Value {
    json!({
        "firstName": "Test",
        "lastName": "Lead",
        "email": email,
        "source": "website"
    })
}
