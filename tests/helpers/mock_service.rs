//! In-process stand-in for the authorization-inventory service.
//!
//! Serves the provider, data source, and push endpoints over a real TCP
//! socket so publisher tests exercise the full HTTP path. State is shared
//! behind a mutex so tests can seed providers and inspect what was pushed.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type SharedState = Arc<Mutex<MockState>>;

#[derive(Default)]
struct MockState {
    providers: Vec<Value>,
    data_sources: Vec<(String, Value)>,
    pushes: Vec<Value>,
    push_warnings: Vec<String>,
    push_error: Option<(u16, Value)>,
    next_id: u32,
}

pub struct MockService {
    pub base_url: String,
    state: SharedState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl MockService {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock service");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let state: SharedState = Arc::new(Mutex::new(MockState::default()));
        let router = Router::new()
            .route(
                "/api/v1/providers/custom",
                get(list_providers).post(create_provider),
            )
            .route(
                "/api/v1/providers/custom/:provider_id/datasources",
                get(list_data_sources).post(create_data_source),
            )
            .route(
                "/api/v1/providers/custom/:provider_id/datasources/:data_source_id/push",
                post(push),
            )
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router.into_make_service());
            let _ = serve
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Register a provider as if it had been created in an earlier run.
    pub fn seed_provider(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("p-{}", state.next_id);
        state.providers.push(json!({
            "id": id,
            "name": name,
            "custom_template": "application",
        }));
        id
    }

    /// Make subsequent pushes come back with these soft warnings.
    pub fn respond_with_warnings(&self, warnings: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.push_warnings = warnings.iter().map(|w| w.to_string()).collect();
    }

    /// Make the next push fail with a structured error body.
    pub fn fail_next_push(&self, status: u16, code: &str, message: &str, details: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.push_error = Some((
            status,
            json!({
                "code": code,
                "message": message,
                "details": details,
            }),
        ));
    }

    pub fn provider_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .providers
            .iter()
            .filter_map(|p| p["name"].as_str().map(str::to_string))
            .collect()
    }

    /// Documents received on the push endpoint, decoded from `json_data`.
    pub fn pushed_documents(&self) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .pushes
            .iter()
            .filter_map(|body| body["json_data"].as_str())
            .map(|raw| serde_json::from_str(raw).expect("push payload was not valid json"))
            .collect()
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

async fn list_providers(State(state): State<SharedState>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(json!({ "values": state.providers }))
}

async fn create_provider(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let provider = json!({
        "id": format!("p-{}", state.next_id),
        "name": body["name"],
        "custom_template": body["custom_template"],
    });
    state.providers.push(provider.clone());
    Json(json!({ "value": provider }))
}

async fn list_data_sources(
    State(state): State<SharedState>,
    Path(provider_id): Path<String>,
) -> Json<Value> {
    let state = state.lock().unwrap();
    let values: Vec<Value> = state
        .data_sources
        .iter()
        .filter(|(owner, _)| *owner == provider_id)
        .map(|(_, source)| source.clone())
        .collect();
    Json(json!({ "values": values }))
}

async fn create_data_source(
    State(state): State<SharedState>,
    Path(provider_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let source = json!({
        "id": format!("d-{}", state.next_id),
        "name": body["name"],
    });
    state.data_sources.push((provider_id, source.clone()));
    Json(json!({ "value": source }))
}

async fn push(
    State(state): State<SharedState>,
    Path((_provider_id, _data_source_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if let Some((status, error)) = state.push_error.take() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, Json(error));
    }
    state.pushes.push(body);
    (
        StatusCode::OK,
        Json(json!({ "warnings": state.push_warnings })),
    )
}
