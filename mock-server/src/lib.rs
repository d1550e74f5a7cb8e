use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::Arc,
    thread,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpListener,
    sync::{oneshot, RwLock},
};
use uuid::Uuid;

pub const DEFAULT_EMAIL: &str = "admin@noraina.net";
pub const DEFAULT_PASSWORD: &str = "noraina";
pub const TOKEN_HEADER: &str = "x-access-token";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceRequest {
    pub name: String,
    #[serde(default)]
    pub services: Vec<InstanceService>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceService {
    pub name: String,
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub services: Vec<InstanceService>,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Certificate {
    pub name: String,
    pub certificate: String,
    pub private_key: String,
}

#[derive(Deserialize)]
pub struct CertificateQuery {
    pub name: String,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, String>,
    tokens: HashSet<String>,
    instances: HashMap<String, Instance>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error answer: a status plus a JSON object of strings.
type Rejection = (StatusCode, Json<HashMap<String, String>>);

fn ko(status: StatusCode, message: &str) -> Rejection {
    let body = HashMap::from([
        ("status".to_string(), "ko".to_string()),
        ("message".to_string(), message.to_string()),
    ]);
    (status, Json(body))
}

/// Stub with the single default account.
pub fn app() -> Router {
    app_with([(DEFAULT_EMAIL, DEFAULT_PASSWORD)])
}

/// Stub accepting the given `(email, password)` pairs.
pub fn app_with<I, E, P>(accounts: I) -> Router
where
    I: IntoIterator<Item = (E, P)>,
    E: Into<String>,
    P: Into<String>,
{
    let store = Store {
        accounts: accounts
            .into_iter()
            .map(|(e, p)| (e.into(), p.into()))
            .collect(),
        ..Default::default()
    };
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/login", post(login))
        .route("/api/instance", post(create_instance))
        .route("/api/instance/{name}", delete(delete_instance))
        .route("/api/certificate", get(get_certificate))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(store: &Store, headers: &HeaderMap) -> Result<(), Rejection> {
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if store.tokens.contains(token) {
        Ok(())
    } else {
        Err(ko(StatusCode::UNAUTHORIZED, "invalid token"))
    }
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Rejection> {
    let mut store = db.write().await;
    if store.accounts.get(&input.email) != Some(&input.password) {
        tracing::warn!(email = %input.email, "rejected login");
        return Err(ko(StatusCode::UNAUTHORIZED, "invalid credentials"));
    }
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone());
    tracing::info!(email = %input.email, "issued token");
    Ok(Json(LoginResponse { token }))
}

async fn create_instance(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<InstanceRequest>,
) -> Result<(StatusCode, Json<Instance>), Rejection> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    if input.name.is_empty() {
        return Err(ko(StatusCode::BAD_REQUEST, "name is required"));
    }
    if store.instances.contains_key(&input.name) {
        return Err(ko(StatusCode::CONFLICT, "instance already exists"));
    }
    let instance = Instance {
        name: input.name,
        services: input.services,
        status: "running".to_string(),
    };
    store.instances.insert(instance.name.clone(), instance.clone());
    tracing::info!(name = %instance.name, "created instance");
    Ok((StatusCode::CREATED, Json(instance)))
}

async fn delete_instance(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<StatusCode, Rejection> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store
        .instances
        .remove(&name)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ko(StatusCode::NOT_FOUND, "instance not found"))
}

async fn get_certificate(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<CertificateQuery>,
) -> Result<Json<Certificate>, Rejection> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    if !store.instances.contains_key(&query.name) {
        return Err(ko(StatusCode::NOT_FOUND, "certificate not found"));
    }
    Ok(Json(Certificate {
        certificate: pem("CERTIFICATE", &query.name),
        private_key: pem("PRIVATE KEY", &query.name),
        name: query.name,
    }))
}

fn pem(label: &str, name: &str) -> String {
    format!("-----BEGIN {label}-----\n{name}\n-----END {label}-----\n")
}

/// A router served on an ephemeral local port for the lifetime of the value.
///
/// The server runs on its own thread with a current-thread runtime and is
/// told to shut down when the value is dropped.
pub struct StubServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubServer {
    pub fn start(router: Router) -> std::io::Result<Self> {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = std_listener.local_addr()?;
        std_listener.set_nonblocking(true)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, rx) = oneshot::channel::<()>();

        thread::spawn(move || {
            runtime.block_on(async move {
                let listener = match TcpListener::from_std(std_listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        tracing::error!(error = %e, "stub listener setup failed");
                        return;
                    }
                };
                let shutdown = async {
                    let _ = rx.await;
                };
                if let Err(e) = axum::serve(listener, router)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    tracing::error!(error = %e, "stub server failed");
                }
            });
        });

        Ok(Self {
            addr,
            shutdown: Some(tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the server, with a trailing slash.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
