#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use hotel_desk::{HttpBackend, Identity, Role, SessionStore, db::Database};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-for-testing";

#[derive(Serialize, Deserialize)]
struct Claims {
    user: Identity,
    iat: u64,
    exp: u64,
}

/// Sign a token carrying `identity` the way the hotel backend does.
pub fn issue_token(identity: &Identity) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs();
    let claims = Claims {
        user: identity.clone(),
        iat: now,
        exp: now + 3600,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET))
        .expect("Failed to sign token")
}

fn verify_token(token: &str) -> Option<Identity> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET),
        &Validation::new(Algorithm::HS256),
    )
    .ok()
    .map(|data| data.claims.user)
}

#[derive(Clone)]
struct Account {
    password: String,
    identity: Identity,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    profile_updates: Vec<(i64, Value)>,
    register_calls: usize,
    /// Answer logins with 200 but no token
    login_without_token: bool,
    /// Answer register with 201 and profile updates with 204, both without a body
    empty_success_replies: bool,
    rooms: Vec<Value>,
    reservations: Vec<Value>,
}

/// Shared state of the mock backend, inspectable from tests.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockBackend {
    pub fn add_account(&self, password: &str, identity: Identity) {
        self.inner.lock().unwrap().accounts.push(Account {
            password: password.to_string(),
            identity,
        });
    }

    pub fn set_login_without_token(&self, value: bool) {
        self.inner.lock().unwrap().login_without_token = value;
    }

    pub fn set_empty_success_replies(&self, value: bool) {
        self.inner.lock().unwrap().empty_success_replies = value;
    }

    /// Add a room; prices are sent as decimal strings like the real API does.
    pub fn add_room(&self, id: i64, number: u32, kind: &str, nightly_rate: u64, available: bool) {
        self.inner.lock().unwrap().rooms.push(json!({
            "id": id,
            "numero_habitacion": number,
            "tipo": kind,
            "precio_noche": format!("{}.00", nightly_rate),
            "disponible": available,
        }));
    }

    pub fn account(&self, email: &str) -> Option<Identity> {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.identity.email == email)
            .map(|a| a.identity.clone())
    }

    pub fn profile_updates(&self) -> Vec<(i64, Value)> {
        self.inner.lock().unwrap().profile_updates.clone()
    }

    pub fn register_calls(&self) -> usize {
        self.inner.lock().unwrap().register_calls
    }

    /// Stored reservations, including `id_usuario`.
    pub fn reservations(&self) -> Vec<Value> {
        self.inner.lock().unwrap().reservations.clone()
    }
}

type ApiResult = Result<Response, (StatusCode, Json<Value>)>;

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message })))
}

fn caller(headers: &HeaderMap) -> Result<Identity, (StatusCode, Json<Value>)> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(verify_token)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Token inválido"))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<MockBackend>, Json(body): Json<LoginBody>) -> ApiResult {
    let inner = state.inner.lock().unwrap();
    let account = inner
        .accounts
        .iter()
        .find(|a| a.identity.email == body.email && a.password == body.password)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Credenciales inválidas"))?;

    if inner.login_without_token {
        return Ok(Json(json!({ "message": "Login exitoso" })).into_response());
    }

    Ok(Json(json!({
        "message": "Login exitoso",
        "token": issue_token(&account.identity),
    }))
    .into_response())
}

async fn register(State(state): State<MockBackend>, Json(body): Json<Value>) -> ApiResult {
    let mut inner = state.inner.lock().unwrap();
    inner.register_calls += 1;

    let email = body["email"].as_str().unwrap_or_default().to_string();
    if inner.accounts.iter().any(|a| a.identity.email == email) {
        return Err(reject(StatusCode::BAD_REQUEST, "El email ya está registrado"));
    }

    let identity = Identity {
        id: inner.accounts.len() as i64 + 1,
        name: body["nombre"].as_str().unwrap_or_default().to_string(),
        email,
        role: Role::Client,
        age: body["edad"].as_u64().map(|a| a as u32),
        document_id: body["documento_identidad"].as_str().map(str::to_string),
        phone: body["telefono"].as_str().map(str::to_string),
    };
    let password = body["password"].as_str().unwrap_or_default().to_string();
    inner.accounts.push(Account {
        password,
        identity: identity.clone(),
    });

    if inner.empty_success_replies {
        return Ok(StatusCode::CREATED.into_response());
    }
    Ok(Json(json!({ "message": "Usuario registrado", "data": { "id": identity.id } })).into_response())
}

async fn update_profile(
    State(state): State<MockBackend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    let caller = caller(&headers)?;
    if caller.id != id && caller.role != Role::Admin {
        return Err(reject(StatusCode::FORBIDDEN, "No autorizado"));
    }

    let mut inner = state.inner.lock().unwrap();
    inner.profile_updates.push((id, body));
    if inner.empty_success_replies {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(json!({ "message": "Perfil actualizado" })).into_response())
}

async fn list_rooms(State(state): State<MockBackend>) -> ApiResult {
    let inner = state.inner.lock().unwrap();
    Ok(Json(json!({ "status": "success", "data": inner.rooms })).into_response())
}

#[derive(Deserialize)]
struct ReservationBody {
    id_habitacion: i64,
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
}

async fn create_reservation(
    State(state): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<ReservationBody>,
) -> ApiResult {
    let caller = caller(&headers)?;
    let mut inner = state.inner.lock().unwrap();

    let room = inner
        .rooms
        .iter()
        .find(|r| r["id"] == body.id_habitacion)
        .cloned()
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Habitación no encontrada"))?;
    let rate: u64 = room["precio_noche"]
        .as_str()
        .and_then(|p| p.trim_end_matches(".00").parse().ok())
        .unwrap_or_default();
    let nights = (body.fecha_fin - body.fecha_inicio).num_days() as u64;

    let reservation = json!({
        "id": inner.reservations.len() as i64 + 1,
        "id_usuario": caller.id,
        "id_habitacion": body.id_habitacion,
        "fecha_inicio": body.fecha_inicio,
        "fecha_fin": body.fecha_fin,
        "estado": "confirmada",
        "total": format!("{}.00", nights * rate),
        "habitacion": room,
    });
    inner.reservations.push(reservation.clone());

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Reserva creada", "data": reservation })),
    )
        .into_response())
}

async fn reservations_for_user(
    State(state): State<MockBackend>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult {
    let caller = caller(&headers)?;
    if caller.id != user_id && caller.role == Role::Client {
        return Err(reject(StatusCode::FORBIDDEN, "No autorizado"));
    }

    let inner = state.inner.lock().unwrap();
    let own: Vec<&Value> = inner
        .reservations
        .iter()
        .filter(|r| r["id_usuario"] == user_id)
        .collect();
    Ok(Json(json!({ "status": "success", "data": own })).into_response())
}

async fn cancel_reservation(
    State(state): State<MockBackend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult {
    let caller = caller(&headers)?;
    let mut inner = state.inner.lock().unwrap();

    let reservation = inner
        .reservations
        .iter_mut()
        .find(|r| r["id"] == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Reserva no encontrada"))?;
    if reservation["id_usuario"] != caller.id && caller.role == Role::Client {
        return Err(reject(StatusCode::FORBIDDEN, "No autorizado"));
    }

    reservation["estado"] = json!("cancelada");
    Ok(Json(json!({ "message": "Reserva cancelada" })).into_response())
}

pub struct TestContext {
    pub api_url: Url,
    pub mock: MockBackend,
    server_handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

impl TestContext {
    pub fn backend(&self) -> HttpBackend {
        backend_for(self.api_url.clone())
    }

    /// A fresh store over an in-memory database.
    pub async fn store(&self) -> SessionStore<HttpBackend> {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        SessionStore::initialize(db, self.backend())
            .await
            .expect("Failed to initialize session")
    }
}

/// Start the mock backend on a random local port, mounted under `/api`.
pub async fn setup() -> TestContext {
    let mock = MockBackend::default();

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/profile/{id}", put(update_profile))
        .route("/rooms", get(list_rooms))
        .route("/reservations", post(create_reservation))
        .route(
            "/reservations/{id}",
            get(reservations_for_user).delete(cancel_reservation),
        )
        .with_state(mock.clone());
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local address");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    TestContext {
        api_url: Url::parse(&format!("http://{}/api", addr)).expect("Invalid URL"),
        mock,
        server_handle,
    }
}

/// Backend client that ignores proxy settings from the environment.
pub fn backend_for(api_url: Url) -> HttpBackend {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client");
    HttpBackend::with_client(client, api_url)
}

pub fn identity(id: i64, email: &str, role: Role) -> Identity {
    Identity {
        id,
        name: format!("Usuario {}", id),
        email: email.to_string(),
        role,
        age: Some(35),
        document_id: Some("30123456".to_string()),
        phone: Some("1145678901".to_string()),
    }
}
