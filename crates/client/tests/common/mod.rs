//! In-process fake of the backend's layout endpoints.
//!
//! Serves `/api/v1/user/layouts` and `/api/v1/admin/layout-presets` from an
//! in-memory table with the same envelope, status codes and auth checks as
//! the real handlers, bound to an ephemeral localhost port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use x121_layout_client::{HttpLayoutService, LayoutRecord};

pub const USER_TOKEN: &str = "user-token";
pub const ADMIN_TOKEN: &str = "admin-token";

#[derive(Default)]
pub struct FakeDb {
    pub layouts: Vec<Value>,
    pub presets: Vec<Value>,
    pub next_id: i64,
}

pub type SharedDb = Arc<Mutex<FakeDb>>;

pub struct FakeServer {
    pub addr: SocketAddr,
    pub db: SharedDb,
}

impl FakeServer {
    pub async fn start() -> Self {
        let db: SharedDb = Arc::new(Mutex::new(FakeDb {
            next_id: 1,
            ..Default::default()
        }));

        let app = Router::new()
            .route(
                "/api/v1/user/layouts",
                get(list_user_layouts).post(create_user_layout),
            )
            .route(
                "/api/v1/user/layouts/{id}",
                get(get_user_layout)
                    .put(update_user_layout)
                    .delete(delete_user_layout),
            )
            .route(
                "/api/v1/admin/layout-presets",
                get(list_admin_presets).post(create_admin_preset),
            )
            .route(
                "/api/v1/admin/layout-presets/{id}",
                put(update_admin_preset).delete(delete_admin_preset),
            )
            .with_state(Arc::clone(&db));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, db }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub fn client(&self, token: Option<&str>) -> HttpLayoutService {
        HttpLayoutService::with_client(
            reqwest::Client::new(),
            self.api_url(),
            token.map(str::to_string),
        )
    }

    pub fn insert_layout(&self, name: &str, layout_json: Value, is_default: bool) -> LayoutRecord {
        let mut db = self.db.lock().unwrap();
        let id = db.next_id;
        db.next_id += 1;
        let row = json!({
            "id": id,
            "user_id": 1,
            "layout_name": name,
            "layout_json": layout_json,
            "is_default": is_default,
            "is_shared": false,
        });
        db.layouts.push(row.clone());
        serde_json::from_value(row).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn require_auth(headers: &HeaderMap) -> Result<(), Response> {
    match bearer(headers) {
        Some(USER_TOKEN) | Some(ADMIN_TOKEN) => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing token")),
    }
}

fn require_admin(headers: &HeaderMap) -> Result<(), Response> {
    require_auth(headers)?;
    match bearer(headers) {
        Some(ADMIN_TOKEN) => Ok(()),
        _ => Err(error(StatusCode::FORBIDDEN, "FORBIDDEN", "Admin only")),
    }
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({"error": message, "code": code}))).into_response()
}

fn not_found(entity: &str, id: i64) -> Response {
    error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        &format!("{entity} with id {id} not found"),
    )
}

fn data(status: StatusCode, value: Value) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

fn merge(row: &mut Value, patch: &Value, fields: &[&str]) {
    for field in fields {
        if let Some(v) = patch.get(*field) {
            row[*field] = v.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// User layouts
// ---------------------------------------------------------------------------

async fn list_user_layouts(State(db): State<SharedDb>, headers: HeaderMap) -> Response {
    if let Err(r) = require_auth(&headers) {
        return r;
    }
    let rows = db.lock().unwrap().layouts.clone();
    data(StatusCode::OK, Value::Array(rows))
}

async fn create_user_layout(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Response {
    if let Err(r) = require_auth(&headers) {
        return r;
    }
    let Some(name) = input.get("layout_name").and_then(Value::as_str) else {
        return error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "layout_name required");
    };
    let mut db = db.lock().unwrap();
    let id = db.next_id;
    db.next_id += 1;
    let row = json!({
        "id": id,
        "user_id": 1,
        "layout_name": name,
        "layout_json": input.get("layout_json").cloned().unwrap_or(Value::Null),
        "is_default": input.get("is_default").and_then(Value::as_bool).unwrap_or(false),
        "is_shared": false,
    });
    db.layouts.push(row.clone());
    data(StatusCode::CREATED, row)
}

async fn get_user_layout(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(r) = require_auth(&headers) {
        return r;
    }
    let db = db.lock().unwrap();
    match db.layouts.iter().find(|r| r["id"] == id) {
        Some(row) => data(StatusCode::OK, row.clone()),
        None => not_found("UserLayout", id),
    }
}

async fn update_user_layout(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<Value>,
) -> Response {
    if let Err(r) = require_auth(&headers) {
        return r;
    }
    let mut db = db.lock().unwrap();
    match db.layouts.iter_mut().find(|r| r["id"] == id) {
        Some(row) => {
            merge(
                row,
                &input,
                &["layout_name", "layout_json", "is_default", "is_shared"],
            );
            data(StatusCode::OK, row.clone())
        }
        None => not_found("UserLayout", id),
    }
}

async fn delete_user_layout(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(r) = require_auth(&headers) {
        return r;
    }
    let mut db = db.lock().unwrap();
    let before = db.layouts.len();
    db.layouts.retain(|r| r["id"] != id);
    if db.layouts.len() == before {
        return not_found("UserLayout", id);
    }
    StatusCode::NO_CONTENT.into_response()
}

// ---------------------------------------------------------------------------
// Admin presets
// ---------------------------------------------------------------------------

async fn list_admin_presets(State(db): State<SharedDb>, headers: HeaderMap) -> Response {
    if let Err(r) = require_admin(&headers) {
        return r;
    }
    let rows = db.lock().unwrap().presets.clone();
    data(StatusCode::OK, Value::Array(rows))
}

async fn create_admin_preset(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Response {
    if let Err(r) = require_admin(&headers) {
        return r;
    }
    let mut db = db.lock().unwrap();
    let id = db.next_id;
    db.next_id += 1;
    let row = json!({
        "id": id,
        "name": input.get("name").cloned().unwrap_or(Value::Null),
        "role_default_for": input.get("role_default_for").cloned().unwrap_or(Value::Null),
        "layout_json": input.get("layout_json").cloned().unwrap_or(Value::Null),
        "created_by": 1,
    });
    db.presets.push(row.clone());
    data(StatusCode::CREATED, row)
}

async fn update_admin_preset(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<Value>,
) -> Response {
    if let Err(r) = require_admin(&headers) {
        return r;
    }
    let mut db = db.lock().unwrap();
    match db.presets.iter_mut().find(|r| r["id"] == id) {
        Some(row) => {
            merge(row, &input, &["name", "role_default_for", "layout_json"]);
            data(StatusCode::OK, row.clone())
        }
        None => not_found("AdminLayoutPreset", id),
    }
}

async fn delete_admin_preset(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(r) = require_admin(&headers) {
        return r;
    }
    let mut db = db.lock().unwrap();
    let before = db.presets.len();
    db.presets.retain(|r| r["id"] != id);
    if db.presets.len() == before {
        return not_found("AdminLayoutPreset", id);
    }
    StatusCode::NO_CONTENT.into_response()
}
