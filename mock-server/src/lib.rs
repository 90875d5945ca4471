use std::{collections::{BTreeMap, HashMap}, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct Store {
    users: BTreeMap<u64, User>,
    next_id: u64,
}

impl Store {
    fn insert(&mut self, name: String) -> User {
        self.next_id += 1;
        let user = User {
            id: self.next_id,
            name,
        };
        self.users.insert(user.id, user.clone());
        user
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Router with an empty user store.
pub fn app() -> Router {
    app_with_users(&[])
}

/// Router whose store starts with `names`, assigned ids from 1.
pub fn app_with_users(names: &[&str]) -> Router {
    let mut store = Store::default();
    for name in names {
        store.insert(name.to_string());
    }
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/users", get(get_users).post(create_user))
        .route("/users/{id}", put(update_user))
        .route("/echo", post(echo))
        .route("/status", get(status))
        .route("/text", get(text))
        .route("/boom", get(boom))
        .route("/slow", get(slow))
        .with_state(db)
}

pub async fn run(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Single user when `id` is given, the full list otherwise.
async fn get_users(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let store = db.read().await;
    let Some(raw) = query.get("id") else {
        let users: Vec<User> = store.users.values().cloned().collect();
        return Json(users).into_response();
    };
    let Ok(id) = raw.parse::<u64>() else {
        return error(StatusCode::BAD_REQUEST, "id must be a number");
    };
    match store.users.get(&id) {
        Some(user) => Json(user.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "user not found"),
    }
}

async fn create_user(State(db): State<Db>, Form(form): Form<HashMap<String, String>>) -> Response {
    let Some(name) = form.get("name").filter(|n| !n.is_empty()) else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "name is required");
    };
    let user = db.write().await.insert(name.clone());
    (StatusCode::CREATED, Json(user)).into_response()
}

/// Unknown ids answer with a plain-text body, not JSON.
async fn update_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut store = db.write().await;
    let Some(user) = store.users.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };
    if let Some(name) = form.get("name") {
        user.name = name.clone();
    }
    Json(user.clone()).into_response()
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn status() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn text() -> &'static str {
    "plain text"
}

async fn boom() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

async fn slow(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let ms = query.get("ms").and_then(|v| v.parse().ok()).unwrap_or(1000);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "slept_ms": ms }))
}
