//! In-process fake of the Doorman management API.
//!
//! Serves `/platform/...` from in-memory collections, checks the credential
//! cookie, and records every request so tests can assert on exactly what the
//! console sent.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use doorman_core::{ConsoleClient, ConsoleConfig, Theme};
use serde_json::{Value, json};

pub const EMAIL: &str = "admin@doorman.dev";
pub const PASSWORD: &str = "Correct-Horse-42!Battery";
pub const LOGIN_TOKEN: &str = "tok-login";
pub const REFRESHED_TOKEN: &str = "tok-refreshed";

/// A request as the fake API saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub cookie: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Inner {
    collections: BTreeMap<&'static str, Vec<Value>>,
    requests: Vec<Recorded>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    inner: Arc<Mutex<Inner>>,
}

impl FakeApi {
    /// Start serving on an ephemeral port. Returns the base URL.
    pub async fn start(&self) -> String {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub fn seed(&self, family: &'static str, records: Vec<Value>) {
        self.inner
            .lock()
            .unwrap()
            .collections
            .entry(family)
            .or_default()
            .extend(records);
    }

    pub fn records(&self, family: &'static str) -> Vec<Value> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .get(family)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Requests other than the authorization endpoints.
    pub fn resource_requests(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| !r.path.starts_with("/platform/authorization"))
            .collect()
    }

    pub fn clear_requests(&self) {
        self.inner.lock().unwrap().requests.clear();
    }
}

/// Console configuration pointing at `base_url`.
pub fn config(base_url: &str) -> ConsoleConfig {
    ConsoleConfig {
        base_url: base_url.to_owned(),
        home_dir: PathBuf::from("/nonexistent"),
        page_size: 10,
        refresh_interval: Duration::from_secs(15 * 60),
        request_timeout: Some(Duration::from_secs(10)),
        log_level: "warn".to_owned(),
        theme: Theme::Light,
    }
}

/// Start a fake API and return it with a logged-in client.
pub async fn logged_in() -> (FakeApi, ConsoleClient) {
    let fake = FakeApi::default();
    let url = fake.start().await;
    let client = ConsoleClient::new(&config(&url)).unwrap();
    client.login(EMAIL, PASSWORD).await.unwrap();
    fake.clear_requests();
    (fake, client)
}

fn identifier(family: &str, record: &Value) -> String {
    let field = |name: &str| record.get(name).and_then(Value::as_str).unwrap_or_default().to_owned();
    match family {
        "api" => format!("{}/{}", field("api_name"), field("api_version")),
        "routing" => field("client_key"),
        "user" => field("username"),
        "group" => field("group_name"),
        _ => field("role_name"),
    }
}

fn plural(family: &str) -> String {
    format!("{family}s")
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({"error_code": code, "error_message": message}))).into_response()
}

async fn handle(
    State(api): State<FakeApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let body_json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let cookie = header("cookie");
    let path = uri.path().to_owned();

    let mut inner = api.inner.lock().unwrap();
    inner.requests.push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_owned),
        cookie: cookie.clone(),
        accept: header("accept"),
        content_type: header("content-type"),
        body: body_json.clone(),
    });

    if method == Method::POST && path == "/platform/authorization" {
        return if body_json["email"] == EMAIL && body_json["password"] == PASSWORD {
            Json(json!({"access_token": LOGIN_TOKEN})).into_response()
        } else {
            error(StatusCode::UNAUTHORIZED, "AUTH001", "Invalid email or password")
        };
    }

    let authorized = cookie.as_deref().is_some_and(|c| {
        c == format!("access_token_cookie={LOGIN_TOKEN}")
            || c == format!("access_token_cookie={REFRESHED_TOKEN}")
    });
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "AUTH002", "Token has expired");
    }

    match path.as_str() {
        "/platform/authorization/refresh" => {
            return Json(json!({"refresh_token": REFRESHED_TOKEN})).into_response();
        }
        "/platform/authorization/status" => {
            return Json(json!({"status": "authorized"})).into_response();
        }
        "/platform/authorization/invalidate" => {
            return Json(json!({"message": "Your token has been invalidated"})).into_response();
        }
        "/platform/dashboard" => {
            return Json(json!({
                "totalRequests": 1532, "activeUsers": 12, "newApis": 2, "monthlyUsage": 40120,
                "activeUsersList": [{"name": "ada", "email": "ada@doorman.dev"}],
                "popularApis": [{"id": "a1", "name": "orders", "version": "v1", "requests": 900, "subscribers": 4}]
            }))
            .into_response();
        }
        "/platform/logs" => {
            return Json(json!([{
                "timestamp": "2026-10-18T09:00:00Z", "level": "INFO", "message": "GET /api/orders/v1/items",
                "source": "gateway", "user": "ada", "statusCode": 200, "method": "GET", "responseTime": 12.5
            }]))
            .into_response();
        }
        "/platform/metrics" => {
            return Json(json!({
                "totalRequests": [{"timestamp": "09:00", "value": 120.0}],
                "statusCodes": {"200": 118, "500": 2}
            }))
            .into_response();
        }
        "/platform/boom" => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
        _ => {}
    }

    let Some(rest) = path.strip_prefix("/platform/") else {
        return error(StatusCode::NOT_FOUND, "GTW001", "No such route");
    };
    let mut segments = rest.splitn(2, '/');
    let family: &'static str = match segments.next() {
        Some("api") => "api",
        Some("routing") => "routing",
        Some("user") => "user",
        Some("group") => "group",
        Some("role") => "role",
        _ => return error(StatusCode::NOT_FOUND, "GTW001", "No such route"),
    };
    let key = segments.next().map(|raw| {
        raw.split('/')
            .map(|s| urlencoding::decode(s).unwrap().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    });
    let records = inner.collections.entry(family).or_default();

    match (method, key.as_deref()) {
        (Method::GET, Some("all")) => {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(plural(family), Value::Array(records.clone()));
            Json(Value::Object(wrapper)).into_response()
        }
        (Method::GET, Some(key)) => match records.iter().find(|r| identifier(family, r) == key) {
            Some(record) => Json(record.clone()).into_response(),
            None => error(StatusCode::NOT_FOUND, "GTW404", &format!("{family} {key} does not exist")),
        },
        (Method::POST, None) => {
            let key = identifier(family, &body_json);
            if records.iter().any(|r| identifier(family, r) == key) {
                let message = match family {
                    "api" => "API already exists for the requested name and version".to_owned(),
                    other => format!("{other} already exists"),
                };
                return error(StatusCode::BAD_REQUEST, "CRT001", &message);
            }
            records.push(body_json);
            (StatusCode::CREATED, Json(json!({"message": format!("{family} created successfully")})))
                .into_response()
        }
        (Method::PUT, Some(key)) => {
            if let Some(user) = key.strip_suffix("/update-password") {
                let has = |field: &str| body_json.get(field).and_then(Value::as_str).is_some();
                if !(has("old_password") && has("new_password")) {
                    return error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "GTW422",
                        "old_password and new_password are required",
                    );
                }
                return if records.iter().any(|r| identifier(family, r) == user) {
                    Json(json!({"message": "Password updated successfully"})).into_response()
                } else {
                    error(StatusCode::NOT_FOUND, "GTW404", &format!("{family} {user} does not exist"))
                };
            }
            match records.iter_mut().find(|r| identifier(family, r) == key) {
                Some(record) => {
                    if let (Some(target), Value::Object(changes)) = (record.as_object_mut(), &body_json) {
                        for (k, v) in changes {
                            target.insert(k.clone(), v.clone());
                        }
                    }
                    Json(json!({"message": format!("{family} updated successfully")})).into_response()
                }
                None => error(StatusCode::NOT_FOUND, "GTW404", &format!("{family} {key} does not exist")),
            }
        }
        (Method::DELETE, Some(key)) => {
            let before = records.len();
            records.retain(|r| identifier(family, r) != key);
            if records.len() == before {
                error(StatusCode::NOT_FOUND, "GTW404", &format!("{family} {key} does not exist"))
            } else {
                Json(json!({"message": format!("{family} deleted successfully")})).into_response()
            }
        }
        _ => error(StatusCode::METHOD_NOT_ALLOWED, "GTW405", "Method not allowed"),
    }
}
