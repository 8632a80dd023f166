//! A scripted in-memory backend for session tests.
//!
//! Protected paths accept exactly one access token at a time; the refresh
//! endpoint behaves as configured and can be held shut until the test
//! releases it, which makes concurrent interleavings deterministic.

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use tokenward_core::{ApiRequest, ApiResponse, CancelSignal, Method, Result, Transport};
use tokenward_core::error::TransportError;

pub const REFRESH: &str = "/refresh";
pub const AUTH: &str = "/auth";
pub const REGISTER: &str = "/register";
pub const LOGOUT: &str = "/logout";

/// How the mock answers `GET /refresh`.
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    /// Issue `token`, which becomes the only accepted token.
    Issue { token: String, user: Option<Value> },
    /// Reject the refresh credential with this status.
    Deny(u16),
    /// Fail with this (non-auth) status.
    Fail(u16),
    /// Connection error, no response.
    NetworkDown,
    /// 200 with a body that is not a token response.
    Garbage,
}

impl RefreshBehavior {
    pub fn issue(token: &str) -> Self {
        RefreshBehavior::Issue {
            token: token.to_string(),
            user: Some(json!({"id": 7, "name": "ana"})),
        }
    }
}

/// A request as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

struct BackendState {
    accepted_token: Option<String>,
    refresh: RefreshBehavior,
    users: Value,
    reject_everything: bool,
    protected_status: Option<u16>,
    taken_usernames: Vec<String>,
    seen: Vec<Seen>,
}

pub struct MockBackend {
    state: Mutex<BackendState>,
    refresh_gate: Option<Semaphore>,
    protected_delay: Option<Duration>,
}

impl MockBackend {
    pub fn new(accepted_token: Option<&str>, refresh: RefreshBehavior) -> Self {
        Self {
            state: Mutex::new(BackendState {
                accepted_token: accepted_token.map(str::to_string),
                refresh,
                users: json!([{"username": "bob"}]),
                reject_everything: false,
                protected_status: None,
                taken_usernames: vec!["taken".to_string()],
                seen: Vec::new(),
            }),
            refresh_gate: None,
            protected_delay: None,
        }
    }

    /// Hold every refresh until [`release_refresh`](Self::release_refresh).
    pub fn gated(mut self) -> Self {
        self.refresh_gate = Some(Semaphore::new(0));
        self
    }

    /// Delay every protected response.
    pub fn with_protected_delay(mut self, delay: Duration) -> Self {
        self.protected_delay = Some(delay);
        self
    }

    /// Protected endpoints answer 401 whatever the token.
    pub fn rejecting_everything(self) -> Self {
        self.lock().reject_everything = true;
        self
    }

    /// Protected endpoints answer this status for an accepted token.
    pub fn with_protected_status(self, status: u16) -> Self {
        self.lock().protected_status = Some(status);
        self
    }

    pub fn release_refresh(&self, n: usize) {
        if let Some(gate) = &self.refresh_gate {
            gate.add_permits(n);
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.lock().seen.clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.lock().seen.iter().filter(|s| s.path == path).count()
    }

    pub fn bearers_for(&self, path: &str) -> Vec<Option<String>> {
        self.lock()
            .seen
            .iter()
            .filter(|s| s.path == path)
            .map(|s| s.bearer.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    async fn refresh(&self) -> Result<ApiResponse> {
        if let Some(gate) = &self.refresh_gate {
            gate.acquire().await.unwrap().forget();
        }

        let mut state = self.lock();
        match state.refresh.clone() {
            RefreshBehavior::Issue { token, user } => {
                state.accepted_token = Some(token.clone());
                let mut body = json!({"accessToken": token});
                if let Some(user) = user {
                    body["user"] = user;
                }
                Ok(json_response(200, &body))
            }
            RefreshBehavior::Deny(status) => Ok(json_response(
                status,
                &json!({"message": "refresh token invalid"}),
            )),
            RefreshBehavior::Fail(status) => Ok(ApiResponse::new(status, b"upstream down".to_vec())),
            RefreshBehavior::NetworkDown => Err(TransportError::Connection {
                message: "connection refused".to_string(),
            }
            .into()),
            RefreshBehavior::Garbage => Ok(ApiResponse::new(200, b"<html></html>".to_vec())),
        }
    }

    fn login(&self, body: Option<&Value>) -> ApiResponse {
        let user = body.and_then(|b| b["user"].as_str()).unwrap_or_default();
        let pwd = body.and_then(|b| b["pwd"].as_str()).unwrap_or_default();
        if user == "ana" && pwd == "Secret#123" {
            let mut state = self.lock();
            state.accepted_token = Some("T1".to_string());
            json_response(
                200,
                &json!({"accessToken": "T1", "user": {"id": 7, "name": "ana"}}),
            )
        } else {
            ApiResponse::new(401, Vec::new())
        }
    }

    fn register(&self, body: Option<&Value>) -> ApiResponse {
        let user = body.and_then(|b| b["user"].as_str()).unwrap_or_default();
        let mut state = self.lock();
        if state.taken_usernames.iter().any(|u| u == user) {
            json_response(409, &json!({"message": "Username taken"}))
        } else {
            state.taken_usernames.push(user.to_string());
            ApiResponse::new(201, Vec::new())
        }
    }

    fn protected(&self, bearer: Option<&str>) -> ApiResponse {
        let state = self.lock();
        let accepted = !state.reject_everything
            && bearer.is_some()
            && bearer == state.accepted_token.as_deref();
        if !accepted {
            return ApiResponse::new(401, Vec::new());
        }
        match state.protected_status {
            Some(status) => json_response(status, &json!({"message": "scripted failure"})),
            None => json_response(200, &state.users),
        }
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn send(&self, request: &ApiRequest, _cancel: &CancelSignal) -> Result<ApiResponse> {
        let bearer = request.bearer().map(|t| t.as_str().to_string());
        self.lock().seen.push(Seen {
            method: request.method(),
            path: request.path().to_string(),
            bearer: bearer.clone(),
            body: request.body().cloned(),
        });

        match request.path() {
            REFRESH => self.refresh().await,
            AUTH => Ok(self.login(request.body())),
            REGISTER => Ok(self.register(request.body())),
            LOGOUT => {
                self.lock().accepted_token = None;
                Ok(ApiResponse::new(204, Vec::new()))
            }
            _ => {
                if let Some(delay) = self.protected_delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(self.protected(bearer.as_deref()))
            }
        }
    }
}

fn json_response(status: u16, body: &Value) -> ApiResponse {
    ApiResponse::new(status, serde_json::to_vec(body).unwrap())
}

/// Yield until `check` holds, failing the test after a bounded number of tries.
pub async fn settle(mut check: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never held");
}
