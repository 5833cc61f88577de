//! Shared fixtures: a scripted remote authority and a recording sink.

#![allow(dead_code)]

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sessionward::client::http::check_status;
use sessionward::protocol::models::{
    parse_body, EligibilityResponse, LicenseCheckResponse, LoginRequest, LoginResponse,
    SignupRequest, SignupResponse, TrackRequest, TrackResponse,
};
use sessionward::{
    HandshakeConfig, MemoryCredentialStore, NotificationSink, RemoteAuthority, SessionConfig,
    SessionError, SessionManager, SessionSnapshot,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LOGIN: &str = "login";
pub const SIGNUP: &str = "signup";
pub const LICENSE: &str = "license";
pub const ELIGIBILITY: &str = "eligibility";
pub const TRACK: &str = "track";

/// Canned answer for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    /// HTTP status plus JSON body.
    Json(u16, Value),
    /// Connection failure.
    Offline,
    /// Request timed out.
    TimedOut,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        Reply::Json(status, body)
    }
}

/// A recorded call: endpoint name, bearer at call time, request body.
#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: &'static str,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// Remote authority answering from a per-endpoint script. Endpoints without
/// a reply behave as offline.
#[derive(Default)]
pub struct ScriptedAuthority {
    replies: Mutex<HashMap<&'static str, Reply>>,
    bearer: Mutex<Option<String>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedAuthority {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, endpoint: &'static str, reply: Reply) {
        self.replies.lock().unwrap().insert(endpoint, reply);
    }

    pub fn bearer(&self) -> Option<String> {
        self.bearer.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    fn answer<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: Option<Value>,
    ) -> Result<T, SessionError> {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            bearer: self.bearer(),
            body,
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or(Reply::Offline);

        match reply {
            Reply::Json(status, value) => {
                let bytes = serde_json::to_vec(&value).unwrap();
                check_status(status, &bytes)?;
                parse_body(&bytes, endpoint)
            }
            Reply::Offline => Err(SessionError::Transport("connection refused".to_string())),
            Reply::TimedOut => Err(SessionError::Timeout),
        }
    }
}

#[async_trait]
impl RemoteAuthority for ScriptedAuthority {
    fn set_bearer(&self, token: Option<&str>) {
        *self.bearer.lock().unwrap() = token.map(String::from);
    }

    async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, SessionError> {
        self.answer(LOGIN, Some(serde_json::to_value(request).unwrap()))
    }

    async fn signup(&self, request: &SignupRequest<'_>) -> Result<SignupResponse, SessionError> {
        self.answer(SIGNUP, Some(serde_json::to_value(request).unwrap()))
    }

    async fn check_license(&self) -> Result<LicenseCheckResponse, SessionError> {
        self.answer(LICENSE, None)
    }

    async fn check_eligibility(&self) -> Result<EligibilityResponse, SessionError> {
        self.answer(ELIGIBILITY, None)
    }

    async fn track_download(
        &self,
        request: &TrackRequest<'_>,
    ) -> Result<TrackResponse, SessionError> {
        self.answer(TRACK, Some(serde_json::to_value(request).unwrap()))
    }
}

/// Sink that records everything it is told.
#[derive(Default)]
pub struct RecordingSink {
    pub snapshots: Mutex<Vec<SessionSnapshot>>,
    pub login_prompts_closed: Mutex<usize>,
    pub login_prompts: Mutex<usize>,
    pub upgrade_prompts: Mutex<usize>,
    pub federated_failures: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<SessionSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn login_prompts_closed(&self) -> usize {
        *self.login_prompts_closed.lock().unwrap()
    }

    pub fn login_prompts(&self) -> usize {
        *self.login_prompts.lock().unwrap()
    }

    pub fn upgrade_prompts(&self) -> usize {
        *self.upgrade_prompts.lock().unwrap()
    }

    pub fn federated_failures(&self) -> Vec<String> {
        self.federated_failures.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn session_changed(&self, snapshot: &SessionSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn close_login_prompt(&self) {
        *self.login_prompts_closed.lock().unwrap() += 1;
    }

    fn prompt_login(&self) {
        *self.login_prompts.lock().unwrap() += 1;
    }

    fn prompt_upgrade(&self) {
        *self.upgrade_prompts.lock().unwrap() += 1;
    }

    fn federated_login_failed(&self, message: &str) {
        self.federated_failures.lock().unwrap().push(message.to_string());
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        app_name: "sample-scratcher/1.0.0",
        api_base_url: "https://api.scratcher.test",
        product_origin: "sample-scratcher",
        store_namespace: "sessionward-test",
        default_daily_quota: 5,
        request_timeout: Duration::from_secs(30),
        handshake: HandshakeConfig::new(
            "https://api.scratcher.test/auth/google",
            "https://scratcher.test/auth/callback",
            "https://scratcher.test",
        ),
    }
}

/// Manager wired to fresh fakes.
pub struct Harness {
    pub authority: Arc<ScriptedAuthority>,
    pub store: Arc<MemoryCredentialStore>,
    pub sink: Arc<RecordingSink>,
    pub manager: Arc<SessionManager>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryCredentialStore::new()))
    }

    pub fn with_store(store: Arc<MemoryCredentialStore>) -> Self {
        let authority = ScriptedAuthority::new();
        let sink = RecordingSink::new();
        let manager = SessionManager::with_parts(
            test_config(),
            authority.clone(),
            store.clone(),
            sink.clone(),
        )
        .unwrap();

        Self {
            authority,
            store,
            sink,
            manager: Arc::new(manager),
        }
    }
}

pub fn user_json(email: &str, has_license: bool) -> Value {
    json!({ "id": 1, "email": email, "hasLicense": has_license })
}

pub fn login_ok(token: &str, email: &str, has_license: bool) -> Reply {
    Reply::ok(json!({ "token": token, "user": user_json(email, has_license) }))
}

pub fn license_ok(has_license: bool, today: u32, remaining: u32, can_download: bool) -> Reply {
    Reply::ok(json!({
        "hasLicense": has_license,
        "downloads": {
            "downloadsToday": today,
            "downloadsRemaining": remaining,
            "canDownload": can_download
        }
    }))
}
