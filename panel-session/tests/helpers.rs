//! Recording fakes for session manager tests
#![allow(dead_code)]

use async_trait::async_trait;
use panel_client::AdminApi;
use panel_core::{
    ApiEnvelope, AuthPayload, DashboardStats, Delay, ErrorContext, LoginRequest, PanelError,
    PanelResult, PasswordChange, ProfileUpdate, Role, SessionConfig, UserRecord,
};
use panel_session::{AppHooks, Control, Screen, SessionManager, SessionUi, ToastKind};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub fn init_tracing() {
    LazyLock::force(&TRACING);
}

pub fn user(id: &str, role: Role, permissions: &[&str]) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("user{}@example.com", id),
        role,
        permissions: permissions.iter().map(|p| p.to_string()).collect::<BTreeSet<_>>(),
    }
}

pub fn editor() -> UserRecord {
    user("7", Role::Editor, &["edit_content", "view_dashboard"])
}

/// How the fake backend answers one call
#[derive(Debug, Clone)]
pub enum Reply {
    /// `success: true` with this admin
    Admin(UserRecord),
    /// `success: true` without a payload
    Done,
    /// HTTP 200 with `success: false`
    Refused(Option<String>),
    /// Non-2xx status with an optional envelope message
    Status(u16, Option<String>),
    /// Connection failure
    Offline,
    /// 2xx with a body that is not JSON
    Garbled,
}

impl Reply {
    fn error(&self, operation: &str) -> Option<PanelError> {
        let context = ErrorContext::new("fake_api").with_operation(operation);
        match self {
            Reply::Status(status, message) => Some(PanelError::Api {
                status: *status,
                message: format!("HTTP {}", status),
                remote_message: message.clone(),
                context,
            }),
            Reply::Offline => Some(PanelError::Network {
                message: "connection refused".to_string(),
                source: None,
                context,
            }),
            Reply::Garbled => serde_json::from_str::<serde_json::Value>("<html>")
                .err()
                .map(PanelError::from),
            _ => None,
        }
    }

    fn envelope<T>(&self, operation: &str, data: impl FnOnce() -> Option<T>) -> PanelResult<ApiEnvelope<T>> {
        if let Some(error) = self.error(operation) {
            return Err(error);
        }

        Ok(match self {
            Reply::Refused(message) => ApiEnvelope {
                success: false,
                data: None,
                message: message.clone(),
            },
            _ => ApiEnvelope {
                success: true,
                data: data(),
                message: None,
            },
        })
    }

    fn auth(&self, operation: &str, token: Option<&str>) -> PanelResult<ApiEnvelope<AuthPayload>> {
        let admin = match self {
            Reply::Admin(admin) => Some(admin.clone()),
            _ => None,
        };
        self.envelope(operation, || {
            admin.map(|admin| AuthPayload {
                admin,
                token: token.map(str::to_string),
            })
        })
    }
}

/// In-memory backend with scripted replies and call counters
pub struct FakeApi {
    token: Mutex<Option<String>>,
    persisted: AtomicBool,
    replies: Mutex<HashMap<&'static str, Reply>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    pub login_requests: Mutex<Vec<LoginRequest>>,
    pub profile_updates: Mutex<Vec<ProfileUpdate>>,
    /// When set, login waits for a notification before answering
    pub login_gate: Mutex<Option<Arc<Notify>>>,
    /// When set, verify waits for a notification before answering
    pub verify_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            token: Mutex::new(None),
            persisted: AtomicBool::new(false),
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            login_requests: Mutex::new(Vec::new()),
            profile_updates: Mutex::new(Vec::new()),
            login_gate: Mutex::new(None),
            verify_gate: Mutex::new(None),
        }
    }

    pub fn with_token(self, token: &str) -> Self {
        *self.token.lock().unwrap() = Some(token.to_string());
        self
    }

    pub fn reply(&self, operation: &'static str, reply: Reply) {
        self.replies.lock().unwrap().insert(operation, reply);
    }

    pub fn gate_login(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.login_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_verify(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.verify_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Yield until `operation` has been called `count` times
    pub async fn wait_for_calls(&self, operation: &str, count: usize) {
        for _ in 0..100 {
            if self.calls(operation) >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(self.calls(operation), count, "{operation} was not called");
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn token_persisted(&self) -> bool {
        self.persisted.load(Ordering::SeqCst)
    }

    fn record(&self, operation: &'static str) -> Reply {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        self.replies
            .lock()
            .unwrap()
            .get(operation)
            .cloned()
            .unwrap_or(Reply::Offline)
    }
}

#[async_trait]
impl AdminApi for FakeApi {
    fn stored_token(&self) -> Option<String> {
        self.token()
    }

    fn set_token(&self, token: Option<String>, persist: bool) -> PanelResult<()> {
        self.persisted.store(token.is_some() && persist, Ordering::SeqCst);
        *self.token.lock().unwrap() = token;
        Ok(())
    }

    async fn verify_token(&self) -> PanelResult<ApiEnvelope<AuthPayload>> {
        let reply = self.record("verify");

        let gate = self.verify_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        reply.auth("verify_token", None)
    }

    async fn login(&self, request: &LoginRequest) -> PanelResult<ApiEnvelope<AuthPayload>> {
        let reply = self.record("login");
        self.login_requests.lock().unwrap().push(request.clone());

        let gate = self.login_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let envelope = reply.auth("login", Some("issued-token"))?;
        if envelope.success {
            self.set_token(Some("issued-token".to_string()), request.remember_me)?;
        }
        Ok(envelope)
    }

    async fn logout(&self) -> PanelResult<()> {
        self.record("logout")
            .envelope::<serde_json::Value>("logout", || None)?
            .into_result("logout")?;
        Ok(())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> PanelResult<ApiEnvelope<AuthPayload>> {
        let reply = self.record("profile");
        self.profile_updates.lock().unwrap().push(update.clone());
        reply.auth("update_profile", None)
    }

    async fn change_password(
        &self,
        _change: &PasswordChange,
    ) -> PanelResult<ApiEnvelope<serde_json::Value>> {
        self.record("password").envelope("change_password", || None)
    }

    async fn dashboard_stats(&self) -> PanelResult<ApiEnvelope<DashboardStats>> {
        self.record("dashboard")
            .envelope("dashboard_stats", || Some(DashboardStats::default()))
    }
}

/// Everything the session asked the UI to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Screen(Screen),
    Toast(String, ToastKind),
    InlineError(String),
    ClearInlineError,
    Busy(Control, bool, Option<String>),
    Confirm(String),
    UserDisplay(Option<String>),
    Authenticated,
    Wait(Duration),
}

pub type EventLog = Arc<Mutex<Vec<UiEvent>>>;

pub struct RecordingUi {
    events: EventLog,
    confirm_answer: AtomicBool,
}

impl RecordingUi {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            confirm_answer: AtomicBool::new(true),
        }
    }

    pub fn answer_confirm(&self, yes: bool) {
        self.confirm_answer.store(yes, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionUi for RecordingUi {
    fn show_screen(&self, screen: Screen) {
        self.events.lock().unwrap().push(UiEvent::Screen(screen));
    }

    fn show_toast(&self, message: &str, kind: ToastKind, _duration: Option<Duration>) {
        self.events
            .lock()
            .unwrap()
            .push(UiEvent::Toast(message.to_string(), kind));
    }

    fn show_inline_error(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(UiEvent::InlineError(message.to_string()));
    }

    fn clear_inline_error(&self) {
        self.events.lock().unwrap().push(UiEvent::ClearInlineError);
    }

    fn set_busy(&self, control: Control, busy: bool, label: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(UiEvent::Busy(control, busy, label.map(str::to_string)));
    }

    async fn confirm(&self, message: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .push(UiEvent::Confirm(message.to_string()));
        self.confirm_answer.load(Ordering::SeqCst)
    }
}

pub struct RecordingHooks {
    events: EventLog,
    pub authenticated: AtomicUsize,
}

impl RecordingHooks {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            authenticated: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AppHooks for RecordingHooks {
    async fn on_authenticated(&self) {
        self.authenticated.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(UiEvent::Authenticated);
    }

    fn update_user_display(&self, user: Option<&UserRecord>) {
        self.events
            .lock()
            .unwrap()
            .push(UiEvent::UserDisplay(user.map(|u| u.name.clone())));
    }
}

/// Records requested pauses without sleeping
pub struct RecordingDelay {
    events: EventLog,
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.events.lock().unwrap().push(UiEvent::Wait(duration));
    }
}

/// A session manager wired to recording fakes
pub struct Harness {
    pub session: Arc<SessionManager>,
    pub api: Arc<FakeApi>,
    pub ui: Arc<RecordingUi>,
    pub hooks: Arc<RecordingHooks>,
    pub events: EventLog,
}

impl Harness {
    pub fn new(api: FakeApi) -> Self {
        init_tracing();

        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let api = Arc::new(api);
        let ui = Arc::new(RecordingUi::new(events.clone()));
        let hooks = Arc::new(RecordingHooks::new(events.clone()));

        let session = SessionManager::new(
            api.clone(),
            ui.clone(),
            hooks.clone(),
            SessionConfig::default(),
        )
        .with_delay(Arc::new(RecordingDelay {
            events: events.clone(),
        }));

        Self {
            session: Arc::new(session),
            api,
            ui,
            hooks,
            events,
        }
    }

    /// A harness already signed in as `admin`
    pub async fn signed_in(admin: UserRecord) -> Self {
        let api = FakeApi::new().with_token("stored-token");
        api.reply("verify", Reply::Admin(admin));
        let harness = Self::new(api);
        assert_eq!(harness.session.initialize().await, Screen::App);
        harness.clear_events();
        harness
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn toasts(&self) -> Vec<(String, ToastKind)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Toast(message, kind) => Some((message, kind)),
                _ => None,
            })
            .collect()
    }

    pub fn inline_errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::InlineError(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn screens(&self) -> Vec<Screen> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Screen(screen) => Some(screen),
                _ => None,
            })
            .collect()
    }
}
