//! Terminal implementations of the session collaborators

use async_trait::async_trait;
use panel_core::{with_timeout, UserRecord};
use panel_session::{AppHooks, Control, Screen, SessionUi, ToastKind};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Prints notifications and asks questions on stdin
pub struct TerminalUi {
    assume_yes: bool,
    login_hint: bool,
    confirm_timeout: Duration,
}

impl TerminalUi {
    pub fn new(confirm_timeout: Duration) -> Self {
        Self {
            assume_yes: false,
            login_hint: true,
            confirm_timeout,
        }
    }

    /// Answer every confirmation with "yes"
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Point at `panel login` when the login screen comes up
    pub fn login_hint(mut self, enabled: bool) -> Self {
        self.login_hint = enabled;
        self
    }

    fn screen_notice(&self, screen: Screen) -> Option<&'static str> {
        match screen {
            Screen::Login if self.login_hint => {
                Some("🔒 Not signed in. Use `panel login` to sign in.")
            }
            _ => None,
        }
    }
}

fn toast_icon(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "✅",
        ToastKind::Error => "❌",
        ToastKind::Warning => "⚠️",
        ToastKind::Info => "ℹ️",
    }
}

#[async_trait]
impl SessionUi for TerminalUi {
    fn show_screen(&self, screen: Screen) {
        debug!(%screen, "Screen changed");
        if let Some(notice) = self.screen_notice(screen) {
            eprintln!("{}", notice);
        }
    }

    fn show_toast(&self, message: &str, kind: ToastKind, _duration: Option<Duration>) {
        match kind {
            ToastKind::Error | ToastKind::Warning => eprintln!("{} {}", toast_icon(kind), message),
            _ => println!("{} {}", toast_icon(kind), message),
        }
    }

    fn show_inline_error(&self, message: &str) {
        eprintln!("❌ {}", message);
    }

    fn clear_inline_error(&self) {}

    fn set_busy(&self, control: Control, busy: bool, label: Option<&str>) {
        debug!(?control, busy, "Control busy state changed");
        if let (true, Some(label)) = (busy, label) {
            eprintln!("⏳ {}", label);
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let question = format!("{} [y/N] ", message);
        let answer = with_timeout(
            prompt_line(question),
            self.confirm_timeout.as_millis() as u64,
            "confirm",
        )
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Ok(Err(e)) => {
                warn!(error = %e, "Could not read confirmation");
                false
            }
            Err(e) => {
                warn!(error = %e, "No answer to confirmation");
                eprintln!();
                false
            }
        }
    }
}

/// Logs user changes; the panel has no persistent header to redraw
pub struct ShellHooks;

#[async_trait]
impl AppHooks for ShellHooks {
    async fn on_authenticated(&self) {
        debug!("Panel ready");
    }

    fn update_user_display(&self, user: Option<&UserRecord>) {
        match user {
            Some(user) => info!(user = %user.display_string(), "Signed in"),
            None => info!("Signed out"),
        }
    }
}

/// Print `label` and read one line from stdin without blocking the runtime
pub async fn prompt_line(label: String) -> std::io::Result<String> {
    tokio::task::spawn_blocking(move || {
        let mut stderr = std::io::stderr();
        write!(stderr, "{}", label)?;
        stderr.flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    })
    .await
    .map_err(std::io::Error::other)?
}
