//! Panel CLI - terminal front end for the CMS admin panel
//!
//! Every invocation is one visit to the panel: the stored session is restored
//! (or not) first, then the command runs against it.

mod render;
mod terminal;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use panel_client::{AdminApi, ApiClientConfig, FileTokenStore, HttpAdminApi};
use panel_core::{
    init_logging, log_operation_error, log_operation_start, LoggingConfig, PanelConfig,
    PasswordChange, ProfileUpdate,
};
use panel_session::{permissions, Revalidator, SessionError, SessionManager};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use terminal::{prompt_line, ShellHooks, TerminalUi};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "panel")]
#[command(about = "Sign in to and manage a CMS admin panel from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a session is active
    Status,

    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,

        /// Keep the session across runs
        #[arg(short, long)]
        remember: bool,
    },

    /// Sign out
    Logout {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the signed-in administrator
    Whoami,

    /// Check a permission of the signed-in administrator
    Can {
        permission: String,
    },

    /// Update name or email
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Change password (prompts for current, new and confirmation)
    Password,

    /// Show the dashboard summary
    Dashboard,

    /// Keep the session alive and report when it expires
    Watch {
        /// Seconds between checks; defaults to session.revalidate_interval_secs
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// Turn a title into a URL slug
    Slug {
        text: String,
    },

    /// Configuration management
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Validate the configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = PanelConfig::load(cli.config.as_deref())?;
    if let Some(api_url) = &cli.api_url {
        config.api.base_url = api_url.clone();
    }

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging")?;

    debug!("Starting panel CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Slug { text } => {
            println!("{}", panel_core::format::slugify(&text));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config {
            init,
            show,
            validate,
        } => handle_config(&cli.config, &config, init, show, validate),
        command => {
            config.validate()?;
            let panel = Panel::open(&config, &command)?;
            panel.session.initialize().await;
            panel.run(command, &config).await
        }
    }
}

/// One session against the configured backend
struct Panel {
    api: Arc<HttpAdminApi>,
    session: Arc<SessionManager>,
}

impl Panel {
    fn open(config: &PanelConfig, command: &Commands) -> anyhow::Result<Self> {
        let token_store = Arc::new(FileTokenStore::new(&config.storage.token_file));
        let api = Arc::new(HttpAdminApi::with_token_store(
            ApiClientConfig::from(&config.api),
            token_store,
        )?);

        let ui = TerminalUi::new(Duration::from_secs(config.session.confirm_timeout_secs))
            .assume_yes(matches!(command, Commands::Logout { yes: true }))
            // `panel login` is already the way in
            .login_hint(!matches!(command, Commands::Login { .. }));
        let session = SessionManager::new(
            api.clone(),
            Arc::new(ui),
            Arc::new(ShellHooks),
            config.session.clone(),
        );

        Ok(Self {
            api,
            session: Arc::new(session),
        })
    }

    async fn run(&self, command: Commands, config: &PanelConfig) -> anyhow::Result<ExitCode> {
        match command {
            Commands::Status => {
                match self.session.current_user() {
                    Some(user) => println!("✅ Signed in as {}", user.display_string()),
                    None => println!("🔒 Not signed in"),
                }
                Ok(ExitCode::SUCCESS)
            }
            Commands::Login {
                email,
                password,
                remember,
            } => self.login(email, password, remember).await,
            Commands::Logout { .. } => match self.session.logout().await {
                Ok(true) => Ok(ExitCode::SUCCESS),
                Ok(false) => {
                    println!("Logout cancelled");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => shown(e),
            },
            Commands::Whoami => match self.session.current_user() {
                Some(user) => {
                    println!("{}", user.display_string());
                    for permission in &user.permissions {
                        println!("  • {}", permission);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(ExitCode::FAILURE),
            },
            Commands::Can { permission } => {
                let allowed = self.session.has_permission(&permission);
                println!("{}", if allowed { "yes" } else { "no" });
                Ok(if allowed {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                })
            }
            Commands::Profile { name, email } => {
                let update = ProfileUpdate { name, email };
                if update.is_empty() {
                    bail!("Nothing to update; pass --name and/or --email");
                }
                match self.session.update_profile(update).await {
                    Ok(_) => Ok(ExitCode::SUCCESS),
                    Err(e) => shown(e),
                }
            }
            Commands::Password => self.change_password().await,
            Commands::Dashboard => self.dashboard().await,
            Commands::Watch { interval } => {
                let interval = interval
                    .map(Duration::from_secs)
                    .or_else(|| config.session.revalidate_interval());
                self.watch(interval).await
            }
            Commands::Slug { .. } | Commands::Config { .. } => Ok(ExitCode::SUCCESS),
        }
    }

    async fn login(
        &self,
        email: String,
        password: Option<String>,
        remember: bool,
    ) -> anyhow::Result<ExitCode> {
        if let Some(user) = self.session.current_user() {
            println!("Already signed in as {}", user.display_string());
            return Ok(ExitCode::SUCCESS);
        }

        let password = match password {
            Some(password) => password,
            None => prompt_line("Password: ".to_string()).await?,
        };

        match self.session.submit_login(&email, &password, remember).await {
            Ok(_) => Ok(ExitCode::SUCCESS),
            Err(e) => shown(e),
        }
    }

    async fn change_password(&self) -> anyhow::Result<ExitCode> {
        if !self.session.is_authenticated() {
            return shown(SessionError::NotAuthenticated);
        }

        let change = PasswordChange {
            current_password: prompt_line("Current password: ".to_string()).await?,
            new_password: prompt_line("New password: ".to_string()).await?,
            confirm_password: prompt_line("Confirm new password: ".to_string()).await?,
        };

        match self.session.change_password(change).await {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => shown(e),
        }
    }

    async fn dashboard(&self) -> anyhow::Result<ExitCode> {
        if let Err(e) = self.session.require_permission(permissions::VIEW_DASHBOARD) {
            eprintln!("❌ {}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }

        log_operation_start!("dashboard_stats");
        let stats = self
            .api
            .dashboard_stats()
            .await
            .and_then(|envelope| envelope.into_data("dashboard_stats"))
            .map_err(|e| {
                log_operation_error!("dashboard_stats", e);
                e
            })
            .context("Failed to load dashboard")?;

        print!("{}", render::render_dashboard(&stats, chrono::Utc::now()));
        Ok(ExitCode::SUCCESS)
    }

    async fn watch(&self, interval: Option<Duration>) -> anyhow::Result<ExitCode> {
        if !self.session.is_authenticated() {
            return Ok(ExitCode::FAILURE);
        }
        let Some(interval) = interval else {
            bail!("Revalidation is disabled; pass --interval or set session.revalidate_interval_secs");
        };

        info!(interval_secs = interval.as_secs(), "Watching session");
        println!("👀 Watching session (Ctrl+C to stop)");

        let revalidator = Revalidator::spawn(self.session.clone(), interval);
        let mut poll = tokio::time::interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    revalidator.stop();
                    return Ok(ExitCode::SUCCESS);
                }
                _ = poll.tick() => {
                    if !revalidator.is_running() {
                        return Ok(if self.session.is_authenticated() {
                            ExitCode::SUCCESS
                        } else {
                            ExitCode::FAILURE
                        });
                    }
                }
            }
        }
    }
}

/// The session UI already told the user; only the exit status is left
fn shown(error: SessionError) -> anyhow::Result<ExitCode> {
    debug!(error = %error, "Command failed");
    if matches!(error, SessionError::NotAuthenticated) {
        eprintln!("🔒 {}", error.user_message());
    }
    Ok(ExitCode::FAILURE)
}

fn handle_config(
    path: &Option<PathBuf>,
    config: &PanelConfig,
    init: bool,
    show: bool,
    validate: bool,
) -> anyhow::Result<ExitCode> {
    if init {
        let path = path.clone().unwrap_or_else(PanelConfig::default_path);
        PanelConfig::default().save_to_file(&path)?;
        println!("✅ Configuration initialized at: {:?}", path);
    }

    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn login_flags_parse() {
        let cli = Cli::try_parse_from([
            "panel",
            "--api-url",
            "http://cms.test/api/",
            "login",
            "--email",
            "ed@example.com",
            "--remember",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://cms.test/api/"));
        match cli.command {
            Commands::Login {
                email,
                password,
                remember,
            } => {
                assert_eq!(email, "ed@example.com");
                assert!(password.is_none());
                assert!(remember);
            }
            _ => panic!("Expected login command"),
        }
    }

    #[test]
    fn logout_yes_flag_parses() {
        let cli = Cli::try_parse_from(["panel", "logout", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Logout { yes: true }));
    }

    #[test]
    fn watch_interval_must_be_positive() {
        assert!(Cli::try_parse_from(["panel", "watch", "--interval", "0"]).is_err());

        let cli = Cli::try_parse_from(["panel", "watch", "--interval", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { interval: Some(5) }));
    }
}
