//! assetdesk - terminal front end for the asset management service.
//!
//! Each invocation runs one command against the backend. The session is kept
//! in the configured token store between invocations, so an expired access
//! token is refreshed transparently on the next command.

mod output;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use assetdesk_core::{ApiClient, ApiError, Config, Navigator};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directory for the optional rolling log file.
const ENV_LOG_DIR: &str = "ASSETDESK_LOG_DIR";

const USAGE: &str = "\
Usage: assetdesk <command> [args]

Commands:
  login [username]        Sign in and store the session
  logout                  Sign out and forget the session
  forgot-password <user>  Email a password reset link
  reset-password <uid> <token>
                          Set a new password from a reset link
  passwd                  Change your password
  whoami                  Show the signed-in user
  status                  Show whether a session is stored
  dashboard               Asset totals and category breakdown
  assets [filter]         List assets (active, inactive, deleted, updated,
                          pending, troubleshooting)
  offices                 List offices
  divisions               List divisions
  maintenances            List maintenance records
  users                   List users
  approve <asset-id>      Approve a pending asset update
  reject <asset-id>       Reject a pending asset update
  pending-actions <asset-id>
                          Show change requests filed against an asset
  approve-action <id>     Approve a pending action
  reject-action <id>      Reject a pending action";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetFilter {
    All,
    Active,
    Inactive,
    Deleted,
    Updated,
    Pending,
    Troubleshooting,
}

impl AssetFilter {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(AssetFilter::All),
            "active" => Some(AssetFilter::Active),
            "inactive" => Some(AssetFilter::Inactive),
            "deleted" => Some(AssetFilter::Deleted),
            "updated" => Some(AssetFilter::Updated),
            "pending" => Some(AssetFilter::Pending),
            "troubleshooting" | "need-troubleshooting" => Some(AssetFilter::Troubleshooting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login { username: Option<String> },
    Logout,
    ForgotPassword { username: String },
    ResetPassword { uidb64: String, token: String },
    ChangePassword,
    Whoami,
    Status,
    Dashboard,
    Assets(AssetFilter),
    Offices,
    Divisions,
    Maintenances,
    Users,
    Approve(i64),
    Reject(i64),
    PendingActions(i64),
    ApproveAction(i64),
    RejectAction(i64),
    Help,
}

/// Parse arguments (without the program name) into a command.
fn parse_args(args: &[String]) -> Result<Command> {
    let mut rest = args.iter().map(String::as_str);
    let Some(name) = rest.next() else {
        return Ok(Command::Help);
    };

    let command = match name {
        "login" => Command::Login {
            username: rest.next().map(str::to_string),
        },
        "logout" => Command::Logout,
        "forgot-password" => Command::ForgotPassword {
            username: required(name, "a username", rest.next())?,
        },
        "reset-password" => Command::ResetPassword {
            uidb64: required(name, "the uid from the reset link", rest.next())?,
            token: required(name, "the token from the reset link", rest.next())?,
        },
        "passwd" => Command::ChangePassword,
        "whoami" => Command::Whoami,
        "status" => Command::Status,
        "dashboard" => Command::Dashboard,
        "assets" => {
            let filter = match rest.next() {
                None => AssetFilter::All,
                Some(value) => AssetFilter::parse(value)
                    .ok_or_else(|| anyhow!("Unknown asset filter '{}'", value))?,
            };
            Command::Assets(filter)
        }
        "offices" => Command::Offices,
        "divisions" => Command::Divisions,
        "maintenances" => Command::Maintenances,
        "users" => Command::Users,
        "approve" => Command::Approve(parse_id(name, rest.next())?),
        "reject" => Command::Reject(parse_id(name, rest.next())?),
        "pending-actions" => Command::PendingActions(parse_id(name, rest.next())?),
        "approve-action" => Command::ApproveAction(parse_id(name, rest.next())?),
        "reject-action" => Command::RejectAction(parse_id(name, rest.next())?),
        "help" | "-h" | "--help" => Command::Help,
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    };

    if let Some(extra) = rest.next() {
        bail!("Unexpected argument '{}' for '{}'", extra, name);
    }
    Ok(command)
}

fn required(command: &str, what: &str, value: Option<&str>) -> Result<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| anyhow!("'{}' needs {}", command, what))
}

fn parse_id(command: &str, value: Option<&str>) -> Result<i64> {
    let value = value.ok_or_else(|| anyhow!("'{}' needs an id", command))?;
    value
        .parse()
        .with_context(|| format!("Invalid id '{}' for '{}'", value, command))
}

/// Tells the user once per process that they have to sign in again.
#[derive(Default)]
struct TerminalNavigator {
    shown: AtomicBool,
}

impl Navigator for TerminalNavigator {
    fn redirect_to_login(&self) {
        if !self.shown.swap(true, Ordering::SeqCst) {
            eprintln!("Session expired, run `assetdesk login` to sign in again.");
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Level comes from RUST_LOG (default "warn"). The returned guard flushes the
/// optional log file and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir.trim(), "assetdesk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load()?;
    debug!(api_url = %config.api_url, "Loaded configuration");
    let store = config.token_store()?;
    let api = ApiClient::new(&config, store, Arc::new(TerminalNavigator::default()))?;

    exit_status(run(&api, &mut config, command).await).map(ExitCode::from)
}

/// Map a command outcome to the process exit, returning normally so the log
/// guard is dropped and flushed.
fn exit_status(outcome: Result<()>) -> Result<u8> {
    match outcome {
        Ok(()) => Ok(0),
        Err(e) => match e.downcast_ref::<ApiError>() {
            // The navigator has already told the user what to do.
            Some(ApiError::SessionExpired) => Ok(1),
            Some(ApiError::Unauthenticated) => {
                bail!("Not signed in, run `assetdesk login` first")
            }
            _ => Err(e),
        },
    }
}

async fn run(api: &ApiClient, config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => {
            let username = match username.or_else(|| config.last_username.clone()) {
                Some(name) => name,
                None => prompt("Username: ")?,
            };
            let password = rpassword::prompt_password(format!("Password for {}: ", username))
                .context("Failed to read password")?;
            let user = api.login(&username, &password).await?;
            info!(username = %user.username, "Logged in");
            config.last_username = Some(username);
            config.save()?;
            println!("Signed in as {}", user.full_name());
        }
        Command::Logout => {
            api.logout().await;
            println!("Signed out");
        }
        Command::ForgotPassword { username } => {
            api.request_password_reset(&username).await?;
            println!("If the account exists, a reset link has been sent.");
        }
        Command::ResetPassword { uidb64, token } => {
            let new_password = rpassword::prompt_password("New password: ")
                .context("Failed to read password")?;
            let confirm = rpassword::prompt_password("Confirm new password: ")
                .context("Failed to read password")?;
            api.reset_password(&uidb64, &token, &new_password, &confirm)
                .await?;
            println!("Password reset, you can now log in.");
        }
        Command::ChangePassword => {
            let user = api.current_user().await?;
            let old = rpassword::prompt_password("Current password: ")
                .context("Failed to read password")?;
            let new_password = rpassword::prompt_password("New password: ")
                .context("Failed to read password")?;
            let confirm = rpassword::prompt_password("Confirm new password: ")
                .context("Failed to read password")?;
            api.change_password(user.id, &old, &new_password, &confirm)
                .await?;
            println!("Password changed");
        }
        Command::Whoami => {
            let user = api.current_user().await?;
            let role = if user.is_admin() { "admin" } else { "staff" };
            println!("{} ({}, {})", user.full_name(), user.username, role);
        }
        Command::Status => match api.executor().store().credential() {
            Some(credential) => match credential.expires_in() {
                Some(left) if left.num_seconds() > 0 => {
                    println!("Signed in (access token valid for {} min)", left.num_minutes())
                }
                Some(_) => println!("Signed in (access token expired, will refresh)"),
                None => println!("Signed in"),
            },
            None => println!("Not signed in"),
        },
        Command::Dashboard => {
            let summary = api.dashboard().await?;
            print!("{}", output::render_dashboard(&summary));
        }
        Command::Assets(filter) => {
            let assets = match filter {
                AssetFilter::All => api.assets().await?,
                AssetFilter::Active => api.active_assets().await?,
                AssetFilter::Inactive => api.inactive_assets().await?,
                AssetFilter::Deleted => api.deleted_assets().await?,
                AssetFilter::Updated => api.updated_assets().await?,
                AssetFilter::Pending => api.pending_assets().await?,
                AssetFilter::Troubleshooting => api.assets_needing_troubleshooting().await?,
            };
            print!("{}", output::render_assets(&assets));
        }
        Command::Offices => print!("{}", output::render_offices(&api.offices().await?)),
        Command::Divisions => print!("{}", output::render_divisions(&api.divisions().await?)),
        Command::Maintenances => {
            print!("{}", output::render_maintenances(&api.maintenances().await?))
        }
        Command::Users => print!("{}", output::render_users(&api.users().await?)),
        Command::Approve(id) => {
            api.approve_asset_update(id).await?;
            println!("Approved update of asset {}", id);
        }
        Command::Reject(id) => {
            api.reject_asset_update(id).await?;
            println!("Rejected update of asset {}", id);
        }
        Command::PendingActions(asset_id) => {
            let actions = api.pending_actions(asset_id).await?;
            print!("{}", output::render_pending_actions(&actions));
        }
        Command::ApproveAction(id) => {
            api.approve_pending_action(id).await?;
            println!("Approved pending action {}", id);
        }
        Command::RejectAction(id) => {
            api.reject_pending_action(id).await?;
            println!("Rejected pending action {}", id);
        }
        Command::Help => println!("{}", USAGE),
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("Username is required");
    }
    Ok(value)
}
