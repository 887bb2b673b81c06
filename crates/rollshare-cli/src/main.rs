//! rollshare - command line client for the student-records share portal.
//!
//! Administrators log in and mint share links; anyone holding a link can list
//! and filter the shared student records.

mod app;
mod render;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rollshare_core::config::ENV_USERNAME;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, SessionMode};

/// Directory for an additional daily log file
const ENV_LOG_DIR: &str = "ROLLSHARE_LOG_DIR";

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "rollshare.log";

/// Command line client for the student-records share portal
#[derive(Parser, Debug)]
#[command(name = "rollshare")]
#[command(about = "Share read-only student records through public links", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in as the administrator
    Login {
        /// Username (prompted for when missing)
        #[arg(short, long, env = ENV_USERNAME)]
        username: Option<String>,
    },

    /// Forget both stored tokens
    Logout,

    /// Show which tokens are stored
    Status,

    /// Generate a public share link
    Share,

    /// List the records behind a share token or link
    View {
        /// Share token, `/share/<token>` path or full share URL
        reference: String,

        /// Only show records whose email contains this text
        #[arg(short, long)]
        email: Option<String>,

        /// Print the matching records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session that keeps the access token in memory
    Shell,
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // RUST_LOG controls the level, e.g. RUST_LOG=rollshare_core=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
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
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();
    info!(command = ?cli.command, "rollshare starting");

    match cli.command {
        Commands::Login { username } => {
            let mut app = App::new(SessionMode::Persistent)?;
            app.login_interactive(username).await?;
        }
        Commands::Logout => {
            let app = App::new(SessionMode::Persistent)?;
            app.logout();
        }
        Commands::Status => {
            let app = App::new(SessionMode::Persistent)?;
            app.print_status();
        }
        Commands::Share => {
            let app = App::new(SessionMode::Persistent)?;
            app.share().await?;
        }
        Commands::View {
            reference,
            email,
            json,
        } => {
            let mut app = App::new(SessionMode::Persistent)?;
            app.view(&reference, email.as_deref(), json).await?;
        }
        Commands::Shell => {
            let mut app = App::new(SessionMode::Ephemeral)?;
            app.run_shell().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_view_with_filter() {
        let cli = Cli::try_parse_from(["rollshare", "view", "abc123", "--email", "gmail"]).unwrap();
        match cli.command {
            Commands::View {
                reference,
                email,
                json,
            } => {
                assert_eq!(reference, "abc123");
                assert_eq!(email.as_deref(), Some("gmail"));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_view_requires_reference() {
        assert!(Cli::try_parse_from(["rollshare", "view"]).is_err());
    }

    #[test]
    fn test_login_username_reads_environment() {
        let command = Cli::command();
        let login = command.find_subcommand("login").unwrap();
        let username = login
            .get_arguments()
            .find(|arg| arg.get_id() == "username")
            .unwrap();
        assert_eq!(username.get_env(), Some(std::ffi::OsStr::new(ENV_USERNAME)));
    }
}
