//! Command handlers and the interactive shell.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use rollshare_core::auth::{FileStore, KeyringStore, MemoryStore, TokenStore, REFRESH_TOKEN_KEY};
use rollshare_core::config::{DurableBackend, ENV_PASSWORD};
use rollshare_core::share::parse_share_reference;
use rollshare_core::{
    ApiClient, ApiError, AuthController, Config, Navigator, Route, SessionStores, ShareService,
    ShareViewer,
};

use crate::render::{render_json, render_status, render_view};

/// Access token file inside the cache directory
const SESSION_FILE: &str = "session.json";

/// Refresh token file inside the data directory
const TOKENS_FILE: &str = "tokens.json";

const LOGIN_HINT: &str = "Run `rollshare login` to sign in.";
const SHELL_LOGIN_HINT: &str = "Type `login` to sign in.";

const SHELL_HELP: &str = "\
Commands:
  login [USERNAME]     log in as the administrator
  logout               forget both tokens
  share                generate a public share link
  view <TOKEN|URL>     load the records behind a share link
  filter [TEXT]        filter loaded records by email (no text clears)
  status               show which tokens are stored
  help                 show this help
  quit                 leave the shell";

/// Where the access token lives for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Session file in the cache directory, shared by one-shot commands
    Persistent,
    /// Process memory only; gone when the shell exits
    Ephemeral,
}

// ============================================================================
// Navigation
// ============================================================================

/// Tracks the route the terminal is "on". Redirects from the library land
/// here and are reported after the command finishes.
#[derive(Debug)]
pub struct CliNavigator {
    current: Mutex<Route>,
}

impl CliNavigator {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Route::Landing),
        }
    }

    pub fn current(&self) -> Route {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Navigator for CliNavigator {
    fn navigate(&self, route: Route) {
        debug!(route = %route, "Navigating");
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = route;
    }
}

// ============================================================================
// Shell commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Login(Option<String>),
    Logout,
    Share,
    View(String),
    Filter(String),
    Status,
    Help,
    Quit,
    Empty,
}

impl ShellCommand {
    /// Parse one input line. Unknown commands and missing arguments yield
    /// the message to print.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "" => Ok(ShellCommand::Empty),
            "login" => Ok(ShellCommand::Login(
                Some(rest.to_string()).filter(|r| !r.is_empty()),
            )),
            "logout" => Ok(ShellCommand::Logout),
            "share" => Ok(ShellCommand::Share),
            "view" if rest.is_empty() => Err("Usage: view <TOKEN|URL>".to_string()),
            "view" => Ok(ShellCommand::View(rest.to_string())),
            "filter" => Ok(ShellCommand::Filter(rest.to_string())),
            "status" => Ok(ShellCommand::Status),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(format!("Unknown command: {}. Type `help` for a list.", other)),
        }
    }
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    config: Config,
    mode: SessionMode,
    auth: AuthController,
    share: ShareService,
    viewer: ShareViewer,
    navigator: Arc<CliNavigator>,
    token_file: Option<Arc<FileStore>>,
}

impl App {
    pub fn new(mode: SessionMode) -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(api = %config.api_base_url, origin = %config.origin, ?mode, "Config loaded");

        let (stores, token_file) = build_stores(&config, mode)?;
        let navigator = Arc::new(CliNavigator::new());
        let api = ApiClient::new(&config, stores, navigator.clone())?;

        Ok(Self {
            auth: AuthController::new(api.clone()),
            share: ShareService::new(api, config.origin.clone()),
            viewer: ShareViewer::new(),
            config,
            mode,
            navigator,
            token_file,
        })
    }

    fn login_hint(&self) -> &'static str {
        match self.mode {
            SessionMode::Persistent => LOGIN_HINT,
            SessionMode::Ephemeral => SHELL_LOGIN_HINT,
        }
    }

    /// Turn a failed operation into the error shown to the user, adding a
    /// login hint when the session was ended.
    fn command_error(&self, e: ApiError) -> anyhow::Error {
        if e.is_auth_expired() || self.navigator.current() == Route::Login {
            anyhow!("{}\n{}", e, self.login_hint())
        } else {
            anyhow::Error::from(e)
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in, prompting for whatever was not given on the command line or
    /// in the environment.
    pub async fn login_interactive(&mut self, username: Option<String>) -> Result<()> {
        let username = match username.filter(|u| !u.is_empty()) {
            Some(u) => u,
            None => self.prompt_username()?,
        };
        let password = match std::env::var(ENV_PASSWORD) {
            Ok(p) if !p.is_empty() => p,
            _ => rpassword::prompt_password("Password: ")?,
        };

        println!("Authenticating...");
        self.auth.login(&username, &password).await?;

        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.auth.enter(Route::Admin);
        info!("Admin session started");
        println!("Login successful.");
        Ok(())
    }

    fn prompt_username(&self) -> Result<String> {
        match self.config.last_username {
            Some(ref last) => print!("Username [{}]: ", last),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        match (input.is_empty(), &self.config.last_username) {
            (true, Some(last)) => Ok(last.clone()),
            _ => Ok(input.to_string()),
        }
    }

    pub fn logout(&self) {
        self.auth.logout();
        println!("Logged out.");
    }

    pub fn print_status(&self) {
        println!("Server: {}", self.config.api_base_url);
        println!("{}", render_status(&self.auth.session()));

        if let Some(ref file) = self.token_file {
            match file.stored_at(REFRESH_TOKEN_KEY) {
                Ok(Some(at)) => println!("Refresh token saved: {}", at.format("%Y-%m-%d %H:%M UTC")),
                Ok(None) => {}
                Err(e) => warn!(error = %e, path = %file.path().display(), "Failed to read token file"),
            }
        }
    }

    // =========================================================================
    // Sharing
    // =========================================================================

    /// Generate a share link and print it.
    pub async fn share(&self) -> Result<()> {
        if !self.auth.enter(Route::Admin) {
            return Err(anyhow!("Not logged in. {}", self.login_hint()));
        }

        let link = self
            .share
            .generate_share_link()
            .await
            .map_err(|e| self.command_error(e))?;

        println!("Share link generated:");
        println!("{}", link.url);
        Ok(())
    }

    /// Load the records behind a share reference and print them.
    pub async fn view(&mut self, reference: &str, email: Option<&str>, json: bool) -> Result<()> {
        self.load(reference).await?;
        match email {
            Some(query) => self.viewer.set_query(query),
            None => self.viewer.clear_query(),
        }

        if json {
            println!("{}", render_json(&self.viewer.visible())?);
        } else {
            println!("{}", render_view(&self.viewer));
        }
        Ok(())
    }

    async fn load(&mut self, reference: &str) -> Result<()> {
        let token = parse_share_reference(reference)
            .ok_or_else(|| anyhow!("Share link is invalid or missing token."))?;
        self.auth.enter(Route::Share(token.clone()));

        debug!("Loading shared records");
        self.viewer
            .load(&self.share, &token)
            .await
            .map_err(|e| self.command_error(e))?;
        Ok(())
    }

    // =========================================================================
    // Shell
    // =========================================================================

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run_shell(&mut self) -> Result<()> {
        println!("rollshare shell. Type `help` for commands.");
        let stdin = io::stdin();

        loop {
            print!("rollshare {}> ", self.navigator.current());
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                println!();
                break;
            }

            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(message) => {
                    println!("{}", message);
                    continue;
                }
            };

            if command == ShellCommand::Quit {
                break;
            }
            if let Err(e) = self.run_shell_command(command).await {
                println!("Error: {}", e);
            }
        }

        info!("Shell closed");
        Ok(())
    }

    async fn run_shell_command(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Login(username) => self.login_interactive(username).await?,
            ShellCommand::Logout => self.logout(),
            ShellCommand::Share => self.share().await?,
            ShellCommand::View(reference) => {
                self.load(&reference).await?;
                self.viewer.clear_query();
                println!("{}", render_view(&self.viewer));
            }
            ShellCommand::Filter(query) => {
                if self.viewer.token().is_none() {
                    return Err(anyhow!("Nothing loaded yet. Use `view <TOKEN|URL>` first."));
                }
                self.viewer.set_query(query);
                println!("{}", render_view(&self.viewer));
            }
            ShellCommand::Status => self.print_status(),
            ShellCommand::Help => println!("{}", SHELL_HELP),
            ShellCommand::Quit | ShellCommand::Empty => {}
        }
        Ok(())
    }
}

/// Build the two token stores for `mode` and the configured durable backend.
///
/// Also returns the durable store when it is a file, for status reporting.
fn build_stores(config: &Config, mode: SessionMode) -> Result<(SessionStores, Option<Arc<FileStore>>)> {
    let volatile: Arc<dyn TokenStore> = match mode {
        SessionMode::Persistent => Arc::new(FileStore::new(config.cache_dir()?.join(SESSION_FILE))),
        SessionMode::Ephemeral => Arc::new(MemoryStore::new()),
    };
    let (durable, token_file): (Arc<dyn TokenStore>, _) = match config.durable_store {
        DurableBackend::File => {
            let file = Arc::new(FileStore::new(config.data_dir()?.join(TOKENS_FILE)));
            (file.clone(), Some(file))
        }
        DurableBackend::Keyring => (Arc::new(KeyringStore::new()), None),
    };
    Ok((SessionStores::new(volatile, durable), token_file))
}
