use std::io::{self, BufRead, Write};
use std::sync::Arc;

use authflow::config::{API_URL_VAR, ClientConfig, ConfigError};
use authflow::error::{ApiError, ErrorCode};
use authflow::net::api::ApiClient;
use authflow::net::session::Session;
use authflow::state::auth::AuthStore;
use authflow::views::dashboard::{self, DashboardView};
use authflow::views::home::HomeView;
use authflow::views::login::LoginForm;
use authflow::views::register::RegisterForm;
use authflow::views::{Route, Submission};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("api client setup failed: {0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Rejected(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "authflow", about = "Register, log in and inspect the session against the auth API")]
struct Cli {
    /// Base URL of the auth API, e.g. `http://localhost:8080/api/v1`.
    #[arg(long, env = API_URL_VAR)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and show the dashboard.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AUTHFLOW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and show the dashboard.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Interactive session; commands share one cookie jar and token, so the
    /// dashboard, refresh and logout flows live here.
    Shell,
}

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Login { email: String, password: String },
    Register { name: String, email: String, password: String, confirm_password: String },
    Dashboard,
    Me,
    Session,
    Logout,
    Help,
    Quit,
    Empty,
}

const SHELL_HELP: &str = "\
commands:
  login <email> <password>
  register <name...> <email> <password> <confirm-password>
  dashboard
  me
  session
  logout
  help
  quit";

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let env_file = dotenvy::dotenv();
    init_tracing();
    match env_file {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config.api_url = ClientConfig::new(url)?.api_url;
    }
    tracing::debug!(api_url = %config.api_url, "starting");

    let client = Arc::new(ApiClient::new(config)?);
    let store = AuthStore::new(client.clone());

    // The cookie jar lives only as long as this process, so one-shot sign-in
    // skips the startup refresh; it could never find a cookie.
    match cli.command {
        Command::Login { email, password } => {
            let mut form = LoginForm::new(email, password);
            let outcome = form.submit(&store).await;
            follow(&store, outcome).await
        }
        Command::Register { name, email, password, confirm_password } => {
            let mut form = RegisterForm::new(name, email, password, confirm_password);
            let outcome = form.submit(&store).await;
            follow(&store, outcome).await
        }
        Command::Shell => {
            store.initialize().await;
            run_shell(&store, client.session()).await
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

async fn follow(store: &AuthStore, outcome: Submission) -> Result<(), CliError> {
    match outcome {
        Submission::Redirect(route) => {
            println!("{}", render(store, route).await);
            Ok(())
        }
        Submission::Rejected(message) => Err(CliError::Rejected(message)),
    }
}

async fn render(store: &AuthStore, route: Route) -> String {
    match route {
        Route::Home => HomeView.to_string(),
        Route::Login => LoginForm::default().to_string(),
        Route::Register => RegisterForm::default().to_string(),
        Route::Dashboard => DashboardView::open(store).await.to_string(),
    }
}

// =============================================================================
// SHELL
// =============================================================================

async fn run_shell(store: &AuthStore, session: &Session) -> Result<(), CliError> {
    println!("{}", render(store, Route::Home).await);
    println!("{SHELL_HELP}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let command = match parse_shell_line(&line?) {
            Ok(command) => command,
            Err(usage) => {
                println!("usage: {usage}");
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        run_shell_command(store, session, command).await;
    }
    Ok(())
}

async fn run_shell_command(store: &AuthStore, session: &Session, command: ShellCommand) {
    match command {
        ShellCommand::Login { email, password } => {
            let mut form = LoginForm::new(email, password);
            print_submission(store, form.submit(store).await).await;
        }
        ShellCommand::Register { name, email, password, confirm_password } => {
            let mut form = RegisterForm::new(name, email, password, confirm_password);
            print_submission(store, form.submit(store).await).await;
        }
        ShellCommand::Dashboard => println!("{}", render(store, Route::Dashboard).await),
        ShellCommand::Me => match store.api().current_user().await {
            Ok(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            Err(e) => println!("error [{}]: {}", e.error_code(), e.message()),
        },
        ShellCommand::Session => println!("{}", describe_session(session)),
        ShellCommand::Logout => {
            let route = dashboard::logout(store).await;
            println!("{}", render(store, route).await);
        }
        ShellCommand::Help => println!("{SHELL_HELP}"),
        ShellCommand::Quit | ShellCommand::Empty => {}
    }
}

fn describe_session(session: &Session) -> String {
    match session.remaining() {
        None => "no access token".to_owned(),
        Some(_) if session.is_expired() => "access token expired; log in again".to_owned(),
        Some(left) => format!("access token valid for {}s", left.as_secs()),
    }
}

async fn print_submission(store: &AuthStore, outcome: Submission) {
    match outcome {
        Submission::Redirect(route) => println!("{}", render(store, route).await),
        Submission::Rejected(message) => println!("error: {message}"),
    }
}

fn parse_shell_line(line: &str) -> Result<ShellCommand, &'static str> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(ShellCommand::Empty);
    };
    let rest: Vec<&str> = parts.collect();
    match (head, rest.as_slice()) {
        ("login", [email, password]) => {
            Ok(ShellCommand::Login { email: (*email).to_owned(), password: (*password).to_owned() })
        }
        ("login", _) => Err("login <email> <password>"),
        ("register", [name @ .., email, password, confirm]) if !name.is_empty() => Ok(ShellCommand::Register {
            name: name.join(" "),
            email: (*email).to_owned(),
            password: (*password).to_owned(),
            confirm_password: (*confirm).to_owned(),
        }),
        ("register", _) => Err("register <name...> <email> <password> <confirm-password>"),
        ("dashboard", []) => Ok(ShellCommand::Dashboard),
        ("me", []) => Ok(ShellCommand::Me),
        ("session", []) => Ok(ShellCommand::Session),
        ("logout", []) => Ok(ShellCommand::Logout),
        ("help", _) => Ok(ShellCommand::Help),
        ("quit" | "exit", _) => Ok(ShellCommand::Quit),
        _ => Err("unknown command; type `help`"),
    }
}
