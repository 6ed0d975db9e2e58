use clap::{Args, Parser, Subcommand};
use dinnerbell::config::{AppConfig, CliValues, ConfigFile};
use std::net::SocketAddr;
use std::path::PathBuf;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig),
    RunOnce(AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    let run_once = match &cli.command {
        Some(Command::Init(args)) => return RunOutcome::Exit(run_init(args)),
        Some(Command::AuthKey) => return RunOutcome::Exit(run_auth_key()),
        Some(Command::AuthToken(args)) => {
            return RunOutcome::Exit(run_auth_token(cli.auth_key.as_deref(), args));
        }
        Some(Command::RunOnce) => true,
        Some(Command::Serve) | None => false,
    };

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    if run_once {
        RunOutcome::RunOnce(config)
    } else {
        RunOutcome::Serve(config)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dinnerbell",
    version,
    about = "Recipe-box backend: chat proxy and daily dinner notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Optional TOML file with non-secret settings.
    #[arg(long, env = "DINNERBELL_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    listen: Option<SocketAddr>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long, env = "DINNERBELL_ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,
    #[arg(long, env = "DINNERBELL_FCM_SERVICE_ACCOUNT")]
    fcm_service_account: Option<PathBuf>,
    #[arg(long, env = "DINNERBELL_VAPID_PRIVATE_KEY", hide_env_values = true)]
    vapid_private_key: Option<String>,
    #[arg(long, env = "DINNERBELL_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "DINNERBELL_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    /// Secret for the bearer tokens that guard the device and settings endpoints.
    #[arg(long, env = "DINNERBELL_AUTH_KEY", hide_env_values = true)]
    auth_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and run the hourly job (default).
    Serve,
    /// Run the dinner suggestion job once and exit.
    RunOnce,
    /// Generate a VAPID key pair for the Web Push backend.
    Init(InitArgs),
    /// Generate a secret for --auth-key.
    AuthKey,
    /// Issue a bearer token for a household member, signed with --auth-key.
    AuthToken(AuthTokenArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

#[derive(Args, Debug)]
struct AuthTokenArgs {
    #[arg(long)]
    subject: String,
    #[arg(long, default_value_t = 365)]
    days: u64,
}

fn run_init(args: &InitArgs) -> i32 {
    let credentials = match dinnerbell::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject.as_deref() {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com", true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!(
        "DINNERBELL_VAPID_PRIVATE_KEY=\"{}\"",
        credentials.private_key
    );
    println!("DINNERBELL_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("DINNERBELL_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace DINNERBELL_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn run_auth_key() -> i32 {
    println!("{}", dinnerbell::generate_auth_key());
    0
}

fn run_auth_token(auth_key: Option<&str>, args: &AuthTokenArgs) -> i32 {
    match issue_auth_token(auth_key, args) {
        Ok(token) => {
            println!("{token}");
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            2
        }
    }
}

fn issue_auth_token(auth_key: Option<&str>, args: &AuthTokenArgs) -> Result<String, String> {
    let raw = auth_key.ok_or("auth-token needs --auth-key or DINNERBELL_AUTH_KEY")?;
    let key = dinnerbell::AuthKey::decode(raw).map_err(|err| err.to_string())?;
    key.issue_token(&args.subject, args.days)
        .map_err(|err| err.to_string())
}

fn cli_values(cli: &Cli) -> CliValues {
    CliValues {
        listen: cli.listen,
        data_dir: cli.data_dir.clone(),
        anthropic_api_key: cli.anthropic_api_key.clone(),
        fcm_service_account: cli.fcm_service_account.clone(),
        vapid_private_key: cli.vapid_private_key.clone(),
        vapid_public_key: cli.vapid_public_key.clone(),
        vapid_subject: cli.vapid_subject.clone(),
        auth_key: cli.auth_key.clone(),
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    let file = match cli.config.as_deref() {
        Some(path) => ConfigFile::load(path).map_err(|err| err.to_string())?,
        None => ConfigFile::default(),
    };
    AppConfig::resolve(file, cli_values(cli)).map_err(|err| err.to_string())
}
