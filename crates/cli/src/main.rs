use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use bitbucket_admin::{BitbucketCli, Session, TerminalPrompter};
use bitbucket_admin_api::error::ApiError;
use bitbucket_admin_api::token::client_credentials_token;
use bitbucket_admin_api::{ClientConfig, Gateway};
use bitbucket_admin_auth::{Credentials, TokenSource};
use bitbucket_admin_config::Config;
use bitbucket_admin_output::Console;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "bitbucket-admin",
    version,
    about = "Interactive Bitbucket Cloud administration",
    long_about = None
)]
struct Cli {
    /// Path to config file (defaults to ~/.bitbucket-admin/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append log records to this file instead of the configured one
    #[arg(long, env = "BITBUCKET_ADMIN_LOG")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    debug: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref())?;

    let log_file = cli.log_file.clone().unwrap_or_else(|| config.log_file.clone());
    init_tracing(&log_file, cli.debug)?;

    let credentials = Credentials::load(config.credentials_file.as_deref())?;
    let access_token = match &credentials.token {
        TokenSource::AccessToken(token) => token.clone(),
        TokenSource::ClientCredentials {
            client_id,
            client_secret,
        } => client_credentials_token(&config.token_url, client_id, client_secret)
            .await
            .context("Unable to obtain an access token")?,
    };

    let mut console = Console::stdout(!cli.no_color);
    let reporter = console.clone();
    let gateway = Gateway::connect(&ClientConfig {
        base_url: config.api_url.clone(),
        access_token,
        app_password: credentials.app_password.clone(),
        timeout: config.request_timeout(),
    })?
    .with_failure_reporter(Arc::new(move |message: &str| {
        if let Err(err) = reporter.warn(message) {
            error!(error = %err, "Unable to write to the console");
        }
    }));

    let mut prompter = TerminalPrompter::new();
    let outcome = {
        let mut session = Session::new(&mut prompter, &mut console);
        BitbucketCli::new(gateway).run(&mut session).await
    };

    if let Err(err) = outcome {
        error!(error = %format!("{err:#}"), "Session ended with an error");
        console.error(format!("{err:#}"))?;
        if let Some(hint) = err.downcast_ref::<ApiError>().and_then(ApiError::suggestion) {
            console.line(format!("Hint: {hint}"))?;
        }
        std::process::exit(1);
    }

    info!("Session finished");
    Ok(())
}

fn init_tracing(log_file: &Path, debug: bool) -> Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Unable to open log file {}", log_file.display()))?;

    let default = if debug {
        "info,bitbucket_admin=debug,bitbucket_admin_api=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(LocalTime)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}
