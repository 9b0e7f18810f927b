use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use time::OffsetDateTime;

use moves2gpx::auth::{self, TerminalPrompter, TokenState};
use moves2gpx::cli::Cli;
use moves2gpx::client::ReqwestMovesClient;
use moves2gpx::config::{self, IniConfigStore};
use moves2gpx::extract::{self, DateRange};

const NO_CONFIG: &str = "
No config file was found. We'll make one for you.
";

const MISSING_CREDENTIALS: &str = "
The config file is missing either the client ID or the client secret, so we
can't do anything yet. Register an app with Moves to get those, set them in
the config file, and then run this again.
";

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,moves2gpx=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let args = Cli::parse();
    let store = IniConfigStore::new(&args.config);
    let (mut config, created) = config::load_or_create(&store)
        .wrap_err_with(|| format!("Failed to load config from {}", store.path().display()))?;
    if created {
        println!("{NO_CONFIG}");
    }

    let api = ReqwestMovesClient::new(&args.api_base_url).wrap_err("Failed to build HTTP client")?;

    let access_token = match auth::ensure_access_token(&mut config, &store, &api, &TerminalPrompter)
        .wrap_err("Failed to obtain an access token")?
    {
        TokenState::Ready(token) => token,
        TokenState::MissingCredentials => {
            println!("{MISSING_CREDENTIALS}");
            return Ok(());
        }
        TokenState::Aborted => {
            println!("Authorization cancelled, no access token was saved.");
            return Ok(());
        }
    };

    let today = OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date();
    let range = DateRange::new(args.start.unwrap_or(today), args.end.unwrap_or(today));

    extract::export(
        &api,
        &access_token,
        &range,
        Duration::from_secs(args.wait),
        &args.output,
        &args.track_name,
    )
    .wrap_err("Failed to export storylines")?;

    println!("GPX saved to {}", args.output.display());
    Ok(())
}
