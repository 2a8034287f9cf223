use std::{net::SocketAddr, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::server;

mod check;

#[derive(Parser)]
#[clap(version, about = "Validate and serve double-entry journal entries.")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// DSN to tell Sentry where to send events.
    ///
    /// If provided, errors will be sent to Sentry.
    #[clap(long = "sentry-dsn", env = "SENTRY_DSN")]
    sentry_dsn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge the journal entry in a JSON file without saving it.
    Check(CheckArgs),
    /// Run the HTTP API.
    Serve(ServeOpts),
}

#[derive(Args)]
struct CheckArgs {
    /// Path to a JSON file holding a single journal entry.
    file: PathBuf,

    /// Print the judgment as JSON instead of text.
    #[clap(long)]
    json: bool,
}

impl From<CheckArgs> for check::CheckOpts {
    fn from(args: CheckArgs) -> Self {
        Self {
            json: args.json,
            path: args.file,
        }
    }
}

#[derive(Args)]
struct ServeOpts {
    /// Origin allowed to make cross-origin requests. May be repeated.
    ///
    /// If no origins are given, the origin of each request is allowed.
    #[clap(
        long = "allowed-origin",
        env = "ALLOWED_ORIGINS",
        use_value_delimiter = true,
        value_delimiter = ','
    )]
    allowed_origins: Vec<String>,

    /// Address to listen for HTTP requests on.
    #[clap(
        long = "listen-address",
        default_value = "0.0.0.0:8000",
        env = "LISTEN_ADDRESS"
    )]
    listen_address: SocketAddr,

    /// Create a demo tenant with an opening entry on startup.
    #[clap(long = "seed-demo-tenant")]
    seed_demo_tenant: bool,
}

impl From<ServeOpts> for server::Options {
    fn from(opts: ServeOpts) -> Self {
        Self {
            allowed_origins: opts.allowed_origins,
            listen_address: opts.listen_address,
            seed_demo_tenant: opts.seed_demo_tenant,
        }
    }
}

pub async fn run_with_sys_args() -> anyhow::Result<()> {
    use tracing_subscriber::prelude::*;

    let cli = Cli::parse();

    let sentry_config = cli.sentry_dsn.map(|dsn| {
        debug!("Enabled sentry.");

        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let sentry_tracing_layer = if sentry_config.is_some() {
        Some(sentry_tracing::layer())
    } else {
        None
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(sentry_tracing_layer)
        .init();

    match cli.command {
        Commands::Check(args) => {
            if check::run(args.into()).await? {
                Ok(())
            } else {
                anyhow::bail!("The journal entry cannot be posted.")
            }
        }
        Commands::Serve(opts) => server::serve(opts.into()).await,
    }
}
