//! Database host server CLI binary.
//!
//! Connects to a system's database host server, reports the server job
//! backing the session, and optionally negotiates client identification
//! attributes.
//!
//! # Commands
//!
//! - `connect` - Authenticate and print the server job name
//! - `ports` - Show the well-known host server ports

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dbhost::wire::{DATABASE_PORT, DATABASE_TLS_PORT, SIGNON_PORT, SIGNON_TLS_PORT};
use dbhost::{ConnectOptions, DatabaseSession, ServerAttributes, UnknownCodePolicy, VERSION};

#[derive(Parser)]
#[command(name = "dbhost")]
#[command(version = VERSION)]
#[command(about = "Database host server client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate against a system and print the server job name
    Connect {
        /// Host name or address of the system
        system: String,

        /// User profile to sign on as
        user: String,

        /// Password; read from DBHOST_PASSWORD when omitted
        #[arg(short, long)]
        password: Option<String>,

        /// Use the TLS ports and wrap the connections in TLS
        #[arg(long)]
        tls: bool,

        /// PEM bundle of trusted root certificates
        #[arg(long)]
        ca_file: Option<PathBuf>,

        /// Accept any server certificate (lab systems only)
        #[arg(long)]
        insecure: bool,

        /// Options file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail on unrecognized start-server return codes
        #[arg(long)]
        strict: bool,

        /// Application name to register with the server job
        #[arg(long)]
        application: Option<String>,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the well-known host server ports
    Ports,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Connect {
            system,
            user,
            password,
            tls,
            ca_file,
            insecure,
            config,
            strict,
            application,
            verbose,
        } => {
            cmd_connect(
                system,
                user,
                password,
                tls,
                ca_file,
                insecure,
                config,
                strict,
                application,
                verbose,
            )
            .await
        }

        Commands::Ports => {
            println!("database: {DATABASE_PORT} (tls {DATABASE_TLS_PORT})");
            println!("signon:   {SIGNON_PORT} (tls {SIGNON_TLS_PORT})");
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_connect(
    system: String,
    user: String,
    password: Option<String>,
    tls: bool,
    ca_file: Option<PathBuf>,
    insecure: bool,
    config: Option<PathBuf>,
    strict: bool,
    application: Option<String>,
    verbose: bool,
) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "info" })
            }),
        )
        .init();

    let password = match password {
        Some(password) => password,
        None => std::env::var("DBHOST_PASSWORD")
            .map_err(|_| anyhow::anyhow!("no password given; use --password or DBHOST_PASSWORD"))?,
    };

    let mut options = match config {
        Some(path) => ConnectOptions::from_file(path)?,
        None => ConnectOptions::from_env(),
    };
    if let Some(path) = ca_file {
        options.tls.ca_file = Some(path);
    }
    if insecure {
        options.tls.accept_invalid_certs = true;
    }
    if strict {
        options.unknown_return_code = UnknownCodePolicy::Fail;
    }

    let mut session = DatabaseSession::connect(tls, &system, &user, &password, &options).await?;

    println!("system:   {}", session.system_info().system);
    println!("job:      {}", session.job_name());
    println!("user:     {}", session.user());
    println!("compress: {}", session.compression_eligible());

    if let Some(application) = application {
        let attributes = ServerAttributes {
            client_application_name: Some(application),
            client_user_identifier: Some(user.to_uppercase()),
            ..ServerAttributes::default()
        };
        session.set_server_attributes(&attributes).await?;
        println!("attributes negotiated");
    }

    session.close().await?;
    Ok(())
}
