use dynconn::config;
use dynconn::core::{ConnectionParameters, DynamicConnection, Result};
use dynconn::repl;
use dynconn::session::{DynamicSession, EntitySession};
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    info!("Starting dynconn...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments: a config file, a DSN, or nothing
    let args: Vec<String> = std::env::args().collect();
    let (config, connection) = match args.get(1) {
        Some(arg) if arg.contains("://") => {
            let params = ConnectionParameters::from_url(arg)?;
            (None, DynamicConnection::from_params(params)?)
        }
        Some(path) => {
            let config = config::load_config(path)?;
            let connection = config.open_connection()?;
            (Some(config), connection)
        }
        None => match config::default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                let config = config::load_config(path)?;
                let connection = config.open_connection()?;
                (Some(config), connection)
            }
            None => {
                println!("No configuration provided. Using an in-memory SQLite database.");
                let params = ConnectionParameters::from_url("sqlite://:memory:")?;
                (None, DynamicConnection::from_params(params)?)
            }
        },
    };

    let mut session = DynamicSession::new(EntitySession::new(connection));
    let stdin = io::stdin();
    repl::run_repl(&mut session, config.as_ref(), stdin.lock(), io::stdout())
}
