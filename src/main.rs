use anyhow::{Context, Result};
use std::path::PathBuf;

use ago::api::{self, AppState};
use ago::config::Config;
use ago::db::Database;
use ago::logging;

fn parse_args() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("ago {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config_path
}

fn print_help() {
    println!(
        r#"ago - image gallery server with tag filters and smart albums

USAGE:
    ago [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    AGO_CONFIG          Path to config file (overrides default location)
    AGO_LOG             Log filter (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/ago/config.toml"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = parse_args();

    // journald under systemd, stderr plus a daily file otherwise
    if let Err(e) = logging::init(Config::config_dir().join("logs")) {
        eprintln!("Logging disabled: {e:#}");
    }

    let config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    // Schema is created once here; requests open their own connections
    Database::open(&config.db_path)
        .and_then(|db| db.initialize())
        .with_context(|| format!("initializing database {}", config.db_path.display()))?;

    let bind = config.server.bind.clone();
    let app = api::router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!("Listening on http://{}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}
