//! Service entry point: CLI args, logging, config, connection pool,
//! layer registry, and the HTTP listener with graceful shutdown.
//!
//! Startup sequencing and the 5-second graceful drain mirror
//! `original_source/cmd/gravad/main.go` and `original_source/web/server.go`'s
//! `Run()`.

use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tilekiln::builder::Builder;
use tilekiln::cache::{Cache, Memory, Noop};
use tilekiln::config::{Config, LoggingCfg};
use tilekiln::db;
use tilekiln::error::Error;
use tilekiln::registry::Registry;
use tilekiln::service::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "tilekiln", about = "dynamic Mapbox Vector Tile server over PostGIS")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Overrides server.port from the configuration file.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    init_logging(&config.logging);

    info!("starting tilekiln, config={}", cli.config.display());

    let pool = db::connect(&config.postgres)?;
    let registry = Registry::build(&pool, &config.schema, &config.sources)?;
    let builder = Builder::new(pool, registry);

    let cache: Arc<dyn Cache> = match config.cache.r#type.as_str() {
        "memory" => Arc::new(Memory::new(config.cache.limit.unwrap_or(0))),
        _ => Arc::new(Noop),
    };

    let state = Arc::new(AppState {
        builder,
        cache,
        fonts_dir: PathBuf::from(&config.fonts_dir),
        service_id: "tilekiln".to_string(),
    });

    let port = cli.port.unwrap_or_else(|| config.port());
    let router = build_router(state, config.server.cors);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| Error::Config(format!("binding port {port}: {e}")))?;
    info!("listening on port {port}");

    serve_with_graceful_shutdown(listener, router).await
}

async fn serve_with_graceful_shutdown(
    listener: tokio::net::TcpListener,
    router: axum::Router,
) -> Result<(), Error> {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown_fut = async move {
        let _ = rx.await;
    };

    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown_fut);
    let handle = tokio::spawn(server);

    wait_for_term_signal().await;
    info!("shutdown signal received, draining for up to 5s");
    let _ = tx.send(());

    match tokio::time::timeout(Duration::from_secs(5), handle).await {
        Ok(Ok(Ok(()))) => info!("shutdown complete"),
        Ok(Ok(Err(e))) => warn!("server error during shutdown: {e}"),
        Ok(Err(e)) => warn!("server task panicked during shutdown: {e}"),
        Err(_) => warn!("graceful shutdown timed out after 5s"),
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_term_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    let mut sigquit = signal(SignalKind::quit()).expect("install SIGQUIT handler");
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
        _ = sigquit.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_term_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_logging(cfg: &LoggingCfg) {
    let level = cfg.level.as_deref().unwrap_or("info");
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level);
    if cfg.json {
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                r#"{{"level":"{}","target":"{}","message":"{}"}}"#,
                record.level(),
                record.target(),
                record.args()
            )
        });
    }
    builder.init();
}
