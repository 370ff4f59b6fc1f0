use actix_web::{
    App, HttpServer,
    middleware::{Condition, Logger},
};
use anyhow::{Context, Result};
use clap::Parser;
use dirgate::{AppState, ServerConfig, auth::session_middleware, configure};

mod cli;

#[inline]
fn logger(config: &ServerConfig) -> Logger {
    Logger::default().log_level(
        config
            .logging
            .log_level
            .clone()
            .map(|l| l.0)
            .unwrap_or(log::Level::Info),
    )
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .format_target(false)
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("dirgate"), log::LevelFilter::Info)
        .filter(
            Some("actix_web::middleware::logger"),
            log::LevelFilter::Info,
        )
        .parse_env("DIRGATE_LOG")
        .init();

    let cli = dirgate_cli::Cli::parse();
    let open_browser = cli.open;
    let config = cli::build_config(cli)?;
    let state = AppState::from_config(&config)?;

    // one key for every worker, otherwise workers reject each other's cookies
    let key = config
        .session
        .key_source()
        .key()
        .context("invalid session key")?;
    log::info!("serving directory {:?}", state.root.path());

    let sconfig = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(session_middleware(key.clone(), &sconfig.session))
            .wrap(Condition::new(!sconfig.logging.disable, logger(&sconfig)))
            .configure(configure(state.clone()))
    });

    let addr = config.listen.address();
    log::info!("spawning listener {addr:?}");
    let server = server
        .bind(addr.clone())
        .with_context(|| format!("failed to bind {addr:?}"))?;

    if open_browser {
        let host = match config.listen.host() {
            "0.0.0.0" | "::" => "localhost",
            host => host,
        };
        let _ = open::that(format!("http://{host}:{}", addr.1))
            .inspect_err(|err| log::error!("failed to open browser: {err:?}"));
    }

    log::info!("server listening and ready!");
    server.run().await.context("server spawn failed")
}
