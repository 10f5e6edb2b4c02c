use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{info, warn};

use mjs_adapter::access::TokenAccess;
use mjs_adapter::cli::{self, CliAction};
use mjs_adapter::config::load_config_from;
use mjs_adapter::logging;
use mjs_adapter::state::AppState;
use mjs_adapter::utils::HostInfo;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = match cli::parse_args() {
        CliAction::PrintVersion => {
            cli::print_version();
            return Ok(());
        }
        CliAction::InitConfig => {
            cli::init_config_file();
            return Ok(());
        }
        CliAction::RunServer { config } => config,
    };
    let cfg = load_config_from(config_path.as_deref());
    let _log_guard = logging::init(&logging::log_dir(), cfg.clean_log_on_start);

    let host = HostInfo::collect();
    if host.ram_mb == 0 {
        warn!("Unable to determine RAM size");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        os = %host.os,
        cpu = %host.cpu,
        ram = %host.ram(),
        "MJS adapter starting"
    );

    let access = TokenAccess::new(cfg.tokens.clone());
    if access.is_open() {
        warn!("No access tokens configured; control operations are open to everyone");
    }
    for name in &cfg.players_enabled {
        match cfg.owned_player(name) {
            Some(settings) => info!(player = %name, backend = %settings.url, "Serving player"),
            None => info!(player = %name, "Enabled player is not an MJS player; ignoring"),
        }
    }

    let state = AppState::with_access(cfg, std::sync::Arc::new(access));

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .ok();

    let app = mjs_adapter::app(state.clone());

    let bind_addr = (state.cfg.host.as_str(), state.cfg.port);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %format!("{}:{}", state.cfg.host, state.cfg.port), "Listening");

    tokio::select! {
        res = axum::serve(listener, app) => {
            if let Err(e) = res { tracing::error!(?e, "server error"); }
        }
        _ = shutdown_rx.recv() => { info!("Shutdown signal received"); }
    }

    Ok(())
}
