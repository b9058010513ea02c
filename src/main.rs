mod cli;
mod domain;
mod player;
mod repository;
mod services;
mod utils;
mod web;

use std::sync::Arc;

use clap::Parser;

use cli::Cli;
use player::file_player::{ExtensionDispatchDecoder, FilePlayer, NullFileDecoder};
use player::poller::Poller;
use player::stream_player::{FfplayDecoder, StreamPlayer};
use player::PlayerCoordinator;
use services::download::{DownloadHistory, DownloadRegistry, YtDlpFetcher};
use services::worker;
use utils::config;
use utils::db::Database;
use web::routes::create_router;
use web::ws::WsPeers;
use web::AppState;

const DOWNLOAD_HISTORY_CAPACITY: usize = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::init_from_path(path)?,
        None => config::get_config()?,
    };

    let database = Database::open(&cli.database).await?;
    let pool = database.pool().clone();

    let ws_peers = Arc::new(WsPeers::new());
    let registry = Arc::new(DownloadRegistry::new());
    let history = Arc::new(DownloadHistory::with_capacity(DOWNLOAD_HISTORY_CAPACITY));

    // `PlayerCoordinator` needs a `WorkerHandle` to enqueue youtube-dl jobs,
    // and the worker's status-change callback needs to reach the
    // coordinator to build a snapshot — each needs a handle to the other
    // before either exists. Both sides read through a `OnceCell` that's
    // populated once the real values are constructed below.
    let coordinator_cell: Arc<tokio::sync::OnceCell<Arc<PlayerCoordinator>>> = Arc::new(tokio::sync::OnceCell::new());
    let worker_cell: Arc<tokio::sync::OnceCell<worker::WorkerHandle>> = Arc::new(tokio::sync::OnceCell::new());

    let notifier = {
        let coordinator_cell = coordinator_cell.clone();
        let worker_cell = worker_cell.clone();
        let ws_peers = ws_peers.clone();
        move || {
            let coordinator_cell = coordinator_cell.clone();
            let worker_cell = worker_cell.clone();
            let ws_peers = ws_peers.clone();
            tokio::spawn(async move {
                let (Some(coordinator), Some(worker)) = (coordinator_cell.get(), worker_cell.get()) else {
                    return;
                };
                match coordinator.snapshot(worker).await {
                    Ok(snapshot) => match serde_json::to_string(&snapshot) {
                        Ok(text) => ws_peers.broadcast(text),
                        Err(err) => log::error!("failed to serialize snapshot: {err}"),
                    },
                    Err(err) => log::error!("failed to build snapshot: {err}"),
                }
            });
        }
    };

    let worker_handle = worker::spawn(pool.clone(), Arc::new(YtDlpFetcher), registry.clone(), history.clone(), notifier.clone());
    worker_cell.set(worker_handle.clone()).expect("worker cell set exactly once at startup");

    let file_player = FilePlayer::new(
        ExtensionDispatchDecoder { mp3: Arc::new(NullFileDecoder), other: Arc::new(NullFileDecoder) },
        {
            let coordinator_cell = coordinator_cell.clone();
            move || {
                let coordinator_cell = coordinator_cell.clone();
                tokio::spawn(async move {
                    if let Some(coordinator) = coordinator_cell.get() {
                        if let Err(err) = coordinator.next().await {
                            log::error!("auto-advance failed: {err}");
                        }
                    }
                });
            }
        },
        notifier.clone(),
    );

    let stream_player = StreamPlayer::new(Arc::new(FfplayDecoder::new(None)), Poller::new(), notifier.clone());

    let coordinator = PlayerCoordinator::new(pool.clone(), file_player, stream_player, registry.clone(), worker_handle.clone(), config.download_dir.clone());
    coordinator_cell.set(coordinator.clone()).expect("coordinator cell set exactly once at startup");

    let state = AppState { pool, coordinator, worker: worker_handle, registry, history, ws_peers };

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
    log::info!("piju listening on 0.0.0.0:5000 as \"{}\"", config.server_name);
    axum::serve(listener, router).await?;

    Ok(())
}
