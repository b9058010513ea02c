use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use super::handlers::{albums, artists, artwork, downloadhistory, genres, player, playlists, queue, radio, root, scanner, search, tracks};
use super::{ws, AppState};

/// Wires the full route table (§6): every handler, CORS allowing any
/// origin, and gzip response compression when the client sends
/// `Accept-Encoding: gzip`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(root::get_snapshot))
        .route("/albums/", get(albums::list_albums))
        .route("/albums/{id}", get(albums::get_album).put(albums::update_album))
        .route("/artists/{name}", get(artists::get_artist_albums))
        .route("/artwork/{id}", get(artwork::get_artwork))
        .route("/artworkinfo/{id}", get(artwork::get_artwork_info))
        .route("/downloadhistory", get(downloadhistory::get_download_history))
        .route("/genres/", get(genres::list_genres))
        .route("/genres/{id}", get(genres::get_genre))
        .route("/mp3/{id}", get(tracks::get_mp3))
        .route("/player/play", post(player::play))
        .route("/player/pause", post(player::pause))
        .route("/player/resume", post(player::resume))
        .route("/player/stop", post(player::stop))
        .route("/player/next", post(player::next))
        .route("/player/previous", post(player::previous))
        .route("/player/volume", get(player::get_volume).post(player::set_volume))
        .route("/playlists/", get(playlists::list_playlists).post(playlists::add_playlist))
        .route("/playlists/{id}", get(playlists::get_playlist).put(playlists::update_playlist).delete(playlists::delete_playlist))
        .route(
            "/queue/",
            get(queue::get_queue).delete(queue::delete_queue_item).put(queue::put_queue).options(queue::queue_options),
        )
        .route(
            "/radio/",
            get(radio::list_radio_stations).post(radio::add_radio_station).put(radio::reorder_radio_stations).options(radio::radio_stations_options),
        )
        .route("/radio/{id}", get(radio::get_radio_station).put(radio::update_radio_station).delete(radio::delete_radio_station))
        .route("/scanner/scan", post(scanner::start_scan))
        .route("/scanner/tidy", post(scanner::start_tidy))
        .route("/search/{q}", get(search::search))
        .route("/tracks/", get(tracks::list_tracks))
        .route("/tracks/{id}", get(tracks::get_track))
        .route("/ws", get(ws::ws_handler))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
