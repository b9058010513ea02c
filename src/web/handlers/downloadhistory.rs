use axum::extract::State;
use axum::Json;

use crate::web::dto::json_download;
use crate::web::AppState;

/// `GET /downloadhistory` (§6) — every youtube-dl URL fetched this run,
/// keyed by source URL, grounded on `routes.py:download_history`.
pub async fn get_download_history(State(state): State<AppState>) -> Json<serde_json::Value> {
    let entries = state.history.entries();
    let body: Vec<_> = entries
        .into_iter()
        .map(|(url, downloads)| {
            serde_json::json!({
                "url": url,
                "files": downloads.iter().map(json_download).collect::<Vec<_>>(),
            })
        })
        .collect();
    Json(serde_json::json!(body))
}
