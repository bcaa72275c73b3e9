use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::merge_deaths;
use crate::fetch::{is_valid_viewer_url, normalize_viewer_url, split_bulk_urls};
use crate::models::{clean_player_name, DeathRow, RankedPlayer, StoredLog};
use crate::scrape::{extract_death_rows, extract_selected_metric};
use crate::storage::{read_store, reset_store, write_store};

const VIEWER_URL_HINT: &str =
    "Provide a valid viewer URL: https://turtlogs.com/viewer/<id>/base";

#[derive(Debug, Deserialize)]
pub struct AddLogRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct AddLogResponse {
    pub log: StoredLog,
    pub ranking: Vec<RankedPlayer>,
}

/// Fetch a viewer page and extract its death rows into a stored log.
async fn scrape_log(state: &AppState, url: &str, normalized_url: String) -> Result<StoredLog, ApiError> {
    let parsed = Url::parse(url).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let fetched = state
        .fetcher
        .fetch_fresh(&parsed)
        .await
        .map_err(|e| ApiError::Internal(format!("Fetch failed: {}", e)))?;
    let html = state
        .fetcher
        .read_cached_text(&fetched)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let rows = extract_death_rows(&html, &parsed)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let metric = extract_selected_metric(&html);

    let rows: Vec<DeathRow> = rows
        .into_iter()
        .map(|r| DeathRow {
            name: clean_player_name(&r.name),
            deaths: r.deaths,
            class_id: r.class_id,
        })
        .collect();

    Ok(StoredLog::new(url.to_string(), normalized_url, metric, rows))
}

/// Upload one log by viewer URL.
pub async fn add_log(
    State(state): State<AppState>,
    Json(req): Json<AddLogRequest>,
) -> Result<Json<AddLogResponse>, ApiError> {
    if !is_valid_viewer_url(&req.url) {
        return Err(ApiError::BadRequest(VIEWER_URL_HINT.to_string()));
    }

    let normalized_url =
        normalize_viewer_url(&req.url).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut store = read_store(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;
    if store.find_by_normalized_url(&normalized_url).is_some() {
        return Err(ApiError::Conflict(
            "This log is already uploaded.".to_string(),
        ));
    }

    let log = scrape_log(&state, &req.url, normalized_url).await?;
    info!("Stored log {} with {} players", log.id, log.total);

    store.logs.push(log.clone());
    write_store(&state.storage, &store).map_err(|e| ApiError::Internal(e.to_string()))?;

    let ranking = merge_deaths(&store.logs, &store.exclusions);
    Ok(Json(AddLogResponse { log, ranking }))
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub urls: BulkUrls,
}

/// Bulk input: either a list of URLs or one blob to split.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BulkUrls {
    List(Vec<String>),
    Text(String),
}

impl BulkUrls {
    fn into_urls(self) -> Vec<String> {
        match self {
            BulkUrls::List(urls) => urls,
            BulkUrls::Text(blob) => split_bulk_urls(&blob),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkItemResult {
    pub url: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub results: Vec<BulkItemResult>,
    pub ranking: Vec<RankedPlayer>,
    pub logs: Vec<StoredLog>,
}

/// Upload several logs in one request. Failures are reported per URL; the
/// store is written once at the end.
pub async fn add_logs_bulk(
    State(state): State<AppState>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkResponse>, ApiError> {
    let urls = req.urls.into_urls();
    if urls.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide one or more viewer URLs.".to_string(),
        ));
    }

    let mut store = read_store(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;
    let mut results = Vec::with_capacity(urls.len());

    for url in urls {
        if !is_valid_viewer_url(&url) {
            results.push(BulkItemResult {
                url,
                ok: false,
                log_id: None,
                players: None,
                error: Some("Invalid viewer URL".to_string()),
            });
            continue;
        }

        let normalized_url = match normalize_viewer_url(&url) {
            Ok(n) => n,
            Err(e) => {
                results.push(BulkItemResult {
                    url,
                    ok: false,
                    log_id: None,
                    players: None,
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        if store.find_by_normalized_url(&normalized_url).is_some() {
            results.push(BulkItemResult {
                url,
                ok: false,
                log_id: None,
                players: None,
                error: Some("Already uploaded".to_string()),
            });
            continue;
        }

        match scrape_log(&state, &url, normalized_url).await {
            Ok(log) => {
                results.push(BulkItemResult {
                    url,
                    ok: true,
                    log_id: Some(log.id),
                    players: Some(log.total),
                    error: None,
                });
                store.logs.push(log);
            }
            Err(e) => {
                warn!("Bulk upload failed for {}: {}", url, e);
                results.push(BulkItemResult {
                    url,
                    ok: false,
                    log_id: None,
                    players: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    write_store(&state.storage, &store).map_err(|e| ApiError::Internal(e.to_string()))?;

    let ranking = merge_deaths(&store.logs, &store.exclusions);
    Ok(Json(BulkResponse {
        results,
        ranking,
        logs: store.logs,
    }))
}

#[derive(Debug, Serialize)]
pub struct DeleteLogResponse {
    pub logs: Vec<StoredLog>,
    pub ranking: Vec<RankedPlayer>,
}

/// Remove a stored log by id.
pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteLogResponse>, ApiError> {
    let id: Uuid = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid log id: {}", id)))?;

    let mut store = read_store(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;
    let before = store.logs.len();
    store.logs.retain(|l| l.id != id);
    if store.logs.len() == before {
        return Err(ApiError::NotFound("Log not found.".to_string()));
    }

    write_store(&state.storage, &store).map_err(|e| ApiError::Internal(e.to_string()))?;

    let ranking = merge_deaths(&store.logs, &store.exclusions);
    Ok(Json(DeleteLogResponse {
        logs: store.logs,
        ranking,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub logs: Vec<StoredLog>,
    pub exclusions: Vec<String>,
    pub ranking: Vec<RankedPlayer>,
}

/// Clear every stored log and user exclusion.
pub async fn reset_db(State(state): State<AppState>) -> Result<Json<ResetResponse>, ApiError> {
    reset_store(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(ResetResponse {
        logs: Vec::new(),
        exclusions: Vec::new(),
        ranking: Vec::new(),
    }))
}
