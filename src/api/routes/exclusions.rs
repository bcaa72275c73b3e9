use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{is_auto_excluded, merge_deaths, AUTO_EXCLUSIONS};
use crate::models::{clean_player_name, RankedPlayer};
use crate::storage::{read_store, write_store};

#[derive(Debug, Deserialize)]
pub struct AddExclusionRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ExclusionsResponse {
    pub exclusions: Vec<String>,
    pub auto_exclusions: Vec<&'static str>,
    pub ranking: Vec<RankedPlayer>,
}

/// Add a user exclusion.
///
/// Names already covered by the built-in list are accepted as a no-op so
/// the client never has to special-case them.
pub async fn add_exclusion(
    State(state): State<AppState>,
    Json(req): Json<AddExclusionRequest>,
) -> Result<Json<ExclusionsResponse>, ApiError> {
    let name = clean_player_name(&req.name);
    if name.is_empty() {
        return Err(ApiError::BadRequest("Provide a player name.".to_string()));
    }

    let mut store = read_store(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;

    if !is_auto_excluded(&name) && !store.has_exclusion(&name) {
        info!("Excluding player: {}", name);
        store.exclusions.push(name);
        write_store(&state.storage, &store).map_err(|e| ApiError::Internal(e.to_string()))?;
    }

    let ranking = merge_deaths(&store.logs, &store.exclusions);
    Ok(Json(ExclusionsResponse {
        exclusions: store.exclusions,
        auto_exclusions: AUTO_EXCLUSIONS.to_vec(),
        ranking,
    }))
}

/// Remove a user exclusion by name (case-insensitive).
///
/// Built-in exclusions are not removable; removing one is a silent no-op.
pub async fn remove_exclusion(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ExclusionsResponse>, ApiError> {
    let target = name.trim().to_lowercase();

    let mut store = read_store(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;
    store
        .exclusions
        .retain(|x| x.trim().to_lowercase() != target);
    write_store(&state.storage, &store).map_err(|e| ApiError::Internal(e.to_string()))?;

    let ranking = merge_deaths(&store.logs, &store.exclusions);
    Ok(Json(ExclusionsResponse {
        exclusions: store.exclusions,
        auto_exclusions: AUTO_EXCLUSIONS.to_vec(),
        ranking,
    }))
}
