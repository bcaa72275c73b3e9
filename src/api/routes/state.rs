use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{merge_deaths, AUTO_EXCLUSIONS};
use crate::models::{RankedPlayer, StoredLog};
use crate::storage::read_store;

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub logs: Vec<StoredLog>,
    pub exclusions: Vec<String>,
    pub auto_exclusions: Vec<&'static str>,
    pub ranking: Vec<RankedPlayer>,
}

/// Full application state: stored logs, exclusion lists, and the current
/// cumulative ranking.
pub async fn get_state(State(state): State<AppState>) -> Result<Json<StateResponse>, ApiError> {
    let store = read_store(&state.storage).map_err(|e| ApiError::Internal(e.to_string()))?;
    let ranking = merge_deaths(&store.logs, &store.exclusions);

    Ok(Json(StateResponse {
        logs: store.logs,
        exclusions: store.exclusions,
        auto_exclusions: AUTO_EXCLUSIONS.to_vec(),
        ranking,
    }))
}
