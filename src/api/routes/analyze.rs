use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::calculate::{aggregate, score_specs, AggregateOptions};
use crate::models::{resolve_rows, Aggregation, Metric, RawRow, ScoreOptions, ScoredSpec};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Raw leaderboard rows, as produced by scraping.
    pub rows: Vec<RawRow>,

    /// Target percentile in `(0, 1]`; defaults to 1.0 (full sample).
    pub percentile: Option<f64>,

    pub metric: Option<Metric>,
    pub lower_is_better: Option<bool>,
    pub w_pop: Option<f64>,
    pub w_med: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub aggregation: Aggregation,
    pub ranking: Vec<ScoredSpec>,
}

/// Aggregate and score a batch of rows.
///
/// The rows are already-materialized input from the client; no page access
/// happens here.
pub async fn analyze(
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let percentile = req.percentile.unwrap_or(1.0);
    if !(percentile > 0.0 && percentile <= 1.0) {
        return Err(ApiError::BadRequest(format!(
            "percentile must be in (0, 1], got {}",
            percentile
        )));
    }

    let defaults = ScoreOptions::default();
    let opts = ScoreOptions {
        metric: req.metric.unwrap_or(defaults.metric),
        lower_is_better: req.lower_is_better.unwrap_or(defaults.lower_is_better),
        w_pop: req.w_pop.unwrap_or(defaults.w_pop),
        w_med: req.w_med.unwrap_or(defaults.w_med),
    };
    if opts.w_pop < 0.0 || opts.w_med < 0.0 {
        return Err(ApiError::BadRequest(
            "weights must be non-negative".to_string(),
        ));
    }

    let rows = resolve_rows(req.rows);
    let aggregation = aggregate(&rows, AggregateOptions { percentile });
    let ranking = score_specs(&aggregation.spec_stats, opts);

    Ok(Json(AnalyzeResponse {
        aggregation,
        ranking,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpecIcon;

    fn request(percentile: Option<f64>) -> AnalyzeRequest {
        AnalyzeRequest {
            rows: vec![RawRow {
                rank: Some(1),
                name: "A".to_string(),
                value: 100.0,
                icons: vec![SpecIcon {
                    class_id: 1,
                    spec_id: 1,
                    icon_url: None,
                }],
            }],
            percentile,
            metric: None,
            lower_is_better: None,
            w_pop: None,
            w_med: None,
        }
    }

    #[tokio::test]
    async fn test_analyze_defaults() {
        let resp = analyze(Json(request(None))).await.unwrap();
        assert_eq!(resp.0.aggregation.total, 1);
        assert_eq!(resp.0.ranking.len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_percentile() {
        assert!(analyze(Json(request(Some(0.0)))).await.is_err());
        assert!(analyze(Json(request(Some(1.5)))).await.is_err());
    }

    #[tokio::test]
    async fn test_analyze_rejects_negative_weights() {
        let mut req = request(None);
        req.w_pop = Some(-1.0);
        assert!(analyze(Json(req)).await.is_err());
    }

    #[tokio::test]
    async fn test_analyze_request_deserializes() {
        let json = r#"{
            "rows": [
                {"rank": 1, "name": "A", "value": 100.0,
                 "icons": [{"class_id": 1, "spec_id": 2}]}
            ],
            "percentile": 0.75,
            "metric": "median",
            "lower_is_better": true
        }"#;
        let req: AnalyzeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.metric, Some(Metric::Median));
        assert_eq!(req.lower_is_better, Some(true));

        let resp = analyze(Json(req)).await.unwrap();
        assert_eq!(resp.0.ranking.len(), 1);
    }
}
