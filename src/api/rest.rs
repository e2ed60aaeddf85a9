// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. They are the backend of the dashboard
// pages: loading a dataset (upload or ticker), previewing it as charts, and
// running the technical analysis on the loaded close series.
//
// CORS is configured permissively so that a locally served dashboard can
// reach the API from another port.
// =============================================================================

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::{AppState, LoadedDataset};
use crate::charts::{build_chart, ChartError, ChartKind};
use crate::error::{IndicatorError, ValidationError};
use crate::indicators::{self, IndicatorRequest, IndicatorSeries};
use crate::market_data::{dataset_label, load_csv, UploadKind};
use crate::table::RowKey;
use crate::types::{DatasetSource, PriceField};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(serde_json::json!({
            "error": message.to_string(),
        })),
    )
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        // ── Data loading ────────────────────────────────────────────
        .route("/api/v1/datasets/upload", post(upload_dataset))
        .route("/api/v1/datasets/ticker", post(fetch_ticker_dataset))
        .route("/api/v1/dataset", get(dataset_summary))
        // ── Visualisation & analysis ────────────────────────────────
        .route("/api/v1/charts/:kind", get(chart))
        .route("/api/v1/analysis", post(analysis))
        .route("/api/v1/analysis/defaults", get(analysis_defaults))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Dataset loading
// =============================================================================

#[derive(Serialize)]
struct DatasetSummary {
    id: String,
    name: String,
    source: DatasetSource,
    rows: usize,
    columns: Vec<String>,
    first: Option<RowKey>,
    last: Option<RowKey>,
    preview: Vec<serde_json::Value>,
    warnings: Vec<String>,
}

impl DatasetSummary {
    fn new(dataset: &LoadedDataset, preview_rows: usize) -> Self {
        Self {
            id: dataset.id.clone(),
            name: dataset.name.clone(),
            source: dataset.source,
            rows: dataset.table.len(),
            columns: dataset.table.column_names(),
            first: dataset.table.index.first().copied(),
            last: dataset.table.index.last().copied(),
            preview: dataset.table.head(preview_rows),
            warnings: dataset.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

fn validation_rejection(e: ValidationError) -> ApiError {
    api_error(StatusCode::UNPROCESSABLE_ENTITY, e)
}

#[derive(Deserialize)]
struct UploadParams {
    file_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date_column: Option<String>,
}

async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    match UploadKind::from_file_name(&params.file_name) {
        UploadKind::Csv => {}
        UploadKind::Excel => {
            return Err(api_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Excel uploads are not supported. Please export the sheet as CSV.",
            ));
        }
        UploadKind::Unsupported => {
            return Err(api_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported file type. Please upload a CSV file.",
            ));
        }
    }

    let date_column = params
        .date_column
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config.read().default_date_column.clone());

    let raw = load_csv(&body, Some(date_column.as_str())).map_err(|e| {
        warn!(file = %params.file_name, error = %e, "failed to read upload");
        api_error(StatusCode::BAD_REQUEST, format!("Error loading file: {e:#}"))
    })?;

    let prepared = state.pipeline().run(raw).map_err(validation_rejection)?;
    let label = dataset_label(params.name.as_deref(), &params.file_name);
    let dataset = state.set_dataset(LoadedDataset::new(label, DatasetSource::Upload, prepared));

    let preview_rows = state.config.read().preview_rows;
    Ok((
        StatusCode::CREATED,
        Json(DatasetSummary::new(&dataset, preview_rows)),
    ))
}

#[derive(Deserialize)]
struct TickerRequest {
    ticker: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn fetch_ticker_dataset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TickerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ticker = req.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "ticker must not be empty"));
    }
    if req.end_date <= req.start_date {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "end_date must be after start_date",
        ));
    }

    let raw = state
        .provider
        .fetch_daily(&ticker, req.start_date, req.end_date)
        .await
        .map_err(|e| {
            warn!(ticker = %ticker, error = %e, "ticker fetch failed");
            api_error(
                StatusCode::BAD_GATEWAY,
                format!("Error fetching data for {ticker}: {e:#}"),
            )
        })?;

    let prepared = state.pipeline().run(raw).map_err(validation_rejection)?;
    let dataset = state.set_dataset(LoadedDataset::new(ticker, DatasetSource::Ticker, prepared));

    let preview_rows = state.config.read().preview_rows;
    Ok((
        StatusCode::CREATED,
        Json(DatasetSummary::new(&dataset, preview_rows)),
    ))
}

fn loaded_dataset(state: &AppState) -> Result<Arc<LoadedDataset>, ApiError> {
    state.current_dataset().ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "No dataset loaded. Upload a file or fetch a ticker first.",
        )
    })
}

async fn dataset_summary(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let dataset = loaded_dataset(&state)?;
    let preview_rows = state.config.read().preview_rows;
    Ok(Json(DatasetSummary::new(&dataset, preview_rows)))
}

// =============================================================================
// Charts
// =============================================================================

#[derive(Deserialize)]
struct ChartParams {
    #[serde(default)]
    field: PriceField,
}

async fn chart(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<ChartKind>,
    Query(params): Query<ChartParams>,
) -> Result<impl IntoResponse, ApiError> {
    let dataset = loaded_dataset(&state)?;
    let data = build_chart(&dataset.table, &dataset.name, kind, params.field).map_err(
        |e| match e {
            ChartError::MissingColumn(_) => api_error(StatusCode::NOT_FOUND, e),
        },
    )?;
    Ok(Json(data))
}

// =============================================================================
// Technical analysis
// =============================================================================

#[derive(Serialize)]
struct AnalysisResponse {
    dataset: String,
    request: IndicatorRequest,
    index: Vec<RowKey>,
    close: Vec<f64>,
    series: Vec<IndicatorSeries>,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IndicatorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let dataset = loaded_dataset(&state)?;

    state
        .config
        .read()
        .limits
        .check(&request)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let series = indicators::compute(&dataset.table, &request).map_err(|e| match e {
        IndicatorError::Configuration(_) => api_error(StatusCode::BAD_REQUEST, e),
        IndicatorError::NonNumericClose { .. } => api_error(StatusCode::INTERNAL_SERVER_ERROR, e),
    })?;

    info!(dataset = %dataset.name, request = ?request, "analysis computed");

    Ok(Json(AnalysisResponse {
        dataset: dataset.name.clone(),
        request,
        index: dataset.table.index.clone(),
        close: dataset.table.close.clone(),
        series,
    }))
}

async fn analysis_defaults(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.config.read();
    Json(serde_json::json!({
        "defaults": config.defaults,
        "limits": config.limits,
        "requests": config.defaults.requests(),
    }))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use crate::runtime_config::AnalyzerConfig;

    const CSV: &str = "\
Date,Open,High,Low,Close,Volume
2024-01-01,10,12,9,11,1000
2024-01-02,12,13,10,$12.50,1200
2024-01-03,11,12,9.5,10,900
";

    fn app() -> (Arc<AppState>, Router) {
        let state = Arc::new(AppState::new(AnalyzerConfig::default()).unwrap());
        (state.clone(), router(state))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn upload(uri: &str, csv: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(csv.to_string()))
            .unwrap()
    }

    fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_, app) = app();
        let (status, body) = send(&app, Request::get("/api/v1/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn upload_then_analyse() {
        let (state, app) = app();
        let (status, body) = send(
            &app,
            upload("/api/v1/datasets/upload?file_name=aapl.csv&date_column=Date", CSV),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["name"], "aapl");
        assert_eq!(body["rows"], 3);
        assert_eq!(state.current_dataset().unwrap().table.close, vec![11.0, 12.5, 10.0]);

        let (status, body) = send(
            &app,
            post_json(
                "/api/v1/analysis",
                serde_json::json!({ "type": "moving_average", "kind": "SMA", "window": 5 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["series"][0]["name"], "SMA_5");
        let values = body["series"][0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(serde_json::Value::is_null));
    }

    #[tokio::test]
    async fn upload_missing_column_is_unprocessable() {
        let (state, app) = app();
        let csv = "Date,Open,High,Close\n2024-01-01,1,2,1.5\n";
        let (status, body) = send(
            &app,
            upload("/api/v1/datasets/upload?file_name=bad.csv&date_column=Date", csv),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "missing required column(s): Low");
        assert!(state.current_dataset().is_none());
    }

    #[tokio::test]
    async fn excel_upload_is_rejected() {
        let (_, app) = app();
        let (status, _) = send(&app, upload("/api/v1/datasets/upload?file_name=a.xlsx", CSV)).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn analysis_without_dataset_is_not_found() {
        let (_, app) = app();
        let (status, _) = send(
            &app,
            post_json("/api/v1/analysis", serde_json::json!({ "type": "rsi", "period": 14 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn out_of_range_parameter_is_bad_request() {
        let (_, app) = app();
        send(&app, upload("/api/v1/datasets/upload?file_name=a.csv", CSV)).await;
        let (status, body) = send(
            &app,
            post_json("/api/v1/analysis", serde_json::json!({ "type": "rsi", "period": 500 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("period"));
    }

    #[tokio::test]
    async fn charts_follow_loaded_dataset() {
        let (_, app) = app();
        send(&app, upload("/api/v1/datasets/upload?file_name=a.csv&name=Apple", CSV)).await;

        let (status, body) = send(
            &app,
            Request::get("/api/v1/charts/line?field=High").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["title"], "Apple - High Price Over Time");

        let (status, body) = send(
            &app,
            Request::get("/api/v1/charts/volume").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["series"][0]["values"][1], 1200.0);
    }

    #[tokio::test]
    async fn defaults_include_ready_made_requests() {
        let (_, app) = app();
        let (status, body) = send(
            &app,
            Request::get("/api/v1/analysis/defaults").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["limits"]["rsi_period"]["max"], 50);
        assert_eq!(
            body["requests"][0],
            serde_json::json!({ "type": "moving_average", "kind": "SMA", "window": 20 })
        );
        assert_eq!(body["requests"][2]["long_window"], 26);
    }
}
