use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    CoreError, DistributionSummary, EcdfPoint, HistoricalTable, OutcomeSample, PlanParameters,
    SuggestedRange, TableConfig, compute_full_distribution, compute_recent_distribution,
    ecdf_points, percentile, probability_at_or_below, suggested_range, summarize,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");
const EMBEDDED_TABLE: &str = include_str!("../../data/cpi_end_val.csv");

#[derive(Parser, Debug)]
#[command(
    name = "annuity",
    about = "Historical CPI-indexed income explorer (windowed scenarios + empirical distributions)"
)]
struct Cli {
    #[arg(long, default_value_t = 30, help = "Plan length in years")]
    years: u32,
    #[arg(
        long,
        default_value_t = 10_000.0,
        help = "Annual withdrawal amount in nominal dollars"
    )]
    income_amount: f64,
    #[arg(
        long,
        default_value_t = 5,
        help = "Trailing years used for the recent-outcome distribution"
    )]
    lookback_years: u32,
    #[arg(
        long,
        help = "Report the fraction of scenarios with a full-window outcome at or below this value"
    )]
    threshold: Option<f64>,
    #[arg(
        long,
        help = "Report the fraction of scenarios with a recent-window outcome at or below this value"
    )]
    recent_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QueryPayload {
    years: Option<u32>,
    income_amount: Option<f64>,
    lookback_years: Option<u32>,
    threshold: Option<f64>,
    recent_threshold: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    years: u32,
    income_amount: f64,
    lookback_years: u32,
    threshold: Option<f64>,
    recent_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DistributionBlock {
    summary: DistributionSummary,
    p10: f64,
    p90: f64,
    suggested_range: SuggestedRange,
    threshold: Option<f64>,
    fraction_at_or_below: Option<f64>,
    ecdf: Vec<EcdfPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    years: u32,
    income_amount: f64,
    lookback_years: u32,
    valid_scenarios: usize,
    full: DistributionBlock,
    recent: DistributionBlock,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

struct AppState {
    table: HistoricalTable,
    config: TableConfig,
}

fn default_cli_for_api() -> Cli {
    Cli {
        years: 30,
        income_amount: 10_000.0,
        lookback_years: 5,
        threshold: None,
        recent_threshold: None,
    }
}

fn api_request_from_payload(payload: QueryPayload) -> ApiRequest {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.income_amount {
        cli.income_amount = v;
    }
    if let Some(v) = payload.lookback_years {
        cli.lookback_years = v;
    }
    if let Some(v) = payload.threshold {
        cli.threshold = Some(v);
    }
    if let Some(v) = payload.recent_threshold {
        cli.recent_threshold = Some(v);
    }

    ApiRequest {
        years: cli.years,
        income_amount: cli.income_amount,
        lookback_years: cli.lookback_years,
        threshold: cli.threshold,
        recent_threshold: cli.recent_threshold,
    }
}

fn build_query_response(
    table: &HistoricalTable,
    config: TableConfig,
    request: &ApiRequest,
) -> Result<QueryResponse, CoreError> {
    let max_years = u32::try_from(table.cols()).unwrap_or(u32::MAX);
    let params = PlanParameters::new(
        request.years,
        request.income_amount,
        request.lookback_years,
        max_years,
    )?;

    let full = compute_full_distribution(table, config, &params)?;
    let recent = compute_recent_distribution(table, config, &params)?;

    Ok(QueryResponse {
        years: params.years,
        income_amount: params.income_amount,
        lookback_years: params.lookback_years,
        valid_scenarios: full.len(),
        full: build_distribution_block(&full, request.threshold)?,
        recent: build_distribution_block(&recent, request.recent_threshold)?,
    })
}

fn build_distribution_block(
    sample: &OutcomeSample,
    threshold: Option<f64>,
) -> Result<DistributionBlock, CoreError> {
    let fraction = threshold
        .map(|t| probability_at_or_below(sample, t))
        .transpose()?;

    Ok(DistributionBlock {
        summary: summarize(sample)?,
        p10: percentile(sample, 10.0)?,
        p90: percentile(sample, 90.0)?,
        suggested_range: suggested_range(sample)?,
        threshold,
        fraction_at_or_below: fraction,
        ecdf: ecdf_points(sample),
    })
}

fn load_state() -> Result<AppState, String> {
    match env::var("ANNUITY_TABLE") {
        Ok(path) => {
            let text =
                fs::read_to_string(&path).map_err(|e| format!("failed to read {path}: {e}"))?;
            let table = HistoricalTable::from_csv(&text).map_err(|e| e.to_string())?;
            let config = TableConfig::for_table(&table, TableConfig::default().row_offset)
                .map_err(|e| e.to_string())?;
            println!(
                "Loaded historical table from {path}: {} rows x {} cols",
                table.rows(),
                table.cols()
            );
            Ok(AppState { table, config })
        }
        Err(_) => {
            let table = HistoricalTable::from_csv(EMBEDDED_TABLE).map_err(|e| e.to_string())?;
            let config = TableConfig::default();
            config.validate(&table).map_err(|e| e.to_string())?;
            Ok(AppState { table, config })
        }
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let state = Arc::new(load_state().map_err(std::io::Error::other)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/query", get(query_get_handler).post(query_post_handler))
        .fallback(not_found_handler)
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    println!("Annuity HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn query_get_handler(
    State(state): State<Arc<AppState>>,
    Query(payload): Query<QueryPayload>,
) -> Response {
    query_handler_impl(&state, payload)
}

async fn query_post_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryPayload>,
) -> Response {
    query_handler_impl(&state, payload)
}

fn query_handler_impl(state: &AppState, payload: QueryPayload) -> Response {
    let request = api_request_from_payload(payload);
    match build_query_response(&state.table, state.config, &request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => error_response(core_error_status(&err), &err.to_string()),
    }
}

fn core_error_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        // In-range inputs whose combination leaves no historical data.
        CoreError::EmptyWindow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::EmptySample | CoreError::ConfigMismatch { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
