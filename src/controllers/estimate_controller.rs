use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::Value;

use crate::error::EstimationError;
use crate::models::catalog::{PriceTable, ProfileSummary};
use crate::models::estimate::{
    ErrorResponse, EstimationInput, EstimationOutput, LegacyEstimate, SimpleEstimate,
    SimpleEstimateRequest,
};
use crate::shared_state::AppState;

/// POST /api/estimate
/// Quick estimate
///
/// Power, panel count, price and payback for a surface. Unknown installation
/// types are priced with the default (residential) profile.
#[utoipa::path(
    post,
    path = "/api/estimate",
    request_body = SimpleEstimateRequest,
    responses(
        (status = 200, description = "Compact estimate", body = SimpleEstimate),
        (status = 400, description = "Surface is not positive", body = ErrorResponse),
        (status = 500, description = "Internal computation error", body = ErrorResponse)
    )
)]
pub async fn post_estimate(
    State(state): State<AppState>,
    Json(req): Json<SimpleEstimateRequest>,
) -> Result<Json<SimpleEstimate>, EstimationError> {
    let estimate = state.estimator.simple_estimate(&req)?;
    Ok(Json(estimate))
}

/// POST /api/quote
/// Itemised quote
///
/// Full quote with line items, VAT and profitability. Requires a known
/// installation type and a client name.
#[utoipa::path(
    post,
    path = "/api/quote",
    request_body = EstimationInput,
    responses(
        (status = 200, description = "Itemised quote", body = EstimationOutput),
        (status = 400, description = "Invalid surface, unknown installation type or missing client name", body = ErrorResponse),
        (status = 500, description = "Internal computation error", body = ErrorResponse)
    )
)]
pub async fn post_quote(
    State(state): State<AppState>,
    Json(input): Json<EstimationInput>,
) -> Result<Json<EstimationOutput>, EstimationError> {
    let quote = state.estimator.full_quote(&input, Utc::now())?;
    tracing::info!(
        quote_id = %quote.quote_id,
        category = %quote.installation_type,
        total = quote.total,
        "quote issued"
    );
    Ok(Json(quote))
}

/// POST /api/estimation
/// Estimate for the original form
///
/// Accepts the loosely typed body of the first front-end (`surface`,
/// `type_installation`, `besoin`, optional `nom`) and answers with its
/// French keys.
#[utoipa::path(
    post,
    path = "/api/estimation",
    request_body = Value,
    responses(
        (status = 200, description = "Estimate in the original wire shape", body = LegacyEstimate),
        (status = 400, description = "Malformed body or invalid surface", body = ErrorResponse),
        (status = 500, description = "Internal computation error", body = ErrorResponse)
    )
)]
pub async fn post_legacy_estimation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<LegacyEstimate>, EstimationError> {
    let Value::Object(map) = body else {
        return Err(EstimationError::MalformedField {
            field: "body",
            reason: "expected a JSON object".to_string(),
        });
    };
    let estimate = state.estimator.legacy_estimate(&map, Utc::now())?;
    Ok(Json(estimate))
}

/// GET /api/installation-types
/// List installation types
///
/// Known categories with their headline coefficients.
#[utoipa::path(
    get,
    path = "/api/installation-types",
    responses(
        (status = 200, description = "Known installation types", body = Vec<ProfileSummary>)
    )
)]
pub async fn list_installation_types(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog().summaries()).into_response()
}

/// GET /api/price-list
/// Flat line-item prices
#[utoipa::path(
    get,
    path = "/api/price-list",
    responses(
        (status = 200, description = "Category independent line-item prices", body = PriceTable)
    )
)]
pub async fn get_price_list(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog().prices.clone()).into_response()
}
