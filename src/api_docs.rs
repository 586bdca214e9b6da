use utoipa::OpenApi;
use crate::controllers::estimate_controller;
use crate::models::{catalog, estimate};

#[derive(OpenApi)]
#[openapi(
    paths(
        estimate_controller::post_estimate,
        estimate_controller::post_quote,
        estimate_controller::post_legacy_estimation,
        estimate_controller::list_installation_types,
        estimate_controller::get_price_list
    ),
    components(
        schemas(
            estimate::SimpleEstimateRequest,
            estimate::SimpleEstimate,
            estimate::EstimationInput,
            estimate::ClientInfo,
            estimate::EstimationOutput,
            estimate::LineItem,
            estimate::LegacyEstimate,
            estimate::ErrorResponse,
            catalog::ProfileSummary,
            catalog::PriceTable
        )
    ),
    tags(
        (name = "solar-quote", description = "Photovoltaic installation estimate & quote API")
    )
)]
pub struct ApiDoc;
