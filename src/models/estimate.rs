use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ClientInfo {
    #[serde(default, alias = "nom")]
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Full estimation input, also the body of `POST /api/quote`.
///
/// `orientation`, `tilt` and `shading` are accepted and echoed but do not
/// change the figures yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct EstimationInput {
    pub client: Option<ClientInfo>,
    /// Usable surface (m²)
    pub surface: f64,
    #[serde(default, alias = "type_installation")]
    pub installation_type: String,
    #[serde(default, alias = "besoin")]
    pub need: Option<String>,
    #[serde(default)]
    pub orientation: Option<String>,
    /// Panel tilt (degrees)
    #[serde(default)]
    pub tilt: Option<f64>,
    #[serde(default)]
    pub shading: Option<String>,
}

/// Body of `POST /api/estimate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SimpleEstimateRequest {
    pub surface: f64,
    #[serde(default, alias = "type_installation")]
    pub installation_type: String,
    #[serde(default, alias = "besoin")]
    pub need: Option<String>,
}

impl From<&SimpleEstimateRequest> for EstimationInput {
    fn from(req: &SimpleEstimateRequest) -> Self {
        Self {
            surface: req.surface,
            installation_type: req.installation_type.clone(),
            need: req.need.clone(),
            ..Default::default()
        }
    }
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LineItem {
    pub designation: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    /// quantity × unit_price
    pub total: f64,
}

/// Itemised quote returned by `POST /api/quote`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct EstimationOutput {
    pub quote_id: String,
    pub created_at: DateTime<Utc>,
    pub client: Option<ClientInfo>,
    pub surface: f64,
    /// Canonical category the figures were priced with
    pub installation_type: String,

    // ── Sizing ───────────────────────────────────────────────────────────────
    pub panel_count: u64,
    pub inverter_count: u64,
    pub total_power_wc: f64,
    pub total_power_kwc: f64,
    pub annual_production_kwh: f64,

    // ── Pricing ──────────────────────────────────────────────────────────────
    pub line_items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,

    // ── Profitability ────────────────────────────────────────────────────────
    pub annual_savings: f64,
    /// 0 when the installation saves nothing
    pub payback_years: f64,
    pub net_gain_20_years: f64,

    pub need: Option<String>,
    pub orientation: Option<String>,
    pub tilt: Option<f64>,
    pub shading: Option<String>,
}

/// Compact answer of `POST /api/estimate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SimpleEstimate {
    pub installation_type: String,
    pub total_power_wc: f64,
    pub panel_count: u64,
    /// Itemised total, tax included
    pub total_price: f64,
    /// total_power_wc × price_per_watt of the category
    pub indicative_price: f64,
    pub annual_production_kwh: f64,
    pub payback_years: f64,
}

/// Wire shape expected by the older `POST /api/estimation` caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LegacyEstimate {
    #[serde(rename = "puissance")]
    pub total_power_wc: f64,
    #[serde(rename = "panneaux")]
    pub panel_count: u64,
    #[serde(rename = "prix")]
    pub total_price: f64,
    pub production_kwh: f64,
    #[serde(rename = "roi")]
    pub payback_years: f64,
}

impl From<&EstimationOutput> for LegacyEstimate {
    fn from(out: &EstimationOutput) -> Self {
        Self {
            total_power_wc: out.total_power_wc,
            panel_count: out.panel_count,
            total_price: out.total,
            production_kwh: out.annual_production_kwh,
            payback_years: out.payback_years,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
