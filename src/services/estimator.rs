/// ============================================================
///  Photovoltaic quote estimator
///
///  Pipeline (one pass per request, no shared mutable state):
///   1. Validation   – surface, category, client name per Strictness
///   2. Profile      – strict or lenient category lookup
///   3. Sizing       – peak power, module and inverter counts, yield
///   4. Line items   – eight fixed rows, each priced on its own
///   5. Financials   – settled to the cent: subtotal = Σ rows,
///                     VAT on that subtotal, total = subtotal + VAT
///   6. Projection   – savings, payback, 20-year net gain
///   7. Output       – remaining rounding applied here
/// ============================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EstimationError;
use crate::models::catalog::{Catalog, InstallationProfile};
use crate::models::estimate::{
    ClientInfo, EstimationInput, EstimationOutput, LegacyEstimate, LineItem, SimpleEstimate,
    SimpleEstimateRequest,
};

pub type Result<T> = std::result::Result<T, EstimationError>;

pub const QUOTE_ID_PREFIX: &str = "DEV-";
const QUOTE_ID_FORMAT: &str = "%Y%m%d%H%M";
/// Horizon of the net gain projection (years).
pub const PROJECTION_YEARS: f64 = 20.0;
/// Client name used by the compatibility endpoint when none is sent.
pub const PLACEHOLDER_CLIENT_NAME: &str = "Client";

// ─── Output precision (decimal places) ───────────────────────
const MONEY_DP: i32 = 2;
const POWER_W_DP: i32 = 2;
const POWER_KW_DP: i32 = 3;
const ENERGY_DP: i32 = 2;
const YEARS_DP: i32 = 2;

/// Input acceptance policy shared by every entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strictness {
    /// Reject unknown categories instead of falling back to the default.
    pub strict_category: bool,
    /// Reject a missing or blank client name.
    pub require_client_name: bool,
}

impl Strictness {
    /// Simple estimate.
    pub const LENIENT: Self = Self { strict_category: false, require_client_name: false };
    /// Full quote.
    pub const STRICT: Self = Self { strict_category: true, require_client_name: true };
    /// Compatibility endpoint: full quote, original category fallback.
    pub const COMPAT: Self = Self { strict_category: false, require_client_name: true };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    pub total_power_wc: f64,
    pub panel_count: u64,
    pub inverter_count: u64,
    pub annual_production_kwh: f64,
}

/// Billed amounts, already at cent resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Financials {
    subtotal: f64,
    tax_rate: f64,
    tax_amount: f64,
    total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    annual_savings: f64,
    payback_years: f64,
    net_gain: f64,
}

/// Figures for one request: sizing at full precision, money settled to the cent.
struct Priced<'a> {
    category: &'a str,
    profile: &'a InstallationProfile,
    sizing: Sizing,
    line_items: Vec<LineItem>,
    financials: Financials,
    projection: Projection,
}

/// Pure calculator over an injected, immutable catalog.
#[derive(Debug, Clone)]
pub struct Estimator {
    catalog: Arc<Catalog>,
}

impl Estimator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Simple estimate: lenient category, no client required.
    pub fn simple_estimate(&self, req: &SimpleEstimateRequest) -> Result<SimpleEstimate> {
        let input = EstimationInput::from(req);
        let priced = self.price(&input, Strictness::LENIENT)?;
        Ok(SimpleEstimate {
            installation_type: priced.category.to_string(),
            total_power_wc: round_to(priced.sizing.total_power_wc, POWER_W_DP),
            panel_count: priced.sizing.panel_count,
            total_price: priced.financials.total,
            indicative_price: round_to(
                priced.sizing.total_power_wc * priced.profile.price_per_watt,
                MONEY_DP,
            ),
            annual_production_kwh: round_to(priced.sizing.annual_production_kwh, ENERGY_DP),
            payback_years: round_to(priced.projection.payback_years, YEARS_DP),
        })
    }

    /// Itemised quote: known category and client name required.
    pub fn full_quote(&self, input: &EstimationInput, now: DateTime<Utc>) -> Result<EstimationOutput> {
        self.estimate(input, Strictness::STRICT, now)
    }

    /// Compatibility adapter over the full-quote path for the older caller.
    ///
    /// Accepts the loosely typed body the original form posted, fills a
    /// placeholder client name and keeps the lenient category fallback.
    pub fn legacy_estimate(&self, body: &Map<String, Value>, now: DateTime<Utc>) -> Result<LegacyEstimate> {
        let input = legacy_input(body)?;
        let output = self.estimate(&input, Strictness::COMPAT, now)?;
        Ok(LegacyEstimate::from(&output))
    }

    /// Core calculation shared by all entry points.
    pub fn estimate(
        &self,
        input: &EstimationInput,
        strictness: Strictness,
        now: DateTime<Utc>,
    ) -> Result<EstimationOutput> {
        let priced = self.price(input, strictness)?;
        let Priced { category, sizing, line_items, financials, projection, .. } = priced;

        Ok(EstimationOutput {
            quote_id: quote_id(now),
            created_at: now,
            client: input.client.clone(),
            surface: input.surface,
            installation_type: category.to_string(),
            panel_count: sizing.panel_count,
            inverter_count: sizing.inverter_count,
            total_power_wc: round_to(sizing.total_power_wc, POWER_W_DP),
            total_power_kwc: round_to(sizing.total_power_wc / 1000.0, POWER_KW_DP),
            annual_production_kwh: round_to(sizing.annual_production_kwh, ENERGY_DP),
            line_items: line_items
                .into_iter()
                .map(|item| LineItem {
                    unit_price: round_to(item.unit_price, MONEY_DP),
                    total: round_to(item.total, MONEY_DP),
                    ..item
                })
                .collect(),
            subtotal: financials.subtotal,
            tax_rate: financials.tax_rate,
            tax_amount: financials.tax_amount,
            total: financials.total,
            annual_savings: round_to(projection.annual_savings, MONEY_DP),
            payback_years: round_to(projection.payback_years, YEARS_DP),
            net_gain_20_years: round_to(projection.net_gain, MONEY_DP),
            need: input.need.clone(),
            orientation: input.orientation.clone(),
            tilt: input.tilt,
            shading: input.shading.clone(),
        })
    }

    /// Peak power, hardware counts and yearly production for `surface` m².
    pub fn size(&self, surface: f64, profile: &InstallationProfile) -> Result<Sizing> {
        let total_power_wc = surface * profile.watts_per_m2;
        let panel_count = ceil_count(total_power_wc / profile.panel_wattage, "panel count")?;
        if profile.panels_per_inverter == 0 {
            return Err(EstimationError::ComputationFault("inverter count"));
        }
        let inverter_count = panel_count.div_ceil(u64::from(profile.panels_per_inverter));
        let annual_production_kwh = total_power_wc * self.catalog.production_factor_kwh_per_wc;

        Ok(Sizing {
            total_power_wc,
            panel_count,
            inverter_count,
            annual_production_kwh,
        })
    }

    /// The eight quote rows, in order. Totals are full precision.
    pub fn line_items(&self, surface: f64, profile: &InstallationProfile, sizing: &Sizing) -> Vec<LineItem> {
        let prices = &self.catalog.prices;
        let panels = sizing.panel_count as f64;
        let inverters = sizing.inverter_count as f64;

        vec![
            line_item("Engineering & system design", 1.0, "lot", prices.engineering_fee),
            line_item("Photovoltaic modules", panels, "unit", profile.module_price),
            line_item("Inverters + DC protection", inverters, "unit", profile.inverter_price),
            line_item("Mounting structure", panels, "unit", prices.mounting_per_panel),
            line_item("DC/AC cabling", 1.0, "lot", prices.cabling_fee),
            line_item("AC protection enclosures", 1.0, "lot", prices.ac_protection_fee),
            line_item("Installation labour", surface, "m²", prices.labour_per_m2),
            line_item("Monitoring & commissioning", 1.0, "lot", prices.monitoring_fee),
        ]
    }

    fn price<'a>(&'a self, input: &EstimationInput, strictness: Strictness) -> Result<Priced<'a>> {
        let (category, profile) = self.validate(input, strictness)?;

        let sizing = self.size(input.surface, profile)?;
        let line_items = self.line_items(input.surface, profile, &sizing);

        let financials = settle(&line_items, profile.tax_rate);

        let annual_savings = sizing.annual_production_kwh * self.catalog.electricity_price_per_kwh;
        let payback_years = if annual_savings > 0.0 {
            financials.total / annual_savings
        } else {
            0.0
        };
        let projection = Projection {
            annual_savings,
            payback_years,
            net_gain: annual_savings * PROJECTION_YEARS - financials.total,
        };

        ensure_finite(&[
            ("total power", sizing.total_power_wc),
            ("annual production", sizing.annual_production_kwh),
            ("subtotal", financials.subtotal),
            ("tax amount", financials.tax_amount),
            ("total", financials.total),
            ("annual savings", projection.annual_savings),
            ("payback period", projection.payback_years),
            ("net gain", projection.net_gain),
        ])?;

        debug!(
            category,
            surface = input.surface,
            panels = sizing.panel_count,
            inverters = sizing.inverter_count,
            total = financials.total,
            "priced installation"
        );

        Ok(Priced {
            category,
            profile,
            sizing,
            line_items,
            financials,
            projection,
        })
    }

    fn validate(&self, input: &EstimationInput, strictness: Strictness) -> Result<(&str, &InstallationProfile)> {
        if !(input.surface > 0.0) || !input.surface.is_finite() {
            return Err(EstimationError::InvalidSurface(input.surface));
        }

        let resolved = if strictness.strict_category {
            self.catalog.resolve(&input.installation_type).ok_or_else(|| {
                EstimationError::UnknownCategory {
                    requested: input.installation_type.clone(),
                    known: self.catalog.known_categories(),
                }
            })?
        } else {
            self.catalog
                .resolve_or_default(&input.installation_type)
                .ok_or(EstimationError::ComputationFault("default profile missing"))?
        };

        if strictness.require_client_name
            && input.client.as_ref().is_none_or(|c| c.name.trim().is_empty())
        {
            return Err(EstimationError::MissingClientName);
        }

        Ok(resolved)
    }
}

/// `DEV-` followed by the UTC timestamp at minute granularity.
pub fn quote_id(now: DateTime<Utc>) -> String {
    format!("{}{}", QUOTE_ID_PREFIX, now.format(QUOTE_ID_FORMAT))
}

fn line_item(designation: &str, quantity: f64, unit: &str, unit_price: f64) -> LineItem {
    LineItem {
        designation: designation.to_string(),
        quantity,
        unit: unit.to_string(),
        unit_price,
        total: quantity * unit_price,
    }
}

/// Money figures as printed on the quote. Each row is rounded to the cent,
/// then subtotal, VAT and total are derived from the rounded values so the
/// record adds up exactly.
fn settle(line_items: &[LineItem], tax_rate: f64) -> Financials {
    let subtotal = round_to(
        line_items.iter().map(|item| round_to(item.total, MONEY_DP)).sum(),
        MONEY_DP,
    );
    let tax_amount = round_to(subtotal * tax_rate, MONEY_DP);
    Financials {
        subtotal,
        tax_rate,
        tax_amount,
        total: round_to(subtotal + tax_amount, MONEY_DP),
    }
}

/// Whole hardware units needed to cover `ratio`, never rounding down.
fn ceil_count(ratio: f64, what: &'static str) -> Result<u64> {
    if !ratio.is_finite() || ratio < 0.0 || ratio >= u64::MAX as f64 {
        return Err(EstimationError::ComputationFault(what));
    }
    Ok(ratio.ceil() as u64)
}

fn ensure_finite(values: &[(&'static str, f64)]) -> Result<()> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, _)) => Err(EstimationError::ComputationFault(*name)),
        None => Ok(()),
    }
}

fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

fn malformed(field: &'static str, reason: impl Into<String>) -> EstimationError {
    EstimationError::MalformedField { field, reason: reason.into() }
}

/// Maps the original form body onto an `EstimationInput`.
fn legacy_input(body: &Map<String, Value>) -> Result<EstimationInput> {
    let surface = match body.get("surface") {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| malformed("surface", "not representable as a number"))?,
        // The form posts French decimals ("12,5") when the browser locale does.
        Some(Value::String(s)) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| malformed("surface", format!("\"{s}\" is not a number")))?,
        Some(other) => return Err(malformed("surface", format!("expected a number, got {other}"))),
        None => return Err(malformed("surface", "missing")),
    };

    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| body.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    };

    let client_name = text(&["nom", "name"])
        .or_else(|| {
            body.get("client")
                .and_then(|c| c.get("name").or_else(|| c.get("nom")))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_CLIENT_NAME.to_string());

    Ok(EstimationInput {
        client: Some(ClientInfo {
            name: client_name,
            ..Default::default()
        }),
        surface,
        installation_type: text(&["type_installation", "installation_type"]).unwrap_or_default(),
        need: text(&["besoin", "need"]),
        ..Default::default()
    })
}
