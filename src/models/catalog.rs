use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─── Default coefficients ────────────────────────────────────────────────────

/// Category used when a lenient lookup finds no match.
pub const DEFAULT_CATEGORY: &str = "residential";
/// Regional average yield (kWh produced per installed Wc per year).
pub const PRODUCTION_FACTOR_KWH_PER_WC: f64 = 1.2;
/// Flat grid electricity price used for the savings projection (€/kWh).
pub const ELECTRICITY_PRICE_PER_KWH: f64 = 0.20;

/// Per-category sizing and pricing coefficients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct InstallationProfile {
    /// Installed peak power per square meter of surface (Wc/m²)
    pub watts_per_m2: f64,
    /// Headline turnkey price per installed watt (€/Wc)
    pub price_per_watt: f64,
    /// Nameplate rating of one module (Wc)
    pub panel_wattage: f64,
    /// Modules served by a single inverter
    pub panels_per_inverter: u32,
    /// Unit price of one inverter with its DC protection (€)
    pub inverter_price: f64,
    /// Unit price of one photovoltaic module (€)
    pub module_price: f64,
    /// VAT applied to the subtotal, as a fraction
    pub tax_rate: f64,
    /// Alternative spellings accepted on lookup
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Category-independent prices of the flat line items.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PriceTable {
    /// Engineering and system design (€ per project)
    pub engineering_fee: f64,
    /// Mounting structure (€ per module)
    pub mounting_per_panel: f64,
    /// DC/AC cabling (€ per project)
    pub cabling_fee: f64,
    /// AC protection enclosures (€ per project)
    pub ac_protection_fee: f64,
    /// Installation labour (€ per m²)
    pub labour_per_m2: f64,
    /// Monitoring and commissioning (€ per project)
    pub monitoring_fee: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            engineering_fee: 500.0,
            mounting_per_panel: 45.0,
            cabling_fee: 800.0,
            ac_protection_fee: 350.0,
            labour_per_m2: 25.0,
            monitoring_fee: 300.0,
        }
    }
}

/// Immutable pricing configuration handed to the estimator at construction.
///
/// Every field can be overridden from `config.json`; missing fields keep the
/// built-in values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Catalog {
    pub default_category: String,
    pub profiles: BTreeMap<String, InstallationProfile>,
    pub prices: PriceTable,
    pub production_factor_kwh_per_wc: f64,
    pub electricity_price_per_kwh: f64,
}

impl Default for Catalog {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "residential".to_string(),
            InstallationProfile {
                watts_per_m2: 170.0,
                price_per_watt: 1.2,
                panel_wattage: 400.0,
                panels_per_inverter: 20,
                inverter_price: 1200.0,
                module_price: 180.0,
                tax_rate: 0.10,
                aliases: vec!["résidentiel".to_string(), "residentiel".to_string()],
            },
        );
        profiles.insert(
            "agricultural".to_string(),
            InstallationProfile {
                watts_per_m2: 150.0,
                price_per_watt: 1.0,
                panel_wattage: 450.0,
                panels_per_inverter: 25,
                inverter_price: 1500.0,
                module_price: 190.0,
                tax_rate: 0.20,
                aliases: vec!["agricole".to_string()],
            },
        );
        profiles.insert(
            "industrial".to_string(),
            InstallationProfile {
                watts_per_m2: 130.0,
                price_per_watt: 0.9,
                panel_wattage: 500.0,
                panels_per_inverter: 30,
                inverter_price: 2500.0,
                module_price: 210.0,
                tax_rate: 0.20,
                aliases: vec!["industriel".to_string()],
            },
        );

        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
            profiles,
            prices: PriceTable::default(),
            production_factor_kwh_per_wc: PRODUCTION_FACTOR_KWH_PER_WC,
            electricity_price_per_kwh: ELECTRICITY_PRICE_PER_KWH,
        }
    }
}

impl Catalog {
    /// Lookup by key or alias, ignoring case and surrounding whitespace.
    /// Returns the canonical key.
    pub fn resolve(&self, category: &str) -> Option<(&str, &InstallationProfile)> {
        let wanted = category.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.profiles
            .iter()
            .find(|(key, profile)| {
                key.to_lowercase() == wanted
                    || profile.aliases.iter().any(|a| a.to_lowercase() == wanted)
            })
            .map(|(key, profile)| (key.as_str(), profile))
    }

    /// Lenient lookup: unknown or empty categories degrade to the default profile.
    ///
    /// Returns `None` only when the default category itself is missing, which
    /// `validate` rejects at startup.
    pub fn resolve_or_default(&self, category: &str) -> Option<(&str, &InstallationProfile)> {
        self.resolve(category)
            .or_else(|| self.resolve(&self.default_category))
    }

    /// Canonical keys, comma separated, for error messages.
    pub fn known_categories(&self) -> String {
        self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Headline coefficients of every known category.
    pub fn summaries(&self) -> Vec<ProfileSummary> {
        let default = self.default_category.to_lowercase();
        self.profiles
            .iter()
            .map(|(key, p)| ProfileSummary {
                category: key.clone(),
                aliases: p.aliases.clone(),
                is_default: key.to_lowercase() == default,
                watts_per_m2: p.watts_per_m2,
                price_per_watt: p.price_per_watt,
                panel_wattage: p.panel_wattage,
                panels_per_inverter: p.panels_per_inverter,
                inverter_price: p.inverter_price,
                module_price: p.module_price,
                tax_rate: p.tax_rate,
            })
            .collect()
    }

    /// Sanity checks on injected tables. Returns one message per problem.
    ///
    /// A zero yield is accepted: it models a site with no production and
    /// yields a zero payback rather than an error.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.profiles.is_empty() {
            errors.push("catalog: at least one installation profile is required".to_string());
        }
        if self.resolve(&self.default_category).is_none() {
            errors.push(format!(
                "catalog: default category \"{}\" is not a known profile",
                self.default_category
            ));
        }

        for (key, p) in &self.profiles {
            if !(p.watts_per_m2 >= 0.0) || !p.watts_per_m2.is_finite() {
                errors.push(format!("profile {key}: watts_per_m2 must be >= 0"));
            }
            if !(p.panel_wattage > 0.0) || !p.panel_wattage.is_finite() {
                errors.push(format!("profile {key}: panel_wattage must be > 0"));
            }
            if p.panels_per_inverter == 0 {
                errors.push(format!("profile {key}: panels_per_inverter must be > 0"));
            }
            if !(0.0..=1.0).contains(&p.tax_rate) {
                errors.push(format!("profile {key}: tax_rate must be within [0, 1]"));
            }
            for (name, value) in [
                ("price_per_watt", p.price_per_watt),
                ("inverter_price", p.inverter_price),
                ("module_price", p.module_price),
            ] {
                if !(value >= 0.0) || !value.is_finite() {
                    errors.push(format!("profile {key}: {name} must be >= 0"));
                }
            }
        }

        // Keys and aliases share one namespace, otherwise lookup order decides.
        let mut owners: HashMap<String, &str> = HashMap::new();
        for (key, p) in &self.profiles {
            for name in std::iter::once(key).chain(p.aliases.iter()) {
                let folded = name.trim().to_lowercase();
                match owners.get(&folded).copied() {
                    Some(owner) if owner != key.as_str() => errors.push(format!(
                        "profile {key}: name \"{name}\" is already used by profile {owner}"
                    )),
                    Some(_) => {}
                    None => {
                        owners.insert(folded, key.as_str());
                    }
                }
            }
        }

        let t = &self.prices;
        for (name, value) in [
            ("engineering_fee", t.engineering_fee),
            ("mounting_per_panel", t.mounting_per_panel),
            ("cabling_fee", t.cabling_fee),
            ("ac_protection_fee", t.ac_protection_fee),
            ("labour_per_m2", t.labour_per_m2),
            ("monitoring_fee", t.monitoring_fee),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                errors.push(format!("prices: {name} must be >= 0"));
            }
        }

        if !(self.production_factor_kwh_per_wc >= 0.0) || !self.production_factor_kwh_per_wc.is_finite() {
            errors.push("catalog: production_factor_kwh_per_wc must be >= 0".to_string());
        }
        if !(self.electricity_price_per_kwh >= 0.0) || !self.electricity_price_per_kwh.is_finite() {
            errors.push("catalog: electricity_price_per_kwh must be >= 0".to_string());
        }

        errors
    }
}

/// One row of `GET /api/installation-types`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileSummary {
    pub category: String,
    pub aliases: Vec<String>,
    pub is_default: bool,
    pub watts_per_m2: f64,
    pub price_per_watt: f64,
    pub panel_wattage: f64,
    pub panels_per_inverter: u32,
    pub inverter_price: f64,
    pub module_price: f64,
    pub tax_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_case_insensitive() {
        let catalog = Catalog::default();
        let (key, profile) = catalog.resolve("  Residential ").unwrap();
        assert_eq!(key, "residential");
        assert_eq!(profile.watts_per_m2, 170.0);
        assert_eq!(catalog.resolve("INDUSTRIAL").unwrap().0, "industrial");
    }

    #[test]
    fn resolve_accepts_french_aliases() {
        let catalog = Catalog::default();
        assert_eq!(catalog.resolve("Résidentiel").unwrap().0, "residential");
        assert_eq!(catalog.resolve("agricole").unwrap().0, "agricultural");
        assert_eq!(catalog.resolve("INDUSTRIEL").unwrap().0, "industrial");
    }

    #[test]
    fn unknown_category_falls_back_to_default() {
        let catalog = Catalog::default();
        assert!(catalog.resolve("unknown_xyz").is_none());
        assert!(catalog.resolve("").is_none());
        assert_eq!(catalog.resolve_or_default("unknown_xyz").unwrap().0, "residential");
        assert_eq!(catalog.resolve_or_default("").unwrap().0, "residential");
    }

    #[test]
    fn default_catalog_is_valid() {
        assert!(Catalog::default().validate().is_empty());
    }

    #[test]
    fn validate_reports_each_problem() {
        let mut catalog = Catalog::default();
        catalog.default_category = "commercial".to_string();
        if let Some(p) = catalog.profiles.get_mut("industrial") {
            p.panel_wattage = 0.0;
            p.panels_per_inverter = 0;
            p.tax_rate = 1.5;
        }
        catalog.prices.cabling_fee = -1.0;

        let errors = catalog.validate();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("default category")));
        assert!(errors.iter().any(|e| e.contains("panel_wattage")));
        assert!(errors.iter().any(|e| e.contains("panels_per_inverter")));
        assert!(errors.iter().any(|e| e.contains("tax_rate")));
        assert!(errors.iter().any(|e| e.contains("cabling_fee")));
    }

    #[test]
    fn validate_rejects_names_shared_between_profiles() {
        let mut catalog = Catalog::default();
        if let Some(p) = catalog.profiles.get_mut("agricultural") {
            p.aliases.push("Industriel".to_string());
        }
        if let Some(p) = catalog.profiles.get_mut("residential") {
            p.aliases.push(" AGRICULTURAL".to_string());
        }
        let errors = catalog.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().all(|e| e.contains("already used")));
    }

    #[test]
    fn validate_rejects_non_finite_constants() {
        let mut catalog = Catalog::default();
        catalog.production_factor_kwh_per_wc = f64::INFINITY;
        catalog.electricity_price_per_kwh = f64::NAN;
        let errors = catalog.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn zero_yield_profile_is_accepted() {
        let mut catalog = Catalog::default();
        if let Some(p) = catalog.profiles.get_mut("residential") {
            p.watts_per_m2 = 0.0;
        }
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn summaries_flag_the_default() {
        let summaries = Catalog::default().summaries();
        assert_eq!(summaries.len(), 3);
        let defaults: Vec<_> = summaries.iter().filter(|s| s.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].category, "residential");
        assert_eq!(defaults[0].tax_rate, 0.10);
    }

    #[test]
    fn partial_override_keeps_builtin_values() {
        let catalog: Catalog =
            serde_json::from_str(r#"{ "electricity_price_per_kwh": 0.3 }"#).unwrap();
        assert_eq!(catalog.electricity_price_per_kwh, 0.3);
        assert_eq!(catalog.profiles.len(), 3);
        assert_eq!(catalog.prices, PriceTable::default());
    }
}
