//! Pricing parameters and their environment overrides.

use serde::Serialize;
use tracing::warn;

/// Economic inputs to [`crate::price`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingParameters {
    /// Filament price per kg; `None` uses the material's reference price.
    pub filament_per_kg: Option<f64>,
    /// Extra material lost to purge and supports, percent.
    pub waste_pct: f64,
    /// Printer time cost per hour.
    pub machine_rate: f64,
    /// Average printer draw in kW.
    pub avg_kw: f64,
    /// Electricity price per kWh.
    pub kwh_cost: f64,
    /// Handling time per job in hours.
    pub labor_hours: f64,
    /// Labor cost per hour.
    pub labor_rate: f64,
    /// Overhead on the base cost, percent.
    pub overhead_pct: f64,
    /// Markup on the subtotal, percent.
    pub markup_pct: f64,
}

impl Default for PricingParameters {
    fn default() -> Self {
        Self {
            filament_per_kg: None,
            waste_pct: 10.0,
            machine_rate: 12.0,
            avg_kw: 0.2,
            kwh_cost: 0.15,
            labor_hours: 0.33,
            labor_rate: 30.0,
            overhead_pct: 10.0,
            markup_pct: 35.0,
        }
    }
}

impl PricingParameters {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`. Missing keys keep their default;
    /// values that are not finite numbers are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| -> Option<f64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    warn!(key, value = %raw, "ignoring invalid pricing parameter");
                    None
                }
            }
        };

        let d = Self::default();
        Self {
            filament_per_kg: read("FILAMENT_PER_KG"),
            waste_pct: read("WASTE_PCT").unwrap_or(d.waste_pct),
            machine_rate: read("MACHINE_RATE").unwrap_or(d.machine_rate),
            avg_kw: read("AVG_KW").unwrap_or(d.avg_kw),
            kwh_cost: read("KWH_COST").unwrap_or(d.kwh_cost),
            labor_hours: read("LABOR_HOURS").unwrap_or(d.labor_hours),
            labor_rate: read("LABOR_RATE").unwrap_or(d.labor_rate),
            overhead_pct: read("OVERHEAD_PCT").unwrap_or(d.overhead_pct),
            markup_pct: read("MARKUP_PCT").unwrap_or(d.markup_pct),
        }
    }
}
