//! Closed-form cost model.

use serde::Serialize;

use crate::config::PricingParameters;
use crate::extract::GeometryReading;
use crate::material::MaterialProfile;

/// Fraction of the solid volume actually extruded (walls plus sparse infill).
pub const FILL_FACTOR: f64 = 0.35;
/// Print hours per cm³ of solid volume.
pub const HOURS_PER_CM3: f64 = 0.03;
/// Largest extent (mm) that adds one hour of travel and layer overhead.
pub const MM_PER_EXTRA_HOUR: f64 = 80.0;

/// Every intermediate of a price computation, unrounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    /// Extruded filament mass.
    pub grams: f64,
    /// Filament cost including waste.
    pub material_cost: f64,
    /// Estimated print time.
    pub time_hours: f64,
    /// Printer time at the machine rate.
    pub machine_cost: f64,
    /// Energy used over the print time.
    pub electric_cost: f64,
    /// Fixed handling labor.
    pub labor_cost: f64,
    /// Sum of the four costs.
    pub base: f64,
    /// Base plus overhead.
    pub subtotal: f64,
    /// Subtotal plus markup.
    pub final_price: f64,
}

/// Price a part.
pub fn price(
    reading: &GeometryReading,
    material: &MaterialProfile,
    params: &PricingParameters,
) -> PricingResult {
    let grams = reading.volume_cm3 * material.density * FILL_FACTOR;
    let filament_per_kg = params.filament_per_kg.unwrap_or(material.price_per_kg);
    let material_cost = filament_per_kg * grams / 1000.0 * (1.0 + params.waste_pct / 100.0);

    let time_hours = reading.volume_cm3 * HOURS_PER_CM3 + reading.largest_extent() / MM_PER_EXTRA_HOUR;
    let machine_cost = params.machine_rate * time_hours;
    let electric_cost = params.avg_kw * params.kwh_cost * time_hours;
    let labor_cost = params.labor_rate * params.labor_hours;

    let base = material_cost + machine_cost + electric_cost + labor_cost;
    let subtotal = base * (1.0 + params.overhead_pct / 100.0);
    let final_price = subtotal * (1.0 + params.markup_pct / 100.0);

    PricingResult {
        grams,
        material_cost,
        time_hours,
        machine_cost,
        electric_cost,
        labor_cost,
        base,
        subtotal,
        final_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reading(volume_cm3: f64, bbox_mm: [f64; 3]) -> GeometryReading {
        GeometryReading { bbox_mm, volume_cm3 }
    }

    #[test]
    fn test_reference_scenario() {
        let r = price(
            &reading(10.0, [20.0; 3]),
            &MaterialProfile::for_name("PLA Basic"),
            &PricingParameters::default(),
        );
        assert_relative_eq!(r.grams, 4.34, max_relative = 1e-12);
        assert_relative_eq!(r.material_cost, 0.09548, max_relative = 1e-12);
        assert_relative_eq!(r.time_hours, 0.55, max_relative = 1e-12);
        assert_relative_eq!(r.machine_cost, 6.6, max_relative = 1e-12);
        assert_relative_eq!(r.electric_cost, 0.0165, max_relative = 1e-12);
        assert_relative_eq!(r.labor_cost, 9.9, max_relative = 1e-12);
        assert_relative_eq!(r.base, 16.61198, max_relative = 1e-12);
        assert_relative_eq!(r.subtotal, 18.273178, max_relative = 1e-12);
        assert_relative_eq!(r.final_price, 24.6687903, max_relative = 1e-9);
    }

    #[test]
    fn test_zero_bbox_time_is_volume_only() {
        let r = price(
            &reading(5.0, [0.0; 3]),
            &MaterialProfile::for_name("ABS"),
            &PricingParameters::default(),
        );
        assert_relative_eq!(r.time_hours, 0.15, max_relative = 1e-12);
        assert!(r.final_price.is_finite() && r.final_price > 0.0);
    }

    #[test]
    fn test_filament_override_replaces_reference_price() {
        let params = PricingParameters {
            filament_per_kg: Some(40.0),
            waste_pct: 0.0,
            ..Default::default()
        };
        let r = price(&reading(10.0, [0.0; 3]), &MaterialProfile::for_name("PLA Basic"), &params);
        assert_relative_eq!(r.material_cost, 40.0 * 4.34 / 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_unknown_material_uses_fallback_constants() {
        let r = price(
            &reading(10.0, [0.0; 3]),
            &MaterialProfile::for_name("Mystery"),
            &PricingParameters::default(),
        );
        assert_relative_eq!(r.grams, 10.0 * 1.2 * 0.35, max_relative = 1e-12);
        assert_relative_eq!(r.material_cost, 25.0 * r.grams / 1000.0 * 1.1, max_relative = 1e-12);
    }

    #[test]
    fn test_empty_part_costs_labor_only() {
        let params = PricingParameters {
            overhead_pct: 0.0,
            markup_pct: 0.0,
            ..Default::default()
        };
        let r = price(&reading(0.0, [0.0; 3]), &MaterialProfile::for_name("PC"), &params);
        assert_eq!(r.grams, 0.0);
        assert_relative_eq!(r.final_price, 9.9, max_relative = 1e-12);
    }

    /// `[material, machine, electric, labor, base, final]`.
    fn costs(r: &PricingResult) -> [f64; 6] {
        [
            r.material_cost,
            r.machine_cost,
            r.electric_cost,
            r.labor_cost,
            r.base,
            r.final_price,
        ]
    }

    #[test]
    fn test_each_parameter_in_isolation() {
        let d = PricingParameters::default();
        let table: Vec<(&str, PricingParameters, [f64; 6])> = vec![
            ("defaults", d.clone(), [0.09548, 6.6, 0.0165, 9.9, 16.61198, 24.6687903]),
            (
                "machine_rate",
                PricingParameters { machine_rate: 20.0, ..d.clone() },
                [0.09548, 11.0, 0.0165, 9.9, 21.01198, 31.2027903],
            ),
            (
                "avg_kw",
                PricingParameters { avg_kw: 0.5, ..d.clone() },
                [0.09548, 6.6, 0.04125, 9.9, 16.63673, 24.70554405],
            ),
            (
                "kwh_cost",
                PricingParameters { kwh_cost: 0.3, ..d.clone() },
                [0.09548, 6.6, 0.033, 9.9, 16.62848, 24.6932928],
            ),
            (
                "labor_hours",
                PricingParameters { labor_hours: 1.0, ..d.clone() },
                [0.09548, 6.6, 0.0165, 30.0, 36.71198, 54.5172903],
            ),
            (
                "labor_rate",
                PricingParameters { labor_rate: 50.0, ..d.clone() },
                [0.09548, 6.6, 0.0165, 16.5, 23.21198, 34.4697903],
            ),
            (
                "overhead_pct",
                PricingParameters { overhead_pct: 0.0, ..d.clone() },
                [0.09548, 6.6, 0.0165, 9.9, 16.61198, 22.426173],
            ),
            (
                "markup_pct",
                PricingParameters { markup_pct: 0.0, ..d.clone() },
                [0.09548, 6.6, 0.0165, 9.9, 16.61198, 18.273178],
            ),
            (
                "waste_pct",
                PricingParameters { waste_pct: 0.0, ..d.clone() },
                [0.0868, 6.6, 0.0165, 9.9, 16.6033, 24.6559005],
            ),
            (
                "filament_per_kg",
                PricingParameters { filament_per_kg: Some(30.0), ..d.clone() },
                [0.14322, 6.6, 0.0165, 9.9, 16.65972, 24.7396842],
            ),
        ];

        let part = reading(10.0, [20.0; 3]);
        let pla = MaterialProfile::for_name("PLA Basic");
        for (name, params, expected) in table {
            let got = costs(&price(&part, &pla, &params));
            for (g, e) in got.iter().zip(expected) {
                assert_relative_eq!(*g, e, max_relative = 1e-9);
            }
            assert!(got.iter().all(|c| c.is_finite()), "{name}");
        }
    }

    #[test]
    fn test_every_material() {
        let table = [
            ("PLA Basic", 4.34, 0.09548, 24.6687903),
            ("PLA Tough", 4.34, 0.124124, 24.71132664),
            ("PETG Basic", 4.445, 0.1222375, 24.70852519),
            ("ABS", 3.675, 0.105105, 24.68308343),
            ("ASA", 3.745, 0.107107, 24.6860564),
            ("PC", 4.2, 0.1386, 24.7328235),
            ("PA (Nylon)", 3.99, 0.17556, 24.7877091),
            ("TPU 95A", 4.235, 0.139755, 24.73453868),
        ];
        let part = reading(10.0, [20.0; 3]);
        let params = PricingParameters::default();
        for (name, grams, material_cost, final_price) in table {
            let r = price(&part, &MaterialProfile::for_name(name), &params);
            assert_relative_eq!(r.grams, grams, max_relative = 1e-12);
            assert_relative_eq!(r.material_cost, material_cost, max_relative = 1e-9);
            assert_relative_eq!(r.final_price, final_price, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let part = reading(12.345, [31.0, 7.5, 90.25]);
        let material = MaterialProfile::for_name("ASA");
        let params = PricingParameters::default();
        let first = price(&part, &material, &params);
        for _ in 0..10 {
            assert_eq!(price(&part, &material, &params), first);
        }
    }
}
