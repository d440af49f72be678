//! End-to-end quoting pipeline.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::PricingParameters;
use crate::error::{QuoteError, Result};
use crate::extract::{extract, GeometryReading};
use crate::kernel::CadKernel;
use crate::loader::ShapeLoader;
use crate::material::MaterialProfile;
use crate::pricing::{price, PricingResult};
use crate::units::{sniff_units, sniff_units_file, UnitScale};

/// Customer-facing quote, rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    /// cm³, 3 decimals.
    pub volume_cm3: f64,
    /// mm, 3 decimals each.
    pub bbox_mm: [f64; 3],
    /// 2 decimals.
    pub estimated_price: f64,
    /// Material name as requested.
    pub material: String,
    /// Unit label the geometry was scaled with.
    pub units_detected: String,
}

impl Quote {
    /// Round a reading and a price into a quote.
    pub fn new(reading: &GeometryReading, pricing: &PricingResult, material: &str, units: &UnitScale) -> Self {
        Self {
            volume_cm3: round_to(reading.volume_cm3, 3),
            bbox_mm: reading.bbox_mm.map(|v| round_to(v, 3)),
            estimated_price: round_to(pricing.final_price, 2),
            material: material.to_string(),
            units_detected: units.label.to_string(),
        }
    }
}

/// Round to `places` decimals.
///
/// Rounds the exact binary value, so a literal like `2.675` (stored just
/// below the tie) goes down and true ties go to even.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// A quote together with every unrounded intermediate.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteReport {
    /// The rounded quote.
    pub quote: Quote,
    /// Detected length unit.
    pub units: UnitScale,
    /// Calibrated geometry, unrounded.
    pub reading: GeometryReading,
    /// Resolved material constants.
    pub material: MaterialProfile,
    /// Parameters the price was computed with.
    pub parameters: PricingParameters,
    /// Every cost intermediate.
    pub pricing: PricingResult,
}

/// Geometry readings without pricing.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    /// Detected length unit.
    pub units: UnitScale,
    /// Number of solids the kernel found.
    pub solid_count: usize,
    /// Calibrated geometry, unrounded.
    pub reading: GeometryReading,
}

/// Runs uploads through a kernel.
#[derive(Debug, Clone, Default)]
pub struct Quoter<K> {
    kernel: K,
}

impl<K: CadKernel> Quoter<K> {
    /// Quoter over `kernel`.
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    /// The underlying kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Price `bytes` in `material`.
    pub fn quote(&self, bytes: &[u8], material: &str, params: &PricingParameters) -> Result<Quote> {
        self.report(bytes, material, params).map(|r| r.quote)
    }

    /// Price `bytes` in `material`, keeping the breakdown.
    pub fn report(&self, bytes: &[u8], material: &str, params: &PricingParameters) -> Result<QuoteReport> {
        let (units, shape) = self.load(bytes)?;
        Ok(self.price_shape(units, &shape, material, params))
    }

    /// Like [`Quoter::report`] for a file already on disk; no temporary
    /// copy is made.
    pub fn report_file(&self, path: &Path, material: &str, params: &PricingParameters) -> Result<QuoteReport> {
        let (units, shape) = self.load_file(path)?;
        Ok(self.price_shape(units, &shape, material, params))
    }

    /// Measure `bytes` without pricing.
    pub fn inspect(&self, bytes: &[u8]) -> Result<Inspection> {
        let (units, shape) = self.load(bytes)?;
        Ok(self.measure(units, &shape))
    }

    /// Like [`Quoter::inspect`] for a file already on disk.
    pub fn inspect_file(&self, path: &Path) -> Result<Inspection> {
        let (units, shape) = self.load_file(path)?;
        Ok(self.measure(units, &shape))
    }

    fn price_shape(
        &self,
        units: UnitScale,
        shape: &K::Shape,
        material: &str,
        params: &PricingParameters,
    ) -> QuoteReport {
        let reading = extract(&self.kernel, shape, &units);
        let profile = MaterialProfile::for_name(material);
        let pricing = price(&reading, &profile, params);
        debug!(
            volume_cm3 = reading.volume_cm3,
            price = pricing.final_price,
            units = units.label,
            "priced part"
        );
        QuoteReport {
            quote: Quote::new(&reading, &pricing, material, &units),
            units,
            reading,
            material: profile,
            parameters: params.clone(),
            pricing,
        }
    }

    fn measure(&self, units: UnitScale, shape: &K::Shape) -> Inspection {
        Inspection {
            solid_count: self.kernel.solids(shape).count(),
            reading: extract(&self.kernel, shape, &units),
            units,
        }
    }

    fn load(&self, bytes: &[u8]) -> Result<(UnitScale, K::Shape)> {
        if bytes.is_empty() {
            return Err(QuoteError::Validation("uploaded file is empty".into()));
        }
        let loader = ShapeLoader::new(&self.kernel);
        let (units, shape) = rayon::join(|| sniff_units(bytes), || loader.load(bytes));
        Ok((units, shape?))
    }

    fn load_file(&self, path: &Path) -> Result<(UnitScale, K::Shape)> {
        let (units, shape) = rayon::join(
            || sniff_units_file(path),
            || self.kernel.read_file(path),
        );
        let shape = shape.map_err(|e| QuoteError::GeometryParse(e.to_string()))?;
        Ok((units, shape))
    }
}
