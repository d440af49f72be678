//! Calibrated geometry readings.

use serde::Serialize;
use tracing::debug;

use crate::kernel::CadKernel;
use crate::units::UnitScale;

/// Physical quantities of a shape, in millimetres and cubic centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeometryReading {
    /// Bounding box edge lengths in mm; each ≥ 0.
    pub bbox_mm: [f64; 3],
    /// Total solid volume in cm³; ≥ 0.
    pub volume_cm3: f64,
}

impl GeometryReading {
    /// Largest bounding-box edge, 0 for an empty box.
    pub fn largest_extent(&self) -> f64 {
        self.bbox_mm.iter().copied().fold(0.0, f64::max)
    }
}

/// Measure `shape` and convert to real-world units with `scale`.
///
/// Volumes are summed in native units and converted once. If every solid
/// measures exactly zero (or there are none) the whole shape is measured
/// instead.
pub fn extract<K: CadKernel>(kernel: &K, shape: &K::Shape, scale: &UnitScale) -> GeometryReading {
    let s = scale.mm_per_unit;

    let (min, max) = kernel.bounding_box(shape);
    // f64::max maps NaN to 0 as well as clamping negatives.
    let bbox_mm = std::array::from_fn(|i| ((max[i] - min[i]) * s).max(0.0));

    let mut native: f64 = kernel
        .solids(shape)
        .map(|solid| kernel.solid_volume(solid))
        .sum();
    if native == 0.0 {
        native = kernel.shape_volume(shape);
        debug!(volume = native, "no solid volume, measured whole shape");
    }
    let volume_cm3 = (native * s.powi(3) / 1000.0).max(0.0);

    GeometryReading {
        bbox_mm,
        volume_cm3,
    }
}
