//! The CAD kernel seam.
//!
//! The pipeline needs five things from a kernel: read a file, give a
//! bounding box, enumerate solids, and measure solid and whole-shape volume.
//! All lengths are in the file's native unit.

use std::fmt::Display;
use std::path::Path;

use printquote_step::{read_step, Shape, Solid, StepError};

/// A geometry kernel that can read STEP files and measure them.
pub trait CadKernel: Send + Sync {
    /// Parsed file handle.
    type Shape: Send;
    /// One solid inside a shape.
    type Solid;
    /// Read failure.
    type Error: Display + Send;

    /// Read a STEP file.
    fn read_file(&self, path: &Path) -> Result<Self::Shape, Self::Error>;

    /// `(min, max)` corners in native units. An empty shape may report an
    /// inverted or non-finite box.
    fn bounding_box(&self, shape: &Self::Shape) -> ([f64; 3], [f64; 3]);

    /// Every solid in the shape.
    fn solids<'a>(&self, shape: &'a Self::Shape) -> Box<dyn Iterator<Item = &'a Self::Solid> + 'a>;

    /// Volume of one solid in native units³.
    fn solid_volume(&self, solid: &Self::Solid) -> f64;

    /// Volume of the whole shape treated as one body, native units³.
    fn shape_volume(&self, shape: &Self::Shape) -> f64;
}

/// Kernel backed by [`printquote_step`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StepKernel;

impl CadKernel for StepKernel {
    type Shape = Shape;
    type Solid = Solid;
    type Error = StepError;

    fn read_file(&self, path: &Path) -> Result<Shape, StepError> {
        read_step(path)
    }

    fn bounding_box(&self, shape: &Shape) -> ([f64; 3], [f64; 3]) {
        let bounds = shape.bounds();
        (bounds.min.coords.into(), bounds.max.coords.into())
    }

    fn solids<'a>(&self, shape: &'a Shape) -> Box<dyn Iterator<Item = &'a Solid> + 'a> {
        Box::new(shape.solids.iter())
    }

    fn solid_volume(&self, solid: &Solid) -> f64 {
        solid.volume()
    }

    fn shape_volume(&self, shape: &Shape) -> f64 {
        shape.volume()
    }
}
