#![warn(missing_docs)]

//! STEP (ISO 10303-21) reader with B-rep mass properties.
//!
//! Reads the boundary representation of every solid in a STEP file and
//! computes volume and bounding box directly from it, without tessellating
//! surfaces. Planar, cylindrical, conical and spherical faces are handled
//! analytically; other surfaces are approximated by their boundary.
//!
//! # Example
//!
//! ```no_run
//! use printquote_step::read_step;
//!
//! let shape = read_step("part.step").unwrap();
//! println!("{} solids, {:.1} mm³", shape.solids.len(), shape.volume());
//! ```

mod entities;
mod error;
mod lexer;
mod mass;
mod math;
mod parser;
mod reader;
mod shape;

pub use entities::{AxisPlacement, BSplineCurve, Curve, Surface};
pub use error::{Result, StepError};
pub use mass::vector_area;
pub use math::{Aabb, Point3, Vec3};
pub use parser::{Parser, StepEntity, StepFile, StepRecord, StepValue};
pub use reader::{read_step, read_step_from_buffer};
pub use shape::{Face, Shape, Shell, Solid};
