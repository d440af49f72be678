//! Face surfaces: planes, cylinders, cones, spheres.

use std::f64::consts::FRAC_PI_2;

use super::{parse_axis_placement, AxisPlacement, EntityArgs, RecordRef};
use crate::error::StepError;
use crate::math::Point3;
use crate::parser::StepFile;

/// A surface parsed from STEP.
#[derive(Debug, Clone)]
pub enum Surface {
    /// Plane through the placement origin, normal along its Z axis.
    Plane(AxisPlacement),
    /// Cylinder around the placement Z axis.
    Cylinder {
        /// Axis frame.
        placement: AxisPlacement,
        /// Radius.
        radius: f64,
    },
    /// Cone around the placement Z axis.
    Cone {
        /// Axis frame; `radius` is measured in its XY plane.
        placement: AxisPlacement,
        /// Radius at the placement origin.
        radius: f64,
        /// Half angle in radians.
        semi_angle: f64,
    },
    /// Sphere centred at the placement origin.
    Sphere {
        /// Frame; its Z axis defines the poles.
        placement: AxisPlacement,
        /// Radius.
        radius: f64,
    },
    /// Anything else (B-spline, toroidal, swept surfaces).
    Other(String),
}

impl Surface {
    /// Apex of a cone.
    pub fn cone_apex(placement: &AxisPlacement, radius: f64, semi_angle: f64) -> Point3 {
        let tan = semi_angle.tan();
        let distance = if tan.abs() > 1e-15 { radius / tan } else { 0.0 };
        placement.location - distance * placement.z_axis().into_inner()
    }
}

fn positive_radius(r: &RecordRef<'_>, idx: usize) -> Result<f64, StepError> {
    let radius = r.real(idx)?;
    if radius > 0.0 {
        Ok(radius)
    } else {
        Err(StepError::InvalidGeometry(format!(
            "{} #{} has non-positive radius {radius}",
            r.name(),
            r.id
        )))
    }
}

/// Parse any surface entity; unrecognised types become [`Surface::Other`].
pub fn parse_surface(file: &StepFile, id: u64) -> Result<Surface, StepError> {
    let entity = file.require(id)?;
    if entity.is_complex() {
        // Complex surfaces are rational B-spline surfaces in practice.
        return Ok(Surface::Other(entity.type_name().to_string()));
    }
    let r = RecordRef {
        id,
        record: &entity.records[0],
    };

    match r.name() {
        "PLANE" => Ok(Surface::Plane(parse_axis_placement(file, r.entity_ref(1)?)?)),
        "CYLINDRICAL_SURFACE" => Ok(Surface::Cylinder {
            placement: parse_axis_placement(file, r.entity_ref(1)?)?,
            radius: positive_radius(&r, 2)?,
        }),
        "CONICAL_SURFACE" => {
            let radius = r.real(2)?;
            if radius < 0.0 {
                return Err(StepError::InvalidGeometry(format!(
                    "CONICAL_SURFACE #{id} has negative radius {radius}"
                )));
            }
            let mut semi_angle = r.real(3)?;
            // Plane angle units other than radians show up as values above 90.
            if semi_angle > FRAC_PI_2 {
                semi_angle = semi_angle.to_radians();
            }
            Ok(Surface::Cone {
                placement: parse_axis_placement(file, r.entity_ref(1)?)?,
                radius,
                semi_angle,
            })
        }
        "SPHERICAL_SURFACE" => Ok(Surface::Sphere {
            placement: parse_axis_placement(file, r.entity_ref(1)?)?,
            radius: positive_radius(&r, 2)?,
        }),
        other => Ok(Surface::Other(other.to_string())),
    }
}
