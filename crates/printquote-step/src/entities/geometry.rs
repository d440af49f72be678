//! Points, directions, vectors, and axis placements.

use super::{require_record, EntityArgs};
use crate::error::StepError;
use crate::math::{Dir3, Point3, Vec3};
use crate::parser::StepFile;

fn triple(values: &[f64], id: u64, what: &str) -> Result<[f64; 3], StepError> {
    match values {
        [x, y, z, ..] => Ok([*x, *y, *z]),
        // 2D points lie in the z = 0 plane.
        [x, y] => Ok([*x, *y, 0.0]),
        _ => Err(StepError::parser(
            Some(id),
            format!("{what} needs 3 coordinates, got {}", values.len()),
        )),
    }
}

/// Parse a CARTESIAN_POINT entity.
///
/// STEP syntax: `CARTESIAN_POINT(name, (x, y, z))`
pub fn parse_cartesian_point(file: &StepFile, id: u64) -> Result<Point3, StepError> {
    let r = require_record(file, id, "CARTESIAN_POINT")?;
    let [x, y, z] = triple(&r.real_list(1)?, id, "CARTESIAN_POINT")?;
    Ok(Point3::new(x, y, z))
}

/// Parse a DIRECTION entity.
///
/// STEP syntax: `DIRECTION(name, (x, y, z))`
pub fn parse_direction(file: &StepFile, id: u64) -> Result<Dir3, StepError> {
    let r = require_record(file, id, "DIRECTION")?;
    let [x, y, z] = triple(&r.real_list(1)?, id, "DIRECTION")?;
    let v = Vec3::new(x, y, z);
    if v.norm() < 1e-15 {
        return Err(StepError::InvalidGeometry(format!(
            "zero-length direction #{id}"
        )));
    }
    Ok(Dir3::new_normalize(v))
}

/// Parse a VECTOR entity into a scaled vector.
///
/// STEP syntax: `VECTOR(name, direction, magnitude)`
pub fn parse_vector(file: &StepFile, id: u64) -> Result<Vec3, StepError> {
    let r = require_record(file, id, "VECTOR")?;
    let dir = parse_direction(file, r.entity_ref(1)?)?;
    Ok(r.real(2)? * dir.into_inner())
}

/// Local coordinate frame of a surface or conic.
#[derive(Debug, Clone)]
pub struct AxisPlacement {
    /// Location point.
    pub location: Point3,
    /// Z-axis direction.
    pub axis: Option<Dir3>,
    /// X-axis direction.
    pub ref_direction: Option<Dir3>,
}

impl AxisPlacement {
    /// Z-axis, +Z when unspecified.
    pub fn z_axis(&self) -> Dir3 {
        self.axis.unwrap_or_else(Vec3::z_axis)
    }

    /// X-axis, made orthogonal to Z; an arbitrary perpendicular when unspecified.
    pub fn x_axis(&self) -> Dir3 {
        let z = self.z_axis().into_inner();
        let candidate = match self.ref_direction {
            Some(x) => x.into_inner(),
            None if z.x.abs() < 0.9 => Vec3::x(),
            None => Vec3::y(),
        };
        let projected = candidate - candidate.dot(&z) * z;
        if projected.norm() < 1e-12 {
            let fallback = if z.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
            Dir3::new_normalize(fallback - fallback.dot(&z) * z)
        } else {
            Dir3::new_normalize(projected)
        }
    }

    /// Y-axis (Z cross X).
    pub fn y_axis(&self) -> Dir3 {
        Dir3::new_normalize(
            self.z_axis()
                .into_inner()
                .cross(&self.x_axis().into_inner()),
        )
    }

    /// Map local `(x, y, z)` to world coordinates.
    pub fn to_world(&self, x: f64, y: f64, z: f64) -> Point3 {
        self.location
            + x * self.x_axis().into_inner()
            + y * self.y_axis().into_inner()
            + z * self.z_axis().into_inner()
    }

    /// Map a world point to local `(x, y, z)`.
    pub fn to_local(&self, p: &Point3) -> Vec3 {
        let d = p - self.location;
        Vec3::new(
            d.dot(&self.x_axis().into_inner()),
            d.dot(&self.y_axis().into_inner()),
            d.dot(&self.z_axis().into_inner()),
        )
    }
}

/// Parse an AXIS2_PLACEMENT_3D or AXIS1_PLACEMENT entity.
///
/// STEP syntax: `AXIS2_PLACEMENT_3D(name, location, axis, ref_direction)`
pub fn parse_axis_placement(file: &StepFile, id: u64) -> Result<AxisPlacement, StepError> {
    let entity = file.require(id)?;
    let has_ref = match entity.type_name() {
        "AXIS2_PLACEMENT_3D" => true,
        "AXIS1_PLACEMENT" => false,
        other => return Err(StepError::type_mismatch("AXIS2_PLACEMENT_3D", other)),
    };
    let r = require_record(file, id, entity.type_name())?;

    let location = parse_cartesian_point(file, r.entity_ref(1)?)?;
    let axis = if r.is_null(2) {
        None
    } else {
        Some(parse_direction(file, r.entity_ref(2)?)?)
    };
    let ref_direction = if has_ref && !r.is_null(3) {
        Some(parse_direction(file, r.entity_ref(3)?)?)
    } else {
        None
    };

    Ok(AxisPlacement {
        location,
        axis,
        ref_direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::parse_data;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_cartesian_point() {
        let file = parse_data("#1 = CARTESIAN_POINT('origin', (1.0, 2.0, 3.0));");
        let p = parse_cartesian_point(&file, 1).unwrap();
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_parse_direction_normalizes() {
        let file = parse_data("#1 = DIRECTION('', (0.0, 0.0, 2.0));");
        let d = parse_direction(&file, 1).unwrap();
        assert_relative_eq!(d.z, 1.0);
    }

    #[test]
    fn test_zero_direction_rejected() {
        let file = parse_data("#1 = DIRECTION('', (0.0, 0.0, 0.0));");
        assert!(matches!(
            parse_direction(&file, 1),
            Err(StepError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_wrong_type_is_mismatch() {
        let file = parse_data("#1 = DIRECTION('', (0.0, 0.0, 1.0));");
        assert!(matches!(
            parse_cartesian_point(&file, 1),
            Err(StepError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_vector() {
        let file = parse_data(
            "#1 = DIRECTION('', (1.0, 0.0, 0.0));\n#2 = VECTOR('', #1, 4.0);",
        );
        assert_relative_eq!(parse_vector(&file, 2).unwrap(), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_axis_placement_frame() {
        let file = parse_data(
            "#1 = CARTESIAN_POINT('', (1.0, 2.0, 3.0));
#2 = DIRECTION('', (0.0, 0.0, -1.0));
#3 = DIRECTION('', (1.0, 0.0, 0.0));
#4 = AXIS2_PLACEMENT_3D('', #1, #2, #3);",
        );
        let placement = parse_axis_placement(&file, 4).unwrap();
        assert_relative_eq!(placement.y_axis().y, -1.0);

        let world = placement.to_world(1.0, 1.0, 1.0);
        assert_relative_eq!(world, Point3::new(2.0, 1.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(
            placement.to_local(&world),
            Vec3::new(1.0, 1.0, 1.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_axis_placement_defaults() {
        let file = parse_data(
            "#1 = CARTESIAN_POINT('', (0.0, 0.0, 0.0));\n#2 = AXIS2_PLACEMENT_3D('', #1, $, $);",
        );
        let placement = parse_axis_placement(&file, 2).unwrap();
        assert_relative_eq!(placement.z_axis().z, 1.0);
        assert_relative_eq!(placement.x_axis().x, 1.0);
    }
}
