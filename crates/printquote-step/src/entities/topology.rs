//! Topology entities: vertex, edge, loop, face, shell, and solid.
//!
//! These parsers resolve one level of references only; the reader walks
//! the graph and attaches geometry.

use super::{parse_cartesian_point, primary_record, require_record, EntityArgs};
use crate::error::StepError;
use crate::math::Point3;
use crate::parser::StepFile;

/// Parsed EDGE_CURVE entity.
#[derive(Debug, Clone)]
pub struct EdgeCurve {
    /// Start vertex entity ID.
    pub start_vertex: u64,
    /// End vertex entity ID.
    pub end_vertex: u64,
    /// Curve entity ID.
    pub curve_id: u64,
    /// Whether the curve direction matches the edge direction.
    pub same_sense: bool,
}

/// Parsed ORIENTED_EDGE entity.
#[derive(Debug, Clone, Copy)]
pub struct OrientedEdge {
    /// The underlying EDGE_CURVE ID.
    pub edge_id: u64,
    /// Whether the loop traverses the edge start to end.
    pub orientation: bool,
}

/// A face boundary loop.
#[derive(Debug, Clone)]
pub enum Loop {
    /// EDGE_LOOP.
    Edges(Vec<OrientedEdge>),
    /// VERTEX_LOOP: a degenerate loop at a single point (cone apex, sphere pole).
    Vertex(u64),
    /// POLY_LOOP: straight segments through the listed points.
    Poly(Vec<u64>),
}

/// Parsed FACE_BOUND / FACE_OUTER_BOUND entity.
#[derive(Debug, Clone)]
pub struct FaceBound {
    /// Loop entity ID.
    pub loop_id: u64,
    /// False when the loop is traversed in reverse.
    pub orientation: bool,
    /// Whether this is an outer bound.
    pub is_outer: bool,
}

/// Parsed ADVANCED_FACE, FACE_SURFACE, or bare FACE entity.
#[derive(Debug, Clone)]
pub struct FaceEntity {
    /// Face bounds.
    pub bounds: Vec<FaceBound>,
    /// Surface geometry, absent on a bare FACE.
    pub surface_id: Option<u64>,
    /// Whether the face normal matches the surface normal.
    pub same_sense: bool,
}

/// Parsed CLOSED_SHELL / OPEN_SHELL entity.
#[derive(Debug, Clone)]
pub struct ShellEntity {
    /// The entity ID.
    pub id: u64,
    /// Face entity IDs.
    pub face_ids: Vec<u64>,
    /// Whether the shell is closed.
    pub is_closed: bool,
}

/// Parsed solid entity.
#[derive(Debug, Clone)]
pub struct SolidEntity {
    /// The outer shell entity ID.
    pub outer_shell: u64,
    /// Void shell entity IDs (BREP_WITH_VOIDS).
    pub voids: Vec<u64>,
}

/// Solid type names recognised by the reader.
pub const SOLID_TYPES: [&str; 3] = ["MANIFOLD_SOLID_BREP", "BREP_WITH_VOIDS", "FACETED_BREP"];

/// Parse a VERTEX_POINT entity into its position.
pub fn parse_vertex_point(file: &StepFile, id: u64) -> Result<Point3, StepError> {
    let r = require_record(file, id, "VERTEX_POINT")?;
    parse_cartesian_point(file, r.entity_ref(1)?)
}

/// Parse an EDGE_CURVE entity.
///
/// STEP syntax: `EDGE_CURVE(name, start, end, curve, same_sense)`
pub fn parse_edge_curve(file: &StepFile, id: u64) -> Result<EdgeCurve, StepError> {
    let r = require_record(file, id, "EDGE_CURVE")?;
    Ok(EdgeCurve {
        start_vertex: r.entity_ref(1)?,
        end_vertex: r.entity_ref(2)?,
        curve_id: r.entity_ref(3)?,
        same_sense: r.boolean(4)?,
    })
}

/// Parse an ORIENTED_EDGE entity.
///
/// STEP syntax: `ORIENTED_EDGE(name, *, *, edge_element, orientation)`
pub fn parse_oriented_edge(file: &StepFile, id: u64) -> Result<OrientedEdge, StepError> {
    let r = require_record(file, id, "ORIENTED_EDGE")?;
    Ok(OrientedEdge {
        edge_id: r.entity_ref(3)?,
        orientation: r.boolean(4)?,
    })
}

/// Parse an EDGE_LOOP, VERTEX_LOOP, or POLY_LOOP entity.
pub fn parse_loop(file: &StepFile, id: u64) -> Result<Loop, StepError> {
    let r = primary_record(file, id, &["EDGE_LOOP", "VERTEX_LOOP", "POLY_LOOP"])?;
    match r.name() {
        "EDGE_LOOP" => Ok(Loop::Edges(
            r.entity_ref_list(1)?
                .into_iter()
                .map(|oe| parse_oriented_edge(file, oe))
                .collect::<Result<_, _>>()?,
        )),
        "VERTEX_LOOP" => Ok(Loop::Vertex(r.entity_ref(1)?)),
        "POLY_LOOP" => Ok(Loop::Poly(r.entity_ref_list(1)?)),
        other => Err(StepError::type_mismatch("EDGE_LOOP", other)),
    }
}

/// Parse a FACE_BOUND or FACE_OUTER_BOUND entity.
///
/// STEP syntax: `FACE_BOUND(name, loop, orientation)`
pub fn parse_face_bound(file: &StepFile, id: u64) -> Result<FaceBound, StepError> {
    let r = primary_record(file, id, &["FACE_OUTER_BOUND", "FACE_BOUND"])?;
    let is_outer = match r.name() {
        "FACE_OUTER_BOUND" => true,
        "FACE_BOUND" => false,
        other => return Err(StepError::type_mismatch("FACE_BOUND", other)),
    };
    Ok(FaceBound {
        loop_id: r.entity_ref(1)?,
        orientation: r.boolean(2)?,
        is_outer,
    })
}

/// Parse an ADVANCED_FACE, FACE_SURFACE, or FACE entity.
///
/// STEP syntax: `ADVANCED_FACE(name, bounds, surface, same_sense)`
pub fn parse_face(file: &StepFile, id: u64) -> Result<FaceEntity, StepError> {
    let r = primary_record(file, id, &["ADVANCED_FACE", "FACE_SURFACE"])?;
    let (surface_id, same_sense) = match r.name() {
        "ADVANCED_FACE" | "FACE_SURFACE" => (Some(r.entity_ref(2)?), r.boolean(3)?),
        "FACE" => (None, true),
        other => return Err(StepError::type_mismatch("ADVANCED_FACE", other)),
    };
    let bounds = r
        .entity_ref_list(1)?
        .into_iter()
        .map(|b| parse_face_bound(file, b))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FaceEntity {
        bounds,
        surface_id,
        same_sense,
    })
}

/// Parse a CLOSED_SHELL or OPEN_SHELL entity, following ORIENTED_CLOSED_SHELL
/// to the shell it wraps.
pub fn parse_shell(file: &StepFile, id: u64) -> Result<ShellEntity, StepError> {
    let r = primary_record(file, id, &["CLOSED_SHELL", "OPEN_SHELL"])?;
    let is_closed = match r.name() {
        "CLOSED_SHELL" => true,
        "OPEN_SHELL" => false,
        // ORIENTED_CLOSED_SHELL(name, *, closed_shell_element, orientation)
        "ORIENTED_CLOSED_SHELL" => return parse_shell(file, r.entity_ref(2)?),
        other => return Err(StepError::type_mismatch("CLOSED_SHELL", other)),
    };
    Ok(ShellEntity {
        id,
        face_ids: r.entity_ref_list(1)?,
        is_closed,
    })
}

/// Parse a MANIFOLD_SOLID_BREP, BREP_WITH_VOIDS, or FACETED_BREP entity.
///
/// STEP syntax: `MANIFOLD_SOLID_BREP(name, outer)`,
/// `BREP_WITH_VOIDS(name, outer, (voids))`
pub fn parse_solid(file: &StepFile, id: u64) -> Result<SolidEntity, StepError> {
    let entity = file.require(id)?;
    let name = SOLID_TYPES
        .iter()
        .find(|name| entity.has_record(name))
        .ok_or_else(|| StepError::type_mismatch("MANIFOLD_SOLID_BREP", entity.type_name()))?;
    let r = require_record(file, id, name)?;
    let voids = if *name == "BREP_WITH_VOIDS" {
        r.entity_ref_list(2)?
    } else {
        Vec::new()
    };
    Ok(SolidEntity {
        outer_shell: r.entity_ref(1)?,
        voids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::parse_data;

    #[test]
    fn test_parse_edge_chain() {
        let file = parse_data(
            "#1 = CARTESIAN_POINT('', (0.0, 0.0, 0.0));
#2 = VERTEX_POINT('', #1);
#3 = EDGE_CURVE('', #2, #2, #9, .F.);
#4 = ORIENTED_EDGE('', *, *, #3, .T.);
#5 = EDGE_LOOP('', (#4));
#6 = FACE_OUTER_BOUND('', #5, .F.);
#7 = ADVANCED_FACE('', (#6), #8, .T.);",
        );
        assert_eq!(parse_vertex_point(&file, 2).unwrap(), Point3::origin());

        let edge = parse_edge_curve(&file, 3).unwrap();
        assert_eq!(edge.curve_id, 9);
        assert!(!edge.same_sense);

        match parse_loop(&file, 5).unwrap() {
            Loop::Edges(edges) => {
                assert_eq!(edges.len(), 1);
                assert_eq!(edges[0].edge_id, 3);
                assert!(edges[0].orientation);
            }
            other => panic!("expected edge loop, got {other:?}"),
        }

        let face = parse_face(&file, 7).unwrap();
        assert_eq!(face.surface_id, Some(8));
        assert!(face.bounds[0].is_outer);
        assert!(!face.bounds[0].orientation);
    }

    #[test]
    fn test_oriented_closed_shell_resolves() {
        let file = parse_data(
            "#1 = CLOSED_SHELL('', (#10, #11));
#2 = ORIENTED_CLOSED_SHELL('', *, #1, .F.);
#3 = OPEN_SHELL('', (#12));",
        );
        let shell = parse_shell(&file, 2).unwrap();
        assert_eq!(shell.id, 1);
        assert!(shell.is_closed);
        assert_eq!(shell.face_ids, vec![10, 11]);
        assert!(!parse_shell(&file, 3).unwrap().is_closed);
    }

    #[test]
    fn test_parse_solids() {
        let file = parse_data(
            "#1 = MANIFOLD_SOLID_BREP('', #5);
#2 = BREP_WITH_VOIDS('', #5, (#6, #7));
#3 = FACETED_BREP('', #8);",
        );
        assert_eq!(parse_solid(&file, 1).unwrap().outer_shell, 5);
        assert_eq!(parse_solid(&file, 2).unwrap().voids, vec![6, 7]);
        assert!(parse_solid(&file, 3).unwrap().voids.is_empty());
    }

    #[test]
    fn test_wrong_loop_type() {
        let file = parse_data("#1 = CARTESIAN_POINT('', (0.0, 0.0, 0.0));");
        assert!(matches!(
            parse_loop(&file, 1),
            Err(StepError::TypeMismatch { .. })
        ));
    }
}
