//! STEP file reader: converts parsed STEP data into a [`Shape`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::entities::{
    parse_cartesian_point, parse_curve, parse_edge_curve, parse_face, parse_loop, parse_shell,
    parse_solid, parse_surface, parse_vertex_point, Loop, Surface, SOLID_TYPES,
};
use crate::error::{Result, StepError};
use crate::math::{Point3, Vec3};
use crate::parser::{Parser, StepFile};
use crate::shape::{Face, Shape, Shell, Solid};

/// Read a STEP file from a path.
pub fn read_step(path: impl AsRef<Path>) -> Result<Shape> {
    let data = std::fs::read(path)?;
    read_step_from_buffer(&data)
}

/// Read a STEP file from a byte buffer.
pub fn read_step_from_buffer(data: &[u8]) -> Result<Shape> {
    let step_file = Parser::parse(data)?;
    StepReader::new(&step_file).read_shape()
}

/// An edge as a polyline plus the vector area its chords cut off.
#[derive(Debug, Clone)]
struct EdgeSamples {
    points: Vec<Point3>,
    segment_area: Vec3,
}

/// Context for walking the entity graph of one file.
struct StepReader<'a> {
    file: &'a StepFile,
    /// Sampled polyline and chord correction per EDGE_CURVE, in edge
    /// direction.
    edges: HashMap<u64, EdgeSamples>,
    /// Vertex positions per VERTEX_POINT.
    vertices: HashMap<u64, Point3>,
}

impl<'a> StepReader<'a> {
    fn new(file: &'a StepFile) -> Self {
        Self {
            file,
            edges: HashMap::new(),
            vertices: HashMap::new(),
        }
    }

    fn read_shape(&mut self) -> Result<Shape> {
        let mut solid_ids: Vec<u64> = SOLID_TYPES
            .iter()
            .flat_map(|t| self.file.entities_of_type(t))
            .map(|e| e.id)
            .collect();
        solid_ids.sort_unstable();
        solid_ids.dedup();

        let mut owned: HashSet<u64> = HashSet::new();
        let mut solids = Vec::with_capacity(solid_ids.len());
        for id in solid_ids {
            let solid = self.read_solid(id)?;
            owned.extend(solid.shells.iter().map(|s| s.id));
            solids.push(solid);
        }

        let mut free_shells = Vec::new();
        let mut shell_ids: Vec<u64> = ["CLOSED_SHELL", "OPEN_SHELL"]
            .iter()
            .flat_map(|t| self.file.entities_of_type(t))
            .map(|e| e.id)
            .filter(|id| !owned.contains(id))
            .collect();
        shell_ids.sort_unstable();
        for id in shell_ids {
            free_shells.push(self.read_shell(id, false)?);
        }

        if solids.is_empty() && free_shells.is_empty() {
            return Err(StepError::NoShape);
        }
        debug!(
            solids = solids.len(),
            free_shells = free_shells.len(),
            "read STEP shape"
        );
        Ok(Shape {
            solids,
            free_shells,
        })
    }

    fn read_solid(&mut self, id: u64) -> Result<Solid> {
        let entity = parse_solid(self.file, id)?;
        let mut shells = vec![self.read_shell(entity.outer_shell, false)?];
        for void in entity.voids {
            shells.push(self.read_shell(void, true)?);
        }
        Ok(Solid { id, shells })
    }

    fn read_shell(&mut self, id: u64, is_void: bool) -> Result<Shell> {
        let entity = parse_shell(self.file, id)?;
        let faces = entity
            .face_ids
            .iter()
            .map(|&f| self.read_face(f))
            .collect::<Result<Vec<_>>>()?;
        Ok(Shell {
            id: entity.id,
            faces,
            is_closed: entity.is_closed,
            is_void,
        })
    }

    fn read_face(&mut self, id: u64) -> Result<Face> {
        let mut entity = parse_face(self.file, id)?;
        entity.bounds.sort_by_key(|b| !b.is_outer);
        let surface = match entity.surface_id {
            Some(s) => parse_surface(self.file, s)?,
            None => Surface::Other("FACE".into()),
        };

        let mut loops = Vec::with_capacity(entity.bounds.len());
        let mut segment_area = Vec3::zeros();
        let mut edge_uses: HashMap<u64, usize> = HashMap::new();
        let mut has_boundary = false;
        for bound in &entity.bounds {
            let mut correction = Vec3::zeros();
            let mut points = match parse_loop(self.file, bound.loop_id)? {
                Loop::Edges(edges) => {
                    has_boundary |= !edges.is_empty();
                    let mut points = Vec::new();
                    for oe in edges {
                        *edge_uses.entry(oe.edge_id).or_default() += 1;
                        let edge = self.edge_samples(oe.edge_id)?;
                        let n = edge.points.len();
                        if oe.orientation {
                            points.extend_from_slice(&edge.points[..n - 1]);
                            correction += edge.segment_area;
                        } else {
                            points.extend(edge.points[1..].iter().rev());
                            correction -= edge.segment_area;
                        }
                    }
                    points
                }
                Loop::Poly(point_ids) => {
                    has_boundary |= !point_ids.is_empty();
                    point_ids
                        .iter()
                        .map(|&p| parse_cartesian_point(self.file, p))
                        .collect::<Result<Vec<_>>>()?
                }
                Loop::Vertex(v) => vec![self.vertex(v)?],
            };
            if !bound.orientation {
                points.reverse();
                correction = -correction;
            }
            segment_area += correction;
            loops.push(points);
        }

        let closed_surface = !has_boundary
            || (!edge_uses.is_empty() && edge_uses.values().all(|&n| n % 2 == 0));
        Ok(Face {
            id,
            surface,
            same_sense: entity.same_sense,
            loops,
            segment_area,
            closed_surface,
        })
    }

    fn vertex(&mut self, id: u64) -> Result<Point3> {
        if let Some(p) = self.vertices.get(&id) {
            return Ok(*p);
        }
        let p = parse_vertex_point(self.file, id)?;
        self.vertices.insert(id, p);
        Ok(p)
    }

    /// Samples along an edge from its start vertex to its end vertex.
    /// Always at least two points.
    fn edge_samples(&mut self, id: u64) -> Result<EdgeSamples> {
        if let Some(edge) = self.edges.get(&id) {
            return Ok(edge.clone());
        }
        let edge = parse_edge_curve(self.file, id)?;
        let start = self.vertex(edge.start_vertex)?;
        let end = self.vertex(edge.end_vertex)?;
        let closed = edge.start_vertex == edge.end_vertex || (start - end).norm() < 1e-12;
        let curve = parse_curve(self.file, edge.curve_id)?;
        let samples = EdgeSamples {
            points: curve.sample_between(start, end, closed, edge.same_sense),
            segment_area: curve.segment_area(&start, &end, closed, edge.same_sense),
        };
        self.edges.insert(id, samples.clone());
        Ok(samples)
    }
}
