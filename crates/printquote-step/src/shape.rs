//! Boundary representation assembled by the reader.
//!
//! Faces keep their analytic surface alongside polygonized boundary loops;
//! that is all the mass-property code needs.

use crate::entities::Surface;
use crate::math::{Point3, Vec3};

/// A face with its surface and sampled boundary.
#[derive(Debug, Clone)]
pub struct Face {
    /// Face entity ID.
    pub id: u64,
    /// Underlying surface.
    pub surface: Surface,
    /// Whether the face normal agrees with the surface normal.
    pub same_sense: bool,
    /// Closed boundary polylines, outer bound first, counter-clockwise about
    /// the face normal for outer bounds. The closing point is not repeated.
    pub loops: Vec<Vec<Point3>>,
    /// Vector area between the true boundary curves and the chords in
    /// `loops`, oriented like `loops`.
    pub segment_area: Vec3,
    /// True when every boundary edge is a seam used twice (or there are no
    /// edge loops), i.e. the face covers its whole closed surface.
    pub closed_surface: bool,
}

/// A connected set of faces.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Shell entity ID.
    pub id: u64,
    /// Faces.
    pub faces: Vec<Face>,
    /// CLOSED_SHELL rather than OPEN_SHELL.
    pub is_closed: bool,
    /// Inner boundary of a BREP_WITH_VOIDS.
    pub is_void: bool,
}

/// A B-rep solid: one outer shell and any number of voids.
#[derive(Debug, Clone)]
pub struct Solid {
    /// Solid entity ID.
    pub id: u64,
    /// Shells; the outer shell is first.
    pub shells: Vec<Shell>,
}

impl Solid {
    /// The outer shell.
    pub fn outer(&self) -> Option<&Shell> {
        self.shells.iter().find(|s| !s.is_void)
    }

    /// Void shells.
    pub fn voids(&self) -> impl Iterator<Item = &Shell> {
        self.shells.iter().filter(|s| s.is_void)
    }
}

/// Everything geometric read from one STEP file.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    /// Solids, in entity ID order.
    pub solids: Vec<Solid>,
    /// Shells not owned by any solid.
    pub free_shells: Vec<Shell>,
}

impl Shape {
    /// Total number of faces across solids and free shells.
    pub fn face_count(&self) -> usize {
        self.solids
            .iter()
            .flat_map(|s| &s.shells)
            .chain(&self.free_shells)
            .map(|s| s.faces.len())
            .sum()
    }
}
