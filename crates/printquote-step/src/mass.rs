//! Volume and bounding box from the boundary representation.
//!
//! Volume uses the divergence theorem: `V = 1/3 ∮ x·n dA`. Each face
//! contributes its flux `∫ x·n dA`, which is computed from the boundary
//! loops alone:
//!
//! - The vector area `∫ n dA` of any surface patch is `½ ∮ x × dx` over
//!   its boundary. Chords of sampled arcs fall short of it by the
//!   face's `segment_area`, which is added back.
//! - On a plane through `o`, `x·n` is constant, so the flux is `o·VA`.
//! - On a cone, `(x - apex)·n = 0`, so the flux is `apex·VA`.
//! - On a cylinder or sphere with centre `c`, `x·n = c·n ± r`, so the flux
//!   is `c·VA ± r·area`, with the area found by Green's theorem in the
//!   surface's angular parameterisation.

use std::f64::consts::{PI, TAU};

use tracing::debug;

use crate::entities::{AxisPlacement, Surface};
use crate::math::{Aabb, Point3, Vec3};
use crate::shape::{Face, Shape, Shell, Solid};

/// `½ Σ p_i × p_{i+1}` over closed loops.
pub fn vector_area(loops: &[Vec<Point3>]) -> Vec3 {
    loops
        .iter()
        .filter(|l| l.len() >= 3)
        .map(|l| {
            l.iter()
                .zip(l.iter().cycle().skip(1))
                .map(|(a, b)| a.coords.cross(&b.coords))
                .sum::<Vec3>()
        })
        .sum::<Vec3>()
        * 0.5
}

fn centroid(loops: &[Vec<Point3>]) -> Point3 {
    let (sum, count) = loops
        .iter()
        .flatten()
        .fold((Vec3::zeros(), 0usize), |(s, n), p| (s + p.coords, n + 1));
    if count == 0 {
        Point3::origin()
    } else {
        Point3::from(sum / count as f64)
    }
}

fn wrap_angle(d: f64) -> f64 {
    d - TAU * (d / TAU).round()
}

/// Winding `∮ dθ` and weighted integral `∮ w dθ` of a closed loop around
/// the Z axis of `frame`.
///
/// Points on the axis have no defined angle and are skipped; the step that
/// jumps across one uses the weight at the skipped point, which is exact
/// for a sphere pole.
fn angular_integrals(
    points: &[Point3],
    frame: &AxisPlacement,
    weight: impl Fn(&Vec3) -> f64,
) -> (f64, f64) {
    let local: Vec<Vec3> = points.iter().map(|p| frame.to_local(p)).collect();
    let n = local.len();
    let scale = local.iter().map(|l| l.norm()).fold(1.0, f64::max);
    let on_axis = |l: &Vec3| l.x.hypot(l.y) < 1e-9 * scale;

    let Some(first) = local.iter().position(|l| !on_axis(l)) else {
        return (0.0, 0.0);
    };

    let (mut winding, mut integral) = (0.0, 0.0);
    let mut prev = first;
    let mut skipped = None;
    for step in 1..=n {
        let j = (first + step) % n;
        let cur = &local[j];
        if on_axis(cur) {
            skipped = Some(j);
            continue;
        }
        let last = &local[prev];
        let dtheta = wrap_angle(cur.y.atan2(cur.x) - last.y.atan2(last.x));
        let w = match skipped.take() {
            Some(k) => weight(&local[k]),
            None => 0.5 * (weight(last) + weight(cur)),
        };
        winding += dtheta;
        integral += w * dtheta;
        prev = j;
    }
    (winding, integral)
}

/// Spherical face data: area and winding about the polar axis.
struct SphereCover {
    area: f64,
    winding: f64,
}

fn sphere_cover(face: &Face, placement: &AxisPlacement, radius: f64) -> SphereCover {
    if face.closed_surface {
        return SphereCover {
            area: 4.0 * PI * radius * radius,
            winding: 0.0,
        };
    }
    let sense = if face.same_sense { 1.0 } else { -1.0 };
    let (winding, lat) = face
        .loops
        .iter()
        .map(|l| angular_integrals(l, placement, |p| -p.z / radius))
        .fold((0.0, 0.0), |(w, i), (dw, di)| (w + dw, i + di));
    let (winding, lat) = (sense * winding, sense * lat);
    // Each pole the loops wind around adds 2π to the parameter-plane integral.
    let area = radius * radius * (lat + winding.abs()).clamp(0.0, 4.0 * PI);
    SphereCover { area, winding }
}

impl Face {
    /// Flux `∫ x·n dA` through this face along its outward normal.
    pub fn flux(&self) -> f64 {
        let va = vector_area(&self.loops) + self.segment_area;
        let sense = if self.same_sense { 1.0 } else { -1.0 };
        match &self.surface {
            Surface::Plane(placement) => placement.location.coords.dot(&va),
            Surface::Cone {
                placement,
                radius,
                semi_angle,
            } => Surface::cone_apex(placement, *radius, *semi_angle)
                .coords
                .dot(&va),
            Surface::Cylinder { placement, radius } => {
                let height_turns: f64 = self
                    .loops
                    .iter()
                    .map(|l| angular_integrals(l, placement, |p| p.z).1)
                    .sum();
                let area = radius * height_turns.abs();
                sense * radius * area + placement.location.coords.dot(&va)
            }
            Surface::Sphere { placement, radius } => {
                let cover = sphere_cover(self, placement, *radius);
                sense * radius * cover.area + placement.location.coords.dot(&va)
            }
            Surface::Other(name) => {
                debug!(face = self.id, surface = %name, "approximating face by its boundary");
                centroid(&self.loops).coords.dot(&va)
            }
        }
    }

    /// Bounding box of the boundary samples, grown to include sphere poles
    /// the face wraps around.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for p in self.loops.iter().flatten() {
            bounds.include(p);
        }
        if let Surface::Sphere { placement, radius } = &self.surface {
            let c = placement.location;
            if self.closed_surface {
                bounds.include(&(c - Vec3::repeat(*radius)));
                bounds.include(&(c + Vec3::repeat(*radius)));
            } else {
                let axis = placement.z_axis().into_inner() * *radius;
                let cover = sphere_cover(self, placement, *radius);
                if cover.winding > PI {
                    bounds.include(&(c + axis));
                } else if cover.winding < -PI {
                    bounds.include(&(c - axis));
                }
            }
        }
        bounds
    }
}

impl Shell {
    /// Signed enclosed volume; positive when face normals point outward.
    pub fn signed_volume(&self) -> f64 {
        self.faces.iter().map(Face::flux).sum::<f64>() / 3.0
    }

    /// Bounding box of all faces.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for face in &self.faces {
            bounds.merge(&face.bounds());
        }
        bounds
    }
}

impl Solid {
    /// Volume of the outer shell minus its voids, as a magnitude.
    pub fn volume(&self) -> f64 {
        let outer = self.outer().map_or(0.0, |s| s.signed_volume().abs());
        let voids: f64 = self.voids().map(|s| s.signed_volume().abs()).sum();
        (outer - voids).max(0.0)
    }

    /// Bounding box of the outer shell.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for shell in &self.shells {
            bounds.merge(&shell.bounds());
        }
        bounds
    }
}

impl Shape {
    /// Sum of solid volumes plus closed free shells.
    pub fn volume(&self) -> f64 {
        let solids: f64 = self.solids.iter().map(Solid::volume).sum();
        let shells: f64 = self
            .free_shells
            .iter()
            .filter(|s| s.is_closed)
            .map(|s| s.signed_volume().abs())
            .sum();
        solids + shells
    }

    /// Bounding box of every solid and free shell.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for solid in &self.solids {
            bounds.merge(&solid.bounds());
        }
        for shell in &self.free_shells {
            bounds.merge(&shell.bounds());
        }
        bounds
    }
}
