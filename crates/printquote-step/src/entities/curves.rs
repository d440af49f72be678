//! Edge curves and their polyline sampling.
//!
//! Curves are only ever used to trace the boundary of a face, so each one
//! knows how to produce a polyline between two vertices. Conics are sampled
//! at a fixed angular step; B-splines and polylines are sampled densely and
//! trimmed at the samples nearest to the vertices.

use std::f64::consts::TAU;

use tracing::debug;

use super::{parse_axis_placement, parse_cartesian_point, parse_vector, require_record};
use super::{AxisPlacement, EntityArgs, RecordRef};
use crate::error::StepError;
use crate::math::{Point3, Vec3};
use crate::parser::StepFile;

/// Angular sampling step for circles and ellipses (5 degrees).
pub const ARC_STEP: f64 = TAU / 72.0;

/// A curve parsed from STEP.
#[derive(Debug, Clone)]
pub enum Curve {
    /// Infinite line through `origin` along `direction`.
    Line {
        /// A point on the line.
        origin: Point3,
        /// Direction vector.
        direction: Vec3,
    },
    /// Circle in the XY plane of `placement`.
    Circle {
        /// Frame; the circle is centred at its origin.
        placement: AxisPlacement,
        /// Radius.
        radius: f64,
    },
    /// Ellipse in the XY plane of `placement`.
    Ellipse {
        /// Frame; the ellipse is centred at its origin.
        placement: AxisPlacement,
        /// Semi-axis along local X.
        semi_axis_1: f64,
        /// Semi-axis along local Y.
        semi_axis_2: f64,
    },
    /// Polynomial or rational B-spline.
    BSpline(BSplineCurve),
    /// Open polyline.
    Polyline(Vec<Point3>),
    /// Anything else; sampled as a straight segment.
    Unsupported(String),
}

/// A B-spline curve with an expanded knot vector.
#[derive(Debug, Clone)]
pub struct BSplineCurve {
    /// Polynomial degree.
    pub degree: usize,
    /// Control points.
    pub control_points: Vec<Point3>,
    /// Weights for rational curves.
    pub weights: Option<Vec<f64>>,
    /// Knot vector with multiplicities expanded.
    pub knots: Vec<f64>,
}

impl BSplineCurve {
    /// Build from STEP's multiplicity/knot pair, validating sizes.
    pub fn new(
        degree: usize,
        control_points: Vec<Point3>,
        weights: Option<Vec<f64>>,
        multiplicities: &[i64],
        distinct_knots: &[f64],
    ) -> Result<Self, StepError> {
        if multiplicities.len() != distinct_knots.len() {
            return Err(StepError::InvalidGeometry(
                "knot multiplicities and knots differ in length".into(),
            ));
        }
        if degree == 0 || control_points.len() <= degree {
            return Err(StepError::InvalidGeometry(format!(
                "B-spline of degree {degree} needs more than {degree} control points"
            )));
        }
        let expected = control_points.len() + degree + 1;
        // Count before expanding.
        let total = multiplicities
            .iter()
            .try_fold(0usize, |acc, &m| usize::try_from(m).ok().and_then(|m| acc.checked_add(m)));
        match total {
            Some(n) if n == expected => {}
            Some(n) => {
                return Err(StepError::InvalidGeometry(format!(
                    "B-spline has {n} knots, expected {expected}"
                )))
            }
            None => {
                return Err(StepError::InvalidGeometry(
                    "B-spline knot multiplicities must be non-negative and bounded".into(),
                ))
            }
        }
        let knots: Vec<f64> = multiplicities
            .iter()
            .zip(distinct_knots)
            .flat_map(|(&m, &k)| std::iter::repeat(k).take(m as usize))
            .collect();
        if let Some(w) = &weights {
            if w.len() != control_points.len() || w.iter().any(|&w| w <= 0.0) {
                return Err(StepError::InvalidGeometry(
                    "rational B-spline weights must be positive, one per control point".into(),
                ));
            }
        }
        Ok(Self {
            degree,
            control_points,
            weights,
            knots,
        })
    }

    /// Valid parameter range.
    pub fn domain(&self) -> (f64, f64) {
        let n = self.control_points.len();
        (self.knots[self.degree], self.knots[n])
    }

    /// Evaluate at parameter `t` with de Boor's algorithm.
    pub fn evaluate(&self, t: f64) -> Point3 {
        let p = self.degree;
        let n = self.control_points.len();
        let (lo, hi) = self.domain();
        let t = t.clamp(lo, hi);

        // Knot span k with knots[k] <= t < knots[k + 1], clamped into [p, n - 1].
        let mut k = p;
        while k + 1 < n && self.knots[k + 1] <= t {
            k += 1;
        }

        let weight = |i: usize| self.weights.as_ref().map_or(1.0, |w| w[i]);
        let mut d: Vec<(Vec3, f64)> = (0..=p)
            .map(|j| {
                let i = j + k - p;
                let w = weight(i);
                (self.control_points[i].coords * w, w)
            })
            .collect();

        for r in 1..=p {
            for j in (r..=p).rev() {
                let i = j + k - p;
                let denom = self.knots[i + p + 1 - r] - self.knots[i];
                let alpha = if denom.abs() < 1e-15 {
                    0.0
                } else {
                    (t - self.knots[i]) / denom
                };
                let (prev_p, prev_w) = d[j - 1];
                let (cur_p, cur_w) = d[j];
                d[j] = (
                    prev_p * (1.0 - alpha) + cur_p * alpha,
                    prev_w * (1.0 - alpha) + cur_w * alpha,
                );
            }
        }

        let (point, w) = d[p];
        Point3::from(point / w)
    }

    /// `count + 1` samples uniformly spaced over the domain.
    pub fn sample(&self, count: usize) -> Vec<Point3> {
        let (lo, hi) = self.domain();
        (0..=count)
            .map(|i| self.evaluate(lo + (hi - lo) * i as f64 / count as f64))
            .collect()
    }
}

impl Curve {
    /// Vector area lost by replacing this curve with the chords of
    /// [`Curve::sample_between`]; zero for curves sampled exactly or
    /// approximated by their samples.
    pub fn segment_area(&self, start: &Point3, end: &Point3, closed: bool, same_sense: bool) -> Vec3 {
        match self {
            Curve::Circle { placement, radius } => {
                conic_segment_area(placement, *radius, *radius, start, end, closed, same_sense)
            }
            Curve::Ellipse {
                placement,
                semi_axis_1,
                semi_axis_2,
            } => conic_segment_area(
                placement,
                *semi_axis_1,
                *semi_axis_2,
                start,
                end,
                closed,
                same_sense,
            ),
            _ => Vec3::zeros(),
        }
    }

    /// Polyline from `start` to `end` along this curve.
    ///
    /// `closed` marks an edge whose two vertices coincide, which sweeps the
    /// whole curve. `same_sense` is false when the edge runs against the
    /// curve's parameterisation. The result always begins at `start` and
    /// ends at `end`.
    pub fn sample_between(
        &self,
        start: Point3,
        end: Point3,
        closed: bool,
        same_sense: bool,
    ) -> Vec<Point3> {
        match self {
            Curve::Line { .. } => vec![start, end],
            Curve::Circle { placement, radius } => {
                sample_conic(placement, *radius, *radius, start, end, closed, same_sense)
            }
            Curve::Ellipse {
                placement,
                semi_axis_1,
                semi_axis_2,
            } => sample_conic(
                placement,
                *semi_axis_1,
                *semi_axis_2,
                start,
                end,
                closed,
                same_sense,
            ),
            Curve::BSpline(spline) => {
                let count = (spline.control_points.len() * 8).max(64);
                trim_samples(&spline.sample(count), start, end, closed, same_sense)
            }
            Curve::Polyline(points) => trim_samples(points, start, end, closed, same_sense),
            Curve::Unsupported(name) => {
                debug!(curve = %name, "unsupported curve, using straight segment");
                vec![start, end]
            }
        }
    }
}

/// Start parameter, signed sweep and segment count of a conic arc.
fn conic_sweep(
    placement: &AxisPlacement,
    a: f64,
    b: f64,
    start: &Point3,
    end: &Point3,
    closed: bool,
    same_sense: bool,
) -> (f64, f64, usize) {
    let angle_of = |p: &Point3| {
        let local = placement.to_local(p);
        (local.y / b).atan2(local.x / a)
    };
    let t0 = angle_of(start);
    let t1 = angle_of(end);

    let sweep = if closed {
        TAU
    } else if same_sense {
        (t1 - t0).rem_euclid(TAU)
    } else {
        (t0 - t1).rem_euclid(TAU)
    };
    let sweep = if same_sense { sweep } else { -sweep };

    let steps = ((sweep.abs() / ARC_STEP - 1e-9).ceil() as usize).max(1);
    (t0, sweep, steps)
}

fn sample_conic(
    placement: &AxisPlacement,
    a: f64,
    b: f64,
    start: Point3,
    end: Point3,
    closed: bool,
    same_sense: bool,
) -> Vec<Point3> {
    let (t0, sweep, steps) = conic_sweep(placement, a, b, &start, &end, closed, same_sense);
    let mut points = Vec::with_capacity(steps + 1);
    points.push(start);
    for i in 1..steps {
        let t = t0 + sweep * i as f64 / steps as f64;
        points.push(placement.to_world(a * t.cos(), b * t.sin(), 0.0));
    }
    points.push(end);
    points
}

/// Gap between `½ ∫ x × dx` along the arc and along its sampled chords.
///
/// Each chord spanning `Δ` cuts off a segment of vector area
/// `½ a b (Δ - sin Δ) n`.
fn conic_segment_area(
    placement: &AxisPlacement,
    a: f64,
    b: f64,
    start: &Point3,
    end: &Point3,
    closed: bool,
    same_sense: bool,
) -> Vec3 {
    let (_, sweep, steps) = conic_sweep(placement, a, b, start, end, closed, same_sense);
    let delta = sweep / steps as f64;
    placement.z_axis().into_inner() * (0.5 * a * b * steps as f64 * (delta - delta.sin()))
}

fn nearest(points: &[Point3], target: &Point3) -> usize {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - target)
                .norm_squared()
                .total_cmp(&(*b - target).norm_squared())
        })
        .map_or(0, |(i, _)| i)
}

fn span(points: &[Point3], from: usize, to: usize) -> &[Point3] {
    if from < to {
        &points[from..to]
    } else {
        &[]
    }
}

fn trim_samples(
    samples: &[Point3],
    start: Point3,
    end: Point3,
    closed: bool,
    same_sense: bool,
) -> Vec<Point3> {
    if samples.len() < 2 {
        return vec![start, end];
    }
    let ordered: Vec<Point3> = if same_sense {
        samples.to_vec()
    } else {
        samples.iter().rev().copied().collect()
    };
    let last = ordered.len() - 1;
    let i0 = nearest(&ordered, &start);
    let i1 = nearest(&ordered, &end);

    let periodic = (ordered[0] - ordered[last]).norm() < 1e-9;
    let interior: Vec<Point3> = if closed {
        // Full loop starting and ending at the vertex.
        let tail = if periodic { last } else { ordered.len() };
        let head = if periodic { span(&ordered, 1, i0) } else { span(&ordered, 0, i0) };
        span(&ordered, i0 + 1, tail).iter().chain(head).copied().collect()
    } else if i1 > i0 {
        span(&ordered, i0 + 1, i1).to_vec()
    } else if periodic && i1 < i0 {
        span(&ordered, i0 + 1, last)
            .iter()
            .chain(span(&ordered, 0, i1))
            .copied()
            .collect()
    } else {
        Vec::new()
    };

    let mut points = Vec::with_capacity(interior.len() + 2);
    points.push(start);
    points.extend(interior);
    points.push(end);
    points
}

fn parse_bspline(file: &StepFile, id: u64) -> Result<BSplineCurve, StepError> {
    let entity = file.require(id)?;
    let (degree, cps, mults, knots) = if entity.is_complex() {
        // Complex form: B_SPLINE_CURVE(degree, points, form, closed, self_int)
        // B_SPLINE_CURVE_WITH_KNOTS(mults, knots, knot_spec), names dropped.
        let curve = require_record(file, id, "B_SPLINE_CURVE")?;
        let with_knots = require_record(file, id, "B_SPLINE_CURVE_WITH_KNOTS")?;
        (
            curve.integer(0)?,
            curve.entity_ref_list(1)?,
            with_knots.integer_list(0)?,
            with_knots.real_list(1)?,
        )
    } else {
        let r = require_record(file, id, "B_SPLINE_CURVE_WITH_KNOTS")?;
        (
            r.integer(1)?,
            r.entity_ref_list(2)?,
            r.integer_list(6)?,
            r.real_list(7)?,
        )
    };

    let control_points = cps
        .iter()
        .map(|&p| parse_cartesian_point(file, p))
        .collect::<Result<Vec<_>, _>>()?;
    let weights = entity
        .record("RATIONAL_B_SPLINE_CURVE")
        .map(|record| RecordRef { id, record }.real_list(0))
        .transpose()?;

    BSplineCurve::new(
        usize::try_from(degree)
            .map_err(|_| StepError::InvalidGeometry(format!("negative degree in #{id}")))?,
        control_points,
        weights,
        &mults,
        &knots,
    )
}

/// Parse any curve entity, unwrapping SURFACE_CURVE, SEAM_CURVE and
/// TRIMMED_CURVE to their 3D basis curve.
pub fn parse_curve(file: &StepFile, id: u64) -> Result<Curve, StepError> {
    let entity = file.require(id)?;
    if entity.has_record("B_SPLINE_CURVE_WITH_KNOTS") {
        return Ok(Curve::BSpline(parse_bspline(file, id)?));
    }

    let r = RecordRef {
        id,
        record: &entity.records[0],
    };
    match entity.type_name() {
        "SURFACE_CURVE" | "SEAM_CURVE" | "TRIMMED_CURVE" | "INTERSECTION_CURVE" => {
            parse_curve(file, r.entity_ref(1)?)
        }
        "LINE" => Ok(Curve::Line {
            origin: parse_cartesian_point(file, r.entity_ref(1)?)?,
            direction: parse_vector(file, r.entity_ref(2)?)?,
        }),
        "CIRCLE" => {
            let radius = r.real(2)?;
            if radius <= 0.0 {
                return Err(StepError::InvalidGeometry(format!(
                    "circle #{id} has non-positive radius {radius}"
                )));
            }
            Ok(Curve::Circle {
                placement: parse_axis_placement(file, r.entity_ref(1)?)?,
                radius,
            })
        }
        "ELLIPSE" => {
            let (semi_axis_1, semi_axis_2) = (r.real(2)?, r.real(3)?);
            if semi_axis_1 <= 0.0 || semi_axis_2 <= 0.0 {
                return Err(StepError::InvalidGeometry(format!(
                    "ellipse #{id} has non-positive semi-axis"
                )));
            }
            Ok(Curve::Ellipse {
                placement: parse_axis_placement(file, r.entity_ref(1)?)?,
                semi_axis_1,
                semi_axis_2,
            })
        }
        "POLYLINE" => Ok(Curve::Polyline(
            r.entity_ref_list(1)?
                .iter()
                .map(|&p| parse_cartesian_point(file, p))
                .collect::<Result<_, _>>()?,
        )),
        other => Ok(Curve::Unsupported(other.to_string())),
    }
}
