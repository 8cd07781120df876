use nalgebra::Vector3;

use crate::trace::Segment;

/// Position/state vector of a system. Planar (2D) systems keep `z = 0`.
pub type Point = Vector3<f64>;

/// Pads a 2- or 3-coordinate slice into a [`Point`].
pub fn point_from_slice(coords: &[f64]) -> Point {
    Point::new(
        coords.first().copied().unwrap_or(0.0),
        coords.get(1).copied().unwrap_or(0.0),
        coords.get(2).copied().unwrap_or(0.0),
    )
}

/// A continuous vector field: the right-hand side of an autonomous ODE system.
pub trait VectorField {
    /// Returns the dimension of the state space (2 or 3).
    fn dimension(&self) -> usize;

    /// Evaluates the derivative of every axis at `p`.
    /// For 2D systems the `z` component of the result is 0.
    fn eval(&self, p: Point) -> Point;
}

/// A vector field assembled from one closure per axis.
///
/// Closures take the full state and return that axis' derivative; they are
/// trusted to return finite floats and are never validated.
pub struct DerivativeSet {
    dimension: usize,
    axes: Vec<Box<dyn Fn(Point) -> f64>>,
}

impl DerivativeSet {
    /// A 2D system `dx/dt = dx(p)`, `dy/dt = dy(p)`.
    pub fn planar(
        dx: impl Fn(Point) -> f64 + 'static,
        dy: impl Fn(Point) -> f64 + 'static,
    ) -> Self {
        Self {
            dimension: 2,
            axes: vec![Box::new(dx), Box::new(dy)],
        }
    }

    /// A 3D system `dx/dt = dx(p)`, `dy/dt = dy(p)`, `dz/dt = dz(p)`.
    pub fn spatial(
        dx: impl Fn(Point) -> f64 + 'static,
        dy: impl Fn(Point) -> f64 + 'static,
        dz: impl Fn(Point) -> f64 + 'static,
    ) -> Self {
        Self {
            dimension: 3,
            axes: vec![Box::new(dx), Box::new(dy), Box::new(dz)],
        }
    }
}

impl VectorField for DerivativeSet {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn eval(&self, p: Point) -> Point {
        Point::new(
            (self.axes[0])(p),
            (self.axes[1])(p),
            if self.dimension == 3 {
                (self.axes[2])(p)
            } else {
                0.0
            },
        )
    }
}

/// Borrowing adapter that negates every component of a field.
///
/// Used for time-backward integration: the backward half of a snapshot and
/// the backward member of a bilateral trajectory both flow along `-f`.
pub struct NegatedField<'a, F: VectorField + ?Sized>(pub &'a F);

impl<F: VectorField + ?Sized> VectorField for NegatedField<'_, F> {
    fn dimension(&self) -> usize {
        self.0.dimension()
    }

    fn eval(&self, p: Point) -> Point {
        -self.0.eval(p)
    }
}

/// The drawable-curve collaborator provided by the rendering engine.
///
/// The core mirrors every mutation of its trace into this interface and
/// never reaches further into the renderer. `index` arguments refer to the
/// position within the *current* live curve; after [`remove_prefix`] the
/// remaining drawables renumber from zero, exactly like the core's own
/// segment buffer.
///
/// [`remove_prefix`]: TraceSink::remove_prefix
pub trait TraceSink {
    /// A new segment was appended to the end of the curve.
    fn append_segment(&mut self, segment: &Segment);

    /// An existing segment's opacity/stroke width changed (fade-out).
    fn restyle_segment(&mut self, index: usize, opacity: f32, width: f32);

    /// The `count` oldest segments were evicted.
    fn remove_prefix(&mut self, count: usize);

    /// A corner point was appended to a plain polyline trace.
    fn append_corner(&mut self, point: Point);

    /// The trajectory's point marker moved.
    fn move_marker(&mut self, point: Point);
}

/// Sink that discards every drawing operation.
pub struct NullSink;

impl TraceSink for NullSink {
    fn append_segment(&mut self, _segment: &Segment) {}
    fn restyle_segment(&mut self, _index: usize, _opacity: f32, _width: f32) {}
    fn remove_prefix(&mut self, _count: usize) {}
    fn append_corner(&mut self, _point: Point) {}
    fn move_marker(&mut self, _point: Point) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_field_keeps_z_at_zero() {
        let field = DerivativeSet::planar(|p| p.y, |p| -p.x);
        let v = field.eval(Point::new(1.0, 2.0, 5.0));
        assert_eq!(v, Point::new(2.0, -1.0, 0.0));
        assert_eq!(field.dimension(), 2);
    }

    #[test]
    fn negated_field_flips_every_component() {
        let field = DerivativeSet::spatial(|_| 1.0, |_| -2.0, |p| p.z);
        let backward = NegatedField(&field);
        let v = backward.eval(Point::new(0.0, 0.0, 3.0));
        assert_eq!(v, Point::new(-1.0, 2.0, -3.0));
        assert_eq!(backward.dimension(), 3);
    }

    #[test]
    fn point_from_slice_pads_missing_axes() {
        assert_eq!(point_from_slice(&[1.0, 2.0]), Point::new(1.0, 2.0, 0.0));
        assert_eq!(
            point_from_slice(&[1.0, 2.0, 3.0]),
            Point::new(1.0, 2.0, 3.0)
        );
    }
}
