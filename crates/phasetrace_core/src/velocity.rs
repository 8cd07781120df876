use crate::solvers::EulerStepper;
use crate::style::{
    ColorCoding, Rgb, TraceStyle, VelocityColors, COLOR_CODING_LIMIT_FLOOR,
    COLOR_CODING_SCALE_FACTOR, COLOR_CODING_VARIETY, HD_TIME_DELTA, PLANE_SAMPLE_RANGE,
    TRACE_SAMPLE_ITERATIONS,
};
use crate::traits::{Point, VectorField};

/// `n` evenly spaced colors from `from` to `to`, both ends included.
pub(crate) fn gradient(from: Rgb, to: Rgb, n: usize) -> Vec<Rgb> {
    if n <= 1 {
        return vec![from; n];
    }
    (0..n)
        .map(|i| from.lerp(to, i as f64 / (n - 1) as f64))
        .collect()
}

/// Speed-to-color lookup table.
///
/// Entries are `(color, lower_bound)` pairs sorted by descending bound;
/// lookup is a linear scan returning the first bound the value exceeds.
/// 39 entries for the usual variety constant, so the scan is cheap enough
/// to run once per appended segment.
#[derive(Debug, Clone)]
pub struct ColorMapping {
    entries: Vec<(Rgb, f64)>,
    slowest: Rgb,
}

impl ColorMapping {
    /// Mapping with a caller-supplied limit and slow-half weighting.
    pub fn manual(colors: &VelocityColors) -> Self {
        Self::build(colors, colors.limit, colors.slow_weight)
    }

    /// Mapping whose limit comes from simulating the system forward
    /// `TRACE_SAMPLE_ITERATIONS` steps from `init_pos` and damping the
    /// largest position norm seen. A system resting at an equilibrium
    /// would derive a limit of 0, which the floor constant replaces.
    pub fn from_trace(
        colors: &VelocityColors,
        field: &(impl VectorField + ?Sized),
        init_pos: Point,
        stepper: &EulerStepper,
    ) -> Self {
        let mut state = init_pos;
        let mut max_norm = 0.0f64;
        for _ in 0..TRACE_SAMPLE_ITERATIONS {
            state = stepper.advance(field, state, HD_TIME_DELTA);
            max_norm = max_norm.max(state.norm());
        }
        let limit = max_norm * COLOR_CODING_SCALE_FACTOR;
        let limit = if limit > 0.0 {
            limit
        } else {
            COLOR_CODING_LIMIT_FLOOR
        };
        Self::build(colors, limit, 1.0)
    }

    /// Mapping whose limit comes from evaluating the field (no integration)
    /// on every integer lattice point within `±PLANE_SAMPLE_RANGE` per axis
    /// and damping the largest derivative norm.
    pub fn from_plane(colors: &VelocityColors, field: &(impl VectorField + ?Sized)) -> Self {
        let range = -PLANE_SAMPLE_RANGE..=PLANE_SAMPLE_RANGE;
        let mut max_norm = 0.0f64;
        for x in range.clone() {
            for y in range.clone() {
                if field.dimension() == 3 {
                    for z in range.clone() {
                        let p = Point::new(x as f64, y as f64, z as f64);
                        max_norm = max_norm.max(field.eval(p).norm());
                    }
                } else {
                    let p = Point::new(x as f64, y as f64, 0.0);
                    max_norm = max_norm.max(field.eval(p).norm());
                }
            }
        }
        Self::build(colors, max_norm * COLOR_CODING_SCALE_FACTOR, 1.0)
    }

    /// Builds the mapping a style asks for, if any.
    pub fn for_style(
        style: &TraceStyle,
        field: &(impl VectorField + ?Sized),
        init_pos: Point,
        stepper: &EulerStepper,
    ) -> Option<Self> {
        let colors = &style.velocity_colors;
        match style.color_coding {
            ColorCoding::Off => None,
            ColorCoding::Manual => Some(Self::manual(colors)),
            ColorCoding::FromTrace => Some(Self::from_trace(colors, field, init_pos, stepper)),
            ColorCoding::FromPlane => Some(Self::from_plane(colors, field)),
        }
    }

    fn build(colors: &VelocityColors, limit: f64, slow_weight: f64) -> Self {
        let slow_to_med = gradient(colors.slow, colors.medium, COLOR_CODING_VARIETY);
        let med_to_fast = gradient(colors.medium, colors.fast, COLOR_CODING_VARIETY);
        // The shared medium color appears in both halves; drop one copy.
        let palette: Vec<Rgb> = slow_to_med
            .iter()
            .chain(med_to_fast.iter().skip(1))
            .copied()
            .collect();

        let bounds: Vec<f64> = if slow_weight == 1.0 {
            // Neutral weighting: uniform spacing across [0, limit).
            (0..palette.len())
                .map(|i| i as f64 * limit / palette.len() as f64)
                .collect()
        } else {
            // The slow half covers `slow_weight * limit`, the fast half
            // the remainder; the zero bound is dropped from the slow half
            // so the counts line up with the palette.
            let split = slow_weight * limit;
            let slow_step = split / (slow_to_med.len() - 1) as f64;
            let fast_step = (limit - split) / med_to_fast.len() as f64;
            (1..slow_to_med.len())
                .map(|i| i as f64 * slow_step)
                .chain((1..=med_to_fast.len()).map(|j| split + j as f64 * fast_step))
                .collect()
        };

        let slowest = colors.slow;
        let mut entries: Vec<(Rgb, f64)> = palette.into_iter().zip(bounds).collect();
        entries.reverse();
        Self { entries, slowest }
    }

    /// The color for a segment traversed at speed `value`.
    ///
    /// Values at or below every bound (including exactly 0) resolve to
    /// the slowest color rather than failing the lookup.
    pub fn color_for(&self, value: f64) -> Rgb {
        for (color, bound) in &self.entries {
            if value > *bound {
                return *color;
            }
        }
        self.slowest
    }

    /// `(color, lower_bound)` pairs in descending bound order.
    pub fn entries(&self) -> &[(Rgb, f64)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DerivativeSet;
    use approx::assert_relative_eq;

    fn anchors() -> VelocityColors {
        VelocityColors {
            slow: Rgb::new(0.0, 0.0, 0.0),
            medium: Rgb::new(0.5, 0.5, 0.5),
            fast: Rgb::new(1.0, 1.0, 1.0),
            limit: 10.0,
            slow_weight: 1.0,
        }
    }

    #[test]
    fn neutral_mapping_has_uniform_descending_bounds() {
        let mapping = ColorMapping::manual(&anchors());
        let entries = mapping.entries();
        assert_eq!(entries.len(), 2 * COLOR_CODING_VARIETY - 1);
        assert_relative_eq!(entries[0].1, 38.0 * 10.0 / 39.0);
        assert_relative_eq!(entries[entries.len() - 1].1, 0.0);
        for pair in entries.windows(2) {
            assert!(pair[0].1 > pair[1].1);
        }
    }

    #[test]
    fn weighted_mapping_splits_the_limit() {
        let colors = VelocityColors {
            slow_weight: 0.3,
            ..anchors()
        };
        let mapping = ColorMapping::manual(&colors);
        let entries = mapping.entries();
        assert_eq!(entries.len(), 39);
        // Highest bound is the full limit; after the 20 fast entries the
        // slow half tops out at 0.3 * 10.
        assert_relative_eq!(entries[0].1, 10.0);
        assert_relative_eq!(entries[20].1, 3.0);
        for pair in entries.windows(2) {
            assert!(pair[0].1 > pair[1].1);
        }
    }

    #[test]
    fn lookup_is_monotone_in_speed() {
        let mapping = ColorMapping::manual(&anchors());
        // With a grayscale palette, "faster" means a larger channel value.
        let mut previous = mapping.color_for(0.0).r;
        for i in 1..=120 {
            let value = i as f64 * 0.1;
            let current = mapping.color_for(value).r;
            assert!(
                current >= previous,
                "color regressed between speeds {} and {value}",
                value - 0.1,
            );
            previous = current;
        }
    }

    #[test]
    fn zero_speed_falls_back_to_the_slowest_color() {
        let mapping = ColorMapping::manual(&anchors());
        assert_eq!(mapping.color_for(0.0), Rgb::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn speeds_above_the_limit_take_the_fastest_color() {
        let mapping = ColorMapping::manual(&anchors());
        assert_eq!(mapping.color_for(1e6), Rgb::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn equilibrium_trace_limit_is_exactly_the_floor() {
        let field = DerivativeSet::planar(|_| 0.0, |_| 0.0);
        let mapping = ColorMapping::from_trace(
            &anchors(),
            &field,
            Point::zeros(),
            &EulerStepper::new(1.0),
        );
        let top_bound = mapping.entries()[0].1;
        assert_relative_eq!(top_bound, 38.0 * COLOR_CODING_LIMIT_FLOOR / 39.0);
    }

    #[test]
    fn plane_limit_samples_the_lattice_corners() {
        // dx = x, dy = y peaks at the lattice corners with norm sqrt(200).
        let field = DerivativeSet::planar(|p| p.x, |p| p.y);
        let mapping = ColorMapping::from_plane(&anchors(), &field);
        let limit = 200.0f64.sqrt() * COLOR_CODING_SCALE_FACTOR;
        assert_relative_eq!(mapping.entries()[0].1, 38.0 * limit / 39.0);
    }
}
