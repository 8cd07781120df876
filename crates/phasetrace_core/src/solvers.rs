use crate::traits::{Point, VectorField};

/// Forward Euler with a time-scale factor.
///
/// All playback integration is first order on purpose: the renderer calls
/// this once per frame with the frame's `dt`, and the refiner below covers
/// the stiff spots. `speed_rate` scales simulated time against wall time
/// without changing the traced curve's geometry.
#[derive(Debug, Clone, Copy)]
pub struct EulerStepper {
    pub speed_rate: f64,
}

impl EulerStepper {
    pub fn new(speed_rate: f64) -> Self {
        Self { speed_rate }
    }

    /// One Euler step: `x + f(x) * dt * speed_rate`.
    ///
    /// Every axis is advanced from the same pre-step state.
    pub fn advance(&self, field: &(impl VectorField + ?Sized), state: Point, dt: f64) -> Point {
        state + field.eval(state) * (dt * self.speed_rate)
    }
}

impl Default for EulerStepper {
    fn default() -> Self {
        Self { speed_rate: 1.0 }
    }
}

/// Splits a frame step into sub-steps when the trajectory moves too far.
///
/// A single full-`dt` step is computed first; if it lands farther than
/// `threshold` from the last retained point, the frame is re-integrated as
/// `multiplier` chained sub-steps of `dt / multiplier`, and every
/// intermediate state is emitted so the trace keeps its spatial resolution
/// through fast regions.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveRefiner {
    pub threshold: f64,
    pub multiplier: u32,
}

impl AdaptiveRefiner {
    pub fn new(threshold: f64, multiplier: u32) -> Self {
        Self {
            threshold,
            multiplier,
        }
    }

    /// Advances one frame, returning every state to retain, in order.
    ///
    /// Returns a single tentative state when no refinement is needed (or
    /// when `multiplier` is 1, which disables refinement outright).
    pub fn advance_frame(
        &self,
        field: &(impl VectorField + ?Sized),
        stepper: &EulerStepper,
        current: Point,
        last_retained: Point,
        dt: f64,
    ) -> Vec<Point> {
        let tentative = stepper.advance(field, current, dt);
        let too_far = (tentative - last_retained).norm() > self.threshold;
        if too_far && self.multiplier > 1 {
            let sub_dt = dt / f64::from(self.multiplier);
            let mut states = Vec::with_capacity(self.multiplier as usize);
            let mut state = current;
            for _ in 0..self.multiplier {
                state = stepper.advance(field, state, sub_dt);
                states.push(state);
            }
            states
        } else {
            vec![tentative]
        }
    }
}
