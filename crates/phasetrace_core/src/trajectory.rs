use crate::error::ConfigError;
use crate::solvers::{AdaptiveRefiner, EulerStepper};
use crate::style::{Rgb, TraceStyle, DEFAULT_TIME_DELTA};
use crate::trace::TraceBuffer;
use crate::traits::{point_from_slice, NegatedField, Point, TraceSink, VectorField};
use crate::velocity::ColorMapping;

/// A trajectory advanced frame by frame by an external scheduler.
///
/// The trajectory owns its position and trace exclusively; the vector
/// field is borrowed per call so the same field can drive several
/// trajectories (and its negation can drive backward ones). Callers must
/// pass the same field to every `tick` of one trajectory.
pub struct Trajectory {
    stepper: EulerStepper,
    refiner: AdaptiveRefiner,
    buffer: TraceBuffer,
    color_map: Option<ColorMapping>,
    base_color: Rgb,
    current: Point,
    last_retained: Point,
    running: bool,
}

impl Trajectory {
    pub fn new(
        field: &(impl VectorField + ?Sized),
        init_pos: &[f64],
        style: &TraceStyle,
    ) -> Result<Self, ConfigError> {
        if init_pos.len() != field.dimension() {
            return Err(ConfigError::DimensionMismatch {
                expected: field.dimension(),
                got: init_pos.len(),
            });
        }
        style.validate()?;

        let stepper = EulerStepper::new(style.speed_rate);
        let start = point_from_slice(init_pos);
        let color_map = ColorMapping::for_style(style, field, start, &stepper);
        Ok(Self {
            stepper,
            refiner: AdaptiveRefiner::new(style.refine_threshold, style.precision_multiplier),
            buffer: TraceBuffer::new(style),
            color_map,
            base_color: style.color,
            current: start,
            last_retained: start,
            running: true,
        })
    }

    /// Advances one frame: integrates, appends the new geometry, then
    /// repositions the point marker. Ignored while paused.
    pub fn tick(&mut self, field: &(impl VectorField + ?Sized), dt: f64, sink: &mut dyn TraceSink) {
        if !self.running {
            return;
        }
        let states =
            self.refiner
                .advance_frame(field, &self.stepper, self.current, self.last_retained, dt);
        for state in states {
            let color = match &self.color_map {
                Some(mapping) => mapping.color_for(field.eval(state).norm()),
                None => self.base_color,
            };
            self.buffer.push(self.current, state, color, sink);
            self.last_retained = self.current;
            self.current = state;
        }
        sink.move_marker(self.current);
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn position(&self) -> Point {
        self.current
    }

    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    pub fn color_mapping(&self) -> Option<&ColorMapping> {
        self.color_map.as_ref()
    }
}

/// A frozen-in-time trajectory: both solution pieces are integrated in one
/// synchronous batch at construction, leaving a static two-sided curve.
pub struct Snapshot {
    forward: Trajectory,
    backward: Trajectory,
    time_domain: [f64; 2],
    extreme_forward: Point,
    extreme_backward: Point,
}

impl Snapshot {
    pub fn build(
        field: &(impl VectorField + ?Sized),
        init_pos: &[f64],
        time_domain: [f64; 2],
        style: &TraceStyle,
        forward_sink: &mut dyn TraceSink,
        backward_sink: &mut dyn TraceSink,
    ) -> Result<Self, ConfigError> {
        Self::build_with_time_delta(
            field,
            init_pos,
            time_domain,
            style,
            DEFAULT_TIME_DELTA,
            forward_sink,
            backward_sink,
        )
    }

    pub fn build_with_time_delta(
        field: &(impl VectorField + ?Sized),
        init_pos: &[f64],
        time_domain: [f64; 2],
        style: &TraceStyle,
        time_delta: f64,
        forward_sink: &mut dyn TraceSink,
        backward_sink: &mut dyn TraceSink,
    ) -> Result<Self, ConfigError> {
        if !(time_domain[0] <= 0.0 && time_domain[1] >= 0.0) {
            return Err(ConfigError::TimeDomainExcludesZero {
                start: time_domain[0],
                end: time_domain[1],
            });
        }

        let mut forward = Trajectory::new(field, init_pos, style)?;
        let forward_iterations = (time_domain[1].abs() / time_delta).floor() as usize;
        run_piece(
            &mut forward,
            field,
            forward_iterations,
            time_delta,
            forward_sink,
            "forward",
        );
        let extreme_forward = forward.position();

        // The backward half flows along the negated field with the same
        // positive time delta.
        let backward_field = NegatedField(field);
        let mut backward = Trajectory::new(&backward_field, init_pos, style)?;
        let backward_iterations = (time_domain[0].abs() / time_delta).floor() as usize;
        run_piece(
            &mut backward,
            &backward_field,
            backward_iterations,
            time_delta,
            backward_sink,
            "backward",
        );
        let extreme_backward = backward.position();

        Ok(Self {
            forward,
            backward,
            time_domain,
            extreme_forward,
            extreme_backward,
        })
    }

    pub fn forward(&self) -> &Trajectory {
        &self.forward
    }

    pub fn backward(&self) -> &Trajectory {
        &self.backward
    }

    pub fn time_domain(&self) -> [f64; 2] {
        self.time_domain
    }

    /// Where the forward piece ends, at `t = domain[1]`.
    pub fn extreme_forward(&self) -> Point {
        self.extreme_forward
    }

    /// Where the backward piece ends, at `t = domain[0]`.
    pub fn extreme_backward(&self) -> Point {
        self.extreme_backward
    }
}

fn run_piece(
    trajectory: &mut Trajectory,
    field: &(impl VectorField + ?Sized),
    iterations: usize,
    time_delta: f64,
    sink: &mut dyn TraceSink,
    label: &str,
) {
    if iterations > 1000 {
        log::debug!("building {label} solution piece, {iterations} iterations");
    }
    for i in 0..iterations {
        if i > 0 && i % 1000 == 0 {
            log::debug!("{label} piece: {i} iterations completed");
        }
        trajectory.tick(field, time_delta, sink);
    }
    if iterations > 1000 {
        log::debug!("done building {label} piece");
    }
}

/// A pair of live trajectories from the same start, one flowing with the
/// field and one against it. Fade-out is force-disabled: the two traces
/// age at different visual rates and a fading pair looks broken at the
/// shared starting point.
pub struct BilateralTrajectory {
    forward: Trajectory,
    backward: Trajectory,
}

impl BilateralTrajectory {
    pub fn new(
        field: &(impl VectorField + ?Sized),
        init_pos: &[f64],
        style: &TraceStyle,
    ) -> Result<Self, ConfigError> {
        let style = TraceStyle {
            fade_out: false,
            ..style.clone()
        };
        let forward = Trajectory::new(field, init_pos, &style)?;
        let backward_field = NegatedField(field);
        let backward = Trajectory::new(&backward_field, init_pos, &style)?;
        Ok(Self { forward, backward })
    }

    pub fn tick(
        &mut self,
        field: &(impl VectorField + ?Sized),
        dt: f64,
        forward_sink: &mut dyn TraceSink,
        backward_sink: &mut dyn TraceSink,
    ) {
        self.forward.tick(field, dt, forward_sink);
        let backward_field = NegatedField(field);
        self.backward.tick(&backward_field, dt, backward_sink);
    }

    pub fn pause(&mut self, only_backward: bool) {
        self.backward.pause();
        if !only_backward {
            self.forward.pause();
        }
    }

    pub fn resume(&mut self, only_backward: bool) {
        self.backward.resume();
        if !only_backward {
            self.forward.resume();
        }
    }

    pub fn forward(&self) -> &Trajectory {
        &self.forward
    }

    pub fn backward(&self) -> &Trajectory {
        &self.backward
    }
}
