use anyhow::{Context, Result};

use crate::style::{
    ColorCoding, Rgb, TraceStyle, DEFAULT_TIME_DELTA, LOW_QUALITY_TIME_DELTA,
    PHASE_PLANE_DEFAULT_STEP, SNAPSHOT_DEFAULT_TIME_DOMAIN,
};
use crate::trajectory::{Snapshot, Trajectory};
use crate::traits::{NullSink, TraceSink, VectorField};
use crate::velocity::gradient;

/// Spreads `palette` across `n` members.
///
/// A single color repeats; a palette of exactly `n` colors is used as
/// given; anything else becomes a piecewise gradient between consecutive
/// palette colors, truncated to `n`.
pub fn color_gradient(palette: &[Rgb], n: usize) -> Vec<Rgb> {
    match palette {
        [] => Vec::new(),
        [single] => vec![*single; n],
        _ if palette.len() == n => palette.to_vec(),
        _ => {
            let fades = n.div_ceil(palette.len() - 1);
            let mut colors = Vec::with_capacity(fades * (palette.len() - 1));
            for pair in palette.windows(2) {
                colors.extend(gradient(pair[0], pair[1], fades));
            }
            colors.truncate(n);
            colors
        }
    }
}

/// Several live trajectories of the same system started from different
/// positions. Members are fully independent and are ticked sequentially
/// each frame.
pub struct TrajectoryFamily {
    members: Vec<Trajectory>,
}

impl TrajectoryFamily {
    pub fn new(
        field: &(impl VectorField + ?Sized),
        initial_positions: &[Vec<f64>],
        style: &TraceStyle,
        palette: &[Rgb],
    ) -> Result<Self> {
        let colors = color_gradient(palette, initial_positions.len());
        let mut members = Vec::with_capacity(initial_positions.len());
        for (i, init_pos) in initial_positions.iter().enumerate() {
            let member_style = TraceStyle {
                color: colors.get(i).copied().unwrap_or(style.color),
                ..style.clone()
            };
            let trajectory = Trajectory::new(field, init_pos, &member_style)
                .with_context(|| format!("building family member {i} at {init_pos:?}"))?;
            members.push(trajectory);
        }
        Ok(Self { members })
    }

    /// Seeds one member per integer lattice point of the given plane
    /// ranges. Velocity color coding, when requested, is remapped to the
    /// plane-derived limit so every member shares one scale.
    pub fn phase_plane(
        field: &(impl VectorField + ?Sized),
        x_range: [f64; 2],
        y_range: [f64; 2],
        style: &TraceStyle,
    ) -> Result<Self> {
        let style = plane_style(style);
        let positions = plane_lattice(x_range, y_range);
        Self::new(field, &positions, &style, &[style.color])
    }

    /// Ticks every member, pairing members with sinks by index.
    pub fn tick_all<S: TraceSink>(
        &mut self,
        field: &(impl VectorField + ?Sized),
        dt: f64,
        sinks: &mut [S],
    ) {
        for (member, sink) in self.members.iter_mut().zip(sinks) {
            member.tick(field, dt, sink);
        }
    }

    pub fn pause_all(&mut self) {
        for member in &mut self.members {
            member.pause();
        }
    }

    pub fn resume_all(&mut self) {
        for member in &mut self.members {
            member.resume();
        }
    }

    pub fn members(&self) -> &[Trajectory] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Phase-plane member style: velocity color coding, when requested, is
/// remapped to the plane-derived limit so every member shares one scale.
fn plane_style(style: &TraceStyle) -> TraceStyle {
    TraceStyle {
        color_coding: match style.color_coding {
            ColorCoding::Off => ColorCoding::Off,
            _ => ColorCoding::FromPlane,
        },
        ..style.clone()
    }
}

/// Lattice positions spaced `PHASE_PLANE_DEFAULT_STEP` apart within the
/// given ranges, row by row.
fn plane_lattice(x_range: [f64; 2], y_range: [f64; 2]) -> Vec<Vec<f64>> {
    let step = PHASE_PLANE_DEFAULT_STEP;
    let mut positions = Vec::new();
    let mut y = y_range[0].ceil();
    while y <= y_range[1].floor() {
        let mut x = x_range[0].ceil();
        while x <= x_range[1].floor() {
            positions.push(vec![x, y]);
            x += step;
        }
        y += step;
    }
    positions
}

/// A family of finished static solution curves, built in one batch.
pub struct SnapshotFamily {
    members: Vec<Snapshot>,
}

impl SnapshotFamily {
    pub fn new(
        field: &(impl VectorField + ?Sized),
        initial_positions: &[Vec<f64>],
        time_domain: [f64; 2],
        style: &TraceStyle,
        palette: &[Rgb],
        lower_quality: bool,
    ) -> Result<Self> {
        let colors = color_gradient(palette, initial_positions.len());
        let time_delta = if lower_quality {
            LOW_QUALITY_TIME_DELTA
        } else {
            DEFAULT_TIME_DELTA
        };
        let log_progress = initial_positions.len() > 10;
        if log_progress {
            log::info!("building {} snapshots", initial_positions.len());
        }

        let mut members = Vec::with_capacity(initial_positions.len());
        for (i, init_pos) in initial_positions.iter().enumerate() {
            if log_progress && i > 0 && i % 10 == 0 {
                log::info!("built {i} snapshots");
            }
            let member_style = TraceStyle {
                color: colors.get(i).copied().unwrap_or(style.color),
                ..style.clone()
            };
            let snapshot = Snapshot::build_with_time_delta(
                field,
                init_pos,
                time_domain,
                &member_style,
                time_delta,
                &mut NullSink,
                &mut NullSink,
            )
            .with_context(|| format!("building snapshot {i} at {init_pos:?}"))?;
            members.push(snapshot);
        }
        Ok(Self { members })
    }

    /// A phase plane of finished curves: one snapshot per integer lattice
    /// point, each spanning the default time domain. Velocity color
    /// coding, when requested, is remapped the same way as for the live
    /// variant.
    pub fn phase_plane(
        field: &(impl VectorField + ?Sized),
        x_range: [f64; 2],
        y_range: [f64; 2],
        style: &TraceStyle,
        lower_quality: bool,
    ) -> Result<Self> {
        let style = plane_style(style);
        let positions = plane_lattice(x_range, y_range);
        Self::new(
            field,
            &positions,
            SNAPSHOT_DEFAULT_TIME_DOMAIN,
            &style,
            &[style.color],
            lower_quality,
        )
    }

    pub fn members(&self) -> &[Snapshot] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
