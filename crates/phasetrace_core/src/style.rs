use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Frame time deltas for the usual render qualities.
pub const HD_TIME_DELTA: f64 = 0.01666666666666572;
pub const LOW_QUALITY_TIME_DELTA: f64 = 0.15;
pub const DEFAULT_TIME_DELTA: f64 = HD_TIME_DELTA;

/// Time domain used for snapshots built without an explicit domain.
pub const SNAPSHOT_DEFAULT_TIME_DOMAIN: [f64; 2] = [-10.0, 10.0];

/// Spacing between seeded initial positions on a phase plane axis.
pub const PHASE_PLANE_DEFAULT_STEP: f64 = 1.0;

/// Intermediate colors per gradient half of a velocity color mapping.
pub(crate) const COLOR_CODING_VARIETY: usize = 20;

/// Damping applied to derived color-coding limits.
pub(crate) const COLOR_CODING_SCALE_FACTOR: f64 = 0.93;

/// Substitute limit when a trace simulation sits at an equilibrium.
pub(crate) const COLOR_CODING_LIMIT_FLOOR: f64 = 0.01;

/// Steps simulated when deriving a color-coding limit from the trace.
pub(crate) const TRACE_SAMPLE_ITERATIONS: usize = 200;

/// Integer lattice half-range sampled when deriving a limit from the plane.
pub(crate) const PLANE_SAMPLE_RANGE: i64 = 10;

/// An sRGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parses a `#rrggbb` literal.
    pub fn from_hex(literal: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(literal.to_owned());
        let digits = literal.strip_prefix('#').ok_or_else(|| invalid())?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        let quantize = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            quantize(self.r),
            quantize(self.g),
            quantize(self.b)
        )
    }

    /// Channel-wise linear interpolation toward `other` at `t` in `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(literal: String) -> Result<Self, Self::Error> {
        Self::from_hex(&literal)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// Slow/medium/fast anchor colors for velocity color coding.
///
/// `limit` and `slow_weight` are only consulted in manual mode; derived
/// modes compute the limit themselves and space bounds uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VelocityColors {
    pub slow: Rgb,
    pub medium: Rgb,
    pub fast: Rgb,
    /// Manual-mode speed above which everything takes the fast color.
    pub limit: f64,
    /// Manual-mode fraction of the limit covered by the slow→medium half.
    /// A weight of 1 means neutral (uniform) spacing.
    pub slow_weight: f64,
}

impl Default for VelocityColors {
    fn default() -> Self {
        Self {
            slow: Rgb::new(0x83 as f64 / 255.0, 0xc1 as f64 / 255.0, 0x67 as f64 / 255.0),
            medium: Rgb::new(1.0, 1.0, 0.0),
            fast: Rgb::new(0xfc as f64 / 255.0, 0x62 as f64 / 255.0, 0x55 as f64 / 255.0),
            limit: 10.0,
            slow_weight: 1.0,
        }
    }
}

/// How (and whether) segment colors follow the local speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorCoding {
    /// Every segment takes the base trace color.
    #[default]
    Off,
    /// Limit and weighting supplied by the caller.
    Manual,
    /// Limit derived by simulating the system forward from its start.
    FromTrace,
    /// Limit derived by sampling the field on an integer lattice.
    FromPlane,
}

/// Validated playback configuration for a single trajectory.
///
/// Field names keep the long-form aliases their option strings have always
/// had, so existing scene configs deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceStyle {
    /// Multiplies every derivative evaluation before integration.
    pub speed_rate: f64,
    /// Base trace color, used for every segment when color coding is off.
    pub color: Rgb,
    /// Stroke width of freshly appended segments.
    pub width: f32,
    /// Opacity of freshly appended segments.
    pub stroke_opacity: f32,
    #[serde(alias = "color_code_velocity")]
    pub color_coding: ColorCoding,
    pub velocity_colors: VelocityColors,
    #[serde(alias = "fade_out_trace")]
    pub fade_out: bool,
    /// Trace length accumulated before old segments start fading.
    #[serde(alias = "amount_to_not_fade_out_trace_before")]
    pub length_budget: f64,
    /// Per-tick multiplicative opacity/width decrement during fade-out.
    #[serde(alias = "trace_fadeout_decrease_factor")]
    pub fade_decrement: f32,
    /// Fractional inset applied to both ends of each new segment.
    #[serde(alias = "line_trace_overlap_buff")]
    pub overlap_buff: f64,
    /// Hard cap on the non-faded segment count.
    #[serde(alias = "max_number_of_trace_lines")]
    pub max_segments: usize,
    /// Sub-step count used when a frame step jumps too far.
    #[serde(alias = "precision_multiplier_if_trace_too_rough")]
    pub precision_multiplier: u32,
    /// Distance threshold that triggers sub-stepping.
    #[serde(alias = "trace_precision_increase_threshold")]
    pub refine_threshold: f64,
}

impl Default for TraceStyle {
    fn default() -> Self {
        Self {
            speed_rate: 1.0,
            color: Rgb::new(0x3e as f64 / 255.0, 0x99 as f64 / 255.0, 0xa0 as f64 / 255.0),
            width: 3.2,
            stroke_opacity: 1.0,
            color_coding: ColorCoding::Off,
            velocity_colors: VelocityColors::default(),
            fade_out: false,
            length_budget: 5.0,
            fade_decrement: 0.05,
            overlap_buff: 0.02,
            max_segments: 500,
            precision_multiplier: 1,
            refine_threshold: 0.15,
        }
    }
}

impl TraceStyle {
    /// The muted preset used when seeding a whole phase plane of systems.
    pub fn phase_plane() -> Self {
        Self {
            width: 2.8,
            stroke_opacity: 0.65,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::InvalidStyle(msg.to_owned()));
        if !self.speed_rate.is_finite() || self.speed_rate <= 0.0 {
            return invalid("speed_rate must be a finite positive number");
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return invalid("width must be a finite positive number");
        }
        if !(0.0..=1.0).contains(&self.stroke_opacity) {
            return invalid("stroke_opacity must lie in [0, 1]");
        }
        if !self.length_budget.is_finite() || self.length_budget <= 0.0 {
            return invalid("amount_to_not_fade_out_trace_before must be a finite positive number");
        }
        if !(self.fade_decrement > 0.0 && self.fade_decrement <= 1.0) {
            return invalid("trace_fadeout_decrease_factor must lie in (0, 1]");
        }
        if !(0.0..0.5).contains(&self.overlap_buff) {
            return invalid("line_trace_overlap_buff must lie in [0, 0.5)");
        }
        if self.max_segments == 0 {
            return invalid("max_number_of_trace_lines must be at least 1");
        }
        if self.precision_multiplier == 0 {
            return invalid("precision_multiplier_if_trace_too_rough must be at least 1");
        }
        if !self.refine_threshold.is_finite() || self.refine_threshold <= 0.0 {
            return invalid("trace_precision_increase_threshold must be a finite positive number");
        }
        if self.color_coding == ColorCoding::Manual {
            let vc = &self.velocity_colors;
            if !vc.limit.is_finite() || vc.limit <= 0.0 {
                return invalid("velocity_colors.limit must be a finite positive number");
            }
            if !(0.0..=1.0).contains(&vc.slow_weight) {
                return invalid("velocity_colors.slow_weight must lie in [0, 1]");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hex_round_trip() {
        let color = Rgb::from_hex("#3e99a0").unwrap();
        assert_eq!(color.to_hex(), "#3e99a0");
        assert_relative_eq!(color.g, 153.0 / 255.0);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        for literal in ["3e99a0", "#3e99a", "#3e99a0ff", "#gg99a0", "#3E99Zz"] {
            assert_eq!(
                Rgb::from_hex(literal),
                Err(ConfigError::InvalidColor(literal.to_owned())),
                "literal {literal:?} should not parse",
            );
        }
    }

    #[test]
    fn lerp_midpoint() {
        let mid = Rgb::new(0.0, 0.0, 0.0).lerp(Rgb::new(1.0, 0.5, 0.0), 0.5);
        assert_relative_eq!(mid.r, 0.5);
        assert_relative_eq!(mid.g, 0.25);
        assert_relative_eq!(mid.b, 0.0);
    }

    #[test]
    fn default_style_validates() {
        TraceStyle::default().validate().unwrap();
        TraceStyle::phase_plane().validate().unwrap();
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let mut style = TraceStyle::default();
        style.precision_multiplier = 0;
        assert!(style.validate().is_err());

        let mut style = TraceStyle::default();
        style.fade_decrement = 0.0;
        assert!(style.validate().is_err());

        let mut style = TraceStyle::default();
        style.overlap_buff = 0.5;
        assert!(style.validate().is_err());

        let mut style = TraceStyle::default();
        style.refine_threshold = f64::NAN;
        assert!(style.validate().is_err());
    }

    #[test]
    fn long_form_option_names_deserialize() {
        let style: TraceStyle = serde_json::from_str(
            r##"{
                "color_code_velocity": "from_trace",
                "fade_out_trace": true,
                "trace_fadeout_decrease_factor": 0.1,
                "amount_to_not_fade_out_trace_before": 7.5,
                "line_trace_overlap_buff": 0.03,
                "max_number_of_trace_lines": 200,
                "precision_multiplier_if_trace_too_rough": 4,
                "trace_precision_increase_threshold": 0.2,
                "color": "#219ebc"
            }"##,
        )
        .unwrap();
        assert_eq!(style.color_coding, ColorCoding::FromTrace);
        assert!(style.fade_out);
        assert_eq!(style.max_segments, 200);
        assert_eq!(style.precision_multiplier, 4);
        assert_eq!(style.color, Rgb::from_hex("#219ebc").unwrap());
    }

    #[test]
    fn unknown_options_are_rejected() {
        let err = serde_json::from_str::<TraceStyle>(r#"{"point_radiu": 0.05}"#);
        assert!(err.is_err());
    }
}
