use crate::style::{ColorCoding, Rgb, TraceStyle};
use crate::traits::{Point, TraceSink};

/// One directed piece of a trace polyline.
///
/// Immutable after creation except for `opacity` and `width`, which decay
/// during fade-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub color: Rgb,
    pub width: f32,
    pub opacity: f32,
}

impl Segment {
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// How a buffer stores and ages its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceMode {
    /// Full segment bookkeeping with fade-out and eviction.
    Fade,
    /// Per-segment storage (for per-segment colors) without any aging.
    Plain,
    /// Bare polyline corners, no bookkeeping, unbounded growth.
    Corners,
}

/// The incrementally-growing curve behind one trajectory.
///
/// In fading mode the buffer keeps three running aggregates: the summed
/// length of everything stored, the summed length of the not-yet-fading
/// window, and the index separating that window from the segments already
/// fading. Old segments fade a little each tick and are dropped in one
/// batch once fully transparent. Every mutation is mirrored into the
/// caller's [`TraceSink`].
///
/// Aggregate invariants (checked by the property tests below):
/// `first_active` never decreases, `retained_length` always equals the
/// summed length of `segments[first_active..]`, and the non-faded window
/// never holds more than `max_segments` segments after an append.
pub struct TraceBuffer {
    mode: TraceMode,
    width: f32,
    opacity: f32,
    overlap_buff: f64,
    length_budget: f64,
    fade_decrement: f32,
    max_segments: usize,
    segments: Vec<Segment>,
    corners: Vec<Point>,
    total_length_all: f64,
    total_length_retained: f64,
    first_active: Option<usize>,
    evicted_count: usize,
}

impl TraceBuffer {
    pub fn new(style: &TraceStyle) -> Self {
        let mode = if style.fade_out {
            TraceMode::Fade
        } else if style.color_coding != ColorCoding::Off {
            TraceMode::Plain
        } else {
            TraceMode::Corners
        };
        Self {
            mode,
            width: style.width,
            opacity: style.stroke_opacity,
            overlap_buff: style.overlap_buff,
            length_budget: style.length_budget,
            fade_decrement: style.fade_decrement,
            max_segments: style.max_segments,
            segments: Vec::new(),
            corners: Vec::new(),
            total_length_all: 0.0,
            total_length_retained: 0.0,
            first_active: None,
            evicted_count: 0,
        }
    }

    /// Appends the piece of curve from `start` to `end`.
    pub fn push(&mut self, start: Point, end: Point, color: Rgb, sink: &mut dyn TraceSink) {
        match self.mode {
            TraceMode::Corners => {
                self.corners.push(end);
                sink.append_corner(end);
            }
            TraceMode::Plain => {
                let segment = self.make_segment(start, end, color);
                sink.append_segment(&segment);
                self.segments.push(segment);
            }
            TraceMode::Fade => self.push_fading(start, end, color, sink),
        }
    }

    /// Both endpoints move inward by `overlap_buff * (end - start)` so two
    /// consecutive collinear segments don't double-draw their shared vertex.
    fn make_segment(&self, start: Point, end: Point, color: Rgb) -> Segment {
        let inset = (end - start) * self.overlap_buff;
        Segment {
            start: start + inset,
            end: end - inset,
            color,
            width: self.width,
            opacity: self.opacity,
        }
    }

    fn push_fading(&mut self, start: Point, end: Point, color: Rgb, sink: &mut dyn TraceSink) {
        let segment = self.make_segment(start, end, color);
        sink.append_segment(&segment);
        self.total_length_retained += segment.length();
        self.total_length_all += segment.length();
        self.segments.push(segment);

        let count = self.segments.len();
        let non_faded = match self.first_active {
            Some(first) => count - first,
            None => count,
        };
        // Decided before any boundary movement below; the fade pass keys
        // off the pre-movement aggregates.
        let should_evict =
            self.total_length_all >= self.length_budget || non_faded > self.max_segments;

        match self.first_active {
            None => {
                if non_faded > self.max_segments {
                    // Fallback boundary so eviction can begin even though
                    // the length budget was never crossed.
                    self.first_active = Some(1);
                }
                let mut acc = 0.0;
                for i in 1..=count {
                    acc += self.segments[count - i].length();
                    if acc > self.length_budget {
                        self.first_active = Some(count - i);
                        self.total_length_retained = acc;
                        break;
                    }
                }
            }
            Some(first) => {
                if self.total_length_retained >= self.length_budget
                    || non_faded > self.max_segments
                {
                    if self.total_length_retained < self.length_budget {
                        // Only the segment-count cap was crossed.
                        self.first_active = Some(first + 1);
                    } else {
                        // Advance by the smallest count of oldest active
                        // segments whose removal fits the window back
                        // under budget.
                        let mut removed = 0.0;
                        let mut found = false;
                        for i in 1..=(count - first) {
                            removed += self.segments[first + i - 1].length();
                            if self.total_length_retained - removed <= self.length_budget {
                                self.first_active = Some(first + i);
                                found = true;
                                break;
                            }
                        }
                        if !found {
                            self.first_active = Some(if non_faded > self.max_segments {
                                first + 1
                            } else {
                                count - 1
                            });
                        }
                    }
                }
            }
        }

        if let Some(first) = self.first_active {
            // Hard cap on the non-faded window, then re-derive both sums
            // from the segments themselves so the aggregates stay exact.
            let first = if count - first > self.max_segments {
                count - self.max_segments
            } else {
                first
            };
            self.first_active = Some(first);
            self.total_length_retained =
                self.segments[first..].iter().map(Segment::length).sum();
            self.total_length_all = self.segments.iter().map(Segment::length).sum();
        }

        if !should_evict {
            return;
        }
        let Some(first) = self.first_active else {
            return;
        };

        // Fade pass: newest fading segment first. At most one eviction
        // batch per tick; everything older than a fully-faded segment
        // goes with it.
        for offset in 1..=first {
            let index = first - offset;
            if self.segments[index].opacity <= self.fade_decrement {
                let drained = index + 1;
                self.segments.drain(..drained);
                sink.remove_prefix(drained);
                self.first_active = Some(first - drained);
                self.evicted_count += drained;
                break;
            }
            let segment = &mut self.segments[index];
            segment.opacity *= 1.0 - self.fade_decrement;
            segment.width *= 1.0 - self.fade_decrement;
            sink.restyle_segment(index, segment.opacity, segment.width);
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn corners(&self) -> &[Point] {
        &self.corners
    }

    /// Index of the oldest segment not yet eligible for fade-out.
    pub fn first_active(&self) -> Option<usize> {
        self.first_active
    }

    /// Summed length of the not-yet-fading window.
    pub fn retained_length(&self) -> f64 {
        self.total_length_retained
    }

    /// Summed length of every stored segment.
    pub fn total_length(&self) -> f64 {
        self.total_length_all
    }

    /// Segments evicted over the buffer's lifetime.
    pub fn evicted_count(&self) -> usize {
        self.evicted_count
    }
}
