//! Shared fixtures for the unit and property tests.

use crate::style::Rgb;
use crate::trace::Segment;
use crate::traits::{Point, TraceSink};

pub fn unit_color() -> Rgb {
    Rgb::new(1.0, 1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Append(Segment),
    Restyle {
        index: usize,
        opacity: f32,
        width: f32,
    },
    RemovePrefix(usize),
    Corner(Point),
    Marker(Point),
}

/// Sink that records every call and maintains a mirror of the live curve,
/// the way a rendering engine would.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    pub live: Vec<Segment>,
    pub corners: Vec<Point>,
    pub marker: Option<Point>,
}

impl TraceSink for RecordingSink {
    fn append_segment(&mut self, segment: &Segment) {
        self.events.push(SinkEvent::Append(*segment));
        self.live.push(*segment);
    }

    fn restyle_segment(&mut self, index: usize, opacity: f32, width: f32) {
        self.events.push(SinkEvent::Restyle {
            index,
            opacity,
            width,
        });
        self.live[index].opacity = opacity;
        self.live[index].width = width;
    }

    fn remove_prefix(&mut self, count: usize) {
        self.events.push(SinkEvent::RemovePrefix(count));
        self.live.drain(..count);
    }

    fn append_corner(&mut self, point: Point) {
        self.events.push(SinkEvent::Corner(point));
        self.corners.push(point);
    }

    fn move_marker(&mut self, point: Point) {
        self.events.push(SinkEvent::Marker(point));
        self.marker = Some(point);
    }
}
