//! Per-frame hand positions as delivered by the external hand tracker.

use serde::{Deserialize, Serialize};

/// Which hand a tracker sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Parse a tracker handedness label (`"Left"` / `"Right"`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Left" | "left" => Some(Self::Left),
            "Right" | "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// A wrist position in screen pixels. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct HandPoint {
    pub x: f64,
    pub y: f64,
}

impl HandPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &HandPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<[f64; 2]> for HandPoint {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<HandPoint> for [f64; 2] {
    fn from(value: HandPoint) -> Self {
        [value.x, value.y]
    }
}

impl From<(f64, f64)> for HandPoint {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Hands seen in a single frame. An absent hand is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandFrame {
    pub left: Option<HandPoint>,
    pub right: Option<HandPoint>,
}

impl HandFrame {
    pub fn new(left: Option<HandPoint>, right: Option<HandPoint>) -> Self {
        Self { left, right }
    }

    /// A frame in which the tracker found no hands.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a frame from labelled tracker samples. Unknown labels are skipped
    /// and a repeated label keeps the last sample.
    pub fn from_labelled<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, HandPoint)>,
    {
        let mut frame = Self::empty();
        for (label, point) in samples {
            match Hand::from_label(label) {
                Some(hand) => frame.set(hand, Some(point)),
                None => log::debug!("ignoring hand sample with label {:?}", label),
            }
        }
        frame
    }

    pub fn get(&self, hand: Hand) -> Option<HandPoint> {
        match hand {
            Hand::Left => self.left,
            Hand::Right => self.right,
        }
    }

    pub fn set(&mut self, hand: Hand, point: Option<HandPoint>) {
        match hand {
            Hand::Left => self.left = point,
            Hand::Right => self.right = point,
        }
    }
}
