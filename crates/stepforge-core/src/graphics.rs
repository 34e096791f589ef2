//! Generic graphics payload returned by `visualize()` and `preview()`.
//!
//! The payload is deliberately loose: five optional ordered sequences of
//! primitives that a presentation layer can draw. Pipelines tag every
//! primitive with the index of the stage that produced it so consumers can
//! color or filter by stage.
//!
//! # Example
//!
//! ```
//! use stepforge_core::graphics::{GraphicsObject, Point};
//!
//! let mut graphics = GraphicsObject::default();
//! graphics.points.push(Point::new(1.0, 2.0).with_color("red"));
//!
//! let tagged = graphics.tagged_with_stage(3);
//! assert_eq!(tagged.points[0].stage, Some(3));
//! ```

use serde::{Deserialize, Serialize};

/// A bare coordinate pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A labelled point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Index of the pipeline stage that produced this point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<usize>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A polyline through an ordered list of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub points: Vec<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<usize>,
}

impl Line {
    pub fn new(points: impl IntoIterator<Item = Coord>) -> Self {
        Self {
            points: points.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.stroke_color = Some(color.into());
        self.stroke_width = Some(width);
        self
    }
}

/// An axis-aligned rectangle described by its center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub center: Coord,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<usize>,
}

impl Rect {
    pub fn new(center: Coord, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
            ..Self::default()
        }
    }
}

/// A circle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    pub center: Coord,
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<usize>,
}

impl Circle {
    pub fn new(center: Coord, radius: f64) -> Self {
        Self {
            center,
            radius,
            ..Self::default()
        }
    }
}

/// A text label anchored at a point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<usize>,
}

impl Text {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Drawable snapshot of a solver's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsObject {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rects: Vec<Rect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub circles: Vec<Circle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub texts: Vec<Text>,
}

impl GraphicsObject {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no primitive of any kind is present.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
            && self.lines.is_empty()
            && self.rects.is_empty()
            && self.circles.is_empty()
            && self.texts.is_empty()
    }

    /// Total number of primitives across all sequences.
    pub fn element_count(&self) -> usize {
        self.points.len() + self.lines.len() + self.rects.len() + self.circles.len() + self.texts.len()
    }

    /// Returns this payload with every primitive tagged as produced by `stage`.
    pub fn tagged_with_stage(mut self, stage: usize) -> Self {
        self.points.iter_mut().for_each(|p| p.stage = Some(stage));
        self.lines.iter_mut().for_each(|l| l.stage = Some(stage));
        self.rects.iter_mut().for_each(|r| r.stage = Some(stage));
        self.circles.iter_mut().for_each(|c| c.stage = Some(stage));
        self.texts.iter_mut().for_each(|t| t.stage = Some(stage));
        self
    }

    /// Appends all primitives of `other`, preserving order.
    pub fn extend(&mut self, other: GraphicsObject) {
        self.points.extend(other.points);
        self.lines.extend(other.lines);
        self.rects.extend(other.rects);
        self.circles.extend(other.circles);
        self.texts.extend(other.texts);
    }

    /// Combines per-stage payloads into one.
    ///
    /// A single payload is returned unmodified. With several, each is tagged
    /// with its stage index and concatenated in the given order.
    pub fn merge_stages(stages: impl IntoIterator<Item = (usize, GraphicsObject)>) -> Self {
        let mut stages: Vec<(usize, GraphicsObject)> = stages.into_iter().collect();
        match stages.len() {
            0 => GraphicsObject::default(),
            1 => stages.pop().map(|(_, g)| g).unwrap_or_default(),
            _ => {
                let mut merged = GraphicsObject::default();
                for (index, graphics) in stages {
                    merged.extend(graphics.tagged_with_stage(index));
                }
                merged
            }
        }
    }
}

#[cfg(test)]
#[path = "graphics_tests.rs"]
mod tests;
