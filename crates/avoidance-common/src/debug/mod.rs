//! Debug visualization utilities for the avoidance solver
//!
//! This module provides renderer-agnostic primitives for visualizing agents,
//! obstacles, velocity constraints and feasible regions. Nothing here is
//! consulted by the solver itself.

mod visualization;

pub use visualization::*;

/// Color representation for debug visualization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Creates a new color
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from RGB values (alpha = 1.0)
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }
}

/// Common debug colors
impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const ORANGE: Color = Color::rgb(1.0, 0.5, 0.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
}

/// Debug line for rendering
#[derive(Debug, Clone)]
pub struct DebugLine {
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub color: Color,
}

/// Debug circle for rendering, lying in the XZ plane
#[derive(Debug, Clone)]
pub struct DebugCircle {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: Color,
    pub segments: u32,
}

/// Debug arrow for rendering
#[derive(Debug, Clone)]
pub struct DebugArrow {
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub color: Color,
    pub head_size: f32,
}

/// Debug text for rendering
#[derive(Debug, Clone)]
pub struct DebugText {
    pub position: [f32; 3],
    pub text: String,
    pub color: Color,
}

/// Collection of debug drawing primitives
#[derive(Debug, Default)]
pub struct DebugDraw {
    pub lines: Vec<DebugLine>,
    pub circles: Vec<DebugCircle>,
    pub arrows: Vec<DebugArrow>,
    pub text: Vec<DebugText>,
}

impl DebugDraw {
    /// Creates a new debug draw collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all debug drawing primitives
    pub fn clear(&mut self) {
        self.lines.clear();
        self.circles.clear();
        self.arrows.clear();
        self.text.clear();
    }

    /// Adds a debug line
    pub fn line(&mut self, start: [f32; 3], end: [f32; 3], color: Color) {
        self.lines.push(DebugLine { start, end, color });
    }

    /// Adds a closed polyline through `points`
    pub fn polygon(&mut self, points: &[[f32; 3]], color: Color) {
        let n = points.len();
        for i in 0..n {
            self.line(points[i], points[(i + 1) % n], color);
        }
    }

    /// Adds a debug circle
    pub fn circle(&mut self, center: [f32; 3], radius: f32, color: Color) {
        self.circles.push(DebugCircle {
            center,
            radius,
            color,
            segments: 32,
        });
    }

    /// Adds a debug arrow
    pub fn arrow(&mut self, start: [f32; 3], end: [f32; 3], color: Color) {
        self.arrows.push(DebugArrow {
            start,
            end,
            color,
            head_size: 0.25,
        });
    }

    /// Adds debug text
    pub fn text(&mut self, position: [f32; 3], text: impl Into<String>, color: Color) {
        self.text.push(DebugText {
            position,
            text: text.into(),
            color,
        });
    }

    /// Gets the total number of debug primitives
    pub fn primitive_count(&self) -> usize {
        self.lines.len() + self.circles.len() + self.arrows.len() + self.text.len()
    }

    /// Checks if the debug draw is empty
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_closes() {
        let mut draw = DebugDraw::new();
        draw.polygon(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            Color::WHITE,
        );
        assert_eq!(draw.lines.len(), 3);
        assert_eq!(draw.lines[2].end, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clear() {
        let mut draw = DebugDraw::new();
        draw.circle([0.0; 3], 1.0, Color::RED);
        draw.arrow([0.0; 3], [1.0, 0.0, 0.0], Color::GREEN);
        draw.text([0.0; 3], "agent", Color::WHITE);
        assert_eq!(draw.primitive_count(), 3);
        draw.clear();
        assert!(draw.is_empty());
    }
}
