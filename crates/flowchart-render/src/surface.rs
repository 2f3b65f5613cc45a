//! Drawing-surface contract and a recording implementation.

use flowchart_core::style::SerializableColor;
use flowchart_core::text::{ApproxTextMeasure, TextMeasure};
use kurbo::{BezPath, PathEl, Point, Rect, Vec2};
use peniko::Color;

use crate::renderer::{RenderResult, RendererError};

/// Horizontal text anchoring for [`DrawingSurface::fill_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// An immediate-mode 2D drawing context.
///
/// The primitive set mirrors a browser canvas: state is pushed with
/// [`save`](Self::save), paths are built between [`begin_path`](Self::begin_path)
/// and [`stroke`](Self::stroke)/[`fill`](Self::fill), and transforms compose
/// with the current one.
pub trait DrawingSurface: TextMeasure {
    fn save(&mut self);
    fn restore(&mut self);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point);
    fn quadratic_curve_to(&mut self, c: Point, p: Point);
    /// Circular arc, angles in radians.
    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64);
    fn close_path(&mut self);
    fn stroke(&mut self);
    fn fill(&mut self);

    fn fill_rect(&mut self, rect: Rect);
    fn stroke_rect(&mut self, rect: Rect);
    fn fill_text(&mut self, text: &str, position: Point);

    fn set_stroke_color(&mut self, color: Color);
    fn set_fill_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    /// Empty pattern means solid.
    fn set_line_dash(&mut self, pattern: &[f64]);
    fn set_font_size(&mut self, size: f64);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_global_alpha(&mut self, alpha: f64);

    fn translate(&mut self, offset: Vec2);
    fn scale(&mut self, factor: f64);
    fn rotate(&mut self, radians: f64);

    /// Called once after a frame has been issued.
    fn flush(&mut self) -> RenderResult<()> {
        Ok(())
    }

    /// Replay a kurbo path as path commands. Does not stroke or fill.
    fn trace_path(&mut self, path: &BezPath) {
        self.begin_path();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => self.move_to(p),
                PathEl::LineTo(p) => self.line_to(p),
                PathEl::QuadTo(c, p) => self.quadratic_curve_to(c, p),
                PathEl::CurveTo(c1, c2, p) => self.bezier_curve_to(c1, c2, p),
                PathEl::ClosePath => self.close_path(),
            }
        }
    }

    /// Trace an open polyline.
    fn trace_polyline(&mut self, points: &[Point]) {
        self.begin_path();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            self.move_to(*first);
        }
        for p in iter {
            self.line_to(*p);
        }
    }
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    BezierCurveTo(Point, Point, Point),
    QuadraticCurveTo(Point, Point),
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    ClosePath,
    Stroke,
    Fill,
    FillRect(Rect),
    StrokeRect(Rect),
    FillText {
        text: String,
        position: Point,
    },
    SetStrokeColor(SerializableColor),
    SetFillColor(SerializableColor),
    SetLineWidth(f64),
    SetLineDash(Vec<f64>),
    SetFontSize(f64),
    SetTextAlign(TextAlign),
    SetGlobalAlpha(f64),
    Translate(Vec2),
    Scale(f64),
    Rotate(f64),
}

/// Surface that stores every call, for tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    measure: ApproxTextMeasure,
    depth: usize,
    limit: Option<usize>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail [`flush`](DrawingSurface::flush) once more than `limit` commands are recorded.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.depth = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of recorded commands matching `pred`.
    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// All text drawn so far, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Current save/restore nesting.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl TextMeasure for RecordingSurface {
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        self.measure.measure_text(text, font_size)
    }
}

impl DrawingSurface for RecordingSurface {
    fn save(&mut self) {
        self.depth += 1;
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.push(DrawCommand::Restore);
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.push(DrawCommand::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.push(DrawCommand::LineTo(p));
    }

    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.push(DrawCommand::BezierCurveTo(c1, c2, p));
    }

    fn quadratic_curve_to(&mut self, c: Point, p: Point) {
        self.push(DrawCommand::QuadraticCurveTo(c, p));
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        self.push(DrawCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.push(DrawCommand::FillRect(rect));
    }

    fn stroke_rect(&mut self, rect: Rect) {
        self.push(DrawCommand::StrokeRect(rect));
    }

    fn fill_text(&mut self, text: &str, position: Point) {
        self.push(DrawCommand::FillText {
            text: text.to_string(),
            position,
        });
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.push(DrawCommand::SetStrokeColor(color.into()));
    }

    fn set_fill_color(&mut self, color: Color) {
        self.push(DrawCommand::SetFillColor(color.into()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::SetLineWidth(width));
    }

    fn set_line_dash(&mut self, pattern: &[f64]) {
        self.push(DrawCommand::SetLineDash(pattern.to_vec()));
    }

    fn set_font_size(&mut self, size: f64) {
        self.push(DrawCommand::SetFontSize(size));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.push(DrawCommand::SetTextAlign(align));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawCommand::SetGlobalAlpha(alpha));
    }

    fn translate(&mut self, offset: Vec2) {
        self.push(DrawCommand::Translate(offset));
    }

    fn scale(&mut self, factor: f64) {
        self.push(DrawCommand::Scale(factor));
    }

    fn rotate(&mut self, radians: f64) {
        self.push(DrawCommand::Rotate(radians));
    }

    fn flush(&mut self) -> RenderResult<()> {
        match self.limit {
            Some(limit) if self.commands.len() > limit => Err(RendererError::Surface(format!(
                "command buffer overflow: {} > {}",
                self.commands.len(),
                limit
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_path_replays_elements() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.curve_to((12.0, 0.0), (14.0, 2.0), (14.0, 4.0));
        path.close_path();

        let mut surface = RecordingSurface::new();
        surface.trace_path(&path);
        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::BeginPath,
                DrawCommand::MoveTo(Point::new(0.0, 0.0)),
                DrawCommand::LineTo(Point::new(10.0, 0.0)),
                DrawCommand::BezierCurveTo(
                    Point::new(12.0, 0.0),
                    Point::new(14.0, 2.0),
                    Point::new(14.0, 4.0)
                ),
                DrawCommand::ClosePath,
            ]
        );
    }

    #[test]
    fn test_save_restore_depth() {
        let mut surface = RecordingSurface::new();
        surface.save();
        surface.save();
        surface.restore();
        assert_eq!(surface.depth(), 1);
        surface.restore();
        surface.restore();
        assert_eq!(surface.depth(), 0);
    }

    #[test]
    fn test_colors_recorded_as_rgba8() {
        let mut surface = RecordingSurface::new();
        surface.set_fill_color(Color::from_rgba8(10, 20, 30, 255));
        assert_eq!(
            surface.commands()[0],
            DrawCommand::SetFillColor(SerializableColor::rgb(10, 20, 30))
        );
    }

    #[test]
    fn test_limit_overflow_reports_surface_error() {
        let mut surface = RecordingSurface::with_limit(1);
        surface.begin_path();
        assert!(surface.flush().is_ok());
        surface.stroke();
        assert!(matches!(surface.flush(), Err(RendererError::Surface(_))));
    }

    #[test]
    fn test_texts_and_measure() {
        let mut surface = RecordingSurface::new();
        surface.fill_text("Start", Point::ZERO);
        surface.fill_text("End", Point::ZERO);
        assert_eq!(surface.texts(), vec!["Start", "End"]);
        assert!((surface.measure_text("abcd", 10.0) - 24.0).abs() < 1e-9);
    }
}
