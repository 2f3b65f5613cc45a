//! Viewport module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::ease_in_out_cubic;

/// Default lower zoom bound.
pub const DEFAULT_MIN_SCALE: f64 = 0.1;
/// Default upper zoom bound.
pub const DEFAULT_MAX_SCALE: f64 = 5.0;

/// Viewport maps world coordinates onto the canvas.
///
/// The offset is stored in world units and applied before scaling, so
/// `screen = (world + offset) * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Translation in world units.
    pub offset: Vec2,
    /// Current zoom factor (1.0 = 100%).
    scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

impl Viewport {
    /// Create a viewport with default bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with explicit zoom bounds.
    pub fn with_bounds(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            ..Self::default()
        }
    }

    /// Current zoom factor.
    pub fn zoom(&self) -> f64 {
        self.scale
    }

    /// Set the zoom factor, clamped to the configured bounds.
    ///
    /// Non-finite or non-positive values clamp to the minimum.
    pub fn set_zoom(&mut self, scale: f64) {
        self.scale = self.clamp_scale(scale);
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if !scale.is_finite() || scale <= 0.0 {
            return self.min_scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    /// World to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale) * Affine::translate(self.offset)
    }

    /// Screen to world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(-self.offset) * Affine::scale(1.0 / self.scale)
    }

    /// Convert a screen point to world coordinates.
    pub fn to_world(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    /// Convert a world point to screen coordinates.
    pub fn to_screen(&self, world: Point) -> Point {
        self.transform() * world
    }

    /// Convert a screen-space distance into world units.
    pub fn screen_to_world_distance(&self, distance: f64) -> f64 {
        distance / self.scale
    }

    /// Pan by a delta measured in screen pixels.
    pub fn pan_by_screen(&mut self, delta: Vec2) {
        self.offset += delta / self.scale;
    }

    /// Zoom by `factor`, keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let new_scale = self.clamp_scale(self.scale * factor);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        let world = self.to_world(anchor);
        self.scale = new_scale;
        self.offset = anchor.to_vec2() / new_scale - world.to_vec2();
    }

    /// Fit `content` into a canvas of `canvas` size.
    ///
    /// `margin` is the fraction of the canvas the content may occupy.
    /// Empty or zero-area content resets the view.
    pub fn zoom_fit(&mut self, content: Rect, canvas: Size, margin: f64) {
        if content.is_zero_area() || canvas.is_zero_area() {
            self.reset();
            return;
        }
        let fit = (canvas.width / content.width()).min(canvas.height / content.height()) * margin;
        self.scale = self.clamp_scale(fit);
        self.offset = Vec2::new(
            (canvas.width / self.scale - content.width()) / 2.0 - content.x0,
            (canvas.height / self.scale - content.height()) / 2.0 - content.y0,
        );
    }

    /// Reset to identity.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// World-space rectangle currently visible in a canvas of `canvas` size.
    pub fn visible_world_rect(&self, canvas: Size) -> Rect {
        let p0 = self.to_world(Point::ZERO);
        let p1 = self.to_world(Point::new(canvas.width, canvas.height));
        Rect::from_points(p0, p1)
    }

    /// Eased interpolation between two viewports for animated transitions.
    pub fn interpolate(from: &Viewport, to: &Viewport, t: f64) -> Viewport {
        let e = ease_in_out_cubic(t);
        Viewport {
            offset: from.offset.lerp(to.offset, e),
            scale: from.scale + (to.scale - from.scale) * e,
            min_scale: to.min_scale,
            max_scale: to.max_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let vp = Viewport::new();
        assert_eq!(vp.offset, Vec2::ZERO);
        assert!((vp.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_world_with_offset_and_scale() {
        let mut vp = Viewport::new();
        vp.offset = Vec2::new(50.0, 100.0);
        vp.set_zoom(2.0);
        let world = vp.to_world(Point::new(200.0, 400.0));
        assert!((world.x - 50.0).abs() < 1e-10);
        assert!((world.y - 100.0).abs() < 1e-10);
        let screen = vp.to_screen(Point::new(0.0, 0.0));
        assert!((screen.x - 100.0).abs() < 1e-10);
        assert!((screen.y - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut vp = Viewport::new();
        vp.offset = Vec2::new(30.0, -20.0);
        vp.set_zoom(1.5);
        let original = Point::new(123.0, 456.0);
        let back = vp.to_screen(vp.to_world(original));
        assert!((back.x - original.x).abs() < 1e-9);
        assert!((back.y - original.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut vp = Viewport::new();
        vp.set_zoom(100.0);
        assert!((vp.zoom() - DEFAULT_MAX_SCALE).abs() < f64::EPSILON);
        vp.set_zoom(0.0001);
        assert!((vp.zoom() - DEFAULT_MIN_SCALE).abs() < f64::EPSILON);
        vp.set_zoom(f64::NAN);
        assert!((vp.zoom() - DEFAULT_MIN_SCALE).abs() < f64::EPSILON);
        vp.set_zoom(-3.0);
        assert!((vp.zoom() - DEFAULT_MIN_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut vp = Viewport::new();
        vp.offset = Vec2::new(10.0, 5.0);
        let anchor = Point::new(300.0, 200.0);
        let before = vp.to_world(anchor);
        vp.zoom_at(anchor, 1.1);
        let after = vp.to_world(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        assert!((vp.zoom() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_pan_by_screen_divides_by_scale() {
        let mut vp = Viewport::new();
        vp.set_zoom(2.0);
        vp.pan_by_screen(Vec2::new(20.0, -10.0));
        assert!((vp.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((vp.offset.y + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_fit_centres_content() {
        let mut vp = Viewport::new();
        let content = Rect::new(100.0, 100.0, 300.0, 200.0);
        let canvas = Size::new(800.0, 600.0);
        vp.zoom_fit(content, canvas, 0.9);
        // min(800/200, 600/100) * 0.9 = 3.6
        assert!((vp.zoom() - 3.6).abs() < 1e-12);
        let centre = vp.to_screen(content.center());
        assert!((centre.x - 400.0).abs() < 1e-9);
        assert!((centre.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_fit_empty_content_resets() {
        let mut vp = Viewport::new();
        vp.set_zoom(3.0);
        vp.offset = Vec2::new(5.0, 5.0);
        vp.zoom_fit(Rect::ZERO, Size::new(800.0, 600.0), 0.9);
        assert!((vp.zoom() - 1.0).abs() < f64::EPSILON);
        assert_eq!(vp.offset, Vec2::ZERO);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = Viewport::new();
        let mut b = Viewport::new();
        b.set_zoom(2.0);
        b.offset = Vec2::new(100.0, 0.0);
        let start = Viewport::interpolate(&a, &b, 0.0);
        let end = Viewport::interpolate(&a, &b, 1.0);
        assert_eq!(start.offset, a.offset);
        assert!((end.zoom() - 2.0).abs() < f64::EPSILON);
        assert_eq!(end.offset, b.offset);
    }
}
