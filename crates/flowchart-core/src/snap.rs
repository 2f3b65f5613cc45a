//! Grid snapping and node alignment guides.

use kurbo::{Point, Rect, Vec2};

/// Selectable grid sizes, cycled by [`SnappingEngine::cycle_size`].
pub const SNAP_PRESETS: [f64; 4] = [8.0, 10.0, 16.0, 20.0];

/// Default grid size.
pub const DEFAULT_SNAP_SIZE: f64 = 10.0;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    if grid_size <= 0.0 || !grid_size.is_finite() {
        return SnapResult::none(point);
    }
    SnapResult {
        point: Point::new(
            (point.x / grid_size).round() * grid_size,
            (point.y / grid_size).round() * grid_size,
        ),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Snapping toggle and grid size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapState {
    pub enabled: bool,
    pub size: f64,
}

impl Default for SnapState {
    fn default() -> Self {
        Self {
            enabled: false,
            size: DEFAULT_SNAP_SIZE,
        }
    }
}

/// Orientation of an alignment guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    /// Constant x.
    Vertical,
    /// Constant y.
    Horizontal,
}

/// A guide line drawn while a node is aligned with another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub orientation: GuideOrientation,
    /// x for vertical guides, y for horizontal ones.
    pub coordinate: f64,
    /// Extent along the other axis.
    pub start: f64,
    pub end: f64,
}

impl Guide {
    pub fn endpoints(&self) -> (Point, Point) {
        match self.orientation {
            GuideOrientation::Vertical => (
                Point::new(self.coordinate, self.start),
                Point::new(self.coordinate, self.end),
            ),
            GuideOrientation::Horizontal => (
                Point::new(self.start, self.coordinate),
                Point::new(self.end, self.coordinate),
            ),
        }
    }
}

/// Adjustment that aligns a dragged rect with its neighbours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub adjustment: Vec2,
    pub guides: Vec<Guide>,
}

impl Alignment {
    pub fn is_aligned(&self) -> bool {
        !self.guides.is_empty()
    }
}

fn x_anchors(r: Rect) -> [f64; 3] {
    [r.x0, r.center().x, r.x1]
}

fn y_anchors(r: Rect) -> [f64; 3] {
    [r.y0, r.center().y, r.y1]
}

/// Smallest offset within `tolerance` that brings one of `moving` onto one of `fixed`.
fn best_offset(moving: [f64; 3], fixed: [f64; 3], tolerance: f64, best: &mut Option<f64>) {
    for m in moving {
        for f in fixed {
            let diff = f - m;
            if diff.abs() <= tolerance && best.is_none_or(|b| diff.abs() < b.abs()) {
                *best = Some(diff);
            }
        }
    }
}

/// Grid snapping plus alignment helpers.
#[derive(Debug, Clone, Default)]
pub struct SnappingEngine {
    state: SnapState,
}

impl SnappingEngine {
    pub fn new(enabled: bool, size: f64) -> Self {
        Self {
            state: SnapState { enabled, size },
        }
    }

    pub fn state(&self) -> SnapState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn size(&self) -> f64 {
        self.state.size
    }

    /// Flip snapping on or off and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.state.enabled = !self.state.enabled;
        log::debug!("Snapping {}", if self.state.enabled { "on" } else { "off" });
        self.state.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    pub fn set_size(&mut self, size: f64) {
        if size > 0.0 && size.is_finite() {
            self.state.size = size;
        }
    }

    /// Advance to the next preset size, wrapping around.
    ///
    /// A size that is not a preset jumps to the first preset.
    pub fn cycle_size(&mut self) -> f64 {
        let next = SNAP_PRESETS
            .iter()
            .position(|p| (p - self.state.size).abs() < f64::EPSILON)
            .map(|i| SNAP_PRESETS[(i + 1) % SNAP_PRESETS.len()])
            .unwrap_or(SNAP_PRESETS[0]);
        self.state.size = next;
        log::debug!("Snap size {next}");
        next
    }

    /// Snap a point to the grid when enabled; identity otherwise.
    pub fn snap(&self, point: Point) -> Point {
        if self.state.enabled {
            snap_to_grid(point, self.state.size).point
        } else {
            point
        }
    }

    /// Snap a displacement to whole grid steps when enabled.
    pub fn snap_vec(&self, delta: Vec2) -> Vec2 {
        self.snap(delta.to_point()).to_vec2()
    }

    /// Align `moving` with the edges and centres of `others`.
    ///
    /// Each axis is adjusted independently by the smallest offset within
    /// `tolerance`. Guides are produced for every neighbour that lines up
    /// after the adjustment.
    pub fn align_to_nodes(&self, moving: Rect, others: &[Rect], tolerance: f64) -> Alignment {
        let mut dx = None;
        let mut dy = None;
        for other in others {
            best_offset(x_anchors(moving), x_anchors(*other), tolerance, &mut dx);
            best_offset(y_anchors(moving), y_anchors(*other), tolerance, &mut dy);
        }
        let adjustment = Vec2::new(dx.unwrap_or(0.0), dy.unwrap_or(0.0));
        let aligned = moving + adjustment;

        let mut guides = Vec::new();
        for other in others {
            if dx.is_some() {
                for x in x_anchors(aligned) {
                    if x_anchors(*other).iter().any(|o| (o - x).abs() < 1e-6) {
                        guides.push(Guide {
                            orientation: GuideOrientation::Vertical,
                            coordinate: x,
                            start: aligned.y0.min(other.y0),
                            end: aligned.y1.max(other.y1),
                        });
                    }
                }
            }
            if dy.is_some() {
                for y in y_anchors(aligned) {
                    if y_anchors(*other).iter().any(|o| (o - y).abs() < 1e-6) {
                        guides.push(Guide {
                            orientation: GuideOrientation::Horizontal,
                            coordinate: y,
                            start: aligned.x0.min(other.x0),
                            end: aligned.x1.max(other.x1),
                        });
                    }
                }
            }
        }
        Alignment { adjustment, guides }
    }
}
