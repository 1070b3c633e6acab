//! Viewport engine: zoom, pan, hit-testing and gesture disambiguation.
//!
//! Pure synchronous math. The rendered grid is centred in its container,
//! translated by `(pan_x, pan_y)` and scaled so that one cell spans
//! `cell_px × zoom` screen pixels. A screen point therefore maps to the
//! fractional grid coordinate
//!
//! ```text
//! u = (px - container_centre_x - pan_x) / (cell_px × zoom) + grid_width / 2
//! ```
//!
//! and the cell under it is `floor(u)`.

/// Containers narrower than this are treated as mobile.
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;

/// Form factor, which decides the minimum zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Wide container, mouse and wheel.
    Desktop,
    /// Narrow container, touch.
    Mobile,
}

impl DeviceClass {
    /// Classifies a container by its width.
    #[must_use]
    pub fn from_width(width: f64) -> Self {
        if width < MOBILE_BREAKPOINT_PX {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

/// Tunables of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    /// Grid columns.
    pub grid_width: u32,
    /// Grid rows.
    pub grid_height: u32,
    /// Screen pixels per cell at zoom 1.
    pub cell_px: f64,
    /// The "100 %" zoom.
    pub base_zoom: f64,
    /// Minimum zoom as a fraction of `base_zoom`.
    pub min_factor: f64,
    /// Maximum zoom as a multiple of `base_zoom`.
    pub max_factor: f64,
    /// Zoom change per zoom button press.
    pub button_step: f64,
    /// Zoom change per wheel notch.
    pub wheel_step: f64,
    /// Zoom change per pinch move event.
    pub pinch_step: f64,
    /// Pointer travel that turns a press into a drag.
    pub drag_threshold_px: f64,
    /// Grid pixels that must stay visible when panning.
    pub edge_margin_px: f64,
}

impl ViewportConfig {
    /// Desktop defaults for a `grid_width × grid_height` canvas.
    #[must_use]
    pub fn desktop(grid_width: u32, grid_height: u32) -> Self {
        Self {
            grid_width,
            grid_height,
            cell_px: 7.0,
            base_zoom: 1.5,
            min_factor: 0.5,
            max_factor: 3.33,
            button_step: 0.5,
            wheel_step: 0.1,
            pinch_step: 0.1,
            drag_threshold_px: 4.0,
            edge_margin_px: 32.0,
        }
    }

    /// Mobile defaults: like desktop with a higher minimum zoom.
    #[must_use]
    pub fn mobile(grid_width: u32, grid_height: u32) -> Self {
        Self {
            min_factor: 0.7,
            ..Self::desktop(grid_width, grid_height)
        }
    }

    /// Defaults for the given device class.
    #[must_use]
    pub fn for_device(device: DeviceClass, grid_width: u32, grid_height: u32) -> Self {
        match device {
            DeviceClass::Desktop => Self::desktop(grid_width, grid_height),
            DeviceClass::Mobile => Self::mobile(grid_width, grid_height),
        }
    }

    /// Lowest allowed zoom.
    #[must_use]
    pub fn min_zoom(&self) -> f64 {
        self.base_zoom * self.min_factor
    }

    /// Highest allowed zoom.
    #[must_use]
    pub fn max_zoom(&self) -> f64 {
        self.base_zoom * self.max_factor
    }
}

/// A screen position in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// The container's bounding box on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl ContainerRect {
    /// Creates a rect.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Centre of the container.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// A cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

/// Zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Scale factor applied to `cell_px`.
    pub zoom: f64,
    /// Horizontal offset of the grid centre from the container centre.
    pub pan_x: f64,
    /// Vertical offset of the grid centre from the container centre.
    pub pan_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Pressed { start: Point, last: Point, dragging: bool },
    Pinching { last_distance: f64 },
    /// A pinch ended with fingers still down; nothing counts as a click
    /// until every touch is lifted.
    Suppressed,
}

/// Owns the [`ViewportState`] and turns input events into state changes
/// and cell clicks.
#[derive(Debug, Clone)]
pub struct ViewportController {
    config: ViewportConfig,
    state: ViewportState,
    gesture: Gesture,
}

impl ViewportController {
    /// Creates a controller at minimum zoom, centred.
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        let state = ViewportState {
            zoom: config.min_zoom(),
            pan_x: 0.0,
            pan_y: 0.0,
        };
        Self {
            config,
            state,
            gesture: Gesture::Idle,
        }
    }

    /// Creates a controller with defaults chosen from the container width.
    #[must_use]
    pub fn for_container(rect: &ContainerRect, grid_width: u32, grid_height: u32) -> Self {
        let device = DeviceClass::from_width(rect.width);
        Self::new(ViewportConfig::for_device(device, grid_width, grid_height))
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Current zoom and pan.
    #[must_use]
    pub const fn state(&self) -> ViewportState {
        self.state
    }

    /// Zoom relative to the base zoom, in percent.
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        let pct = (self.state.zoom / self.config.base_zoom * 100.0).round();
        if pct <= 0.0 { 0 } else { pct as u32 }
    }

    /// On-screen size of the whole grid.
    #[must_use]
    pub fn rendered_size(&self) -> (f64, f64) {
        let scale = self.scale();
        (
            f64::from(self.config.grid_width) * scale,
            f64::from(self.config.grid_height) * scale,
        )
    }

    fn scale(&self) -> f64 {
        self.config.cell_px * self.state.zoom
    }

    /// Fractional grid coordinate under `point`.
    #[must_use]
    pub fn screen_to_grid(&self, point: Point, rect: &ContainerRect) -> (f64, f64) {
        let c = rect.center();
        let scale = self.scale();
        (
            (point.x - c.x - self.state.pan_x) / scale + f64::from(self.config.grid_width) / 2.0,
            (point.y - c.y - self.state.pan_y) / scale + f64::from(self.config.grid_height) / 2.0,
        )
    }

    /// The cell under `point`, or `None` outside the grid.
    #[must_use]
    pub fn screen_to_cell(&self, point: Point, rect: &ContainerRect) -> Option<CellCoord> {
        let (u, v) = self.screen_to_grid(point, rect);
        let (u, v) = (u.floor(), v.floor());
        if !(u.is_finite() && v.is_finite()) || u < 0.0 || v < 0.0 {
            return None;
        }
        if u >= f64::from(self.config.grid_width) || v >= f64::from(self.config.grid_height) {
            return None;
        }
        Some(CellCoord {
            x: u as u32,
            y: v as u32,
        })
    }

    /// Sets the zoom to `new_zoom` (clamped) keeping the grid point under
    /// `point` fixed on screen, then clamps the pan.
    ///
    /// When `point` is over a cell the grid already overlaps the container
    /// after the zoom, so only the zero-margin bound applies and the cell
    /// stays under `point`.
    pub fn zoom_at(&mut self, point: Point, rect: &ContainerRect, new_zoom: f64) {
        let new_zoom = new_zoom.clamp(self.config.min_zoom(), self.config.max_zoom());
        let anchored = self.screen_to_cell(point, rect).is_some();
        let c = rect.center();
        let old_scale = self.scale();
        let gx = (point.x - c.x - self.state.pan_x) / old_scale;
        let gy = (point.y - c.y - self.state.pan_y) / old_scale;

        self.state.zoom = new_zoom;
        let new_scale = self.scale();
        self.state.pan_x = point.x - c.x - gx * new_scale;
        self.state.pan_y = point.y - c.y - gy * new_scale;
        if anchored {
            self.clamp_pan_with_margin(rect, 0.0);
        } else {
            self.clamp_pan(rect);
        }
    }

    /// Zooms in by one button step around the container centre.
    pub fn zoom_in(&mut self, rect: &ContainerRect) {
        let target = self.state.zoom + self.config.button_step;
        self.zoom_at(rect.center(), rect, target);
    }

    /// Zooms out by one button step around the container centre.
    pub fn zoom_out(&mut self, rect: &ContainerRect) {
        let target = self.state.zoom - self.config.button_step;
        self.zoom_at(rect.center(), rect, target);
    }

    /// Applies one wheel event at `point`. Positive `delta_y` zooms out.
    pub fn wheel(&mut self, point: Point, rect: &ContainerRect, delta_y: f64) {
        let step = if delta_y > 0.0 {
            -self.config.wheel_step
        } else if delta_y < 0.0 {
            self.config.wheel_step
        } else {
            return;
        };
        self.zoom_at(point, rect, self.state.zoom + step);
    }

    /// Moves the grid by `(dx, dy)` screen pixels, then clamps.
    pub fn pan_by(&mut self, dx: f64, dy: f64, rect: &ContainerRect) {
        self.state.pan_x += dx;
        self.state.pan_y += dy;
        self.clamp_pan(rect);
    }

    /// Keeps at least `edge_margin_px` of the grid inside the container
    /// on each axis.
    pub fn clamp_pan(&mut self, rect: &ContainerRect) {
        self.clamp_pan_with_margin(rect, self.config.edge_margin_px);
    }

    fn clamp_pan_with_margin(&mut self, rect: &ContainerRect, margin: f64) {
        let (rw, rh) = self.rendered_size();
        let bound_x = pan_bound(rect.width, rw, margin);
        let bound_y = pan_bound(rect.height, rh, margin);
        self.state.pan_x = self.state.pan_x.clamp(-bound_x, bound_x);
        self.state.pan_y = self.state.pan_y.clamp(-bound_y, bound_y);
    }

    /// Back to minimum zoom, centred. Any gesture is dropped.
    pub fn reset(&mut self) {
        self.state = ViewportState {
            zoom: self.config.min_zoom(),
            pan_x: 0.0,
            pan_y: 0.0,
        };
        self.gesture = Gesture::Idle;
    }

    /// Reacts to a container resize: the device class (and so the minimum
    /// zoom) may change.
    pub fn resize(&mut self, rect: &ContainerRect) {
        self.config.min_factor = match DeviceClass::from_width(rect.width) {
            DeviceClass::Desktop => ViewportConfig::desktop(0, 0).min_factor,
            DeviceClass::Mobile => ViewportConfig::mobile(0, 0).min_factor,
        };
        self.state.zoom = self
            .state
            .zoom
            .clamp(self.config.min_zoom(), self.config.max_zoom());
        self.clamp_pan(rect);
    }

    /// Mouse button (or pen) pressed.
    pub fn pointer_down(&mut self, point: Point) {
        self.gesture = Gesture::Pressed {
            start: point,
            last: point,
            dragging: false,
        };
    }

    /// Pointer moved; pans once past the drag threshold.
    pub fn pointer_move(&mut self, point: Point, rect: &ContainerRect) {
        let Gesture::Pressed {
            start,
            last,
            dragging,
        } = self.gesture
        else {
            return;
        };
        let dragging = dragging || start.distance(point) > self.config.drag_threshold_px;
        if dragging {
            self.pan_by(point.x - last.x, point.y - last.y, rect);
        }
        self.gesture = Gesture::Pressed {
            start,
            last: if dragging { point } else { last },
            dragging,
        };
    }

    /// Pointer released. Returns the clicked cell unless the press became
    /// a drag or landed outside the grid.
    pub fn pointer_up(&mut self, point: Point, rect: &ContainerRect) -> Option<CellCoord> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Pressed {
                dragging: false, ..
            } => self.screen_to_cell(point, rect),
            _ => None,
        }
    }

    /// Touches began; `touches` holds every finger currently down.
    pub fn touch_start(&mut self, touches: &[Point]) {
        match touches {
            [only] if matches!(self.gesture, Gesture::Idle) => self.pointer_down(*only),
            [a, b, ..] => {
                self.gesture = Gesture::Pinching {
                    last_distance: a.distance(*b),
                };
            }
            _ => {}
        }
    }

    /// Touches moved.
    pub fn touch_move(&mut self, touches: &[Point], rect: &ContainerRect) {
        match (touches, self.gesture) {
            ([only], Gesture::Pressed { .. }) => self.pointer_move(*only, rect),
            ([a, b, ..], Gesture::Pinching { last_distance }) => {
                let distance = a.distance(*b);
                if last_distance > 0.0 {
                    let ratio = distance / last_distance;
                    let step = if ratio > 1.0 {
                        self.config.pinch_step
                    } else if ratio < 1.0 {
                        -self.config.pinch_step
                    } else {
                        0.0
                    };
                    if step != 0.0 {
                        let target = self.state.zoom + step;
                        self.zoom_at(a.midpoint(*b), rect, target);
                    }
                }
                self.gesture = Gesture::Pinching {
                    last_distance: distance,
                };
            }
            ([a, b, ..], _) => {
                self.gesture = Gesture::Pinching {
                    last_distance: a.distance(*b),
                };
            }
            _ => {}
        }
    }

    /// Touches ended; `remaining` holds fingers still down and `lifted`
    /// the position of the finger that was lifted.
    pub fn touch_end(
        &mut self,
        remaining: &[Point],
        lifted: Point,
        rect: &ContainerRect,
    ) -> Option<CellCoord> {
        if !remaining.is_empty() {
            if matches!(self.gesture, Gesture::Pinching { .. } | Gesture::Suppressed) {
                self.gesture = Gesture::Suppressed;
            }
            return None;
        }
        self.pointer_up(lifted, rect)
    }

    /// Drops any in-progress gesture without a click.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Whether a drag or pinch is in progress.
    #[must_use]
    pub fn is_gesturing(&self) -> bool {
        match self.gesture {
            Gesture::Idle => false,
            Gesture::Pressed { dragging, .. } => dragging,
            Gesture::Pinching { .. } | Gesture::Suppressed => true,
        }
    }
}

fn pan_bound(container: f64, rendered: f64, margin: f64) -> f64 {
    ((container + rendered) / 2.0 - margin.min(rendered)).max(0.0)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rect() -> ContainerRect {
        ContainerRect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn desktop() -> ViewportController {
        ViewportController::new(ViewportConfig::desktop(200, 200))
    }

    #[test]
    fn starts_at_minimum_zoom() {
        let vp = desktop();
        assert!((vp.state().zoom - 0.75).abs() < EPS);
        assert_eq!(vp.zoom_percent(), 50);

        let mobile = ViewportController::for_container(&ContainerRect::new(0.0, 0.0, 400.0, 700.0), 200, 200);
        assert!((mobile.state().zoom - 1.05).abs() < EPS);
        assert_eq!(mobile.zoom_percent(), 70);
    }

    #[test]
    fn container_centre_hits_grid_centre() {
        let mut vp = desktop();
        vp.zoom_at(rect().center(), &rect(), 1.5);
        assert_eq!(
            vp.screen_to_cell(rect().center(), &rect()),
            Some(CellCoord { x: 100, y: 100 })
        );
        // Grid spans 2100 px at zoom 1.5; its left edge is far off screen.
        assert_eq!(vp.screen_to_cell(Point::new(-651.0, 300.0), &rect()), None);
        assert_eq!(
            vp.screen_to_cell(Point::new(-649.0, 300.0), &rect()),
            Some(CellCoord { x: 0, y: 100 })
        );
    }

    #[test]
    fn zoom_at_keeps_point_stationary() {
        let mut vp = desktop();
        let r = rect();
        let p = Point::new(500.0, 350.0);
        vp.zoom_at(r.center(), &r, 1.5);

        let before = vp.screen_to_grid(p, &r);
        let cell_before = vp.screen_to_cell(p, &r);
        vp.zoom_at(p, &r, 3.0);
        let after = vp.screen_to_grid(p, &r);

        assert!((before.0 - after.0).abs() < 1e-6);
        assert!((before.1 - after.1).abs() < 1e-6);
        assert_eq!(vp.screen_to_cell(p, &r), cell_before);
    }

    #[test]
    fn zoom_out_near_pan_bound_keeps_anchor_cell() {
        let mut vp = desktop();
        let r = rect();
        vp.zoom_at(r.center(), &r, 1.5);
        vp.pan_by(1e6, 0.0, &r);
        // 2100 px grid pushed right: only its leftmost 32 px remain visible.
        let p = Point::new(790.0, 300.0);
        let Some(cell) = vp.screen_to_cell(p, &r) else {
            panic!("point should be over the visible strip");
        };
        assert_eq!(cell, CellCoord { x: 2, y: 100 });

        vp.zoom_at(p, &r, 0.75);
        assert!((vp.state().zoom - 0.75).abs() < EPS);
        assert_eq!(vp.screen_to_cell(p, &r), Some(cell));

        // A plain pan still honours the edge margin.
        vp.pan_by(1e6, 0.0, &r);
        assert!((vp.state().pan_x - (925.0 - 32.0)).abs() < EPS);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = desktop();
        let r = rect();
        vp.zoom_at(r.center(), &r, 100.0);
        assert!((vp.state().zoom - 1.5 * 3.33).abs() < EPS);
        vp.zoom_at(r.center(), &r, 0.01);
        assert!((vp.state().zoom - 0.75).abs() < EPS);
    }

    #[test]
    fn buttons_and_wheel_step() {
        let mut vp = desktop();
        let r = rect();
        vp.zoom_in(&r);
        assert!((vp.state().zoom - 1.25).abs() < EPS);
        vp.wheel(r.center(), &r, -120.0);
        assert!((vp.state().zoom - 1.35).abs() < EPS);
        vp.wheel(r.center(), &r, 120.0);
        assert!((vp.state().zoom - 1.25).abs() < EPS);
        vp.wheel(r.center(), &r, 0.0);
        assert!((vp.state().zoom - 1.25).abs() < EPS);
        vp.zoom_out(&r);
        assert!((vp.state().zoom - 0.75).abs() < EPS);
    }

    #[test]
    fn pan_keeps_margin_visible() {
        let mut vp = desktop();
        let r = rect();
        vp.pan_by(1e6, -1e6, &r);
        let (rw, rh) = vp.rendered_size();
        let s = vp.state();
        assert!((s.pan_x - ((800.0 + rw) / 2.0 - 32.0)).abs() < EPS);
        assert!((s.pan_y + ((600.0 + rh) / 2.0 - 32.0)).abs() < EPS);

        // Bound grows with zoom.
        let small = s.pan_x;
        vp.zoom_at(r.center(), &r, 3.0);
        vp.pan_by(1e6, 0.0, &r);
        assert!(vp.state().pan_x > small);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut vp = desktop();
        let r = rect();
        vp.zoom_at(Point::new(10.0, 10.0), &r, 4.0);
        vp.reset();
        assert_eq!(
            vp.state(),
            ViewportState {
                zoom: 0.75,
                pan_x: 0.0,
                pan_y: 0.0
            }
        );
    }

    #[test]
    fn click_without_movement_selects_cell() {
        let mut vp = desktop();
        let r = rect();
        vp.pointer_down(r.center());
        vp.pointer_move(Point::new(402.0, 301.0), &r);
        assert_eq!(
            vp.pointer_up(Point::new(402.0, 301.0), &r),
            Some(CellCoord { x: 100, y: 100 })
        );
        assert_eq!(vp.state().pan_x, 0.0);
    }

    #[test]
    fn drag_pans_and_suppresses_click() {
        let mut vp = desktop();
        let r = rect();
        vp.pointer_down(Point::new(400.0, 300.0));
        vp.pointer_move(Point::new(420.0, 310.0), &r);
        assert!(vp.is_gesturing());
        assert_eq!(vp.pointer_up(Point::new(420.0, 310.0), &r), None);
        assert!((vp.state().pan_x - 20.0).abs() < EPS);
        assert!((vp.state().pan_y - 10.0).abs() < EPS);
    }

    #[test]
    fn pinch_zooms_and_suppresses_click_until_all_lifted() {
        let mut vp = desktop();
        let r = rect();
        let a = Point::new(350.0, 300.0);
        vp.touch_start(&[a]);
        vp.touch_start(&[a, Point::new(450.0, 300.0)]);
        vp.touch_move(&[Point::new(340.0, 300.0), Point::new(460.0, 300.0)], &r);
        assert!((vp.state().zoom - 0.85).abs() < EPS);
        vp.touch_move(&[Point::new(345.0, 300.0), Point::new(455.0, 300.0)], &r);
        assert!((vp.state().zoom - 0.75).abs() < EPS);

        assert_eq!(vp.touch_end(&[a], Point::new(455.0, 300.0), &r), None);
        assert_eq!(vp.touch_end(&[], a, &r), None);

        // A fresh tap works again.
        vp.touch_start(&[r.center()]);
        assert_eq!(
            vp.touch_end(&[], r.center(), &r),
            Some(CellCoord { x: 100, y: 100 })
        );
    }

    #[test]
    fn resize_switches_minimum_zoom() {
        let mut vp = desktop();
        vp.resize(&ContainerRect::new(0.0, 0.0, 500.0, 800.0));
        assert!((vp.state().zoom - 1.05).abs() < EPS);
        assert_eq!(vp.config().min_factor, 0.7);
    }
}
