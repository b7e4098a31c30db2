use glam::{DQuat, DVec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Zoom factor applied per wheel notch away from the user.
pub const ZOOM_STEP: f64 = 0.8;
/// Radians (halved, see [`exp_pure`]) per pixel of drag.
pub const ROTATE_SENSITIVITY: f64 = 0.001;
/// Normalized units per pixel of drag at zoom 1.
pub const PAN_SENSITIVITY: f64 = 1.0;

/// Viewer pose. Mutated only by interaction events, read once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Multiplicative zoom, 1.0 at rest.
    pub zoom: f64,
    /// Unit quaternion applied after normalization.
    pub orientation: DQuat,
    /// Offset added to the toolpath center, in machine units.
    pub pan_offset: DVec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            orientation: DQuat::IDENTITY,
            pan_offset: DVec3::ZERO,
        }
    }
}

impl CameraState {
    pub fn multiply_zoom(&mut self, factor: f64) {
        self.zoom *= factor;
    }

    /// Left-composes `change` and renormalizes against drift.
    pub fn multiply_rotation(&mut self, change: DQuat) {
        self.orientation = (change * self.orientation).normalize();
    }

    pub fn add_pan(&mut self, delta: DVec3) {
        self.pan_offset += delta;
    }

    /// Wheel step. Positive `dy` scrolls away from the user and zooms out.
    pub fn wheel(&mut self, dy: f64) {
        if dy > 0.0 {
            self.multiply_zoom(ZOOM_STEP);
        } else {
            self.multiply_zoom(1.0 / ZOOM_STEP);
        }
    }

    /// Trackball-style rotation from one pointer motion delta (pixels).
    pub fn rotate(&mut self, mdx: f64, mdy: f64) {
        let change = exp_pure(DVec3::new(
            -mdy * ROTATE_SENSITIVITY,
            -mdx * ROTATE_SENSITIVITY,
            0.0,
        ));
        self.multiply_rotation(change);
    }

    /// Moves the view center by a screen-space delta (pixels).
    pub fn pan(&mut self, mdx: f64, mdy: f64) {
        let screen = DVec3::new(
            -mdx / self.zoom * PAN_SENSITIVITY,
            mdy / self.zoom * PAN_SENSITIVITY,
            0.0,
        );
        let model = self.orientation.inverse() * screen;
        // Normalization flips Z, so the model-space depth component flips too.
        self.add_pan(DVec3::new(model.x, model.y, -model.z));
    }

    /// Returns to the default pose by composing each field with its inverse.
    pub fn reset(&mut self) {
        self.multiply_rotation(self.orientation.inverse());
        self.multiply_zoom(1.0 / self.zoom);
        self.add_pan(-self.pan_offset);
    }
}

/// Exponential of the pure-imaginary quaternion `(0, v)`.
pub fn exp_pure(v: DVec3) -> DQuat {
    let theta = v.length();
    if theta == 0.0 {
        return DQuat::IDENTITY;
    }
    let (sin, cos) = theta.sin_cos();
    let axis = v * (sin / theta);
    DQuat::from_xyzw(axis.x, axis.y, axis.z, cos)
}

/// Browser-style pointer button bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons(pub u8);

impl Buttons {
    pub const NONE: Self = Self(0);
    pub const PRIMARY: Self = Self(1);
    pub const SECONDARY: Self = Self(2);
    pub const MIDDLE: Self = Self(4);

    /// Buttons that start a drag: primary rotates, middle pans.
    pub const DRAG: Self = Self(Self::PRIMARY.0 | Self::MIDDLE.0);

    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    fn from_winit(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Self::PRIMARY,
            MouseButton::Right => Self::SECONDARY,
            MouseButton::Middle => Self::MIDDLE,
            _ => Self::NONE,
        }
    }
}

/// Window-system-neutral pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { buttons: Buttons },
    Move { buttons: Buttons, dx: f64, dy: f64 },
    Wheel { dy: f64 },
}

/// Turns pointer input into camera updates.
///
/// A drag starts on a button-down carrying a drag button and ends on the
/// first move event whose bitmask holds neither. There is no "up" event.
#[derive(Debug, Default)]
pub struct CameraController {
    dragging: bool,
    held: Buttons,
    last_cursor: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn apply(&mut self, event: PointerEvent, camera: &mut CameraState) {
        match event {
            PointerEvent::Down { buttons } => {
                if buttons.intersects(Buttons::DRAG) {
                    self.dragging = true;
                }
            }
            PointerEvent::Move { buttons, dx, dy } => {
                if self.dragging && buttons.intersects(Buttons::PRIMARY) {
                    camera.rotate(dx, dy);
                } else if self.dragging && buttons.intersects(Buttons::MIDDLE) {
                    camera.pan(dx, dy);
                } else if self.dragging {
                    self.dragging = false;
                }
            }
            PointerEvent::Wheel { dy } => camera.wheel(dy),
        }
    }

    /// Translates winit window events into [`PointerEvent`]s.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut CameraState) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => self.press(*button, camera),
                ElementState::Released => self.release(*button),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x, position.y, camera)
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => self.scroll(*delta, camera),
            _ => {}
        }
    }

    /// Bookkeeping for events the overlay consumed: button releases and
    /// cursor motion still update the held mask and the last position, but
    /// never move the camera.
    pub fn track_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                button,
                state: ElementState::Released,
                ..
            } => self.release(*button),
            WindowEvent::CursorMoved { position, .. } => {
                self.last_cursor = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            _ => {}
        }
    }

    pub fn press(&mut self, button: MouseButton, camera: &mut CameraState) {
        self.held.insert(Buttons::from_winit(button));
        self.apply(PointerEvent::Down { buttons: self.held }, camera);
    }

    pub fn release(&mut self, button: MouseButton) {
        self.held.remove(Buttons::from_winit(button));
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64, camera: &mut CameraState) {
        if let Some((last_x, last_y)) = self.last_cursor {
            let event = PointerEvent::Move {
                buttons: self.held,
                dx: x - last_x,
                dy: y - last_y,
            };
            self.apply(event, camera);
        }
        self.last_cursor = Some((x, y));
    }

    pub fn scroll(&mut self, delta: MouseScrollDelta, camera: &mut CameraState) {
        // winit reports positive y for scrolling up; browsers the opposite.
        let dy = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y as f64,
            MouseScrollDelta::PixelDelta(pos) => -pos.y,
        };
        self.apply(PointerEvent::Wheel { dy }, camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quat_distance(a: DQuat, b: DQuat) -> f64 {
        // q and -q are the same rotation.
        (1.0 - a.dot(b).abs()).abs()
    }

    fn scrambled() -> CameraState {
        let mut camera = CameraState::default();
        for i in 0..40 {
            camera.rotate(13.0 - i as f64, 7.5 + 0.3 * i as f64);
            camera.wheel(if i % 3 == 0 { -1.0 } else { 1.0 });
            camera.pan(i as f64 * 0.7, -2.0);
        }
        camera
    }

    #[test]
    fn zoom_in_then_out_is_identity() {
        let mut camera = CameraState::default();
        for _ in 0..25 {
            camera.wheel(-1.0);
        }
        for _ in 0..25 {
            camera.wheel(1.0);
        }
        assert!((camera.zoom - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wheel_direction() {
        let mut camera = CameraState::default();
        camera.wheel(3.0);
        assert!((camera.zoom - ZOOM_STEP).abs() < 1e-12);

        camera.wheel(0.0);
        camera.wheel(-3.0);
        assert!((camera.zoom - 1.0 / ZOOM_STEP).abs() < 1e-12);
    }

    #[test]
    fn rotation_stays_unit_length() {
        let camera = scrambled();
        assert!((camera.orientation.length() - 1.0).abs() < 1e-12);
        assert!(quat_distance(camera.orientation, DQuat::IDENTITY) > 1e-6);
    }

    #[test]
    fn reset_restores_default_pose() {
        let mut camera = scrambled();
        assert_ne!(camera.pan_offset, DVec3::ZERO);

        camera.reset();

        assert!((camera.zoom - 1.0).abs() < 1e-12);
        assert!(quat_distance(camera.orientation, DQuat::IDENTITY) < 1e-9);
        assert_eq!(camera.pan_offset, DVec3::ZERO);
    }

    #[test]
    fn exp_pure_matches_axis_angle() {
        let v = DVec3::new(0.0, 0.3, 0.0);
        let q = exp_pure(v);
        let expected = DQuat::from_axis_angle(DVec3::Y, 0.6);

        assert!(quat_distance(q, expected) < 1e-12);
        assert_eq!(exp_pure(DVec3::ZERO), DQuat::IDENTITY);
    }

    #[test]
    fn pan_is_scaled_by_zoom_and_follows_orientation() {
        let mut camera = CameraState::default();
        camera.multiply_zoom(2.0);
        camera.pan(10.0, 4.0);
        assert!(camera.pan_offset.abs_diff_eq(DVec3::new(-5.0, 2.0, 0.0), 1e-12));

        // Quarter turn about Y: screen X maps onto the model depth axis.
        let mut turned = CameraState {
            orientation: DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2),
            ..CameraState::default()
        };
        turned.pan(-1.0, 0.0);
        assert!(turned.pan_offset.abs_diff_eq(DVec3::new(0.0, 0.0, -1.0), 1e-12));
    }

    #[test]
    fn primary_drag_rotates_until_buttons_clear() {
        let mut controller = CameraController::new();
        let mut camera = CameraState::default();

        controller.apply(PointerEvent::Down { buttons: Buttons::PRIMARY }, &mut camera);
        assert!(controller.is_dragging());

        controller.apply(
            PointerEvent::Move { buttons: Buttons::PRIMARY, dx: 20.0, dy: 0.0 },
            &mut camera,
        );
        let rotated = camera.orientation;
        assert!(quat_distance(rotated, DQuat::IDENTITY) > 1e-6);

        // A move without buttons is what ends the drag.
        controller.apply(
            PointerEvent::Move { buttons: Buttons::NONE, dx: 20.0, dy: 0.0 },
            &mut camera,
        );
        assert!(!controller.is_dragging());
        assert_eq!(camera.orientation, rotated);

        // Later moves with the button held do nothing until the next down.
        controller.apply(
            PointerEvent::Move { buttons: Buttons::PRIMARY, dx: 20.0, dy: 0.0 },
            &mut camera,
        );
        assert_eq!(camera.orientation, rotated);
    }

    #[test]
    fn middle_drag_pans_and_secondary_is_ignored() {
        let mut controller = CameraController::new();
        let mut camera = CameraState::default();

        controller.apply(PointerEvent::Down { buttons: Buttons::SECONDARY }, &mut camera);
        assert!(!controller.is_dragging());

        controller.apply(PointerEvent::Down { buttons: Buttons::MIDDLE }, &mut camera);
        controller.apply(
            PointerEvent::Move { buttons: Buttons::MIDDLE, dx: 3.0, dy: 0.0 },
            &mut camera,
        );
        assert!(camera.pan_offset.abs_diff_eq(DVec3::new(-3.0, 0.0, 0.0), 1e-12));
        assert_eq!(camera.orientation, DQuat::IDENTITY);
    }

    #[test]
    fn wheel_event_zooms() {
        let mut controller = CameraController::new();
        let mut camera = CameraState::default();

        controller.apply(PointerEvent::Wheel { dy: 1.0 }, &mut camera);
        assert!((camera.zoom - ZOOM_STEP).abs() < 1e-12);
    }

    #[test]
    fn button_mask_bookkeeping() {
        let mut held = Buttons::NONE;
        held.insert(Buttons::PRIMARY);
        held.insert(Buttons::MIDDLE);
        assert!(held.intersects(Buttons::DRAG));
        assert_eq!(held, Buttons(5));

        held.remove(Buttons::PRIMARY);
        assert_eq!(held, Buttons::MIDDLE);
        held.remove(Buttons::MIDDLE);
        assert!(!held.intersects(Buttons::DRAG));
    }

    #[test]
    fn release_over_overlay_still_ends_drag() {
        let mut controller = CameraController::new();
        let mut camera = CameraState::default();

        controller.cursor_moved(100.0, 100.0, &mut camera);
        controller.press(MouseButton::Left, &mut camera);
        controller.cursor_moved(110.0, 100.0, &mut camera);
        let rotated = camera.orientation;
        assert!(quat_distance(rotated, DQuat::IDENTITY) > 1e-6);

        // The release lands on an overlay widget and reaches the controller
        // only through the tracking path.
        controller.release(MouseButton::Left);

        for x in [120.0, 130.0, 140.0] {
            controller.cursor_moved(x, 100.0, &mut camera);
        }

        assert!(!controller.is_dragging());
        assert_eq!(controller.held, Buttons::NONE);
        assert_eq!(camera.orientation, rotated);
    }

    #[test]
    fn overlay_tracking_never_moves_camera() {
        let mut controller = CameraController::new();
        let mut camera = CameraState::default();
        controller.press(MouseButton::Left, &mut camera);

        controller.track_event(&WindowEvent::CursorMoved {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            position: winit::dpi::PhysicalPosition::new(50.0, 50.0),
        });
        controller.track_event(&WindowEvent::MouseInput {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            state: ElementState::Released,
            button: MouseButton::Left,
        });

        assert_eq!(camera, CameraState::default());
        assert_eq!(controller.held, Buttons::NONE);
        assert_eq!(controller.last_cursor, Some((50.0, 50.0)));

        // The next plain move is a buttonless move and ends the drag.
        controller.cursor_moved(60.0, 50.0, &mut camera);
        assert!(!controller.is_dragging());
        assert_eq!(camera, CameraState::default());
    }

    #[test]
    fn horizontal_only_scroll_zooms_in() {
        let mut controller = CameraController::new();
        let mut camera = CameraState::default();

        controller.scroll(MouseScrollDelta::LineDelta(1.0, 0.0), &mut camera);
        assert!((camera.zoom - 1.0 / ZOOM_STEP).abs() < 1e-12);

        // Scrolling up in winit terms is a negative browser delta: zoom in.
        controller.scroll(MouseScrollDelta::LineDelta(0.0, 1.0), &mut camera);
        assert!((camera.zoom - 1.0 / (ZOOM_STEP * ZOOM_STEP)).abs() < 1e-12);

        controller.scroll(MouseScrollDelta::LineDelta(0.0, -1.0), &mut camera);
        assert!((camera.zoom - 1.0 / ZOOM_STEP).abs() < 1e-12);
    }
}
