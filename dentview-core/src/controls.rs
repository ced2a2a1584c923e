//! Orbit camera controller.
//!
//! Pointer and wheel input accumulate into a pending spherical delta which
//! `update` applies once per frame. Horizontal drags and auto-rotate also
//! feed an unwrapped rotation signal that drives part animation.
//!
//! The controller never fails: degenerate geometry (camera on its target,
//! zero-height viewport, zero up vector) skips the frame instead of writing
//! non-finite values into the camera.

use std::f32::consts::PI;
use std::time::Duration;

use nalgebra::{Point2, Point3, UnitQuaternion, Vector3};
use web_time::Instant;

use crate::options::ControlOptions;
use crate::projection::{Camera, ProjectionMode};

const EPS: f32 = 1e-6;

/// Which pointer button went down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
}

/// Drag currently in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    None,
    Rotate,
    Pan,
}

/// Input state between frames
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionSession {
    pub gesture: Gesture,
    pub is_user_interacting: bool,
    pub last_interaction_at: Option<Instant>,
    pointer: Point2<f32>,
}

/// Radius, azimuth `theta` around +Y measured from +Z, polar `phi` from +Y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_vector(v: &Vector3<f32>) -> Self {
        let radius = v.norm();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }

        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_vector(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Input accumulated since the last update
#[derive(Debug, Clone, Copy, PartialEq)]
struct SphericalDelta {
    theta: f32,
    /// Radius multiplier
    scale: f32,
}

impl Default for SphericalDelta {
    fn default() -> Self {
        Self { theta: 0.0, scale: 1.0 }
    }
}

type RotationObserver = Box<dyn FnMut(f32)>;

/// Spherical orbit rig around a movable target
pub struct OrbitController {
    camera: Camera,
    options: ControlOptions,
    delta: SphericalDelta,
    session: InteractionSession,
    viewport: (f32, f32),
    rotation: f32,
    observers: Vec<RotationObserver>,
    attached: bool,
}

impl OrbitController {
    pub fn new(camera: Camera, options: ControlOptions, viewport: (u32, u32)) -> Self {
        let mut controller = Self {
            camera,
            options,
            delta: SphericalDelta::default(),
            session: InteractionSession::default(),
            viewport: (0.0, 0.0),
            rotation: 0.0,
            observers: Vec::new(),
            attached: true,
        };
        controller.camera.mode = controller.options.projection;
        controller.set_viewport(viewport.0, viewport.1);
        controller.apply_pending();
        controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub fn is_user_interacting(&self) -> bool {
        self.session.is_user_interacting
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Cumulative rotation in radians, not wrapped
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Called with the new cumulative rotation on every change, user-driven or automatic
    pub fn on_rotation_change(&mut self, observer: impl FnMut(f32) + 'static) {
        if self.attached {
            self.observers.push(Box::new(observer));
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width as f32, height as f32);
        self.camera.resize(width, height);
    }

    pub fn on_pointer_down(&mut self, button: PointerButton, x: f32, y: f32, now: Instant) {
        if !self.attached {
            return;
        }

        self.session.is_user_interacting = true;
        self.session.last_interaction_at = Some(now);
        self.session.pointer = Point2::new(x, y);
        self.session.gesture = match button {
            PointerButton::Primary => Gesture::Rotate,
            PointerButton::Auxiliary => Gesture::Pan,
            PointerButton::Secondary => Gesture::None,
        };
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if !self.attached {
            return;
        }

        let position = Point2::new(x, y);
        let delta = position - self.session.pointer;

        match self.session.gesture {
            Gesture::Rotate if self.options.enable_rotate => self.rotate_left(delta.x),
            Gesture::Pan if self.options.enable_pan => self.pan(delta.x, delta.y),
            Gesture::Rotate | Gesture::Pan => return,
            Gesture::None => {}
        }

        self.session.pointer = position;
    }

    /// End the gesture; the interaction flag clears once the quiescence window passes
    pub fn on_pointer_up(&mut self, now: Instant) {
        if !self.attached {
            return;
        }

        self.session.gesture = Gesture::None;
        self.session.last_interaction_at = Some(now);
    }

    /// One wheel notch; negative `delta_y` (scrolling up) zooms in
    pub fn on_wheel(&mut self, delta_y: f32, now: Instant) {
        if !self.attached || !self.options.enable_zoom {
            return;
        }

        self.session.is_user_interacting = true;
        self.session.last_interaction_at = Some(now);

        let scale = self.zoom_scale();
        if delta_y < 0.0 {
            self.dolly(scale);
        } else if delta_y > 0.0 {
            self.dolly(1.0 / scale);
        }
    }

    /// Queue the constant auto-rotate step unless the user is interacting
    pub fn apply_auto_rotate(&mut self) {
        if !self.attached || self.session.is_user_interacting {
            return;
        }

        let step = self.options.auto_rotate_speed;
        self.delta.theta -= step;
        self.rotation -= step;
        self.notify();
    }

    /// Settle the interaction flag and apply pending input to the camera.
    ///
    /// Returns `false` when the frame was skipped.
    pub fn update(&mut self, now: Instant) -> bool {
        if !self.attached {
            return false;
        }

        self.settle_interaction(now);
        self.apply_pending()
    }

    pub fn set_target(&mut self, x: f32, y: f32, z: f32) {
        self.camera.target = Point3::new(x, y, z);
        self.apply_pending();
    }

    /// Frame a bounding sphere: look at its center from a raised diagonal and
    /// bound the orbit distance relative to its radius
    pub fn fit_to_sphere(&mut self, center: Point3<f32>, radius: f32) {
        if !radius.is_finite() || radius <= EPS {
            log::debug!("not fitting camera to degenerate sphere of radius {radius}");
            return;
        }

        let distance = radius * 2.5;
        self.camera.target = center;
        self.camera.position = center + Vector3::new(0.7, 0.5, 0.7) * distance;
        self.options.min_distance = radius * 1.2;
        self.options.max_distance = radius * 10.0;

        if self.camera.mode == ProjectionMode::Orthographic {
            self.camera.zoom = self.clamp_zoom(self.camera.frustum_height / (2.0 * radius) * 0.8);
        }

        self.apply_pending();
    }

    /// Detach from input: observers are dropped and every later call is ignored
    pub fn dispose(&mut self) {
        self.attached = false;
        self.observers.clear();
        self.session = InteractionSession::default();
        self.delta = SphericalDelta::default();
    }

    fn settle_interaction(&mut self, now: Instant) {
        if !self.session.is_user_interacting || self.session.gesture != Gesture::None {
            return;
        }

        let quiet_for = self
            .session
            .last_interaction_at
            .map_or(Duration::MAX, |at| now.saturating_duration_since(at));
        if quiet_for >= self.options.quiescence() {
            self.session.is_user_interacting = false;
        }
    }

    fn rotate_left(&mut self, dx: f32) {
        let height = self.viewport.1;
        if height <= EPS {
            return;
        }

        let angle = 2.0 * PI * dx * self.options.rotate_speed / height;
        if !angle.is_finite() {
            return;
        }

        self.delta.theta -= angle;
        self.rotation += angle;
        self.notify();
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        let height = self.viewport.1;
        let Some((right, up, _)) = self.camera.local_axes() else {
            return;
        };
        if height <= EPS {
            return;
        }

        let world_per_pixel = match self.camera.mode {
            ProjectionMode::Perspective => {
                let distance = (self.camera.position - self.camera.target).norm();
                distance * (self.camera.fov.to_radians() / 2.0).tan() / height
            }
            ProjectionMode::Orthographic => self.camera.frustum_height / self.camera.zoom / height,
        };
        let scale = world_per_pixel * self.options.pan_speed;

        let offset = right * (-2.0 * dx * scale) + up * (2.0 * dy * scale);
        if !offset.iter().all(|c| c.is_finite()) {
            return;
        }

        self.camera.position += offset;
        self.camera.target += offset;
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.options.zoom_speed)
    }

    /// `factor < 1` moves closer
    fn dolly(&mut self, factor: f32) {
        match self.camera.mode {
            ProjectionMode::Perspective => self.delta.scale *= factor,
            ProjectionMode::Orthographic => self.camera.zoom = self.clamp_zoom(self.camera.zoom / factor),
        }
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.min(self.options.max_zoom).max(self.options.min_zoom)
    }

    fn notify(&mut self) {
        let rotation = self.rotation;
        for observer in &mut self.observers {
            observer(rotation);
        }
    }

    fn apply_pending(&mut self) -> bool {
        let delta = std::mem::take(&mut self.delta);

        let offset = self.camera.position - self.camera.target;
        let Some(up) = self.camera.up.try_normalize(EPS) else {
            log::debug!("skipping camera update: zero up vector");
            return false;
        };
        if offset.norm() <= EPS {
            log::debug!("skipping camera update: camera sits on its target");
            return false;
        }

        // Work in a frame where the camera's up is +Y
        let to_y_up = UnitQuaternion::rotation_between(&up, &Vector3::y())
            .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI));

        let mut spherical = Spherical::from_vector(&(to_y_up * offset));
        spherical.theta += delta.theta;
        spherical.phi = match self.options.polar_angle {
            Some(phi) => phi,
            None => spherical.phi.clamp(EPS, PI - EPS),
        };
        spherical.radius = (spherical.radius * delta.scale)
            .min(self.options.max_distance)
            .max(self.options.min_distance);

        if self.camera.mode == ProjectionMode::Orthographic {
            self.camera.zoom = self.clamp_zoom(self.camera.zoom);
        }

        let offset = to_y_up.inverse() * spherical.to_vector();
        if !offset.iter().all(|c| c.is_finite()) || offset.norm() <= EPS {
            log::debug!("skipping camera update: degenerate spherical offset {spherical:?}");
            return false;
        }

        self.camera.position = self.camera.target + offset;
        true
    }
}
