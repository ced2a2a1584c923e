//! Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// Projection kind, chosen per view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    Orthographic,
    #[default]
    Perspective,
}

/// Camera object shared between the orbit controller and the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees (perspective only)
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Visible world height at zoom 1, `top - bottom` (orthographic only)
    pub frustum_height: f32,
    /// Orthographic magnification
    pub zoom: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: 45.0,
            aspect: aspect_ratio(width, height),
            near: 0.1,
            far: 2000.0,
            frustum_height: 10.0,
            zoom: 1.0,
            mode: ProjectionMode::Perspective,
        }
    }

    pub fn orthographic(width: u32, height: u32, frustum_height: f32) -> Self {
        Self {
            frustum_height,
            mode: ProjectionMode::Orthographic,
            ..Self::new(width, height)
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.frustum_height / 2.0 / self.zoom;
                let half_width = half_height * self.aspect;
                Matrix4::new_orthographic(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Right, up and backward axes of the camera's world matrix (its columns 0, 1, 2).
    ///
    /// `None` when the camera sits on its target or looks along `up`.
    pub fn local_axes(&self) -> Option<(Vector3<f32>, Vector3<f32>, Vector3<f32>)> {
        let back = (self.position - self.target).try_normalize(f32::EPSILON)?;
        let right = self.up.cross(&back).try_normalize(f32::EPSILON)?;
        let up = back.cross(&right);
        Some((right, up, back))
    }

    /// Project a 3D point to 2D screen space
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        let clip = mvp * Vector4::new(point.x, point.y, point.z, 1.0);

        // Behind the camera or degenerate
        if clip.w.abs() < 1e-6 || clip.w < 0.0 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;

        // Clip test
        if ndc.x < -1.0 || ndc.x > 1.0 || ndc.y < -1.0 || ndc.y > 1.0 || ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_height_viewport_keeps_finite_aspect() {
        assert_eq!(Camera::new(800, 0).aspect, 1.0);
    }

    #[test]
    fn test_local_axes_of_default_camera() {
        let (right, up, back) = Camera::default().local_axes().unwrap();
        assert_relative_eq!(right, Vector3::x());
        assert_relative_eq!(up, Vector3::y());
        assert_relative_eq!(back, Vector3::z());
    }

    #[test]
    fn test_local_axes_degenerate() {
        let mut camera = Camera::default();
        camera.position = camera.target;
        assert!(camera.local_axes().is_none());

        camera.position = Point3::new(0.0, 5.0, 0.0);
        assert!(camera.local_axes().is_none());
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        for camera in [Camera::new(800, 600), Camera::orthographic(800, 600, 10.0)] {
            let (x, y, _) = camera
                .project_to_screen(&Point3::origin(), &Matrix4::identity(), 800, 600)
                .unwrap();
            assert_relative_eq!(x, 400.0, epsilon = 1e-3);
            assert_relative_eq!(y, 300.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_point_behind_camera_is_clipped() {
        let camera = Camera::default();
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 800, 600)
            .is_none());
    }

    #[test]
    fn test_orthographic_zoom_shrinks_view() {
        let mut camera = Camera::orthographic(800, 600, 10.0);
        let edge = Point3::new(0.0, 4.0, 0.0);
        assert!(camera.project_to_screen(&edge, &Matrix4::identity(), 800, 600).is_some());

        camera.zoom = 2.0;
        assert!(camera.project_to_screen(&edge, &Matrix4::identity(), 800, 600).is_none());
    }
}
