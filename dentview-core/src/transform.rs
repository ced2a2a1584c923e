/// Per-part transform state and model matrices
use nalgebra::{Matrix4, Vector3};

use crate::animation::{PartSample, Pose};

/// Displayable state of one mesh part after animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartState {
    pub position: Vector3<f32>,
    /// XYZ Euler angles in radians
    pub rotation: Vector3<f32>,
    pub scale: f32,
    pub opacity: f32,
}

impl PartState {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: 1.0,
            opacity: 1.0,
        }
    }

    pub fn posed(pose: &Pose, opacity: f32) -> Self {
        Self {
            position: Vector3::from(pose.position),
            rotation: Vector3::from(pose.rotation),
            scale: pose.scale,
            opacity,
        }
    }

    /// Overwrite with an animation sample
    pub fn apply(&mut self, sample: &PartSample) {
        *self = Self::posed(&sample.pose, sample.opacity);
    }

    /// Translation, then rotation, then uniform scale
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(&self.position)
            * Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(self.scale)
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.opacity >= threshold
    }
}

impl Default for PartState {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<&PartSample> for PartState {
    fn from(sample: &PartSample) -> Self {
        let mut state = Self::identity();
        state.apply(sample);
        state
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation matrix for XYZ Euler angles
    pub fn rotation_matrix(rotation: &Vector3<f32>) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // X applied first
        rz * ry * rx
    }

    pub fn translation_matrix(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    pub fn scale_matrix(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }
}
