//! Frame driver tying the orbit controller to part animation.

use web_time::Instant;

use crate::animation::Animator;
use crate::controls::OrbitController;
use crate::geometry::{Aabb, BoundingSphere};
use crate::options::ViewerConfig;
use crate::projection::Camera;
use crate::transform::PartState;

/// Parts below this opacity are not drawn
pub const VISIBILITY_THRESHOLD: f32 = 0.05;

/// One viewer: a controller, its animator, and the current state of every part
pub struct Scene {
    controller: OrbitController,
    animator: Animator,
    parts: Vec<PartState>,
    disposed: bool,
}

impl Scene {
    pub fn new(controller: OrbitController, animator: Animator) -> Self {
        let parts = animator
            .evaluate_radians(controller.rotation())
            .parts
            .iter()
            .map(PartState::from)
            .collect();

        Self {
            controller,
            animator,
            parts,
            disposed: false,
        }
    }

    pub fn from_config(config: ViewerConfig, camera: Camera, viewport: (u32, u32)) -> Self {
        let controller = OrbitController::new(camera, config.controls, viewport);
        Self::new(controller, Animator::new(config.parts))
    }

    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut OrbitController {
        &mut self.controller
    }

    pub fn camera(&self) -> &Camera {
        self.controller.camera()
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn parts(&self) -> &[PartState] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&PartState> {
        let index = self.animator.parts().iter().position(|p| p.name == name)?;
        self.parts.get(index)
    }

    /// Frame the camera on every visible part at once.
    ///
    /// `bounds` pairs a part index with its mesh's local bounding box. Each
    /// box is posed at the part's start and peak, so the fit holds for the
    /// whole animation. Returns the sphere the camera was fitted to.
    pub fn fit_parts(&mut self, bounds: impl IntoIterator<Item = (usize, Aabb)>) -> Option<BoundingSphere> {
        let configs = self.animator.parts();
        let union = bounds
            .into_iter()
            .filter_map(|(slot, local)| {
                let config = configs.get(slot).filter(|c| c.visible)?;
                config
                    .extreme_poses()
                    .into_iter()
                    .map(|pose| local.transformed(&PartState::posed(&pose, 1.0).model_matrix()))
                    .reduce(|a, b| a.union(&b))
            })
            .reduce(|a, b| a.union(&b))?;

        let sphere = union.bounding_sphere();
        log::debug!("framing {union:?} as sphere of radius {}", sphere.radius);
        self.controller.fit_to_sphere(sphere.center, sphere.radius);
        Some(sphere)
    }

    /// Advance one frame: auto-rotate, apply input, then re-pose every part
    pub fn frame(&mut self, now: Instant) {
        if self.disposed {
            return;
        }

        if self.controller.options().auto_rotate {
            self.controller.apply_auto_rotate();
        }
        self.controller.update(now);

        let frame = self.animator.evaluate_radians(self.controller.rotation());
        for (state, sample) in self.parts.iter_mut().zip(&frame.parts) {
            state.apply(sample);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        log::debug!("disposing scene with {} parts", self.parts.len());
        self.controller.dispose();
        self.disposed = true;
    }
}
