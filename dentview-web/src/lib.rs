/// dentview web - WASM bindings exposing the core viewer to a browser host
///
/// The page owns the canvas and the GPU pipeline. This crate decodes meshes,
/// runs the orbit controller and the part animation, and hands back plain
/// arrays the page uploads to its renderer.
use dentview_core::{stl, Aabb, Camera, PointerButton, Scene, TriangleMesh, ViewerConfig};
use nalgebra::Point3;
use wasm_bindgen::prelude::*;
use web_time::Instant;

/// Number of floats per part in [`WebViewer::part_states`]
pub const PART_STRIDE: usize = 8;

/// Decoded triangle soup, ready for `Float32Array` upload
#[wasm_bindgen]
pub struct StlBuffers {
    positions: Vec<f32>,
    normals: Vec<f32>,
}

#[wasm_bindgen]
impl StlBuffers {
    pub fn positions(&self) -> Vec<f32> {
        self.positions.clone()
    }

    pub fn normals(&self) -> Vec<f32> {
        self.normals.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 9
    }
}

/// Decode an STL file, centered on the origin
#[wasm_bindgen]
pub fn decode_stl(bytes: &[u8]) -> Result<StlBuffers, JsValue> {
    decode_centered(bytes).map(StlBuffers::from)
}

fn decode_centered(bytes: &[u8]) -> Result<TriangleMesh, JsValue> {
    let mut mesh = stl::decode(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
    mesh.center();
    Ok(mesh)
}

impl From<TriangleMesh> for StlBuffers {
    fn from(mesh: TriangleMesh) -> Self {
        Self {
            positions: mesh.positions,
            normals: mesh.normals,
        }
    }
}

/// One viewer bound to a canvas of the given size
#[wasm_bindgen]
pub struct WebViewer {
    scene: Scene,
    /// Local bounds of each part's mesh, by part index
    bounds: Vec<Option<Aabb>>,
}

#[wasm_bindgen]
impl WebViewer {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> WebViewer {
        Self::with_config(ViewerConfig::default(), width, height)
    }

    /// Build from a TOML configuration string
    pub fn from_toml(config: &str, width: u32, height: u32) -> Result<WebViewer, JsValue> {
        let config = ViewerConfig::from_toml_str(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self::with_config(config, width, height))
    }

    /// Decode the mesh for part `slot`; call `fit_camera` once every part is loaded
    pub fn load_part(&mut self, slot: usize, bytes: &[u8]) -> Result<StlBuffers, JsValue> {
        let Some(bounds) = self.bounds.get_mut(slot) else {
            return Err(JsValue::from_str(&format!("no part {slot}")));
        };

        let mesh = decode_centered(bytes)?;
        *bounds = mesh.bounding_box();
        Ok(mesh.into())
    }

    /// Frame the camera on every loaded part; false when nothing visible is loaded
    pub fn fit_camera(&mut self) -> bool {
        let bounds = self
            .bounds
            .iter()
            .enumerate()
            .filter_map(|(slot, b)| Some((slot, (*b)?)));
        self.scene.fit_parts(bounds).is_some()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.controller_mut().set_viewport(width, height);
    }

    /// `button` follows `PointerEvent.button`: 0 primary, 1 auxiliary, 2 secondary
    pub fn pointer_down(&mut self, button: i16, x: f32, y: f32) {
        let button = match button {
            0 => PointerButton::Primary,
            1 => PointerButton::Auxiliary,
            _ => PointerButton::Secondary,
        };
        self.scene.controller_mut().on_pointer_down(button, x, y, Instant::now());
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.scene.controller_mut().on_pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.scene.controller_mut().on_pointer_up(Instant::now());
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.scene.controller_mut().on_wheel(delta_y, Instant::now());
    }

    /// Advance one animation frame; call from `requestAnimationFrame`
    pub fn frame(&mut self) {
        self.scene.frame(Instant::now());
    }

    /// Cumulative rotation in radians
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> f32 {
        self.scene.controller().rotation()
    }

    pub fn camera_position(&self) -> Vec<f32> {
        point_to_vec(&self.scene.camera().position)
    }

    pub fn camera_target(&self) -> Vec<f32> {
        point_to_vec(&self.scene.camera().target)
    }

    /// Orthographic zoom, or 1 for perspective cameras
    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f32 {
        self.scene.camera().zoom
    }

    /// Per part: position xyz, rotation xyz (Euler, radians), scale, opacity
    pub fn part_states(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.scene.parts().len() * PART_STRIDE);
        for part in self.scene.parts() {
            out.extend(part.position.iter());
            out.extend(part.rotation.iter());
            out.push(part.scale);
            out.push(part.opacity);
        }
        out
    }

    pub fn dispose(&mut self) {
        self.scene.dispose();
    }
}

impl WebViewer {
    fn with_config(config: ViewerConfig, width: u32, height: u32) -> WebViewer {
        let camera = Camera::new(width, height);
        let slots = config.parts.len();
        WebViewer {
            scene: Scene::from_config(config, camera, (width, height)),
            bounds: vec![None; slots],
        }
    }
}

fn point_to_vec(p: &Point3<f32>) -> Vec<f32> {
    vec![p.x, p.y, p.z]
}
