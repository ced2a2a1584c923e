/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use dentview_core::{Camera, PartState, Triangle, TriangleMesh};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// ASCII renderer that converts posed mesh parts to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Draw one part; luminance is scaled by its opacity
    pub fn render_part(&mut self, mesh: &TriangleMesh, state: &PartState, camera: &Camera) {
        let model = state.model_matrix();
        // Headlight: light comes from the camera
        let light_dir = (camera.position - camera.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        for triangle in mesh.triangles() {
            self.render_triangle(&triangle, &model, camera, &light_dir, state.opacity);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        light_dir: &Vector3<f32>,
        opacity: f32,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coords, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match camera.project_to_screen(vertex, model_matrix, self.width as u32, self.height as u32) {
                Some(projected) => *coords = projected,
                None => return, // Triangle is clipped
            }
        }

        let normal = model_matrix
            .transform_vector(&triangle.calculate_normal())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        let brightness = normal.dot(light_dir).max(0.0) * opacity.clamp(0.0, 1.0);

        let character = shade(brightness);
        if character == ' ' {
            return;
        }

        self.rasterize_triangle(&screen_coords, character);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py)) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    /// Number of cells something was drawn into
    pub fn coverage(&self) -> usize {
        self.char_buffer.iter().filter(|&&c| c != ' ').count()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map brightness in `[0, 1]` onto the ramp
fn shade(brightness: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (brightness * last as f32) as usize;
    LUMINOSITY_RAMP[index.min(last)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn camera() -> Camera {
        let mut camera = Camera::new(80, 40);
        camera.position = Point3::new(3.0, 3.0, 6.0);
        camera
    }

    #[test]
    fn test_shade_ramp_ends() {
        assert_eq!(shade(0.0), ' ');
        assert_eq!(shade(1.0), '@');
        assert_eq!(shade(7.0), '@');
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
    }

    #[test]
    fn test_cube_is_drawn() {
        let mut renderer = AsciiRenderer::new(80, 40);
        renderer.render_part(&TriangleMesh::cube(2.0), &PartState::identity(), &camera());
        assert!(renderer.coverage() > 0);

        renderer.clear();
        assert_eq!(renderer.coverage(), 0);
    }

    #[test]
    fn test_transparent_part_draws_nothing() {
        let mut renderer = AsciiRenderer::new(80, 40);
        let state = PartState {
            opacity: 0.0,
            ..PartState::identity()
        };
        renderer.render_part(&TriangleMesh::cube(2.0), &state, &camera());
        assert_eq!(renderer.coverage(), 0);
    }

    #[test]
    fn test_fitted_camera_shows_upper_and_lower_parts() {
        use dentview_core::{Scene, ViewerConfig};

        let mesh = TriangleMesh::cube(4.0);
        let local = mesh.bounding_box().unwrap();
        let mut scene = Scene::from_config(ViewerConfig::default(), Camera::new(240, 80), (240, 80));
        scene.fit_parts((0..3).map(|slot| (slot, local))).unwrap();

        let mut renderer = AsciiRenderer::new(240, 80);
        for config in &scene.animator().parts()[..2] {
            for pose in config.extreme_poses() {
                renderer.clear();
                renderer.render_part(&mesh, &PartState::posed(&pose, 1.0), scene.camera());
                assert!(renderer.coverage() > 0, "{} not drawn", config.name);
            }
        }
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let renderer = AsciiRenderer::new(4, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        assert!(!out.is_empty());
    }
}
