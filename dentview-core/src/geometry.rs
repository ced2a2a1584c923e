//! Non-indexed triangle meshes and their bounds
use nalgebra::{Matrix4, Point3, Vector3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Largest extent along any axis
    pub fn max_dimension(&self) -> f32 {
        self.size().max()
    }

    /// Smallest box holding every point; `None` for no points
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;

        Some(points.fold(Aabb { min: first, max: first }, |bounds, p| Aabb {
            min: bounds.min.inf(&p),
            max: bounds.max.sup(&p),
        }))
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// World-space box around this box after `transform`
    pub fn transformed(&self, transform: &Matrix4<f32>) -> Aabb {
        let corners = self.corners().map(|c| transform.transform_point(&c));
        Aabb::from_points(corners).unwrap_or(*self)
    }

    /// Sphere through the corners
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere {
            center: self.center(),
            radius: self.size().norm() / 2.0,
        }
    }
}

/// Sphere enclosing every vertex, centered on the bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

/// One face as seen by a renderer
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [Point3<f32>; 3],
    pub normal: Vector3<f32>,
}

impl Triangle {
    /// Calculate the face normal from the triangle's winding, ignoring the stored one
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];

        edge1.cross(&edge2).try_normalize(f32::EPSILON).unwrap_or(self.normal)
    }
}

/// Triangle soup: three position triples and three copies of the face normal per triangle.
///
/// `positions.len() == normals.len()` and both are multiples of 9.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(triangles * 9),
            normals: Vec::with_capacity(triangles * 9),
        }
    }

    /// Append one triangle, replicating `normal` for each of its vertices
    pub fn push_triangle(&mut self, vertices: [[f32; 3]; 3], normal: [f32; 3]) {
        for vertex in vertices {
            self.positions.extend_from_slice(&vertex);
            self.normals.extend_from_slice(&normal);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 9
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.positions
            .chunks_exact(9)
            .zip(self.normals.chunks_exact(9))
            .map(|(p, n)| Triangle {
                vertices: [
                    Point3::new(p[0], p[1], p[2]),
                    Point3::new(p[3], p[4], p[5]),
                    Point3::new(p[6], p[7], p[8]),
                ],
                normal: Vector3::new(n[0], n[1], n[2]),
            })
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.chunks_exact(3).map(|p| Point3::new(p[0], p[1], p[2])))
    }

    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let center = self.bounding_box()?.center();
        let radius = self
            .positions
            .chunks_exact(3)
            .map(|p| (Point3::new(p[0], p[1], p[2]) - center).norm())
            .fold(0.0f32, f32::max);

        Some(BoundingSphere { center, radius })
    }

    /// Translate the mesh so its bounding box is centered on the origin.
    ///
    /// Returns the offset that was subtracted.
    pub fn center(&mut self) -> Vector3<f32> {
        let Some(bounds) = self.bounding_box() else {
            return Vector3::zeros();
        };
        let offset = bounds.center().coords;

        for p in self.positions.chunks_exact_mut(3) {
            p[0] -= offset.x;
            p[1] -= offset.y;
            p[2] -= offset.z;
        }

        offset
    }

    /// Create a simple cube mesh for testing
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        // Front, back, top, bottom, right, left
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            ([0.0, 0.0, -1.0], [[-h, -h, -h], [-h, h, -h], [h, h, -h], [h, -h, -h]]),
            ([0.0, 1.0, 0.0], [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]]),
            ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
            ([1.0, 0.0, 0.0], [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]]),
            ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ];

        for (normal, [a, b, c, d]) in faces {
            mesh.push_triangle([a, b, c], normal);
            mesh.push_triangle([a, c, d], normal);
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_counts() {
        let cube = TriangleMesh::cube(2.0);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_count(), 36);
        assert_eq!(cube.positions.len(), cube.normals.len());
    }

    #[test]
    fn test_cube_winding_matches_stored_normals() {
        for triangle in TriangleMesh::cube(2.0).triangles() {
            assert_relative_eq!(triangle.calculate_normal(), triangle.normal, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_center_moves_bounds_to_origin() {
        let mut mesh = TriangleMesh::new();
        mesh.push_triangle([[10.0, 0.0, 0.0], [12.0, 0.0, 0.0], [10.0, 4.0, 2.0]], [0.0, 0.0, 1.0]);

        let offset = mesh.center();
        assert_relative_eq!(offset, Vector3::new(11.0, 2.0, 1.0));

        let bounds = mesh.bounding_box().unwrap();
        assert_relative_eq!(bounds.center(), Point3::origin());
        assert_relative_eq!(bounds.max_dimension(), 4.0);
    }

    #[test]
    fn test_bounding_sphere_encloses_cube() {
        let sphere = TriangleMesh::cube(2.0).bounding_sphere().unwrap();
        assert_relative_eq!(sphere.radius, 3.0f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_aabb_union_and_transform() {
        let cube = TriangleMesh::cube(2.0).bounding_box().unwrap();
        let lifted = cube.transformed(&Matrix4::new_translation(&Vector3::new(0.0, 5.0, 0.0)));
        assert_relative_eq!(lifted.min, Point3::new(-1.0, 4.0, -1.0));
        assert_relative_eq!(lifted.max, Point3::new(1.0, 6.0, 1.0));

        let both = cube.union(&lifted);
        assert_relative_eq!(both.min, Point3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(both.max, Point3::new(1.0, 6.0, 1.0));
        assert_relative_eq!(both.bounding_sphere().center, Point3::new(0.0, 2.5, 0.0));
    }

    #[test]
    fn test_rotated_box_grows() {
        let cube = TriangleMesh::cube(2.0).bounding_box().unwrap();
        let turned = cube.transformed(&Matrix4::new_rotation(Vector3::new(0.0, std::f32::consts::FRAC_PI_4, 0.0)));
        assert_relative_eq!(turned.max.x, 2.0f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(turned.max.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        assert!(TriangleMesh::new().bounding_box().is_none());
        assert_eq!(TriangleMesh::new().center(), Vector3::zeros());
    }
}
