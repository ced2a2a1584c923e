//! Silhouette tracing over alpha rasters, for extrudable outlines.
//!
//! A raster is walked with Moore-neighbour tracing to get a closed pixel
//! contour, which is then thinned by dropping near-collinear points.
use nalgebra::Point2;

use crate::error::RasterError;

/// Alpha values at or below this count as transparent
pub const DEFAULT_THRESHOLD: u8 = 10;

/// Doubled-area tolerance used when simplifying placed outlines
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Width of placed outlines, in world units
pub const DEFAULT_OUTLINE_WIDTH: f32 = 3.0;

/// Hard bound on walk length; tracing noisy rasters may otherwise cycle
pub const MAX_STEPS: usize = 20_000;

/// Neighbour offsets, clockwise on screen starting East
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Single-channel alpha mask, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaRaster {
    width: usize,
    height: usize,
    alpha: Vec<u8>,
}

impl AlphaRaster {
    pub fn new(width: usize, height: usize, alpha: Vec<u8>) -> Result<Self, RasterError> {
        let expected = width * height;
        if alpha.len() != expected {
            return Err(RasterError::SizeMismatch {
                expected,
                actual: alpha.len(),
            });
        }

        Ok(Self { width, height, alpha })
    }

    /// Extract the alpha channel from packed RGBA pixels
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<Self, RasterError> {
        let expected = width * height * 4;
        if rgba.len() != expected {
            return Err(RasterError::SizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }

        Self::new(width, height, rgba.chunks_exact(4).map(|px| px[3]).collect())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    /// Out-of-bounds pixels are transparent
    pub fn is_opaque(&self, x: i64, y: i64, threshold: u8) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.alpha[y as usize * self.width + x as usize] > threshold
    }

    /// Opaque with at least one non-opaque 8-neighbour
    fn is_boundary(&self, x: i64, y: i64, threshold: u8) -> bool {
        self.is_opaque(x, y, threshold)
            && DIRECTIONS
                .iter()
                .any(|(dx, dy)| !self.is_opaque(x + dx, y + dy, threshold))
    }
}

/// Closed pixel contour, in walk order. Empty when nothing was traced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContourPath {
    pub points: Vec<Point2<i64>>,
}

impl ContourPath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Outline with near-collinear points removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimplifiedPolygon<T> {
    pub points: Vec<T>,
}

impl<T> SimplifiedPolygon<T> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enough points to form a face; otherwise callers show a flat plane instead
    pub fn is_extrudable(&self) -> bool {
        self.points.len() >= 3
    }
}

/// Trace the outer boundary of the first opaque region found in row-major order
pub fn trace(raster: &AlphaRaster, threshold: u8) -> ContourPath {
    let Some(start) = find_start(raster, threshold) else {
        log::debug!(
            "no boundary pixel in {}x{} raster at threshold {threshold}",
            raster.width,
            raster.height
        );
        return ContourPath::default();
    };

    let mut points = Vec::new();
    let mut current = start;
    let mut prev_dir = 0;
    let mut steps = 0;

    loop {
        steps += 1;
        if steps > MAX_STEPS {
            log::warn!("contour walk hit the {MAX_STEPS} step cap at {current:?}");
            break;
        }

        points.push(current);

        let search_from = (prev_dir + 6) % 8;
        let next = (0..8).map(|i| (search_from + i) % 8).find_map(|dir| {
            let (dx, dy) = DIRECTIONS[dir];
            let candidate = Point2::new(current.x + dx, current.y + dy);
            raster
                .is_boundary(candidate.x, candidate.y, threshold)
                .then_some((dir, candidate))
        });

        // Revisits are allowed; only the start pixel or a dead end stops the walk
        let Some((dir, candidate)) = next else {
            break;
        };
        current = candidate;
        prev_dir = dir;

        if current == start {
            break;
        }
    }

    log::trace!("traced {} boundary points", points.len());
    ContourPath { points }
}

fn find_start(raster: &AlphaRaster, threshold: u8) -> Option<Point2<i64>> {
    (0..raster.height as i64)
        .flat_map(|y| (0..raster.width as i64).map(move |x| Point2::new(x, y)))
        .find(|p| raster.is_boundary(p.x, p.y, threshold))
}

/// A 2D point usable in the collinearity test
pub trait PlanarPoint: Copy {
    fn xy(&self) -> (f64, f64);
}

impl PlanarPoint for Point2<i64> {
    fn xy(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

impl PlanarPoint for Point2<f32> {
    fn xy(&self) -> (f64, f64) {
        (f64::from(self.x), f64::from(self.y))
    }
}

/// Drop every point whose doubled triangle area with its cyclic neighbours
/// does not exceed `tolerance`. Each point is judged against the original path.
pub fn simplify<P: PlanarPoint>(path: &[P], tolerance: f64) -> SimplifiedPolygon<P> {
    let n = path.len();
    let points = (0..n)
        .filter(|&i| doubled_area(path[(i + n - 1) % n], path[i], path[(i + 1) % n]) > tolerance)
        .map(|i| path[i])
        .collect();

    SimplifiedPolygon { points }
}

/// `|(b - a) x (c - a)|`
fn doubled_area<P: PlanarPoint>(a: P, b: P, c: P) -> f64 {
    let (ax, ay) = a.xy();
    let (bx, by) = b.xy();
    let (cx, cy) = c.xy();
    ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)).abs()
}

/// Map pixel coordinates into a plane centered on the raster, `target_width`
/// units wide, with y pointing up
pub fn place_outline(path: &ContourPath, width: usize, height: usize, target_width: f32) -> Vec<Point2<f32>> {
    if width == 0 {
        return Vec::new();
    }

    let scale = target_width / width as f32;
    let (half_w, half_h) = (width as f32 / 2.0, height as f32 / 2.0);

    path.points
        .iter()
        .map(|p| Point2::new((p.x as f32 - half_w) * scale, (half_h - p.y as f32) * scale))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raster_from_rows(rows: &[&str]) -> AlphaRaster {
        let width = rows[0].len();
        let alpha = rows
            .iter()
            .flat_map(|row| row.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        AlphaRaster::new(width, rows.len(), alpha).unwrap()
    }

    #[test]
    fn test_opaque_square_yields_closed_contour() {
        let raster = AlphaRaster::new(10, 10, vec![255; 100]).unwrap();
        let path = trace(&raster, DEFAULT_THRESHOLD);

        assert!(!path.is_empty());
        assert_eq!(path.points[0], Point2::new(0, 0));
        // Every traced point sits on the raster border
        for p in &path.points {
            assert!(p.x == 0 || p.y == 0 || p.x == 9 || p.y == 9, "{p:?} is interior");
        }
        // Walk stopped by returning to the start
        let last = path.points[path.len() - 1];
        assert!(last.x <= 1 && last.y <= 1);
        assert!(path.len() < MAX_STEPS);
    }

    #[test]
    fn test_transparent_raster_yields_empty_path() {
        let raster = AlphaRaster::new(10, 10, vec![0; 100]).unwrap();
        assert!(trace(&raster, DEFAULT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let raster = AlphaRaster::new(4, 4, vec![10; 16]).unwrap();
        assert!(trace(&raster, 10).is_empty());
        assert!(!trace(&raster, 9).is_empty());
    }

    #[test]
    fn test_single_pixel_has_no_successor() {
        let raster = raster_from_rows(&["...", ".#.", "..."]);
        let path = trace(&raster, DEFAULT_THRESHOLD);
        assert_eq!(path.points, vec![Point2::new(1, 1)]);
    }

    #[test]
    fn test_start_is_first_boundary_pixel_in_row_major_order() {
        let raster = raster_from_rows(&[
            "......",
            "...##.",
            "..###.",
            "..###.",
            "......",
        ]);
        let path = trace(&raster, DEFAULT_THRESHOLD);
        assert_eq!(path.points[0], Point2::new(3, 1));
        assert!(path.points.iter().all(|p| raster.is_opaque(p.x, p.y, DEFAULT_THRESHOLD)));
    }

    #[test]
    fn test_thin_line_walks_back_over_itself() {
        let raster = raster_from_rows(&["#####"]);
        let path = trace(&raster, DEFAULT_THRESHOLD);
        let xs: Vec<i64> = path.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3, 4, 3, 2, 1]);
    }

    #[test]
    fn test_from_rgba_extracts_alpha() {
        let rgba = [1, 2, 3, 40, 5, 6, 7, 80];
        let raster = AlphaRaster::from_rgba(2, 1, &rgba).unwrap();
        assert_eq!(raster.alpha(), &[40, 80]);
        assert_eq!(
            AlphaRaster::from_rgba(2, 2, &rgba),
            Err(RasterError::SizeMismatch { expected: 16, actual: 8 })
        );
    }

    #[test]
    fn test_simplify_removes_collinear_points() {
        let square: Vec<Point2<i64>> = [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2), (0, 1)]
            .iter()
            .map(|&(x, y)| Point2::new(x, y))
            .collect();

        let simplified = simplify(&square, 0.5);
        assert_eq!(
            simplified.points,
            vec![Point2::new(0, 0), Point2::new(2, 0), Point2::new(2, 2), Point2::new(0, 2)]
        );
        assert!(simplified.is_extrudable());
    }

    #[test]
    fn test_simplify_drops_area_equal_to_tolerance() {
        let triangle = [Point2::new(0, 0), Point2::new(1, 0), Point2::new(0, 1)];
        // Doubled area is exactly 1 at every corner
        assert_eq!(simplify(&triangle, 1.0).len(), 0);
        assert_eq!(simplify(&triangle, 0.999).len(), 3);
    }

    #[test]
    fn test_simplify_never_grows() {
        let raster = AlphaRaster::new(10, 10, vec![255; 100]).unwrap();
        let path = trace(&raster, DEFAULT_THRESHOLD);
        let placed = place_outline(&path, 10, 10, DEFAULT_OUTLINE_WIDTH);
        for tolerance in [0.0, 1e-3, 0.1, 10.0] {
            assert!(simplify(&placed, tolerance).len() <= placed.len());
        }
    }

    #[test]
    fn test_place_outline_centers_and_flips() {
        let path = ContourPath {
            points: vec![Point2::new(0, 0), Point2::new(10, 5)],
        };
        let placed = place_outline(&path, 10, 10, DEFAULT_OUTLINE_WIDTH);
        assert_relative_eq!(placed[0], Point2::new(-1.5, 1.5), epsilon = 1e-6);
        assert_relative_eq!(placed[1], Point2::new(1.5, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_tiny_outline_is_not_extrudable() {
        let path = [Point2::new(0, 0), Point2::new(4, 0)];
        assert!(!simplify(&path, 0.0).is_extrudable());
    }
}
