//! STL decoder for binary and ASCII formats
use nom::{
    bytes::complete::tag,
    character::complete::multispace1,
    number::complete::float,
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::DecodeError;
use crate::geometry::TriangleMesh;

/// Bytes before the triangle records: 80-byte header plus the u32 count
pub const HEADER_LEN: usize = 84;

/// Normal, three vertices and the attribute byte count
pub const RECORD_LEN: usize = 50;

/// How far past a `facet normal` token its vertices may appear
const VERTEX_WINDOW: usize = 200;

/// Decode an STL buffer, detecting binary or ASCII layout
pub fn decode(data: &[u8]) -> Result<TriangleMesh, DecodeError> {
    let count = triangle_count(data)?;

    if expected_binary_len(count) == Some(data.len()) {
        log::debug!("decoding binary STL with {count} triangles");
        return parse_binary(data);
    }

    let text = String::from_utf8_lossy(data);
    let mesh = parse_ascii(&text)?;
    log::debug!("decoded ASCII STL with {} triangles", mesh.triangle_count());
    Ok(mesh)
}

/// Triangle count declared at offset 80
fn triangle_count(data: &[u8]) -> Result<usize, DecodeError> {
    if data.len() < HEADER_LEN {
        return Err(DecodeError::MalformedHeader { len: data.len() });
    }

    Ok(u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize)
}

fn expected_binary_len(count: usize) -> Option<usize> {
    count.checked_mul(RECORD_LEN)?.checked_add(HEADER_LEN)
}

/// Parse a binary STL buffer whose length matches its declared triangle count
pub fn parse_binary(data: &[u8]) -> Result<TriangleMesh, DecodeError> {
    let count = triangle_count(data)?;
    if expected_binary_len(count).map_or(true, |len| len > data.len()) {
        return Err(DecodeError::UnrecognizedFormat);
    }

    let mut mesh = TriangleMesh::with_capacity(count);

    for record in data[HEADER_LEN..].chunks_exact(RECORD_LEN).take(count) {
        let normal = read_vec3(&record[0..12]);
        let vertices = [
            read_vec3(&record[12..24]),
            read_vec3(&record[24..36]),
            read_vec3(&record[36..48]),
        ];
        // record[48..50] is the attribute byte count

        mesh.push_triangle(vertices, normal);
    }

    Ok(mesh)
}

fn read_vec3(bytes: &[u8]) -> [f32; 3] {
    let f = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    [f(0), f(4), f(8)]
}

/// Parse ASCII STL text by scanning for `facet normal` and `vertex` tokens.
///
/// Facets with fewer than three vertices inside the lookahead window are
/// dropped. Fails if no complete facet is found.
pub fn parse_ascii(text: &str) -> Result<TriangleMesh, DecodeError> {
    let mut mesh = TriangleMesh::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find("facet") {
        let start = cursor + found;

        let Ok((rest, normal)) = facet_normal(&text[start..]) else {
            cursor = start + "facet".len();
            continue;
        };
        let normal_end = text.len() - rest.len();

        if let Some(vertices) = facet_vertices(text, normal_end) {
            mesh.push_triangle(vertices, normal);
        }

        cursor = normal_end;
    }

    if mesh.is_empty() {
        return Err(DecodeError::UnrecognizedFormat);
    }

    Ok(mesh)
}

/// Three vertices following a normal, bounded by the lookahead window and
/// by the next `facet` keyword (`endfacet` or the following facet)
fn facet_vertices(text: &str, from: usize) -> Option<[[f32; 3]; 3]> {
    let limit = from + VERTEX_WINDOW;
    let text = &text[..text[from..].find("facet").map_or(text.len(), |i| from + i)];
    let mut vertices = [[0.0; 3]; 3];
    let mut filled = 0;
    let mut cursor = from;

    while filled < 3 {
        let start = cursor + text[cursor..].find("vertex")?;
        match vertex(&text[start..]) {
            Ok((rest, v)) => {
                let end = text.len() - rest.len();
                if end > limit {
                    return None;
                }
                vertices[filled] = v;
                filled += 1;
                cursor = end;
            }
            Err(_) => cursor = start + "vertex".len(),
        }
    }

    Some(vertices)
}

fn facet_normal(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = tag("facet")(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    parse_vector3(input)
}

fn vertex(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = tag("vertex")(input)?;
    parse_vector3(input)
}

fn parse_vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, (x, y, z)) = tuple((
        preceded(multispace1, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)?;
    Ok((input, [x, y, z]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_stl(triangles: &[([f32; 3], [[f32; 3]; 3])]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for (normal, vertices) in triangles {
            for value in normal.iter().chain(vertices.iter().flatten()) {
                data.extend_from_slice(&value.to_le_bytes());
            }
            data.extend_from_slice(&[0, 0]);
        }
        data
    }

    const ASCII_TRIANGLE: &str = "solid tooth
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tooth
";

    #[test]
    fn test_parse_binary_header() {
        let mesh = decode(&binary_stl(&[])).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.positions.is_empty());
    }

    #[test]
    fn test_single_binary_triangle() {
        let data = binary_stl(&[(
            [0.0, 0.0, 1.0],
            [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
        )]);
        assert_eq!(data.len(), 134);

        let mesh = decode(&data).unwrap();
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(mesh.normals, [0.0, 0.0, 1.0].repeat(3));
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        assert_eq!(decode(&[0u8; 83]), Err(DecodeError::MalformedHeader { len: 83 }));
        assert_eq!(decode(&[]), Err(DecodeError::MalformedHeader { len: 0 }));
    }

    #[test]
    fn test_length_mismatch_falls_through_to_ascii() {
        let mut data = binary_stl(&[([0.0; 3], [[1.0; 3]; 3])]);
        data.push(0);
        // Binary bytes are not ASCII facets
        assert_eq!(decode(&data), Err(DecodeError::UnrecognizedFormat));

        data.truncate(data.len() - 2);
        assert_eq!(decode(&data), Err(DecodeError::UnrecognizedFormat));
    }

    #[test]
    fn test_huge_declared_count_does_not_overflow() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(decode(&data), Err(DecodeError::UnrecognizedFormat));
    }

    #[test]
    fn test_parse_ascii_triangle() {
        let mesh = decode(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.positions, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(mesh.normals, [0.0, 0.0, 1.0].repeat(3));
    }

    #[test]
    fn test_ascii_scientific_notation() {
        let text = "facet normal -1.5e-1 +2E0 .5\nvertex 1e3 -0.25 3\nvertex 0 0 0\nvertex 2.5 1 -1e-2\n";
        let mesh = parse_ascii(text).unwrap();
        assert_eq!(mesh.normals[0..3], [-0.15, 2.0, 0.5]);
        assert_eq!(mesh.positions[0..3], [1000.0, -0.25, 3.0]);
        assert_eq!(mesh.positions[6..9], [2.5, 1.0, -0.01]);
    }

    #[test]
    fn test_ascii_partial_facet_is_dropped() {
        let text = "solid x
facet normal 0 0 1
  vertex 0 0 0
  vertex 1 0 0
endfacet
facet normal 0 1 0
  vertex 5 5 5
  vertex 6 5 5
  vertex 5 6 5
endfacet
endsolid x";
        let mesh = parse_ascii(text).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.normals[0..3], [0.0, 1.0, 0.0]);
        assert_eq!(mesh.positions[0..3], [5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_ascii_vertices_beyond_window_are_ignored() {
        let padding = " ".repeat(VERTEX_WINDOW);
        let text = format!("facet normal 0 0 1\nvertex 0 0 0\n{padding}vertex 1 0 0\nvertex 0 1 0\n");
        assert_eq!(parse_ascii(&text), Err(DecodeError::UnrecognizedFormat));
    }

    #[test]
    fn test_ascii_without_facets_is_unrecognized() {
        let mut text = "solid empty\nendsolid empty\n".to_string();
        text.push_str(&" ".repeat(HEADER_LEN));
        assert_eq!(decode(text.as_bytes()), Err(DecodeError::UnrecognizedFormat));
    }

    #[test]
    fn test_ascii_with_binary_length_prefers_binary() {
        // 84 + 0 * 50: a text buffer of exactly 84 bytes whose bytes 80..84 are zero
        let mut data = ASCII_TRIANGLE.as_bytes()[..80].to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(decode(&data).unwrap().triangle_count(), 0);
    }
}
