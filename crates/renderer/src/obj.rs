//! Wavefront OBJ decoding.
//!
//! Supports `v`, `vt`, `vn` and triangular `f v/vt/vn` faces. Texture
//! coordinates and normals are stored per position index, so a position
//! referenced with different attributes keeps the last ones seen. V is
//! flipped to `1 - v`.

use std::path::Path;

use engine_core::{AssetError, MeshData, Vertex};
use glam::{Vec2, Vec3};

/// Read and decode an OBJ file.
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
    let mesh = parse_obj(&text).map_err(|e| match e {
        AssetError::Empty(_) => AssetError::Empty(path.display().to_string()),
        other => other,
    })?;
    log::debug!(
        "Loaded {:?}: {} vertices, {} triangles",
        path,
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Decode OBJ text. Malformed faces and dangling references are errors.
pub fn parse_obj(text: &str) -> Result<MeshData, AssetError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut faces: Vec<(usize, [&str; 3])> = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_vec3(tokens, line_no)?),
            Some("vt") => tex_coords.push(parse_vec2(tokens, line_no)?),
            Some("vn") => normals.push(parse_vec3(tokens, line_no)?),
            Some("f") => {
                let corners: Vec<&str> = tokens.collect();
                let corners: [&str; 3] = corners.try_into().map_err(|c: Vec<&str>| AssetError::MalformedFace {
                    line: line_no,
                    reason: format!("expected 3 vertices, found {}", c.len()),
                })?;
                faces.push((line_no, corners));
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(AssetError::Empty("obj data".to_string()));
    }

    let mut vertices: Vec<Vertex> = positions
        .iter()
        .map(|p| Vertex::new(p.to_array(), [0.0, 0.0], [0.0, 0.0, 0.0]))
        .collect();
    let mut indices = Vec::with_capacity(faces.len() * 3);

    for (line, corners) in faces {
        for corner in corners {
            let [v, vt, vn] = parse_corner(corner, line)?;
            let index = resolve(v, positions.len(), "position", line)?;
            let uv = tex_coords[resolve(vt, tex_coords.len(), "texture", line)?];
            let normal = normals[resolve(vn, normals.len(), "normal", line)?];

            let vertex = &mut vertices[index];
            vertex.tex_coords = [uv.x, 1.0 - uv.y];
            vertex.normal = normal.to_array();
            indices.push(index as u32);
        }
    }

    Ok(MeshData::new(vertices, indices))
}

fn parse_float(token: Option<&str>, line: usize) -> Result<f32, AssetError> {
    let token = token.ok_or_else(|| AssetError::InvalidNumber {
        line,
        token: String::new(),
    })?;
    token.parse().map_err(|_| AssetError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

fn parse_vec3<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> Result<Vec3, AssetError> {
    Ok(Vec3::new(
        parse_float(tokens.next(), line)?,
        parse_float(tokens.next(), line)?,
        parse_float(tokens.next(), line)?,
    ))
}

fn parse_vec2<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> Result<Vec2, AssetError> {
    Ok(Vec2::new(parse_float(tokens.next(), line)?, parse_float(tokens.next(), line)?))
}

/// Split `v/vt/vn` into its three 1-based indices.
fn parse_corner(corner: &str, line: usize) -> Result<[i64; 3], AssetError> {
    let parts: Vec<&str> = corner.split('/').collect();
    if parts.len() != 3 {
        return Err(AssetError::MalformedFace {
            line,
            reason: format!("corner {corner:?} is not v/vt/vn"),
        });
    }
    let mut out = [0_i64; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|_| AssetError::MalformedFace {
            line,
            reason: format!("corner {corner:?} has a non-numeric index"),
        })?;
    }
    Ok(out)
}

/// 1-based OBJ index to a checked 0-based one.
fn resolve(index: i64, len: usize, kind: &'static str, line: usize) -> Result<usize, AssetError> {
    if index < 1 || index as usize > len {
        return Err(AssetError::MissingReference { line, kind, index });
    }
    Ok(index as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# two triangles
o quad
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 1 0
s off
f 1/1/1 4/4/1 2/2/1
f 2/2/1 4/4/1 3/3/1
";

    #[test]
    fn parses_indexed_triangles() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 3, 1, 1, 3, 2]);
        assert_eq!(mesh.vertices[2].position, [1.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 1.0, 0.0]);
    }

    /// V is flipped for the authoring tool's convention.
    #[test]
    fn flips_v() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(mesh.vertices[2].tex_coords, [1.0, 0.0]);
        assert_eq!(mesh.vertices[3].tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn rejects_quads() {
        let text = "v 0 0 0\nvt 0 0\nvn 0 1 0\nf 1/1/1 1/1/1 1/1/1 1/1/1\n";
        let err = parse_obj(text).unwrap_err();
        assert!(matches!(err, AssetError::MalformedFace { line: 4, .. }), "{err}");
    }

    #[test]
    fn rejects_missing_attributes() {
        let text = "v 0 0 0\nvt 0 0\nvn 0 1 0\nf 1//1 1//1 1//1\n";
        assert!(matches!(parse_obj(text), Err(AssetError::MalformedFace { line: 4, .. })));

        let text = "v 0 0 0\nvt 0 0\nvn 0 1 0\nf 1/1 1/1 1/1\n";
        assert!(matches!(parse_obj(text), Err(AssetError::MalformedFace { .. })));
    }

    #[test]
    fn rejects_dangling_references() {
        let text = "v 0 0 0\nvt 0 0\nvn 0 1 0\nf 1/1/1 2/1/1 1/1/1\n";
        assert!(matches!(
            parse_obj(text),
            Err(AssetError::MissingReference { kind: "position", index: 2, .. })
        ));

        let text = "v 0 0 0\nvt 0 0\nvn 0 1 0\nf 1/1/1 1/0/1 1/1/1\n";
        assert!(matches!(
            parse_obj(text),
            Err(AssetError::MissingReference { kind: "texture", index: 0, .. })
        ));
    }

    #[test]
    fn rejects_bad_numbers_and_empty_input() {
        assert!(matches!(
            parse_obj("v 0 zero 0\n"),
            Err(AssetError::InvalidNumber { line: 1, .. })
        ));
        assert!(matches!(parse_obj("v 0 0\n"), Err(AssetError::InvalidNumber { .. })));
        assert!(matches!(parse_obj("v 0 0 0\n"), Err(AssetError::Empty(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(load_obj("no/such/model.obj"), Err(AssetError::Io { .. })));
    }
}
